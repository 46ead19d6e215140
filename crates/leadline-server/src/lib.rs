//! Leadline voice intake server.
//!
//! Hosts the `/relay` WebSocket that carries a call's transcript frames into
//! a dialogue session, plus health, diagnostics and a local lead-assignment
//! receiver.

pub mod api;
pub mod api_assign;
pub mod api_ws;
pub mod config;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use config::{Config, ConfigError};
use leadline_dialogue::{DialogueContext, KnowledgeBase};
use leadline_dispatch::{JsonlSink, LeadDispatcher, LeadSink, TracingSink};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Shared application state, read-only after startup.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Lexicon, knowledge table and dialogue settings shared by all calls.
    pub dialogue: Arc<DialogueContext>,
    pub dispatcher: LeadDispatcher,
    /// Pause after each spoken line.
    pub speak_sleep: Duration,
}

impl AppState {
    /// Builds the state from configuration: loads the knowledge table,
    /// compiles the lexicon and opens the lead log.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let knowledge = match &config.knowledge.path {
            Some(path) => {
                let kb = KnowledgeBase::load(path)?;
                tracing::info!(
                    path = %path.display(),
                    topics = kb.topics().len(),
                    "loaded knowledge table"
                );
                kb
            }
            None => KnowledgeBase::builtin(),
        };
        let dialogue = DialogueContext::new(config.dialogue_settings(), knowledge)?;

        let mut sinks: Vec<Box<dyn LeadSink>> = vec![Box::new(TracingSink)];
        if let Some(path) = &config.dispatch.lead_log_path {
            let sink = JsonlSink::open(path)?;
            tracing::info!(path = %sink.path().display(), "appending leads to file");
            sinks.push(Box::new(sink));
        }
        let dispatcher =
            LeadDispatcher::new(config.assign_targets(), config.dispatch_timeout(), sinks);

        Ok(Self {
            dialogue: Arc::new(dialogue),
            dispatcher,
            speak_sleep: config.speak_sleep(),
        })
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/diag_runtime", get(api::diag_runtime))
        .route("/relay", get(api_ws::relay_handler))
        .route("/assign", post(api_assign::assign_handler))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
