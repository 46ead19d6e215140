//! Fire-and-forget delivery of finalized leads.

use crate::error::DispatchError;
use crate::sink::LeadSink;
use crate::target::AssignTargets;
use leadline_types::LeadEnvelope;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default bound on one assignment request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// What happened to one lead's assignment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The endpoint accepted the lead.
    Delivered { status: u16 },
    /// Network error, timeout or non-success status.
    Failed { reason: String },
    /// No endpoint configured for this lead type.
    Skipped,
}

/// Records leads to every sink and posts them to the assignment endpoint.
///
/// Cheap to clone; clones share the HTTP client and sinks.
#[derive(Clone)]
pub struct LeadDispatcher {
    client: reqwest::Client,
    targets: AssignTargets,
    timeout: Duration,
    sinks: Arc<Vec<Box<dyn LeadSink>>>,
}

impl std::fmt::Debug for LeadDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadDispatcher")
            .field("targets", &self.targets)
            .field("timeout", &self.timeout)
            .field(
                "sinks",
                &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("leadline/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

impl LeadDispatcher {
    pub fn new(targets: AssignTargets, timeout: Duration, sinks: Vec<Box<dyn LeadSink>>) -> Self {
        Self {
            client: build_http_client(timeout),
            targets,
            timeout,
            sinks: Arc::new(sinks),
        }
    }

    pub fn targets(&self) -> &AssignTargets {
        &self.targets
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Writes `envelope` to the sinks, then posts it in a detached task.
    ///
    /// Sink failures are logged and do not stop delivery. The returned handle
    /// may be dropped; the request still runs to completion or timeout.
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, envelope: LeadEnvelope) -> JoinHandle<DispatchOutcome> {
        for sink in self.sinks.iter() {
            if let Err(e) = sink.record(&envelope) {
                tracing::warn!(
                    sink = sink.name(),
                    call_id = %envelope.call_id,
                    error = %e,
                    "failed to record lead"
                );
            }
        }

        let url = self
            .targets
            .url_for(envelope.payload.lead_type)
            .map(str::to_string);
        let client = self.client.clone();

        tokio::spawn(async move {
            let Some(url) = url else {
                tracing::debug!(
                    call_id = %envelope.call_id,
                    lead_type = %envelope.payload.lead_type,
                    "no assignment endpoint configured, skipping"
                );
                return DispatchOutcome::Skipped;
            };

            match post(&client, &url, &envelope).await {
                Ok(status) => {
                    tracing::info!(
                        call_id = %envelope.call_id,
                        url = %url,
                        status,
                        "lead delivered"
                    );
                    DispatchOutcome::Delivered { status }
                }
                Err(e) => {
                    tracing::warn!(
                        call_id = %envelope.call_id,
                        url = %url,
                        error = %e,
                        "lead delivery failed"
                    );
                    DispatchOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        })
    }
}

async fn post(
    client: &reqwest::Client,
    url: &str,
    envelope: &LeadEnvelope,
) -> Result<u16, DispatchError> {
    let resp = client.post(url).json(envelope).send().await?;
    let status = resp.status();
    if status.is_success() {
        Ok(status.as_u16())
    } else {
        Err(DispatchError::Status(status.as_u16()))
    }
}
