//! Relay WebSocket: transcript frames in, speech frames out.
//!
//! Each connection owns one dialogue [`Session`]. Inbound frames are decoded
//! into session events and handled strictly in arrival order; the actions a
//! session returns are executed before the next frame is read.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket},
        ConnectInfo, Extension, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use leadline_dialogue::{Action, InboundEvent, Session};
use leadline_types::LeadEnvelope;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

/// Outbound frames buffered per connection before the session loop waits.
const OUTBOUND_BUFFER: usize = 64;

/// Frames sent by the telephony relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IncomingFrame {
    Setup {
        #[serde(rename = "callSid", default)]
        call_sid: Option<String>,
        #[serde(default)]
        from: Option<String>,
        #[serde(default)]
        to: Option<String>,
    },
    Prompt {
        #[serde(rename = "voicePrompt", default)]
        voice_prompt: String,
        #[serde(default = "default_last")]
        last: bool,
    },
    Interrupt {
        #[serde(rename = "utteranceUntilInterrupt", default)]
        utterance_until_interrupt: Option<String>,
    },
    Dtmf {
        #[serde(default)]
        digit: String,
    },
    Error {
        #[serde(default)]
        description: String,
    },
}

fn default_last() -> bool {
    true
}

impl IncomingFrame {
    pub fn into_event(self) -> InboundEvent {
        match self {
            Self::Setup { .. } => InboundEvent::Setup,
            Self::Prompt { voice_prompt, last } => InboundEvent::Prompt {
                text: voice_prompt,
                last,
            },
            Self::Interrupt { .. } => InboundEvent::Interrupt,
            Self::Dtmf { digit } => InboundEvent::Dtmf(digit),
            Self::Error { description } => InboundEvent::Error(description),
        }
    }
}

/// Frames sent back to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutgoingFrame {
    /// A line for the relay to speak.
    Text {
        token: String,
        last: bool,
        interruptible: bool,
    },
    /// The agent is hanging up.
    End,
}

/// GET /relay
pub async fn relay_handler(
    Extension(state): Extension<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, addr))
}

fn encode(frame: &OutgoingFrame) -> Option<AxumMessage> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(AxumMessage::Text(json.into())),
        Err(e) => {
            tracing::error!("failed to serialize outgoing frame: {}", e);
            None
        }
    }
}

/// Runs one call over the WebSocket.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, remote_addr: SocketAddr) {
    let mut call_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("call", call_id = %call_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<AxumMessage>(OUTBOUND_BUFFER);

    // Forward queued frames to the socket; a close frame ends the writer.
    let send_task = tokio::spawn(
        async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, AxumMessage::Close(_));
                if sender.send(msg).await.is_err() || closing {
                    break;
                }
            }
        }
        .instrument(span.clone()),
    );

    let mut session = Session::new(state.dialogue.clone());

    async {
        tracing::info!(remote_addr = %remote_addr, "relay connection accepted");

        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                AxumMessage::Text(text) => text,
                AxumMessage::Close(_) => break,
                _ => continue,
            };

            let frame = match serde_json::from_str::<IncomingFrame>(text.as_str()) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed relay frame");
                    continue;
                }
            };

            if let IncomingFrame::Setup { call_sid, from, to } = &frame {
                if let Some(sid) = call_sid.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                    call_id = sid.to_string();
                    tracing::Span::current().record("call_id", call_id.as_str());
                }
                tracing::info!(from = ?from, to = ?to, "call setup");
            }

            // Once the writer is gone nothing more is spoken, but leads
            // finalized in this batch are still dispatched.
            let mut writer_gone = false;
            let mut closing = false;
            for action in session.handle(frame.into_event(), Instant::now()) {
                match action {
                    Action::Speak { .. } if writer_gone => {}
                    Action::Speak {
                        text,
                        interruptible,
                    } => {
                        let frame = OutgoingFrame::Text {
                            token: text,
                            last: true,
                            interruptible,
                        };
                        if let Some(msg) = encode(&frame) {
                            if tx.send(msg).await.is_err() {
                                tracing::debug!("relay writer gone, dropping speech");
                                writer_gone = true;
                                continue;
                            }
                        }
                        if !state.speak_sleep.is_zero() {
                            tokio::time::sleep(state.speak_sleep).await;
                        }
                    }
                    Action::Dispatch(payload) => {
                        // Detached: the call goes on while the lead is posted.
                        let _ = state
                            .dispatcher
                            .dispatch(LeadEnvelope::new(call_id.clone(), payload));
                    }
                    Action::Close => {
                        if !writer_gone {
                            if let Some(msg) = encode(&OutgoingFrame::End) {
                                let _ = tx.send(msg).await;
                            }
                            let _ = tx.send(AxumMessage::Close(None)).await;
                        }
                        closing = true;
                    }
                }
            }
            if writer_gone || closing {
                break;
            }
        }

        tracing::info!(
            step = %session.step(),
            ended = session.is_ended(),
            "relay connection closed"
        );
    }
    .instrument(span)
    .await;

    drop(tx);
    let _ = send_task.await;
}
