//! Durable lead records written before any network call.

use crate::error::DispatchError;
use leadline_types::LeadEnvelope;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination that keeps a copy of every finalized lead.
pub trait LeadSink: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    /// Called on the connection task before the POST is spawned, so the
    /// record exists even if the call drops immediately after. Keep it to a
    /// short local write.
    fn record(&self, envelope: &LeadEnvelope) -> Result<(), DispatchError>;
}

/// Emits each lead as a single structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LeadSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn record(&self, envelope: &LeadEnvelope) -> Result<(), DispatchError> {
        let lead = serde_json::to_string(envelope)?;
        tracing::info!(
            target: "leadline::lead",
            call_id = %envelope.call_id,
            lead_type = %envelope.payload.lead_type,
            lead = %lead,
            "lead captured"
        );
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
///
/// Each record is a single blocking `write_all` of one line, at most once
/// per call, which is cheap enough to run on the async connection task.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DispatchError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LeadSink for JsonlSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn record(&self, envelope: &LeadEnvelope) -> Result<(), DispatchError> {
        let mut line = serde_json::to_vec(envelope)?;
        line.push(b'\n');
        let mut file = self.file.lock().map_err(|_| DispatchError::LockPoisoned)?;
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}
