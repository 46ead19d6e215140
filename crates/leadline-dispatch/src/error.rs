//! Error types for lead dispatch.

/// Failures while recording or delivering a lead.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The assignment endpoint could not be reached or timed out.
    #[error("assignment request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The assignment endpoint answered with a non-success status.
    #[error("assignment endpoint returned status {0}")]
    Status(u16),

    #[error("lead log write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("lead serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("lead log lock poisoned")]
    LockPoisoned,
}
