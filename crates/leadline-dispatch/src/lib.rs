//! Lead dispatch for Leadline.
//!
//! A finalized lead is first written to every configured [`LeadSink`] and
//! then posted to an assignment endpoint from a detached task. Delivery is
//! best effort: one attempt, bounded by a timeout, with failures logged and
//! never surfaced to the call.

pub mod dispatcher;
pub mod error;
pub mod sink;
pub mod target;

pub use dispatcher::{DispatchOutcome, LeadDispatcher, DEFAULT_TIMEOUT};
pub use error::DispatchError;
pub use sink::{JsonlSink, LeadSink, TracingSink};
pub use target::AssignTargets;
