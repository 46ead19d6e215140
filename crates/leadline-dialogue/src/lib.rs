//! Dialogue engine for Leadline phone calls.
//!
//! A call is driven by one [`Session`]: the transport feeds it decoded
//! events and executes the [`Action`]s it returns. Sessions share a
//! read-only [`DialogueContext`] holding the locale [`Lexicon`], the
//! [`KnowledgeBase`] and process-wide settings.
//!
//! The engine collects five slots (role, city, zone, name, phone), answers
//! informational questions from the knowledge table at any step, hands the
//! call to a human on request, and runs a separate franchise sub-flow. The
//! finalized lead is emitted as a single [`Action::Dispatch`] per call.

pub mod config;
pub mod cooldown;
pub mod error;
pub mod escalation;
pub mod knowledge;
pub mod lexicon;
pub mod session;
pub mod step;
pub mod validators;

pub use config::{DialogueContext, DialogueSettings};
pub use cooldown::CooldownGuard;
pub use error::{KnowledgeError, LexiconError};
pub use escalation::EscalationPlan;
pub use knowledge::{KnowledgeBase, Topic, TopicHits};
pub use lexicon::{Lexicon, Prompts};
pub use session::{Action, FranchiseState, InboundEvent, Session};
pub use step::{FranchiseMode, FranchiseStep, Prompt, Step};
