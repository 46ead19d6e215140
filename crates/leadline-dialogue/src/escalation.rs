//! Human-handoff requests.
//!
//! Detection is a keyword test from the active [`Lexicon`]; the plan decides
//! what to collect before a handoff can be announced, so an escalation never
//! produces a lead without a callback number.

use crate::lexicon::Lexicon;
use leadline_types::Lead;

/// What the session does next after an escalation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationPlan {
    /// Ask for the caller's full name first.
    CollectName,
    /// Name known; ask for a callback number.
    CollectPhone,
    /// Everything known; confirm the callback to this number.
    Handoff { phone: String },
}

/// Keyword test, independent of the current step.
pub fn detect(lexicon: &Lexicon, lowered: &str) -> bool {
    lexicon.is_escalation(lowered)
}

/// Chooses the next action from the slots already filled.
pub fn plan(lead: &Lead) -> EscalationPlan {
    match (&lead.name, &lead.phone) {
        (None, _) => EscalationPlan::CollectName,
        (Some(_), None) => EscalationPlan::CollectPhone,
        (Some(_), Some(phone)) => EscalationPlan::Handoff {
            phone: phone.clone(),
        },
    }
}
