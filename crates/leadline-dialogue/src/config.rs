use crate::cooldown::DEFAULT_COOLDOWN;
use crate::error::LexiconError;
use crate::knowledge::KnowledgeBase;
use crate::lexicon::Lexicon;
use std::time::Duration;

/// Default number of digits that marks an utterance as a phone number.
pub const DEFAULT_PREMATURE_PHONE_DIGITS: usize = 7;

/// Default human handoff line.
pub const DEFAULT_HANDOFF_NUMBER: &str = "+34616232306";

/// Tunables for every session in the process.
#[derive(Debug, Clone)]
pub struct DialogueSettings {
    /// BCP-47 language tag selecting the lexicon.
    pub language: String,
    pub cooldown: Duration,
    /// Digit count at which an utterance outside the phone step is treated
    /// as a premature phone number.
    pub premature_phone_min_digits: usize,
    pub handoff_number: String,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            language: "es-ES".to_string(),
            cooldown: DEFAULT_COOLDOWN,
            premature_phone_min_digits: DEFAULT_PREMATURE_PHONE_DIGITS,
            handoff_number: DEFAULT_HANDOFF_NUMBER.to_string(),
        }
    }
}

/// Read-only state shared by all sessions: settings, lexicon and knowledge.
#[derive(Debug, Clone)]
pub struct DialogueContext {
    pub settings: DialogueSettings,
    pub lexicon: Lexicon,
    pub knowledge: KnowledgeBase,
}

impl DialogueContext {
    pub fn new(settings: DialogueSettings, knowledge: KnowledgeBase) -> Result<Self, LexiconError> {
        let lexicon = Lexicon::for_language(&settings.language)?;
        Ok(Self {
            settings,
            lexicon,
            knowledge,
        })
    }
}
