//! Suppression of repeated prompts and retransmitted utterances.

use crate::step::Prompt;
use std::time::{Duration, Instant};

/// Default window inside which a repeat is suppressed.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1200);

/// Tracks the last emitted prompt and the last processed utterance.
///
/// Both timestamps only move forward: an `Instant` earlier than the stored
/// one is treated as equal to it.
#[derive(Debug, Clone)]
pub struct CooldownGuard {
    window: Duration,
    last_question: Option<(Prompt, Instant)>,
    last_utterance: Option<(String, Instant)>,
}

impl CooldownGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_question: None,
            last_utterance: None,
        }
    }

    /// Returns `true` and records the prompt if it may be spoken now.
    ///
    /// The same prompt inside the window returns `false` and leaves the
    /// record untouched, so a burst of retries cannot extend the window.
    pub fn should_ask(&mut self, prompt: Prompt, now: Instant) -> bool {
        if let Some((last, at)) = self.last_question {
            if last == prompt && now.saturating_duration_since(at) < self.window {
                return false;
            }
            self.last_question = Some((prompt, now.max(at)));
        } else {
            self.last_question = Some((prompt, now));
        }
        true
    }

    /// Returns `true` if `normalized` repeats the previous utterance inside
    /// the window. Otherwise records it and returns `false`.
    pub fn is_duplicate(&mut self, normalized: &str, now: Instant) -> bool {
        match &self.last_utterance {
            Some((last, at)) => {
                if last == normalized && now.saturating_duration_since(*at) < self.window {
                    return true;
                }
                let at = now.max(*at);
                self.last_utterance = Some((normalized.to_string(), at));
            }
            None => self.last_utterance = Some((normalized.to_string(), now)),
        }
        false
    }

    pub fn last_question(&self) -> Option<(Prompt, Instant)> {
        self.last_question
    }

    pub fn last_utterance(&self) -> Option<(&str, Instant)> {
        self.last_utterance
            .as_ref()
            .map(|(text, at)| (text.as_str(), *at))
    }
}

impl Default for CooldownGuard {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
