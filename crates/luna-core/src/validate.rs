//! Input validation: structural checks only, never content semantics.
//!
//! Empty and oversized messages are rejected with a gentle user-facing reply;
//! everything else passes through with control bytes stripped and whitespace
//! trimmed. No profanity filtering, no keyword judgement here.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Non-printable bytes outside normal text range (keeps \t, \n, \r).
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("control-char pattern"));

/// Why a raw message was rejected before classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("input is empty or whitespace only")]
    Empty,
    #[error("input exceeds {limit} characters")]
    TooLong { limit: usize },
}

impl RejectionReason {
    /// Fixed, non-technical reply shown to the user for this rejection.
    pub fn user_reply(&self) -> String {
        match self {
            RejectionReason::Empty => {
                "I'm here when you're ready to share. Take your time.".to_string()
            }
            RejectionReason::TooLong { limit } => format!(
                "I want to understand everything you're sharing. Could you break this \
                 into smaller parts? (Current limit: {} characters)",
                limit
            ),
        }
    }
}

/// Validates and sanitizes one raw user message.
///
/// Returns the trimmed text with control characters removed, or the reason it
/// was rejected. `max_len` comes from [`crate::BotConfig::max_input_length`].
pub fn validate(raw: &str, max_len: usize) -> Result<String, RejectionReason> {
    if raw.trim().is_empty() {
        return Err(RejectionReason::Empty);
    }
    if raw.chars().count() > max_len {
        return Err(RejectionReason::TooLong { limit: max_len });
    }
    let stripped = CONTROL_CHARS.replace_all(raw, "");
    Ok(stripped.trim().to_string())
}
