//! Shared types used across the core and the UI add-ons.

use serde::{Deserialize, Serialize};

/// One completed exchange: what the user said and what the bot answered.
/// Immutable once recorded; the calling session owns the sequence of turns,
/// the core only ever reads a trailing window of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Turn {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub bot: String,
}

impl Turn {
    pub fn new(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            bot: bot.into(),
        }
    }

    /// A turn with either side empty or blank must not reach the prompt;
    /// malformed history entries are skipped, never rendered.
    pub fn is_well_formed(&self) -> bool {
        !self.user.trim().is_empty() && !self.bot.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_requires_both_sides() {
        assert!(Turn::new("hi", "hello").is_well_formed());
        assert!(!Turn::new("hi", "").is_well_formed());
        assert!(!Turn::new("   ", "hello").is_well_formed());
        assert!(!Turn::default().is_well_formed());
    }
}
