//! Crisis detection: keyword gate that bypasses generation entirely.
//!
//! Matching is lowercase substring containment with no word boundaries.
//! That is a deliberate high-recall policy: "die" inside "diet" triggers, and
//! that is acceptable — a false positive shows resources, a false negative
//! could miss someone in danger. Do not narrow this without changing policy.

use tracing::warn;

/// Phrases that trigger the crisis short-circuit.
pub const CRISIS_KEYWORDS: [&str; 14] = [
    "suicide",
    "kill myself",
    "end my life",
    "want to die",
    "better off dead",
    "self harm",
    "hurt myself",
    "cut myself",
    "overdose",
    "jump off",
    "no point living",
    "worthless",
    "hopeless",
    "can't go on",
];

/// Fixed reply for crisis turns. The hotline number, text-line code, and
/// emergency number must appear verbatim; UIs render it as-is.
pub const CRISIS_RESOURCES: &str = "I'm really concerned about you right now. Your feelings are valid, but I want to make sure you're safe.

🆘 **Immediate Help Available:**
• National Suicide Prevention Lifeline: **988**
• Crisis Text Line: Text **HOME** to **741741**
• Emergency Services: **911**

You don't have to go through this alone. Please reach out to someone you trust or one of these resources. Your life has value, and there are people who want to help.";

/// True when the text contains any crisis phrase. Pure; no side effects
/// beyond a log line on match.
pub fn is_crisis(text: &str) -> bool {
    let lowered = text.to_lowercase();
    let hit = CRISIS_KEYWORDS.iter().any(|k| lowered.contains(k));
    if hit {
        warn!("crisis language detected in user message");
    }
    hit
}
