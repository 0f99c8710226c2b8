//! Need detection: multi-category keyword classifier for support topics.
//!
//! A turn may match zero, one, or several categories; the result only feeds a
//! hint sentence into the prompt and never changes control flow.

use serde::{Deserialize, Serialize};

/// Fixed set of neurodivergent-support topics the prompt can be steered toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedCategory {
    Sensory,
    Social,
    Executive,
    Meltdown,
    Identity,
}

impl NeedCategory {
    pub const ALL: [NeedCategory; 5] = [
        NeedCategory::Sensory,
        NeedCategory::Social,
        NeedCategory::Executive,
        NeedCategory::Meltdown,
        NeedCategory::Identity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NeedCategory::Sensory => "sensory",
            NeedCategory::Social => "social",
            NeedCategory::Executive => "executive",
            NeedCategory::Meltdown => "meltdown",
            NeedCategory::Identity => "identity",
        }
    }

    /// Trigger substrings for this category. Substring containment, same
    /// high-recall policy as the crisis gate.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            NeedCategory::Sensory => &[
                "overwhelmed",
                "too loud",
                "too bright",
                "sensory overload",
                "stimming",
            ],
            NeedCategory::Social => &[
                "masking",
                "social anxiety",
                "don't understand people",
                "social cues",
            ],
            NeedCategory::Executive => &[
                "can't focus",
                "procrastination",
                "executive function",
                "time management",
            ],
            NeedCategory::Meltdown => &["meltdown", "shutdown", "overstimulated", "can't cope"],
            NeedCategory::Identity => &["imposter syndrome", "don't fit in", "different", "weird"],
        }
    }
}

/// Detects support categories in a user message.
///
/// Returns categories in declaration order, each at most once (set semantics).
pub fn detect_needs(text: &str) -> Vec<NeedCategory> {
    let lowered = text.to_lowercase();
    NeedCategory::ALL
        .iter()
        .copied()
        .filter(|category| {
            category
                .keywords()
                .iter()
                .any(|keyword| lowered.contains(keyword))
        })
        .collect()
}
