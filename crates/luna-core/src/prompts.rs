//! Prompt assembly: base instructions, need hints, bounded history, open cue.
//!
//! The rendered history never exceeds the configured turn window regardless of
//! session length, so the prompt stays bounded. Malformed turns are skipped.

use crate::needs::NeedCategory;
use crate::shared::Turn;

/// Built-in system prompt, used verbatim when `system_prompt.txt` is missing
/// or unreadable. Must stay a literal: the fallback is part of the contract,
/// not something the model improvises.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a compassionate mental health chatbot designed specifically to support neurodivergent people.

Communication Style:
- Use clear, direct language without idioms or metaphors
- Keep sentences short and structured
- Be patient and allow processing time
- Ask one question at a time
- Confirm understanding before moving forward

Core Principles:
- Validate ALL emotions and experiences without judgment
- Respect individual differences and processing styles
- Never pathologize or try to \"fix\" neurodivergent traits
- Honor the person's expertise about their own experience
- Acknowledge masking fatigue and burnout

Support Strategies:
- Offer specific grounding techniques (5-4-3-2-1 method, breathing exercises)
- Suggest breaking overwhelming tasks into smaller steps
- Provide concrete coping strategies for sensory overload
- Validate stimming and self-regulation needs
- Acknowledge executive function challenges

Safety Guidelines:
- If someone mentions self-harm or suicidal thoughts: immediately provide crisis resources
- Suggest professional help for persistent distress
- Never minimize crisis situations

Crisis Resources:
- National Suicide Prevention Lifeline: 988
- Crisis Text Line: Text HOME to 741741
- Emergency Services: 911

Remember: You provide peer support, not therapy. Listen, validate, and offer practical strategies while encouraging professional help when needed.";

/// One sentence steering the model toward the detected categories, or None
/// when nothing was detected (the prompt then carries no hint at all).
pub fn need_hint_sentence(needs: &[NeedCategory]) -> Option<String> {
    if needs.is_empty() {
        return None;
    }
    let labels: Vec<&str> = needs.iter().map(|n| n.as_str()).collect();
    Some(format!(
        "The user may be experiencing challenges related to: {}. \
         Provide specific, practical support for these areas.",
        labels.join(", ")
    ))
}

/// Builds the full generation prompt for one turn.
///
/// Layout: base instructions, optional need hint, at most the last
/// `max_history_turns` well-formed turns (oldest of the window first) as
/// `User:`/`Assistant:` blocks, then the current message with an open
/// `Assistant:` continuation cue.
pub fn build_prompt(
    base_instructions: &str,
    needs: &[NeedCategory],
    history: &[Turn],
    current_text: &str,
    max_history_turns: usize,
) -> String {
    let mut prompt = base_instructions.trim_end().to_string();
    if let Some(hint) = need_hint_sentence(needs) {
        prompt.push_str("\n\n");
        prompt.push_str(&hint);
    }
    prompt.push_str("\n\n");

    let start = history.len().saturating_sub(max_history_turns);
    for turn in &history[start..] {
        if !turn.is_well_formed() {
            continue;
        }
        prompt.push_str("User: ");
        prompt.push_str(&turn.user);
        prompt.push_str("\nAssistant: ");
        prompt.push_str(&turn.bot);
        prompt.push('\n');
    }

    prompt.push_str("User: ");
    prompt.push_str(current_text);
    prompt.push_str("\nAssistant:");
    prompt
}
