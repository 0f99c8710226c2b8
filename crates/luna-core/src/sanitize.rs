//! Response sanitization: turn raw llama.cpp stdout into one clean reply.
//!
//! Small CLI models echo the prompt, keep role-playing both sides of the
//! dialogue, and get truncated mid-sentence at the token budget. Each pass
//! here guards against one of those failure modes.

use tracing::debug;

/// Fallback reply when sanitization leaves nothing usable.
pub const CLARIFY_FALLBACK: &str = "I want to respond thoughtfully to what you've shared. \
Could you tell me a bit more about what's on your mind?";

/// Markers that open the assistant's turn in generated text.
const ASSISTANT_MARKERS: [&str; 3] = ["Assistant:", "Response:", "Bot:"];

/// Line prefixes that mean the model started a new dialogue turn on its own.
const DIALOGUE_PREFIXES: [&str; 5] = ["User:", "Human:", "Q:", "Question:", "A:"];

/// Cleans raw generator output.
///
/// `prompt_echo` is the exact prompt that was sent; if the generator echoed it
/// back verbatim it is removed first. Idempotent on already-clean text.
pub fn clean(raw: &str, prompt_echo: &str) -> String {
    let mut text = raw.to_string();

    if !prompt_echo.is_empty() {
        if let Some(pos) = text.find(prompt_echo) {
            text.replace_range(pos..pos + prompt_echo.len(), "");
            debug!("removed echoed prompt from generator output");
        }
    }

    // Keep only what follows the last assistant-turn marker, if any.
    let mut cut = None;
    for marker in ASSISTANT_MARKERS {
        if let Some(pos) = text.rfind(marker) {
            let end = pos + marker.len();
            cut = Some(cut.map_or(end, |c: usize| c.max(end)));
        }
    }
    if let Some(start) = cut {
        text = text[start..].to_string();
    }

    // Drop blank lines and anything that looks like the model continuing the
    // dialogue past its own turn.
    let kept: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !DIALOGUE_PREFIXES.iter().any(|p| line.starts_with(p))
        })
        .collect();

    let mut response = kept.join(" ").trim().to_string();

    // Truncated-generation heuristic: a trailing fragment shorter than three
    // characters after the final period is cut off, not a sentence.
    let sentences: Vec<&str> = response.split('.').collect();
    if sentences.len() > 1
        && sentences
            .last()
            .map(|s| s.trim().len() < 3)
            .unwrap_or(false)
    {
        response = format!("{}.", sentences[..sentences.len() - 1].join("."));
    }

    if response.is_empty() {
        return CLARIFY_FALLBACK.to_string();
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_after_assistant_marker() {
        assert_eq!(clean("Assistant: Hello there.", ""), "Hello there.");
    }

    #[test]
    fn uses_last_marker_occurrence() {
        let raw = "Assistant: first draft\nAssistant: Final answer here.";
        assert_eq!(clean(raw, ""), "Final answer here.");
    }

    #[test]
    fn recognizes_bot_and_response_markers() {
        assert_eq!(clean("Bot: Short and kind.", ""), "Short and kind.");
        assert_eq!(clean("Response: Also fine.", ""), "Also fine.");
    }

    #[test]
    fn removes_echoed_prompt_first() {
        let prompt = "System stuff.\n\nUser: hi\nAssistant:";
        let raw = format!("{} I'm glad you're here.", prompt);
        assert_eq!(clean(&raw, prompt), "I'm glad you're here.");
    }

    #[test]
    fn drops_continued_dialogue_lines() {
        let raw = "Assistant: Take a slow breath.\nUser: what else\nQ: more?\nHuman: hm\nA: nope";
        assert_eq!(clean(raw, ""), "Take a slow breath.");
    }

    #[test]
    fn joins_lines_with_single_spaces() {
        let raw = "Assistant: One step.\n\nThen another step.";
        assert_eq!(clean(raw, ""), "One step. Then another step.");
    }

    #[test]
    fn drops_short_trailing_fragment() {
        assert_eq!(clean("Assistant: A full sentence. An", ""), "A full sentence.");
    }

    #[test]
    fn keeps_real_final_sentence() {
        let raw = "Assistant: First sentence. Second full sentence.";
        assert_eq!(clean(raw, ""), "First sentence. Second full sentence.");
    }

    #[test]
    fn empty_output_falls_back_to_clarifying_message() {
        assert_eq!(clean("", ""), CLARIFY_FALLBACK);
        assert_eq!(clean("Assistant:\nUser: hm", ""), CLARIFY_FALLBACK);
    }

    #[test]
    fn idempotent_on_clean_text() {
        let once = clean("Assistant: Hello there. How are you today.", "");
        let twice = clean(&once, "");
        assert_eq!(once, twice);

        let plain = "Just a plain sentence with no markers.";
        assert_eq!(clean(plain, ""), clean(&clean(plain, ""), ""));
    }
}
