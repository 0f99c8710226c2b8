//! End-to-end safety-gate scenarios: every terminal state of the pipeline,
//! driven through the public API only.

use std::sync::Arc;

use async_trait::async_trait;
use luna_core::{
    build_prompt, clean, detect_needs, is_crisis, BotConfig, ChatPipeline, GenerationError,
    GenerationRequest, Generator, MockGenerator, Turn, TurnOutcome, CLARIFY_FALLBACK,
    CRISIS_KEYWORDS, PROCESS_FAILURE_REPLY, TIMEOUT_REPLY,
};

fn pipeline(generator: Arc<dyn Generator>) -> ChatPipeline {
    let config = BotConfig {
        system_prompt_file: "/no/such/system_prompt.txt".into(),
        ..Default::default()
    };
    ChatPipeline::new(config, generator)
}

#[tokio::test]
async fn crisis_phrases_always_short_circuit() {
    for phrase in CRISIS_KEYWORDS {
        let mock = Arc::new(MockGenerator::default());
        let p = pipeline(mock.clone());
        let message = format!("honestly, {} is how I feel", phrase);
        let (reply, outcome) = p.respond_traced(&message, &[]).await;
        assert_eq!(outcome, TurnOutcome::Crisis, "phrase: {}", phrase);
        assert!(reply.contains("988"));
        assert_eq!(mock.calls(), 0, "generator ran for crisis phrase: {}", phrase);
    }
}

#[tokio::test]
async fn crisis_beats_need_detection() {
    // A message with both crisis and need language must still short-circuit.
    let mock = Arc::new(MockGenerator::default());
    let p = pipeline(mock.clone());
    let (reply, outcome) = p
        .respond_traced("I'm overwhelmed and I can't go on", &[])
        .await;
    assert_eq!(outcome, TurnOutcome::Crisis);
    assert!(reply.contains("741741"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn empty_input_never_spawns_a_process() {
    let mock = Arc::new(MockGenerator::default());
    let p = pipeline(mock.clone());
    let (reply, outcome) = p.respond_traced("", &[]).await;
    assert_eq!(outcome, TurnOutcome::Rejected);
    assert!(reply.contains("Take your time"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn over_limit_input_names_the_limit() {
    let mock = Arc::new(MockGenerator::default());
    let p = pipeline(mock.clone());
    let long = "x".repeat(1001);
    let (reply, outcome) = p.respond_traced(&long, &[]).await;
    assert_eq!(outcome, TurnOutcome::Rejected);
    assert!(reply.contains("1000"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn timeout_returns_the_patience_message() {
    struct TimingOutGenerator;
    #[async_trait]
    impl Generator for TimingOutGenerator {
        async fn generate(&self, _r: &GenerationRequest) -> Result<String, GenerationError> {
            Err(GenerationError::Timeout)
        }
    }
    let p = pipeline(Arc::new(TimingOutGenerator));
    let (reply, outcome) = p.respond_traced("how was your day", &[]).await;
    assert_eq!(outcome, TurnOutcome::GenerationFailed);
    assert_eq!(reply, TIMEOUT_REPLY);
}

#[tokio::test]
async fn process_failure_hides_diagnostics() {
    struct BrokenGenerator;
    #[async_trait]
    impl Generator for BrokenGenerator {
        async fn generate(&self, _r: &GenerationRequest) -> Result<String, GenerationError> {
            Err(GenerationError::Process("model load failed".to_string()))
        }
    }
    let p = pipeline(Arc::new(BrokenGenerator));
    let (reply, outcome) = p.respond_traced("how was your day", &[]).await;
    assert_eq!(outcome, TurnOutcome::GenerationFailed);
    assert_eq!(reply, PROCESS_FAILURE_REPLY);
    assert!(!reply.contains("model load failed"));
}

#[tokio::test]
async fn empty_generation_falls_back_to_clarifying_reply() {
    let mock = Arc::new(MockGenerator::new(""));
    let p = pipeline(mock);
    let (reply, outcome) = p.respond_traced("how was your day", &[]).await;
    assert_eq!(outcome, TurnOutcome::Generated);
    assert_eq!(reply, CLARIFY_FALLBACK);
}

#[tokio::test]
async fn long_sessions_keep_the_prompt_bounded() {
    let history: Vec<Turn> = (0..50)
        .map(|i| Turn::new(format!("u{}", i), format!("b{}", i)))
        .collect();
    let prompt = build_prompt("Base.", &[], &history, "latest", 4);
    assert!(!prompt.contains("User: u45\n"));
    for i in 46..50 {
        assert!(prompt.contains(&format!("User: u{}\n", i)));
    }
}

#[test]
fn no_keywords_means_no_hint_sentence() {
    let text = "I watered the plants this morning";
    assert!(!is_crisis(text));
    let needs = detect_needs(text);
    assert!(needs.is_empty());
    let prompt = build_prompt("Base.", &needs, &[], text, 4);
    assert!(!prompt.contains("challenges related to"));
}

#[test]
fn clean_round_trip_matches_contract() {
    assert_eq!(clean("Assistant: Hello there.", ""), "Hello there.");
    let once = clean("A calm, complete reply. Nothing dangling.", "");
    assert_eq!(clean(&once, ""), once);
}
