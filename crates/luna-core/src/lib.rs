//! luna-core: the conversational safety gate in front of a local llama.cpp model.
//!
//! Per incoming user turn the pipeline either short-circuits with fixed crisis
//! resources, augments the model prompt with detected support-category hints,
//! or runs a bounded conversation window through the generation executable and
//! post-processes its output into a clean reply. UI add-ons call only
//! [`ChatPipeline`]; everything else is plumbing for it.

mod config;
mod generate;
mod needs;
mod orchestrator;
mod prompts;
mod sanitize;
mod safety;
mod shared;
mod validate;

pub use config::BotConfig;
pub use generate::{
    generator_from_env, GenerationError, GenerationRequest, Generator, GeneratorMode,
    LlamaCliGenerator, MockGenerator,
};
pub use needs::{detect_needs, NeedCategory};
pub use orchestrator::{ChatPipeline, TurnOutcome, PROCESS_FAILURE_REPLY, TIMEOUT_REPLY};
pub use prompts::{build_prompt, need_hint_sentence, DEFAULT_SYSTEM_PROMPT};
pub use safety::{is_crisis, CRISIS_KEYWORDS, CRISIS_RESOURCES};
pub use sanitize::{clean, CLARIFY_FALLBACK};
pub use shared::Turn;
pub use validate::{validate, RejectionReason};
