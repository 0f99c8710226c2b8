//! Conversation orchestrator: sequences one turn through the pipeline.
//!
//! Validate → crisis gate → need detection → prompt assembly → generation →
//! sanitization. Every path, including every failure, resolves to exactly one
//! fixed user-facing reply; diagnostics go to the log and never to the user.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::BotConfig;
use crate::generate::{generator_from_env, GenerationError, Generator};
use crate::needs::detect_needs;
use crate::prompts::build_prompt;
use crate::safety::{is_crisis, CRISIS_RESOURCES};
use crate::sanitize::clean;
use crate::shared::Turn;
use crate::validate::validate;

/// Reply when the model process exceeds the wall-clock timeout.
pub const TIMEOUT_REPLY: &str = "I'm taking longer than usual to respond. Sometimes I need \
extra processing time, just like people do. Could you try asking again?";

/// Reply when the model process fails. Stderr stays in the log.
pub const PROCESS_FAILURE_REPLY: &str = "I'm having trouble processing your message right now. \
This sometimes happens, and it's not your fault. Could you try rephrasing or asking again?";

/// Terminal state of one handled turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Validator rejected the input; no classification or generation ran.
    Rejected,
    /// Crisis language detected; fixed resources returned, generator bypassed.
    Crisis,
    /// Model output sanitized and returned.
    Generated,
    /// Generator timed out or failed; fixed apology returned.
    GenerationFailed,
}

/// The one component the UI layer calls. Holds no conversation state: the
/// caller owns the history and appends the turn this returns.
pub struct ChatPipeline {
    config: BotConfig,
    generator: Arc<dyn Generator>,
}

impl ChatPipeline {
    pub fn new(config: BotConfig, generator: Arc<dyn Generator>) -> Self {
        Self { config, generator }
    }

    /// Convenience constructor for binaries: config from `luna.toml` + env,
    /// generator from `LUNA_GENERATOR_MODE`.
    pub fn from_env() -> Self {
        let config = BotConfig::load();
        let generator = generator_from_env(&config);
        Self::new(config, generator)
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Handles one user turn and returns the reply string.
    pub async fn respond(&self, message: &str, history: &[Turn]) -> String {
        self.respond_traced(message, history).await.0
    }

    /// Same as [`respond`](Self::respond) but also reports which terminal
    /// state the turn reached, for logging and tests.
    pub async fn respond_traced(&self, message: &str, history: &[Turn]) -> (String, TurnOutcome) {
        let text = match validate(message, self.config.max_input_length) {
            Ok(text) => text,
            Err(reason) => {
                info!("input rejected: {}", reason);
                return (reason.user_reply(), TurnOutcome::Rejected);
            }
        };

        // Crisis turns must never reach the generator.
        if is_crisis(&text) {
            return (CRISIS_RESOURCES.to_string(), TurnOutcome::Crisis);
        }

        let needs = detect_needs(&text);
        if !needs.is_empty() {
            info!(
                "detected support needs: {}",
                needs.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(", ")
            );
        }

        let system_prompt = self.config.load_system_prompt();
        let prompt = build_prompt(
            &system_prompt,
            &needs,
            history,
            &text,
            self.config.max_history_turns,
        );
        info!(
            "generating reply ({} history turns in window, {} prompt chars)",
            history.len().min(self.config.max_history_turns),
            prompt.len()
        );

        let request = self.config.generation_request(prompt.clone());
        match self.generator.generate(&request).await {
            Ok(raw) => {
                let reply = clean(&raw, &prompt);
                info!("turn completed ({} reply chars)", reply.len());
                (reply, TurnOutcome::Generated)
            }
            Err(GenerationError::Timeout) => {
                error!("generation timed out after {:?}", request.timeout);
                (TIMEOUT_REPLY.to_string(), TurnOutcome::GenerationFailed)
            }
            Err(e) => {
                error!("generation failed: {}", e);
                (PROCESS_FAILURE_REPLY.to_string(), TurnOutcome::GenerationFailed)
            }
        }
    }
}
