//! Bot configuration: `luna.toml` file plus `LUNA_*` environment overrides.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | LUNA_SYSTEM_PROMPT_FILE | system_prompt.txt | Base instruction text |
//! | LUNA_LLAMA_EXECUTABLE | ./llama.cpp/build/bin/llama-cli | Generation executable |
//! | LUNA_MODEL_PATH | llama.cpp/models/TinyLlama-1.1B-Chat-v1.0.Q4_K_M.gguf | Model file |
//! | LUNA_MAX_TOKENS | 200 | Generation token budget |
//! | LUNA_MAX_INPUT_LENGTH | 1000 | Input validator character limit |
//! | LUNA_MAX_HISTORY_TURNS | 4 | Trailing history window per prompt |
//! | LUNA_TEMPERATURE | 0.7 | Sampling temperature (clamped 0.0–2.0) |
//! | LUNA_TOP_P | 0.9 | Nucleus sampling (clamped 0.0–1.0) |
//! | LUNA_TIMEOUT_SECS | 30 | Hard wall-clock generation timeout |
//!
//! Unset or invalid values fall back to defaults; configuration can never
//! crash the bot.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::generate::GenerationRequest;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;

const CONFIG_FILE: &str = "luna.toml";

/// Fixed repeat penalty passed to the generation executable.
const REPEAT_PENALTY: f32 = 1.1;

fn default_system_prompt_file() -> PathBuf {
    PathBuf::from("system_prompt.txt")
}

fn default_llama_executable() -> PathBuf {
    PathBuf::from("./llama.cpp/build/bin/llama-cli")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("llama.cpp/models/TinyLlama-1.1B-Chat-v1.0.Q4_K_M.gguf")
}

fn default_max_tokens() -> u32 {
    200
}

fn default_max_input_length() -> usize {
    1000
}

fn default_max_history_turns() -> usize {
    4
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_timeout_secs() -> u64 {
    30
}

/// Runtime configuration for the conversation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_system_prompt_file")]
    pub system_prompt_file: PathBuf,
    #[serde(default = "default_llama_executable")]
    pub llama_executable: PathBuf,
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            system_prompt_file: default_system_prompt_file(),
            llama_executable: default_llama_executable(),
            model_path: default_model_path(),
            max_tokens: default_max_tokens(),
            max_input_length: default_max_input_length(),
            max_history_turns: default_max_history_turns(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BotConfig {
    /// Loads `luna.toml` from the working directory (if present), then applies
    /// `LUNA_*` environment overrides on top.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(CONFIG_FILE)).apply_env()
    }

    /// Loads configuration from a toml file. A missing or unparseable file is
    /// logged and replaced with defaults, never an error.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<BotConfig>(&content) {
                Ok(config) => {
                    info!("loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("invalid {}: {} (using defaults)", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("could not read {}: {} (using defaults)", path.display(), e);
                Self::default()
            }
        }
    }

    /// Applies `LUNA_*` environment overrides. Invalid values keep the
    /// current setting; sampling parameters are clamped to sane ranges.
    pub fn apply_env(mut self) -> Self {
        if let Some(p) = env_path("LUNA_SYSTEM_PROMPT_FILE") {
            self.system_prompt_file = p;
        }
        if let Some(p) = env_path("LUNA_LLAMA_EXECUTABLE") {
            self.llama_executable = p;
        }
        if let Some(p) = env_path("LUNA_MODEL_PATH") {
            self.model_path = p;
        }
        self.max_tokens = env_parse("LUNA_MAX_TOKENS", self.max_tokens);
        self.max_input_length = env_parse("LUNA_MAX_INPUT_LENGTH", self.max_input_length);
        self.max_history_turns = env_parse("LUNA_MAX_HISTORY_TURNS", self.max_history_turns);
        self.temperature = env_parse("LUNA_TEMPERATURE", self.temperature).clamp(0.0, 2.0);
        self.top_p = env_parse("LUNA_TOP_P", self.top_p).clamp(0.0, 1.0);
        self.timeout_secs = env_parse("LUNA_TIMEOUT_SECS", self.timeout_secs).max(1);
        self
    }

    /// Hard wall-clock limit for one generation call.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base instruction text: the configured file when readable, otherwise the
    /// built-in literal fallback. Read per turn so edits take effect live.
    pub fn load_system_prompt(&self) -> String {
        match fs::read_to_string(&self.system_prompt_file) {
            Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
            Ok(_) => {
                warn!(
                    "system prompt file {} is empty, using built-in default",
                    self.system_prompt_file.display()
                );
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
            Err(_) => {
                warn!(
                    "system prompt file {} not readable, using built-in default",
                    self.system_prompt_file.display()
                );
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
        }
    }

    /// Assembles the per-turn generation request from this configuration.
    pub fn generation_request(&self, prompt: String) -> GenerationRequest {
        GenerationRequest {
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            repeat_penalty: REPEAT_PENALTY,
            timeout: self.timeout(),
        }
    }

    /// Pre-flight check: reports missing files as human-readable issues.
    /// Callers log and decide; a missing system prompt only means the
    /// built-in fallback will be used.
    pub fn preflight(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.llama_executable.exists() {
            issues.push(format!(
                "generation executable not found: {}",
                self.llama_executable.display()
            ));
        }
        if !self.model_path.exists() {
            issues.push(format!("model file not found: {}", self.model_path.display()));
        }
        if !self.system_prompt_file.exists() {
            issues.push(format!(
                "system prompt file not found: {} (built-in default will be used)",
                self.system_prompt_file.display()
            ));
        }
        issues
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = BotConfig::default();
        assert_eq!(config.max_tokens, 200);
        assert_eq!(config.max_input_length, 1000);
        assert_eq!(config.max_history_turns, 4);
        assert_eq!(config.timeout_secs, 30);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert!((config.top_p - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = BotConfig::load_from_path(Path::new("/no/such/luna.toml"));
        assert_eq!(config.max_tokens, 200);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tokens = 64\nmax_history_turns = 2").unwrap();
        let config = BotConfig::load_from_path(file.path());
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.max_history_turns, 2);
        assert_eq!(config.max_input_length, 1000);
    }

    #[test]
    fn unparseable_toml_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tokens = \"lots\"").unwrap();
        let config = BotConfig::load_from_path(file.path());
        assert_eq!(config.max_tokens, 200);
    }

    #[test]
    fn missing_prompt_file_uses_builtin_default() {
        let config = BotConfig {
            system_prompt_file: PathBuf::from("/no/such/prompt.txt"),
            ..Default::default()
        };
        assert_eq!(config.load_system_prompt(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn prompt_file_contents_win_over_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "You are a test prompt.").unwrap();
        let config = BotConfig {
            system_prompt_file: file.path().to_path_buf(),
            ..Default::default()
        };
        assert_eq!(config.load_system_prompt(), "You are a test prompt.");
    }

    #[test]
    fn generation_request_carries_fixed_repeat_penalty() {
        let request = BotConfig::default().generation_request("p".to_string());
        assert!((request.repeat_penalty - 1.1).abs() < f32::EPSILON);
        assert_eq!(request.timeout, Duration::from_secs(30));
    }

    #[test]
    fn preflight_reports_missing_files() {
        let config = BotConfig {
            llama_executable: PathBuf::from("/no/such/llama-cli"),
            model_path: PathBuf::from("/no/such/model.gguf"),
            system_prompt_file: PathBuf::from("/no/such/prompt.txt"),
            ..Default::default()
        };
        let issues = config.preflight();
        assert_eq!(issues.len(), 3);
    }
}
