//! Generation invoker: one isolated llama.cpp child process per turn.
//!
//! The orchestrator talks to a [`Generator`] trait so tests and demo mode can
//! swap in a deterministic mock instead of spawning a real model process.
//! The live implementation enforces a hard wall-clock timeout and guarantees
//! the child is terminated on every exit path.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;

const ENV_GENERATOR_MODE: &str = "LUNA_GENERATOR_MODE";

/// Everything one invocation needs; assembled fresh per turn, discarded after.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation exceeded the wall-clock timeout")]
    Timeout,
    #[error("generation process failed: {0}")]
    Process(String),
    #[error("failed to spawn generation process: {0}")]
    Spawn(#[from] io::Error),
}

/// Swappable generation capability. Exactly one call per turn; implementations
/// must be safe to share behind an `Arc` across sessions.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Mode for generation: mock (canned deterministic reply) or live (spawn the
/// llama.cpp CLI). Mirrors the LUNA_GENERATOR_MODE env toggle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GeneratorMode {
    Mock,
    #[default]
    Live,
}

impl GeneratorMode {
    pub fn from_env() -> Self {
        match std::env::var(ENV_GENERATOR_MODE).as_deref() {
            Ok("mock") => GeneratorMode::Mock,
            _ => GeneratorMode::Live,
        }
    }
}

/// Builds the generator selected by `LUNA_GENERATOR_MODE` (default: live).
pub fn generator_from_env(config: &BotConfig) -> std::sync::Arc<dyn Generator> {
    match GeneratorMode::from_env() {
        GeneratorMode::Mock => {
            info!("generator mode: mock (no model process will be spawned)");
            std::sync::Arc::new(MockGenerator::default())
        }
        GeneratorMode::Live => std::sync::Arc::new(LlamaCliGenerator::from_config(config)),
    }
}

// ---------------------------------------------------------------------------
// Live generator: llama.cpp CLI child process
// ---------------------------------------------------------------------------

/// Invokes the llama.cpp CLI with fixed sampling parameters. No pooling, no
/// reuse: every call spawns and reaps exactly one child process.
pub struct LlamaCliGenerator {
    executable: PathBuf,
    model_path: PathBuf,
}

impl LlamaCliGenerator {
    pub fn new(executable: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            model_path: model_path.into(),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(&config.llama_executable, &config.model_path)
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// CLI arguments for one request. `-no-cnv` disables interactive
    /// conversation mode and `--no-warmup` skips model warmup, both for
    /// latency; `--simple-io` keeps stdout parseable from a subprocess.
    fn build_args(&self, request: &GenerationRequest) -> Vec<String> {
        vec![
            "-m".to_string(),
            self.model_path.display().to_string(),
            "-p".to_string(),
            request.prompt.clone(),
            "-n".to_string(),
            request.max_tokens.to_string(),
            "--temp".to_string(),
            request.temperature.to_string(),
            "--top-p".to_string(),
            request.top_p.to_string(),
            "--repeat-penalty".to_string(),
            request.repeat_penalty.to_string(),
            "-no-cnv".to_string(),
            "--simple-io".to_string(),
            "--no-warmup".to_string(),
        ]
    }
}

#[async_trait]
impl Generator for LlamaCliGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let args = self.build_args(request);
        debug!(
            "spawning {} ({} prompt chars, {:?} timeout)",
            self.executable.display(),
            request.prompt.len(),
            request.timeout
        );

        let child = tokio::process::Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // The child is owned by the wait future below; dropping that
            // future on timeout must reap the process, never orphan it.
            .kill_on_drop(true)
            .spawn()?;

        let output = match tokio::time::timeout(request.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "generation exceeded {:?}; model process terminated",
                    request.timeout
                );
                return Err(GenerationError::Timeout);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                "unknown error".to_string()
            } else {
                stderr
            };
            error!("generation process exited nonzero: {}", stderr);
            return Err(GenerationError::Process(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ---------------------------------------------------------------------------
// Mock generator: deterministic replies for tests and demo mode
// ---------------------------------------------------------------------------

/// Canned-reply generator with an invocation counter, so tests can assert the
/// crisis short-circuit and rejection paths never reach generation.
pub struct MockGenerator {
    reply: String,
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of generate() invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("Assistant: I hear you. Let's take this one step at a time together.")
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}
