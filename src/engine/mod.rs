//! Container engine collaborator.
//!
//! # Responsibilities
//! - Start and stop the environment's services
//! - Execute commands inside a running service
//!
//! # Design Decisions
//! - The orchestrator only sees the `ContainerEngine` trait; compose is one implementation
//! - `exec` returns the exit code as data; only an unreachable engine is an error
//! - Child processes are killed when their future is dropped (cancellation)

pub mod compose;

use async_trait::async_trait;
use thiserror::Error;

pub use compose::ComposeEngine;

/// Errors raised by the container engine itself.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine binary or daemon could not be reached.
    #[error("container engine unreachable ({command}): {reason}")]
    Unreachable { command: String, reason: String },

    /// An engine command ran but reported failure.
    #[error("`{command}` exited with status {code}: {output}")]
    CommandFailed {
        command: String,
        code: i32,
        output: String,
    },
}

/// Result of a command executed inside a service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Short human-readable tail of the command output, stderr first.
    pub fn diagnostic(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };

        let lines: Vec<&str> = text.lines().collect();
        let tail = lines[lines.len().saturating_sub(3)..].join(" | ");
        if tail.is_empty() {
            "no output".to_string()
        } else {
            tail
        }
    }
}

/// Lifecycle operations on the environment's services.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Launch `services` (all services when empty).
    async fn start(&self, services: &[String]) -> Result<(), EngineError>;

    /// Stop `services` (the whole environment when empty), optionally dropping volumes.
    async fn stop(&self, services: &[String], remove_volumes: bool) -> Result<(), EngineError>;

    /// Run `command` inside `service`.
    async fn exec(&self, service: &str, command: &[String]) -> Result<ExecOutput, EngineError>;
}
