//! Compose-style container engine driven through its CLI.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::EngineConfig;
use crate::engine::{ContainerEngine, EngineError, ExecOutput};

/// Stderr fragments that mean the engine daemon itself is down.
const DAEMON_UNREACHABLE: [&str; 3] = [
    "Cannot connect to the Docker daemon",
    "Is the docker daemon running",
    "error during connect",
];

/// Drives `docker-compose` (or a compatible binary).
#[derive(Debug, Clone)]
pub struct ComposeEngine {
    program: String,
    project_dir: Option<PathBuf>,
}

impl ComposeEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            project_dir: None,
        }
    }

    /// Build from config; `DOCKER_COMPOSE` in the process environment wins.
    pub fn from_config(config: &EngineConfig) -> Self {
        let program = std::env::var("DOCKER_COMPOSE").unwrap_or_else(|_| config.command.clone());
        Self {
            program,
            project_dir: config.project_dir.as_ref().map(PathBuf::from),
        }
    }

    async fn run(&self, args: &[String]) -> Result<ExecOutput, EngineError> {
        let rendered = display_command(&self.program, args);
        tracing::debug!(command = %rendered, "Running container engine command");

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.project_dir {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| EngineError::Unreachable {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;

        let result = ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() && DAEMON_UNREACHABLE.iter().any(|m| result.stderr.contains(m)) {
            return Err(EngineError::Unreachable {
                command: rendered,
                reason: result.diagnostic(),
            });
        }

        Ok(result)
    }

    async fn run_checked(&self, args: &[String]) -> Result<(), EngineError> {
        let output = self.run(args).await?;
        if output.success() {
            Ok(())
        } else {
            Err(EngineError::CommandFailed {
                command: display_command(&self.program, args),
                code: output.exit_code,
                output: output.diagnostic(),
            })
        }
    }
}

impl Default for ComposeEngine {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[async_trait]
impl ContainerEngine for ComposeEngine {
    async fn start(&self, services: &[String]) -> Result<(), EngineError> {
        self.run_checked(&up_args(services)).await
    }

    async fn stop(&self, services: &[String], remove_volumes: bool) -> Result<(), EngineError> {
        self.run_checked(&stop_args(services, remove_volumes)).await
    }

    async fn exec(&self, service: &str, command: &[String]) -> Result<ExecOutput, EngineError> {
        self.run(&exec_args(service, command)).await
    }
}

/// Always detached: readiness probing runs while the services keep running.
fn up_args(services: &[String]) -> Vec<String> {
    let mut args = vec!["up".to_string(), "-d".to_string()];
    args.extend(services.iter().cloned());
    args
}

/// An empty list tears down the whole project (`down`), networks and named volumes
/// included; a non-empty list removes only those services' containers.
fn stop_args(services: &[String], remove_volumes: bool) -> Vec<String> {
    let mut args = if services.is_empty() {
        vec!["down".to_string()]
    } else {
        vec!["rm".to_string(), "--stop".to_string(), "--force".to_string()]
    };
    if remove_volumes {
        args.push("-v".to_string());
    }
    args.extend(services.iter().cloned());
    args
}

fn exec_args(service: &str, command: &[String]) -> Vec<String> {
    let mut args = vec!["exec".to_string(), "-T".to_string(), service.to_string()];
    args.extend(command.iter().cloned());
    args
}

/// Render a command line for logs with `-p<password>` arguments masked.
fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().map(|arg| {
            if arg.len() > 2 && arg.starts_with("-p") {
                "-p****".to_string()
            } else {
                arg.clone()
            }
        }))
        .collect::<Vec<_>>()
        .join(" ")
}
