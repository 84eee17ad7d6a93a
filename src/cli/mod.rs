//! `devup` command line.
//!
//! Each command drives an [`Orchestrator`] and maps the resulting state to an
//! exit code. Rendering lives in `output.rs`.

pub mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::{self, DevupConfig, Environment};
use crate::engine::{ComposeEngine, ContainerEngine};
use crate::health::state::{OverallStatus, ReadinessReport};
use crate::lifecycle::{signals, EnvState, Orchestrator};
use crate::smoke::{SmokeTestReport, VerificationStatus};

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Parser)]
#[command(name = "devup")]
#[command(about = "Bring up a local environment and prove it is ready", long_about = None)]
pub struct Cli {
    /// Config file; built-in defaults are used when it does not exist
    #[arg(short, long, global = true, default_value = "devup.toml")]
    pub config: PathBuf,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Cancel probing after this many seconds
    #[arg(long, global = true)]
    pub deadline_secs: Option<u64>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve and print the environment configuration
    Init,
    /// Start all services in the background and wait for readiness
    Up,
    /// Probe services without restarting them
    Status,
    /// Probe, then run smoke tests against ready services
    Test,
    /// Stop all services and remove their volumes
    Clean,
}

/// Result of one command: what to print and how to exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub stdout: String,
}

impl CommandOutcome {
    fn new(exit_code: i32, stdout: String) -> Self {
        Self { exit_code, stdout }
    }
}

pub fn up_exit_code(state: EnvState) -> i32 {
    match state {
        EnvState::Ready | EnvState::Degraded => EXIT_OK,
        _ => EXIT_FAILURE,
    }
}

pub fn status_exit_code(report: &ReadinessReport) -> i32 {
    if report.overall() == OverallStatus::AllReady {
        EXIT_OK
    } else {
        EXIT_FAILURE
    }
}

pub fn test_exit_code(report: &ReadinessReport, smoke: Option<&SmokeTestReport>) -> i32 {
    let verified = smoke.is_some_and(|s| s.overall() == VerificationStatus::Verified);
    if report.overall() == OverallStatus::AllReady && verified {
        EXIT_OK
    } else {
        EXIT_FAILURE
    }
}

/// Load config, build the compose engine and run the selected command.
pub async fn run(cli: Cli) -> i32 {
    let config = match config::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "Failed to load configuration");
            // clean never fails, even without a usable config.
            if matches!(cli.command, Commands::Clean) {
                DevupConfig::default()
            } else {
                println!("Error [ConfigError]: {}", e);
                return EXIT_FAILURE;
            }
        }
    };

    let env_file = Path::new(&config.env_file);
    let environment = match Environment::from_process(&config.environment, env_file) {
        Ok(environment) => environment,
        Err(e) => {
            tracing::error!(path = %env_file.display(), error = %e, "Failed to read dotenv file");
            if matches!(cli.command, Commands::Clean) {
                Environment::default()
            } else {
                println!("Error [ConfigError]: {}", e);
                return EXIT_FAILURE;
            }
        }
    };

    let engine = ComposeEngine::from_config(&config.engine);
    let outcome = execute(&cli, config, environment, Arc::new(engine)).await;
    print!("{}", outcome.stdout);
    outcome.exit_code
}

/// Run the selected command against an explicit engine and environment.
pub async fn execute(
    cli: &Cli,
    config: DevupConfig,
    environment: Environment,
    engine: Arc<dyn ContainerEngine>,
) -> CommandOutcome {
    let mut orch = Orchestrator::new(config, engine);
    let deadline = cli.deadline_secs.map(Duration::from_secs);
    let guards = signals::install(orch.shutdown(), deadline);

    let outcome = match cli.command {
        Commands::Clean => clean(&mut orch, environment).await,
        _ => match orch.configure(environment) {
            Ok(_) => dispatch(cli, &mut orch).await,
            Err(e) => {
                tracing::error!(error = %e, "Configuration failed");
                CommandOutcome::new(EXIT_FAILURE, format!("{}\n", output::error(&e)))
            }
        },
    };

    for guard in guards {
        guard.abort();
    }
    outcome
}

async fn dispatch(cli: &Cli, orch: &mut Orchestrator) -> CommandOutcome {
    match cli.command {
        Commands::Init => init(cli, orch),
        Commands::Up => up(cli, orch).await,
        Commands::Status => status(cli, orch).await,
        Commands::Test => test(cli, orch).await,
        Commands::Clean => teardown(orch).await,
    }
}

fn init(cli: &Cli, orch: &Orchestrator) -> CommandOutcome {
    let text = orch
        .environment()
        .map(|env| output::environment(env, cli.json))
        .unwrap_or_default();
    CommandOutcome::new(EXIT_OK, text)
}

async fn up(cli: &Cli, orch: &mut Orchestrator) -> CommandOutcome {
    let report = match orch.up().await {
        Ok(report) => report.clone(),
        Err(e) => {
            return CommandOutcome::new(
                EXIT_FAILURE,
                format!("{}\nEnvironment halted at {}\n", output::error(&e), orch.state()),
            )
        }
    };

    let code = up_exit_code(orch.state());
    with_summary(code, output::readiness(&report, cli.json), &report, None)
}

async fn status(cli: &Cli, orch: &mut Orchestrator) -> CommandOutcome {
    let report = match orch.probe().await {
        Ok(report) => report.clone(),
        Err(e) => return CommandOutcome::new(EXIT_FAILURE, format!("{}\n", output::error(&e))),
    };

    let code = status_exit_code(&report);
    with_summary(code, output::readiness(&report, cli.json), &report, None)
}

async fn test(cli: &Cli, orch: &mut Orchestrator) -> CommandOutcome {
    let report = match orch.probe().await {
        Ok(report) => report.clone(),
        Err(e) => return CommandOutcome::new(EXIT_FAILURE, format!("{}\n", output::error(&e))),
    };

    let smoke = if matches!(orch.state(), EnvState::Ready | EnvState::Degraded) {
        match orch.verify().await {
            Ok(smoke) => Some(smoke.clone()),
            Err(e) => return CommandOutcome::new(EXIT_FAILURE, format!("{}\n", output::error(&e))),
        }
    } else {
        tracing::warn!(state = %orch.state(), "Skipping smoke tests, environment not ready");
        None
    };

    let code = test_exit_code(&report, smoke.as_ref());
    let text = output::test_report(&report, smoke.as_ref(), cli.json);
    with_summary(code, text, &report, smoke.as_ref())
}

async fn clean(orch: &mut Orchestrator, environment: Environment) -> CommandOutcome {
    if let Err(e) = orch.configure(environment) {
        tracing::debug!(error = %e, "Tearing down without a configured registry");
    }
    teardown(orch).await
}

/// Always exits 0; engine errors are reported but do not fail the command.
async fn teardown(orch: &mut Orchestrator) -> CommandOutcome {
    let text = match orch.teardown().await {
        Ok(()) => "Environment torn down\n".to_string(),
        Err(e) => format!("Environment torn down ({})\n", output::error(&e)),
    };
    CommandOutcome::new(EXIT_OK, text)
}

fn with_summary(
    code: i32,
    mut text: String,
    report: &ReadinessReport,
    smoke: Option<&SmokeTestReport>,
) -> CommandOutcome {
    if code != EXIT_OK {
        if let Some(summary) = output::failure_summary(report, smoke) {
            text.push_str(&summary);
            text.push('\n');
        }
    }
    CommandOutcome::new(code, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::state::{FailureClass, ServiceVerdict};
    use crate::smoke::SmokeTestResult;
    use uuid::Uuid;

    fn report(verdicts: Vec<ServiceVerdict>) -> ReadinessReport {
        ReadinessReport::new(Uuid::new_v4(), verdicts)
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from(["devup", "--json", "up", "--deadline-secs", "20"]);
        assert!(cli.json);
        assert_eq!(cli.deadline_secs, Some(20));
        assert_eq!(cli.config, PathBuf::from("devup.toml"));
        assert!(matches!(cli.command, Commands::Up));
        assert!(Cli::try_parse_from(["devup", "up", "--no-detach"]).is_err());

        let cli = Cli::parse_from(["devup", "-c", "other.toml", "clean"]);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Commands::Clean));
    }

    #[test]
    fn test_up_exit_codes() {
        assert_eq!(up_exit_code(EnvState::Ready), EXIT_OK);
        assert_eq!(up_exit_code(EnvState::Degraded), EXIT_OK);
        assert_eq!(up_exit_code(EnvState::NotReady), EXIT_FAILURE);
        assert_eq!(up_exit_code(EnvState::Starting), EXIT_FAILURE);
    }

    #[test]
    fn test_status_and_test_exit_codes() {
        let ready = report(vec![ServiceVerdict::ready("mysql", 1)]);
        let partial = report(vec![
            ServiceVerdict::ready("mysql", 1),
            ServiceVerdict::unready("mock_api", 5, FailureClass::Unhealthy, None),
        ]);
        assert_eq!(status_exit_code(&ready), EXIT_OK);
        assert_eq!(status_exit_code(&partial), EXIT_FAILURE);

        let verified = SmokeTestReport::new(ready.check_id(), vec![SmokeTestResult::pass("mysql", "ok")]);
        let failed = SmokeTestReport::new(ready.check_id(), vec![SmokeTestResult::fail("mysql", "no")]);
        assert_eq!(test_exit_code(&ready, Some(&verified)), EXIT_OK);
        assert_eq!(test_exit_code(&ready, Some(&failed)), EXIT_FAILURE);
        assert_eq!(test_exit_code(&ready, None), EXIT_FAILURE);
        // Degraded readiness is never a passing test run.
        assert_eq!(test_exit_code(&partial, Some(&verified)), EXIT_FAILURE);
    }
}
