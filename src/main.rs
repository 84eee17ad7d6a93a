//! devup: bring up a local development environment and prove it is ready.
//!
//! # Architecture Overview
//!
//! ```text
//!   cli ──▶ lifecycle::Orchestrator ──▶ engine (docker-compose)
//!                    │
//!                    ├──▶ registry (ServiceSpec per service, from config + environment)
//!                    │
//!                    ├──▶ health::ReadinessAggregator ──▶ resilience::RetryScheduler
//!                    │                                        └──▶ HTTP / command probers
//!                    │
//!                    └──▶ smoke::SmokeTestRunner (Ready services only)
//! ```

use clap::Parser;

use devup::cli::{self, Cli};
use devup::observability::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    tracing::debug!(command = ?cli.command, config = %cli.config.display(), "devup starting");
    let code = cli::run(cli).await;
    std::process::exit(code);
}
