//! Environment lifecycle state machine.
//!
//! # States
//! ```text
//! Unconfigured → Configured → Starting → Probing → {Ready, Degraded, NotReady}
//!              → {Verified, VerificationFailed} → TornDown
//! ```
//!
//! # Transitions
//! - configure: Unconfigured | Configured → Configured (ConfigError keeps the state)
//! - start: Configured → Starting (engine failure halts at Starting)
//! - probe: Configured | Starting (started) | any post-probe state → Ready/Degraded/NotReady
//! - verify: Ready | Degraded → Verified/VerificationFailed
//! - teardown: any → TornDown (no-op when already TornDown)

use std::sync::Arc;

use crate::config::validation::validate_environment;
use crate::config::{ConfigError, DevupConfig, Environment, REQUIRED_KEYS};
use crate::engine::ContainerEngine;
use crate::error::DevupError;
use crate::health::aggregator::ReadinessAggregator;
use crate::health::probe::{HealthProber, ProbeDispatcher};
use crate::health::state::{OverallStatus, ReadinessReport};
use crate::lifecycle::shutdown::Shutdown;
use crate::registry::ServiceRegistry;
use crate::resilience::RetryScheduler;
use crate::smoke::{SmokeTestReport, SmokeTestRunner, VerificationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvState {
    Unconfigured,
    Configured,
    Starting,
    Probing,
    Ready,
    Degraded,
    NotReady,
    Verified,
    VerificationFailed,
    TornDown,
}

impl std::fmt::Display for EnvState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EnvState::Unconfigured => "Unconfigured",
            EnvState::Configured => "Configured",
            EnvState::Starting => "Starting",
            EnvState::Probing => "Probing",
            EnvState::Ready => "Ready",
            EnvState::Degraded => "Degraded",
            EnvState::NotReady => "NotReady",
            EnvState::Verified => "Verified",
            EnvState::VerificationFailed => "VerificationFailed",
            EnvState::TornDown => "TornDown",
        };
        write!(f, "{}", name)
    }
}

impl From<OverallStatus> for EnvState {
    fn from(status: OverallStatus) -> Self {
        match status {
            OverallStatus::AllReady => EnvState::Ready,
            OverallStatus::PartiallyReady => EnvState::Degraded,
            OverallStatus::NotReady => EnvState::NotReady,
        }
    }
}

/// Drives one environment through its lifecycle.
///
/// Owns the state field; the registry is immutable once configured and
/// passed explicitly to every component.
pub struct Orchestrator {
    state: EnvState,
    config: DevupConfig,
    environment: Option<Environment>,
    registry: Option<Arc<ServiceRegistry>>,
    engine: Arc<dyn ContainerEngine>,
    aggregator: ReadinessAggregator,
    smoke: SmokeTestRunner,
    start_failed: bool,
    last_report: Option<ReadinessReport>,
    last_smoke: Option<SmokeTestReport>,
    shutdown: Shutdown,
}

impl Orchestrator {
    /// Orchestrator with the standard HTTP and command probers.
    pub fn new(config: DevupConfig, engine: Arc<dyn ContainerEngine>) -> Self {
        let prober = Arc::new(ProbeDispatcher::new(engine.clone()));
        Self::with_prober(config, engine, prober)
    }

    /// Orchestrator with a custom liveness prober.
    pub fn with_prober(
        config: DevupConfig,
        engine: Arc<dyn ContainerEngine>,
        prober: Arc<dyn HealthProber>,
    ) -> Self {
        let scheduler = Arc::new(RetryScheduler::new(prober));
        Self {
            state: EnvState::Unconfigured,
            config,
            environment: None,
            registry: None,
            aggregator: ReadinessAggregator::new(scheduler),
            smoke: SmokeTestRunner::new(reqwest::Client::new(), engine.clone()),
            engine,
            start_failed: false,
            last_report: None,
            last_smoke: None,
            shutdown: Shutdown::new(),
        }
    }

    pub fn state(&self) -> EnvState {
        self.state
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn registry(&self) -> Option<&Arc<ServiceRegistry>> {
        self.registry.as_ref()
    }

    pub fn last_report(&self) -> Option<&ReadinessReport> {
        self.last_report.as_ref()
    }

    /// Cancellation handle for in-flight probes and smoke tests.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Resolve the environment and build the registry.
    pub fn configure(&mut self, environment: Environment) -> Result<&ServiceRegistry, DevupError> {
        self.expect_state("configure", &[EnvState::Unconfigured, EnvState::Configured])?;

        environment.require(&REQUIRED_KEYS)?;
        validate_environment(&environment).map_err(ConfigError::Validation)?;
        let registry = Arc::new(ServiceRegistry::from_config(&self.config, &environment)?);

        tracing::info!(services = ?registry.names(), "Environment configured");
        self.environment = Some(environment);
        self.state = EnvState::Configured;
        Ok(&**self.registry.insert(registry))
    }

    /// Launch every registered service through the container engine.
    pub async fn start(&mut self) -> Result<(), DevupError> {
        self.expect_state("start", &[EnvState::Configured])?;
        let names = self.configured_registry()?.names();

        self.state = EnvState::Starting;
        tracing::info!(services = ?names, "Starting services");

        if let Err(e) = self.engine.start(&names).await {
            tracing::error!(error = %e, "Failed to start services");
            self.start_failed = true;
            return Err(e.into());
        }
        Ok(())
    }

    /// Run a fresh readiness check.
    pub async fn probe(&mut self) -> Result<&ReadinessReport, DevupError> {
        let allowed = matches!(
            self.state,
            EnvState::Configured
                | EnvState::Ready
                | EnvState::Degraded
                | EnvState::NotReady
                | EnvState::Verified
                | EnvState::VerificationFailed
        ) || (self.state == EnvState::Starting && !self.start_failed);
        if !allowed {
            return Err(self.invalid("probe"));
        }

        let registry = self.configured_registry()?.clone();
        self.state = EnvState::Probing;

        let signal = self.shutdown.subscribe();
        let report = self.aggregator.check_all(&registry, &signal).await;

        self.state = report.overall().into();
        self.last_smoke = None;
        Ok(self.last_report.insert(report))
    }

    /// `start` followed by `probe`.
    pub async fn up(&mut self) -> Result<&ReadinessReport, DevupError> {
        self.start().await?;
        self.probe().await
    }

    /// Run smoke tests against the latest readiness report.
    pub async fn verify(&mut self) -> Result<&SmokeTestReport, DevupError> {
        self.expect_state("verify", &[EnvState::Ready, EnvState::Degraded])?;
        let registry = self.configured_registry()?.clone();
        let Some(report) = self.last_report.as_ref() else {
            return Err(self.invalid("verify"));
        };

        let signal = self.shutdown.subscribe();
        let smoke = self.smoke.verify(report, &registry, &signal).await;

        self.state = match smoke.overall() {
            VerificationStatus::Verified => EnvState::Verified,
            VerificationStatus::VerificationFailed => EnvState::VerificationFailed,
        };
        Ok(self.last_smoke.insert(smoke))
    }

    /// Stop everything and drop volumes. Idempotent; always ends in `TornDown`.
    ///
    /// An engine failure is returned, but the state still becomes `TornDown`.
    pub async fn teardown(&mut self) -> Result<(), DevupError> {
        if self.state == EnvState::TornDown {
            tracing::debug!("Environment already torn down");
            return Ok(());
        }

        self.shutdown.trigger();

        // An empty service list releases the whole project, networks and volumes included.
        tracing::info!(from = %self.state, "Tearing down environment");
        let result = self.engine.stop(&[], true).await;
        self.state = EnvState::TornDown;

        result.map_err(|e| {
            tracing::warn!(error = %e, "Engine reported an error during teardown");
            e.into()
        })
    }

    fn configured_registry(&self) -> Result<&Arc<ServiceRegistry>, DevupError> {
        let state = self.state;
        self.registry.as_ref().ok_or(DevupError::InvalidTransition {
            from: state,
            operation: "use the registry",
        })
    }

    fn expect_state(&self, operation: &'static str, allowed: &[EnvState]) -> Result<(), DevupError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> DevupError {
        DevupError::InvalidTransition {
            from: self.state,
            operation,
        }
    }
}
