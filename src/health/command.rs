//! Command liveness probe executed through the container engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::engine::ContainerEngine;
use crate::health::probe::{kind_mismatch, HealthProber};
use crate::health::state::{FailureClass, ProbeAttemptResult};
use crate::registry::{ProbeKind, ProbeTarget, ServiceSpec};
use crate::resilience::timeouts;

/// Runs the target argv inside the service (e.g. `mysqladmin ping`).
///
/// Exit code 0 is Healthy, non-zero is Unhealthy, an unreachable engine is
/// an Error.
pub struct CommandProber {
    engine: Arc<dyn ContainerEngine>,
}

impl CommandProber {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl HealthProber for CommandProber {
    async fn probe(&self, spec: &ServiceSpec) -> ProbeAttemptResult {
        let (container, argv) = match spec.target() {
            ProbeTarget::Command { container, argv } => (container, argv),
            _ => return kind_mismatch(ProbeKind::CommandProbe, spec),
        };

        if argv.is_empty() {
            return ProbeAttemptResult::error(
                FailureClass::ProbeError,
                Duration::ZERO,
                "empty probe command",
            );
        }

        let start = Instant::now();
        let outcome = timeouts::enforce(
            spec.retry().attempt_timeout,
            self.engine.exec(container, argv),
        )
        .await;
        let latency = start.elapsed();

        match outcome {
            Ok(Ok(output)) if output.success() => ProbeAttemptResult::healthy(latency),
            Ok(Ok(output)) => ProbeAttemptResult::unhealthy(
                latency,
                format!("exit code {}: {}", output.exit_code, output.diagnostic()),
            ),
            Ok(Err(e)) => {
                tracing::warn!(service = spec.name(), error = %e, "Container engine failed during probe");
                ProbeAttemptResult::error(FailureClass::ContainerEngineError, latency, e.to_string())
            }
            Err(elapsed) => ProbeAttemptResult::unhealthy(latency, elapsed.to_string()),
        }
    }
}
