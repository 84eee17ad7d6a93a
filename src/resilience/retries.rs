//! Bounded retry of liveness probes.
//!
//! # Responsibilities
//! - Probe a service until Healthy, an Error, or attempts run out
//! - Sleep a fixed interval between attempts
//! - Abort the in-flight attempt and the sleep on cancellation
//!
//! # Design Decisions
//! - Fixed interval, no backoff: local readiness windows are short and
//!   bounded by `max_attempts * interval`
//! - Unhealthy results are absorbed here and surface only as verdict data
//! - An Error result stops retrying immediately
//! - Attempts within one service are strictly sequential

use std::sync::Arc;

use crate::health::probe::HealthProber;
use crate::health::state::{FailureClass, ProbeStatus, ServiceVerdict};
use crate::lifecycle::ShutdownSignal;
use crate::registry::ServiceSpec;

/// Turns repeated probe attempts into one verdict.
pub struct RetryScheduler {
    prober: Arc<dyn HealthProber>,
}

impl RetryScheduler {
    pub fn new(prober: Arc<dyn HealthProber>) -> Self {
        Self { prober }
    }

    /// Resolve `spec` to a verdict. Blocks for at most the policy's attempts
    /// and intervals; returns early when `cancel` fires.
    pub async fn resolve(&self, spec: &ServiceSpec, mut cancel: ShutdownSignal) -> ServiceVerdict {
        let policy = spec.retry();
        let name = spec.name();
        let mut last_message: Option<String> = None;

        if cancel.is_cancelled() {
            return cancelled(name, 0, last_message);
        }

        for attempt in 1..=policy.max_attempts {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(name, attempt, last_message),
                result = self.prober.probe(spec) => result,
            };

            tracing::debug!(
                service = name,
                attempt,
                max_attempts = policy.max_attempts,
                status = ?result.status,
                latency_ms = result.latency.as_millis() as u64,
                "Probe attempt finished"
            );

            match result.status {
                ProbeStatus::Healthy => {
                    tracing::info!(service = name, attempts = attempt, "Service ready");
                    return ServiceVerdict::ready(name, attempt);
                }
                ProbeStatus::Error => {
                    let class = result.failure.unwrap_or(FailureClass::ProbeError);
                    tracing::warn!(
                        service = name,
                        attempt,
                        class = %class,
                        message = result.message.as_deref().unwrap_or(""),
                        "Probe error, not retrying"
                    );
                    return ServiceVerdict::unready(name, attempt, class, result.message);
                }
                ProbeStatus::Unhealthy => last_message = result.message,
            }

            if attempt < policy.max_attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return cancelled(name, attempt, last_message),
                    _ = tokio::time::sleep(policy.interval) => {}
                }
            }
        }

        tracing::warn!(
            service = name,
            attempts = policy.max_attempts,
            message = last_message.as_deref().unwrap_or(""),
            "Service not ready, retries exhausted"
        );
        ServiceVerdict::unready(
            name,
            policy.max_attempts,
            FailureClass::Unhealthy,
            last_message.or_else(|| Some("no probe attempts configured".to_string())),
        )
    }
}

fn cancelled(name: &str, attempts: u32, last_message: Option<String>) -> ServiceVerdict {
    tracing::warn!(service = name, attempts, "Readiness check cancelled");
    let message = match last_message {
        Some(last) => format!("cancelled (last: {})", last),
        None => "cancelled".to_string(),
    };
    ServiceVerdict::unready(name, attempts, FailureClass::Cancelled, Some(message))
}
