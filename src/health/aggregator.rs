//! Concurrent readiness aggregation.
//!
//! # Responsibilities
//! - Resolve every registered service concurrently, one task per service
//! - Wait for all of them (barrier), never returning partial results
//! - Fold the verdicts into a `ReadinessReport`
//!
//! # Design Decisions
//! - Wall time is bounded by the slowest service, not the sum
//! - A panicked resolution becomes an `Unknown` verdict instead of aborting the check

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::Instrument;
use uuid::Uuid;

use crate::health::state::{ReadinessReport, ServiceVerdict};
use crate::lifecycle::ShutdownSignal;
use crate::registry::ServiceRegistry;
use crate::resilience::RetryScheduler;

pub struct ReadinessAggregator {
    scheduler: Arc<RetryScheduler>,
}

impl ReadinessAggregator {
    pub fn new(scheduler: Arc<RetryScheduler>) -> Self {
        Self { scheduler }
    }

    /// Probe every service in `registry` and build a fresh report.
    pub async fn check_all(
        &self,
        registry: &ServiceRegistry,
        cancel: &ShutdownSignal,
    ) -> ReadinessReport {
        let check_id = Uuid::new_v4();
        let span = tracing::info_span!("readiness_check", %check_id);
        tracing::info!(parent: &span, services = registry.len(), "Readiness check starting");

        let (names, tasks): (Vec<String>, Vec<_>) = registry
            .list()
            .iter()
            .map(|spec| {
                let name = spec.name().to_string();
                let spec = Arc::clone(spec);
                let scheduler = Arc::clone(&self.scheduler);
                let signal = cancel.clone();
                let task_span = tracing::info_span!(parent: &span, "resolve", service = spec.name());
                let task = tokio::spawn(
                    async move { scheduler.resolve(&spec, signal).await }.instrument(task_span),
                );
                (name, task)
            })
            .unzip();

        let outcomes = join_all(tasks).await;

        let verdicts: Vec<ServiceVerdict> = names
            .into_iter()
            .zip(outcomes)
            .map(|(name, outcome)| match outcome {
                Ok(verdict) => verdict,
                Err(e) => {
                    tracing::error!(parent: &span, service = %name, error = %e, "Resolution task failed");
                    ServiceVerdict::unknown(&name, format!("resolution task failed: {}", e))
                }
            })
            .collect();

        let report = ReadinessReport::new(check_id, verdicts);
        tracing::info!(parent: &span, overall = %report.overall(), "Readiness check finished");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::HealthProber;
    use crate::health::state::{
        FailureClass, OverallStatus, ProbeAttemptResult, VerdictStatus,
    };
    use crate::registry::{ProbeTarget, RetryPolicy, ServiceSpec};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Healthy after a per-service delay; names starting with "bad" are always Unhealthy;
    /// "boom" panics.
    struct DelayProber;

    #[async_trait]
    impl HealthProber for DelayProber {
        async fn probe(&self, spec: &ServiceSpec) -> ProbeAttemptResult {
            if spec.name() == "boom" {
                panic!("prober crashed");
            }
            let delay = spec.retry().attempt_timeout / 2;
            tokio::time::sleep(delay).await;
            if spec.name().starts_with("bad") {
                ProbeAttemptResult::unhealthy(delay, "503")
            } else {
                ProbeAttemptResult::healthy(delay)
            }
        }
    }

    fn spec(name: &str, attempts: u32, timeout_secs: u64) -> ServiceSpec {
        ServiceSpec::new(
            name,
            ProbeTarget::Http {
                url: format!("http://localhost/{}", name),
                expect_body: None,
            },
            RetryPolicy::new(attempts, Duration::from_secs(1), Duration::from_secs(timeout_secs)),
        )
    }

    fn aggregator() -> ReadinessAggregator {
        ReadinessAggregator::new(Arc::new(RetryScheduler::new(Arc::new(DelayProber))))
    }

    #[tokio::test]
    async fn test_empty_registry_is_all_ready() {
        let report = aggregator()
            .check_all(&ServiceRegistry::new(), &ShutdownSignal::never())
            .await;
        assert_eq!(report.overall(), OverallStatus::AllReady);
        assert!(report.verdicts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_services_resolve_concurrently() {
        let mut registry = ServiceRegistry::new();
        registry.register(spec("a", 1, 20)).unwrap();
        registry.register(spec("b", 1, 20)).unwrap();
        registry.register(spec("c", 1, 20)).unwrap();

        let start = tokio::time::Instant::now();
        let report = aggregator().check_all(&registry, &ShutdownSignal::never()).await;
        let elapsed = start.elapsed();

        assert_eq!(report.overall(), OverallStatus::AllReady);
        // Each service takes 10s; serial execution would take 30s.
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(20), "took {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_keeps_registry_order_and_waits_for_all() {
        let mut registry = ServiceRegistry::new();
        registry.register(spec("slow", 1, 8)).unwrap();
        registry.register(spec("bad_api", 3, 2)).unwrap();
        registry.register(spec("fast", 1, 2)).unwrap();

        let report = aggregator().check_all(&registry, &ShutdownSignal::never()).await;
        let names: Vec<_> = report.verdicts().iter().map(|v| v.service.as_str()).collect();
        assert_eq!(names, vec!["slow", "bad_api", "fast"]);

        assert_eq!(report.overall(), OverallStatus::PartiallyReady);
        assert_eq!(report.get("bad_api").unwrap().attempts, 3);
        assert_eq!(report.get("slow").unwrap().status, VerdictStatus::Ready);
    }

    #[tokio::test]
    async fn test_panicking_resolution_is_unknown() {
        let mut registry = ServiceRegistry::new();
        registry.register(spec("ok", 1, 0)).unwrap();
        registry.register(spec("boom", 1, 0)).unwrap();

        let report = aggregator().check_all(&registry, &ShutdownSignal::never()).await;
        assert_eq!(report.get("boom").unwrap().status, VerdictStatus::Unknown);
        assert_eq!(report.get("ok").unwrap().status, VerdictStatus::Ready);
        assert_eq!(report.overall(), OverallStatus::NotReady);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_reaches_every_service() {
        let mut registry = ServiceRegistry::new();
        registry.register(spec("bad_one", 5, 2)).unwrap();
        registry.register(spec("bad_two", 5, 2)).unwrap();

        let shutdown = crate::lifecycle::Shutdown::new();
        shutdown.trigger_after(Duration::from_millis(1500));
        let report = aggregator().check_all(&registry, &shutdown.subscribe()).await;

        for verdict in report.verdicts() {
            assert_eq!(verdict.status, VerdictStatus::Unready);
            assert_eq!(verdict.failure, Some(FailureClass::Cancelled));
        }
        assert_eq!(report.overall(), OverallStatus::NotReady);
    }
}
