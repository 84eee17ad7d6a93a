//! Post-readiness functional verification.
//!
//! # Responsibilities
//! - Run each declared smoke test exactly once against Ready services
//! - Mark declared tests of non-Ready services as Skipped without running them
//! - Omit services that declare no smoke test
//!
//! # Design Decisions
//! - No retries: a functional failure after confirmed liveness is a hard failure
//! - Each test is bounded by the service's per-attempt timeout

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::Value;

use crate::engine::ContainerEngine;
use crate::health::state::ReadinessReport;
use crate::lifecycle::ShutdownSignal;
use crate::registry::{ServiceRegistry, ServiceSpec};
use crate::resilience::timeouts;
use crate::smoke::matcher::BodyMatcher;
use crate::smoke::types::{SmokeTest, SmokeTestReport, SmokeTestResult};

pub struct SmokeTestRunner {
    client: reqwest::Client,
    engine: Arc<dyn ContainerEngine>,
}

impl SmokeTestRunner {
    pub fn new(client: reqwest::Client, engine: Arc<dyn ContainerEngine>) -> Self {
        Self { client, engine }
    }

    /// Verify every Ready service that declares a smoke test.
    pub async fn verify(
        &self,
        report: &ReadinessReport,
        registry: &ServiceRegistry,
        cancel: &ShutdownSignal,
    ) -> SmokeTestReport {
        let checks = registry.list().iter().filter_map(|spec| {
            let test = spec.smoke_test()?;
            let ready = report.get(spec.name()).is_some_and(|v| v.is_ready());
            let mut signal = cancel.clone();

            Some(async move {
                if !ready {
                    tracing::info!(service = spec.name(), "Smoke test skipped, service not ready");
                    return SmokeTestResult::skipped(spec.name(), "service not ready");
                }

                tokio::select! {
                    biased;
                    _ = signal.cancelled() => SmokeTestResult::fail(spec.name(), "cancelled"),
                    result = self.run_one(spec, test) => result,
                }
            })
        });

        let results = join_all(checks).await;
        for result in &results {
            tracing::info!(service = %result.service, status = %result.status, message = %result.message, "Smoke test finished");
        }

        SmokeTestReport::new(report.check_id(), results)
    }

    async fn run_one(&self, spec: &ServiceSpec, test: &SmokeTest) -> SmokeTestResult {
        let timeout = spec.retry().attempt_timeout;
        let outcome = match test {
            SmokeTest::Http {
                method,
                url,
                body,
                expect_status,
                expect,
            } => {
                self.run_http(method.clone(), url, body.as_ref(), *expect_status, expect, timeout)
                    .await
            }
            SmokeTest::Command {
                container,
                argv,
                expect_stdout,
            } => {
                self.run_command(container, argv, expect_stdout.as_deref(), timeout)
                    .await
            }
        };

        match outcome {
            Ok(message) => SmokeTestResult::pass(spec.name(), message),
            Err(message) => SmokeTestResult::fail(spec.name(), message),
        }
    }

    async fn run_http(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&Value>,
        expect_status: u16,
        expect: &BodyMatcher,
        timeout: Duration,
    ) -> Result<String, String> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let exchange = async move {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        let (status, text) = match timeouts::enforce(timeout, exchange).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(format!("{} {} failed: {}", method, url, e)),
            Err(elapsed) => return Err(format!("{} {} {}", method, url, elapsed)),
        };

        if status.as_u16() != expect_status {
            return Err(format!(
                "{} {} returned {}, expected {}",
                method, url, status, expect_status
            ));
        }

        expect.check(&text)?;
        Ok(format!("{} {} returned {}", method, url, status))
    }

    async fn run_command(
        &self,
        container: &str,
        argv: &[String],
        expect_stdout: Option<&str>,
        timeout: Duration,
    ) -> Result<String, String> {
        let output = match timeouts::enforce(timeout, self.engine.exec(container, argv)).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(e.to_string()),
            Err(elapsed) => return Err(elapsed.to_string()),
        };

        if !output.success() {
            return Err(format!("exit code {}: {}", output.exit_code, output.diagnostic()));
        }

        match expect_stdout {
            Some(expected) if !output.stdout.contains(expected) => Err(format!(
                "stdout does not contain '{}': {}",
                expected,
                output.diagnostic()
            )),
            _ => Ok(output.diagnostic()),
        }
    }
}
