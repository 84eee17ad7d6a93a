//! HTTP liveness probe.
//!
//! # Responsibilities
//! - GET the target URL once, bounded by the attempt timeout
//! - Classify: 200 → Healthy, anything else → Unhealthy, bad target → Error
//!
//! # Design Decisions
//! - Timeouts and refused connections are both Unhealthy; only the message differs
//! - An optional JSON expectation is checked as a subset of the response body

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::health::probe::{kind_mismatch, HealthProber};
use crate::health::state::{FailureClass, ProbeAttemptResult};
use crate::registry::{ProbeKind, ProbeTarget, ServiceSpec};
use crate::resilience::timeouts;
use crate::smoke::matcher::json_contains;

pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: Url) -> Result<(StatusCode, String), reqwest::Error> {
        let response = self
            .client
            .get(url)
            .header("user-agent", "devup-health-check")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl HealthProber for HttpProber {
    async fn probe(&self, spec: &ServiceSpec) -> ProbeAttemptResult {
        let (raw_url, expect_body) = match spec.target() {
            ProbeTarget::Http { url, expect_body } => (url, expect_body),
            _ => return kind_mismatch(ProbeKind::HttpProbe, spec),
        };

        let url = match parse_target(raw_url) {
            Ok(url) => url,
            Err(message) => {
                return ProbeAttemptResult::error(FailureClass::ProbeError, Duration::ZERO, message)
            }
        };

        let timeout = spec.retry().attempt_timeout;
        let start = Instant::now();
        let outcome = timeouts::enforce(timeout, self.fetch(url)).await;
        let latency = start.elapsed();

        match outcome {
            Ok(Ok((status, body))) => classify(status, &body, expect_body.as_ref(), latency),
            Ok(Err(e)) if e.is_connect() => {
                let detail = error_chain(&e);
                tracing::debug!(service = spec.name(), error = %detail, "Health check failed: connection error");
                ProbeAttemptResult::unhealthy(latency, format!("connect error: {}", detail))
            }
            Ok(Err(e)) => {
                let detail = error_chain(&e);
                tracing::debug!(service = spec.name(), error = %detail, "Health check failed: request error");
                ProbeAttemptResult::unhealthy(latency, format!("request failed: {}", detail))
            }
            Err(elapsed) => {
                tracing::debug!(service = spec.name(), "Health check failed: timeout");
                ProbeAttemptResult::unhealthy(latency, elapsed.to_string())
            }
        }
    }
}

/// `err` followed by each of its sources, so refused, DNS and unreachable-host
/// failures keep their own wording.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

fn parse_target(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("malformed target url '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{}' in target url '{}'", other, raw)),
    }
}

fn classify(
    status: StatusCode,
    body: &str,
    expect_body: Option<&Value>,
    latency: Duration,
) -> ProbeAttemptResult {
    if status != StatusCode::OK {
        return ProbeAttemptResult::unhealthy(latency, format!("unexpected status {}", status));
    }

    let Some(expected) = expect_body else {
        return ProbeAttemptResult::healthy(latency);
    };

    match serde_json::from_str::<Value>(body) {
        Ok(actual) if json_contains(&actual, expected) => ProbeAttemptResult::healthy(latency),
        Ok(actual) => ProbeAttemptResult::unhealthy(
            latency,
            format!("unexpected body {} (want {})", actual, expected),
        ),
        Err(_) => ProbeAttemptResult::unhealthy(latency, "response body is not JSON"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::state::ProbeStatus;
    use serde_json::json;

    #[test]
    fn test_parse_target() {
        assert!(parse_target("http://localhost:6000/health").is_ok());
        assert!(parse_target("localhost:6000/health").is_err());
        assert!(parse_target("not a url").unwrap_err().contains("malformed"));
        assert!(parse_target("ftp://localhost/health").unwrap_err().contains("scheme"));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request for url (http://db.internal/health)")]
    struct Sending(#[source] Lookup);

    #[derive(Debug, thiserror::Error)]
    #[error("dns error: failed to lookup address information")]
    struct Lookup;

    #[test]
    fn test_error_chain_keeps_cause_wording() {
        assert_eq!(
            error_chain(&Sending(Lookup)),
            "error sending request for url (http://db.internal/health): dns error: failed to lookup address information"
        );
        assert_eq!(error_chain(&Lookup), "dns error: failed to lookup address information");
    }

    #[test]
    fn test_classify() {
        let ok = json!({ "status": "ok" });
        let latency = Duration::from_millis(3);

        let healthy = classify(StatusCode::OK, r#"{"status":"ok","v":1}"#, Some(&ok), latency);
        assert_eq!(healthy.status, ProbeStatus::Healthy);

        let wrong_body = classify(StatusCode::OK, r#"{"status":"starting"}"#, Some(&ok), latency);
        assert_eq!(wrong_body.status, ProbeStatus::Unhealthy);

        let unavailable = classify(StatusCode::SERVICE_UNAVAILABLE, "", None, latency);
        assert_eq!(unavailable.status, ProbeStatus::Unhealthy);
        assert!(unavailable.message.unwrap().contains("503"));

        let no_content = classify(StatusCode::NO_CONTENT, "", None, latency);
        assert_eq!(no_content.status, ProbeStatus::Unhealthy);

        assert_eq!(classify(StatusCode::OK, "plain", None, latency).status, ProbeStatus::Healthy);
    }
}
