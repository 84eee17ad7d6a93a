//! Probe results, per-service verdicts and the readiness report.
//!
//! # States
//! - Probe attempt: Healthy / Unhealthy (transient) / Error (fatal)
//! - Verdict: Ready / Unready / Unknown
//! - Report: AllReady / PartiallyReady / NotReady
//!
//! # Aggregation
//! ```text
//! every verdict Ready                          → AllReady (also when empty)
//! some Ready, none unrecoverable               → PartiallyReady
//! otherwise                                    → NotReady
//! ```
//!
//! # Design Decisions
//! - Unhealthy outcomes are data, never errors
//! - Reports are immutable; a fresh check builds a fresh report

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
    Error,
}

/// Why a service did not become ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureClass {
    /// Retries exhausted on transient failures.
    Unhealthy,
    /// The prober itself could not run (e.g. malformed target).
    ProbeError,
    /// The container engine was unreachable.
    ContainerEngineError,
    /// The check was cancelled or hit the caller's deadline.
    Cancelled,
}

impl FailureClass {
    /// True for classes that retrying cannot fix.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FailureClass::ProbeError | FailureClass::ContainerEngineError)
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureClass::Unhealthy => write!(f, "Unhealthy"),
            FailureClass::ProbeError => write!(f, "ProbeError"),
            FailureClass::ContainerEngineError => write!(f, "ContainerEngineError"),
            FailureClass::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Outcome of a single probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttemptResult {
    pub status: ProbeStatus,
    pub latency: Duration,
    pub message: Option<String>,
    /// Set for `Error` results.
    pub failure: Option<FailureClass>,
}

impl ProbeAttemptResult {
    pub fn healthy(latency: Duration) -> Self {
        Self {
            status: ProbeStatus::Healthy,
            latency,
            message: None,
            failure: None,
        }
    }

    pub fn unhealthy(latency: Duration, message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Unhealthy,
            latency,
            message: Some(message.into()),
            failure: None,
        }
    }

    pub fn error(class: FailureClass, latency: Duration, message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Error,
            latency,
            message: Some(message.into()),
            failure: Some(class),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerdictStatus {
    Ready,
    Unready,
    /// The resolution never completed.
    Unknown,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictStatus::Ready => write!(f, "Ready"),
            VerdictStatus::Unready => write!(f, "Unready"),
            VerdictStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Terminal readiness result for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceVerdict {
    pub service: String,
    pub status: VerdictStatus,
    pub attempts: u32,
    pub message: Option<String>,
    pub failure: Option<FailureClass>,
}

impl ServiceVerdict {
    pub fn ready(service: &str, attempts: u32) -> Self {
        Self {
            service: service.to_string(),
            status: VerdictStatus::Ready,
            attempts,
            message: None,
            failure: None,
        }
    }

    pub fn unready(
        service: &str,
        attempts: u32,
        class: FailureClass,
        message: Option<String>,
    ) -> Self {
        Self {
            service: service.to_string(),
            status: VerdictStatus::Unready,
            attempts,
            message,
            failure: Some(class),
        }
    }

    pub fn unknown(service: &str, message: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            status: VerdictStatus::Unknown,
            attempts: 0,
            message: Some(message.into()),
            failure: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == VerdictStatus::Ready
    }

    /// Unknown verdicts and fatal failure classes rule out partial readiness.
    pub fn is_unrecoverable(&self) -> bool {
        self.status == VerdictStatus::Unknown || self.failure.is_some_and(|c| c.is_fatal())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverallStatus {
    AllReady,
    PartiallyReady,
    NotReady,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallStatus::AllReady => write!(f, "AllReady"),
            OverallStatus::PartiallyReady => write!(f, "PartiallyReady"),
            OverallStatus::NotReady => write!(f, "NotReady"),
        }
    }
}

/// Combine verdicts into an overall status.
pub fn overall_status(verdicts: &[ServiceVerdict]) -> OverallStatus {
    if verdicts.iter().all(ServiceVerdict::is_ready) {
        OverallStatus::AllReady
    } else if verdicts.iter().any(ServiceVerdict::is_ready)
        && !verdicts.iter().any(ServiceVerdict::is_unrecoverable)
    {
        OverallStatus::PartiallyReady
    } else {
        OverallStatus::NotReady
    }
}

/// All verdicts of one readiness check, in registry order.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    check_id: Uuid,
    checked_at: DateTime<Utc>,
    overall: OverallStatus,
    verdicts: Vec<ServiceVerdict>,
}

impl ReadinessReport {
    pub fn new(check_id: Uuid, verdicts: Vec<ServiceVerdict>) -> Self {
        Self {
            check_id,
            checked_at: Utc::now(),
            overall: overall_status(&verdicts),
            verdicts,
        }
    }

    pub fn check_id(&self) -> Uuid {
        self.check_id
    }

    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    pub fn overall(&self) -> OverallStatus {
        self.overall
    }

    pub fn verdicts(&self) -> &[ServiceVerdict] {
        &self.verdicts
    }

    pub fn get(&self, service: &str) -> Option<&ServiceVerdict> {
        self.verdicts.iter().find(|v| v.service == service)
    }

    /// Verdicts that are not `Ready`.
    pub fn failing(&self) -> impl Iterator<Item = &ServiceVerdict> {
        self.verdicts.iter().filter(|v| !v.is_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unhealthy(name: &str) -> ServiceVerdict {
        ServiceVerdict::unready(name, 5, FailureClass::Unhealthy, Some("503".into()))
    }

    #[test]
    fn test_empty_is_all_ready() {
        assert_eq!(overall_status(&[]), OverallStatus::AllReady);
    }

    #[test]
    fn test_all_ready() {
        let verdicts = vec![ServiceVerdict::ready("a", 1), ServiceVerdict::ready("b", 3)];
        assert_eq!(overall_status(&verdicts), OverallStatus::AllReady);
    }

    #[test]
    fn test_partial_when_failures_are_transient() {
        let verdicts = vec![ServiceVerdict::ready("mysql", 1), unhealthy("mock_api")];
        assert_eq!(overall_status(&verdicts), OverallStatus::PartiallyReady);

        let cancelled = ServiceVerdict::unready("mock_api", 2, FailureClass::Cancelled, None);
        let verdicts = vec![ServiceVerdict::ready("mysql", 1), cancelled];
        assert_eq!(overall_status(&verdicts), OverallStatus::PartiallyReady);
    }

    #[test]
    fn test_fatal_failure_is_not_ready() {
        let engine_down = ServiceVerdict::unready(
            "mysql",
            1,
            FailureClass::ContainerEngineError,
            Some("daemon down".into()),
        );
        let verdicts = vec![engine_down, ServiceVerdict::ready("mock_api", 1)];
        assert_eq!(overall_status(&verdicts), OverallStatus::NotReady);

        let verdicts = vec![ServiceVerdict::ready("a", 1), ServiceVerdict::unknown("b", "panicked")];
        assert_eq!(overall_status(&verdicts), OverallStatus::NotReady);
    }

    #[test]
    fn test_nothing_ready_is_not_ready() {
        assert_eq!(overall_status(&[unhealthy("a"), unhealthy("b")]), OverallStatus::NotReady);
    }

    #[test]
    fn test_report_lookup_and_failing() {
        let report = ReadinessReport::new(
            Uuid::new_v4(),
            vec![ServiceVerdict::ready("mysql", 1), unhealthy("mock_api")],
        );
        assert_eq!(report.overall(), OverallStatus::PartiallyReady);
        assert_eq!(report.get("mysql").unwrap().attempts, 1);
        let failing: Vec<_> = report.failing().map(|v| v.service.as_str()).collect();
        assert_eq!(failing, vec!["mock_api"]);
    }
}
