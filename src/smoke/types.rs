//! Smoke test descriptors and results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::smoke::matcher::BodyMatcher;

/// A functional check, rendered and ready to run.
#[derive(Debug, Clone, PartialEq)]
pub enum SmokeTest {
    Http {
        method: reqwest::Method,
        url: String,
        body: Option<Value>,
        expect_status: u16,
        expect: BodyMatcher,
    },
    Command {
        container: String,
        argv: Vec<String>,
        expect_stdout: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SmokeStatus {
    Pass,
    Fail,
    /// The service declares a smoke test but was not ready.
    Skipped,
}

impl std::fmt::Display for SmokeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SmokeStatus::Pass => write!(f, "Pass"),
            SmokeStatus::Fail => write!(f, "Fail"),
            SmokeStatus::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Outcome of one service's smoke test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmokeTestResult {
    pub service: String,
    pub status: SmokeStatus,
    pub message: String,
}

impl SmokeTestResult {
    pub fn pass(service: &str, message: impl Into<String>) -> Self {
        Self::new(service, SmokeStatus::Pass, message)
    }

    pub fn fail(service: &str, message: impl Into<String>) -> Self {
        Self::new(service, SmokeStatus::Fail, message)
    }

    pub fn skipped(service: &str, message: impl Into<String>) -> Self {
        Self::new(service, SmokeStatus::Skipped, message)
    }

    fn new(service: &str, status: SmokeStatus, message: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerificationStatus {
    /// Every executed smoke test passed.
    Verified,
    /// At least one executed smoke test failed.
    VerificationFailed,
}

/// Smoke test results for one verification run, in registry order.
#[derive(Debug, Clone, Serialize)]
pub struct SmokeTestReport {
    check_id: Uuid,
    checked_at: DateTime<Utc>,
    overall: VerificationStatus,
    results: Vec<SmokeTestResult>,
}

impl SmokeTestReport {
    pub fn new(check_id: Uuid, results: Vec<SmokeTestResult>) -> Self {
        let overall = if results.iter().any(|r| r.status == SmokeStatus::Fail) {
            VerificationStatus::VerificationFailed
        } else {
            VerificationStatus::Verified
        };

        Self {
            check_id,
            checked_at: Utc::now(),
            overall,
            results,
        }
    }

    pub fn check_id(&self) -> Uuid {
        self.check_id
    }

    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    pub fn overall(&self) -> VerificationStatus {
        self.overall
    }

    pub fn results(&self) -> &[SmokeTestResult] {
        &self.results
    }

    pub fn get(&self, service: &str) -> Option<&SmokeTestResult> {
        self.results.iter().find(|r| r.service == service)
    }

    pub fn failed(&self) -> impl Iterator<Item = &SmokeTestResult> {
        self.results.iter().filter(|r| r.status == SmokeStatus::Fail)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SmokeTestResult> {
        self.results.iter().filter(|r| r.status == SmokeStatus::Skipped)
    }
}
