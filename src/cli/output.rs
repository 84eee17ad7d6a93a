//! Human-readable and JSON rendering of reports.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::Environment;
use crate::error::DevupError;
use crate::health::state::{ReadinessReport, VerdictStatus};
use crate::smoke::{SmokeStatus, SmokeTestReport};

/// Key fragments whose values are never printed.
const SECRET_MARKERS: [&str; 3] = ["PASSWORD", "SECRET", "TOKEN"];

#[derive(Serialize)]
struct TestOutput<'a> {
    readiness: &'a ReadinessReport,
    smoke: Option<&'a SmokeTestReport>,
}

pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize report: {}\"}}", e))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn mask(key: &str, value: &str) -> String {
    let upper = key.to_ascii_uppercase();
    if !value.is_empty() && SECRET_MARKERS.iter().any(|m| upper.contains(m)) {
        "****".to_string()
    } else {
        value.to_string()
    }
}

pub fn environment(env: &Environment, json: bool) -> String {
    let masked: BTreeMap<&str, String> = env.iter().map(|(k, v)| (k, mask(k, v))).collect();
    if json {
        return to_json(&masked);
    }

    let mut out = String::from("Environment variables:\n");
    for (key, value) in masked {
        let _ = writeln!(out, "  {}={}", key, value);
    }
    out
}

pub fn readiness(report: &ReadinessReport, json: bool) -> String {
    if json {
        return to_json(report);
    }

    let mut out = format!(
        "Readiness {} at {}: {}\n",
        report.check_id(),
        timestamp(report.checked_at()),
        report.overall()
    );
    for verdict in report.verdicts() {
        let tag = match verdict.status {
            VerdictStatus::Ready => "[OK]  ",
            VerdictStatus::Unready => "[FAIL]",
            VerdictStatus::Unknown => "[??]  ",
        };
        let _ = write!(out, "  {} {:<12} {} after {} attempt(s)", tag, verdict.service, verdict.status, verdict.attempts);
        if let Some(class) = verdict.failure {
            let _ = write!(out, " [{}]", class);
        }
        if let Some(message) = &verdict.message {
            let _ = write!(out, ": {}", message);
        }
        out.push('\n');
    }
    out
}

pub fn smoke(report: &SmokeTestReport) -> String {
    let mut out = format!(
        "Smoke tests {} at {}: {:?}\n",
        report.check_id(),
        timestamp(report.checked_at()),
        report.overall()
    );
    for result in report.results() {
        let tag = match result.status {
            SmokeStatus::Pass => "[PASS]",
            SmokeStatus::Fail => "[FAIL]",
            SmokeStatus::Skipped => "[SKIP]",
        };
        let _ = writeln!(out, "  {} {:<12} {}", tag, result.service, result.message);
    }
    out
}

pub fn test_report(readiness_report: &ReadinessReport, smoke_report: Option<&SmokeTestReport>, json: bool) -> String {
    if json {
        return to_json(&TestOutput {
            readiness: readiness_report,
            smoke: smoke_report,
        });
    }

    let mut out = readiness(readiness_report, false);
    if let Some(report) = smoke_report {
        out.push_str(&smoke(report));
    }
    out
}

/// One line naming every failing service and its failure class.
pub fn failure_summary(readiness_report: &ReadinessReport, smoke_report: Option<&SmokeTestReport>) -> Option<String> {
    let mut failures: Vec<String> = readiness_report
        .failing()
        .map(|v| {
            let class = v
                .failure
                .map(|c| c.to_string())
                .unwrap_or_else(|| v.status.to_string());
            format!("{} ({})", v.service, class)
        })
        .collect();

    if let Some(report) = smoke_report {
        failures.extend(report.failed().map(|r| format!("{} (SmokeTestFailure)", r.service)));
    }

    if failures.is_empty() {
        None
    } else {
        Some(format!("Failed: {}", failures.join(", ")))
    }
}

pub fn error(err: &DevupError) -> String {
    format!("Error [{}]: {}", err.class(), err)
}
