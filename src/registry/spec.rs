//! Service descriptors.

use std::time::Duration;

use serde_json::Value;

use crate::config::RetryConfig;
use crate::smoke::SmokeTest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    HttpProbe,
    CommandProbe,
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeKind::HttpProbe => write!(f, "http"),
            ProbeKind::CommandProbe => write!(f, "command"),
        }
    }
}

/// What a liveness probe talks to.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeTarget {
    Http {
        url: String,
        /// JSON the response body must contain, if any.
        expect_body: Option<Value>,
    },
    Command {
        container: String,
        argv: Vec<String>,
    },
}

impl ProbeTarget {
    pub fn kind(&self) -> ProbeKind {
        match self {
            ProbeTarget::Http { .. } => ProbeKind::HttpProbe,
            ProbeTarget::Command { .. } => ProbeKind::CommandProbe,
        }
    }
}

/// Bounded fixed-interval retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            attempt_timeout,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: Duration::from_millis(config.interval_ms),
            attempt_timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// Static descriptor of one monitored service. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    name: String,
    target: ProbeTarget,
    retry: RetryPolicy,
    smoke_test: Option<SmokeTest>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, target: ProbeTarget, retry: RetryPolicy) -> Self {
        Self {
            name: name.into(),
            target,
            retry,
            smoke_test: None,
        }
    }

    pub fn with_smoke_test(mut self, smoke_test: SmokeTest) -> Self {
        self.smoke_test = Some(smoke_test);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProbeKind {
        self.target.kind()
    }

    pub fn target(&self) -> &ProbeTarget {
        &self.target
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn smoke_test(&self) -> Option<&SmokeTest> {
        self.smoke_test.as_ref()
    }
}
