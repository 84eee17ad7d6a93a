//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for devup.
//! All types derive Serde traits for deserialization from `devup.toml`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::smoke::BodyMatcher;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevupConfig {
    /// Dotenv file layered over `environment`; a missing file is ignored.
    pub env_file: String,

    /// Environment key-value mapping (credentials, ports).
    ///
    /// Values from `env_file`, then process environment variables with the
    /// same name, take precedence.
    pub environment: BTreeMap<String, String>,

    /// Container engine settings.
    pub engine: EngineConfig,

    /// Readiness policy shared by every service.
    pub readiness: ReadinessConfig,

    /// Services to bring up and probe, in reporting order.
    pub services: Vec<ServiceConfig>,
}

impl Default for DevupConfig {
    fn default() -> Self {
        Self {
            env_file: ".env".to_string(),
            environment: BTreeMap::new(),
            engine: EngineConfig::default(),
            readiness: ReadinessConfig::default(),
            services: default_services(),
        }
    }
}

/// Container engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Compose executable. The `DOCKER_COMPOSE` environment variable overrides it.
    pub command: String,

    /// Directory containing the compose file (defaults to the working directory).
    pub project_dir: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: "docker-compose".to_string(),
            project_dir: None,
        }
    }
}

/// Readiness policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Upper bound for `max_attempts * interval` of any single service.
    pub max_wait_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self { max_wait_secs: 30 }
    }
}

/// A single service declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Unique service name; also the compose service name.
    pub name: String,

    /// Liveness probe.
    pub probe: ProbeConfig,

    /// Retry policy for the liveness probe.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Functional check run once the service is ready.
    #[serde(default)]
    pub smoke_test: Option<SmokeTestConfig>,
}

/// Liveness probe declaration. Strings may contain `${KEY}` placeholders.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeConfig {
    /// GET the URL, expecting 200.
    Http {
        url: String,
        /// Optional JSON the response body must contain.
        #[serde(default)]
        expect_json: Option<Value>,
    },
    /// Run a command inside the service container, expecting exit code 0.
    Command {
        command: Vec<String>,
        /// Container to exec into (defaults to the service name).
        #[serde(default)]
        container: Option<String>,
    },
}

/// Retry configuration for a liveness probe.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of probe attempts.
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    pub interval_ms: u64,

    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval_ms: 2_000,
            timeout_ms: 3_000,
        }
    }
}

/// Smoke test declaration. Strings may contain `${KEY}` placeholders.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SmokeTestConfig {
    /// Send one HTTP request and match the response.
    Http {
        #[serde(default = "default_method")]
        method: String,
        url: String,
        #[serde(default)]
        body: Option<Value>,
        #[serde(default = "default_expect_status")]
        expect_status: u16,
        #[serde(default)]
        expect: BodyMatcher,
    },
    /// Run a command in the container; exit code 0 and optional stdout match.
    Command {
        command: Vec<String>,
        #[serde(default)]
        container: Option<String>,
        #[serde(default)]
        expect_stdout: Option<String>,
    },
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_expect_status() -> u16 {
    200
}

/// The MySQL + mock API pair used when no services are configured.
pub fn default_services() -> Vec<ServiceConfig> {
    let mysql_ping: Vec<String> = [
        "mysqladmin",
        "ping",
        "-h",
        "${DB_HOST}",
        "-u",
        "${DB_USER}",
        "-p${DB_PASSWORD}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let echo_payload = json!({ "msg": "smoke-test" });

    vec![
        ServiceConfig {
            name: "mysql".to_string(),
            probe: ProbeConfig::Command {
                command: mysql_ping.clone(),
                container: None,
            },
            retry: RetryConfig::default(),
            smoke_test: Some(SmokeTestConfig::Command {
                command: mysql_ping,
                container: None,
                expect_stdout: Some("mysqld is alive".to_string()),
            }),
        },
        ServiceConfig {
            name: "mock_api".to_string(),
            probe: ProbeConfig::Http {
                url: "http://localhost:${MOCK_API_PORT}/health".to_string(),
                expect_json: Some(json!({ "status": "ok" })),
            },
            retry: RetryConfig::default(),
            smoke_test: Some(SmokeTestConfig::Http {
                method: "POST".to_string(),
                url: "http://localhost:${MOCK_API_PORT}/echo".to_string(),
                body: Some(echo_payload.clone()),
                expect_status: 200,
                expect: BodyMatcher::JsonPointer {
                    pointer: "/you_sent".to_string(),
                    equals: echo_payload,
                },
            }),
        },
    ]
}
