//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce the readiness wait ceiling per service
//! - Validate environment values (ports)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over the parsed config
//! - Runs before config is accepted into the system

use std::time::Duration;

use thiserror::Error;

use crate::config::environment::Environment;
use crate::config::schema::{DevupConfig, ProbeConfig, ServiceConfig, SmokeTestConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("service '{0}': max_attempts must be at least 1")]
    ZeroAttempts(String),

    #[error("service '{0}': timeout_ms must be greater than 0")]
    ZeroTimeout(String),

    #[error("service '{service}': max_attempts x interval is {total_ms}ms, above the {ceiling_ms}ms ceiling")]
    WaitCeilingExceeded {
        service: String,
        total_ms: u64,
        ceiling_ms: u64,
    },

    #[error("service '{0}': command must not be empty")]
    EmptyCommand(String),

    #[error("service '{service}': invalid HTTP method '{method}'")]
    InvalidMethod { service: String, method: String },

    #[error("environment key {key}: '{value}' is not a valid port")]
    InvalidPort { key: String, value: String },
}

/// Validate the parsed configuration.
pub fn validate_config(config: &DevupConfig) -> Result<(), Vec<ValidationError>> {
    let ceiling = Duration::from_secs(config.readiness.max_wait_secs);
    let errors: Vec<ValidationError> = config
        .services
        .iter()
        .flat_map(|service| validate_service(service, ceiling))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_service(service: &ServiceConfig, ceiling: Duration) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let name = service.name.clone();

    if name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    if service.retry.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts(name.clone()));
    }
    if service.retry.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout(name.clone()));
    }

    let total_ms = u64::from(service.retry.max_attempts).saturating_mul(service.retry.interval_ms);
    let ceiling_ms = ceiling.as_millis() as u64;
    if total_ms > ceiling_ms {
        errors.push(ValidationError::WaitCeilingExceeded {
            service: name.clone(),
            total_ms,
            ceiling_ms,
        });
    }

    if let ProbeConfig::Command { command, .. } = &service.probe {
        if command.is_empty() {
            errors.push(ValidationError::EmptyCommand(name.clone()));
        }
    }

    match &service.smoke_test {
        Some(SmokeTestConfig::Command { command, .. }) if command.is_empty() => {
            errors.push(ValidationError::EmptyCommand(name));
        }
        Some(SmokeTestConfig::Http { method, .. })
            if reqwest::Method::from_bytes(method.as_bytes()).is_err() =>
        {
            errors.push(ValidationError::InvalidMethod {
                service: name,
                method: method.clone(),
            });
        }
        _ => {}
    }

    errors
}

/// Validate resolved environment values. Every `*_PORT` key must be a port number.
pub fn validate_environment(env: &Environment) -> Result<(), Vec<ValidationError>> {
    let errors: Vec<ValidationError> = env
        .iter()
        .filter(|(key, _)| key.ends_with("_PORT"))
        .filter(|(_, value)| !matches!(value.parse::<u16>(), Ok(port) if port > 0))
        .map(|(key, value)| ValidationError::InvalidPort {
            key: key.to_string(),
            value: value.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
