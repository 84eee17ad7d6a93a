//! Service registry.
//!
//! # Responsibilities
//! - Hold the static declaration of every service to monitor
//! - Reject duplicate names
//! - Render config templates into concrete probe and smoke targets
//!
//! # Design Decisions
//! - Registration order is preserved for reproducible reports
//! - Specs are shared as `Arc<ServiceSpec>` so concurrent probes read without locking
//! - The registry is frozen behind an `Arc` once configuration completes

pub mod spec;

use std::sync::Arc;

use thiserror::Error;

use crate::config::validation::ValidationError;
use crate::config::{ConfigError, DevupConfig, Environment, ProbeConfig, SmokeTestConfig};
use crate::error::DevupError;
use crate::smoke::SmokeTest;

pub use spec::{ProbeKind, ProbeTarget, RetryPolicy, ServiceSpec};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("service '{0}' is already registered")]
    DuplicateService(String),
}

/// Ordered set of service specs keyed by name.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: Vec<Arc<ServiceSpec>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configuration, rendering `${KEY}` templates with `env`.
    pub fn from_config(config: &DevupConfig, env: &Environment) -> Result<Self, DevupError> {
        let mut registry = Self::new();

        for service in &config.services {
            let target = match &service.probe {
                ProbeConfig::Http { url, expect_json } => ProbeTarget::Http {
                    url: env.render(url)?,
                    expect_body: expect_json.clone(),
                },
                ProbeConfig::Command { command, container } => ProbeTarget::Command {
                    container: container.clone().unwrap_or_else(|| service.name.clone()),
                    argv: env.render_all(command)?,
                },
            };

            let mut spec = ServiceSpec::new(&service.name, target, (&service.retry).into());
            if let Some(smoke) = &service.smoke_test {
                spec = spec.with_smoke_test(render_smoke_test(&service.name, smoke, env)?);
            }

            registry.register(spec)?;
        }

        Ok(registry)
    }

    /// Add a spec. Fails if the name is taken.
    pub fn register(&mut self, spec: ServiceSpec) -> Result<(), RegistryError> {
        if self.get(spec.name()).is_some() {
            return Err(RegistryError::DuplicateService(spec.name().to_string()));
        }

        tracing::debug!(service = spec.name(), kind = %spec.kind(), "Service registered");
        self.services.push(Arc::new(spec));
        Ok(())
    }

    /// Specs in registration order.
    pub fn list(&self) -> &[Arc<ServiceSpec>] {
        &self.services
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ServiceSpec>> {
        self.services.iter().find(|s| s.name() == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn render_smoke_test(
    service: &str,
    config: &SmokeTestConfig,
    env: &Environment,
) -> Result<SmokeTest, ConfigError> {
    match config {
        SmokeTestConfig::Http {
            method,
            url,
            body,
            expect_status,
            expect,
        } => {
            let method = reqwest::Method::from_bytes(method.as_bytes()).map_err(|_| {
                ConfigError::Validation(vec![ValidationError::InvalidMethod {
                    service: service.to_string(),
                    method: method.clone(),
                }])
            })?;

            Ok(SmokeTest::Http {
                method,
                url: env.render(url)?,
                body: body.clone(),
                expect_status: *expect_status,
                expect: expect.clone(),
            })
        }
        SmokeTestConfig::Command {
            command,
            container,
            expect_stdout,
        } => Ok(SmokeTest::Command {
            container: container.clone().unwrap_or_else(|| service.to_string()),
            argv: env.render_all(command)?,
            expect_stdout: expect_stdout.clone(),
        }),
    }
}
