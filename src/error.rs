//! Top-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::lifecycle::EnvState;
use crate::registry::RegistryError;

/// Fatal errors that abort the current orchestrator operation.
///
/// Transient probe failures are never errors; they live in `ServiceVerdict`.
#[derive(Debug, Error)]
pub enum DevupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ContainerEngine(#[from] EngineError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("cannot {operation} while the environment is {from}")]
    InvalidTransition {
        from: EnvState,
        operation: &'static str,
    },
}

impl DevupError {
    /// Failure class name shown to users.
    pub fn class(&self) -> &'static str {
        match self {
            DevupError::Config(_) | DevupError::Registry(_) => "ConfigError",
            DevupError::ContainerEngine(_) => "ContainerEngineError",
            DevupError::InvalidTransition { .. } => "InvalidTransition",
        }
    }
}
