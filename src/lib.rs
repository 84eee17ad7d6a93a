//! Local development environment readiness orchestrator.

// Core subsystems
pub mod config;
pub mod engine;
pub mod registry;

// Readiness and verification
pub mod health;
pub mod smoke;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

// Surfaces
pub mod cli;
pub mod mock_api;

pub use config::{DevupConfig, Environment};
pub use engine::{ComposeEngine, ContainerEngine};
pub use error::DevupError;
pub use health::{OverallStatus, ReadinessReport};
pub use lifecycle::{EnvState, Orchestrator, Shutdown};
pub use registry::ServiceRegistry;
pub use smoke::{SmokeTestReport, VerificationStatus};
