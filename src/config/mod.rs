//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! devup.toml (optional)
//!     → loader.rs (parse & deserialize, defaults when absent)
//!     → validation.rs (semantic checks)
//!     → DevupConfig (validated, immutable)
//!
//! [environment] table + process environment
//!     → environment.rs (overlay, required keys, ${KEY} rendering)
//!     → ServiceRegistry targets
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod environment;
pub mod loader;
pub mod schema;
pub mod validation;

pub use environment::{Environment, REQUIRED_KEYS};
pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::DevupConfig;
pub use schema::EngineConfig;
pub use schema::ProbeConfig;
pub use schema::RetryConfig;
pub use schema::ServiceConfig;
pub use schema::SmokeTestConfig;
