//! Smoke testing subsystem.
//!
//! # Data Flow
//! ```text
//! ReadinessReport + ServiceRegistry
//!     → runner.rs (one functional check per Ready service, Skipped otherwise)
//!     → matcher.rs (response body expectations)
//!     → SmokeTestReport (Verified / VerificationFailed)
//! ```

pub mod matcher;
pub mod runner;
pub mod types;

pub use matcher::BodyMatcher;
pub use runner::SmokeTestRunner;
pub use types::{SmokeStatus, SmokeTest, SmokeTestReport, SmokeTestResult, VerificationStatus};
