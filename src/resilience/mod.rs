//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Readiness check for one service:
//!     → retries.rs (attempt loop, fixed interval, cancellation)
//!     → timeouts.rs (deadline on every single probe attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retry budget per service is `max_attempts`, validated against a ceiling

pub mod retries;
pub mod timeouts;

pub use retries::RetryScheduler;
