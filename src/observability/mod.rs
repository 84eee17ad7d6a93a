//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events to stderr)
//!
//! Spans:
//!     readiness_check{check_id} → resolve{service}
//! ```

pub mod logging;
