//! Readiness probing subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceRegistry
//!     → aggregator.rs (one task per service, barrier)
//!     → resilience::RetryScheduler (bounded fixed-interval attempts)
//!     → probe.rs (dispatch by probe kind)
//!         → http.rs (GET, status 200, optional JSON subset)
//!         → command.rs (exec in container, exit code 0)
//!     → state.rs (verdicts, overall status, ReadinessReport)
//! ```
//!
//! # Design Decisions
//! - A single attempt never retries; retry policy lives in one place
//! - Probe failures are data, not errors

pub mod aggregator;
pub mod command;
pub mod http;
pub mod probe;
pub mod state;

pub use aggregator::ReadinessAggregator;
pub use command::CommandProber;
pub use http::HttpProber;
pub use probe::{HealthProber, ProbeDispatcher};
pub use state::{
    FailureClass, OverallStatus, ProbeAttemptResult, ProbeStatus, ReadinessReport, ServiceVerdict,
    VerdictStatus,
};
