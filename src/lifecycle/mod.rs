//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator (orchestrator.rs):
//!     configure → start → probe → verify → teardown
//!
//! Shutdown (shutdown.rs):
//!     Trigger → every in-flight probe and smoke test sees cancellation
//!
//! Signals (signals.rs):
//!     SIGINT / deadline → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Only the orchestrator mutates environment state
//! - Cancellation is observed at attempt boundaries and during waits
//! - Teardown always ends in TornDown, even when the engine fails

pub mod orchestrator;
pub mod shutdown;
pub mod signals;

pub use orchestrator::{EnvState, Orchestrator};
pub use shutdown::{Shutdown, ShutdownSignal};
