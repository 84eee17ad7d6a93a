//! OS signal handling.
//!
//! # Responsibilities
//! - Translate Ctrl-C into a shutdown trigger
//! - Enforce the optional overall deadline
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A second Ctrl-C is left to the default handler once the listener task exits

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Trigger `shutdown` on the first Ctrl-C.
pub fn spawn_ctrl_c_listener(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupt received, cancelling in-flight checks");
                shutdown.trigger();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    })
}

/// Install the Ctrl-C listener and, when given, the overall deadline.
pub fn install(shutdown: &Shutdown, deadline: Option<Duration>) -> Vec<JoinHandle<()>> {
    let mut handles = vec![spawn_ctrl_c_listener(shutdown.clone())];
    if let Some(deadline) = deadline {
        handles.push(shutdown.trigger_after(deadline));
    }
    handles
}
