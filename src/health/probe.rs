//! The probe contract and per-kind dispatch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::ContainerEngine;
use crate::health::command::CommandProber;
use crate::health::http::HttpProber;
use crate::health::state::{FailureClass, ProbeAttemptResult};
use crate::registry::{ProbeKind, ServiceSpec};

/// Executes exactly one probe attempt against a service.
///
/// Implementations enforce the service's per-attempt timeout themselves and
/// never cache results. New liveness mechanisms plug in here without
/// touching retry or aggregation logic.
#[async_trait]
pub trait HealthProber: Send + Sync {
    async fn probe(&self, spec: &ServiceSpec) -> ProbeAttemptResult;
}

/// Routes each spec to the prober for its probe kind.
pub struct ProbeDispatcher {
    http: Arc<dyn HealthProber>,
    command: Arc<dyn HealthProber>,
}

impl ProbeDispatcher {
    /// Standard probers: `reqwest` for HTTP, the container engine for commands.
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self {
            http: Arc::new(HttpProber::default()),
            command: Arc::new(CommandProber::new(engine)),
        }
    }

    pub fn with_probers(http: Arc<dyn HealthProber>, command: Arc<dyn HealthProber>) -> Self {
        Self { http, command }
    }
}

#[async_trait]
impl HealthProber for ProbeDispatcher {
    async fn probe(&self, spec: &ServiceSpec) -> ProbeAttemptResult {
        match spec.kind() {
            ProbeKind::HttpProbe => self.http.probe(spec).await,
            ProbeKind::CommandProbe => self.command.probe(spec).await,
        }
    }
}

/// Result for a spec routed to a prober of the wrong kind.
pub(crate) fn kind_mismatch(expected: ProbeKind, spec: &ServiceSpec) -> ProbeAttemptResult {
    ProbeAttemptResult::error(
        FailureClass::ProbeError,
        Duration::ZERO,
        format!("{} prober cannot handle {} target", expected, spec.kind()),
    )
}
