//! Structured health reporting for host lifecycle events.

use std::sync::Arc;

use foreign_config::Config;

use crate::bootstrap::BootstrapError;
use crate::transport::ShutdownReason;

const HEALTH_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked when the transport stops accepting requests.
    fn transport_closed(&self, reason: ShutdownReason);

    /// Invoked once queued responses have been written and the host is
    /// about to exit.
    fn shutdown_complete(&self, settled: bool, drained: usize);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn transport_closed(&self, reason: ShutdownReason) {
        (**self).transport_closed(reason);
    }

    fn shutdown_complete(&self, settled: bool, drained: usize) {
        (**self).shutdown_complete(settled, drained);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting bridge host bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            unsupported_kinds = %config.unsupported_kinds(),
            shutdown_grace_ms = config.shutdown_grace_ms,
            "bridge host bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "bridge host bootstrap failed"
        );
    }

    fn transport_closed(&self, reason: ShutdownReason) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "transport_closed",
            reason = %reason,
            "transport stopped accepting requests"
        );
    }

    fn shutdown_complete(&self, settled: bool, drained: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_complete",
            settled,
            drained,
            "bridge host shut down"
        );
    }
}
