//! Host process for the foreign request bridge.
//!
//! The host loads layered configuration, initialises structured telemetry,
//! and serves the standard host namespace of [`foreign_bridge`] over a JSON
//! Lines stream: requests on stdin, responses on stdout, logs on stderr.
//!
//! Shutdown is orderly. When stdin reaches end of input or ctrl-c arrives,
//! the host stops reading, cancels every subscription, grants in-flight
//! deferred calls a configurable grace period, and writes whatever responses
//! they produced before exiting. Lifecycle milestones are reported through a
//! [`HealthReporter`].

mod bootstrap;
mod health;
mod process;
pub mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Host, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{run, serve};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{LineTransport, MAX_LINE_BYTES, ShutdownReason, TransportError};

#[cfg(test)]
mod tests;
