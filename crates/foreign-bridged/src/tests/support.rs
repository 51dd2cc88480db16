//! Worlds and test doubles for the host behavioural suites.

use std::ffi::OsString;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;

use foreign_config::{Config, UnsupportedPolicy};

use crate::bootstrap::{BootstrapError, ConfigLoader, Host, StaticConfigLoader, bootstrap_with};
use crate::health::HealthReporter;
use crate::process::serve;
use crate::transport::ShutdownReason;

/// Capacity of each in-memory pipe between the world and the host.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Lifecycle events captured by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    TransportClosed(ShutdownReason),
    ShutdownComplete { settled: bool, drained: usize },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub(super) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub(super) fn events(&self) -> Vec<HealthEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn transport_closed(&self, reason: ShutdownReason) {
        self.record(HealthEvent::TransportClosed(reason));
    }

    fn shutdown_complete(&self, settled: bool, drained: usize) {
        self.record(HealthEvent::ShutdownComplete { settled, drained });
    }
}

/// Loader that fails by passing an invalid flag value.
pub(super) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("foreign-bridged"),
            OsString::from("--unsupported-kinds"),
            OsString::from("shrug"),
        ];
        Config::load_from_iter(args)
    }
}

/// Configuration used by the suites: quiet logs and a short grace period.
pub(super) fn test_config() -> Config {
    Config {
        log_filter: String::from("off"),
        shutdown_grace_ms: 500,
        ..Config::default()
    }
}

/// Scenario world for bootstrap behaviour.
pub(super) struct BootstrapWorld {
    loader: Box<dyn ConfigLoader>,
    pub(super) reporter: Arc<RecordingHealthReporter>,
    host: Option<Host>,
    error: Option<BootstrapError>,
}

impl BootstrapWorld {
    pub(super) fn new() -> Self {
        Self {
            loader: Box::new(StaticConfigLoader::new(test_config())),
            reporter: Arc::new(RecordingHealthReporter::default()),
            host: None,
            error: None,
        }
    }

    pub(super) fn use_config(&mut self, config: Config) {
        self.loader = Box::new(StaticConfigLoader::new(config));
    }

    pub(super) fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
    }

    pub(super) fn bootstrap(&mut self) {
        match bootstrap_with(&*self.loader, self.reporter.clone()) {
            Ok(host) => self.host = Some(host),
            Err(error) => self.error = Some(error),
        }
    }

    pub(super) const fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    pub(super) const fn error(&self) -> Option<&BootstrapError> {
        self.error.as_ref()
    }
}

/// Scenario world driving [`serve`] over in-memory pipes.
pub(super) struct ServeWorld {
    config: Config,
    pub(super) reporter: Arc<RecordingHealthReporter>,
    lines: Vec<String>,
    hold_open: Option<Duration>,
    request_shutdown_after: Option<Duration>,
    output: Option<String>,
}

impl ServeWorld {
    pub(super) fn new() -> Self {
        Self {
            config: test_config(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            lines: Vec::new(),
            hold_open: None,
            request_shutdown_after: None,
            output: None,
        }
    }

    pub(super) const fn answer_unsupported(&mut self) {
        self.config.unsupported_kinds = UnsupportedPolicy::Reply;
    }

    pub(super) const fn set_grace(&mut self, millis: u64) {
        self.config.shutdown_grace_ms = millis;
    }

    pub(super) fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub(super) const fn hold_input_open(&mut self, millis: u64) {
        self.hold_open = Some(Duration::from_millis(millis));
    }

    pub(super) const fn request_shutdown_after(&mut self, millis: u64) {
        self.request_shutdown_after = Some(Duration::from_millis(millis));
    }

    /// Bootstraps a host, writes the queued lines, and serves until shutdown.
    pub(super) fn run(&mut self) {
        let host = bootstrap_with(
            &StaticConfigLoader::new(self.config.clone()),
            self.reporter.clone(),
        )
        .expect("bootstrap host");
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("build test runtime");

        let (mut client_in, server_in) = tokio::io::duplex(PIPE_CAPACITY);
        let (server_out, mut client_out) = tokio::io::duplex(PIPE_CAPACITY);
        let shutdown = CancellationToken::new();
        let input = self.lines.join("\n");
        let hold_open = self.hold_open;
        let request_shutdown_after = self.request_shutdown_after;

        let output = runtime.block_on(async {
            let feed = async {
                client_in.write_all(input.as_bytes()).await.expect("write requests");
                client_in.write_all(b"\n").await.expect("write delimiter");
                if let Some(delay) = hold_open {
                    tokio::time::sleep(delay).await;
                }
                drop(client_in);
            };
            let interrupt = async {
                if let Some(delay) = request_shutdown_after {
                    tokio::time::sleep(delay).await;
                    shutdown.cancel();
                }
            };
            let collect = async {
                let mut text = String::new();
                client_out.read_to_string(&mut text).await.expect("read responses");
                text
            };
            let serving = async {
                serve(&host, server_in, server_out, &shutdown)
                    .await
                    .expect("serve until shutdown");
            };
            let ((), (), text, ()) = tokio::join!(feed, interrupt, collect, serving);
            text
        });
        self.output = Some(output);
    }

    /// Returns every response line decoded as JSON.
    pub(super) fn responses(&self) -> Vec<Value> {
        self.output
            .as_deref()
            .expect("host has not run")
            .lines()
            .map(|line| serde_json::from_str(line).expect("response line is JSON"))
            .collect()
    }

    /// Returns the outcomes reported for `id`, in arrival order.
    pub(super) fn outcomes_for(&self, id: &str) -> Vec<Value> {
        self.responses()
            .into_iter()
            .filter(|response| response.get(0).and_then(Value::as_str) == Some(id))
            .filter_map(|response| response.get(1).cloned())
            .collect()
    }
}
