//! Process lifecycle: runtime, signal handling and orderly shutdown.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use foreign_bridge::{Bridge, HostValue, Reporter, globals};

use crate::bootstrap::{ConfigLoader, Host, bootstrap_with};
use crate::health::HealthReporter;
use crate::transport::{LineTransport, TransportError};

const PROCESS_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::process");

/// How long the runtime waits for blocking work, such as a pending stdin
/// read, once serving has finished.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(250);

/// Runs the host over stdin and stdout until input ends or ctrl-c arrives.
///
/// Failures before telemetry is available are written to `stderr`. Returns
/// success after a clean shutdown and failure when bootstrap or the transport
/// fails.
pub fn run<E>(loader: &dyn ConfigLoader, reporter: Arc<dyn HealthReporter>, stderr: &mut E) -> ExitCode
where
    E: Write,
{
    let host = match bootstrap_with(loader, reporter) {
        Ok(host) => host,
        Err(error) => {
            let _ = writeln!(stderr, "foreign-bridged: {error}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let _ = writeln!(stderr, "foreign-bridged: failed to start async runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    let result = runtime.block_on(async {
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(target: PROCESS_TARGET, "interrupt received");
                signal_token.cancel();
            }
        });
        serve(&host, tokio::io::stdin(), tokio::io::stdout(), &shutdown).await
    });
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(target: PROCESS_TARGET, %error, "transport failed");
            ExitCode::FAILURE
        }
    }
}

/// Serves the standard namespace over `reader` and `writer`.
///
/// After the transport closes, every subscription is cancelled and in-flight
/// deferred calls get the configured grace period to settle; whatever
/// responses they produced in time are written before returning.
///
/// # Errors
///
/// Returns [`TransportError`] when either stream fails.
pub async fn serve<R, W>(
    host: &Host,
    reader: R,
    writer: W,
    shutdown: &CancellationToken,
) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (reporter, mut outcomes) = Reporter::channel();
    let bridge = Bridge::new(HostValue::from(globals::standard()), reporter, host.bridge_options());
    let mut transport = LineTransport::new(reader, writer);

    let reason = transport.run(&bridge, &mut outcomes, shutdown).await?;
    host.reporter().transport_closed(reason);

    let grace = host.config().shutdown_grace();
    let settled = tokio::time::timeout(grace, bridge.shutdown()).await.is_ok();
    if !settled {
        warn!(
            target: PROCESS_TARGET,
            pending = bridge.pending_tasks(),
            grace_ms = host.config().shutdown_grace_ms,
            "grace period elapsed with deferred calls still pending"
        );
    }

    let drained = transport.drain(&mut outcomes).await?;
    host.reporter().shutdown_complete(settled, drained);
    Ok(())
}
