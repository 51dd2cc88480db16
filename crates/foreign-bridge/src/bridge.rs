//! The bridge facade tying resolution, dispatch and reporting together.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::dispatch::{Disposition, DispatchContext, RequestRouter};
use crate::protocol::{RequestEnvelope, RequestId};
use crate::reporter::Reporter;
use crate::resolver::Resolver;
use crate::value::HostValue;

const BRIDGE_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::bridge");

/// Behavioural switches for a [`Bridge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Answer `New`, `Create` and `InvokeOn` requests with an `Unsupported`
    /// outcome instead of dropping them.
    pub reply_unsupported: bool,
}

impl BridgeOptions {
    /// Sets whether unimplemented request kinds are answered.
    #[must_use]
    pub const fn with_reply_unsupported(mut self, reply: bool) -> Self {
        self.reply_unsupported = reply;
        self
    }
}

/// Executes requests from the application core against a host namespace.
///
/// Responses leave through the [`Reporter`] the bridge was built with, in the
/// order they are produced.
#[derive(Debug, Clone)]
pub struct Bridge {
    router: RequestRouter,
    context: DispatchContext,
}

impl Bridge {
    /// Creates a bridge resolving paths from `root`.
    #[must_use]
    pub fn new(root: HostValue, reporter: Reporter, options: BridgeOptions) -> Self {
        let context = DispatchContext::new(Resolver::new(root), reporter);
        Self {
            router: RequestRouter::new(context.clone(), options.reply_unsupported),
            context,
        }
    }

    /// Handles one request without waiting for deferred results.
    #[must_use]
    pub fn handle(&self, envelope: RequestEnvelope) -> Disposition {
        self.router.route(envelope)
    }

    /// Answers a request whose kind could not be decoded.
    pub fn reject_unroutable(&self, id: &RequestId, kind: &str) {
        self.router.reject_unroutable(id, kind);
    }

    /// Handles requests from `inbound` until it closes or `shutdown` fires.
    pub async fn serve(&self, mut inbound: mpsc::Receiver<RequestEnvelope>, shutdown: CancellationToken) {
        debug!(target: BRIDGE_TARGET, "serving requests");
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    debug!(target: BRIDGE_TARGET, "shutdown requested");
                    break;
                }
                next = inbound.recv() => {
                    let Some(envelope) = next else {
                        debug!(target: BRIDGE_TARGET, "request channel closed");
                        break;
                    };
                    let disposition = self.handle(envelope);
                    trace!(target: BRIDGE_TARGET, ?disposition, "request handled");
                }
            }
        }
    }

    /// Cancels the subscription registered under `id`.
    ///
    /// Returns `false` when no such subscription is live.
    #[must_use]
    pub fn unsubscribe(&self, id: &RequestId) -> bool {
        self.context.subscriptions().cancel(id)
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.context.subscriptions().len()
    }

    /// Returns the number of calls still awaiting a deferred result.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.context.tasks().len()
    }

    /// Cancels every subscription and waits for in-flight deferred calls.
    pub async fn shutdown(&self) {
        info!(
            target: BRIDGE_TARGET,
            subscriptions = self.active_subscriptions(),
            pending = self.pending_tasks(),
            "shutting down bridge"
        );
        self.context.subscriptions().cancel_all();
        self.context.tasks().close();
        self.context.tasks().wait().await;
    }
}
