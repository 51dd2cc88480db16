//! Dispatch of decoded requests onto the host namespace.
//!
//! The [`RequestRouter`] decides what to do with a request from its kind
//! alone. `Call` requests go to the [`CallDispatcher`], `ListenOn` requests to
//! the [`SubscriptionDispatcher`]. Both dispatchers share a
//! [`DispatchContext`] and never block: synchronous results are reported
//! before they return, deferred results on a task tracked by the context.

mod call;
mod listen;
mod router;

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::warn;

pub use self::call::CallDispatcher;
pub use self::listen::SubscriptionDispatcher;
pub use self::router::{Disposition, RequestRouter};

use crate::protocol::{Outcome, RequestId};
use crate::reporter::Reporter;
use crate::resolver::Resolver;
use crate::subscriptions::SubscriptionRegistry;
use crate::value::{Arguments, DeferredResult, HostFailure, HostValue, Invocable, Invocation};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::dispatch");

/// State shared by the dispatchers of one bridge.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    resolver: Resolver,
    reporter: Reporter,
    tasks: TaskTracker,
    subscriptions: Arc<SubscriptionRegistry>,
}

impl DispatchContext {
    /// Creates a context resolving against `resolver` and reporting through
    /// `reporter`.
    #[must_use]
    pub fn new(resolver: Resolver, reporter: Reporter) -> Self {
        Self {
            resolver,
            reporter,
            tasks: TaskTracker::new(),
            subscriptions: Arc::new(SubscriptionRegistry::new()),
        }
    }

    /// Returns the path resolver.
    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Returns the outcome reporter.
    #[must_use]
    pub const fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Returns the tracker owning every task awaiting a deferred result.
    #[must_use]
    pub const fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    /// Returns the registry of live subscriptions.
    #[must_use]
    pub const fn subscriptions(&self) -> &Arc<SubscriptionRegistry> {
        &self.subscriptions
    }

    /// Reports `outcome` for `id`, logging when nobody is listening.
    pub(crate) fn deliver(&self, id: &RequestId, outcome: Outcome) {
        deliver(&self.reporter, id, outcome);
    }

    /// Runs `task` on the current runtime under the context's tracker.
    ///
    /// Fails when called outside a tokio runtime.
    pub(crate) fn spawn<F>(&self, task: F) -> Result<(), HostFailure>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|error| {
            HostFailure::named(
                "InternalError",
                format!("deferred result cannot be awaited: {error}"),
            )
        })?;
        self.tasks.spawn_on(task, &handle);
        Ok(())
    }
}

/// Reports `outcome` for `id`; a closed channel is logged and otherwise
/// ignored.
pub(crate) fn deliver(reporter: &Reporter, id: &RequestId, outcome: Outcome) {
    if let Err(error) = reporter.report(id, outcome) {
        warn!(target: DISPATCH_TARGET, %error, "outcome could not be delivered");
    }
}

/// Invokes `function`, converting a panic into a [`HostFailure`].
pub(crate) fn invoke_guarded(
    function: &dyn Invocable,
    receiver: &HostValue,
    args: Arguments,
) -> Result<Invocation, HostFailure> {
    guarded(|| function.invoke(receiver, args))
}

/// Runs a host operation, converting a panic into a [`HostFailure`].
pub(crate) fn guarded<T>(operation: impl FnOnce() -> Result<T, HostFailure>) -> Result<T, HostFailure> {
    panic::catch_unwind(AssertUnwindSafe(operation))
        .unwrap_or_else(|payload| Err(HostFailure::from_panic(payload.as_ref())))
}

/// Awaits a deferred result, converting a panic into a [`HostFailure`].
pub(crate) async fn settle(future: DeferredResult) -> Result<Option<Value>, HostFailure> {
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(HostFailure::from_panic(payload.as_ref())))
}
