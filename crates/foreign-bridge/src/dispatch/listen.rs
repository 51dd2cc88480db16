//! Standing `ListenOn` subscriptions.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::{DISPATCH_TARGET, DispatchContext, deliver, guarded, invoke_guarded, settle};
use crate::callback::EventCallback;
use crate::protocol::{Outcome, RequestId, SymbolicPath};
use crate::resolver::ResolvedTarget;
use crate::subscriptions::Registration;
use crate::value::{
    Arguments, DeferredResult, EventSource, HostFailure, HostValue, Invocable, Invocation,
};

/// Registers callbacks that report every event under one request identifier.
#[derive(Debug, Clone)]
pub struct SubscriptionDispatcher {
    context: DispatchContext,
}

/// Call context echoed by `Exception` outcomes.
struct Request {
    id: RequestId,
    path: SymbolicPath,
    args: Vec<Value>,
}

impl SubscriptionDispatcher {
    /// Creates a dispatcher over `context`.
    #[must_use]
    pub const fn new(context: DispatchContext) -> Self {
        Self { context }
    }

    /// Subscribes to the target at `path`.
    ///
    /// A function target is called once with a fresh callback ahead of
    /// `args`. An object with an event source gets the callback registered
    /// for the event named by `args[0]`, with `args[1]` as options. Anything
    /// else is reported as `NotFound`. `target` is accepted for routing
    /// across surfaces and has no effect.
    pub fn dispatch(&self, id: RequestId, path: SymbolicPath, args: Vec<Value>, target: Option<&str>) {
        if let Some(surface) = target {
            debug!(target: DISPATCH_TARGET, id = %id, surface, "ignoring routing target");
        }
        let ResolvedTarget { candidate, parent } = self.context.resolver().resolve(&path);
        let request = Request { id, path, args };

        if let Some(function) = candidate.as_invocable() {
            self.subscribe_function(&function, &parent, request);
        } else if let Some(source) = candidate.listener_capability() {
            self.subscribe_listener(&source, request);
        } else {
            debug!(target: DISPATCH_TARGET, id = %request.id, cmd = %request.path, "subscription target not found");
            self.context.deliver(&request.id, Outcome::not_found(request.path));
        }
    }

    fn subscribe_function(&self, function: &Arc<dyn Invocable>, receiver: &HostValue, request: Request) {
        let (registration, callback) = self.mint_callback(&request.id);
        let args = Arguments::with_callback(callback, request.args.clone());
        match invoke_guarded(function.as_ref(), receiver, args) {
            Ok(Invocation::Immediate(_)) => {
                debug!(target: DISPATCH_TARGET, id = %request.id, cmd = %request.path, "function subscribed");
            }
            Ok(Invocation::Deferred(future)) => self.watch_deferred(&registration, request, future),
            Err(failure) => self.fail(&registration, request, &failure),
        }
    }

    fn subscribe_listener(&self, source: &Arc<dyn EventSource>, request: Request) {
        let Some(event) = request.args.first().and_then(Value::as_str).map(str::to_owned) else {
            let failure = HostFailure::type_error("event name must be a string");
            self.context
                .deliver(&request.id, Outcome::exception(&failure, request.path, request.args));
            return;
        };
        let options = request.args.get(1).cloned();
        let (registration, callback) = self.mint_callback(&request.id);
        match guarded(|| source.add_event_listener(&event, callback, options)) {
            Ok(()) => {
                debug!(
                    target: DISPATCH_TARGET,
                    id = %request.id,
                    cmd = %request.path,
                    event = event.as_str(),
                    "listener registered"
                );
            }
            Err(failure) => self.fail(&registration, request, &failure),
        }
    }

    fn mint_callback(&self, id: &RequestId) -> (Registration, EventCallback) {
        let registration = self.context.subscriptions().register(id.clone());
        let callback = EventCallback::new(
            id.clone(),
            self.context.reporter().clone(),
            registration.token().clone(),
        );
        (registration, callback)
    }

    /// Awaits a subscribing function's deferred return; only a rejection is
    /// reported.
    fn watch_deferred(&self, registration: &Registration, request: Request, future: DeferredResult) {
        let reporter = self.context.reporter().clone();
        let registry = Arc::clone(self.context.subscriptions());
        let task_id = request.id.clone();
        let task_path = request.path.clone();
        let task_args = request.args.clone();
        let task_registration = registration.clone();
        let spawned = self.context.spawn(async move {
            if let Err(failure) = settle(future).await {
                registry.release(&task_id, &task_registration);
                deliver(&reporter, &task_id, Outcome::exception(&failure, task_path, task_args));
            }
        });
        if let Err(failure) = spawned {
            self.fail(registration, request, &failure);
        }
    }

    fn fail(&self, registration: &Registration, request: Request, failure: &HostFailure) {
        debug!(target: DISPATCH_TARGET, id = %request.id, cmd = %request.path, %failure, "subscription failed");
        self.context.subscriptions().release(&request.id, registration);
        self.context
            .deliver(&request.id, Outcome::exception(failure, request.path, request.args));
    }
}
