//! One-shot `Call` requests.

use serde_json::Value;
use tracing::debug;

use super::{DISPATCH_TARGET, DispatchContext, deliver, invoke_guarded, settle};
use crate::protocol::{Outcome, RequestId, SymbolicPath};
use crate::resolver::ResolvedTarget;
use crate::value::{Arguments, DeferredResult, Invocation};

/// Invokes a host function and reports exactly one outcome for it.
#[derive(Debug, Clone)]
pub struct CallDispatcher {
    context: DispatchContext,
}

impl CallDispatcher {
    /// Creates a dispatcher over `context`.
    #[must_use]
    pub const fn new(context: DispatchContext) -> Self {
        Self { context }
    }

    /// Dispatches a call of the function at `path` with `args`.
    ///
    /// A missing or non-invocable target is reported as `NotFound`, a failed
    /// invocation as `Exception`, and a result as `Ok`. Deferred results are
    /// reported when they settle; this method returns without waiting.
    pub fn dispatch(&self, id: RequestId, path: SymbolicPath, args: Vec<Value>) {
        let ResolvedTarget { candidate, parent } = self.context.resolver().resolve(&path);
        let Some(function) = candidate.as_invocable() else {
            debug!(target: DISPATCH_TARGET, id = %id, cmd = %path, "call target not found");
            self.context.deliver(&id, Outcome::not_found(path));
            return;
        };

        match invoke_guarded(function.as_ref(), &parent, Arguments::new(args.clone())) {
            Ok(Invocation::Immediate(value)) => self.context.deliver(&id, Outcome::ok(value)),
            Ok(Invocation::Deferred(future)) => self.await_deferred(&id, path, args, future),
            Err(failure) => {
                debug!(target: DISPATCH_TARGET, id = %id, cmd = %path, %failure, "call failed");
                self.context
                    .deliver(&id, Outcome::exception(&failure, path, args));
            }
        }
    }

    fn await_deferred(&self, id: &RequestId, path: SymbolicPath, args: Vec<Value>, future: DeferredResult) {
        let reporter = self.context.reporter().clone();
        let task_id = id.clone();
        let task_path = path.clone();
        let task_args = args.clone();
        let spawned = self.context.spawn(async move {
            let outcome = match settle(future).await {
                Ok(value) => Outcome::ok(value),
                Err(failure) => Outcome::exception(&failure, task_path, task_args),
            };
            deliver(&reporter, &task_id, outcome);
        });
        if let Err(failure) = spawned {
            self.context
                .deliver(id, Outcome::exception(&failure, path, args));
        }
    }
}
