//! Routing of request envelopes by kind.

use tracing::{debug, warn};

use super::{CallDispatcher, DISPATCH_TARGET, DispatchContext, SubscriptionDispatcher};
use crate::protocol::{CallKind, Outcome, RequestEnvelope, RequestId, SymbolicPath};

/// What the router did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Handed to the call dispatcher.
    Called,
    /// Handed to the subscription dispatcher.
    Subscribed,
    /// The kind is recognised but not implemented.
    Unsupported {
        /// Whether an `Unsupported` outcome was sent to the caller.
        replied: bool,
    },
}

/// Dispatches envelopes on their kind alone.
///
/// `New`, `Create` and `InvokeOn` are logged and otherwise dropped unless the
/// router was built to reply to them.
#[derive(Debug, Clone)]
pub struct RequestRouter {
    calls: CallDispatcher,
    subscriptions: SubscriptionDispatcher,
    context: DispatchContext,
    reply_unsupported: bool,
}

impl RequestRouter {
    /// Creates a router over `context`.
    #[must_use]
    pub fn new(context: DispatchContext, reply_unsupported: bool) -> Self {
        Self {
            calls: CallDispatcher::new(context.clone()),
            subscriptions: SubscriptionDispatcher::new(context.clone()),
            context,
            reply_unsupported,
        }
    }

    /// Routes one request.
    #[must_use]
    pub fn route(&self, envelope: RequestEnvelope) -> Disposition {
        let RequestEnvelope {
            id,
            kind,
            path,
            args,
            target,
        } = envelope;
        debug!(target: DISPATCH_TARGET, id = %id, kind = kind.as_str(), cmd = %path, "routing request");
        match kind {
            CallKind::Call => {
                self.calls.dispatch(id, path, args);
                Disposition::Called
            }
            CallKind::ListenOn => {
                self.subscriptions.dispatch(id, path, args, target.as_deref());
                Disposition::Subscribed
            }
            CallKind::New | CallKind::Create | CallKind::InvokeOn => self.unsupported(&id, kind, path),
        }
    }

    /// Answers a request whose kind could not be decoded at all.
    pub fn reject_unroutable(&self, id: &RequestId, kind: &str) {
        warn!(target: DISPATCH_TARGET, id = %id, kind, "unknown request kind");
        self.context.deliver(id, Outcome::unsupported(kind, None));
    }

    fn unsupported(&self, id: &RequestId, kind: CallKind, path: SymbolicPath) -> Disposition {
        warn!(
            target: DISPATCH_TARGET,
            id = %id,
            kind = kind.as_str(),
            cmd = %path,
            replied = self.reply_unsupported,
            "request kind is not implemented"
        );
        if self.reply_unsupported {
            self.context
                .deliver(id, Outcome::unsupported(kind.as_str(), Some(path)));
        }
        Disposition::Unsupported {
            replied: self.reply_unsupported,
        }
    }
}
