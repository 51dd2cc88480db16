//! Callbacks minted for standing subscriptions.

use std::fmt;

use serde_json::Value;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, trace};

use crate::protocol::{Outcome, RequestId};
use crate::reporter::{REPORT_TARGET, Reporter};

/// Reports every event of one subscription under its request identifier.
///
/// Host code keeps the callback for as long as it wants to deliver events.
/// Once the registration is cancelled, [`emit`](Self::emit) drops payloads
/// and [`cancelled`](Self::cancelled) resolves, letting long-running host
/// tasks wind down.
#[derive(Clone)]
pub struct EventCallback {
    id: RequestId,
    reporter: Reporter,
    token: CancellationToken,
}

impl EventCallback {
    /// Creates a callback for the registration `id`, live until `token` is
    /// cancelled.
    #[must_use]
    pub const fn new(id: RequestId, reporter: Reporter, token: CancellationToken) -> Self {
        Self {
            id,
            reporter,
            token,
        }
    }

    /// Returns the identifier events are reported under.
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.id
    }

    /// Reports one event as an `Ok` outcome.
    ///
    /// Returns `false` when the event was dropped because the registration
    /// was cancelled or the response channel is closed; host code should stop
    /// firing at that point.
    #[must_use = "a false return means the subscription is gone"]
    pub fn emit(&self, payload: Option<Value>) -> bool {
        if self.token.is_cancelled() {
            trace!(target: REPORT_TARGET, id = %self.id, "dropping event for cancelled subscription");
            return false;
        }
        match self.reporter.report(&self.id, Outcome::ok(payload)) {
            Ok(()) => true,
            Err(error) => {
                debug!(target: REPORT_TARGET, %error, "dropping subscription event");
                false
            }
        }
    }

    /// Returns `true` once the registration has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the registration is cancelled.
    #[must_use]
    pub fn cancelled(&self) -> WaitForCancellationFutureOwned {
        self.token.clone().cancelled_owned()
    }
}

impl fmt::Debug for EventCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCallback")
            .field("id", &self.id)
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}
