//! Outbound half of the transport.
//!
//! Every outcome the bridge produces is sent through a [`Reporter`]. The
//! channel is unbounded because host callbacks fire synchronously and must
//! never block on a slow consumer; ordering per sender is preserved, so the
//! events of one subscription reach the consumer in the order they fired.

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::BridgeError;
use crate::protocol::{Outcome, RequestId, Response};

/// Tracing target for outcome delivery.
pub(crate) const REPORT_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::report");

/// Receiving end of the response channel.
pub type ResponseReceiver = mpsc::UnboundedReceiver<Response>;

/// Sends outcome envelopes to the application core.
#[derive(Debug, Clone)]
pub struct Reporter {
    sender: mpsc::UnboundedSender<Response>,
}

impl Reporter {
    /// Wraps an existing response sender.
    #[must_use]
    pub const fn new(sender: mpsc::UnboundedSender<Response>) -> Self {
        Self { sender }
    }

    /// Creates a reporter together with the receiver its responses reach.
    #[must_use]
    pub fn channel() -> (Self, ResponseReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    /// Sends `outcome` addressed to `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ChannelClosed`] when the receiver has been
    /// dropped.
    pub fn report(&self, id: &RequestId, outcome: Outcome) -> Result<(), BridgeError> {
        trace!(
            target: REPORT_TARGET,
            id = %id,
            outcome = outcome.tag(),
            "reporting outcome"
        );
        self.sender
            .send(Response::new(id.clone(), outcome))
            .map_err(|_| BridgeError::channel_closed(id))
    }

    /// Returns `true` once the receiver has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
