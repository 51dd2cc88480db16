//! JSON Lines transport between the application core and the bridge.
//!
//! Each inbound line holds one request envelope; each outbound line holds one
//! `[id, outcome]` response. Lines are framed with [`LinesCodec`], which also
//! enforces the per-line size limit.

use std::fmt;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use foreign_bridge::{Bridge, ProtocolError, RequestEnvelope, Response, ResponseReceiver};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::transport");

/// Maximum accepted size of one request line, in bytes.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Why the transport stopped accepting requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The request stream reached end of input.
    EndOfInput,
    /// Shutdown was requested, usually by a signal.
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EndOfInput => "end_of_input",
            Self::Requested => "requested",
        })
    }
}

/// Errors that end the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading the request stream failed.
    #[error("failed to read request stream: {source}")]
    Read {
        /// Underlying codec error.
        #[source]
        source: LinesCodecError,
    },
    /// Writing the response stream failed.
    #[error("failed to write response stream: {source}")]
    Write {
        /// Underlying codec error.
        #[source]
        source: LinesCodecError,
    },
    /// A response could not be encoded.
    #[error("failed to encode response: {source}")]
    Encode {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
}

/// Line-framed request reader and response writer.
pub struct LineTransport<R, W> {
    requests: FramedRead<R, LinesCodec>,
    responses: FramedWrite<W, LinesCodec>,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Frames `reader` and `writer`.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            requests: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_BYTES)),
            responses: FramedWrite::new(writer, LinesCodec::new()),
        }
    }

    /// Feeds requests to `bridge` and writes its responses until the input
    /// ends or `shutdown` fires.
    ///
    /// Malformed and oversized lines are logged and skipped. Lines whose
    /// `__type` is unknown are answered as unsupported when their `id` can be
    /// recovered.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when either stream fails.
    pub async fn run(
        &mut self,
        bridge: &Bridge,
        outcomes: &mut ResponseReceiver,
        shutdown: &CancellationToken,
    ) -> Result<ShutdownReason, TransportError> {
        // A framed stream yields one `None` after a decode error before it
        // resumes reading.
        let mut resuming = false;
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => return Ok(ShutdownReason::Requested),
                Some(response) = outcomes.recv() => self.write(&response).await?,
                line = self.requests.next() => match line {
                    None if resuming => resuming = false,
                    None => return Ok(ShutdownReason::EndOfInput),
                    Some(Ok(line)) => accept(bridge, &line),
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        warn!(
                            target: TRANSPORT_TARGET,
                            max_bytes = MAX_LINE_BYTES,
                            "discarding oversized request line"
                        );
                        resuming = true;
                    }
                    Some(Err(source)) => return Err(TransportError::Read { source }),
                },
            }
        }
    }

    /// Writes every response already queued, returning how many were written.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the response stream fails.
    pub async fn drain(&mut self, outcomes: &mut ResponseReceiver) -> Result<usize, TransportError> {
        let mut written = 0_usize;
        while let Ok(response) = outcomes.try_recv() {
            self.write(&response).await?;
            written = written.saturating_add(1);
        }
        debug!(target: TRANSPORT_TARGET, written, "drained queued responses");
        Ok(written)
    }

    async fn write(&mut self, response: &Response) -> Result<(), TransportError> {
        let line = serde_json::to_string(response).map_err(|source| TransportError::Encode { source })?;
        trace!(target: TRANSPORT_TARGET, id = %response.id(), "writing response");
        self.responses
            .send(line)
            .await
            .map_err(|source| TransportError::Write { source })
    }
}

/// Decodes one request line and hands it to the bridge.
fn accept(bridge: &Bridge, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    match RequestEnvelope::parse(line.as_bytes()) {
        Ok(envelope) => {
            let disposition = bridge.handle(envelope);
            trace!(target: TRANSPORT_TARGET, ?disposition, "request accepted");
        }
        Err(ProtocolError::UnknownKind { id: Some(id), kind }) => bridge.reject_unroutable(&id, &kind),
        Err(error) => warn!(target: TRANSPORT_TARGET, %error, "discarding request line"),
    }
}
