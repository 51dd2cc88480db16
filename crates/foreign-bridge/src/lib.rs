//! Request bridge between an application core and a host namespace.
//!
//! The application core addresses host capabilities by symbolic path, such
//! as `["Math", "max"]`, and receives tagged outcome envelopes back. The
//! bridge resolves each path against a root namespace supplied by its
//! embedder, invokes what it finds, and reports the result:
//!
//! - `Call` requests produce exactly one `Ok`, `Exception` or `NotFound`
//!   envelope. Deferred results are reported whenever they settle, so
//!   responses to independent calls may arrive out of order.
//! - `ListenOn` requests register a callback and produce one `Ok` envelope
//!   per event until the subscription is cancelled.
//! - `New`, `Create` and `InvokeOn` are recognised but not implemented; they
//!   are logged and, when [`BridgeOptions::reply_unsupported`] is set,
//!   answered with an `Unsupported` envelope.
//!
//! Host operations never crash the bridge. Failures and panics alike are
//! caught at the dispatch boundary and reported as `Exception` envelopes.
//!
//! ```text
//! RequestEnvelope ──► RequestRouter ──► CallDispatcher ─────────┐
//!                                  └──► SubscriptionDispatcher ─┴─► Reporter ──► Response
//! ```

mod bridge;
mod callback;
pub mod dispatch;
mod error;
pub mod globals;
mod protocol;
mod reporter;
mod resolver;
mod subscriptions;
mod value;

pub use bridge::{Bridge, BridgeOptions};
pub use callback::EventCallback;
pub use error::{BridgeError, ProtocolError};
pub use protocol::{CallKind, Outcome, RequestEnvelope, RequestId, Response, SymbolicPath};
pub use reporter::{Reporter, ResponseReceiver};
pub use resolver::{ResolvedTarget, Resolver};
pub use subscriptions::{Registration, SubscriptionRegistry};
pub use value::{
    Arguments, DeferredResult, EventSource, HostFailure, HostObject, HostValue, Invocable,
    Invocation,
};

#[cfg(test)]
mod tests;
