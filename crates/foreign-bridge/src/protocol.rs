//! Wire protocol between the application core and the bridge.
//!
//! Requests arrive as JSON objects:
//!
//! ```json
//! {"id":"r1","__type":"Call","cmd":["Math","max"],"args":[3,7]}
//! ```
//!
//! and every outcome leaves as a two-element array keyed by the request
//! identifier:
//!
//! ```json
//! ["r1",{"__type":"Ok","value":7}]
//! ```
//!
//! Argument and result payloads are opaque JSON values. The bridge never
//! inspects them beyond handing them to the host operation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::value::HostFailure;

/// Opaque caller-supplied token correlating a request with its outcomes.
///
/// Any JSON value is accepted and echoed back verbatim, so callers may use
/// strings, numbers or structured tokens. The bridge never mints
/// identifiers. A `ListenOn` request keeps its identifier alive for every
/// event it reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Value);

impl RequestId {
    /// Wraps a textual token.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Value::String(id.into()))
    }

    /// Returns the token text when the caller used a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Returns the token as the caller sent it.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }
}

// Equal JSON values render identically, so hashing the rendering agrees with
// the derived equality.
impl Hash for RequestId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(text) => f.write_str(text),
            other => write!(f, "{other}"),
        }
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Value> for RequestId {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Non-empty sequence of property names locating a value in the namespace.
///
/// `["console", "log"]` names the `log` property of the `console` object
/// hanging off the root namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SymbolicPath(Vec<String>);

impl SymbolicPath {
    /// Builds a path from its segments.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::EmptyPath`] when no segments are supplied.
    pub fn new<I, S>(segments: I) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(ProtocolError::EmptyPath);
        }
        Ok(Self(segments))
    }

    /// Returns every segment in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the segments locating the containing object.
    ///
    /// A single-segment path has an empty parent, which resolves to the root
    /// namespace.
    #[must_use]
    pub fn parent(&self) -> &[String] {
        self.0.split_last().map_or(&[][..], |(_, rest)| rest)
    }

    /// Returns the final segment.
    #[must_use]
    pub fn last(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for SymbolicPath {
    type Error = ProtocolError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<SymbolicPath> for Vec<String> {
    fn from(path: SymbolicPath) -> Self {
        path.0
    }
}

impl FromStr for SymbolicPath {
    type Err = ProtocolError;

    /// Parses a dotted path such as `Math.max`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ProtocolError::EmptyPath);
        }
        Self::new(s.split('.'))
    }
}

impl fmt::Display for SymbolicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Kinds of request the application core can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// Invoke a function once and report its result.
    Call,
    /// Construct a value. Recognised but not implemented.
    New,
    /// Create a value. Recognised but not implemented.
    Create,
    /// Invoke a method on a held value. Recognised but not implemented.
    InvokeOn,
    /// Register a standing subscription reporting every event.
    ListenOn,
}

impl CallKind {
    /// Parses a wire discriminator (case-sensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Call" => Some(Self::Call),
            "New" => Some(Self::New),
            "Create" => Some(Self::Create),
            "InvokeOn" => Some(Self::InvokeOn),
            "ListenOn" => Some(Self::ListenOn),
            _ => None,
        }
    }

    /// Returns the wire discriminator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "Call",
            Self::New => "New",
            Self::Create => "Create",
            Self::InvokeOn => "InvokeOn",
            Self::ListenOn => "ListenOn",
        }
    }

    /// Returns `true` for kinds the router actually dispatches.
    #[must_use]
    pub const fn is_implemented(self) -> bool {
        matches!(self, Self::Call | Self::ListenOn)
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound request from the application core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Caller-supplied correlation token.
    pub id: RequestId,
    /// Request kind discriminator.
    #[serde(rename = "__type")]
    pub kind: CallKind,
    /// Location of the host operation.
    #[serde(rename = "cmd")]
    pub path: SymbolicPath,
    /// Positional arguments forwarded verbatim.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Routing hint reserved for multi-surface hosts; currently inert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl RequestEnvelope {
    /// Creates an envelope without a routing hint.
    #[must_use]
    pub fn new(id: impl Into<RequestId>, kind: CallKind, path: SymbolicPath, args: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            kind,
            path,
            args,
            target: None,
        }
    }

    /// Attaches a routing hint.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Parses a single JSON request line.
    ///
    /// Trailing whitespace (including the newline delimiter) is trimmed before
    /// parsing. An unrecognised `__type` is reported separately from other
    /// schema failures so the caller can still be answered when the `id` is
    /// recoverable.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] for empty or non-JSON input,
    /// [`ProtocolError::UnknownKind`] for an unrecognised discriminator, and
    /// [`ProtocolError::InvalidStructure`] when the JSON does not match the
    /// envelope schema.
    pub fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
        let trimmed = trim_trailing_whitespace(line);
        if trimmed.is_empty() {
            return Err(ProtocolError::malformed("empty request line"));
        }

        let raw: Value = serde_json::from_slice(trimmed).map_err(ProtocolError::from_json_error)?;
        if let Some(kind) = raw.get("__type").and_then(Value::as_str)
            && CallKind::parse(kind).is_none()
        {
            let id = raw.get("id").filter(|value| !value.is_null()).cloned().map(RequestId::from);
            return Err(ProtocolError::unknown_kind(id, kind));
        }

        serde_json::from_value(raw).map_err(|error| ProtocolError::invalid_structure(error.to_string()))
    }
}

/// Trims trailing ASCII whitespace from a byte slice.
fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    bytes.get(..end).unwrap_or_default()
}

/// Tagged result reported for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__type")]
pub enum Outcome {
    /// The operation completed; `value` is absent when it produced nothing.
    Ok {
        /// Produced result.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    /// The operation raised, or its deferred result rejected.
    Exception {
        /// Stringified failure.
        exception: String,
        /// Path of the failing operation.
        cmd: SymbolicPath,
        /// Arguments the operation was called with.
        args: Vec<Value>,
    },
    /// Nothing invocable (or listener-capable) lives at the path.
    NotFound {
        /// Path that failed to resolve.
        cmd: SymbolicPath,
    },
    /// The request kind is not implemented by this bridge.
    Unsupported {
        /// Wire discriminator of the rejected request.
        kind: String,
        /// Path of the rejected request, when it was decoded.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cmd: Option<SymbolicPath>,
    },
}

impl Outcome {
    /// Builds a success outcome.
    #[must_use]
    pub const fn ok(value: Option<Value>) -> Self {
        Self::Ok { value }
    }

    /// Builds an exception outcome echoing the call context.
    #[must_use]
    pub fn exception(failure: &HostFailure, cmd: SymbolicPath, args: Vec<Value>) -> Self {
        Self::Exception {
            exception: failure.to_string(),
            cmd,
            args,
        }
    }

    /// Builds a resolution failure outcome.
    #[must_use]
    pub const fn not_found(cmd: SymbolicPath) -> Self {
        Self::NotFound { cmd }
    }

    /// Builds an unsupported outcome.
    #[must_use]
    pub fn unsupported(kind: impl Into<String>, cmd: Option<SymbolicPath>) -> Self {
        Self::Unsupported {
            kind: kind.into(),
            cmd,
        }
    }

    /// Returns the wire tag of this outcome.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Ok { .. } => "Ok",
            Self::Exception { .. } => "Exception",
            Self::NotFound { .. } => "NotFound",
            Self::Unsupported { .. } => "Unsupported",
        }
    }
}

/// Outbound message: an outcome addressed by its request identifier.
///
/// Serialises as the two-element array `[id, outcome]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response(pub RequestId, pub Outcome);

impl Response {
    /// Pairs an outcome with its request identifier.
    #[must_use]
    pub const fn new(id: RequestId, outcome: Outcome) -> Self {
        Self(id, outcome)
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.0
    }

    /// Returns the outcome.
    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.1
    }
}
