//! Value model for the host namespace graph.
//!
//! The namespace is a graph of [`HostValue`] nodes hanging off a root object.
//! Plain data is carried as JSON; objects are named, mutable property tables;
//! functions are anything implementing [`Invocable`]. Whether a node can be
//! called, whether a call completed synchronously, and whether an object can
//! accept event listeners are all decided by explicit types here rather than
//! by inspecting the shape of a value at run time.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::BoxFuture;
use serde_json::Value;

use crate::callback::EventCallback;

/// A node in the host namespace graph.
#[derive(Clone, Default)]
pub enum HostValue {
    /// No value at all; the result of resolving a missing property.
    #[default]
    Absent,
    /// Plain JSON data.
    Data(Value),
    /// A named property table, optionally able to accept event listeners.
    Object(Arc<HostObject>),
    /// A callable host operation.
    Function(Arc<dyn Invocable>),
}

impl HostValue {
    /// Wraps plain data.
    #[must_use]
    pub fn data(value: impl Into<Value>) -> Self {
        Self::Data(value.into())
    }

    /// Wraps a closure as a host function.
    #[must_use]
    pub fn function<F>(function: F) -> Self
    where
        F: Fn(&HostValue, Arguments) -> Result<Invocation, HostFailure> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(function))
    }

    /// Wraps an existing [`Invocable`] implementation.
    #[must_use]
    pub fn invocable(function: Arc<dyn Invocable>) -> Self {
        Self::Function(function)
    }

    /// Returns `true` for `Absent` and JSON `null`.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent | Self::Data(Value::Null))
    }

    /// Returns the callable behind this node, if any.
    #[must_use]
    pub fn as_invocable(&self) -> Option<Arc<dyn Invocable>> {
        match self {
            Self::Function(function) => Some(Arc::clone(function)),
            _ => None,
        }
    }

    /// Returns the object behind this node, if any.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Arc<HostObject>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the listener registration capability of this node, if any.
    #[must_use]
    pub fn listener_capability(&self) -> Option<Arc<dyn EventSource>> {
        self.as_object().and_then(|object| object.event_source())
    }

    /// Reads a named property.
    ///
    /// Objects consult their property table, JSON objects their fields, and
    /// JSON arrays accept decimal indices. Every other node yields `Absent`.
    #[must_use]
    pub fn property(&self, key: &str) -> Self {
        match self {
            Self::Object(object) => object.get(key),
            Self::Data(Value::Object(fields)) => fields.get(key).cloned().map_or(Self::Absent, Self::Data),
            Self::Data(Value::Array(items)) => key
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .cloned()
                .map_or(Self::Absent, Self::Data),
            _ => Self::Absent,
        }
    }

    /// Identity comparison: objects and functions compare by allocation, data
    /// by value.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent) => true,
            (Self::Data(left), Self::Data(right)) => left == right,
            (Self::Object(left), Self::Object(right)) => Arc::ptr_eq(left, right),
            (Self::Function(left), Self::Function(right)) => {
                Arc::as_ptr(left).cast::<()>() == Arc::as_ptr(right).cast::<()>()
            }
            _ => false,
        }
    }

    /// Returns the JSON data carried by this node, if any.
    #[must_use]
    pub fn to_data(&self) -> Option<Value> {
        match self {
            Self::Data(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Self::Object(object) => f.debug_tuple("Object").field(&object.name()).finish(),
            Self::Function(_) => f.write_str("Function"),
        }
    }
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<HostObject> for HostValue {
    fn from(object: HostObject) -> Self {
        Self::Object(Arc::new(object))
    }
}

impl From<Arc<HostObject>> for HostValue {
    fn from(object: Arc<HostObject>) -> Self {
        Self::Object(object)
    }
}

/// A named, mutable property table in the namespace.
///
/// The table is shared state: concurrent host operations may read and write
/// it, and the bridge does not serialise their access.
pub struct HostObject {
    name: String,
    properties: RwLock<BTreeMap<String, HostValue>>,
    events: Option<Arc<dyn EventSource>>,
}

impl HostObject {
    /// Creates an empty object.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: RwLock::new(BTreeMap::new()),
            events: None,
        }
    }

    /// Creates an empty object that accepts event listeners.
    #[must_use]
    pub fn with_events(name: impl Into<String>, events: Arc<dyn EventSource>) -> Self {
        Self {
            events: Some(events),
            ..Self::new(name)
        }
    }

    /// Adds a property while building the object.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.properties
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        self
    }

    /// Returns the diagnostic name of the object.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Reads a property, yielding `Absent` when it is missing.
    #[must_use]
    pub fn get(&self, key: &str) -> HostValue {
        self.read().get(key).cloned().unwrap_or_default()
    }

    /// Defines or replaces a property.
    pub fn define(&self, key: impl Into<String>, value: impl Into<HostValue>) {
        self.write().insert(key.into(), value.into());
    }

    /// Removes a property, returning it when present.
    #[must_use]
    pub fn remove(&self, key: &str) -> Option<HostValue> {
        self.write().remove(key)
    }

    /// Returns the property names in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Returns the listener registration capability, if the object has one.
    #[must_use]
    pub fn event_source(&self) -> Option<Arc<dyn EventSource>> {
        self.events.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, HostValue>> {
        self.properties.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, HostValue>> {
        self.properties.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("name", &self.name)
            .field("properties", &self.keys())
            .field("events", &self.events.is_some())
            .finish()
    }
}

/// A callable host operation.
///
/// `receiver` is the object the operation was reached through (the parent of
/// its path), so method-style operations observe the same receiver they
/// would under ordinary property access.
pub trait Invocable: Send + Sync {
    /// Runs the operation.
    ///
    /// # Errors
    ///
    /// Returns a [`HostFailure`] when the operation raises synchronously.
    fn invoke(&self, receiver: &HostValue, args: Arguments) -> Result<Invocation, HostFailure>;
}

impl<F> Invocable for F
where
    F: Fn(&HostValue, Arguments) -> Result<Invocation, HostFailure> + Send + Sync,
{
    fn invoke(&self, receiver: &HostValue, args: Arguments) -> Result<Invocation, HostFailure> {
        self(receiver, args)
    }
}

/// Future settling a deferred invocation.
pub type DeferredResult = BoxFuture<'static, Result<Option<Value>, HostFailure>>;

/// What a successful invocation handed back.
pub enum Invocation {
    /// The result is already available; `None` means the operation produced
    /// nothing.
    Immediate(Option<Value>),
    /// The result settles later, on its own schedule.
    Deferred(DeferredResult),
}

impl Invocation {
    /// An immediate result carrying a value.
    #[must_use]
    pub fn ready(value: impl Into<Value>) -> Self {
        Self::Immediate(Some(value.into()))
    }

    /// An immediate result carrying nothing.
    #[must_use]
    pub const fn nothing() -> Self {
        Self::Immediate(None)
    }

    /// A result that settles when `future` completes.
    #[must_use]
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<Option<Value>, HostFailure>> + Send + 'static,
    {
        Self::Deferred(Box::pin(future))
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(value) => f.debug_tuple("Immediate").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// Capability of an object to accept event listeners.
pub trait EventSource: Send + Sync {
    /// Registers `listener` for `event`.
    ///
    /// The listener may be fired any number of times until its registration
    /// is cancelled; see [`EventCallback::cancelled`].
    ///
    /// # Errors
    ///
    /// Returns a [`HostFailure`] when the registration is refused.
    fn add_event_listener(
        &self,
        event: &str,
        listener: EventCallback,
        options: Option<Value>,
    ) -> Result<(), HostFailure>;
}

/// Positional arguments of an invocation.
///
/// Subscription calls additionally carry the callback minted for the
/// registration; it precedes the positional values.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    callback: Option<EventCallback>,
    values: Vec<Value>,
}

impl Arguments {
    /// Creates plain positional arguments.
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self {
            callback: None,
            values,
        }
    }

    /// Creates arguments led by a subscription callback.
    #[must_use]
    pub const fn with_callback(callback: EventCallback, values: Vec<Value>) -> Self {
        Self {
            callback: Some(callback),
            values,
        }
    }

    /// Returns the subscription callback, if one was supplied.
    #[must_use]
    pub const fn callback(&self) -> Option<&EventCallback> {
        self.callback.as_ref()
    }

    /// Returns the positional values.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the positional value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the number of positional values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no positional values were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the arguments, returning the positional values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Failure raised by a host operation.
///
/// Rendered as `name: message` when a name is present, mirroring how hosts
/// usually stringify their exceptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
    name: Option<String>,
    message: String,
}

impl HostFailure {
    /// Creates an unnamed failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: None,
            message: message.into(),
        }
    }

    /// Creates a failure with an exception name such as `TypeError`.
    #[must_use]
    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            message: message.into(),
        }
    }

    /// Creates a `TypeError` failure.
    #[must_use]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::named("TypeError", message)
    }

    /// Converts a captured panic payload into a failure.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("unknown panic payload"));
        Self::named("InternalError", format!("host operation panicked: {detail}"))
    }

    /// Returns the exception name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl fmt::Display for HostFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for HostFailure {}
