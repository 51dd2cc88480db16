//! Host namespace and world shared by the behavioural suites.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::{Builder, Runtime};

use crate::globals;
use crate::{
    Bridge, BridgeOptions, EventCallback, EventSource, HostFailure, HostObject, HostValue,
    Invocation, RequestEnvelope, Reporter, Response, ResponseReceiver,
};

/// How long the world waits for a further response before deciding the
/// bridge has gone quiet.
const QUIET_PERIOD: Duration = Duration::from_millis(150);

/// Event source whose events are fired by the test itself.
#[derive(Default)]
pub(super) struct ManualEmitter {
    listeners: Mutex<Vec<(String, EventCallback)>>,
}

impl ManualEmitter {
    /// Delivers `payload` to every live listener for `event`.
    pub(super) fn fire(&self, event: &str, payload: &Value) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|(name, callback)| name != event || callback.emit(Some(payload.clone())));
    }
}

impl EventSource for ManualEmitter {
    fn add_event_listener(
        &self,
        event: &str,
        listener: EventCallback,
        _options: Option<Value>,
    ) -> Result<(), HostFailure> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event.to_owned(), listener));
        Ok(())
    }
}

/// Builds the standard globals plus the fixtures the scenarios call.
pub(super) fn namespace(emitter: Arc<ManualEmitter>) -> HostValue {
    let root = globals::standard();
    let fixtures = HostObject::new("fixtures")
        .with(
            "fail",
            HostValue::function(|_, _| Err(HostFailure::type_error("refused"))),
        )
        .with(
            "later",
            HostValue::function(|_, args| {
                let value = args.get(0).cloned();
                let delay = args.get(1).and_then(Value::as_u64).unwrap_or_default();
                Ok(Invocation::deferred(async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok(value)
                }))
            }),
        )
        .with(
            "reject",
            HostValue::function(|_, _| {
                Ok(Invocation::deferred(async { Err(HostFailure::new("rejected")) }))
            }),
        );
    let obj = HostObject::new("obj").with(
        "whoami",
        HostValue::function(|receiver, _| {
            let name = receiver.as_object().map(|object| object.name().to_owned());
            Ok(Invocation::Immediate(name.map(Value::from)))
        }),
    );
    root.define("fixtures", fixtures);
    root.define("obj", obj);
    root.define("button", HostObject::with_events("button", emitter));
    HostValue::from(root)
}

/// A bridge over the test namespace, driven by its own runtime.
pub(super) struct BridgeWorld {
    runtime: Runtime,
    emitter: Arc<ManualEmitter>,
    bridge: Bridge,
    receiver: ResponseReceiver,
    responses: Vec<Response>,
}

impl BridgeWorld {
    pub(super) fn new(options: BridgeOptions) -> Self {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("test runtime");
        let emitter = Arc::new(ManualEmitter::default());
        let (reporter, receiver) = Reporter::channel();
        let bridge = Bridge::new(namespace(Arc::clone(&emitter)), reporter, options);
        Self {
            runtime,
            emitter,
            bridge,
            receiver,
            responses: Vec::new(),
        }
    }

    pub(super) const fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub(super) fn emitter(&self) -> &ManualEmitter {
        &self.emitter
    }

    /// Hands a request to the bridge inside the world's runtime.
    pub(super) fn send(&self, envelope: RequestEnvelope) {
        let _entered = self.runtime.enter();
        let disposition = self.bridge.handle(envelope);
        tracing::debug!(?disposition, "handled test request");
    }

    /// Runs the runtime for `duration`, letting timers and tasks progress.
    pub(super) fn run_for(&self, duration: Duration) {
        self.runtime.block_on(async { tokio::time::sleep(duration).await });
    }

    /// Runs `future` to completion on the world's runtime.
    pub(super) fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Collects responses until the bridge stays quiet for a while.
    pub(super) fn collect(&mut self) {
        let Self {
            runtime,
            receiver,
            responses,
            ..
        } = self;
        runtime.block_on(async {
            while let Ok(Some(response)) = tokio::time::timeout(QUIET_PERIOD, receiver.recv()).await {
                responses.push(response);
            }
        });
    }

    /// Returns the collected responses addressed to `id`, in arrival order.
    pub(super) fn responses_to(&mut self, id: &str) -> Vec<Value> {
        self.collect();
        self.responses
            .iter()
            .filter(|response| response.id().as_str() == Some(id))
            .map(|response| serde_json::to_value(response.outcome()).expect("outcome serialises"))
            .collect()
    }

    /// Returns the order in which requests were first answered.
    pub(super) fn answer_order(&mut self) -> Vec<String> {
        self.collect();
        let mut order: Vec<String> = Vec::new();
        for response in &self.responses {
            let id = response.id().to_string();
            if !order.contains(&id) {
                order.push(id);
            }
        }
        order
    }
}
