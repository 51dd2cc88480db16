//! `timers` and `clock`: time-driven host operations.
//!
//! Both subscription styles are represented: `timers.interval` is a function
//! that receives its callback directly, while `clock` is an object accepting
//! listeners for its `tick` event.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::callback::EventCallback;
use crate::value::{Arguments, EventSource, HostFailure, HostObject, HostValue, Invocation};

/// Tick period used when a listener does not ask for one.
const DEFAULT_TICK_MS: u64 = 1_000;

pub(super) fn timers() -> HostObject {
    HostObject::new("timers")
        .with(
            "sleep",
            HostValue::function(|_, args| {
                let delay = Duration::from_millis(millis(args.get(0)).unwrap_or_default());
                Ok(Invocation::deferred(async move {
                    time::sleep(delay).await;
                    Ok(None)
                }))
            }),
        )
        .with(
            "interval",
            HostValue::function(|_, args: Arguments| {
                let callback = args
                    .callback()
                    .cloned()
                    .ok_or_else(|| HostFailure::type_error("timers.interval needs a subscription callback"))?;
                let period = millis(args.get(0)).unwrap_or(DEFAULT_TICK_MS);
                spawn_ticker(callback, period)?;
                Ok(Invocation::nothing())
            }),
        )
}

pub(super) fn clock() -> HostObject {
    HostObject::with_events("clock", Arc::new(Clock)).with(
        "now",
        HostValue::function(|_, _| {
            let elapsed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|error| HostFailure::new(error.to_string()))?;
            Ok(Invocation::ready(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)))
        }),
    )
}

/// Event source behind `clock`; it only knows the `tick` event.
struct Clock;

impl EventSource for Clock {
    fn add_event_listener(
        &self,
        event: &str,
        listener: EventCallback,
        options: Option<Value>,
    ) -> Result<(), HostFailure> {
        if event != "tick" {
            return Err(HostFailure::type_error(format!("clock has no '{event}' event")));
        }
        let period = options
            .as_ref()
            .and_then(|options| millis(options.get("interval_ms")))
            .unwrap_or(DEFAULT_TICK_MS);
        spawn_ticker(listener, period)
    }
}

fn millis(value: Option<&Value>) -> Option<u64> {
    value.and_then(Value::as_u64)
}

/// Emits `1, 2, 3, ...` every `period_ms` until the subscription is cancelled.
///
/// A zero period is raised to one millisecond.
fn spawn_ticker(callback: EventCallback, period_ms: u64) -> Result<(), HostFailure> {
    let handle = Handle::try_current().map_err(|error| {
        HostFailure::named("InternalError", format!("timers need an async runtime: {error}"))
    })?;
    let period = Duration::from_millis(period_ms.max(1));
    handle.spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let cancelled = callback.cancelled();
        tokio::pin!(cancelled);
        let mut count: u64 = 0;
        loop {
            tokio::select! {
                biased;
                () = &mut cancelled => break,
                _ = ticker.tick() => {
                    count = count.saturating_add(1);
                    if !callback.emit(Some(Value::from(count))) {
                        break;
                    }
                }
            }
        }
    });
    Ok(())
}
