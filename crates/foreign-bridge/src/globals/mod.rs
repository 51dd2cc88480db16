//! The standard root namespace served by the bridge host.
//!
//! | global | contents |
//! |---|---|
//! | `Math` | `max`, `min`, `abs`, `floor`, `ceil`, `round`, `sqrt`, `pow` |
//! | `console` | `log`, `info`, `warn`, `error`, `debug`, written to `tracing` |
//! | `JSON` | `stringify`, `parse` |
//! | `timers` | deferred `sleep(ms)`, subscribable `interval(ms)` |
//! | `clock` | `now()`, plus `tick` events for `ListenOn` |
//! | `counter` | `count` with receiver-bound `increment` and `get` |
//!
//! Embedders add their own capabilities with [`HostObject::define`].

mod console;
mod counter;
mod json;
mod math;
mod timers;

use std::sync::Arc;

use crate::value::HostObject;

/// Builds the standard root namespace.
#[must_use]
pub fn standard() -> Arc<HostObject> {
    Arc::new(
        HostObject::new("globalThis")
            .with("Math", math::namespace())
            .with("console", console::namespace())
            .with("JSON", json::namespace())
            .with("timers", timers::timers())
            .with("clock", timers::clock())
            .with("counter", counter::namespace()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_every_global() {
        let root = standard();
        assert_eq!(
            root.keys(),
            vec!["JSON", "Math", "clock", "console", "counter", "timers"]
        );
        assert!(root.get("clock").listener_capability().is_some());
    }
}
