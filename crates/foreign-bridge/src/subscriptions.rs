//! Registry of live `ListenOn` registrations.
//!
//! Each registration owns a cancellation token derived from one root token,
//! so a single subscription can be withdrawn by its request identifier and
//! every subscription can be withdrawn at shutdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::protocol::RequestId;

const SUBSCRIPTION_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::subscriptions");

/// One registration handed out by [`SubscriptionRegistry::register`].
///
/// Registrations sharing a request identifier are told apart by a serial
/// number, so withdrawing a stale one never touches its successor.
#[derive(Debug, Clone)]
pub struct Registration {
    serial: u64,
    token: CancellationToken,
}

impl Registration {
    /// Returns the token that is cancelled when the registration ends.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns `true` once the registration has ended.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Tracks the cancellation tokens of live subscriptions.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    root: CancellationToken,
    next_serial: AtomicU64,
    live: Mutex<HashMap<RequestId, Registration>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a registration for `id`.
    ///
    /// A live registration already using `id` is cancelled and replaced.
    /// After [`cancel_all`](Self::cancel_all) the registration comes back
    /// already cancelled and is not tracked.
    #[must_use]
    pub fn register(&self, id: RequestId) -> Registration {
        let registration = Registration {
            serial: self.next_serial.fetch_add(1, Ordering::Relaxed),
            token: self.root.child_token(),
        };
        let mut live = self.lock();
        if self.root.is_cancelled() {
            debug!(target: SUBSCRIPTION_TARGET, id = %id, "registry shut down; subscription refused");
            return registration;
        }
        if let Some(previous) = live.insert(id.clone(), registration.clone()) {
            warn!(
                target: SUBSCRIPTION_TARGET,
                id = %id,
                "request id reused while a subscription was live; replacing it"
            );
            previous.token.cancel();
        }
        debug!(target: SUBSCRIPTION_TARGET, id = %id, "subscription registered");
        registration
    }

    /// Cancels and forgets the registration `id`.
    ///
    /// Returns `false` when no such registration was live.
    #[must_use]
    pub fn cancel(&self, id: &RequestId) -> bool {
        match self.lock().remove(id) {
            Some(registration) => {
                registration.token.cancel();
                debug!(target: SUBSCRIPTION_TARGET, id = %id, "subscription cancelled");
                true
            }
            None => false,
        }
    }

    /// Withdraws a registration whose set-up failed.
    ///
    /// The entry for `id` is only removed while it is still `registration`,
    /// so a failure reported for a replaced registration leaves its
    /// successor alone.
    pub fn release(&self, id: &RequestId, registration: &Registration) {
        registration.token.cancel();
        let mut live = self.lock();
        if live
            .get(id)
            .is_some_and(|stored| stored.serial == registration.serial)
        {
            live.remove(id);
            debug!(target: SUBSCRIPTION_TARGET, id = %id, "subscription released");
        }
    }

    /// Cancels every registration, including any made afterwards.
    pub fn cancel_all(&self) {
        self.root.cancel();
        let mut live = self.lock();
        debug!(
            target: SUBSCRIPTION_TARGET,
            count = live.len(),
            "cancelling all subscriptions"
        );
        live.clear();
    }

    /// Returns `true` when `id` names a live registration.
    #[must_use]
    pub fn contains(&self, id: &RequestId) -> bool {
        self.lock().contains_key(id)
    }

    /// Returns the number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequestId, Registration>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_cancel() {
        let registry = SubscriptionRegistry::new();
        let id = RequestId::new("s1");
        let registration = registry.register(id.clone());
        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);

        assert!(registry.cancel(&id));
        assert!(registration.is_cancelled());
        assert!(registry.is_empty());
        assert!(!registry.cancel(&id));
    }

    #[test]
    fn reusing_an_id_cancels_the_previous_registration() {
        let registry = SubscriptionRegistry::new();
        let id = RequestId::new("s1");
        let first = registry.register(id.clone());
        let second = registry.register(id);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn release_leaves_a_replacement_in_place() {
        let registry = SubscriptionRegistry::new();
        let id = RequestId::new("s1");
        let stale = registry.register(id.clone());
        let fresh = registry.register(id.clone());

        registry.release(&id, &stale);
        assert!(registry.contains(&id));
        assert!(!fresh.is_cancelled());

        registry.release(&id, &fresh);
        assert!(!registry.contains(&id));
    }

    #[test]
    fn release_ignores_a_cancelled_successor_it_does_not_own() {
        let registry = SubscriptionRegistry::new();
        let id = RequestId::new("s1");
        let stale = registry.register(id.clone());
        let fresh = registry.register(id.clone());
        fresh.token().cancel();

        registry.release(&id, &stale);
        assert!(registry.contains(&id), "only the owner may withdraw the entry");
    }

    #[test]
    fn cancel_all_reaches_every_registration() {
        let registry = SubscriptionRegistry::new();
        let first = registry.register(RequestId::new("a"));
        let second = registry.register(RequestId::new("b"));
        registry.cancel_all();
        assert!(first.is_cancelled());
        assert!(second.is_cancelled());
        assert!(registry.is_empty());

        let late = registry.register(RequestId::new("c"));
        assert!(late.is_cancelled());
        assert!(registry.is_empty());
        assert!(!registry.contains(&RequestId::new("c")));

        registry.release(&RequestId::new("c"), &late);
        assert!(registry.is_empty());
    }
}
