//! Failure notifications for `request`.

use crate::error::KiteError;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use uuid::Uuid;

type Listener = Arc<dyn Fn(&KiteError) + Send + Sync>;
type Registry = RwLock<Vec<(Uuid, Listener)>>;

/// Set of listeners called on every failed request.
#[derive(Default)]
pub struct FailureListeners {
    listeners: Arc<Registry>,
}

impl FailureListeners {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// disposed. Dropping the subscription does not unregister it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&KiteError) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.listeners.write().push((id, Arc::new(listener)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    /// Calls every registered listener once with `error`.
    ///
    /// Listeners run outside the lock, so a listener may subscribe or
    /// dispose without deadlocking.
    pub fn emit(&self, error: &KiteError) {
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in snapshot {
            listener(error);
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns true if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

impl std::fmt::Debug for FailureListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureListeners")
            .field("len", &self.len())
            .finish()
    }
}

/// Handle returned by [`FailureListeners::subscribe`].
#[derive(Debug)]
#[must_use = "a subscription must be kept to dispose the listener later"]
pub struct Subscription {
    id: Uuid,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Returns the subscription id.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Unregisters the listener. Has no effect if the owning set is gone.
    pub fn dispose(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.write().retain(|(id, _)| *id != self.id);
        }
    }
}
