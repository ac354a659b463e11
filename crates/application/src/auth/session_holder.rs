//! Observable holder for the current session state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use storefront_domain::SessionState;

/// Handle returned by [`SessionStateHolder::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Single owner of the in-memory [`SessionState`].
///
/// Created by the composition root and shared by `Arc`. Only the auth client
/// writes to it; everyone else reads or subscribes. Listeners run
/// synchronously on the writing task, in subscription order, after every
/// change.
pub struct SessionStateHolder {
    state: RwLock<SessionState>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl SessionStateHolder {
    /// Creates a holder in the signed-out state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Whether the current state is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read().authenticated
    }

    /// Registers a listener invoked on each state change.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Replaces the state and notifies listeners if it changed.
    pub(crate) fn set(&self, next: SessionState) {
        {
            let mut state = self.state.write();
            if *state == next {
                return;
            }
            *state = next.clone();
        }
        self.notify(&next);
    }

    /// Resets to the signed-out default.
    pub(crate) fn reset(&self) {
        self.set(SessionState::default());
    }

    fn notify(&self, state: &SessionState) {
        // Listeners may subscribe or unsubscribe while being called.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(state);
        }
    }
}

impl Default for SessionStateHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStateHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStateHolder")
            .field("authenticated", &self.is_authenticated())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}
