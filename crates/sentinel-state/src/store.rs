//! Single-writer state store
//!
//! The store owns the only copy of [`AppState`]. Dispatches are serialized
//! by an internal lock, so no two actions ever apply against the same base
//! state. Each applied action is broadcast to subscribers together with the
//! resulting snapshot.
//!
//! A dispatch that leaves the state unchanged (for example a delete against
//! an unknown id) keeps the previous snapshot, does not bump the revision
//! and is not broadcast.

use crate::action::{reduce, Action};
use crate::entities::AppState;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default subscriber channel depth
const SUBSCRIBER_CAPACITY: usize = 1024;

/// One applied action and the state it produced
#[derive(Debug, Clone)]
pub struct StateChange {
    /// Monotonic revision of `state`
    pub revision: u64,
    /// The action that produced it
    pub action: Action,
    /// Snapshot after the action
    pub state: Arc<AppState>,
}

#[derive(Debug)]
struct StoreInner {
    state: Arc<AppState>,
    revision: u64,
}

impl StoreInner {
    fn apply(&mut self, action: Action, events: &broadcast::Sender<StateChange>) {
        let next = reduce(self.state.as_ref().clone(), &action);
        if next == *self.state {
            tracing::trace!(action = action.kind(), "action left state unchanged");
            return;
        }
        self.revision += 1;
        self.state = Arc::new(next);
        tracing::debug!(action = action.kind(), revision = self.revision, "applied action");
        // No receivers is not an error
        let _ = events.send(StateChange {
            revision: self.revision,
            action,
            state: Arc::clone(&self.state),
        });
    }
}

/// Shared handle to the application state
///
/// Cloning is cheap; all clones address the same state.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
    events: broadcast::Sender<StateChange>,
}

impl Store {
    /// Create a store owning `initial`
    #[must_use]
    pub fn new(initial: AppState) -> Self {
        let (events, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                state: Arc::new(initial),
                revision: 0,
            })),
            events,
        }
    }

    /// Apply one action
    ///
    /// # Returns
    /// Snapshot after the action
    pub fn dispatch(&self, action: Action) -> Arc<AppState> {
        let mut inner = self.inner.lock();
        inner.apply(action, &self.events);
        Arc::clone(&inner.state)
    }

    /// Apply `actions` in order without interleaving other dispatches
    pub fn dispatch_all(&self, actions: impl IntoIterator<Item = Action>) -> Arc<AppState> {
        let mut inner = self.inner.lock();
        for action in actions {
            inner.apply(action, &self.events);
        }
        Arc::clone(&inner.state)
    }

    /// Decide on actions from the current state and apply them atomically
    ///
    /// `plan` sees the state as of the start of the transaction; no other
    /// dispatch can run between the read and the writes. The actions are
    /// applied in order and `plan`'s second return value is handed back.
    pub fn transact<R>(&self, plan: impl FnOnce(&AppState) -> (Vec<Action>, R)) -> R {
        let mut inner = self.inner.lock();
        let (actions, out) = plan(&inner.state);
        for action in actions {
            inner.apply(action, &self.events);
        }
        out
    }

    /// Current snapshot
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.inner.lock().state)
    }

    /// Read from the current state without cloning it
    #[inline]
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.inner.lock().state)
    }

    /// Number of state-changing actions applied so far
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.lock().revision
    }

    /// Receive every subsequent state change
    ///
    /// Slow receivers that fall more than the channel depth behind observe
    /// `RecvError::Lagged` and skip ahead.
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.events.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}
