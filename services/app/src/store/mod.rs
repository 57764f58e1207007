//! services/app/src/store/mod.rs
//!
//! The shared application store.
//!
//! The store publishes immutable `Arc<AppState>` snapshots through a
//! `tokio::sync::watch` channel. Every dispatch runs the pure transition
//! function against the current snapshot inside the channel's lock, so two
//! transitions never interleave. A dispatch that changes nothing publishes
//! nothing and bumps no version.
//!
//! Published snapshots are queued for listeners in version order and drained
//! by one caller at a time. Listeners therefore never see versions go
//! backwards, and a listener may dispatch: its snapshot is delivered after
//! the current one instead of recursively.

pub mod provider;

use foodshare_core::state::{transition, Action, AppState};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::watch;
use tracing::debug;

pub use provider::{StoreContext, StoreHandle, StoreProvider};

//=========================================================================================
// Snapshot
//=========================================================================================

/// One published state, stamped with a version that only grows.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub version: u64,
    pub state: Arc<AppState>,
}

//=========================================================================================
// Listener Registry
//=========================================================================================

type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// A registered change listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let mut guard = listeners.lock().unwrap_or_else(PoisonError::into_inner);
            guard.entries.retain(|(id, _)| *id != self.id);
        }
    }
}

//=========================================================================================
// Delivery Queue
//=========================================================================================

#[derive(Default)]
struct Delivery {
    pending: VecDeque<Snapshot>,
    draining: bool,
}

/// Clears the draining flag when a listener panics mid-delivery.
struct DrainGuard<'a>(&'a Mutex<Delivery>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).draining = false;
        }
    }
}

//=========================================================================================
// Store
//=========================================================================================

pub struct Store {
    tx: watch::Sender<Snapshot>,
    listeners: Arc<Mutex<Listeners>>,
    delivery: Mutex<Delivery>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (tx, _rx) = watch::channel(Snapshot { version: 0, state: Arc::new(state) });
        Self {
            tx,
            listeners: Arc::new(Mutex::new(Listeners::default())),
            delivery: Mutex::new(Delivery::default()),
        }
    }

    /// Applies one action and delivers any queued snapshots to listeners.
    ///
    /// When another caller is already delivering, the new snapshot is left
    /// for that caller and this returns once the state is visible.
    pub fn dispatch(&self, action: Action) {
        self.commit(action);
        self.flush();
    }

    /// Applies one action and queues the resulting snapshot without running
    /// listeners. Returns whether the state changed.
    pub(crate) fn commit(&self, action: Action) -> bool {
        let name = action.name();
        let mut version = None;
        self.tx.send_if_modified(|current| {
            let Some(next) = transition(&current.state, action) else {
                return false;
            };
            *current = Snapshot { version: current.version + 1, state: Arc::new(next) };
            version = Some(current.version);
            // Queued inside the channel lock so queue order is version order.
            self.delivery
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pending
                .push_back(current.clone());
            true
        });

        match version {
            Some(version) => {
                debug!("{} applied, state version {}", name, version);
                true
            }
            None => {
                debug!("{} left the state unchanged", name);
                false
            }
        }
    }

    /// Runs listeners for every queued snapshot, oldest first.
    pub(crate) fn flush(&self) {
        {
            let mut delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
            if delivery.draining || delivery.pending.is_empty() {
                return;
            }
            delivery.draining = true;
        }
        let _guard = DrainGuard(&self.delivery);
        loop {
            let next = {
                let mut delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
                match delivery.pending.pop_front() {
                    Some(snapshot) => snapshot,
                    None => {
                        // Cleared under the same lock as the empty check so a
                        // concurrent commit is never left undelivered.
                        delivery.draining = false;
                        return;
                    }
                }
            };
            self.notify(&next);
        }
    }

    /// The current state.
    pub fn state(&self) -> Arc<AppState> {
        self.tx.borrow().state.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// A receiver for async consumers that want to await changes.
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Registers a listener that runs after every state change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let mut guard = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = guard.next_id;
        guard.next_id += 1;
        guard.entries.push((id, Arc::new(listener)));
        Subscription { id, listeners: Arc::downgrade(&self.listeners) }
    }

    fn notify(&self, snapshot: &Snapshot) {
        // Listeners run without the registry lock so they may subscribe or unsubscribe.
        let listeners: Vec<Listener> = {
            let guard = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            guard.entries.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
