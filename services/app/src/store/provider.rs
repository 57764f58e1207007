//! services/app/src/store/provider.rs
//!
//! Owns the store and the session synchronizer for one mounted lifetime.
//!
//! Mounting acquires the auth-state subscription and starts the event loop.
//! Tearing down (explicitly or on drop) stops the loop, cancels any profile
//! resolution in flight and releases the subscription. Handles given out by
//! the provider stop working once it is gone.

use crate::config::SyncConfig;
use crate::error::AppError;
use crate::session::{SessionSynchronizer, Sleeper, TokioSleeper};
use crate::store::{Snapshot, Store, Subscription};
use foodshare_core::ports::{AuthSubscription, Backend};
use foodshare_core::state::{Action, AppState};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

//=========================================================================================
// StoreProvider
//=========================================================================================

pub struct StoreProvider {
    store: Arc<Store>,
    sync: Arc<SessionSynchronizer>,
    shutdown: CancellationToken,
    event_loop: Option<JoinHandle<()>>,
}

impl StoreProvider {
    /// Mounts the store against a backend. Must be called inside a tokio runtime.
    pub fn mount(backend: Arc<dyn Backend>, config: &SyncConfig) -> Self {
        Self::mount_with_sleeper(backend, config, Arc::new(TokioSleeper))
    }

    pub fn mount_with_sleeper(
        backend: Arc<dyn Backend>,
        config: &SyncConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let store = Arc::new(Store::new());
        let sync = Arc::new(SessionSynchronizer::new(backend.clone(), store.clone(), config, sleeper));

        // Subscribe before restoring so no sign-in in between is missed.
        let subscription = backend.on_auth_state_change();
        let shutdown = CancellationToken::new();
        sync.spawn_restore();
        let event_loop = tokio::spawn(run_event_loop(sync.clone(), subscription, shutdown.clone()));
        info!("Store provider mounted.");

        Self { store, sync, shutdown, event_loop: Some(event_loop) }
    }

    /// A cloneable handle for components that need the store.
    pub fn handle(&self) -> StoreHandle {
        StoreHandle { store: Arc::downgrade(&self.store), mounted: self.shutdown.clone() }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Tears the provider down and waits for the event loop to finish.
    pub async fn shutdown(mut self) {
        self.teardown();
        if let Some(handle) = self.event_loop.take() {
            if let Err(e) = handle.await {
                warn!("Auth event loop ended abnormally: {:?}", e);
            }
        }
        info!("Store provider unmounted.");
    }

    fn teardown(&mut self) {
        self.shutdown.cancel();
        self.sync.cancel_in_flight();
    }
}

impl Drop for StoreProvider {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run_event_loop(
    sync: Arc<SessionSynchronizer>,
    mut subscription: AuthSubscription,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = subscription.next() => match event {
                Some(event) => {
                    sync.handle_event(event);
                }
                None => {
                    warn!("Auth event stream closed.");
                    break;
                }
            },
        }
    }
    subscription.unsubscribe();
    info!("Auth subscription released.");
}

//=========================================================================================
// Handles
//=========================================================================================

/// A reference to a mounted store that components carry around.
#[derive(Clone)]
pub struct StoreHandle {
    store: Weak<Store>,
    mounted: CancellationToken,
}

impl StoreHandle {
    /// Returns the `{state, dispatch}` pair, or `OutsideProvider` once the
    /// provider has been torn down.
    pub fn use_store(&self) -> Result<StoreContext, AppError> {
        if self.mounted.is_cancelled() {
            return Err(AppError::OutsideProvider);
        }
        let store = self.store.upgrade().ok_or(AppError::OutsideProvider)?;
        Ok(StoreContext { state: store.state(), store })
    }
}

/// The store as seen by one consumer: a state snapshot plus dispatch.
pub struct StoreContext {
    pub state: Arc<AppState>,
    store: Arc<Store>,
}

impl StoreContext {
    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.store.watch()
    }

    /// The latest state, which may be newer than `state`.
    pub fn current(&self) -> Arc<AppState> {
        self.store.state()
    }
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;
