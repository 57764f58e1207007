//! services/app/src/session/synchronizer.rs
//!
//! Keeps the store's `user` in step with the auth service.
//!
//! Each sign-in starts a new session generation with its own
//! `CancellationToken`. Starting another generation or signing out cancels
//! the previous token, so a profile resolution that is still in flight can
//! never publish a user after the session it belonged to has ended.

use crate::config::SyncConfig;
use crate::session::retry::{RetryPolicy, Sleeper};
use crate::store::Store;
use foodshare_core::domain::{AuthEvent, AuthSession, Profile, User};
use foodshare_core::ports::Backend;
use foodshare_core::state::Action;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct SessionSynchronizer {
    backend: Arc<dyn Backend>,
    store: Arc<Store>,
    policy: RetryPolicy,
    settle_delay: Duration,
    sleeper: Arc<dyn Sleeper>,
    /// Token of the current session generation. Held while publishing.
    generation: Mutex<CancellationToken>,
}

impl SessionSynchronizer {
    pub fn new(
        backend: Arc<dyn Backend>,
        store: Arc<Store>,
        config: &SyncConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            backend,
            store,
            policy: RetryPolicy::new(config.fetch_attempts, config.retry_backoff),
            settle_delay: config.settle_delay,
            sleeper,
            generation: Mutex::new(CancellationToken::new()),
        }
    }

    fn lock_generation(&self) -> MutexGuard<'_, CancellationToken> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancels the current generation and starts a fresh one.
    fn next_generation(&self) -> CancellationToken {
        let mut current = self.lock_generation();
        current.cancel();
        *current = CancellationToken::new();
        current.clone()
    }

    fn current_generation(&self) -> CancellationToken {
        self.lock_generation().clone()
    }

    /// Routes one auth event. Sign-ins resolve in a background task whose
    /// handle is returned.
    pub fn handle_event(self: &Arc<Self>, event: AuthEvent) -> Option<JoinHandle<Option<User>>> {
        match event {
            AuthEvent::SignedIn(session) => {
                info!("Session established for user {}", session.user.id);
                let token = self.next_generation();
                let this = Arc::clone(self);
                Some(tokio::spawn(async move { this.resolve_signed_in(session, token).await }))
            }
            AuthEvent::SignedOut => {
                info!("Session ended.");
                self.sign_out();
                None
            }
            AuthEvent::TokenRefreshed(_) | AuthEvent::UserUpdated(_) => {
                debug!("Ignoring auth event that does not change the session user.");
                None
            }
        }
    }

    /// Clears the user. Any resolution still in flight is cancelled first.
    pub fn sign_out(&self) {
        {
            let mut current = self.lock_generation();
            current.cancel();
            *current = CancellationToken::new();
            self.store.commit(Action::SetUser(None));
        }
        self.store.flush();
    }

    /// Cancels whatever resolution is in flight without touching the store.
    pub fn cancel_in_flight(&self) {
        self.lock_generation().cancel();
    }

    /// Resolves the profile for a fresh sign-in and publishes the user.
    ///
    /// Waits the settle delay, fetches with retry, and creates a default
    /// profile once the retries run out. Failures are logged and leave the
    /// store unchanged.
    pub async fn resolve_signed_in(&self, session: AuthSession, token: CancellationToken) -> Option<User> {
        let profile = tokio::select! {
            _ = token.cancelled() => {
                info!("Profile resolution for {} cancelled.", session.user.id);
                return None;
            }
            profile = self.fetch_or_create(&session) => profile?,
        };
        self.publish(User::from_profile(profile), &token)
    }

    /// Restores the user of a session that already exists at mount time.
    ///
    /// A single fetch: no retry and no profile creation. `token` is the
    /// generation current when the restore was started.
    pub async fn restore_session(&self, token: CancellationToken) -> Option<User> {
        let profile = tokio::select! {
            _ = token.cancelled() => return None,
            profile = self.fetch_existing() => profile?,
        };
        self.publish(User::from_profile(profile), &token)
    }

    pub fn spawn_restore(self: &Arc<Self>) -> JoinHandle<Option<User>> {
        let token = self.current_generation();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.restore_session(token).await })
    }

    async fn fetch_existing(&self) -> Option<Profile> {
        let session = match self.backend.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("No existing session to restore.");
                return None;
            }
            Err(e) => {
                error!("Failed to look up existing session: {:?}", e);
                return None;
            }
        };
        match self.backend.select_by_id(session.user.id).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                warn!("No profile found for existing session user {}", session.user.id);
                None
            }
            Err(e) => {
                error!("Failed to fetch profile for {}: {:?}", session.user.id, e);
                None
            }
        }
    }

    async fn fetch_or_create(&self, session: &AuthSession) -> Option<Profile> {
        let user_id = session.user.id;
        self.sleeper.sleep(self.settle_delay).await;

        let fetched = self
            .policy
            .run(self.sleeper.as_ref(), "profile fetch", |_| self.backend.select_by_id(user_id))
            .await;
        if let Some(profile) = fetched {
            return Some(profile);
        }

        info!("No profile for {} after {} attempts, creating one.", user_id, self.policy.max_attempts);
        match self.backend.insert(session.default_profile()).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                error!("Failed to create profile for {}: {:?}", user_id, e);
                None
            }
        }
    }

    /// Publishes the user unless its generation was cancelled.
    ///
    /// The check and the commit happen under the generation lock, which
    /// `sign_out` also holds while clearing the user. Listeners run after
    /// the lock is released, so they may call back into the synchronizer.
    fn publish(&self, user: User, token: &CancellationToken) -> Option<User> {
        {
            let _current = self.lock_generation();
            if token.is_cancelled() {
                info!("Discarding profile for {}: session no longer current.", user.id);
                return None;
            }
            info!("User {} signed in as {}.", user.id, user.role);
            self.store.commit(Action::SetUser(Some(user.clone())));
        }
        self.store.flush();
        Some(user)
    }
}

#[cfg(test)]
#[path = "synchronizer_test.rs"]
mod tests;
