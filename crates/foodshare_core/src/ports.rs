//! crates/foodshare_core/src/ports.rs
//!
//! Defines the service contracts (traits) the store depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete auth/backend service.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use uuid::Uuid;
use crate::domain::{AuthEvent, AuthSession, NewProfile, Profile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, JSON).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Auth Subscription
//=========================================================================================

/// A live subscription to auth-state changes.
///
/// Dropping the subscription releases it; `unsubscribe` does so explicitly.
pub struct AuthSubscription {
    events: Pin<Box<dyn Stream<Item = AuthEvent> + Send>>,
}

impl AuthSubscription {
    pub fn new(events: impl Stream<Item = AuthEvent> + Send + 'static) -> Self {
        Self { events: Box::pin(events) }
    }

    /// Waits for the next event. `None` once the auth service is gone.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        self.events.next().await
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSubscription").finish_non_exhaustive()
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Subscribes to sign-in/sign-out notifications.
    fn on_auth_state_change(&self) -> AuthSubscription;

    /// Returns the session that is already established, if any.
    async fn get_session(&self) -> PortResult<Option<AuthSession>>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetches a profile row by user id. `Ok(None)` when no row exists.
    async fn select_by_id(&self, id: Uuid) -> PortResult<Option<Profile>>;

    /// Inserts a profile row and returns the row as stored.
    async fn insert(&self, profile: NewProfile) -> PortResult<Profile>;
}

/// Everything the session synchronizer needs from the backend.
pub trait Backend: AuthService + ProfileRepository {}

impl<T: AuthService + ProfileRepository> Backend for T {}
