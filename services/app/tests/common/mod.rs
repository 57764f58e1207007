//! In-memory backend shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use foodshare_core::domain::{AuthEvent, AuthSession, NewProfile, Profile, SessionUser, UserMetadata};
use foodshare_core::ports::{AuthService, AuthSubscription, PortError, PortResult, ProfileRepository};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

pub struct InMemoryBackend {
    events: broadcast::Sender<AuthEvent>,
    session: Mutex<Option<AuthSession>>,
    rows: Mutex<HashMap<Uuid, Profile>>,
    failing_fetches: AtomicU32,
    pub fetches: AtomicU32,
    pub inserts: AtomicU32,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events,
            session: Mutex::new(None),
            rows: Mutex::new(HashMap::new()),
            failing_fetches: AtomicU32::new(0),
            fetches: AtomicU32::new(0),
            inserts: AtomicU32::new(0),
        }
    }

    pub fn add_profile(&self, profile: Profile) {
        self.rows.lock().unwrap().insert(profile.id, profile);
    }

    /// The next `n` profile fetches fail with an error.
    pub fn fail_fetches(&self, n: u32) {
        self.failing_fetches.store(n, Ordering::SeqCst);
    }

    /// Sets a session without announcing it, as if it existed before mount.
    pub fn preexisting_session(&self, session: AuthSession) {
        *self.session.lock().unwrap() = Some(session);
    }

    pub fn sign_in(&self, session: AuthSession) {
        *self.session.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session));
    }

    pub fn sign_out(&self) {
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

#[async_trait]
impl AuthService for InMemoryBackend {
    fn on_auth_state_change(&self) -> AuthSubscription {
        let mut rx = self.events.subscribe();
        AuthSubscription::new(async_stream::stream! {
            while let Ok(event) = rx.recv().await {
                yield event;
            }
        })
    }

    async fn get_session(&self) -> PortResult<Option<AuthSession>> {
        Ok(self.session.lock().unwrap().clone())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryBackend {
    async fn select_by_id(&self, id: Uuid) -> PortResult<Option<Profile>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_fetches.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_fetches.store(failing - 1, Ordering::SeqCst);
            return Err(PortError::Unexpected("profile fetch failed".into()));
        }
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, profile: NewProfile) -> PortResult<Profile> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let row = Profile {
            id: profile.id,
            name: profile.name,
            role: profile.role,
            avatar_url: profile.avatar_url,
        };
        self.rows.lock().unwrap().insert(row.id, row.clone());
        Ok(row)
    }
}

pub fn session(id: Uuid, name: &str) -> AuthSession {
    AuthSession {
        access_token: format!("token-{id}"),
        expires_at: Utc::now() + chrono::Duration::hours(1),
        user: SessionUser {
            id,
            email: Some(format!("{}@example.com", name.to_lowercase())),
            metadata: UserMetadata {
                name: Some(name.to_string()),
                avatar_url: Some(format!("https://cdn.example/{id}.png")),
                ..Default::default()
            },
        },
    }
}
