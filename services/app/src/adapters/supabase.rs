//! services/app/src/adapters/supabase.rs
//!
//! This module contains the adapter for a Supabase-compatible backend.
//! It implements the `AuthService` and `ProfileRepository` ports from the `core` crate
//! on top of the GoTrue auth endpoints and the PostgREST `profiles` table.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use foodshare_core::domain::{AuthEvent, AuthSession, NewProfile, Profile, SessionUser};
use foodshare_core::ports::{AuthService, AuthSubscription, PortError, PortResult, ProfileRepository};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;

const EVENT_BUFFER: usize = 16;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

//=========================================================================================
// Wire Types
//=========================================================================================

/// The body GoTrue returns from the password grant.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: SessionUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: self.access_token,
            expires_at: now + ChronoDuration::seconds(self.expires_in),
            user: self.user,
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the auth and profile ports against Supabase.
pub struct SupabaseBackend {
    http: Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseBackend {
    /// Creates a new `SupabaseBackend`.
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, AppError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
            events,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn profiles_url(&self) -> String {
        format!("{}/rest/v1/profiles", self.base_url)
    }

    /// Adds the project key and a bearer token: the session's when signed in,
    /// the anon key otherwise.
    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        };
        request.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers just means nothing is mounted yet.
        let _ = self.events.send(event);
    }

    /// Signs in with email and password and announces the new session.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<AuthSession> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let token: TokenResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let session = token.into_session(Utc::now());

        *self.session.write().await = Some(session.clone());
        info!("Signed in as {}", session.user.id);
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Ends the current session. The local session is cleared even when the
    /// logout call fails.
    pub async fn sign_out(&self) {
        let Some(session) = self.session.write().await.take() else {
            return;
        };
        let result = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;
        match result {
            Ok(response) => {
                if let Err(e) = check(response).await {
                    warn!("Logout was rejected by the backend: {}", e);
                }
            }
            Err(e) => error!("Failed to reach the backend for logout: {:?}", e),
        }
        self.emit(AuthEvent::SignedOut);
    }
}

/// Maps non-success statuses onto port errors.
async fn check(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> PortError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        StatusCode::NOT_FOUND => PortError::NotFound(body.to_string()),
        _ => PortError::Unexpected(format!("backend returned {}: {}", status, body)),
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for SupabaseBackend {
    fn on_auth_state_change(&self) -> AuthSubscription {
        let mut rx = self.events.subscribe();
        AuthSubscription::new(async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        yield event;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Auth subscriber lagged, {} events skipped.", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn get_session(&self) -> PortResult<Option<AuthSession>> {
        let session = self.session.read().await.clone();
        Ok(session.filter(|s| s.expires_at > Utc::now()))
    }
}

//=========================================================================================
// `ProfileRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileRepository for SupabaseBackend {
    async fn select_by_id(&self, id: Uuid) -> PortResult<Option<Profile>> {
        let request = self
            .http
            .get(self.profiles_url())
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]);
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let rows: Vec<Profile> = check(response)
            .await?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, profile: NewProfile) -> PortResult<Profile> {
        let request = self
            .http
            .post(self.profiles_url())
            .header("Prefer", "return=representation")
            .json(&profile);
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let rows: Vec<Profile> = check(response)
            .await?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PortError::Unexpected(format!("insert of profile {} returned no row", profile.id)))
    }
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
