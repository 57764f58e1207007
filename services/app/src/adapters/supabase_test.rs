use super::*;
use foodshare_core::domain::UserMetadata;

fn backend() -> SupabaseBackend {
    SupabaseBackend::new("https://demo.supabase.co/", "anon-key").unwrap()
}

fn session(expires_at: DateTime<Utc>) -> AuthSession {
    AuthSession {
        access_token: "jwt".into(),
        expires_at,
        user: SessionUser { id: Uuid::nil(), email: None, metadata: UserMetadata::default() },
    }
}

// =============================================================================
// urls
// =============================================================================

#[test]
fn urls_drop_trailing_slash() {
    let b = backend();
    assert_eq!(b.auth_url("token"), "https://demo.supabase.co/auth/v1/token");
    assert_eq!(b.profiles_url(), "https://demo.supabase.co/rest/v1/profiles");
}

// =============================================================================
// wire types
// =============================================================================

#[test]
fn token_response_builds_session() {
    let json = r#"{
        "access_token": "abc",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "r",
        "user": {
            "id": "00000000-0000-0000-0000-000000000000",
            "email": "ada@example.com",
            "user_metadata": { "name": "Ada", "role": "donor" }
        }
    }"#;
    let token: TokenResponse = serde_json::from_str(json).unwrap();
    let now = Utc::now();
    let session = token.into_session(now);

    assert_eq!(session.access_token, "abc");
    assert_eq!(session.expires_at, now + ChronoDuration::seconds(3600));
    assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
    assert_eq!(session.user.metadata.name.as_deref(), Some("Ada"));
    assert_eq!(session.user.metadata.role.as_deref(), Some("donor"));
}

#[test]
fn status_errors_map_onto_port_errors() {
    assert!(matches!(status_error(StatusCode::UNAUTHORIZED, ""), PortError::Unauthorized));
    assert!(matches!(status_error(StatusCode::BAD_REQUEST, "invalid_grant"), PortError::Unauthorized));
    assert!(matches!(status_error(StatusCode::NOT_FOUND, "nope"), PortError::NotFound(ref b) if b == "nope"));
    let err = status_error(StatusCode::BAD_GATEWAY, "upstream");
    assert!(err.to_string().contains("502"));
}

// =============================================================================
// session state
// =============================================================================

#[tokio::test]
async fn no_session_until_signed_in() {
    assert!(backend().get_session().await.unwrap().is_none());
}

#[tokio::test]
async fn expired_session_is_not_returned() {
    let b = backend();
    *b.session.write().await = Some(session(Utc::now() - ChronoDuration::minutes(1)));
    assert!(b.get_session().await.unwrap().is_none());

    *b.session.write().await = Some(session(Utc::now() + ChronoDuration::minutes(1)));
    assert!(b.get_session().await.unwrap().is_some());
}

#[tokio::test]
async fn sign_out_without_session_emits_nothing() {
    let b = backend();
    let mut rx = b.events.subscribe();
    b.sign_out().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn subscribers_receive_emitted_events() {
    let b = backend();
    let mut first = b.on_auth_state_change();
    let mut second = b.on_auth_state_change();

    let signed_in = session(Utc::now() + ChronoDuration::hours(1));
    b.emit(AuthEvent::SignedIn(signed_in.clone()));
    b.emit(AuthEvent::SignedOut);

    assert_eq!(first.next().await, Some(AuthEvent::SignedIn(signed_in.clone())));
    assert_eq!(first.next().await, Some(AuthEvent::SignedOut));
    assert_eq!(second.next().await, Some(AuthEvent::SignedIn(signed_in)));
}

#[tokio::test]
async fn stream_ends_when_backend_dropped() {
    let b = backend();
    let mut sub = b.on_auth_state_change();
    drop(b);
    assert_eq!(sub.next().await, None);
}
