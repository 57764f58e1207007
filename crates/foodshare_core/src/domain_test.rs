use super::*;

fn session(email: Option<&str>, metadata: UserMetadata) -> AuthSession {
    AuthSession {
        access_token: "token".into(),
        expires_at: Utc::now(),
        user: SessionUser { id: Uuid::nil(), email: email.map(str::to_string), metadata },
    }
}

// =============================================================================
// Role
// =============================================================================

#[test]
fn role_defaults_to_recipient() {
    assert_eq!(Role::default(), Role::Recipient);
}

#[test]
fn role_parse_is_case_insensitive() {
    assert_eq!("Donor".parse::<Role>(), Ok(Role::Donor));
    assert_eq!(" ADMIN ".parse::<Role>(), Ok(Role::Admin));
    assert!("volunteer".parse::<Role>().is_err());
}

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Donor).unwrap(), "\"donor\"");
}

// =============================================================================
// default_profile
// =============================================================================

#[test]
fn default_profile_uses_metadata() {
    let meta = UserMetadata {
        name: Some("Grace".into()),
        role: Some("donor".into()),
        avatar_url: Some("https://cdn.example/g.png".into()),
        ..Default::default()
    };
    let profile = session(Some("grace@example.com"), meta).default_profile();
    assert_eq!(profile.name, "Grace");
    assert_eq!(profile.role, Role::Donor);
    assert_eq!(profile.avatar_url.as_deref(), Some("https://cdn.example/g.png"));
}

#[test]
fn default_profile_falls_back_to_full_name_then_email() {
    let meta = UserMetadata { full_name: Some("Grace Hopper".into()), ..Default::default() };
    assert_eq!(session(None, meta).default_profile().name, "Grace Hopper");

    let profile = session(Some("grace@example.com"), UserMetadata::default()).default_profile();
    assert_eq!(profile.name, "grace");
}

#[test]
fn default_profile_placeholder_and_recipient_role() {
    let meta = UserMetadata { role: Some("volunteer".into()), ..Default::default() };
    let profile = session(None, meta).default_profile();
    assert_eq!(profile.name, "New user");
    assert_eq!(profile.role, Role::Recipient);
    assert_eq!(profile.id, Uuid::nil());
}

// =============================================================================
// User
// =============================================================================

#[test]
fn user_from_profile_zeroes_badge() {
    let profile = Profile {
        id: Uuid::nil(),
        name: "Ada".into(),
        role: Role::Admin,
        avatar_url: None,
    };
    let user = User::from_profile(profile);
    assert_eq!(user.name, "Ada");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.notifications, 0);
}

#[test]
fn profile_row_without_role_deserializes() {
    let json = r#"{"id":"00000000-0000-0000-0000-000000000000","name":"Ada"}"#;
    let profile: Profile = serde_json::from_str(json).unwrap();
    assert_eq!(profile.role, Role::Recipient);
    assert!(profile.avatar_url.is_none());
}

// =============================================================================
// Expiry
// =============================================================================

#[test]
fn expiry_claimed_marker_is_plain_string() {
    assert_eq!(serde_json::to_string(&Expiry::Claimed).unwrap(), "\"Claimed\"");
    let parsed: Expiry = serde_json::from_str("\"Claimed\"").unwrap();
    assert_eq!(parsed, Expiry::Claimed);
    let label: Expiry = serde_json::from_str("\"2 hours\"").unwrap();
    assert_eq!(label, Expiry::Label("2 hours".into()));
}

#[test]
fn expiry_display() {
    assert_eq!(Expiry::Claimed.to_string(), "Claimed");
    assert_eq!(Expiry::from("Tomorrow").to_string(), "Tomorrow");
}
