//! crates/foodshare_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any backend, transport or UI framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Users and Roles
//=========================================================================================

/// The part a user plays in the marketplace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    #[default]
    Recipient,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Recipient => "recipient",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "donor" => Ok(Role::Donor),
            "recipient" => Ok(Role::Recipient),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The signed-in user as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub avatar: Option<String>,
    /// Pending-notification badge count.
    pub notifications: u32,
}

impl User {
    /// Builds the store user from a backend profile row.
    ///
    /// The badge count always starts at zero; it is not derived from the
    /// live notification list.
    pub fn from_profile(profile: Profile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            role: profile.role,
            avatar: profile.avatar_url,
            notifications: 0,
        }
    }
}

//=========================================================================================
// Backend Records
//=========================================================================================

/// A row of the backend `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// The payload inserted when a profile has to be created lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}

/// Free-form metadata the auth provider stores next to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// The identity half of an auth session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "user_metadata")]
    pub metadata: UserMetadata,
}

// Represents a backend-issued login session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUser,
}

impl AuthSession {
    /// Builds the default profile for a user that has none yet.
    ///
    /// Name falls back from `name` to `full_name` to the email local part,
    /// and finally to a placeholder. Unknown or missing roles become `Recipient`.
    pub fn default_profile(&self) -> NewProfile {
        let meta = &self.user.metadata;
        let name = meta
            .name
            .as_deref()
            .or(meta.full_name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.user
                    .email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "New user".to_string());
        let role = meta
            .role
            .as_deref()
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or_default();

        NewProfile {
            id: self.user.id,
            name,
            role,
            avatar_url: meta.avatar_url.clone(),
        }
    }
}

/// A change in the auth service's session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthSession),
    SignedOut,
    TokenRefreshed(AuthSession),
    UserUpdated(AuthSession),
}

//=========================================================================================
// Listings
//=========================================================================================

const CLAIMED: &str = "Claimed";

/// When a listing stops being available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Expiry {
    /// A human-readable descriptor such as "Today, 6pm".
    Label(String),
    /// Terminal marker for listings that were claimed.
    Claimed,
}

impl From<String> for Expiry {
    fn from(value: String) -> Self {
        if value == CLAIMED {
            Expiry::Claimed
        } else {
            Expiry::Label(value)
        }
    }
}

impl From<&str> for Expiry {
    fn from(value: &str) -> Self {
        Expiry::from(value.to_string())
    }
}

impl From<Expiry> for String {
    fn from(value: Expiry) -> Self {
        match value {
            Expiry::Label(label) => label,
            Expiry::Claimed => CLAIMED.to_string(),
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::Label(label) => f.write_str(label),
            Expiry::Claimed => f.write_str(CLAIMED),
        }
    }
}

/// A food-donation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub quantity: String,
    #[serde(default)]
    pub location: String,
    pub expiry: Expiry,
}

//=========================================================================================
// Analytics
//=========================================================================================

/// Aggregate marketplace figures, supplied from outside the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_donations: u64,
    pub total_claimed: u64,
    pub categories: BTreeMap<String, u64>,
    pub activity_labels: Vec<String>,
    pub activity_counts: Vec<u64>,
    pub meals_provided: u64,
    pub co2_saved_kg: f64,
    pub water_saved_liters: f64,
}

/// A partial analytics update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsPatch {
    #[serde(default)]
    pub total_donations: Option<u64>,
    #[serde(default)]
    pub total_claimed: Option<u64>,
    #[serde(default)]
    pub categories: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    pub activity_labels: Option<Vec<String>>,
    #[serde(default)]
    pub activity_counts: Option<Vec<u64>>,
    #[serde(default)]
    pub meals_provided: Option<u64>,
    #[serde(default)]
    pub co2_saved_kg: Option<f64>,
    #[serde(default)]
    pub water_saved_liters: Option<f64>,
}

impl Analytics {
    /// Shallow merge: each provided field replaces the current one wholesale.
    pub fn merged(&self, patch: AnalyticsPatch) -> Self {
        let current = self.clone();
        Self {
            total_donations: patch.total_donations.unwrap_or(current.total_donations),
            total_claimed: patch.total_claimed.unwrap_or(current.total_claimed),
            categories: patch.categories.unwrap_or(current.categories),
            activity_labels: patch.activity_labels.unwrap_or(current.activity_labels),
            activity_counts: patch.activity_counts.unwrap_or(current.activity_counts),
            meals_provided: patch.meals_provided.unwrap_or(current.meals_provided),
            co2_saved_kg: patch.co2_saved_kg.unwrap_or(current.co2_saved_kg),
            water_saved_liters: patch.water_saved_liters.unwrap_or(current.water_saved_liters),
        }
    }

    /// Field-by-field equality that compares the float figures by bit
    /// pattern, so a NaN figure still equals itself.
    pub fn same_figures(&self, other: &Analytics) -> bool {
        self.total_donations == other.total_donations
            && self.total_claimed == other.total_claimed
            && self.categories == other.categories
            && self.activity_labels == other.activity_labels
            && self.activity_counts == other.activity_counts
            && self.meals_provided == other.meals_provided
            && self.co2_saved_kg.to_bits() == other.co2_saved_kg.to_bits()
            && self.water_saved_liters.to_bits() == other.water_saved_liters.to_bits()
    }
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// An in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            message: message.into(),
            kind,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "domain_test.rs"]
mod tests;
