//! crates/foodshare_core/src/state.rs
//!
//! The application state snapshot and its transition function.
//!
//! `reduce` is pure: it never mutates the snapshot it is given and has no
//! failure modes. Acting on an id that is not present leaves the state as it was.

use crate::domain::{Analytics, AnalyticsPatch, Expiry, Listing, Notification, User};
use uuid::Uuid;

/// Everything the UI reads from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub user: Option<User>,
    /// Open listings, in insertion order.
    pub active: Vec<Listing>,
    /// Claimed listings, most recent first.
    pub past: Vec<Listing>,
    pub analytics: Analytics,
    /// Most recent first.
    pub notifications: Vec<Notification>,
}

impl AppState {
    fn has_listing(&self, id: i64) -> bool {
        self.active.iter().chain(self.past.iter()).any(|l| l.id == id)
    }
}

/// The closed set of transitions the store accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetUser(Option<User>),
    AddListing(Listing),
    DeleteListing(i64),
    MarkAsClaimed(i64),
    UpdateAnalytics(AnalyticsPatch),
    AddNotification(Notification),
    RemoveNotification(Uuid),
    ClearAllNotifications,
}

impl Action {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetUser(_) => "SET_USER",
            Action::AddListing(_) => "ADD_LISTING",
            Action::DeleteListing(_) => "DELETE_LISTING",
            Action::MarkAsClaimed(_) => "MARK_AS_CLAIMED",
            Action::UpdateAnalytics(_) => "UPDATE_ANALYTICS",
            Action::AddNotification(_) => "ADD_NOTIFICATION",
            Action::RemoveNotification(_) => "REMOVE_NOTIFICATION",
            Action::ClearAllNotifications => "CLEAR_ALL_NOTIFICATIONS",
        }
    }
}

/// Computes the next snapshot from the current one.
pub fn reduce(state: &AppState, action: Action) -> AppState {
    transition(state, action).unwrap_or_else(|| state.clone())
}

/// Like `reduce`, but returns `None` when the action leaves the state as it was.
///
/// Each arm decides for itself whether it changed anything, so the answer
/// does not depend on `PartialEq` over the whole state.
pub fn transition(state: &AppState, action: Action) -> Option<AppState> {
    let mut next = state.clone();
    match action {
        Action::SetUser(user) => {
            if state.user == user {
                return None;
            }
            next.user = user;
        }
        Action::AddListing(listing) => {
            // Ids stay unique across active and past.
            if state.has_listing(listing.id) {
                return None;
            }
            next.active.push(listing);
        }
        Action::DeleteListing(id) => {
            let pos = next.active.iter().position(|l| l.id == id)?;
            next.active.remove(pos);
        }
        Action::MarkAsClaimed(id) => {
            let pos = next.active.iter().position(|l| l.id == id)?;
            let mut claimed = next.active.remove(pos);
            claimed.expiry = Expiry::Claimed;
            next.past.insert(0, claimed);
        }
        Action::UpdateAnalytics(patch) => {
            let merged = state.analytics.merged(patch);
            if merged.same_figures(&state.analytics) {
                return None;
            }
            next.analytics = merged;
        }
        Action::AddNotification(notification) => {
            if state.notifications.iter().any(|n| n.id == notification.id) {
                return None;
            }
            next.notifications.insert(0, notification);
        }
        Action::RemoveNotification(id) => {
            let pos = next.notifications.iter().position(|n| n.id == id)?;
            next.notifications.remove(pos);
        }
        Action::ClearAllNotifications => {
            if state.notifications.is_empty() {
                return None;
            }
            next.notifications.clear();
        }
    }
    Some(next)
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
