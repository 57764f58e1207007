pub mod domain;
pub mod ports;
pub mod state;

pub use domain::{
    Analytics, AnalyticsPatch, AuthEvent, AuthSession, Expiry, Listing, NewProfile, Notification,
    NotificationKind, Profile, Role, SessionUser, User, UserMetadata,
};
pub use ports::{AuthService, AuthSubscription, Backend, PortError, PortResult, ProfileRepository};
pub use state::{reduce, transition, Action, AppState};
