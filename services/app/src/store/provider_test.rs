use super::*;
use async_trait::async_trait;
use foodshare_core::domain::{NewProfile, Notification, NotificationKind, Profile};
use foodshare_core::ports::{AuthService, PortError, PortResult, ProfileRepository};
use uuid::Uuid;

/// A backend with no session that never emits events.
struct IdleBackend;

#[async_trait]
impl AuthService for IdleBackend {
    fn on_auth_state_change(&self) -> AuthSubscription {
        AuthSubscription::new(futures::stream::pending())
    }

    async fn get_session(&self) -> PortResult<Option<foodshare_core::domain::AuthSession>> {
        Ok(None)
    }
}

#[async_trait]
impl ProfileRepository for IdleBackend {
    async fn select_by_id(&self, _id: Uuid) -> PortResult<Option<Profile>> {
        Ok(None)
    }

    async fn insert(&self, _profile: NewProfile) -> PortResult<Profile> {
        Err(PortError::Unauthorized)
    }
}

fn mount() -> StoreProvider {
    StoreProvider::mount(Arc::new(IdleBackend), &SyncConfig::default())
}

#[tokio::test]
async fn handle_gives_state_and_dispatch() {
    let provider = mount();
    let ctx = provider.handle().use_store().unwrap();
    assert!(ctx.state.notifications.is_empty());

    ctx.dispatch(Action::AddNotification(Notification::new(NotificationKind::Info, "Hi", "Welcome")));

    assert!(ctx.state.notifications.is_empty());
    assert_eq!(ctx.current().notifications.len(), 1);
    assert_eq!(provider.store().state().notifications.len(), 1);
}

#[tokio::test]
async fn handle_fails_after_shutdown() {
    let provider = mount();
    let handle = provider.handle();
    provider.shutdown().await;

    let err = handle.use_store().err().unwrap();
    assert!(matches!(err, AppError::OutsideProvider));
    assert_eq!(err.to_string(), "Configuration error: store used outside of its provider");
}

#[tokio::test]
async fn handle_fails_after_drop() {
    let provider = mount();
    let handle = provider.handle().clone();
    drop(provider);
    assert!(matches!(handle.use_store(), Err(AppError::OutsideProvider)));
}

#[tokio::test]
async fn context_subscription_sees_dispatches() {
    let provider = mount();
    let ctx = provider.handle().use_store().unwrap();
    let mut rx = ctx.watch();

    ctx.dispatch(Action::AddNotification(Notification::new(NotificationKind::Warning, "Expiring", "Soon")));

    let snapshot = rx.wait_for(|s| s.version == 1).await.unwrap().clone();
    assert_eq!(snapshot.state.notifications[0].title, "Expiring");
    provider.shutdown().await;
}
