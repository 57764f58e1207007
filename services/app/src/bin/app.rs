//! services/app/src/bin/app.rs

use app_lib::{
    adapters::SupabaseBackend,
    config::Config,
    error::AppError,
    store::StoreProvider,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Connecting to {}...", config.supabase_url);

    // --- 2. Initialize the Backend Adapter ---
    let backend = Arc::new(SupabaseBackend::new(&config.supabase_url, &config.supabase_anon_key)?);

    // --- 3. Mount the Store ---
    let provider = StoreProvider::mount(backend.clone(), &config.sync);
    let store = provider.handle().use_store()?;
    let _changes = store.subscribe(|snapshot| {
        let state = &snapshot.state;
        info!(
            "State v{}: user={}, active={}, past={}, notifications={}",
            snapshot.version,
            state.user.as_ref().map_or("none", |u| u.name.as_str()),
            state.active.len(),
            state.past.len(),
            state.notifications.len(),
        );
    });

    // --- 4. Optional Startup Sign-In ---
    if let Some(credentials) = &config.credentials {
        let session = backend
            .sign_in_with_password(&credentials.email, &credentials.password)
            .await
            .map_err(|e| {
                error!("Sign-in failed: {}", e);
                e
            })?;
        info!("Session established for {}", session.user.id);
    }

    // --- 5. Run Until Interrupted ---
    info!("Running. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    backend.sign_out().await;
    provider.shutdown().await;

    Ok(())
}
