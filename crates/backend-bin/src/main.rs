// ============================
// chatroom-backend-bin/src/main.rs
// ============================
//! Process entry point: wire configuration, state, the HTTP router and
//! the presence sweeper together, and tear them down on ctrl-c.
use std::sync::Arc;

use chatroom_backend_lib::{
    config::load_settings, router::create_router, store::InMemoryStore, sweeper::spawn_sweeper,
    AppState,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(InMemoryStore::new(), settings));

    // scoped lifecycle: the sweeper starts here and is shut down below
    let sweeper = spawn_sweeper(state.clone());

    let app = create_router(state);
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "chat room backend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
}
