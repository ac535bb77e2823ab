//! Tile Room Server
//!
//! Binds a TCP listener, accepts WebSocket connections, and hands each
//! session off to the [`RoomRegistry`] after authentication. This binary
//! is the only place in the workspace allowed to use `anyhow`: library
//! crates return typed errors, the binary's `main` collapses them into
//! one diagnostic exit path.

mod config;
mod session;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use tile_room_auth::{AuthService, JwtAuthService};
use tile_room_persistence::PgPersistenceStore;
use tile_room_registry::RoomRegistry;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().context("loading configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .context("connecting to the persistence store")?;
    let persistence = Arc::new(PgPersistenceStore::new(pool));
    let auth: Arc<dyn AuthService> = Arc::new(JwtAuthService::from_hs256_secret(config.jwt_secret.as_bytes()));

    let (registry, mut dispose_rx) = RoomRegistry::new(persistence);
    let registry = Arc::new(registry);

    let reaper = registry.clone();
    tokio::spawn(async move {
        while let Some(world_id) = dispose_rx.recv().await {
            tracing::info!(world_id, "room disposed, evicting from registry");
            reaper.remove_disposed(&world_id);
        }
    });

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "tile room server listening");

    let next_session_id = Arc::new(AtomicU64::new(1));

    loop {
        let (stream, peer) = listener.accept().await.context("accepting connection")?;
        let session_id = next_session_id.fetch_add(1, Ordering::Relaxed);
        let registry = registry.clone();
        let auth = auth.clone();
        tokio::spawn(async move {
            session::handle_connection(stream, peer, session_id, registry, auth).await;
        });
    }
}
