//! Nightfall production server.
//!
//! Production "glue" around [`nightfall_core`]'s pure room simulation:
//! tokio for the runtime, axum for the WebSocket transport and HTTP control
//! surface, one owner task per room for serialization, and a process-wide
//! connection registry with a stale-connection reaper.
//!
//! # Components
//!
//! - [`Registry`]: connection → player mapping, heartbeats, forced closes
//! - [`Rooms`]: room map whose entries own a per-room command queue
//! - `gateway`: per-connection read/write loops and frame routing
//! - [`SystemEnv`]: production environment (real time, OS RNG)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod gateway;
mod http;
pub mod registry;
pub mod rooms;
mod system_env;

use std::{sync::Arc, time::Instant};

pub use error::ServerError;
pub use registry::{Membership, Registry};
pub use rooms::{RoomHandle, Rooms};
pub use system_env::SystemEnv;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0:8080`)
    pub bind_address: String,
    /// Maximum concurrent WebSocket connections
    pub max_connections: usize,
    /// CORS origin allow-list; empty means any origin in development and
    /// same-origin only in production
    pub allowed_origins: Vec<String>,
    /// Production origin policy flag
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
            allowed_origins: Vec::new(),
            production: false,
        }
    }
}

/// Shared state handed to every route and connection task.
pub struct AppState {
    /// Connection registry
    pub registry: Arc<Registry>,
    /// Room map
    pub rooms: Arc<Rooms>,
    /// Production environment
    pub env: SystemEnv,
    /// Server configuration
    pub config: ServerConfig,
}

/// Production Nightfall server.
pub struct Server {
    state: Arc<AppState>,
    listener: tokio::net::TcpListener,
}

impl Server {
    /// Bind the listener and assemble shared state.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Transport`] if the bind address is unavailable
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
        let state = Arc::new(AppState {
            registry: Arc::new(Registry::new()),
            rooms: Arc::new(Rooms::new()),
            env: SystemEnv::new(),
            config,
        });
        Ok(Self { state, listener })
    }

    /// Local address the server is bound to.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Transport`] if the socket is gone
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run until the process is stopped.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Transport`] if serving fails fatally
    pub async fn run(self) -> Result<(), ServerError> {
        spawn_reaper(Arc::clone(&self.state));

        let app = http::router(Arc::clone(&self.state));
        axum::serve(self.listener, app).await?;
        Ok(())
    }
}

/// Start the process-wide stale-connection reaper.
///
/// Every sweep evicts connections whose heartbeat lapsed (player removal
/// plus connection drop) and discards room handles whose owner tasks have
/// exited.
fn spawn_reaper(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(registry::REAPER_INTERVAL);
        interval.tick().await; // immediate first tick
        loop {
            interval.tick().await;
            let stale = state.registry.stale_connections(Instant::now());
            for conn_id in stale {
                tracing::info!(conn_id, "reaping stale connection");
                state.registry.kick(conn_id);
                gateway::cleanup_player(conn_id, &state).await;
            }
            state.rooms.sweep_dead();
        }
    });
}
