//! HTTP control surface: the WebSocket upgrade route and `GET /health`.
//!
//! CORS follows the configured origin allow-list; in production mode an
//! empty list means no cross-origin access, while development allows any
//! origin.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::get,
};
use nightfall_core::Environment;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{AppState, gateway};

/// `GET /health` response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthReport {
    status: &'static str,
    timestamp: u64,
    rooms: usize,
    total_sockets: usize,
    players_in_rooms: usize,
    room_details: Vec<RoomDetail>,
}

/// One room entry in the health report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomDetail {
    room_id: String,
    game_mode: nightfall_proto::GameMode,
    game_started: bool,
    player_count: usize,
}

/// Build the application router.
pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(websocket_handler))
        .layer(cors_layer(&state))
        .with_state(state)
}

/// CORS layer from the configured origin policy.
fn cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);

    if state.config.allowed_origins.is_empty() {
        if state.config.production {
            // Locked down: same-origin only
            layer
        } else {
            layer.allow_origin(Any)
        }
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Upgrade `/ws` requests into game connections.
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| gateway::handle_socket(socket, state))
}

/// Liveness and occupancy report.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let room_details: Vec<RoomDetail> = state
        .rooms
        .summaries()
        .into_iter()
        .map(|(room_id, summary)| RoomDetail {
            room_id,
            game_mode: summary.game_mode,
            game_started: summary.game_started,
            player_count: summary.player_count,
        })
        .collect();

    Json(HealthReport {
        status: "ok",
        timestamp: state.env.wall_clock_millis(),
        rooms: state.rooms.room_count(),
        total_sockets: state.registry.connection_count(),
        players_in_rooms: state.registry.players_in_rooms(),
        room_details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_report_serializes_camel_case() {
        let report = HealthReport {
            status: "ok",
            timestamp: 1,
            rooms: 0,
            total_sockets: 2,
            players_in_rooms: 1,
            room_details: vec![RoomDetail {
                room_id: "arena".to_string(),
                game_mode: nightfall_proto::GameMode::Pvp,
                game_started: true,
                player_count: 2,
            }],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["totalSockets"], 2);
        assert_eq!(value["playersInRooms"], 1);
        assert_eq!(value["roomDetails"][0]["gameMode"], "pvp");
    }
}
