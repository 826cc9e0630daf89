//! WebSocket gateway: per-connection ingress and egress.
//!
//! Each upgraded socket gets a random connection id, a bounded outbound
//! queue drained by a dedicated send task, and a read loop that parses
//! frames and routes decoded events to room owner tasks. Malformed or
//! oversized frames close the connection; well-formed frames with unknown
//! events are dropped with a warning. Whatever ends the connection (client
//! close, transport error, a reaper or slow-consumer kick), the same
//! idempotent cleanup path runs once.

use std::{ops::ControlFlow, sync::Arc, time::Instant};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use nightfall_core::Environment;
use nightfall_proto::{
    ClientEvent, Envelope, ProtocolError, ServerEvent,
    client::JoinRoom,
    server::RoomPreview,
};
use tokio::sync::{Notify, mpsc};

use crate::{AppState, rooms::RoomCommand};

/// Capacity of each connection's outbound queue.
const SEND_QUEUE_CAPACITY: usize = 256;

/// Drive one WebSocket connection from upgrade to cleanup.
pub(crate) async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = state.env.random_u64();
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(SEND_QUEUE_CAPACITY);
    let close = Arc::new(Notify::new());

    let accepted = state.registry.register(
        conn_id,
        out_tx.clone(),
        Arc::clone(&close),
        Instant::now(),
        state.config.max_connections,
    );
    if !accepted {
        tracing::warn!(conn_id, "max connections exceeded, refusing socket");
        let _ = sink.close().await;
        return;
    }
    tracing::debug!(conn_id, "connection accepted");

    let send_task = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if handle_frame(conn_id, text.as_str(), &out_tx, &state)
                            .await
                            .is_break()
                        {
                            break;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {},
                    Some(Err(error)) => {
                        tracing::debug!(conn_id, %error, "socket error");
                        break;
                    },
                }
            },
            () = close.notified() => {
                tracing::debug!(conn_id, "connection kicked");
                break;
            },
        }
    }

    cleanup_player(conn_id, &state).await;
    send_task.abort();
}

/// The single disconnect path: unregister, notify the room, drop state.
///
/// Idempotent: the registry entry is removed exactly once, so a reaper
/// kick followed by the socket closing runs the room cleanup only once.
pub(crate) async fn cleanup_player(conn_id: u64, state: &Arc<AppState>) {
    if let Some(membership) = state.registry.unregister(conn_id) {
        if let Some(handle) = state.rooms.get(&membership.room_id) {
            let _ = handle
                .tx
                .send(RoomCommand::Leave { player_id: membership.player_id })
                .await;
        }
    }
    tracing::debug!(conn_id, "connection closed");
}

/// Parse and dispatch one text frame.
async fn handle_frame(
    conn_id: u64,
    text: &str,
    out_tx: &mpsc::Sender<String>,
    state: &Arc<AppState>,
) -> ControlFlow<()> {
    let envelope = match Envelope::parse(text) {
        Ok(envelope) => envelope,
        Err(error @ (ProtocolError::Malformed(_) | ProtocolError::FrameTooLarge { .. })) => {
            tracing::warn!(conn_id, %error, "closing connection");
            return ControlFlow::Break(());
        },
        Err(error) => {
            tracing::warn!(conn_id, %error, "dropped frame");
            return ControlFlow::Continue(());
        },
    };

    let event = match ClientEvent::decode(envelope) {
        Ok(event) => event,
        Err(error) => {
            tracing::warn!(conn_id, %error, "dropped message");
            return ControlFlow::Continue(());
        },
    };

    match event {
        ClientEvent::Heartbeat => {
            state.registry.heartbeat(conn_id, Instant::now());
        },

        ClientEvent::Ping => {
            send_direct(out_tx, &ServerEvent::Pong, state);
        },

        ClientEvent::JoinRoom(join) => {
            join_room(conn_id, join, out_tx, state).await;
        },

        ClientEvent::LeaveRoom => {
            if let Some(membership) = state.registry.membership(conn_id) {
                state.registry.clear_membership(conn_id);
                if let Some(handle) = state.rooms.get(&membership.room_id) {
                    let _ = handle
                        .tx
                        .send(RoomCommand::Leave { player_id: membership.player_id })
                        .await;
                }
            }
        },

        ClientEvent::PreviewRoom(preview) => {
            let reply = match state.rooms.get(&preview.room_id) {
                Some(handle) => {
                    let summary = handle.summary.lock().ok().map(|summary| summary.clone());
                    summary.map_or_else(
                        || empty_preview(&preview.room_id),
                        |summary| RoomPreview {
                            room_id: preview.room_id.clone(),
                            exists: true,
                            player_count: summary.player_count,
                            max_players: nightfall_core::MAX_PLAYERS,
                            player_names: summary.player_names,
                            game_mode: Some(summary.game_mode),
                            game_started: summary.game_started,
                        },
                    )
                },
                None => empty_preview(&preview.room_id),
            };
            send_direct(out_tx, &ServerEvent::RoomPreview(reply), state);
        },

        routed => {
            let Some(membership) = state.registry.membership(conn_id) else {
                return ControlFlow::Continue(());
            };
            // Unknown or foreign room id: silent drop
            if routed.room_id() != Some(membership.room_id.as_str()) {
                return ControlFlow::Continue(());
            }
            let Some(handle) = state.rooms.get(&membership.room_id) else {
                return ControlFlow::Continue(());
            };
            let _ = handle
                .tx
                .send(RoomCommand::Event { player_id: membership.player_id, event: routed })
                .await;
        },
    }

    ControlFlow::Continue(())
}

/// Join (or create) a room. An existing membership is left first.
async fn join_room(
    conn_id: u64,
    join: JoinRoom,
    out_tx: &mpsc::Sender<String>,
    state: &Arc<AppState>,
) {
    if let Some(previous) = state.registry.membership(conn_id) {
        state.registry.clear_membership(conn_id);
        if let Some(handle) = state.rooms.get(&previous.room_id) {
            let _ = handle
                .tx
                .send(RoomCommand::Leave { player_id: previous.player_id })
                .await;
        }
    }

    let player_id = format!("p{conn_id:016x}");
    let mode = join.game_mode.unwrap_or_default();

    // The owner task may be exiting between lookup and send; retry once
    // against a freshly spawned room.
    for _ in 0..2 {
        let Some(handle) =
            state.rooms.get_or_create(&join.room_id, mode, &state.registry, &state.env)
        else {
            return;
        };
        let command = RoomCommand::Join {
            conn_id,
            player_id: player_id.clone(),
            name: join.player_name.clone(),
            weapon: join.weapon.clone(),
            subclass: join.subclass.clone(),
            outbound: out_tx.clone(),
        };
        // Membership is recorded by the owner task once the join succeeds
        if handle.tx.send(command).await.is_ok() {
            return;
        }
        state.rooms.sweep_dead();
    }
    tracing::warn!(conn_id, room_id = %join.room_id, "join failed: room task unavailable");
}

/// Reply on this connection without room routing.
fn send_direct(out_tx: &mpsc::Sender<String>, event: &ServerEvent, state: &Arc<AppState>) {
    match event.encode(state.env.wall_clock_millis()) {
        Ok(frame) => {
            let _ = out_tx.try_send(frame);
        },
        Err(error) => tracing::error!(%error, "failed to encode reply"),
    }
}

/// Preview reply for a room that does not exist.
fn empty_preview(room_id: &str) -> RoomPreview {
    RoomPreview {
        room_id: room_id.to_string(),
        exists: false,
        player_count: 0,
        max_players: nightfall_core::MAX_PLAYERS,
        player_names: Vec::new(),
        game_mode: None,
        game_started: false,
    }
}
