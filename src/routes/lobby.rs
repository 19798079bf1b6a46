use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::dto::{
    player_dto::Player,
    render_dto::{RenderInstruction, RenderPlan},
};
use crate::error::LobbyError;
use crate::services::{auth_user::AuthUser, lobby_hub::SharedLobbyHub, websocket::send_render_plan};

fn respond(
    tx: &broadcast::Sender<String>,
    actor: Player,
    result: Result<RenderPlan, LobbyError>,
) -> (StatusCode, Json<RenderPlan>) {
    match result {
        Ok(plan) => {
            send_render_plan(tx, &plan);
            (StatusCode::OK, Json(plan))
        }
        Err(e) => {
            warn!("Lobby request from {} rejected: {}", actor.handle, e);
            let plan = RenderPlan {
                instructions: vec![RenderInstruction::EphemeralError {
                    actor,
                    message: e.to_string(),
                }],
            };
            (e.status_code(), Json(plan))
        }
    }
}

pub async fn open_lobby(
    Extension(hub): Extension<SharedLobbyHub>,
    Extension(tx): Extension<broadcast::Sender<String>>,
    AuthUser(actor): AuthUser,
) -> impl IntoResponse {
    info!("Opening lobby.");
    let result = {
        let mut guard = hub.write().await;
        guard.open_lobby(&actor)
    };
    respond(&tx, actor, result)
}

pub async fn clear_lobby(
    Extension(hub): Extension<SharedLobbyHub>,
    Extension(tx): Extension<broadcast::Sender<String>>,
    AuthUser(actor): AuthUser,
) -> impl IntoResponse {
    info!("Clearing lobby.");
    let result = {
        let mut guard = hub.write().await;
        guard.clear_lobby(&actor)
    };
    respond(&tx, actor, result)
}

pub async fn get_state(
    Extension(hub): Extension<SharedLobbyHub>,
) -> impl IntoResponse {
    let guard = hub.read().await;
    match guard.snapshot() {
        Some(state) => (StatusCode::OK, Json(state)).into_response(),
        None => (StatusCode::NOT_FOUND, LobbyError::NoActiveLobby.to_string()).into_response(),
    }
}
