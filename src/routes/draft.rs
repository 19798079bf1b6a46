use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use tokio::sync::broadcast;
use tracing::info;

use crate::dto::{
    action_dto::{ChooseSideRequest, ClaimCaptainRequest, LobbyAction, PickPlayerRequest},
    player_dto::Player,
    render_dto::RenderPlan,
};
use crate::services::{auth_user::AuthUser, lobby_hub::SharedLobbyHub, websocket::send_render_plan};

/// Applies one action under the write lock, then broadcasts once the lock is
/// gone. The caller gets the full plan, private notices included.
pub async fn run_action(
    hub: &SharedLobbyHub,
    tx: &broadcast::Sender<String>,
    actor: Player,
    action: LobbyAction,
) -> (StatusCode, Json<RenderPlan>) {
    info!("{} requested {}.", actor.handle, action.name());

    let dispatch = {
        let mut guard = hub.write().await;
        guard.dispatch(&actor, action)
    };

    send_render_plan(tx, &dispatch.plan);

    let status = dispatch
        .rejection
        .as_ref()
        .map(|e| e.status_code())
        .unwrap_or(StatusCode::OK);
    (status, Json(dispatch.plan))
}

pub async fn join_pool(
    Extension(hub): Extension<SharedLobbyHub>,
    Extension(tx): Extension<broadcast::Sender<String>>,
    AuthUser(actor): AuthUser,
) -> impl IntoResponse {
    run_action(&hub, &tx, actor, LobbyAction::Join).await
}

pub async fn leave_lobby(
    Extension(hub): Extension<SharedLobbyHub>,
    Extension(tx): Extension<broadcast::Sender<String>>,
    AuthUser(actor): AuthUser,
) -> impl IntoResponse {
    run_action(&hub, &tx, actor, LobbyAction::Leave).await
}

pub async fn claim_captain(
    Extension(hub): Extension<SharedLobbyHub>,
    Extension(tx): Extension<broadcast::Sender<String>>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<ClaimCaptainRequest>,
) -> impl IntoResponse {
    run_action(&hub, &tx, actor, LobbyAction::ClaimCaptain { slot: payload.slot }).await
}

pub async fn start_draft(
    Extension(hub): Extension<SharedLobbyHub>,
    Extension(tx): Extension<broadcast::Sender<String>>,
    AuthUser(actor): AuthUser,
) -> impl IntoResponse {
    run_action(&hub, &tx, actor, LobbyAction::Start).await
}

pub async fn redraft(
    Extension(hub): Extension<SharedLobbyHub>,
    Extension(tx): Extension<broadcast::Sender<String>>,
    AuthUser(actor): AuthUser,
) -> impl IntoResponse {
    run_action(&hub, &tx, actor, LobbyAction::Redraft).await
}

pub async fn draft_pick(
    Extension(hub): Extension<SharedLobbyHub>,
    Extension(tx): Extension<broadcast::Sender<String>>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<PickPlayerRequest>,
) -> impl IntoResponse {
    let action = LobbyAction::PickPlayer {
        player_id: payload.player_id,
        menu_id: payload.menu_id,
    };
    run_action(&hub, &tx, actor, action).await
}

pub async fn choose_side(
    Extension(hub): Extension<SharedLobbyHub>,
    Extension(tx): Extension<broadcast::Sender<String>>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<ChooseSideRequest>,
) -> impl IntoResponse {
    run_action(&hub, &tx, actor, LobbyAction::ChooseSide { side: payload.side }).await
}
