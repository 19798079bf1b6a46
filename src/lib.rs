//! Two-captain team draft for a chat lobby.
//!
//! Players join a pool, two captains claim their slots, a coin toss decides
//! who picks first and the captains alternate until both teams hold four
//! players. The captain who completes the rosters picks the side.
//!
//! [`dto::draft_dto::DraftState`] holds the rules and does no I/O.
//! [`services::lobby_controller::LobbyController`] authorizes actions and
//! turns every change into a [`dto::render_dto::RenderPlan`] for the chat
//! adapter. [`services::lobby_hub::LobbyHub`] keeps the single lobby a
//! process may run. The axum routes are one such adapter.

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;

use routes::{draft, lobby, users};
use services::{
    auth_user::{JwtSecret, LoginKey},
    lobby_hub::SharedLobbyHub,
    websocket::websocket_handler,
};

pub fn app(
    hub: SharedLobbyHub,
    tx: broadcast::Sender<String>,
    secret: JwtSecret,
    login_key: LoginKey,
) -> Router {
    Router::new()
        .route("/login", post(users::login_user))
        .route(
            "/lobby",
            get(lobby::get_state)
                .post(lobby::open_lobby)
                .delete(lobby::clear_lobby),
        )
        .route("/lobby/join", post(draft::join_pool))
        .route("/lobby/leave", post(draft::leave_lobby))
        .route("/lobby/captain", post(draft::claim_captain))
        .route("/lobby/start", post(draft::start_draft))
        .route("/lobby/redraft", post(draft::redraft))
        .route("/lobby/pick", post(draft::draft_pick))
        .route("/lobby/side", post(draft::choose_side))
        .route("/ws", get(websocket_handler))
        .layer(Extension(hub))
        .layer(Extension(tx))
        .layer(Extension(secret))
        .layer(Extension(login_key))
        .layer(CorsLayer::permissive())
}
