use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{error, info, warn};

use crate::dto::{player_dto::Player, user_dto::LoginUser};
use crate::services::auth_user::{issue_token, JwtSecret, LoginKey};

/* POST to exchange a chat identity for a session token */
pub async fn login_user(
    Extension(secret): Extension<JwtSecret>,
    Extension(login_key): Extension<LoginKey>,
    Json(payload): Json<LoginUser>,
) -> impl IntoResponse {
    if !login_key.matches(&payload.key) {
        warn!("Refused login for player {}: bad key.", payload.id);
        return (StatusCode::UNAUTHORIZED, Json("Invalid login key.".to_string()));
    }
    if payload.handle.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json("A handle is required.".to_string()));
    }

    let player = Player::new(payload.id, payload.handle.trim());
    match issue_token(&player, &secret) {
        Ok(token) => {
            info!("Issued token for {}.", player.handle);
            (StatusCode::OK, Json(token))
        }
        Err(e) => {
            error!("Token encoding failed: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json("Could not issue a token.".to_string()))
        }
    }
}
