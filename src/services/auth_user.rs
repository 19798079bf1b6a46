use std::sync::Arc;

use crate::dto::{claims_dto::Claims, player_dto::Player};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::error;

/// HMAC secret shared by token issuing and verification.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

impl JwtSecret {
    pub fn new(secret: &str) -> Self {
        Self(Arc::from(secret))
    }
}

/// Key the chat adapter presents to exchange identities for tokens.
#[derive(Clone)]
pub struct LoginKey(Arc<str>);

impl LoginKey {
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    pub fn matches(&self, candidate: &str) -> bool {
        !candidate.is_empty() && &*self.0 == candidate
    }
}

/// The chat user behind an authenticated request.
pub struct AuthUser(pub Player);

pub fn issue_token(player: &Player, secret: &JwtSecret) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: player.id.to_string(),
        name: player.handle.clone(),
        exp: (Utc::now() + Duration::hours(24)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.0.as_bytes()),
    )
}

pub fn decode_player(token: &str, secret: &JwtSecret) -> Result<Player, (StatusCode, &'static str)> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.0.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        error!("Token decoding failed: {:?}", e);
        (StatusCode::UNAUTHORIZED, "Invalid token")
    })?;

    claims
        .claims
        .player()
        .ok_or((StatusCode::UNAUTHORIZED, "Token subject is not a player id"))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let secret = parts
            .extensions
            .get::<JwtSecret>()
            .cloned()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Token secret not configured"))?;

        let headers = &parts.headers;
        let auth = headers.get("Authorization").and_then(|h| h.to_str().ok());
        let token = auth
            .and_then(|s| s.strip_prefix("Bearer "))
            .ok_or((StatusCode::UNAUTHORIZED, "Missing or invalid Authorization header"))?;

        Ok(AuthUser(decode_player(token, &secret)?))
    }
}
