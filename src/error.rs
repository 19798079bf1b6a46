use axum::http::StatusCode;
use thiserror::Error;

/// Rejections produced by the lobby. None of them are fatal: the hub turns
/// each one into a notice for the acting user and leaves the draft untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("not allowed: {0}")]
    NotAuthorized(String),

    #[error("{0}")]
    InvalidPhase(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("There is no active lobby!")]
    NoActiveLobby,

    #[error("A lobby is already active! Clear it before opening a new one.")]
    LobbyAlreadyExists,

    #[error("This pick menu has expired.")]
    StaleMenu,
}

impl LobbyError {
    pub fn not_authorized(reason: impl Into<String>) -> Self {
        Self::NotAuthorized(reason.into())
    }

    pub fn invalid_phase(reason: impl Into<String>) -> Self {
        Self::InvalidPhase(reason.into())
    }

    pub fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget(reason.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotAuthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidPhase(_) => StatusCode::CONFLICT,
            Self::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            Self::NoActiveLobby => StatusCode::NOT_FOUND,
            Self::LobbyAlreadyExists => StatusCode::CONFLICT,
            Self::StaleMenu => StatusCode::GONE,
        }
    }
}
