use serde::Deserialize;

/// Chat identity exchanged for a session token. Only the chat adapter knows
/// `key`, so users cannot mint tokens for each other.
#[derive(Debug, Deserialize)]
pub struct LoginUser {
    pub id: u64,
    pub handle: String,
    #[serde(default)]
    pub key: String,
}
