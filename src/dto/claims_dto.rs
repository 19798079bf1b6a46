use serde::{Deserialize, Serialize};

use crate::dto::player_dto::Player;

/// JWT claims identifying the chat user behind a request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub exp: usize,
}

impl Claims {
    pub fn player(&self) -> Option<Player> {
        let id = self.sub.parse().ok()?;
        Some(Player::new(id, self.name.clone()))
    }
}
