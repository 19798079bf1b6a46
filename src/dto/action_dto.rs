use serde::{Deserialize, Serialize};

use crate::dto::draft_dto::{CaptainSlot, Side};

/// Every user action the lobby understands, decoded by the adapter.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LobbyAction {
    Join,
    Leave,
    ClaimCaptain { slot: CaptainSlot },
    Start,
    Redraft,
    PickPlayer { player_id: u64, menu_id: u64 },
    ChooseSide { side: Side },
}

impl LobbyAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
            Self::ClaimCaptain { .. } => "claim_captain",
            Self::Start => "start",
            Self::Redraft => "redraft",
            Self::PickPlayer { .. } => "pick_player",
            Self::ChooseSide { .. } => "choose_side",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClaimCaptainRequest {
    pub slot: CaptainSlot,
}

#[derive(Debug, Deserialize)]
pub struct PickPlayerRequest {
    pub player_id: u64,
    pub menu_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct ChooseSideRequest {
    pub side: Side,
}
