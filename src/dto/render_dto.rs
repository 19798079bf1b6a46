use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dto::player_dto::Player;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RosterView {
    pub captain1: Option<Player>,
    pub captain2: Option<Player>,
    pub team1: Vec<Player>,
    pub team2: Vec<Player>,
    pub available_players: Vec<Player>,
}

/// A pick menu handed to the turn holder. Only the newest menu is honored,
/// and only until `expires_at`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PickMenu {
    pub menu_id: u64,
    pub options: Vec<Player>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnPrompt {
    Pick { captain: Player, menu: PickMenu },
    AwaitingPlayers,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderInstruction {
    ReplaceRoster { roster: RosterView },
    RemoveRoster,
    PostTurnPrompt { prompt: TurnPrompt },
    EditTurnPrompt { prompt: TurnPrompt },
    DeleteTurnPrompt,
    PostCoinToss { first_picker: Player },
    DeleteCoinToss,
    PostSidePrompt { captain: Player },
    CloseSidePrompt,
    Announce { message: String },
    EphemeralError { actor: Player, message: String },
    Acknowledge { actor: Player },
}

impl RenderInstruction {
    /// Ephemeral instructions are meant for the acting user only.
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::EphemeralError { .. } | Self::Acknowledge { .. })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct RenderPlan {
    pub instructions: Vec<RenderInstruction>,
}

impl RenderPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: RenderInstruction) {
        self.instructions.push(instruction);
    }

    pub fn extend(&mut self, other: RenderPlan) {
        self.instructions.extend(other.instructions);
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The part of the plan every channel member gets to see.
    pub fn public(&self) -> RenderPlan {
        RenderPlan {
            instructions: self
                .instructions
                .iter()
                .filter(|i| !i.is_ephemeral())
                .cloned()
                .collect(),
        }
    }

    /// The pick menu carried by the last turn prompt in this plan, if any.
    pub fn pick_menu(&self) -> Option<&PickMenu> {
        self.instructions.iter().rev().find_map(|i| match i {
            RenderInstruction::PostTurnPrompt {
                prompt: TurnPrompt::Pick { menu, .. },
            }
            | RenderInstruction::EditTurnPrompt {
                prompt: TurnPrompt::Pick { menu, .. },
            } => Some(menu),
            _ => None,
        })
    }
}

#[derive(Serialize)]
pub struct UpdateRender {
    pub r#type: String,
    pub instructions: Vec<RenderInstruction>,
}
