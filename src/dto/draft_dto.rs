use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dto::{player_dto::Player, render_dto::RosterView};
use crate::error::LobbyError;

/// Players each captain drafts before sides are chosen.
pub const TEAM_SIZE: usize = 4;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Enrolling,
    Drafting,
    AwaitingPlayers,
    SideSelection,
    Closed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaptainSlot {
    Captain1,
    Captain2,
}

impl CaptainSlot {
    pub fn other(self) -> Self {
        match self {
            Self::Captain1 => Self::Captain2,
            Self::Captain2 => Self::Captain1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Blue,
    Red,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Self::Blue => "Blue",
            Self::Red => "Red",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SideChoice {
    pub captain: Player,
    pub side: Side,
}

/// Where a player currently sits in the lobby.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Captain(CaptainSlot),
    Pool,
    Team1,
    Team2,
}

impl Role {
    /// Vacating a captaincy or a team slot invalidates the rosters.
    pub fn forces_reset(self) -> bool {
        !matches!(self, Role::Pool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolToggle {
    Joined,
    Left,
    /// Moved into the pool out of `vacated`; the draft was reset on the way.
    Returned { vacated: Role },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct DraftState {
    pub captain1: Option<Player>,
    pub captain2: Option<Player>,
    pub available_players: Vec<Player>,
    pub team1: Vec<Player>,
    pub team2: Vec<Player>,
    pub phase: Phase,
    pub current_turn: Option<Player>,
    pub first_picker: Option<Player>,
    pub side_choice: Option<SideChoice>,
}

impl DraftState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captain(&self, slot: CaptainSlot) -> Option<&Player> {
        match slot {
            CaptainSlot::Captain1 => self.captain1.as_ref(),
            CaptainSlot::Captain2 => self.captain2.as_ref(),
        }
    }

    fn captain_mut(&mut self, slot: CaptainSlot) -> &mut Option<Player> {
        match slot {
            CaptainSlot::Captain1 => &mut self.captain1,
            CaptainSlot::Captain2 => &mut self.captain2,
        }
    }

    pub fn team(&self, slot: CaptainSlot) -> &[Player] {
        match slot {
            CaptainSlot::Captain1 => &self.team1,
            CaptainSlot::Captain2 => &self.team2,
        }
    }

    fn team_mut(&mut self, slot: CaptainSlot) -> &mut Vec<Player> {
        match slot {
            CaptainSlot::Captain1 => &mut self.team1,
            CaptainSlot::Captain2 => &mut self.team2,
        }
    }

    /// Slot held by `player`, if they are a captain.
    pub fn captain_slot_of(&self, player: &Player) -> Option<CaptainSlot> {
        [CaptainSlot::Captain1, CaptainSlot::Captain2]
            .into_iter()
            .find(|slot| self.captain(*slot).is_some_and(|c| c.is(player)))
    }

    pub fn is_captain(&self, player: &Player) -> bool {
        self.captain_slot_of(player).is_some()
    }

    pub fn is_turn_of(&self, player: &Player) -> bool {
        self.current_turn.as_ref().is_some_and(|p| p.is(player))
    }

    pub fn role_of(&self, player: &Player) -> Option<Role> {
        if let Some(slot) = self.captain_slot_of(player) {
            return Some(Role::Captain(slot));
        }
        if self.available_players.iter().any(|p| p.is(player)) {
            return Some(Role::Pool);
        }
        if self.team1.iter().any(|p| p.is(player)) {
            return Some(Role::Team1);
        }
        if self.team2.iter().any(|p| p.is(player)) {
            return Some(Role::Team2);
        }
        None
    }

    fn vacate(&mut self, role: Role, player: &Player) {
        match role {
            Role::Captain(slot) => *self.captain_mut(slot) = None,
            Role::Pool => self.available_players.retain(|p| !p.is(player)),
            Role::Team1 => self.team1.retain(|p| !p.is(player)),
            Role::Team2 => self.team2.retain(|p| !p.is(player)),
        }
    }

    /// Puts `player` in an empty captain slot, pulling them out of whatever
    /// role they held before.
    pub fn assign_captain(&mut self, slot: CaptainSlot, player: Player) -> Result<(), LobbyError> {
        if self.captain(slot).is_some() {
            return Err(LobbyError::invalid_target("That captain slot is already taken!"));
        }

        if let Some(role) = self.role_of(&player) {
            self.vacate(role, &player);
            if role.forces_reset() {
                self.reset_draft();
            }
        }

        *self.captain_mut(slot) = Some(player);
        Ok(())
    }

    pub fn toggle_pool_membership(&mut self, player: Player) -> PoolToggle {
        match self.role_of(&player) {
            None => {
                self.available_players.push(player);
                PoolToggle::Joined
            }
            Some(Role::Pool) => {
                self.vacate(Role::Pool, &player);
                self.pause_if_pool_empty();
                PoolToggle::Left
            }
            Some(vacated) => {
                self.vacate(vacated, &player);
                self.reset_draft();
                self.available_players.push(player);
                PoolToggle::Returned { vacated }
            }
        }
    }

    /// Drops `player` from their role. Team members go back to the pool;
    /// captains and pool members leave the lobby entirely.
    pub fn remove_player(&mut self, player: &Player) -> Option<Role> {
        let role = self.role_of(player)?;
        self.vacate(role, player);

        match role {
            Role::Pool => self.pause_if_pool_empty(),
            Role::Captain(_) => self.reset_draft(),
            Role::Team1 | Role::Team2 => {
                self.available_players.push(player.clone());
                self.reset_draft();
            }
        }

        Some(role)
    }

    /// Returns every drafted player to the pool. The first picker survives so
    /// a re-draft starts with the same captain.
    pub fn reset_draft(&mut self) {
        let team1 = std::mem::take(&mut self.team1);
        let team2 = std::mem::take(&mut self.team2);
        self.available_players.extend(team1);
        self.available_players.extend(team2);
        self.phase = Phase::Enrolling;
        self.current_turn = None;
        self.side_choice = None;
    }

    pub fn is_full(&self) -> bool {
        self.captain1.is_some() && self.captain2.is_some()
    }

    pub fn is_draft_complete(&self) -> bool {
        self.team1.len() >= TEAM_SIZE && self.team2.len() >= TEAM_SIZE
    }

    /// Tosses the coin (only once per lobby) and hands the first turn to its
    /// winner.
    pub fn start_draft<R: Rng>(&mut self, rng: &mut R) -> Result<Player, LobbyError> {
        let (Some(captain1), Some(captain2)) = (&self.captain1, &self.captain2) else {
            return Err(LobbyError::invalid_phase(
                "Both captains must be set to start the draft!",
            ));
        };

        // A stored winner who has since given up the captaincy cannot pick.
        let stored = self
            .first_picker
            .as_ref()
            .filter(|p| p.is(captain1) || p.is(captain2))
            .cloned();
        let first = match stored {
            Some(p) => p,
            None => {
                let winner = if rng.random_bool(0.5) {
                    captain1.clone()
                } else {
                    captain2.clone()
                };
                self.first_picker = Some(winner.clone());
                winner
            }
        };

        self.current_turn = Some(first.clone());
        self.side_choice = None;
        self.settle_phase();
        Ok(first)
    }

    fn settle_phase(&mut self) {
        self.phase = if self.is_draft_complete() {
            Phase::SideSelection
        } else if self.available_players.is_empty() {
            Phase::AwaitingPlayers
        } else {
            Phase::Drafting
        };
    }

    pub fn pick_player(&mut self, captain: &Player, player_id: u64) -> Result<Player, LobbyError> {
        if self.phase != Phase::Drafting {
            return Err(LobbyError::invalid_phase("There is no pick in progress."));
        }
        if !self.is_turn_of(captain) {
            return Err(LobbyError::not_authorized("It is not your turn to pick!"));
        }
        let slot = self
            .captain_slot_of(captain)
            .ok_or_else(|| LobbyError::not_authorized("Only captains can pick players."))?;
        if self.team(slot).len() >= TEAM_SIZE {
            return Err(LobbyError::invalid_target("Your team is already full!"));
        }
        let index = self
            .available_players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| LobbyError::invalid_target("That player is not available."))?;

        let picked = self.available_players.remove(index);
        self.team_mut(slot).push(picked.clone());

        // The captain who completes the rosters keeps the turn to pick a side.
        if !self.is_draft_complete() {
            self.current_turn = self.captain(slot.other()).cloned();
        }
        self.settle_phase();
        Ok(picked)
    }

    /// The last pool member walking out mid-draft leaves nobody to pick.
    fn pause_if_pool_empty(&mut self) {
        if self.phase == Phase::Drafting && self.available_players.is_empty() {
            self.phase = Phase::AwaitingPlayers;
        }
    }

    /// Returns true when a paused draft picks back up.
    pub fn resume_if_waiting(&mut self) -> bool {
        if self.phase == Phase::AwaitingPlayers && !self.available_players.is_empty() {
            self.phase = Phase::Drafting;
            return true;
        }
        false
    }

    pub fn choose_side(&mut self, captain: &Player, side: Side) -> Result<(), LobbyError> {
        if self.phase != Phase::SideSelection {
            return Err(LobbyError::invalid_phase("It is not time to choose a side."));
        }
        if !self.is_turn_of(captain) {
            return Err(LobbyError::not_authorized("It is not your turn to choose a side!"));
        }

        self.side_choice = Some(SideChoice {
            captain: captain.clone(),
            side,
        });
        self.current_turn = None;
        self.phase = Phase::Closed;
        Ok(())
    }

    pub fn roster(&self) -> RosterView {
        RosterView {
            captain1: self.captain1.clone(),
            captain2: self.captain2.clone(),
            team1: self.team1.clone(),
            team2: self.team2.clone(),
            available_players: self.available_players.clone(),
        }
    }
}
