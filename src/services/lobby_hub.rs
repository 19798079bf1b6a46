use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::DEFAULT_PICK_MENU_SECS;
use crate::dto::{
    action_dto::LobbyAction,
    draft_dto::DraftState,
    player_dto::Player,
    render_dto::{RenderInstruction, RenderPlan},
};
use crate::error::LobbyError;
use crate::services::lobby_controller::LobbyController;

#[derive(Debug, Clone)]
pub struct LobbySettings {
    pub pick_menu_ttl: TimeDelta,
    pub rng_seed: Option<u64>,
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            pick_menu_ttl: TimeDelta::seconds(DEFAULT_PICK_MENU_SECS),
            rng_seed: None,
        }
    }
}

/// Result of a dispatched action. A rejected action still carries a plan:
/// the notice for the actor and, for stale menus, a fresh render.
#[derive(Debug)]
pub struct Dispatch {
    pub plan: RenderPlan,
    pub rejection: Option<LobbyError>,
}

/// Owner of the one lobby a process may run.
#[derive(Debug, Default)]
pub struct LobbyHub {
    lobby: Option<LobbyController>,
    settings: LobbySettings,
}

pub type SharedLobbyHub = Arc<RwLock<LobbyHub>>;

impl LobbyHub {
    pub fn new(settings: LobbySettings) -> Self {
        Self {
            lobby: None,
            settings,
        }
    }

    pub fn shared(settings: LobbySettings) -> SharedLobbyHub {
        Arc::new(RwLock::new(Self::new(settings)))
    }

    /// A closed lobby no longer counts as active.
    pub fn has_active_lobby(&self) -> bool {
        self.lobby.as_ref().is_some_and(|l| !l.is_closed())
    }

    pub fn snapshot(&self) -> Option<DraftState> {
        self.lobby.as_ref().map(|l| l.state().clone())
    }

    pub fn controller(&self) -> Option<&LobbyController> {
        self.lobby.as_ref()
    }

    pub fn open_lobby(&mut self, actor: &Player) -> Result<RenderPlan, LobbyError> {
        if self.has_active_lobby() {
            return Err(LobbyError::LobbyAlreadyExists);
        }

        let mut plan = RenderPlan::new();
        if let Some(mut finished) = self.lobby.take() {
            plan.extend(finished.teardown());
        }

        let controller = LobbyController::new(&self.settings);
        plan.extend(controller.roster_plan());
        self.lobby = Some(controller);

        info!("{} opened a lobby.", actor.handle);
        Ok(plan)
    }

    pub fn clear_lobby(&mut self, actor: &Player) -> Result<RenderPlan, LobbyError> {
        let mut controller = self.lobby.take().ok_or(LobbyError::NoActiveLobby)?;

        let mut plan = controller.teardown();
        plan.push(RenderInstruction::Announce {
            message: "Lobby cleared!".to_string(),
        });

        info!("{} cleared the lobby.", actor.handle);
        Ok(plan)
    }

    pub fn dispatch(&mut self, actor: &Player, action: LobbyAction) -> Dispatch {
        let action_name = action.name();
        let now = Utc::now();
        let result = match self.lobby.as_mut() {
            Some(controller) => controller.apply(actor, action, now),
            None => Err(LobbyError::NoActiveLobby),
        };

        match result {
            Ok(plan) => Dispatch {
                plan,
                rejection: None,
            },
            Err(error) => {
                warn!("Rejected {} from {}: {}", action_name, actor.handle, error);
                Dispatch {
                    plan: self.recover(actor, &error, now),
                    rejection: Some(error),
                }
            }
        }
    }

    fn recover(&mut self, actor: &Player, error: &LobbyError, now: DateTime<Utc>) -> RenderPlan {
        let mut plan = RenderPlan::new();
        match error {
            LobbyError::NotAuthorized(_) => {
                plan.push(RenderInstruction::Acknowledge {
                    actor: actor.clone(),
                });
            }
            LobbyError::StaleMenu => {
                plan.push(RenderInstruction::EphemeralError {
                    actor: actor.clone(),
                    message: error.to_string(),
                });
                if let Some(controller) = self.lobby.as_mut() {
                    plan.extend(controller.render_current(now));
                }
            }
            _ => {
                plan.push(RenderInstruction::EphemeralError {
                    actor: actor.clone(),
                    message: error.to_string(),
                });
            }
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::draft_dto::{CaptainSlot, Side};
    use pretty_assertions::assert_eq;

    fn player(id: u64) -> Player {
        Player::new(id, format!("p{}", id))
    }

    fn hub() -> LobbyHub {
        LobbyHub::new(LobbySettings {
            pick_menu_ttl: TimeDelta::seconds(60),
            rng_seed: Some(1),
        })
    }

    #[test]
    fn only_one_lobby_at_a_time() {
        let mut hub = hub();
        hub.open_lobby(&player(1)).unwrap();
        assert_eq!(hub.open_lobby(&player(2)), Err(LobbyError::LobbyAlreadyExists));

        hub.clear_lobby(&player(2)).unwrap();
        assert!(hub.snapshot().is_none());
        assert_eq!(hub.clear_lobby(&player(2)), Err(LobbyError::NoActiveLobby));
    }

    #[test]
    fn clear_then_open_forgets_the_first_picker() {
        let mut hub = hub();
        hub.open_lobby(&player(1)).unwrap();
        hub.dispatch(&player(1), LobbyAction::ClaimCaptain { slot: CaptainSlot::Captain1 });
        hub.dispatch(&player(2), LobbyAction::ClaimCaptain { slot: CaptainSlot::Captain2 });
        hub.dispatch(&player(3), LobbyAction::Join);
        let started = hub.dispatch(&player(1), LobbyAction::Start);
        assert!(started.rejection.is_none());
        assert!(hub.snapshot().unwrap().first_picker.is_some());

        let plan = hub.clear_lobby(&player(1)).unwrap();
        assert!(plan.instructions.contains(&RenderInstruction::RemoveRoster));
        assert!(plan.instructions.contains(&RenderInstruction::DeleteCoinToss));

        hub.open_lobby(&player(1)).unwrap();
        let fresh = hub.snapshot().unwrap();
        assert_eq!(fresh, DraftState::new());
        assert_eq!(fresh.first_picker, None);
    }

    #[test]
    fn actions_without_a_lobby_are_reported() {
        let mut hub = hub();
        let dispatch = hub.dispatch(&player(1), LobbyAction::Join);
        assert_eq!(dispatch.rejection, Some(LobbyError::NoActiveLobby));
        assert_eq!(
            dispatch.plan.instructions,
            vec![RenderInstruction::EphemeralError {
                actor: player(1),
                message: LobbyError::NoActiveLobby.to_string(),
            }]
        );
    }

    #[test]
    fn unauthorized_actions_are_acknowledged_silently() {
        let mut hub = hub();
        hub.open_lobby(&player(1)).unwrap();
        hub.dispatch(&player(1), LobbyAction::ClaimCaptain { slot: CaptainSlot::Captain1 });
        hub.dispatch(&player(2), LobbyAction::ClaimCaptain { slot: CaptainSlot::Captain2 });

        let dispatch = hub.dispatch(&player(9), LobbyAction::Start);
        assert!(matches!(dispatch.rejection, Some(LobbyError::NotAuthorized(_))));
        assert_eq!(
            dispatch.plan.instructions,
            vec![RenderInstruction::Acknowledge { actor: player(9) }]
        );
        assert!(dispatch.plan.public().is_empty());
    }

    #[test]
    fn stale_menu_rerenders_current_state() {
        let mut hub = hub();
        hub.open_lobby(&player(1)).unwrap();
        hub.dispatch(&player(1), LobbyAction::ClaimCaptain { slot: CaptainSlot::Captain1 });
        hub.dispatch(&player(2), LobbyAction::ClaimCaptain { slot: CaptainSlot::Captain2 });
        hub.dispatch(&player(3), LobbyAction::Join);
        hub.dispatch(&player(1), LobbyAction::Start);

        let state = hub.snapshot().unwrap();
        let captain = state.current_turn.clone().unwrap();
        let dispatch = hub.dispatch(
            &captain,
            LobbyAction::PickPlayer {
                player_id: 3,
                menu_id: 9_999,
            },
        );

        assert_eq!(dispatch.rejection, Some(LobbyError::StaleMenu));
        assert_eq!(hub.snapshot().unwrap(), state);
        assert!(matches!(
            dispatch.plan.instructions[1],
            RenderInstruction::ReplaceRoster { .. }
        ));
        assert!(dispatch.plan.pick_menu().is_some());
    }

    #[test]
    fn closed_lobby_can_be_replaced() {
        let mut hub = hub();
        hub.open_lobby(&player(1)).unwrap();
        hub.dispatch(&player(1), LobbyAction::ClaimCaptain { slot: CaptainSlot::Captain1 });
        hub.dispatch(&player(2), LobbyAction::ClaimCaptain { slot: CaptainSlot::Captain2 });
        for id in 3..=10 {
            hub.dispatch(&player(id), LobbyAction::Join);
        }
        hub.dispatch(&player(1), LobbyAction::Start);
        for id in 3..=10 {
            let controller = hub.controller().unwrap();
            let captain = controller.state().current_turn.clone().unwrap();
            let menu_id = controller.pick_menu().unwrap().menu_id;
            let dispatch = hub.dispatch(&captain, LobbyAction::PickPlayer { player_id: id, menu_id });
            assert!(dispatch.rejection.is_none());
        }
        let captain = hub.snapshot().unwrap().current_turn.unwrap();
        hub.dispatch(&captain, LobbyAction::ChooseSide { side: Side::Red });
        assert!(!hub.has_active_lobby());

        let plan = hub.open_lobby(&player(5)).unwrap();
        assert_eq!(plan.instructions.last(), Some(&RenderInstruction::ReplaceRoster {
            roster: DraftState::new().roster()
        }));
    }
}
