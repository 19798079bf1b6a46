use chrono::{DateTime, TimeDelta, Utc};
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::dto::{
    action_dto::LobbyAction,
    draft_dto::{CaptainSlot, DraftState, Phase, PoolToggle, Role, Side},
    player_dto::Player,
    render_dto::{PickMenu, RenderInstruction, RenderPlan, TurnPrompt},
};
use crate::error::LobbyError;
use crate::services::lobby_hub::LobbySettings;

/// Messages the controller has put on screen. The draft itself knows nothing
/// about them.
#[derive(Debug, Default, Clone)]
struct Displays {
    turn_prompt: bool,
    coin_toss: bool,
    side_prompt: bool,
    pick_menu: Option<PickMenu>,
}

/// Drives a single lobby: checks who may do what, applies the change to the
/// draft and works out what the chat has to show afterwards.
#[derive(Debug)]
pub struct LobbyController {
    state: DraftState,
    rng: StdRng,
    pick_menu_ttl: TimeDelta,
    displays: Displays,
    next_menu_id: u64,
}

impl LobbyController {
    pub fn new(settings: &LobbySettings) -> Self {
        let rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            state: DraftState::new(),
            rng,
            pick_menu_ttl: settings.pick_menu_ttl,
            displays: Displays::default(),
            next_menu_id: 1,
        }
    }

    pub fn state(&self) -> &DraftState {
        &self.state
    }

    pub fn pick_menu(&self) -> Option<&PickMenu> {
        self.displays.pick_menu.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.state.phase == Phase::Closed
    }

    pub fn apply(
        &mut self,
        actor: &Player,
        action: LobbyAction,
        now: DateTime<Utc>,
    ) -> Result<RenderPlan, LobbyError> {
        match action {
            LobbyAction::Join => self.join_or_leave_pool(actor, now),
            LobbyAction::Leave => self.leave(actor, now),
            LobbyAction::ClaimCaptain { slot } => self.claim_captain(actor, slot),
            LobbyAction::Start => self.start_draft(actor, now),
            LobbyAction::Redraft => self.redraft(actor, now),
            LobbyAction::PickPlayer { player_id, menu_id } => {
                self.pick_player(actor, player_id, menu_id, now)
            }
            LobbyAction::ChooseSide { side } => self.choose_side(actor, side),
        }
    }

    fn ensure_open(&self) -> Result<(), LobbyError> {
        if self.is_closed() {
            return Err(LobbyError::invalid_phase(
                "This lobby is closed. Open a new one to draft again.",
            ));
        }
        Ok(())
    }

    fn roster(&self) -> RenderInstruction {
        RenderInstruction::ReplaceRoster {
            roster: self.state.roster(),
        }
    }

    pub fn roster_plan(&self) -> RenderPlan {
        RenderPlan {
            instructions: vec![self.roster()],
        }
    }

    /// Takes down every draft prompt before the rosters are reset.
    fn teardown_draft_displays(&mut self, plan: &mut RenderPlan) {
        if self.displays.turn_prompt {
            plan.push(RenderInstruction::DeleteTurnPrompt);
        }
        if self.displays.coin_toss {
            plan.push(RenderInstruction::DeleteCoinToss);
        }
        if self.displays.side_prompt {
            plan.push(RenderInstruction::CloseSidePrompt);
        }
        self.displays = Displays::default();
    }

    fn issue_pick_menu(&mut self, now: DateTime<Utc>) -> PickMenu {
        let menu = PickMenu {
            menu_id: self.next_menu_id,
            options: self.state.available_players.clone(),
            expires_at: now + self.pick_menu_ttl,
        };
        self.next_menu_id += 1;
        self.displays.pick_menu = Some(menu.clone());
        menu
    }

    fn show_turn_prompt(&mut self, plan: &mut RenderPlan, prompt: TurnPrompt) {
        if self.displays.turn_prompt {
            plan.push(RenderInstruction::EditTurnPrompt { prompt });
        } else {
            plan.push(RenderInstruction::PostTurnPrompt { prompt });
            self.displays.turn_prompt = true;
        }
    }

    /// Puts up whatever the current phase asks the turn holder to do.
    fn open_turn_prompt(&mut self, plan: &mut RenderPlan, now: DateTime<Utc>) {
        match self.state.phase {
            Phase::Drafting => {
                let Some(captain) = self.state.current_turn.clone() else {
                    return;
                };
                let menu = self.issue_pick_menu(now);
                debug!("Opened pick menu {} for {}.", menu.menu_id, captain.handle);
                self.show_turn_prompt(plan, TurnPrompt::Pick { captain, menu });
            }
            Phase::AwaitingPlayers => {
                self.displays.pick_menu = None;
                self.show_turn_prompt(plan, TurnPrompt::AwaitingPlayers);
            }
            Phase::SideSelection => {
                self.displays.pick_menu = None;
                if self.displays.turn_prompt {
                    plan.push(RenderInstruction::DeleteTurnPrompt);
                    self.displays.turn_prompt = false;
                }
                if !self.displays.side_prompt {
                    if let Some(captain) = self.state.current_turn.clone() {
                        plan.push(RenderInstruction::PostSidePrompt { captain });
                        self.displays.side_prompt = true;
                    }
                }
            }
            Phase::Enrolling | Phase::Closed => {}
        }
    }

    pub fn join_or_leave_pool(
        &mut self,
        actor: &Player,
        now: DateTime<Utc>,
    ) -> Result<RenderPlan, LobbyError> {
        self.ensure_open()?;
        let mut plan = RenderPlan::new();

        let toggle = self.state.toggle_pool_membership(actor.clone());
        if let PoolToggle::Returned { vacated } = toggle {
            info!("{} left {:?} for the pool, draft reset.", actor.handle, vacated);
            self.teardown_draft_displays(&mut plan);
        }
        plan.push(self.roster());

        if toggle == PoolToggle::Joined && self.state.resume_if_waiting() {
            info!("{} joined, draft resumes.", actor.handle);
        }
        self.refresh_pick_prompt(&mut plan, now);

        Ok(plan)
    }

    /// The pool changed under an open prompt: re-issue it against the
    /// current pool, or swap it for the placeholder once the pool is empty.
    fn refresh_pick_prompt(&mut self, plan: &mut RenderPlan, now: DateTime<Utc>) {
        if matches!(self.state.phase, Phase::Drafting | Phase::AwaitingPlayers) {
            self.open_turn_prompt(plan, now);
        }
    }

    pub fn claim_captain(&mut self, actor: &Player, slot: CaptainSlot) -> Result<RenderPlan, LobbyError> {
        self.ensure_open()?;
        let previous = self.state.role_of(actor);

        self.state.assign_captain(slot, actor.clone())?;
        info!("{} is now {:?}.", actor.handle, slot);

        let mut plan = RenderPlan::new();
        if previous.is_some_and(|role| role.forces_reset()) {
            self.teardown_draft_displays(&mut plan);
        }
        plan.push(self.roster());
        Ok(plan)
    }

    pub fn leave(&mut self, actor: &Player, now: DateTime<Utc>) -> Result<RenderPlan, LobbyError> {
        self.ensure_open()?;
        let mut plan = RenderPlan::new();

        match self.state.remove_player(actor) {
            Some(role) => {
                info!("{} left {:?}.", actor.handle, role);
                if role.forces_reset() {
                    self.teardown_draft_displays(&mut plan);
                }
                plan.push(self.roster());
                if role == Role::Pool {
                    self.refresh_pick_prompt(&mut plan, now);
                }
            }
            None => plan.push(self.roster()),
        }
        Ok(plan)
    }

    fn ensure_captain_with_full_lobby(&self, actor: &Player, action: &str) -> Result<(), LobbyError> {
        if !self.state.is_full() {
            return Err(LobbyError::invalid_phase(format!(
                "Both captains must be set to {} the draft!",
                action
            )));
        }
        if !self.state.is_captain(actor) {
            return Err(LobbyError::not_authorized(format!(
                "only captains can {} the draft",
                action
            )));
        }
        Ok(())
    }

    /// Coin toss (first time only) followed by the first prompt.
    fn begin_draft(&mut self, plan: &mut RenderPlan, now: DateTime<Utc>) -> Result<(), LobbyError> {
        let first_picker = self.state.start_draft(&mut self.rng)?;
        info!("Coin toss: {} picks first.", first_picker.handle);

        if self.displays.coin_toss {
            plan.push(RenderInstruction::DeleteCoinToss);
        }
        plan.push(RenderInstruction::PostCoinToss { first_picker });
        self.displays.coin_toss = true;

        self.open_turn_prompt(plan, now);
        Ok(())
    }

    pub fn start_draft(&mut self, actor: &Player, now: DateTime<Utc>) -> Result<RenderPlan, LobbyError> {
        self.ensure_open()?;
        self.ensure_captain_with_full_lobby(actor, "start")?;
        if self.state.phase != Phase::Enrolling {
            return Err(LobbyError::invalid_phase(
                "The draft is already running! Use re-draft to start over.",
            ));
        }

        let mut plan = RenderPlan::new();
        self.begin_draft(&mut plan, now)?;
        Ok(plan)
    }

    pub fn redraft(&mut self, actor: &Player, now: DateTime<Utc>) -> Result<RenderPlan, LobbyError> {
        self.ensure_open()?;
        self.ensure_captain_with_full_lobby(actor, "restart")?;

        let mut plan = RenderPlan::new();
        self.teardown_draft_displays(&mut plan);
        self.state.reset_draft();
        plan.push(self.roster());
        plan.push(RenderInstruction::Announce {
            message: "Draft restarted! Continuing with the same starting captain.".to_string(),
        });
        info!("{} restarted the draft.", actor.handle);

        self.begin_draft(&mut plan, now)?;
        Ok(plan)
    }

    pub fn pick_player(
        &mut self,
        actor: &Player,
        player_id: u64,
        menu_id: u64,
        now: DateTime<Utc>,
    ) -> Result<RenderPlan, LobbyError> {
        self.ensure_open()?;
        if self.state.phase != Phase::Drafting {
            return Err(LobbyError::invalid_phase("There is no pick in progress."));
        }
        if !self.state.is_turn_of(actor) {
            return Err(LobbyError::not_authorized("It is not your turn to pick!"));
        }
        match &self.displays.pick_menu {
            Some(menu) if menu.menu_id == menu_id && now <= menu.expires_at => {}
            _ => return Err(LobbyError::StaleMenu),
        }

        let picked = self.state.pick_player(actor, player_id)?;
        info!("{} picked {}.", actor.handle, picked.handle);

        let mut plan = RenderPlan::new();
        plan.push(self.roster());
        self.open_turn_prompt(&mut plan, now);
        Ok(plan)
    }

    pub fn choose_side(&mut self, actor: &Player, side: Side) -> Result<RenderPlan, LobbyError> {
        self.ensure_open()?;
        self.state.choose_side(actor, side)?;
        info!("{} chose the {} side, lobby closed.", actor.handle, side.label());

        let mut plan = RenderPlan::new();
        if self.displays.side_prompt {
            plan.push(RenderInstruction::CloseSidePrompt);
            self.displays.side_prompt = false;
        }
        plan.push(RenderInstruction::Announce {
            message: format!("{} chose the **{}** side!", actor.mention(), side.label()),
        });
        Ok(plan)
    }

    /// Roster plus a fresh prompt for the current phase.
    pub fn render_current(&mut self, now: DateTime<Utc>) -> RenderPlan {
        let mut plan = self.roster_plan();
        self.open_turn_prompt(&mut plan, now);
        plan
    }

    /// Removes everything this lobby put on screen.
    pub fn teardown(&mut self) -> RenderPlan {
        let mut plan = RenderPlan::new();
        self.teardown_draft_displays(&mut plan);
        plan.push(RenderInstruction::RemoveRoster);
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn player(id: u64) -> Player {
        Player::new(id, format!("p{}", id))
    }

    fn settings() -> LobbySettings {
        LobbySettings {
            pick_menu_ttl: TimeDelta::seconds(60),
            rng_seed: Some(99),
        }
    }

    /// Captains 1 and 2 with `pool` waiting to be picked.
    fn lobby(pool: &[u64]) -> LobbyController {
        let mut controller = LobbyController::new(&settings());
        controller.claim_captain(&player(1), CaptainSlot::Captain1).unwrap();
        controller.claim_captain(&player(2), CaptainSlot::Captain2).unwrap();
        for id in pool {
            controller.join_or_leave_pool(&player(*id), Utc::now()).unwrap();
        }
        controller
    }

    fn turn(controller: &LobbyController) -> Player {
        controller.state().current_turn.clone().unwrap()
    }

    fn menu_id(controller: &LobbyController) -> u64 {
        controller.pick_menu().unwrap().menu_id
    }

    fn pick(controller: &mut LobbyController, id: u64) -> RenderPlan {
        let captain = turn(controller);
        let menu = menu_id(controller);
        controller.pick_player(&captain, id, menu, Utc::now()).unwrap()
    }

    #[test]
    fn start_posts_coin_toss_and_pick_menu() {
        let mut controller = lobby(&[3, 4]);
        let plan = controller.start_draft(&player(1), Utc::now()).unwrap();

        let first = controller.state().first_picker.clone().unwrap();
        assert_eq!(
            plan.instructions[0],
            RenderInstruction::PostCoinToss {
                first_picker: first.clone()
            }
        );
        match &plan.instructions[1] {
            RenderInstruction::PostTurnPrompt {
                prompt: TurnPrompt::Pick { captain, menu },
            } => {
                assert_eq!(captain, &first);
                assert_eq!(menu.options, vec![player(3), player(4)]);
            }
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    #[test]
    fn start_is_gated() {
        let mut controller = LobbyController::new(&settings());
        controller.claim_captain(&player(1), CaptainSlot::Captain1).unwrap();
        assert!(matches!(
            controller.start_draft(&player(1), Utc::now()),
            Err(LobbyError::InvalidPhase(_))
        ));

        controller.claim_captain(&player(2), CaptainSlot::Captain2).unwrap();
        let before = controller.state().clone();
        assert!(matches!(
            controller.start_draft(&player(7), Utc::now()),
            Err(LobbyError::NotAuthorized(_))
        ));
        assert_eq!(controller.state(), &before);

        controller.start_draft(&player(2), Utc::now()).unwrap();
        assert!(matches!(
            controller.start_draft(&player(1), Utc::now()),
            Err(LobbyError::InvalidPhase(_))
        ));
    }

    #[test]
    fn stale_and_expired_menus_are_rejected() {
        let mut controller = lobby(&[3, 4, 5]);
        controller.start_draft(&player(1), Utc::now()).unwrap();
        let captain = turn(&controller);
        let menu = menu_id(&controller);
        let before = controller.state().clone();

        assert_eq!(
            controller.pick_player(&captain, 3, menu + 1, Utc::now()),
            Err(LobbyError::StaleMenu)
        );
        let later = Utc::now() + TimeDelta::seconds(120);
        assert_eq!(
            controller.pick_player(&captain, 3, menu, later),
            Err(LobbyError::StaleMenu)
        );
        assert_eq!(controller.state(), &before);

        pick(&mut controller, 3);
        assert_eq!(
            controller.pick_player(&turn(&controller), 4, menu, Utc::now()),
            Err(LobbyError::StaleMenu)
        );
    }

    #[test]
    fn non_turn_holder_pick_changes_nothing() {
        let mut controller = lobby(&[3, 4]);
        controller.start_draft(&player(1), Utc::now()).unwrap();
        let waiting = if turn(&controller).id == 1 { player(2) } else { player(1) };
        let menu = menu_id(&controller);
        let before = controller.state().clone();

        assert!(matches!(
            controller.pick_player(&waiting, 3, menu, Utc::now()),
            Err(LobbyError::NotAuthorized(_))
        ));
        assert!(matches!(
            controller.choose_side(&waiting, Side::Blue),
            Err(LobbyError::InvalidPhase(_))
        ));
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn pool_running_dry_pauses_and_join_resumes() {
        let mut controller = lobby(&[3]);
        controller.start_draft(&player(1), Utc::now()).unwrap();

        let plan = pick(&mut controller, 3);
        assert_eq!(controller.state().phase, Phase::AwaitingPlayers);
        assert_eq!(
            plan.instructions.last(),
            Some(&RenderInstruction::EditTurnPrompt {
                prompt: TurnPrompt::AwaitingPlayers
            })
        );
        assert!(controller.pick_menu().is_none());

        let waiting_on = turn(&controller);
        let plan = controller.join_or_leave_pool(&player(4), Utc::now()).unwrap();
        assert_eq!(controller.state().phase, Phase::Drafting);
        assert_eq!(turn(&controller), waiting_on);
        assert!(matches!(
            plan.instructions.last(),
            Some(RenderInstruction::EditTurnPrompt {
                prompt: TurnPrompt::Pick { .. }
            })
        ));
        assert_eq!(plan.pick_menu().map(|m| m.options.clone()), Some(vec![player(4)]));
    }

    #[test]
    fn pool_changes_mid_draft_refresh_the_prompt() {
        let mut controller = lobby(&[3]);
        controller.start_draft(&player(1), Utc::now()).unwrap();
        let waiting_on = turn(&controller);

        let plan = controller.join_or_leave_pool(&player(3), Utc::now()).unwrap();
        assert_eq!(controller.state().phase, Phase::AwaitingPlayers);
        assert!(controller.pick_menu().is_none());
        assert_eq!(
            plan.instructions.last(),
            Some(&RenderInstruction::EditTurnPrompt {
                prompt: TurnPrompt::AwaitingPlayers
            })
        );

        let plan = controller.join_or_leave_pool(&player(4), Utc::now()).unwrap();
        assert_eq!(controller.state().phase, Phase::Drafting);
        assert_eq!(turn(&controller), waiting_on);
        assert_eq!(plan.pick_menu().map(|m| m.options.clone()), Some(vec![player(4)]));
        assert_eq!(plan.pick_menu(), controller.pick_menu());

        controller.join_or_leave_pool(&player(5), Utc::now()).unwrap();
        let plan = controller.leave(&player(4), Utc::now()).unwrap();
        assert_eq!(plan.pick_menu().map(|m| m.options.clone()), Some(vec![player(5)]));
        pick(&mut controller, 5);
        assert_eq!(controller.state().phase, Phase::AwaitingPlayers);
    }

    #[test]
    fn menu_expiry_follows_the_action_clock() {
        let mut controller = lobby(&[3, 4]);
        let opened = Utc::now() - TimeDelta::hours(1);
        controller.start_draft(&player(1), opened).unwrap();
        let menu = controller.pick_menu().cloned().unwrap();
        assert_eq!(menu.expires_at, opened + TimeDelta::seconds(60));

        let captain = turn(&controller);
        assert_eq!(
            controller.pick_player(&captain, 3, menu.menu_id, menu.expires_at + TimeDelta::seconds(1)),
            Err(LobbyError::StaleMenu)
        );
        controller
            .pick_player(&captain, 3, menu.menu_id, menu.expires_at)
            .unwrap();
    }

    #[test]
    fn completed_rosters_move_to_side_selection() {
        let mut controller = lobby(&[3, 4, 5, 6, 7, 8, 9, 10]);
        controller.start_draft(&player(1), Utc::now()).unwrap();
        for id in 3..10 {
            pick(&mut controller, id);
        }
        let last = turn(&controller);
        let plan = pick(&mut controller, 10);

        assert_eq!(controller.state().phase, Phase::SideSelection);
        assert_eq!(turn(&controller), last);
        assert_eq!(
            &plan.instructions[1..],
            &[
                RenderInstruction::DeleteTurnPrompt,
                RenderInstruction::PostSidePrompt {
                    captain: last.clone()
                },
            ]
        );

        let plan = controller.choose_side(&last, Side::Blue).unwrap();
        assert_eq!(plan.instructions[0], RenderInstruction::CloseSidePrompt);
        assert!(controller.is_closed());
        assert!(matches!(
            controller.join_or_leave_pool(&player(11), Utc::now()),
            Err(LobbyError::InvalidPhase(_))
        ));
    }

    #[test]
    fn redraft_keeps_the_first_picker() {
        let mut controller = lobby(&[3, 4, 5]);
        controller.start_draft(&player(1), Utc::now()).unwrap();
        let first = controller.state().first_picker.clone().unwrap();
        pick(&mut controller, 3);
        pick(&mut controller, 4);

        for _ in 0..5 {
            let plan = controller.redraft(&player(2), Utc::now()).unwrap();
            assert_eq!(plan.instructions[0], RenderInstruction::DeleteTurnPrompt);
            assert_eq!(plan.instructions[1], RenderInstruction::DeleteCoinToss);
            assert_eq!(controller.state().first_picker, Some(first.clone()));
            assert_eq!(turn(&controller), first);
            assert!(controller.state().team1.is_empty() && controller.state().team2.is_empty());
            assert_eq!(controller.state().available_players.len(), 3);
            pick(&mut controller, 5);
        }
    }

    #[test]
    fn redraft_needs_a_captain() {
        let mut controller = lobby(&[3]);
        assert!(matches!(
            controller.redraft(&player(3), Utc::now()),
            Err(LobbyError::NotAuthorized(_))
        ));
        controller.leave(&player(2), Utc::now()).unwrap();
        assert!(matches!(
            controller.redraft(&player(1), Utc::now()),
            Err(LobbyError::InvalidPhase(_))
        ));
    }

    #[test]
    fn captain_leaving_tears_down_prompts() {
        let mut controller = lobby(&[3, 4, 5]);
        controller.start_draft(&player(1), Utc::now()).unwrap();
        let first = controller.state().first_picker.clone();
        pick(&mut controller, 3);

        let plan = controller.leave(&player(1), Utc::now()).unwrap();
        assert_eq!(plan.instructions[0], RenderInstruction::DeleteTurnPrompt);
        assert_eq!(plan.instructions[1], RenderInstruction::DeleteCoinToss);
        assert!(matches!(plan.instructions[2], RenderInstruction::ReplaceRoster { .. }));

        let state = controller.state();
        assert_eq!(state.phase, Phase::Enrolling);
        assert_eq!(state.captain1, None);
        assert!(state.team1.is_empty() && state.team2.is_empty());
        assert_eq!(state.available_players.len(), 3);
        assert_eq!(state.first_picker, first);
        assert!(controller.pick_menu().is_none());
    }

    #[test]
    fn leaving_without_a_role_only_rerenders() {
        let mut controller = lobby(&[]);
        let before = controller.state().clone();
        let plan = controller.leave(&player(42), Utc::now()).unwrap();
        assert_eq!(plan, controller.roster_plan());
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn render_current_reissues_the_menu() {
        let mut controller = lobby(&[3, 4]);
        controller.start_draft(&player(1), Utc::now()).unwrap();
        let old = menu_id(&controller);

        let plan = controller.render_current(Utc::now());
        let fresh = plan.pick_menu().unwrap().menu_id;
        assert!(fresh > old);
        assert_eq!(menu_id(&controller), fresh);
    }

    #[test]
    fn apply_routes_actions() {
        let mut controller = LobbyController::new(&settings());
        controller
            .apply(&player(1), LobbyAction::ClaimCaptain { slot: CaptainSlot::Captain1 }, Utc::now())
            .unwrap();
        controller.apply(&player(3), LobbyAction::Join, Utc::now()).unwrap();
        assert_eq!(controller.state().captain1, Some(player(1)));
        assert_eq!(controller.state().available_players, vec![player(3)]);

        controller.apply(&player(3), LobbyAction::Leave, Utc::now()).unwrap();
        assert!(controller.state().available_players.is_empty());
    }
}
