//! The state machine for one game.
//!
//! ```text
//! Waiting → TeamBuilding ⇄ TeamVote → Mission → TeamBuilding (next mission)
//!                                             → Assassinate → GameOver
//!                                             → GameOver
//! ```
//!
//! Every operation validates first and mutates second, so a rejected action
//! leaves the state exactly as it was. Cascading transitions (a vote that
//! completes a round, a card that completes a mission) resolve inside the
//! same call.
//!
//! ## Boundary
//!
//! The public operations return `bool`, matching what the transport expects.
//! Each has a `try_` twin returning the [`Rejection`] for callers that want a
//! reason.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::tally::{self, MissionTrack};
use crate::core::{
    Action, Faction, GameConfig, GamePhase, GameRng, GameRngState, GameState, MissionVote, Player,
    PlayerId, PlayerView, Role, RoleCatalog, Team, Vote, MAX_CONSECUTIVE_REJECTIONS, MAX_PLAYERS,
};
use crate::error::{InvariantViolation, Rejection, SnapshotError};

/// State plus RNG position: everything needed to resume a game exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub state: GameState,
    pub rng: GameRngState,
}

impl EngineSnapshot {
    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.state.check_invariants()?;
        Ok(snapshot)
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode and validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)?;
        snapshot.state.check_invariants()?;
        Ok(snapshot)
    }
}

/// Rules engine for a single game.
///
/// Not internally synchronized: one caller at a time. The
/// [`GameRegistry`](crate::registry::GameRegistry) provides the per-game lock.
#[derive(Clone, Debug)]
pub struct RuleEngine {
    state: GameState,
    rng: GameRng,
}

impl RuleEngine {
    /// Create an empty game in the lobby.
    #[must_use]
    pub fn new(game_id: impl Into<String>, config: &GameConfig) -> Self {
        Self::with_rng(game_id, config.rng())
    }

    /// Create an empty game with the default configuration.
    #[must_use]
    pub fn create_game(game_id: impl Into<String>) -> Self {
        Self::new(game_id, &GameConfig::default())
    }

    /// Create an empty game drawing from a caller-supplied RNG.
    #[must_use]
    pub fn with_rng(game_id: impl Into<String>, rng: GameRng) -> Self {
        Self {
            state: GameState::new(game_id),
            rng,
        }
    }

    /// Rehydrate from a snapshot.
    pub fn from_snapshot(snapshot: EngineSnapshot) -> Result<Self, InvariantViolation> {
        snapshot.state.check_invariants()?;
        Ok(Self {
            state: snapshot.state,
            rng: GameRng::from_state(&snapshot.rng),
        })
    }

    /// Capture state and RNG position.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state.clone(),
            rng: self.rng.state(),
        }
    }

    /// Replace the current state with a previously saved one.
    ///
    /// The RNG is kept; use [`from_snapshot`](Self::from_snapshot) to restore
    /// it too.
    pub fn load_state(&mut self, state: GameState) -> Result<(), InvariantViolation> {
        state.check_invariants()?;
        debug!(game = %state.game_id(), phase = ?state.phase(), "state loaded");
        self.state = state;
        Ok(())
    }

    // === Inspection ===

    /// Full, unredacted state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// State as seen by one seated player.
    #[must_use]
    pub fn view_for(&self, viewer: &PlayerId) -> Option<PlayerView> {
        PlayerView::for_viewer(&self.state, viewer)
    }

    #[must_use]
    pub fn game_id(&self) -> &str {
        self.state.game_id()
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.state.phase()
    }

    #[must_use]
    pub fn winner(&self) -> Faction {
        self.state.winner()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.state.phase() == GamePhase::GameOver
    }

    #[must_use]
    pub fn leader(&self) -> Option<&PlayerId> {
        self.state.leader().map(Player::id)
    }

    /// Team size the current mission needs, once the game has a valid count.
    #[must_use]
    pub fn required_team_size(&self) -> Option<usize> {
        RoleCatalog::team_size(self.state.player_count(), self.state.current_mission())
    }

    // === Boundary operations ===

    /// Seat a player in the lobby.
    pub fn add_player(&mut self, player: Player) -> bool {
        let result = self.try_add_player(player);
        self.report("addPlayer", result)
    }

    /// Deal roles and pick the first leader.
    pub fn start_game(&mut self) -> bool {
        let result = self.try_start_game();
        self.report("startGame", result)
    }

    /// Leader proposes a team for the current mission.
    pub fn propose_team(&mut self, leader: &PlayerId, team: &[PlayerId]) -> bool {
        let result = self.try_propose_team(leader, team);
        self.report("proposeTeam", result)
    }

    /// Cast an approve/reject ballot on the proposed team.
    pub fn submit_team_vote(&mut self, player: &PlayerId, approve: bool) -> bool {
        let result = self.try_submit_team_vote(player, approve);
        self.report("submitTeamVote", result)
    }

    /// Play a mission card.
    pub fn submit_mission_vote(&mut self, player: &PlayerId, success: bool) -> bool {
        let result = self.try_submit_mission_vote(player, success);
        self.report("submitMissionVote", result)
    }

    /// Assassin names a target.
    pub fn submit_assassination(&mut self, assassin: &PlayerId, target: &PlayerId) -> bool {
        let result = self.try_submit_assassination(assassin, target);
        self.report("submitAssassination", result)
    }

    /// Dispatch a transport action on behalf of `player`.
    pub fn apply(&mut self, player: &PlayerId, action: &Action) -> bool {
        let result = self.try_apply(player, action);
        self.report(action.name(), result)
    }

    fn report(&self, op: &'static str, result: Result<(), Rejection>) -> bool {
        match result {
            Ok(()) => {
                debug_assert!(self.state.check_invariants().is_ok());
                true
            }
            Err(reason) => {
                debug!(game = %self.state.game_id(), op, %reason, "action rejected");
                false
            }
        }
    }

    // === Operations with reasons ===

    pub fn try_apply(&mut self, player: &PlayerId, action: &Action) -> Result<(), Rejection> {
        match action {
            Action::AddPlayer { name } => {
                self.try_add_player(Player::new(player.clone(), name.as_str()))
            }
            Action::StartGame => self.try_start_game(),
            Action::ProposeTeam { team } => self.try_propose_team(player, team),
            Action::SubmitTeamVote { approve } => self.try_submit_team_vote(player, *approve),
            Action::SubmitMissionVote { success } => self.try_submit_mission_vote(player, *success),
            Action::SubmitAssassination { target } => self.try_submit_assassination(player, target),
        }
    }

    pub fn try_add_player(&mut self, player: Player) -> Result<(), Rejection> {
        self.expect_phase(GamePhase::Waiting)?;
        if self.state.players.len() >= MAX_PLAYERS {
            return Err(Rejection::GameFull(MAX_PLAYERS));
        }
        if self.state.player(player.id()).is_some() {
            return Err(Rejection::DuplicatePlayer(player.id().clone()));
        }

        // Whatever the transport sent, a new seat starts undealt.
        let seat = Player::new(player.id().clone(), player.name());
        debug!(game = %self.state.game_id(), player = %seat.id(), "player joined");
        self.state.players.push(seat);
        Ok(())
    }

    pub fn try_start_game(&mut self) -> Result<(), Rejection> {
        self.expect_phase(GamePhase::Waiting)?;
        let count = self.state.players.len();
        let catalog =
            RoleCatalog::roles_for(count).ok_or(Rejection::UnsupportedPlayerCount(count))?;

        let mut roles = catalog.to_vec();
        self.rng.shuffle(&mut roles);
        for (player, role) in self.state.players.iter_mut().zip(roles) {
            player.deal(role);
        }

        let leader = self.rng.gen_index(count);
        self.state.players[leader].set_leader(true);

        let state = &mut self.state;
        state.phase = GamePhase::TeamBuilding;
        state.current_mission = 0;
        state.mission_history.clear();
        state.consecutive_vote_failures = 0;
        state.proposed_team.clear();
        state.team_votes.clear();
        state.mission_votes.clear();
        state.winner = Faction::None;

        info!(
            game = %state.game_id,
            players = count,
            leader = %state.players[leader].id(),
            "game started"
        );
        Ok(())
    }

    pub fn try_propose_team(
        &mut self,
        leader: &PlayerId,
        proposed: &[PlayerId],
    ) -> Result<(), Rejection> {
        self.expect_phase(GamePhase::TeamBuilding)?;
        let seat = self
            .state
            .player(leader)
            .ok_or_else(|| Rejection::UnknownPlayer(leader.clone()))?;
        if !seat.is_leader() {
            return Err(Rejection::NotLeader(leader.clone()));
        }

        let count = self.state.player_count();
        let required = self
            .required_team_size()
            .ok_or(Rejection::UnsupportedPlayerCount(count))?;

        // Unknown and repeated ids are dropped; the size check then catches them.
        let mut team = Team::new();
        for id in proposed {
            if self.state.player(id).is_some() && !team.contains(id) {
                team.push(id.clone());
            }
        }
        if proposed.len() != required || team.len() != required {
            return Err(Rejection::WrongTeamSize {
                required,
                resolved: team.len(),
            });
        }

        debug!(
            game = %self.state.game_id(),
            mission = self.state.current_mission,
            ?team,
            "team proposed"
        );
        self.state.proposed_team = team;
        self.state.team_votes.clear();
        self.state.phase = GamePhase::TeamVote;
        Ok(())
    }

    pub fn try_submit_team_vote(
        &mut self,
        player: &PlayerId,
        approve: bool,
    ) -> Result<(), Rejection> {
        self.expect_phase(GamePhase::TeamVote)?;
        if self.state.has_team_voted(player) {
            return Err(Rejection::AlreadyVoted(player.clone()));
        }
        let seat = self
            .state
            .player_mut(player)
            .ok_or_else(|| Rejection::UnknownPlayer(player.clone()))?;

        seat.record_vote(approve);
        self.state.team_votes.push(Vote {
            player_id: player.clone(),
            approve,
        });

        if self.state.team_votes.len() == self.state.player_count() {
            self.resolve_team_vote();
        }
        Ok(())
    }

    pub fn try_submit_mission_vote(
        &mut self,
        player: &PlayerId,
        success: bool,
    ) -> Result<(), Rejection> {
        self.expect_phase(GamePhase::Mission)?;
        let seat = self
            .state
            .player(player)
            .ok_or_else(|| Rejection::UnknownPlayer(player.clone()))?;
        if !self.state.is_on_team(player) {
            return Err(Rejection::NotOnTeam(player.clone()));
        }
        if self.state.has_mission_voted(player) {
            return Err(Rejection::AlreadyVoted(player.clone()));
        }
        if seat.faction() == Faction::Good && !success {
            return Err(Rejection::GoodCannotFail(player.clone()));
        }

        self.state.mission_votes.push(MissionVote {
            player_id: player.clone(),
            success,
        });

        if self.state.mission_votes.len() == self.state.proposed_team.len() {
            self.resolve_mission();
        }
        Ok(())
    }

    pub fn try_submit_assassination(
        &mut self,
        assassin: &PlayerId,
        target: &PlayerId,
    ) -> Result<(), Rejection> {
        self.expect_phase(GamePhase::Assassinate)?;
        let shooter = self
            .state
            .player(assassin)
            .ok_or_else(|| Rejection::UnknownPlayer(assassin.clone()))?;
        if shooter.role() != Some(Role::Assassin) {
            return Err(Rejection::NotAssassin(assassin.clone()));
        }
        let victim = self
            .state
            .player(target)
            .ok_or_else(|| Rejection::UnknownPlayer(target.clone()))?;

        let winner = if victim.role() == Some(Role::Merlin) {
            Faction::Evil
        } else {
            Faction::Good
        };
        debug!(game = %self.state.game_id(), %target, ?winner, "assassination resolved");
        self.end_game(winner);
        Ok(())
    }

    // === Resolution ===

    fn resolve_team_vote(&mut self) {
        let approvals = self.state.team_votes.iter().filter(|v| v.approve).count();

        if tally::team_approved(approvals, self.state.player_count()) {
            self.state.consecutive_vote_failures = 0;
            self.state.mission_votes.clear();
            self.state.phase = GamePhase::Mission;
            debug!(game = %self.state.game_id(), approvals, "team approved");
            return;
        }

        self.state.consecutive_vote_failures += 1;
        debug!(
            game = %self.state.game_id(),
            approvals,
            rejections = self.state.consecutive_vote_failures,
            "team rejected"
        );
        if self.state.consecutive_vote_failures >= MAX_CONSECUTIVE_REJECTIONS {
            self.end_game(Faction::Evil);
            return;
        }

        self.rotate_leader();
        self.state.proposed_team.clear();
        self.state.phase = GamePhase::TeamBuilding;
    }

    fn resolve_mission(&mut self) {
        let fails = self.state.mission_votes.iter().filter(|v| !v.success).count();
        let mission = self.state.current_mission;
        let failed = tally::mission_failed(fails, mission, self.state.player_count());
        self.state.mission_history.push(!failed);
        debug!(game = %self.state.game_id(), mission, fails, success = !failed, "mission resolved");

        match tally::evaluate_track(&self.state.mission_history) {
            MissionTrack::GoodCompleted => {
                self.state.phase = GamePhase::Assassinate;
            }
            MissionTrack::Decided(winner) => self.end_game(winner),
            MissionTrack::Continue => {
                self.state.current_mission += 1;
                self.rotate_leader();
                self.state.proposed_team.clear();
                self.state.phase = GamePhase::TeamBuilding;
            }
        }
    }

    fn end_game(&mut self, winner: Faction) {
        self.state.phase = GamePhase::GameOver;
        self.state.winner = winner;
        for player in &mut self.state.players {
            player.reveal();
        }
        info!(game = %self.state.game_id(), ?winner, "game over");
    }

    /// Pass leadership to the next seat, wrapping.
    fn rotate_leader(&mut self) {
        let Some(current) = self.state.leader_index() else {
            return;
        };
        let next = (current + 1) % self.state.players.len();
        self.state.players[current].set_leader(false);
        self.state.players[next].set_leader(true);
    }

    fn expect_phase(&self, phase: GamePhase) -> Result<(), Rejection> {
        if self.state.phase == phase {
            Ok(())
        } else {
            Err(Rejection::WrongPhase(self.state.phase))
        }
    }
}
