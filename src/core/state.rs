//! Game state: the single source of truth for one game.
//!
//! ## GameState
//!
//! A flat, serializable aggregate:
//! - Phase, mission index, mission history
//! - Ordered seats (order drives leader rotation)
//! - The proposed team and the votes of the round in progress
//! - Rejection counter and winner
//!
//! Only [`RuleEngine`](crate::rules::RuleEngine) mutates it. Everything else
//! reads it through the getters or a snapshot.
//!
//! ## Snapshots
//!
//! JSON (`to_json`/`from_json`) for storage that humans may inspect, bincode
//! (`to_bytes`/`from_bytes`) for compact storage. Decoding validates the
//! structural invariants before handing the state back.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::catalog::{
    Faction, Role, RoleCatalog, MAX_CONSECUTIVE_REJECTIONS, MAX_PLAYERS, MISSIONS_TO_WIN,
    MISSION_COUNT,
};
use super::player::{Player, PlayerId};
use crate::error::{InvariantViolation, SnapshotError};

/// Current step of the game. Gates which operations are legal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    /// Lobby: players join.
    #[default]
    Waiting,
    /// Leader picks a team.
    TeamBuilding,
    /// Everyone approves or rejects the proposed team.
    TeamVote,
    /// Team members submit success/fail.
    Mission,
    /// Good completed three missions; the assassin takes a shot.
    Assassinate,
    /// Terminal.
    GameOver,
}

/// One team-vote ballot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub player_id: PlayerId,
    pub approve: bool,
}

/// One mission card played by a team member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionVote {
    pub player_id: PlayerId,
    pub success: bool,
}

/// Team of at most five; stays inline.
pub type Team = SmallVec<[PlayerId; 5]>;

/// Full game state.
///
/// All fields are visible to the caller; per-viewer redaction is done by
/// [`PlayerView`](super::view::PlayerView).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub(crate) game_id: String,
    pub(crate) phase: GamePhase,
    pub(crate) players: Vec<Player>,
    pub(crate) current_mission: usize,
    pub(crate) proposed_team: Team,
    pub(crate) mission_history: SmallVec<[bool; MISSION_COUNT]>,
    pub(crate) mission_votes: SmallVec<[MissionVote; 5]>,
    pub(crate) consecutive_vote_failures: u32,
    pub(crate) team_votes: Vec<Vote>,
    pub(crate) winner: Faction,
}

impl GameState {
    /// Create an empty game in the lobby.
    #[must_use]
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            phase: GamePhase::Waiting,
            players: Vec::new(),
            current_mission: 0,
            proposed_team: SmallVec::new(),
            mission_history: SmallVec::new(),
            mission_votes: SmallVec::new(),
            consecutive_vote_failures: 0,
            team_votes: Vec::new(),
            winner: Faction::None,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Seats in order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// 0-based mission index.
    #[must_use]
    pub fn current_mission(&self) -> usize {
        self.current_mission
    }

    #[must_use]
    pub fn proposed_team(&self) -> &[PlayerId] {
        &self.proposed_team
    }

    /// Outcomes of completed missions, `true` = success.
    #[must_use]
    pub fn mission_history(&self) -> &[bool] {
        &self.mission_history
    }

    /// Cards played so far on the mission in progress.
    #[must_use]
    pub fn mission_votes(&self) -> &[MissionVote] {
        &self.mission_votes
    }

    #[must_use]
    pub fn consecutive_vote_failures(&self) -> u32 {
        self.consecutive_vote_failures
    }

    /// Ballots of the team vote in progress.
    #[must_use]
    pub fn team_votes(&self) -> &[Vote] {
        &self.team_votes
    }

    /// `Faction::None` until the game is over.
    #[must_use]
    pub fn winner(&self) -> Faction {
        self.winner
    }

    // === Lookup ===

    /// Seat index of a player.
    #[must_use]
    pub fn player_index(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id() == id)
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub(crate) fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id() == id)
    }

    #[must_use]
    pub fn leader_index(&self) -> Option<usize> {
        self.players.iter().position(Player::is_leader)
    }

    #[must_use]
    pub fn leader(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_leader())
    }

    /// Player holding a role, if dealt.
    #[must_use]
    pub fn holder_of(&self, role: Role) -> Option<&Player> {
        self.players.iter().find(|p| p.role() == Some(role))
    }

    #[must_use]
    pub fn is_on_team(&self, id: &PlayerId) -> bool {
        self.proposed_team.contains(id)
    }

    #[must_use]
    pub fn has_team_voted(&self, id: &PlayerId) -> bool {
        self.team_votes.iter().any(|v| &v.player_id == id)
    }

    #[must_use]
    pub fn has_mission_voted(&self, id: &PlayerId) -> bool {
        self.mission_votes.iter().any(|v| &v.player_id == id)
    }

    /// Completed missions that succeeded.
    #[must_use]
    pub fn successes(&self) -> usize {
        self.mission_history.iter().filter(|&&ok| ok).count()
    }

    /// Completed missions that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.mission_history.iter().filter(|&&ok| !ok).count()
    }

    // === Invariants ===

    /// Check every structural invariant.
    ///
    /// Holds after every successful engine operation; used to vet snapshots
    /// before they are loaded.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut seen = FxHashSet::default();
        for player in &self.players {
            if !seen.insert(player.id()) {
                return Err(InvariantViolation::DuplicateId(player.id().clone()));
            }
            if !player.is_consistent() {
                return Err(InvariantViolation::RoleFaction(player.id().clone()));
            }
        }

        let count = self.players.len();
        if self.phase == GamePhase::Waiting {
            if count > MAX_PLAYERS {
                return Err(InvariantViolation::PlayerCount(count));
            }
            if let Some(p) = self.players.iter().find(|p| p.role().is_some()) {
                return Err(InvariantViolation::RoleFaction(p.id().clone()));
            }
        } else {
            let catalog =
                RoleCatalog::roles_for(count).ok_or(InvariantViolation::PlayerCount(count))?;

            let leaders = self.players.iter().filter(|p| p.is_leader()).count();
            if leaders != 1 {
                return Err(InvariantViolation::LeaderCount(leaders));
            }

            let mut dealt: Vec<Role> = Vec::with_capacity(count);
            for player in &self.players {
                match player.role() {
                    Some(role) => dealt.push(role),
                    None => return Err(InvariantViolation::RoleFaction(player.id().clone())),
                }
            }
            let mut expected = catalog.to_vec();
            dealt.sort();
            expected.sort();
            if dealt != expected {
                return Err(InvariantViolation::RoleMultiset(count));
            }
        }

        if self.mission_history.len() > MISSION_COUNT {
            return Err(InvariantViolation::HistoryLength(self.mission_history.len()));
        }

        let (successes, failures) = (self.successes(), self.failures());
        let decided = match self.phase {
            GamePhase::GameOver => true,
            GamePhase::Assassinate => failures < MISSIONS_TO_WIN,
            _ => false,
        };
        if (successes >= MISSIONS_TO_WIN || failures >= MISSIONS_TO_WIN) && !decided {
            return Err(InvariantViolation::MissedTermination { successes, failures });
        }

        let over = self.phase == GamePhase::GameOver;
        if over == (self.winner == Faction::None) {
            return Err(InvariantViolation::WinnerMismatch(self.phase));
        }
        if let Some(p) = self.players.iter().find(|p| p.is_revealed() != over) {
            return Err(InvariantViolation::RevealMismatch(p.id().clone()));
        }

        self.check_round()
    }

    /// Mission index, rejection counter, and the team and ballots of the
    /// round in progress.
    fn check_round(&self) -> Result<(), InvariantViolation> {
        let completed = self.mission_history.len();
        let playing = matches!(
            self.phase,
            GamePhase::TeamBuilding | GamePhase::TeamVote | GamePhase::Mission
        );
        if self.current_mission >= MISSION_COUNT || (playing && completed != self.current_mission) {
            return Err(InvariantViolation::MissionIndex {
                mission: self.current_mission,
                completed,
            });
        }

        if self.phase != GamePhase::GameOver
            && self.consecutive_vote_failures >= MAX_CONSECUTIVE_REJECTIONS
        {
            return Err(InvariantViolation::RejectionLimit(self.consecutive_vote_failures));
        }

        if matches!(self.phase, GamePhase::TeamVote | GamePhase::Mission) {
            let required = RoleCatalog::team_size(self.players.len(), self.current_mission);
            let mut members = FxHashSet::default();
            let resolved = self
                .proposed_team
                .iter()
                .all(|id| self.player(id).is_some() && members.insert(id));
            if !resolved || required != Some(self.proposed_team.len()) {
                return Err(InvariantViolation::InvalidTeam(self.phase));
            }
        }

        let mut voters = FxHashSet::default();
        for vote in &self.team_votes {
            if self.player(&vote.player_id).is_none() || !voters.insert(&vote.player_id) {
                return Err(InvariantViolation::StrayBallot(vote.player_id.clone()));
            }
        }
        // A full round resolves within the vote that completes it.
        if self.phase == GamePhase::TeamVote && self.team_votes.len() >= self.players.len() {
            return Err(InvariantViolation::UnresolvedRound(self.phase));
        }

        let in_mission = self.phase == GamePhase::Mission;
        let mut played = FxHashSet::default();
        for card in &self.mission_votes {
            let stray = || InvariantViolation::StrayBallot(card.player_id.clone());
            let player = self.player(&card.player_id).ok_or_else(stray)?;
            if !played.insert(&card.player_id) {
                return Err(stray());
            }
            if in_mission
                && (!self.is_on_team(&card.player_id)
                    || (!card.success && player.faction() == Faction::Good))
            {
                return Err(stray());
            }
        }
        if in_mission && self.mission_votes.len() >= self.proposed_team.len() {
            return Err(InvariantViolation::UnresolvedRound(self.phase));
        }

        Ok(())
    }

    // === Snapshots ===

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let state: Self = serde_json::from_str(json)?;
        state.check_invariants()?;
        Ok(state)
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode and validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let state: Self = bincode::deserialize(bytes)?;
        state.check_invariants()?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby(count: usize) -> GameState {
        let mut state = GameState::new("g1");
        for i in 0..count {
            state.players.push(Player::new(format!("p{}", i), format!("Player {}", i)));
        }
        state
    }

    fn dealt(count: usize) -> GameState {
        let mut state = lobby(count);
        let roles = RoleCatalog::roles_for(count).unwrap();
        for (player, &role) in state.players.iter_mut().zip(roles) {
            player.deal(role);
        }
        state.players[0].set_leader(true);
        state.phase = GamePhase::TeamBuilding;
        state
    }

    #[test]
    fn test_new_state() {
        let state = GameState::new("room-7");

        assert_eq!(state.game_id(), "room-7");
        assert_eq!(state.phase(), GamePhase::Waiting);
        assert_eq!(state.player_count(), 0);
        assert_eq!(state.winner(), Faction::None);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_lookup() {
        let state = dealt(5);
        let p2 = PlayerId::new("p2");

        assert_eq!(state.player_index(&p2), Some(2));
        assert_eq!(state.player(&p2).unwrap().name(), "Player 2");
        assert!(state.player(&PlayerId::new("nobody")).is_none());
        assert_eq!(state.leader_index(), Some(0));
        assert_eq!(state.holder_of(Role::Merlin).unwrap().id(), &PlayerId::new("p0"));
    }

    #[test]
    fn test_mission_counts() {
        let mut state = dealt(5);
        state.mission_history.extend([true, false, true]);

        assert_eq!(state.successes(), 2);
        assert_eq!(state.failures(), 1);
    }

    #[test]
    fn test_invariants_hold_for_fresh_deal() {
        for count in 5..=10 {
            assert!(dealt(count).check_invariants().is_ok());
        }
    }

    #[test]
    fn test_invariant_leader_count() {
        let mut state = dealt(5);
        state.players[1].set_leader(true);
        assert_eq!(state.check_invariants(), Err(InvariantViolation::LeaderCount(2)));

        state.players[0].set_leader(false);
        state.players[1].set_leader(false);
        assert_eq!(state.check_invariants(), Err(InvariantViolation::LeaderCount(0)));
    }

    #[test]
    fn test_invariant_player_count() {
        let mut state = lobby(4);
        state.phase = GamePhase::TeamBuilding;
        assert_eq!(state.check_invariants(), Err(InvariantViolation::PlayerCount(4)));
    }

    #[test]
    fn test_invariant_role_multiset() {
        let mut state = dealt(5);
        state.players[1].deal(Role::Merlin);
        assert_eq!(state.check_invariants(), Err(InvariantViolation::RoleMultiset(5)));
    }

    #[test]
    fn test_invariant_missed_termination() {
        let mut state = dealt(5);
        state.mission_history.extend([false, false, false]);
        assert!(matches!(
            state.check_invariants(),
            Err(InvariantViolation::MissedTermination { failures: 3, .. })
        ));

        state.phase = GamePhase::GameOver;
        state.winner = Faction::Evil;
        assert!(matches!(state.check_invariants(), Err(InvariantViolation::RevealMismatch(_))));

        for player in &mut state.players {
            player.reveal();
        }
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_invariant_winner_only_when_over() {
        let mut state = dealt(5);
        state.winner = Faction::Good;
        assert_eq!(
            state.check_invariants(),
            Err(InvariantViolation::WinnerMismatch(GamePhase::TeamBuilding))
        );
    }

    #[test]
    fn test_invariant_duplicate_ids() {
        let mut state = lobby(2);
        state.players.push(Player::new("p0", "Again"));
        assert_eq!(
            state.check_invariants(),
            Err(InvariantViolation::DuplicateId(PlayerId::new("p0")))
        );
    }

    #[test]
    fn test_phase_wire_names() {
        let json = serde_json::to_string(&GamePhase::TeamBuilding).unwrap();
        assert_eq!(json, "\"TEAM_BUILDING\"");
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let mut state = dealt(7);
        state.phase = GamePhase::TeamVote;
        state.proposed_team.extend([PlayerId::new("p3"), PlayerId::new("p1"), PlayerId::new("p5")]);
        state.mission_history.extend([true, false]);
        state.current_mission = 2;
        state.team_votes.push(Vote { player_id: PlayerId::new("p6"), approve: false });
        state.team_votes.push(Vote { player_id: PlayerId::new("p2"), approve: true });
        state.consecutive_vote_failures = 2;

        let json = state.to_json().unwrap();
        let back = GameState::from_json(&json).unwrap();

        assert_eq!(back, state);
        assert_eq!(back.proposed_team()[..2], [PlayerId::new("p3"), PlayerId::new("p1")]);
    }

    #[test]
    fn test_bytes_round_trip() {
        let state = dealt(10);
        let bytes = state.to_bytes().unwrap();
        assert_eq!(GameState::from_bytes(&bytes).unwrap(), state);
    }

    #[test]
    fn test_from_json_rejects_broken_state() {
        let mut state = dealt(5);
        state.players[2].set_leader(true);
        let json = serde_json::to_string(&state).unwrap();

        assert!(matches!(
            GameState::from_json(&json),
            Err(SnapshotError::Invalid(InvariantViolation::LeaderCount(2)))
        ));
    }

    /// Mission phase with a full, valid team and no cards yet.
    fn on_mission() -> GameState {
        let mut state = dealt(5);
        state.phase = GamePhase::Mission;
        state.proposed_team.extend([PlayerId::new("p0"), PlayerId::new("p2")]);
        state
    }

    #[test]
    fn test_invariant_mission_index() {
        let mut state = dealt(5);
        state.current_mission = 42;
        assert!(matches!(
            state.check_invariants(),
            Err(InvariantViolation::MissionIndex { mission: 42, .. })
        ));

        let mut state = dealt(5);
        state.mission_history.push(true);
        assert_eq!(
            state.check_invariants(),
            Err(InvariantViolation::MissionIndex { mission: 0, completed: 1 })
        );
    }

    #[test]
    fn test_invariant_rejection_limit() {
        let mut state = dealt(5);
        state.consecutive_vote_failures = MAX_CONSECUTIVE_REJECTIONS;
        assert_eq!(state.check_invariants(), Err(InvariantViolation::RejectionLimit(5)));
    }

    #[test]
    fn test_invariant_team_must_resolve() {
        let bad_team = InvariantViolation::InvalidTeam(GamePhase::Mission);
        assert!(on_mission().check_invariants().is_ok());

        let mut ghosts = on_mission();
        ghosts.proposed_team =
            [PlayerId::new("ghost1"), PlayerId::new("ghost2")].into_iter().collect();
        assert_eq!(ghosts.check_invariants(), Err(bad_team.clone()));

        let mut repeated = on_mission();
        repeated.proposed_team[1] = PlayerId::new("p0");
        assert_eq!(repeated.check_invariants(), Err(bad_team.clone()));

        let mut short = on_mission();
        short.proposed_team.pop();
        assert_eq!(short.check_invariants(), Err(bad_team));
    }

    #[test]
    fn test_invariant_ballots() {
        let mut state = dealt(5);
        state.phase = GamePhase::TeamVote;
        state.proposed_team.extend([PlayerId::new("p0"), PlayerId::new("p1")]);
        state.team_votes.push(Vote { player_id: PlayerId::new("p3"), approve: true });
        assert!(state.check_invariants().is_ok());

        state.team_votes.push(Vote { player_id: PlayerId::new("p3"), approve: false });
        assert_eq!(
            state.check_invariants(),
            Err(InvariantViolation::StrayBallot(PlayerId::new("p3")))
        );

        state.team_votes.clear();
        for i in 0..5 {
            let player_id = PlayerId::new(format!("p{}", i));
            state.team_votes.push(Vote { player_id, approve: true });
        }
        assert_eq!(
            state.check_invariants(),
            Err(InvariantViolation::UnresolvedRound(GamePhase::TeamVote))
        );
    }

    #[test]
    fn test_invariant_mission_cards() {
        // p0 is Merlin in catalog order, p1 the Assassin
        let mut outsider = on_mission();
        outsider.mission_votes.push(MissionVote { player_id: PlayerId::new("p1"), success: false });
        assert_eq!(
            outsider.check_invariants(),
            Err(InvariantViolation::StrayBallot(PlayerId::new("p1")))
        );

        let mut good_fail = on_mission();
        let merlin = PlayerId::new("p0");
        good_fail.mission_votes.push(MissionVote { player_id: merlin, success: false });
        assert_eq!(
            good_fail.check_invariants(),
            Err(InvariantViolation::StrayBallot(PlayerId::new("p0")))
        );

        let mut full = on_mission();
        for id in ["p0", "p2"] {
            full.mission_votes.push(MissionVote { player_id: PlayerId::new(id), success: true });
        }
        assert_eq!(
            full.check_invariants(),
            Err(InvariantViolation::UnresolvedRound(GamePhase::Mission))
        );
    }

    #[test]
    fn test_invariant_reveal_only_when_over() {
        let mut state = dealt(5);
        state.players[3].reveal();
        assert_eq!(
            state.check_invariants(),
            Err(InvariantViolation::RevealMismatch(PlayerId::new("p3")))
        );
    }

    #[test]
    fn test_from_json_rejects_edited_round() {
        let mut value = serde_json::to_value(dealt(5)).unwrap();
        value["phase"] = serde_json::json!("MISSION");
        value["proposedTeam"] = serde_json::json!(["ghost1", "ghost2"]);
        value["consecutiveVoteFailures"] = serde_json::json!(9);
        value["currentMission"] = serde_json::json!(42);

        let json = serde_json::to_string(&value).unwrap();
        assert!(matches!(GameState::from_json(&json), Err(SnapshotError::Invalid(_))));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(GameState::from_json("{not json"), Err(SnapshotError::Json(_))));
    }
}
