//! Per-viewer redaction of a game state.
//!
//! The raw [`GameState`] carries every role. Before a transport sends state to
//! a particular player it can call [`PlayerView::for_viewer`] to strip what
//! that player should not know. Perception rules come from the catalog flags:
//!
//! - Merlin sees Evil, except Mordred.
//! - Evil roles that see Evil see each other, except Oberon.
//! - Percival sees Merlin and Morgana, unlabeled.
//! - At game over every role is public.

use serde::{Deserialize, Serialize};

use super::catalog::{Faction, Role, RoleCatalog, RoleInfo};
use super::player::{Player, PlayerId};
use super::state::{GamePhase, GameState, Vote};

/// What one player knows about another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Perception {
    /// Full role and faction.
    Known { role: Role, faction: Faction },
    /// Known to be Evil, role unknown.
    Evil,
    /// Either Merlin or Morgana.
    SeerCandidate,
    Unknown,
}

/// A seat as seen by the viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: PlayerId,
    pub name: String,
    pub is_leader: bool,
    pub vote_history: Vec<bool>,
    pub perception: Perception,
}

/// Public state plus the viewer's private knowledge.
///
/// Mission cards are reduced to a count while the mission is in progress:
/// who played what is never public.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub game_id: String,
    pub viewer: PlayerId,
    pub phase: GamePhase,
    pub seats: Vec<SeatView>,
    pub current_mission: usize,
    pub proposed_team: Vec<PlayerId>,
    pub mission_history: Vec<bool>,
    pub mission_cards_played: usize,
    pub consecutive_vote_failures: u32,
    pub team_votes: Vec<Vote>,
    pub winner: Faction,
}

impl PlayerView {
    /// Build the view for `viewer`. `None` if the viewer is not seated.
    #[must_use]
    pub fn for_viewer(state: &GameState, viewer: &PlayerId) -> Option<Self> {
        let me = state.player(viewer)?;
        let over = state.phase() == GamePhase::GameOver;

        let seats = state
            .players()
            .iter()
            .map(|other| SeatView {
                id: other.id().clone(),
                name: other.name().to_string(),
                is_leader: other.is_leader(),
                vote_history: other.vote_history().to_vec(),
                perception: if over || other.id() == viewer {
                    known(other)
                } else {
                    perceive(me, other)
                },
            })
            .collect();

        Some(Self {
            game_id: state.game_id().to_string(),
            viewer: viewer.clone(),
            phase: state.phase(),
            seats,
            current_mission: state.current_mission(),
            proposed_team: state.proposed_team().to_vec(),
            mission_history: state.mission_history().to_vec(),
            mission_cards_played: state.mission_votes().len(),
            consecutive_vote_failures: state.consecutive_vote_failures(),
            team_votes: state.team_votes().to_vec(),
            winner: state.winner(),
        })
    }

    /// Perception of one seat, if present.
    #[must_use]
    pub fn perception_of(&self, id: &PlayerId) -> Option<Perception> {
        self.seats.iter().find(|s| &s.id == id).map(|s| s.perception)
    }
}

fn known(player: &Player) -> Perception {
    match player.role() {
        Some(role) => Perception::Known {
            role,
            faction: player.faction(),
        },
        None => Perception::Unknown,
    }
}

fn perceive(viewer: &Player, target: &Player) -> Perception {
    let (Some(viewer_role), Some(target_role)) = (viewer.role(), target.role()) else {
        return Perception::Unknown;
    };
    let seer: &RoleInfo = RoleCatalog::info(viewer_role);
    let seen: &RoleInfo = RoleCatalog::info(target_role);

    if seen.faction == Faction::Evil && seer.sees_evil {
        let visible = match seer.faction {
            Faction::Good => !seen.hidden_from_seer,
            Faction::Evil => !seen.isolated_evil && !seer.isolated_evil,
            Faction::None => false,
        };
        if visible {
            return Perception::Evil;
        }
    }

    if seer.sees_seer_candidates && seen.seer_candidate {
        return Perception::SeerCandidate;
    }

    Perception::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten players with the full role set, seated in catalog order:
    /// Merlin, Assassin, Percival, Morgana, Mordred, Oberon, Loyal x4.
    fn table() -> GameState {
        let mut state = GameState::new("v");
        let roles = RoleCatalog::roles_for(10).unwrap();
        for (i, &role) in roles.iter().enumerate() {
            let mut player = Player::new(format!("p{}", i), format!("Player {}", i));
            player.deal(role);
            state.players.push(player);
        }
        state.players[0].set_leader(true);
        state.phase = GamePhase::TeamBuilding;
        state
    }

    fn id(i: usize) -> PlayerId {
        PlayerId::new(format!("p{}", i))
    }

    #[test]
    fn test_unknown_viewer() {
        assert!(PlayerView::for_viewer(&table(), &PlayerId::new("ghost")).is_none());
    }

    #[test]
    fn test_self_is_known() {
        let view = PlayerView::for_viewer(&table(), &id(6)).unwrap();
        assert_eq!(
            view.perception_of(&id(6)),
            Some(Perception::Known { role: Role::LoyalServant, faction: Faction::Good })
        );
    }

    #[test]
    fn test_merlin_sees_evil_except_mordred() {
        let view = PlayerView::for_viewer(&table(), &id(0)).unwrap();

        assert_eq!(view.perception_of(&id(1)), Some(Perception::Evil));
        assert_eq!(view.perception_of(&id(3)), Some(Perception::Evil));
        assert_eq!(view.perception_of(&id(4)), Some(Perception::Unknown));
        assert_eq!(view.perception_of(&id(5)), Some(Perception::Evil));
        assert_eq!(view.perception_of(&id(9)), Some(Perception::Unknown));
        assert_eq!(view.perception_of(&id(2)), Some(Perception::Unknown));
    }

    #[test]
    fn test_evil_sees_evil_except_oberon() {
        let view = PlayerView::for_viewer(&table(), &id(1)).unwrap();

        assert_eq!(view.perception_of(&id(3)), Some(Perception::Evil));
        assert_eq!(view.perception_of(&id(4)), Some(Perception::Evil));
        assert_eq!(view.perception_of(&id(5)), Some(Perception::Unknown));
        assert_eq!(view.perception_of(&id(0)), Some(Perception::Unknown));
    }

    #[test]
    fn test_oberon_sees_nobody() {
        let view = PlayerView::for_viewer(&table(), &id(5)).unwrap();
        for i in (0..10).filter(|&i| i != 5) {
            assert_eq!(view.perception_of(&id(i)), Some(Perception::Unknown));
        }
    }

    #[test]
    fn test_percival_sees_candidates() {
        let view = PlayerView::for_viewer(&table(), &id(2)).unwrap();

        assert_eq!(view.perception_of(&id(0)), Some(Perception::SeerCandidate));
        assert_eq!(view.perception_of(&id(3)), Some(Perception::SeerCandidate));
        assert_eq!(view.perception_of(&id(1)), Some(Perception::Unknown));
    }

    #[test]
    fn test_loyal_servant_sees_nothing() {
        let view = PlayerView::for_viewer(&table(), &id(7)).unwrap();
        let known = view
            .seats
            .iter()
            .filter(|s| s.perception != Perception::Unknown)
            .count();
        assert_eq!(known, 1); // only self
    }

    #[test]
    fn test_game_over_reveals_all() {
        let mut state = table();
        state.phase = GamePhase::GameOver;
        state.winner = Faction::Good;

        let view = PlayerView::for_viewer(&state, &id(7)).unwrap();
        assert!(view
            .seats
            .iter()
            .all(|s| matches!(s.perception, Perception::Known { .. })));
    }

    #[test]
    fn test_mission_cards_are_counted_not_attributed() {
        let mut state = table();
        state.phase = GamePhase::Mission;
        state.mission_votes.push(crate::core::MissionVote { player_id: id(1), success: false });

        let view = PlayerView::for_viewer(&state, &id(0)).unwrap();
        assert_eq!(view.mission_cards_played, 1);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("\"success\""));
    }
}
