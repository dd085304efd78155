//! Player identity and per-player game data.
//!
//! ## PlayerId
//!
//! Opaque identifier chosen by the transport. The engine only compares ids;
//! it never parses them.
//!
//! ## Player
//!
//! Seat in a game: display name, dealt role, leader/reveal flags and the
//! append-only record of team votes.

use serde::{Deserialize, Serialize};

use super::catalog::{Faction, Role, RoleCatalog};

/// Stable player identifier, unique within one game.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A seat in a game.
///
/// Role and faction are dealt together exactly once, by the engine at start.
/// Outside the crate they are read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    id: PlayerId,
    name: String,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    faction: Faction,
    #[serde(default)]
    is_leader: bool,
    #[serde(default)]
    revealed: bool,
    #[serde(default)]
    vote_history: Vec<bool>,
}

impl Player {
    /// Create an undealt player.
    #[must_use]
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: None,
            faction: Faction::None,
            is_leader: false,
            revealed: false,
            vote_history: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dealt role, `None` before the game starts.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Faction derived from the role, `Faction::None` before the deal.
    #[must_use]
    pub fn faction(&self) -> Faction {
        self.faction
    }

    #[must_use]
    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Every team vote this player cast, oldest first.
    #[must_use]
    pub fn vote_history(&self) -> &[bool] {
        &self.vote_history
    }

    /// Role and faction agree with the catalog (or are both unset).
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match self.role {
            Some(role) => self.faction == RoleCatalog::faction(role),
            None => self.faction == Faction::None,
        }
    }

    pub(crate) fn deal(&mut self, role: Role) {
        self.role = Some(role);
        self.faction = RoleCatalog::faction(role);
        self.vote_history.clear();
        self.revealed = false;
        self.is_leader = false;
    }

    pub(crate) fn set_leader(&mut self, leader: bool) {
        self.is_leader = leader;
    }

    pub(crate) fn reveal(&mut self) {
        self.revealed = true;
    }

    pub(crate) fn record_vote(&mut self, approve: bool) {
        self.vote_history.push(approve);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_basics() {
        let id = PlayerId::new("alice");
        assert_eq!(id.as_str(), "alice");
        assert_eq!(format!("{}", id), "alice");
        assert_eq!(PlayerId::from("alice"), id);
    }

    #[test]
    fn test_new_player_is_undealt() {
        let player = Player::new("p1", "Alice");

        assert_eq!(player.id(), &PlayerId::new("p1"));
        assert_eq!(player.name(), "Alice");
        assert_eq!(player.role(), None);
        assert_eq!(player.faction(), Faction::None);
        assert!(!player.is_leader());
        assert!(!player.is_revealed());
        assert!(player.vote_history().is_empty());
        assert!(player.is_consistent());
    }

    #[test]
    fn test_deal_sets_role_and_faction_together() {
        let mut player = Player::new("p1", "Alice");
        player.record_vote(true);
        player.deal(Role::Morgana);

        assert_eq!(player.role(), Some(Role::Morgana));
        assert_eq!(player.faction(), Faction::Evil);
        assert!(player.vote_history().is_empty());
        assert!(player.is_consistent());
    }

    #[test]
    fn test_vote_history_appends() {
        let mut player = Player::new("p1", "Alice");
        player.record_vote(true);
        player.record_vote(false);
        player.record_vote(true);

        assert_eq!(player.vote_history(), &[true, false, true]);
    }

    #[test]
    fn test_player_serialization() {
        let mut player = Player::new("p1", "Alice");
        player.deal(Role::Merlin);
        player.set_leader(true);

        let json = serde_json::to_string(&player).unwrap();
        assert!(json.contains("\"isLeader\":true"));
        assert!(json.contains("\"voteHistory\":[]"));

        let back: Player = serde_json::from_str(&json).unwrap();
        assert_eq!(back, player);
    }

    #[test]
    fn test_lobby_player_deserializes_with_defaults() {
        let back: Player = serde_json::from_str(r#"{"id":"p9","name":"Zed"}"#).unwrap();
        assert_eq!(back, Player::new("p9", "Zed"));
    }
}
