//! Player actions as delivered by the transport.
//!
//! The transport hands over `(gameId, playerId, actionName, payload)`
//! tuples. [`ActionRecord`] is that tuple; [`Action`] is the
//! `(actionName, payload)` half, mapping 1:1 onto a
//! [`RuleEngine`](crate::rules::RuleEngine) operation.
//!
//! ## Example
//!
//! ```
//! use avalon_rules::core::{Action, PlayerId};
//!
//! let json = r#"{"action":"submitTeamVote","payload":{"approve":true}}"#;
//! let action: Action = serde_json::from_str(json).unwrap();
//! assert_eq!(action, Action::SubmitTeamVote { approve: true });
//! ```

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// One engine operation plus its payload.
///
/// The acting player travels alongside (see [`ActionRecord`]), so payloads
/// only carry the other arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "camelCase")]
pub enum Action {
    /// Join the lobby under the acting player's id.
    AddPlayer { name: String },
    StartGame,
    /// Acting player is the would-be leader.
    ProposeTeam { team: Vec<PlayerId> },
    SubmitTeamVote { approve: bool },
    SubmitMissionVote { success: bool },
    /// Acting player is the would-be assassin.
    SubmitAssassination { target: PlayerId },
}

impl Action {
    /// Wire name of the operation.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddPlayer { .. } => "addPlayer",
            Action::StartGame => "startGame",
            Action::ProposeTeam { .. } => "proposeTeam",
            Action::SubmitTeamVote { .. } => "submitTeamVote",
            Action::SubmitMissionVote { .. } => "submitMissionVote",
            Action::SubmitAssassination { .. } => "submitAssassination",
        }
    }
}

/// A routed action: which game, which player, what they did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub game_id: String,
    pub player: PlayerId,
    #[serde(flatten)]
    pub action: Action,
}

impl ActionRecord {
    /// Create a new action record.
    #[must_use]
    pub fn new(game_id: impl Into<String>, player: impl Into<PlayerId>, action: Action) -> Self {
        Self {
            game_id: game_id.into(),
            player: player.into(),
            action,
        }
    }
}
