//! Error types.
//!
//! Rule violations are not errors in the usual sense: a stale duplicate click
//! or an out-of-turn vote is routine. The engine reports them as `false` at
//! its public boundary and only exposes the structured [`Rejection`] through
//! the `try_*` operations for callers that want a reason.

use thiserror::Error;

use crate::core::{GamePhase, PlayerId};

/// Why an action was refused. State is untouched whenever one of these is
/// produced.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("action not legal in phase {0:?}")]
    WrongPhase(GamePhase),

    #[error("game already holds the maximum of {0} players")]
    GameFull(usize),

    #[error("player {0} already joined")]
    DuplicatePlayer(PlayerId),

    #[error("no role catalog entry for {0} players")]
    UnsupportedPlayerCount(usize),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("player {0} is not the current leader")]
    NotLeader(PlayerId),

    #[error("team needs {required} members, {resolved} resolved")]
    WrongTeamSize { required: usize, resolved: usize },

    #[error("player {0} already voted this round")]
    AlreadyVoted(PlayerId),

    #[error("player {0} is not on the mission team")]
    NotOnTeam(PlayerId),

    #[error("good-aligned player {0} cannot sabotage a mission")]
    GoodCannotFail(PlayerId),

    #[error("player {0} does not hold the assassin role")]
    NotAssassin(PlayerId),
}

/// A snapshot that decodes fine but describes an impossible game.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{0} players outside the supported range after the lobby")]
    PlayerCount(usize),

    #[error("expected exactly one leader, found {0}")]
    LeaderCount(usize),

    #[error("mission history holds {0} entries")]
    HistoryLength(usize),

    #[error("game continues after {successes} successes and {failures} failures")]
    MissedTermination { successes: usize, failures: usize },

    #[error("player {0} has a role and faction that disagree")]
    RoleFaction(PlayerId),

    #[error("dealt roles do not match the catalog for {0} players")]
    RoleMultiset(usize),

    #[error("winner set while phase is {0:?}")]
    WinnerMismatch(GamePhase),

    #[error("duplicate player id {0}")]
    DuplicateId(PlayerId),

    #[error("mission index {mission} does not follow {completed} completed missions")]
    MissionIndex { mission: usize, completed: usize },

    #[error("{0} consecutive rejections without the game ending")]
    RejectionLimit(u32),

    #[error("proposed team is not a valid team for phase {0:?}")]
    InvalidTeam(GamePhase),

    #[error("ballot from {0} is unseated, repeated or not allowed")]
    StrayBallot(PlayerId),

    #[error("a complete round was left unresolved in phase {0:?}")]
    UnresolvedRound(GamePhase),

    #[error("player {0} has a reveal flag that disagrees with the phase")]
    RevealMismatch(PlayerId),
}

/// Encoding or decoding a state snapshot failed.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary encoding error: {0}")]
    Binary(#[from] bincode::Error),

    #[error("snapshot rejected: {0}")]
    Invalid(#[from] InvariantViolation),
}

/// Persistence collaborator failures. Always non-fatal to gameplay.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("game id {0:?} cannot be used as a storage key")]
    InvalidKey(String),
}
