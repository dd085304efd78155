//! Vote and mission arithmetic.
//!
//! Pure functions over counts, kept apart from the state machine so the
//! boundary cases can be tested directly.

use crate::core::catalog::{Faction, RoleCatalog, MISSIONS_TO_WIN};

/// A proposal passes on a strict majority of all seated players.
///
/// Ties reject: with 6 players, 3 approvals is not enough.
#[must_use]
pub fn team_approved(approvals: usize, player_count: usize) -> bool {
    approvals * 2 > player_count
}

/// Whether a finished mission failed given its sabotage count.
#[must_use]
pub fn mission_failed(fails: usize, mission: usize, player_count: usize) -> bool {
    fails >= RoleCatalog::fails_required(player_count, mission)
}

/// Where the mission track stands after a result is recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissionTrack {
    /// Play the next mission.
    Continue,
    /// Good reached three successes; Evil gets the assassination.
    GoodCompleted,
    /// Three failures; the game is decided.
    Decided(Faction),
}

/// Evaluate the track. Successes are checked first.
#[must_use]
pub fn evaluate_track(history: &[bool]) -> MissionTrack {
    let successes = history.iter().filter(|&&ok| ok).count();
    let failures = history.len() - successes;

    if successes >= MISSIONS_TO_WIN {
        MissionTrack::GoodCompleted
    } else if failures >= MISSIONS_TO_WIN {
        MissionTrack::Decided(Faction::Evil)
    } else {
        MissionTrack::Continue
    }
}
