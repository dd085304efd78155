//! The rules engine.
//!
//! - `engine`: the state machine (`RuleEngine`) and its snapshot type
//! - `tally`: majority, mission-failure and win arithmetic

pub mod engine;
pub mod tally;

pub use engine::{EngineSnapshot, RuleEngine};
pub use tally::{evaluate_track, mission_failed, team_approved, MissionTrack};
