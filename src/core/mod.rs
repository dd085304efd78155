//! Core types: catalog, players, state, actions, RNG, configuration.
//!
//! Everything here is data. The state machine that mutates it lives in
//! [`rules`](crate::rules).

pub mod catalog;
pub mod player;
pub mod rng;
pub mod config;
pub mod action;
pub mod state;
pub mod view;

pub use catalog::{
    Faction, Role, RoleCatalog, RoleInfo, MAX_CONSECUTIVE_REJECTIONS, MAX_PLAYERS, MIN_PLAYERS,
    MISSIONS_TO_WIN, MISSION_COUNT,
};
pub use player::{Player, PlayerId};
pub use rng::{GameRng, GameRngState};
pub use config::{GameConfig, RegistryConfig};
pub use action::{Action, ActionRecord};
pub use state::{GamePhase, GameState, MissionVote, Team, Vote};
pub use view::{Perception, PlayerView, SeatView};
