//! # avalon-rules
//!
//! Authoritative rules engine for a hidden-role mission game for 5-10
//! players split into Good and Evil.
//!
//! Good wins by completing three missions and then surviving the
//! assassination. Evil wins by failing three missions, by forcing five
//! rejected team proposals in a row, or by having the assassin name Merlin.
//!
//! ## Design Principles
//!
//! 1. **No I/O in the engine**: every operation validates, mutates and
//!    resolves cascading transitions in one call. Broadcasting and saving
//!    happen afterwards, in the caller.
//!
//! 2. **Rejections are routine**: invalid actions leave state untouched and
//!    return `false`. The `try_*` twins report the reason.
//!
//! 3. **Configuration is data**: roles, factions, visibility and mission
//!    sizes are static tables in [`core::catalog`].
//!
//! 4. **Injected randomness**: each engine owns a seedable [`GameRng`], so
//!    deals and first leaders are reproducible.
//!
//! ## Modules
//!
//! - `core`: catalog, players, state, actions, RNG, configuration, views
//! - `rules`: the `RuleEngine` state machine and vote/mission arithmetic
//! - `registry`: live games by id with a per-game lock
//! - `store`: snapshot persistence backends
//! - `error`: rejection, snapshot and store errors
//!
//! ## Example
//!
//! ```
//! use avalon_rules::{GamePhase, Player, RuleEngine};
//!
//! let mut engine = RuleEngine::create_game("room-1");
//! for i in 0..5 {
//!     assert!(engine.add_player(Player::new(format!("p{}", i), format!("Player {}", i))));
//! }
//! assert!(engine.start_game());
//! assert_eq!(engine.phase(), GamePhase::TeamBuilding);
//! assert!(engine.leader().is_some());
//! ```

pub mod core;
pub mod error;
pub mod registry;
pub mod rules;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    Action, ActionRecord, Faction, GameConfig, GamePhase, GameRng, GameRngState, GameState,
    MissionVote, Perception, Player, PlayerId, PlayerView, RegistryConfig, Role, RoleCatalog,
    RoleInfo, SeatView, Vote,
};

pub use crate::error::{InvariantViolation, Rejection, SnapshotError, StoreError};

pub use crate::registry::{GameRegistry, SharedEngine};

pub use crate::rules::{EngineSnapshot, MissionTrack, RuleEngine};

pub use crate::store::{GameStore, JsonFileStore, MemoryStore};
