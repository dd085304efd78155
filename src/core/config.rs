//! Engine and registry configuration.
//!
//! Rule constants (team sizes, quorum, rejection limit) are catalog data and
//! deliberately not configurable here. What a caller can tune is the source
//! of randomness and how the registry persists games.

use serde::{Deserialize, Serialize};

use super::rng::GameRng;

/// Configuration for a single engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seed for role dealing and first-leader selection.
    /// Same seed and same seating produce the same deal.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl GameConfig {
    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub(crate) fn rng(&self) -> GameRng {
        GameRng::new(self.seed)
    }
}

/// Configuration for a [`GameRegistry`](crate::registry::GameRegistry).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base seed; each game's seed is derived from this and its id.
    pub base_seed: u64,

    /// Save a snapshot after every successful action.
    pub persist_on_change: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_seed: 42,
            persist_on_change: true,
        }
    }
}

impl RegistryConfig {
    /// Set the base seed.
    #[must_use]
    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    /// Enable or disable saving after each action.
    #[must_use]
    pub fn with_persistence(mut self, persist: bool) -> Self {
        self.persist_on_change = persist;
        self
    }

    /// Engine configuration for a particular game.
    #[must_use]
    pub fn game_config(&self, game_id: &str) -> GameConfig {
        GameConfig::default().with_seed(GameRng::derive_seed(self.base_seed, game_id))
    }
}
