//! Snapshot persistence.
//!
//! The engine never does I/O. The registry saves after a successful action
//! and loads on first reference, through a [`GameStore`] backend:
//!
//! ```text
//! GameStore
//! ├── MemoryStore: bincode blobs in a map (tests, single process)
//! └── JsonFileStore: one pretty-printed <gameId>.json per game
//! ```
//!
//! Failures are reported as [`StoreError`] and never stop a game.

mod file;

pub use file::JsonFileStore;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::StoreError;
use crate::rules::EngineSnapshot;

/// Storage backend keyed by game id.
pub trait GameStore: Send + Sync {
    /// Persist a snapshot, replacing any previous one.
    fn save(&self, game_id: &str, snapshot: &EngineSnapshot) -> Result<(), StoreError>;

    /// Load a snapshot. `Ok(None)` if nothing was saved.
    fn load(&self, game_id: &str) -> Result<Option<EngineSnapshot>, StoreError>;

    /// Remove a snapshot. Deleting a missing game is not an error.
    fn delete(&self, game_id: &str) -> Result<(), StoreError>;
}

/// In-process store holding bincode-encoded snapshots.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<FxHashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored games.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    #[must_use]
    pub fn contains(&self, game_id: &str) -> bool {
        self.blobs.read().contains_key(game_id)
    }
}

impl GameStore for MemoryStore {
    fn save(&self, game_id: &str, snapshot: &EngineSnapshot) -> Result<(), StoreError> {
        let bytes = snapshot.to_bytes()?;
        self.blobs.write().insert(game_id.to_string(), bytes);
        Ok(())
    }

    fn load(&self, game_id: &str) -> Result<Option<EngineSnapshot>, StoreError> {
        match self.blobs.read().get(game_id) {
            Some(bytes) => Ok(Some(EngineSnapshot::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }

    fn delete(&self, game_id: &str) -> Result<(), StoreError> {
        self.blobs.write().remove(game_id);
        Ok(())
    }
}

/// Shared stores work as stores.
impl<S: GameStore + ?Sized> GameStore for std::sync::Arc<S> {
    fn save(&self, game_id: &str, snapshot: &EngineSnapshot) -> Result<(), StoreError> {
        (**self).save(game_id, snapshot)
    }

    fn load(&self, game_id: &str) -> Result<Option<EngineSnapshot>, StoreError> {
        (**self).load(game_id)
    }

    fn delete(&self, game_id: &str) -> Result<(), StoreError> {
        (**self).delete(game_id)
    }
}
