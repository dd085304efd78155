//! Live games by id.
//!
//! The registry is an explicit object, not a process-wide singleton: create
//! one per server (or per test) and pass it around. It provides
//!
//! - create-on-first-reference, rehydrating from the store when a saved
//!   snapshot exists
//! - one `Mutex` per game as the serialization point for its actions, so
//!   different games proceed in parallel
//! - save-after-success, explicit removal and a sweep of empty games
//!
//! Store I/O never runs under the map lock or a game's lock. Each change
//! stamps the game with a new version while its lock is held, and a save is
//! skipped when a newer version already reached the store.
//!
//! Store failures are logged and swallowed: the in-memory game keeps going.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, info, trace, warn};

use crate::core::{ActionRecord, GameState, PlayerId, PlayerView, RegistryConfig};
use crate::rules::{EngineSnapshot, RuleEngine};
use crate::store::{GameStore, MemoryStore};

/// Handle to one game's engine behind its lock.
pub type SharedEngine = Arc<Mutex<RuleEngine>>;

/// Saved-version marker for a game that has been removed.
const RETIRED: u64 = u64::MAX;

/// One live game plus its save ordering.
struct GameSlot {
    engine: SharedEngine,
    /// Bumped under the engine lock on every stamped change.
    version: AtomicU64,
    /// Version last written to the store.
    saved: Mutex<u64>,
}

impl GameSlot {
    fn new(engine: RuleEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            version: AtomicU64::new(0),
            saved: Mutex::new(0),
        }
    }

    /// Version and snapshot of the current state. Call with the engine locked.
    fn stamp(&self, engine: &RuleEngine) -> (u64, EngineSnapshot) {
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        (version, engine.snapshot())
    }
}

/// Owns every live game and its persistence.
pub struct GameRegistry<S: GameStore = MemoryStore> {
    config: RegistryConfig,
    store: S,
    games: RwLock<FxHashMap<String, Arc<GameSlot>>>,
}

impl GameRegistry<MemoryStore> {
    /// Registry backed by an in-memory store.
    #[must_use]
    pub fn in_memory(config: RegistryConfig) -> Self {
        Self::new(config, MemoryStore::new())
    }
}

impl<S: GameStore> GameRegistry<S> {
    #[must_use]
    pub fn new(config: RegistryConfig, store: S) -> Self {
        Self {
            config,
            store,
            games: RwLock::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    // === Lookup ===

    /// Live game, if loaded.
    #[must_use]
    pub fn get(&self, game_id: &str) -> Option<SharedEngine> {
        self.games.read().get(game_id).map(|slot| Arc::clone(&slot.engine))
    }

    /// Live game, loading it from the store or creating it if needed.
    pub fn get_or_create(&self, game_id: &str) -> SharedEngine {
        Arc::clone(&self.slot(game_id).engine)
    }

    #[must_use]
    pub fn contains(&self, game_id: &str) -> bool {
        self.games.read().contains_key(game_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.read().is_empty()
    }

    /// Ids of all live games, sorted.
    #[must_use]
    pub fn game_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.games.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    // === Actions ===

    /// Route one transport action to its game.
    ///
    /// Returns the engine's verdict. On success the new state is saved (when
    /// configured) after the game's lock is released.
    pub fn dispatch(&self, record: &ActionRecord) -> bool {
        let slot = self.slot(&record.game_id);
        let stamped = {
            let mut engine = slot.engine.lock();
            if !engine.apply(&record.player, &record.action) {
                return false;
            }
            let stamped = self.config.persist_on_change.then(|| slot.stamp(&engine));
            stamped
        };
        if let Some((version, snapshot)) = stamped {
            self.persist(&record.game_id, &slot, version, &snapshot);
        }
        true
    }

    /// Run `f` against a game under its lock. Does not persist; call
    /// [`commit`](Self::commit) afterwards if `f` changed anything.
    pub fn with_game<R>(&self, game_id: &str, f: impl FnOnce(&mut RuleEngine) -> R) -> R {
        let slot = self.slot(game_id);
        let mut engine = slot.engine.lock();
        f(&mut *engine)
    }

    /// Save a live game now. `false` if it is not loaded or the save failed.
    pub fn commit(&self, game_id: &str) -> bool {
        let Some(slot) = self.games.read().get(game_id).cloned() else {
            return false;
        };
        let (version, snapshot) = {
            let engine = slot.engine.lock();
            slot.stamp(&engine)
        };
        self.persist(game_id, &slot, version, &snapshot)
    }

    /// Current full state, for broadcasting.
    #[must_use]
    pub fn state_of(&self, game_id: &str) -> Option<GameState> {
        let engine = self.get(game_id)?;
        let state = engine.lock().state().clone();
        Some(state)
    }

    /// Current state as seen by one player.
    #[must_use]
    pub fn view_for(&self, game_id: &str, viewer: &PlayerId) -> Option<PlayerView> {
        let engine = self.get(game_id)?;
        let view = engine.lock().view_for(viewer);
        view
    }

    // === Lifecycle ===

    /// Drop a game and its persisted state. `false` if it was not live.
    pub fn remove(&self, game_id: &str) -> bool {
        let removed = self.games.write().remove(game_id);
        if let Some(slot) = &removed {
            *slot.saved.lock() = RETIRED;
        }
        self.forget(game_id);
        removed.is_some()
    }

    /// Remove every live game without players. Returns the removed ids.
    pub fn sweep_empty(&self) -> Vec<String> {
        let removed: Vec<(String, Arc<GameSlot>)> = {
            let mut games = self.games.write();
            let empty: Vec<String> = games
                .iter()
                .filter(|(_, slot)| {
                    let seated = slot.engine.lock().state().player_count();
                    seated == 0
                })
                .map(|(id, _)| id.clone())
                .collect();
            empty
                .into_iter()
                .filter_map(|id| games.remove(&id).map(|slot| (id, slot)))
                .collect()
        };

        let mut ids = Vec::with_capacity(removed.len());
        for (id, slot) in removed {
            *slot.saved.lock() = RETIRED;
            self.forget(&id);
            info!(game = %id, "cleaned up empty game");
            ids.push(id);
        }
        ids
    }

    // === Store plumbing ===

    /// Live slot for `game_id`. A missing game is loaded with no registry
    /// lock held; if two callers race, the first insert wins.
    fn slot(&self, game_id: &str) -> Arc<GameSlot> {
        if let Some(slot) = self.games.read().get(game_id) {
            return Arc::clone(slot);
        }

        let fresh = Arc::new(GameSlot::new(self.load_or_new(game_id)));
        let mut games = self.games.write();
        let slot = games.entry(game_id.to_string()).or_insert(fresh);
        Arc::clone(slot)
    }

    fn load_or_new(&self, game_id: &str) -> RuleEngine {
        match self.store.load(game_id) {
            Ok(Some(snapshot)) => match RuleEngine::from_snapshot(snapshot) {
                Ok(engine) => {
                    info!(game = %game_id, phase = ?engine.phase(), "resumed saved game");
                    return engine;
                }
                Err(err) => warn!(game = %game_id, %err, "saved game failed validation"),
            },
            Ok(None) => {}
            Err(err) => warn!(game = %game_id, %err, "failed to load saved game"),
        }

        debug!(game = %game_id, "created game");
        RuleEngine::new(game_id, &self.config.game_config(game_id))
    }

    /// Write `snapshot` unless the store already holds this version or a
    /// later one. Saves for one game are serialized by `slot.saved`.
    fn persist(
        &self,
        game_id: &str,
        slot: &GameSlot,
        version: u64,
        snapshot: &EngineSnapshot,
    ) -> bool {
        let mut saved = slot.saved.lock();
        if *saved >= version {
            trace!(game = %game_id, version, saved = *saved, "skipped stale save");
            return true;
        }
        match self.store.save(game_id, snapshot) {
            Ok(()) => {
                *saved = version;
                true
            }
            Err(err) => {
                warn!(game = %game_id, %err, "failed to save game state");
                false
            }
        }
    }

    fn forget(&self, game_id: &str) {
        if let Err(err) = self.store.delete(game_id) {
            warn!(game = %game_id, %err, "failed to delete game state");
        }
    }
}
