//! One JSON file per game under a storage directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::GameStore;
use crate::error::StoreError;
use crate::rules::EngineSnapshot;

/// Stores each game as `<dir>/<gameId>.json`.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Game ids become file names, so only a conservative charset is allowed.
    fn path_for(&self, game_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !game_id.is_empty()
            && game_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(game_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", game_id)))
    }
}

impl GameStore for JsonFileStore {
    fn save(&self, game_id: &str, snapshot: &EngineSnapshot) -> Result<(), StoreError> {
        let path = self.path_for(game_id)?;
        let json = snapshot.to_json()?;

        // Atomic replace via rename.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load(&self, game_id: &str) -> Result<Option<EngineSnapshot>, StoreError> {
        let path = self.path_for(game_id)?;
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(EngineSnapshot::from_json(&json)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, game_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(game_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
