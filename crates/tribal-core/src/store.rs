//! Persistence media for the game state.
//!
//! A [`GameStore`] holds exactly one serialized [`GameState`] under a fixed
//! key. [`JsonFileStore`] is the production medium: one pretty-printed
//! JSON file, replaced atomically through a temporary file and a rename.
//! [`MemoryStore`] keeps the same bytes in memory for tests and tools.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tribal_world::WorldError;

use crate::game::GameState;

/// Errors raised while loading or saving the game.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The storage medium could not be read or written.
    #[error("storage I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The stored bytes are not a valid game document.
    #[error("game document is malformed: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The document parsed but the world inside it is inconsistent.
    #[error("stored world is inconsistent: {source}")]
    Invalid {
        /// The validation failure.
        #[from]
        source: WorldError,
    },
}

/// A medium holding the persisted game.
pub trait GameStore: Send + Sync {
    /// Read the stored game, or `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the medium fails or holds bytes that
    /// do not decode into a valid game.
    fn load(&self) -> Result<Option<GameState>, PersistenceError>;

    /// Replace the stored game with `game`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if encoding or writing fails. A failed
    /// save leaves the previously stored game untouched.
    fn save(&self, game: &GameState) -> Result<(), PersistenceError>;

    /// Move an unusable stored game out of the way so the next save does
    /// not overwrite it. Returns where it went, or `None` if the medium
    /// keeps nothing aside.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if the stored game cannot be moved.
    fn set_aside(&self, tag: &str) -> Result<Option<String>, PersistenceError> {
        let _ = tag;
        Ok(None)
    }
}

/// Stores the game as a JSON file at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store for the file at `path`. Nothing is touched until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the game file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    /// Path of the game file with `suffix` appended to its name.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

impl GameStore for JsonFileStore {
    fn load(&self) -> Result<Option<GameState>, PersistenceError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        GameState::from_json_bytes(&bytes).map(Some)
    }

    fn save(&self, game: &GameState) -> Result<(), PersistenceError> {
        let bytes = game.to_json_bytes()?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let temp = self.temp_path();
        std::fs::write(&temp, &bytes)?;
        std::fs::rename(&temp, &self.path)?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "Game file written");
        Ok(())
    }

    fn set_aside(&self, tag: &str) -> Result<Option<String>, PersistenceError> {
        let target = self.sibling(&format!(".corrupt-{tag}"));
        match std::fs::rename(&self.path, &target) {
            Ok(()) => Ok(Some(target.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the serialized game in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with serialized bytes.
    pub const fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes)),
        }
    }

    /// The currently stored bytes, if any.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl GameStore for MemoryStore {
    fn load(&self) -> Result<Option<GameState>, PersistenceError> {
        self.bytes()
            .map(|b| GameState::from_json_bytes(&b))
            .transpose()
    }

    fn save(&self, game: &GameState) -> Result<(), PersistenceError> {
        let bytes = game.to_json_bytes()?;
        *self.bytes.lock().unwrap_or_else(PoisonError::into_inner) = Some(bytes);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tribal_world::StartingWorld;

    use super::*;

    fn temp_file(tag: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tribal-store-{tag}-{}", uuid::Uuid::now_v7()))
            .join("game.json")
    }

    #[test]
    fn missing_file_loads_as_none() {
        let store = JsonFileStore::new(temp_file("missing"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_roundtrip() {
        let path = temp_file("roundtrip");
        let store = JsonFileStore::new(&path);
        let game = GameState::new(&StartingWorld::default()).unwrap();

        store.save(&game).unwrap();
        assert!(path.exists());
        assert!(!store.temp_path().exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, game);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = temp_file("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(PersistenceError::Json { .. })));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn set_aside_moves_file_and_ignores_missing_one() {
        let path = temp_file("aside");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let store = JsonFileStore::new(&path);
        assert_eq!(store.set_aside("x").unwrap(), None);

        std::fs::write(&path, b"broken").unwrap();
        let moved = store.set_aside("x").unwrap().unwrap();
        assert!(moved.ends_with("game.json.corrupt-x"));
        assert!(!path.exists());
        assert_eq!(std::fs::read(&moved).unwrap(), b"broken");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn memory_store_starts_empty_and_keeps_last_save() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let game = GameState::new(&StartingWorld::default()).unwrap();
        store.save(&game).unwrap();
        assert_eq!(store.load().unwrap(), Some(game));
    }
}
