//! Persistence bridge between the store and a key-value backend
//!
//! A [`PersistBridge`] keeps a whitelist of state slices. At startup it
//! seeds the state from storage with [`PersistBridge::rehydrate`]; as a
//! [`Middleware`] it writes whitelisted slices back after every dispatch
//! that changed the state. Storage problems never reach the caller: a
//! missing or unparsable value is treated as absent and a failed write is
//! logged.
//!
//! ```ignore
//! let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir)?);
//! let mut bridge = PersistBridge::new(storage)
//!     .slice("favorites", |s: &AppState| &s.favorites, |s| &mut s.favorites);
//!
//! let mut state = AppState::default();
//! bridge.rehydrate(&mut state);
//! let store = StoreWithMiddleware::new(state, reducer, bridge);
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::action::Action;
use crate::middleware::Middleware;

/// Errors raised by [`KeyValueStore`] implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove '{key}': {source}")]
    Remove {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Device-local string storage addressed by key.
///
/// There is no locking across callers: concurrent writers to the same key
/// get last-write-wins semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value, treating any failure as absence.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(key, error = %err, "Storage read failed, treating as absent");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "Stored value is not valid JSON, ignoring");
            None
        }
    }
}

/// Encode a value as JSON and store it.
pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

// ============================================================================
// Backends
// ============================================================================

/// In-memory backend, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a store (simulates a previous run).
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// File backend: one file per key inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so
/// a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a storage directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Write {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.tmp"));
        let write_err = |source| StorageError::Write {
            key: key.to_string(),
            source,
        };
        fs::write(&tmp, value).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove {
                key: key.to_string(),
                source,
            }),
        }
    }
}

// ============================================================================
// Bridge
// ============================================================================

type SaveFn<S> = Box<dyn Fn(&S) -> Result<String, serde_json::Error> + Send>;
type LoadFn<S> = Box<dyn Fn(&mut S, &str) -> Result<(), serde_json::Error> + Send>;

struct PersistedSlice<S> {
    key: String,
    save: SaveFn<S>,
    load: LoadFn<S>,
    last_written: Option<String>,
}

/// Mirrors whitelisted state slices to a [`KeyValueStore`].
pub struct PersistBridge<S> {
    storage: Arc<dyn KeyValueStore>,
    slices: Vec<PersistedSlice<S>>,
}

impl<S: 'static> std::fmt::Debug for PersistBridge<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistBridge")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S: 'static> PersistBridge<S> {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            slices: Vec::new(),
        }
    }

    /// Whitelist a slice under `key`.
    ///
    /// `read` and `write` project the slice out of the full state.
    pub fn slice<T, R, W>(mut self, key: impl Into<String>, read: R, write: W) -> Self
    where
        T: Serialize + DeserializeOwned,
        R: Fn(&S) -> &T + Send + 'static,
        W: Fn(&mut S) -> &mut T + Send + 'static,
    {
        self.slices.push(PersistedSlice {
            key: key.into(),
            save: Box::new(move |state: &S| serde_json::to_string(read(state))),
            load: Box::new(move |state: &mut S, raw: &str| {
                *write(state) = serde_json::from_str(raw)?;
                Ok(())
            }),
            last_written: None,
        });
        self
    }

    /// Whitelisted keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.iter().map(|s| s.key.as_str())
    }

    /// Seed `state` from storage. Returns how many slices were restored.
    ///
    /// Call before the state is handed to a store so no subscriber can
    /// observe the pre-rehydration value.
    pub fn rehydrate(&mut self, state: &mut S) -> usize {
        let mut restored = 0;
        for slice in &mut self.slices {
            let raw = match self.storage.get(&slice.key) {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    tracing::debug!(key = %slice.key, "Nothing stored for slice");
                    continue;
                }
                Err(err) => {
                    tracing::warn!(key = %slice.key, error = %err, "Could not read slice");
                    continue;
                }
            };
            match (slice.load)(state, &raw) {
                Ok(()) => {
                    restored += 1;
                    slice.last_written = (slice.save)(state).ok();
                    tracing::debug!(key = %slice.key, "Slice rehydrated");
                }
                Err(err) => {
                    tracing::warn!(key = %slice.key, error = %err, "Stored slice unreadable, keeping default");
                }
            }
        }
        restored
    }

    /// Write every whitelisted slice whose serialized form changed since
    /// the last successful write. Returns the number of writes.
    pub fn flush(&mut self, state: &S) -> usize {
        let mut written = 0;
        for slice in &mut self.slices {
            let raw = match (slice.save)(state) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(key = %slice.key, error = %err, "Could not encode slice");
                    continue;
                }
            };
            if slice.last_written.as_deref() == Some(raw.as_str()) {
                continue;
            }
            match self.storage.set(&slice.key, &raw) {
                Ok(()) => {
                    slice.last_written = Some(raw);
                    written += 1;
                }
                Err(err) => {
                    tracing::warn!(key = %slice.key, error = %err, "Could not persist slice");
                }
            }
        }
        written
    }
}

impl<S: 'static, A: Action> Middleware<S, A> for PersistBridge<S> {
    fn before(&mut self, _action: &A) {}

    fn after(&mut self, _action: &A, state_changed: bool, state: &S) {
        if state_changed {
            self.flush(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        ids: Vec<u32>,
    }

    #[derive(Debug, Default)]
    struct TestState {
        prefs: Prefs,
        scratch: u32,
    }

    #[derive(Clone, Debug)]
    struct Touch;

    impl Action for Touch {
        fn name(&self) -> &'static str {
            "Touch"
        }
    }

    fn bridge(storage: Arc<dyn KeyValueStore>) -> PersistBridge<TestState> {
        PersistBridge::new(storage).slice("prefs", |s: &TestState| &s.prefs, |s| &mut s.prefs)
    }

    #[test]
    fn test_rehydrate_restores_whitelisted_slice() {
        let storage = Arc::new(MemoryStore::with_entries([("prefs", r#"{"ids":[3,1]}"#)]));
        let mut bridge = bridge(storage);
        let mut state = TestState::default();

        assert_eq!(bridge.rehydrate(&mut state), 1);
        assert_eq!(state.prefs.ids, vec![3, 1]);
    }

    #[test]
    fn test_rehydrate_ignores_garbage_and_missing() {
        let storage = Arc::new(MemoryStore::with_entries([("prefs", "not json")]));
        let mut state = TestState::default();
        assert_eq!(bridge(storage).rehydrate(&mut state), 0);
        assert_eq!(state.prefs, Prefs::default());

        let mut state = TestState::default();
        assert_eq!(bridge(Arc::new(MemoryStore::new())).rehydrate(&mut state), 0);
        assert_eq!(state.prefs, Prefs::default());
    }

    #[test]
    fn test_after_writes_only_on_change() {
        let storage = Arc::new(MemoryStore::new());
        let mut bridge = bridge(storage.clone());
        let mut state = TestState::default();

        Middleware::<TestState, Touch>::after(&mut bridge, &Touch, false, &state);
        assert!(!storage.contains("prefs"));

        state.prefs.ids.push(9);
        Middleware::<TestState, Touch>::after(&mut bridge, &Touch, true, &state);
        assert_eq!(
            storage.get("prefs").unwrap().as_deref(),
            Some(r#"{"ids":[9]}"#)
        );

        // Non-whitelisted change: nothing new to write
        state.scratch = 5;
        assert_eq!(bridge.flush(&state), 0);
    }

    #[test]
    fn test_load_and_save_json() {
        let storage = MemoryStore::new();
        save_json(&storage, "k", &Prefs { ids: vec![1] }).unwrap();
        let back: Option<Prefs> = load_json(&storage, "k");
        assert_eq!(back, Some(Prefs { ids: vec![1] }));

        storage.set("bad", "{").unwrap();
        assert_eq!(load_json::<Prefs>(&storage, "bad"), None);
        assert_eq!(load_json::<Prefs>(&storage, "missing"), None);
    }

    #[test]
    fn test_file_store_roundtrip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();

        assert_eq!(store.get("auth_token").unwrap(), None);
        store.set("auth_token", "abc").unwrap();
        store.set("auth_token", "def").unwrap();
        assert_eq!(store.get("auth_token").unwrap().as_deref(), Some("def"));

        store.remove("auth_token").unwrap();
        store.remove("auth_token").unwrap();
        assert_eq!(store.get("auth_token").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(
            store.remove(".hidden"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
