//! Durable score history and anonymous identity.
//!
//! Storage is modelled on a browser-style key-value store holding string
//! values. [`LocalScoreStore`] keeps every topic's history in a single JSON
//! blob under [`SCORES_KEY`]; failures never escape it.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StorageError;
use crate::model::{ScoreRecord, TopicKey};
use crate::traits::ScoreStore;

/// Key holding the serialized topic → scores mapping.
pub const SCORES_KEY: &str = "lai_scores";
/// Key holding the generated anonymous user identifier.
pub const USER_ID_KEY: &str = "lai_user_id";

/// The stored blob, kept as raw JSON so one bad entry cannot hide the rest.
type ScoreMap = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Key-value storage
// ---------------------------------------------------------------------------

/// String key-value storage with explicit failures.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never written.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// File-backed storage: one file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota: None,
        }
    }

    /// Reject values larger than `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            if value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    limit,
                });
            }
        }

        fs::create_dir_all(&self.dir)?;
        // Write-then-rename: readers never observe a partial value.
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path_for(key))?;
        Ok(())
    }
}

/// In-process storage, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    disabled: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage on which every operation fails, like a browser with storage turned off.
    pub fn disabled() -> Self {
        Self {
            items: Mutex::default(),
            disabled: true,
        }
    }

    fn check_enabled(&self) -> Result<(), StorageError> {
        if self.disabled {
            Err(StorageError::Unavailable("storage is disabled".into()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_enabled()?;
        let items = self
            .items
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".into()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_enabled()?;
        let mut items = self
            .items
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".into()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Score stores
// ---------------------------------------------------------------------------

/// Score store persisting all histories as one JSON object in key-value storage.
pub struct LocalScoreStore<S> {
    storage: S,
    // Serializes read-modify-write cycles in `record`.
    write_lock: Mutex<()>,
}

impl<S: KeyValueStorage> LocalScoreStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn load(&self) -> Result<ScoreMap, StorageError> {
        let Some(raw) = self.storage.get_item(SCORES_KEY)? else {
            return Ok(ScoreMap::new());
        };
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            key: SCORES_KEY.to_string(),
            message: e.to_string(),
        })
    }

    fn try_record(&self, key: TopicKey, score: ScoreRecord) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut all = self.load()?;
        let entry = all
            .entry(key.as_str())
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        let Some(list) = entry.as_array_mut() else {
            return Err(StorageError::Corrupt {
                key: SCORES_KEY.to_string(),
                message: format!("scores for '{key}' are not a list"),
            });
        };
        list.push(score.value().into());
        let raw = serde_json::to_string(&all).map_err(|e| StorageError::Corrupt {
            key: SCORES_KEY.to_string(),
            message: e.to_string(),
        })?;
        self.storage.set_item(SCORES_KEY, &raw)
    }
}

/// Valid scores stored under `key`. Entries that are not integers in
/// `[0, 100]` are skipped with a warning.
fn valid_scores(key: &TopicKey, stored: Option<&serde_json::Value>) -> Vec<ScoreRecord> {
    let list = match stored {
        None => return Vec::new(),
        Some(serde_json::Value::Array(list)) => list,
        Some(other) => {
            warn!(topic = %key, value = %other, "stored scores are not a list, ignoring them");
            return Vec::new();
        }
    };
    let scores: Vec<ScoreRecord> = list
        .iter()
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect();
    if scores.len() < list.len() {
        warn!(
            topic = %key,
            skipped = list.len() - scores.len(),
            "ignoring invalid stored scores"
        );
    }
    scores
}

impl<S: KeyValueStorage> ScoreStore for LocalScoreStore<S> {
    fn record(&self, topic: &str, score: ScoreRecord) {
        let key = TopicKey::new(topic);
        match self.try_record(key.clone(), score) {
            Ok(()) => debug!(topic = %key, score = score.value(), "recorded quiz score"),
            Err(e) => warn!(topic = %key, error = %e, "failed to record quiz score, dropping it"),
        }
    }

    fn history(&self, topic: &str) -> Vec<ScoreRecord> {
        let key = TopicKey::new(topic);
        match self.load() {
            Ok(all) => {
                let mut scores = valid_scores(&key, all.get(key.as_str()));
                scores.sort_unstable();
                scores
            }
            Err(e) => {
                warn!(topic = %key, error = %e, "score history unreadable, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Score store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    scores: Mutex<HashMap<TopicKey, Vec<ScoreRecord>>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn record(&self, topic: &str, score: ScoreRecord) {
        let mut scores = self.scores.lock().unwrap_or_else(|e| e.into_inner());
        scores.entry(TopicKey::new(topic)).or_default().push(score);
    }

    fn history(&self, topic: &str) -> Vec<ScoreRecord> {
        let scores = self.scores.lock().unwrap_or_else(|e| e.into_inner());
        let mut history = scores
            .get(&TopicKey::new(topic))
            .cloned()
            .unwrap_or_default();
        history.sort_unstable();
        history
    }
}

// ---------------------------------------------------------------------------
// Anonymous identity
// ---------------------------------------------------------------------------

/// Return the persisted anonymous user id, creating it on first use.
///
/// When storage is unusable a fresh id is returned on every call.
pub fn anonymous_user_id<S: KeyValueStorage + ?Sized>(storage: &S) -> String {
    match storage.get_item(USER_ID_KEY) {
        Ok(Some(id)) if !id.trim().is_empty() => return id.trim().to_string(),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not read user id"),
    }

    let id = format!("user_{}", Uuid::new_v4().simple());
    if let Err(e) = storage.set_item(USER_ID_KEY, &id) {
        warn!(error = %e, "could not persist user id");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[u8]) -> Vec<ScoreRecord> {
        values
            .iter()
            .map(|&v| ScoreRecord::new(v).unwrap())
            .collect()
    }

    #[test]
    fn history_of_unknown_topic_is_empty() {
        let store = LocalScoreStore::new(MemoryStorage::new());
        assert!(store.history("never seen").is_empty());
    }

    #[test]
    fn record_then_history_round_trip() {
        let store = LocalScoreStore::new(MemoryStorage::new());
        for s in scores(&[70, 85, 90]) {
            store.record("X", s);
        }
        assert_eq!(store.history("X"), scores(&[70, 85, 90]));
    }

    #[test]
    fn history_is_sorted_ascending() {
        let store = LocalScoreStore::new(MemoryStorage::new());
        for s in scores(&[90, 40, 75, 40]) {
            store.record("rust", s);
        }
        assert_eq!(store.history("rust"), scores(&[40, 40, 75, 90]));
    }

    #[test]
    fn case_variants_share_one_history() {
        let store = LocalScoreStore::new(MemoryStorage::new());
        store.record("Machine Learning", ScoreRecord::new(60).unwrap());
        store.record("MACHINE learning", ScoreRecord::new(80).unwrap());
        assert_eq!(store.history("machine learning"), scores(&[60, 80]));
    }

    #[test]
    fn corrupt_blob_reads_as_empty_and_is_not_overwritten() {
        let storage = MemoryStorage::new();
        storage.set_item(SCORES_KEY, "{not json").unwrap();
        let store = LocalScoreStore::new(storage);

        assert!(store.history("rust").is_empty());
        store.record("rust", ScoreRecord::new(50).unwrap());
        assert_eq!(
            store.storage().get_item(SCORES_KEY).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn invalid_entries_are_skipped_without_hiding_the_rest() {
        let storage = MemoryStorage::new();
        storage
            .set_item(SCORES_KEY, r#"{"rust": [50, 180, "x", 70], "go": "oops", "sql": [40]}"#)
            .unwrap();
        let store = LocalScoreStore::new(storage);

        assert_eq!(store.history("rust"), scores(&[50, 70]));
        assert!(store.history("go").is_empty());
        assert_eq!(store.history("sql"), scores(&[40]));

        store.record("rust", ScoreRecord::new(90).unwrap());
        store.record("go", ScoreRecord::new(10).unwrap());
        assert_eq!(store.history("rust"), scores(&[50, 70, 90]));

        let raw = store.storage().get_item(SCORES_KEY).unwrap().unwrap();
        let blob: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(blob["go"], "oops");
        assert_eq!(blob["rust"], serde_json::json!([50, 180, "x", 70, 90]));
    }

    #[test]
    fn disabled_storage_degrades_silently() {
        let store = LocalScoreStore::new(MemoryStorage::disabled());
        store.record("rust", ScoreRecord::new(90).unwrap());
        assert!(store.history("rust").is_empty());
    }

    #[test]
    fn quota_exceeded_drops_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalScoreStore::new(FileStorage::new(dir.path()).with_quota(16));
        store.record("rust", ScoreRecord::new(90).unwrap());
        assert_eq!(store.history("rust"), scores(&[90]));

        // The second write no longer fits; the first one survives.
        store.record("a much longer topic name", ScoreRecord::new(10).unwrap());
        assert!(store.history("a much longer topic name").is_empty());
        assert_eq!(store.history("rust"), scores(&[90]));
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalScoreStore::new(FileStorage::new(dir.path().join("data")));
            store.record("Rust", ScoreRecord::new(75).unwrap());
        }
        let store = LocalScoreStore::new(FileStorage::new(dir.path().join("data")));
        assert_eq!(store.history("rust"), scores(&[75]));
    }

    #[test]
    fn file_storage_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.get_item("absent").unwrap(), None);
    }

    #[test]
    fn memory_score_store_matches_contract() {
        let store = MemoryScoreStore::new();
        store.record("Go", ScoreRecord::new(30).unwrap());
        store.record("go", ScoreRecord::new(10).unwrap());
        assert_eq!(store.history("GO"), scores(&[10, 30]));
        assert!(store.history("rust").is_empty());
    }

    #[test]
    fn user_id_is_created_once() {
        let storage = MemoryStorage::new();
        let first = anonymous_user_id(&storage);
        let second = anonymous_user_id(&storage);
        assert!(first.starts_with("user_"));
        assert_eq!(first, second);
    }

    #[test]
    fn user_id_without_storage_still_returns_an_id() {
        let storage = MemoryStorage::disabled();
        let id = anonymous_user_id(&storage);
        assert!(id.starts_with("user_"));
    }
}
