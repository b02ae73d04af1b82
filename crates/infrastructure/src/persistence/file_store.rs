//! File-backed key/value store.
//!
//! All keys live in one JSON object, by default in
//! `<config dir>/steward/store.json`:
//! ```json
//! {
//!   "language": "uz",
//!   "theme": "dark",
//!   "token": "eyJhbGciOi..."
//! }
//! ```
//! Several processes may share the file. Reads always go to disk; a watcher
//! task polls the file and broadcasts changes other processes made.
//!
//! Writers take an exclusive lock on `<file>.lock` for the whole
//! read-modify-write cycle and replace the file through a uniquely named
//! temporary file, so concurrent writers never lose each other's keys.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use steward_application::ports::{KeyValueStore, StorageChange, StoreError};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const CHANGE_CAPACITY: usize = 64;

/// How often [`FileKeyValueStore::spawn_watcher`] polls by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

type Values = BTreeMap<String, String>;

struct Inner {
    path: PathBuf,
    /// Last contents this handle has seen and announced.
    seen: Mutex<Values>,
    /// Serializes read-modify-write cycles of this handle.
    write: tokio::sync::Mutex<()>,
    changes: broadcast::Sender<StorageChange>,
}

/// [`KeyValueStore`] persisted as a JSON file.
///
/// Cloning yields another handle on the same store and change channel.
#[derive(Clone)]
pub struct FileKeyValueStore {
    inner: Arc<Inner>,
}

impl FileKeyValueStore {
    /// Opens the store at `path`. A missing file is an empty store; so is an
    /// unreadable one, which is replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match read_values(&path).await {
            Ok(values) => values,
            Err(StoreError::Serialization(message)) => {
                warn!(path = %path.display(), %message, "ignoring unreadable store file");
                Values::new()
            }
            Err(e) => return Err(e),
        };
        debug!(path = %path.display(), keys = values.len(), "opened store");

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                seen: Mutex::new(values),
                write: tokio::sync::Mutex::new(()),
                changes: broadcast::channel(CHANGE_CAPACITY).0,
            }),
        })
    }

    /// `<config dir>/steward/store.json`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("steward").join("store.json"))
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Polls the file every `interval` and broadcasts changes made by other
    /// processes. The task stops once every handle is dropped.
    #[must_use]
    pub fn spawn_watcher(&self, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let _write = inner.write.lock().await;
                match read_values(&inner.path).await {
                    Ok(values) => inner.publish(values),
                    Err(e) => debug!(error = %e, "store poll failed"),
                }
            }
        })
    }

    async fn update(
        &self,
        apply: impl FnOnce(&mut Values) -> bool + Send + 'static,
    ) -> Result<(), StoreError> {
        let inner = &self.inner;
        let _write = inner.write.lock().await;
        let path = inner.path.clone();
        let values = tokio::task::spawn_blocking(move || locked_update(&path, apply))
            .await
            .map_err(|e| StoreError::Unavailable(format!("store writer failed: {e}")))??;
        inner.publish(values);
        Ok(())
    }
}

impl Inner {
    /// Records `values` as seen and broadcasts every key that differs from
    /// what was seen before.
    fn publish(&self, values: Values) {
        let changes: Vec<StorageChange> = {
            let mut seen = self.seen.lock();
            let mut changes: Vec<StorageChange> = values
                .iter()
                .filter(|(key, value)| seen.get(*key) != Some(*value))
                .map(|(key, value)| StorageChange::new(key.clone(), Some(value.clone())))
                .collect();
            changes.extend(
                seen.keys()
                    .filter(|key| !values.contains_key(*key))
                    .map(|key| StorageChange::new(key.clone(), None)),
            );
            *seen = values;
            changes
        };
        for change in changes {
            debug!(key = %change.key, removed = change.new_value.is_none(), "store changed");
            let _ = self.changes.send(change);
        }
    }
}

fn parse_values(bytes: &[u8]) -> Result<Values, StoreError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Values::new());
    }
    from_json_bytes(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

async fn read_values(path: &Path) -> Result<Values, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => parse_values(&bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Values::new()),
        Err(e) => Err(StoreError::Io(e)),
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// One read-modify-write cycle under the cross-process lock. Blocking; the
/// lock is released when the lock file is closed.
fn locked_update(
    path: &Path,
    apply: impl FnOnce(&mut Values) -> bool,
) -> Result<Values, StoreError> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;
    lock.lock()?;

    let mut values = match std::fs::read(path) {
        Ok(bytes) => parse_values(&bytes).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "replacing unreadable store file");
            Values::new()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Values::new(),
        Err(e) => return Err(StoreError::Io(e)),
    };
    if apply(&mut values) {
        let bytes =
            to_json_stable_bytes(&values).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    }
    Ok(values)
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match read_values(&self.inner.path).await {
            Ok(mut values) => Ok(values.remove(key)),
            Err(StoreError::Serialization(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let (key, value) = (key.to_string(), value.to_string());
        self.update(move |values| {
            if values.get(&key) == Some(&value) {
                return false;
            }
            values.insert(key, value);
            true
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.update(move |values| values.remove(&key).is_some()).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.inner.changes.subscribe()
    }
}

impl std::fmt::Debug for FileKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKeyValueStore")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn store(dir: &TempDir) -> FileKeyValueStore {
        FileKeyValueStore::open(dir.path().join("steward").join("store.json"))
            .await
            .unwrap()
    }

    async fn next_change(changes: &mut broadcast::Receiver<StorageChange>) -> StorageChange {
        tokio::time::timeout(Duration::from_secs(5), changes.recv())
            .await
            .expect("no change broadcast")
            .unwrap()
    }

    #[tokio::test]
    async fn persists_values_as_sorted_json() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        store.set("token", "abc").await.unwrap();
        store.set("theme", "dark").await.unwrap();

        let reopened = FileKeyValueStore::open(store.path()).await.unwrap();
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("abc"));
        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents, "{\n  \"theme\": \"dark\",\n  \"token\": \"abc\"\n}\n");
    }

    #[tokio::test]
    async fn broadcasts_own_writes_once() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let mut changes = store.subscribe();

        store.set("token", "abc").await.unwrap();
        store.set("token", "abc").await.unwrap();
        store.remove("token").await.unwrap();
        store.remove("token").await.unwrap();

        assert_eq!(
            next_change(&mut changes).await,
            StorageChange::new("token", Some("abc".to_string()))
        );
        assert_eq!(next_change(&mut changes).await, StorageChange::new("token", None));
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn watcher_sees_other_process() {
        let dir = TempDir::new().unwrap();
        let ours = store(&dir).await;
        let theirs = store(&dir).await;
        let mut changes = ours.subscribe();
        let watcher = ours.spawn_watcher(Duration::from_millis(20));

        theirs.set("token", "from-elsewhere").await.unwrap();
        assert_eq!(
            next_change(&mut changes).await,
            StorageChange::new("token", Some("from-elsewhere".to_string()))
        );

        theirs.remove("token").await.unwrap();
        assert_eq!(next_change(&mut changes).await, StorageChange::new("token", None));
        watcher.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_keep_each_others_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let ours = FileKeyValueStore::open(&path).await.unwrap();
        let theirs = FileKeyValueStore::open(&path).await.unwrap();

        for round in 0..50 {
            let token = format!("token-{round}");
            let theme = format!("theme-{round}");

            let (a, b) = tokio::join!(ours.set("token", &token), theirs.set("theme", &theme));
            a.unwrap();
            b.unwrap();

            assert_eq!(ours.get("token").await.unwrap(), Some(token));
            assert_eq!(theirs.get("theme").await.unwrap(), Some(theme));
        }

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["store.json", "store.json.lock"]);
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty_and_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileKeyValueStore::open(&path).await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);

        store.set("language", "ru").await.unwrap();
        assert_eq!(store.get("language").await.unwrap().as_deref(), Some("ru"));
    }
}
