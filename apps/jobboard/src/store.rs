//! Flat-file record store.
//!
//! Each collection is one JSON array in `<data_dir>/<name>.json`. Saves replace
//! the whole file through a temp-file rename. Read-modify-write cycles go through
//! [`RecordStore::update`], which holds a per-collection mutex for the whole cycle.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode collection: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to replace collection file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Jobs,
    Applications,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Users,
        Collection::Jobs,
        Collection::Applications,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Jobs => "jobs",
            Collection::Applications => "applications",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.name())
    }

    fn index(self) -> usize {
        match self {
            Collection::Users => 0,
            Collection::Jobs => 1,
            Collection::Applications => 2,
        }
    }
}

pub struct RecordStore {
    dir: PathBuf,
    locks: [Mutex<()>; 3],
    quarantine_lock: Mutex<()>,
}

impl RecordStore {
    /// Creates the data directory and seeds every missing collection with `[]`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        for collection in Collection::ALL {
            let path = dir.join(collection.file_name());
            if !tokio::fs::try_exists(&path).await? {
                tokio::fs::write(&path, b"[]").await?;
                info!("Seeded empty collection {}", path.display());
            }
        }

        Ok(Self {
            dir,
            locks: [Mutex::new(()), Mutex::new(()), Mutex::new(())],
            quarantine_lock: Mutex::new(()),
        })
    }

    pub fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    /// Reads a whole collection.
    ///
    /// Never fails: an absent, unreadable or malformed file yields an empty
    /// collection. A file that is not a JSON array is copied aside first so the
    /// next save does not destroy the only copy. Single records that do not
    /// decode are skipped here and written back untouched by [`Self::update`].
    pub async fn load<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        self.read_collection(collection).await.records
    }

    /// Replaces a collection with `records`.
    pub async fn save<T: Serialize>(
        &self,
        collection: Collection,
        records: &[T],
    ) -> Result<(), StoreError> {
        let _guard = self.locks[collection.index()].lock().await;
        self.write_collection(collection, records).await
    }

    /// Loads, mutates and saves a collection while holding its lock.
    ///
    /// Nothing is written when `f` returns an error. Records that did not
    /// decode are kept at the end of the file.
    pub async fn update<T, R, E, F>(&self, collection: Collection, f: F) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Result<R, E>,
        E: From<StoreError>,
    {
        let _guard = self.locks[collection.index()].lock().await;
        let Decoded {
            mut records,
            unreadable,
        } = self.read_collection(collection).await;
        let out = f(&mut records)?;

        if unreadable.is_empty() {
            self.write_collection(collection, &records).await?;
        } else {
            let mut all = records
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)?;
            all.extend(unreadable);
            self.write_collection(collection, &all).await?;
        }
        Ok(out)
    }

    pub async fn append<T>(&self, collection: Collection, record: T) -> Result<(), StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.update(collection, move |records: &mut Vec<T>| {
            records.push(record);
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn read_collection<T: DeserializeOwned>(&self, collection: Collection) -> Decoded<T> {
        let path = self.path(collection);

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Collection {} not found, starting empty", path.display());
                return Decoded::empty();
            }
            Err(e) => {
                error!(
                    "Collection {} is unreadable ({e}), substituting an empty collection",
                    path.display()
                );
                return Decoded::empty();
            }
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Decoded::empty();
        }

        let values = match serde_json::from_slice::<Vec<serde_json::Value>>(&raw) {
            Ok(values) => values,
            Err(e) => {
                error!(
                    "Collection {} is malformed ({e}), substituting an empty collection",
                    path.display()
                );
                self.quarantine(&path, &raw).await;
                return Decoded::empty();
            }
        };

        let mut decoded = Decoded {
            records: Vec::with_capacity(values.len()),
            unreadable: Vec::new(),
        };
        for (position, value) in values.into_iter().enumerate() {
            match T::deserialize(&value) {
                Ok(record) => decoded.records.push(record),
                Err(e) => {
                    warn!(
                        "Skipping record {position} of collection {} ({e})",
                        collection.name()
                    );
                    decoded.unreadable.push(value);
                }
            }
        }
        decoded
    }

    async fn write_collection<T: Serialize>(
        &self,
        collection: Collection,
        records: &[T],
    ) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(records)?;
        let dir = self.dir.clone();
        let path = self.path(collection);

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&body)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path)?;
            Ok(())
        })
        .await??;

        debug!(
            "Saved {} records to collection {}",
            records.len(),
            collection.name()
        );
        Ok(())
    }

    /// Copies a malformed file to `<file>.corrupt-<millis>`, once per content.
    async fn quarantine(&self, path: &Path, raw: &[u8]) {
        let _guard = self.quarantine_lock.lock().await;

        if let Some(existing) = existing_copy(path, raw).await {
            debug!(
                "Malformed collection {} already copied to {}",
                path.display(),
                existing.display()
            );
            return;
        }

        let stamp = chrono::Utc::now().timestamp_millis();
        let mut target = path.as_os_str().to_owned();
        target.push(format!(".corrupt-{stamp}"));
        let target = PathBuf::from(target);

        match tokio::fs::write(&target, raw).await {
            Ok(()) => warn!(
                "Copied malformed collection {} to {}",
                path.display(),
                target.display()
            ),
            Err(e) => error!(
                "Failed to copy malformed collection {} aside: {e}",
                path.display()
            ),
        }
    }
}

/// Result of reading a collection file.
struct Decoded<T> {
    records: Vec<T>,
    /// Array elements that did not decode as `T`.
    unreadable: Vec<serde_json::Value>,
}

impl<T> Decoded<T> {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            unreadable: Vec::new(),
        }
    }
}

/// Finds an earlier `<file>.corrupt-*` copy holding exactly `raw`.
async fn existing_copy(path: &Path, raw: &[u8]) -> Option<PathBuf> {
    let dir = path.parent()?;
    let prefix = format!("{}.corrupt-", path.file_name()?.to_string_lossy());
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;

    while let Ok(Some(entry)) = entries.next_entry().await {
        if !entry.file_name().to_string_lossy().starts_with(&prefix) {
            continue;
        }
        let same_len = entry
            .metadata()
            .await
            .is_ok_and(|meta| meta.len() == raw.len() as u64);
        if same_len && tokio::fs::read(entry.path()).await.is_ok_and(|kept| kept == raw) {
            return Some(entry.path());
        }
    }
    None
}
