//! Filesystem-backed entity store
//!
//! Layout: `<root>/<collection>/<id>` holds the JSON body exactly as it was
//! submitted. `<root>/<collection>/.next_id` records the id high-water mark
//! so that an id is never handed out twice, even after the highest record
//! has been deleted and the process restarted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::store::error::StoreError;

const COUNTER_FILE: &str = ".next_id";
const MAX_COLLECTION_NAME_LEN: usize = 255;

/// Per-collection state guarded by the collection's allocation lock.
#[derive(Debug)]
struct Collection {
    dir: PathBuf,
    /// Next id to hand out; `None` until derived from disk.
    next_id: Option<u64>,
}

/// Durable key to JSON-document storage partitioned by collection.
///
/// Creates, updates and deletes on one collection are serialized by that
/// collection's lock. Reads never lock: every write lands in a temporary
/// file that is renamed into place, so readers only ever observe complete
/// documents.
#[derive(Debug)]
pub struct EntityStore {
    root: PathBuf,
    collections: Mutex<HashMap<String, Arc<AsyncMutex<Collection>>>>,
}

impl EntityStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;

        Ok(Self {
            root,
            collections: Mutex::new(HashMap::new()),
        })
    }

    /// Allocates the next id in `collection`, writes `body` under it and
    /// returns the id. The document is durable before this returns.
    pub async fn create(&self, collection: &str, body: &[u8]) -> Result<u64, StoreError> {
        let handle = self.collection(collection)?;
        let mut coll = handle.lock().await;

        tokio::fs::create_dir_all(&coll.dir).await?;

        let id = match coll.next_id {
            Some(id) => id,
            None => derive_next_id(&coll.dir).await?,
        };
        let next = id
            .checked_add(1)
            .ok_or_else(|| std::io::Error::other("record ids exhausted"))?;

        write_atomic(&coll.dir, &id.to_string(), body).await?;
        write_atomic(&coll.dir, COUNTER_FILE, next.to_string().as_bytes()).await?;
        sync_dir(&coll.dir).await?;

        coll.next_id = Some(next);
        debug!(collection, id, "Record created");

        Ok(id)
    }

    /// Returns the stored body of `id`.
    pub async fn get(&self, collection: &str, id: u64) -> Result<Vec<u8>, StoreError> {
        validate_collection_name(collection)?;

        tokio::fs::read(self.root.join(collection).join(id.to_string()))
            .await
            .map_err(StoreError::from_io)
    }

    /// Replaces the body of an existing record. Never allocates an id.
    pub async fn update(&self, collection: &str, id: u64, body: &[u8]) -> Result<(), StoreError> {
        let handle = self.existing_collection(collection).await?;
        let coll = handle.lock().await;
        let name = id.to_string();

        let meta = tokio::fs::metadata(coll.dir.join(&name))
            .await
            .map_err(StoreError::from_io)?;
        if !meta.is_file() {
            return Err(StoreError::NotFound);
        }

        write_atomic(&coll.dir, &name, body).await?;
        sync_dir(&coll.dir).await?;

        debug!(collection, id, "Record updated");
        Ok(())
    }

    /// Removes a record. Its id stays retired.
    pub async fn delete(&self, collection: &str, id: u64) -> Result<(), StoreError> {
        let handle = self.existing_collection(collection).await?;
        let coll = handle.lock().await;

        tokio::fs::remove_file(coll.dir.join(id.to_string()))
            .await
            .map_err(StoreError::from_io)?;
        sync_dir(&coll.dir).await?;

        debug!(collection, id, "Record deleted");
        Ok(())
    }

    /// Ids currently present in `collection`, ascending. A collection that
    /// was never written to is empty.
    pub async fn list(&self, collection: &str) -> Result<Vec<u64>, StoreError> {
        validate_collection_name(collection)?;

        let mut ids = match read_ids(&self.root.join(collection)).await {
            Ok(ids) => ids,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        ids.sort_unstable();

        Ok(ids)
    }

    /// Like [`collection`](Self::collection), but a collection with no
    /// directory on disk is `NotFound` and is not registered.
    async fn existing_collection(
        &self,
        name: &str,
    ) -> Result<Arc<AsyncMutex<Collection>>, StoreError> {
        validate_collection_name(name)?;

        let meta = tokio::fs::metadata(self.root.join(name))
            .await
            .map_err(StoreError::from_io)?;
        if !meta.is_dir() {
            return Err(StoreError::NotFound);
        }

        self.collection(name)
    }

    fn collection(&self, name: &str) -> Result<Arc<AsyncMutex<Collection>>, StoreError> {
        validate_collection_name(name)?;

        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let entry = collections.entry(name.to_string()).or_insert_with(|| {
            Arc::new(AsyncMutex::new(Collection {
                dir: self.root.join(name),
                next_id: None,
            }))
        });

        Ok(Arc::clone(entry))
    }
}

/// Collection names map straight onto directory names, so only a
/// conservative character set is accepted.
pub fn validate_collection_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_COLLECTION_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

/// Parses a record file name. Only plain positive decimal numbers count.
fn parse_record_id(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok().filter(|id| *id > 0)
}

async fn read_ids(dir: &Path) -> std::io::Result<Vec<u64>> {
    let mut ids = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(id) = entry.file_name().to_str().and_then(parse_record_id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

/// `max(max existing id + 1, persisted high-water mark, 1)`.
async fn derive_next_id(dir: &Path) -> std::io::Result<u64> {
    let from_records = read_ids(dir)
        .await?
        .into_iter()
        .max()
        .map_or(1, |max| max + 1);

    let from_counter = match tokio::fs::read_to_string(dir.join(COUNTER_FILE)).await {
        Ok(s) => s.trim().parse::<u64>().unwrap_or(1),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 1,
        Err(e) => return Err(e),
    };

    Ok(from_records.max(from_counter))
}

async fn write_atomic(dir: &Path, name: &str, contents: &[u8]) -> std::io::Result<()> {
    let tmp = dir.join(format!(".{name}.tmp"));

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp, dir.join(name)).await
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
