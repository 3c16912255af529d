use super::record::VideoRecord;
use crate::error::{IngestError, Result};
use crate::tools::write_atomic;
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Persistence contract for video records.
///
/// Each call is one atomic load-modify-save from the caller's point of view.
/// Nothing is guaranteed across calls; callers that need a multi-step
/// sequence to be exclusive hold their own lock around it.
pub trait VideoStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<VideoRecord>>;

    /// Inserts or replaces.
    fn put(&self, record: VideoRecord) -> Result<()>;

    /// Inserts only if `record.id` is unused; otherwise [`IngestError::Conflict`].
    fn insert(&self, record: VideoRecord) -> Result<()>;

    /// Removes and returns the record, or [`IngestError::NotFound`].
    fn delete(&self, id: &str) -> Result<VideoRecord>;

    /// All records ordered by id.
    fn list_all(&self) -> Result<Vec<VideoRecord>>;

    /// Applies `change` to the stored record and saves it, in one step.
    fn update(
        &self,
        id: &str,
        change: &mut dyn FnMut(&mut VideoRecord),
    ) -> Result<VideoRecord>;
}

/// Convenience mutations built on [`VideoStore::update`].
pub trait VideoStoreExt: VideoStore {
    fn update_file_path(&self, id: &str, file_path: &str) -> Result<VideoRecord> {
        self.update(id, &mut |record| record.file_path = file_path.to_string())
    }

    /// Returns whether the tag was new.
    fn add_tag(&self, id: &str, tag: &str) -> Result<bool> {
        let mut added = false;
        self.update(id, &mut |record| added = record.add_tag(tag))?;
        Ok(added)
    }

    /// Returns whether a tag was removed.
    fn remove_tag(&self, id: &str, tag: &str) -> Result<bool> {
        let mut removed = false;
        self.update(id, &mut |record| removed = record.remove_tag(tag))?;
        Ok(removed)
    }

    fn set_rating(&self, id: &str, rating: f64) -> Result<VideoRecord> {
        if !rating.is_finite() || rating < 0.0 {
            return Err(IngestError::Invalid(format!("rating {rating}")));
        }
        self.update(id, &mut |record| record.rating = rating)
    }

    fn set_description(&self, id: &str, description: &str) -> Result<VideoRecord> {
        self.update(id, &mut |record| {
            record.description = description.trim().to_string();
        })
    }

    fn increment_views(&self, id: &str) -> Result<u64> {
        let record = self.update(id, &mut |record| record.views += 1)?;
        Ok(record.views)
    }
}

impl<T: VideoStore + ?Sized> VideoStoreExt for T {}

type RecordMap = BTreeMap<String, VideoRecord>;

/// Records kept as one pretty-printed JSON object keyed by id.
///
/// A single mutex spans every load-modify-save so concurrent callers in this
/// process never lose each other's writes; the file itself is replaced
/// atomically.
#[derive(Debug)]
pub struct JsonVideoStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonVideoStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<RecordMap> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RecordMap::new()),
            Err(e) => return Err(IngestError::io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(RecordMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            IngestError::Storage(format!("cannot parse {}: {e}", self.path.display()))
        })
    }

    fn save(&self, records: &RecordMap) -> Result<()> {
        let content = serde_json::to_string_pretty(records)
            .map_err(|e| IngestError::Storage(format!("cannot serialize records: {e}")))?;
        write_atomic(&self.path, content.as_bytes())?;
        debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Runs one load-modify-save cycle under the store lock. The file is only
    /// rewritten when `change` reports a modification.
    fn transact<T>(&self, change: impl FnOnce(&mut RecordMap) -> Result<(T, bool)>) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.load()?;
        let (value, modified) = change(&mut records)?;
        if modified {
            self.save(&records)?;
        }
        Ok(value)
    }
}

impl VideoStore for JsonVideoStore {
    fn get(&self, id: &str) -> Result<Option<VideoRecord>> {
        self.transact(|records| Ok((records.get(id).cloned(), false)))
    }

    fn put(&self, record: VideoRecord) -> Result<()> {
        self.transact(|records| {
            records.insert(record.id.clone(), record);
            Ok(((), true))
        })
    }

    fn insert(&self, record: VideoRecord) -> Result<()> {
        self.transact(|records| {
            if records.contains_key(&record.id) {
                return Err(IngestError::Conflict(format!(
                    "video {} is already registered",
                    record.id
                )));
            }
            records.insert(record.id.clone(), record);
            Ok(((), true))
        })
    }

    fn delete(&self, id: &str) -> Result<VideoRecord> {
        self.transact(|records| {
            let removed = records
                .remove(id)
                .ok_or_else(|| IngestError::NotFound(format!("video {id}")))?;
            Ok((removed, true))
        })
    }

    fn list_all(&self) -> Result<Vec<VideoRecord>> {
        self.transact(|records| Ok((records.values().cloned().collect(), false)))
    }

    fn update(
        &self,
        id: &str,
        change: &mut dyn FnMut(&mut VideoRecord),
    ) -> Result<VideoRecord> {
        self.transact(|records| {
            let record = records
                .get_mut(id)
                .ok_or_else(|| IngestError::NotFound(format!("video {id}")))?;
            change(record);
            // The id is the key; a closure must not be able to rename it.
            record.id = id.to_string();
            Ok((record.clone(), true))
        })
    }
}
