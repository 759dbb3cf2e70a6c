use std::cmp::Reverse;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::persistence::{PersistenceError, SharedKeyValueStore, RECORDS_KEY, SETTINGS_KEY};

mod record;

pub use record::AnalysisRecord;

/// Number of records the home screen shows.
pub const RECENT_LIMIT: usize = 3;
/// Characters of report text shown on a history card.
pub const PREVIEW_CHARS: usize = 150;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("failed to encode analysis records: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("stored analysis records are malformed")]
    Malformed {
        #[source]
        source: serde_json::Error,
    },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    #[default]
    All,
    Favorites,
}

impl HistoryFilter {
    fn admits(self, record: &AnalysisRecord) -> bool {
        match self {
            Self::All => true,
            Self::Favorites => record.is_favorite,
        }
    }
}

/// Durable CRUD over the analysis history kept in a single serialized blob.
///
/// Every mutation is a read-modify-write of the whole collection; the write
/// lock serializes them so concurrent callers cannot lose updates.
///
/// Reads degrade to an empty history when the blob is unreadable. Mutations
/// instead fail with a [`StorageError`] and leave the stored blob untouched,
/// so a failed `add`, `set_favorite` or `delete` is a no-op on disk.
pub struct RecordStore {
    kv: SharedKeyValueStore,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(kv: SharedKeyValueStore) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    /// All records, most recent first. Unreadable data reads as empty.
    pub fn list_all(&self) -> Vec<AnalysisRecord> {
        let mut records = self.load_or_empty();
        sort_most_recent_first(&mut records);
        records
    }

    pub fn list_filtered(&self, filter: HistoryFilter) -> Vec<AnalysisRecord> {
        self.list_all()
            .into_iter()
            .filter(|record| filter.admits(record))
            .collect()
    }

    pub fn recent(&self, limit: usize) -> Vec<AnalysisRecord> {
        let mut records = self.list_all();
        records.truncate(limit);
        records
    }

    pub fn get(&self, id: &str) -> Option<AnalysisRecord> {
        self.load_or_empty()
            .into_iter()
            .find(|record| record.id == id)
    }

    pub fn add(&self, record: AnalysisRecord) -> StorageResult<()> {
        self.mutate(|records| {
            records.insert(0, record);
            true
        })?;
        Ok(())
    }

    /// Returns whether a record with `id` existed.
    pub fn set_favorite(&self, id: &str, value: bool) -> StorageResult<bool> {
        self.mutate(|records| {
            let mut found = false;
            for record in records.iter_mut().filter(|record| record.id == id) {
                record.is_favorite = value;
                found = true;
            }
            found
        })
    }

    /// Flips the favorite flag and returns the new value, or `None` if absent.
    pub fn toggle_favorite(&self, id: &str) -> StorageResult<Option<bool>> {
        let mut toggled = None;
        self.mutate(|records| {
            if let Some(record) = records.iter_mut().find(|record| record.id == id) {
                record.is_favorite = !record.is_favorite;
                toggled = Some(record.is_favorite);
            }
            toggled.is_some()
        })?;
        Ok(toggled)
    }

    /// Returns whether a record with `id` existed.
    pub fn delete(&self, id: &str) -> StorageResult<bool> {
        self.mutate(|records| {
            let before = records.len();
            records.retain(|record| record.id != id);
            records.len() != before
        })
    }

    /// Drops the whole history together with the settings blob.
    pub fn clear_all(&self) -> StorageResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.kv.remove_many(&[RECORDS_KEY, SETTINGS_KEY])?;
        tracing::info!("cleared analysis history and settings");
        Ok(())
    }

    fn mutate<F>(&self, apply: F) -> StorageResult<bool>
    where
        F: FnOnce(&mut Vec<AnalysisRecord>) -> bool,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.load()?.unwrap_or_default();
        if !apply(&mut records) {
            return Ok(false);
        }
        let serialized = serde_json::to_string(&records)?;
        self.kv.set(RECORDS_KEY, &serialized)?;
        Ok(true)
    }

    /// `None` when nothing has been stored yet.
    fn load(&self) -> StorageResult<Option<Vec<AnalysisRecord>>> {
        let Some(serialized) = self.kv.get(RECORDS_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&serialized)
            .map(Some)
            .map_err(|source| StorageError::Malformed { source })
    }

    fn load_or_empty(&self) -> Vec<AnalysisRecord> {
        self.load()
            .unwrap_or_else(|err| {
                tracing::warn!(?err, "failed to read analysis records; treating as empty");
                None
            })
            .unwrap_or_default()
    }
}

fn sort_most_recent_first(records: &mut [AnalysisRecord]) {
    records.sort_by_key(|record| Reverse(record.created_at));
}
