//! The record store.
//!
//! [`RecordStore`] owns the canonical collection of records, mirrors it to a
//! single JSON file after every mutation, and publishes each new state to
//! subscribers through a watch channel.

pub mod persist;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::record::Record;

/// An immutable view of the collection at one point in time.
pub type Snapshot = Arc<Vec<Record>>;

/// What to do with in-memory state when the file write fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Keep the mutation in memory and notify subscribers anyway.
    #[default]
    Lenient,
    /// Discard the mutation; memory only changes once the file does.
    Strict,
}

/// Owner of the record collection and its file.
///
/// All mutation goes through `&mut self`, so there is exactly one writer.
/// Readers either borrow the current slice or hold a [`Snapshot`].
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    policy: WritePolicy,
    records: Snapshot,
    updates: watch::Sender<Snapshot>,
}

impl RecordStore {
    /// Open the store backed by `path`, loading whatever it holds.
    ///
    /// Never fails: an absent or unreadable file yields an empty store.
    #[must_use]
    pub fn open(path: impl AsRef<Path>, policy: WritePolicy) -> Self {
        let path = path.as_ref().to_path_buf();
        let records: Snapshot = Arc::new(Self::load(&path));
        let (updates, _) = watch::channel(Arc::clone(&records));
        info!(
            path = %path.display(),
            count = records.len(),
            ?policy,
            "Record store opened"
        );
        Self {
            path,
            policy,
            records,
            updates,
        }
    }

    /// Read the collection stored at `path`.
    ///
    /// Missing files, unreadable bytes and undecodable contents all produce
    /// an empty collection; the cause is logged.
    #[must_use]
    pub fn load(path: &Path) -> Vec<Record> {
        match persist::read_records(path) {
            Ok(records) => records,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No saved records, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load records, starting empty");
                Vec::new()
            }
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The active write policy.
    #[must_use]
    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// The current collection in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// An owned copy of the current collection in insertion order.
    #[must_use]
    pub fn get_all(&self) -> Vec<Record> {
        self.records.as_ref().clone()
    }

    /// A shared handle to the current collection.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.records)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Position of the record with `id` in insertion order.
    #[must_use]
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Records whose name matches `query`, in list order.
    #[must_use]
    pub fn matching(&self, query: &str) -> Vec<Record> {
        self.matching_positions(query)
            .into_iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Like [`matching`](Self::matching), paired with each record's position
    /// in insertion order so callers can address it for removal.
    #[must_use]
    pub fn matching_positions(&self, query: &str) -> Vec<(usize, &Record)> {
        let mut found: Vec<(usize, &Record)> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.matches(query))
            .collect();
        found.sort_by(|(_, a), (_, b)| a.display_cmp(b));
        found
    }

    /// Receive every committed state, starting with the current one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    /// Add a record to the end of the collection and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be encoded or the file could
    /// not be written. Under [`WritePolicy::Lenient`] the record has still
    /// been added.
    pub fn append(&mut self, record: Record) -> Result<()> {
        debug!(id = %record.id, name = %record.name, "Appending record");
        let mut next = self.get_all();
        next.push(record);
        self.commit(next)
    }

    /// Remove the records at `positions` and persist.
    ///
    /// Positions index the collection as it is when the call is made.
    /// Out-of-range positions are skipped. If nothing is removed the file is
    /// not rewritten and no update is published.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be encoded or the file could
    /// not be written. Under [`WritePolicy::Lenient`] the records have still
    /// been removed.
    pub fn remove_at(&mut self, positions: &BTreeSet<usize>) -> Result<()> {
        let len = self.records.len();
        if let Some(&max) = positions.last() {
            if max >= len {
                warn!(len, ?positions, "Ignoring out-of-range positions");
            }
        }

        let next: Vec<Record> = self
            .records
            .iter()
            .enumerate()
            .filter(|(i, _)| !positions.contains(i))
            .map(|(_, r)| r.clone())
            .collect();

        if next.len() == len {
            debug!("No records matched the given positions");
            return Ok(());
        }
        debug!(removed = len - next.len(), "Removing records by position");
        self.commit(next)
    }

    /// Remove the record with `id` and persist.
    ///
    /// Removing an id that is not present does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be encoded or the file could
    /// not be written. Under [`WritePolicy::Lenient`] the record has still
    /// been removed.
    pub fn remove_by_id(&mut self, id: Uuid) -> Result<()> {
        let Some(position) = self.position(id) else {
            debug!(%id, "No record with this id, nothing to remove");
            return Ok(());
        };
        self.remove_at(&BTreeSet::from([position]))
    }

    /// Summary of the collection and its file.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let metadata = std::fs::metadata(&self.path).ok();
        StoreStats {
            total_records: self.records.len(),
            with_photo: self.records.iter().filter(|r| r.has_photo()).count(),
            file_size_bytes: metadata.as_ref().map_or(0, std::fs::Metadata::len),
            last_persisted: metadata
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
        }
    }

    fn commit(&mut self, next: Vec<Record>) -> Result<()> {
        match persist::write_records(&self.path, &next) {
            Ok(()) => {
                self.publish(next);
                Ok(())
            }
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    policy = ?self.policy,
                    "Failed to save records"
                );
                if self.policy == WritePolicy::Lenient {
                    self.publish(next);
                }
                Err(e)
            }
        }
    }

    fn publish(&mut self, next: Vec<Record>) {
        self.records = Arc::new(next);
        self.updates.send_replace(Arc::clone(&self.records));
    }
}

/// Summary statistics for a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of records held.
    pub total_records: usize,
    /// Number of records carrying a photo.
    pub with_photo: usize,
    /// Size of the backing file in bytes, 0 if absent.
    pub file_size_bytes: u64,
    /// Modification time of the backing file.
    pub last_persisted: Option<DateTime<Utc>>,
}
