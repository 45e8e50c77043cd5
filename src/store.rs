// src/store.rs
//! Version store: per-source `{current, prev}` with JSON persistence.
//!
//! The one piece of state shared between overlapping cycles and the HTTP
//! query path. All mutation funnels through [`VersionStore::apply`]; a
//! whole cycle's results go through [`VersionStore::apply_all`] under a
//! single write-lock acquisition, so readers never observe a partially
//! applied cycle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::adapter::ExtractionResult;
use crate::error::Result;
use crate::source::SourceId;

/// Current and immediately-preceding observed version of one source.
///
/// Both fields are non-empty once a source has been observed; on first
/// observation they are equal, which is how the dashboard knows there is
/// no change to highlight yet. The wire name `prev` is the dashboard
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub current: String,
    #[serde(rename = "prev")]
    pub previous: String,
}

/// Full mapping `SourceId → VersionRecord`, persisted as one JSON document.
pub struct VersionStore {
    records: RwLock<BTreeMap<SourceId, VersionRecord>>,
    path: PathBuf,
    /// At most one in-flight save; overlapping cycles must not interleave
    /// writes to the state file.
    save_lock: tokio::sync::Mutex<()>,
}

impl VersionStore {
    /// Open the store backed by `path`, loading persisted state if any.
    /// A missing file is an empty store, not an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = Self::load(&path)?;
        Ok(Self {
            records: RwLock::new(records),
            path,
            save_lock: tokio::sync::Mutex::new(()),
        })
    }

    fn load(path: &Path) -> Result<BTreeMap<SourceId, VersionRecord>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply one extraction result. Returns whether the record changed.
    ///
    /// - Failure: no mutation; known-good history is never erased by a
    ///   transient scrape failure, and no record is created for an
    ///   unseen source.
    /// - First successful observation: `{current: v, prev: v}`.
    /// - Changed value: `prev = current`, then `current = v`.
    /// - Repeated identical value: no mutation; `prev` only advances on
    ///   an actual change.
    pub fn apply(&self, id: &SourceId, result: &ExtractionResult) -> bool {
        let mut records = self.records.write().expect("store rwlock poisoned");
        Self::apply_locked(&mut records, id, result)
    }

    /// Apply a whole cycle's results under one lock acquisition.
    /// Returns the number of records that changed.
    pub fn apply_all(&self, results: &[(SourceId, ExtractionResult)]) -> usize {
        let mut records = self.records.write().expect("store rwlock poisoned");
        results
            .iter()
            .filter(|(id, result)| Self::apply_locked(&mut records, id, result))
            .count()
    }

    fn apply_locked(
        records: &mut BTreeMap<SourceId, VersionRecord>,
        id: &SourceId,
        result: &ExtractionResult,
    ) -> bool {
        let Some(version) = result.version() else {
            return false;
        };
        match records.get_mut(id) {
            None => {
                records.insert(
                    id.clone(),
                    VersionRecord {
                        current: version.to_string(),
                        previous: version.to_string(),
                    },
                );
                true
            }
            Some(record) if record.current != version => {
                record.previous = std::mem::replace(&mut record.current, version.to_string());
                true
            }
            Some(_) => false,
        }
    }

    /// Read-only copy of the full mapping, safe concurrently with mutation.
    pub fn snapshot(&self) -> BTreeMap<SourceId, VersionRecord> {
        self.records.read().expect("store rwlock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("store rwlock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist the full mapping as one document: write a temp file, then
    /// rename over the target. Saves from overlapping cycles serialize on
    /// an async mutex.
    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        let snapshot = self.snapshot();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
