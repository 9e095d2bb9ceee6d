//! File-backed revision log.
//!
//! Each aggregate's set lives in `<dir>/<aggregate>.json` using the persisted
//! record shape (`aggregateId`, `aggregateCollection`, `entries`). Writes go
//! to a temporary file in the same directory which then replaces the target,
//! so a crash leaves either the old or the new set on disk, never a torn one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use revlog_types::{AggregateId, NewRevision, RevisionEntry, RevisionSet, Sequence};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{LogError, LogResult};
use crate::traits::RevisionLog;

const EXTENSION: &str = "json";

/// [`RevisionLog`] storing one JSON file per aggregate.
///
/// A process-wide mutex serializes read-modify-write cycles, which keeps
/// sequence assignment atomic within the process.
#[derive(Debug)]
pub struct FileRevisionLog {
    dir: PathBuf,
    guard: Mutex<()>,
}

impl FileRevisionLog {
    /// Open (or create) a log rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> LogResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            guard: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, aggregate: &AggregateId) -> PathBuf {
        self.dir
            .join(format!("{}.{EXTENSION}", file_stem(aggregate.as_str())))
    }

    fn load(&self, aggregate: &AggregateId) -> LogResult<Option<RevisionSet>> {
        load_path(&self.path_for(aggregate))
    }

    fn store(&self, set: &RevisionSet) -> LogResult<()> {
        let json = serde_json::to_vec_pretty(set)
            .map_err(|e| LogError::Serialization(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(&set.aggregate_id))
            .map_err(|e| LogError::Io(e.error))?;
        Ok(())
    }

    fn exclusive(&self) -> LogResult<std::sync::MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| LogError::Unavailable("revision log file lock poisoned".into()))
    }
}

impl RevisionLog for FileRevisionLog {
    fn append(
        &self,
        aggregate: &AggregateId,
        collection: &str,
        revision: NewRevision,
    ) -> LogResult<RevisionEntry> {
        let _guard = self.exclusive()?;
        let mut set = self
            .load(aggregate)?
            .unwrap_or_else(|| RevisionSet::new(aggregate.clone(), collection));
        let entry = set.append(revision);
        self.store(&set)?;
        debug!(aggregate = %aggregate, sequence = entry.sequence, "persisted revision");
        Ok(entry)
    }

    fn read(&self, aggregate: &AggregateId) -> LogResult<Option<RevisionSet>> {
        let _guard = self.exclusive()?;
        self.load(aggregate)
    }

    fn truncate_from(&self, aggregate: &AggregateId, from: Sequence) -> LogResult<usize> {
        let _guard = self.exclusive()?;
        let mut set = self
            .load(aggregate)?
            .ok_or_else(|| LogError::NotFound(aggregate.to_string()))?;
        let removed = set.truncate_from(from);
        if removed > 0 {
            self.store(&set)?;
        }
        Ok(removed)
    }

    fn destroy(&self, aggregate: &AggregateId) -> LogResult<bool> {
        let _guard = self.exclusive()?;
        match fs::remove_file(self.path_for(aggregate)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn aggregates(&self) -> LogResult<Vec<AggregateId>> {
        let _guard = self.exclusive()?;
        let mut ids = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(set) = load_path(&path)? {
                ids.push(set.aggregate_id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

fn load_path(path: &Path) -> LogResult<Option<RevisionSet>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let set: RevisionSet = serde_json::from_slice(&bytes).map_err(|e| LogError::Corrupt {
        aggregate: path.display().to_string(),
        reason: e.to_string(),
    })?;
    set.validate()
        .map_err(|e| LogError::corrupt(&set.aggregate_id, e))?;
    Ok(Some(set))
}

/// Escape an id into a portable file stem.
fn file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => stem.push(byte as char),
            other => stem.push_str(&format!("%{other:02X}")),
        }
    }
    stem
}
