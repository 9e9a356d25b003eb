//! File-backed store: one JSON object per line, one file per concept.
//!
//! ```text
//! <dir>/stack.jsonl
//! <dir>/queue-circular.jsonl
//! <dir>/ir_actions.json      learned-action cache: {concept: [action, ...]}
//! <dir>/.lock                advisory lock shared by every process
//! ```
//!
//! Access runs under the store's mutex and an OS file lock on `.lock`, so
//! separate `algomap` processes sharing a directory serialize their
//! read-modify-write cycles. Log lines that fail to parse are skipped with a
//! warning. An unreadable action cache is an error and is never overwritten.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use fd_lock::RwLock;
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::record::MemoryRecord;
use crate::traits::{ActionCache, MemoryStore};

pub const ACTIONS_FILE: &str = "ir_actions.json";
const LOCK_FILE: &str = ".lock";

enum Access {
    Shared,
    Exclusive,
}

#[derive(Debug)]
pub struct JsonlStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonlStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Log path for a concept label. Characters outside `[A-Za-z0-9_-]`
    /// become `_` so free-form labels cannot escape the directory.
    pub fn log_path(&self, concept: &str) -> PathBuf {
        let name: String = concept
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let name = if name.is_empty() { "unknown".to_string() } else { name };
        self.dir.join(format!("{name}.jsonl"))
    }

    /// Runs `f` holding the in-process mutex and the directory's file lock.
    fn locked<T>(
        &self,
        access: Access,
        f: impl FnOnce() -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let _guard = self.lock.lock();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        let mut file_lock = RwLock::new(file);
        match access {
            Access::Shared => {
                let _held = file_lock.read()?;
                f()
            }
            Access::Exclusive => {
                let _held = file_lock.write()?;
                f()
            }
        }
    }

    fn read_actions(&self) -> Result<BTreeMap<String, BTreeSet<String>>, StorageError> {
        let path = self.dir.join(ACTIONS_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|err| {
                warn!(path = %path.display(), error = %err, "action cache unreadable");
                StorageError::from(err)
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_actions(
        &self,
        cache: &BTreeMap<String, BTreeSet<String>>,
    ) -> Result<(), StorageError> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(cache)?)?;
        tmp.persist(self.dir.join(ACTIONS_FILE)).map_err(|err| err.error)?;
        Ok(())
    }
}

impl MemoryStore for JsonlStore {
    fn append(&self, record: &MemoryRecord) -> Result<(), StorageError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let path = self.log_path(&record.concept);

        self.locked(Access::Exclusive, || {
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            file.write_all(line.as_bytes())?;
            Ok(())
        })?;
        debug!(
            concept = %record.concept,
            rating = record.rating,
            path = %path.display(),
            "memory record appended"
        );
        Ok(())
    }

    fn records(&self, concept: &str) -> Result<Vec<MemoryRecord>, StorageError> {
        let path = self.log_path(concept);
        self.locked(Access::Shared, || {
            let file = match fs::File::open(&path) {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(err) => return Err(err.into()),
            };

            let mut records = Vec::new();
            for (n, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<MemoryRecord>(&line) {
                    Ok(record) => records.push(record),
                    Err(err) => warn!(
                        concept,
                        line = n + 1,
                        error = %err,
                        "skipping corrupt memory record"
                    ),
                }
            }
            Ok(records)
        })
    }
}

impl ActionCache for JsonlStore {
    fn learned(&self, concept: &str) -> Result<BTreeSet<String>, StorageError> {
        self.locked(Access::Shared, || {
            Ok(self.read_actions()?.remove(concept).unwrap_or_default())
        })
    }

    fn learn(
        &self,
        concept: &str,
        actions: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StorageError> {
        let added = self.locked(Access::Exclusive, || {
            let mut cache = self.read_actions()?;
            let known = cache.entry(concept.to_string()).or_default();
            let added: BTreeSet<String> = actions.difference(known).cloned().collect();
            if !added.is_empty() {
                known.extend(added.iter().cloned());
                self.write_actions(&cache)?;
            }
            Ok(added)
        })?;
        if !added.is_empty() {
            debug!(concept, added = ?added, "learned new actions");
        }
        Ok(added)
    }
}
