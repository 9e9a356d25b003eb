//! SQLite implementation of [`MemoryStore`] and [`ActionCache`].
//!
//! Steps and meta are stored as JSON TEXT columns. Writes run inside a
//! transaction; the connection sits behind a mutex so the store can be
//! shared.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::StorageError;
use crate::record::MemoryRecord;
use crate::traits::{ActionCache, MemoryStore};

const RECORD_COLUMNS: &str = "pattern_hash, concept, steps, meta, rating, code, learned_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
        Ok(RawRecord {
            pattern_hash: row.get(0)?,
            concept: row.get(1)?,
            steps: row.get(2)?,
            meta: row.get(3)?,
            rating: row.get(4)?,
            code: row.get(5)?,
            learned_at: row.get(6)?,
        })
    }
}

/// A row as stored, before its JSON columns are decoded.
struct RawRecord {
    pattern_hash: String,
    concept: String,
    steps: String,
    meta: Option<String>,
    rating: u8,
    code: String,
    learned_at: String,
}

impl RawRecord {
    fn decode(self) -> Result<MemoryRecord, StorageError> {
        Ok(MemoryRecord {
            pattern_hash: self.pattern_hash,
            concept: self.concept,
            steps: serde_json::from_str(&self.steps)?,
            meta: self.meta.and_then(|m| serde_json::from_str(&m).ok()),
            rating: self.rating,
            code: self.code,
            learned_at: DateTime::parse_from_rfc3339(&self.learned_at)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_default(),
        })
    }
}

impl MemoryStore for SqliteStore {
    fn append(&self, record: &MemoryRecord) -> Result<(), StorageError> {
        let steps = serde_json::to_string(&record.steps)?;
        let meta = record.meta.as_ref().map(serde_json::to_string).transpose()?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO adaptive_records (pattern_hash, concept, steps, meta, rating, code, learned_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.pattern_hash,
                record.concept,
                steps,
                meta,
                record.rating,
                record.code,
                record.learned_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        debug!(concept = %record.concept, rating = record.rating, "memory record inserted");
        Ok(())
    }

    fn records(&self, concept: &str) -> Result<Vec<MemoryRecord>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM adaptive_records WHERE concept = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![concept], Self::row_to_raw)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRecord::decode).collect()
    }

    fn find_exact(
        &self,
        concept: &str,
        hash: &str,
        min_rating: u8,
    ) -> Result<Option<MemoryRecord>, StorageError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM adaptive_records
                     WHERE concept = ?1 AND pattern_hash = ?2 AND rating >= ?3
                     ORDER BY id LIMIT 1"
                ),
                params![concept, hash, min_rating],
                Self::row_to_raw,
            )
            .optional()?;
        raw.map(RawRecord::decode).transpose()
    }
}

impl ActionCache for SqliteStore {
    fn learned(&self, concept: &str) -> Result<BTreeSet<String>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT action FROM learned_actions WHERE concept = ?1")?;
        let actions = stmt
            .query_map(params![concept], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(actions)
    }

    fn learn(
        &self,
        concept: &str,
        actions: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StorageError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut added = BTreeSet::new();
        {
            let mut stmt =
                tx.prepare(
                    "INSERT OR IGNORE INTO learned_actions (concept, action) VALUES (?1, ?2)",
                )?;
            for action in actions {
                if stmt.execute(params![concept, action])? > 0 {
                    added.insert(action.clone());
                }
            }
        }
        tx.commit()?;
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algomap_core::{Concept, Meta, Step, Translation};

    fn record(code: &str, rating: u8) -> MemoryRecord {
        let t = Translation::new(vec![Step::new("push", "Push 1")], Meta::new(Concept::Stack));
        MemoryRecord::new(&Concept::Stack, code, &t, rating)
    }

    #[test]
    fn round_trips_records() {
        let store = SqliteStore::in_memory().unwrap();
        let r = record("s.push(1)", 4);
        store.append(&r).unwrap();
        let loaded = store.records("stack").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].steps, r.steps);
        assert_eq!(loaded[0].meta, r.meta);
        assert_eq!(loaded[0].pattern_hash, r.pattern_hash);
    }

    #[test]
    fn find_exact_respects_rating() {
        let store = SqliteStore::in_memory().unwrap();
        let low = record("s.push(1)", 2);
        store.append(&low).unwrap();
        assert!(store.find_exact("stack", &low.pattern_hash, 3).unwrap().is_none());
        store.append(&record("s.push(1)", 5)).unwrap();
        let hit = store.find_exact("stack", &low.pattern_hash, 3).unwrap().unwrap();
        assert_eq!(hit.rating, 5);
    }

    #[test]
    fn learn_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let actions: BTreeSet<String> = ["push".to_string(), "pop".to_string()].into();
        assert_eq!(store.learn("stack", &actions).unwrap().len(), 2);
        assert!(store.learn("stack", &actions).unwrap().is_empty());
        assert_eq!(store.learned("stack").unwrap(), actions);
    }
}
