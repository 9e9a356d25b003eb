//! Storage contracts for adaptive memory and the learned-action cache.
//!
//! Both traits take `&self`: backends serialize their own writes, so a
//! single store can be shared by concurrent translation calls.

use std::collections::BTreeSet;

use crate::error::StorageError;
use crate::record::MemoryRecord;

/// Append-only log of rated translations, partitioned by concept.
pub trait MemoryStore {
    /// Appends one record to its concept's log.
    fn append(&self, record: &MemoryRecord) -> Result<(), StorageError>;

    /// All records stored for `concept`, oldest first.
    fn records(&self, concept: &str) -> Result<Vec<MemoryRecord>, StorageError>;

    /// First record for `concept` with the given hash and at least
    /// `min_rating`.
    fn find_exact(
        &self,
        concept: &str,
        hash: &str,
        min_rating: u8,
    ) -> Result<Option<MemoryRecord>, StorageError> {
        Ok(self
            .records(concept)?
            .into_iter()
            .find(|r| r.pattern_hash == hash && r.rating >= min_rating))
    }
}

/// Per-concept allow-list of action names learned from past runs.
pub trait ActionCache {
    fn learned(&self, concept: &str) -> Result<BTreeSet<String>, StorageError>;

    /// Adds `actions` to the concept's list and returns the ones that were
    /// not already known.
    fn learn(
        &self,
        concept: &str,
        actions: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StorageError>;
}
