//! In-memory implementation of [`MemoryStore`] and [`ActionCache`].
//!
//! Used by tests and by CLI runs with `ALGOMAP_MEMORY_BACKEND=memory`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::Mutex;

use crate::error::StorageError;
use crate::record::MemoryRecord;
use crate::traits::{ActionCache, MemoryStore};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, Vec<MemoryRecord>>>,
    actions: Mutex<BTreeMap<String, BTreeSet<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all concepts.
    pub fn len(&self) -> usize {
        self.records.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MemoryStore for InMemoryStore {
    fn append(&self, record: &MemoryRecord) -> Result<(), StorageError> {
        self.records
            .lock()
            .entry(record.concept.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn records(&self, concept: &str) -> Result<Vec<MemoryRecord>, StorageError> {
        Ok(self.records.lock().get(concept).cloned().unwrap_or_default())
    }
}

impl ActionCache for InMemoryStore {
    fn learned(&self, concept: &str) -> Result<BTreeSet<String>, StorageError> {
        Ok(self.actions.lock().get(concept).cloned().unwrap_or_default())
    }

    fn learn(
        &self,
        concept: &str,
        actions: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StorageError> {
        let mut guard = self.actions.lock();
        let known = guard.entry(concept.to_string()).or_default();
        let added: BTreeSet<String> = actions.difference(known).cloned().collect();
        known.extend(added.iter().cloned());
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algomap_core::{Concept, Translation};

    #[test]
    fn records_are_partitioned_by_concept() {
        let store = InMemoryStore::new();
        let t = Translation::note(Concept::Stack, "x");
        store.append(&MemoryRecord::new(&Concept::Stack, "a", &t, 4)).unwrap();
        assert_eq!(store.records("stack").unwrap().len(), 1);
        assert!(store.records("queue-linear").unwrap().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn learn_reports_only_new_actions() {
        let store = InMemoryStore::new();
        let set = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
        assert_eq!(store.learn("stack", &set(&["push", "pop"])).unwrap(), set(&["pop", "push"]));
        assert_eq!(store.learn("stack", &set(&["pop", "peek"])).unwrap(), set(&["peek"]));
        assert_eq!(store.learned("stack").unwrap().len(), 3);
    }
}
