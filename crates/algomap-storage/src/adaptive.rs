//! Adaptive memory: rated translations reused for identical or similar code.
//!
//! Lookups first try an exact content-hash match and then the most similar
//! stored code. Only records rated at or above `min_rating` are candidates
//! for either path.

use algomap_core::{Concept, Translation};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::hash::pattern_hash;
use crate::record::{MemoryRecord, MAX_RATING};
use crate::similarity;
use crate::traits::MemoryStore;

/// Default minimum rating for reuse.
pub const DEFAULT_MIN_RATING: u8 = 3;

/// How a cached translation was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Exact,
    Similar(f64),
}

#[derive(Debug, Clone)]
pub struct MemoryHit {
    pub record: MemoryRecord,
    pub kind: MatchKind,
}

pub struct AdaptiveMemory<'s> {
    store: &'s dyn MemoryStore,
    min_rating: u8,
}

impl<'s> AdaptiveMemory<'s> {
    pub fn new(store: &'s dyn MemoryStore) -> Self {
        Self {
            store,
            min_rating: DEFAULT_MIN_RATING,
        }
    }

    pub fn with_min_rating(mut self, min_rating: u8) -> Self {
        self.min_rating = min_rating;
        self
    }

    pub fn min_rating(&self) -> u8 {
        self.min_rating
    }

    pub fn lookup_exact(
        &self,
        concept: &Concept,
        code: &str,
    ) -> Result<Option<MemoryHit>, StorageError> {
        let label = concept.to_string();
        let hit = self
            .store
            .find_exact(&label, &pattern_hash(code), self.min_rating)?
            .map(|record| MemoryHit {
                record,
                kind: MatchKind::Exact,
            });
        if hit.is_some() {
            info!(concept = %label, "adaptive memory exact hit");
        }
        Ok(hit)
    }

    /// Most similar stored code with similarity at least `floor`. Ties go
    /// to the older record.
    pub fn lookup_fuzzy(
        &self,
        concept: &Concept,
        code: &str,
        floor: f64,
    ) -> Result<Option<MemoryHit>, StorageError> {
        let label = concept.to_string();
        let mut best: Option<(MemoryRecord, f64)> = None;
        for record in self.store.records(&label)? {
            if record.rating < self.min_rating {
                continue;
            }
            let score = similarity::ratio(code, &record.code);
            if score >= floor && best.as_ref().map_or(true, |(_, b)| score > *b) {
                best = Some((record, score));
            }
        }
        let hit = best.map(|(record, score)| MemoryHit {
            record,
            kind: MatchKind::Similar(score),
        });
        match &hit {
            Some(MemoryHit { kind: MatchKind::Similar(score), .. }) => {
                info!(concept = %label, similarity = score, "adaptive memory similar hit")
            }
            _ => debug!(concept = %label, "adaptive memory miss"),
        }
        Ok(hit)
    }

    /// Exact match, then the best similar match.
    pub fn lookup(&self, concept: &Concept, code: &str) -> Result<Option<MemoryHit>, StorageError> {
        match self.lookup_exact(concept, code)? {
            Some(hit) => Ok(Some(hit)),
            None => self.lookup_fuzzy(concept, code, 0.0),
        }
    }

    pub fn store(
        &self,
        concept: &Concept,
        code: &str,
        translation: &Translation,
        rating: u8,
    ) -> Result<MemoryRecord, StorageError> {
        let record = MemoryRecord::new(concept, code, translation, rating);
        self.store.append(&record)?;
        Ok(record)
    }

    /// Stores a user-rated translation. Ratings run from 0 to 5.
    pub fn record_feedback(
        &self,
        concept: &Concept,
        code: &str,
        translation: &Translation,
        rating: u8,
    ) -> Result<MemoryRecord, StorageError> {
        if rating > MAX_RATING {
            return Err(StorageError::InvalidRecord {
                reason: format!("rating {rating} is above {MAX_RATING}"),
            });
        }
        if translation.steps.is_empty() {
            return Err(StorageError::InvalidRecord {
                reason: "translation has no steps".to_string(),
            });
        }
        self.store(concept, code, translation, rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use algomap_core::{Meta, Step};

    fn translation(desc: &str) -> Translation {
        Translation::new(vec![Step::new("push", desc)], Meta::new(Concept::Stack))
    }

    #[test]
    fn exact_hit_requires_rating() {
        let store = InMemoryStore::new();
        let memory = AdaptiveMemory::new(&store);
        memory.store(&Concept::Stack, "s.push(1)", &translation("low"), 2).unwrap();
        assert!(memory.lookup_exact(&Concept::Stack, "s.push(1)").unwrap().is_none());
        memory.store(&Concept::Stack, "s.push(1)", &translation("good"), 4).unwrap();
        let hit = memory.lookup_exact(&Concept::Stack, "s.push(1)").unwrap().unwrap();
        assert_eq!(hit.kind, MatchKind::Exact);
        assert_eq!(hit.record.steps[0].description, "good");
    }

    #[test]
    fn fuzzy_picks_most_similar_rated_record() {
        let store = InMemoryStore::new();
        let memory = AdaptiveMemory::new(&store);
        memory.store(&Concept::Stack, "s.push(1)\ns.pop()", &translation("near"), 5).unwrap();
        memory.store(&Concept::Stack, "print('unrelated')", &translation("far"), 5).unwrap();
        memory.store(&Concept::Stack, "s.push(2)\ns.pop()", &translation("unrated"), 1).unwrap();
        let hit = memory.lookup(&Concept::Stack, "s.push(2)\ns.pop()").unwrap().unwrap();
        assert_eq!(hit.record.steps[0].description, "near");
        assert!(matches!(hit.kind, MatchKind::Similar(s) if s > 0.8));
        assert!(memory
            .lookup_fuzzy(&Concept::Stack, "s.push(2)\ns.pop()", 0.99)
            .unwrap()
            .is_none());
    }

    #[test]
    fn feedback_validates_rating() {
        let store = InMemoryStore::new();
        let memory = AdaptiveMemory::new(&store);
        assert!(memory.record_feedback(&Concept::Stack, "x", &translation("a"), 6).is_err());
        assert!(memory.record_feedback(&Concept::Stack, "x", &translation("a"), 5).is_ok());
    }
}
