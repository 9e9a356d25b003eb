//! The adaptive-memory record: one rated translation of one piece of code.

use algomap_core::{Concept, Meta, Step, Translation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::hash::pattern_hash;

/// Highest rating a user can give.
pub const MAX_RATING: u8 = 5;

/// One line of a per-concept memory log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub pattern_hash: String,
    pub concept: String,
    #[serde(alias = "ir")]
    pub steps: Vec<Step>,
    #[serde(default, deserialize_with = "lenient_meta")]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub rating: u8,
    pub code: String,
    pub learned_at: DateTime<Utc>,
}

/// Older logs hold partial or empty meta objects; those load as `None`.
fn lenient_meta<'de, D>(deserializer: D) -> Result<Option<Meta>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl MemoryRecord {
    pub fn new(concept: &Concept, code: &str, translation: &Translation, rating: u8) -> Self {
        MemoryRecord {
            pattern_hash: pattern_hash(code),
            concept: concept.to_string(),
            steps: translation.steps.clone(),
            meta: Some(translation.meta.clone()),
            rating,
            code: code.to_string(),
            learned_at: Utc::now(),
        }
    }

    /// The stored translation; records without meta get the default meta
    /// for their concept.
    pub fn translation(&self) -> Translation {
        let meta = self
            .meta
            .clone()
            .unwrap_or_else(|| Meta::new(Concept::parse(&self.concept)));
        Translation::new(self.steps.clone(), meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_legacy_line_with_ir_and_empty_meta() {
        let line = r#"{"pattern_hash":"abc","concept":"stack","ir":[{"action":"push","description":"Push 1"}],"rating":4,"meta":{},"code":"s.push(1)","learned_at":"2025-01-01T00:00:00Z"}"#;
        let record: MemoryRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.steps.len(), 1);
        assert!(record.meta.is_none());
        assert_eq!(record.translation().meta.kind, Concept::Stack);
    }
}
