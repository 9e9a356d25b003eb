//! The translator contract shared by every family.

use algomap_core::{Concept, Translation};

use crate::error::TranslateError;

/// Result kind of one translator call. The router inspects this to decide
/// whether to escalate.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Enough steps were produced.
    Complete(Translation),
    /// The simulation ran but produced fewer than `minimum` substantive steps.
    Insufficient { partial: Translation, minimum: usize },
    /// The source could not be modelled at all.
    ParseFailed { reason: String },
}

impl Outcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete(_))
    }

    /// The translation produced, complete or partial.
    pub fn translation(&self) -> Option<&Translation> {
        match self {
            Outcome::Complete(t) | Outcome::Insufficient { partial: t, .. } => Some(t),
            Outcome::ParseFailed { .. } => None,
        }
    }

    pub fn into_translation(self) -> Option<Translation> {
        match self {
            Outcome::Complete(t) | Outcome::Insufficient { partial: t, .. } => Some(t),
            Outcome::ParseFailed { .. } => None,
        }
    }
}

/// A deterministic, family-specific simulator turning source text into IR.
///
/// Implementors only write [`simulate`](Translator::simulate); the provided
/// [`translate`](Translator::translate) classifies the result against
/// [`min_steps`](Translator::min_steps).
pub trait Translator {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fewest substantive steps for a result to count as complete.
    fn min_steps(&self) -> usize {
        2
    }

    /// Runs the simulation. Unparsable lines are skipped; an error means the
    /// source held nothing this translator can model.
    fn simulate(&self, code: &str, concept: &Concept) -> Result<Translation, TranslateError>;

    fn translate(&self, code: &str, concept: &Concept) -> Outcome {
        match self.simulate(code, concept) {
            Ok(translation) if translation.substantive_len() >= self.min_steps() => {
                Outcome::Complete(translation)
            }
            Ok(partial) => Outcome::Insufficient {
                partial,
                minimum: self.min_steps(),
            },
            Err(err) => Outcome::ParseFailed {
                reason: err.to_string(),
            },
        }
    }
}
