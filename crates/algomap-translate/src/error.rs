//! Error types for translation and for external collaborators.
//!
//! Translator errors never cross the dispatch boundary: the router turns
//! them into [`Outcome::ParseFailed`](crate::translator::Outcome) and
//! escalates. Collaborator errors are likewise absorbed into `note` steps.

use thiserror::Error;

/// Errors raised while simulating a single family translator.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The source did not contain the structure the translator needs
    /// (no adjacency map, no parsable tree).
    #[error("{family}: {reason}")]
    Parse { family: &'static str, reason: String },

    /// The Python grammar could not be loaded into the parser.
    #[error("grammar unavailable: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),
}

/// Errors reported by an external classifier, model or reconstruction
/// service.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// No collaborator was configured for this call.
    #[error("collaborator not configured")]
    Unavailable,

    /// The remote call failed (transport, status, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// The response could not be decoded into the expected shape.
    #[error("undecodable response: {0}")]
    Decode(String),

    /// Every key in the pool was tried and all failed.
    #[error("all {attempts} attempts failed; last error: {last}")]
    Exhausted { attempts: usize, last: String },
}
