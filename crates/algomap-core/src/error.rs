//! Core error types for algomap-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of literal parsing and IR payload decoding.

use thiserror::Error;

/// Core errors produced by the algomap-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A Python literal could not be parsed.
    #[error("invalid literal at offset {offset}: {reason}")]
    InvalidLiteral { offset: usize, reason: String },

    /// A translation payload did not have the `{steps, meta}` shape.
    #[error("malformed translation payload: {reason}")]
    MalformedPayload { reason: String },

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
