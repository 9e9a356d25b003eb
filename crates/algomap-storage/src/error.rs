//! Storage error types for algomap-storage.

use thiserror::Error;

/// Errors produced by memory stores and the learned-action cache.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing a log file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A SQLite query failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    /// A record was rejected before being stored.
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },
}
