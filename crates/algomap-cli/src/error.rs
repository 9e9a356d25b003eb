//! CLI error type and its mapping onto process exit codes.

use algomap_core::CoreError;
use algomap_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// An input file could not be read.
    #[error("cannot read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An IR file did not decode.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The memory store failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// The HTTP client could not be built.
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),

    /// Output could not be serialized.
    #[error("cannot serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// 2 for bad input, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Read { .. }
            | CliError::Core(_)
            | CliError::Storage(StorageError::InvalidRecord { .. }) => 2,
            _ => 1,
        }
    }
}
