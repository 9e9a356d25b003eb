//! CLI configuration.
//!
//! Every setting is a global flag with an `ALGOMAP_*` environment fallback.
//! A `.env` file in the working directory is loaded before parsing.

use std::path::PathBuf;
use std::time::Duration;

use algomap_storage::{
    ActionCache, InMemoryStore, JsonlStore, MemoryStore, SqliteStore, DEFAULT_MIN_RATING,
};
use algomap_translate::DispatchConfig;
use clap::{Args, ValueEnum};
use tracing::debug;

use crate::error::CliError;
use crate::llm_provider::OpenAiProvider;

/// SQLite file created inside the memory directory.
const SQLITE_FILE: &str = "memory.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Jsonl,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Directory holding the adaptive memory.
    #[arg(long, global = true, env = "ALGOMAP_MEMORY_DIR", default_value = "./adaptive_memory")]
    pub memory_dir: PathBuf,

    /// Memory backend.
    #[arg(
        long,
        global = true,
        env = "ALGOMAP_MEMORY_BACKEND",
        value_enum,
        default_value_t = Backend::Jsonl
    )]
    pub memory_backend: Backend,

    /// Lowest rating a stored translation needs to be reused.
    #[arg(long, global = true, env = "ALGOMAP_MIN_RATING", default_value_t = DEFAULT_MIN_RATING)]
    pub min_rating: u8,

    /// Base URL of an OpenAI-compatible API.
    #[arg(
        long,
        global = true,
        env = "ALGOMAP_LLM_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    pub llm_base_url: String,

    #[arg(long, global = true, env = "ALGOMAP_LLM_MODEL", default_value = "gpt-4o-mini")]
    pub llm_model: String,

    /// Comma-separated API keys, tried in turn. Without keys everything
    /// runs locally.
    #[arg(
        long,
        global = true,
        env = "ALGOMAP_LLM_KEYS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub llm_keys: Vec<String>,

    #[arg(long, global = true, env = "ALGOMAP_LLM_TIMEOUT_SECS", default_value_t = 30)]
    pub llm_timeout_secs: u64,
}

/// An opened memory backend; serves both adaptive memory and the
/// learned-action cache.
pub enum Store {
    Memory(InMemoryStore),
    Jsonl(JsonlStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory(&self) -> &dyn MemoryStore {
        match self {
            Store::Memory(s) => s,
            Store::Jsonl(s) => s,
            Store::Sqlite(s) => s,
        }
    }

    pub fn actions(&self) -> &dyn ActionCache {
        match self {
            Store::Memory(s) => s,
            Store::Jsonl(s) => s,
            Store::Sqlite(s) => s,
        }
    }
}

impl Settings {
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            min_rating: self.min_rating,
            ..DispatchConfig::default()
        }
    }

    pub fn open_store(&self) -> Result<Store, CliError> {
        debug!(backend = ?self.memory_backend, dir = %self.memory_dir.display(), "opening memory");
        Ok(match self.memory_backend {
            Backend::Memory => Store::Memory(InMemoryStore::new()),
            Backend::Jsonl => Store::Jsonl(JsonlStore::open(&self.memory_dir)?),
            Backend::Sqlite => {
                std::fs::create_dir_all(&self.memory_dir)
                    .map_err(algomap_storage::StorageError::from)?;
                let path = self.memory_dir.join(SQLITE_FILE);
                Store::Sqlite(SqliteStore::new(&path.to_string_lossy())?)
            }
        })
    }

    /// The language model, when at least one key is configured.
    pub fn provider(&self) -> Result<Option<OpenAiProvider>, CliError> {
        let keys: Vec<String> = self
            .llm_keys
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Ok(None);
        }
        let provider = OpenAiProvider::new(
            &self.llm_base_url,
            &self.llm_model,
            keys,
            Duration::from_secs(self.llm_timeout_secs),
        )?;
        Ok(Some(provider))
    }
}
