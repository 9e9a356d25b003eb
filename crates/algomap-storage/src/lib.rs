//! Persistence for AlgoMap: adaptive memory and the learned-action cache.
//!
//! # Modules
//!
//! - [`traits`]: the [`MemoryStore`] and [`ActionCache`] contracts
//! - [`record`]: the stored [`MemoryRecord`]
//! - [`adaptive`]: exact/similar lookup and feedback on top of a store
//! - [`memory`], [`jsonl`], [`sqlite`]: backends
//! - [`hash`], [`similarity`]: content hash and edit-similarity ratio

pub mod adaptive;
pub mod error;
pub mod hash;
pub mod jsonl;
pub mod memory;
pub mod record;
pub mod schema;
pub mod similarity;
pub mod sqlite;
pub mod traits;

pub use adaptive::{AdaptiveMemory, MatchKind, MemoryHit, DEFAULT_MIN_RATING};
pub use error::StorageError;
pub use hash::pattern_hash;
pub use jsonl::JsonlStore;
pub use memory::InMemoryStore;
pub use record::MemoryRecord;
pub use sqlite::SqliteStore;
pub use traits::{ActionCache, MemoryStore};
