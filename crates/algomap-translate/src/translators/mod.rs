//! Structural translators, one per concept family, plus the universal
//! fallback.

pub mod btree;
pub mod graph;
pub mod linked_list;
pub mod queue;
pub mod sort;
pub mod stack;
pub mod tree;
pub mod universal;

pub use btree::BTreeTranslator;
pub use graph::GraphTranslator;
pub use linked_list::LinkedListTranslator;
pub use queue::QueueTranslator;
pub use sort::SortTranslator;
pub use stack::StackTranslator;
pub use tree::TreeTranslator;
pub use universal::UniversalTranslator;
