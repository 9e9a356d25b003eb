pub mod concept;
pub mod error;
pub mod ir;
pub mod literal;

// Re-export commonly used types
pub use concept::{
    Animator, Concept, Family, GraphKind, ListKind, QueueKind, SearchKind, SortKind, TreeKind,
};
pub use error::CoreError;
pub use ir::{Layout, Meta, Step, Translation};
pub use literal::Literal;
