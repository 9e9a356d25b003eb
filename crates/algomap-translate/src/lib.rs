//! Source-to-IR translation for AlgoMap.
//!
//! # Modules
//!
//! - [`extract`], [`syntax`]: line scanning, call extraction and the
//!   tree-sitter Python grammar
//! - [`translator`], [`translators`]: the [`Translator`] contract and one
//!   simulator per family, plus the universal fallback
//! - [`dispatch`]: alias resolution, routing and escalation
//! - [`postprocess`]: normalization, compression, learned actions, merging
//! - [`collaborator`], [`lenient`]: classifier and reconstruction services
//!   and tolerant decoding of their replies
//! - [`detect`], [`check`]: local concept detection and admission

pub mod check;
pub mod collaborator;
pub mod detect;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod lenient;
pub mod postprocess;
pub mod syntax;
pub mod translator;
pub mod translators;

pub use check::{admit, Admission, Category};
pub use collaborator::{
    Classification, Classifier, ClassifierChain, LanguageModel, ModelClassifier,
    ModelReconstructor, Reconstructor, Scope,
};
pub use detect::HeuristicClassifier;
pub use dispatch::{resolve_alias, route, DispatchConfig, Dispatcher};
pub use error::{CollaboratorError, TranslateError};
pub use translator::{Outcome, Translator};
