//! Interfaces to the external services the router may lean on: a concept
//! classifier and an IR reconstruction service.
//!
//! Both are built on a single [`LanguageModel::ask`] capability so one
//! adapter (the CLI's HTTP provider, or a test double) serves both.

use algomap_core::concept::STRICT_FAMILIES;
use algomap_core::{Concept, Translation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::CollaboratorError;
use crate::lenient;

/// A classifier's answer, before normalization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Classification {
    pub concept: String,
    #[serde(alias = "subConcept")]
    pub sub_concept: String,
    pub explanation: String,
}

impl Classification {
    pub fn unknown(explanation: impl Into<String>) -> Self {
        Self {
            concept: "unknown".to_string(),
            sub_concept: String::new(),
            explanation: explanation.into(),
        }
    }

    /// The canonical concept for this answer.
    pub fn canonical(&self) -> Concept {
        Concept::normalize(&self.concept, &self.sub_concept)
    }
}

pub trait Classifier {
    fn classify(&self, code: &str) -> Result<Classification, CollaboratorError>;
}

/// Rebuilds a translation remotely. `local` is the best partial result the
/// structural translators produced, if any.
pub trait Reconstructor {
    fn reconstruct(
        &self,
        code: &str,
        concept: &Concept,
        local: Option<&Translation>,
    ) -> Result<Translation, CollaboratorError>;
}

/// Text in, text out.
pub trait LanguageModel {
    fn ask(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

impl<M: LanguageModel + ?Sized> LanguageModel for &M {
    fn ask(&self, prompt: &str) -> Result<String, CollaboratorError> {
        (**self).ask(prompt)
    }
}

/// Which labels a [`ModelClassifier`] may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the bare families in [`STRICT_FAMILIES`]; anything else is
    /// reported as `unknown`.
    Strict,
    Open,
}

pub struct ModelClassifier<M> {
    model: M,
    scope: Scope,
}

impl<M: LanguageModel> ModelClassifier<M> {
    pub fn new(model: M, scope: Scope) -> Self {
        Self { model, scope }
    }

    fn prompt(&self, code: &str) -> String {
        let labels = match self.scope {
            Scope::Strict => format!("one of: {}, unknown", STRICT_FAMILIES.join(", ")),
            Scope::Open => "any data structure or algorithm name".to_string(),
        };
        format!(
            "Classify the data structure or algorithm in this Python code.\n\
             Answer with {labels}.\n\
             Reply with JSON only: {{\"concept\": \"...\", \"sub_concept\": \"...\", \"explanation\": \"...\"}}\n\
             Code:\n{code}\n"
        )
    }
}

impl<M: LanguageModel> Classifier for ModelClassifier<M> {
    fn classify(&self, code: &str) -> Result<Classification, CollaboratorError> {
        let reply = self.model.ask(&self.prompt(code))?;
        let object = lenient::extract_object(&reply)
            .ok_or_else(|| CollaboratorError::Decode("no JSON object in classifier reply".into()))?;
        let mut answer: Classification = serde_json::from_value(Value::Object(object))
            .map_err(|e| CollaboratorError::Decode(e.to_string()))?;
        if self.scope == Scope::Strict {
            let family = answer.canonical().strict_family_label();
            if family == "unknown" {
                answer.concept = family.to_string();
                answer.sub_concept.clear();
            }
        }
        debug!(concept = %answer.concept, sub = %answer.sub_concept, "classified");
        Ok(answer)
    }
}

/// Strict classifier first; the open one answers when the strict one says
/// `unknown` or fails.
pub struct ClassifierChain<S, O> {
    strict: S,
    open: O,
}

impl<S: Classifier, O: Classifier> ClassifierChain<S, O> {
    pub fn new(strict: S, open: O) -> Self {
        Self { strict, open }
    }
}

impl<S: Classifier, O: Classifier> Classifier for ClassifierChain<S, O> {
    fn classify(&self, code: &str) -> Result<Classification, CollaboratorError> {
        match self.strict.classify(code) {
            Ok(answer) if !answer.canonical().is_unknown() => Ok(answer),
            Ok(_) => {
                info!("strict classifier answered unknown; asking open classifier");
                self.open.classify(code)
            }
            Err(err) => {
                info!(%err, "strict classifier failed; asking open classifier");
                self.open.classify(code)
            }
        }
    }
}

pub struct ModelReconstructor<M> {
    model: M,
}

impl<M: LanguageModel> ModelReconstructor<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    fn prompt(&self, code: &str, concept: &Concept, local: Option<&Translation>) -> String {
        let animator = concept.animator();
        let mut prompt = format!(
            "Produce a step-by-step execution trace of this Python code.\n\
             Concept: {concept}\nParent animator: {animator:?}\n\
             Reply with raw JSON only: {{\"steps\": [{{\"action\": \"...\", \"description\": \"...\", \"vars\": {{}}}}], \
             \"meta\": {{\"layout\": \"linear\", \"theme\": \"softblue\"}}}}\n"
        );
        if let Some(local) = local {
            if let Ok(json) = serde_json::to_string(local) {
                prompt.push_str("Refine this partial trace:\n");
                prompt.push_str(&json);
                prompt.push('\n');
            }
        }
        prompt.push_str("Code:\n");
        prompt.push_str(code);
        prompt
    }
}

impl<M: LanguageModel> Reconstructor for ModelReconstructor<M> {
    fn reconstruct(
        &self,
        code: &str,
        concept: &Concept,
        local: Option<&Translation>,
    ) -> Result<Translation, CollaboratorError> {
        let reply = self.model.ask(&self.prompt(code, concept, local))?;
        let mut translation = lenient::decode_translation(&reply, concept);
        if let Some(local) = local {
            lenient::merge_meta(&mut translation.meta, &local.meta);
        }
        info!(concept = %concept, steps = translation.steps.len(), "reconstruction received");
        Ok(translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algomap_core::{Meta, QueueKind, Step};
    use std::cell::RefCell;

    /// Replies with queued answers in order.
    struct Canned {
        replies: RefCell<Vec<String>>,
        prompts: RefCell<Vec<String>>,
    }

    impl Canned {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: RefCell::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl LanguageModel for Canned {
        fn ask(&self, prompt: &str) -> Result<String, CollaboratorError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.replies
                .borrow_mut()
                .pop()
                .ok_or(CollaboratorError::Unavailable)
        }
    }

    #[test]
    fn strict_scope_confines_labels() {
        let model = Canned::new(&[r#"{"concept": "Hash Map", "sub_concept": "", "explanation": "dict"}"#]);
        let answer = ModelClassifier::new(&model, Scope::Strict).classify("d = {}").unwrap();
        assert_eq!(answer.concept, "unknown");
        assert_eq!(answer.explanation, "dict");
        assert!(model.prompts.borrow()[0].contains("linkedlist"));
    }

    #[test]
    fn chain_falls_through_on_unknown() {
        let strict = Canned::new(&[r#"{"concept": "unknown", "explanation": "not sure"}"#]);
        let open = Canned::new(&[r#"```json
{"concept": "Trie", "subConcept": "prefix", "explanation": "children map"}
```"#]);
        let chain = ClassifierChain::new(
            ModelClassifier::new(&strict, Scope::Strict),
            ModelClassifier::new(&open, Scope::Open),
        );
        let answer = chain.classify("class Trie: ...").unwrap();
        assert_eq!(answer.concept, "Trie");
        assert_eq!(answer.sub_concept, "prefix");
        assert_eq!(answer.explanation, "children map");
    }

    #[test]
    fn chain_keeps_known_strict_answer() {
        let strict = Canned::new(&[r#"{"concept": "queue", "sub_concept": "circular"}"#]);
        let open = Canned::new(&[]);
        let chain = ClassifierChain::new(
            ModelClassifier::new(&strict, Scope::Strict),
            ModelClassifier::new(&open, Scope::Open),
        );
        let answer = chain.classify("q = CircularQueue(3)").unwrap();
        assert_eq!(answer.canonical(), Concept::Queue(QueueKind::Circular));
        assert!(open.prompts.borrow().is_empty());
    }

    #[test]
    fn reconstruction_merges_local_meta() {
        let model = Canned::new(&[r#"{"steps": [{"action": "enqueue", "description": "Enqueue 1"}], "meta": {"theme": "softgreen"}}"#]);
        let concept = Concept::Queue(QueueKind::Circular);
        let local = Translation::new(
            vec![Step::note("partial")],
            Meta::new(concept.clone()).with_extra("capacity", 3),
        );
        let t = ModelReconstructor::new(&model)
            .reconstruct("q.enqueue(1)", &concept, Some(&local))
            .unwrap();
        assert_eq!(t.steps.len(), 1);
        assert_eq!(t.meta.theme, "softgreen");
        assert_eq!(t.meta.extra["capacity"], serde_json::json!(3));
        assert!(model.prompts.borrow()[0].contains("partial"));
    }

    #[test]
    fn model_errors_propagate() {
        let model = Canned::new(&[]);
        let err = ModelReconstructor::new(&model)
            .reconstruct("x = 1", &Concept::Unknown, None)
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Unavailable));
    }
}
