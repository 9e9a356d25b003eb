//! The dispatch router: concept + code in, a [`Translation`] out, always.
//!
//! # Escalation
//!
//! 1. Exact content-hash hit in adaptive memory.
//! 2. The family translator chosen by [`route`].
//! 3. When that is insufficient: the most similar rated memory record, the
//!    universal fallback, then remote reconstruction.
//! 4. When everything falls short: the best partial result, or a `note`.
//!
//! Concepts with no structural translator go straight to the universal
//! fallback and then reconstruction.

use algomap_core::{Concept, GraphKind, QueueKind, Translation, TreeKind};
use algomap_storage::{ActionCache, AdaptiveMemory, MemoryStore, DEFAULT_MIN_RATING};
use tracing::{debug, info, warn};

use crate::collaborator::Reconstructor;
use crate::postprocess;
use crate::translator::{Outcome, Translator};
use crate::translators::{
    BTreeTranslator, GraphTranslator, LinkedListTranslator, QueueTranslator, SortTranslator,
    StackTranslator, TreeTranslator, UniversalTranslator,
};

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Lowest user rating a memory record needs to be reused.
    pub min_rating: u8,
    /// Remote results longer than this are compressed when there is no
    /// local result to compare against.
    pub compress_threshold: usize,
    /// Lowest similarity accepted for a fuzzy memory hit.
    pub fuzzy_floor: f64,
    pub use_memory_exact_first: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            min_rating: DEFAULT_MIN_RATING,
            compress_threshold: 15,
            fuzzy_floor: 0.0,
            use_memory_exact_first: true,
        }
    }
}

/// Historical spellings the normalizer does not cover on its own. `key` is
/// lower-case alphanumeric.
fn alias(key: &str) -> Option<Concept> {
    let concept = match key {
        "doubleended" | "doubleendedqueue" => Concept::Queue(QueueKind::Deque),
        "circulardeque" | "dequecircular" => Concept::Queue(QueueKind::CircularDeque),
        "circularqueue" | "queuecircular" | "ringbuffer" => Concept::Queue(QueueKind::Circular),
        "linearqueue" | "queuelinear" | "simplequeue" | "fifo" => Concept::Queue(QueueKind::Linear),
        "priorityqueue" | "queuepriority" | "pq" | "minheap" | "heapq" => {
            Concept::Queue(QueueKind::Priority)
        }
        "kqueues" | "kqueue" | "multiplequeues" => Concept::Queue(QueueKind::KQueues),
        "bst" | "binarysearchtree" => Concept::Tree(TreeKind::Bst),
        "avl" | "avltree" => Concept::Tree(TreeKind::Avl),
        "rbt" | "redblack" | "redblacktree" => Concept::Tree(TreeKind::RedBlack),
        "btree" => Concept::Tree(TreeKind::BTree),
        "bfs" | "graphbfs" | "breadthfirstsearch" => Concept::Graph(GraphKind::Bfs),
        "dfs" | "graphdfs" | "depthfirstsearch" => Concept::Graph(GraphKind::Dfs),
        "dijkstra" | "shortestpath" => Concept::Graph(GraphKind::Weighted),
        "lifo" => Concept::Stack,
        _ => return None,
    };
    Some(concept)
}

/// Second normalization pass over a raw label: the alias table first, then
/// [`Concept::parse`].
pub fn resolve_alias(raw: &str) -> Concept {
    let lowered = raw.trim().to_lowercase();
    let key: String = lowered.chars().filter(char::is_ascii_alphanumeric).collect();
    alias(&key).unwrap_or_else(|| Concept::parse(&lowered))
}

/// The structural translator for `concept`, or `None` when only the
/// universal fallback applies.
pub fn route(concept: &Concept) -> Option<Box<dyn Translator>> {
    match concept {
        Concept::Stack => Some(Box::new(StackTranslator)),
        Concept::Queue(kind) => Some(Box::new(QueueTranslator::new(*kind))),
        Concept::LinkedList(kind) => Some(Box::new(LinkedListTranslator::new(*kind))),
        Concept::Tree(TreeKind::BTree) => Some(Box::new(BTreeTranslator)),
        Concept::Tree(kind) => Some(Box::new(TreeTranslator::new(*kind))),
        Concept::Graph(kind) => Some(Box::new(GraphTranslator::new(*kind))),
        Concept::Sorting(kind) => Some(Box::new(SortTranslator::new(*kind))),
        Concept::Searching(_) | Concept::Unknown | Concept::Other(_) => None,
    }
}

/// Keeps whichever translation has more substantive steps.
fn keep_better(best: &mut Option<Translation>, candidate: Translation) {
    let better = best
        .as_ref()
        .map_or(true, |b| candidate.substantive_len() > b.substantive_len());
    if better {
        *best = Some(candidate);
    }
}

#[derive(Default)]
pub struct Dispatcher<'a> {
    config: DispatchConfig,
    memory: Option<&'a dyn MemoryStore>,
    actions: Option<&'a dyn ActionCache>,
    reconstructor: Option<&'a dyn Reconstructor>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            memory: None,
            actions: None,
            reconstructor: None,
        }
    }

    pub fn with_memory(mut self, store: &'a dyn MemoryStore) -> Self {
        self.memory = Some(store);
        self
    }

    pub fn with_action_cache(mut self, cache: &'a dyn ActionCache) -> Self {
        self.actions = Some(cache);
        self
    }

    pub fn with_reconstructor(mut self, reconstructor: &'a dyn Reconstructor) -> Self {
        self.reconstructor = Some(reconstructor);
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Resolves a raw label through the alias table and dispatches.
    pub fn dispatch_label(&self, label: &str, code: &str) -> Translation {
        self.dispatch(&resolve_alias(label), code)
    }

    pub fn dispatch(&self, concept: &Concept, code: &str) -> Translation {
        let concept = match concept {
            Concept::Other(label) => resolve_alias(label),
            other => other.clone(),
        };
        let mut translation = self.resolve(&concept, code);

        postprocess::normalize(&mut translation.steps);
        translation.steps = postprocess::collapse_duplicates(translation.steps);
        if let Concept::Other(label) = &translation.meta.kind {
            let resolved = resolve_alias(label);
            translation.meta.set_kind(resolved);
        }
        translation.meta.parent_animator = Some(concept.animator());
        info!(
            concept = %concept,
            steps = translation.steps.len(),
            animator = ?concept.animator(),
            "dispatch complete"
        );
        translation
    }

    fn memory(&self) -> Option<AdaptiveMemory<'a>> {
        self.memory
            .map(|store| AdaptiveMemory::new(store).with_min_rating(self.config.min_rating))
    }

    fn resolve(&self, concept: &Concept, code: &str) -> Translation {
        let memory = self.memory();

        if self.config.use_memory_exact_first {
            if let Some(memory) = &memory {
                match memory.lookup_exact(concept, code) {
                    Ok(Some(hit)) => return hit.record.translation(),
                    Ok(None) => {}
                    Err(err) => warn!(%err, "adaptive memory unavailable"),
                }
            }
        }

        let mut best: Option<Translation> = None;
        match route(concept) {
            Some(translator) => {
                debug!(concept = %concept, translator = translator.name(), "routed");
                match translator.translate(code, concept) {
                    Outcome::Complete(translation) => return translation,
                    Outcome::Insufficient { partial, minimum } => {
                        info!(
                            translator = translator.name(),
                            steps = partial.substantive_len(),
                            minimum,
                            "translation insufficient; escalating"
                        );
                        best = Some(partial);
                    }
                    Outcome::ParseFailed { reason } => {
                        warn!(
                            translator = translator.name(),
                            %reason,
                            "translator failed; escalating"
                        );
                    }
                }
                if let Some(memory) = &memory {
                    match memory.lookup_fuzzy(concept, code, self.config.fuzzy_floor) {
                        Ok(Some(hit)) => return hit.record.translation(),
                        Ok(None) => {}
                        Err(err) => warn!(%err, "adaptive memory unavailable"),
                    }
                }
            }
            None => debug!(
                concept = %concept,
                "no structural translator; using universal fallback"
            ),
        }

        match UniversalTranslator.translate(code, concept) {
            Outcome::Complete(translation) => return translation,
            Outcome::Insufficient { partial, .. } => keep_better(&mut best, partial),
            Outcome::ParseFailed { reason } => warn!(%reason, "universal fallback failed"),
        }

        let local = best.filter(|t| t.substantive_len() > 0);
        let Some(reconstructor) = self.reconstructor else {
            return local.unwrap_or_else(|| {
                Translation::note(concept.clone(), "No steps could be produced for this code")
            });
        };
        match reconstructor.reconstruct(code, concept, local.as_ref()) {
            Ok(remote) if remote.substantive_len() > 0 => {
                self.finish_remote(concept, remote, local.is_some())
            }
            Ok(_) => {
                warn!(concept = %concept, "reconstruction returned no steps");
                local.unwrap_or_else(|| {
                    Translation::note(concept.clone(), "Reconstruction returned no steps")
                })
            }
            Err(err) => {
                warn!(concept = %concept, %err, "reconstruction failed");
                local.unwrap_or_else(|| {
                    let mut note =
                        Translation::note(concept.clone(), format!("Reconstruction failed: {err}"));
                    note.meta.theme = "error".to_string();
                    note
                })
            }
        }
    }

    fn finish_remote(
        &self,
        concept: &Concept,
        mut remote: Translation,
        has_local: bool,
    ) -> Translation {
        let before = remote.steps.len();
        if !has_local && before > self.config.compress_threshold && !concept.is_unknown() {
            if let Some(cache) = self.actions {
                if let Err(err) = postprocess::learn_actions(cache, concept, &remote.steps) {
                    warn!(%err, "learned-action cache unavailable");
                }
            }
            remote.steps = postprocess::compress(remote.steps);
            debug!(before, after = remote.steps.len(), "compressed remote result");
        }
        remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algomap_core::{Animator, ListKind, SortKind};

    #[test]
    fn aliases_resolve_historical_spellings() {
        assert_eq!(resolve_alias("BST"), Concept::Tree(TreeKind::Bst));
        assert_eq!(resolve_alias("b-tree"), Concept::Tree(TreeKind::BTree));
        assert_eq!(resolve_alias("CircularQueue"), Concept::Queue(QueueKind::Circular));
        assert_eq!(resolve_alias("double-ended"), Concept::Queue(QueueKind::Deque));
        assert_eq!(resolve_alias("graphdfs"), Concept::Graph(GraphKind::Dfs));
        assert_eq!(
            resolve_alias("doubly linked list"),
            Concept::LinkedList(ListKind::Doubly)
        );
        assert_eq!(resolve_alias("matrix"), Concept::Other("matrix".into()));
    }

    #[test]
    fn routes_every_family() {
        let cases = [
            (Concept::Stack, Some("stack")),
            (Concept::Queue(QueueKind::KQueues), Some("queue")),
            (Concept::LinkedList(ListKind::Singly), Some("linked_list")),
            (Concept::Tree(TreeKind::BTree), Some("btree")),
            (Concept::Tree(TreeKind::Avl), Some("tree")),
            (Concept::Graph(GraphKind::Bfs), Some("graph")),
            (Concept::Sorting(SortKind::Quick), Some("sort")),
            (Concept::Unknown, None),
        ];
        for (concept, name) in cases {
            assert_eq!(route(&concept).map(|t| t.name()), name, "{concept}");
        }
    }

    #[test]
    fn tags_parent_animator() {
        let t = Dispatcher::default()
            .dispatch(&Concept::Stack, "s = []\ns.append(1)\ns.append(2)\ns.pop()\n");
        assert_eq!(t.meta.parent_animator, Some(Animator::StackAnimator));
        assert_eq!(t.steps[0].action, "push");
    }

    #[test]
    fn other_labels_are_realiased() {
        let t = Dispatcher::default()
            .dispatch(&Concept::Other("bst".into()), "t.insert(5)\nt.insert(3)\n");
        assert_eq!(t.meta.parent_animator, Some(Animator::BSTAnimator));
    }
}
