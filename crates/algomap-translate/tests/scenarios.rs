//! End-to-end dispatch scenarios, including the escalation chain with
//! in-test collaborators.

use std::cell::Cell;

use algomap_core::{Animator, Concept, GraphKind, Meta, QueueKind, SearchKind, Step, Translation};
use algomap_storage::{ActionCache, AdaptiveMemory, InMemoryStore};
use algomap_translate::{
    CollaboratorError, Classifier, DispatchConfig, Dispatcher, HeuristicClassifier, Reconstructor,
};
use serde_json::json;

/// Counts calls and replies with a fixed result.
struct CountingReconstructor {
    calls: Cell<usize>,
    reply: Result<Translation, String>,
}

impl CountingReconstructor {
    fn replying(translation: Translation) -> Self {
        Self {
            calls: Cell::new(0),
            reply: Ok(translation),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            calls: Cell::new(0),
            reply: Err(message.to_string()),
        }
    }
}

impl Reconstructor for CountingReconstructor {
    fn reconstruct(
        &self,
        _code: &str,
        _concept: &Concept,
        _local: Option<&Translation>,
    ) -> Result<Translation, CollaboratorError> {
        self.calls.set(self.calls.get() + 1);
        self.reply
            .clone()
            .map_err(CollaboratorError::Request)
    }
}

fn actions(t: &Translation) -> Vec<&str> {
    t.steps.iter().map(|s| s.action.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Structural translators through the router
// ---------------------------------------------------------------------------

#[test]
fn stack_scenario() {
    let code = "s.push(10)\ns.push(20)\ns.pop()\ns.peek()\n";
    let t = Dispatcher::default().dispatch(&Concept::Stack, code);
    assert_eq!(actions(&t), ["push", "push", "pop", "peek"]);
    assert_eq!(t.steps[2].vars["stack"], json!([10]));
    assert_eq!(t.steps[3].vars["top"], json!(10));
    assert_eq!(t.meta.parent_animator, Some(Animator::StackAnimator));
}

#[test]
fn circular_queue_scenario() {
    let code = "q = CircularQueue(3)\nq.enqueue(1)\nq.enqueue(2)\nq.enqueue(3)\nq.enqueue(4)\nq.dequeue()\n";
    let t = Dispatcher::default().dispatch_label("Circular Queue", code);
    assert_eq!(actions(&t), ["enqueue", "enqueue", "enqueue", "overflow", "dequeue"]);
    assert_eq!(t.meta.extra["capacity"], json!(3));
    assert_eq!(t.steps[4].head, Some(1));
    assert_eq!(t.steps[4].tail, Some(2));
    assert_eq!(t.meta.parent_animator, Some(Animator::CircularQueue));
}

#[test]
fn bfs_scenario() {
    let code = "graph = {'A': ['B', 'C'], 'B': ['D'], 'C': [], 'D': []}\nbfs(graph, 'A')\n";
    let t = Dispatcher::default().dispatch(&Concept::Graph(GraphKind::Bfs), code);
    let visits: Vec<_> = t
        .steps
        .iter()
        .filter(|s| s.action == "visit")
        .filter_map(|s| s.node_id.as_deref())
        .collect();
    assert_eq!(visits, ["A", "B", "C", "D"]);
    assert_eq!(t.meta.parent_animator, Some(Animator::BFSAnimator));
}

#[test]
fn range_near_integer_limit_unrolls_without_overflow() {
    let code = "s = []\nfor i in range(9223372036854775795, 9223372036854775807, 5):\n    s.push(i)\n";
    let t = Dispatcher::default().dispatch(&Concept::Stack, code);
    assert_eq!(actions(&t), ["push", "push", "push"]);
    assert_eq!(t.steps[2].vars["top"], json!(9223372036854775805i64));
}

#[test]
fn unknown_concept_uses_universal_fallback() {
    let code = "total = 0\nfor i in range(3):\n    total += i\nprint(total)\n";
    let t = Dispatcher::default().dispatch(&Concept::Unknown, code);
    assert_eq!(t.steps[0].action, "assign");
    assert!(actions(&t).contains(&"loop"));
    assert_eq!(t.meta.parent_animator, Some(Animator::GenericAIAnimator));
}

#[test]
fn heuristic_classification_feeds_dispatch() {
    let code = "s = []\ns.append(1)\ns.append(2)\ns.pop()\n";
    let concept = HeuristicClassifier.classify(code).unwrap().canonical();
    assert_eq!(concept, Concept::Stack);
    let t = Dispatcher::default().dispatch(&concept, code);
    assert_eq!(actions(&t), ["push", "push", "pop"]);
}

// ---------------------------------------------------------------------------
// Adaptive memory
// ---------------------------------------------------------------------------

fn cached(description: &str) -> Translation {
    Translation::new(
        vec![Step::new("push", description), Step::new("pop", "cached pop")],
        Meta::new(Concept::Stack),
    )
}

#[test]
fn exact_memory_hit_bypasses_translation() {
    let store = InMemoryStore::new();
    let code = "s.push(1)\ns.push(2)\ns.pop()\n";
    AdaptiveMemory::new(&store)
        .store(&Concept::Stack, code, &cached("from memory"), 5)
        .unwrap();
    let t = Dispatcher::default()
        .with_memory(&store)
        .dispatch(&Concept::Stack, code);
    assert_eq!(t.steps[0].description, "from memory");
    assert_eq!(t.meta.parent_animator, Some(Animator::StackAnimator));
}

#[test]
fn low_rated_memory_is_ignored() {
    let store = InMemoryStore::new();
    let code = "s.push(1)\ns.push(2)\ns.pop()\n";
    AdaptiveMemory::new(&store)
        .store(&Concept::Stack, code, &cached("from memory"), 2)
        .unwrap();
    let t = Dispatcher::default()
        .with_memory(&store)
        .dispatch(&Concept::Stack, code);
    assert_eq!(t.steps[0].description, "Pushed 1 onto stack");
}

#[test]
fn insufficient_translation_falls_back_to_similar_memory() {
    let store = InMemoryStore::new();
    AdaptiveMemory::new(&store)
        .store(&Concept::Stack, "s.push(1)\ns.pop()\n", &cached("similar"), 4)
        .unwrap();
    let t = Dispatcher::default()
        .with_memory(&store)
        .dispatch(&Concept::Stack, "s.push(7)\n");
    assert_eq!(t.steps[0].description, "similar");
}

#[test]
fn exact_lookup_can_be_disabled() {
    let store = InMemoryStore::new();
    let code = "s.push(1)\ns.push(2)\ns.pop()\n";
    AdaptiveMemory::new(&store)
        .store(&Concept::Stack, code, &cached("from memory"), 5)
        .unwrap();
    let config = DispatchConfig {
        use_memory_exact_first: false,
        ..DispatchConfig::default()
    };
    let t = Dispatcher::new(config)
        .with_memory(&store)
        .dispatch(&Concept::Stack, code);
    assert_eq!(t.steps[0].action, "push");
    assert_eq!(t.steps[0].description, "Pushed 1 onto stack");
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

#[test]
fn complete_translation_never_calls_reconstructor() {
    let remote = CountingReconstructor::failing("unused");
    let t = Dispatcher::default()
        .with_reconstructor(&remote)
        .dispatch(&Concept::Queue(QueueKind::Linear), "q.enqueue(1)\nq.enqueue(2)\nq.dequeue()\n");
    assert_eq!(remote.calls.get(), 0);
    assert_eq!(actions(&t), ["enqueue", "enqueue", "dequeue"]);
}

#[test]
fn reconstruction_failure_becomes_error_note() {
    let remote = CountingReconstructor::failing("timeout");
    let t = Dispatcher::default()
        .with_reconstructor(&remote)
        .dispatch(&Concept::Unknown, "import os\n");
    assert_eq!(remote.calls.get(), 1);
    assert_eq!(t.steps.len(), 1);
    assert_eq!(t.steps[0].action, "note");
    assert_eq!(t.steps[0].description, "Reconstruction failed: request failed: timeout");
    assert_eq!(t.meta.theme, "error");
    assert_eq!(t.meta.parent_animator, Some(Animator::GenericAIAnimator));
}

#[test]
fn nothing_available_yields_note() {
    let t = Dispatcher::default().dispatch(&Concept::Unknown, "import os\n");
    assert_eq!(t.steps.len(), 1);
    assert!(t.steps[0].is_note());
}

#[test]
fn long_remote_result_is_compressed_and_learned() {
    let mut steps = Vec::new();
    for i in 0..6 {
        steps.push(Step::new("loop_start", format!("iteration {i}")));
        steps.push(Step::new("compare", format!("compare {i}")));
        steps.push(Step::new("stack_push", format!("push {i}")));
        steps.push(Step::new("stack_push", format!("push again {i}")));
    }
    steps.push(Step::new("initialize", "done"));
    let remote = CountingReconstructor::replying(Translation::new(
        steps,
        Meta::fallback(Concept::Searching(SearchKind::Binary)),
    ));
    let cache = InMemoryStore::new();
    let concept = Concept::Searching(SearchKind::Binary);

    let t = Dispatcher::default()
        .with_reconstructor(&remote)
        .with_action_cache(&cache)
        .dispatch(&concept, "import bisect\n");

    assert_eq!(remote.calls.get(), 1);
    assert_eq!(t.steps.len(), 13);
    assert!(!actions(&t).contains(&"loop_start"));
    assert_eq!(t.steps[1].description, "push again 0");
    let learned = cache.learned("searching-binary").unwrap();
    assert!(learned.contains("stack_push"));
    assert!(learned.contains("loop_start"));
    assert!(!learned.contains("initialize"));
}
