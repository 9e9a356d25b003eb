//! Local concept detection from keywords and code shape.
//!
//! Each family contributes a candidate with a fixed confidence when its cues
//! appear; the most confident candidate wins. Used in place of a remote
//! classifier when none is configured.

use std::sync::LazyLock;

use algomap_core::{Concept, GraphKind, ListKind, QueueKind, SearchKind, SortKind, TreeKind};
use regex::Regex;
use tree_sitter::Node;

use crate::collaborator::{Classification, Classifier};
use crate::error::CollaboratorError;
use crate::syntax::{self, named_children};
use crate::translators::sort;
use crate::translators::LinkedListTranslator;

static SWAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+\[[^\]]+\]\s*,\s*\w+\[[^\]]+\]\s*=\s*\w+\[").expect("valid swap pattern")
});

const GRAPH_TERMS: &[&str] = &["graph", "adj", "edges", "neighbor"];
const SORT_NAMES: &[&str] = &[
    "merge_sort",
    "quick_sort",
    "quicksort",
    "bubble_sort",
    "insertion_sort",
    "selection_sort",
    "heap_sort",
];

/// A detected concept with its confidence and the cue that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Guess {
    pub concept: Concept,
    pub confidence: f32,
    pub reason: &'static str,
}

impl Guess {
    fn new(concept: Concept, confidence: f32, reason: &'static str) -> Self {
        Self {
            concept,
            confidence,
            reason,
        }
    }
}

/// Deepest nesting of `for`/`while` loops under `node`.
fn loop_depth(node: &Node<'_>) -> usize {
    let own = usize::from(matches!(node.kind(), "for_statement" | "while_statement"));
    own + named_children(node)
        .iter()
        .map(loop_depth)
        .max()
        .unwrap_or(0)
}

pub fn guess(code: &str) -> Guess {
    let text = code.to_lowercase();
    let has = |needle: &str| text.contains(needle);
    let any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    let nested = syntax::parse_python(code)
        .map(|tree| loop_depth(&tree.root_node()))
        .unwrap_or(0);
    let pop0 = has(".pop(0)") || has("popleft(");
    let pop_empty = has(".pop()");
    let appends = has(".append(");
    let graphish = any(GRAPH_TERMS);
    let swap_like = SWAP.is_match(code) || has("swap");

    let mut candidates = Vec::new();

    if has(".next") && has("node") {
        let kind = LinkedListTranslator::detect_kind(code, ListKind::Singly);
        candidates.push(Guess::new(
            Concept::LinkedList(kind),
            0.88,
            "node objects linked through .next",
        ));
    }
    if any(&["btree", "b-tree", "split_child"]) {
        candidates.push(Guess::new(Concept::Tree(TreeKind::BTree), 0.9, "b-tree node splitting"));
    } else if any(&["treenode", ".left", ".right"]) {
        let kind = if has("insert") { TreeKind::Bst } else { TreeKind::Generic };
        candidates.push(Guess::new(Concept::Tree(kind), 0.75, "nodes with .left/.right children"));
    }

    if graphish {
        if has("dijkstra") || has("heapq") {
            candidates.push(Guess::new(
                Concept::Graph(GraphKind::Weighted),
                0.9,
                "graph with a distance heap",
            ));
        }
        if any(&["bfs(", "def bfs", "breadth first"]) || pop0 {
            candidates.push(Guess::new(
                Concept::Graph(GraphKind::Bfs),
                0.82,
                "graph terms with queue-like ops",
            ));
        }
        if any(&["dfs(", "def dfs", "depth first"]) || !pop0 {
            candidates.push(Guess::new(
                Concept::Graph(GraphKind::Dfs),
                0.8,
                "graph terms with recursion or a stack",
            ));
        }
    } else {
        if has("heapq") || has("priority") {
            candidates.push(Guess::new(
                Concept::Queue(QueueKind::Priority),
                0.86,
                "heap-ordered queue",
            ));
        }
        if has("deque(") || has("appendleft") {
            let kind = if has("circular") { QueueKind::CircularDeque } else { QueueKind::Deque };
            candidates.push(Guess::new(Concept::Queue(kind), 0.84, "operations at both ends"));
        }
        if has("circular") && has("enqueue") {
            candidates.push(Guess::new(
                Concept::Queue(QueueKind::Circular),
                0.87,
                "circular enqueue/dequeue",
            ));
        } else if has("enqueue") || (appends && pop0) {
            candidates.push(Guess::new(
                Concept::Queue(QueueKind::Linear),
                0.85,
                "append + pop(0)/popleft pattern",
            ));
        }
        if has(".push(") || (appends && pop_empty && !pop0) {
            candidates.push(Guess::new(Concept::Stack, 0.8, "append/push + pop() pattern"));
        }
    }

    let sort_kind = || sort::detect(code).unwrap_or(SortKind::Generic);
    if any(SORT_NAMES) {
        candidates.push(Guess::new(Concept::Sorting(sort_kind()), 0.83, "named sorting routine"));
    } else if nested >= 2 && swap_like {
        candidates.push(Guess::new(
            Concept::Sorting(sort_kind()),
            0.8,
            "nested loops + swap-like pattern",
        ));
    }
    if has("mid") && (has("low") || has("left")) && (has("high") || has("right")) {
        candidates.push(Guess::new(
            Concept::Searching(SearchKind::Binary),
            0.78,
            "halving a low/high range",
        ));
    } else if has("search") {
        candidates.push(Guess::new(Concept::Searching(SearchKind::Linear), 0.6, "search routine"));
    }

    if candidates.is_empty() {
        return if nested >= 2 {
            Guess::new(Concept::Sorting(SortKind::Generic), 0.55, "nested loops heuristic")
        } else {
            Guess::new(Concept::Unknown, 0.4, "no strong signals")
        };
    }
    let mut best = candidates.swap_remove(0);
    for candidate in candidates {
        if candidate.confidence > best.confidence {
            best = candidate;
        }
    }
    best
}

/// [`Classifier`] backed by [`guess`]. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicClassifier;

impl Classifier for HeuristicClassifier {
    fn classify(&self, code: &str) -> Result<Classification, CollaboratorError> {
        let guess = guess(code);
        Ok(Classification {
            concept: guess.concept.to_string(),
            sub_concept: String::new(),
            explanation: format!("{} (confidence {:.2})", guess.reason, guess.confidence),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_and_queue_patterns() {
        assert_eq!(guess("s = []\ns.append(1)\ns.pop()\n").concept, Concept::Stack);
        assert_eq!(
            guess("q = []\nq.append(1)\nq.pop(0)\n").concept,
            Concept::Queue(QueueKind::Linear)
        );
        assert_eq!(
            guess("import heapq\nh = []\nheapq.heappush(h, 3)\n").concept,
            Concept::Queue(QueueKind::Priority)
        );
    }

    #[test]
    fn linked_list_variant_comes_from_cues() {
        let code = "class Node:\n    def __init__(self, v):\n        self.next = None\n        self.prev = None\n";
        assert_eq!(guess(code).concept, Concept::LinkedList(ListKind::Doubly));
    }

    #[test]
    fn graph_traversals() {
        let bfs = "graph = {'A': ['B']}\ndef bfs(start):\n    queue = [start]\n    node = queue.pop(0)\n";
        assert_eq!(guess(bfs).concept, Concept::Graph(GraphKind::Bfs));
        let dfs = "graph = {'A': ['B']}\ndef dfs(node, seen):\n    for n in graph[node]:\n        dfs(n, seen)\n";
        assert_eq!(guess(dfs).concept, Concept::Graph(GraphKind::Dfs));
    }

    #[test]
    fn nested_swap_loops_are_sorting() {
        let code = "arr = [3, 1, 2]\nfor i in range(3):\n    for j in range(2):\n        if arr[j] > arr[j+1]:\n            arr[j], arr[j+1] = arr[j+1], arr[j]\n";
        assert_eq!(guess(code).concept, Concept::Sorting(SortKind::Generic));
    }

    #[test]
    fn plain_code_is_unknown() {
        let answer = HeuristicClassifier.classify("x = 1\nprint(x)\n").unwrap();
        assert_eq!(answer.concept, "unknown");
        assert!(answer.canonical().is_unknown());
    }
}
