//! Canonical concept vocabulary and the normalizer that maps free-form
//! classifier labels onto it.
//!
//! Classifiers speak loosely ("Doubly Linked List", "circular-deque",
//! "BFS traversal"). Everything downstream of [`Concept::normalize`] speaks
//! the closed vocabulary below, so translators match exhaustively on enum
//! variants instead of comparing strings.
//!
//! The canonical label of every concept is its [`Display`](fmt::Display)
//! form, and normalizing a canonical label returns the same concept.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Queue variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Linear,
    Circular,
    Priority,
    Deque,
    CircularDeque,
    InputRestrictedDeque,
    OutputRestrictedDeque,
    DoublePriority,
    KQueues,
}

/// Linked-list variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Singly,
    Doubly,
    CircularSingly,
    CircularDoubly,
}

/// Tree variants. BST, AVL and red-black share one translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeKind {
    Generic,
    Bst,
    Avl,
    RedBlack,
    BTree,
}

/// Graph variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphKind {
    Generic,
    Bfs,
    Dfs,
    Weighted,
}

/// Sorting algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKind {
    Generic,
    Bubble,
    Selection,
    Insertion,
    Merge,
    Quick,
    Heap,
}

/// Searching algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Generic,
    Binary,
    Linear,
}

/// A canonical family+variant tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Concept {
    Stack,
    Queue(QueueKind),
    LinkedList(ListKind),
    Tree(TreeKind),
    Graph(GraphKind),
    Sorting(SortKind),
    Searching(SearchKind),
    Unknown,
    /// Unmatched input, kept as its lower-cased, trimmed label.
    Other(String),
}

/// Coarse algorithm family, used for routing and as `meta.family`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Stack,
    Queue,
    LinkedList,
    Tree,
    Graph,
    Sorting,
    Searching,
    #[default]
    Unknown,
}

/// Downstream animator tag attached to every result as `meta.parent_animator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Animator {
    PriorityQueue,
    CircularDequeAnimator,
    DequeAnimator,
    CircularQueue,
    LinearQueue,
    CircularDoubly,
    CircularSingly,
    Doubly,
    Singly,
    StackAnimator,
    TreeAnimator,
    BTreeAnimator,
    BSTAnimator,
    BFSAnimator,
    DFSAnimator,
    WeightedGraphAnimator,
    GraphAnimator,
    SortAnimator,
    GenericAIAnimator,
}

/// Families the strict classifier is allowed to answer with.
pub const STRICT_FAMILIES: [&str; 7] = [
    "stack",
    "queue",
    "linkedlist",
    "tree",
    "graph",
    "sorting",
    "searching",
];

impl Concept {
    /// Maps a raw classifier label and sub-label onto the canonical vocabulary.
    ///
    /// Family detection runs on the folded `"concept sub"` string in a fixed
    /// priority order (linked, queue, tree, graph, sort, search, stack), then
    /// variant detection runs within the matched family. Unmatched input
    /// becomes [`Concept::Other`] holding the lower-cased, trimmed concept.
    pub fn normalize(concept: &str, sub_concept: &str) -> Concept {
        let combo = fold(&format!("{concept} {sub_concept}"));
        if combo.is_empty() {
            return Concept::Unknown;
        }
        let words: Vec<&str> = combo.split(' ').collect();
        let has = |needle: &str| combo.contains(needle);
        let word = |w: &str| words.contains(&w);

        if has("linked") {
            let circular = has("circular");
            let doubly = has("doubly") || has("double");
            return Concept::LinkedList(match (circular, doubly) {
                (true, true) => ListKind::CircularDoubly,
                (false, true) => ListKind::Doubly,
                (true, false) => ListKind::CircularSingly,
                (false, false) => ListKind::Singly,
            });
        }

        if has("queue") || has("deque") {
            return Concept::Queue(queue_variant(&combo, &words));
        }

        if has("tree") {
            let kind = if has("redblack") || has("red black") || word("rbt") {
                TreeKind::RedBlack
            } else if word("avl") {
                TreeKind::Avl
            } else if has("btree") || has_pair(&words, "b", "tree") {
                TreeKind::BTree
            } else if word("bst") || has("binary search") {
                TreeKind::Bst
            } else {
                TreeKind::Generic
            };
            return Concept::Tree(kind);
        }

        if has("graph") {
            let kind = if word("bfs") || has("breadth") {
                GraphKind::Bfs
            } else if word("dfs") || has("depth") {
                GraphKind::Dfs
            } else if has("weighted") || has("dijkstra") {
                GraphKind::Weighted
            } else {
                GraphKind::Generic
            };
            return Concept::Graph(kind);
        }

        if has("sort") {
            let kind = if has("bubble") {
                SortKind::Bubble
            } else if has("selection") {
                SortKind::Selection
            } else if has("insertion") {
                SortKind::Insertion
            } else if has("merge") {
                SortKind::Merge
            } else if has("quick") {
                SortKind::Quick
            } else if has("heap") {
                SortKind::Heap
            } else {
                SortKind::Generic
            };
            return Concept::Sorting(kind);
        }

        if has("search") {
            let kind = if has("binary") {
                SearchKind::Binary
            } else if has("linear") || has("sequential") {
                SearchKind::Linear
            } else {
                SearchKind::Generic
            };
            return Concept::Searching(kind);
        }

        if has("stack") {
            return Concept::Stack;
        }

        let raw = concept.trim().to_lowercase();
        if fold(&raw).is_empty() || raw == "unknown" {
            Concept::Unknown
        } else {
            Concept::Other(raw)
        }
    }

    /// Normalizes a single label (no sub-concept).
    pub fn parse(label: &str) -> Concept {
        Concept::normalize(label, "")
    }

    pub fn family(&self) -> Family {
        match self {
            Concept::Stack => Family::Stack,
            Concept::Queue(_) => Family::Queue,
            Concept::LinkedList(_) => Family::LinkedList,
            Concept::Tree(_) => Family::Tree,
            Concept::Graph(_) => Family::Graph,
            Concept::Sorting(_) => Family::Sorting,
            Concept::Searching(_) => Family::Searching,
            Concept::Unknown | Concept::Other(_) => Family::Unknown,
        }
    }

    /// The animator tag, following the same priority rules as normalization.
    pub fn animator(&self) -> Animator {
        match self {
            Concept::Stack => Animator::StackAnimator,
            Concept::Queue(kind) => match kind {
                QueueKind::Priority | QueueKind::DoublePriority => Animator::PriorityQueue,
                QueueKind::CircularDeque => Animator::CircularDequeAnimator,
                QueueKind::Deque
                | QueueKind::InputRestrictedDeque
                | QueueKind::OutputRestrictedDeque => Animator::DequeAnimator,
                QueueKind::Circular => Animator::CircularQueue,
                QueueKind::Linear | QueueKind::KQueues => Animator::LinearQueue,
            },
            Concept::LinkedList(kind) => match kind {
                ListKind::CircularDoubly => Animator::CircularDoubly,
                ListKind::Doubly => Animator::Doubly,
                ListKind::CircularSingly => Animator::CircularSingly,
                ListKind::Singly => Animator::Singly,
            },
            Concept::Tree(kind) => match kind {
                TreeKind::BTree => Animator::BTreeAnimator,
                TreeKind::Bst => Animator::BSTAnimator,
                TreeKind::Avl | TreeKind::RedBlack | TreeKind::Generic => Animator::TreeAnimator,
            },
            Concept::Graph(kind) => match kind {
                GraphKind::Bfs => Animator::BFSAnimator,
                GraphKind::Dfs => Animator::DFSAnimator,
                GraphKind::Weighted => Animator::WeightedGraphAnimator,
                GraphKind::Generic => Animator::GraphAnimator,
            },
            Concept::Sorting(_) => Animator::SortAnimator,
            Concept::Searching(_) | Concept::Unknown | Concept::Other(_) => {
                Animator::GenericAIAnimator
            }
        }
    }

    /// Label used by the strict classifier: the bare family name, or
    /// `unknown` when the family is outside [`STRICT_FAMILIES`].
    pub fn strict_family_label(&self) -> &'static str {
        match self.family() {
            Family::Stack => "stack",
            Family::Queue => "queue",
            Family::LinkedList => "linkedlist",
            Family::Tree => "tree",
            Family::Graph => "graph",
            Family::Sorting => "sorting",
            Family::Searching => "searching",
            Family::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Concept::Unknown)
    }
}

fn queue_variant(combo: &str, words: &[&str]) -> QueueKind {
    let has = |needle: &str| combo.contains(needle);
    let deque = has("deque") || has("double ended") || has("doubleended");
    if has("input restricted") || has("inputrestricted") {
        QueueKind::InputRestrictedDeque
    } else if has("output restricted") || has("outputrestricted") {
        QueueKind::OutputRestrictedDeque
    } else if has("double priority") || (deque && has("priority")) || words.contains(&"depq") {
        QueueKind::DoublePriority
    } else if is_kqueues(words) || has("multiple queue") {
        QueueKind::KQueues
    } else if has("circular") && deque {
        QueueKind::CircularDeque
    } else if has("priority") {
        QueueKind::Priority
    } else if deque {
        QueueKind::Deque
    } else if has("circular") {
        QueueKind::Circular
    } else {
        QueueKind::Linear
    }
}

/// Case-folds and unifies separators: `_`, `-` and runs of whitespace all
/// become a single space.
fn fold(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_pair(words: &[&str], first: &str, second: &str) -> bool {
    words.windows(2).any(|w| w[0] == first && w[1] == second)
}

/// Whole-word `kqueue(s)` or `k queue(s)`; "task queue" is not a k-queue.
fn is_kqueues(words: &[&str]) -> bool {
    words.iter().any(|w| matches!(*w, "kqueue" | "kqueues"))
        || has_pair(words, "k", "queue")
        || has_pair(words, "k", "queues")
}

impl QueueKind {
    fn suffix(self) -> &'static str {
        match self {
            QueueKind::Linear => "linear",
            QueueKind::Circular => "circular",
            QueueKind::Priority => "priority",
            QueueKind::Deque => "deque",
            QueueKind::CircularDeque => "circular-deque",
            QueueKind::InputRestrictedDeque => "input-restricted-deque",
            QueueKind::OutputRestrictedDeque => "output-restricted-deque",
            QueueKind::DoublePriority => "double-priority",
            QueueKind::KQueues => "kqueues",
        }
    }
}

impl ListKind {
    fn suffix(self) -> &'static str {
        match self {
            ListKind::Singly => "singly",
            ListKind::Doubly => "doubly",
            ListKind::CircularSingly => "circular-singly",
            ListKind::CircularDoubly => "circular-doubly",
        }
    }

    pub fn is_circular(self) -> bool {
        matches!(self, ListKind::CircularSingly | ListKind::CircularDoubly)
    }

    pub fn is_doubly(self) -> bool {
        matches!(self, ListKind::Doubly | ListKind::CircularDoubly)
    }
}

impl SortKind {
    pub fn name(self) -> &'static str {
        match self {
            SortKind::Generic => "sorting",
            SortKind::Bubble => "bubble",
            SortKind::Selection => "selection",
            SortKind::Insertion => "insertion",
            SortKind::Merge => "merge",
            SortKind::Quick => "quick",
            SortKind::Heap => "heap",
        }
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concept::Stack => write!(f, "stack"),
            Concept::Queue(kind) => write!(f, "queue-{}", kind.suffix()),
            Concept::LinkedList(kind) => write!(f, "linkedlist-{}", kind.suffix()),
            Concept::Tree(TreeKind::Generic) => write!(f, "tree"),
            Concept::Tree(TreeKind::Bst) => write!(f, "tree-bst"),
            Concept::Tree(TreeKind::Avl) => write!(f, "tree-avl"),
            Concept::Tree(TreeKind::RedBlack) => write!(f, "tree-redblack"),
            Concept::Tree(TreeKind::BTree) => write!(f, "tree-btree"),
            Concept::Graph(GraphKind::Generic) => write!(f, "graph"),
            Concept::Graph(GraphKind::Bfs) => write!(f, "graph-bfs"),
            Concept::Graph(GraphKind::Dfs) => write!(f, "graph-dfs"),
            Concept::Graph(GraphKind::Weighted) => write!(f, "graph-weighted"),
            Concept::Sorting(SortKind::Generic) => write!(f, "sorting"),
            Concept::Sorting(kind) => write!(f, "sorting-{}", kind.name()),
            Concept::Searching(SearchKind::Generic) => write!(f, "searching"),
            Concept::Searching(SearchKind::Binary) => write!(f, "searching-binary"),
            Concept::Searching(SearchKind::Linear) => write!(f, "searching-linear"),
            Concept::Unknown => write!(f, "unknown"),
            Concept::Other(label) => write!(f, "{label}"),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Stack => "stack",
            Family::Queue => "queue",
            Family::LinkedList => "linkedlist",
            Family::Tree => "tree",
            Family::Graph => "graph",
            Family::Sorting => "sorting",
            Family::Searching => "searching",
            Family::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

impl Serialize for Concept {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Concept {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Concept::parse(&raw))
    }
}
