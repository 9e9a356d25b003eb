//! Property tests for the concept normalizer.

use algomap_core::Concept;
use proptest::prelude::*;

fn raw_label() -> impl Strategy<Value = String> {
    let words = prop::sample::select(vec![
        "linked", "list", "queue", "deque", "circular", "doubly", "priority", "tree", "avl",
        "btree", "b-tree", "red black", "graph", "bfs", "dfs", "weighted", "sort", "bubble",
        "quick", "merge", "heap", "search", "binary", "stack", "hash", "map", "Unknown", "trie",
        "input restricted", "k queues", "_", "-", "  ",
    ]);
    prop::collection::vec(words, 0..5).prop_map(|ws| ws.join(" "))
}

proptest! {
    #[test]
    fn normalize_is_idempotent(concept in raw_label(), sub in raw_label()) {
        let first = Concept::normalize(&concept, &sub);
        let label = first.to_string();
        let second = Concept::normalize(&label, "");
        prop_assert_eq!(&second, &first);
        prop_assert_eq!(second.to_string(), label);
    }

    #[test]
    fn canonical_label_is_never_empty(concept in raw_label(), sub in raw_label()) {
        let label = Concept::normalize(&concept, &sub).to_string();
        prop_assert!(!label.is_empty());
    }
}

#[test]
fn family_priority_order() {
    // linked > queue > tree > graph > sort > search > stack
    assert_eq!(Concept::normalize("stack queue", "").to_string(), "queue-linear");
    assert_eq!(Concept::normalize("graph tree", "").to_string(), "tree");
    assert_eq!(Concept::normalize("sort graph", "").to_string(), "graph");
    assert_eq!(Concept::normalize("search sort", "").to_string(), "sorting");
    assert_eq!(Concept::normalize("stack search", "").to_string(), "searching");
}
