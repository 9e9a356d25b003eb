//! Property tests over the simulated state machines.

use std::collections::HashMap;

use algomap_core::{Concept, GraphKind, Literal, SortKind};
use algomap_translate::translators::queue::circular::Ring;
use algomap_translate::translators::{GraphTranslator, SortTranslator, StackTranslator};
use algomap_translate::Translator;
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Op {
    Push(i64),
    Pop,
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![(0i64..100).prop_map(Op::Push), Just(Op::Pop)],
        1..30,
    )
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn stack_top_and_size_follow_a_vec(ops in ops()) {
        let code: String = ops
            .iter()
            .map(|op| match op {
                Op::Push(v) => format!("s.push({v})\n"),
                Op::Pop => "s.pop()\n".to_string(),
            })
            .collect();
        let t = StackTranslator.simulate(&code, &Concept::Stack).unwrap();
        prop_assert_eq!(t.steps.len(), ops.len());

        let mut model: Vec<i64> = Vec::new();
        for (op, step) in ops.iter().zip(&t.steps) {
            match op {
                Op::Push(v) => {
                    model.push(*v);
                    prop_assert_eq!(step.action.as_str(), "push");
                }
                Op::Pop => {
                    let expected = if model.pop().is_some() { "pop" } else { "pop_empty" };
                    prop_assert_eq!(step.action.as_str(), expected);
                }
            }
            prop_assert_eq!(&step.vars["size"], &json!(model.len()));
            prop_assert_eq!(&step.vars["top"], &model.last().map_or(json!(null), |v| json!(v)));
        }
    }
}

// ---------------------------------------------------------------------------
// Circular queue
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn ring_pointers_stay_in_bounds(capacity in 1usize..8, ops in ops()) {
        let mut ring = Ring::new(capacity);
        let mut live = 0usize;
        for (line, op) in ops.iter().enumerate() {
            let step = match op {
                Op::Push(v) => ring.enqueue(Literal::Int(*v), line + 1),
                Op::Pop => ring.dequeue(line + 1),
            };
            match step.action.as_str() {
                "enqueue" => live += 1,
                "dequeue" => live -= 1,
                _ => {}
            }
            let (head, tail) = (ring.head(), ring.tail());
            prop_assert!(live <= capacity);
            prop_assert_eq!(ring.live().len(), live);
            if live == 0 {
                prop_assert_eq!((head, tail), (-1, -1));
            } else {
                prop_assert!((0..capacity as i64).contains(&head));
                prop_assert!((0..capacity as i64).contains(&tail));
            }
            prop_assert_eq!(step.head, Some(head));
            prop_assert_eq!(step.tail, Some(tail));
        }
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

fn sort_kind() -> impl Strategy<Value = SortKind> {
    prop::sample::select(vec![
        SortKind::Bubble,
        SortKind::Selection,
        SortKind::Insertion,
        SortKind::Merge,
        SortKind::Quick,
        SortKind::Heap,
    ])
}

proptest! {
    #[test]
    fn sorts_are_sorted_permutations(arr in prop::collection::vec(0i64..100, 1..10), kind in sort_kind()) {
        let code = format!("arr = {arr:?}\n");
        let t = SortTranslator::new(kind).simulate(&code, &Concept::Sorting(kind)).unwrap();
        let mut expected = arr.clone();
        expected.sort();
        let last = t.steps.last().unwrap();
        prop_assert_eq!(&last.vars["arr"], &json!(expected));
        let marks = t.steps.iter().filter(|s| s.action == "mark_sorted").count();
        prop_assert_eq!(marks, arr.len());
    }
}

// ---------------------------------------------------------------------------
// Graph traversal
// ---------------------------------------------------------------------------

const NODES: [&str; 5] = ["A", "B", "C", "D", "E"];

fn adjacency() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0usize..NODES.len(), 0..4), NODES.len())
}

fn graph_code(adj: &[Vec<usize>], call: &str) -> String {
    let entries: Vec<String> = adj
        .iter()
        .enumerate()
        .map(|(u, vs)| {
            let vs: Vec<String> = vs.iter().map(|v| format!("'{}'", NODES[*v])).collect();
            format!("'{}': [{}]", NODES[u], vs.join(", "))
        })
        .collect();
    format!("graph = {{{}}}\n{call}(graph, 'A')\n", entries.join(", "))
}

fn reachable(adj: &[Vec<usize>]) -> usize {
    let mut seen = vec![false; NODES.len()];
    let mut todo = vec![0];
    while let Some(u) = todo.pop() {
        if std::mem::replace(&mut seen[u], true) {
            continue;
        }
        todo.extend(adj[u].iter().copied());
    }
    seen.iter().filter(|s| **s).count()
}

proptest! {
    #[test]
    fn traversals_visit_each_reachable_node_once(adj in adjacency()) {
        for (kind, call) in [(GraphKind::Bfs, "bfs"), (GraphKind::Dfs, "dfs")] {
            let code = graph_code(&adj, call);
            let t = GraphTranslator::new(kind).simulate(&code, &Concept::Graph(kind)).unwrap();
            let mut counts: HashMap<String, usize> = HashMap::new();
            for step in t.steps.iter().filter(|s| s.action == "visit") {
                *counts.entry(step.node_id.clone().unwrap_or_default()).or_default() += 1;
            }
            prop_assert!(counts.values().all(|c| *c == 1));
            prop_assert_eq!(counts.len(), reachable(&adj));
            let first = t.steps.iter().find(|s| s.action == "visit").unwrap();
            prop_assert_eq!(first.node_id.as_deref(), Some("A"));
        }
    }
}
