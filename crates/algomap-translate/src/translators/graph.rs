//! Graph traversal translator: BFS, DFS and Dijkstra.
//!
//! The adjacency comes from the first dict literal whose values are
//! neighbour collections (`{"A": ["B"]}`, `{"A": [("B", 4)]}` or
//! `{"A": {"B": 4}}`), falling back to `add_edge(u, v[, w])` calls.
//! Neighbours are visited in declaration order.

use std::collections::VecDeque;
use std::sync::LazyLock;

use algomap_core::{Concept, GraphKind, Literal, Meta, Step, Translation};
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use regex::Regex;
use serde_json::{json, Value};

use crate::error::TranslateError;
use crate::extract::{self, Env};
use crate::translator::Translator;

const TRAVERSAL_CALLS: &[&str] =
    &["bfs", "dfs", "dijkstra", "breadth_first", "depth_first", "traverse"];

static DICT_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*([A-Za-z_][\w\.]*)\s*=\s*\{").expect("valid dict assignment pattern")
});
static START_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(?:start|start_node|source|src)\s*=\s*['"]?(\w+)['"]?\s*$"#)
        .expect("valid start pattern")
});

/// Directed graph with node labels and optional edge weights.
#[derive(Debug, Default)]
pub struct Adjacency {
    graph: DiGraph<String, Option<f64>>,
    index: IndexMap<String, NodeIndex>,
}

impl Adjacency {
    fn node(&mut self, label: &str) -> NodeIndex {
        if let Some(&ix) = self.index.get(label) {
            return ix;
        }
        let ix = self.graph.add_node(label.to_string());
        self.index.insert(label.to_string(), ix);
        ix
    }

    fn connect(&mut self, from: &str, to: &str, weight: Option<f64>) {
        let (a, b) = (self.node(from), self.node(to));
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, weight);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn is_weighted(&self) -> bool {
        self.graph.edge_weights().any(Option::is_some)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Outgoing neighbours in the order their edges were declared.
    pub fn neighbors(&self, label: &str) -> Vec<(String, f64)> {
        let Some(&ix) = self.index.get(label) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges(ix).collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| (self.graph[e.target()].clone(), e.weight().unwrap_or(1.0)))
            .collect()
    }

    fn edge_list(&self) -> Vec<Value> {
        let mut edges: Vec<_> = self.graph.edge_references().collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| {
                let mut edge = json!({
                    "source": self.graph[e.source()],
                    "target": self.graph[e.target()],
                });
                if let Some(w) = e.weight() {
                    edge["weight"] = json!(w);
                }
                edge
            })
            .collect()
    }

    /// Builds the adjacency from a parsed dict literal. Returns `None` when
    /// the dict does not look like an adjacency map.
    fn from_dict(entries: &[(Literal, Literal)]) -> Option<Adjacency> {
        if entries.is_empty() {
            return None;
        }
        let mut adj = Adjacency::default();
        for (key, _) in entries {
            adj.node(&key.label());
        }
        for (key, value) in entries {
            let from = key.label();
            match value {
                Literal::List(items) | Literal::Tuple(items) => {
                    for item in items {
                        match item.items() {
                            Some([to, w]) if w.is_number() => {
                                adj.connect(&from, &to.label(), w.as_f64())
                            }
                            Some(_) => return None,
                            None => adj.connect(&from, &item.label(), None),
                        }
                    }
                }
                Literal::Dict(weighted) => {
                    for (to, w) in weighted {
                        adj.connect(&from, &to.label(), w.as_f64());
                    }
                }
                _ => return None,
            }
        }
        Some(adj)
    }

    /// Adjacency from the source: a dict literal first, then `add_edge`
    /// calls (undirected unless the code mentions `directed`).
    pub fn extract(code: &str) -> Option<Adjacency> {
        for caps in DICT_ASSIGN.captures_iter(code) {
            let Some(whole) = caps.get(0) else { continue };
            let open = whole.end() - 1;
            if let Ok((Literal::Dict(entries), _)) = Literal::parse_prefix(&code[open..]) {
                if let Some(adj) = Adjacency::from_dict(&entries) {
                    return Some(adj);
                }
            }
        }

        let directed = code.contains("directed") && !code.contains("undirected");
        let mut adj = Adjacency::default();
        let mut env = Env::default();
        for line in extract::scan(code) {
            env.observe(&line);
            for call in extract::calls(line.text) {
                if call.name != "add_edge" {
                    continue;
                }
                let (u, v, w) = match call.args.as_slice() {
                    [u, v] => (*u, *v, None),
                    [u, v, w] => (*u, *v, Some(*w)),
                    _ => continue,
                };
                if line.is_definition(call.receiver, Some(u)) || line.is_definition(None, Some(v)) {
                    continue;
                }
                let (Some(u), Some(v)) = (resolve_node(&env, u), resolve_node(&env, v)) else {
                    continue;
                };
                let weight = w.and_then(|w| Literal::lenient(w).as_f64());
                adj.connect(&u, &v, weight);
                if !directed {
                    adj.connect(&v, &u, weight);
                }
            }
        }
        (!adj.is_empty()).then_some(adj)
    }
}

fn resolve_node(env: &Env, operand: &str) -> Option<String> {
    let values = env.expand_known(operand);
    (values.len() == 1).then(|| values[0].label())
}

/// Start node: the node argument of a `bfs`/`dfs`/`dijkstra` call, an
/// assigned `start` variable, or the first declared node.
fn start_node(code: &str, adj: &Adjacency) -> Option<String> {
    for line in extract::scan(code) {
        if line.is_header || line.in_class {
            continue;
        }
        for call in extract::calls(line.text) {
            let name = call.name.to_ascii_lowercase();
            let is_traversal = TRAVERSAL_CALLS.iter().any(|k| name.contains(k));
            if !is_traversal || line.is_definition(call.receiver, call.arg(0)) {
                continue;
            }
            let candidate = if call.args.len() >= 2 { call.arg(1) } else { call.arg(0) };
            if let Some(label) = candidate.map(|c| Literal::lenient(c).label()) {
                if adj.contains(&label) {
                    return Some(label);
                }
            }
        }
    }
    if let Some(caps) = START_ASSIGN.captures(code) {
        if adj.contains(&caps[1]) {
            return Some(caps[1].to_string());
        }
    }
    adj.labels().next().map(str::to_string)
}

fn labels_json(items: impl IntoIterator<Item = impl AsRef<str>>) -> Value {
    Value::Array(items.into_iter().map(|s| json!(s.as_ref())).collect())
}

fn bfs(adj: &Adjacency, start: &str) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut visited: Vec<String> = Vec::new();
    let snapshot = |step: Step, queue: &VecDeque<String>, visited: &[String]| {
        step.with_var("queue", labels_json(queue.iter()))
            .with_var("visited", labels_json(visited.iter()))
    };

    queue.push_back(start.to_string());
    steps.push(snapshot(
        Step::new("enqueue", format!("Enqueue start node {start}")).with_node(start),
        &queue,
        &visited,
    ));
    while let Some(u) = queue.pop_front() {
        steps.push(snapshot(
            Step::new("dequeue", format!("Dequeue {u}")).with_node(u.clone()),
            &queue,
            &visited,
        ));
        visited.push(u.clone());
        steps.push(snapshot(
            Step::new("visit", format!("Visit {u}")).with_node(u.clone()),
            &queue,
            &visited,
        ));
        for (v, _) in adj.neighbors(&u) {
            steps.push(snapshot(
                Step::new("connect", format!("Explore edge {u} -> {v}"))
                    .with_edge(u.clone(), v.clone()),
                &queue,
                &visited,
            ));
            if !visited.contains(&v) && !queue.contains(&v) {
                queue.push_back(v.clone());
                steps.push(snapshot(
                    Step::new("enqueue", format!("Enqueue {v}")).with_node(v),
                    &queue,
                    &visited,
                ));
            }
        }
    }
    steps
}

fn dfs(adj: &Adjacency, start: &str) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut stack: Vec<String> = vec![start.to_string()];
    let mut visited: Vec<String> = Vec::new();
    let snapshot = |step: Step, stack: &[String], visited: &[String]| {
        step.with_stack_snapshot(stack.iter().map(|s| json!(s)).collect())
            .with_var("stack", labels_json(stack.iter()))
            .with_var("visited", labels_json(visited.iter()))
    };

    steps.push(snapshot(
        Step::new("push", format!("Push start node {start}")).with_node(start),
        &stack,
        &visited,
    ));
    while let Some(u) = stack.pop() {
        steps.push(snapshot(
            Step::new("pop", format!("Pop {u}")).with_node(u.clone()),
            &stack,
            &visited,
        ));
        if visited.contains(&u) {
            continue;
        }
        visited.push(u.clone());
        steps.push(snapshot(
            Step::new("visit", format!("Visit {u}")).with_node(u.clone()),
            &stack,
            &visited,
        ));
        let neighbors = adj.neighbors(&u);
        for (v, _) in &neighbors {
            steps.push(snapshot(
                Step::new("connect", format!("Explore edge {u} -> {v}"))
                    .with_edge(u.clone(), v.clone()),
                &stack,
                &visited,
            ));
        }
        // reversed so the first neighbour is popped first
        for (v, _) in neighbors.into_iter().rev() {
            if !visited.contains(&v) && !stack.contains(&v) {
                stack.push(v.clone());
                steps.push(snapshot(
                    Step::new("push", format!("Push {v}")).with_node(v),
                    &stack,
                    &visited,
                ));
            }
        }
    }
    steps
}

fn dijkstra(adj: &Adjacency, start: &str) -> Vec<Step> {
    let mut dist: IndexMap<String, Option<f64>> =
        adj.labels().map(|l| (l.to_string(), None)).collect();
    dist.insert(start.to_string(), Some(0.0));
    let mut done: Vec<String> = Vec::new();
    let snapshot = |step: Step, dist: &IndexMap<String, Option<f64>>, done: &[String]| {
        let shown: serde_json::Map<String, Value> = dist
            .iter()
            .map(|(k, d)| (k.clone(), d.map_or(json!("inf"), |d| json!(d))))
            .collect();
        step.with_var("dist", Value::Object(shown))
            .with_var("visited", labels_json(done.iter()))
    };

    let mut steps = vec![snapshot(
        Step::new(
            "init",
            format!("Set distance of {start} to 0, all others to infinity"),
        )
        .with_node(start),
        &dist,
        &done,
    )];
    loop {
        // closest unfinished node; ties go to the earliest declared
        let next = dist
            .iter()
            .filter(|(k, _)| !done.contains(k))
            .filter_map(|(k, d)| d.map(|d| (k.clone(), d)))
            .fold(None::<(String, f64)>, |best, (k, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((k, d)),
            });
        let Some((u, du)) = next else { break };
        done.push(u.clone());
        steps.push(snapshot(
            Step::new("visit", format!("Visit {u} (distance {du})")).with_node(u.clone()),
            &dist,
            &done,
        ));
        for (v, w) in adj.neighbors(&u) {
            if done.contains(&v) {
                continue;
            }
            let candidate = du + w;
            let current = dist.get(&v).copied().flatten();
            steps.push(snapshot(
                Step::new("relax", format!("Relax edge {u} -> {v} (weight {w})"))
                    .with_edge(u.clone(), v.clone())
                    .with_extra("weight", w),
                &dist,
                &done,
            ));
            if current.map_or(true, |c| candidate < c) {
                dist.insert(v.clone(), Some(candidate));
                steps.push(snapshot(
                    Step::new("update_distance", format!("Distance of {v} becomes {candidate}"))
                        .with_node(v)
                        .with_value(candidate),
                    &dist,
                    &done,
                ));
            }
        }
    }
    steps
}

#[derive(Debug, Clone, Copy)]
pub struct GraphTranslator {
    kind: GraphKind,
}

impl GraphTranslator {
    pub fn new(kind: GraphKind) -> Self {
        Self { kind }
    }

    /// Traversal to run. A generic request is resolved from the code.
    fn algorithm(&self, code: &str, adj: &Adjacency) -> GraphKind {
        match self.kind {
            GraphKind::Generic => {
                let lower = code.to_ascii_lowercase();
                if adj.is_weighted() || lower.contains("dijkstra") {
                    GraphKind::Weighted
                } else if lower.contains("dfs") || lower.contains("depth") {
                    GraphKind::Dfs
                } else {
                    GraphKind::Bfs
                }
            }
            kind => kind,
        }
    }
}

impl Translator for GraphTranslator {
    fn name(&self) -> &'static str {
        "graph"
    }

    fn simulate(&self, code: &str, _concept: &Concept) -> Result<Translation, TranslateError> {
        let adj = Adjacency::extract(code).ok_or_else(|| TranslateError::Parse {
            family: "graph",
            reason: "no adjacency map or add_edge calls found".to_string(),
        })?;
        let start = start_node(code, &adj).ok_or_else(|| TranslateError::Parse {
            family: "graph",
            reason: "graph has no nodes".to_string(),
        })?;
        let kind = self.algorithm(code, &adj);
        let steps = match kind {
            GraphKind::Dfs => dfs(&adj, &start),
            GraphKind::Weighted => dijkstra(&adj, &start),
            GraphKind::Bfs | GraphKind::Generic => bfs(&adj, &start),
        };
        tracing::debug!(
            algorithm = ?kind,
            nodes = adj.index.len(),
            start = %start,
            "graph simulated"
        );

        let meta = Meta::new(Concept::Graph(kind))
            .with_extra("graph_nodes", labels_json(adj.labels()))
            .with_extra("graph_edges", Value::Array(adj.edge_list()))
            .with_extra("start_node", start);
        Ok(Translation::new(steps, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BFS: &str = r#"
from collections import deque
graph = {"A": ["B", "C"], "B": ["D"], "C": [], "D": []}

def bfs(graph, start):
    visited = set()
    queue = deque([start])
    while queue:
        node = queue.popleft()

bfs(graph, "A")
"#;

    fn visits(t: &Translation) -> Vec<String> {
        t.steps
            .iter()
            .filter(|s| s.action == "visit")
            .filter_map(|s| s.node_id.clone())
            .collect()
    }

    #[test]
    fn bfs_visits_level_by_level() {
        let t = GraphTranslator::new(GraphKind::Bfs)
            .simulate(BFS, &Concept::Graph(GraphKind::Bfs))
            .unwrap();
        assert_eq!(visits(&t), vec!["A", "B", "C", "D"]);
        assert_eq!(t.meta.extra["start_node"], "A");
        assert_eq!(t.meta.extra["graph_nodes"], json!(["A", "B", "C", "D"]));
        assert_eq!(t.steps[0].action, "enqueue");
    }

    #[test]
    fn dfs_preserves_declaration_order() {
        let code = "g = {1: [2, 3], 2: [4], 3: [], 4: []}\ndfs(g, 1)\n";
        let t = GraphTranslator::new(GraphKind::Dfs)
            .simulate(code, &Concept::Graph(GraphKind::Dfs))
            .unwrap();
        assert_eq!(visits(&t), vec!["1", "2", "4", "3"]);
        assert!(t.steps.iter().all(|s| s.stack_snapshot.is_some()));
    }

    #[test]
    fn weighted_runs_dijkstra() {
        let code = "graph = {'A': [('B', 4), ('C', 1)], 'B': [], 'C': [('B', 2)]}\nstart = 'A'\n";
        let t = GraphTranslator::new(GraphKind::Generic)
            .simulate(code, &Concept::Graph(GraphKind::Generic))
            .unwrap();
        assert_eq!(t.meta.kind, Concept::Graph(GraphKind::Weighted));
        assert_eq!(visits(&t), vec!["A", "C", "B"]);
        let last = t.steps.last().unwrap();
        assert_eq!(last.vars["dist"]["B"], json!(3.0));
    }

    #[test]
    fn add_edge_calls_build_undirected_graph() {
        let code = "g = Graph()\ng.add_edge(0, 1)\ng.add_edge(0, 2)\ng.bfs(0)\n";
        let t = GraphTranslator::new(GraphKind::Bfs)
            .simulate(code, &Concept::Graph(GraphKind::Bfs))
            .unwrap();
        assert_eq!(visits(&t), vec!["0", "1", "2"]);
    }

    #[test]
    fn missing_adjacency_is_a_parse_error() {
        let err = GraphTranslator::new(GraphKind::Bfs)
            .simulate("print(1)", &Concept::Graph(GraphKind::Bfs))
            .unwrap_err();
        assert!(err.to_string().starts_with("graph:"));
    }
}
