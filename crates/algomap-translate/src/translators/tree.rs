//! Binary search tree translator (BST, AVL and red-black trees alike).
//!
//! Inserted values are collected from every call site first, deduplicated
//! and sorted, and then inserted one by one with a root-to-leaf walk. The
//! remaining operations (`delete`, `search`, traversals) replay afterwards
//! in source order against the built tree.

use algomap_core::{Concept, Literal, Meta, Step, Translation, TreeKind};
use serde_json::Value;

use crate::error::TranslateError;
use crate::extract::{self, Env};
use crate::translator::Translator;

const INSERT: &[&str] = &["insert", "add", "insert_node", "insert_key", "insert_value", "put"];
const DELETE: &[&str] = &["delete", "remove", "delete_node", "delete_key", "remove_node"];
const SEARCH: &[&str] = &["search", "find", "contains", "search_node", "lookup"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    In,
    Pre,
    Post,
    Level,
}

impl Order {
    fn from_call(name: &str) -> Option<Order> {
        let name = name.to_ascii_lowercase().replace('_', "");
        if name.contains("inorder") {
            Some(Order::In)
        } else if name.contains("preorder") {
            Some(Order::Pre)
        } else if name.contains("postorder") {
            Some(Order::Post)
        } else if name.contains("levelorder") {
            Some(Order::Level)
        } else {
            None
        }
    }

    fn label(self) -> &'static str {
        match self {
            Order::In => "inorder",
            Order::Pre => "preorder",
            Order::Post => "postorder",
            Order::Level => "level-order",
        }
    }
}

#[derive(Debug)]
enum Op {
    Delete(Literal, usize),
    Search(Literal, usize),
    Traverse(Order, usize),
}

#[derive(Debug)]
struct Node {
    id: String,
    value: Literal,
    left: Option<usize>,
    right: Option<usize>,
}

/// Arena-backed BST. Removed nodes stay in the arena but become unreachable.
#[derive(Debug, Default)]
struct Bst {
    nodes: Vec<Node>,
    root: Option<usize>,
    created: usize,
}

impl Bst {
    fn step(&self, action: &str, description: String, line: usize) -> Step {
        let inorder: Vec<Value> = self
            .walk(Order::In)
            .into_iter()
            .map(|i| self.nodes[i].value.to_json())
            .collect();
        Step::new(action, description)
            .with_line(line)
            .with_var("size", inorder.len())
            .with_var("inorder", inorder)
            .with_var(
                "root",
                self.root.map_or(Value::Null, |r| self.nodes[r].value.to_json()),
            )
    }

    fn create(&mut self, value: Literal) -> usize {
        self.created += 1;
        self.nodes.push(Node {
            id: format!("n{}", self.created),
            value,
            left: None,
            right: None,
        });
        self.nodes.len() - 1
    }

    fn insert(&mut self, value: Literal, line: usize, steps: &mut Vec<Step>) {
        let Some(mut cur) = self.root else {
            let id = self.create(value.clone());
            self.root = Some(id);
            let node_id = self.nodes[id].id.clone();
            steps.push(
                self.step("create_node", format!("Create node {value}"), line)
                    .with_node(node_id.clone())
                    .with_value(value.to_json()),
            );
            steps.push(
                self.step("set_root", format!("{value} becomes the root"), line)
                    .with_node(node_id),
            );
            return;
        };

        loop {
            let here = &self.nodes[cur];
            let go_left = value < here.value;
            let side = if go_left { "left" } else { "right" };
            steps.push(
                self.step(
                    "compare",
                    format!("Compare {value} with {}: go {side}", here.value),
                    line,
                )
                .with_node(here.id.clone())
                .with_value(value.to_json())
                .with_extra("direction", side),
            );
            let next = if go_left { here.left } else { here.right };
            match next {
                Some(n) => cur = n,
                None => {
                    let child = self.create(value.clone());
                    if go_left {
                        self.nodes[cur].left = Some(child);
                    } else {
                        self.nodes[cur].right = Some(child);
                    }
                    let parent_id = self.nodes[cur].id.clone();
                    let child_id = self.nodes[child].id.clone();
                    let parent_value = self.nodes[cur].value.clone();
                    steps.push(
                        self.step("create_node", format!("Create node {value}"), line)
                            .with_node(child_id.clone())
                            .with_value(value.to_json()),
                    );
                    steps.push(
                        self.step(
                            "link_child",
                            format!("Attach {value} as {side} child of {parent_value}"),
                            line,
                        )
                        .with_node(child_id.clone())
                        .with_edge(parent_id, child_id)
                        .with_extra("side", side),
                    );
                    return;
                }
            }
        }
    }

    /// Walks from the root towards `value`, emitting one `compare` per node.
    /// Returns `(parent, node)` of the match.
    fn locate(
        &self,
        value: &Literal,
        line: usize,
        steps: &mut Vec<Step>,
    ) -> Option<(Option<usize>, usize)> {
        let mut parent = None;
        let mut cur = self.root;
        while let Some(i) = cur {
            let here = &self.nodes[i];
            steps.push(
                self.step("compare", format!("Compare {value} with {}", here.value), line)
                    .with_node(here.id.clone())
                    .with_value(value.to_json()),
            );
            if *value == here.value {
                return Some((parent, i));
            }
            parent = Some(i);
            cur = if *value < here.value { here.left } else { here.right };
        }
        None
    }

    fn search(&self, value: &Literal, line: usize, steps: &mut Vec<Step>) {
        match self.locate(value, line, steps) {
            Some((_, i)) => steps.push(
                self.step("found", format!("Found {value}"), line)
                    .with_node(self.nodes[i].id.clone())
                    .with_value(value.to_json()),
            ),
            None => steps.push(
                self.step("not_found", format!("{value} is not in the tree"), line)
                    .with_value(value.to_json()),
            ),
        }
    }

    fn replace_child(&mut self, parent: Option<usize>, old: usize, new: Option<usize>) {
        match parent {
            None => self.root = new,
            Some(p) if self.nodes[p].left == Some(old) => self.nodes[p].left = new,
            Some(p) => self.nodes[p].right = new,
        }
    }

    fn delete(&mut self, value: &Literal, line: usize, steps: &mut Vec<Step>) {
        let Some((parent, target)) = self.locate(value, line, steps) else {
            steps.push(
                self.step("not_found", format!("Cannot delete {value}: not in the tree"), line)
                    .with_value(value.to_json()),
            );
            return;
        };
        let node_id = self.nodes[target].id.clone();
        match (self.nodes[target].left, self.nodes[target].right) {
            (Some(_), Some(right)) => {
                // inorder successor: leftmost node of the right subtree
                let mut succ_parent = target;
                let mut succ = right;
                while let Some(l) = self.nodes[succ].left {
                    succ_parent = succ;
                    succ = l;
                }
                let succ_value = self.nodes[succ].value.clone();
                let succ_right = self.nodes[succ].right;
                if succ_parent == target {
                    self.nodes[target].right = succ_right;
                } else {
                    self.nodes[succ_parent].left = succ_right;
                }
                self.nodes[target].value = succ_value.clone();
                steps.push(
                    self.step(
                        "replace",
                        format!("Replace {value} with inorder successor {succ_value}"),
                        line,
                    )
                    .with_node(node_id)
                    .with_value(succ_value.to_json()),
                );
            }
            (only, None) | (None, only) => {
                self.replace_child(parent, target, only);
                steps.push(
                    self.step("delete", format!("Delete node {value}"), line)
                        .with_node(node_id)
                        .with_value(value.to_json()),
                );
            }
        }
    }

    fn walk(&self, order: Order) -> Vec<usize> {
        fn rec(tree: &Bst, at: Option<usize>, order: Order, out: &mut Vec<usize>) {
            let Some(i) = at else { return };
            let node = &tree.nodes[i];
            if order == Order::Pre {
                out.push(i);
            }
            rec(tree, node.left, order, out);
            if order == Order::In {
                out.push(i);
            }
            rec(tree, node.right, order, out);
            if order == Order::Post {
                out.push(i);
            }
        }

        let mut out = Vec::new();
        if order == Order::Level {
            let mut queue: std::collections::VecDeque<usize> = self.root.into_iter().collect();
            while let Some(i) = queue.pop_front() {
                out.push(i);
                queue.extend(self.nodes[i].left);
                queue.extend(self.nodes[i].right);
            }
        } else {
            rec(self, self.root, order, &mut out);
        }
        out
    }

    fn traverse(&self, order: Order, line: usize, steps: &mut Vec<Step>) {
        steps.push(
            self.step("traverse", format!("Start {} traversal", order.label()), line)
                .with_extra("order", order.label()),
        );
        for i in self.walk(order) {
            let node = &self.nodes[i];
            steps.push(
                self.step("visit", format!("Visit {}", node.value), line)
                    .with_node(node.id.clone())
                    .with_value(node.value.to_json()),
            );
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TreeTranslator {
    kind: TreeKind,
}

impl TreeTranslator {
    pub fn new(kind: TreeKind) -> Self {
        Self { kind }
    }
}

impl Translator for TreeTranslator {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn simulate(&self, code: &str, _concept: &Concept) -> Result<Translation, TranslateError> {
        let mut values: Vec<(Literal, usize)> = Vec::new();
        let mut ops = Vec::new();
        let mut env = Env::default();

        for line in extract::scan(code) {
            env.observe(&line);
            for call in extract::calls(line.text) {
                let receiver = call
                    .receiver
                    .or_else(|| (call.args.len() > 1).then(|| call.args[0]));
                if line.is_definition(receiver, call.last_arg()) {
                    continue;
                }
                if let Some(order) = Order::from_call(call.name) {
                    ops.push(Op::Traverse(order, line.number));
                    continue;
                }
                let Some(operand) = call.last_arg() else { continue };
                if call.is(INSERT) {
                    values.extend(env.expand_known(operand).into_iter().map(|v| (v, line.number)));
                } else if call.is(DELETE) {
                    ops.extend(
                        env.expand_known(operand)
                            .into_iter()
                            .map(|v| Op::Delete(v, line.number)),
                    );
                } else if call.is(SEARCH) {
                    ops.extend(
                        env.expand_known(operand)
                            .into_iter()
                            .map(|v| Op::Search(v, line.number)),
                    );
                }
            }
        }

        values.sort_by(|a, b| a.0.cmp(&b.0));
        values.dedup_by(|a, b| a.0 == b.0);

        let mut tree = Bst::default();
        let mut steps = Vec::new();
        for (value, line) in values {
            tree.insert(value, line, &mut steps);
        }
        for op in &ops {
            match op {
                Op::Delete(v, line) => tree.delete(v, *line, &mut steps),
                Op::Search(v, line) => tree.search(v, *line, &mut steps),
                Op::Traverse(order, line) => tree.traverse(*order, *line, &mut steps),
            }
        }

        let meta = Meta::new(Concept::Tree(self.kind))
            .with_extra("node_count", tree.walk(Order::In).len());
        Ok(Translation::new(steps, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(code: &str) -> Translation {
        TreeTranslator::new(TreeKind::Bst)
            .simulate(code, &Concept::Tree(TreeKind::Bst))
            .unwrap()
    }

    fn actions(t: &Translation) -> Vec<&str> {
        t.steps.iter().map(|s| s.action.as_str()).collect()
    }

    #[test]
    fn values_are_sorted_then_walked_from_root() {
        let code = "\
class BST:
    def insert(self, key):
        if key < self.root.key:
            self.insert(key)

t = BST()
for v in [20, 10, 30, 10]:
    t.insert(v)
";
        let t = run(code);
        // 10 is the root; 20 and 30 chain to the right.
        assert_eq!(
            actions(&t),
            vec![
                "create_node", "set_root",
                "compare", "create_node", "link_child",
                "compare", "compare", "create_node", "link_child",
            ]
        );
        assert_eq!(t.steps[0].value, Some(json!(10)));
        assert_eq!(t.steps[8].source.as_deref(), Some("n2"));
        assert_eq!(t.steps[8].target.as_deref(), Some("n3"));
        assert_eq!(t.meta.extra["node_count"], 3);
    }

    #[test]
    fn function_style_inserts_and_inorder() {
        let code = "\
def insert(root, key):
    if root is None:
        return Node(key)
    root.left = insert(root.left, key)
    return root

root = None
root = insert(root, 5)
root = insert(root, 3)
inorder(root)
";
        let t = run(code);
        let visits: Vec<_> = t
            .steps
            .iter()
            .filter(|s| s.action == "visit")
            .map(|s| s.value.clone().unwrap())
            .collect();
        assert_eq!(visits, vec![json!(3), json!(5)]);
    }

    #[test]
    fn delete_with_two_children_uses_successor() {
        let code = "t.insert(1)\nt.insert(2)\nt.insert(3)\nt.delete(2)\nt.delete(9)\nt.search(3)\n";
        let t = run(code);
        assert!(actions(&t).contains(&"delete"));
        assert!(actions(&t).contains(&"not_found"));
        assert_eq!(t.steps.last().unwrap().action, "found");
        assert_eq!(t.steps.last().unwrap().vars["inorder"], json!([1, 3]));
    }

    #[test]
    fn unresolved_names_are_not_inserted() {
        let t = run("tree.insert(value)\n");
        assert!(t.steps.is_empty());
    }
}
