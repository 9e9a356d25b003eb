//! Linked-list translator for singly, doubly and circular lists.
//!
//! The list kind is auto-detected from textual cues before any operation
//! is parsed: `.prev` means doubly linked, and `.next = head` or
//! `while ... .next != head` means circular. Without cues the requested
//! variant is used.

use std::sync::LazyLock;

use algomap_core::{Concept, ListKind, Literal, Meta, Step, Translation};
use regex::Regex;
use serde_json::Value;

use crate::error::TranslateError;
use crate::extract::{self, Call, Env, SourceLine};
use crate::translator::Translator;

static DOUBLY_CUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.prev(ious)?\b").expect("valid doubly cue"));
static CIRCULAR_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.next\s*=\s*(self\.)?head\b|while\s+.*\.next\s*!=\s*(self\.)?head\b|make[_ ]circular")
        .expect("valid circular cue")
});
static NODE_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:head|first|start|root)\s*=\s*Node\s*\((.+)\)\s*$")
        .expect("valid head-node pattern")
});
static NODE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.next\s*=\s*Node\s*\((.+)\)\s*$").expect("valid link-node pattern")
});

const INSERT_FRONT: &[&str] = &[
    "insert_front", "insert_at_beginning", "insert_beginning", "insert_at_head", "insert_head",
    "insert_at_start", "insert_start", "prepend", "push", "push_front", "add_first", "add_front",
];
const INSERT_END: &[&str] = &[
    "insert", "insert_end", "insert_at_end", "insert_last", "insert_tail", "append", "add",
    "add_node", "add_last", "push_back",
];
const INSERT_AFTER: &[&str] = &["insert_after", "add_after"];
const INSERT_BEFORE: &[&str] = &["insert_before", "add_before"];
const INSERT_AT: &[&str] = &["insert_at", "insert_at_position", "insert_at_pos", "insert_position"];
const DELETE_VALUE: &[&str] = &[
    "delete", "remove", "delete_node", "delete_value", "remove_node", "delete_key", "remove_value",
];
const DELETE_HEAD: &[&str] = &[
    "delete_front", "delete_head", "delete_first", "delete_beginning", "delete_at_beginning",
    "remove_first", "remove_head", "pop_front",
];
const DELETE_TAIL: &[&str] = &[
    "delete_end", "delete_tail", "delete_last", "delete_at_end", "remove_last", "remove_tail",
    "pop_back",
];
const DISPLAY_FORWARD: &[&str] = &[
    "display", "print_list", "show", "print_forward", "display_forward", "printList", "print_ll",
];
const DISPLAY_BACKWARD: &[&str] = &[
    "display_backward", "print_backward", "print_reverse", "display_reverse", "reverse_display",
];
const TRAVERSE: &[&str] = &["traverse", "traverse_list", "iterate"];
const SEARCH: &[&str] = &["search", "find", "contains"];
const REVERSE: &[&str] = &["reverse", "reverse_list"];

#[derive(Debug, Clone, Copy)]
pub struct LinkedListTranslator {
    hint: ListKind,
}

impl LinkedListTranslator {
    pub fn new(hint: ListKind) -> Self {
        Self { hint }
    }

    /// The list kind implied by structural cues, or the hint when the code
    /// has none.
    pub fn detect_kind(code: &str, hint: ListKind) -> ListKind {
        let doubly = DOUBLY_CUE.is_match(code);
        let circular = CIRCULAR_CUE.is_match(code);
        match (doubly, circular) {
            (false, false) => hint,
            (true, true) => ListKind::CircularDoubly,
            (true, false) => ListKind::Doubly,
            (false, true) => ListKind::CircularSingly,
        }
    }
}

struct ListState {
    nodes: Vec<Literal>,
    kind: ListKind,
}

impl ListState {
    fn step(&self, action: &str, description: String, line: usize) -> Step {
        let json = extract::to_json_array(&self.nodes);
        Step::new(action, description)
            .with_line(line)
            .with_var("head", self.nodes.first().map_or(Value::Null, Literal::to_json))
            .with_var("tail", self.nodes.last().map_or(Value::Null, Literal::to_json))
            .with_var("length", self.nodes.len())
            .with_var("list_state", json)
    }

    fn rendered(&self, backward: bool) -> String {
        let mut parts: Vec<String> = self.nodes.iter().map(Literal::to_string).collect();
        if backward {
            parts.reverse();
        }
        let mut text = parts.join(if self.kind.is_doubly() { " <-> " } else { " -> " });
        if self.kind.is_circular() && !parts.is_empty() {
            text.push_str(" -> (back to head)");
        } else if parts.is_empty() {
            text.push_str("empty");
        } else {
            text.push_str(" -> None");
        }
        text
    }

    fn position(&self, value: &Literal) -> Option<usize> {
        self.nodes.iter().position(|n| n == value)
    }

    fn insert(&mut self, at: usize, value: Literal, description: String, line: usize) -> Step {
        let at = at.min(self.nodes.len());
        let json = value.to_json();
        self.nodes.insert(at, value);
        self.step("insert", description, line)
            .with_value(json)
            .with_extra("index", at)
    }

    fn remove_at(&mut self, at: usize, action: &str, label: &str, line: usize) -> Step {
        let value = self.nodes.remove(at);
        self.step(action, format!("Deleted {label}{value}"), line)
            .with_value(value.to_json())
            .with_extra("index", at)
    }

    fn visits(&self, line: usize, steps: &mut Vec<Step>) {
        steps.push(self.step("traverse", "Traverse list from head".into(), line));
        for (i, node) in self.nodes.iter().enumerate() {
            steps.push(
                self.step("visit", format!("Visit {node}"), line)
                    .with_value(node.to_json())
                    .with_extra("index", i),
            );
        }
    }
}

impl Translator for LinkedListTranslator {
    fn name(&self) -> &'static str {
        "linked_list"
    }

    fn simulate(&self, code: &str, _concept: &Concept) -> Result<Translation, TranslateError> {
        let kind = Self::detect_kind(code, self.hint);
        let mut state = ListState {
            nodes: Vec::new(),
            kind,
        };
        let mut env = Env::default();
        let mut steps = Vec::new();
        let lines = extract::scan(code);

        for (i, line) in lines.iter().enumerate() {
            env.observe(line);
            if line.in_class || line.is_header {
                continue;
            }
            if !line.in_def && is_traversal_loop(&lines, i) {
                state.visits(line.number, &mut steps);
                continue;
            }
            if !line.in_def {
                if let Some(step) = node_literal(line, &mut state) {
                    steps.push(step);
                    continue;
                }
            }
            for call in extract::calls(line.text) {
                apply_call(&call, line, &env, &mut state, &mut steps);
            }
        }

        let meta = Meta::new(Concept::LinkedList(kind))
            .with_extra("doubly", kind.is_doubly())
            .with_extra("circular", kind.is_circular());
        Ok(Translation::new(steps, meta))
    }
}

/// A top-level `while` loop whose body walks `.next`/`.prev` links.
fn is_traversal_loop(lines: &[SourceLine<'_>], at: usize) -> bool {
    let header = &lines[at];
    if !header.text.starts_with("while ") {
        return false;
    }
    lines[at + 1..]
        .iter()
        .take_while(|l| l.indent > header.indent)
        .any(|l| l.text.contains(".next") || l.text.contains(".prev"))
}

/// Hand-built lists: `head = Node(1)` and `x.next = Node(2)`.
fn node_literal(line: &SourceLine<'_>, state: &mut ListState) -> Option<Step> {
    if let Some(caps) = NODE_HEAD.captures(line.text) {
        if state.nodes.is_empty() {
            let value = Literal::lenient(&caps[1]);
            let d = format!("Created head node {value}");
            return Some(state.insert(0, value, d, line.number));
        }
    }
    let caps = NODE_LINK.captures(line.text)?;
    let value = Literal::lenient(&caps[1]);
    let d = format!("Linked new node {value} at end");
    let end = state.nodes.len();
    Some(state.insert(end, value, d, line.number))
}

fn apply_call(
    call: &Call<'_>,
    line: &SourceLine<'_>,
    env: &Env,
    state: &mut ListState,
    steps: &mut Vec<Step>,
) {
    let receiver = call
        .receiver
        .or_else(|| (call.args.len() > 1).then(|| call.args[0]));
    if line.is_definition(receiver, call.last_arg()) {
        return;
    }
    // `items.insert(0, x)` is positional, `ll.insert(x)` appends.
    let positional = call.name == "insert" && call.receiver.is_some() && call.args.len() == 2;

    if !positional && (call.is(INSERT_FRONT) || call.is(INSERT_END)) {
        let Some(operand) = call.last_arg() else { return };
        let front = call.is(INSERT_FRONT);
        for value in env.expand(operand) {
            let (at, where_) = if front {
                (0, "at front")
            } else {
                (state.nodes.len(), "at end")
            };
            let d = format!("Inserted {value} {where_}");
            steps.push(state.insert(at, value, d, line.number));
        }
    } else if positional || call.is(INSERT_AFTER) || call.is(INSERT_BEFORE) || call.is(INSERT_AT) {
        let by_index = positional || call.is(INSERT_AT);
        let n = call.args.len();
        if n < 2 {
            return;
        }
        let anchor = Literal::lenient(call.args[n - 2]);
        let after = call.is(INSERT_AFTER);
        for value in env.expand(call.args[n - 1]) {
            let target = if by_index {
                anchor.as_i64().map(|p| p.max(0) as usize)
            } else {
                state.position(&anchor).map(|p| if after { p + 1 } else { p })
            };
            match target {
                Some(at) => {
                    let d = if by_index {
                        format!("Inserted {value} at position {at}")
                    } else {
                        let side = if after { "after" } else { "before" };
                        format!("Inserted {value} {side} {anchor}")
                    };
                    steps.push(state.insert(at, value, d, line.number));
                }
                None => steps.push(
                    state
                        .step(
                            "not_found",
                            format!("Cannot insert {value}: {anchor} not found"),
                            line.number,
                        )
                        .with_value(value.to_json()),
                ),
            }
        }
    } else if call.is(DELETE_VALUE) {
        let Some(operand) = call.last_arg() else { return };
        for value in env.expand(operand) {
            let step = match state.position(&value) {
                Some(at) => state.remove_at(at, "delete", "", line.number),
                None => state
                    .step(
                        "not_found",
                        format!("Attempted delete of {value} (not found)"),
                        line.number,
                    )
                    .with_value(value.to_json()),
            };
            steps.push(step);
        }
    } else if call.is(DELETE_HEAD) || call.is(DELETE_TAIL) {
        let head = call.is(DELETE_HEAD);
        for _ in 0..env.iterations() {
            let step = if state.nodes.is_empty() {
                state.step("underflow", "List is empty; nothing to delete".into(), line.number)
            } else if head {
                state.remove_at(0, "delete", "head ", line.number)
            } else {
                let last = state.nodes.len() - 1;
                state.remove_at(last, "delete", "tail ", line.number)
            };
            steps.push(step);
        }
    } else if call.is(DISPLAY_FORWARD) || call.is(DISPLAY_BACKWARD) {
        let backward = call.is(DISPLAY_BACKWARD);
        let direction = if backward { "backward" } else { "forward" };
        let d = format!("Display list {direction}: {}", state.rendered(backward));
        steps.push(state.step("display", d, line.number).with_extra("direction", direction));
    } else if call.is(TRAVERSE) {
        state.visits(line.number, steps);
    } else if call.is(SEARCH) {
        let Some(operand) = call.last_arg() else { return };
        let target = Literal::lenient(operand);
        for (i, node) in state.nodes.iter().enumerate() {
            let found = *node == target;
            let action = if found { "found" } else { "visit" };
            let d = if found {
                format!("Found {target} at position {i}")
            } else {
                format!("Compare {node} with {target}")
            };
            steps.push(state.step(action, d, line.number).with_extra("index", i));
            if found {
                return;
            }
        }
        steps.push(
            state
                .step("not_found", format!("{target} not found in list"), line.number)
                .with_value(target.to_json()),
        );
    } else if call.is(REVERSE) && call.args.len() <= 1 {
        state.nodes.reverse();
        steps.push(state.step("reverse", "Reversed list".into(), line.number));
    }
}
