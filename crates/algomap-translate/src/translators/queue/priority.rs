//! Priority queue over a simulated binary min-heap.
//!
//! Items are ordered by `(priority, insertion sequence)`, so entries with
//! equal priority leave in the order they arrived. The `heap` field of each
//! step shows the heap's array layout, the way `heapq` stores it.

use std::cmp::Ordering;
use std::sync::LazyLock;

use algomap_core::{Concept, Literal, Meta, QueueKind, Step, Translation};
use regex::Regex;
use serde_json::Value;

use crate::extract::{self, Env, SourceLine};

static TOP_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_][\w\.]*)\[\s*0\s*\]").expect("valid heap-top pattern")
});

const PUSH: &[&str] = &["heappush", "enqueue", "push", "insert", "put", "add"];
const POP: &[&str] = &[
    "heappop",
    "dequeue",
    "pop",
    "get",
    "dequeue_highest",
    "extract_min",
    "delete_min",
    "poll",
];
const PEEK: &[&str] = &["peek", "peek_highest", "top", "get_min"];

#[derive(Debug, Clone)]
struct Entry {
    priority: Literal,
    item: Literal,
    seq: u64,
}

impl Entry {
    fn cmp_key(&self, other: &Entry) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Array-backed binary min-heap.
#[derive(Debug, Default)]
struct MinHeap {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl MinHeap {
    fn push(&mut self, priority: Literal, item: Literal) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { priority, item, seq });
        let mut i = self.entries.len() - 1;
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.entries[i].cmp_key(&self.entries[parent]) == Ordering::Less {
                self.entries.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn pop(&mut self) -> Option<Entry> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let min = self.entries.pop();
        let len = self.entries.len();
        let mut i = 0;
        loop {
            let (left, right) = (2 * i + 1, 2 * i + 2);
            let mut smallest = i;
            if left < len && self.entries[left].cmp_key(&self.entries[smallest]) == Ordering::Less {
                smallest = left;
            }
            if right < len
                && self.entries[right].cmp_key(&self.entries[smallest]) == Ordering::Less
            {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.entries.swap(i, smallest);
            i = smallest;
        }
        min
    }

    fn peek(&self) -> Option<&Entry> {
        self.entries.first()
    }

    fn layout(&self) -> Vec<Value> {
        self.entries.iter().map(|e| e.item.to_json()).collect()
    }

    fn step(&self, action: &str, description: String, line: usize) -> Step {
        let layout = self.layout();
        Step::new(action, description)
            .with_line(line)
            .with_heap(layout.clone())
            .with_var("heap", layout)
            .with_var("size", self.entries.len())
            .with_var("min", self.peek().map_or(Value::Null, |e| e.item.to_json()))
    }
}

/// Splits an inserted operand into `(priority, item)`.
///
/// A tuple `(p, v)` is keyed by `p`; a scalar is its own priority. For a
/// two-argument call the numeric argument is the priority, the second one
/// when both are numeric (`enqueue(item, priority)`).
fn keyed(args: &[Literal]) -> Option<(Literal, Literal)> {
    match args {
        [single] => match single.items() {
            Some([p, ..]) if matches!(single, Literal::Tuple(_)) => {
                Some((p.clone(), single.clone()))
            }
            _ => Some((single.clone(), single.clone())),
        },
        [a, b] => {
            let priority = if a.is_number() && !b.is_number() { a } else { b };
            let item = if std::ptr::eq(priority, a) { b } else { a };
            Some((
                priority.clone(),
                Literal::Tuple(vec![priority.clone(), item.clone()]),
            ))
        }
        _ => None,
    }
}

pub fn simulate(code: &str) -> Translation {
    let mut heap = MinHeap::default();
    let mut env = Env::default();
    let mut steps = Vec::new();

    for line in extract::scan(code) {
        env.observe(&line);
        scan_line(&line, &env, &mut heap, &mut steps);
    }

    Translation::new(steps, Meta::new(Concept::Queue(QueueKind::Priority)))
}

fn scan_line(line: &SourceLine<'_>, env: &Env, heap: &mut MinHeap, steps: &mut Vec<Step>) {
    let mut matched = false;
    for call in extract::calls(line.text) {
        let functional = call.receiver == Some("heapq") || call.receiver.is_none();
        if call.name == "heapify" {
            let Some(target) = call.arg(0) else { continue };
            if line.is_definition(Some(target), None) {
                continue;
            }
            if let Some(Literal::List(items)) = env.constant(target).cloned() {
                for item in items {
                    if let Some((p, v)) = keyed(std::slice::from_ref(&item)) {
                        heap.push(p, v);
                    }
                }
                steps.push(heap.step("heapify", format!("Heapify {target}"), line.number));
                matched = true;
            }
        } else if call.is(PUSH) {
            // heappush(h, x) / q.push(x) / q.enqueue(item, priority)
            let (receiver, operands): (Option<&str>, &[&str]) =
                if functional && call.args.len() >= 2 {
                    (call.arg(0), &call.args[1..])
                } else {
                    (call.receiver, call.args.as_slice())
                };
            if operands.is_empty() || operands.len() > 2 {
                continue;
            }
            if line.is_definition(receiver, operands.first().copied())
                || operands.iter().any(|o| line.is_definition(None, Some(o)))
            {
                continue;
            }
            let expanded: Vec<Vec<Literal>> = operands.iter().map(|o| env.expand(o)).collect();
            if expanded.iter().any(Vec::is_empty) {
                continue;
            }
            let rounds = expanded.iter().map(Vec::len).max().unwrap_or(0);
            for round in 0..rounds {
                let args: Vec<Literal> = expanded
                    .iter()
                    .map(|vals| vals[round.min(vals.len().saturating_sub(1))].clone())
                    .collect();
                let Some((priority, item)) = keyed(&args) else { continue };
                let description = format!("Inserted {item} with priority {priority}");
                let json = item.to_json();
                heap.push(priority, item);
                steps.push(heap.step("enqueue", description, line.number).with_value(json));
            }
            matched = true;
        } else if call.is(POP) {
            let receiver = match (call.receiver, call.args.as_slice()) {
                (r, []) => r,
                (None, [h]) | (Some("heapq"), [h]) => Some(*h),
                _ => continue,
            };
            if line.is_definition(receiver, None) {
                continue;
            }
            for _ in 0..env.iterations() {
                let step = match heap.pop() {
                    Some(entry) => heap
                        .step(
                            "dequeue",
                            format!(
                                "Removed {} with highest priority ({})",
                                entry.item, entry.priority
                            ),
                            line.number,
                        )
                        .with_value(entry.item.to_json()),
                    None => heap.step("underflow", "Priority queue is empty".into(), line.number),
                };
                steps.push(step);
            }
            matched = true;
        } else if call.is(PEEK) && call.args.len() <= 1 {
            if line.is_definition(call.receiver.or(call.arg(0)), None) {
                continue;
            }
            steps.push(peek_step(heap, line.number));
            matched = true;
        }
    }

    if !matched {
        if let Some(caps) = TOP_INDEX.captures(line.text) {
            if !line.is_definition(Some(&caps[1]), None) && !heap.entries.is_empty() {
                steps.push(peek_step(heap, line.number));
            }
        }
    }
}

fn peek_step(heap: &MinHeap, line: usize) -> Step {
    match heap.peek() {
        Some(e) => heap
            .step("peek", format!("Highest priority item is {}", e.item), line)
            .with_value(e.item.to_json()),
        None => heap.step("peek", "Priority queue is empty".into(), line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn heapq_tuples_pop_by_priority() {
        let code = "\
import heapq
pq = []
heapq.heappush(pq, (3, 'c'))
heapq.heappush(pq, (1, 'a'))
heapq.heappush(pq, (2, 'b'))
print(heapq.heappop(pq))
";
        let t = simulate(code);
        let last = t.steps.last().unwrap();
        assert_eq!(last.action, "dequeue");
        assert_eq!(last.value, Some(json!([1, "a"])));
        assert_eq!(t.steps[1].heap, Some(vec![json!([1, "a"]), json!([3, "c"])]));
    }

    #[test]
    fn equal_priorities_leave_in_arrival_order() {
        let code = "q.enqueue('x', 1)\nq.enqueue('y', 1)\nq.enqueue('z', 0)\nq.dequeue()\nq.dequeue()\nq.dequeue()\nq.dequeue()\n";
        let t = simulate(code);
        let values: Vec<_> = t.steps[3..6].iter().map(|s| s.value.clone().unwrap()).collect();
        assert_eq!(values, vec![json!([0, "z"]), json!([1, "x"]), json!([1, "y"])]);
        assert_eq!(t.steps[6].action, "underflow");
    }

    #[test]
    fn heapify_constant_list() {
        let t = simulate("import heapq\nh = [5, 1, 4]\nheapq.heapify(h)\nheapq.heappop(h)\n");
        assert_eq!(t.steps[0].action, "heapify");
        assert_eq!(t.steps[1].value, Some(json!(1)));
    }
}
