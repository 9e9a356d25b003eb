//! Linear FIFO queue.

use std::collections::HashSet;
use std::sync::LazyLock;

use algomap_core::{Concept, Literal, Meta, QueueKind, Step, Translation};
use regex::Regex;
use serde_json::Value;

use super::{insert_operands, nullary_receiver};
use crate::extract::{self, Env};

static FRONT_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_][\w\.]*)\[\s*0\s*\]").expect("valid front-index pattern")
});
static TRAVERSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^for\s+\w+\s+in\s+([A-Za-z_][\w\.]*)\s*:").expect("valid traverse pattern")
});

const ENQUEUE: &[&str] = &["enqueue", "append", "put", "offer"];
const DEQUEUE: &[&str] = &["dequeue", "popleft", "get", "poll"];
const PEEK: &[&str] = &["peek", "front"];
const DISPLAY: &[&str] = &["display", "show", "print_queue"];

#[derive(Debug, Default)]
struct LinearQueue {
    items: Vec<Literal>,
}

impl LinearQueue {
    fn step(&self, action: &str, description: String, line: usize) -> Step {
        let json = extract::to_json_array(&self.items);
        let (head, tail) = if self.items.is_empty() {
            (-1, -1)
        } else {
            (0, self.items.len() as i64 - 1)
        };
        Step::new(action, description)
            .with_line(line)
            .with_buffer(json.clone())
            .with_pointers(head, tail)
            .with_var("queue", json)
            .with_var("front", self.items.first().map_or(Value::Null, Literal::to_json))
            .with_var("rear", self.items.last().map_or(Value::Null, Literal::to_json))
    }

    fn enqueue(&mut self, value: Literal, line: usize) -> Step {
        let description = format!("Enqueued {value} at rear");
        let json = value.to_json();
        self.items.push(value);
        self.step("enqueue", description, line).with_value(json)
    }

    fn dequeue(&mut self, line: usize) -> Step {
        if self.items.is_empty() {
            return self.step("underflow", "Queue is empty; nothing to dequeue".into(), line);
        }
        let value = self.items.remove(0);
        self.step("dequeue", format!("Dequeued {value} from front"), line)
            .with_value(value.to_json())
    }

    fn peek(&self, line: usize) -> Step {
        match self.items.first() {
            Some(v) => self
                .step("peek", format!("Front element is {v}"), line)
                .with_value(v.to_json()),
            None => self.step("peek", "Queue is empty; no front element".into(), line),
        }
    }
}

pub fn simulate(code: &str) -> Translation {
    let mut queue = LinearQueue::default();
    let mut env = Env::default();
    let mut receivers: HashSet<String> = HashSet::new();
    let mut steps = Vec::new();

    for line in extract::scan(code) {
        env.observe(&line);

        if let Some(caps) = TRAVERSE.captures(line.text) {
            if receivers.contains(extract::base_name(&caps[1])) && !line.is_definition(None, None) {
                steps.push(queue.step(
                    "traverse",
                    "Traverse queue from front to rear".into(),
                    line.number,
                ));
                for (i, item) in queue.items.iter().enumerate() {
                    steps.push(
                        queue
                            .step("visit", format!("Visit {item} at position {i}"), line.number)
                            .with_value(item.to_json()),
                    );
                }
                continue;
            }
        }

        let mut matched = false;
        for call in extract::calls(line.text) {
            if call.is(ENQUEUE) {
                let Some((receiver, operand)) = insert_operands(&call) else {
                    continue;
                };
                if line.is_definition(receiver, Some(operand)) {
                    continue;
                }
                if let Some(r) = receiver {
                    receivers.insert(extract::base_name(r).to_string());
                }
                for value in env.expand(operand) {
                    steps.push(queue.enqueue(value, line.number));
                }
                matched = true;
            } else if call.is(DEQUEUE) || (call.name == "pop" && call.args == ["0"]) {
                let receiver = if call.name == "pop" {
                    call.receiver
                } else {
                    match nullary_receiver(&call) {
                        Some(r) => r,
                        None => continue,
                    }
                };
                if line.is_definition(receiver, None) {
                    continue;
                }
                for _ in 0..env.iterations() {
                    steps.push(queue.dequeue(line.number));
                }
                matched = true;
            } else if call.is(PEEK) {
                let Some(receiver) = nullary_receiver(&call) else {
                    continue;
                };
                if line.is_definition(receiver, None) {
                    continue;
                }
                steps.push(queue.peek(line.number));
                matched = true;
            } else if call.is(DISPLAY) {
                let Some(receiver) = nullary_receiver(&call) else {
                    continue;
                };
                if line.is_definition(receiver, None) {
                    continue;
                }
                let rendered = extract::to_json_array(&queue.items);
                steps.push(queue.step(
                    "display",
                    format!("Display queue {}", Value::Array(rendered)),
                    line.number,
                ));
                matched = true;
            }
        }

        if !matched {
            if let Some(caps) = FRONT_INDEX.captures(line.text) {
                let name = extract::base_name(&caps[1]);
                if receivers.contains(name) && !line.is_definition(Some(name), None) {
                    steps.push(queue.peek(line.number));
                }
            }
        }
    }

    let meta = Meta::new(Concept::Queue(QueueKind::Linear));
    Translation::new(steps, meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(t: &Translation) -> Vec<&str> {
        t.steps.iter().map(|s| s.action.as_str()).collect()
    }

    #[test]
    fn loop_over_list_unrolls_into_enqueues() {
        let t = simulate("q = Queue()\nfor v in [1, 2, 3]:\n    q.enqueue(v)\nq.dequeue()\n");
        assert_eq!(actions(&t), vec!["enqueue", "enqueue", "enqueue", "dequeue"]);
        assert_eq!(t.steps[3].value, Some(Value::from(1)));
        assert_eq!(t.steps[3].vars["front"], 2);
        assert_eq!(t.steps[3].head, Some(0));
        assert_eq!(t.steps[3].tail, Some(1));
    }

    #[test]
    fn empty_dequeue_is_underflow() {
        let t = simulate("q = []\nq.pop(0)\nq.append(4)\n");
        assert_eq!(actions(&t), vec!["underflow", "enqueue"]);
        assert_eq!(t.steps[0].head, Some(-1));
    }

    #[test]
    fn traversal_and_front_index() {
        let t = simulate("q = []\nq.append('a')\nq.append('b')\nx = q[0]\nfor item in q:\n    print(item)\n");
        assert_eq!(
            actions(&t),
            vec!["enqueue", "enqueue", "peek", "traverse", "visit", "visit"]
        );
        assert_eq!(t.steps[5].value, Some(Value::from("b")));
    }
}
