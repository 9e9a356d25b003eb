//! Double-ended queues, including the circular and restricted variants.
//!
//! An input-restricted deque only accepts insertions at the rear; an
//! output-restricted deque only allows deletions at the rear. A blocked
//! call emits an `error` step naming the call and leaves the state alone.

use std::collections::VecDeque;

use algomap_core::{Concept, Literal, Meta, QueueKind, Step, Translation};
use serde_json::Value;

use super::{insert_operands, nullary_receiver, DEFAULT_CAPACITY};
use crate::extract::{self, Call, Env};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    PushBack,
    PushFront,
    PopBack,
    PopFront,
    PeekFront,
    PeekBack,
    Display,
}

impl Op {
    fn classify(call: &Call<'_>) -> Option<Op> {
        let op = match call.name {
            "append" | "insert_rear" | "insert_last" | "insertLast" | "enqueue_rear"
            | "enqueue_back" | "push_back" | "add_rear" | "add_last" | "enqueue" => Op::PushBack,
            "appendleft" | "insert_front" | "insert_first" | "insertFront" | "enqueue_front"
            | "push_front" | "add_front" | "add_first" => Op::PushFront,
            "pop" | "delete_rear" | "delete_last" | "deleteLast" | "dequeue_rear"
            | "dequeue_back" | "pop_back" | "remove_rear" | "remove_last" => Op::PopBack,
            "popleft" | "delete_front" | "delete_first" | "deleteFront" | "dequeue_front"
            | "pop_front" | "remove_front" | "remove_first" | "dequeue" => Op::PopFront,
            "peek_front" | "get_front" | "getFront" | "front" | "peek_first" | "peek" => {
                Op::PeekFront
            }
            "peek_rear" | "get_rear" | "getRear" | "rear" | "peek_last" => Op::PeekBack,
            "display" | "show" | "print_deque" => Op::Display,
            _ => return None,
        };
        Some(op)
    }

    fn is_insert(self) -> bool {
        matches!(self, Op::PushBack | Op::PushFront)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Restriction {
    None,
    /// Insert at rear only.
    Input,
    /// Delete at rear only.
    Output,
}

impl Restriction {
    fn blocks(self, op: Op) -> Option<&'static str> {
        match (self, op) {
            (Restriction::Input, Op::PushFront) => {
                Some("insertion at front not allowed in input-restricted deque")
            }
            (Restriction::Output, Op::PopFront) => {
                Some("deletion at front not allowed in output-restricted deque")
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Deque {
    items: VecDeque<Literal>,
    capacity: Option<usize>,
}

impl Deque {
    fn step(&self, action: &str, description: String, line: usize) -> Step {
        let json: Vec<Value> = self.items.iter().map(Literal::to_json).collect();
        let (head, tail) = if self.items.is_empty() {
            (-1, -1)
        } else {
            (0, self.items.len() as i64 - 1)
        };
        let mut step = Step::new(action, description)
            .with_line(line)
            .with_buffer(json.clone())
            .with_pointers(head, tail)
            .with_var("deque_state", json)
            .with_var("front", self.items.front().map_or(Value::Null, Literal::to_json))
            .with_var("rear", self.items.back().map_or(Value::Null, Literal::to_json))
            .with_var("size", self.items.len());
        if let Some(cap) = self.capacity {
            step = step.with_var("capacity", cap);
        }
        step
    }

    fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.items.len() >= cap)
    }

    fn apply(&mut self, op: Op, value: Option<Literal>, line: usize) -> Step {
        match op {
            Op::PushBack | Op::PushFront => {
                let value = value.unwrap_or(Literal::None);
                if self.is_full() {
                    return self
                        .step("overflow", format!("Deque is full - {value} ignored"), line)
                        .with_value(value.to_json());
                }
                let json = value.to_json();
                let (action, description) = if op == Op::PushBack {
                    let d = format!("Inserted {value} at rear");
                    self.items.push_back(value);
                    ("enqueue_back", d)
                } else {
                    let d = format!("Inserted {value} at front");
                    self.items.push_front(value);
                    ("enqueue_front", d)
                };
                self.step(action, description, line).with_value(json)
            }
            Op::PopBack | Op::PopFront => {
                let (removed, action, end) = if op == Op::PopBack {
                    (self.items.pop_back(), "dequeue_back", "rear")
                } else {
                    (self.items.pop_front(), "dequeue_front", "front")
                };
                match removed {
                    Some(v) => self
                        .step(action, format!("Removed {v} from {end}"), line)
                        .with_value(v.to_json()),
                    None => self.step(
                        "underflow",
                        format!("Deque is empty - cannot remove from {end}"),
                        line,
                    ),
                }
            }
            Op::PeekFront | Op::PeekBack => {
                let (item, action, end) = if op == Op::PeekFront {
                    (self.items.front(), "peek_front", "Front")
                } else {
                    (self.items.back(), "peek_back", "Rear")
                };
                match item {
                    Some(v) => {
                        let json = v.to_json();
                        self.step(action, format!("{end} element is {v}"), line).with_value(json)
                    }
                    None => self.step(action, "Deque is empty".into(), line),
                }
            }
            Op::Display => {
                let shown: Vec<Value> = self.items.iter().map(Literal::to_json).collect();
                self.step("display", format!("Display deque {}", Value::Array(shown)), line)
            }
        }
    }
}

pub fn simulate(code: &str, kind: QueueKind) -> Translation {
    let restriction = match kind {
        QueueKind::InputRestrictedDeque => Restriction::Input,
        QueueKind::OutputRestrictedDeque => Restriction::Output,
        _ => Restriction::None,
    };
    let circular = kind == QueueKind::CircularDeque;
    let mut deque = Deque {
        items: VecDeque::new(),
        capacity: circular.then_some(DEFAULT_CAPACITY),
    };
    let mut env = Env::default();
    let mut steps = Vec::new();
    let mut started = false;

    for line in extract::scan(code) {
        env.observe(&line);

        if circular && !started {
            if let Some(cap) = extract::capacity_hint(line.text) {
                deque.capacity = Some(cap);
            }
        }

        for call in extract::calls(line.text) {
            let Some(op) = Op::classify(&call) else {
                continue;
            };
            let (receiver, operand) = if op.is_insert() {
                match insert_operands(&call) {
                    Some((r, x)) => (r, Some(x)),
                    None => continue,
                }
            } else {
                match nullary_receiver(&call) {
                    Some(r) => (r, None),
                    None => continue,
                }
            };
            if line.is_definition(receiver, operand) {
                continue;
            }
            started = true;

            if let Some(reason) = restriction.blocks(op) {
                let shown = format!("{}({})", call.name, call.args.join(", "));
                steps.push(
                    deque
                        .step("error", format!("{shown} blocked: {reason}"), line.number)
                        .with_extra("blocked", shown),
                );
                continue;
            }

            match operand {
                Some(operand) => {
                    for value in env.expand(operand) {
                        steps.push(deque.apply(op, Some(value), line.number));
                    }
                }
                None => {
                    let rounds = if matches!(op, Op::PopBack | Op::PopFront) {
                        env.iterations()
                    } else {
                        1
                    };
                    for _ in 0..rounds {
                        steps.push(deque.apply(op, None, line.number));
                    }
                }
            }
        }
    }

    let mut meta = Meta::new(Concept::Queue(kind));
    if let Some(cap) = deque.capacity {
        meta = meta.with_extra("capacity", cap);
    }
    Translation::new(steps, meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn actions(t: &Translation) -> Vec<&str> {
        t.steps.iter().map(|s| s.action.as_str()).collect()
    }

    #[test]
    fn collections_deque_operations() {
        let code = "from collections import deque\nd = deque()\nd.append(1)\nd.appendleft(0)\nd.pop()\nd.popleft()\nd.popleft()\n";
        let t = simulate(code, QueueKind::Deque);
        assert_eq!(
            actions(&t),
            vec!["enqueue_back", "enqueue_front", "dequeue_back", "dequeue_front", "underflow"]
        );
        assert_eq!(t.steps[1].vars["deque_state"], json!([0, 1]));
    }

    #[test]
    fn input_restricted_blocks_front_insert() {
        let code = "d.insert_rear(1)\nd.insert_front(2)\nd.delete_front()\n";
        let t = simulate(code, QueueKind::InputRestrictedDeque);
        assert_eq!(actions(&t), vec!["enqueue_back", "error", "dequeue_front"]);
        assert_eq!(t.steps[1].vars["deque_state"], json!([1]));
        assert_eq!(t.steps[1].extra["blocked"], "insert_front(2)");
    }

    #[test]
    fn output_restricted_blocks_front_delete() {
        let code = "d.insert_front(1)\nd.insert_rear(2)\nd.delete_front()\nd.delete_rear()\n";
        let t = simulate(code, QueueKind::OutputRestrictedDeque);
        assert_eq!(
            actions(&t),
            vec!["enqueue_front", "enqueue_back", "error", "dequeue_back"]
        );
    }

    #[test]
    fn circular_deque_enforces_capacity() {
        let code = "dq = CircularDeque(2)\ndq.insert_rear(1)\ndq.insert_front(2)\ndq.insert_rear(3)\n";
        let t = simulate(code, QueueKind::CircularDeque);
        assert_eq!(actions(&t), vec!["enqueue_back", "enqueue_front", "overflow"]);
        assert_eq!(t.meta.extra["capacity"], 2);
    }
}
