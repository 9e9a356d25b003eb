//! Fixed-capacity circular queue.
//!
//! The ring is empty when `head == tail == -1` and full when
//! `(tail + 1) % capacity == head`. Overflow and underflow are explicit
//! steps that leave the buffer untouched.

use algomap_core::{Concept, Literal, Meta, QueueKind, Step, Translation};
use serde_json::Value;

use super::{insert_operands, nullary_receiver, DEFAULT_CAPACITY};
use crate::extract::{self, Env};

const ENQUEUE: &[&str] = &["enqueue", "en_queue", "enQueue", "insert", "append", "push"];
const DEQUEUE: &[&str] = &["dequeue", "de_queue", "deQueue", "delete", "popleft"];
const PEEK: &[&str] = &["peek", "front", "Front", "get_front"];
const DISPLAY: &[&str] = &["display", "show", "print_queue"];
const CLEAR: &[&str] = &["clear", "reset"];

/// Ring-buffer state. Public so property tests can drive it directly.
#[derive(Debug, Clone)]
pub struct Ring {
    capacity: usize,
    slots: Vec<Option<Literal>>,
    head: i64,
    tail: i64,
}

impl Ring {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slots: vec![None; capacity],
            head: -1,
            tail: -1,
        }
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    pub fn tail(&self) -> i64 {
        self.tail
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.head == -1
    }

    pub fn is_full(&self) -> bool {
        !self.is_empty() && (self.tail + 1) % self.capacity as i64 == self.head
    }

    /// Live elements from head to tail.
    pub fn live(&self) -> Vec<Literal> {
        if self.is_empty() {
            return Vec::new();
        }
        let cap = self.capacity as i64;
        let mut out = Vec::new();
        let mut i = self.head;
        loop {
            if let Some(v) = &self.slots[i as usize] {
                out.push(v.clone());
            }
            if i == self.tail {
                break;
            }
            i = (i + 1) % cap;
        }
        out
    }

    pub fn buffer(&self) -> Vec<Value> {
        self.slots
            .iter()
            .map(|s| s.as_ref().map_or(Value::Null, Literal::to_json))
            .collect()
    }

    fn step(&self, action: &str, description: String, line: usize) -> Step {
        let live = self.live();
        Step::new(action, description)
            .with_line(line)
            .with_buffer(self.buffer())
            .with_pointers(self.head, self.tail)
            .with_var("queue", extract::to_json_array(&live))
            .with_var("front", live.first().map_or(Value::Null, Literal::to_json))
            .with_var("rear", live.last().map_or(Value::Null, Literal::to_json))
            .with_var("size", live.len())
            .with_var("capacity", self.capacity)
    }

    pub fn enqueue(&mut self, value: Literal, line: usize) -> Step {
        if self.is_full() {
            return self
                .step("overflow", format!("Queue is full - {value} ignored"), line)
                .with_value(value.to_json());
        }
        if self.is_empty() {
            self.head = 0;
            self.tail = 0;
        } else {
            self.tail = (self.tail + 1) % self.capacity as i64;
        }
        let description = format!("Enqueued {value} at index {}", self.tail);
        let json = value.to_json();
        self.slots[self.tail as usize] = Some(value);
        self.step("enqueue", description, line).with_value(json)
    }

    pub fn dequeue(&mut self, line: usize) -> Step {
        if self.is_empty() {
            return self.step("underflow", "Queue is empty - dequeue ignored".into(), line);
        }
        let index = self.head;
        let value = self.slots[index as usize].take();
        if self.head == self.tail {
            self.head = -1;
            self.tail = -1;
        } else {
            self.head = (self.head + 1) % self.capacity as i64;
        }
        let shown = value.as_ref().map_or_else(|| "None".to_string(), Literal::to_string);
        let step = self.step("dequeue", format!("Dequeued {shown} from index {index}"), line);
        match value {
            Some(v) => step.with_value(v.to_json()),
            None => step,
        }
    }

    fn peek(&self, line: usize) -> Step {
        match self.live().first() {
            Some(v) => self
                .step("peek", format!("Front element is {v}"), line)
                .with_value(v.to_json()),
            None => self.step("peek", "Queue is empty; no front element".into(), line),
        }
    }

    fn clear(&mut self, action: &str, description: String, line: usize) -> Step {
        *self = Ring::new(self.capacity);
        self.step(action, description, line)
    }
}

pub fn simulate(code: &str) -> Translation {
    let mut ring = Ring::new(DEFAULT_CAPACITY);
    let mut started = false;
    let mut env = Env::default();
    let mut steps = Vec::new();

    for line in extract::scan(code) {
        env.observe(&line);

        if let Some(capacity) = extract::capacity_hint(line.text) {
            if !started {
                ring = Ring::new(capacity);
            } else if !line.is_definition(None, None) {
                let mut resized = Ring::new(capacity);
                let step = resized.clear(
                    "resize",
                    format!("Resize buffer to {capacity}; queue reset"),
                    line.number,
                );
                ring = resized;
                steps.push(step);
            }
        }

        for call in extract::calls(line.text) {
            if call.is(ENQUEUE) {
                let Some((receiver, operand)) = insert_operands(&call) else {
                    continue;
                };
                if line.is_definition(receiver, Some(operand)) {
                    continue;
                }
                for value in env.expand(operand) {
                    steps.push(ring.enqueue(value, line.number));
                }
                started = true;
            } else if call.is(DEQUEUE) {
                let Some(receiver) = nullary_receiver(&call) else {
                    continue;
                };
                if line.is_definition(receiver, None) {
                    continue;
                }
                for _ in 0..env.iterations() {
                    steps.push(ring.dequeue(line.number));
                }
                started = true;
            } else if call.is(PEEK) || call.is(DISPLAY) || call.is(CLEAR) {
                let Some(receiver) = nullary_receiver(&call) else {
                    continue;
                };
                if line.is_definition(receiver, None) {
                    continue;
                }
                let step = if call.is(PEEK) {
                    ring.peek(line.number)
                } else if call.is(DISPLAY) {
                    let shown = Value::Array(extract::to_json_array(&ring.live()));
                    ring.step("display", format!("Display queue {shown}"), line.number)
                } else {
                    ring.clear("clear", "Clear queue".into(), line.number)
                };
                steps.push(step);
                started = true;
            }
        }
    }

    let meta =
        Meta::new(Concept::Queue(QueueKind::Circular)).with_extra("capacity", ring.capacity());
    Translation::new(steps, meta)
}
