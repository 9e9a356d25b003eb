//! k queues sharing one fixed-size array.

use std::collections::VecDeque;

use algomap_core::{Concept, Literal, Meta, QueueKind, Step, Translation};
use serde_json::Value;

use crate::extract::{self, Env};

pub const DEFAULT_K: usize = 3;
pub const DEFAULT_CAPACITY: usize = 10;

struct KQueues {
    queues: Vec<VecDeque<Literal>>,
    capacity: usize,
}

impl KQueues {
    fn used(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    fn step(&self, action: &str, description: String, line: usize, queue: usize) -> Step {
        let queues: Vec<Value> = self
            .queues
            .iter()
            .map(|q| Value::Array(q.iter().map(Literal::to_json).collect()))
            .collect();
        Step::new(action, description)
            .with_line(line)
            .with_var("queues", queues)
            .with_var("free", self.capacity.saturating_sub(self.used()))
            .with_extra("queue", queue)
    }

    fn enqueue(&mut self, qn: usize, value: Literal, line: usize) -> Step {
        if qn >= self.queues.len() {
            return self.step("error", format!("Queue {qn} does not exist"), line, qn);
        }
        if self.used() >= self.capacity {
            return self
                .step("overflow", format!("No free slot for {value} in queue {qn}"), line, qn)
                .with_value(value.to_json());
        }
        let json = value.to_json();
        let description = format!("Enqueued {value} into queue {qn}");
        self.queues[qn].push_back(value);
        self.step("enqueue", description, line, qn).with_value(json)
    }

    fn dequeue(&mut self, qn: usize, line: usize) -> Step {
        if qn >= self.queues.len() {
            return self.step("error", format!("Queue {qn} does not exist"), line, qn);
        }
        match self.queues[qn].pop_front() {
            Some(v) => self
                .step("dequeue", format!("Dequeued {v} from queue {qn}"), line, qn)
                .with_value(v.to_json()),
            None => self.step("underflow", format!("Queue {qn} is empty"), line, qn),
        }
    }
}

/// Queue index from `q2`, `2`, or a bound constant.
fn queue_index(arg: &str, env: &Env) -> Option<usize> {
    let arg = arg.trim();
    let digits = arg.strip_prefix('q').or_else(|| arg.strip_prefix('Q')).unwrap_or(arg);
    digits
        .parse::<usize>()
        .ok()
        .or_else(|| env.constant(arg).and_then(Literal::as_i64).map(|v| v as usize))
}

fn is_named_queue(arg: &str) -> bool {
    let arg = arg.trim();
    arg.len() > 1
        && arg.starts_with(['q', 'Q'])
        && arg[1..].chars().all(|c| c.is_ascii_digit())
}

pub fn simulate(code: &str) -> Translation {
    let k = extract::int_assignment(code, &["k", "K", "num_queues"])
        .map_or(DEFAULT_K, |v| v.max(1) as usize);
    let capacity = extract::int_assignment(code, &["n", "N", "capacity", "size", "cap"])
        .map_or(DEFAULT_CAPACITY, |v| v.max(1) as usize);
    let mut state = KQueues {
        queues: vec![VecDeque::new(); k],
        capacity,
    };
    let mut env = Env::default();
    let mut steps = Vec::new();

    for line in extract::scan(code) {
        env.observe(&line);
        for call in extract::calls(line.text) {
            match (call.name, call.args.as_slice()) {
                ("enqueue", [a, b]) => {
                    // `enqueue(q1, x)` names the queue first; method-style
                    // `ks.enqueue(x, 1)` passes the item first.
                    let (qn_arg, operand) = if is_named_queue(a) || call.receiver.is_none() {
                        (*a, *b)
                    } else {
                        (*b, *a)
                    };
                    if line.is_definition(call.receiver, Some(operand))
                        || line.is_definition(None, Some(qn_arg))
                    {
                        continue;
                    }
                    let Some(qn) = queue_index(qn_arg, &env) else { continue };
                    for value in env.expand(operand) {
                        steps.push(state.enqueue(qn, value, line.number));
                    }
                }
                ("dequeue", [a]) => {
                    if line.is_definition(call.receiver, Some(*a)) {
                        continue;
                    }
                    let Some(qn) = queue_index(a, &env) else { continue };
                    for _ in 0..env.iterations() {
                        steps.push(state.dequeue(qn, line.number));
                    }
                }
                _ => {}
            }
        }
    }

    let meta = Meta::new(Concept::Queue(QueueKind::KQueues))
        .with_extra("k", k)
        .with_extra("capacity", capacity);
    Translation::new(steps, meta)
}
