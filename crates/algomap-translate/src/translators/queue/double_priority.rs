//! Double-ended priority queue: both the minimum and the maximum can be
//! removed. Simulated as an ordered list.

use algomap_core::{Concept, Literal, Meta, QueueKind, Step, Translation};
use serde_json::Value;

use super::insert_operands;
use crate::extract::{self, Env};

const INSERT: &[&str] = &["insert", "push", "enqueue", "add"];
const DELETE_MIN: &[&str] = &["delete_min", "pop_min", "remove_min", "extract_min"];
const DELETE_MAX: &[&str] = &["delete_max", "pop_max", "remove_max", "extract_max"];
const PEEK_MIN: &[&str] = &["peek_min", "get_min", "find_min", "min_item"];
const PEEK_MAX: &[&str] = &["peek_max", "get_max", "find_max", "max_item"];

#[derive(Debug, Default)]
struct Ordered {
    items: Vec<Literal>,
}

impl Ordered {
    fn step(&self, action: &str, description: String, line: usize) -> Step {
        let json = extract::to_json_array(&self.items);
        Step::new(action, description)
            .with_line(line)
            .with_heap(json.clone())
            .with_var("items", json)
            .with_var("min", self.items.first().map_or(Value::Null, Literal::to_json))
            .with_var("max", self.items.last().map_or(Value::Null, Literal::to_json))
    }

    fn insert(&mut self, value: Literal) -> usize {
        // after any equal elements
        let at = self.items.partition_point(|x| *x <= value);
        self.items.insert(at, value);
        at
    }
}

pub fn simulate(code: &str) -> Translation {
    let mut list = Ordered::default();
    let mut env = Env::default();
    let mut steps = Vec::new();

    for line in extract::scan(code) {
        env.observe(&line);
        for call in extract::calls(line.text) {
            if call.is(INSERT) {
                let Some((receiver, operand)) = insert_operands(&call) else {
                    continue;
                };
                if line.is_definition(receiver, Some(operand)) {
                    continue;
                }
                for value in env.expand(operand) {
                    let json = value.to_json();
                    let description = format!("Insert {value}");
                    let at = list.insert(value);
                    steps.push(
                        list.step("insert", description, line.number)
                            .with_value(json)
                            .with_extra("index", at),
                    );
                }
                continue;
            }

            let is_delete_min = call.is(DELETE_MIN);
            let is_delete_max = call.is(DELETE_MAX);
            let is_peek_min = call.is(PEEK_MIN);
            let is_peek_max = call.is(PEEK_MAX);
            if !(is_delete_min || is_delete_max || is_peek_min || is_peek_max) {
                continue;
            }
            if call.args.len() > 1 || line.is_definition(call.receiver.or(call.arg(0)), None) {
                continue;
            }
            let rounds = if is_delete_min || is_delete_max {
                env.iterations()
            } else {
                1
            };
            for _ in 0..rounds {
                let step = if list.items.is_empty() {
                    list.step("underflow", "Queue is empty".into(), line.number)
                } else if is_delete_min {
                    let v = list.items.remove(0);
                    list.step("delete_min", format!("Removed minimum {v}"), line.number)
                        .with_value(v.to_json())
                } else if is_delete_max {
                    let v = list.items.pop().unwrap_or(Literal::None);
                    list.step("delete_max", format!("Removed maximum {v}"), line.number)
                        .with_value(v.to_json())
                } else {
                    let (action, v) = if is_peek_min {
                        ("peek_min", &list.items[0])
                    } else {
                        ("peek_max", &list.items[list.items.len() - 1])
                    };
                    let json = v.to_json();
                    let side = if is_peek_min { "Minimum" } else { "Maximum" };
                    let description = format!("{side} is {v}");
                    list.step(action, description, line.number).with_value(json)
                };
                steps.push(step);
            }
        }
    }

    Translation::new(steps, Meta::new(Concept::Queue(QueueKind::DoublePriority)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removes_from_both_ends() {
        let code = "dq.insert(5)\ndq.insert(1)\ndq.insert(9)\ndq.delete_max()\ndq.delete_min()\ndq.peek_min()\n";
        let t = simulate(code);
        let actions: Vec<_> = t.steps.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(
            actions,
            vec!["insert", "insert", "insert", "delete_max", "delete_min", "peek_min"]
        );
        assert_eq!(t.steps[3].value, Some(json!(9)));
        assert_eq!(t.steps[4].value, Some(json!(1)));
        assert_eq!(t.steps[5].vars["items"], json!([5]));
    }

    #[test]
    fn empty_removal_is_underflow() {
        let t = simulate("dq.delete_min()\ndq.insert(2)\n");
        assert_eq!(t.steps[0].action, "underflow");
    }
}
