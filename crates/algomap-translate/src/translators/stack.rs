//! Stack translator: `push`/`pop`/`peek` over a simulated LIFO list.

use std::sync::LazyLock;

use algomap_core::{Concept, Literal, Meta, Step, Translation};
use regex::Regex;
use serde_json::Value;

use crate::error::TranslateError;
use crate::extract::{self, Env, SourceLine};
use crate::translator::Translator;

static TOP_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_][\w\.]*)\[\s*-1\s*\]").expect("valid top-index pattern")
});

const PUSH: &[&str] = &["push", "append"];
const POP: &[&str] = &["pop"];
const PEEK: &[&str] = &["peek", "top"];

#[derive(Debug, Default, Clone, Copy)]
pub struct StackTranslator;

/// Simulated stack state for one translation.
#[derive(Debug, Default)]
struct StackState {
    items: Vec<Literal>,
}

impl StackState {
    fn snapshot(&self, action: &str, description: String, line: usize) -> Step {
        let top = self.items.last().map_or(Value::Null, Literal::to_json);
        Step::new(action, description)
            .with_line(line)
            .with_var("stack", extract::to_json_array(&self.items))
            .with_var("top", top)
            .with_var("size", self.items.len())
    }

    fn push(&mut self, value: Literal, line: usize) -> Step {
        let description = format!("Pushed {value} onto stack");
        let json = value.to_json();
        self.items.push(value);
        self.snapshot("push", description, line).with_value(json)
    }

    fn pop(&mut self, line: usize) -> Step {
        match self.items.pop() {
            Some(value) => self
                .snapshot("pop", format!("Popped {value} from stack"), line)
                .with_value(value.to_json()),
            None => self.snapshot("pop_empty", "Tried to pop from empty stack".into(), line),
        }
    }

    fn peek(&self, line: usize) -> Step {
        match self.items.last() {
            Some(value) => self
                .snapshot("peek", format!("Peeked at top element {value}"), line)
                .with_value(value.to_json()),
            None => self.snapshot("peek", "Stack is empty; nothing to peek".into(), line),
        }
    }
}

impl Translator for StackTranslator {
    fn name(&self) -> &'static str {
        "stack"
    }

    fn min_steps(&self) -> usize {
        3
    }

    fn simulate(&self, code: &str, _concept: &Concept) -> Result<Translation, TranslateError> {
        let mut state = StackState::default();
        let mut env = Env::default();
        let mut steps = Vec::new();

        for line in extract::scan(code) {
            env.observe(&line);
            self.scan_line(&line, &env, &mut state, &mut steps);
        }

        let meta = Meta::new(Concept::Stack).with_extra("final_size", state.items.len());
        Ok(Translation::new(steps, meta))
    }
}

impl StackTranslator {
    fn scan_line(
        &self,
        line: &SourceLine<'_>,
        env: &Env,
        state: &mut StackState,
        steps: &mut Vec<Step>,
    ) {
        let mut matched = false;
        for call in extract::calls(line.text) {
            if call.is(PUSH) {
                // `s.push(x)`, `push(x)` or `push(stack, x)`
                let operand = match (call.receiver, call.args.as_slice()) {
                    (Some(_), [x]) | (None, [x]) | (None, [_, x]) => *x,
                    _ => continue,
                };
                let receiver = call
                    .receiver
                    .or_else(|| (call.args.len() == 2).then(|| call.args[0]));
                if line.is_definition(receiver, Some(operand)) {
                    continue;
                }
                for value in env.expand(operand) {
                    steps.push(state.push(value, line.number));
                }
                matched = true;
            } else if call.is(POP) {
                let receiver = match (call.receiver, call.args.as_slice()) {
                    (Some(r), []) => Some(r),
                    (None, []) => None,
                    (None, [s]) => Some(*s),
                    _ => continue,
                };
                if line.is_definition(receiver, None) {
                    continue;
                }
                for _ in 0..env.iterations() {
                    steps.push(state.pop(line.number));
                }
                matched = true;
            } else if call.is(PEEK) && call.args.len() <= 1 {
                let receiver = call.receiver.or_else(|| call.arg(0));
                if line.is_definition(receiver, None) {
                    continue;
                }
                steps.push(state.peek(line.number));
                matched = true;
            }
        }

        if !matched {
            if let Some(caps) = TOP_INDEX.captures(line.text) {
                if !line.is_definition(Some(&caps[1]), None) {
                    steps.push(state.peek(line.number));
                }
            }
        }
    }
}
