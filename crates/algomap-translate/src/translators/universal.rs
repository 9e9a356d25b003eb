//! Family-agnostic fallback: one step per assignment, loop, call, return
//! and print statement, in source order, each carrying a running snapshot
//! of the variables assigned so far.

use algomap_core::{Concept, Literal, Meta, Step, Translation};
use indexmap::IndexMap;
use serde_json::Value;
use tree_sitter::Node;

use crate::error::TranslateError;
use crate::syntax::{self, named_children};
use crate::translator::Translator;

#[derive(Debug, Clone, Copy, Default)]
pub struct UniversalTranslator;

struct Walker<'c> {
    code: &'c str,
    vars: IndexMap<String, Value>,
    steps: Vec<Step>,
}

impl<'c> Walker<'c> {
    fn emit(&mut self, action: &str, description: String, node: &Node<'_>) {
        let mut step = Step::new(action, description).with_line(syntax::line(node));
        step.vars = self.vars.clone();
        self.steps.push(step);
    }

    fn text(&self, node: &Node<'_>) -> &'c str {
        syntax::text(node, self.code)
    }

    fn walk(&mut self, node: Node<'_>) {
        match node.kind() {
            "expression_statement" => {
                for child in named_children(&node) {
                    self.statement(child);
                }
            }
            "for_statement" | "while_statement" => {
                let header = self.text(&node).lines().next().unwrap_or("");
                let header = header.trim().trim_end_matches(':').to_string();
                self.emit("loop", format!("Loop: {header}"), &node);
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk(body);
                }
                if let Some(alt) = node.child_by_field_name("alternative") {
                    self.walk(alt);
                }
            }
            "return_statement" => {
                let value = self.text(&node).trim_start_matches("return").trim();
                let d = if value.is_empty() {
                    "Return".to_string()
                } else {
                    format!("Return {value}")
                };
                self.emit("return", d, &node);
            }
            "comment" | "import_statement" | "import_from_statement" => {}
            _ => {
                for child in named_children(&node) {
                    self.walk(child);
                }
            }
        }
    }

    fn statement(&mut self, node: Node<'_>) {
        match node.kind() {
            "assignment" => {
                let (Some(left), Some(right)) = (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("right"),
                ) else {
                    return;
                };
                let (name, rhs) = (self.text(&left), self.text(&right));
                self.vars.insert(name.to_string(), snapshot_value(rhs));
                self.emit("assign", format!("Set {name} = {rhs}"), &node);
            }
            "augmented_assignment" => {
                let (Some(left), Some(op), Some(right)) = (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("operator"),
                    node.child_by_field_name("right"),
                ) else {
                    return;
                };
                let (name, op, rhs) = (self.text(&left), self.text(&op), self.text(&right));
                let operand = self
                    .vars
                    .get(rhs)
                    .and_then(Value::as_i64)
                    .or_else(|| Literal::lenient(rhs).as_i64());
                let updated = self
                    .vars
                    .get(name)
                    .and_then(Value::as_i64)
                    .zip(operand)
                    .and_then(|(a, b)| match op {
                        "+=" => a.checked_add(b),
                        "-=" => a.checked_sub(b),
                        "*=" => a.checked_mul(b),
                        _ => None,
                    });
                let value = updated
                    .map_or_else(|| Value::from(format!("{name} {op} {rhs}")), Value::from);
                self.vars.insert(name.to_string(), value);
                self.emit("augassign", format!("Update {name} {op} {rhs}"), &node);
            }
            "call" => {
                let function = node
                    .child_by_field_name("function")
                    .map(|f| self.text(&f))
                    .unwrap_or("");
                let args = node
                    .child_by_field_name("arguments")
                    .map(|a| self.text(&a))
                    .unwrap_or("()");
                if function == "print" {
                    let shown = args.trim_start_matches('(').trim_end_matches(')');
                    self.emit("print", format!("Print {shown}"), &node);
                } else {
                    self.emit("call", format!("Call {function}{args}"), &node);
                }
            }
            _ => {}
        }
    }
}

fn snapshot_value(rhs: &str) -> Value {
    match Literal::parse(rhs) {
        Ok(lit) => lit.to_json(),
        Err(_) => Value::from(rhs.trim()),
    }
}

impl Translator for UniversalTranslator {
    fn name(&self) -> &'static str {
        "universal"
    }

    fn min_steps(&self) -> usize {
        1
    }

    fn simulate(&self, code: &str, concept: &Concept) -> Result<Translation, TranslateError> {
        let tree = syntax::parse_python(code)?;
        let mut walker = Walker {
            code,
            vars: IndexMap::new(),
            steps: Vec::new(),
        };
        walker.walk(tree.root_node());
        if walker.steps.is_empty() {
            walker.steps.push(Step::note("No recognizable actions found"));
        }
        Ok(Translation::new(walker.steps, Meta::new(concept.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(code: &str) -> Translation {
        UniversalTranslator.simulate(code, &Concept::Unknown).unwrap()
    }

    #[test]
    fn steps_follow_source_order_with_snapshots() {
        let code = "\
x = 1
total = 0
for i in range(3):
    total += x
print(total)
helper(x, 2)
";
        let t = run(code);
        let actions: Vec<_> = t.steps.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(actions, vec!["assign", "assign", "loop", "augassign", "print", "call"]);
        assert_eq!(t.steps[3].vars["total"], json!(1));
        assert_eq!(t.steps[2].description, "Loop: for i in range(3)");
        assert_eq!(t.steps[5].description, "Call helper(x, 2)");
        assert_eq!(t.steps[4].line, Some(5));
    }

    #[test]
    fn function_bodies_are_walked() {
        let t = run("def f(a):\n    b = a * 2\n    return b\n");
        let actions: Vec<_> = t.steps.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(actions, vec!["assign", "return"]);
    }

    #[test]
    fn nothing_recognizable_is_a_note() {
        let t = run("import os\n");
        assert_eq!(t.steps.len(), 1);
        assert!(t.steps[0].is_note());
        assert_eq!(t.substantive_len(), 0);
    }
}
