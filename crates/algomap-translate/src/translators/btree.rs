//! B-Tree translator.
//!
//! The simulation is schematic: with minimum degree `t` a node holds at most
//! `2t - 1` keys, so every `2t - 1`-th insertion splits the current leaf
//! window around its median and promotes the median to the parent level.

use algomap_core::{Concept, Literal, Meta, Step, Translation, TreeKind};
use serde_json::Value;

use crate::error::TranslateError;
use crate::extract::{self, Env};
use crate::translator::Translator;

/// Minimum degree of the simulated tree.
pub const MIN_DEGREE: usize = 3;

const INSERT: &[&str] = &["insert", "add", "insert_key", "insert_non_full", "put"];

#[derive(Debug, Clone, Copy, Default)]
pub struct BTreeTranslator;

fn json(keys: &[Literal]) -> Value {
    Value::Array(extract::to_json_array(keys))
}

impl Translator for BTreeTranslator {
    fn name(&self) -> &'static str {
        "btree"
    }

    fn min_steps(&self) -> usize {
        3
    }

    fn simulate(&self, code: &str, _concept: &Concept) -> Result<Translation, TranslateError> {
        let mut keys: Vec<Literal> = Vec::new();
        let mut env = Env::default();
        for line in extract::scan(code) {
            env.observe(&line);
            for call in extract::calls(line.text) {
                if !call.is(INSERT) {
                    continue;
                }
                let receiver = call
                    .receiver
                    .or_else(|| (call.args.len() > 1).then(|| call.args[0]));
                let Some(operand) = call.last_arg() else { continue };
                if line.is_definition(receiver, Some(operand)) {
                    continue;
                }
                for key in env.expand_known(operand) {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
        }

        let t = MIN_DEGREE;
        let max_keys = 2 * t - 1;
        let mut steps = Vec::new();
        if keys.is_empty() {
            return Ok(Translation::new(steps, Meta::new(Concept::Tree(TreeKind::BTree))));
        }

        steps.push(
            Step::new("init", format!("Initialize B-Tree with minimum degree t = {t}"))
                .with_var("t", t)
                .with_var("keys", json(&keys)),
        );
        steps.push(
            Step::new(
                "info",
                format!("Each node holds at most {max_keys} keys; a full node splits at its median"),
            )
            .with_var("max_keys", max_keys)
            .with_var("min_keys", t - 1),
        );
        steps.push(
            Step::new("create_node", "Create empty root node")
                .with_node("root")
                .with_var("node_keys", Value::Array(Vec::new())),
        );

        let mut promoted: Vec<Literal> = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            let so_far = &keys[..=i];
            steps.push(
                Step::new("insert", format!("Insert key {key}"))
                    .with_value(key.to_json())
                    .with_var("inserted", json(so_far))
                    .with_var("promoted", json(&promoted)),
            );
            if (i + 1) % max_keys == 0 {
                let mid = &keys[i - 2];
                let left = &keys[i.saturating_sub(4)..i - 2];
                let right = &keys[i - 1..=i];
                steps.push(
                    Step::new(
                        "split_node",
                        format!("Node is full ({max_keys} keys): split around median {mid}"),
                    )
                    .with_value(mid.to_json())
                    .with_var("left", json(left))
                    .with_var("right", json(right))
                    .with_var("median", mid.to_json()),
                );
                promoted.push(mid.clone());
                steps.push(
                    Step::new("promote", format!("Promote {mid} to the parent node"))
                        .with_value(mid.to_json())
                        .with_var("promoted", json(&promoted)),
                );
            } else {
                steps.push(
                    Step::new("insert_leaf", format!("Place {key} in leaf node"))
                        .with_value(key.to_json())
                        .with_var("inserted", json(so_far)),
                );
            }
        }

        steps.push(
            Step::new("finish", format!("B-Tree holds {} keys", keys.len()))
                .with_var("keys", json(&keys))
                .with_var("promoted", json(&promoted)),
        );

        let meta = Meta::new(Concept::Tree(TreeKind::BTree)).with_extra("degree", t);
        Ok(Translation::new(steps, meta))
    }
}
