//! IR post-processing: step normalization, compression of long remote
//! results, the learned-action cache and segment merging.

use std::collections::{BTreeSet, HashSet};

use algomap_core::{Concept, Step, Translation};
use algomap_storage::{ActionCache, StorageError};
use tracing::info;

/// Actions that never need to be learned.
pub const ALWAYS_KEEP: [&str; 4] = ["initialize", "set_value", "update_var", "log"];

/// Pure iteration markers removed by [`compress`].
const ITERATION_MARKERS: [&str; 3] = ["loop_start", "loop_end", "iteration"];

/// Fills an empty description with the action tag.
pub fn normalize(steps: &mut [Step]) {
    for step in steps.iter_mut() {
        if step.description.trim().is_empty() {
            step.description = step.action.clone();
        }
    }
}

/// Drops a step identical in action and description to the one before it.
pub fn collapse_duplicates(steps: Vec<Step>) -> Vec<Step> {
    let mut out: Vec<Step> = Vec::with_capacity(steps.len());
    for step in steps {
        let repeat = out
            .last()
            .is_some_and(|prev| prev.action == step.action && prev.description == step.description);
        if !repeat {
            out.push(step);
        }
    }
    out
}

/// Removes iteration markers and keeps only the latest of consecutive
/// `stack_push` steps.
pub fn compress(steps: Vec<Step>) -> Vec<Step> {
    let mut out: Vec<Step> = Vec::with_capacity(steps.len());
    for step in steps {
        let action = step.action.to_ascii_lowercase();
        if ITERATION_MARKERS.contains(&action.as_str()) {
            continue;
        }
        if action == "stack_push"
            && out
                .last()
                .is_some_and(|prev| prev.action.eq_ignore_ascii_case("stack_push"))
        {
            out.pop();
        }
        out.push(step);
    }
    out
}

/// Records every action of `steps` outside [`ALWAYS_KEEP`] in the cache for
/// `concept`. Returns the actions that were new.
pub fn learn_actions(
    cache: &dyn ActionCache,
    concept: &Concept,
    steps: &[Step],
) -> Result<BTreeSet<String>, StorageError> {
    let seen: BTreeSet<String> = steps
        .iter()
        .map(|s| s.action.to_ascii_lowercase())
        .filter(|a| !a.is_empty() && !ALWAYS_KEEP.contains(&a.as_str()))
        .collect();
    if seen.is_empty() {
        return Ok(BTreeSet::new());
    }
    let label = concept.to_string();
    let added = cache.learn(&label, &seen)?;
    if !added.is_empty() {
        info!(concept = %label, added = ?added, "learned new actions");
    }
    Ok(added)
}

/// Concatenates segment translations, keeping the first occurrence of each
/// description and the first segment's meta.
pub fn merge_segments(segments: Vec<Translation>) -> Option<Translation> {
    let mut segments = segments.into_iter();
    let first = segments.next()?;
    let meta = first.meta.clone();
    let mut seen = HashSet::new();
    let mut steps = Vec::new();
    for step in std::iter::once(first).chain(segments).flat_map(|t| t.steps) {
        if seen.insert(step.description.clone()) {
            steps.push(step);
        }
    }
    Some(Translation::new(steps, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use algomap_core::Meta;
    use algomap_storage::InMemoryStore;

    fn steps(actions: &[&str]) -> Vec<Step> {
        actions
            .iter()
            .enumerate()
            .map(|(i, a)| Step::new(*a, format!("{a} {i}")))
            .collect()
    }

    #[test]
    fn normalize_fills_missing_descriptions() {
        let mut s = vec![Step::new("push", ""), Step::new("pop", "Popped 1")];
        normalize(&mut s);
        assert_eq!(s[0].description, "push");
        assert_eq!(s[1].description, "Popped 1");
    }

    #[test]
    fn collapse_keeps_non_adjacent_repeats() {
        let s = vec![
            Step::new("visit", "Visit A"),
            Step::new("visit", "Visit A"),
            Step::new("visit", "Visit B"),
            Step::new("visit", "Visit A"),
        ];
        let out = collapse_duplicates(s);
        let descs: Vec<_> = out.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(descs, ["Visit A", "Visit B", "Visit A"]);
    }

    #[test]
    fn compress_drops_markers_and_collapses_pushes() {
        let s = steps(&[
            "loop_start",
            "stack_push",
            "stack_push",
            "stack_push",
            "ITERATION",
            "compare",
            "stack_push",
            "loop_end",
        ]);
        let out = compress(s);
        let descs: Vec<_> = out.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(descs, ["stack_push 3", "compare 5", "stack_push 6"]);
    }

    #[test]
    fn learning_skips_always_kept_actions() {
        let store = InMemoryStore::new();
        let s = steps(&["initialize", "visit", "visit", "relax", "log"]);
        let added = learn_actions(&store, &Concept::Stack, &s).unwrap();
        let expected: BTreeSet<String> = ["relax".to_string(), "visit".to_string()].into();
        assert_eq!(added, expected);
        assert!(learn_actions(&store, &Concept::Stack, &s).unwrap().is_empty());
    }

    #[test]
    fn merge_dedupes_by_description() {
        let a = Translation::new(
            vec![Step::new("push", "Pushed 1"), Step::new("push", "Pushed 2")],
            Meta::new(Concept::Stack),
        );
        let b = Translation::new(
            vec![Step::new("push", "Pushed 2"), Step::new("pop", "Popped 2")],
            Meta::new(Concept::parse("queue-linear")),
        );
        let merged = merge_segments(vec![a, b]).unwrap();
        assert_eq!(merged.steps.len(), 3);
        assert_eq!(merged.meta.kind, Concept::Stack);
        assert!(merge_segments(Vec::new()).is_none());
    }
}
