//! Tolerant decoding of model output into a [`Translation`].
//!
//! Model replies wrap JSON in code fences, lead with prose or get cut off
//! mid-object. Decoding never fails: anything unusable becomes an empty
//! translation with linear/softblue meta.

use std::sync::LazyLock;

use algomap_core::{Concept, Meta, Step, Translation};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z]*").expect("valid code fence pattern"));

/// Finds the outermost JSON object in `text`, repairing missing closing
/// braces when the reply was truncated.
pub fn extract_object(text: &str) -> Option<Map<String, Value>> {
    let clean = FENCE.replace_all(text, "");
    let start = clean.find('{')?;
    let tail = &clean[start..];
    let candidates = [
        tail.rfind('}').map(|end| tail[..=end].to_string()),
        Some(balance(tail)),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&candidate) {
            return Some(map);
        }
    }
    debug!("no decodable JSON object in reply");
    None
}

/// Appends the closing braces and brackets a truncated object is missing.
fn balance(text: &str) -> String {
    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                open.pop();
            }
            _ => {}
        }
    }
    let mut out = text.trim_end().trim_end_matches(',').to_string();
    if in_string {
        out.push('"');
    }
    out.extend(open.into_iter().rev());
    out
}

/// Decodes a reconstruction reply. Steps without an `action` are dropped;
/// a meta that cannot be read falls back to the concept's defaults.
pub fn decode_translation(text: &str, concept: &Concept) -> Translation {
    let Some(mut object) = extract_object(text) else {
        warn!(concept = %concept, "reconstruction reply was not JSON; using empty plan");
        return Translation::new(Vec::new(), Meta::fallback(concept.clone()));
    };

    let steps: Vec<Step> = match object.remove("steps") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    };

    let meta = match object.remove("meta") {
        Some(Value::Object(map)) => decode_meta(map, concept),
        _ => Meta::fallback(concept.clone()),
    };
    Translation::new(steps, meta)
}

fn decode_meta(mut map: Map<String, Value>, concept: &Concept) -> Meta {
    if let Some(Value::Object(mut plan)) = map.remove("animation_plan") {
        for key in ["objects", "operations"] {
            if let Some(value) = plan.remove(key) {
                map.insert(key.to_string(), value);
            }
        }
    }
    // The router assigns the animator tag itself.
    map.remove("parent_animator");
    map.entry("kind")
        .or_insert_with(|| Value::String(concept.to_string()));
    serde_json::from_value(Value::Object(map)).unwrap_or_else(|err| {
        debug!(%err, "remote meta unreadable; using defaults");
        Meta::fallback(concept.clone())
    })
}

/// Copies every local meta entry the remote meta lacks.
pub fn merge_meta(remote: &mut Meta, local: &Meta) {
    for (key, value) in &local.extra {
        remote
            .extra
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algomap_core::{Layout, QueueKind};
    use serde_json::json;

    #[test]
    fn strips_fences_and_prose() {
        let reply = "Sure! Here it is:\n```json\n{\"steps\":[{\"action\":\"push\",\"description\":\"Push 1\"}],\"meta\":{\"layout\":\"linear\",\"theme\":\"softgreen\"}}\n```";
        let t = decode_translation(reply, &Concept::Stack);
        assert_eq!(t.steps.len(), 1);
        assert_eq!(t.meta.theme, "softgreen");
        assert_eq!(t.meta.kind, Concept::Stack);
    }

    #[test]
    fn repairs_truncated_reply() {
        let reply = r#"{"steps":[{"action":"enqueue","description":"Enqueue 1"},{"action":"dequeue","description":"Dequeue"#;
        let t = decode_translation(reply, &Concept::Queue(QueueKind::Linear));
        assert_eq!(t.steps.len(), 2);
        assert_eq!(t.steps[1].action, "dequeue");
    }

    #[test]
    fn garbage_gives_empty_default() {
        let t = decode_translation("I cannot help with that.", &Concept::Unknown);
        assert!(t.steps.is_empty());
        assert_eq!(t.meta.layout, Layout::Linear);
        assert_eq!(t.meta.theme, "softblue");
    }

    #[test]
    fn flattens_animation_plan_and_drops_bad_steps() {
        let reply = json!({
            "steps": [{"description": "no action"}, {"action": "log", "description": "ok"}],
            "meta": {
                "layout": "graph",
                "parent_animator": "SomethingElse",
                "animation_plan": {"objects": [1], "operations": [2, 3]}
            }
        })
        .to_string();
        let t = decode_translation(&reply, &Concept::Unknown);
        assert_eq!(t.steps.len(), 1);
        assert_eq!(t.meta.layout, Layout::Graph);
        assert_eq!(t.meta.extra["operations"], json!([2, 3]));
        assert!(!t.meta.extra.contains_key("animation_plan"));
    }

    #[test]
    fn merge_meta_keeps_remote_values() {
        let mut remote = Meta::fallback(Concept::Stack).with_extra("capacity", 4);
        let local = Meta::new(Concept::Stack)
            .with_extra("capacity", 8)
            .with_extra("initial", "[]");
        merge_meta(&mut remote, &local);
        assert_eq!(remote.extra["capacity"], json!(4));
        assert_eq!(remote.extra["initial"], json!("[]"));
    }
}
