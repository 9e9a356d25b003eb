//! The intermediate representation: ordered [`Step`]s plus a [`Meta`]
//! header, bundled as a [`Translation`].
//!
//! Steps serialize to flat JSON objects. Family-specific extras that have no
//! dedicated field are flattened into the same object through `extra`, so a
//! renderer sees `{"action": "compare", "i": 0, "j": 1, ...}`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::concept::{Animator, Concept, Family, GraphKind, ListKind, QueueKind, TreeKind};
use crate::error::CoreError;

/// Rendering hint for the downstream animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Linear,
    Circular,
    Hierarchical,
    Graph,
}

/// One atomic unit of simulated behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub action: String,
    #[serde(default)]
    pub description: String,
    /// Runtime-state snapshot relevant to this step.
    #[serde(default)]
    pub vars: IndexMap<String, Value>,
    /// 1-based source line that triggered the step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heap: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_snapshot: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(flatten, default)]
    pub extra: IndexMap<String, Value>,
}

impl Step {
    pub fn new(action: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            description: description.into(),
            vars: IndexMap::new(),
            line: None,
            value: None,
            node_id: None,
            buffer: None,
            head: None,
            tail: None,
            heap: None,
            stack_snapshot: None,
            source: None,
            target: None,
            extra: IndexMap::new(),
        }
    }

    /// A `note` step carrying an explanation and nothing else.
    pub fn note(description: impl Into<String>) -> Self {
        Step::new("note", description)
    }

    pub fn with_var(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_buffer(mut self, buffer: Vec<Value>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn with_pointers(mut self, head: i64, tail: i64) -> Self {
        self.head = Some(head);
        self.tail = Some(tail);
        self
    }

    pub fn with_heap(mut self, heap: Vec<Value>) -> Self {
        self.heap = Some(heap);
        self
    }

    pub fn with_stack_snapshot(mut self, snapshot: Vec<Value>) -> Self {
        self.stack_snapshot = Some(snapshot);
        self
    }

    pub fn with_edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.target = Some(target.into());
        self
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn is_note(&self) -> bool {
        self.action == "note"
    }
}

/// Header describing a whole translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub kind: Concept,
    #[serde(default)]
    pub family: Family,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_animator: Option<Animator>,
    #[serde(flatten, default)]
    pub extra: IndexMap<String, Value>,
}

fn default_theme() -> String {
    "softblue".to_string()
}

impl Meta {
    /// Meta with the layout and theme conventionally used for `kind`.
    pub fn new(kind: Concept) -> Self {
        let layout = match &kind {
            Concept::Queue(QueueKind::Circular | QueueKind::CircularDeque) => Layout::Circular,
            Concept::LinkedList(list) if list.is_circular() => Layout::Circular,
            Concept::Tree(_) => Layout::Hierarchical,
            Concept::Graph(_) => Layout::Graph,
            _ => Layout::Linear,
        };
        let theme = match &kind {
            Concept::Graph(GraphKind::Bfs) => "softpurple",
            Concept::Graph(GraphKind::Dfs) => "softpink",
            Concept::Graph(_) => "softpurple",
            Concept::Tree(TreeKind::BTree) => "softgreen",
            Concept::LinkedList(ListKind::Doubly | ListKind::CircularDoubly) => "softteal",
            _ => "softblue",
        };
        Self {
            family: kind.family(),
            kind,
            layout,
            theme: theme.to_string(),
            parent_animator: None,
            extra: IndexMap::new(),
        }
    }

    /// Minimal meta used when nothing better is available.
    pub fn fallback(kind: Concept) -> Self {
        Self {
            family: kind.family(),
            kind,
            layout: Layout::Linear,
            theme: default_theme(),
            parent_animator: None,
            extra: IndexMap::new(),
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_theme(mut self, theme: &str) -> Self {
        self.theme = theme.to_string();
        self
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Re-tags the meta with another concept, keeping extras.
    pub fn set_kind(&mut self, kind: Concept) {
        self.family = kind.family();
        self.kind = kind;
    }
}

/// The `{steps, meta}` pair every translator and collaborator produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub steps: Vec<Step>,
    pub meta: Meta,
}

impl Translation {
    pub fn new(steps: Vec<Step>, meta: Meta) -> Self {
        Self { steps, meta }
    }

    /// A single explanatory `note` step with fallback meta.
    pub fn note(kind: Concept, description: impl Into<String>) -> Self {
        Self {
            steps: vec![Step::note(description)],
            meta: Meta::fallback(kind),
        }
    }

    /// Number of steps that are not `note`s.
    pub fn substantive_len(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_note()).count()
    }

    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(text)?;
        if !value.get("steps").is_some_and(Value::is_array) {
            return Err(CoreError::MalformedPayload {
                reason: "missing 'steps' array".to_string(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_serializes_flat_and_omits_absent_fields() {
        let step = Step::new("compare", "Compare 5 and 3")
            .with_var("arr", json!([5, 3]))
            .with_extra("i", 0)
            .with_extra("j", 1);
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["action"], "compare");
        assert_eq!(value["i"], 0);
        assert_eq!(value["vars"]["arr"], json!([5, 3]));
        assert!(value.get("buffer").is_none());
        assert!(value.get("line").is_none());
    }

    #[test]
    fn step_deserializes_with_defaults() {
        let step: Step = serde_json::from_value(json!({"action": "push", "foo": 1})).unwrap();
        assert_eq!(step.description, "");
        assert!(step.vars.is_empty());
        assert_eq!(step.extra["foo"], 1);
    }

    #[test]
    fn meta_defaults_follow_kind() {
        let meta = Meta::new(Concept::Queue(QueueKind::Circular));
        assert_eq!(meta.layout, Layout::Circular);
        assert_eq!(meta.family, Family::Queue);
        let meta = Meta::new(Concept::Graph(GraphKind::Dfs));
        assert_eq!(meta.theme, "softpink");
        assert_eq!(meta.layout, Layout::Graph);
    }

    #[test]
    fn meta_roundtrips_kind_as_label() {
        let meta = Meta::new(Concept::Tree(TreeKind::BTree)).with_extra("degree", 3);
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["kind"], "tree-btree");
        assert_eq!(value["family"], "tree");
        assert_eq!(value["layout"], "hierarchical");
        assert_eq!(value["degree"], 3);
        let back: Meta = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn translation_from_json_requires_steps() {
        let err = Translation::from_json(r#"{"meta": {}}"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPayload { .. }));
        let ok = Translation::from_json(
            r#"{"steps": [{"action": "note"}], "meta": {"kind": "stack", "family": "stack"}}"#,
        )
        .unwrap();
        assert_eq!(ok.meta.kind, Concept::Stack);
        assert_eq!(ok.substantive_len(), 0);
    }
}
