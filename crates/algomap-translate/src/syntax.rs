//! Python syntax trees via tree-sitter.

use tree_sitter::{Node, Parser, Tree};

use crate::error::TranslateError;

pub fn parse_python(code: &str) -> Result<Tree, TranslateError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_python::language())?;
    parser.parse(code, None).ok_or_else(|| TranslateError::Parse {
        family: "python",
        reason: "parser returned no tree".to_string(),
    })
}

/// Source text of `node`, or `""` if it is not valid UTF-8.
pub fn text<'a>(node: &Node<'_>, code: &'a str) -> &'a str {
    node.utf8_text(code.as_bytes()).unwrap_or("")
}

/// 1-based line number of `node`.
pub fn line(node: &Node<'_>) -> usize {
    node.start_position().row + 1
}

pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Counts nodes of the given kinds anywhere under `node`.
pub fn count_kinds(node: &Node<'_>, kinds: &[&str]) -> usize {
    let own = usize::from(kinds.contains(&node.kind()));
    own + named_children(node)
        .iter()
        .map(|c| count_kinds(c, kinds))
        .sum::<usize>()
}
