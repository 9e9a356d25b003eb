//! Admission check run before translation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::syntax;

pub const MAX_LINES: usize = 1000;
pub const MAX_LOOPS: usize = 10;

static DSA_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(stack|queue|linked|list|tree|graph|sort|search|insert|delete|enqueue|dequeue|push|pop)",
    )
        .expect("valid keyword pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Invalid,
    TooLong,
    TooDeep,
    /// Parses, but has no data-structure vocabulary; only the universal
    /// fallback will have anything to say.
    Generic,
    Valid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Admission {
    pub admitted: bool,
    pub category: Category,
    pub reason: String,
}

impl Admission {
    fn reject(category: Category, reason: impl Into<String>) -> Self {
        Self {
            admitted: false,
            category,
            reason: reason.into(),
        }
    }

    fn accept(category: Category, reason: &str) -> Self {
        Self {
            admitted: true,
            category,
            reason: reason.to_string(),
        }
    }
}

pub fn admit(code: &str) -> Admission {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Admission::reject(Category::Invalid, "empty code");
    }
    if trimmed.lines().count() > MAX_LINES {
        return Admission::reject(Category::TooLong, "code too long for visualization");
    }
    let tree = match syntax::parse_python(code) {
        Ok(tree) => tree,
        Err(err) => return Admission::reject(Category::Invalid, err.to_string()),
    };
    let root = tree.root_node();
    if root.has_error() {
        return Admission::reject(Category::Invalid, "syntax error");
    }
    if syntax::count_kinds(&root, &["for_statement", "while_statement"]) > MAX_LOOPS {
        return Admission::reject(Category::TooDeep, "too many loops for animation");
    }
    if !DSA_WORDS.is_match(code) {
        return Admission::accept(Category::Generic, "generic code, universal fallback only");
    }
    Admission::accept(Category::Valid, "code suitable for visualization")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_broken_code() {
        assert_eq!(admit("   \n").category, Category::Invalid);
        let broken = admit("def f(:\n    return");
        assert!(!broken.admitted);
        assert_eq!(broken.category, Category::Invalid);
    }

    #[test]
    fn limits_length_and_loops() {
        let long = "x = 1\n".repeat(MAX_LINES + 1);
        assert_eq!(admit(&long).category, Category::TooLong);
        let loops = "for i in range(2):\n    pass\n".repeat(MAX_LOOPS + 1);
        assert_eq!(admit(&loops).category, Category::TooDeep);
    }

    #[test]
    fn classifies_admitted_code() {
        assert_eq!(admit("s = []\ns.append(1)\ns.pop()\n").category, Category::Valid);
        let generic = admit("x = 1\nprint(x)\n");
        assert!(generic.admitted);
        assert_eq!(generic.category, Category::Generic);
    }
}
