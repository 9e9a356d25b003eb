//! Value and pattern extraction from raw source text.
//!
//! Everything here is a pure function of its input and tolerant of broken
//! code: a line that cannot be understood is simply not reported.
//!
//! - [`scan`] splits source into [`SourceLine`]s annotated with the
//!   enclosing `class`/`def` scope, so translators can tell a call site
//!   (`s.push(10)`) from a method definition (`self.items.append(x)`).
//! - [`calls`] lists every `recv.name(args)` / `name(args)` on a line.
//! - [`Env`] tracks `for` loops and constant assignments so an operand like
//!   `v` in `for v in [1, 2, 3]: q.enqueue(v)` expands into three values.
//! - [`extract_array`] and [`capacity_hint`] pull out the literal array and
//!   capacity declarations translators seed their state with.

use std::collections::HashMap;
use std::sync::LazyLock;

use algomap_core::Literal;
use regex::Regex;

/// Loop expansions are capped so `range(10**6)` cannot flood the IR.
pub const MAX_LOOP_VALUES: usize = 64;

/// Array used by sort translators when the source declares none.
pub const FALLBACK_ARRAY: [i64; 5] = [5, 3, 8, 1, 2];

mod patterns {
    use super::*;

    pub static CALL: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?:([A-Za-z_][\w\.]*)\.)?([A-Za-z_]\w*)\s*\(").expect("valid call pattern")
    });
    pub static FOR_HEADER: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^for\s+([A-Za-z_]\w*)\s+in\s+(.+?)\s*:(.*)$").expect("valid for pattern")
    });
    pub static ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^([A-Za-z_]\w*)\s*=\s*([^=].*)$").expect("valid assignment pattern")
    });
    pub static DEF_HEADER: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^(?:async\s+)?def\s+\w+\s*\(([^)]*)\)").expect("valid def pattern")
    });
    pub static ARRAY_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^\s*(?:arr|a|nums?|numbers|array|data|lst|values)\s*=\s*\[")
            .expect("valid array pattern")
    });
    pub static CAPACITY: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\b(?:size|capacity|cap|max_size)\s*=\s*(\d+)")
            .expect("valid capacity pattern")
    });
    pub static CONSTRUCTOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\b\w*(?:Queue|Deque|Buffer)\s*\(\s*(\d+)\s*[,)]")
            .expect("valid constructor pattern")
    });
}

/// One non-blank source line with its lexical context.
#[derive(Debug, Clone)]
pub struct SourceLine<'a> {
    /// 1-based line number.
    pub number: usize,
    pub indent: usize,
    /// Trimmed text with any trailing comment removed.
    pub text: &'a str,
    /// `class` or `def` header line.
    pub is_header: bool,
    /// Inside a class body (method definitions).
    pub in_class: bool,
    /// Inside a function body.
    pub in_def: bool,
    /// Parameters of the innermost enclosing `def`.
    pub params: Vec<String>,
}

impl SourceLine<'_> {
    /// True when an operation on this line is part of a definition rather
    /// than a call site: header lines, class bodies, and function bodies
    /// that operate on the function's own parameters.
    pub fn is_definition(&self, receiver: Option<&str>, operand: Option<&str>) -> bool {
        if self.is_header || self.in_class {
            return true;
        }
        let is_param = |name: Option<&str>| {
            name.map(|n| base_name(n))
                .is_some_and(|n| self.params.iter().any(|p| p == n))
        };
        is_param(receiver) || is_param(operand)
    }
}

enum Block {
    Class(usize),
    Def(usize, Vec<String>),
}

impl Block {
    fn indent(&self) -> usize {
        match self {
            Block::Class(i) | Block::Def(i, _) => *i,
        }
    }
}

/// Splits `code` into annotated lines, skipping blanks and comment-only lines.
pub fn scan(code: &str) -> Vec<SourceLine<'_>> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut lines = Vec::new();

    for (idx, raw) in code.lines().enumerate() {
        let text = strip_comment(raw).trim();
        if text.is_empty() {
            continue;
        }
        let indent = indentation(raw);
        while blocks.last().is_some_and(|b| b.indent() >= indent) {
            blocks.pop();
        }

        let in_class = blocks.iter().any(|b| matches!(b, Block::Class(_)));
        let params = blocks
            .iter()
            .rev()
            .find_map(|b| match b {
                Block::Def(_, params) => Some(params.clone()),
                Block::Class(_) => None,
            })
            .unwrap_or_default();
        let in_def = blocks.iter().any(|b| matches!(b, Block::Def(..)));

        let is_class = text.starts_with("class ");
        let def_params = patterns::DEF_HEADER
            .captures(text)
            .map(|caps| parse_params(&caps[1]));
        let is_header = is_class || def_params.is_some();

        lines.push(SourceLine {
            number: idx + 1,
            indent,
            text,
            is_header,
            in_class,
            in_def,
            params,
        });

        if is_class {
            blocks.push(Block::Class(indent));
        } else if let Some(params) = def_params {
            blocks.push(Block::Def(indent, params));
        }
    }
    lines
}

fn parse_params(raw: &str) -> Vec<String> {
    split_args(raw)
        .into_iter()
        .filter_map(|p| {
            let name = p
                .trim_start_matches('*')
                .split([':', '='])
                .next()
                .unwrap_or("")
                .trim();
            (!name.is_empty() && name != "self").then(|| name.to_string())
        })
        .collect()
}

fn indentation(raw: &str) -> usize {
    raw.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Removes a trailing `#` comment, ignoring `#` inside string literals.
pub fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '#') => return &line[..i],
            _ => {}
        }
    }
    line
}

/// First identifier segment of a dotted or subscripted name:
/// `self.items` -> `self`, `q[0]` -> `q`.
pub fn base_name(name: &str) -> &str {
    let end = name
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(name.len());
    &name[..end]
}

/// A call expression found on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Call<'a> {
    pub receiver: Option<&'a str>,
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

impl<'a> Call<'a> {
    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).copied()
    }

    pub fn last_arg(&self) -> Option<&'a str> {
        self.args.last().copied()
    }

    /// Whether the call is `name(...)` or `recv.name(...)` for any of `names`.
    pub fn is(&self, names: &[&str]) -> bool {
        names.contains(&self.name)
    }
}

/// Lists every call on `text`, outermost first. Nested calls are reported
/// too; calls with unbalanced parentheses are dropped.
pub fn calls(text: &str) -> Vec<Call<'_>> {
    let mut found = Vec::new();
    for caps in patterns::CALL.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let open = whole.end() - 1;
        let Some(close) = matching_paren(text, open) else {
            continue;
        };
        found.push(Call {
            receiver: caps.get(1).map(|m| m.as_str()),
            name: name.as_str(),
            args: split_args(&text[open + 1..close]),
        });
    }
    found
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in text[open..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') | (None, '[') | (None, '{') => depth += 1,
            (None, ')') | (None, ']') | (None, '}') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (c == ')').then_some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits an argument list at top-level commas.
pub fn split_args(raw: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') | (None, '[') | (None, '{') => depth += 1,
            (None, ')') | (None, ']') | (None, '}') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                args.push(raw[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = raw[start..].trim();
    if !tail.is_empty() {
        args.push(tail);
    }
    args
}

// ---------------------------------------------------------------------------
// Operand environment
// ---------------------------------------------------------------------------

struct LoopFrame {
    var: String,
    values: Vec<Literal>,
    indent: usize,
}

/// Loop bindings and constant assignments visible at the current line.
#[derive(Default)]
pub struct Env {
    loops: Vec<LoopFrame>,
    constants: HashMap<String, Literal>,
}

impl Env {
    /// Updates the environment for `line`. Must be called for every scanned
    /// line in order, before resolving operands on it.
    pub fn observe(&mut self, line: &SourceLine<'_>) {
        while self.loops.last().is_some_and(|f| f.indent >= line.indent) {
            self.loops.pop();
        }
        if let Some(caps) = patterns::FOR_HEADER.captures(line.text) {
            if let Some(values) = iterable_values(&caps[2], &self.constants) {
                self.loops.push(LoopFrame {
                    var: caps[1].to_string(),
                    values,
                    indent: line.indent,
                });
            }
            return;
        }
        if line.in_class || line.is_header {
            return;
        }
        if let Some(caps) = patterns::ASSIGN.captures(line.text) {
            match Literal::parse(&caps[2]) {
                Ok(lit) => {
                    self.constants.insert(caps[1].to_string(), lit);
                }
                Err(_) => {
                    self.constants.remove(&caps[1]);
                }
            }
        }
    }

    /// Expands an operand to the literal values it takes: every loop value
    /// for a loop variable, the bound constant for an assigned name, or the
    /// operand itself read leniently.
    pub fn resolve(&self, operand: &str) -> Vec<Literal> {
        let operand = operand.trim();
        if let Some(frame) = self.loops.iter().rev().find(|f| f.var == operand) {
            return frame.values.clone();
        }
        if let Some(lit) = self.constants.get(operand) {
            return vec![lit.clone()];
        }
        vec![Literal::lenient(operand)]
    }

    /// Number of times a statement on the current line runs: the length of
    /// the innermost enclosing `for` loop, or 1 outside loops.
    pub fn iterations(&self) -> usize {
        self.loops.last().map_or(1, |f| f.values.len())
    }

    /// Like [`resolve`](Env::resolve), but an operand that is not a loop
    /// variable repeats once per iteration of the enclosing loop.
    pub fn expand(&self, operand: &str) -> Vec<Literal> {
        if self.is_loop_var(operand) {
            return self.resolve(operand);
        }
        let values = self.resolve(operand);
        (0..self.iterations()).flat_map(|_| values.clone()).collect()
    }

    /// Like [`expand`](Env::expand), but yields nothing for an operand that
    /// is neither a literal, a loop variable nor a known constant.
    pub fn expand_known(&self, operand: &str) -> Vec<Literal> {
        let known = self.is_loop_var(operand)
            || self.constant(operand.trim()).is_some()
            || Literal::parse(operand).is_ok();
        if known {
            self.expand(operand)
        } else {
            Vec::new()
        }
    }

    /// Whether `name` is a loop variable currently in scope.
    pub fn is_loop_var(&self, name: &str) -> bool {
        self.loops.iter().any(|f| f.var == name.trim())
    }

    pub fn constant(&self, name: &str) -> Option<&Literal> {
        self.constants.get(name)
    }
}

fn iterable_values(expr: &str, constants: &HashMap<String, Literal>) -> Option<Vec<Literal>> {
    let expr = expr.trim();
    if let Some(inner) = expr
        .strip_prefix("range")
        .map(str::trim_start)
        .and_then(|r| r.strip_prefix('('))
        .and_then(|r| r.strip_suffix(')'))
    {
        let bounds: Vec<i64> = split_args(inner)
            .into_iter()
            .map(|a| {
                Literal::parse(a)
                    .ok()
                    .or_else(|| constants.get(a).cloned())
                    .and_then(|l| l.as_i64())
            })
            .collect::<Option<Vec<_>>>()?;
        let (start, stop, step) = match bounds.as_slice() {
            [stop] => (0, *stop, 1),
            [start, stop] => (*start, *stop, 1),
            [start, stop, step] if *step != 0 => (*start, *stop, *step),
            _ => return None,
        };
        let mut values = Vec::new();
        let mut v = start;
        while (step > 0 && v < stop) || (step < 0 && v > stop) {
            values.push(Literal::Int(v));
            if values.len() >= MAX_LOOP_VALUES {
                break;
            }
            match v.checked_add(step) {
                Some(next) => v = next,
                None => break,
            }
        }
        return Some(values);
    }
    let lit = Literal::parse(expr)
        .ok()
        .or_else(|| constants.get(expr).cloned())?;
    lit.items().map(|items| items.iter().take(MAX_LOOP_VALUES).cloned().collect())
}

// ---------------------------------------------------------------------------
// Literal hints
// ---------------------------------------------------------------------------

/// First integer array assigned to a conventional name (`arr`, `a`, `nums`,
/// ...), or failing that the first integer-list argument of any call.
pub fn extract_array(code: &str) -> Option<Vec<i64>> {
    for m in patterns::ARRAY_ASSIGN.find_iter(code) {
        let open = m.end() - 1;
        if let Some(values) = int_list_at(&code[open..]) {
            return Some(values);
        }
    }
    for line in scan(code) {
        if line.is_header {
            continue;
        }
        for call in calls(line.text) {
            if let Some(values) = call.args.iter().find_map(|a| int_list_at(a)) {
                return Some(values);
            }
        }
    }
    None
}

/// [`extract_array`] with the fallback array.
pub fn extract_array_or_default(code: &str) -> Vec<i64> {
    extract_array(code).unwrap_or_else(|| FALLBACK_ARRAY.to_vec())
}

fn int_list_at(text: &str) -> Option<Vec<i64>> {
    let (lit, _) = Literal::parse_prefix(text).ok()?;
    let Literal::List(items) = lit else {
        return None;
    };
    if items.is_empty() {
        return None;
    }
    items.iter().map(Literal::as_i64).collect()
}

/// Capacity declared on `line`: `size = 5`, `capacity=5`, `cap = 5`,
/// or a constructor such as `CircularQueue(5)`.
pub fn capacity_hint(line: &str) -> Option<usize> {
    patterns::CAPACITY
        .captures(line)
        .or_else(|| patterns::CONSTRUCTOR.captures(line))
        .and_then(|caps| caps[1].parse().ok())
        .filter(|&n: &usize| n > 0)
}

/// Integer value of `name = <int>` anywhere in `code`.
pub fn int_assignment(code: &str, names: &[&str]) -> Option<i64> {
    scan(code).into_iter().find_map(|line| {
        let caps = patterns::ASSIGN.captures(line.text)?;
        if !names.contains(&&caps[1]) {
            return None;
        }
        Literal::parse(&caps[2]).ok()?.as_i64()
    })
}

/// JSON array of literal values.
pub fn to_json_array(values: &[Literal]) -> Vec<serde_json::Value> {
    values.iter().map(Literal::to_json).collect()
}
