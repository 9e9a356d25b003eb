//! Python literal values as they appear in student source text.
//!
//! Translators never evaluate code; they only lift literal operands
//! (`10`, `"A"`, `(2, "x")`, `[5, 3, 8]`, `{"A": ["B"]}`) out of call sites
//! and assignments. [`Literal`] is the value model for those operands and
//! [`Literal::parse`] is a small recursive-descent reader for the subset of
//! Python literal syntax we care about.
//!
//! Ordering is total so literals can key heaps and be sorted
//! deterministically: `None < Bool < number < text < tuple < list < dict`.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::error::CoreError;

/// A parsed Python literal.
#[derive(Debug, Clone)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Tuple(Vec<Literal>),
    List(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Parses a complete literal. Trailing non-whitespace input is an error.
    pub fn parse(text: &str) -> Result<Literal, CoreError> {
        let mut parser = LiteralParser::new(text);
        let value = parser.value()?;
        parser.skip_trivia();
        if !parser.at_end() {
            return Err(parser.error("trailing input after literal"));
        }
        Ok(value)
    }

    /// Parses a literal at the start of `text` and returns it together with
    /// the number of bytes consumed.
    pub fn parse_prefix(text: &str) -> Result<(Literal, usize), CoreError> {
        let mut parser = LiteralParser::new(text);
        let value = parser.value()?;
        Ok((value, parser.pos))
    }

    /// Best-effort operand reader: parses `text` as a literal, falling back to
    /// the trimmed source text with surrounding quotes removed.
    pub fn lenient(text: &str) -> Literal {
        let trimmed = text.trim();
        match Literal::parse(trimmed) {
            Ok(lit) => lit,
            Err(_) => Literal::Text(trimmed.trim_matches(|c| c == '"' || c == '\'').to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Int(v) => Some(*v),
            Literal::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Literal::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Int(v) => Some(*v as f64),
            Literal::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list or tuple.
    pub fn items(&self) -> Option<&[Literal]> {
        match self {
            Literal::List(items) | Literal::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Literal::Int(_) | Literal::Float(_))
    }

    /// Display label used when a literal names a node (graph vertex, dict key).
    pub fn label(&self) -> String {
        match self {
            Literal::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Literal::None => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(v) => Value::from(*v),
            Literal::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::Text(s) => Value::String(s.clone()),
            Literal::Tuple(items) | Literal::List(items) => {
                Value::Array(items.iter().map(Literal::to_json).collect())
            }
            Literal::Dict(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.label(), v.to_json()))
                    .collect(),
            ),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Literal::None => 0,
            Literal::Bool(_) => 1,
            Literal::Int(_) | Literal::Float(_) => 2,
            Literal::Text(_) => 3,
            Literal::Tuple(_) => 4,
            Literal::List(_) => 5,
            Literal::Dict(_) => 6,
        }
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        lit.to_json()
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        lit.to_json()
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_string())
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Literal::Int(a), Literal::Int(b)) => a.cmp(b),
            (a, b) if a.is_number() && b.is_number() => {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (Literal::Bool(a), Literal::Bool(b)) => a.cmp(b),
            (Literal::Text(a), Literal::Text(b)) => a.cmp(b),
            (Literal::Tuple(a), Literal::Tuple(b)) | (Literal::List(a), Literal::List(b)) => {
                a.cmp(b)
            }
            (Literal::Dict(a), Literal::Dict(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Literal {}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => write!(f, "None"),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::Text(s) => write!(f, "{s}"),
            Literal::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Literal::List(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Literal::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_nested(f, k)?;
                    write!(f, ": ")?;
                    write_nested(f, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Literal]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_nested(f, item)?;
    }
    Ok(())
}

// Nested strings keep their quotes so `['a', 'b']` reads like Python.
fn write_nested(f: &mut fmt::Formatter<'_>, lit: &Literal) -> fmt::Result {
    match lit {
        Literal::Text(s) => write!(f, "'{s}'"),
        other => write!(f, "{other}"),
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct LiteralParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, reason: &str) -> CoreError {
        CoreError::InvalidLiteral {
            offset: self.pos,
            reason: reason.to_string(),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Skips whitespace, newlines and `#` comments.
    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b'\\' {
                self.pos += 1;
            } else if b == b'#' {
                while let Some(c) = self.peek() {
                    if c == b'\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn value(&mut self) -> Result<Literal, CoreError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'[') => {
                self.pos += 1;
                let items = self.sequence(b']')?.0;
                Ok(Literal::List(items))
            }
            Some(b'(') => {
                self.pos += 1;
                let (mut items, trailing_comma) = self.sequence(b')')?;
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Literal::Tuple(items))
                }
            }
            Some(b'{') => {
                self.pos += 1;
                self.dict()
            }
            Some(b'"') | Some(b'\'') => self.string(),
            Some(b) if b.is_ascii_digit() || b == b'-' || b == b'+' || b == b'.' => self.number(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.keyword(),
            Some(_) => Err(self.error("unexpected character")),
        }
    }

    /// Parses comma-separated values up to `close`. Returns the items and
    /// whether the final item was followed by a comma.
    fn sequence(&mut self, close: u8) -> Result<(Vec<Literal>, bool), CoreError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok((items, trailing_comma));
            }
            items.push(self.value()?);
            trailing_comma = false;
            self.skip_trivia();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    trailing_comma = true;
                }
                Some(b) if b == close => {}
                _ => return Err(self.error("expected ',' or closing bracket")),
            }
        }
    }

    fn dict(&mut self) -> Result<Literal, CoreError> {
        let mut entries = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                return Ok(Literal::Dict(entries));
            }
            let key = self.value()?;
            self.skip_trivia();
            if self.peek() != Some(b':') {
                return Err(self.error("expected ':' in dict"));
            }
            self.pos += 1;
            let value = self.value()?;
            entries.push((key, value));
            self.skip_trivia();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {}
                _ => return Err(self.error("expected ',' or '}' in dict")),
            }
        }
    }

    fn string(&mut self) -> Result<Literal, CoreError> {
        let quote = self.bytes[self.pos];
        self.pos += 1;
        let start = self.pos;
        let mut escaped = false;
        while let Some(b) = self.peek() {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == quote {
                let raw = &self.src[start..self.pos];
                self.pos += 1;
                return Ok(Literal::Text(unescape(raw)));
            } else if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> Result<Literal, CoreError> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' | b'_' => {}
                b'.' => is_float = true,
                b'e' | b'E' => {
                    is_float = true;
                    if matches!(self.bytes.get(self.pos + 1), Some(b'-') | Some(b'+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }
        let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        if is_float {
            text.parse::<f64>()
                .map(Literal::Float)
                .map_err(|_| self.error("invalid float"))
        } else {
            text.parse::<i64>()
                .map(Literal::Int)
                .map_err(|_| self.error("invalid integer"))
        }
    }

    fn keyword(&mut self) -> Result<Literal, CoreError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            _ => {
                self.pos = start;
                Err(self.error("identifier is not a literal"))
            }
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
