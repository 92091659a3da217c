//! Post-processing helpers for free-form model output.
//!
//! - [`extract_code`] pulls the first fenced code block out of a response.
//! - [`parse_function_call`] reads a call written as `name(key=value, ...)`.
//!
//! Parameter values are parsed with a small literal grammar (integers, floats,
//! quoted strings, booleans, null). Nothing is ever evaluated.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```.*?\n(.*?)\n```").expect("code block pattern is valid")
});

static CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<name>\w+)\((?P<params>.*)\)$").expect("call pattern is valid")
});

static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<key>\w+)\s*=\s*(?P<value>[^,]+)").expect("param pattern is valid")
});

// ---------------------------------------------------------------------------
// Code blocks
// ---------------------------------------------------------------------------

/// Returns the trimmed body of the first fenced code block, or `""`.
///
/// The opening fence may carry a language tag; everything up to the first
/// newline after it is skipped.
pub fn extract_code(text: &str) -> String {
    CODE_BLOCK
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Function calls
// ---------------------------------------------------------------------------

/// A literal parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Literal {
    /// Parses one literal, returning `None` for anything outside the grammar.
    ///
    /// Integers must fit in an `i64`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw {
            "" => return None,
            "True" | "true" => return Some(Self::Bool(true)),
            "False" | "false" => return Some(Self::Bool(false)),
            "None" | "null" => return Some(Self::Null),
            _ => {}
        }
        if let Some(s) = parse_quoted(raw) {
            return Some(Self::Str(s));
        }
        let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            // Integers outside i64 are rejected rather than widened to a float.
            return raw.parse::<i64>().ok().map(Self::Int);
        }
        let numeric = raw.chars().any(|c| c.is_ascii_digit())
            && raw
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        if numeric {
            return raw.parse::<f64>().ok().map(Self::Float);
        }
        None
    }
}

/// Parses `'...'` or `"..."` with backslash escapes. An unescaped closing quote
/// before the end of input is rejected.
fn parse_quoted(raw: &str) -> Option<String> {
    let quote = raw.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    if raw.len() < 2 || !raw.ends_with(quote) {
        return None;
    }
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                e @ ('\\' | '\'' | '"') => out.push(e),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            c if c == quote => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

/// A parsed `name(key=value, ...)` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub parameters: BTreeMap<String, Literal>,
}

/// Parses `name(key=value, ...)`.
///
/// Returns `None` if the text is not shaped like a call or if any value falls
/// outside the literal grammar. Values are split on commas, so a quoted string
/// containing a comma does not parse.
pub fn parse_function_call(text: &str) -> Option<FunctionCall> {
    let caps = CALL.captures(text.trim())?;
    let name = caps.name("name")?.as_str().to_string();
    let params = caps.name("params").map_or("", |m| m.as_str());

    let mut parameters = BTreeMap::new();
    for param in PARAM.captures_iter(params) {
        let key = param.name("key")?.as_str().to_string();
        let value = Literal::parse(param.name("value")?.as_str())?;
        parameters.insert(key, value);
    }
    Some(FunctionCall { name, parameters })
}
