//! Variable paths
//!
//! A path addresses a location inside a [`VariableContext`](crate::VariableContext):
//! `patient.weight`, `values[0]`, `data.measurements[0].values[1]`,
//! `labs["serum creatinine"]`.
//!
//! Parsing is permissive. Characters that cannot start or continue a segment
//! are skipped rather than rejected, so a malformed path simply fails to
//! resolve.

use std::fmt;

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Property name (`.name` or `["name"]`)
    Key(String),
    /// Sequence index (`[n]`); negative indices never resolve
    Index(i64),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Parse a path into segments
///
/// # Examples
/// ```
/// use dosekit_core::{parse_path, PathSegment};
///
/// assert_eq!(
///     parse_path("data.values[1]"),
///     vec![
///         PathSegment::Key("data".into()),
///         PathSegment::Key("values".into()),
///         PathSegment::Index(1),
///     ]
/// );
/// assert_eq!(parse_path("values[-1]"), vec![
///     PathSegment::Key("values".into()),
///     PathSegment::Index(-1),
/// ]);
/// ```
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let chars: Vec<char> = path.trim().chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                flush_key(&mut current, &mut segments);
                i += 1;
            }
            '[' => {
                flush_key(&mut current, &mut segments);
                i = parse_bracket(&chars, i + 1, &mut segments);
            }
            c if is_key_char(c) => {
                current.push(c);
                i += 1;
            }
            // Unparseable character
            _ => i += 1,
        }
    }

    flush_key(&mut current, &mut segments);
    segments
}

/// The leading identifier of a path (`patient.weight` → `patient`)
pub fn root_identifier(path: &str) -> &str {
    let path = path.trim();
    let end = path.find(|c| c == '.' || c == '[').unwrap_or(path.len());
    &path[..end]
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn flush_key(current: &mut String, segments: &mut Vec<PathSegment>) {
    if !current.is_empty() {
        segments.push(PathSegment::Key(std::mem::take(current)));
    }
}

/// Parse the inside of `[...]` starting just after the `[`.
/// Returns the position just after the closing `]` (or the end of input).
fn parse_bracket(chars: &[char], start: usize, segments: &mut Vec<PathSegment>) -> usize {
    let mut i = start;

    // Quoted key: ["name"] or ['name']
    if let Some(&quote) = chars.get(i).filter(|c| **c == '"' || **c == '\'') {
        i += 1;
        let mut key = String::new();
        while i < chars.len() && chars[i] != quote {
            key.push(chars[i]);
            i += 1;
        }
        // Skip closing quote, then anything up to ']'
        while i < chars.len() && chars[i] != ']' {
            i += 1;
        }
        if !key.is_empty() {
            segments.push(PathSegment::Key(key));
        }
        return (i + 1).min(chars.len());
    }

    let mut content = String::new();
    while i < chars.len() && chars[i] != ']' {
        if !chars[i].is_whitespace() {
            content.push(chars[i]);
        }
        i += 1;
    }

    if let Ok(index) = content.parse::<i64>() {
        segments.push(PathSegment::Index(index));
    } else {
        let key: String = content.chars().filter(|c| is_key_char(*c)).collect();
        if !key.is_empty() {
            segments.push(PathSegment::Key(key));
        }
    }

    (i + 1).min(chars.len())
}
