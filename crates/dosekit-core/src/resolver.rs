//! Variable resolution
//!
//! Resolution never fails: every "not found" condition (missing key, wrong
//! container kind, index out of bounds, negative index) yields `None`.

use crate::context::VariableContext;
use crate::path::{parse_path, PathSegment};
use crate::value::VariableValue;
use serde::Serialize;

/// Resolve a path against a context, falling back to `defaults`
///
/// The context always wins when it holds a value at `path`, including
/// `null`, `0` and `false`.
///
/// # Examples
/// ```
/// use dosekit_core::{resolve, VariableContext, VariableValue};
///
/// let ctx = VariableContext::from_json_str(r#"{"values": [10, 20, 30]}"#).unwrap();
/// assert_eq!(resolve("values[1]", &ctx, None), Some(&VariableValue::Number(20.0)));
/// assert_eq!(resolve("values[5]", &ctx, None), None);
/// assert_eq!(resolve("values[-1]", &ctx, None), None);
/// ```
pub fn resolve<'a>(
    path: &str,
    context: &'a VariableContext,
    defaults: Option<&'a VariableContext>,
) -> Option<&'a VariableValue> {
    let segments = parse_path(path);
    resolve_segments(&segments, context, defaults)
}

/// Resolve pre-parsed segments against a context, falling back to `defaults`
pub fn resolve_segments<'a>(
    segments: &[PathSegment],
    context: &'a VariableContext,
    defaults: Option<&'a VariableContext>,
) -> Option<&'a VariableValue> {
    walk(segments, context).or_else(|| defaults.and_then(|d| walk(segments, d)))
}

fn walk<'a>(segments: &[PathSegment], context: &'a VariableContext) -> Option<&'a VariableValue> {
    let (first, rest) = segments.split_first()?;

    let mut current = match first {
        PathSegment::Key(key) => context.get(key)?,
        PathSegment::Index(i) if *i >= 0 => context.get(&i.to_string())?,
        PathSegment::Index(_) => return None,
    };

    for segment in rest {
        current = step(current, segment)?;
    }

    Some(current)
}

fn step<'a>(value: &'a VariableValue, segment: &PathSegment) -> Option<&'a VariableValue> {
    match (value, segment) {
        (VariableValue::Map(map), PathSegment::Key(key)) => map.get(key),
        (VariableValue::Map(map), PathSegment::Index(i)) if *i >= 0 => map.get(&i.to_string()),
        (VariableValue::List(items), PathSegment::Index(i)) => {
            usize::try_from(*i).ok().and_then(|i| items.get(i))
        }
        // `values.0` addresses a list element like `values[0]`
        (VariableValue::List(items), PathSegment::Key(key)) => {
            key.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        _ => None,
    }
}

/// Outcome of [`validate_variables`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// True when every path resolved
    pub is_valid: bool,
    /// Paths that did not resolve, in input order
    pub missing: Vec<String>,
}

/// Check that every path resolves in `context` or `defaults`
pub fn validate_variables<I, S>(
    paths: I,
    context: &VariableContext,
    defaults: Option<&VariableContext>,
) -> ValidationReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let missing: Vec<String> = paths
        .into_iter()
        .filter(|path| resolve(path.as_ref(), context, defaults).is_none())
        .map(|path| path.as_ref().to_string())
        .collect();

    ValidationReport {
        is_valid: missing.is_empty(),
        missing,
    }
}

/// Deep-merge contexts left to right
///
/// Lists replace the accumulated value wholesale, nested contexts merge
/// recursively, everything else overwrites. Later contexts win.
pub fn merge_contexts<'a, I>(contexts: I) -> VariableContext
where
    I: IntoIterator<Item = &'a VariableContext>,
{
    contexts
        .into_iter()
        .fold(VariableContext::new(), |mut merged, context| {
            merged.merge(context);
            merged
        })
}
