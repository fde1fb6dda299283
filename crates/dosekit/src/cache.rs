//! Result cache keyed by formula text and context contents

use crate::engine::CalculationResult;
use ahash::AHashMap;
use dosekit_core::VariableContext;

/// Identity of one calculation: the expression plus the canonical text of
/// the context it ran against
///
/// The full text is kept rather than a digest, so two different requests
/// can never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    expression: String,
    context: String,
}

impl Fingerprint {
    /// Fingerprint an expression evaluated against `context`
    pub fn new(expression: &str, context: &VariableContext) -> Self {
        Self {
            expression: expression.to_string(),
            context: context.to_canonical_string(),
        }
    }

    /// The expression text
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

/// Stored results, owned by one engine
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: AHashMap<Fingerprint, CalculationResult>,
}

impl ResultCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored result; the copy returned is marked `cached`
    pub fn get(&self, key: &Fingerprint) -> Option<CalculationResult> {
        self.entries.get(key).map(|result| CalculationResult {
            cached: true,
            ..result.clone()
        })
    }

    /// Store a result
    pub fn insert(&mut self, key: Fingerprint, result: CalculationResult) {
        self.entries.insert(
            key,
            CalculationResult {
                cached: false,
                ..result
            },
        );
    }

    /// Number of stored results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every stored result
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
