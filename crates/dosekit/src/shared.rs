//! Thread-safe engine handle for async hosts

use crate::engine::{CalculateOptions, CalculationResult, FormulaEngine};
use dosekit_core::VariableContext;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A [`FormulaEngine`] behind `Arc<Mutex<_>>`
///
/// Clones share one engine and one cache. The async methods never suspend;
/// they exist so the engine can be called from async code without a
/// blocking wrapper.
#[derive(Debug, Clone, Default)]
pub struct SharedFormulaEngine {
    inner: Arc<Mutex<FormulaEngine>>,
}

impl SharedFormulaEngine {
    /// Wrap an engine
    pub fn new(engine: FormulaEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    // Evaluation cannot leave the engine half-updated, so a poisoned lock
    // is still usable.
    fn lock(&self) -> MutexGuard<'_, FormulaEngine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`FormulaEngine::calculate`]
    pub async fn calculate(
        &self,
        expression: &str,
        context: &VariableContext,
        options: &CalculateOptions,
    ) -> CalculationResult {
        self.lock().calculate(expression, context, options)
    }

    /// See [`FormulaEngine::calculate_batch`]
    pub async fn calculate_batch<I, K, V>(
        &self,
        formulas: I,
        context: &VariableContext,
    ) -> BTreeMap<String, CalculationResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.lock().calculate_batch(formulas, context)
    }

    /// See [`FormulaEngine::clear_cache`]
    pub fn clear_cache(&self) {
        self.lock().clear_cache();
    }

    /// See [`FormulaEngine::cache_size`]
    pub fn cache_size(&self) -> usize {
        self.lock().cache_size()
    }
}

impl From<FormulaEngine> for SharedFormulaEngine {
    fn from(engine: FormulaEngine) -> Self {
        Self::new(engine)
    }
}
