//! Dependency tracking between named formulas

use std::collections::{BTreeMap, BTreeSet};

/// Result of ordering a dependency graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationOrder {
    /// Formulas in an order where every precedent comes first
    pub order: Vec<String>,
    /// Formulas that can never be ordered: cycle members and everything
    /// that depends on a cycle
    pub unresolved: Vec<String>,
}

impl EvaluationOrder {
    /// Whether every formula could be ordered
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Dependency graph for named formulas
///
/// Tracks which formulas read which other formulas. Only names registered
/// with [`add_node`](Self::add_node) or appearing in an edge are part of
/// the graph; references to context variables are not edges.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Formula → Formulas that depend on it (dependents)
    dependents: BTreeMap<String, BTreeSet<String>>,
    /// Formula → Formulas it depends on (precedents)
    precedents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a formula with no dependencies yet
    pub fn add_node(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.dependents.entry(name.clone()).or_default();
        self.precedents.entry(name).or_default();
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: impl Into<String>, dependent: impl Into<String>) {
        let precedent = precedent.into();
        let dependent = dependent.into();
        self.add_node(precedent.clone());
        self.add_node(dependent.clone());

        self.dependents
            .entry(precedent.clone())
            .or_default()
            .insert(dependent.clone());
        self.precedents.entry(dependent).or_default().insert(precedent);
    }

    /// Get formulas that depend on the given formula
    pub fn get_dependents<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.dependents
            .get(name)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Get formulas that the given formula depends on
    pub fn get_precedents<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.precedents
            .get(name)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Whether the formula is part of the graph
    pub fn contains(&self, name: &str) -> bool {
        self.precedents.contains_key(name)
    }

    /// Number of formulas in the graph
    pub fn len(&self) -> usize {
        self.precedents.len()
    }

    /// Whether the graph has no formulas
    pub fn is_empty(&self) -> bool {
        self.precedents.is_empty()
    }

    /// Order all formulas so that precedents come before dependents
    ///
    /// Repeatedly takes every formula whose precedents are all ordered.
    /// Among formulas that become ready together the order is by name.
    /// Whatever never becomes ready is returned in `unresolved`.
    pub fn evaluation_order(&self) -> EvaluationOrder {
        let mut remaining: BTreeMap<&str, usize> = self
            .precedents
            .iter()
            .map(|(name, precs)| (name.as_str(), precs.len()))
            .collect();

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&name, _)| name)
            .collect();

        let mut order = Vec::with_capacity(remaining.len());

        while let Some(name) = ready.pop_first() {
            remaining.remove(name);
            order.push(name.to_string());

            for dependent in self.get_dependents(name) {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        let unresolved = remaining.keys().map(|name| name.to_string()).collect();

        EvaluationOrder { order, unresolved }
    }

    /// Whether the formula lies on a cycle, i.e. it can reach itself by
    /// following precedents
    ///
    /// Formulas that merely depend on a cycle are not on it.
    pub fn is_in_cycle(&self, name: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<&str> = self.get_precedents(name).collect();

        while let Some(next) = stack.pop() {
            if next == name {
                return true;
            }
            if visited.insert(next) {
                stack.extend(self.get_precedents(next));
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("base", "double");

        assert!(graph.get_dependents("base").any(|n| n == "double"));
        assert!(graph.get_precedents("double").any(|n| n == "base"));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_evaluation_order() {
        let mut graph = DependencyGraph::new();
        graph.add_node("base");
        graph.add_dependency("double", "sum");
        graph.add_dependency("triple", "sum");
        graph.add_dependency("base", "double");
        graph.add_dependency("base", "triple");

        let order = graph.evaluation_order();
        assert!(order.is_complete());
        assert_eq!(order.order, vec!["base", "double", "triple", "sum"]);
    }

    #[test]
    fn test_independent_nodes_ordered_by_name() {
        let mut graph = DependencyGraph::new();
        graph.add_node("zeta");
        graph.add_node("alpha");
        graph.add_node("mid");

        assert_eq!(graph.evaluation_order().order, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_circular_reference() {
        let mut graph = DependencyGraph::new();

        // a -> b -> c -> a (circular)
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");
        graph.add_dependency("c", "a");
        graph.add_dependency("c", "tail");
        graph.add_node("free");

        assert!(graph.is_in_cycle("a"));
        assert!(graph.is_in_cycle("b"));
        assert!(graph.is_in_cycle("c"));
        assert!(!graph.is_in_cycle("tail"));
        assert!(!graph.is_in_cycle("free"));

        let order = graph.evaluation_order();
        assert_eq!(order.order, vec!["free"]);
        assert_eq!(order.unresolved, vec!["a", "b", "c", "tail"]);
    }

    #[test]
    fn test_self_reference_is_circular() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("x", "x");

        assert!(graph.is_in_cycle("x"));
        assert_eq!(graph.evaluation_order().unresolved, vec!["x"]);
    }
}
