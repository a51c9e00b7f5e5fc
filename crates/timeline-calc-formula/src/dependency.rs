//! Dependency tracking between rows
//!
//! The relaxation in `compute_all` never needs an explicit graph. This one is
//! for the tooling around it: rebuilding the configured `directDeps` and
//! `inputDeps` sets from the formulas and spotting circular references.

use crate::ast::FormulaExpr;
use crate::parser::parse_formula;
use std::collections::{BTreeMap, BTreeSet};
use timeline_calc_core::{CellAddress, ReferenceColumns, RowRegistry};

/// Cell references in `expr`, in order of first appearance
pub fn references(expr: &FormulaExpr) -> Vec<CellAddress> {
    let mut out: Vec<CellAddress> = Vec::new();
    collect_references(expr, &mut out);
    out
}

fn collect_references(expr: &FormulaExpr, out: &mut Vec<CellAddress>) {
    match expr {
        FormulaExpr::CellRef(address) => {
            if !out.iter().any(|a| a.key() == address.key()) {
                out.push(*address);
            }
        }
        FormulaExpr::BinaryOp { left, right, .. } => {
            collect_references(left, out);
            collect_references(right, out);
        }
        FormulaExpr::UnaryOp { operand, .. } => collect_references(operand, out),
        FormulaExpr::Function { args, .. } => {
            for arg in args {
                collect_references(arg, out);
            }
        }
        FormulaExpr::Number(_) | FormulaExpr::NameRef(_) => {}
    }
}

/// Dependency graph over row ids
///
/// Only value references create edges; a factor reference reads a constant.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Row → rows it reads
    precedents: BTreeMap<String, BTreeSet<String>>,
    inputs: BTreeSet<String>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every output formula in the registry
    ///
    /// Formulas that fail to parse contribute no edges.
    pub fn from_registry(registry: &RowRegistry, columns: ReferenceColumns) -> Self {
        let mut graph = Self::new();
        graph.inputs = registry.inputs().map(|r| r.id.clone()).collect();

        for row in registry.outputs() {
            let Some(formula) = row.formula() else {
                continue;
            };
            let Ok(expr) = parse_formula(formula) else {
                continue;
            };
            for address in references(&expr) {
                if address.column != columns.value {
                    continue;
                }
                if let Some(precedent) = registry.row_at(&address) {
                    graph.add_dependency(&precedent.id, &row.id);
                }
            }
        }

        graph
    }

    /// Add a dependency: `dependent` reads `precedent`
    pub fn add_dependency(&mut self, precedent: &str, dependent: &str) {
        self.precedents
            .entry(dependent.to_string())
            .or_default()
            .insert(precedent.to_string());
    }

    /// Rows `id` reads directly
    pub fn precedents(&self, id: &str) -> impl Iterator<Item = &str> + '_ {
        self.precedents
            .get(id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Sorted direct precedents of `id`
    pub fn direct_dependencies(&self, id: &str) -> Vec<String> {
        self.precedents(id).map(str::to_string).collect()
    }

    /// Sorted input rows `id` depends on, directly or through other outputs
    pub fn input_dependencies(&self, id: &str) -> Vec<String> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<&str> = self.precedents(id).collect();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            stack.extend(self.precedents(current));
        }

        visited
            .into_iter()
            .filter(|id| self.inputs.contains(*id))
            .map(str::to_string)
            .collect()
    }

    /// Rows that take part in a cycle, sorted
    pub fn cyclic_rows(&self) -> Vec<String> {
        self.precedents
            .keys()
            .filter(|id| self.reaches(id, id))
            .cloned()
            .collect()
    }

    // Whether `to` is reachable from `from` by following precedents at least once
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<&str> = self.precedents(from).collect();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if visited.insert(current) {
                stack.extend(self.precedents(current));
            }
        }
        false
    }
}

/// `directDeps` recomputed from the formulas: output id → sorted row ids
pub fn derived_direct_dependencies(
    registry: &RowRegistry,
    columns: ReferenceColumns,
) -> BTreeMap<String, Vec<String>> {
    let graph = DependencyGraph::from_registry(registry, columns);
    registry
        .outputs()
        .map(|row| (row.id.clone(), graph.direct_dependencies(&row.id)))
        .collect()
}

/// `inputDeps` recomputed from the formulas: output id → sorted input ids
pub fn derived_input_dependencies(
    registry: &RowRegistry,
    columns: ReferenceColumns,
) -> BTreeMap<String, Vec<String>> {
    let graph = DependencyGraph::from_registry(registry, columns);
    registry
        .outputs()
        .map(|row| (row.id.clone(), graph.input_dependencies(&row.id)))
        .collect()
}
