//! Row calculation engine
//!
//! Computes the base-unit value of every row by bounded relaxation: each pass
//! re-evaluates every output formula against the current values, and passes
//! repeat until one changes nothing or the pass budget runs out. Output rows
//! may reference each other in any order. Cycles are not detected; they
//! either settle or stop at the budget with a [`Diagnostic::NotConverged`].
//!
//! Nothing here returns an error. A formula that fails to parse or evaluate
//! makes its row `NaN` and is reported as a diagnostic.
//!
//! # Example
//!
//! ```rust
//! use timeline_calc::prelude::*;
//!
//! let registry = RowRegistry::new(vec![
//!     RowDefinition::input("width", "Width", "B2").with_unit("mm", "m", 1e-3).with_default(5.0),
//!     // Forward reference: B3 reads B4, which is defined below it
//!     RowDefinition::output("area", "Area", "B3", "=B4*B2").with_unit("mm²", "m²", 1e-6),
//!     RowDefinition::output("height", "Height", "B4", "=B2*2").with_unit("mm", "m", 1e-3),
//! ])
//! .unwrap();
//!
//! let result = registry.compute(&EvaluationState::new(&registry));
//! let area = result.base_value("area").unwrap();
//! assert!((area - 50e-6).abs() < 1e-15);
//! ```

use crate::{
    evaluate, variable_name, Diagnostic, EvaluationState, FormulaError, FormulaExpr,
    ReferenceColumns, RowDefinition, RowRegistry, Scope, Translator,
};
use ahash::{AHashMap, AHashSet};

/// Default relaxation pass budget
pub const DEFAULT_MAX_PASSES: usize = 10;

/// Options for a calculation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationOptions {
    /// Maximum relaxation passes (default: 10)
    pub max_passes: usize,
    /// Which columns hold values and conversion factors
    pub columns: ReferenceColumns,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            columns: ReferenceColumns::default(),
        }
    }
}

impl CalculationOptions {
    pub fn with_columns(mut self, columns: ReferenceColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationStats {
    /// Output rows with a non-empty formula
    pub formula_count: usize,
    /// Relaxation passes performed
    pub passes: usize,
    /// Whether the last pass changed nothing
    pub converged: bool,
    /// Formula evaluations across all passes
    pub rows_evaluated: usize,
    /// Rows whose formula failed at least once
    pub errors: usize,
}

/// Result of [`compute_all`]
#[derive(Debug, Clone, Default)]
pub struct ComputeResult {
    /// Every row id mapped to its base-unit value
    pub base_values: AHashMap<String, f64>,
    /// Source cell (e.g. `B12`) to row id
    pub address_to_id: AHashMap<String, String>,
    pub stats: CalculationStats,
    pub diagnostics: Vec<Diagnostic>,
}

impl ComputeResult {
    /// Base value of a row
    pub fn base_value(&self, id: &str) -> Option<f64> {
        self.base_values.get(id).copied()
    }
}

/// Extension trait for RowRegistry to add calculation methods
pub trait RegistryCalculationExt {
    /// Compute all rows with default options
    fn compute(&self, state: &EvaluationState) -> ComputeResult;

    /// Compute all rows with custom options
    fn compute_with_options(
        &self,
        state: &EvaluationState,
        options: &CalculationOptions,
    ) -> ComputeResult;
}

impl RegistryCalculationExt for RowRegistry {
    fn compute(&self, state: &EvaluationState) -> ComputeResult {
        compute_all(self, state)
    }

    fn compute_with_options(
        &self,
        state: &EvaluationState,
        options: &CalculationOptions,
    ) -> ComputeResult {
        compute_all_with_options(self, state, options)
    }
}

/// Compute every row's base value with default options
pub fn compute_all(registry: &RowRegistry, state: &EvaluationState) -> ComputeResult {
    compute_all_with_options(registry, state, &CalculationOptions::default())
}

/// Compute every row's base value
///
/// Pure with respect to its inputs: the scope is rebuilt on every call, so
/// the same state always gives bit-identical values.
pub fn compute_all_with_options(
    registry: &RowRegistry,
    state: &EvaluationState,
    options: &CalculationOptions,
) -> ComputeResult {
    let mut engine = CalculationEngine::new(registry, *options);
    engine.translate_formulas();
    engine.seed(state);
    engine.relax();
    engine.finish()
}

/// Output row with its translated formula
struct CompiledRow<'a> {
    row: &'a RowDefinition,
    variable: String,
    expr: Result<FormulaExpr, FormulaError>,
}

/// The calculation engine
struct CalculationEngine<'a> {
    registry: &'a RowRegistry,
    options: CalculationOptions,
    compiled: Vec<CompiledRow<'a>>,
    scope: Scope,
    values: AHashMap<String, f64>,
    failed: AHashSet<&'a str>,
    stats: CalculationStats,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CalculationEngine<'a> {
    fn new(registry: &'a RowRegistry, options: CalculationOptions) -> Self {
        Self {
            registry,
            options,
            compiled: Vec::new(),
            scope: Scope::new(),
            values: AHashMap::with_capacity(registry.len()),
            failed: AHashSet::new(),
            stats: CalculationStats::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Translate each output formula once; empty formulas are skipped
    fn translate_formulas(&mut self) {
        let translator = Translator::new(self.registry).with_columns(self.options.columns);

        for row in self.registry.outputs() {
            let Some(formula) = row.formula() else {
                continue;
            };

            let expr = match translator.translate(formula, row) {
                Ok(translation) => {
                    for diagnostic in &translation.diagnostics {
                        tracing::warn!(%diagnostic, "formula reference read as blank");
                    }
                    self.diagnostics.extend(translation.diagnostics);
                    Ok(translation.expr)
                }
                Err(err) => Err(err),
            };

            self.compiled.push(CompiledRow {
                row,
                variable: variable_name(&row.id),
                expr,
            });
        }

        self.stats.formula_count = self.compiled.len();
    }

    /// Every row starts at its current base value
    fn seed(&mut self, state: &EvaluationState) {
        for row in self.registry.iter() {
            let value = state.base_value(&row.id);
            self.scope.set(variable_name(&row.id), value);
            self.values.insert(row.id.clone(), value);
        }
    }

    fn relax(&mut self) {
        for pass in 1..=self.options.max_passes {
            self.stats.passes = pass;
            let mut changed = 0usize;

            for compiled in &self.compiled {
                self.stats.rows_evaluated += 1;
                let row: &'a RowDefinition = compiled.row;
                let id = row.id.as_str();

                let value = match compiled
                    .expr
                    .as_ref()
                    .map_err(Clone::clone)
                    .and_then(|expr| evaluate(expr, &self.scope))
                {
                    Ok(value) => value,
                    Err(err) => {
                        if self.failed.insert(id) {
                            tracing::warn!(row = id, error = %err, "formula evaluation failed");
                            self.diagnostics.push(Diagnostic::EvaluationFailed {
                                row: id.to_string(),
                                message: err.to_string(),
                            });
                        }
                        f64::NAN
                    }
                };

                let current = self.values.get(id).copied().unwrap_or(0.0);
                if !same_value(current, value) {
                    tracing::trace!(row = id, from = current, to = value, "row updated");
                    self.scope.set(compiled.variable.as_str(), value);
                    self.values.insert(id.to_string(), value);
                    changed += 1;
                }
            }

            tracing::debug!(pass, changed, "relaxation pass");

            if changed == 0 {
                self.stats.converged = true;
                return;
            }
        }

        tracing::warn!(
            passes = self.stats.passes,
            "values still changing after the pass budget"
        );
        self.diagnostics.push(Diagnostic::NotConverged {
            passes: self.stats.passes,
        });
    }

    fn finish(self) -> ComputeResult {
        let mut stats = self.stats;
        stats.errors = self.failed.len();

        ComputeResult {
            base_values: self.values,
            address_to_id: self.registry.address_to_id(),
            stats,
            diagnostics: self.diagnostics,
        }
    }
}

// NaN never equals itself; a row that stays NaN has not changed
fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}
