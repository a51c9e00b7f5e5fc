//! # timeline-calc
//!
//! Evaluates the labeled rows of a timeline spreadsheet.
//!
//! Input rows hold user-entered values in a selectable display unit; output
//! rows carry spreadsheet formulas over other rows' cells. [`compute_all`]
//! translates every output formula into base units and relaxes the whole set
//! to a fixed point, so outputs may reference each other in any order.
//!
//! ## Example
//!
//! ```rust
//! use timeline_calc::prelude::*;
//!
//! let registry = RowRegistry::new(vec![
//!     RowDefinition::input("a", "A", "B2")
//!         .with_unit("seconds", "s", 1.0)
//!         .with_default(2.0),
//!     RowDefinition::output("b", "B", "B3", "=B2*2").with_unit("seconds", "s", 1.0),
//! ])
//! .unwrap();
//!
//! let state = EvaluationState::new(&registry);
//! let result = compute_all(&registry, &state);
//! assert_eq!(result.base_value("b"), Some(4.0));
//! assert!(result.stats.converged);
//! ```

pub mod calculation;
pub mod format;
pub mod prelude;

// Re-export calculation types
pub use calculation::{
    compute_all, compute_all_with_options, CalculationOptions, CalculationStats, ComputeResult,
    RegistryCalculationExt,
};
pub use format::format_display_number;

// Re-export core types
pub use timeline_calc_core::{
    display_value, factors_equal, from_base, normalize_unit_label, selected_unit_option, to_base,
    unit_options_for_base, CellAddress, Config, Error, EvaluationState, ReferenceColumns,
    Result, RowDefinition, RowKind, RowRegistry, SourceCell, UnitOption, ValueState,
};

// Re-export formula types
pub use timeline_calc_formula::{
    derived_direct_dependencies, derived_input_dependencies, evaluate, parse_formula,
    readable_formula, readable_formula_with, references, variable_name, DependencyGraph,
    Diagnostic, FormulaError, FormulaExpr, FormulaResult, Scope, Translation, Translator,
};
