//! Prelude module - common imports for timeline-calc users
//!
//! ```rust
//! use timeline_calc::prelude::*;
//! ```

pub use crate::{
    // Calculation
    compute_all,
    compute_all_with_options,
    // Units
    display_value,
    format_display_number,
    readable_formula,
    selected_unit_option,
    unit_options_for_base,
    CalculationOptions,
    CalculationStats,
    ComputeResult,
    Config,
    Diagnostic,
    // Error types
    Error,
    EvaluationState,
    ReferenceColumns,
    // Extension traits
    RegistryCalculationExt,
    Result,
    // Rows
    RowDefinition,
    RowRegistry,
    UnitOption,
};
