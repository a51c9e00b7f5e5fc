//! # timeline-calc-core
//!
//! Core data structures for the timeline-calc estimator.
//!
//! This crate provides the fundamental types used throughout timeline-calc:
//! - [`RowDefinition`] and [`RowRegistry`] - The labeled rows of the source spreadsheet
//! - [`CellAddress`] - Single-letter column + row number addresses (`B12`, `$D$7`)
//! - [`EvaluationState`] - Display values and selected units, mutated by the UI
//! - [`unit_options_for_base`] - Selectable display units for a base unit tag
//! - [`Config`] - The persisted configuration (rows plus dependency sets)
//!
//! ## Example
//!
//! ```rust
//! use timeline_calc_core::{RowDefinition, RowRegistry, EvaluationState};
//!
//! let registry = RowRegistry::new(vec![
//!     RowDefinition::input("dwell_time", "Dwell time", "B3").with_default(2.0),
//!     RowDefinition::output("total", "Total", "B4", "=B3*2"),
//! ])
//! .unwrap();
//!
//! let state = EvaluationState::new(&registry);
//! assert_eq!(state.get("dwell_time").unwrap().display_value, 2.0);
//! ```

pub mod address;
pub mod config;
pub mod error;
pub mod registry;
pub mod row;
pub mod state;
pub mod units;

// Re-exports for convenience
pub use address::CellAddress;
pub use config::{Config, ReferenceColumns};
pub use error::{Error, Result};
pub use registry::RowRegistry;
pub use row::{RowDefinition, RowKind, SourceCell};
pub use state::{display_value, from_base, to_base, EvaluationState, ValueState};
pub use units::{
    factors_equal, normalize_unit_label, selected_unit_option, unit_options_for_base, UnitOption,
};

/// Maximum row number addressable by a formula reference (three digits)
pub const MAX_ROW: u16 = 999;
