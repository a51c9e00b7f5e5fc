//! # timeline-calc-formula
//!
//! Formula handling for timeline-calc.
//!
//! This crate provides:
//! - Formula parsing (text → AST) for the small spreadsheet dialect the rows use
//! - Translation of display-unit formulas into base-unit expressions
//! - Numeric evaluation against a variable scope, with `ceiling` and `pi`
//! - Human-readable rendering of formulas with row labels
//! - Reference extraction and dependency analysis
//!
//! ## Example
//!
//! ```rust
//! use timeline_calc_formula::{evaluate, parse_formula, Scope};
//!
//! let ast = parse_formula("=CEILING(7, 5) * 2").unwrap();
//! assert_eq!(evaluate(&ast, &Scope::new()).unwrap(), 20.0);
//! ```

pub mod ast;
pub mod dependency;
pub mod diagnostic;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod readable;
pub mod translate;

pub use ast::{BinaryOperator, ExprStyle, FormulaExpr, UnaryOperator};
pub use dependency::{
    derived_direct_dependencies, derived_input_dependencies, references, DependencyGraph,
};
pub use diagnostic::Diagnostic;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, Scope};
pub use functions::ceiling;
pub use parser::parse_formula;
pub use readable::{readable_formula, readable_formula_with};
pub use translate::{variable_name, Translation, Translator};
