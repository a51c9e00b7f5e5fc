//! Non-fatal diagnostics
//!
//! Unresolvable references read as blank cells and failing formulas produce
//! `NaN`; neither stops a calculation. Diagnostics record where that happened
//! so a misconfigured row can be found without changing any result.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A formula refers to an address no row owns
    UnresolvedReference { row: String, address: String },
    /// A formula refers to a column that is neither the value nor factor column
    UnmodeledColumn { row: String, address: String },
    /// A row's formula failed to parse or evaluate; its value is `NaN`
    EvaluationFailed { row: String, message: String },
    /// Relaxation stopped at the pass budget while values were still changing
    NotConverged { passes: usize },
}

impl Diagnostic {
    /// The row the diagnostic is about, if any
    pub fn row(&self) -> Option<&str> {
        match self {
            Diagnostic::UnresolvedReference { row, .. }
            | Diagnostic::UnmodeledColumn { row, .. }
            | Diagnostic::EvaluationFailed { row, .. } => Some(row),
            Diagnostic::NotConverged { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedReference { row, address } => {
                write!(f, "{row}: reference to {address} has no row; read as blank")
            }
            Diagnostic::UnmodeledColumn { row, address } => {
                write!(f, "{row}: column of {address} is not modeled; read as 0")
            }
            Diagnostic::EvaluationFailed { row, message } => {
                write!(f, "{row}: formula failed ({message}); value is NaN")
            }
            Diagnostic::NotConverged { passes } => {
                write!(f, "values still changing after {passes} passes")
            }
        }
    }
}
