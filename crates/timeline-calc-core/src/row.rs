//! Row definitions
//!
//! A row is one labeled line of the source spreadsheet: either a user input or
//! an output derived from a formula over other rows.

use serde::{Deserialize, Serialize};

/// Whether a row is edited by the user or computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Input,
    Output,
}

/// The spreadsheet cell a row was exported from, and its formula
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceCell {
    /// The row's own address (e.g. "B12"), used by other formulas to refer to it
    pub cell: String,
    /// Source formula, outputs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

/// An immutable row definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDefinition {
    /// Unique stable identifier
    pub id: String,
    /// Human-readable name (not necessarily unique)
    pub label: String,
    /// Grouping tag, may be empty
    #[serde(default)]
    pub section: String,
    pub kind: RowKind,
    #[serde(default)]
    pub display_unit: Option<String>,
    #[serde(default)]
    pub base_unit: Option<String>,
    /// Scale such that `base = display * to_base_factor`
    #[serde(default)]
    pub to_base_factor: Option<f64>,
    /// Seed for input rows
    #[serde(default)]
    pub default_display_value: Option<f64>,
    #[serde(rename = "excel")]
    pub source: SourceCell,
}

impl RowDefinition {
    /// Create an input row with no unit
    pub fn input(id: impl Into<String>, label: impl Into<String>, cell: impl Into<String>) -> Self {
        Self::new(id, label, cell, RowKind::Input, None)
    }

    /// Create an output row computed by `formula`
    pub fn output(
        id: impl Into<String>,
        label: impl Into<String>,
        cell: impl Into<String>,
        formula: impl Into<String>,
    ) -> Self {
        Self::new(id, label, cell, RowKind::Output, Some(formula.into()))
    }

    fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        cell: impl Into<String>,
        kind: RowKind,
        formula: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            section: String::new(),
            kind,
            display_unit: None,
            base_unit: None,
            to_base_factor: None,
            default_display_value: None,
            source: SourceCell {
                cell: cell.into(),
                formula,
            },
        }
    }

    /// Set the grouping tag
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Set the display unit, base unit and display-to-base factor
    pub fn with_unit(
        mut self,
        display_unit: impl Into<String>,
        base_unit: impl Into<String>,
        to_base_factor: f64,
    ) -> Self {
        self.display_unit = Some(display_unit.into());
        self.base_unit = Some(base_unit.into());
        self.to_base_factor = Some(to_base_factor);
        self
    }

    /// Set the default display value
    pub fn with_default(mut self, value: f64) -> Self {
        self.default_display_value = Some(value);
        self
    }

    pub fn is_input(&self) -> bool {
        self.kind == RowKind::Input
    }

    pub fn is_output(&self) -> bool {
        self.kind == RowKind::Output
    }

    /// The row's formula, unless it is absent or empty
    ///
    /// A whitespace-only formula is still a formula; it fails to parse.
    pub fn formula(&self) -> Option<&str> {
        self.source.formula.as_deref().filter(|f| !f.is_empty())
    }

    /// The configured factor, if it is a valid scale (finite and positive)
    pub fn factor(&self) -> Option<f64> {
        self.to_base_factor.filter(|f| f.is_finite() && *f > 0.0)
    }

    /// The factor used when rewriting formulas; invalid or absent factors become 1
    pub fn canonical_factor(&self) -> f64 {
        self.factor().unwrap_or(1.0)
    }
}
