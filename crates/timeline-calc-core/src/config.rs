//! Persisted configuration
//!
//! The configuration is exported from the source spreadsheet: the ordered row
//! definitions plus two precomputed dependency sets that the UI uses for
//! highlighting. The evaluator itself never reads the dependency sets.

use crate::error::Result;
use crate::registry::RowRegistry;
use crate::row::RowDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The two column letters formulas use to refer to a row
///
/// A reference in the value column reads the row's display value; a reference
/// in the factor column reads the row's display-to-base conversion factor. Any
/// other column is unmodeled and reads as a blank cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceColumns {
    pub value: char,
    pub factor: char,
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            value: 'B',
            factor: 'D',
        }
    }
}

/// Rows plus dependency sets, as loaded from a JSON export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub rows: Vec<RowDefinition>,
    /// id -> ids its formula reads directly
    #[serde(default)]
    pub direct_deps: BTreeMap<String, Vec<String>>,
    /// id -> input ids it transitively depends on
    #[serde(default)]
    pub input_deps: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub columns: ReferenceColumns,
}

impl Config {
    /// Decode a configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and decode a configuration file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Validate the rows into a registry
    pub fn registry(&self) -> Result<RowRegistry> {
        RowRegistry::new(self.rows.clone())
    }

    /// Configured direct dependencies of a row
    pub fn direct_dependencies(&self, id: &str) -> &[String] {
        self.direct_deps.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Configured input dependencies of a row
    pub fn input_dependencies(&self, id: &str) -> &[String] {
        self.input_deps.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}
