//! Row registry
//!
//! The ordered collection of row definitions, indexed by id and by source cell.

use crate::address::CellAddress;
use crate::error::{Error, Result};
use crate::row::RowDefinition;
use ahash::AHashMap;

/// Section tag the spreadsheet export uses for its summary block
const OVERVIEW_SECTION: &str = "Overview";

/// Validated, ordered row definitions
#[derive(Debug, Clone, Default)]
pub struct RowRegistry {
    rows: Vec<RowDefinition>,
    by_id: AHashMap<String, usize>,
    /// Source cell key (without `$`) -> index
    by_cell: AHashMap<String, usize>,
}

impl RowRegistry {
    /// Build a registry, checking that ids and source cells are unique
    pub fn new(rows: Vec<RowDefinition>) -> Result<Self> {
        let mut by_id = AHashMap::with_capacity(rows.len());
        let mut by_cell = AHashMap::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            if by_id.insert(row.id.clone(), idx).is_some() {
                return Err(Error::DuplicateId(row.id.clone()));
            }

            let key = cell_key(&row.source.cell);
            if key.is_empty() {
                continue;
            }
            if let Some(prev) = by_cell.insert(key.clone(), idx) {
                return Err(Error::DuplicateCell {
                    cell: key,
                    first: rows[prev].id.clone(),
                    second: row.id.clone(),
                });
            }
        }

        Ok(Self {
            rows,
            by_id,
            by_cell,
        })
    }

    /// All rows in definition order
    pub fn rows(&self) -> &[RowDefinition] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowDefinition> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row by id
    pub fn get(&self, id: &str) -> Option<&RowDefinition> {
        self.by_id.get(id).map(|&idx| &self.rows[idx])
    }

    /// Look up a row by its source cell (`$` markers are ignored)
    pub fn get_by_cell(&self, cell: &str) -> Option<&RowDefinition> {
        self.by_cell.get(&cell_key(cell)).map(|&idx| &self.rows[idx])
    }

    /// Look up the row that owns an address
    pub fn row_at(&self, address: &CellAddress) -> Option<&RowDefinition> {
        self.by_cell.get(&address.key()).map(|&idx| &self.rows[idx])
    }

    /// Output rows in definition order
    pub fn outputs(&self) -> impl Iterator<Item = &RowDefinition> {
        self.rows.iter().filter(|r| r.is_output())
    }

    /// Input rows in definition order
    pub fn inputs(&self) -> impl Iterator<Item = &RowDefinition> {
        self.rows.iter().filter(|r| r.is_input())
    }

    /// Source cell -> row id
    pub fn address_to_id(&self) -> AHashMap<String, String> {
        self.by_cell
            .iter()
            .map(|(cell, &idx)| (cell.clone(), self.rows[idx].id.clone()))
            .collect()
    }

    /// Distinct non-empty section tags in first-appearance order
    ///
    /// The "Overview" section is left out unless it is the only one.
    pub fn sections(&self) -> Vec<&str> {
        let mut order: Vec<&str> = Vec::new();
        for row in &self.rows {
            let section = row.section.trim();
            if !section.is_empty() && !order.contains(&section) {
                order.push(section);
            }
        }

        let without_overview: Vec<&str> = order
            .iter()
            .copied()
            .filter(|s| *s != OVERVIEW_SECTION)
            .collect();
        if without_overview.is_empty() {
            order
        } else {
            without_overview
        }
    }

    /// Rows whose section tag matches `section`
    pub fn rows_in_section<'a>(
        &'a self,
        section: &'a str,
    ) -> impl Iterator<Item = &'a RowDefinition> + 'a {
        self.rows.iter().filter(move |r| r.section.trim() == section)
    }
}

fn cell_key(cell: &str) -> String {
    cell.trim().replace('$', "")
}
