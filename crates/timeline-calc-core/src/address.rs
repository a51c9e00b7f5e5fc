//! Cell address type
//!
//! Formulas refer to rows through spreadsheet-style addresses made of a single
//! uppercase column letter followed by a one to three digit row number. The
//! column selects what is read from the row (its value, its conversion factor,
//! or an unmodeled column); the row number selects the row.

use crate::error::{Error, Result};
use crate::MAX_ROW;
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "B12", "$D$7")
///
/// The optional `$` markers are accepted for compatibility with spreadsheet
/// exports but carry no meaning here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Column letter (always uppercase ASCII)
    pub column: char,
    /// Row number as written (1-based)
    pub row: u16,
    /// Whether the column was written with a `$` marker
    pub column_absolute: bool,
    /// Whether the row was written with a `$` marker
    pub row_absolute: bool,
}

impl CellAddress {
    /// Create a new relative cell address
    pub fn new(column: char, row: u16) -> Self {
        Self {
            column: column.to_ascii_uppercase(),
            row,
            column_absolute: false,
            row_absolute: false,
        }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use timeline_calc_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B12").unwrap();
    /// assert_eq!(addr.column, 'B');
    /// assert_eq!(addr.row, 12);
    ///
    /// let addr = CellAddress::parse("$D$7").unwrap();
    /// assert_eq!(addr.key(), "D7");
    ///
    /// assert!(CellAddress::parse("AB1").is_err());
    /// assert!(CellAddress::parse("B1234").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        let column_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let column = match bytes.get(pos) {
            Some(b) if b.is_ascii_uppercase() => *b as char,
            _ => {
                return Err(Error::InvalidAddress(format!(
                    "expected a single uppercase column letter in '{}'",
                    s
                )))
            }
        };
        pos += 1;

        let row_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let row_str = &s[pos..];
        if row_str.is_empty() || row_str.len() > 3 || !row_str.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::InvalidAddress(format!(
                "expected a 1-3 digit row number in '{}'",
                s
            )));
        }

        let row: u16 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;
        debug_assert!(row <= MAX_ROW);

        Ok(Self {
            column,
            row,
            column_absolute,
            row_absolute,
        })
    }

    /// Lookup key without `$` markers (e.g. "B12")
    pub fn key(&self) -> String {
        format!("{}{}", self.column, self.row)
    }

    /// The address of the same row in another column
    pub fn with_column(&self, column: char) -> Self {
        Self::new(column, self.row)
    }

    /// Format as written, including `$` markers
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();
        if self.column_absolute {
            result.push('$');
        }
        result.push(self.column);
        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&self.row.to_string());
        result
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
