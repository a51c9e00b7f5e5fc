//! Error types for timeline-calc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in timeline-calc-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Two rows share the same id
    #[error("Duplicate row id: {0}")]
    DuplicateId(String),

    /// Two rows claim the same source cell
    #[error("Source cell {cell} is claimed by both '{first}' and '{second}'")]
    DuplicateCell {
        cell: String,
        first: String,
        second: String,
    },

    /// No row with the given id
    #[error("Unknown row: {0}")]
    UnknownRow(String),

    /// Display values can only be set on input rows
    #[error("Row '{0}' is an output; its value is derived from its formula")]
    NotAnInput(String),

    /// Configuration could not be decoded
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
