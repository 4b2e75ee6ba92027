//! Error types for gridstone-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gridstone-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell reference format
    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row number out of range
    #[error("Row {0} out of range (max: {1})")]
    RowOutOfRange(u32, u32),

    /// Column number out of range
    #[error("Column {0} out of range (max: {1})")]
    ColumnOutOfRange(u16, u16),

    /// Sheet index out of bounds
    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Operation requires a worksheet but the sheet is a chartsheet
    #[error("Sheet {0} is not a worksheet")]
    NotAWorksheet(usize),

    /// Invalid defined name
    #[error("Invalid defined name: {0}")]
    InvalidName(String),

    /// String index referenced by a cell does not exist in the shared table
    #[error("Unknown shared string index: {0}")]
    UnknownStringIndex(u32),

    /// Format index referenced by a cell does not exist in the pool
    #[error("Unknown format index: {0}")]
    UnknownFormatIndex(u32),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
