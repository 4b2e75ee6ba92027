//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur while reading or writing a package
///
/// A load never returns a partial workbook: any archive- or part-level
/// failure aborts the whole operation. There is no retry anywhere; all
/// operations are deterministic.
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Not a valid package (bad ZIP structure, or a broken required wiring
    /// like a dangling relationship)
    #[error("Invalid XLSX package: {0}")]
    InvalidPackage(String),

    /// A required part is missing from the archive
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// A part is present but violates the expected schema
    ///
    /// This includes interner inconsistency: a cell referencing a style or
    /// string index that does not exist fails here, at first resolution.
    #[error("Malformed part {part}: {detail}")]
    MalformedPart {
        /// Part path inside the archive
        part: String,
        /// What went wrong
        detail: String,
    },

    /// Core model error
    #[error("Core error: {0}")]
    Core(#[from] gridstone_core::Error),
}

impl XlsxError {
    /// Create a malformed-part error
    pub fn malformed<P: Into<String>, D: Into<String>>(part: P, detail: D) -> Self {
        XlsxError::MalformedPart {
            part: part.into(),
            detail: detail.into(),
        }
    }
}
