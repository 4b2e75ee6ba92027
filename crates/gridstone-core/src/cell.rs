//! Cell value types

use crate::range::CellRange;
use std::fmt;

/// The value stored in a cell
///
/// A cell's value is resolved once, at the write call; reads never
/// re-dispatch through a dynamic "any" type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Empty cell (possibly format-only)
    Blank,

    /// Shared string, by index into the workbook's [`crate::SharedStrings`] table
    String(u32),

    /// String stored inline in the cell, bypassing the shared table
    InlineString(String),

    /// Numeric value (all numbers, including date serials, are f64)
    Number(f64),

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),

    /// Formula with an optional cached result
    ///
    /// The text is stored without a leading `=`. Formulas are never
    /// evaluated here; the result is whatever the producing application
    /// last computed.
    Formula {
        /// Formula text
        text: String,
        /// Cached scalar result, if any
        result: Option<CachedValue>,
    },

    /// Array formula anchor
    ///
    /// Only the anchor cell of the covered range carries the formula text;
    /// every other cell in the range is a plain cached-value cell.
    ArrayFormula {
        /// Formula text
        text: String,
        /// Range the array result spills over
        range: CellRange,
        /// Cached scalar result for the anchor cell
        result: Option<CachedValue>,
    },

    /// Member of a shared formula group
    ///
    /// The root cell of the group carries `Some(text)`; follower cells are
    /// textless and derive their display text from the root via
    /// [`crate::formula::derive_formula`].
    SharedFormula {
        /// Canonical text (root cell only)
        text: Option<String>,
        /// Shared group id, unique per worksheet
        shared_id: u32,
        /// Cached scalar result, if any
        result: Option<CachedValue>,
    },
}

impl CellValue {
    /// Check if the cell is blank
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    /// Check if the cell holds any kind of formula
    pub fn is_formula(&self) -> bool {
        matches!(
            self,
            CellValue::Formula { .. }
                | CellValue::ArrayFormula { .. }
                | CellValue::SharedFormula { .. }
        )
    }

    /// Try to get the value as a number (booleans coerce, cached results count)
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(true) => Some(1.0),
            CellValue::Boolean(false) => Some(0.0),
            CellValue::Formula { result, .. }
            | CellValue::ArrayFormula { result, .. }
            | CellValue::SharedFormula { result, .. } => match result {
                Some(CachedValue::Number(n)) => Some(*n),
                Some(CachedValue::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            },
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Number(n) => Some(*n != 0.0),
            CellValue::Formula { result, .. }
            | CellValue::ArrayFormula { result, .. }
            | CellValue::SharedFormula { result, .. } => match result {
                Some(CachedValue::Bool(b)) => Some(*b),
                Some(CachedValue::Number(n)) => Some(*n != 0.0),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the formula text, if this is a formula cell that carries one
    ///
    /// Shared-formula followers return `None` here; resolve them through the
    /// owning sheet, which knows the group's root text.
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula { text, .. } => Some(text),
            CellValue::ArrayFormula { text, .. } => Some(text),
            CellValue::SharedFormula { text, .. } => text.as_deref(),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Blank => "blank",
            CellValue::String(_) => "string",
            CellValue::InlineString(_) => "inline string",
            CellValue::Number(_) => "number",
            CellValue::Boolean(_) => "boolean",
            CellValue::Error(_) => "error",
            CellValue::Formula { .. } => "formula",
            CellValue::ArrayFormula { .. } => "array formula",
            CellValue::SharedFormula { .. } => "shared formula",
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Blank
    }
}

/// A cached scalar formula result
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CachedValue {
    /// Numeric result
    Number(f64),
    /// Text result
    Text(String),
    /// Boolean result
    Bool(bool),
    /// Error result
    Error(CellError),
}

impl fmt::Display for CachedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachedValue::Number(n) => write!(f, "{}", n),
            CachedValue::Text(s) => write!(f, "{}", s),
            CachedValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CachedValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// Excel error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellError {
    /// #NULL! - Incorrect range operator
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
        }
    }

    /// Parse an error string
    pub fn from_code(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#NULL!" => Some(CellError::Null),
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Complete data for a single cell: its value and its format handle
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellData {
    /// The cell's value
    pub value: CellValue,
    /// Index into the workbook's format pool (0 = default format)
    pub format: u32,
}

impl CellData {
    /// Create a new cell with a value and the default format
    pub fn new(value: CellValue) -> Self {
        Self { value, format: 0 }
    }

    /// Create a new cell with a value and format index
    pub fn with_format(value: CellValue, format: u32) -> Self {
        Self { value, format }
    }

    /// Check if this cell is effectively empty (blank value, default format)
    pub fn is_empty(&self) -> bool {
        self.value.is_blank() && self.format == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_number() {
        assert_eq!(CellValue::Number(42.0).as_number(), Some(42.0));
        assert_eq!(CellValue::Boolean(true).as_number(), Some(1.0));
        assert_eq!(CellValue::Blank.as_number(), None);

        let f = CellValue::Formula {
            text: "A1+A2".into(),
            result: Some(CachedValue::Number(3.0)),
        };
        assert_eq!(f.as_number(), Some(3.0));
    }

    #[test]
    fn test_formula_text() {
        let f = CellValue::Formula {
            text: "SUM(A1:A2)".into(),
            result: None,
        };
        assert_eq!(f.formula_text(), Some("SUM(A1:A2)"));

        let follower = CellValue::SharedFormula {
            text: None,
            shared_id: 0,
            result: None,
        };
        assert_eq!(follower.formula_text(), None);
        assert!(follower.is_formula());
    }

    #[test]
    fn test_cell_error_roundtrip() {
        assert_eq!(CellError::Div0.to_string(), "#DIV/0!");
        assert_eq!(CellError::from_code("#div/0!"), Some(CellError::Div0));
        assert_eq!(CellError::from_code("bogus"), None);
    }

    #[test]
    fn test_cell_data_empty() {
        assert!(CellData::default().is_empty());
        assert!(!CellData::with_format(CellValue::Blank, 3).is_empty());
        assert!(!CellData::new(CellValue::Number(0.0)).is_empty());
    }
}
