//! # gridstone-core
//!
//! Core document model for the gridstone spreadsheet library.
//!
//! This crate provides the in-memory model an `.xlsx` package is built from
//! or parsed into:
//! - [`CellRef`] and [`CellRange`] - 1-indexed cell addressing
//! - [`CellValue`] - the closed set of values a cell can hold
//! - [`Format`] and [`FormatPool`] - cell formatting and its deduplication
//! - [`SharedStrings`] - the reference-counted shared string table
//! - [`Workbook`], [`Sheet`], [`Worksheet`] - the document structure
//!
//! ## Example
//!
//! ```rust
//! use gridstone_core::{Format, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let mut sheet = workbook.sheet_mut(0).unwrap();
//!
//! sheet.write_string(1, 1, "Hello").unwrap();
//! sheet.write_number(2, 1, 42.0).unwrap();
//! sheet.write(3, 1, true, Some(&Format::new().bold(true))).unwrap();
//! ```

pub mod cell;
pub mod column;
pub mod date;
pub mod drawing;
pub mod error;
pub mod formula;
pub mod range;
pub mod reference;
pub mod row;
pub mod sheet;
pub mod strings;
pub mod style;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CachedValue, CellData, CellError, CellValue};
pub use column::ColumnInfo;
pub use drawing::{Anchor, AnchorContent, AnchorKind, Drawing, Extent, ImageKind, Marker};
pub use error::{Error, Result};
pub use formula::derive_formula;
pub use range::CellRange;
pub use reference::CellRef;
pub use row::RowInfo;
pub use sheet::{Chartsheet, Sheet, SheetKind, SheetVisibility};
pub use strings::SharedStrings;
pub use style::{
    Alignment, Border, BorderEdge, BorderLineStyle, Color, Fill, Font, Format, FormatPool,
    FormatRole, HorizontalAlignment, NumberFormat, PatternType, Protection, Underline,
    VerticalAlignment,
};
pub use workbook::{CellInput, DefinedName, SheetHandle, Workbook, WorkbookSettings};
pub use worksheet::{ConditionalFormat, DataValidation, Hyperlink, HyperlinkTarget, Worksheet};

/// Maximum row number in a worksheet, 1-indexed (Excel limit)
pub const MAX_ROW: u32 = 1_048_576;

/// Maximum column number in a worksheet, 1-indexed (Excel limit)
pub const MAX_COL: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
