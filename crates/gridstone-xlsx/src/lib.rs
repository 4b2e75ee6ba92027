//! # gridstone-xlsx
//!
//! XLSX (Office Open XML) package reader and writer for gridstone.
//!
//! The document model lives in `gridstone-core`; this crate projects a
//! [`gridstone_core::Workbook`] into a ZIP-of-XML-parts package and back,
//! wiring the parts together through relationship lists and the
//! content-type registry.
//!
//! ## Example
//!
//! ```no_run
//! use gridstone_core::Workbook;
//! use gridstone_xlsx::{XlsxReader, XlsxWriter};
//!
//! let mut workbook = Workbook::new();
//! workbook.sheet_mut(0).unwrap().write_string(1, 1, "Hello").unwrap();
//!
//! let bytes = XlsxWriter::write_to_vec(&workbook).unwrap();
//! let reloaded = XlsxReader::read(std::io::Cursor::new(bytes)).unwrap();
//! assert_eq!(reloaded.sheet(0).unwrap().name(), "Sheet1");
//! ```

pub mod error;
pub mod package;
pub mod reader;
pub mod writer;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
