//! Cell formatting
//!
//! This module contains the format descriptor and its interner:
//! - [`Format`] - a complete cell format, five independently keyed sub-records
//! - [`Font`], [`Fill`], [`Border`], [`Alignment`], [`NumberFormat`] - the sub-records
//! - [`FormatPool`] - deduplication into stable xf/dxf indices

mod alignment;
mod border;
mod color;
mod fill;
mod font;
mod number_format;
mod pool;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use border::{Border, BorderEdge, BorderLineStyle};
pub use color::Color;
pub use fill::{Fill, PatternType};
pub use font::{Font, Underline};
pub use number_format::{builtin_code_for_id, builtin_id_for_code, NumberFormat, CUSTOM_FORMAT_BASE};
pub use pool::{FormatPool, FormatRole};

/// A complete cell format
///
/// A format is an immutable, content-addressed bundle of five sub-records;
/// two formats are equal iff all five are. Formats are deduplicated through
/// a [`FormatPool`], and cells hold the resulting index.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Format {
    /// Number format
    pub number_format: NumberFormat,
    /// Font settings
    pub font: Font,
    /// Fill/background settings
    pub fill: Fill,
    /// Border settings
    pub border: Border,
    /// Text alignment
    pub alignment: Alignment,
    /// Cell protection flags
    pub protection: Protection,
}

impl Format {
    /// Create a new default format
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font to bold
    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    /// Set the font to italic
    pub fn italic(mut self, italic: bool) -> Self {
        self.font.italic = italic;
        self
    }

    /// Set the font size in points
    pub fn font_size(mut self, size: f64) -> Self {
        self.font.size = size;
        self
    }

    /// Set the font name
    pub fn font_name<S: Into<String>>(mut self, name: S) -> Self {
        self.font.name = name.into();
        self
    }

    /// Set the font color
    pub fn font_color(mut self, color: Color) -> Self {
        self.font.color = color;
        self
    }

    /// Set the underline style
    pub fn underline(mut self, underline: Underline) -> Self {
        self.font.underline = underline;
        self
    }

    /// Set a solid fill color
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = Fill::Solid { color };
        self
    }

    /// Set the number format from a code string
    pub fn number_format<S: AsRef<str>>(mut self, code: S) -> Self {
        self.number_format = NumberFormat::from_code(code);
        self
    }

    /// Set a built-in number format by id
    pub fn number_format_id(mut self, id: u16) -> Self {
        self.number_format = NumberFormat::builtin(id);
        self
    }

    /// Set the border
    pub fn border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    /// Set horizontal alignment
    pub fn align(mut self, align: HorizontalAlignment) -> Self {
        self.alignment.horizontal = align;
        self
    }

    /// Set vertical alignment
    pub fn valign(mut self, align: VerticalAlignment) -> Self {
        self.alignment.vertical = align;
        self
    }

    /// Enable text wrapping
    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.alignment.wrap_text = wrap;
        self
    }

    /// Set protection flags
    pub fn protection(mut self, protection: Protection) -> Self {
        self.protection = protection;
        self
    }
}

/// Cell protection flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Protection {
    /// Cell is unlocked (editable when the sheet is protected)
    pub unlocked: bool,
    /// Formula is hidden when the sheet is protected
    pub hidden: bool,
}

impl std::hash::Hash for Format {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Fixed field order: this is the canonical interning key.
        self.number_format.hash(state);
        self.font.hash(state);
        self.fill.hash(state);
        self.border.hash(state);
        self.alignment.hash(state);
        self.protection.hash(state);
    }
}

impl Eq for Format {}
