//! Row metadata

/// Metadata for a single row
///
/// Rows are addressed individually rather than in intervals: the number of
/// row records is naturally bounded by the rows actually touched.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowInfo {
    /// Custom height in points (None = sheet default)
    pub height: Option<f64>,
    /// Row-level format index (None = no row format)
    pub format: Option<u32>,
    /// Row is hidden
    pub hidden: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Row is collapsed (in outline)
    pub collapsed: bool,
}

impl RowInfo {
    /// Create a row record with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this record carries any custom settings
    pub fn has_custom_settings(&self) -> bool {
        self.height.is_some()
            || self.format.is_some()
            || self.hidden
            || self.outline_level > 0
            || self.collapsed
    }
}
