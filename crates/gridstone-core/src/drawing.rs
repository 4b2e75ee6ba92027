//! Drawing collaborator model
//!
//! Only the anchor/relationship contract lives here: where a floating
//! object sits and what media bytes it carries. Chart-type-specific markup
//! is someone else's problem; the package codec turns these anchors into a
//! drawing part and registers the media relationships they need.

/// English Metric Units per pixel (at 96 DPI)
pub const EMU_PER_PIXEL: i64 = 9_525;

/// English Metric Units per inch
pub const EMU_PER_INCH: i64 = 914_400;

/// Identifier of an anchor within one drawing
pub type AnchorId = u32;

/// A drawing attached to a sheet: an ordered list of anchored objects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drawing {
    anchors: Vec<Anchor>,
}

impl Drawing {
    /// Create an empty drawing
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anchored object, returning its id
    pub fn add_anchor(&mut self, kind: AnchorKind, content: AnchorContent) -> AnchorId {
        let id = self.anchors.len() as AnchorId + 1;
        self.anchors.push(Anchor { id, kind, content });
        id
    }

    /// Iterate over anchors in insertion order
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Check whether the drawing holds no anchors
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// One anchored object
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// Anchor id, unique within the drawing
    pub id: AnchorId,
    /// Placement
    pub kind: AnchorKind,
    /// The anchored payload
    pub content: AnchorContent,
}

/// How an object is pinned to the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorKind {
    /// Pinned at one cell, with an absolute extent
    OneCell {
        /// Top-left marker
        from: Marker,
        /// Object size
        extent: Extent,
    },
    /// Stretched between two cell markers
    TwoCell {
        /// Top-left marker
        from: Marker,
        /// Bottom-right marker
        to: Marker,
    },
}

/// A cell-plus-offset position (offsets in EMU)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Marker {
    /// Row of the anchor cell (1-based)
    pub row: u32,
    /// Column of the anchor cell (1-based)
    pub col: u16,
    /// Horizontal offset into the cell, in EMU
    pub col_offset: i64,
    /// Vertical offset into the cell, in EMU
    pub row_offset: i64,
}

impl Marker {
    /// Create a marker at a cell corner with no offset
    pub fn at(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            col_offset: 0,
            row_offset: 0,
        }
    }
}

/// An absolute size in EMU
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    /// Width in EMU
    pub width: i64,
    /// Height in EMU
    pub height: i64,
}

impl Extent {
    /// Create an extent from pixel dimensions
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self {
            width: width as i64 * EMU_PER_PIXEL,
            height: height as i64 * EMU_PER_PIXEL,
        }
    }
}

/// The payload of an anchor
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorContent {
    /// An embedded image; the codec writes the bytes as a media part
    Image {
        /// Image format
        kind: ImageKind,
        /// Raw image bytes
        data: Vec<u8>,
        /// Display name
        name: String,
    },
}

/// Supported embedded image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// PNG
    Png,
    /// JPEG
    Jpeg,
    /// GIF
    Gif,
}

impl ImageKind {
    /// File extension used for the media part path
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
            ImageKind::Gif => "gif",
        }
    }

    /// MIME type for the content-type registry
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Gif => "image/gif",
        }
    }

    /// Detect a format from a media part extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageKind::Png),
            "jpeg" | "jpg" => Some(ImageKind::Jpeg),
            "gif" => Some(ImageKind::Gif),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_ids_are_sequential() {
        let mut drawing = Drawing::new();
        let a = drawing.add_anchor(
            AnchorKind::OneCell {
                from: Marker::at(1, 1),
                extent: Extent::from_pixels(32, 32),
            },
            AnchorContent::Image {
                kind: ImageKind::Png,
                data: vec![0x89, b'P', b'N', b'G'],
                name: "logo".into(),
            },
        );
        let b = drawing.add_anchor(
            AnchorKind::TwoCell {
                from: Marker::at(2, 2),
                to: Marker::at(8, 5),
            },
            AnchorContent::Image {
                kind: ImageKind::Jpeg,
                data: vec![0xFF, 0xD8],
                name: "photo".into(),
            },
        );

        assert_eq!((a, b), (1, 2));
        assert_eq!(drawing.anchors().len(), 2);
    }

    #[test]
    fn test_extent_from_pixels() {
        let e = Extent::from_pixels(96, 48);
        assert_eq!(e.width, 96 * EMU_PER_PIXEL);
        assert_eq!(e.height, 48 * EMU_PER_PIXEL);
    }
}
