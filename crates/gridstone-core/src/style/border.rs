//! Cell border settings

use super::Color;

/// Borders of a cell (all four edges plus the diagonal)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Border {
    /// Left edge
    pub left: Option<BorderEdge>,
    /// Right edge
    pub right: Option<BorderEdge>,
    /// Top edge
    pub top: Option<BorderEdge>,
    /// Bottom edge
    pub bottom: Option<BorderEdge>,
    /// Diagonal line
    pub diagonal: Option<BorderEdge>,
}

impl Border {
    /// Create a border with no edges
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the same edge to all four sides
    pub fn all(style: BorderLineStyle, color: Color) -> Self {
        let edge = BorderEdge { style, color };
        Self {
            left: Some(edge),
            right: Some(edge),
            top: Some(edge),
            bottom: Some(edge),
            diagonal: None,
        }
    }

    /// Set the left edge
    pub fn with_left(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.left = Some(BorderEdge { style, color });
        self
    }

    /// Set the right edge
    pub fn with_right(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.right = Some(BorderEdge { style, color });
        self
    }

    /// Set the top edge
    pub fn with_top(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.top = Some(BorderEdge { style, color });
        self
    }

    /// Set the bottom edge
    pub fn with_bottom(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.bottom = Some(BorderEdge { style, color });
        self
    }
}

/// One border edge: a line style plus a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BorderEdge {
    /// Line style
    pub style: BorderLineStyle,
    /// Line color
    pub color: Color,
}

/// Border line styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BorderLineStyle {
    /// Thin line
    Thin,
    /// Medium line
    Medium,
    /// Thick line
    Thick,
    /// Dashed line
    Dashed,
    /// Dotted line
    Dotted,
    /// Double line
    Double,
    /// Hairline
    Hair,
    /// Medium dashed line
    MediumDashed,
    /// Dash-dot line
    DashDot,
    /// Medium dash-dot line
    MediumDashDot,
    /// Dash-dot-dot line
    DashDotDot,
    /// Medium dash-dot-dot line
    MediumDashDotDot,
    /// Slanted dash-dot line
    SlantDashDot,
}

impl BorderLineStyle {
    /// The style name as it appears in stylesheet XML
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderLineStyle::Thin => "thin",
            BorderLineStyle::Medium => "medium",
            BorderLineStyle::Thick => "thick",
            BorderLineStyle::Dashed => "dashed",
            BorderLineStyle::Dotted => "dotted",
            BorderLineStyle::Double => "double",
            BorderLineStyle::Hair => "hair",
            BorderLineStyle::MediumDashed => "mediumDashed",
            BorderLineStyle::DashDot => "dashDot",
            BorderLineStyle::MediumDashDot => "mediumDashDot",
            BorderLineStyle::DashDotDot => "dashDotDot",
            BorderLineStyle::MediumDashDotDot => "mediumDashDotDot",
            BorderLineStyle::SlantDashDot => "slantDashDot",
        }
    }

    /// Parse a style name from stylesheet XML
    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s {
            "thin" => BorderLineStyle::Thin,
            "medium" => BorderLineStyle::Medium,
            "thick" => BorderLineStyle::Thick,
            "dashed" => BorderLineStyle::Dashed,
            "dotted" => BorderLineStyle::Dotted,
            "double" => BorderLineStyle::Double,
            "hair" => BorderLineStyle::Hair,
            "mediumDashed" => BorderLineStyle::MediumDashed,
            "dashDot" => BorderLineStyle::DashDot,
            "mediumDashDot" => BorderLineStyle::MediumDashDot,
            "dashDotDot" => BorderLineStyle::DashDotDot,
            "mediumDashDotDot" => BorderLineStyle::MediumDashDotDot,
            "slantDashDot" => BorderLineStyle::SlantDashDot,
            _ => return None,
        })
    }
}
