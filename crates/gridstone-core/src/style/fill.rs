//! Cell fill settings

use super::Color;

/// Background fill of a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fill {
    /// No fill
    #[default]
    None,
    /// Solid fill with a single color
    Solid {
        /// Fill color
        color: Color,
    },
    /// Patterned fill
    Pattern {
        /// Pattern type
        pattern: PatternType,
        /// Pattern foreground color
        foreground: Color,
        /// Pattern background color
        background: Color,
    },
}

impl Fill {
    /// Create a solid fill
    pub fn solid(color: Color) -> Self {
        Fill::Solid { color }
    }
}

/// Fill pattern types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PatternType {
    /// Medium gray pattern
    MediumGray,
    /// Dark gray pattern
    DarkGray,
    /// Light gray pattern
    LightGray,
    /// Dark horizontal lines
    DarkHorizontal,
    /// Dark vertical lines
    DarkVertical,
    /// Dark diagonal down
    DarkDown,
    /// Dark diagonal up
    DarkUp,
    /// Dark grid
    DarkGrid,
    /// Dark trellis
    DarkTrellis,
    /// Light horizontal lines
    LightHorizontal,
    /// Light vertical lines
    LightVertical,
    /// Light diagonal down
    LightDown,
    /// Light diagonal up
    LightUp,
    /// Light grid
    LightGrid,
    /// Light trellis
    LightTrellis,
    /// 12.5% gray
    Gray125,
    /// 6.25% gray
    Gray0625,
}

impl PatternType {
    /// The pattern name as it appears in stylesheet XML
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::MediumGray => "mediumGray",
            PatternType::DarkGray => "darkGray",
            PatternType::LightGray => "lightGray",
            PatternType::DarkHorizontal => "darkHorizontal",
            PatternType::DarkVertical => "darkVertical",
            PatternType::DarkDown => "darkDown",
            PatternType::DarkUp => "darkUp",
            PatternType::DarkGrid => "darkGrid",
            PatternType::DarkTrellis => "darkTrellis",
            PatternType::LightHorizontal => "lightHorizontal",
            PatternType::LightVertical => "lightVertical",
            PatternType::LightDown => "lightDown",
            PatternType::LightUp => "lightUp",
            PatternType::LightGrid => "lightGrid",
            PatternType::LightTrellis => "lightTrellis",
            PatternType::Gray125 => "gray125",
            PatternType::Gray0625 => "gray0625",
        }
    }

    /// Parse a pattern name from stylesheet XML
    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s {
            "mediumGray" => PatternType::MediumGray,
            "darkGray" => PatternType::DarkGray,
            "lightGray" => PatternType::LightGray,
            "darkHorizontal" => PatternType::DarkHorizontal,
            "darkVertical" => PatternType::DarkVertical,
            "darkDown" => PatternType::DarkDown,
            "darkUp" => PatternType::DarkUp,
            "darkGrid" => PatternType::DarkGrid,
            "darkTrellis" => PatternType::DarkTrellis,
            "lightHorizontal" => PatternType::LightHorizontal,
            "lightVertical" => PatternType::LightVertical,
            "lightDown" => PatternType::LightDown,
            "lightUp" => PatternType::LightUp,
            "lightGrid" => PatternType::LightGrid,
            "lightTrellis" => PatternType::LightTrellis,
            "gray125" => PatternType::Gray125,
            "gray0625" => PatternType::Gray0625,
            _ => return None,
        })
    }
}
