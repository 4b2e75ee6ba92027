//! Color representation

use std::fmt;

/// A color as used by fonts, fills, and borders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    /// Automatic (theme-dependent) color
    #[default]
    Auto,
    /// RGB color (fully opaque)
    Rgb {
        /// Red component
        r: u8,
        /// Green component
        g: u8,
        /// Blue component
        b: u8,
    },
    /// Indexed color from the legacy palette
    Indexed(u8),
    /// Theme color slot, with tint in hundredths (-100..=100)
    Theme {
        /// Theme slot index
        index: u8,
        /// Tint in hundredths of the -1.0..1.0 range
        tint: i8,
    },
}

impl Color {
    /// Black (#000000)
    pub const BLACK: Color = Color::Rgb { r: 0, g: 0, b: 0 };
    /// White (#FFFFFF)
    pub const WHITE: Color = Color::Rgb {
        r: 0xFF,
        g: 0xFF,
        b: 0xFF,
    };
    /// Red (#FF0000)
    pub const RED: Color = Color::Rgb { r: 0xFF, g: 0, b: 0 };
    /// Green (#00FF00)
    pub const GREEN: Color = Color::Rgb { r: 0, g: 0xFF, b: 0 };
    /// Blue (#0000FF)
    pub const BLUE: Color = Color::Rgb { r: 0, g: 0, b: 0xFF };
    /// Yellow (#FFFF00)
    pub const YELLOW: Color = Color::Rgb {
        r: 0xFF,
        g: 0xFF,
        b: 0,
    };
    /// Gray (#808080)
    pub const GRAY: Color = Color::Rgb {
        r: 0x80,
        g: 0x80,
        b: 0x80,
    };

    /// Create an RGB color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    /// Parse an "RRGGBB" or "AARRGGBB" hex string (alpha is discarded)
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.trim_start_matches('#');
        let rgb = match s.len() {
            6 => u32::from_str_radix(s, 16).ok()?,
            8 => u32::from_str_radix(&s[2..], 16).ok()?,
            _ => return None,
        };
        Some(Color::Rgb {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        })
    }

    /// Format as an "AARRGGBB" hex string (alpha always FF)
    ///
    /// Only meaningful for RGB colors; other variants render their nearest
    /// stand-in.
    pub fn to_argb_hex(&self) -> String {
        match self {
            Color::Rgb { r, g, b } => format!("FF{:02X}{:02X}{:02X}", r, g, b),
            _ => "FF000000".to_string(),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Auto => write!(f, "auto"),
            Color::Rgb { r, g, b } => write!(f, "#{:02X}{:02X}{:02X}", r, g, b),
            Color::Indexed(i) => write!(f, "indexed({})", i),
            Color::Theme { index, tint } => write!(f, "theme({}, {})", index, tint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("FF0000"), Some(Color::RED));
        assert_eq!(Color::from_hex("#0000FF"), Some(Color::BLUE));
        assert_eq!(Color::from_hex("FF00FF00"), Some(Color::GREEN));
        assert_eq!(Color::from_hex("xyz"), None);
    }

    #[test]
    fn test_to_argb_hex() {
        assert_eq!(Color::RED.to_argb_hex(), "FFFF0000");
        assert_eq!(Color::rgb(0x12, 0x34, 0x56).to_argb_hex(), "FF123456");
    }
}
