//! Number format types
//!
//! Format codes are stored and round-tripped, never rendered into display
//! strings here.

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by numeric id (0-49 range, with gaps)
    BuiltIn(u16),

    /// Custom format code string
    Custom(String),
}

/// First id handed out for custom format codes
pub const CUSTOM_FORMAT_BASE: u16 = 176;

/// The built-in format code table: `(id, code)` pairs
///
/// Ids live in the 0-49 range with documented gaps; anything outside this
/// table is a custom code.
const BUILTIN_FORMATS: &[(u16, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (5, "($#,##0_);($#,##0)"),
    (6, "($#,##0_);[Red]($#,##0)"),
    (7, "($#,##0.00_);($#,##0.00)"),
    (8, "($#,##0.00_);[Red]($#,##0.00)"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "m/d/yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "(#,##0_);(#,##0)"),
    (38, "(#,##0_);[Red](#,##0)"),
    (39, "(#,##0.00_);(#,##0.00)"),
    (40, "(#,##0.00_);[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mm:ss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

impl NumberFormat {
    /// Create a format from a code string, recognizing built-in codes
    pub fn from_code<S: AsRef<str>>(code: S) -> Self {
        let code = code.as_ref();
        if code == "General" {
            return NumberFormat::General;
        }
        match builtin_id_for_code(code) {
            Some(id) => NumberFormat::BuiltIn(id),
            None => NumberFormat::Custom(code.to_string()),
        }
    }

    /// Create a built-in format by id
    pub fn builtin(id: u16) -> Self {
        if id == 0 {
            NumberFormat::General
        } else {
            NumberFormat::BuiltIn(id)
        }
    }

    /// Get the format code string
    pub fn code(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => builtin_code_for_id(*id).unwrap_or("General"),
            NumberFormat::Custom(s) => s,
        }
    }

    /// Check if this is a date/time format
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22 | 45..=47),
            NumberFormat::Custom(s) => {
                let lower = s.to_lowercase();
                (lower.contains('y')
                    || lower.contains('m')
                    || lower.contains('d')
                    || lower.contains('h')
                    || lower.contains('s'))
                    && !lower.contains('"')
            }
            NumberFormat::General => false,
        }
    }
}

/// Map a format code to its built-in id, if the code is in the fixed table
pub fn builtin_id_for_code(code: &str) -> Option<u16> {
    BUILTIN_FORMATS
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(id, _)| *id)
}

/// Map a built-in id to its format code
pub fn builtin_code_for_id(id: u16) -> Option<&'static str> {
    BUILTIN_FORMATS
        .iter()
        .find(|(i, _)| *i == id)
        .map(|(_, c)| *c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(builtin_id_for_code("0.00"), Some(2));
        assert_eq!(builtin_id_for_code("@"), Some(49));
        assert_eq!(builtin_id_for_code("#,##0.000"), None);
        assert_eq!(builtin_code_for_id(9), Some("0%"));
        assert_eq!(builtin_code_for_id(23), None); // a gap in the table
    }

    #[test]
    fn test_from_code() {
        assert_eq!(NumberFormat::from_code("General"), NumberFormat::General);
        assert_eq!(NumberFormat::from_code("0%"), NumberFormat::BuiltIn(9));
        assert_eq!(
            NumberFormat::from_code("0.000"),
            NumberFormat::Custom("0.000".into())
        );
    }

    #[test]
    fn test_code_roundtrip() {
        assert_eq!(NumberFormat::BuiltIn(14).code(), "m/d/yy");
        assert_eq!(NumberFormat::Custom("0.000".into()).code(), "0.000");
        assert_eq!(NumberFormat::General.code(), "General");
    }

    #[test]
    fn test_is_date_format() {
        assert!(NumberFormat::BuiltIn(14).is_date_format());
        assert!(NumberFormat::BuiltIn(22).is_date_format());
        assert!(!NumberFormat::BuiltIn(9).is_date_format());
        assert!(NumberFormat::Custom("yyyy-mm-dd".into()).is_date_format());
        assert!(!NumberFormat::Custom("0.0\"m\"".into()).is_date_format());
    }
}
