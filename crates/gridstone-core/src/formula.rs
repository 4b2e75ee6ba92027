//! Shared-formula text derivation
//!
//! A shared formula stores one canonical text at the root cell of its range.
//! Every other cell in the range displays the same formula with its relative
//! references offset by the distance from the root. This module derives that
//! display text; nothing here evaluates anything.

use crate::reference::CellRef;
use crate::{MAX_COL, MAX_ROW};

/// Derive a follower cell's formula text from the group root
///
/// Scans the root text with a small state machine: double-quoted string
/// literals are copied verbatim (including `""` escapes), maximal
/// letters-then-digits runs that parse as an in-range cell reference are
/// shifted by the row/column delta, and everything else passes through
/// unchanged.
///
/// `$` absolute markers are not treated specially: all matched references
/// shift uniformly, which mirrors how existing producers fill shared
/// formulas. See DESIGN.md before changing this.
///
/// # Examples
/// ```
/// use gridstone_core::{derive_formula, CellRef};
///
/// let root = CellRef::new(1, 2); // B1
/// assert_eq!(derive_formula("A1*A1", root, CellRef::new(2, 2)), "A2*A2");
/// assert_eq!(derive_formula("A1*A1", root, CellRef::new(1, 3)), "B1*B1");
/// assert_eq!(derive_formula("A1*A1", root, CellRef::new(9, 4)), "C9*C9");
/// ```
pub fn derive_formula(root_text: &str, root: CellRef, target: CellRef) -> String {
    let row_delta = target.row as i64 - root.row as i64;
    let col_delta = target.col as i64 - root.col as i64;

    if row_delta == 0 && col_delta == 0 {
        return root_text.to_string();
    }

    let bytes = root_text.as_bytes();
    let mut out = String::with_capacity(root_text.len());
    // Everything in [segment, i) is pending verbatim copy; only rewritten
    // tokens interrupt it, so multi-byte characters pass through intact.
    let mut segment = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        // String literal: skip through to the closing quote. A doubled
        // quote inside the literal is an escape, not a terminator.
        if b == b'"' {
            i += 1;
            while i < bytes.len() {
                let c = bytes[i];
                i += 1;
                if c == b'"' {
                    if i < bytes.len() && bytes[i] == b'"' {
                        i += 1;
                    } else {
                        break;
                    }
                }
            }
            continue;
        }

        // Candidate reference token: a maximal run of uppercase letters
        // followed by digits.
        if b.is_ascii_uppercase() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_uppercase() {
                i += 1;
            }
            let digits_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }

            if digits_start < i {
                let letters = &root_text[start..digits_start];
                let digits = &root_text[digits_start..i];
                if let Some((row, col)) = parse_reference(letters, digits) {
                    let new_row = row as i64 + row_delta;
                    let new_col = col as i64 + col_delta;
                    if new_row >= 1
                        && new_row <= MAX_ROW as i64
                        && new_col >= 1
                        && new_col <= MAX_COL as i64
                    {
                        out.push_str(&root_text[segment..start]);
                        out.push_str(&CellRef::column_to_letters(new_col as u16));
                        out.push_str(&new_row.to_string());
                        segment = i;
                    }
                }
            }
            // Anything not rewritten stays part of the verbatim segment.
            continue;
        }

        i += 1;
    }

    out.push_str(&root_text[segment..]);
    out
}

/// Parse a letters+digits token into `(row, col)` if both halves are in range
fn parse_reference(letters: &str, digits: &str) -> Option<(u32, u16)> {
    let col = CellRef::column_from_letters(letters).ok()?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 || row > MAX_ROW {
        return None;
    }
    Some((row, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(s: &str) -> CellRef {
        CellRef::parse(s).unwrap()
    }

    #[test]
    fn test_row_shift() {
        assert_eq!(derive_formula("A1*A1", r("B1"), r("B2")), "A2*A2");
        assert_eq!(derive_formula("A1+A2", r("B1"), r("B3")), "A3+A4");
    }

    #[test]
    fn test_col_shift() {
        assert_eq!(derive_formula("A1*A1", r("B1"), r("C1")), "B1*B1");
    }

    #[test]
    fn test_combined_shift() {
        assert_eq!(derive_formula("A1*A1", r("B1"), r("D9")), "C9*C9");
    }

    #[test]
    fn test_root_is_identity() {
        assert_eq!(derive_formula("SUM(A1:A9)", r("B1"), r("B1")), "SUM(A1:A9)");
    }

    #[test]
    fn test_range_operands_shift() {
        assert_eq!(
            derive_formula("SUM(A1:A9)", r("B10"), r("C10")),
            "SUM(B1:B9)"
        );
    }

    #[test]
    fn test_string_literals_untouched() {
        assert_eq!(
            derive_formula("IF(A1>0,\"A1 up\",\"down\")", r("B1"), r("B2")),
            "IF(A2>0,\"A1 up\",\"down\")"
        );
        // Doubled quotes inside a literal do not end it
        assert_eq!(
            derive_formula("CONCAT(\"say \"\"A1\"\"\",A1)", r("B1"), r("B2")),
            "CONCAT(\"say \"\"A1\"\"\",A2)"
        );
    }

    #[test]
    fn test_function_names_pass_through() {
        // SUM has no digit tail, so it is never a candidate token.
        assert_eq!(derive_formula("SUM(A1,B1)", r("C1"), r("C2")), "SUM(A2,B2)");
    }

    #[test]
    fn test_out_of_range_shift_left_alone() {
        // Shifting A1 up a row would leave the sheet; the token stays put.
        assert_eq!(derive_formula("A1+B2", r("B2"), r("B1")), "A1+B1");
    }

    #[test]
    fn test_oversized_token_left_alone() {
        // XFE is past the last column, so XFE1 is not a reference.
        assert_eq!(derive_formula("XFE1", r("A1"), r("A2")), "XFE1");
    }
}
