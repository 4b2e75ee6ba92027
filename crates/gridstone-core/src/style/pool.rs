//! Format pool: deduplication into stable indices
//!
//! The pool is owned per-workbook and passed by handle to every sheet, so
//! independent workbooks never share format state.

use super::number_format::{builtin_id_for_code, CUSTOM_FORMAT_BASE};
use super::{Format, NumberFormat};
use ahash::AHashMap;

/// Which index space a format registers into
///
/// A given descriptor belongs to exactly one of the two spaces, never both:
/// cell formats are referenced by cells and row/column metadata, differential
/// formats only by conditional-formatting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatRole {
    /// Normal cell format (xf index space)
    Cell,
    /// Differential format for conditional formatting (dxf index space)
    Differential,
}

/// Deduplicating format table with separate cell and differential spaces
///
/// Interning the same descriptor content always yields the same index within
/// one pool, and index assignment order equals first-intern order, so the
/// serialized stylesheet is reproducible across runs given the same write
/// order.
#[derive(Debug)]
pub struct FormatPool {
    /// Cell formats; index 0 is the default format
    cell: Vec<Format>,
    cell_index: AHashMap<Format, u32>,
    /// Differential formats
    differential: Vec<Format>,
    differential_index: AHashMap<Format, u32>,
    /// Custom number-format ids, keyed by code string
    numfmt_ids: AHashMap<String, u16>,
    next_numfmt_id: u16,
}

impl FormatPool {
    /// Create a pool with the default format seeded at cell index 0
    pub fn new() -> Self {
        let mut pool = Self::empty();
        pool.intern(Format::default(), FormatRole::Cell);
        pool
    }

    /// Create a pool with no entries at all
    ///
    /// Package readers use this so the file's own format table can occupy
    /// the indices its cells reference, starting from 0.
    pub fn empty() -> Self {
        Self {
            cell: Vec::with_capacity(16),
            cell_index: AHashMap::with_capacity(16),
            differential: Vec::new(),
            differential_index: AHashMap::new(),
            numfmt_ids: AHashMap::new(),
            next_numfmt_id: CUSTOM_FORMAT_BASE,
        }
    }

    /// Intern a format into the given role's index space
    ///
    /// Returns the existing index on a content hit, otherwise appends the
    /// descriptor (index = current length). Custom number-format codes get
    /// their id assigned on first sight. Infallible: any descriptor is
    /// acceptable.
    pub fn intern(&mut self, format: Format, role: FormatRole) -> u32 {
        self.assign_numfmt_id(&format.number_format);

        let (list, index) = match role {
            FormatRole::Cell => (&mut self.cell, &mut self.cell_index),
            FormatRole::Differential => (&mut self.differential, &mut self.differential_index),
        };

        if let Some(&idx) = index.get(&format) {
            return idx;
        }

        let idx = list.len() as u32;
        index.insert(format.clone(), idx);
        list.push(format);
        idx
    }

    /// Append a format without deduplication
    ///
    /// Used while loading a package: a stylesheet may legally contain
    /// duplicate xf records, and every one of them must keep its slot so
    /// cell `s=` indices resolve. The lookup map keeps the first occurrence.
    pub fn adopt(&mut self, format: Format, role: FormatRole) -> u32 {
        self.assign_numfmt_id(&format.number_format);

        let (list, index) = match role {
            FormatRole::Cell => (&mut self.cell, &mut self.cell_index),
            FormatRole::Differential => (&mut self.differential, &mut self.differential_index),
        };

        let idx = list.len() as u32;
        index.entry(format.clone()).or_insert(idx);
        list.push(format);
        idx
    }

    /// Get a cell format by index
    pub fn get(&self, index: u32) -> Option<&Format> {
        self.cell.get(index as usize)
    }

    /// Get a differential format by index
    pub fn get_differential(&self, index: u32) -> Option<&Format> {
        self.differential.get(index as usize)
    }

    /// Number of cell formats
    pub fn cell_count(&self) -> usize {
        self.cell.len()
    }

    /// Number of differential formats
    pub fn differential_count(&self) -> usize {
        self.differential.len()
    }

    /// Iterate over cell formats in index order
    pub fn iter_cell(&self) -> impl Iterator<Item = (u32, &Format)> {
        self.cell.iter().enumerate().map(|(i, f)| (i as u32, f))
    }

    /// Iterate over differential formats in index order
    pub fn iter_differential(&self) -> impl Iterator<Item = (u32, &Format)> {
        self.differential
            .iter()
            .enumerate()
            .map(|(i, f)| (i as u32, f))
    }

    /// Resolve a number format to its serialized id
    ///
    /// Built-in codes map through the fixed table; custom codes must have
    /// been assigned an id by a prior intern/adopt of a format carrying
    /// them, which holds for every format reachable from this pool.
    pub fn number_format_id(&self, nf: &NumberFormat) -> u16 {
        match nf {
            NumberFormat::General => 0,
            NumberFormat::BuiltIn(id) => *id,
            NumberFormat::Custom(code) => self.numfmt_ids.get(code).copied().unwrap_or(0),
        }
    }

    /// Iterate over custom number formats as `(id, code)`, in id order
    pub fn custom_number_formats(&self) -> Vec<(u16, &str)> {
        let mut out: Vec<(u16, &str)> = self
            .numfmt_ids
            .iter()
            .map(|(code, &id)| (id, code.as_str()))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    fn assign_numfmt_id(&mut self, nf: &NumberFormat) {
        if let NumberFormat::Custom(code) = nf {
            // Codes matching the built-in table never consume a custom id.
            if builtin_id_for_code(code).is_some() {
                return;
            }
            if !self.numfmt_ids.contains_key(code.as_str()) {
                self.numfmt_ids.insert(code.clone(), self.next_numfmt_id);
                self.next_numfmt_id += 1;
            }
        }
    }
}

impl Default for FormatPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn test_default_seeded_at_zero() {
        let pool = FormatPool::new();
        assert_eq!(pool.cell_count(), 1);
        assert_eq!(pool.get(0), Some(&Format::default()));
        assert_eq!(pool.differential_count(), 0);
    }

    #[test]
    fn test_intern_idempotent() {
        let mut pool = FormatPool::new();

        let bold = Format::new().bold(true);
        let idx1 = pool.intern(bold.clone(), FormatRole::Cell);
        let idx2 = pool.intern(bold.clone(), FormatRole::Cell);
        let idx3 = pool.intern(Format::new().italic(true), FormatRole::Cell);

        assert_eq!(idx1, idx2);
        assert_ne!(idx1, idx3);
        assert_eq!(pool.cell_count(), 3);

        // Repeating the whole sequence changes nothing.
        assert_eq!(pool.intern(bold, FormatRole::Cell), idx1);
        assert_eq!(pool.cell_count(), 3);
    }

    #[test]
    fn test_index_order_is_intern_order() {
        let mut pool = FormatPool::new();

        let a = pool.intern(Format::new().bold(true), FormatRole::Cell);
        let b = pool.intern(Format::new().italic(true), FormatRole::Cell);
        let c = pool.intern(Format::new().font_size(14.0), FormatRole::Cell);
        assert_eq!((a, b, c), (1, 2, 3));
    }

    #[test]
    fn test_roles_are_separate_spaces() {
        let mut pool = FormatPool::new();

        let red = Format::new().fill_color(Color::RED);
        let dxf = pool.intern(red.clone(), FormatRole::Differential);
        assert_eq!(dxf, 0);
        assert_eq!(pool.differential_count(), 1);

        // The same content interned as a cell format gets its own index in
        // the other space; neither space sees the other's entry.
        let xf = pool.intern(red.clone(), FormatRole::Cell);
        assert_eq!(xf, 1);
        assert_eq!(pool.get_differential(0), Some(&red));
        assert_eq!(pool.get(1), Some(&red));
    }

    #[test]
    fn test_custom_numfmt_ids() {
        let mut pool = FormatPool::new();

        pool.intern(Format::new().number_format("0.000"), FormatRole::Cell);
        pool.intern(Format::new().number_format("yyyy-mm-dd"), FormatRole::Cell);
        // Repeated use of the same code reuses its id.
        pool.intern(
            Format::new().number_format("0.000").bold(true),
            FormatRole::Cell,
        );

        let custom = pool.custom_number_formats();
        assert_eq!(custom.len(), 2);
        assert_eq!(custom[0], (CUSTOM_FORMAT_BASE, "0.000"));
        assert_eq!(custom[1], (CUSTOM_FORMAT_BASE + 1, "yyyy-mm-dd"));

        assert_eq!(
            pool.number_format_id(&NumberFormat::Custom("0.000".into())),
            CUSTOM_FORMAT_BASE
        );
    }

    #[test]
    fn test_builtin_codes_take_builtin_ids() {
        let mut pool = FormatPool::new();

        let f = Format::new().number_format("0.00%");
        pool.intern(f.clone(), FormatRole::Cell);

        assert_eq!(pool.number_format_id(&f.number_format), 10);
        assert!(pool.custom_number_formats().is_empty());
    }

    #[test]
    fn test_adopt_keeps_duplicates() {
        let mut pool = FormatPool::empty();

        let bold = Format::new().bold(true);
        assert_eq!(pool.adopt(Format::default(), FormatRole::Cell), 0);
        assert_eq!(pool.adopt(bold.clone(), FormatRole::Cell), 1);
        assert_eq!(pool.adopt(bold.clone(), FormatRole::Cell), 2);

        assert_eq!(pool.cell_count(), 3);
        // Interning after adoption still finds the first occurrence.
        assert_eq!(pool.intern(bold, FormatRole::Cell), 1);
    }
}
