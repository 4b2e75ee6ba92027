//! Worksheet grid
//!
//! The worksheet owns the sparse cell table and everything addressed by
//! range: row/column metadata, merges, and the opaque rule payloads.
//! Interners live on the workbook; a worksheet only ever holds indices into
//! them, so all value-writing APIs go through [`crate::SheetHandle`].

use std::collections::BTreeMap;

use crate::cell::{CellData, CellValue};
use crate::column::{self, ColumnInfo};
use crate::drawing::Drawing;
use crate::formula::derive_formula;
use crate::range::CellRange;
use crate::reference::CellRef;
use crate::row::RowInfo;

/// Default row height in points
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Default column width in character units
pub const DEFAULT_COL_WIDTH: f64 = 8.43;

/// A conditional-formatting attachment: ranges plus an opaque rule payload
///
/// The payload is the raw `<conditionalFormatting>` element exactly as it
/// appears in a worksheet part; rules are never interpreted here and are
/// re-emitted verbatim on save.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFormat {
    /// Ranges the rules apply to
    pub ranges: Vec<CellRange>,
    /// Raw element XML
    pub xml: String,
}

/// A data-validation attachment: ranges plus an opaque rule payload
///
/// Same contract as [`ConditionalFormat`]: the raw `<dataValidation>`
/// element round-trips untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct DataValidation {
    /// Ranges the rule applies to
    pub ranges: Vec<CellRange>,
    /// Raw element XML
    pub xml: String,
}

/// A hyperlink attached to a cell
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperlink {
    /// The cell carrying the link
    pub cell: CellRef,
    /// Link target
    pub target: HyperlinkTarget,
    /// Optional hover tooltip
    pub tooltip: Option<String>,
}

/// Where a hyperlink points
#[derive(Debug, Clone, PartialEq)]
pub enum HyperlinkTarget {
    /// A URL outside the package (registered as an external relationship)
    External(String),
    /// A location inside the workbook (e.g., "Sheet2!A1")
    Internal(String),
}

/// One shared-formula group: the canonical text lives at the root cell
#[derive(Debug, Clone, PartialEq)]
pub struct SharedFormulaGroup {
    /// Group id, unique within the worksheet
    pub id: u32,
    /// Root cell (carries the text)
    pub root: CellRef,
    /// Range the group covers
    pub range: CellRange,
    /// Canonical formula text
    pub text: String,
}

/// A single worksheet's grid and range-keyed attachments
#[derive(Debug, Default)]
pub struct Worksheet {
    /// Sparse cell table: row -> column -> cell
    rows: BTreeMap<u32, BTreeMap<u16, CellData>>,
    /// Per-row metadata, addressed individually
    row_info: BTreeMap<u32, RowInfo>,
    /// Column metadata as a partition of the touched column space,
    /// keyed by interval start
    columns: BTreeMap<u16, ColumnInfo>,
    /// Bounding box of every cell ever written; grows monotonically and
    /// never shrinks, even after a cell is cleared
    dimension: CellRange,
    /// Merged ranges
    merges: Vec<CellRange>,
    /// Shared-formula groups
    shared_formulas: Vec<SharedFormulaGroup>,
    /// Opaque data-validation payloads
    validations: Vec<DataValidation>,
    /// Opaque conditional-formatting payloads
    conditional_formats: Vec<ConditionalFormat>,
    /// Hyperlinks
    hyperlinks: Vec<Hyperlink>,
    /// Attached drawing, if any
    drawing: Option<Drawing>,
    /// Default row height in points
    default_row_height: f64,
    /// Default column width in character units
    default_col_width: f64,
}

impl Worksheet {
    /// Create an empty worksheet
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            row_info: BTreeMap::new(),
            columns: BTreeMap::new(),
            dimension: CellRange::EMPTY,
            merges: Vec::new(),
            shared_formulas: Vec::new(),
            validations: Vec::new(),
            conditional_formats: Vec::new(),
            hyperlinks: Vec::new(),
            drawing: None,
            default_row_height: DEFAULT_ROW_HEIGHT,
            default_col_width: DEFAULT_COL_WIDTH,
        }
    }

    // === Cells ===

    /// Get a cell, if present
    pub fn cell(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Get a mutable cell, if present
    pub fn cell_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.rows.get_mut(&row).and_then(|r| r.get_mut(&col))
    }

    /// Store a cell, expanding the dimension to include it
    pub fn put_cell(&mut self, row: u32, col: u16, data: CellData) {
        self.dimension.expand(row, col);
        self.rows.entry(row).or_default().insert(col, data);
    }

    /// Remove a cell; the dimension is left untouched
    pub fn clear_cell(&mut self, row: u32, col: u16) -> Option<CellData> {
        let row_map = self.rows.get_mut(&row)?;
        let removed = row_map.remove(&col);
        if row_map.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Iterate over all cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, data)| (row, col, data)))
    }

    /// Iterate over row indices that hold cells or metadata, ascending
    pub fn touched_rows(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = self.rows.keys().copied().collect();
        for &r in self.row_info.keys() {
            if !self.rows.contains_key(&r) {
                rows.push(r);
            }
        }
        rows.sort_unstable();
        rows
    }

    /// Iterate over cells of one row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(&col, data)| (col, data)))
    }

    /// The bounding box of every cell ever written
    pub fn dimension(&self) -> CellRange {
        self.dimension
    }

    /// Grow the dimension to cover a whole range
    ///
    /// Package readers use this to honor a file's declared dimension even
    /// when some of its corners hold no cells.
    pub fn expand_dimension(&mut self, range: &CellRange) {
        if !range.is_empty() {
            self.dimension.expand(range.first_row, range.first_col);
            self.dimension.expand(range.last_row, range.last_col);
        }
    }

    // === Formula resolution ===

    /// Resolve the display text of a formula cell
    ///
    /// Shared-formula followers derive their text from the group root,
    /// offset by their distance from it; every other formula kind returns
    /// its stored text.
    pub fn formula_text(&self, row: u32, col: u16) -> Option<String> {
        match &self.cell(row, col)?.value {
            CellValue::Formula { text, .. } => Some(text.clone()),
            CellValue::ArrayFormula { text, .. } => Some(text.clone()),
            CellValue::SharedFormula {
                text: Some(text), ..
            } => Some(text.clone()),
            CellValue::SharedFormula {
                text: None,
                shared_id,
                ..
            } => {
                let group = self.shared_formula_group(*shared_id)?;
                Some(derive_formula(
                    &group.text,
                    group.root,
                    CellRef::new(row, col),
                ))
            }
            _ => None,
        }
    }

    /// Register a shared-formula group
    pub fn add_shared_formula_group(&mut self, group: SharedFormulaGroup) {
        self.shared_formulas.push(group);
    }

    /// Look up a shared-formula group by id
    pub fn shared_formula_group(&self, id: u32) -> Option<&SharedFormulaGroup> {
        self.shared_formulas.iter().find(|g| g.id == id)
    }

    /// All shared-formula groups
    pub fn shared_formula_groups(&self) -> &[SharedFormulaGroup] {
        &self.shared_formulas
    }

    /// Next free shared-formula group id
    pub fn next_shared_formula_id(&self) -> u32 {
        self.shared_formulas
            .iter()
            .map(|g| g.id + 1)
            .max()
            .unwrap_or(0)
    }

    // === Rows ===

    /// Get row metadata, if the row has any
    pub fn row_info(&self, row: u32) -> Option<&RowInfo> {
        self.row_info.get(&row)
    }

    /// Get or create row metadata
    pub fn row_info_mut(&mut self, row: u32) -> &mut RowInfo {
        self.row_info.entry(row).or_default()
    }

    /// All row metadata in row order
    pub fn row_infos(&self) -> impl Iterator<Item = (u32, &RowInfo)> {
        self.row_info.iter().map(|(&r, info)| (r, info))
    }

    /// Effective height of a row in points
    pub fn row_height(&self, row: u32) -> f64 {
        self.row_info
            .get(&row)
            .and_then(|i| i.height)
            .unwrap_or(self.default_row_height)
    }

    // === Columns ===

    /// Apply a property change over a column interval
    ///
    /// Existing records straddling either boundary are split at it; records
    /// inside the interval are updated; uncovered gaps get new records. The
    /// stored records always partition the touched column space.
    pub fn set_column_properties<F>(&mut self, first_col: u16, last_col: u16, apply: F)
    where
        F: FnMut(&mut ColumnInfo),
    {
        let map = std::mem::take(&mut self.columns);
        self.columns = column::apply_to_interval(map, first_col, last_col, apply);
    }

    /// Column metadata covering a column, if any
    pub fn column_info(&self, col: u16) -> Option<&ColumnInfo> {
        self.columns
            .range(..=col)
            .next_back()
            .map(|(_, info)| info)
            .filter(|info| info.last_col >= col)
    }

    /// All column records in column order
    pub fn column_infos(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.values()
    }

    /// Effective width of a column in character units
    pub fn column_width(&self, col: u16) -> f64 {
        self.column_info(col)
            .and_then(|i| i.width)
            .unwrap_or(self.default_col_width)
    }

    // === Merges ===

    /// Merged ranges
    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    /// Record a merged range
    pub fn add_merge(&mut self, range: CellRange) {
        self.merges.push(range);
    }

    /// Remove a merged range; returns whether it was present
    pub fn remove_merge(&mut self, range: &CellRange) -> bool {
        match self.merges.iter().position(|m| m == range) {
            Some(i) => {
                self.merges.remove(i);
                true
            }
            None => false,
        }
    }

    // === Attachments ===

    /// Attach a data-validation payload
    pub fn add_validation(&mut self, validation: DataValidation) {
        self.validations.push(validation);
    }

    /// Data-validation payloads
    pub fn validations(&self) -> &[DataValidation] {
        &self.validations
    }

    /// Attach a conditional-formatting payload
    pub fn add_conditional_format(&mut self, cf: ConditionalFormat) {
        self.conditional_formats.push(cf);
    }

    /// Conditional-formatting payloads
    pub fn conditional_formats(&self) -> &[ConditionalFormat] {
        &self.conditional_formats
    }

    /// Attach a hyperlink
    pub fn add_hyperlink(&mut self, link: Hyperlink) {
        self.hyperlinks.push(link);
    }

    /// Hyperlinks
    pub fn hyperlinks(&self) -> &[Hyperlink] {
        &self.hyperlinks
    }

    /// The attached drawing, if any
    pub fn drawing(&self) -> Option<&Drawing> {
        self.drawing.as_ref()
    }

    /// Get or create the attached drawing
    pub fn drawing_mut(&mut self) -> &mut Drawing {
        self.drawing.get_or_insert_with(Drawing::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    #[test]
    fn test_put_and_clear() {
        let mut ws = Worksheet::new();
        ws.put_cell(1, 1, CellData::new(CellValue::Number(1.0)));
        assert_eq!(ws.cell_count(), 1);

        ws.clear_cell(1, 1);
        assert_eq!(ws.cell_count(), 0);
        assert!(ws.cell(1, 1).is_none());
    }

    #[test]
    fn test_dimension_monotonic() {
        let mut ws = Worksheet::new();
        assert!(ws.dimension().is_empty());

        ws.put_cell(2, 2, CellData::new(CellValue::Number(1.0)));
        ws.put_cell(4, 4, CellData::new(CellValue::Number(2.0)));
        assert_eq!(ws.dimension(), CellRange::new(2, 2, 4, 4));

        // Clearing never shrinks the dimension
        ws.clear_cell(4, 4);
        ws.clear_cell(2, 2);
        assert_eq!(ws.dimension(), CellRange::new(2, 2, 4, 4));
    }

    #[test]
    fn test_dimension_write_order_independent() {
        let mut a = Worksheet::new();
        a.put_cell(2, 2, CellData::default());
        a.put_cell(4, 4, CellData::default());

        let mut b = Worksheet::new();
        b.put_cell(4, 4, CellData::default());
        b.put_cell(2, 2, CellData::default());

        assert_eq!(a.dimension(), b.dimension());
    }

    #[test]
    fn test_column_lookup_respects_partition() {
        let mut ws = Worksheet::new();
        ws.set_column_properties(2, 6, |c| c.width = Some(20.0));
        ws.set_column_properties(4, 4, |c| c.hidden = true);

        assert_eq!(ws.column_width(3), 20.0);
        assert_eq!(ws.column_width(4), 20.0);
        assert!(ws.column_info(4).unwrap().hidden);
        assert!(!ws.column_info(5).unwrap().hidden);
        assert!(ws.column_info(1).is_none());
        assert!(ws.column_info(7).is_none());
    }

    #[test]
    fn test_shared_formula_follower_derivation() {
        let mut ws = Worksheet::new();
        ws.add_shared_formula_group(SharedFormulaGroup {
            id: 0,
            root: CellRef::new(1, 2),
            range: CellRange::parse("B1:B3").unwrap(),
            text: "A1*A1".into(),
        });
        ws.put_cell(
            1,
            2,
            CellData::new(CellValue::SharedFormula {
                text: Some("A1*A1".into()),
                shared_id: 0,
                result: None,
            }),
        );
        ws.put_cell(
            2,
            2,
            CellData::new(CellValue::SharedFormula {
                text: None,
                shared_id: 0,
                result: None,
            }),
        );

        assert_eq!(ws.formula_text(1, 2).as_deref(), Some("A1*A1"));
        assert_eq!(ws.formula_text(2, 2).as_deref(), Some("A2*A2"));
    }

    #[test]
    fn test_merge_bookkeeping() {
        let mut ws = Worksheet::new();
        let range = CellRange::parse("B1:B5").unwrap();
        ws.add_merge(range);
        assert_eq!(ws.merges().len(), 1);

        assert!(ws.remove_merge(&range));
        assert!(ws.merges().is_empty());
        assert!(!ws.remove_merge(&range));
    }

    #[test]
    fn test_touched_rows_includes_metadata_only_rows() {
        let mut ws = Worksheet::new();
        ws.put_cell(3, 1, CellData::default());
        ws.row_info_mut(7).height = Some(30.0);

        assert_eq!(ws.touched_rows(), vec![3, 7]);
    }
}
