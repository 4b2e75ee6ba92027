//! Workbook type - the main document structure

use crate::cell::{CachedValue, CellData, CellError, CellValue};
use crate::error::{Error, Result};
use crate::range::CellRange;
use crate::reference::CellRef;
use crate::sheet::{Sheet, SheetKind};
use crate::strings::SharedStrings;
use crate::style::{Format, FormatPool, FormatRole};
use crate::worksheet::{
    ConditionalFormat, DataValidation, Hyperlink, SharedFormulaGroup, Worksheet,
};
use crate::{MAX_COL, MAX_ROW, MAX_SHEET_NAME_LEN};

/// A workbook: an ordered list of sheets plus the workbook-level interners
///
/// The format pool and shared-string table are owned here, one instance per
/// workbook; sheets hold only indices into them. All cell mutation goes
/// through [`SheetHandle`] so interning and index re-homing stay consistent.
#[derive(Debug)]
pub struct Workbook {
    /// Sheets in tab order
    sheets: Vec<Sheet>,
    /// Format interner (xf and dxf spaces)
    formats: FormatPool,
    /// Shared string table
    strings: SharedStrings,
    /// Workbook-scoped defined names
    defined_names: Vec<DefinedName>,
    /// Active sheet index
    active_sheet: usize,
    /// Workbook settings
    settings: WorkbookSettings,
    /// Next sheetId to hand out
    next_sheet_id: u32,
}

impl Workbook {
    /// Create a new workbook with one default worksheet
    pub fn new() -> Self {
        let mut wb = Self::empty();
        // A fresh workbook always has a sheet to write into.
        wb.add_sheet(Some("Sheet1")).expect("default sheet name is valid");
        wb
    }

    /// Create a workbook with no sheets
    pub fn empty() -> Self {
        Self {
            sheets: Vec::new(),
            formats: FormatPool::new(),
            strings: SharedStrings::new(),
            defined_names: Vec::new(),
            active_sheet: 0,
            settings: WorkbookSettings::default(),
            next_sheet_id: 1,
        }
    }

    // === Sheets ===

    /// Number of sheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook has no sheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Add a worksheet; `None` generates the next free "SheetN" name
    pub fn add_sheet(&mut self, name: Option<&str>) -> Result<usize> {
        let name = match name {
            Some(n) => n.to_string(),
            None => self.generate_sheet_name(),
        };
        self.validate_sheet_name(&name)?;

        let index = self.sheets.len();
        self.sheets.push(Sheet::worksheet(name, self.next_sheet_id));
        self.next_sheet_id += 1;
        Ok(index)
    }

    /// Add a chartsheet; `None` generates the next free "ChartN" name
    pub fn add_chartsheet(&mut self, name: Option<&str>) -> Result<usize> {
        let name = match name {
            Some(n) => n.to_string(),
            None => self.generate_name_with_prefix("Chart"),
        };
        self.validate_sheet_name(&name)?;

        let index = self.sheets.len();
        self.sheets.push(Sheet::chartsheet(name, self.next_sheet_id));
        self.next_sheet_id += 1;
        Ok(index)
    }

    /// Push an already-built sheet (used by package readers)
    pub fn push_sheet(&mut self, sheet: Sheet) -> Result<usize> {
        self.validate_sheet_name(sheet.name())?;
        self.next_sheet_id = self.next_sheet_id.max(sheet.header.sheet_id + 1);
        let index = self.sheets.len();
        self.sheets.push(sheet);
        Ok(index)
    }

    /// Get a sheet by tab index
    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Get a sheet by name
    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    /// Get the tab index of a sheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name() == name)
    }

    /// Iterate over sheets in tab order
    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }

    /// Get a worksheet's grid by tab index (None for chartsheets)
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)?.as_worksheet()
    }

    /// Get a mutation handle for a worksheet tab
    pub fn sheet_mut(&mut self, index: usize) -> Option<SheetHandle<'_>> {
        let is_worksheet = matches!(self.sheets.get(index)?.kind, SheetKind::Worksheet(_));
        if is_worksheet {
            Some(SheetHandle { book: self, index })
        } else {
            None
        }
    }

    /// Get a mutation handle for a worksheet tab by name
    pub fn sheet_mut_by_name(&mut self, name: &str) -> Option<SheetHandle<'_>> {
        let index = self.sheet_index(name)?;
        self.sheet_mut(index)
    }

    /// Direct mutable access to a sheet (used by package readers)
    pub fn sheet_raw_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    /// Rename a sheet
    pub fn rename_sheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        if index >= self.sheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.sheets.len()));
        }
        self.validate_sheet_name_excluding(new_name, Some(index))?;
        self.sheets[index].header.name = new_name.to_string();
        Ok(())
    }

    /// Get the active sheet index
    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    /// Set the active sheet index
    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.sheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.sheets.len()));
        }
        self.active_sheet = index;
        Ok(())
    }

    // === Interners ===

    /// The format pool
    pub fn formats(&self) -> &FormatPool {
        &self.formats
    }

    /// Mutable access to the format pool (used by package readers and
    /// conditional-formatting hosts interning dxf formats)
    pub fn formats_mut(&mut self) -> &mut FormatPool {
        &mut self.formats
    }

    /// The shared string table
    pub fn strings(&self) -> &SharedStrings {
        &self.strings
    }

    /// Mutable access to the shared string table (used by package readers)
    pub fn strings_mut(&mut self) -> &mut SharedStrings {
        &mut self.strings
    }

    /// Resolve a shared-string index to its text
    pub fn resolve_string(&self, index: u32) -> Option<&str> {
        self.strings.resolve(index)
    }

    /// Intern a format into the differential (dxf) space
    ///
    /// Conditional-formatting payloads reference the returned index through
    /// their `dxfId` attributes.
    pub fn intern_differential_format(&mut self, format: &Format) -> u32 {
        self.formats.intern(format.clone(), FormatRole::Differential)
    }

    /// Drop one reference to a shared string and re-home cell indices
    ///
    /// If the entry is removed, every cell in every sheet referencing a
    /// later index is decremented by one. This is the documented O(n) cost
    /// of keeping indices dense.
    fn release_string(&mut self, index: u32) {
        if let Some(removed) = self.strings.release(index) {
            for sheet in &mut self.sheets {
                if let SheetKind::Worksheet(ws) = &mut sheet.kind {
                    let rows: Vec<u32> = ws.touched_rows();
                    for row in rows {
                        let cols: Vec<u16> = ws.iter_row(row).map(|(c, _)| c).collect();
                        for col in cols {
                            if let Some(cell) = ws.cell_mut(row, col) {
                                if let CellValue::String(i) = &mut cell.value {
                                    if *i > removed {
                                        *i -= 1;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Copy one cell to another location, re-interning its string
    pub fn copy_cell(
        &mut self,
        src_sheet: usize,
        src: CellRef,
        dst_sheet: usize,
        dst: CellRef,
    ) -> Result<()> {
        let sheet_count = self.sheets.len();
        let data = self
            .worksheet(src_sheet)
            .ok_or(Error::SheetOutOfBounds(src_sheet, sheet_count))?
            .cell(src.row, src.col)
            .cloned()
            .unwrap_or_default();

        let data = match data.value {
            CellValue::String(idx) => {
                let text = self
                    .strings
                    .resolve(idx)
                    .ok_or(Error::UnknownStringIndex(idx))?
                    .to_string();
                let new_idx = self.strings.intern(text);
                CellData::with_format(CellValue::String(new_idx), data.format)
            }
            other => CellData::with_format(other, data.format),
        };

        let mut handle = self
            .sheet_mut(dst_sheet)
            .ok_or(Error::SheetOutOfBounds(dst_sheet, sheet_count))?;
        handle.check_bounds(dst.row, dst.col)?;
        handle.replace_cell(dst.row, dst.col, data);
        Ok(())
    }

    // === Defined names ===

    /// Define a workbook-scoped name
    pub fn define_name(&mut self, name: &str, refers_to: &str) -> Result<()> {
        if name.is_empty()
            || name.chars().next().is_some_and(|c| c.is_ascii_digit())
            || name.contains(' ')
        {
            return Err(Error::InvalidName(name.to_string()));
        }
        if self.defined_names.iter().any(|d| d.name == name) {
            return Err(Error::InvalidName(format!("duplicate name '{}'", name)));
        }
        self.defined_names.push(DefinedName {
            name: name.to_string(),
            refers_to: refers_to.to_string(),
            hidden: false,
        });
        Ok(())
    }

    /// Append an already-validated defined name (used by package readers,
    /// which must accept names like `_xlnm.Print_Area` verbatim)
    pub fn push_defined_name(&mut self, name: DefinedName) {
        if self.defined_names.iter().any(|d| d.name == name.name) {
            return;
        }
        self.defined_names.push(name);
    }

    /// Workbook-scoped defined names
    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    /// Look up a defined name
    pub fn defined_name(&self, name: &str) -> Option<&DefinedName> {
        self.defined_names.iter().find(|d| d.name == name)
    }

    // === Settings ===

    /// Workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    // === Name validation ===

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        self.validate_sheet_name_excluding(name, None)
    }

    fn validate_sheet_name_excluding(&self, name: &str, exclude: Option<usize>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        for c in INVALID_CHARS {
            if name.contains(*c) {
                return Err(Error::InvalidSheetName(format!(
                    "sheet name cannot contain '{}'",
                    c
                )));
            }
        }

        // Duplicate check is case-insensitive
        let lower = name.to_lowercase();
        for (i, sheet) in self.sheets.iter().enumerate() {
            if Some(i) != exclude && sheet.name().to_lowercase() == lower {
                return Err(Error::DuplicateSheetName(name.into()));
            }
        }

        Ok(())
    }

    fn generate_sheet_name(&self) -> String {
        self.generate_name_with_prefix("Sheet")
    }

    fn generate_name_with_prefix(&self, prefix: &str) -> String {
        let mut n = self.sheets.len() + 1;
        loop {
            let name = format!("{}{}", prefix, n);
            if self.validate_sheet_name(&name).is_ok() {
                return name;
            }
            n += 1;
        }
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Workbook-level settings
#[derive(Debug, Clone, Default)]
pub struct WorkbookSettings {
    /// Date system: false = 1900 epoch (Windows), true = 1904 epoch (Mac)
    pub date_1904: bool,
}

/// A workbook-scoped defined name
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedName {
    /// The name
    pub name: String,
    /// The formula/reference text it stands for (e.g., "Sheet1!$B$1")
    pub refers_to: String,
    /// Name is hidden from the UI
    pub hidden: bool,
}

/// A value accepted by [`SheetHandle::write`]
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    /// Blank cell
    Blank,
    /// Text (interned into the shared string table)
    Text(String),
    /// Number
    Number(f64),
    /// Boolean
    Bool(bool),
    /// Error value
    Error(CellError),
}

impl From<&str> for CellInput {
    fn from(s: &str) -> Self {
        CellInput::Text(s.to_string())
    }
}

impl From<String> for CellInput {
    fn from(s: String) -> Self {
        CellInput::Text(s)
    }
}

impl From<f64> for CellInput {
    fn from(n: f64) -> Self {
        CellInput::Number(n)
    }
}

impl From<i32> for CellInput {
    fn from(n: i32) -> Self {
        CellInput::Number(n as f64)
    }
}

impl From<i64> for CellInput {
    fn from(n: i64) -> Self {
        CellInput::Number(n as f64)
    }
}

impl From<bool> for CellInput {
    fn from(b: bool) -> Self {
        CellInput::Bool(b)
    }
}

impl From<CellError> for CellInput {
    fn from(e: CellError) -> Self {
        CellInput::Error(e)
    }
}

/// Mutation handle for one worksheet
///
/// Borrows the whole workbook so writes can intern formats and strings and
/// so string releases can re-home indices across every sheet.
pub struct SheetHandle<'a> {
    book: &'a mut Workbook,
    index: usize,
}

impl<'a> SheetHandle<'a> {
    /// The sheet's tab index
    pub fn index(&self) -> usize {
        self.index
    }

    /// The sheet's name
    pub fn name(&self) -> &str {
        self.book.sheets[self.index].name()
    }

    /// Read-only access to the underlying grid
    pub fn worksheet(&self) -> &Worksheet {
        self.book.sheets[self.index]
            .as_worksheet()
            .expect("handle only exists for worksheets")
    }

    fn grid_mut(&mut self) -> &mut Worksheet {
        self.book.sheets[self.index]
            .as_worksheet_mut()
            .expect("handle only exists for worksheets")
    }

    /// Validate a 1-based cell position against the sheet limits
    pub fn check_bounds(&self, row: u32, col: u16) -> Result<()> {
        if row == 0 || row > MAX_ROW {
            return Err(Error::RowOutOfRange(row, MAX_ROW));
        }
        if col == 0 || col > MAX_COL {
            return Err(Error::ColumnOutOfRange(col, MAX_COL));
        }
        Ok(())
    }

    fn check_range(&self, range: &CellRange) -> Result<()> {
        if range.is_empty() {
            return Err(Error::InvalidRange(range.to_string()));
        }
        self.check_bounds(range.first_row, range.first_col)?;
        self.check_bounds(range.last_row, range.last_col)
    }

    /// Store a cell, releasing any shared string the old cell referenced
    pub(crate) fn replace_cell(&mut self, row: u32, col: u16, data: CellData) {
        let old_string = match self.worksheet().cell(row, col) {
            Some(CellData {
                value: CellValue::String(idx),
                ..
            }) => Some(*idx),
            _ => None,
        };

        self.grid_mut().put_cell(row, col, data);

        // Release after the overwrite: if the entry dies, re-homing fixes
        // the whole grid, including the cell just written.
        if let Some(idx) = old_string {
            self.book.release_string(idx);
        }
    }

    fn format_index(&mut self, format: Option<&Format>, row: u32, col: u16) -> u32 {
        match format {
            Some(f) => self.book.formats.intern(f.clone(), FormatRole::Cell),
            // A bare value write keeps whatever format the cell already has.
            None => self
                .worksheet()
                .cell(row, col)
                .map(|c| c.format)
                .unwrap_or(0),
        }
    }

    // === Writing ===

    /// Write a value to a cell
    ///
    /// Text is interned into the workbook's shared string table. On an
    /// out-of-range address the grid is left unmodified.
    pub fn write<V: Into<CellInput>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
        format: Option<&Format>,
    ) -> Result<()> {
        self.check_bounds(row, col)?;
        let fmt = self.format_index(format, row, col);

        let value = match value.into() {
            CellInput::Blank => CellValue::Blank,
            CellInput::Text(s) => CellValue::String(self.book.strings.intern(s)),
            CellInput::Number(n) => CellValue::Number(n),
            CellInput::Bool(b) => CellValue::Boolean(b),
            CellInput::Error(e) => CellValue::Error(e),
        };

        self.replace_cell(row, col, CellData::with_format(value, fmt));
        Ok(())
    }

    /// Write a value to a cell addressed in "A1" notation
    pub fn write_ref<V: Into<CellInput>>(
        &mut self,
        reference: &str,
        value: V,
        format: Option<&Format>,
    ) -> Result<()> {
        let r = CellRef::parse(reference)?;
        self.write(r.row, r.col, value, format)
    }

    /// Write a shared string to a cell
    pub fn write_string<S: AsRef<str>>(&mut self, row: u32, col: u16, s: S) -> Result<()> {
        self.write(row, col, s.as_ref(), None)
    }

    /// Write a string stored inline in the cell, bypassing the shared table
    pub fn write_inline_string<S: Into<String>>(
        &mut self,
        row: u32,
        col: u16,
        s: S,
        format: Option<&Format>,
    ) -> Result<()> {
        self.check_bounds(row, col)?;
        let fmt = self.format_index(format, row, col);
        self.replace_cell(
            row,
            col,
            CellData::with_format(CellValue::InlineString(s.into()), fmt),
        );
        Ok(())
    }

    /// Write a number to a cell
    pub fn write_number(&mut self, row: u32, col: u16, n: f64) -> Result<()> {
        self.write(row, col, n, None)
    }

    /// Write a boolean to a cell
    pub fn write_boolean(&mut self, row: u32, col: u16, b: bool) -> Result<()> {
        self.write(row, col, b, None)
    }

    /// Write a blank cell (format-only when a format is given)
    pub fn write_blank(&mut self, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
        self.write(row, col, CellInput::Blank, format)
    }

    /// Write a formula to a cell (a leading `=` is stripped)
    pub fn write_formula(
        &mut self,
        row: u32,
        col: u16,
        formula: &str,
        format: Option<&Format>,
    ) -> Result<()> {
        self.check_bounds(row, col)?;
        let fmt = self.format_index(format, row, col);
        let text = formula.strip_prefix('=').unwrap_or(formula).to_string();
        self.replace_cell(
            row,
            col,
            CellData::with_format(CellValue::Formula { text, result: None }, fmt),
        );
        Ok(())
    }

    /// Set the cached result of a formula cell
    pub fn set_formula_result(&mut self, row: u32, col: u16, result: CachedValue) -> Result<()> {
        self.check_bounds(row, col)?;
        match self.grid_mut().cell_mut(row, col).map(|c| &mut c.value) {
            Some(CellValue::Formula { result: r, .. })
            | Some(CellValue::ArrayFormula { result: r, .. })
            | Some(CellValue::SharedFormula { result: r, .. }) => {
                *r = Some(result);
                Ok(())
            }
            _ => Err(Error::other(format!(
                "cell {} holds no formula",
                CellRef::new(row, col)
            ))),
        }
    }

    /// Write an array formula anchored at the range's top-left cell
    ///
    /// Only the anchor carries the text; the other cells of the range stay
    /// plain value cells (they receive the spilled results when the file is
    /// next calculated by a real engine).
    pub fn write_array_formula(
        &mut self,
        range: CellRange,
        formula: &str,
        format: Option<&Format>,
    ) -> Result<()> {
        self.check_range(&range)?;
        let (row, col) = (range.first_row, range.first_col);
        let fmt = self.format_index(format, row, col);
        let text = formula.strip_prefix('=').unwrap_or(formula).to_string();
        self.replace_cell(
            row,
            col,
            CellData::with_format(
                CellValue::ArrayFormula {
                    text,
                    range,
                    result: None,
                },
                fmt,
            ),
        );
        Ok(())
    }

    /// Write a shared formula over a range
    ///
    /// The range's top-left cell becomes the group root and carries the
    /// canonical text; every other cell becomes a textless follower whose
    /// display text derives from the root.
    pub fn write_shared_formula(
        &mut self,
        range: CellRange,
        formula: &str,
        format: Option<&Format>,
    ) -> Result<()> {
        self.check_range(&range)?;
        let text = formula.strip_prefix('=').unwrap_or(formula).to_string();
        let root = CellRef::new(range.first_row, range.first_col);

        let id = self.worksheet().next_shared_formula_id();
        self.grid_mut().add_shared_formula_group(SharedFormulaGroup {
            id,
            root,
            range,
            text: text.clone(),
        });

        for (row, col) in range.iter() {
            let fmt = self.format_index(format, row, col);
            let value = if row == root.row && col == root.col {
                CellValue::SharedFormula {
                    text: Some(text.clone()),
                    shared_id: id,
                    result: None,
                }
            } else {
                CellValue::SharedFormula {
                    text: None,
                    shared_id: id,
                    result: None,
                }
            };
            self.replace_cell(row, col, CellData::with_format(value, fmt));
        }
        Ok(())
    }

    /// Clear a cell entirely (value and format)
    pub fn clear(&mut self, row: u32, col: u16) -> Result<()> {
        self.check_bounds(row, col)?;
        let old = self.grid_mut().clear_cell(row, col);
        if let Some(CellData {
            value: CellValue::String(idx),
            ..
        }) = old
        {
            self.book.release_string(idx);
        }
        Ok(())
    }

    // === Reading ===

    /// Read a cell's value
    ///
    /// Blank for never-written cells. Shared-formula followers come back
    /// with their derived display text filled in.
    pub fn read(&self, row: u32, col: u16) -> CellValue {
        let ws = self.worksheet();
        match ws.cell(row, col) {
            None => CellValue::Blank,
            Some(cell) => match &cell.value {
                CellValue::SharedFormula {
                    text: None,
                    shared_id,
                    result,
                } => CellValue::SharedFormula {
                    text: ws.formula_text(row, col),
                    shared_id: *shared_id,
                    result: result.clone(),
                },
                other => other.clone(),
            },
        }
    }

    /// Read a cell addressed in "A1" notation
    pub fn read_ref(&self, reference: &str) -> Result<CellValue> {
        let r = CellRef::parse(reference)?;
        Ok(self.read(r.row, r.col))
    }

    /// Read a cell's text, resolving shared-string indices
    pub fn read_string(&self, row: u32, col: u16) -> Option<String> {
        match &self.worksheet().cell(row, col)?.value {
            CellValue::String(idx) => self.book.strings.resolve(*idx).map(str::to_string),
            CellValue::InlineString(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Resolve the display text of a formula cell
    pub fn formula_text(&self, row: u32, col: u16) -> Option<String> {
        self.worksheet().formula_text(row, col)
    }

    /// Read a cell's resolved format, if it has a non-default one
    pub fn cell_format(&self, row: u32, col: u16) -> Option<&Format> {
        let idx = self.worksheet().cell(row, col)?.format;
        if idx == 0 {
            None
        } else {
            self.book.formats.get(idx)
        }
    }

    // === Merging ===

    /// Merge a range of cells
    ///
    /// Every cell but the top-left is blanked (the top-left keeps its
    /// value); the format, when given, is applied across the whole range so
    /// borders render on the merged block's perimeter.
    pub fn merge_cells(&mut self, range: CellRange, format: Option<&Format>) -> Result<()> {
        self.check_range(&range)?;
        if range.cell_count() < 2 {
            return Err(Error::InvalidRange(format!(
                "merge range {} must span at least two cells",
                range
            )));
        }
        for existing in self.worksheet().merges() {
            if range.overlaps(existing) {
                return Err(Error::InvalidRange(format!(
                    "merge range {} overlaps existing merge {}",
                    range, existing
                )));
            }
        }

        let fmt = format.map(|f| self.book.formats.intern(f.clone(), FormatRole::Cell));

        for (row, col) in range.iter() {
            let is_anchor = row == range.first_row && col == range.first_col;
            if is_anchor {
                // The anchor keeps its value; only its format changes.
                let mut existing = self.worksheet().cell(row, col).cloned().unwrap_or_default();
                if let Some(fmt) = fmt {
                    existing.format = fmt;
                }
                self.grid_mut().put_cell(row, col, existing);
            } else {
                self.replace_cell(
                    row,
                    col,
                    CellData::with_format(CellValue::Blank, fmt.unwrap_or(0)),
                );
            }
        }

        self.grid_mut().add_merge(range);
        Ok(())
    }

    /// Remove a merge previously created over exactly this range
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        self.grid_mut().remove_merge(range)
    }

    // === Row/column properties ===

    /// Set the width of a column interval
    pub fn set_column_width(&mut self, first_col: u16, last_col: u16, width: f64) -> Result<()> {
        self.check_bounds(1, first_col)?;
        self.check_bounds(1, last_col.max(first_col))?;
        self.grid_mut()
            .set_column_properties(first_col, last_col.max(first_col), |c| {
                c.width = Some(width)
            });
        Ok(())
    }

    /// Hide or show a column interval
    pub fn set_column_hidden(&mut self, first_col: u16, last_col: u16, hidden: bool) -> Result<()> {
        self.check_bounds(1, first_col)?;
        self.check_bounds(1, last_col.max(first_col))?;
        self.grid_mut()
            .set_column_properties(first_col, last_col.max(first_col), |c| c.hidden = hidden);
        Ok(())
    }

    /// Apply a format to a column interval
    pub fn set_column_format(
        &mut self,
        first_col: u16,
        last_col: u16,
        format: &Format,
    ) -> Result<()> {
        self.check_bounds(1, first_col)?;
        self.check_bounds(1, last_col.max(first_col))?;
        let fmt = self.book.formats.intern(format.clone(), FormatRole::Cell);
        self.grid_mut()
            .set_column_properties(first_col, last_col.max(first_col), |c| {
                c.format = Some(fmt)
            });
        Ok(())
    }

    /// Set a column interval's outline level (0-7)
    pub fn set_column_outline_level(
        &mut self,
        first_col: u16,
        last_col: u16,
        level: u8,
    ) -> Result<()> {
        self.check_bounds(1, first_col)?;
        self.check_bounds(1, last_col.max(first_col))?;
        self.grid_mut()
            .set_column_properties(first_col, last_col.max(first_col), |c| {
                c.outline_level = level.min(7)
            });
        Ok(())
    }

    /// Set a row's height in points
    pub fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        self.check_bounds(row, 1)?;
        self.grid_mut().row_info_mut(row).height = Some(height);
        Ok(())
    }

    /// Hide or show a row
    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) -> Result<()> {
        self.check_bounds(row, 1)?;
        self.grid_mut().row_info_mut(row).hidden = hidden;
        Ok(())
    }

    /// Apply a format to a row
    pub fn set_row_format(&mut self, row: u32, format: &Format) -> Result<()> {
        self.check_bounds(row, 1)?;
        let fmt = self.book.formats.intern(format.clone(), FormatRole::Cell);
        self.grid_mut().row_info_mut(row).format = Some(fmt);
        Ok(())
    }

    /// Set a row's outline level (0-7)
    pub fn set_row_outline_level(&mut self, row: u32, level: u8) -> Result<()> {
        self.check_bounds(row, 1)?;
        self.grid_mut().row_info_mut(row).outline_level = level.min(7);
        Ok(())
    }

    // === Attachments ===

    /// Attach a data-validation payload
    pub fn add_validation(&mut self, validation: DataValidation) {
        self.grid_mut().add_validation(validation);
    }

    /// Attach a conditional-formatting payload
    pub fn add_conditional_format(&mut self, cf: ConditionalFormat) {
        self.grid_mut().add_conditional_format(cf);
    }

    /// Attach a hyperlink
    pub fn add_hyperlink(&mut self, link: Hyperlink) -> Result<()> {
        self.check_bounds(link.cell.row, link.cell.col)?;
        self.grid_mut().add_hyperlink(link);
        Ok(())
    }

    /// Get or create the sheet's drawing
    pub fn drawing_mut(&mut self) -> &mut crate::drawing::Drawing {
        self.grid_mut().drawing_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;
    use crate::MAX_SHEET_NAME_LEN;

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.sheet(0).unwrap().name(), "Sheet1");
    }

    #[test]
    fn test_add_sheets() {
        let mut wb = Workbook::new();

        let idx = wb.add_sheet(None).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(wb.sheet(1).unwrap().name(), "Sheet2");

        let idx = wb.add_sheet(Some("Data")).unwrap();
        assert_eq!(wb.sheet(idx).unwrap().name(), "Data");
    }

    #[test]
    fn test_duplicate_sheet_name_rejected() {
        let mut wb = Workbook::new();
        // Case-insensitive, and the workbook stays unmodified
        assert!(matches!(
            wb.add_sheet(Some("SHEET1")),
            Err(Error::DuplicateSheetName(_))
        ));
        assert_eq!(wb.sheet_count(), 1);
    }

    #[test]
    fn test_invalid_sheet_names() {
        let mut wb = Workbook::new();
        assert!(wb.add_sheet(Some("")).is_err());
        assert!(wb.add_sheet(Some("a:b")).is_err());
        assert!(wb.add_sheet(Some("x[1]")).is_err());
        let long = "A".repeat(MAX_SHEET_NAME_LEN + 1);
        assert!(wb.add_sheet(Some(&long)).is_err());
    }

    #[test]
    fn test_chartsheet_has_no_grid_handle() {
        let mut wb = Workbook::new();
        let idx = wb.add_chartsheet(Some("Chart1")).unwrap();
        assert!(wb.sheet_mut(idx).is_none());
        assert!(wb.worksheet(idx).is_none());
    }

    #[test]
    fn test_write_and_read_values() {
        let mut wb = Workbook::new();
        let mut sheet = wb.sheet_mut(0).unwrap();

        sheet.write_string(1, 1, "Hello").unwrap();
        sheet.write_number(2, 1, 42.0).unwrap();
        sheet.write_boolean(3, 1, true).unwrap();

        assert_eq!(sheet.read_string(1, 1).as_deref(), Some("Hello"));
        assert_eq!(sheet.read(2, 1).as_number(), Some(42.0));
        assert_eq!(sheet.read(3, 1).as_bool(), Some(true));
        assert_eq!(sheet.read(9, 9), CellValue::Blank);
    }

    #[test]
    fn test_a1_addressing() {
        let mut wb = Workbook::new();
        let mut sheet = wb.sheet_mut(0).unwrap();

        sheet.write_ref("B2", 7.5, None).unwrap();
        assert_eq!(sheet.read_ref("B2").unwrap().as_number(), Some(7.5));
        assert_eq!(sheet.read(2, 2).as_number(), Some(7.5));
        assert!(sheet.write_ref("not a ref", 1.0, None).is_err());
    }

    #[test]
    fn test_out_of_range_write_leaves_grid_untouched() {
        let mut wb = Workbook::new();
        let mut sheet = wb.sheet_mut(0).unwrap();

        assert!(matches!(
            sheet.write_number(0, 1, 1.0),
            Err(Error::RowOutOfRange(0, _))
        ));
        assert!(matches!(
            sheet.write_number(crate::MAX_ROW + 1, 1, 1.0),
            Err(Error::RowOutOfRange(_, _))
        ));
        assert!(matches!(
            sheet.write_number(1, crate::MAX_COL + 1, 1.0),
            Err(Error::ColumnOutOfRange(_, _))
        ));
        assert_eq!(sheet.worksheet().cell_count(), 0);
        assert!(sheet.worksheet().dimension().is_empty());
    }

    #[test]
    fn test_string_overwrite_releases_reference() {
        let mut wb = Workbook::new();
        let mut sheet = wb.sheet_mut(0).unwrap();

        sheet.write_string(1, 1, "old").unwrap();
        sheet.write_string(1, 2, "keep").unwrap();
        sheet.write_string(1, 1, "new").unwrap();

        // "old" had its only reference replaced, so it is gone and the
        // surviving cells were re-homed.
        let wb_strings = wb.strings();
        assert_eq!(wb_strings.len(), 2);
        assert_eq!(wb_strings.lookup("old"), None);

        let sheet = wb.sheet_mut(0).unwrap();
        assert_eq!(sheet.read_string(1, 2).as_deref(), Some("keep"));
        assert_eq!(sheet.read_string(1, 1).as_deref(), Some("new"));
    }

    #[test]
    fn test_format_applied_and_deduplicated() {
        let mut wb = Workbook::new();
        let mut sheet = wb.sheet_mut(0).unwrap();

        let bold_blue = Format::new().bold(true).font_color(Color::BLUE);
        sheet.write(1, 1, "a", Some(&bold_blue)).unwrap();
        sheet.write(2, 1, "b", Some(&bold_blue)).unwrap();

        let f1 = sheet.worksheet().cell(1, 1).unwrap().format;
        let f2 = sheet.worksheet().cell(2, 1).unwrap().format;
        assert_eq!(f1, f2);
        assert_eq!(sheet.cell_format(1, 1), Some(&bold_blue));
    }

    #[test]
    fn test_bare_value_write_keeps_format() {
        let mut wb = Workbook::new();
        let mut sheet = wb.sheet_mut(0).unwrap();

        let pct = Format::new().number_format("0.00%");
        sheet.write(1, 1, 0.5, Some(&pct)).unwrap();
        sheet.write_number(1, 1, 0.75).unwrap();

        assert_eq!(sheet.cell_format(1, 1), Some(&pct));
        assert_eq!(sheet.read(1, 1).as_number(), Some(0.75));
    }

    #[test]
    fn test_merge_blanks_all_but_top_left() {
        let mut wb = Workbook::new();
        let mut sheet = wb.sheet_mut(0).unwrap();

        for row in 1..=5 {
            sheet.write_number(row, 2, row as f64).unwrap();
        }
        let range = CellRange::parse("B1:B5").unwrap();
        sheet.merge_cells(range, None).unwrap();

        assert_eq!(sheet.read(1, 2).as_number(), Some(1.0));
        for row in 2..=5 {
            assert_eq!(sheet.read(row, 2), CellValue::Blank);
        }
        assert_eq!(sheet.worksheet().merges(), &[range]);

        assert!(sheet.unmerge_cells(&range));
        assert!(sheet.worksheet().merges().is_empty());
    }

    #[test]
    fn test_merge_rejects_overlap_and_single_cell() {
        let mut wb = Workbook::new();
        let mut sheet = wb.sheet_mut(0).unwrap();

        sheet
            .merge_cells(CellRange::parse("A1:B2").unwrap(), None)
            .unwrap();
        assert!(sheet
            .merge_cells(CellRange::parse("B2:C3").unwrap(), None)
            .is_err());
        assert!(sheet
            .merge_cells(CellRange::parse("E5").unwrap(), None)
            .is_err());
    }

    #[test]
    fn test_shared_formula_write_and_read() {
        let mut wb = Workbook::new();
        let mut sheet = wb.sheet_mut(0).unwrap();

        sheet
            .write_shared_formula(CellRange::parse("B1:B3").unwrap(), "=A1*A1", None)
            .unwrap();

        assert_eq!(sheet.formula_text(1, 2).as_deref(), Some("A1*A1"));
        assert_eq!(sheet.formula_text(2, 2).as_deref(), Some("A2*A2"));
        assert_eq!(sheet.formula_text(3, 2).as_deref(), Some("A3*A3"));

        // read() fills the derived text into follower values
        match sheet.read(2, 2) {
            CellValue::SharedFormula { text, .. } => assert_eq!(text.as_deref(), Some("A2*A2")),
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_array_formula_only_anchors() {
        let mut wb = Workbook::new();
        let mut sheet = wb.sheet_mut(0).unwrap();

        let range = CellRange::parse("C1:C3").unwrap();
        sheet.write_array_formula(range, "=A1:A3*2", None).unwrap();

        match sheet.read(1, 3) {
            CellValue::ArrayFormula { text, range: r, .. } => {
                assert_eq!(text, "A1:A3*2");
                assert_eq!(r, range);
            }
            other => panic!("unexpected value: {:?}", other),
        }
        assert_eq!(sheet.read(2, 3), CellValue::Blank);
    }

    #[test]
    fn test_copy_cell_reinterns_string() {
        let mut wb = Workbook::new();
        wb.add_sheet(Some("Other")).unwrap();
        wb.sheet_mut(0).unwrap().write_string(1, 1, "moved").unwrap();

        wb.copy_cell(0, CellRef::new(1, 1), 1, CellRef::new(3, 3))
            .unwrap();

        assert_eq!(
            wb.sheet_mut(1).unwrap().read_string(3, 3).as_deref(),
            Some("moved")
        );
        // Two cells now reference the single entry
        assert_eq!(wb.strings().len(), 1);
        assert_eq!(wb.strings().total_refs(), 2);
    }

    #[test]
    fn test_defined_names() {
        let mut wb = Workbook::new();
        wb.define_name("TaxRate", "Sheet1!$B$1").unwrap();
        assert!(wb.define_name("TaxRate", "Sheet1!$B$2").is_err());
        assert!(wb.define_name("1bad", "Sheet1!$A$1").is_err());
        assert_eq!(
            wb.defined_name("TaxRate").unwrap().refers_to,
            "Sheet1!$B$1"
        );
    }
}
