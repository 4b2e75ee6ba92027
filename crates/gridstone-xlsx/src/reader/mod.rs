//! XLSX reader
//!
//! Load walks the package top-down: the root relationships locate the
//! workbook part, the workbook's relationships locate styles, shared
//! strings, and theme (each optional), and every sheet entry resolves its
//! own part and relationships. The interners are pre-populated from the
//! styles and shared-strings parts so the indices already present in cell
//! data resolve correctly; a dangling index fails the load at first
//! resolution. Missing required parts are hard failures; a failed load
//! never returns a partial workbook.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::package::{part_dir, rel_type, rels_path_for, resolve_target, Relationships};
use crate::styles::{read_styles_xml, ParsedStyles};
use gridstone_core::worksheet::SharedFormulaGroup;
use gridstone_core::{
    AnchorContent, AnchorKind, CachedValue, CellData, CellError, CellRange, CellRef, CellValue,
    ConditionalFormat, DataValidation, DefinedName, Drawing, Extent, FormatPool, FormatRole,
    Hyperlink, HyperlinkTarget, ImageKind, Marker, Sheet, SharedStrings, SheetVisibility,
    Workbook, Worksheet,
};

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)
            .map_err(|e| XlsxError::InvalidPackage(format!("not a ZIP archive: {}", e)))?;

        // Both root parts are required before anything else is looked at.
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::MissingPart("[Content_Types].xml".into()));
        }
        let root_rels_bytes = read_part(&mut archive, "_rels/.rels")?;
        let root_rels = Relationships::parse(root_rels_bytes.as_slice(), "_rels/.rels")?;

        let workbook_part = root_rels
            .first_of_type(rel_type::OFFICE_DOCUMENT)
            .map(|r| resolve_target("", &r.target))
            .ok_or_else(|| {
                XlsxError::InvalidPackage("no officeDocument relationship in _rels/.rels".into())
            })?;

        let workbook_bytes = read_part(&mut archive, &workbook_part)?;
        let workbook_info = parse_workbook_xml(&workbook_bytes)?;

        let workbook_rels_path = rels_path_for(&workbook_part);
        let workbook_dir = part_dir(&workbook_part).to_string();
        let workbook_rels = match read_part_optional(&mut archive, &workbook_rels_path)? {
            Some(bytes) => Relationships::parse(bytes.as_slice(), &workbook_rels_path)?,
            None => Relationships::new(),
        };

        // Styles and shared strings are optional; absent parts leave the
        // interners empty.
        let styles = match workbook_rels.first_of_type(rel_type::STYLES) {
            Some(rel) => {
                let path = resolve_target(&workbook_dir, &rel.target);
                let bytes = read_part(&mut archive, &path)?;
                read_styles_xml(bytes.as_slice(), &path)?
            }
            None => ParsedStyles::empty(),
        };

        let mut pool = FormatPool::empty();
        for format in styles.cell_formats {
            pool.adopt(format, FormatRole::Cell);
        }
        for format in styles.differential_formats {
            pool.adopt(format, FormatRole::Differential);
        }
        let xf_count = pool.cell_count() as u32;

        let mut workbook = Workbook::empty();
        *workbook.formats_mut() = pool;
        workbook.settings_mut().date_1904 = workbook_info.date_1904;

        if let Some(rel) = workbook_rels.first_of_type(rel_type::SHARED_STRINGS) {
            let path = resolve_target(&workbook_dir, &rel.target);
            let bytes = read_part(&mut archive, &path)?;
            for text in parse_shared_strings_xml(&bytes)? {
                workbook.strings_mut().adopt(text);
            }
        }

        // Sheets in tab order; each entry's part is required once the
        // workbook names it.
        for entry in &workbook_info.sheets {
            let rel = workbook_rels.by_id(&entry.rid).ok_or_else(|| {
                XlsxError::InvalidPackage(format!(
                    "sheet '{}' references unknown relationship {}",
                    entry.name, entry.rid
                ))
            })?;
            let part_path = resolve_target(&workbook_dir, &rel.target);
            let part_bytes = read_part(&mut archive, &part_path)?;

            let sheet_rels_path = rels_path_for(&part_path);
            let sheet_rels = match read_part_optional(&mut archive, &sheet_rels_path)? {
                Some(bytes) => Relationships::parse(bytes.as_slice(), &sheet_rels_path)?,
                None => Relationships::new(),
            };
            let sheet_dir = part_dir(&part_path).to_string();

            let mut sheet = if rel.rel_type == rel_type::CHARTSHEET {
                let mut sheet = Sheet::chartsheet(&entry.name, entry.sheet_id);
                if let Some(rid) = parse_chartsheet_xml(&part_bytes)? {
                    if let Some(drawing) =
                        load_drawing(&mut archive, &sheet_rels, &sheet_dir, &rid)?
                    {
                        if let Some(cs) = sheet.as_chartsheet_mut() {
                            cs.drawing = drawing;
                        }
                    }
                }
                sheet
            } else {
                let (mut ws, drawing_rid) = parse_worksheet_xml(
                    &part_bytes,
                    &part_path,
                    xf_count,
                    &sheet_rels,
                    workbook.strings_mut(),
                )?;
                if let Some(rid) = drawing_rid {
                    if let Some(drawing) =
                        load_drawing(&mut archive, &sheet_rels, &sheet_dir, &rid)?
                    {
                        *ws.drawing_mut() = drawing;
                    }
                }
                let mut sheet = Sheet::worksheet(&entry.name, entry.sheet_id);
                if let Some(slot) = sheet.as_worksheet_mut() {
                    *slot = ws;
                }
                sheet
            };
            sheet.header.visibility = entry.visibility;
            workbook.push_sheet(sheet)?;
        }

        for name in workbook_info.defined_names {
            workbook.push_defined_name(name);
        }
        if workbook_info.active_tab < workbook.sheet_count() {
            let _ = workbook.set_active_sheet(workbook_info.active_tab);
        }

        Ok(workbook)
    }
}

fn read_part<R: Read + Seek>(archive: &mut zip::ZipArchive<R>, name: &str) -> XlsxResult<Vec<u8>> {
    match read_part_optional(archive, name)? {
        Some(bytes) => Ok(bytes),
        None => Err(XlsxError::MissingPart(name.to_string())),
    }
}

fn read_part_optional<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> XlsxResult<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            Ok(Some(bytes))
        }
        Err(_) => Ok(None),
    }
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|v| v.to_string());
        }
    }
    None
}

fn attr_bool(e: &BytesStart, key: &[u8]) -> bool {
    attr_value(e, key).is_some_and(|v| v == "1" || v == "true")
}

// === workbook.xml ===

struct SheetEntry {
    name: String,
    sheet_id: u32,
    rid: String,
    visibility: SheetVisibility,
}

struct WorkbookInfo {
    sheets: Vec<SheetEntry>,
    date_1904: bool,
    active_tab: usize,
    defined_names: Vec<DefinedName>,
}

fn parse_workbook_xml(bytes: &[u8]) -> XlsxResult<WorkbookInfo> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut info = WorkbookInfo {
        sheets: Vec::new(),
        date_1904: false,
        active_tab: 0,
        defined_names: Vec::new(),
    };

    let mut pending_name: Option<DefinedName> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"workbookPr" => info.date_1904 = attr_bool(&e, b"date1904"),
                b"workbookView" => {
                    if let Some(tab) = attr_value(&e, b"activeTab") {
                        info.active_tab = tab.parse().unwrap_or(0);
                    }
                }
                b"sheet" => {
                    let name = attr_value(&e, b"name");
                    let rid = attr_value(&e, b"r:id");
                    let sheet_id = attr_value(&e, b"sheetId").and_then(|v| v.parse().ok());
                    let visibility = attr_value(&e, b"state")
                        .map(|s| SheetVisibility::from_attr(&s))
                        .unwrap_or_default();
                    if let (Some(name), Some(rid)) = (name, rid) {
                        let sheet_id = sheet_id.unwrap_or(info.sheets.len() as u32 + 1);
                        info.sheets.push(SheetEntry {
                            name,
                            sheet_id,
                            rid,
                            visibility,
                        });
                    }
                }
                b"definedName" => {
                    pending_name = attr_value(&e, b"name").map(|name| DefinedName {
                        name,
                        refers_to: String::new(),
                        hidden: attr_bool(&e, b"hidden"),
                    });
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(pending) = pending_name.as_mut() {
                    if let Ok(text) = e.unescape() {
                        pending.refers_to.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"definedName" => {
                if let Some(name) = pending_name.take() {
                    info.defined_names.push(name);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(info)
}

// === sharedStrings.xml ===

/// Decode Excel's `_xHHHH_` escape sequences in strings
///
/// Excel encodes control characters this way: `_x000a_` is LF, `_x0009_`
/// is Tab, and `_x005f_` escapes a literal underscore.
fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '_' {
            result.push(c);
            continue;
        }

        let mut hex = String::new();
        let mut matched = false;
        if chars.peek() == Some(&'x') {
            chars.next();
            for _ in 0..4 {
                match chars.peek() {
                    Some(&ch) if ch.is_ascii_hexdigit() => {
                        hex.push(ch);
                        chars.next();
                    }
                    _ => break,
                }
            }
            if hex.len() == 4 && chars.peek() == Some(&'_') {
                chars.next();
                if let Some(decoded) =
                    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
                {
                    result.push(decoded);
                    matched = true;
                }
            }
        }

        if !matched {
            result.push('_');
            if !hex.is_empty() {
                result.push('x');
                result.push_str(&hex);
            }
        }
    }

    result
}

/// Parse the shared string table in file order
///
/// Rich-text entries are flattened to their concatenated run text; run
/// formatting is out of scope here.
fn parse_shared_strings_xml(bytes: &[u8]) -> XlsxResult<Vec<String>> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"si" => {
                    strings.push(decode_excel_escapes(&current));
                    current.clear();
                    in_si = false;
                }
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

// === worksheet parts ===

#[derive(Default)]
struct PendingFormula {
    kind: Option<String>,
    reference: Option<String>,
    shared_id: Option<u32>,
    text: String,
}

struct PendingCell {
    reference: String,
    cell_type: Option<String>,
    style: Option<u32>,
    value: Option<String>,
    formula: Option<PendingFormula>,
    inline: Option<String>,
}

/// Parse a worksheet part into a fresh grid
///
/// Returns the grid and the sheet's drawing relationship id, if any.
/// `xf_count` bounds the style indices a cell may reference; `strings`
/// gets a reference bump per shared-string cell.
fn parse_worksheet_xml(
    bytes: &[u8],
    part: &str,
    xf_count: u32,
    rels: &Relationships,
    strings: &mut SharedStrings,
) -> XlsxResult<(Worksheet, Option<String>)> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut ws = Worksheet::new();
    let mut drawing_rid: Option<String> = None;

    let mut cell: Option<PendingCell> = None;
    let mut in_v = false;
    let mut in_f = false;
    let mut in_is = false;
    let mut in_is_t = false;
    let mut shared_masters: Vec<SharedFormulaGroup> = Vec::new();

    loop {
        let pos_before = reader.buffer_position();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if matches!(
                    e.name().as_ref(),
                    b"dimension" | b"col" | b"row" | b"mergeCell" | b"hyperlink" | b"drawing"
                ) =>
            {
                match e.name().as_ref() {
                    b"dimension" => {
                        if let Some(range) =
                            attr_value(&e, b"ref").and_then(|r| CellRange::parse(&r).ok())
                        {
                            ws.expand_dimension(&range);
                        }
                    }
                    b"col" => {
                        let min = attr_value(&e, b"min").and_then(|v| v.parse::<u16>().ok());
                        let max = attr_value(&e, b"max").and_then(|v| v.parse::<u16>().ok());
                        if let (Some(min), Some(max)) = (min, max) {
                            let width = attr_value(&e, b"width").and_then(|v| v.parse().ok());
                            let custom_width = attr_bool(&e, b"customWidth");
                            let style =
                                attr_value(&e, b"style").and_then(|v| v.parse::<u32>().ok());
                            let hidden = attr_bool(&e, b"hidden");
                            let outline = attr_value(&e, b"outlineLevel")
                                .and_then(|v| v.parse::<u8>().ok())
                                .unwrap_or(0);
                            let collapsed = attr_bool(&e, b"collapsed");
                            ws.set_column_properties(min, max.max(min), |c| {
                                if custom_width {
                                    c.width = width;
                                }
                                c.format = style;
                                c.hidden = hidden;
                                c.outline_level = outline;
                                c.collapsed = collapsed;
                            });
                        }
                    }
                    b"row" => {
                        let row = attr_value(&e, b"r").and_then(|v| v.parse::<u32>().ok());
                        if let Some(row) = row {
                            let height = if attr_bool(&e, b"customHeight") {
                                attr_value(&e, b"ht").and_then(|v| v.parse().ok())
                            } else {
                                None
                            };
                            let hidden = attr_bool(&e, b"hidden");
                            let format = if attr_bool(&e, b"customFormat") {
                                attr_value(&e, b"s").and_then(|v| v.parse::<u32>().ok())
                            } else {
                                None
                            };
                            let outline = attr_value(&e, b"outlineLevel")
                                .and_then(|v| v.parse::<u8>().ok())
                                .unwrap_or(0);
                            let collapsed = attr_bool(&e, b"collapsed");

                            if height.is_some()
                                || hidden
                                || format.is_some()
                                || outline > 0
                                || collapsed
                            {
                                let info = ws.row_info_mut(row);
                                info.height = height;
                                info.hidden = hidden;
                                info.format = format;
                                info.outline_level = outline;
                                info.collapsed = collapsed;
                            }
                        }
                    }
                    b"mergeCell" => {
                        if let Some(range) =
                            attr_value(&e, b"ref").and_then(|r| CellRange::parse(&r).ok())
                        {
                            ws.add_merge(range);
                        }
                    }
                    b"hyperlink" => {
                        let cell_ref =
                            attr_value(&e, b"ref").and_then(|r| CellRef::parse(&r).ok());
                        if let Some(cell_ref) = cell_ref {
                            let tooltip = attr_value(&e, b"tooltip");
                            let target = if let Some(rid) = attr_value(&e, b"r:id") {
                                match rels.by_id(&rid) {
                                    Some(rel) => {
                                        Some(HyperlinkTarget::External(rel.target.clone()))
                                    }
                                    None => {
                                        return Err(XlsxError::malformed(
                                            part,
                                            format!("hyperlink references unknown rel {}", rid),
                                        ))
                                    }
                                }
                            } else {
                                attr_value(&e, b"location").map(HyperlinkTarget::Internal)
                            };
                            if let Some(target) = target {
                                ws.add_hyperlink(Hyperlink {
                                    cell: cell_ref,
                                    target,
                                    tooltip,
                                });
                            }
                        } else {
                            warn!("{}: hyperlink without a valid ref, skipped", part);
                        }
                    }
                    b"drawing" => drawing_rid = attr_value(&e, b"r:id"),
                    _ => unreachable!(),
                }
            }

            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"c" => {
                    let reference = attr_value(&e, b"r").ok_or_else(|| {
                        XlsxError::malformed(part, "cell without an r attribute")
                    })?;
                    cell = Some(PendingCell {
                        reference,
                        cell_type: attr_value(&e, b"t"),
                        style: attr_value(&e, b"s").and_then(|v| v.parse().ok()),
                        value: None,
                        formula: None,
                        inline: None,
                    });
                }
                b"v" if cell.is_some() => in_v = true,
                b"f" if cell.is_some() => {
                    in_f = true;
                    if let Some(cell) = cell.as_mut() {
                        cell.formula = Some(PendingFormula {
                            kind: attr_value(&e, b"t"),
                            reference: attr_value(&e, b"ref"),
                            shared_id: attr_value(&e, b"si").and_then(|v| v.parse().ok()),
                            text: String::new(),
                        });
                    }
                }
                b"is" if cell.is_some() => {
                    in_is = true;
                    if let Some(cell) = cell.as_mut() {
                        cell.inline = Some(String::new());
                    }
                }
                b"t" if in_is => in_is_t = true,
                b"conditionalFormatting" => {
                    let ranges = parse_sqref(&attr_value(&e, b"sqref").unwrap_or_default());
                    reader.read_to_end_into(e.name(), &mut Vec::new())?;
                    let end = reader.buffer_position();
                    let xml = raw_slice(bytes, pos_before, end, part)?;
                    ws.add_conditional_format(ConditionalFormat { ranges, xml });
                }
                b"dataValidation" => {
                    let ranges = parse_sqref(&attr_value(&e, b"sqref").unwrap_or_default());
                    reader.read_to_end_into(e.name(), &mut Vec::new())?;
                    let end = reader.buffer_position();
                    let xml = raw_slice(bytes, pos_before, end, part)?;
                    ws.add_validation(DataValidation { ranges, xml });
                }
                _ => {}
            },

            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"c" => {
                    let reference = attr_value(&e, b"r").ok_or_else(|| {
                        XlsxError::malformed(part, "cell without an r attribute")
                    })?;
                    let pending = PendingCell {
                        reference,
                        cell_type: attr_value(&e, b"t"),
                        style: attr_value(&e, b"s").and_then(|v| v.parse().ok()),
                        value: None,
                        formula: None,
                        inline: None,
                    };
                    finish_cell(&mut ws, strings, xf_count, part, pending, &mut shared_masters)?;
                }
                b"f" => {
                    if let Some(cell) = cell.as_mut() {
                        cell.formula = Some(PendingFormula {
                            kind: attr_value(&e, b"t"),
                            reference: attr_value(&e, b"ref"),
                            shared_id: attr_value(&e, b"si").and_then(|v| v.parse().ok()),
                            text: String::new(),
                        });
                    }
                }
                b"dataValidation" => {
                    let ranges = parse_sqref(&attr_value(&e, b"sqref").unwrap_or_default());
                    let end = reader.buffer_position();
                    let xml = raw_slice(bytes, pos_before, end, part)?;
                    ws.add_validation(DataValidation { ranges, xml });
                }
                _ => {}
            },

            Ok(Event::Text(e)) => {
                if in_v {
                    if let (Some(cell), Ok(text)) = (cell.as_mut(), e.unescape()) {
                        cell.value.get_or_insert_with(String::new).push_str(&text);
                    }
                } else if in_f {
                    if let (Some(cell), Ok(text)) = (cell.as_mut(), e.unescape()) {
                        if let Some(f) = cell.formula.as_mut() {
                            f.text.push_str(&text);
                        }
                    }
                } else if in_is_t {
                    if let (Some(cell), Ok(text)) = (cell.as_mut(), e.unescape()) {
                        if let Some(inline) = cell.inline.as_mut() {
                            inline.push_str(&text);
                        }
                    }
                }
            }

            Ok(Event::End(e)) => match e.name().as_ref() {
                b"c" => {
                    if let Some(pending) = cell.take() {
                        finish_cell(
                            &mut ws,
                            strings,
                            xf_count,
                            part,
                            pending,
                            &mut shared_masters,
                        )?;
                    }
                }
                b"v" => in_v = false,
                b"f" => in_f = false,
                b"is" => in_is = false,
                b"t" if in_is_t => in_is_t = false,
                _ => {}
            },

            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    for group in shared_masters {
        ws.add_shared_formula_group(group);
    }

    Ok((ws, drawing_rid))
}

fn raw_slice(bytes: &[u8], start: usize, end: usize, part: &str) -> XlsxResult<String> {
    let slice = bytes
        .get(start..end)
        .ok_or_else(|| XlsxError::malformed(part, "element span out of bounds"))?;
    let text = std::str::from_utf8(slice)
        .map_err(|_| XlsxError::malformed(part, "element span is not UTF-8"))?;
    Ok(text.trim().to_string())
}

fn parse_sqref(sqref: &str) -> Vec<CellRange> {
    sqref
        .split_whitespace()
        .filter_map(|piece| CellRange::parse(piece).ok())
        .collect()
}

fn cached_result(
    cell_type: Option<&str>,
    value: Option<String>,
) -> XlsxResult<Option<CachedValue>> {
    let Some(value) = value else { return Ok(None) };
    Ok(match cell_type {
        Some("str") => Some(CachedValue::Text(value)),
        Some("b") => Some(CachedValue::Bool(value == "1" || value == "true")),
        Some("e") => Some(CachedValue::Error(
            CellError::from_code(&value).unwrap_or(CellError::Value),
        )),
        _ => value.parse::<f64>().ok().map(CachedValue::Number),
    })
}

fn finish_cell(
    ws: &mut Worksheet,
    strings: &mut SharedStrings,
    xf_count: u32,
    part: &str,
    pending: PendingCell,
    shared_masters: &mut Vec<SharedFormulaGroup>,
) -> XlsxResult<()> {
    let cell_ref = CellRef::parse(&pending.reference)
        .map_err(|_| XlsxError::malformed(part, format!("bad cell ref '{}'", pending.reference)))?;

    let style = pending.style.unwrap_or(0);
    if style >= xf_count {
        return Err(XlsxError::malformed(
            part,
            format!("cell {} references unknown style {}", pending.reference, style),
        ));
    }

    let value = if let Some(f) = pending.formula {
        let cached = cached_result(pending.cell_type.as_deref(), pending.value)?;
        match (f.kind.as_deref(), f.shared_id) {
            (Some("shared"), Some(shared_id)) => {
                if f.text.is_empty() {
                    CellValue::SharedFormula {
                        text: None,
                        shared_id,
                        result: cached,
                    }
                } else {
                    let range = f
                        .reference
                        .as_deref()
                        .and_then(|r| CellRange::parse(r).ok())
                        .unwrap_or_else(|| CellRange::cell(cell_ref.row, cell_ref.col));
                    shared_masters.push(SharedFormulaGroup {
                        id: shared_id,
                        root: CellRef::new(cell_ref.row, cell_ref.col),
                        range,
                        text: f.text.clone(),
                    });
                    CellValue::SharedFormula {
                        text: Some(f.text),
                        shared_id,
                        result: cached,
                    }
                }
            }
            (Some("array"), _) => {
                let range = f
                    .reference
                    .as_deref()
                    .and_then(|r| CellRange::parse(r).ok())
                    .unwrap_or_else(|| CellRange::cell(cell_ref.row, cell_ref.col));
                CellValue::ArrayFormula {
                    text: f.text,
                    range,
                    result: cached,
                }
            }
            _ => CellValue::Formula {
                text: f.text,
                result: cached,
            },
        }
    } else {
        match pending.cell_type.as_deref() {
            Some("s") => {
                let idx: u32 = pending
                    .value
                    .as_deref()
                    .unwrap_or("")
                    .parse()
                    .map_err(|_| {
                        XlsxError::malformed(
                            part,
                            format!("cell {} has a non-numeric string index", pending.reference),
                        )
                    })?;
                if !strings.retain(idx) {
                    return Err(XlsxError::malformed(
                        part,
                        format!("cell {} references unknown string {}", pending.reference, idx),
                    ));
                }
                CellValue::String(idx)
            }
            Some("inlineStr") => CellValue::InlineString(pending.inline.unwrap_or_default()),
            Some("b") => {
                let v = pending.value.as_deref().unwrap_or("0");
                CellValue::Boolean(v == "1" || v == "true")
            }
            Some("e") => CellValue::Error(
                pending
                    .value
                    .as_deref()
                    .and_then(CellError::from_code)
                    .unwrap_or(CellError::Value),
            ),
            Some("str") => CellValue::InlineString(pending.value.unwrap_or_default()),
            _ => match pending.value {
                Some(v) => CellValue::Number(v.parse().map_err(|_| {
                    XlsxError::malformed(
                        part,
                        format!("cell {} has a non-numeric value '{}'", pending.reference, v),
                    )
                })?),
                None => CellValue::Blank,
            },
        }
    };

    if value.is_blank() && style == 0 {
        return Ok(());
    }
    ws.put_cell(cell_ref.row, cell_ref.col, CellData::with_format(value, style));
    Ok(())
}

// === chartsheets and drawings ===

fn parse_chartsheet_xml(bytes: &[u8]) -> XlsxResult<Option<String>> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut rid = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"drawing" => {
                rid = attr_value(&e, b"r:id");
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rid)
}

struct ParsedAnchor {
    kind: AnchorKind,
    embed: Option<String>,
    name: String,
}

fn load_drawing<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    sheet_rels: &Relationships,
    sheet_dir: &str,
    rid: &str,
) -> XlsxResult<Option<Drawing>> {
    let Some(rel) = sheet_rels.by_id(rid) else {
        warn!("drawing relationship {} not found, skipped", rid);
        return Ok(None);
    };
    let drawing_path = resolve_target(sheet_dir, &rel.target);
    let drawing_bytes = read_part(archive, &drawing_path)?;

    let drawing_rels_path = rels_path_for(&drawing_path);
    let drawing_rels = match read_part_optional(archive, &drawing_rels_path)? {
        Some(bytes) => Relationships::parse(bytes.as_slice(), &drawing_rels_path)?,
        None => Relationships::new(),
    };
    let drawing_dir = part_dir(&drawing_path).to_string();

    let anchors = parse_drawing_xml(&drawing_bytes)?;
    let mut drawing = Drawing::new();
    // Media bytes are cached per part so two anchors of one image share a read.
    let mut media_cache: HashMap<String, Vec<u8>> = HashMap::new();

    for anchor in anchors {
        let Some(embed) = anchor.embed else {
            continue;
        };
        let Some(rel) = drawing_rels.by_id(&embed) else {
            warn!("{}: image relationship {} missing, anchor skipped", drawing_path, embed);
            continue;
        };
        let media_path = resolve_target(&drawing_dir, &rel.target);
        let extension = media_path.rsplit('.').next().unwrap_or("");
        let Some(kind) = ImageKind::from_extension(extension) else {
            warn!("{}: unsupported media type '{}', anchor skipped", drawing_path, extension);
            continue;
        };

        let data = match media_cache.get(&media_path) {
            Some(bytes) => bytes.clone(),
            None => {
                let bytes = read_part(archive, &media_path)?;
                media_cache.insert(media_path.clone(), bytes.clone());
                bytes
            }
        };

        drawing.add_anchor(
            anchor.kind,
            AnchorContent::Image {
                kind,
                data,
                name: anchor.name,
            },
        );
    }

    Ok(Some(drawing))
}

fn parse_drawing_xml(bytes: &[u8]) -> XlsxResult<Vec<ParsedAnchor>> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut anchors = Vec::new();

    let mut in_anchor = false;
    let mut two_cell = false;
    let mut from = Marker::default();
    let mut to = Marker::default();
    let mut extent: Option<Extent> = None;
    let mut embed: Option<String> = None;
    let mut name = String::new();
    // Which marker is being filled, and which coordinate element is open
    let mut marker_slot: Option<bool> = None; // false = from, true = to
    let mut coord: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"oneCellAnchor" | b"twoCellAnchor" => {
                        in_anchor = true;
                        two_cell = e.local_name().as_ref() == b"twoCellAnchor";
                        from = Marker::default();
                        to = Marker::default();
                        extent = None;
                        embed = None;
                        name = String::new();
                    }
                    b"from" if in_anchor => marker_slot = Some(false),
                    b"to" if in_anchor => marker_slot = Some(true),
                    b"col" if marker_slot.is_some() => coord = Some("col"),
                    b"colOff" if marker_slot.is_some() => coord = Some("colOff"),
                    b"row" if marker_slot.is_some() => coord = Some("row"),
                    b"rowOff" if marker_slot.is_some() => coord = Some("rowOff"),
                    b"ext" if in_anchor => {
                        let cx = attr_value(&e, b"cx").and_then(|v| v.parse().ok());
                        let cy = attr_value(&e, b"cy").and_then(|v| v.parse().ok());
                        if let (Some(width), Some(height)) = (cx, cy) {
                            extent = Some(Extent { width, height });
                        }
                    }
                    b"cNvPr" if in_anchor => {
                        if let Some(n) = attr_value(&e, b"name") {
                            name = n;
                        }
                    }
                    b"blip" if in_anchor => {
                        embed = attr_value(&e, b"r:embed");
                    }
                    _ => {}
                }
            }

            Ok(Event::Text(e)) => {
                if let (Some(slot), Some(which)) = (marker_slot, coord) {
                    if let Ok(text) = e.unescape() {
                        let marker = if slot { &mut to } else { &mut from };
                        match which {
                            // Drawing markers are 0-based on disk.
                            "col" => {
                                marker.col = text.parse::<u16>().unwrap_or(0).saturating_add(1)
                            }
                            "row" => {
                                marker.row = text.parse::<u32>().unwrap_or(0).saturating_add(1)
                            }
                            "colOff" => marker.col_offset = text.parse().unwrap_or(0),
                            "rowOff" => marker.row_offset = text.parse().unwrap_or(0),
                            _ => {}
                        }
                    }
                }
            }

            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"oneCellAnchor" | b"twoCellAnchor" => {
                    let kind = if two_cell {
                        AnchorKind::TwoCell { from, to }
                    } else {
                        AnchorKind::OneCell {
                            from,
                            extent: extent.unwrap_or(Extent {
                                width: 0,
                                height: 0,
                            }),
                        }
                    };
                    anchors.push(ParsedAnchor {
                        kind,
                        embed: embed.take(),
                        name: std::mem::take(&mut name),
                    });
                    in_anchor = false;
                }
                b"from" | b"to" => marker_slot = None,
                b"col" | b"colOff" | b"row" | b"rowOff" => coord = None,
                _ => {}
            },

            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(anchors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("a_x000a_b"), "a\nb");
        assert_eq!(decode_excel_escapes("tab_x0009_"), "tab\t");
        assert_eq!(decode_excel_escapes("plain_text"), "plain_text");
        assert_eq!(decode_excel_escapes("_x12"), "_x12");
    }

    #[test]
    fn test_parse_sqref() {
        let ranges = parse_sqref("A1:B2 D4");
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], CellRange::new(1, 1, 2, 2));
        assert_eq!(ranges[1], CellRange::cell(4, 4));
    }

    #[test]
    fn test_parse_workbook_xml() {
        let xml = br#"<?xml version="1.0"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <workbookPr date1904="1"/>
    <bookViews><workbookView activeTab="1"/></bookViews>
    <sheets>
        <sheet name="Data" sheetId="1" r:id="rId1"/>
        <sheet name="Hidden" sheetId="2" state="hidden" r:id="rId2"/>
    </sheets>
    <definedNames>
        <definedName name="TaxRate">Data!$B$1</definedName>
    </definedNames>
</workbook>"#;

        let info = parse_workbook_xml(xml).unwrap();
        assert!(info.date_1904);
        assert_eq!(info.active_tab, 1);
        assert_eq!(info.sheets.len(), 2);
        assert_eq!(info.sheets[0].name, "Data");
        assert_eq!(info.sheets[1].visibility, SheetVisibility::Hidden);
        assert_eq!(info.defined_names.len(), 1);
        assert_eq!(info.defined_names[0].refers_to, "Data!$B$1");
    }

    #[test]
    fn test_parse_shared_strings() {
        let xml = br#"<?xml version="1.0"?>
<sst count="3" uniqueCount="2">
    <si><t>Hello</t></si>
    <si><r><t>Rich </t></r><r><t>Text</t></r></si>
</sst>"#;

        let strings = parse_shared_strings_xml(xml).unwrap();
        assert_eq!(strings, vec!["Hello".to_string(), "Rich Text".to_string()]);
    }
}
