//! Worksheet and chartsheet part serialization

use crate::package::{escape_xml_attr, escape_xml_text, rel_type, Relationships};
use gridstone_core::{
    CachedValue, CellRef, CellValue, HyperlinkTarget, Worksheet,
};

/// Render a worksheet part
///
/// Registers hyperlink relationships into `rels` while rendering;
/// `drawing_rid` is the already-registered drawing relationship, if the
/// sheet has one.
pub(super) fn worksheet_xml(
    ws: &Worksheet,
    rels: &mut Relationships,
    drawing_rid: Option<&str>,
) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    let dimension = ws.dimension();
    if !dimension.is_empty() {
        xml.push_str(&format!(
            "\n    <dimension ref=\"{}\"/>",
            dimension.to_a1_string()
        ));
    }

    xml.push_str(
        "\n    <sheetViews>\n        <sheetView workbookViewId=\"0\"/>\n    </sheetViews>",
    );
    xml.push_str("\n    <sheetFormatPr defaultRowHeight=\"15\"/>");

    // Column records: the stored partition, minus spans with nothing set.
    let custom_cols: Vec<_> = ws
        .column_infos()
        .filter(|c| c.has_custom_settings())
        .collect();
    if !custom_cols.is_empty() {
        xml.push_str("\n    <cols>");
        for col in custom_cols {
            let mut attrs = format!(" min=\"{}\" max=\"{}\"", col.first_col, col.last_col);
            match col.width {
                Some(w) => attrs.push_str(&format!(" width=\"{}\" customWidth=\"1\"", w)),
                None => attrs.push_str(" width=\"8.43\""),
            }
            if let Some(fmt) = col.format {
                attrs.push_str(&format!(" style=\"{}\"", fmt));
            }
            if col.hidden {
                attrs.push_str(" hidden=\"1\"");
            }
            if col.outline_level > 0 {
                attrs.push_str(&format!(" outlineLevel=\"{}\"", col.outline_level));
            }
            if col.collapsed {
                attrs.push_str(" collapsed=\"1\"");
            }
            xml.push_str(&format!("\n        <col{}/>", attrs));
        }
        xml.push_str("\n    </cols>");
    }

    xml.push_str("\n    <sheetData>");
    for row in ws.touched_rows() {
        let cells: Vec<_> = ws.iter_row(row).collect();
        let info = ws.row_info(row);

        let mut attrs = format!(" r=\"{}\"", row);
        if let Some(info) = info {
            if let Some(h) = info.height {
                attrs.push_str(&format!(" ht=\"{}\" customHeight=\"1\"", h));
            }
            if info.hidden {
                attrs.push_str(" hidden=\"1\"");
            }
            if let Some(fmt) = info.format {
                attrs.push_str(&format!(" s=\"{}\" customFormat=\"1\"", fmt));
            }
            if info.outline_level > 0 {
                attrs.push_str(&format!(" outlineLevel=\"{}\"", info.outline_level));
            }
            if info.collapsed {
                attrs.push_str(" collapsed=\"1\"");
            }
        }

        let has_row_settings = info.is_some_and(|i| i.has_custom_settings());
        let body: String = cells
            .iter()
            .filter_map(|&(col, cell)| cell_xml(ws, row, col, cell))
            .collect();

        if body.is_empty() {
            if has_row_settings {
                xml.push_str(&format!("\n        <row{}/>", attrs));
            }
        } else {
            xml.push_str(&format!("\n        <row{}>", attrs));
            xml.push_str(&body);
            xml.push_str("\n        </row>");
        }
    }
    xml.push_str("\n    </sheetData>");

    let merges = ws.merges();
    if !merges.is_empty() {
        xml.push_str(&format!("\n    <mergeCells count=\"{}\">", merges.len()));
        for range in merges {
            xml.push_str(&format!(
                "\n        <mergeCell ref=\"{}\"/>",
                range.to_a1_string()
            ));
        }
        xml.push_str("\n    </mergeCells>");
    }

    // Opaque rule payloads go back out exactly as they came in.
    for cf in ws.conditional_formats() {
        xml.push_str("\n    ");
        xml.push_str(&cf.xml);
    }

    let validations = ws.validations();
    if !validations.is_empty() {
        xml.push_str(&format!(
            "\n    <dataValidations count=\"{}\">",
            validations.len()
        ));
        for dv in validations {
            xml.push_str("\n        ");
            xml.push_str(&dv.xml);
        }
        xml.push_str("\n    </dataValidations>");
    }

    let hyperlinks = ws.hyperlinks();
    if !hyperlinks.is_empty() {
        xml.push_str("\n    <hyperlinks>");
        for link in hyperlinks {
            let tooltip = link
                .tooltip
                .as_ref()
                .map(|t| format!(" tooltip=\"{}\"", escape_xml_attr(t)))
                .unwrap_or_default();
            match &link.target {
                HyperlinkTarget::External(url) => {
                    let rid = rels.add_external(rel_type::HYPERLINK, url);
                    xml.push_str(&format!(
                        "\n        <hyperlink ref=\"{}\" r:id=\"{}\"{}/>",
                        link.cell.to_a1_string(),
                        rid,
                        tooltip
                    ));
                }
                HyperlinkTarget::Internal(location) => {
                    xml.push_str(&format!(
                        "\n        <hyperlink ref=\"{}\" location=\"{}\" display=\"{}\"{}/>",
                        link.cell.to_a1_string(),
                        escape_xml_attr(location),
                        escape_xml_attr(location),
                        tooltip
                    ));
                }
            }
        }
        xml.push_str("\n    </hyperlinks>");
    }

    if let Some(rid) = drawing_rid {
        xml.push_str(&format!("\n    <drawing r:id=\"{}\"/>", rid));
    }

    xml.push_str("\n</worksheet>");
    xml
}

/// Render one `<c>` element; None when the cell carries nothing worth writing
fn cell_xml(ws: &Worksheet, row: u32, col: u16, cell: &gridstone_core::CellData) -> Option<String> {
    let cell_ref = CellRef::new(row, col).to_a1_string();
    let style = if cell.format != 0 {
        format!(" s=\"{}\"", cell.format)
    } else {
        String::new()
    };

    let body = match &cell.value {
        CellValue::Blank => {
            if cell.format == 0 {
                return None;
            }
            return Some(format!("\n            <c r=\"{}\"{}/>", cell_ref, style));
        }
        CellValue::Number(n) => format!("\n            <c r=\"{}\"{}><v>{}</v></c>", cell_ref, style, n),
        CellValue::Boolean(b) => format!(
            "\n            <c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
            cell_ref,
            style,
            if *b { 1 } else { 0 }
        ),
        CellValue::String(idx) => format!(
            "\n            <c r=\"{}\"{} t=\"s\"><v>{}</v></c>",
            cell_ref, style, idx
        ),
        CellValue::InlineString(s) => format!(
            "\n            <c r=\"{}\"{} t=\"inlineStr\"><is><t>{}</t></is></c>",
            cell_ref,
            style,
            escape_xml_text(s)
        ),
        CellValue::Error(e) => format!(
            "\n            <c r=\"{}\"{} t=\"e\"><v>{}</v></c>",
            cell_ref,
            style,
            e.as_str()
        ),
        CellValue::Formula { text, result } => {
            let (type_attr, value) = cached_value_xml(result.as_ref());
            format!(
                "\n            <c r=\"{}\"{}{}><f>{}</f>{}</c>",
                cell_ref,
                style,
                type_attr,
                escape_xml_text(text),
                value
            )
        }
        CellValue::ArrayFormula {
            text,
            range,
            result,
        } => {
            let (type_attr, value) = cached_value_xml(result.as_ref());
            format!(
                "\n            <c r=\"{}\"{}{}><f t=\"array\" ref=\"{}\">{}</f>{}</c>",
                cell_ref,
                style,
                type_attr,
                range.to_a1_string(),
                escape_xml_text(text),
                value
            )
        }
        CellValue::SharedFormula {
            text,
            shared_id,
            result,
        } => {
            let (type_attr, value) = cached_value_xml(result.as_ref());
            match text {
                // The group root carries the text and the covered range;
                // followers stay textless.
                Some(text) => {
                    let range = ws
                        .shared_formula_group(*shared_id)
                        .map(|g| g.range.to_a1_string())
                        .unwrap_or_else(|| cell_ref.clone());
                    format!(
                        "\n            <c r=\"{}\"{}{}><f t=\"shared\" ref=\"{}\" si=\"{}\">{}</f>{}</c>",
                        cell_ref,
                        style,
                        type_attr,
                        range,
                        shared_id,
                        escape_xml_text(text),
                        value
                    )
                }
                None => format!(
                    "\n            <c r=\"{}\"{}{}><f t=\"shared\" si=\"{}\"/>{}</c>",
                    cell_ref, style, type_attr, shared_id, value
                ),
            }
        }
    };

    Some(body)
}

/// The cell-type attribute and `<v>` element for a cached formula result
fn cached_value_xml(result: Option<&CachedValue>) -> (&'static str, String) {
    match result {
        None => ("", String::new()),
        Some(CachedValue::Number(n)) => ("", format!("<v>{}</v>", n)),
        Some(CachedValue::Text(s)) => (" t=\"str\"", format!("<v>{}</v>", escape_xml_text(s))),
        Some(CachedValue::Bool(b)) => (" t=\"b\"", format!("<v>{}</v>", if *b { 1 } else { 0 })),
        Some(CachedValue::Error(e)) => (" t=\"e\"", format!("<v>{}</v>", e.as_str())),
    }
}

/// Render a chartsheet part
pub(super) fn chartsheet_xml(drawing_rid: Option<&str>) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<chartsheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheetViews>
        <sheetView workbookViewId="0"/>
    </sheetViews>"#,
    );
    if let Some(rid) = drawing_rid {
        xml.push_str(&format!("\n    <drawing r:id=\"{}\"/>", rid));
    }
    xml.push_str("\n</chartsheet>");
    xml
}
