//! End-to-end tests for package round-trips (build -> save -> load -> verify)

use std::io::Cursor;

use pretty_assertions::assert_eq;

use gridstone_core::{
    AnchorContent, AnchorKind, CachedValue, CellRange, CellRef, CellValue, Color,
    ConditionalFormat, DataValidation, Extent, Format, Hyperlink, HyperlinkTarget, ImageKind,
    Marker, Workbook,
};
use gridstone_xlsx::{XlsxReader, XlsxWriter};

fn roundtrip(workbook: &Workbook) -> Workbook {
    let bytes = XlsxWriter::write_to_vec(workbook).unwrap();
    XlsxReader::read(Cursor::new(bytes)).unwrap()
}

#[test]
fn roundtrip_numbers() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();

    sheet.write_number(1, 1, 42.0).unwrap();
    sheet.write_number(1, 2, 3.14159).unwrap();
    sheet.write_number(1, 3, -100.5).unwrap();
    sheet.write_number(2, 1, 0.0).unwrap();
    sheet.write_number(2, 2, 1e10).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    assert_eq!(sheet2.cell(1, 1).unwrap().value, CellValue::Number(42.0));
    assert_eq!(sheet2.cell(1, 2).unwrap().value, CellValue::Number(3.14159));
    assert_eq!(sheet2.cell(1, 3).unwrap().value, CellValue::Number(-100.5));
    assert_eq!(sheet2.cell(2, 1).unwrap().value, CellValue::Number(0.0));
    assert_eq!(sheet2.cell(2, 2).unwrap().value, CellValue::Number(1e10));
}

#[test]
fn roundtrip_strings() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();

    sheet.write_string(1, 1, "Hello, World!").unwrap();
    sheet.write_string(1, 2, "Special: <>&\"'").unwrap();
    sheet.write_string(2, 1, "Unicode: \u{1F600}").unwrap();
    // Duplicates share one table entry
    sheet.write_string(3, 1, "Hello, World!").unwrap();

    let mut wb2 = roundtrip(&wb);
    assert_eq!(wb2.strings().len(), 3);

    let sheet2 = wb2.sheet_mut(0).unwrap();
    assert_eq!(sheet2.read_string(1, 1).as_deref(), Some("Hello, World!"));
    assert_eq!(sheet2.read_string(1, 2).as_deref(), Some("Special: <>&\"'"));
    assert_eq!(
        sheet2.read_string(2, 1).as_deref(),
        Some("Unicode: \u{1F600}")
    );
    assert_eq!(sheet2.read_string(3, 1).as_deref(), Some("Hello, World!"));
}

#[test]
fn roundtrip_inline_strings() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();
    sheet.write_inline_string(1, 1, "kept inline", None).unwrap();

    let wb2 = roundtrip(&wb);
    assert!(wb2.strings().is_empty());
    assert_eq!(
        wb2.worksheet(0).unwrap().cell(1, 1).unwrap().value,
        CellValue::InlineString("kept inline".into())
    );
}

#[test]
fn roundtrip_booleans_and_errors() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();

    sheet.write_boolean(1, 1, true).unwrap();
    sheet.write_boolean(1, 2, false).unwrap();
    sheet
        .write(2, 1, gridstone_core::CellError::Div0, None)
        .unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    assert_eq!(sheet2.cell(1, 1).unwrap().value, CellValue::Boolean(true));
    assert_eq!(sheet2.cell(1, 2).unwrap().value, CellValue::Boolean(false));
    assert_eq!(
        sheet2.cell(2, 1).unwrap().value,
        CellValue::Error(gridstone_core::CellError::Div0)
    );
}

#[test]
fn roundtrip_formulas() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();

    sheet.write_number(1, 1, 10.0).unwrap();
    sheet.write_number(2, 1, 20.0).unwrap();
    sheet.write_formula(3, 1, "=SUM(A1:A2)", None).unwrap();
    sheet
        .set_formula_result(3, 1, CachedValue::Number(30.0))
        .unwrap();
    sheet
        .write_formula(1, 2, "=IF(A1>5,\"Yes\",\"No\")", None)
        .unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    assert_eq!(
        sheet2.cell(3, 1).unwrap().value,
        CellValue::Formula {
            text: "SUM(A1:A2)".into(),
            result: Some(CachedValue::Number(30.0)),
        }
    );
    assert_eq!(
        sheet2.formula_text(1, 2).as_deref(),
        Some("IF(A1>5,\"Yes\",\"No\")")
    );
}

#[test]
fn roundtrip_shared_formulas() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();

    sheet
        .write_shared_formula(CellRange::parse("B1:B3").unwrap(), "=A1*A1", None)
        .unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    // The root keeps the canonical text; followers derive shifted copies.
    assert_eq!(sheet2.formula_text(1, 2).as_deref(), Some("A1*A1"));
    assert_eq!(sheet2.formula_text(2, 2).as_deref(), Some("A2*A2"));
    assert_eq!(sheet2.formula_text(3, 2).as_deref(), Some("A3*A3"));

    // Followers stay textless in the model
    match &sheet2.cell(2, 2).unwrap().value {
        CellValue::SharedFormula { text, .. } => assert!(text.is_none()),
        other => panic!("unexpected value: {:?}", other),
    }
}

#[test]
fn roundtrip_array_formula() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();

    let range = CellRange::parse("C1:C3").unwrap();
    sheet.write_array_formula(range, "=A1:A3*2", None).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    assert_eq!(
        sheet2.cell(1, 3).unwrap().value,
        CellValue::ArrayFormula {
            text: "A1:A3*2".into(),
            range,
            result: None,
        }
    );
    // Non-anchor cells of the array range carry no formula
    assert!(sheet2.cell(2, 3).is_none());
}

#[test]
fn end_to_end_values_and_format() {
    let mut wb = Workbook::new();
    let bold_blue = Format::new().bold(true).font_color(Color::BLUE);

    let mut sheet = wb.sheet_mut(0).unwrap();
    sheet.write(1, 1, "Hello", None).unwrap();
    sheet.write(2, 1, 12345, Some(&bold_blue)).unwrap();

    let mut wb2 = roundtrip(&wb);
    let sheet2 = wb2.sheet_mut(0).unwrap();

    assert_eq!(sheet2.read_string(1, 1).as_deref(), Some("Hello"));
    assert_eq!(sheet2.read(2, 1).as_number(), Some(12345.0));
    // The reloaded format is equal by sub-record comparison
    assert_eq!(sheet2.cell_format(2, 1), Some(&bold_blue));
}

#[test]
fn roundtrip_formats_dedupe() {
    let mut wb = Workbook::new();
    let header = Format::new()
        .bold(true)
        .fill_color(Color::YELLOW)
        .number_format("0.000");

    let mut sheet = wb.sheet_mut(0).unwrap();
    for col in 1..=4u16 {
        sheet.write(1, col, col as f64, Some(&header)).unwrap();
    }

    let mut wb2 = roundtrip(&wb);
    // default + one custom format, not four
    assert_eq!(wb2.formats().cell_count(), 2);

    let sheet2 = wb2.sheet_mut(0).unwrap();
    for col in 1..=4u16 {
        assert_eq!(sheet2.cell_format(1, col), Some(&header));
    }
}

#[test]
fn roundtrip_merge_cells() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();

    for row in 1..=5 {
        sheet.write_number(row, 2, row as f64).unwrap();
    }
    let range = CellRange::parse("B1:B5").unwrap();
    sheet.merge_cells(range, None).unwrap();

    let mut wb2 = roundtrip(&wb);
    let mut sheet2 = wb2.sheet_mut(0).unwrap();

    assert_eq!(sheet2.worksheet().merges(), &[range]);
    // Only the top-left kept its value
    assert_eq!(sheet2.read(1, 2).as_number(), Some(1.0));
    assert_eq!(sheet2.read(3, 2), CellValue::Blank);

    assert!(sheet2.unmerge_cells(&range));
    assert!(sheet2.worksheet().merges().is_empty());
}

#[test]
fn roundtrip_dimension() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();
    sheet.write_number(2, 2, 1.0).unwrap();
    sheet.write_number(4, 4, 2.0).unwrap();

    let wb2 = roundtrip(&wb);
    assert_eq!(
        wb2.worksheet(0).unwrap().dimension(),
        CellRange::new(2, 2, 4, 4)
    );
}

#[test]
fn roundtrip_row_and_column_properties() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();

    sheet.set_column_width(2, 4, 20.5).unwrap();
    sheet.set_column_hidden(3, 3, true).unwrap();
    sheet.set_row_height(5, 30.0).unwrap();
    sheet.set_row_hidden(6, true).unwrap();
    sheet.set_row_outline_level(7, 2).unwrap();

    let wb2 = roundtrip(&wb);
    let ws = wb2.worksheet(0).unwrap();

    assert_eq!(ws.column_width(2), 20.5);
    assert_eq!(ws.column_width(4), 20.5);
    assert!(ws.column_info(3).unwrap().hidden);
    assert!(!ws.column_info(2).unwrap().hidden);
    assert_eq!(ws.row_height(5), 30.0);
    assert!(ws.row_info(6).unwrap().hidden);
    assert_eq!(ws.row_info(7).unwrap().outline_level, 2);
}

#[test]
fn roundtrip_multiple_sheets() {
    let mut wb = Workbook::new();
    wb.add_sheet(Some("Data")).unwrap();
    wb.add_sheet(Some("Summary")).unwrap();
    wb.set_active_sheet(2).unwrap();
    wb.sheet_mut(1).unwrap().write_string(1, 1, "data").unwrap();
    wb.sheet_mut(2)
        .unwrap()
        .write_formula(1, 1, "=Data!A1", None)
        .unwrap();

    let mut wb2 = roundtrip(&wb);

    assert_eq!(wb2.sheet_count(), 3);
    let names: Vec<_> = wb2.sheets().map(|s| s.name().to_string()).collect();
    assert_eq!(names, vec!["Sheet1", "Data", "Summary"]);
    assert_eq!(wb2.active_sheet(), 2);
    assert_eq!(
        wb2.sheet_mut(1).unwrap().read_string(1, 1).as_deref(),
        Some("data")
    );
}

#[test]
fn roundtrip_defined_names_and_date_system() {
    let mut wb = Workbook::new();
    wb.define_name("TaxRate", "Sheet1!$B$1").unwrap();
    wb.settings_mut().date_1904 = true;

    let wb2 = roundtrip(&wb);

    assert!(wb2.settings().date_1904);
    assert_eq!(
        wb2.defined_name("TaxRate").unwrap().refers_to,
        "Sheet1!$B$1"
    );
}

#[test]
fn roundtrip_date_serial() {
    let mut wb = Workbook::new();
    let date_fmt = Format::new().number_format("yyyy-mm-dd");
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let serial = gridstone_core::date::date_to_serial(date, false);

    let mut sheet = wb.sheet_mut(0).unwrap();
    sheet.write(1, 1, serial, Some(&date_fmt)).unwrap();

    let mut wb2 = roundtrip(&wb);
    let sheet2 = wb2.sheet_mut(0).unwrap();

    assert_eq!(sheet2.read(1, 1).as_number(), Some(serial));
    assert_eq!(sheet2.cell_format(1, 1), Some(&date_fmt));
}

#[test]
fn roundtrip_hyperlinks() {
    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();

    sheet.write_string(1, 1, "docs").unwrap();
    sheet
        .add_hyperlink(Hyperlink {
            cell: CellRef::new(1, 1),
            target: HyperlinkTarget::External("https://example.com/docs".into()),
            tooltip: Some("open the docs".into()),
        })
        .unwrap();
    sheet
        .add_hyperlink(Hyperlink {
            cell: CellRef::new(2, 1),
            target: HyperlinkTarget::Internal("Sheet1!A1".into()),
            tooltip: None,
        })
        .unwrap();

    let wb2 = roundtrip(&wb);
    let links = wb2.worksheet(0).unwrap().hyperlinks();

    assert_eq!(links.len(), 2);
    assert_eq!(
        links[0].target,
        HyperlinkTarget::External("https://example.com/docs".into())
    );
    assert_eq!(links[0].tooltip.as_deref(), Some("open the docs"));
    assert_eq!(
        links[1].target,
        HyperlinkTarget::Internal("Sheet1!A1".into())
    );
}

#[test]
fn roundtrip_opaque_rule_payloads() {
    let mut wb = Workbook::new();

    // Rule semantics are opaque: dxfId indices refer to the differential
    // format space, interned up front.
    let dxf = wb.intern_differential_format(&Format::new().fill_color(Color::RED));
    assert_eq!(dxf, 0);

    let cf_xml = "<conditionalFormatting sqref=\"A1:A10\"><cfRule type=\"cellIs\" operator=\"greaterThan\" priority=\"1\" dxfId=\"0\"><formula>5</formula></cfRule></conditionalFormatting>";
    let dv_xml = "<dataValidation type=\"list\" allowBlank=\"1\" sqref=\"B1:B10\"><formula1>\"red,green,blue\"</formula1></dataValidation>";

    let mut sheet = wb.sheet_mut(0).unwrap();
    sheet.add_conditional_format(ConditionalFormat {
        ranges: vec![CellRange::parse("A1:A10").unwrap()],
        xml: cf_xml.to_string(),
    });
    sheet.add_validation(DataValidation {
        ranges: vec![CellRange::parse("B1:B10").unwrap()],
        xml: dv_xml.to_string(),
    });

    let wb2 = roundtrip(&wb);
    let ws = wb2.worksheet(0).unwrap();

    assert_eq!(ws.conditional_formats().len(), 1);
    assert_eq!(ws.conditional_formats()[0].xml, cf_xml);
    assert_eq!(
        ws.conditional_formats()[0].ranges,
        vec![CellRange::parse("A1:A10").unwrap()]
    );
    assert_eq!(ws.validations().len(), 1);
    assert_eq!(ws.validations()[0].xml, dv_xml);

    // The differential format survived in its own index space
    assert_eq!(wb2.formats().differential_count(), 1);
    assert_eq!(
        wb2.formats().get_differential(0),
        Some(&Format::new().fill_color(Color::RED))
    );
}

#[test]
fn roundtrip_drawing_image() {
    // A tiny valid-enough PNG payload; the codec never inspects pixels.
    let png: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

    let mut wb = Workbook::new();
    let mut sheet = wb.sheet_mut(0).unwrap();
    sheet.drawing_mut().add_anchor(
        AnchorKind::OneCell {
            from: Marker::at(2, 3),
            extent: Extent::from_pixels(64, 32),
        },
        AnchorContent::Image {
            kind: ImageKind::Png,
            data: png.clone(),
            name: "logo".into(),
        },
    );

    let wb2 = roundtrip(&wb);
    let drawing = wb2.worksheet(0).unwrap().drawing().unwrap();

    assert_eq!(drawing.anchors().len(), 1);
    let anchor = &drawing.anchors()[0];
    match &anchor.kind {
        AnchorKind::OneCell { from, extent } => {
            assert_eq!((from.row, from.col), (2, 3));
            assert_eq!(extent.width, 64 * gridstone_core::drawing::EMU_PER_PIXEL);
        }
        other => panic!("unexpected anchor kind: {:?}", other),
    }
    let AnchorContent::Image { kind, data, name } = &anchor.content;
    assert_eq!(*kind, ImageKind::Png);
    assert_eq!(*data, png);
    assert_eq!(name, "logo");
}

#[test]
fn roundtrip_chartsheet() {
    let mut wb = Workbook::new();
    wb.add_chartsheet(Some("Chart1")).unwrap();

    let wb2 = roundtrip(&wb);
    assert_eq!(wb2.sheet_count(), 2);
    assert!(wb2.sheet(1).unwrap().as_chartsheet().is_some());
    assert_eq!(wb2.sheet(1).unwrap().name(), "Chart1");
}

#[test]
fn roundtrip_blank_with_format() {
    let mut wb = Workbook::new();
    let fmt = Format::new().fill_color(Color::GRAY);
    wb.sheet_mut(0).unwrap().write_blank(3, 3, Some(&fmt)).unwrap();

    let mut wb2 = roundtrip(&wb);
    let sheet2 = wb2.sheet_mut(0).unwrap();
    assert_eq!(sheet2.read(3, 3), CellValue::Blank);
    assert_eq!(sheet2.cell_format(3, 3), Some(&fmt));
}

#[test]
fn save_load_via_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let mut wb = Workbook::new();
    wb.sheet_mut(0).unwrap().write_string(1, 1, "on disk").unwrap();
    XlsxWriter::write_file(&wb, &path).unwrap();

    let mut wb2 = XlsxReader::read_file(&path).unwrap();
    assert_eq!(
        wb2.sheet_mut(0).unwrap().read_string(1, 1).as_deref(),
        Some("on disk")
    );
}
