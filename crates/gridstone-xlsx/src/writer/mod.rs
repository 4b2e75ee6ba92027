//! XLSX writer
//!
//! Save runs in three phases: collect (flatten the interners into the
//! stylesheet tables), serialize (render each part's XML, registering its
//! content type and relationships in the owning scope), archive (write
//! every payload into the ZIP under its conventional path). Failure at any
//! point aborts the whole save; no partial package reaches the caller.

mod drawing;
mod sheet;

use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use crate::error::XlsxResult;
use crate::package::{
    content_type, escape_xml_attr, escape_xml_text, rel_type, rels_path_for, ContentTypes,
    Relationships,
};
use crate::styles::StyleTable;
use gridstone_core::{SheetKind, Workbook};

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to an in-memory byte vector
    pub fn write_to_vec(workbook: &Workbook) -> XlsxResult<Vec<u8>> {
        let mut buf = Vec::new();
        Self::write(workbook, Cursor::new(&mut buf))?;
        Ok(buf)
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        let package = PackageBuilder::assemble(workbook)?;
        package.archive(writer)
    }
}

/// One serialized part, ready for archiving
struct Part {
    path: String,
    payload: Vec<u8>,
}

/// Accumulates parts, relationships, and content types during a save
struct PackageBuilder {
    parts: Vec<Part>,
    content_types: ContentTypes,
}

impl PackageBuilder {
    fn assemble(workbook: &Workbook) -> XlsxResult<Self> {
        let mut builder = Self {
            parts: Vec::new(),
            content_types: ContentTypes::new(),
        };

        // Collect: flatten the format pool into the stylesheet tables. The
        // interners themselves were filled at write time, so this pass is a
        // pure projection.
        let style_table = StyleTable::build(workbook.formats());

        // Package root scope.
        let mut root_rels = Relationships::new();
        root_rels.add(rel_type::OFFICE_DOCUMENT, "xl/workbook.xml");
        root_rels.add(rel_type::CORE_PROPERTIES, "docProps/core.xml");
        root_rels.add(rel_type::EXTENDED_PROPERTIES, "docProps/app.xml");

        builder.add_part(
            "docProps/core.xml",
            core_properties_xml().into_bytes(),
            Some(content_type::CORE_PROPERTIES),
        );
        builder.add_part(
            "docProps/app.xml",
            app_properties_xml(workbook).into_bytes(),
            Some(content_type::EXTENDED_PROPERTIES),
        );

        // Workbook scope: sheets first (rId order = tab order), then theme,
        // styles, shared strings.
        let mut workbook_rels = Relationships::new();
        let mut sheet_rids = Vec::with_capacity(workbook.sheet_count());
        let mut worksheet_no = 0usize;
        let mut chartsheet_no = 0usize;
        let mut drawing_no = 0usize;
        let mut media_no = 0usize;

        let mut sheet_parts: Vec<Part> = Vec::new();
        for sheet in workbook.sheets() {
            match &sheet.kind {
                SheetKind::Worksheet(ws) => {
                    worksheet_no += 1;
                    let path = format!("xl/worksheets/sheet{}.xml", worksheet_no);
                    let rid = workbook_rels.add(
                        rel_type::WORKSHEET,
                        &format!("worksheets/sheet{}.xml", worksheet_no),
                    );
                    sheet_rids.push(rid);

                    let mut sheet_rels = Relationships::new();
                    let drawing_rid = match ws.drawing() {
                        Some(d) if !d.is_empty() => {
                            drawing_no += 1;
                            drawing::add_drawing_parts(&mut builder, d, drawing_no, &mut media_no)?;
                            Some(sheet_rels.add(
                                rel_type::DRAWING,
                                &format!("../drawings/drawing{}.xml", drawing_no),
                            ))
                        }
                        _ => None,
                    };

                    let xml = sheet::worksheet_xml(ws, &mut sheet_rels, drawing_rid.as_deref());
                    sheet_parts.push(Part {
                        path: path.clone(),
                        payload: xml.into_bytes(),
                    });
                    builder
                        .content_types
                        .add_override(&path, content_type::WORKSHEET);
                    if !sheet_rels.is_empty() {
                        sheet_parts.push(Part {
                            path: rels_path_for(&path),
                            payload: sheet_rels.to_xml().into_bytes(),
                        });
                    }
                }
                SheetKind::Chartsheet(cs) => {
                    chartsheet_no += 1;
                    let path = format!("xl/chartsheets/sheet{}.xml", chartsheet_no);
                    let rid = workbook_rels.add(
                        rel_type::CHARTSHEET,
                        &format!("chartsheets/sheet{}.xml", chartsheet_no),
                    );
                    sheet_rids.push(rid);

                    let mut sheet_rels = Relationships::new();
                    let drawing_rid = if cs.drawing.is_empty() {
                        None
                    } else {
                        drawing_no += 1;
                        drawing::add_drawing_parts(
                            &mut builder,
                            &cs.drawing,
                            drawing_no,
                            &mut media_no,
                        )?;
                        Some(sheet_rels.add(
                            rel_type::DRAWING,
                            &format!("../drawings/drawing{}.xml", drawing_no),
                        ))
                    };

                    let xml = sheet::chartsheet_xml(drawing_rid.as_deref());
                    sheet_parts.push(Part {
                        path: path.clone(),
                        payload: xml.into_bytes(),
                    });
                    builder
                        .content_types
                        .add_override(&path, content_type::CHARTSHEET);
                    if !sheet_rels.is_empty() {
                        sheet_parts.push(Part {
                            path: rels_path_for(&path),
                            payload: sheet_rels.to_xml().into_bytes(),
                        });
                    }
                }
            }
        }

        workbook_rels.add(rel_type::THEME, "theme/theme1.xml");
        workbook_rels.add(rel_type::STYLES, "styles.xml");
        if !workbook.strings().is_empty() {
            workbook_rels.add(rel_type::SHARED_STRINGS, "sharedStrings.xml");
        }

        builder.add_part(
            "xl/workbook.xml",
            workbook_xml(workbook, &sheet_rids).into_bytes(),
            Some(content_type::WORKBOOK),
        );
        builder.add_part(
            "xl/_rels/workbook.xml.rels",
            workbook_rels.to_xml().into_bytes(),
            None,
        );
        builder.add_part(
            "xl/theme/theme1.xml",
            THEME_XML.as_bytes().to_vec(),
            Some(content_type::THEME),
        );
        builder.add_part(
            "xl/styles.xml",
            style_table.to_xml().into_bytes(),
            Some(content_type::STYLES),
        );
        if !workbook.strings().is_empty() {
            builder.add_part(
                "xl/sharedStrings.xml",
                shared_strings_xml(workbook).into_bytes(),
                Some(content_type::SHARED_STRINGS),
            );
        }

        builder.parts.extend(sheet_parts);
        builder.add_part("_rels/.rels", root_rels.to_xml().into_bytes(), None);

        Ok(builder)
    }

    fn add_part(&mut self, path: &str, payload: Vec<u8>, ctype: Option<&str>) {
        if let Some(ctype) = ctype {
            self.content_types.add_override(path, ctype);
        }
        self.parts.push(Part {
            path: path.to_string(),
            payload,
        });
    }

    /// Register an extension default (for media parts)
    fn add_default_content_type(&mut self, extension: &str, ctype: &str) {
        self.content_types.add_default(extension, ctype);
    }

    fn archive<W: Write + Seek>(self, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types.to_xml().as_bytes())?;

        for part in &self.parts {
            zip.start_file(part.path.as_str(), options)?;
            zip.write_all(&part.payload)?;
        }

        zip.finish()?;
        Ok(())
    }
}

fn workbook_xml(workbook: &Workbook, sheet_rids: &[String]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    if workbook.settings().date_1904 {
        xml.push_str("\n    <workbookPr date1904=\"1\"/>");
    }

    xml.push_str(&format!(
        "\n    <bookViews>\n        <workbookView activeTab=\"{}\"/>\n    </bookViews>",
        workbook.active_sheet()
    ));

    xml.push_str("\n    <sheets>");
    for (sheet, rid) in workbook.sheets().zip(sheet_rids) {
        let state = sheet
            .header
            .visibility
            .as_attr()
            .map(|s| format!(" state=\"{}\"", s))
            .unwrap_or_default();
        xml.push_str(&format!(
            "\n        <sheet name=\"{}\" sheetId=\"{}\"{} r:id=\"{}\"/>",
            escape_xml_attr(sheet.name()),
            sheet.header.sheet_id,
            state,
            rid
        ));
    }
    xml.push_str("\n    </sheets>");

    if !workbook.defined_names().is_empty() {
        xml.push_str("\n    <definedNames>");
        for name in workbook.defined_names() {
            let hidden = if name.hidden { " hidden=\"1\"" } else { "" };
            xml.push_str(&format!(
                "\n        <definedName name=\"{}\"{}>{}</definedName>",
                escape_xml_attr(&name.name),
                hidden,
                escape_xml_text(&name.refers_to)
            ));
        }
        xml.push_str("\n    </definedNames>");
    }

    xml.push_str("\n</workbook>");
    xml
}

fn shared_strings_xml(workbook: &Workbook) -> String {
    let strings = workbook.strings();
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
        strings.total_refs(),
        strings.len()
    );

    for entry in strings.iter() {
        // xml:space keeps leading/trailing whitespace through consumers.
        let space = if entry.text.starts_with(char::is_whitespace)
            || entry.text.ends_with(char::is_whitespace)
        {
            " xml:space=\"preserve\""
        } else {
            ""
        };
        xml.push_str(&format!(
            "\n    <si><t{}>{}</t></si>",
            space,
            escape_xml_text(&entry.text)
        ));
    }

    xml.push_str("\n</sst>");
    xml
}

fn core_properties_xml() -> String {
    String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:creator>gridstone</dc:creator>
    <cp:lastModifiedBy>gridstone</cp:lastModifiedBy>
</cp:coreProperties>"#,
    )
}

fn app_properties_xml(workbook: &Workbook) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>gridstone</Application>
    <DocSecurity>0</DocSecurity>
    <HeadingPairs>
        <vt:vector size="2" baseType="variant">
            <vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant>"#,
    );
    xml.push_str(&format!(
        "\n            <vt:variant><vt:i4>{}</vt:i4></vt:variant>\n        </vt:vector>\n    </HeadingPairs>",
        workbook.sheet_count()
    ));
    xml.push_str(&format!(
        "\n    <TitlesOfParts>\n        <vt:vector size=\"{}\" baseType=\"lpstr\">",
        workbook.sheet_count()
    ));
    for sheet in workbook.sheets() {
        xml.push_str(&format!(
            "\n            <vt:lpstr>{}</vt:lpstr>",
            escape_xml_text(sheet.name())
        ));
    }
    xml.push_str("\n        </vt:vector>\n    </TitlesOfParts>\n</Properties>");
    xml
}

/// A minimal Office theme; consumers only require the part to exist and
/// declare a color and font scheme.
const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">
  <a:themeElements>
    <a:clrScheme name="Office">
      <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
      <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
      <a:dk2><a:srgbClr val="44546A"/></a:dk2>
      <a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>
      <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
      <a:accent2><a:srgbClr val="ED7D31"/></a:accent2>
      <a:accent3><a:srgbClr val="A5A5A5"/></a:accent3>
      <a:accent4><a:srgbClr val="FFC000"/></a:accent4>
      <a:accent5><a:srgbClr val="5B9BD5"/></a:accent5>
      <a:accent6><a:srgbClr val="70AD47"/></a:accent6>
      <a:hlink><a:srgbClr val="0563C1"/></a:hlink>
      <a:folHlink><a:srgbClr val="954F72"/></a:folHlink>
    </a:clrScheme>
    <a:fontScheme name="Office">
      <a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>
      <a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>
    </a:fontScheme>
    <a:fmtScheme name="Office">
      <a:fillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:fillStyleLst>
      <a:lnStyleLst>
        <a:ln><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
      </a:lnStyleLst>
      <a:effectStyleLst>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
      </a:effectStyleLst>
      <a:bgFillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:bgFillStyleLst>
    </a:fmtScheme>
  </a:themeElements>
</a:theme>"#;
