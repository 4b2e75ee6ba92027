//! Package plumbing: relationships and the content-type registry
//!
//! Parts never embed paths in their content; they point at each other
//! through per-scope relationship lists (`_rels/<name>.rels`), and every
//! part's MIME-like type is declared once in `[Content_Types].xml`.

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

/// Relationship type URIs
pub mod rel_type {
    /// Package root -> workbook
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    /// Package root -> core properties
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    /// Package root -> extended properties
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    /// Workbook -> worksheet
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    /// Workbook -> chartsheet
    pub const CHARTSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chartsheet";
    /// Workbook -> styles
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    /// Workbook -> shared strings
    pub const SHARED_STRINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
    /// Workbook -> theme
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    /// Sheet -> drawing
    pub const DRAWING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
    /// Drawing -> embedded image
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    /// Sheet -> external hyperlink target
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
}

/// Content types for the parts this codec emits
pub mod content_type {
    /// Relationship parts (extension default)
    pub const RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    /// Plain XML (extension default)
    pub const XML: &str = "application/xml";
    /// The workbook part
    pub const WORKBOOK: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
    /// A worksheet part
    pub const WORKSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
    /// A chartsheet part
    pub const CHARTSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.chartsheet+xml";
    /// The styles part
    pub const STYLES: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
    /// The shared strings part
    pub const SHARED_STRINGS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
    /// The theme part
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    /// A drawing part
    pub const DRAWING: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";
    /// Core document properties
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    /// Extended document properties
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// One directed, typed edge from a part (or the package root) to another
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Relationship id ("rIdN"), unique per scope
    pub id: String,
    /// Type URI
    pub rel_type: String,
    /// Target path, relative to the owning part's directory
    pub target: String,
    /// Target lives outside the package (e.g., a hyperlink URL)
    pub external: bool,
}

/// The relationship list of one scope (the package root or a single part)
///
/// Ids are assigned sequentially starting at `rId1`.
#[derive(Debug, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an internal relationship; returns the assigned id
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        self.push(rel_type, target, false)
    }

    /// Register an external-mode relationship; returns the assigned id
    pub fn add_external(&mut self, rel_type: &str, target: &str) -> String {
        self.push(rel_type, target, true)
    }

    fn push(&mut self, rel_type: &str, target: &str, external: bool) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external,
        });
        id
    }

    /// Check whether any relationships were registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in id order
    pub fn entries(&self) -> &[Relationship] {
        &self.entries
    }

    /// Find an entry by id
    pub fn by_id(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.id == id)
    }

    /// Find the first entry of a type
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.rel_type == rel_type)
    }

    /// Render the `.rels` part XML
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in &self.entries {
            let mode = if rel.external {
                " TargetMode=\"External\""
            } else {
                ""
            };
            xml.push_str(&format!(
                "\n    <Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"{}/>",
                rel.id,
                rel.rel_type,
                escape_xml_attr(&rel.target),
                mode
            ));
        }
        xml.push_str("\n</Relationships>");
        xml
    }

    /// Parse a `.rels` part
    pub fn parse<R: BufRead>(reader: R, part: &str) -> XlsxResult<Self> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut entries = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut rel_type = None;
                    let mut target = None;
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().map_err(XlsxError::Xml)?;
                        match attr.key.as_ref() {
                            b"Id" => id = Some(value.to_string()),
                            b"Type" => rel_type = Some(value.to_string()),
                            b"Target" => target = Some(value.to_string()),
                            b"TargetMode" => external = value.as_ref() == "External",
                            _ => {}
                        }
                    }

                    match (id, rel_type, target) {
                        (Some(id), Some(rel_type), Some(target)) => {
                            entries.push(Relationship {
                                id,
                                rel_type,
                                target,
                                external,
                            });
                        }
                        _ => {
                            return Err(XlsxError::malformed(
                                part,
                                "Relationship missing Id, Type, or Target",
                            ))
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { entries })
    }
}

/// Resolve a relationship target against its owning part's directory
///
/// `base_dir` is the directory of the part that owns the relationship list
/// ("" for the package root, "xl" for the workbook, "xl/worksheets" for a
/// sheet). Leading-slash targets are package-absolute; `../` segments walk
/// up.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return abs.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for piece in target.split('/') {
        match piece {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// The `_rels/<name>.rels` path for a part
pub fn rels_path_for(part: &str) -> String {
    match part.rfind('/') {
        Some(slash) => format!("{}/_rels/{}.rels", &part[..slash], &part[slash + 1..]),
        None => format!("_rels/{}.rels", part),
    }
}

/// The directory component of a part path ("" for root-level parts)
pub fn part_dir(part: &str) -> &str {
    match part.rfind('/') {
        Some(slash) => &part[..slash],
        None => "",
    }
}

/// The `[Content_Types].xml` registry
///
/// `Default` entries are keyed by file extension, `Override` entries by
/// exact part path; every emitted part is covered by exactly one of the
/// two.
#[derive(Debug)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Create a registry seeded with the rels/xml extension defaults
    pub fn new() -> Self {
        Self {
            defaults: vec![
                ("rels".to_string(), content_type::RELS.to_string()),
                ("xml".to_string(), content_type::XML.to_string()),
            ],
            overrides: Vec::new(),
        }
    }

    /// Register an extension default (idempotent)
    pub fn add_default(&mut self, extension: &str, ctype: &str) {
        if !self.defaults.iter().any(|(e, _)| e == extension) {
            self.defaults
                .push((extension.to_string(), ctype.to_string()));
        }
    }

    /// Register an override for an exact part path
    pub fn add_override(&mut self, part: &str, ctype: &str) {
        let part = if part.starts_with('/') {
            part.to_string()
        } else {
            format!("/{}", part)
        };
        self.overrides.push((part, ctype.to_string()));
    }

    /// Render the `[Content_Types].xml` payload
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, ctype) in &self.defaults {
            xml.push_str(&format!(
                "\n    <Default Extension=\"{}\" ContentType=\"{}\"/>",
                ext, ctype
            ));
        }
        for (part, ctype) in &self.overrides {
            xml.push_str(&format!(
                "\n    <Override PartName=\"{}\" ContentType=\"{}\"/>",
                part, ctype
            ));
        }
        xml.push_str("\n</Types>");
        xml
    }
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn escape_xml_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub(crate) fn escape_xml_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_per_scope() {
        let mut rels = Relationships::new();
        assert_eq!(rels.add(rel_type::WORKSHEET, "worksheets/sheet1.xml"), "rId1");
        assert_eq!(rels.add(rel_type::WORKSHEET, "worksheets/sheet2.xml"), "rId2");
        assert_eq!(rels.add(rel_type::STYLES, "styles.xml"), "rId3");

        let mut other = Relationships::new();
        assert_eq!(other.add(rel_type::DRAWING, "../drawings/drawing1.xml"), "rId1");
    }

    #[test]
    fn test_rels_xml_roundtrip() {
        let mut rels = Relationships::new();
        rels.add(rel_type::WORKSHEET, "worksheets/sheet1.xml");
        rels.add_external(rel_type::HYPERLINK, "https://example.com/?a=1&b=2");

        let xml = rels.to_xml();
        let parsed = Relationships::parse(xml.as_bytes(), "test.rels").unwrap();

        assert_eq!(parsed.entries(), rels.entries());
        assert!(parsed.by_id("rId2").unwrap().external);
        assert_eq!(
            parsed.first_of_type(rel_type::WORKSHEET).unwrap().target,
            "worksheets/sheet1.xml"
        );
    }

    #[test]
    fn test_parse_rejects_incomplete_entries() {
        let xml = r#"<Relationships><Relationship Id="rId1" Target="x.xml"/></Relationships>"#;
        assert!(Relationships::parse(xml.as_bytes(), "test.rels").is_err());
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("", "xl/workbook.xml"), "xl/workbook.xml");
        assert_eq!(
            resolve_target("xl", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("xl/worksheets", "../drawings/drawing1.xml"),
            "xl/drawings/drawing1.xml"
        );
        assert_eq!(resolve_target("xl", "/xl/styles.xml"), "xl/styles.xml");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
        assert_eq!(
            rels_path_for("xl/worksheets/sheet1.xml"),
            "xl/worksheets/_rels/sheet1.xml.rels"
        );
    }

    #[test]
    fn test_content_types_xml() {
        let mut types = ContentTypes::new();
        types.add_default("png", "image/png");
        types.add_default("png", "image/png"); // idempotent
        types.add_override("xl/workbook.xml", content_type::WORKBOOK);

        let xml = types.to_xml();
        assert_eq!(xml.matches("Extension=\"png\"").count(), 1);
        assert!(xml.contains("PartName=\"/xl/workbook.xml\""));
        assert!(xml.contains("Extension=\"rels\""));
    }
}
