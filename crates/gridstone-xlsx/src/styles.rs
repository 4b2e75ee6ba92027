//! styles.xml read/write helpers
//!
//! On save the workbook's format pool is flattened into the stylesheet's
//! component tables (fonts, fills, borders, numFmts) with one `cellXfs`
//! entry per pool index, so cell `s=` attributes are exactly the pool
//! indices. On load the tables are recombined into [`Format`] records in
//! file order, ready to be adopted back into a pool.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::package::escape_xml_attr;
use gridstone_core::style::{
    Alignment, Border, BorderEdge, BorderLineStyle, Color, Fill, Font, Format, FormatPool,
    HorizontalAlignment, NumberFormat, PatternType, Protection, Underline, VerticalAlignment,
};

// === Writing ===

/// Component ids resolved for one cell format
#[derive(Debug, Clone, Copy)]
struct XfComponents {
    num_fmt_id: u16,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
}

/// The flattened stylesheet, ready for serialization
#[derive(Debug)]
pub(crate) struct StyleTable<'a> {
    pool: &'a FormatPool,
    fonts: Vec<&'a Font>,
    fills: Vec<Fill>,
    borders: Vec<&'a Border>,
    xfs: Vec<XfComponents>,
}

impl<'a> StyleTable<'a> {
    /// Build the component tables from a format pool, in pool-index order
    pub(crate) fn build(pool: &'a FormatPool) -> Self {
        let mut fonts: Vec<&'a Font> = Vec::new();
        let mut font_ids: HashMap<&'a Font, u32> = HashMap::new();

        // The first two fills are required to be none and gray125.
        let mut fills: Vec<Fill> = vec![
            Fill::None,
            Fill::Pattern {
                pattern: PatternType::Gray125,
                foreground: Color::Auto,
                background: Color::Auto,
            },
        ];
        let mut fill_ids: HashMap<&'a Fill, u32> = HashMap::new();

        let mut borders: Vec<&'a Border> = Vec::new();
        let mut border_ids: HashMap<&'a Border, u32> = HashMap::new();

        let mut xfs = Vec::with_capacity(pool.cell_count());

        for (_, format) in pool.iter_cell() {
            let font_id = match font_ids.get(&format.font) {
                Some(&id) => id,
                None => {
                    let id = fonts.len() as u32;
                    fonts.push(&format.font);
                    font_ids.insert(&format.font, id);
                    id
                }
            };

            let fill_id = match &format.fill {
                Fill::None => 0,
                other => match fill_ids.get(other) {
                    Some(&id) => id,
                    None => {
                        let id = fills.len() as u32;
                        fills.push(other.clone());
                        fill_ids.insert(other, id);
                        id
                    }
                },
            };

            let border_id = match border_ids.get(&format.border) {
                Some(&id) => id,
                None => {
                    let id = borders.len() as u32;
                    borders.push(&format.border);
                    border_ids.insert(&format.border, id);
                    id
                }
            };

            xfs.push(XfComponents {
                num_fmt_id: pool.number_format_id(&format.number_format),
                font_id,
                fill_id,
                border_id,
            });
        }

        Self {
            pool,
            fonts,
            fills,
            borders,
            xfs,
        }
    }

    /// Render the styles.xml payload
    pub(crate) fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        let numfmts = self.pool.custom_number_formats();
        if !numfmts.is_empty() {
            xml.push_str(&format!("\n  <numFmts count=\"{}\">", numfmts.len()));
            for (id, code) in &numfmts {
                xml.push_str(&format!(
                    "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml_attr(code)
                ));
            }
            xml.push_str("\n  </numFmts>");
        }

        xml.push_str(&format!("\n  <fonts count=\"{}\">", self.fonts.len()));
        for font in &self.fonts {
            xml.push_str("\n    ");
            xml.push_str(&write_font(font));
        }
        xml.push_str("\n  </fonts>");

        xml.push_str(&format!("\n  <fills count=\"{}\">", self.fills.len()));
        for fill in &self.fills {
            xml.push_str("\n    ");
            xml.push_str(&write_fill(fill));
        }
        xml.push_str("\n  </fills>");

        xml.push_str(&format!("\n  <borders count=\"{}\">", self.borders.len()));
        for border in &self.borders {
            xml.push_str("\n    ");
            xml.push_str(&write_border(border));
        }
        xml.push_str("\n  </borders>");

        xml.push_str(
            r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", self.xfs.len()));
        for (i, components) in self.xfs.iter().enumerate() {
            if let Some(format) = self.pool.get(i as u32) {
                xml.push_str("\n    ");
                xml.push_str(&write_xf(format, *components));
            }
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>"#,
        );

        if self.pool.differential_count() == 0 {
            xml.push_str("\n  <dxfs count=\"0\"/>");
        } else {
            xml.push_str(&format!(
                "\n  <dxfs count=\"{}\">",
                self.pool.differential_count()
            ));
            for (_, format) in self.pool.iter_differential() {
                xml.push_str("\n    ");
                xml.push_str(&write_dxf(format));
            }
            xml.push_str("\n  </dxfs>");
        }

        xml.push_str("\n</styleSheet>");
        xml
    }
}

fn write_color(tag: &str, color: &Color) -> String {
    match color {
        Color::Auto => format!("<{tag} indexed=\"64\"/>"),
        Color::Rgb { r, g, b } => format!("<{tag} rgb=\"FF{:02X}{:02X}{:02X}\"/>", r, g, b),
        Color::Indexed(i) => format!("<{tag} indexed=\"{}\"/>", i),
        Color::Theme { index, tint } => {
            if *tint == 0 {
                format!("<{tag} theme=\"{}\"/>", index)
            } else {
                format!("<{tag} theme=\"{}\" tint=\"{}\"/>", index, *tint as f64 / 100.0)
            }
        }
    }
}

fn write_font(font: &Font) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikeout {
        s.push_str("<strike/>");
    }
    match font.underline {
        Underline::None => {}
        Underline::Single => s.push_str("<u/>"),
        Underline::Double => s.push_str("<u val=\"double\"/>"),
        Underline::SingleAccounting => s.push_str("<u val=\"singleAccounting\"/>"),
        Underline::DoubleAccounting => s.push_str("<u val=\"doubleAccounting\"/>"),
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if !matches!(font.color, Color::Auto) {
        s.push_str(&write_color("color", &font.color));
    }
    s.push_str(&format!("<name val=\"{}\"/>", escape_xml_attr(&font.name)));
    s.push_str("</font>");
    s
}

fn write_fill(fill: &Fill) -> String {
    match fill {
        Fill::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        Fill::Solid { color } => format!(
            "<fill><patternFill patternType=\"solid\">{}<bgColor indexed=\"64\"/></patternFill></fill>",
            write_color("fgColor", color)
        ),
        Fill::Pattern {
            pattern,
            foreground,
            background,
        } => format!(
            "<fill><patternFill patternType=\"{}\">{}{}</patternFill></fill>",
            pattern.as_str(),
            write_color("fgColor", foreground),
            write_color("bgColor", background)
        ),
    }
}

fn write_border_edge(tag: &str, edge: &Option<BorderEdge>) -> String {
    match edge {
        None => format!("<{tag}/>"),
        Some(e) => format!(
            "<{tag} style=\"{}\">{}</{tag}>",
            e.style.as_str(),
            write_color("color", &e.color)
        ),
    }
}

fn write_border(border: &Border) -> String {
    let mut s = String::from("<border>");
    s.push_str(&write_border_edge("left", &border.left));
    s.push_str(&write_border_edge("right", &border.right));
    s.push_str(&write_border_edge("top", &border.top));
    s.push_str(&write_border_edge("bottom", &border.bottom));
    s.push_str(&write_border_edge("diagonal", &border.diagonal));
    s.push_str("</border>");
    s
}

fn write_alignment(al: &Alignment) -> String {
    let default = Alignment::default();
    if al == &default {
        return String::new();
    }

    let mut s = String::from("<alignment");
    if al.horizontal != default.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", al.horizontal.as_str()));
    }
    if al.vertical != default.vertical {
        s.push_str(&format!(" vertical=\"{}\"", al.vertical.as_str()));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if al.shrink_to_fit {
        s.push_str(" shrinkToFit=\"1\"");
    }
    if al.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", al.indent));
    }
    if al.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", al.rotation));
    }
    s.push_str("/>");
    s
}

fn write_protection(p: &Protection) -> String {
    let default = Protection::default();
    if p == &default {
        return String::new();
    }
    let mut s = String::from("<protection");
    if p.unlocked {
        s.push_str(" locked=\"0\"");
    }
    if p.hidden {
        s.push_str(" hidden=\"1\"");
    }
    s.push_str("/>");
    s
}

fn write_xf(format: &Format, components: XfComponents) -> String {
    let mut attrs = String::new();
    if components.num_fmt_id != 0 {
        attrs.push_str(" applyNumberFormat=\"1\"");
    }
    if format.font != Font::default() {
        attrs.push_str(" applyFont=\"1\"");
    }
    if format.fill != Fill::None {
        attrs.push_str(" applyFill=\"1\"");
    }
    if format.border != Border::default() {
        attrs.push_str(" applyBorder=\"1\"");
    }
    if format.alignment != Alignment::default() {
        attrs.push_str(" applyAlignment=\"1\"");
    }
    if format.protection != Protection::default() {
        attrs.push_str(" applyProtection=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"{}",
        components.num_fmt_id, components.font_id, components.fill_id, components.border_id, attrs
    );

    let alignment = write_alignment(&format.alignment);
    let protection = write_protection(&format.protection);
    if alignment.is_empty() && protection.is_empty() {
        s.push_str("/>");
        return s;
    }

    s.push('>');
    s.push_str(&alignment);
    s.push_str(&protection);
    s.push_str("</xf>");
    s
}

/// Differential formats carry only their non-default pieces
fn write_dxf(format: &Format) -> String {
    let mut s = String::from("<dxf>");
    if format.font != Font::default() {
        s.push_str(&write_font(&format.font));
    }
    if let NumberFormat::Custom(code) = &format.number_format {
        s.push_str(&format!(
            "<numFmt numFmtId=\"0\" formatCode=\"{}\"/>",
            escape_xml_attr(code)
        ));
    }
    if format.fill != Fill::None {
        s.push_str(&write_fill(&format.fill));
    }
    if format.border != Border::default() {
        s.push_str(&write_border(&format.border));
    }
    s.push_str("</dxf>");
    s
}

// === Reading ===

/// The stylesheet's formats in file order
#[derive(Debug)]
pub(crate) struct ParsedStyles {
    /// cellXfs entries, one per xf index
    pub cell_formats: Vec<Format>,
    /// dxfs entries, one per dxf index
    pub differential_formats: Vec<Format>,
}

impl ParsedStyles {
    /// The stylesheet of a package with no styles part
    pub(crate) fn empty() -> Self {
        Self {
            cell_formats: vec![Format::default()],
            differential_formats: Vec::new(),
        }
    }
}

fn parse_color(e: &BytesStart) -> Color {
    let mut rgb = None;
    let mut indexed = None;
    let mut theme = None;
    let mut tint = 0i8;

    for attr in e.attributes().flatten() {
        if let Ok(value) = attr.unescape_value() {
            match attr.key.as_ref() {
                b"rgb" => rgb = Color::from_hex(&value),
                b"indexed" => indexed = value.parse::<u8>().ok(),
                b"theme" => theme = value.parse::<u8>().ok(),
                b"tint" => {
                    if let Ok(t) = value.parse::<f64>() {
                        tint = (t * 100.0).round().clamp(-100.0, 100.0) as i8;
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(color) = rgb {
        color
    } else if let Some(index) = theme {
        Color::Theme { index, tint }
    } else if let Some(i) = indexed {
        // 64 is the "system foreground" sentinel this writer uses for Auto.
        if i == 64 {
            Color::Auto
        } else {
            Color::Indexed(i)
        }
    } else {
        Color::Auto
    }
}

fn parse_alignment(e: &BytesStart) -> Alignment {
    let mut al = Alignment::default();
    for attr in e.attributes().flatten() {
        if let Ok(value) = attr.unescape_value() {
            match attr.key.as_ref() {
                b"horizontal" => {
                    if let Some(h) = HorizontalAlignment::from_name(&value) {
                        al.horizontal = h;
                    }
                }
                b"vertical" => {
                    if let Some(v) = VerticalAlignment::from_name(&value) {
                        al.vertical = v;
                    }
                }
                b"wrapText" => al.wrap_text = value.as_ref() == "1" || value.as_ref() == "true",
                b"shrinkToFit" => {
                    al.shrink_to_fit = value.as_ref() == "1" || value.as_ref() == "true"
                }
                b"indent" => al.indent = value.parse().unwrap_or(0),
                b"textRotation" => al.rotation = value.parse().unwrap_or(0),
                _ => {}
            }
        }
    }
    al
}

/// Parse a styles.xml part into formats in file order
pub(crate) fn read_styles_xml<R: BufRead>(reader: R, part: &str) -> XlsxResult<ParsedStyles> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut parser = StylesParser::new(part);
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.on_start(&e),
            Ok(Event::Empty(e)) => {
                parser.on_start(&e);
                parser.on_end(e.name().as_ref())?;
            }
            Ok(Event::End(e)) => parser.on_end(e.name().as_ref())?,
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    parser.finish()
}

fn resolve_numfmt(id: u16, numfmts: &HashMap<u16, String>) -> NumberFormat {
    if id == 0 {
        NumberFormat::General
    } else if let Some(code) = numfmts.get(&id) {
        NumberFormat::from_code(code)
    } else {
        // Built-in, or an undeclared id: keep it so the xf round-trips.
        NumberFormat::BuiltIn(id)
    }
}

/// Streaming stylesheet parser state
///
/// Component records under construction are shared between the main tables
/// and the current dxf; `in_dxf` decides where a finished record lands.
struct StylesParser {
    part: String,
    numfmts: HashMap<u16, String>,
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    cell_formats: Vec<Format>,
    differential_formats: Vec<Format>,
    current_font: Option<Font>,
    current_fill: Option<Fill>,
    current_border: Option<Border>,
    current_edge: Option<&'static str>,
    in_cell_xfs: bool,
    current_xf: Option<Format>,
    in_dxf: bool,
    current_dxf: Option<Format>,
}

impl StylesParser {
    fn new(part: &str) -> Self {
        Self {
            part: part.to_string(),
            numfmts: HashMap::new(),
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            cell_formats: Vec::new(),
            differential_formats: Vec::new(),
            current_font: None,
            current_fill: None,
            current_border: None,
            current_edge: None,
            in_cell_xfs: false,
            current_xf: None,
            in_dxf: false,
            current_dxf: None,
        }
    }

    fn on_start(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            b"numFmt" if !self.in_dxf => {
                let mut id = None;
                let mut code = None;
                for attr in e.attributes().flatten() {
                    if let Ok(value) = attr.unescape_value() {
                        match attr.key.as_ref() {
                            b"numFmtId" => id = value.parse::<u16>().ok(),
                            b"formatCode" => code = Some(value.to_string()),
                            _ => {}
                        }
                    }
                }
                if let (Some(id), Some(code)) = (id, code) {
                    self.numfmts.insert(id, code);
                }
            }

            b"font" => self.current_font = Some(Font::default()),
            b"b" => {
                if let Some(f) = self.current_font.as_mut() {
                    f.bold = true;
                }
            }
            b"i" => {
                if let Some(f) = self.current_font.as_mut() {
                    f.italic = true;
                }
            }
            b"strike" => {
                if let Some(f) = self.current_font.as_mut() {
                    f.strikeout = true;
                }
            }
            b"u" => {
                let mut underline = Underline::Single;
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"val" {
                        if let Ok(value) = attr.unescape_value() {
                            underline = match value.as_ref() {
                                "double" => Underline::Double,
                                "singleAccounting" => Underline::SingleAccounting,
                                "doubleAccounting" => Underline::DoubleAccounting,
                                "none" => Underline::None,
                                _ => Underline::Single,
                            };
                        }
                    }
                }
                if let Some(f) = self.current_font.as_mut() {
                    f.underline = underline;
                }
            }
            b"sz" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"val" {
                        if let (Some(f), Ok(value)) =
                            (self.current_font.as_mut(), attr.unescape_value())
                        {
                            f.size = value.parse().unwrap_or(11.0);
                        }
                    }
                }
            }
            b"name" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"val" {
                        if let (Some(f), Ok(value)) =
                            (self.current_font.as_mut(), attr.unescape_value())
                        {
                            f.name = value.to_string();
                        }
                    }
                }
            }
            b"color" => {
                let color = parse_color(e);
                if let Some(tag) = self.current_edge {
                    if let Some(border) = self.current_border.as_mut() {
                        if let Some(edge) = edge_slot(border, tag).as_mut() {
                            edge.color = color;
                        }
                    }
                } else if let Some(f) = self.current_font.as_mut() {
                    f.color = color;
                }
            }

            b"fill" => self.current_fill = Some(Fill::None),
            b"patternFill" => {
                if self.current_fill.is_none() {
                    return;
                }
                let mut pattern_name = String::from("none");
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"patternType" {
                        if let Ok(value) = attr.unescape_value() {
                            pattern_name = value.to_string();
                        }
                    }
                }
                self.current_fill = Some(match pattern_name.as_str() {
                    "none" => Fill::None,
                    "solid" => Fill::Solid { color: Color::Auto },
                    other => match PatternType::from_name(other) {
                        Some(pattern) => Fill::Pattern {
                            pattern,
                            foreground: Color::Auto,
                            background: Color::Auto,
                        },
                        None => Fill::None,
                    },
                });
            }
            b"fgColor" => {
                let color = parse_color(e);
                match self.current_fill.as_mut() {
                    Some(Fill::Solid { color: c }) => *c = color,
                    Some(Fill::Pattern { foreground, .. }) => *foreground = color,
                    _ => {}
                }
            }
            b"bgColor" => {
                if let Some(Fill::Pattern { background, .. }) = self.current_fill.as_mut() {
                    *background = parse_color(e);
                }
            }

            b"border" => {
                self.current_border = Some(Border::default());
                self.current_edge = None;
            }
            b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => {
                if self.current_border.is_none() {
                    return;
                }
                let tag = match e.name().as_ref() {
                    b"left" => "left",
                    b"right" => "right",
                    b"top" => "top",
                    b"bottom" => "bottom",
                    _ => "diagonal",
                };
                let mut style = None;
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"style" {
                        if let Ok(value) = attr.unescape_value() {
                            style = BorderLineStyle::from_name(&value);
                        }
                    }
                }
                if let Some(style) = style {
                    if let Some(border) = self.current_border.as_mut() {
                        *edge_slot(border, tag) = Some(BorderEdge {
                            style,
                            color: Color::Auto,
                        });
                    }
                    self.current_edge = Some(tag);
                } else {
                    self.current_edge = None;
                }
            }

            b"cellXfs" => self.in_cell_xfs = true,
            b"xf" if self.in_cell_xfs => {
                let mut format = Format::default();
                for attr in e.attributes().flatten() {
                    if let Ok(value) = attr.unescape_value() {
                        match attr.key.as_ref() {
                            b"numFmtId" => {
                                let id: u16 = value.parse().unwrap_or(0);
                                format.number_format = resolve_numfmt(id, &self.numfmts);
                            }
                            b"fontId" => {
                                if let Ok(id) = value.parse::<usize>() {
                                    if let Some(font) = self.fonts.get(id) {
                                        format.font = font.clone();
                                    }
                                }
                            }
                            b"fillId" => {
                                if let Ok(id) = value.parse::<usize>() {
                                    // Slot 1 (gray125) is table scaffolding,
                                    // not a user fill.
                                    if id != 1 {
                                        if let Some(fill) = self.fills.get(id) {
                                            format.fill = fill.clone();
                                        }
                                    }
                                }
                            }
                            b"borderId" => {
                                if let Ok(id) = value.parse::<usize>() {
                                    if let Some(border) = self.borders.get(id) {
                                        format.border = border.clone();
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                }
                self.current_xf = Some(format);
            }
            b"alignment" => {
                if let Some(xf) = self.current_xf.as_mut() {
                    xf.alignment = parse_alignment(e);
                }
            }
            b"protection" => {
                if let Some(xf) = self.current_xf.as_mut() {
                    let mut protection = Protection::default();
                    for attr in e.attributes().flatten() {
                        if let Ok(value) = attr.unescape_value() {
                            match attr.key.as_ref() {
                                b"locked" => {
                                    protection.unlocked =
                                        value.as_ref() == "0" || value.as_ref() == "false"
                                }
                                b"hidden" => {
                                    protection.hidden =
                                        value.as_ref() == "1" || value.as_ref() == "true"
                                }
                                _ => {}
                            }
                        }
                    }
                    xf.protection = protection;
                }
            }

            b"dxf" => {
                self.in_dxf = true;
                self.current_dxf = Some(Format::default());
            }
            b"numFmt" if self.in_dxf => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"formatCode" {
                        if let (Some(dxf), Ok(value)) =
                            (self.current_dxf.as_mut(), attr.unescape_value())
                        {
                            dxf.number_format = NumberFormat::from_code(&value);
                        }
                    }
                }
            }

            _ => {}
        }
    }

    fn on_end(&mut self, name: &[u8]) -> XlsxResult<()> {
        match name {
            b"font" => {
                let font = self
                    .current_font
                    .take()
                    .ok_or_else(|| XlsxError::malformed(&self.part, "dangling </font>"))?;
                if self.in_dxf {
                    if let Some(dxf) = self.current_dxf.as_mut() {
                        dxf.font = font;
                    }
                } else {
                    self.fonts.push(font);
                }
            }
            b"fill" => {
                let fill = self
                    .current_fill
                    .take()
                    .ok_or_else(|| XlsxError::malformed(&self.part, "dangling </fill>"))?;
                if self.in_dxf {
                    if let Some(dxf) = self.current_dxf.as_mut() {
                        dxf.fill = fill;
                    }
                } else {
                    self.fills.push(fill);
                }
            }
            b"border" => {
                let border = self
                    .current_border
                    .take()
                    .ok_or_else(|| XlsxError::malformed(&self.part, "dangling </border>"))?;
                self.current_edge = None;
                if self.in_dxf {
                    if let Some(dxf) = self.current_dxf.as_mut() {
                        dxf.border = border;
                    }
                } else {
                    self.borders.push(border);
                }
            }
            b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => {
                self.current_edge = None;
            }
            b"xf" => {
                if self.in_cell_xfs {
                    if let Some(xf) = self.current_xf.take() {
                        self.cell_formats.push(xf);
                    }
                }
            }
            b"cellXfs" => self.in_cell_xfs = false,
            b"dxf" => {
                if let Some(dxf) = self.current_dxf.take() {
                    self.differential_formats.push(dxf);
                }
                self.in_dxf = false;
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self) -> XlsxResult<ParsedStyles> {
        if self.cell_formats.is_empty() {
            self.cell_formats.push(Format::default());
        }
        Ok(ParsedStyles {
            cell_formats: self.cell_formats,
            differential_formats: self.differential_formats,
        })
    }
}

fn edge_slot<'b>(border: &'b mut Border, tag: &str) -> &'b mut Option<BorderEdge> {
    match tag {
        "left" => &mut border.left,
        "right" => &mut border.right,
        "top" => &mut border.top,
        "bottom" => &mut border.bottom,
        _ => &mut border.diagonal,
    }
}
