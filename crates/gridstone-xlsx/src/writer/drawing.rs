//! Drawing part serialization
//!
//! Emits the anchor markup for a sheet's drawing and registers each
//! anchored image as a media part plus an image relationship in the
//! drawing's own scope.

use super::PackageBuilder;
use crate::error::XlsxResult;
use crate::package::{content_type, escape_xml_attr, rel_type, rels_path_for, Relationships};
use gridstone_core::{AnchorContent, AnchorKind, Drawing, Marker};

/// Serialize a drawing and its media into the package
pub(super) fn add_drawing_parts(
    builder: &mut PackageBuilder,
    drawing: &Drawing,
    drawing_no: usize,
    media_no: &mut usize,
) -> XlsxResult<()> {
    let mut rels = Relationships::new();
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    for anchor in drawing.anchors() {
        let AnchorContent::Image { kind, data, name } = &anchor.content;

        *media_no += 1;
        let media_path = format!("xl/media/image{}.{}", media_no, kind.extension());
        builder.add_default_content_type(kind.extension(), kind.mime_type());
        builder.add_part(&media_path, data.clone(), None);
        let rid = rels.add(
            rel_type::IMAGE,
            &format!("../media/image{}.{}", media_no, kind.extension()),
        );

        let picture = picture_xml(anchor.id, name, &rid);
        match &anchor.kind {
            AnchorKind::OneCell { from, extent } => {
                xml.push_str("\n    <xdr:oneCellAnchor>");
                xml.push_str(&marker_xml("xdr:from", from));
                xml.push_str(&format!(
                    "\n        <xdr:ext cx=\"{}\" cy=\"{}\"/>",
                    extent.width, extent.height
                ));
                xml.push_str(&picture);
                xml.push_str("\n        <xdr:clientData/>\n    </xdr:oneCellAnchor>");
            }
            AnchorKind::TwoCell { from, to } => {
                xml.push_str("\n    <xdr:twoCellAnchor>");
                xml.push_str(&marker_xml("xdr:from", from));
                xml.push_str(&marker_xml("xdr:to", to));
                xml.push_str(&picture);
                xml.push_str("\n        <xdr:clientData/>\n    </xdr:twoCellAnchor>");
            }
        }
    }

    xml.push_str("\n</xdr:wsDr>");

    let path = format!("xl/drawings/drawing{}.xml", drawing_no);
    builder.add_part(&path, xml.into_bytes(), Some(content_type::DRAWING));
    if !rels.is_empty() {
        builder.add_part(&rels_path_for(&path), rels.to_xml().into_bytes(), None);
    }

    Ok(())
}

/// Markers are serialized 0-based, as the drawing schema expects
fn marker_xml(tag: &str, marker: &Marker) -> String {
    format!(
        "\n        <{tag}><xdr:col>{}</xdr:col><xdr:colOff>{}</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>{}</xdr:rowOff></{tag}>",
        marker.col.saturating_sub(1),
        marker.col_offset,
        marker.row.saturating_sub(1),
        marker.row_offset,
    )
}

fn picture_xml(id: u32, name: &str, rid: &str) -> String {
    format!(
        r#"
        <xdr:pic>
            <xdr:nvPicPr>
                <xdr:cNvPr id="{}" name="{}"/>
                <xdr:cNvPicPr/>
            </xdr:nvPicPr>
            <xdr:blipFill>
                <a:blip r:embed="{}"/>
                <a:stretch><a:fillRect/></a:stretch>
            </xdr:blipFill>
            <xdr:spPr>
                <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
            </xdr:spPr>
        </xdr:pic>"#,
        id,
        escape_xml_attr(name),
        rid
    )
}
