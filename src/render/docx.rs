//! DOCX renderer.
//!
//! Produces an OOXML word-processing package: a ZIP archive holding
//! `[Content_Types].xml`, the package relationships, `word/document.xml`,
//! `word/styles.xml` and, when a logo is present, `word/media/logo.*` plus
//! the relationship that binds it. The document mirrors the PDF renderer's
//! content structure: Title-styled heading, metadata paragraph, then per
//! section a Heading1 paragraph followed by a two-column field table or
//! plain paragraphs. Archive entries carry fixed timestamps so identical
//! reports produce byte-identical packages.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::{check_section_cap, ReportRenderer, DOCX_MIME};
use crate::error::{Error, Result};
use crate::image::{self, ScaledImage};
use crate::report::{Report, SectionContent};

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// Relationship ID of the styles part.
const STYLES_REL_ID: &str = "rId1";
/// Relationship ID of the embedded logo.
const LOGO_REL_ID: &str = "rId2";

/// A4 page size in twentieths of a point.
const PAGE_W_TWIPS: u32 = 11_906;
const PAGE_H_TWIPS: u32 = 16_838;
/// 2 cm margins in twips.
const MARGIN_TWIPS: u32 = 1_134;
/// Field table column widths in twips; together they fill the printable width.
const LABEL_COL_TWIPS: u32 = 2_977;
const VALUE_COL_TWIPS: u32 = 6_661;

/// Renders a report to a DOCX package byte stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer;

impl DocxRenderer {
    /// Create a DOCX renderer.
    pub fn new() -> Self {
        Self
    }
}

impl ReportRenderer for DocxRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>> {
        check_section_cap(report)?;
        log::debug!(
            "rendering docx: {} sections, logo: {}",
            report.sections().len(),
            report.logo().is_some()
        );

        let logo = report
            .logo()
            .map(|logo| image::scale(&logo.data, logo.width_cm))
            .transpose()?;

        let document = build_document_xml(report, logo.as_ref())?;
        build_package(report, logo.as_ref(), &document)
    }

    fn mime_type(&self) -> &'static str {
        DOCX_MIME
    }

    fn file_extension(&self) -> &'static str {
        "docx"
    }
}

// === Package assembly ===

fn build_package(report: &Report, logo: Option<&ScaledImage>, document: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    // Fixed timestamp (1980-01-01) keeps the package deterministic.
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut put = |archive: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, data: &[u8]| -> Result<()> {
        archive
            .start_file(name, options.clone())
            .map_err(|e| Error::render(format!("starting package entry {name}: {e}")))?;
        archive.write_all(data)?;
        Ok(())
    };

    put(&mut archive, "[Content_Types].xml", content_types(logo).as_bytes())?;
    put(&mut archive, "_rels/.rels", PACKAGE_RELS.as_bytes())?;
    put(&mut archive, "word/document.xml", document)?;
    put(&mut archive, "word/_rels/document.xml.rels", document_rels(logo).as_bytes())?;
    put(&mut archive, "word/styles.xml", &build_styles_xml()?)?;
    if let (Some(scaled), Some(logo_data)) = (logo, report.logo()) {
        let name = format!("word/media/logo.{}", scaled.format.extension());
        put(&mut archive, &name, &logo_data.data)?;
    }

    let cursor = archive
        .finish()
        .map_err(|e| Error::render(format!("closing package: {e}")))?;
    Ok(cursor.into_inner())
}

fn content_types(logo: Option<&ScaledImage>) -> String {
    let image_default = match logo {
        Some(scaled) => format!(
            "<Default Extension=\"{}\" ContentType=\"{}\"/>",
            scaled.format.extension(),
            scaled.format.mime_type()
        ),
        None => String::new(),
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         {image_default}\
         <Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
         <Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>\
         </Types>"
    )
}

const PACKAGE_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
    <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
    <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
    </Relationships>";

fn document_rels(logo: Option<&ScaledImage>) -> String {
    let logo_rel = match logo {
        Some(scaled) => format!(
            "<Relationship Id=\"{LOGO_REL_ID}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" Target=\"media/logo.{}\"/>",
            scaled.format.extension()
        ),
        None => String::new(),
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"{STYLES_REL_ID}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\
         {logo_rel}\
         </Relationships>"
    )
}

// === XML emission helpers ===

/// Thin wrapper over `quick_xml::Writer` folding its error type into ours.
struct Xml {
    writer: Writer<Vec<u8>>,
}

impl Xml {
    fn new() -> Result<Self> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_err)?;
        Ok(Self { writer })
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(name);
        for (key, value) in attrs {
            elem.push_attribute((*key, *value));
        }
        self.writer.write_event(Event::Start(elem)).map_err(xml_err)
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_err)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(name);
        for (key, value) in attrs {
            elem.push_attribute((*key, *value));
        }
        self.writer.write_event(Event::Empty(elem)).map_err(xml_err)
    }

    /// Escaped character data.
    fn text(&mut self, content: &str) -> Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::new(content)))
            .map_err(xml_err)
    }

    fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

fn xml_err(e: impl std::fmt::Display) -> Error {
    Error::render(format!("writing XML: {e}"))
}

// === document.xml ===

fn build_document_xml(report: &Report, logo: Option<&ScaledImage>) -> Result<Vec<u8>> {
    let mut xml = Xml::new()?;

    xml.start(
        "w:document",
        &[
            ("xmlns:w", NS_W),
            ("xmlns:r", NS_R),
            ("xmlns:wp", NS_WP),
            ("xmlns:a", NS_A),
            ("xmlns:pic", NS_PIC),
        ],
    )?;
    xml.start("w:body", &[])?;

    if let Some(scaled) = logo {
        write_logo_paragraph(&mut xml, scaled)?;
    }

    write_styled_paragraph(&mut xml, "Title", report.title())?;
    write_metadata_paragraph(&mut xml, report)?;

    for section in report.sections() {
        write_styled_paragraph(&mut xml, "Heading1", &section.heading)?;
        match &section.content {
            SectionContent::Fields(fields) => {
                write_field_table(&mut xml, fields)?;
            },
            SectionContent::Paragraphs(paragraphs) => {
                for paragraph in paragraphs {
                    xml.start("w:p", &[])?;
                    write_run(&mut xml, paragraph, false)?;
                    xml.end("w:p")?;
                }
            },
        }
    }

    xml.start("w:sectPr", &[])?;
    xml.empty(
        "w:pgSz",
        &[
            ("w:w", PAGE_W_TWIPS.to_string().as_str()),
            ("w:h", PAGE_H_TWIPS.to_string().as_str()),
        ],
    )?;
    let margin = MARGIN_TWIPS.to_string();
    xml.empty(
        "w:pgMar",
        &[
            ("w:top", margin.as_str()),
            ("w:right", margin.as_str()),
            ("w:bottom", margin.as_str()),
            ("w:left", margin.as_str()),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ],
    )?;
    xml.end("w:sectPr")?;

    xml.end("w:body")?;
    xml.end("w:document")?;
    Ok(xml.into_bytes())
}

/// One paragraph carrying a named paragraph style.
fn write_styled_paragraph(xml: &mut Xml, style: &str, content: &str) -> Result<()> {
    xml.start("w:p", &[])?;
    xml.start("w:pPr", &[])?;
    xml.empty("w:pStyle", &[("w:val", style)])?;
    xml.end("w:pPr")?;
    write_run(xml, content, false)?;
    xml.end("w:p")
}

/// One run; embedded newlines become explicit line breaks.
fn write_run(xml: &mut Xml, content: &str, bold: bool) -> Result<()> {
    xml.start("w:r", &[])?;
    if bold {
        xml.start("w:rPr", &[])?;
        xml.empty("w:b", &[])?;
        xml.end("w:rPr")?;
    }
    for (idx, line) in content.split('\n').enumerate() {
        if idx > 0 {
            xml.empty("w:br", &[])?;
        }
        xml.start("w:t", &[("xml:space", "preserve")])?;
        xml.text(line)?;
        xml.end("w:t")?;
    }
    xml.end("w:r")
}

/// Bold `Author:` / `Date:` lines in a single paragraph.
fn write_metadata_paragraph(xml: &mut Xml, report: &Report) -> Result<()> {
    xml.start("w:p", &[])?;
    if !report.author().is_empty() {
        write_run(xml, "Author: ", true)?;
        write_run(xml, report.author(), false)?;
        xml.start("w:r", &[])?;
        xml.empty("w:br", &[])?;
        xml.end("w:r")?;
    }
    write_run(xml, "Date: ", true)?;
    write_run(xml, &report.date().format("%Y-%m-%d").to_string(), false)?;
    xml.end("w:p")
}

/// Two-column bordered table, one row per field, bold label cell.
///
/// A table needs at least one row to be well-formed, so an empty field list
/// degrades to an empty paragraph.
fn write_field_table(xml: &mut Xml, fields: &[crate::report::Field]) -> Result<()> {
    if fields.is_empty() {
        xml.start("w:p", &[])?;
        return xml.end("w:p");
    }

    xml.start("w:tbl", &[])?;

    xml.start("w:tblPr", &[])?;
    xml.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
    xml.start("w:tblBorders", &[])?;
    for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        xml.empty(
            edge,
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
        )?;
    }
    xml.end("w:tblBorders")?;
    xml.end("w:tblPr")?;

    xml.start("w:tblGrid", &[])?;
    xml.empty("w:gridCol", &[("w:w", LABEL_COL_TWIPS.to_string().as_str())])?;
    xml.empty("w:gridCol", &[("w:w", VALUE_COL_TWIPS.to_string().as_str())])?;
    xml.end("w:tblGrid")?;

    for field in fields {
        xml.start("w:tr", &[])?;
        write_table_cell(xml, LABEL_COL_TWIPS, &field.label, true)?;
        write_table_cell(xml, VALUE_COL_TWIPS, &field.value, false)?;
        xml.end("w:tr")?;
    }

    xml.end("w:tbl")
}

fn write_table_cell(xml: &mut Xml, width_twips: u32, content: &str, bold: bool) -> Result<()> {
    xml.start("w:tc", &[])?;
    xml.start("w:tcPr", &[])?;
    xml.empty(
        "w:tcW",
        &[("w:w", width_twips.to_string().as_str()), ("w:type", "dxa")],
    )?;
    xml.end("w:tcPr")?;
    xml.start("w:p", &[])?;
    write_run(xml, content, bold)?;
    xml.end("w:p")?;
    xml.end("w:tc")
}

/// Inline DrawingML picture sized in EMU from the scaled logo.
fn write_logo_paragraph(xml: &mut Xml, scaled: &ScaledImage) -> Result<()> {
    let cx = scaled.width_emu().to_string();
    let cy = scaled.height_emu().to_string();

    xml.start("w:p", &[])?;
    xml.start("w:r", &[])?;
    xml.start("w:drawing", &[])?;
    xml.start(
        "wp:inline",
        &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
    )?;
    xml.empty("wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.empty("wp:docPr", &[("id", "1"), ("name", "Logo")])?;
    xml.start("a:graphic", &[])?;
    xml.start("a:graphicData", &[("uri", NS_PIC)])?;
    xml.start("pic:pic", &[])?;

    xml.start("pic:nvPicPr", &[])?;
    xml.empty("pic:cNvPr", &[("id", "1"), ("name", "Logo")])?;
    xml.empty("pic:cNvPicPr", &[])?;
    xml.end("pic:nvPicPr")?;

    xml.start("pic:blipFill", &[])?;
    xml.empty("a:blip", &[("r:embed", LOGO_REL_ID)])?;
    xml.start("a:stretch", &[])?;
    xml.empty("a:fillRect", &[])?;
    xml.end("a:stretch")?;
    xml.end("pic:blipFill")?;

    xml.start("pic:spPr", &[])?;
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.end("a:xfrm")?;
    xml.start("a:prstGeom", &[("prst", "rect")])?;
    xml.empty("a:avLst", &[])?;
    xml.end("a:prstGeom")?;
    xml.end("pic:spPr")?;

    xml.end("pic:pic")?;
    xml.end("a:graphicData")?;
    xml.end("a:graphic")?;
    xml.end("wp:inline")?;
    xml.end("w:drawing")?;
    xml.end("w:r")?;
    xml.end("w:p")
}

// === styles.xml ===

/// Minimal style sheet: Calibri 11 pt defaults plus Title and Heading1,
/// sized to match the PDF renderer (half-point units).
fn build_styles_xml() -> Result<Vec<u8>> {
    let mut xml = Xml::new()?;
    xml.start("w:styles", &[("xmlns:w", NS_W)])?;

    xml.start("w:docDefaults", &[])?;
    xml.start("w:rPrDefault", &[])?;
    xml.start("w:rPr", &[])?;
    xml.empty("w:rFonts", &[("w:ascii", "Calibri"), ("w:hAnsi", "Calibri")])?;
    xml.empty("w:sz", &[("w:val", "22")])?;
    xml.end("w:rPr")?;
    xml.end("w:rPrDefault")?;
    xml.empty("w:pPrDefault", &[])?;
    xml.end("w:docDefaults")?;

    write_heading_style(&mut xml, "Title", "Title", "40")?;
    write_heading_style(&mut xml, "Heading1", "heading 1", "28")?;

    xml.end("w:styles")?;
    Ok(xml.into_bytes())
}

fn write_heading_style(xml: &mut Xml, id: &str, name: &str, half_points: &str) -> Result<()> {
    xml.start("w:style", &[("w:type", "paragraph"), ("w:styleId", id)])?;
    xml.empty("w:name", &[("w:val", name)])?;
    xml.start("w:rPr", &[])?;
    xml.empty("w:b", &[])?;
    xml.empty("w:sz", &[("w:val", half_points)])?;
    xml.end("w:rPr")?;
    xml.end("w:style")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Field, Logo, Report, Section};
    use chrono::NaiveDate;
    use std::io::Read;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    fn sample_report() -> Report {
        Report::new(
            "Q1 Summary",
            "Alice",
            date(),
            vec![
                Section::fields("Overview", vec![Field::new("Status", "Green")]),
                Section::paragraphs("Notes", vec!["Body text.".into()]),
            ],
            None,
        )
        .unwrap()
    }

    fn read_entry(package: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(package.to_vec())).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_package_layout() {
        let bytes = DocxRenderer::new().render(&sample_report()).unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        assert!(names.contains(&"_rels/.rels".to_string()));
        assert!(names.contains(&"word/document.xml".to_string()));
        assert!(names.contains(&"word/styles.xml".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("word/media/")));
    }

    #[test]
    fn test_document_content_and_order() {
        let bytes = DocxRenderer::new().render(&sample_report()).unwrap();
        let document = read_entry(&bytes, "word/document.xml");

        assert!(document.contains("Q1 Summary"));
        assert!(document.contains("<w:pStyle w:val=\"Title\"/>"));
        assert!(document.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(document.contains("<w:tbl>"));
        assert!(document.contains("Alice"));
        assert!(document.find("Overview").unwrap() < document.find("Notes").unwrap());
        assert!(document.find("Status").unwrap() < document.find("Green").unwrap());
    }

    #[test]
    fn test_xml_reserved_characters_escaped() {
        let report = Report::new(
            "Fees & <Charges>",
            "",
            date(),
            vec![Section::fields("Data", vec![Field::new("Q\"A\"", "1 < 2 & 3 > 2")])],
            None,
        )
        .unwrap();
        let bytes = DocxRenderer::new().render(&report).unwrap();
        let document = read_entry(&bytes, "word/document.xml");

        assert!(document.contains("Fees &amp; &lt;Charges&gt;"));
        assert!(document.contains("1 &lt; 2 &amp; 3 &gt; 2"));
        assert!(!document.contains("<Charges>"));
    }

    #[test]
    fn test_logo_embedded_and_sized() {
        let logo = Logo::new(crate::image::testing::png_bytes(100, 50), 5.0);
        let report = Report::new("With Logo", "", date(), vec![], Some(logo)).unwrap();
        let bytes = DocxRenderer::new().render(&report).unwrap();

        let document = read_entry(&bytes, "word/document.xml");
        // 5 cm wide, 2:1 aspect: 1800000 x 900000 EMU
        assert!(document.contains("cx=\"1800000\" cy=\"900000\""));
        assert_eq!(document.matches("<w:drawing>").count(), 1);

        let rels = read_entry(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains("Target=\"media/logo.png\""));

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("word/media/logo.png").is_ok());
    }

    #[test]
    fn test_corrupt_logo_fails_invalid_asset() {
        let logo = Logo::new(vec![1, 2, 3], 4.0);
        let report = Report::new("Bad", "", date(), vec![], Some(logo)).unwrap();
        let err = DocxRenderer::new().render(&report).unwrap_err();
        assert!(matches!(err, Error::InvalidAsset(_)));
    }

    #[test]
    fn test_deterministic_package() {
        let report = sample_report();
        assert_eq!(
            DocxRenderer::new().render(&report).unwrap(),
            DocxRenderer::new().render(&report).unwrap()
        );
    }

    #[test]
    fn test_newlines_become_breaks() {
        let report = Report::new(
            "Report",
            "",
            date(),
            vec![Section::paragraphs("Notes", vec!["line one\nline two".into()])],
            None,
        )
        .unwrap();
        let bytes = DocxRenderer::new().render(&report).unwrap();
        let document = read_entry(&bytes, "word/document.xml");
        assert!(document.contains("<w:br/>"));
        assert!(document.contains("line one"));
        assert!(document.contains("line two"));
    }
}
