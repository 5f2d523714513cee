//! PDF renderer.
//!
//! Lays the report out with a fixed vertical flow: a cursor advances by
//! line height for each emitted element and a new page starts when the
//! cursor would cross the bottom margin. A field's label and value share
//! one baseline, so they can never be split across pages; a section heading
//! is only placed when at least one following body line still fits.
//! The logo is anchored at the top of the first page and the body cursor
//! starts below its reserved height.

use super::{check_section_cap, ReportRenderer, PDF_MIME};
use crate::error::{Error, Result};
use crate::image;
use crate::report::{Report, SectionContent};
use crate::writer::{
    ContentStreamBuilder, ImageData, PdfWriter, PdfWriterConfig, FONT_BOLD, FONT_REGULAR,
};

/// A4 page width in points.
const PAGE_WIDTH: f64 = 595.0;
/// A4 page height in points.
const PAGE_HEIGHT: f64 = 842.0;
/// Page margin on all sides, 2 cm in points.
const MARGIN: f64 = 56.7;

const TITLE_SIZE: f64 = 20.0;
const META_SIZE: f64 = 10.0;
const HEADING_SIZE: f64 = 14.0;
const BODY_SIZE: f64 = 11.0;

/// Line height multiplier.
const LINE_FACTOR: f64 = 1.3;
/// Vertical gap reserved below the logo.
const LOGO_GAP: f64 = 14.0;
/// Extra space above a section heading.
const HEADING_GAP: f64 = 8.0;
/// Average glyph advance as a fraction of the font size, used to estimate
/// line widths for wrapping without font metrics.
const AVG_GLYPH_FACTOR: f64 = 0.5;

/// Defensive cap on emitted pages.
const MAX_PAGES: usize = 1_000;

/// Renders a report to a paginated PDF byte stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    /// Create a PDF renderer.
    pub fn new() -> Self {
        Self
    }
}

impl ReportRenderer for PdfRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>> {
        check_section_cap(report)?;
        log::debug!(
            "rendering pdf: {} sections, logo: {}",
            report.sections().len(),
            report.logo().is_some()
        );

        let mut config = PdfWriterConfig::default().with_title(report.title());
        if !report.author().is_empty() {
            config = config.with_author(report.author());
        }
        let mut writer = PdfWriter::with_config(config);
        writer.register_font(FONT_REGULAR);
        writer.register_font(FONT_BOLD);

        // Decode and register the logo before any layout happens, so a bad
        // asset fails the render without producing partial output.
        let logo = match report.logo() {
            Some(logo) => {
                let scaled = image::scale(&logo.data, logo.width_cm)?;
                let width = scaled.width_points();
                let height = scaled.height_points();
                if !width.is_finite() || !height.is_finite() || height <= 0.0 {
                    return Err(Error::render(format!(
                        "logo layout produced a non-finite size ({width} x {height} pt)"
                    )));
                }
                let resource_id = writer.register_image(ImageData::from_bytes(&logo.data, scaled.format)?);
                Some((resource_id, width, height))
            },
            None => None,
        };

        let mut flow = PageFlow::new(writer);

        if let Some((resource_id, width, height)) = logo {
            flow.place_logo(&resource_id, width, height);
        }

        for line in wrap(report.title(), TITLE_SIZE) {
            flow.line(FONT_BOLD, TITLE_SIZE, &line)?;
        }
        let meta_line = if report.author().is_empty() {
            report.date().format("%Y-%m-%d").to_string()
        } else {
            format!("{} | {}", report.author(), report.date().format("%Y-%m-%d"))
        };
        flow.line(FONT_REGULAR, META_SIZE, &meta_line)?;
        flow.rule()?;

        for section in report.sections() {
            flow.section_heading(&section.heading)?;
            match &section.content {
                SectionContent::Fields(fields) => {
                    for field in fields {
                        flow.field_line(&field.label, &field.value)?;
                    }
                },
                SectionContent::Paragraphs(paragraphs) => {
                    for paragraph in paragraphs {
                        for source_line in paragraph.split('\n') {
                            for line in wrap(source_line, BODY_SIZE) {
                                flow.line(FONT_REGULAR, BODY_SIZE, &line)?;
                            }
                        }
                        flow.space(BODY_SIZE * 0.5);
                    }
                },
            }
        }

        flow.finish()
    }

    fn mime_type(&self) -> &'static str {
        PDF_MIME
    }

    fn file_extension(&self) -> &'static str {
        "pdf"
    }
}

/// Vertical flow state: the page under construction and its cursor.
struct PageFlow {
    writer: PdfWriter,
    content: ContentStreamBuilder,
    /// Top edge of the next line.
    cursor_y: f64,
}

impl PageFlow {
    fn new(writer: PdfWriter) -> Self {
        Self {
            writer,
            content: ContentStreamBuilder::new(),
            cursor_y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Draw the logo at the top-left anchor of the first page and reserve
    /// its height; the body cursor resumes below it.
    fn place_logo(&mut self, resource_id: &str, width: f64, height: f64) {
        let y = PAGE_HEIGHT - MARGIN - height;
        self.content.draw_image(resource_id, MARGIN, y, width, height);
        self.cursor_y = y - LOGO_GAP;
    }

    /// Start a new page when fewer than `needed` points remain.
    fn ensure_room(&mut self, needed: f64) -> Result<()> {
        if self.cursor_y - needed < MARGIN {
            self.break_page()?;
        }
        Ok(())
    }

    fn break_page(&mut self) -> Result<()> {
        let content = std::mem::take(&mut self.content);
        self.writer.add_page(PAGE_WIDTH, PAGE_HEIGHT, content);
        if self.writer.page_count() >= MAX_PAGES {
            return Err(Error::render(format!("output exceeds the {MAX_PAGES} page cap")));
        }
        self.cursor_y = PAGE_HEIGHT - MARGIN;
        Ok(())
    }

    /// Emit one line of text at the left margin and advance the cursor.
    fn line(&mut self, font: &str, size: f64, text: &str) -> Result<()> {
        let advance = size * LINE_FACTOR;
        self.ensure_room(advance)?;
        let baseline = self.cursor_y - size;
        self.content.set_font(font, size).text(text, MARGIN, baseline);
        self.cursor_y -= advance;
        Ok(())
    }

    /// Emit a section heading, keeping it together with at least one
    /// following body line.
    fn section_heading(&mut self, heading: &str) -> Result<()> {
        let lines = wrap(heading, HEADING_SIZE);
        let heading_height =
            HEADING_GAP + lines.len() as f64 * HEADING_SIZE * LINE_FACTOR;
        self.ensure_room(heading_height + BODY_SIZE * LINE_FACTOR)?;
        self.space(HEADING_GAP);
        for line in lines {
            self.line(FONT_BOLD, HEADING_SIZE, &line)?;
        }
        Ok(())
    }

    /// Emit a field as one shared baseline: bold label, regular value.
    /// Sharing the baseline is what keeps label and value on one page.
    fn field_line(&mut self, label: &str, value: &str) -> Result<()> {
        let advance = BODY_SIZE * LINE_FACTOR;
        self.ensure_room(advance)?;
        let baseline = self.cursor_y - BODY_SIZE;

        let label_text = format!("{label}:");
        self.content
            .set_font(FONT_BOLD, BODY_SIZE)
            .text(&label_text, MARGIN, baseline);

        let label_width = estimate_width(&label_text, BODY_SIZE) + BODY_SIZE * AVG_GLYPH_FACTOR;
        let value_text = value.replace('\n', " ");
        self.content
            .set_font(FONT_REGULAR, BODY_SIZE)
            .text(&value_text, MARGIN + label_width, baseline);

        self.cursor_y -= advance;
        Ok(())
    }

    /// Light separator rule below the metadata block.
    fn rule(&mut self) -> Result<()> {
        let advance = BODY_SIZE;
        self.ensure_room(advance)?;
        let y = self.cursor_y - advance * 0.5;
        self.content.horizontal_rule(MARGIN, PAGE_WIDTH - MARGIN, y, 0.5);
        self.cursor_y -= advance;
        Ok(())
    }

    /// Advance the cursor without emitting anything.
    fn space(&mut self, points: f64) {
        self.cursor_y -= points;
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        // Flush the page under construction; an all-empty document still
        // gets its single page.
        if !self.content.is_empty() || self.writer.page_count() == 0 {
            let content = std::mem::take(&mut self.content);
            self.writer.add_page(PAGE_WIDTH, PAGE_HEIGHT, content);
        }
        self.writer.finish()
    }
}

/// Estimate the rendered width of a string without font metrics.
fn estimate_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * AVG_GLYPH_FACTOR
}

/// Greedy word wrap against the printable width, using the same estimate.
fn wrap(text: &str, size: f64) -> Vec<String> {
    let max_width = PAGE_WIDTH - 2.0 * MARGIN;
    let max_chars = (max_width / (size * AVG_GLYPH_FACTOR)).floor().max(1.0) as usize;

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
