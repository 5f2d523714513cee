//! Markdown renderer.
//!
//! Emits the title as a top-level heading, an author/date sub-line, then
//! each section as a second-level heading followed by definition-style
//! field lines or paragraphs. User text is escaped so field values can
//! never alter the document structure. The logo, when present, is validated
//! and referenced by a relative image tag; its bytes are not embedded.

use super::{check_section_cap, ReportRenderer, MARKDOWN_MIME};
use crate::error::Result;
use crate::report::{Report, SectionContent};

/// Relative path used for the logo image tag.
const LOGO_PATH: &str = "logo.png";

/// Markdown characters escaped in user text.
const ESCAPED: &[char] = &['\\', '*', '_', '`', '#', '[', ']'];

/// Renders a report to UTF-8 Markdown text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    /// Create a Markdown renderer.
    pub fn new() -> Self {
        Self
    }
}

impl ReportRenderer for MarkdownRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>> {
        check_section_cap(report)?;
        log::debug!(
            "rendering markdown: {} sections, logo: {}",
            report.sections().len(),
            report.logo().is_some()
        );

        // The logo is only referenced, but its bytes must still be decodable.
        if let Some(logo) = report.logo() {
            crate::image::scale(&logo.data, logo.width_cm)?;
        }

        let mut out = String::new();

        out.push_str("# ");
        out.push_str(&escape(report.title()));
        out.push('\n');

        if report.author().is_empty() {
            out.push_str(&report.date().format("%Y-%m-%d").to_string());
        } else {
            out.push_str(&escape(report.author()));
            out.push_str(" | ");
            out.push_str(&report.date().format("%Y-%m-%d").to_string());
        }
        out.push('\n');

        if report.logo().is_some() {
            out.push('\n');
            out.push_str(&format!("![logo]({LOGO_PATH})\n"));
        }

        for section in report.sections() {
            out.push('\n');
            out.push_str("## ");
            out.push_str(&escape(&section.heading));
            out.push('\n');

            match &section.content {
                SectionContent::Fields(fields) => {
                    for field in fields {
                        out.push_str("**");
                        out.push_str(&escape(&field.label));
                        out.push_str(":** ");
                        out.push_str(&escape(&field.value));
                        out.push('\n');
                    }
                },
                SectionContent::Paragraphs(paragraphs) => {
                    for (idx, paragraph) in paragraphs.iter().enumerate() {
                        if idx > 0 {
                            out.push('\n');
                        }
                        out.push_str(&escape(paragraph));
                        out.push('\n');
                    }
                },
            }
        }

        Ok(out.into_bytes())
    }

    fn mime_type(&self) -> &'static str {
        MARKDOWN_MIME
    }

    fn file_extension(&self) -> &'static str {
        "md"
    }
}

/// Backslash-escape Markdown-significant characters.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if ESCAPED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
