//! Report renderers.
//!
//! Each renderer is a pure transform of a validated [`Report`] into one
//! target byte-stream encoding, exposed behind the common
//! [`ReportRenderer`] capability so callers select a format and the rest of
//! the contract (content, order, hierarchy, determinism) stays identical.

mod docx;
mod markdown;
mod pdf;

pub use docx::DocxRenderer;
pub use markdown::MarkdownRenderer;
pub use pdf::PdfRenderer;

use crate::error::{Error, Result};
use crate::report::Report;

/// MIME type of Markdown output.
pub const MARKDOWN_MIME: &str = "text/markdown";

/// MIME type of PDF output.
pub const PDF_MIME: &str = "application/pdf";

/// MIME type of DOCX output.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Defensive cap on the number of sections a single render accepts.
///
/// Surfaces a render error instead of exhausting memory on a hostile input.
pub const MAX_SECTIONS: usize = 512;

/// A component converting a report into one target byte-stream encoding.
pub trait ReportRenderer {
    /// Render the report into this format's byte stream.
    ///
    /// Deterministic: identical reports yield byte-identical output. On
    /// failure no partial byte stream is produced.
    fn render(&self, report: &Report) -> Result<Vec<u8>>;

    /// MIME type callers should tag the byte stream with.
    fn mime_type(&self) -> &'static str;

    /// Conventional file extension for this format.
    fn file_extension(&self) -> &'static str;
}

/// Shared section-count guard used by every renderer.
fn check_section_cap(report: &Report) -> Result<()> {
    if report.sections().len() > MAX_SECTIONS {
        return Err(Error::render(format!(
            "report has {} sections, exceeds the {MAX_SECTIONS} section cap",
            report.sections().len()
        )));
    }
    Ok(())
}
