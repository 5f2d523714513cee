//! # reportcraft
//!
//! Report rendering engine: takes one structured, user-authored report
//! (title, metadata, ordered sections of labeled fields or paragraphs,
//! optional logo image) and deterministically renders it into three
//! independent output encodings — PDF, DOCX and Markdown — plus lossless
//! round-trip serialization to and from a JSON draft.
//!
//! ## Core guarantees
//!
//! - **Semantic consistency**: all three renderers emit the same content,
//!   order and hierarchy from the same report.
//! - **Determinism**: identical reports yield byte-identical output in every
//!   format; no timestamps or generated identifiers are embedded.
//! - **Statelessness**: every operation is a pure transform of its inputs;
//!   nothing is retained between calls, so concurrent renders need no
//!   coordination.
//! - **Validated input**: a [`Report`] is only obtainable through its
//!   validating constructor; renderers and the draft codec trust it.
//!
//! ## Quick Start
//!
//! ```
//! use reportcraft::{Field, MarkdownRenderer, Report, ReportRenderer, Section};
//!
//! # fn main() -> reportcraft::Result<()> {
//! let report = Report::new(
//!     "Q1 Summary",
//!     "Alice",
//!     chrono::NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
//!     vec![Section::fields("Overview", vec![Field::new("Status", "Green")])],
//!     None,
//! )?;
//!
//! let renderer = MarkdownRenderer::new();
//! let bytes = renderer.render(&report)?;
//! assert_eq!(renderer.mime_type(), "text/markdown");
//! assert!(String::from_utf8_lossy(&bytes).contains("## Overview"));
//!
//! let draft = reportcraft::draft::serialize(&report)?;
//! assert_eq!(reportcraft::draft::deserialize(&draft)?, report);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Report data model and validation
pub mod report;

// Logo decoding and physical scaling
pub mod image;

// JSON draft codec and draft files
pub mod draft;

// Renderers (Markdown, PDF, DOCX)
pub mod render;

// Low-level PDF writing machinery
pub mod writer;

// Re-exports
pub use error::{Error, Result};
pub use render::{
    DocxRenderer, MarkdownRenderer, PdfRenderer, ReportRenderer, DOCX_MIME, MARKDOWN_MIME,
    PDF_MIME,
};
pub use report::{Field, Logo, Report, Section, SectionContent};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
