//! Low-level PDF writing machinery.
//!
//! Assembles PDF documents from scratch: object model, object serialization,
//! content stream operators, image XObjects and the document writer that
//! ties them together with a cross-reference table and trailer. The layout
//! policy lives above this layer in [`crate::render::pdf`]; this module only
//! knows how to emit what it is told.

mod content_stream;
mod image_xobject;
mod object;
mod object_serializer;
mod pdf_writer;

pub use content_stream::{ContentStreamBuilder, ContentStreamOp};
pub use image_xobject::ImageData;
pub use object::{Object, ObjectRef};
pub use object_serializer::ObjectSerializer;
pub use pdf_writer::{PdfWriter, PdfWriterConfig};

/// Base font used for regular text (Type1, WinAnsi encoding).
pub const FONT_REGULAR: &str = "Helvetica";

/// Base font used for bold text.
pub const FONT_BOLD: &str = "Helvetica-Bold";
