//! PDF document writer.
//!
//! Assembles a complete document from finished page content streams:
//! header, body objects, cross-reference table and trailer. Font and image
//! resources are registered up front and shared by every page. All object
//! ordering is deterministic, so identical input produces identical bytes;
//! no timestamps or generated identifiers are embedded.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;

use super::content_stream::ContentStreamBuilder;
use super::image_xobject::ImageData;
use super::object::{Object, ObjectRef};
use super::object_serializer::ObjectSerializer;
use crate::error::Result;

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version (e.g. "1.7")
    pub version: String,
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// Whether to compress content streams with FlateDecode
    pub compress: bool,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            title: None,
            author: None,
            subject: None,
            creator: Some("reportcraft".to_string()),
            compress: false,
        }
    }
}

impl PdfWriterConfig {
    /// Set document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Enable or disable content stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Compress data for the FlateDecode filter.
fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

struct PageData {
    width: f64,
    height: f64,
    content: Vec<u8>,
}

struct RegisteredImage {
    resource_id: String,
    data: ImageData,
}

/// PDF document writer.
pub struct PdfWriter {
    config: PdfWriterConfig,
    pages: Vec<PageData>,
    /// Font names used by the document, ordered for deterministic emission
    fonts: BTreeSet<String>,
    images: Vec<RegisteredImage>,
}

impl PdfWriter {
    /// Create a new PDF writer with default config.
    pub fn new() -> Self {
        Self::with_config(PdfWriterConfig::default())
    }

    /// Create a PDF writer with custom config.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            fonts: BTreeSet::new(),
            images: Vec::new(),
        }
    }

    /// Register a base font by name (e.g. `Helvetica-Bold`).
    ///
    /// The name doubles as the resource key used by `Tf` operators.
    pub fn register_font(&mut self, name: &str) {
        self.fonts.insert(name.to_string());
    }

    /// Register an image for embedding; returns its XObject resource ID
    /// (e.g. `Im1`) for use with `Do` operators.
    pub fn register_image(&mut self, data: ImageData) -> String {
        let resource_id = format!("Im{}", self.images.len() + 1);
        self.images.push(RegisteredImage {
            resource_id: resource_id.clone(),
            data,
        });
        resource_id
    }

    /// Append a finished page.
    pub fn add_page(&mut self, width: f64, height: f64, content: ContentStreamBuilder) {
        self.pages.push(PageData {
            width,
            height,
            content: content.build(),
        });
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Build the complete PDF document.
    pub fn finish(self) -> Result<Vec<u8>> {
        let serializer = ObjectSerializer::new();
        let mut output = Vec::new();
        let mut xref_offsets: Vec<(u32, usize)> = Vec::new();

        writeln!(output, "%PDF-{}", self.config.version)?;
        // Binary marker so transports treat the file as binary
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        // Fixed id layout: catalog, page tree, fonts, images (+ soft masks),
        // then per page (page, content), info last.
        let catalog_id = 1u32;
        let pages_root_id = 2u32;
        let mut next_id = 3u32;
        let mut alloc = || {
            let id = next_id;
            next_id += 1;
            id
        };

        let font_ids: BTreeMap<&str, u32> =
            self.fonts.iter().map(|name| (name.as_str(), alloc())).collect();

        let mut image_ids: Vec<(u32, Option<u32>)> = Vec::with_capacity(self.images.len());
        for image in &self.images {
            let xobject_id = alloc();
            let mask_id = image.data.has_soft_mask().then(&mut alloc);
            image_ids.push((xobject_id, mask_id));
        }

        let page_ids: Vec<(u32, u32)> =
            self.pages.iter().map(|_| (alloc(), alloc())).collect();
        let info_id = alloc();

        // Shared resources dictionary
        let font_resources: HashMap<String, Object> = font_ids
            .iter()
            .map(|(name, id)| (name.to_string(), Object::Reference(ObjectRef::new(*id, 0))))
            .collect();
        let xobject_resources: HashMap<String, Object> = self
            .images
            .iter()
            .zip(&image_ids)
            .map(|(image, (id, _))| {
                (image.resource_id.clone(), Object::Reference(ObjectRef::new(*id, 0)))
            })
            .collect();
        let mut resource_entries = vec![("Font", Object::Dictionary(font_resources))];
        if !xobject_resources.is_empty() {
            resource_entries.push(("XObject", Object::Dictionary(xobject_resources)));
        }
        let resources = ObjectSerializer::dict(resource_entries);

        // Catalog and page tree
        let catalog_obj = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Catalog")),
            ("Pages", ObjectSerializer::reference(pages_root_id, 0)),
        ]);
        let pages_obj = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Pages")),
            (
                "Kids",
                Object::Array(
                    page_ids
                        .iter()
                        .map(|(page_id, _)| ObjectSerializer::reference(*page_id, 0))
                        .collect(),
                ),
            ),
            ("Count", ObjectSerializer::integer(self.pages.len() as i64)),
        ]);

        xref_offsets.push((catalog_id, output.len()));
        output.extend_from_slice(&serializer.serialize_indirect(catalog_id, 0, &catalog_obj));
        xref_offsets.push((pages_root_id, output.len()));
        output.extend_from_slice(&serializer.serialize_indirect(pages_root_id, 0, &pages_obj));

        // Font objects
        for (name, id) in &font_ids {
            let font_obj = ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Font")),
                ("Subtype", ObjectSerializer::name("Type1")),
                ("BaseFont", ObjectSerializer::name(name)),
                ("Encoding", ObjectSerializer::name("WinAnsiEncoding")),
            ]);
            xref_offsets.push((*id, output.len()));
            output.extend_from_slice(&serializer.serialize_indirect(*id, 0, &font_obj));
        }

        // Image XObjects (and their soft masks)
        for (image, (xobject_id, mask_id)) in self.images.iter().zip(&image_ids) {
            let mask_ref = mask_id.map(|id| ObjectRef::new(id, 0));
            let stream = image.data.to_stream(mask_ref);
            xref_offsets.push((*xobject_id, output.len()));
            output.extend_from_slice(&serializer.serialize_indirect(*xobject_id, 0, &stream));

            if let (Some(mask_id), Some(mask_stream)) = (mask_id, image.data.soft_mask_stream()) {
                xref_offsets.push((*mask_id, output.len()));
                output.extend_from_slice(&serializer.serialize_indirect(*mask_id, 0, &mask_stream));
            }
        }

        // Page and content objects
        for (page, (page_id, content_id)) in self.pages.into_iter().zip(&page_ids) {
            let (content_bytes, compressed) = if self.config.compress {
                match compress_data(&page.content) {
                    Ok(compressed) => (compressed, true),
                    Err(_) => (page.content, false),
                }
            } else {
                (page.content, false)
            };

            let mut content_dict = HashMap::new();
            content_dict.insert("Length".to_string(), Object::Integer(content_bytes.len() as i64));
            if compressed {
                content_dict.insert("Filter".to_string(), Object::Name("FlateDecode".to_string()));
            }

            let page_obj = ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Page")),
                ("Parent", ObjectSerializer::reference(pages_root_id, 0)),
                ("MediaBox", ObjectSerializer::rect(0.0, 0.0, page.width, page.height)),
                ("Contents", ObjectSerializer::reference(*content_id, 0)),
                ("Resources", resources.clone()),
            ]);

            xref_offsets.push((*page_id, output.len()));
            output.extend_from_slice(&serializer.serialize_indirect(*page_id, 0, &page_obj));
            xref_offsets.push((*content_id, output.len()));
            output.extend_from_slice(&serializer.serialize_indirect(
                *content_id,
                0,
                &Object::Stream {
                    dict: content_dict,
                    data: bytes::Bytes::from(content_bytes),
                },
            ));
        }

        // Info dictionary
        let mut info_entries = Vec::new();
        if let Some(title) = &self.config.title {
            info_entries.push(("Title", ObjectSerializer::string(title)));
        }
        if let Some(author) = &self.config.author {
            info_entries.push(("Author", ObjectSerializer::string(author)));
        }
        if let Some(subject) = &self.config.subject {
            info_entries.push(("Subject", ObjectSerializer::string(subject)));
        }
        if let Some(creator) = &self.config.creator {
            info_entries.push(("Creator", ObjectSerializer::string(creator)));
        }
        let info_obj = ObjectSerializer::dict(info_entries);
        xref_offsets.push((info_id, output.len()));
        output.extend_from_slice(&serializer.serialize_indirect(info_id, 0, &info_obj));

        // Cross-reference table
        let xref_start = output.len();
        writeln!(output, "xref")?;
        writeln!(output, "0 {}", next_id)?;
        writeln!(output, "0000000000 65535 f ")?;
        xref_offsets.sort_by_key(|(id, _)| *id);
        for (_, offset) in &xref_offsets {
            writeln!(output, "{:010} 00000 n ", offset)?;
        }

        let trailer = ObjectSerializer::dict(vec![
            ("Size", ObjectSerializer::integer(next_id as i64)),
            ("Root", ObjectSerializer::reference(catalog_id, 0)),
            ("Info", ObjectSerializer::reference(info_id, 0)),
        ]);
        writeln!(output, "trailer")?;
        output.extend_from_slice(&serializer.serialize(&trailer));
        writeln!(output)?;
        writeln!(output, "startxref")?;
        writeln!(output, "{}", xref_start)?;
        write!(output, "%%EOF")?;

        Ok(output)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}
