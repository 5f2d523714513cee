//! Image XObjects for PDF embedding.
//!
//! JPEG data is embedded as-is with the DCTDecode filter; PNG data is
//! decoded to raw samples and re-compressed with Flate, with the alpha
//! channel split off into a soft mask.

use std::collections::HashMap;
use std::io::Write;

use super::object::Object;
use crate::error::{Error, Result};
use crate::image::LogoFormat;

/// Color space of embedded image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale (1 component per pixel)
    DeviceGray,
    /// RGB color (3 components per pixel)
    DeviceRGB,
    /// CMYK color (4 components per pixel)
    DeviceCMYK,
}

impl ColorSpace {
    /// PDF name of this color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }
}

/// Filter applied to the embedded sample data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    /// DCTDecode (JPEG pass-through)
    Dct,
    /// FlateDecode (zlib-compressed raw samples)
    Flate,
}

/// Image data prepared for embedding as a PDF XObject.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    color_space: ColorSpace,
    filter: Filter,
    data: Vec<u8>,
    soft_mask: Option<Vec<u8>>,
}

impl ImageData {
    /// Prepare already-validated logo bytes for embedding.
    ///
    /// The caller is expected to have run the bytes through
    /// [`crate::image::scale`] first; decoding failures here still surface
    /// as [`Error::InvalidAsset`].
    pub fn from_bytes(data: &[u8], format: LogoFormat) -> Result<Self> {
        match format {
            LogoFormat::Jpeg => Self::from_jpeg(data),
            LogoFormat::Png => Self::from_png(data),
        }
    }

    /// JPEG pass-through: keep the compressed data, read dimensions and
    /// component count from the SOF marker.
    fn from_jpeg(data: &[u8]) -> Result<Self> {
        let (width, height, color_space) = parse_jpeg_header(data)?;
        Ok(Self {
            width,
            height,
            color_space,
            filter: Filter::Dct,
            data: data.to_vec(),
            soft_mask: None,
        })
    }

    /// PNG: decode to raw samples, split alpha, compress with Flate.
    fn from_png(data: &[u8]) -> Result<Self> {
        use image::GenericImageView;

        let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
            .map_err(|e| Error::asset(format!("failed to decode PNG: {e}")))?;
        let (width, height) = img.dimensions();

        let (color_space, pixels, alpha) = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 => {
                (ColorSpace::DeviceGray, img.to_luma8().into_raw(), None)
            },
            image::ColorType::La8 | image::ColorType::La16 => {
                let la = img.to_luma_alpha8();
                let mut gray = Vec::with_capacity((width * height) as usize);
                let mut mask = Vec::with_capacity((width * height) as usize);
                for pixel in la.pixels() {
                    gray.push(pixel.0[0]);
                    mask.push(pixel.0[1]);
                }
                (ColorSpace::DeviceGray, gray, Some(mask))
            },
            image::ColorType::Rgba8 | image::ColorType::Rgba16 => {
                let rgba = img.to_rgba8();
                let mut rgb = Vec::with_capacity((width * height * 3) as usize);
                let mut mask = Vec::with_capacity((width * height) as usize);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[0..3]);
                    mask.push(pixel.0[3]);
                }
                (ColorSpace::DeviceRGB, rgb, Some(mask))
            },
            _ => (ColorSpace::DeviceRGB, img.to_rgb8().into_raw(), None),
        };

        Ok(Self {
            width,
            height,
            color_space,
            filter: Filter::Flate,
            data: compress(&pixels)?,
            soft_mask: alpha.map(|mask| compress(&mask)).transpose()?,
        })
    }

    /// Build the image XObject stream.
    ///
    /// `soft_mask_ref` is the indirect reference of the mask XObject, when
    /// one exists.
    pub fn to_stream(&self, soft_mask_ref: Option<super::object::ObjectRef>) -> Object {
        let mut dict = HashMap::new();
        dict.insert("Type".to_string(), Object::Name("XObject".to_string()));
        dict.insert("Subtype".to_string(), Object::Name("Image".to_string()));
        dict.insert("Width".to_string(), Object::Integer(self.width as i64));
        dict.insert("Height".to_string(), Object::Integer(self.height as i64));
        dict.insert(
            "ColorSpace".to_string(),
            Object::Name(self.color_space.pdf_name().to_string()),
        );
        dict.insert("BitsPerComponent".to_string(), Object::Integer(8));
        dict.insert(
            "Filter".to_string(),
            Object::Name(
                match self.filter {
                    Filter::Dct => "DCTDecode",
                    Filter::Flate => "FlateDecode",
                }
                .to_string(),
            ),
        );
        if let Some(mask_ref) = soft_mask_ref {
            dict.insert("SMask".to_string(), Object::Reference(mask_ref));
        }

        Object::Stream {
            dict,
            data: bytes::Bytes::from(self.data.clone()),
        }
    }

    /// Build the soft-mask XObject stream, if this image carries alpha.
    pub fn soft_mask_stream(&self) -> Option<Object> {
        self.soft_mask.as_ref().map(|mask| {
            let mut dict = HashMap::new();
            dict.insert("Type".to_string(), Object::Name("XObject".to_string()));
            dict.insert("Subtype".to_string(), Object::Name("Image".to_string()));
            dict.insert("Width".to_string(), Object::Integer(self.width as i64));
            dict.insert("Height".to_string(), Object::Integer(self.height as i64));
            dict.insert("ColorSpace".to_string(), Object::Name("DeviceGray".to_string()));
            dict.insert("BitsPerComponent".to_string(), Object::Integer(8));
            dict.insert("Filter".to_string(), Object::Name("FlateDecode".to_string()));
            Object::Stream {
                dict,
                data: bytes::Bytes::from(mask.clone()),
            }
        })
    }

    /// Whether this image carries an alpha soft mask.
    pub fn has_soft_mask(&self) -> bool {
        self.soft_mask.is_some()
    }
}

/// Parse a JPEG header for dimensions and component count.
fn parse_jpeg_header(data: &[u8]) -> Result<(u32, u32, ColorSpace)> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(Error::asset("not a valid JPEG"));
    }

    let mut pos = 2;
    while pos < data.len() - 1 {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = data[pos + 1];
        pos += 2;

        if marker == 0xFF || marker == 0x00 {
            continue;
        }

        // SOF markers carry the frame dimensions
        if matches!(
            marker,
            0xC0 | 0xC1 | 0xC2 | 0xC3 | 0xC5 | 0xC6 | 0xC7 | 0xC9 | 0xCA | 0xCB | 0xCD | 0xCE | 0xCF
        ) {
            if pos + 7 > data.len() {
                return Err(Error::asset("truncated JPEG header"));
            }
            let height = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as u32;
            let width = u16::from_be_bytes([data[pos + 5], data[pos + 6]]) as u32;
            let color_space = match data[pos + 7] {
                1 => ColorSpace::DeviceGray,
                4 => ColorSpace::DeviceCMYK,
                _ => ColorSpace::DeviceRGB,
            };
            return Ok((width, height, color_space));
        }

        if pos + 2 > data.len() {
            break;
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        pos += length;
    }

    Err(Error::asset("could not find JPEG dimensions"))
}

/// Compress sample data with zlib for FlateDecode.
fn compress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| Error::asset(format!("compressing image data failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([1, 2, 3]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_becomes_flate_rgb() {
        let data = ImageData::from_bytes(&rgb_png(16, 8), LogoFormat::Png).unwrap();
        assert_eq!(data.width, 16);
        assert_eq!(data.height, 8);
        assert_eq!(data.color_space, ColorSpace::DeviceRGB);
        assert!(!data.has_soft_mask());

        let stream = data.to_stream(None);
        let text = super::super::ObjectSerializer::new().serialize_to_string(&stream);
        assert!(text.contains("/Filter /FlateDecode"));
        assert!(text.contains("/Width 16"));
    }

    #[test]
    fn test_rgba_png_gets_soft_mask() {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([9, 9, 9, 128]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();

        let data = ImageData::from_bytes(&out.into_inner(), LogoFormat::Png).unwrap();
        assert!(data.has_soft_mask());
        assert!(data.soft_mask_stream().is_some());
    }

    #[test]
    fn test_jpeg_passthrough() {
        let img = image::RgbImage::from_pixel(12, 6, image::Rgb([100, 150, 200]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();
        let jpeg = out.into_inner();

        let data = ImageData::from_bytes(&jpeg, LogoFormat::Jpeg).unwrap();
        assert_eq!((data.width, data.height), (12, 6));
        assert_eq!(data.filter, Filter::Dct);
        // Pass-through keeps the original bytes
        assert_eq!(data.data, jpeg);
    }

    #[test]
    fn test_invalid_jpeg_rejected() {
        let err = ImageData::from_bytes(&[0x00, 0x01], LogoFormat::Jpeg).unwrap_err();
        assert!(matches!(err, Error::InvalidAsset(_)));
    }
}
