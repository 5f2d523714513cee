//! Logo decoding and physical scaling.
//!
//! Converts a raw image byte blob plus a target physical width into the
//! pixel and native-unit dimensions the renderers need, preserving the
//! image's aspect ratio. Only PNG and JPEG uploads are accepted.

use crate::error::{Error, Result};

/// Maximum accepted pixel dimension on either axis.
///
/// Guards against resource exhaustion from maliciously large uploads.
pub const MAX_PIXEL_DIM: u32 = 10_000;

/// Points per centimeter (72 points per inch).
pub const POINTS_PER_CM: f64 = 72.0 / 2.54;

/// English Metric Units per centimeter (OOXML drawing sizes).
pub const EMU_PER_CM: i64 = 360_000;

/// Fixed raster mapping used when a layout engine wants pixels.
pub const RASTER_DPI: f64 = 96.0;

/// Source encoding of an accepted logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoFormat {
    /// PNG image
    Png,
    /// JPEG image
    Jpeg,
}

impl LogoFormat {
    /// File extension used when the logo is written into a package.
    pub fn extension(&self) -> &'static str {
        match self {
            LogoFormat::Png => "png",
            LogoFormat::Jpeg => "jpeg",
        }
    }

    /// MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            LogoFormat::Png => "image/png",
            LogoFormat::Jpeg => "image/jpeg",
        }
    }
}

/// A decoded logo with its physical target size resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledImage {
    /// Source pixel width.
    pub px_width: u32,
    /// Source pixel height.
    pub px_height: u32,
    /// Target physical width in centimeters.
    pub width_cm: f64,
    /// Proportional physical height in centimeters.
    pub height_cm: f64,
    /// Detected source encoding.
    pub format: LogoFormat,
}

impl ScaledImage {
    /// Target width in PDF points.
    pub fn width_points(&self) -> f64 {
        self.width_cm * POINTS_PER_CM
    }

    /// Target height in PDF points.
    pub fn height_points(&self) -> f64 {
        self.height_cm * POINTS_PER_CM
    }

    /// Target width in EMU.
    pub fn width_emu(&self) -> i64 {
        (self.width_cm * EMU_PER_CM as f64).round() as i64
    }

    /// Target height in EMU.
    pub fn height_emu(&self) -> i64 {
        (self.height_cm * EMU_PER_CM as f64).round() as i64
    }

    /// Target width in pixels at the fixed raster DPI.
    pub fn width_px(&self) -> u32 {
        (self.width_cm * RASTER_DPI / 2.54).round() as u32
    }

    /// Target height in pixels at the fixed raster DPI.
    pub fn height_px(&self) -> u32 {
        (self.height_cm * RASTER_DPI / 2.54).round() as u32
    }
}

/// Decode logo bytes and resolve the aspect-preserving physical size for a
/// requested width.
///
/// # Errors
///
/// [`Error::InvalidAsset`] when the bytes are not decodable PNG or JPEG, the
/// image is empty, or either pixel dimension exceeds [`MAX_PIXEL_DIM`].
pub fn scale(data: &[u8], width_cm: f64) -> Result<ScaledImage> {
    let format = sniff_format(data)?;

    let decoded = image::load_from_memory_with_format(data, format.into())
        .map_err(|e| Error::asset(format!("failed to decode image: {e}")))?;

    use image::GenericImageView;
    let (px_width, px_height) = decoded.dimensions();

    if px_width == 0 || px_height == 0 {
        return Err(Error::asset("image has a zero dimension"));
    }
    if px_width > MAX_PIXEL_DIM || px_height > MAX_PIXEL_DIM {
        return Err(Error::asset(format!(
            "image is {px_width}x{px_height} px, exceeds the {MAX_PIXEL_DIM} px bound"
        )));
    }

    let ratio = px_height as f64 / px_width as f64;
    Ok(ScaledImage {
        px_width,
        px_height,
        width_cm,
        height_cm: width_cm * ratio,
        format,
    })
}

/// Identify the container from magic bytes; only PNG and JPEG pass.
fn sniff_format(data: &[u8]) -> Result<LogoFormat> {
    if data.len() >= 8 && &data[0..8] == b"\x89PNG\r\n\x1a\n" {
        return Ok(LogoFormat::Png);
    }
    if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        return Ok(LogoFormat::Jpeg);
    }
    Err(Error::asset("unrecognized image format, expected PNG or JPEG"))
}

impl From<LogoFormat> for image::ImageFormat {
    fn from(format: LogoFormat) -> Self {
        match format {
            LogoFormat::Png => image::ImageFormat::Png,
            LogoFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::png_bytes;
    use super::*;

    #[test]
    fn test_scale_preserves_aspect_ratio() {
        let scaled = scale(&png_bytes(200, 100), 4.0).unwrap();
        assert_eq!(scaled.px_width, 200);
        assert_eq!(scaled.px_height, 100);
        assert!((scaled.height_cm - 2.0).abs() < 1e-9);
        assert_eq!(scaled.format, LogoFormat::Png);
    }

    #[test]
    fn test_unit_conversions() {
        let scaled = scale(&png_bytes(100, 100), 2.54).unwrap();
        assert!((scaled.width_points() - 72.0).abs() < 1e-9);
        assert_eq!(scaled.width_emu(), 914_400);
        assert_eq!(scaled.width_px(), 96);
    }

    #[test]
    fn test_undecodable_bytes_rejected() {
        let err = scale(b"definitely not an image", 3.0).unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidAsset(_)));
    }

    #[test]
    fn test_truncated_png_rejected() {
        let mut data = png_bytes(10, 10);
        data.truncate(20);
        let err = scale(&data, 3.0).unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidAsset(_)));
    }

    #[test]
    fn test_jpeg_sniffing() {
        let img = image::RgbImage::from_pixel(8, 4, image::Rgb([200, 0, 0]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();
        let scaled = scale(&out.into_inner(), 2.0).unwrap();
        assert_eq!(scaled.format, LogoFormat::Jpeg);
        assert!((scaled.height_cm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_format_rejected() {
        // GIF magic bytes
        let err = scale(b"GIF89a\x00\x00\x00\x00", 2.0).unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidAsset(_)));
    }
}
