//! Image handling for PDF documents (school logos on certificates)

use crate::{PdfError, Result};
use image::{DynamicImage, GenericImageView};
use lopdf::{Dictionary, Object, Stream};
use std::io::Write;

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Detected image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Image scaling mode for insert_image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageScaleMode {
    /// Stretch to exact dimensions
    #[default]
    Stretch,
    /// Fit within bounding box, preserving aspect ratio
    FitBox,
}

/// Calculate display dimensions in points for the scaling mode
pub fn calculate_scaled_dimensions(
    original_width: u32,
    original_height: u32,
    target_width: f64,
    target_height: f64,
    mode: ImageScaleMode,
) -> (f64, f64) {
    match mode {
        ImageScaleMode::Stretch => (target_width, target_height),
        ImageScaleMode::FitBox => {
            if original_width == 0 || original_height == 0 {
                return (0.0, 0.0);
            }
            let scale = (target_width / original_width as f64)
                .min(target_height / original_height as f64);
            (
                original_width as f64 * scale,
                original_height as f64 * scale,
            )
        }
    }
}

/// Detect image format from magic bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(ImageFormat::Jpeg);
    }
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(ImageFormat::Png);
    }
    Err(PdfError::ImageError("Unknown image format".to_string()))
}

/// Image XObject ready for embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// "DeviceRGB" or "DeviceGray"
    pub color_space: &'static str,
    /// "DCTDecode" for JPEG passthrough, "FlateDecode" for decoded PNG
    pub filter: &'static str,
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Build an XObject from JPEG or PNG bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match detect_format(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png => Self::from_png(data),
        }
    }

    /// JPEG data is embedded as-is with DCTDecode
    fn from_jpeg(data: &[u8]) -> Result<Self> {
        let (width, height, components) = jpeg_frame_info(data)?;
        Ok(Self {
            width,
            height,
            color_space: if components == 1 {
                "DeviceGray"
            } else {
                "DeviceRGB"
            },
            filter: "DCTDecode",
            data: data.to_vec(),
        })
    }

    /// PNG data is decoded, flattened onto white and deflated
    fn from_png(data: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(data)?;
        let (width, height) = decoded.dimensions();
        let (raw, color_space) = flatten_on_white(&decoded);

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw)?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            color_space,
            filter: "FlateDecode",
            data,
        })
    }

    /// Convert to lopdf Stream object
    pub fn to_pdf_stream(&self) -> Stream {
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(self.width as i64)),
            ("Height", Object::Integer(self.height as i64)),
            (
                "ColorSpace",
                Object::Name(self.color_space.as_bytes().to_vec()),
            ),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(self.filter.as_bytes().to_vec())),
        ]);
        Stream::new(dict, self.data.clone())
    }
}

/// Blend any alpha channel against a white page background
fn flatten_on_white(image: &DynamicImage) -> (Vec<u8>, &'static str) {
    let blend = |value: u8, alpha: u8| -> u8 {
        let a = alpha as f32 / 255.0;
        (value as f32 * a + 255.0 * (1.0 - a)) as u8
    };

    if !image.color().has_color() {
        let gray = image.to_luma_alpha8();
        let raw: Vec<u8> = gray.pixels().map(|p| blend(p[0], p[1])).collect();
        return (raw, "DeviceGray");
    }

    let rgba = image.to_rgba8();
    let mut raw = Vec::with_capacity(rgba.len() / 4 * 3);
    for p in rgba.pixels() {
        raw.extend_from_slice(&[blend(p[0], p[3]), blend(p[1], p[3]), blend(p[2], p[3])]);
    }
    (raw, "DeviceRGB")
}

/// Read (width, height, components) from the first JPEG SOF segment
fn jpeg_frame_info(data: &[u8]) -> Result<(u32, u32, u8)> {
    let mut i = 2;
    while i + 9 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        // SOF0..SOF15 except DHT (C4), JPG (C8) and DAC (CC)
        if (0xC0..=0xCF).contains(&marker) && ![0xC4, 0xC8, 0xCC].contains(&marker) {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            return Ok((width, height, data[i + 9]));
        }
        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if length < 2 {
            break;
        }
        i += 2 + length;
    }
    Err(PdfError::ImageError("Could not parse JPEG info".to_string()))
}

/// Generate operators to draw image at position
///
/// `x`/`y` are PDF coordinates of the lower-left corner.
pub fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    format!("q\n{width} 0 0 {height} {x} {y} cm\n/{image_name} Do\nQ\n").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_jpeg() -> Vec<u8> {
        vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xC0, // SOF0
            0x00, 0x11, // Length
            0x08, // Precision
            0x00, 0x64, // Height (100)
            0x00, 0xC8, // Width (200)
            0x03, // Components
            0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01, 0xFF, 0xD9,
        ]
    }

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(&minimal_jpeg()).unwrap(), ImageFormat::Jpeg);
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_format(&png).unwrap(), ImageFormat::Png);
        assert!(detect_format(&[0u8; 8]).is_err());
        assert!(detect_format(&[0xFF, 0xD8]).is_err());
    }

    #[test]
    fn test_jpeg_passthrough() {
        let xobject = ImageXObject::from_bytes(&minimal_jpeg()).unwrap();
        assert_eq!((xobject.width, xobject.height), (200, 100));
        assert_eq!(xobject.color_space, "DeviceRGB");
        assert_eq!(xobject.filter, "DCTDecode");
        assert_eq!(xobject.data, minimal_jpeg());
    }

    #[test]
    fn test_jpeg_without_frame_is_rejected() {
        let data = vec![0xFF, 0xD8, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(jpeg_frame_info(&data).is_err());
    }

    #[test]
    fn test_png_rgba_is_flattened() {
        let mut rgba = image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, image::Rgba([10, 20, 30, 255]));
        let png = png_bytes(DynamicImage::ImageRgba8(rgba));

        let xobject = ImageXObject::from_bytes(&png).unwrap();
        assert_eq!((xobject.width, xobject.height), (2, 1));
        assert_eq!(xobject.color_space, "DeviceRGB");
        assert_eq!(xobject.filter, "FlateDecode");

        let (raw, _) = flatten_on_white(&image::load_from_memory(&png).unwrap());
        assert_eq!(raw, vec![255, 255, 255, 10, 20, 30]);
    }

    #[test]
    fn test_png_gray() {
        let gray = image::GrayImage::from_pixel(3, 3, image::Luma([128]));
        let png = png_bytes(DynamicImage::ImageLuma8(gray));
        let xobject = ImageXObject::from_bytes(&png).unwrap();
        assert_eq!(xobject.color_space, "DeviceGray");
    }

    #[test]
    fn test_to_pdf_stream() {
        let stream = ImageXObject::from_bytes(&minimal_jpeg())
            .unwrap()
            .to_pdf_stream();
        let dict = &stream.dict;
        assert_eq!(dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Image");
        assert_eq!(dict.get(b"Width").unwrap().as_i64().unwrap(), 200);
        assert_eq!(dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
    }

    #[test]
    fn test_generate_image_operators() {
        let ops = String::from_utf8(generate_image_operators("Im1", 100.0, 200.0, 50.0, 75.0))
            .unwrap();
        assert!(ops.contains("50 0 0 75 100 200 cm"));
        assert!(ops.contains("/Im1 Do"));
    }

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(
            calculate_scaled_dimensions(800, 600, 100.0, 200.0, ImageScaleMode::Stretch),
            (100.0, 200.0)
        );
        assert_eq!(
            calculate_scaled_dimensions(800, 600, 100.0, 200.0, ImageScaleMode::FitBox),
            (100.0, 75.0)
        );
        assert_eq!(
            calculate_scaled_dimensions(600, 800, 200.0, 100.0, ImageScaleMode::FitBox),
            (75.0, 100.0)
        );
        assert_eq!(
            calculate_scaled_dimensions(0, 800, 200.0, 100.0, ImageScaleMode::FitBox),
            (0.0, 0.0)
        );
    }
}
