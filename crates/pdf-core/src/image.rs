//! Raster images embedded as image XObjects

use crate::{PdfError, Result};
use image::{DynamicImage, ImageDecoder, ImageReader};
use lopdf::{Dictionary, Object, Stream};
use std::io::{Cursor, Write};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Supported raster formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// How an image is sized into its target box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageScaleMode {
    /// Fill the box exactly, ignoring aspect ratio
    Stretch,
    /// Largest size that fits inside the box, keeping aspect ratio
    #[default]
    FitBox,
}

/// Display size in points for an image of `width`×`height` pixels
pub fn calculate_scaled_dimensions(
    width: u32,
    height: u32,
    box_width: f64,
    box_height: f64,
    mode: ImageScaleMode,
) -> (f64, f64) {
    if width == 0 || height == 0 {
        return (0.0, 0.0);
    }
    match mode {
        ImageScaleMode::Stretch => (box_width, box_height),
        ImageScaleMode::FitBox => {
            let scale = (box_width / width as f64).min(box_height / height as f64);
            (width as f64 * scale, height as f64 * scale)
        }
    }
}

/// Detect the image format from its signature
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 8 {
        return Err(PdfError::ImageError("Image data too short".to_string()));
    }
    if data[..3] == [0xFF, 0xD8, 0xFF] {
        return Ok(ImageFormat::Jpeg);
    }
    if data[..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A] {
        return Ok(ImageFormat::Png);
    }
    Err(PdfError::ImageError("Unsupported image format".to_string()))
}

/// Frame header values read from a JPEG SOF segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegFrame {
    width: u32,
    height: u32,
    components: u8,
}

/// Scan JPEG segments for the first start-of-frame marker
fn read_jpeg_frame(data: &[u8]) -> Result<JpegFrame> {
    let mut i = 2;
    while i + 9 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];
        let is_frame = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            return Ok(JpegFrame {
                height: u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32,
                width: u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32,
                components: data[i + 9],
            });
        }

        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if length < 2 {
            break;
        }
        i += 2 + length;
    }

    Err(PdfError::ImageError("JPEG frame header not found".to_string()))
}

/// Image ready for embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// "DeviceRGB", "DeviceGray" or "DeviceCMYK"
    pub color_space: &'static str,
    /// "DCTDecode" or "FlateDecode"
    pub filter: &'static str,
    /// Encoded sample data
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Build from JPEG or PNG bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match detect_format(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png => Self::from_png(data),
        }
    }

    /// JPEG data is embedded as-is under DCTDecode
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let frame = read_jpeg_frame(data)?;
        let color_space = match frame.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        };

        Ok(Self {
            width: frame.width,
            height: frame.height,
            color_space,
            filter: "DCTDecode",
            data: data.to_vec(),
        })
    }

    /// PNG data is decoded, composited over white and re-encoded with Flate
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color_type = decoder.color_type();
        let image = DynamicImage::from_decoder(decoder)?;

        let (samples, color_space) = match color_type {
            image::ColorType::L8 | image::ColorType::L16 => {
                (image.to_luma8().into_raw(), "DeviceGray")
            }
            image::ColorType::La8 | image::ColorType::La16 => {
                let samples = image
                    .to_luma_alpha8()
                    .pixels()
                    .map(|p| blend_over_white(p[0], p[1]))
                    .collect();
                (samples, "DeviceGray")
            }
            image::ColorType::Rgba8 | image::ColorType::Rgba16 | image::ColorType::Rgba32F => {
                let samples = image
                    .to_rgba8()
                    .pixels()
                    .flat_map(|p| [0, 1, 2].map(|c| blend_over_white(p[c], p[3])))
                    .collect();
                (samples, "DeviceRGB")
            }
            _ => (image.to_rgb8().into_raw(), "DeviceRGB"),
        };

        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&samples)?;

        Ok(Self {
            width,
            height,
            color_space,
            filter: "FlateDecode",
            data: encoder.finish()?,
        })
    }

    /// Convert to an image XObject stream
    pub fn to_pdf_stream(&self) -> Stream {
        let dict = Dictionary::from_iter(vec![
            ("Type", "XObject".into()),
            ("Subtype", "Image".into()),
            ("Width", Object::Integer(self.width as i64)),
            ("Height", Object::Integer(self.height as i64)),
            ("ColorSpace", self.color_space.into()),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", self.filter.into()),
        ]);
        Stream::new(dict, self.data.clone())
    }
}

fn blend_over_white(value: u8, alpha: u8) -> u8 {
    let alpha = alpha as f32 / 255.0;
    (value as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8
}

/// Operators that paint an image resource at `x`,`y` (bottom-left, PDF space)
pub fn generate_image_operators(name: &str, x: f64, y: f64, width: f64, height: f64) -> Vec<u8> {
    format!("q\n{width:.2} 0 0 {height:.2} {x:.2} {y:.2} cm\n/{name} Do\nQ\n").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_jpeg(width: u16, height: u16, components: u8) -> Vec<u8> {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00];
        jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        jpeg.extend_from_slice(&height.to_be_bytes());
        jpeg.extend_from_slice(&width.to_be_bytes());
        jpeg.push(components);
        jpeg.extend_from_slice(&[0x01, 0x22, 0x00, 0xFF, 0xD9]);
        jpeg
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(&minimal_jpeg(1, 1, 3)).unwrap(), ImageFormat::Jpeg);
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_format(&png).unwrap(), ImageFormat::Png);
        assert!(detect_format(b"GIF89a\0\0").is_err());
        assert!(detect_format(&[0xFF, 0xD8]).is_err());
    }

    #[test]
    fn test_jpeg_frame_after_app_segment() {
        let frame = read_jpeg_frame(&minimal_jpeg(200, 100, 1)).unwrap();
        assert_eq!(
            frame,
            JpegFrame {
                width: 200,
                height: 100,
                components: 1
            }
        );
    }

    #[test]
    fn test_jpeg_passthrough() {
        let jpeg = minimal_jpeg(64, 32, 3);
        let xobject = ImageXObject::from_jpeg(&jpeg).unwrap();
        assert_eq!((xobject.width, xobject.height), (64, 32));
        assert_eq!(xobject.color_space, "DeviceRGB");
        assert_eq!(xobject.filter, "DCTDecode");
        assert_eq!(xobject.data, jpeg);
    }

    #[test]
    fn test_png_alpha_blended() {
        let mut rgba = image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        rgba.put_pixel(1, 0, image::Rgba([0, 0, 0, 0]));
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let xobject = ImageXObject::from_png(&png).unwrap();
        assert_eq!(xobject.color_space, "DeviceRGB");
        assert_eq!(xobject.filter, "FlateDecode");

        let mut samples = Vec::new();
        std::io::Read::read_to_end(
            &mut flate2::read::ZlibDecoder::new(xobject.data.as_slice()),
            &mut samples,
        )
        .unwrap();
        assert_eq!(samples, vec![255, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_to_pdf_stream() {
        let stream = ImageXObject::from_jpeg(&minimal_jpeg(10, 20, 1))
            .unwrap()
            .to_pdf_stream();
        assert_eq!(stream.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Image");
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 10);
        assert_eq!(
            stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
            b"DeviceGray"
        );
    }

    #[test]
    fn test_fit_box() {
        assert_eq!(
            calculate_scaled_dimensions(800, 600, 100.0, 200.0, ImageScaleMode::FitBox),
            (100.0, 75.0)
        );
        assert_eq!(
            calculate_scaled_dimensions(600, 800, 200.0, 100.0, ImageScaleMode::FitBox),
            (75.0, 100.0)
        );
        assert_eq!(
            calculate_scaled_dimensions(800, 600, 100.0, 200.0, ImageScaleMode::Stretch),
            (100.0, 200.0)
        );
        assert_eq!(
            calculate_scaled_dimensions(0, 600, 100.0, 200.0, ImageScaleMode::FitBox),
            (0.0, 0.0)
        );
    }

    #[test]
    fn test_generate_image_operators() {
        let ops = String::from_utf8(generate_image_operators("Im1", 10.0, 20.0, 50.0, 25.0)).unwrap();
        assert_eq!(ops, "q\n50.00 0 0 25.00 10.00 20.00 cm\n/Im1 Do\nQ\n");
    }
}
