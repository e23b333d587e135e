use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader};
use serde::{Deserialize, Serialize};

use crate::foundation::core::Bitmap;
use crate::foundation::error::{BackdropError, BackdropResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Bounds applied before and during decode, so hostile input cannot exhaust memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeLimits {
    pub max_input_bytes: u64,
    /// Upper bound on `width * height` of the decoded image.
    pub max_pixels: u64,
    /// Allocation cap handed to the decoder.
    pub max_alloc_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 50 * 1024 * 1024,
            max_pixels: 40_000_000,
            max_alloc_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Decode `bytes` into an upright RGBA bitmap.
///
/// Size limits are checked from the header first. An EXIF orientation tag, when
/// present, is applied, so the result may have its width and height swapped.
pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> BackdropResult<Bitmap> {
    if bytes.is_empty() {
        return Err(BackdropError::decode("input is empty"));
    }
    if bytes.len() as u64 > limits.max_input_bytes {
        return Err(BackdropError::decode(format!(
            "input is {} bytes, limit is {}",
            bytes.len(),
            limits.max_input_bytes
        )));
    }

    let (w, h) = reader(bytes)?
        .into_dimensions()
        .map_err(|e| BackdropError::decode(format!("read image header: {e}")))?;
    let pixels = u64::from(w) * u64::from(h);
    if pixels == 0 {
        return Err(BackdropError::decode(format!("image has zero area ({w}x{h})")));
    }
    if pixels > limits.max_pixels {
        return Err(BackdropError::decode(format!(
            "image is {w}x{h} ({pixels} px), limit is {} px",
            limits.max_pixels
        )));
    }

    let mut reader = reader(bytes)?;
    let mut decoder_limits = image::Limits::default();
    decoder_limits.max_alloc = Some(limits.max_alloc_bytes);
    reader.limits(decoder_limits);
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| BackdropError::decode(format!("open decoder: {e}")))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| BackdropError::decode(format!("read orientation: {e}")))?;
    let mut img = DynamicImage::from_decoder(decoder)
        .map_err(|e| BackdropError::decode(format!("decode image: {e}")))?;
    // Upright before anything downstream measures axes.
    img.apply_orientation(orientation);

    Bitmap::from_rgba_image(img.to_rgba8())
}

fn reader(bytes: &[u8]) -> BackdropResult<ImageReader<Cursor<&[u8]>>> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| BackdropError::decode(format!("sniff image format: {e}")))?;
    if reader.format().is_none() {
        return Err(BackdropError::decode("unrecognized image format"));
    }
    Ok(reader)
}

/// Serialize `bitmap`. `quality` (0-100) applies to JPEG and is clamped to at least 1.
pub fn encode(bitmap: &Bitmap, format: OutputFormat, quality: u8) -> BackdropResult<Vec<u8>> {
    let (w, h) = (bitmap.width(), bitmap.height());
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = flatten_onto_white(bitmap.data());
            let mut encoder =
                JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality.clamp(1, 100));
            encoder
                .encode(&rgb, w, h, ExtendedColorType::Rgb8)
                .map_err(|e| BackdropError::encode(format!("jpeg: {e}")))?;
        }
        OutputFormat::Png => {
            PngEncoder::new(Cursor::new(&mut buf))
                .write_image(bitmap.data(), w, h, ExtendedColorType::Rgba8)
                .map_err(|e| BackdropError::encode(format!("png: {e}")))?;
        }
    }
    Ok(buf)
}

fn flatten_onto_white(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = u32::from(px[3]);
        for &c in &px[..3] {
            let v = (u32::from(c) * a + 255 * (255 - a) + 127) / 255;
            out.push(v as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Color;

    fn png_bytes(w: u32, h: u32, color: Color) -> Vec<u8> {
        let bmp = Bitmap::filled(w, h, color).unwrap();
        encode(&bmp, OutputFormat::Png, 100).unwrap()
    }

    #[test]
    fn png_roundtrip_is_lossless() {
        let mut bmp = Bitmap::filled(3, 2, Color::rgba(1, 2, 3, 128)).unwrap();
        bmp.put_pixel(2, 1, Color::rgb(200, 100, 50));
        let bytes = encode(&bmp, OutputFormat::Png, 85).unwrap();
        let back = decode(&bytes, &DecodeLimits::default()).unwrap();
        assert_eq!(back, bmp);
    }

    #[test]
    fn jpeg_output_decodes_to_same_dimensions() {
        let bmp = Bitmap::filled(17, 9, Color::rgb(0x33, 0x66, 0x99)).unwrap();
        let bytes = encode(&bmp, OutputFormat::Jpeg, 85).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let back = decode(&bytes, &DecodeLimits::default()).unwrap();
        assert_eq!((back.width(), back.height()), (17, 9));
    }

    #[test]
    fn jpeg_quality_zero_is_clamped() {
        let bmp = Bitmap::filled(4, 4, Color::WHITE).unwrap();
        assert!(encode(&bmp, OutputFormat::Jpeg, 0).is_ok());
    }

    #[test]
    fn empty_and_garbage_input_are_decode_errors() {
        let limits = DecodeLimits::default();
        assert!(matches!(decode(&[], &limits), Err(BackdropError::Decode(_))));
        assert!(matches!(
            decode(b"definitely not an image", &limits),
            Err(BackdropError::Decode(_))
        ));

        let mut truncated = png_bytes(8, 8, Color::BLACK);
        truncated.truncate(truncated.len() / 2);
        assert!(matches!(
            decode(&truncated, &limits),
            Err(BackdropError::Decode(_))
        ));
    }

    #[test]
    fn limits_reject_large_inputs_before_decoding() {
        let bytes = png_bytes(20, 20, Color::BLACK);
        let small_pixels = DecodeLimits {
            max_pixels: 100,
            ..DecodeLimits::default()
        };
        let err = decode(&bytes, &small_pixels).unwrap_err();
        assert!(err.to_string().contains("limit"));

        let small_input = DecodeLimits {
            max_input_bytes: 8,
            ..DecodeLimits::default()
        };
        assert!(matches!(
            decode(&bytes, &small_input),
            Err(BackdropError::Decode(_))
        ));
    }

    /// Splice a big-endian EXIF APP1 segment carrying only an orientation tag right
    /// after the JPEG SOI marker.
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"MM\0\x2a");
        tiff.extend_from_slice(&8u32.to_be_bytes());
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x0112u16.to_be_bytes());
        tiff.extend_from_slice(&3u16.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let len = (2 + 6 + tiff.len()) as u16;
        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn exif_orientation_is_applied_on_decode() {
        let mut bmp = Bitmap::filled(40, 20, Color::rgb(255, 255, 255)).unwrap();
        for y in 0..20 {
            for x in 0..8 {
                bmp.put_pixel(x, y, Color::BLACK);
            }
        }
        let jpeg = encode(&bmp, OutputFormat::Jpeg, 95).unwrap();
        let limits = DecodeLimits::default();

        let plain = decode(&jpeg, &limits).unwrap();
        assert_eq!((plain.width(), plain.height()), (40, 20));

        // Orientation 6: rotate 90 degrees clockwise, so the dark left band ends up on top.
        let rotated = decode(&with_exif_orientation(&jpeg, 6), &limits).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (20, 40));
        assert!(rotated.pixel(10, 2).unwrap().r < 64);
        assert!(rotated.pixel(10, 37).unwrap().r > 192);

        let upright = decode(&with_exif_orientation(&jpeg, 1), &limits).unwrap();
        assert_eq!((upright.width(), upright.height()), (40, 20));
    }

    #[test]
    fn flatten_composites_transparency_onto_white() {
        assert_eq!(flatten_onto_white(&[10, 20, 30, 255]), vec![10, 20, 30]);
        assert_eq!(flatten_onto_white(&[10, 20, 30, 0]), vec![255, 255, 255]);
    }
}
