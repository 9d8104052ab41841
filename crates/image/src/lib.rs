//! Image decoding utilities for the liveness pipeline.
//!
//! This crate wraps the `image` crate to turn encoded camera frames into
//! packed RGB8 buffers and to write captures back out as PNG or JPEG.

pub mod error;
pub mod image;

pub use error::ImageError;
pub use image::Image;

use crates_image::{DynamicImage, ImageEncoder};

/// Decodes an image from raw bytes into packed RGB8.
///
/// The format is auto-detected. Grayscale, alpha, 16-bit and float images are
/// all converted to RGB8; alpha is discarded.
///
/// # Errors
///
/// Returns `ImageError::Decode` if the data is invalid or the format is unsupported.
pub fn decode_rgb8(data: &[u8]) -> Result<Image, ImageError> {
    let img = crates_image::load_from_memory(data)?;

    let rgb = match img {
        DynamicImage::ImageRgb8(buf) => buf,
        other => other.to_rgb8(),
    };
    let (w, h) = rgb.dimensions();
    Image::new(w as usize, h as usize, rgb.into_raw())
}

/// Async variant of [`decode_rgb8`].
///
/// The CPU-bound decoding work runs on tokio's blocking thread pool.
pub async fn decode_image(data: &[u8]) -> Result<Image, ImageError> {
    let owned = data.to_vec();
    tokio::task::spawn_blocking(move || decode_rgb8(&owned))
        .await
        .map_err(|e| ImageError::Decode(e.to_string()))?
}

/// Encodes an `Image` as PNG bytes.
pub fn encode_png(image: &Image) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    crates_image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(
            image.data(),
            image.width() as u32,
            image.height() as u32,
            crates_image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buffer)
}

fn encode_jpeg_inner(image: &Image, quality: u8) -> Result<Vec<u8>, ImageError> {
    let buffer = image.to_buffer()?;
    let mut out = Vec::new();
    crates_image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(
            buffer.as_raw(),
            buffer.width(),
            buffer.height(),
            crates_image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(out)
}

/// Encodes an `Image` as JPEG bytes.
///
/// The `quality` parameter controls JPEG compression (1-100, higher = better quality).
///
/// The CPU-bound encoding work runs on tokio's blocking thread pool.
pub async fn encode_jpeg(image: Image, quality: u8) -> Result<Vec<u8>, ImageError> {
    tokio::task::spawn_blocking(move || encode_jpeg_inner(&image, quality))
        .await
        .map_err(|e| ImageError::Encode(e.to_string()))?
}
