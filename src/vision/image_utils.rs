// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading and mask encoding utilities

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{GrayImage, ImageFormat, RgbImage};
use std::io::Cursor;
use thiserror::Error;

use crate::sam::SegmentationMask;

/// Maximum image size (10MB)
const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Data-URL prefix attached to encoded masks
const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Custom error types for image processing
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Failed to encode mask: {0}")]
    EncodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode a base64-encoded image into a 3-channel RGB buffer.
///
/// The payload may carry a `data:<mime>;base64,` header; everything up
/// to the first comma is stripped. Grayscale and alpha-channel sources
/// are converted to RGB.
pub fn decode_base64_image(payload: &str) -> Result<(RgbImage, ImageInfo), ImageError> {
    let body = strip_data_url_prefix(payload);

    if body.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let bytes = STANDARD.decode(body)?;

    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    // Detect format from magic bytes
    let format = detect_format(&bytes)?;

    let img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img.to_rgb8(), info))
}

/// Encode a binary mask as a base64 PNG data URL.
///
/// Foreground pixels become 255 (white), background 0 (black), 8-bit
/// single-channel. PNG is lossless, so the encoding is bit-faithful:
/// every foreground pixel decodes back to 255 and vice versa.
pub fn encode_mask_base64(mask: &SegmentationMask) -> Result<String, ImageError> {
    let mut gray = GrayImage::new(mask.width(), mask.height());
    for (x, y, pixel) in gray.enumerate_pixels_mut() {
        pixel.0[0] = if mask.get(x, y) { 255 } else { 0 };
    }

    let mut buffer = Vec::new();
    gray.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;

    Ok(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(&buffer)))
}

/// Decode an encoded mask payload back into a binary mask.
///
/// Pixels above 127 are foreground. Inverse of [`encode_mask_base64`].
pub fn decode_mask_base64(payload: &str) -> Result<SegmentationMask, ImageError> {
    let body = strip_data_url_prefix(payload);

    if body.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let bytes = STANDARD.decode(body)?;
    let format = detect_format(&bytes)?;
    let img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let gray = img.to_luma8();
    let data = gray.pixels().map(|p| p.0[0] > 127).collect();

    Ok(SegmentationMask::new(gray.width(), gray.height(), data))
}

/// Strip an optional `"<mime-prefix>,"` data-URL header.
fn strip_data_url_prefix(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, body)) => body,
        None => payload,
    }
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF: GIF87a or GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        _ => Err(ImageError::UnsupportedFormat),
    }
}
