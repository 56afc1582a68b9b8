// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image codec for the segmentation pipeline
//!
//! Decodes base64/data-URL image payloads into RGB pixel buffers and
//! encodes binary masks back into base64 PNG data URLs.

pub mod image_utils;

pub use image_utils::{
    decode_base64_image, decode_mask_base64, detect_format, encode_mask_base64, ImageError,
    ImageInfo,
};
