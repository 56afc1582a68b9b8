// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! SAM model adapter
//!
//! Wraps one ONNX encoder/decoder pair behind a uniform "single best
//! mask for this prompt" contract. The set-image → predict sequence is
//! one atomic operation guarded by a session mutex, so concurrent
//! requests can never interleave their session-image writes.

pub mod engine;
pub mod error;
pub mod model;
pub mod preprocessing;
pub mod types;

pub use engine::SegmentEngine;
pub use error::SamError;
pub use model::SamModel;
pub use types::{Prompt, Segmentation, SegmentationMask};

use crate::vision::{encode_mask_base64, ImageError};

/// Encode a mask as a base64 PNG data URL.
///
/// The boolean foreground semantics belong to the adapter; byte-level
/// PNG encoding is delegated to the image codec.
pub fn mask_to_base64(mask: &SegmentationMask) -> Result<String, ImageError> {
    encode_mask_base64(mask)
}
