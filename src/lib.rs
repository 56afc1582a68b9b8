// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod sam;
pub mod version;
pub mod vision;

pub use api::{ApiError, ErrorResponse, SegmentResponse};
pub use config::ServiceConfig;
pub use sam::{Prompt, SamError, SamModel, SegmentEngine, Segmentation, SegmentationMask};
pub use vision::{decode_base64_image, decode_mask_base64, encode_mask_base64, ImageError};
