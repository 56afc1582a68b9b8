// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Segmentation response types

use serde::{Deserialize, Serialize};

/// Response from a segmentation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResponse {
    /// Whether segmentation succeeded
    pub success: bool,
    /// Mask as a base64 PNG data URL (absent on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_base64: Option<String>,
    /// Confidence score in [0, 1] (absent on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Human-readable status message
    pub message: String,
}

impl SegmentResponse {
    /// Build a success response.
    pub fn ok(mask_base64: String, confidence: f32, message: impl Into<String>) -> Self {
        Self {
            success: true,
            mask_base64: Some(mask_base64),
            confidence: Some(confidence),
            message: message.into(),
        }
    }
}
