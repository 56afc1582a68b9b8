// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration read from environment variables

use std::env;

/// Runtime configuration for the segmentation service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind address (HOST)
    pub host: String,
    /// Bind port (PORT)
    pub port: u16,
    /// Model variant identifier (SAM_MODEL): mobile_sam, sam_vit_b, sam_vit_l, sam_vit_h
    pub model_variant: String,
    /// Directory holding encoder.onnx and decoder.onnx (SAM_CHECKPOINT_DIR)
    pub checkpoint_dir: String,
    /// Device preference (SAM_DEVICE): cuda, cpu, or auto
    pub device: String,
}

impl ServiceConfig {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(5001);
        let model_variant = env::var("SAM_MODEL").unwrap_or_else(|_| "mobile_sam".to_string());
        let checkpoint_dir = env::var("SAM_CHECKPOINT_DIR")
            .unwrap_or_else(|_| "./models/mobile-sam-onnx".to_string());
        let device = env::var("SAM_DEVICE").unwrap_or_else(|_| "auto".to_string());

        Self {
            host,
            port,
            model_variant,
            checkpoint_dir,
            device,
        }
    }
}
