// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Adapter error taxonomy

use thiserror::Error;

/// Errors surfaced by the SAM model adapter
#[derive(Debug, Error)]
pub enum SamError {
    /// Variant identifier not present in the model registry
    #[error("unknown model variant '{0}'")]
    UnknownVariant(String),

    /// Checkpoint missing or session construction failed; fatal at startup
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Prompt shape inconsistent (client input)
    #[error("invalid prompt: {0}")]
    InvalidPrompt(String),

    /// The model raised during prediction; carries the original message
    #[error("inference failed: {0}")]
    Inference(String),
}
