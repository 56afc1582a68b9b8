// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX-backed SAM model adapter
//!
//! Owns exactly one loaded encoder/decoder session pair. Every request
//! re-encodes its image through the encoder (the "set image" step) and
//! runs the decoder in single-mask mode inside the same critical
//! section, then returns candidate index 0 as the result.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use image::RgbImage;
use ndarray::{Array1, Array4, ArrayD, Ix4};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{info, warn};

use crate::sam::engine::SegmentEngine;
use crate::sam::error::SamError;
use crate::sam::preprocessing::{image_to_tensor, lower_prompt, ImageTransform, LoweredPrompt};
use crate::sam::types::{Prompt, Segmentation, SegmentationMask};

/// Encoder model file expected inside the checkpoint directory
const ENCODER_FILE: &str = "encoder.onnx";
/// Decoder model file expected inside the checkpoint directory
const DECODER_FILE: &str = "decoder.onnx";

/// Map a public variant identifier to its model registry key.
fn registry_key(variant: &str) -> Result<&'static str, SamError> {
    match variant {
        "mobile_sam" => Ok("vit_t"),
        "sam_vit_b" => Ok("vit_b"),
        "sam_vit_l" => Ok("vit_l"),
        "sam_vit_h" => Ok("vit_h"),
        other => Err(SamError::UnknownVariant(other.to_string())),
    }
}

/// The mutable per-request session state: encoder, decoder, and the
/// image embeddings slot they share.
struct SamPredictor {
    encoder: Session,
    decoder: Session,
}

impl SamPredictor {
    /// Bind an image as the current session image: a full re-encode
    /// into the model's internal representation, once per call.
    fn set_image(&mut self, image: &RgbImage) -> Result<ArrayD<f32>, SamError> {
        let tensor = image_to_tensor(image);
        let input = Value::from_array(tensor).map_err(inference_err)?;

        let outputs = self
            .encoder
            .run(ort::inputs!["image" => input])
            .map_err(inference_err)?;

        let embeddings = outputs["image_embeddings"]
            .try_extract_array::<f32>()
            .map_err(inference_err)?;

        Ok(embeddings.to_owned())
    }

    /// Run the decoder in single-mask mode and select candidate 0.
    fn predict(
        &mut self,
        embeddings: ArrayD<f32>,
        lowered: &LoweredPrompt,
        orig_size: (u32, u32),
    ) -> Result<Segmentation, SamError> {
        let (height, width) = orig_size;

        let embeddings = Value::from_array(embeddings).map_err(inference_err)?;
        let coords = Value::from_array(lowered.coords.clone()).map_err(inference_err)?;
        let labels = Value::from_array(lowered.labels.clone()).map_err(inference_err)?;
        // No previous mask is ever fed back; each request is independent
        let mask_input =
            Value::from_array(Array4::<f32>::zeros((1, 1, 256, 256))).map_err(inference_err)?;
        let has_mask =
            Value::from_array(Array1::<f32>::from_vec(vec![0.0])).map_err(inference_err)?;
        let orig_im_size =
            Value::from_array(Array1::<f32>::from_vec(vec![height as f32, width as f32]))
                .map_err(inference_err)?;

        let outputs = self
            .decoder
            .run(ort::inputs![
                "image_embeddings" => embeddings,
                "point_coords" => coords,
                "point_labels" => labels,
                "mask_input" => mask_input,
                "has_mask_input" => has_mask,
                "orig_im_size" => orig_im_size,
            ])
            .map_err(inference_err)?;

        let masks = outputs["masks"]
            .try_extract_array::<f32>()
            .map_err(inference_err)?;
        let masks = masks
            .into_dimensionality::<Ix4>()
            .map_err(|e| SamError::Inference(format!("unexpected mask shape: {}", e)))?;

        let mask_h = masks.shape()[2];
        let mask_w = masks.shape()[3];

        // Candidate index 0: single-mask output mode resolves the
        // multi-hypothesis ambiguity inside the adapter
        let mut data = Vec::with_capacity(mask_h * mask_w);
        for y in 0..mask_h {
            for x in 0..mask_w {
                data.push(masks[[0, 0, y, x]] > 0.0);
            }
        }
        let mask = SegmentationMask::new(mask_w as u32, mask_h as u32, data);

        let iou = outputs["iou_predictions"]
            .try_extract_array::<f32>()
            .map_err(inference_err)?;
        let score = normalize_score(iou.iter().copied().next().unwrap_or(0.0));

        Ok(Segmentation { mask, score })
    }
}

fn inference_err(e: ort::Error) -> SamError {
    SamError::Inference(e.to_string())
}

/// Clamp a raw model confidence into a finite [0, 1] score.
fn normalize_score(raw: f32) -> f32 {
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// SAM model adapter backed by an ONNX encoder/decoder pair.
pub struct SamModel {
    variant: String,
    device: String,
    predictor: Mutex<SamPredictor>,
}

impl SamModel {
    /// Load the model from a checkpoint directory.
    ///
    /// Fails loudly on an unrecognized variant or an unloadable
    /// checkpoint; there is no partial/degraded ready state. The device
    /// preference (`cuda`, `cpu`, `auto`) is resolved once here and
    /// fixed for the adapter's lifetime.
    pub async fn load(
        variant: &str,
        checkpoint_dir: impl AsRef<Path>,
        device: &str,
    ) -> Result<Self, SamError> {
        let key = registry_key(variant)?;
        let checkpoint_dir = checkpoint_dir.as_ref();

        let encoder_path = checkpoint_dir.join(ENCODER_FILE);
        let decoder_path = checkpoint_dir.join(DECODER_FILE);
        for path in [&encoder_path, &decoder_path] {
            if !path.exists() {
                return Err(SamError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        info!(
            "Loading SAM model {} ({}) from {}",
            variant,
            key,
            checkpoint_dir.display()
        );

        let (encoder, decoder, resolved) = load_sessions(&encoder_path, &decoder_path, device)?;

        info!("SAM model loaded on {}", resolved);

        Ok(Self {
            variant: variant.to_string(),
            device: resolved,
            predictor: Mutex::new(SamPredictor { encoder, decoder }),
        })
    }
}

/// Build both sessions on the requested device. `auto` tries CUDA and
/// falls back to CPU; `cuda` and `cpu` are strict.
fn load_sessions(
    encoder_path: &Path,
    decoder_path: &Path,
    device: &str,
) -> Result<(Session, Session, String), SamError> {
    let load_err = |e: ort::Error| SamError::ModelLoad(e.to_string());

    match device {
        "cpu" => {
            let encoder = commit_session(encoder_path, false).map_err(load_err)?;
            let decoder = commit_session(decoder_path, false).map_err(load_err)?;
            Ok((encoder, decoder, "cpu".to_string()))
        }
        "cuda" => {
            let encoder = commit_session(encoder_path, true).map_err(load_err)?;
            let decoder = commit_session(decoder_path, true).map_err(load_err)?;
            Ok((encoder, decoder, "cuda".to_string()))
        }
        "auto" => match commit_session(encoder_path, true) {
            Ok(encoder) => {
                let decoder = commit_session(decoder_path, true).map_err(load_err)?;
                Ok((encoder, decoder, "cuda".to_string()))
            }
            Err(e) => {
                warn!("CUDA execution provider unavailable: {}", e);
                warn!("Falling back to CPU execution provider");
                let encoder = commit_session(encoder_path, false).map_err(load_err)?;
                let decoder = commit_session(decoder_path, false).map_err(load_err)?;
                Ok((encoder, decoder, "cpu".to_string()))
            }
        },
        other => Err(SamError::ModelLoad(format!(
            "unknown device preference '{}' (expected cuda, cpu, or auto)",
            other
        ))),
    }
}

fn commit_session(path: &Path, use_cuda: bool) -> Result<Session, ort::Error> {
    let builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?;

    let builder = if use_cuda {
        builder.with_execution_providers([CUDAExecutionProvider::default().build()])?
    } else {
        builder.with_execution_providers([CPUExecutionProvider::default().build()])?
    };

    builder.commit_from_file(path)
}

#[async_trait]
impl SegmentEngine for SamModel {
    async fn segment(&self, image: &RgbImage, prompt: Prompt) -> Result<Segmentation, SamError> {
        let transform = ImageTransform::new(image.width(), image.height());
        // Shape validation happens before any session work, so a bad
        // prompt never triggers an inference call
        let lowered = lower_prompt(&prompt, &transform)?;

        // Critical section: set image and predict must not interleave
        // with another request's session-image write
        let mut predictor = self
            .predictor
            .lock()
            .map_err(|e| SamError::Inference(format!("session lock poisoned: {}", e)))?;

        let embeddings = predictor.set_image(image)?;
        let result = predictor.predict(embeddings, &lowered, (image.height(), image.width()))?;

        info!(
            "Segmented {}x{} image, score {:.3}",
            image.width(),
            image.height(),
            result.score
        );

        Ok(result)
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn variant(&self) -> &str {
        &self.variant
    }

    fn device(&self) -> &str {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_maps_known_variants() {
        assert_eq!(registry_key("mobile_sam").unwrap(), "vit_t");
        assert_eq!(registry_key("sam_vit_b").unwrap(), "vit_b");
        assert_eq!(registry_key("sam_vit_l").unwrap(), "vit_l");
        assert_eq!(registry_key("sam_vit_h").unwrap(), "vit_h");
    }

    #[test]
    fn test_registry_rejects_unknown_variant() {
        assert!(matches!(
            registry_key("sam_vit_z"),
            Err(SamError::UnknownVariant(_))
        ));
    }

    #[test]
    fn test_normalize_score_clamps_and_finites() {
        assert_eq!(normalize_score(0.5), 0.5);
        assert_eq!(normalize_score(1.2), 1.0);
        assert_eq!(normalize_score(-0.1), 0.0);
        assert_eq!(normalize_score(f32::NAN), 0.0);
        assert_eq!(normalize_score(f32::INFINITY), 0.0);
    }

    #[tokio::test]
    async fn test_load_fails_for_unknown_variant() {
        let result = SamModel::load("not_a_model", "./models/mobile-sam-onnx", "cpu").await;
        assert!(matches!(result, Err(SamError::UnknownVariant(_))));
    }

    #[tokio::test]
    async fn test_load_fails_for_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let result = SamModel::load("mobile_sam", dir.path(), "cpu").await;
        assert!(matches!(result, Err(SamError::ModelLoad(_))));
    }

    #[tokio::test]
    async fn test_load_fails_for_unknown_device() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ENCODER_FILE), b"stub").unwrap();
        std::fs::write(dir.path().join(DECODER_FILE), b"stub").unwrap();
        let result = SamModel::load("mobile_sam", dir.path(), "tpu").await;
        assert!(matches!(result, Err(SamError::ModelLoad(_))));
    }

    const CHECKPOINT_DIR: &str = "./models/mobile-sam-onnx";

    #[tokio::test]
    #[ignore] // Only run if model files are downloaded
    async fn test_segment_by_point_returns_single_mask() {
        let model = SamModel::load("mobile_sam", CHECKPOINT_DIR, "auto")
            .await
            .unwrap();
        let image = RgbImage::from_pixel(128, 96, image::Rgb([200, 10, 10]));
        let result = model.segment_by_point(&image, (64, 48), 1).await.unwrap();
        assert_eq!(result.mask.width(), 128);
        assert_eq!(result.mask.height(), 96);
        assert!(result.score.is_finite());
        assert!((0.0..=1.0).contains(&result.score));
    }
}
