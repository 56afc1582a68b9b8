// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image and prompt preparation for the SAM encoder/decoder pair
//!
//! The encoder expects a 1024x1024 NCHW tensor: the image is resized so
//! its longest side is 1024, padded bottom/right, and normalized with
//! the SAM pixel mean/std. Prompt coordinates go through the same
//! resize so they stay aligned with the encoded image.

use image::{imageops::FilterType, RgbImage};
use ndarray::{Array2, Array3, Array4};

use crate::sam::error::SamError;
use crate::sam::types::Prompt;

/// Encoder input resolution (longest side)
pub const INPUT_SIZE: u32 = 1024;

/// Per-channel pixel mean used by SAM preprocessing
const PIXEL_MEAN: [f32; 3] = [123.675, 116.28, 103.53];
/// Per-channel pixel std used by SAM preprocessing
const PIXEL_STD: [f32; 3] = [58.395, 57.12, 57.375];

/// Point label marking the padding point appended to point-only prompts
const PAD_LABEL: f32 = -1.0;
/// Point labels marking box corners in the SAM point encoding
const BOX_TOP_LEFT_LABEL: f32 = 2.0;
const BOX_BOTTOM_RIGHT_LABEL: f32 = 3.0;

/// Coordinate transform from original pixel space to encoder input space.
#[derive(Debug, Clone, Copy)]
pub struct ImageTransform {
    scale: f32,
}

impl ImageTransform {
    pub fn new(width: u32, height: u32) -> Self {
        let longest = width.max(height).max(1);
        Self {
            scale: INPUT_SIZE as f32 / longest as f32,
        }
    }

    /// Map a coordinate from image space into encoder input space.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale, y * self.scale)
    }

    /// Dimensions of the resized (pre-padding) image.
    pub fn resized_dims(&self, width: u32, height: u32) -> (u32, u32) {
        let w = ((width as f32 * self.scale).round() as u32).max(1);
        let h = ((height as f32 * self.scale).round() as u32).max(1);
        (w, h)
    }
}

/// Convert an RGB image to the normalized NCHW encoder input tensor.
pub fn image_to_tensor(image: &RgbImage) -> Array4<f32> {
    let transform = ImageTransform::new(image.width(), image.height());
    let (new_w, new_h) = transform.resized_dims(image.width(), image.height());

    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);

    // Pad bottom/right with the per-channel mean, which normalizes to zero
    let mut tensor = Array4::<f32>::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel.0[c] as f32 - PIXEL_MEAN[c]) / PIXEL_STD[c];
        }
    }

    tensor
}

/// A prompt lowered to the decoder's coordinate/label tensors.
#[derive(Debug, Clone)]
pub struct LoweredPrompt {
    /// Shape [1, N, 2], coordinates in encoder input space
    pub coords: Array3<f32>,
    /// Shape [1, N]
    pub labels: Array2<f32>,
}

/// Lower a prompt to decoder tensors, validating its shape.
///
/// Point prompts get the SAM padding point (0, 0) with label -1
/// appended; a box is encoded as its two corners with labels 2 and 3.
/// Shape validation happens here, before any session work, so a bad
/// prompt never reaches the model.
pub fn lower_prompt(prompt: &Prompt, transform: &ImageTransform) -> Result<LoweredPrompt, SamError> {
    let (points, labels): (Vec<(f32, f32)>, Vec<f32>) = match prompt {
        Prompt::Point { x, y, label } => (
            vec![(*x as f32, *y as f32), (0.0, 0.0)],
            vec![*label as f32, PAD_LABEL],
        ),
        Prompt::Points { points, labels } => {
            if points.is_empty() {
                return Err(SamError::InvalidPrompt(
                    "at least one point is required".to_string(),
                ));
            }
            if let Some(labels) = labels {
                if labels.len() != points.len() {
                    return Err(SamError::InvalidPrompt(format!(
                        "points and labels must have the same length ({} points, {} labels)",
                        points.len(),
                        labels.len()
                    )));
                }
            }

            let mut coords: Vec<(f32, f32)> = points
                .iter()
                .map(|&(x, y)| (x as f32, y as f32))
                .collect();
            let mut lowered_labels: Vec<f32> = match labels {
                Some(labels) => labels.iter().map(|&l| l as f32).collect(),
                None => vec![1.0; points.len()],
            };

            coords.push((0.0, 0.0));
            lowered_labels.push(PAD_LABEL);

            (coords, lowered_labels)
        }
        Prompt::Box { x1, y1, x2, y2 } => (
            vec![(*x1 as f32, *y1 as f32), (*x2 as f32, *y2 as f32)],
            vec![BOX_TOP_LEFT_LABEL, BOX_BOTTOM_RIGHT_LABEL],
        ),
    };

    let n = points.len();
    let mut coords = Array3::<f32>::zeros((1, n, 2));
    for (i, &(x, y)) in points.iter().enumerate() {
        let (x, y) = transform.apply(x, y);
        coords[[0, i, 0]] = x;
        coords[[0, i, 1]] = y;
    }

    let labels = Array2::from_shape_vec((1, n), labels)
        .map_err(|e| SamError::InvalidPrompt(e.to_string()))?;

    Ok(LoweredPrompt { coords, labels })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_scales_longest_side() {
        let transform = ImageTransform::new(2048, 1024);
        let (x, y) = transform.apply(2048.0, 1024.0);
        assert_eq!(x, 1024.0);
        assert_eq!(y, 512.0);
        assert_eq!(transform.resized_dims(2048, 1024), (1024, 512));
    }

    #[test]
    fn test_image_to_tensor_shape_and_padding() {
        // 2:1 image lands in the top half; the bottom half stays at the
        // normalized mean (zero)
        let image = RgbImage::from_pixel(64, 32, image::Rgb([255, 255, 255]));
        let tensor = image_to_tensor(&image);
        assert_eq!(tensor.shape(), &[1, 3, 1024, 1024]);
        assert!(tensor[[0, 0, 0, 0]] > 0.0);
        assert_eq!(tensor[[0, 0, 1023, 0]], 0.0);
    }

    #[test]
    fn test_lower_single_point_appends_pad_point() {
        let transform = ImageTransform::new(1024, 1024);
        let prompt = Prompt::Point {
            x: 100,
            y: 200,
            label: 1,
        };
        let lowered = lower_prompt(&prompt, &transform).unwrap();
        assert_eq!(lowered.coords.shape(), &[1, 2, 2]);
        assert_eq!(lowered.coords[[0, 0, 0]], 100.0);
        assert_eq!(lowered.coords[[0, 0, 1]], 200.0);
        assert_eq!(lowered.labels[[0, 0]], 1.0);
        assert_eq!(lowered.labels[[0, 1]], PAD_LABEL);
    }

    #[test]
    fn test_lower_points_default_labels_match_explicit_ones() {
        let transform = ImageTransform::new(512, 512);
        let points = vec![(10, 20), (30, 40), (50, 60)];

        let defaulted = lower_prompt(
            &Prompt::Points {
                points: points.clone(),
                labels: None,
            },
            &transform,
        )
        .unwrap();
        let explicit = lower_prompt(
            &Prompt::Points {
                points,
                labels: Some(vec![1, 1, 1]),
            },
            &transform,
        )
        .unwrap();

        assert_eq!(defaulted.coords, explicit.coords);
        assert_eq!(defaulted.labels, explicit.labels);
    }

    #[test]
    fn test_lower_points_length_mismatch_rejected() {
        let transform = ImageTransform::new(512, 512);
        let result = lower_prompt(
            &Prompt::Points {
                points: vec![(1, 2), (3, 4)],
                labels: Some(vec![1]),
            },
            &transform,
        );
        assert!(matches!(result, Err(SamError::InvalidPrompt(_))));
    }

    #[test]
    fn test_lower_empty_points_rejected() {
        let transform = ImageTransform::new(512, 512);
        let result = lower_prompt(
            &Prompt::Points {
                points: vec![],
                labels: None,
            },
            &transform,
        );
        assert!(matches!(result, Err(SamError::InvalidPrompt(_))));
    }

    #[test]
    fn test_lower_box_uses_corner_labels_without_pad() {
        let transform = ImageTransform::new(1024, 1024);
        let prompt = Prompt::Box {
            x1: 40,
            y1: 40,
            x2: 60,
            y2: 60,
        };
        let lowered = lower_prompt(&prompt, &transform).unwrap();
        assert_eq!(lowered.coords.shape(), &[1, 2, 2]);
        assert_eq!(lowered.labels[[0, 0]], BOX_TOP_LEFT_LABEL);
        assert_eq!(lowered.labels[[0, 1]], BOX_BOTTOM_RIGHT_LABEL);
    }

    #[test]
    fn test_lower_box_passes_malformed_ordering_through() {
        // Ordering is not validated; the prompt is lowered as-is
        let transform = ImageTransform::new(1024, 1024);
        let prompt = Prompt::Box {
            x1: 60,
            y1: 60,
            x2: 40,
            y2: 40,
        };
        let lowered = lower_prompt(&prompt, &transform).unwrap();
        assert_eq!(lowered.coords[[0, 0, 0]], 60.0);
        assert_eq!(lowered.coords[[0, 1, 0]], 40.0);
    }
}
