// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Trait seam between request handlers and the model adapter

use async_trait::async_trait;
use image::RgbImage;

use crate::sam::error::SamError;
use crate::sam::types::{Prompt, Segmentation};

/// Uniform "single best mask for this prompt" contract.
///
/// Handlers and tests depend on this trait rather than on the ONNX
/// runtime, so a deterministic stub can stand in for the real model.
#[async_trait]
pub trait SegmentEngine: Send + Sync {
    /// Atomically bind `image` as the session image and run prediction.
    async fn segment(&self, image: &RgbImage, prompt: Prompt) -> Result<Segmentation, SamError>;

    /// True only once a fully loaded, inference-capable model exists.
    fn is_ready(&self) -> bool;

    /// Model variant identifier (e.g. "mobile_sam").
    fn variant(&self) -> &str;

    /// Resolved device ("cuda" or "cpu").
    fn device(&self) -> &str;

    /// Segment by a single foreground click.
    async fn segment_by_point(
        &self,
        image: &RgbImage,
        point: (i64, i64),
        label: u8,
    ) -> Result<Segmentation, SamError> {
        self.segment(
            image,
            Prompt::Point {
                x: point.0,
                y: point.1,
                label,
            },
        )
        .await
    }

    /// Segment by N >= 1 clicks; omitted labels default to foreground.
    async fn segment_by_points(
        &self,
        image: &RgbImage,
        points: Vec<(i64, i64)>,
        labels: Option<Vec<u8>>,
    ) -> Result<Segmentation, SamError> {
        self.segment(image, Prompt::Points { points, labels }).await
    }

    /// Segment by an axis-aligned bounding box.
    async fn segment_by_box(
        &self,
        image: &RgbImage,
        bbox: (i64, i64, i64, i64),
    ) -> Result<Segmentation, SamError> {
        self.segment(
            image,
            Prompt::Box {
                x1: bbox.0,
                y1: bbox.1,
                x2: bbox.2,
                y2: bbox.3,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sam::types::SegmentationMask;
    use std::sync::Mutex;

    /// Records the prompt each call received.
    struct RecordingEngine {
        prompts: Mutex<Vec<Prompt>>,
    }

    #[async_trait]
    impl SegmentEngine for RecordingEngine {
        async fn segment(
            &self,
            image: &RgbImage,
            prompt: Prompt,
        ) -> Result<Segmentation, SamError> {
            self.prompts.lock().unwrap().push(prompt);
            Ok(Segmentation {
                mask: SegmentationMask::from_fn(image.width(), image.height(), |_, _| false),
                score: 0.5,
            })
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn variant(&self) -> &str {
            "mobile_sam"
        }

        fn device(&self) -> &str {
            "cpu"
        }
    }

    #[tokio::test]
    async fn test_named_operations_build_matching_prompts() {
        let engine = RecordingEngine {
            prompts: Mutex::new(Vec::new()),
        };
        let image = RgbImage::new(4, 4);

        engine.segment_by_point(&image, (1, 2), 1).await.unwrap();
        engine
            .segment_by_points(&image, vec![(1, 2), (3, 4)], None)
            .await
            .unwrap();
        engine.segment_by_box(&image, (0, 0, 3, 3)).await.unwrap();

        let prompts = engine.prompts.lock().unwrap();
        assert_eq!(prompts[0], Prompt::Point { x: 1, y: 2, label: 1 });
        assert_eq!(
            prompts[1],
            Prompt::Points {
                points: vec![(1, 2), (3, 4)],
                labels: None,
            }
        );
        assert_eq!(
            prompts[2],
            Prompt::Box {
                x1: 0,
                y1: 0,
                x2: 3,
                y2: 3,
            }
        );
    }
}
