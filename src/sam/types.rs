// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt and mask types shared across the adapter and the API layer

/// A spatial prompt in the pixel space of the accompanying image.
///
/// Coordinates are never normalized or clamped; they are handed to the
/// model as-is. Box ordering (`x1 < x2`, `y1 < y2`) is expected but not
/// enforced, matching the upstream predictor contract.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    /// Single click; label 1 = foreground, 0 = background
    Point { x: i64, y: i64, label: u8 },
    /// Multiple clicks; omitted labels default to all-foreground
    Points {
        points: Vec<(i64, i64)>,
        labels: Option<Vec<u8>>,
    },
    /// Axis-aligned bounding box
    Box { x1: i64, y1: i64, x2: i64, y2: i64 },
}

/// A binary foreground mask with the dimensions of its source image.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl SegmentationMask {
    /// Create a mask from row-major pixel data.
    pub fn new(width: u32, height: u32, data: Vec<bool>) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self {
            width,
            height,
            data,
        }
    }

    /// Create a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Foreground test for pixel (x, y).
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[(y * self.width + x) as usize]
    }

    /// Row-major pixel data.
    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

/// The selected single (mask, score) pair returned to the caller.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub mask: SegmentationMask,
    /// Confidence score in [0, 1]
    pub score: f32,
}
