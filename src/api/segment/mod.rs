// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Segmentation endpoints: point, multi-point, and box prompts

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{segment_box_handler, segment_point_handler, segment_points_handler};
pub use request::{SegmentBoxRequest, SegmentPointRequest, SegmentPointsRequest};
pub use response::SegmentResponse;
