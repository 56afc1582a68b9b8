// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Segmentation endpoint handlers
//!
//! All three handlers follow the same protocol: readiness gate, decode
//! the image, run the matching adapter operation, encode the mask. A
//! failure at any step short-circuits with one structured error
//! response.

use axum::{extract::State, Json};
use image::RgbImage;
use tracing::{info, warn};

use super::request::{SegmentBoxRequest, SegmentPointRequest, SegmentPointsRequest};
use super::response::SegmentResponse;
use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::sam::{mask_to_base64, SamError, Segmentation};
use crate::vision::decode_base64_image;

/// POST /segment/point - Segment object by single point click
pub async fn segment_point_handler(
    State(state): State<AppState>,
    Json(request): Json<SegmentPointRequest>,
) -> Result<Json<SegmentResponse>, ApiErrorResponse> {
    request.validate()?;
    check_ready(&state)?;

    info!("Segmenting by point: {:?}", request.point);

    let image = decode_image(&request.image)?;
    let result = state
        .engine
        .segment_by_point(&image, (request.point[0], request.point[1]), 1)
        .await
        .map_err(map_sam_error)?;

    respond(result, "Segmentation successful")
}

/// POST /segment/points - Segment object by multiple points
pub async fn segment_points_handler(
    State(state): State<AppState>,
    Json(request): Json<SegmentPointsRequest>,
) -> Result<Json<SegmentResponse>, ApiErrorResponse> {
    request.validate()?;
    check_ready(&state)?;

    info!("Segmenting by {} points", request.points.len());

    let image = decode_image(&request.image)?;
    let points: Vec<(i64, i64)> = request.points.iter().map(|p| (p[0], p[1])).collect();
    let result = state
        .engine
        .segment_by_points(&image, points, request.labels.clone())
        .await
        .map_err(map_sam_error)?;

    respond(result, "Multi-point segmentation successful")
}

/// POST /segment/box - Segment object by bounding box
pub async fn segment_box_handler(
    State(state): State<AppState>,
    Json(request): Json<SegmentBoxRequest>,
) -> Result<Json<SegmentResponse>, ApiErrorResponse> {
    request.validate()?;
    check_ready(&state)?;

    info!("Segmenting by box: {:?}", request.r#box);

    let image = decode_image(&request.image)?;
    let b = &request.r#box;
    let result = state
        .engine
        .segment_by_box(&image, (b[0], b[1], b[2], b[3]))
        .await
        .map_err(map_sam_error)?;

    respond(result, "Box segmentation successful")
}

/// Readiness gate: runs before any decode or inference work.
fn check_ready(state: &AppState) -> Result<(), ApiError> {
    if !state.engine.is_ready() {
        warn!("SAM model not ready");
        return Err(ApiError::ServiceUnavailable("SAM model not ready".to_string()));
    }
    Ok(())
}

fn decode_image(image: &Option<String>) -> Result<RgbImage, ApiError> {
    let payload = image.as_deref().unwrap_or("");
    let (image, info) = decode_base64_image(payload).map_err(|e| {
        warn!("Failed to decode image: {}", e);
        ApiError::InvalidRequest(format!("Invalid image: {}", e))
    })?;
    info!(
        "Decoded image: {}x{}, {} bytes",
        info.width, info.height, info.size_bytes
    );
    Ok(image)
}

fn map_sam_error(error: SamError) -> ApiError {
    match error {
        SamError::InvalidPrompt(msg) => {
            warn!("Invalid prompt: {}", msg);
            ApiError::InvalidRequest(format!("Invalid prompt: {}", msg))
        }
        other => {
            warn!("Segmentation failed: {}", other);
            ApiError::InternalError(other.to_string())
        }
    }
}

fn respond(
    result: Segmentation,
    message: &str,
) -> Result<Json<SegmentResponse>, ApiErrorResponse> {
    let mask_base64 = mask_to_base64(&result.mask)
        .map_err(|e| ApiError::InternalError(format!("Failed to encode mask: {}", e)))?;

    info!("Segmentation complete, score {:.3}", result.score);

    Ok(Json(SegmentResponse::ok(mask_base64, result.score, message)))
}
