// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Segmentation request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// Maximum accepted payload for the embedded image (base64 encoded)
const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

fn validate_image(image: &Option<String>) -> Result<(), ApiError> {
    let image = image.as_deref().unwrap_or("");
    if image.is_empty() {
        return Err(ApiError::ValidationError {
            field: "image".to_string(),
            message: "image is required".to_string(),
        });
    }
    if image.len() > MAX_IMAGE_SIZE {
        return Err(ApiError::ValidationError {
            field: "image".to_string(),
            message: format!("image exceeds maximum size of {} bytes", MAX_IMAGE_SIZE),
        });
    }
    Ok(())
}

/// Request for single-point segmentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPointRequest {
    /// Base64/data-URL encoded image
    #[serde(default)]
    pub image: Option<String>,

    /// [x, y] in image pixel space
    #[serde(default)]
    pub point: Vec<i64>,

    /// Optional hint for object type (accepted, currently unused)
    #[serde(default)]
    pub object_prompt: Option<String>,
}

impl SegmentPointRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_image(&self.image)?;

        if self.point.len() != 2 {
            return Err(ApiError::ValidationError {
                field: "point".to_string(),
                message: format!("point must be [x, y], got {} values", self.point.len()),
            });
        }

        Ok(())
    }
}

/// Request for multi-point segmentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPointsRequest {
    /// Base64/data-URL encoded image
    #[serde(default)]
    pub image: Option<String>,

    /// [[x, y], ...] in image pixel space
    #[serde(default)]
    pub points: Vec<Vec<i64>>,

    /// Per-point labels (1 foreground, 0 background); defaults to all-foreground
    #[serde(default)]
    pub labels: Option<Vec<u8>>,

    /// Optional hint for object type (accepted, currently unused)
    #[serde(default)]
    pub object_prompt: Option<String>,
}

impl SegmentPointsRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_image(&self.image)?;

        if self.points.is_empty() {
            return Err(ApiError::ValidationError {
                field: "points".to_string(),
                message: "at least one point is required".to_string(),
            });
        }
        for (i, point) in self.points.iter().enumerate() {
            if point.len() != 2 {
                return Err(ApiError::ValidationError {
                    field: "points".to_string(),
                    message: format!("points[{}] must be [x, y], got {} values", i, point.len()),
                });
            }
        }

        Ok(())
    }
}

/// Request for bounding-box segmentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentBoxRequest {
    /// Base64/data-URL encoded image
    #[serde(default)]
    pub image: Option<String>,

    /// [x1, y1, x2, y2] in image pixel space
    #[serde(default)]
    pub r#box: Vec<i64>,
}

impl SegmentBoxRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_image(&self.image)?;

        // Box ordering is deliberately not checked; only the arity is
        if self.r#box.len() != 4 {
            return Err(ApiError::ValidationError {
                field: "box".to_string(),
                message: format!(
                    "box must be [x1, y1, x2, y2], got {} values",
                    self.r#box.len()
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_request_camel_case() {
        let json = r#"{"image": "dGVzdA==", "point": [10, 20], "objectPrompt": "cat"}"#;
        let request: SegmentPointRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.point, vec![10, 20]);
        assert_eq!(request.object_prompt.as_deref(), Some("cat"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_point_request_missing_image() {
        let request: SegmentPointRequest = serde_json::from_str(r#"{"point": [1, 2]}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_point_request_wrong_arity() {
        let request: SegmentPointRequest =
            serde_json::from_str(r#"{"image": "dGVzdA==", "point": [1, 2, 3]}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_points_request_defaults() {
        let json = r#"{"image": "dGVzdA==", "points": [[1, 2], [3, 4]]}"#;
        let request: SegmentPointsRequest = serde_json::from_str(json).unwrap();
        assert!(request.labels.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_points_request_empty_points() {
        let request: SegmentPointsRequest =
            serde_json::from_str(r#"{"image": "dGVzdA==", "points": []}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_points_request_malformed_point() {
        let request: SegmentPointsRequest =
            serde_json::from_str(r#"{"image": "dGVzdA==", "points": [[1, 2], [3]]}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_box_request_valid() {
        let request: SegmentBoxRequest =
            serde_json::from_str(r#"{"image": "dGVzdA==", "box": [40, 40, 60, 60]}"#).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_box_request_wrong_arity() {
        let request: SegmentBoxRequest =
            serde_json::from_str(r#"{"image": "dGVzdA==", "box": [40, 40, 60]}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_box_request_reversed_ordering_accepted() {
        // Ordering is passed through to the model, not validated here
        let request: SegmentBoxRequest =
            serde_json::from_str(r#"{"image": "dGVzdA==", "box": [60, 60, 40, 40]}"#).unwrap();
        assert!(request.validate().is_ok());
    }
}
