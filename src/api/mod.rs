// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod http_server;
pub mod segment;

pub use errors::{ApiError, ApiErrorResponse, ErrorResponse};
pub use http_server::{build_router, start_server, AppState};
pub use segment::{
    segment_box_handler, segment_point_handler, segment_points_handler, SegmentBoxRequest,
    SegmentPointRequest, SegmentPointsRequest, SegmentResponse,
};
