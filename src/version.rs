// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the SAM segmentation node

/// Service name reported by the status endpoint
pub const SERVICE_NAME: &str = "SAM Service";

/// Semantic version number
pub const VERSION: &str = "1.0.0";

/// Build date
pub const BUILD_DATE: &str = "2026-08-27";

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("{} {} ({})", SERVICE_NAME, VERSION, BUILD_DATE)
}
