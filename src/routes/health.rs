//! Health and version endpoints.
//!
//! /health answers a fixed healthy payload: the listener has no backing
//! services whose state could degrade it, so being up means being healthy.
//! /version reports build metadata for deployment verification.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Fixed payload for the health path.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handle GET /health and /healthz.
pub fn health_check() -> Response<Full<Bytes>> {
    let response = HealthResponse {
        status: "healthy",
        service: "seedgate-webhook",
        version: env!("CARGO_PKG_VERSION"),
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"status":"healthy"}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Build information for deployment verification.
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Git commit hash (full)
    pub commit_full: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle GET /version.
pub fn version_info() -> Response<Full<Bytes>> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "seedgate-webhook",
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"version":"unknown","commit":"unknown"}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Plain-text hint for any other GET.
pub fn usage_hint() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(
            "seedgate webhook listener - POST a container update notification to trigger the update handler\n",
        )))
        .unwrap()
}
