//! Inbound notification handling.
//!
//! One POST is one request-scoped pass: read the body, normalize the
//! payload, invoke the update handler, answer with a status the notifier
//! can act on. Every rejection carries a machine-readable reason; no
//! request failure ever takes the listener down.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::server::AppState;
use crate::services::{self, MissingTarget};
use crate::types::HandlerError;

/// Machine-readable reasons a notification is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidJson,
    MissingTarget,
    HandlerTimeout,
    HandlerFailure,
    HandlerInvocationError,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::InvalidJson => "invalid_json",
            RejectReason::MissingTarget => "missing_target",
            RejectReason::HandlerTimeout => "handler_timeout",
            RejectReason::HandlerFailure => "handler_failed",
            RejectReason::HandlerInvocationError => "handler_invocation_error",
        }
    }

    /// HTTP status answered for this rejection. Payload problems are the
    /// notifier's fault (4xx); handler problems are ours (5xx), split so
    /// the notifier can tell a slow handler from a broken one.
    pub fn status(self) -> StatusCode {
        match self {
            RejectReason::InvalidJson | RejectReason::MissingTarget => StatusCode::BAD_REQUEST,
            RejectReason::HandlerTimeout => StatusCode::GATEWAY_TIMEOUT,
            RejectReason::HandlerFailure => StatusCode::BAD_GATEWAY,
            RejectReason::HandlerInvocationError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Handle one POSTed notification end to end.
pub async fn handle_notification(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("failed to read notification body: {}", e);
            return reject(RejectReason::InvalidJson, "could not read request body");
        }
    };

    info!("Received webhook: {}", String::from_utf8_lossy(&body));

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("invalid JSON in notification: {}", e);
            return reject(RejectReason::InvalidJson, &e.to_string());
        }
    };

    let command = match services::normalize(&payload, &state.config.prefixes) {
        Ok(command) => command,
        Err(MissingTarget) => {
            warn!("no usable container name in notification payload");
            return reject(
                RejectReason::MissingTarget,
                "no usable container name in payload",
            );
        }
    };

    info!(
        "Processing update for: {} (image: {}, tag: {})",
        command.container, command.image, command.tag
    );

    match services::invoke(&state.handler, &command).await {
        Ok(()) => {
            info!("Successfully triggered update for {}", command.container);
            let body = serde_json::json!({
                "status": "success",
                "container": command.container,
            });
            json_response(StatusCode::OK, body)
        }
        Err(HandlerError::Timeout) => {
            error!("Update handler timed out for {}", command.container);
            reject(RejectReason::HandlerTimeout, "update handler timed out")
        }
        Err(HandlerError::Failed { status, stderr }) => {
            error!(
                "Update handler failed for {} (status {}): {}",
                command.container, status, stderr
            );
            reject(
                RejectReason::HandlerFailure,
                &format!("update handler exited with status {status}"),
            )
        }
        Err(HandlerError::Invocation(e)) => {
            error!("Failed to execute update handler: {}", e);
            reject(
                RejectReason::HandlerInvocationError,
                "failed to execute update handler",
            )
        }
    }
}

fn reject(reason: RejectReason, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": reason.as_str(),
        "message": message,
    });
    json_response(reason.status(), body)
}

fn json_response(status: StatusCode, body: Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_status_mapping() {
        assert_eq!(RejectReason::InvalidJson.status(), StatusCode::BAD_REQUEST);
        assert_eq!(RejectReason::MissingTarget.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RejectReason::HandlerTimeout.status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(RejectReason::HandlerFailure.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            RejectReason::HandlerInvocationError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_reject_reasons_are_distinct_on_the_wire() {
        let reasons = [
            RejectReason::InvalidJson,
            RejectReason::MissingTarget,
            RejectReason::HandlerTimeout,
            RejectReason::HandlerFailure,
            RejectReason::HandlerInvocationError,
        ];
        let mut seen = std::collections::HashSet::new();
        for reason in reasons {
            assert!(seen.insert(reason.as_str()), "{}", reason.as_str());
        }
    }
}
