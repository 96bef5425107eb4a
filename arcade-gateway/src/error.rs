//! Error types for the gateway crate.

use arcade_core::{CoreError, LaunchErrorKind};
use arcade_launcher::LauncherError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors that can occur during gateway request handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// A launch was refused or failed.
    #[error("launch failed: {0}")]
    Launch(LaunchErrorKind),

    /// A path or body parameter is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] CoreError),

    /// Catalog or access store failure.
    #[error("launcher error: {0}")]
    Launcher(#[from] LauncherError),
}

/// HTTP status for a failed launch.
#[must_use]
pub fn status_for(kind: LaunchErrorKind) -> StatusCode {
    match kind {
        LaunchErrorKind::AccessDenied => StatusCode::FORBIDDEN,
        LaunchErrorKind::NotFound => StatusCode::NOT_FOUND,
        LaunchErrorKind::InvalidFilename | LaunchErrorKind::Traversal => StatusCode::BAD_REQUEST,
        LaunchErrorKind::SizeExceeded => StatusCode::PAYLOAD_TOO_LARGE,
        LaunchErrorKind::ContentRejected => StatusCode::UNPROCESSABLE_ENTITY,
        LaunchErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Launch(kind) => (
                status_for(kind),
                Json(json!({
                    "status": "failed",
                    "kind": kind,
                    "message": kind.user_message(),
                    "score": 0,
                })),
            )
                .into_response(),
            GatewayError::InvalidRequest(e) => {
                (StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))).into_response()
            }
            GatewayError::Launcher(e) => {
                tracing::error!(error = %e, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "internal error"})),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_kinds_map_to_status_codes() {
        let cases = [
            (LaunchErrorKind::AccessDenied, StatusCode::FORBIDDEN),
            (LaunchErrorKind::NotFound, StatusCode::NOT_FOUND),
            (LaunchErrorKind::InvalidFilename, StatusCode::BAD_REQUEST),
            (LaunchErrorKind::Traversal, StatusCode::BAD_REQUEST),
            (LaunchErrorKind::SizeExceeded, StatusCode::PAYLOAD_TOO_LARGE),
            (LaunchErrorKind::ContentRejected, StatusCode::UNPROCESSABLE_ENTITY),
            (LaunchErrorKind::Timeout, StatusCode::GATEWAY_TIMEOUT),
            (LaunchErrorKind::Encoding, StatusCode::INTERNAL_SERVER_ERROR),
            (LaunchErrorKind::LaunchFailure, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            assert_eq!(GatewayError::Launch(kind).into_response().status(), status, "{kind}");
        }
    }

    #[test]
    fn invalid_user_id_is_bad_request() {
        let err = GatewayError::from(CoreError::InvalidUserId { reason: "empty".to_owned() });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn launcher_errors_do_not_leak_detail() {
        let err = GatewayError::Launcher(LauncherError::Task("blocking pool gone at /srv/x".to_owned()));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = match axum::body::to_bytes(resp.into_body(), 1024).await {
            Ok(b) => b,
            Err(e) => panic!("failed to read body: {e}"),
        };
        assert!(!String::from_utf8_lossy(&bytes).contains("/srv/x"));
    }
}
