use axum::extract::rejection::{BytesRejection, PathRejection, QueryRejection};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Longest upstream body excerpt carried in an error message.
const MAX_UPSTREAM_BODY_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Apigee organization not sent in x-apigee-org header")]
    MissingOrganization,

    #[error("must supply an authorization header with a bearer token")]
    MissingAuthorization,

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// An axum extractor refused the request (bad path encoding, body too large).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("management API returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("management API unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("management API request timed out")]
    UpstreamTimeout,

    #[error("malformed management API response: {0}")]
    MalformedResponse(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Builds an `Upstream` error from a non-2xx response body, masking any
    /// consumer secrets it echoes and trimming it to a bounded excerpt.
    pub fn upstream(status: StatusCode, body: &[u8]) -> Self {
        let text = match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(mut value) => {
                crate::middleware::redact::scrub_secrets(&mut value);
                value.to_string()
            }
            Err(_) => String::from_utf8_lossy(body).into_owned(),
        };
        let body = if text.chars().count() > MAX_UPSTREAM_BODY_CHARS {
            let mut cut: String = text.chars().take(MAX_UPSTREAM_BODY_CHARS).collect();
            cut.push('…');
            cut
        } else {
            text
        };
        AppError::Upstream { status, body }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingOrganization
            | AppError::MissingAuthorization
            | AppError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { status, .. } => *status,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            // Caller-side problems reported by the management API (bad token,
            // unknown app) keep their status; its own failures become 502.
            AppError::Upstream { status, .. } if status.is_client_error() => *status,
            AppError::Upstream { .. }
            | AppError::UpstreamUnreachable(_)
            | AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

macro_rules! from_rejection {
    ($($rejection:ty),*) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    AppError::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )*
    };
}

from_rejection!(PathRejection, QueryRejection, BytesRejection);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let msg = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "internal server error".to_string()
            }
            AppError::MissingOrganization
            | AppError::MissingAuthorization
            | AppError::InvalidQuery(_)
            | AppError::Rejected { .. }
            | AppError::MethodNotAllowed(_) => {
                tracing::warn!("rejected request: {}", self);
                self.to_string()
            }
            _ => {
                tracing::error!("We failed with error: {}", self);
                self.to_string()
            }
        };

        let body = Json(json!({
            "error": msg,
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_headers_are_client_errors() {
        assert_eq!(AppError::MissingOrganization.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingAuthorization.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_client_errors_keep_their_status() {
        let err = AppError::upstream(StatusCode::NOT_FOUND, br#"{"code":"app.not.found"}"#);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = AppError::upstream(StatusCode::UNAUTHORIZED, b"");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_upstream_server_errors_become_bad_gateway() {
        let err = AppError::upstream(StatusCode::SERVICE_UNAVAILABLE, b"down");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            AppError::MalformedResponse("x".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_upstream_body_is_truncated() {
        let long = "x".repeat(2000);
        match AppError::upstream(StatusCode::BAD_REQUEST, long.as_bytes()) {
            AppError::Upstream { body, .. } => {
                assert_eq!(body.chars().count(), MAX_UPSTREAM_BODY_CHARS + 1);
                assert!(body.ends_with('…'));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_upstream_body_secrets_are_masked() {
        let body = br#"{"message":"conflict","app":{"credentials":[{"consumerSecret":"s3cr3t"}]}}"#;
        let err = AppError::upstream(StatusCode::CONFLICT, body);
        let text = err.to_string();
        assert!(!text.contains("s3cr3t"), "secret leaked: {}", text);
        assert!(text.contains("**********"));
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let resp = AppError::MissingOrganization.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], 400);
        assert_eq!(
            json["error"],
            "Apigee organization not sent in x-apigee-org header"
        );
    }

    #[test]
    fn test_rejections_keep_their_status() {
        let err = AppError::Rejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".into(),
        };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_string(), "length limit exceeded");
        assert_eq!(
            AppError::MethodNotAllowed(Method::POST).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let resp = AppError::Internal(anyhow::anyhow!("pool poisoned")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], 500);
        assert_eq!(json["error"], "internal server error");
    }
}
