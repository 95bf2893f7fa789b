//! HTTP error responses for the conversion service.

use crate::error::Pdf2ImgError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors a request handler can end with.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request itself is unacceptable (wrong file type, bad parameter).
    #[error("{0}")]
    Validation(String),

    /// The request body exceeds the configured upload limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Anything that went wrong while staging, converting or archiving.
    #[error("{0}")]
    Internal(String),
}

/// Errors caused by the upload itself (e.g. content without a `%PDF`
/// header) are the client's fault; everything else is internal.
impl From<Pdf2ImgError> for ServiceError {
    fn from(e: Pdf2ImgError) -> Self {
        if e.is_input_error() {
            ServiceError::Validation(e.to_string())
        } else {
            ServiceError::Internal(e.to_string())
        }
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ServiceError::Internal(msg) => {
                tracing::error!("Conversion failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_bad_request() {
        let resp = ServiceError::Validation("File must be a PDF".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn library_errors_are_internal() {
        let e: ServiceError = Pdf2ImgError::CorruptPdf {
            detail: "xref".into(),
        }
        .into();
        assert!(matches!(e, ServiceError::Internal(ref m) if m.contains("xref")));
        assert_eq!(e.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upload_content_errors_are_bad_request() {
        let e: ServiceError = Pdf2ImgError::NotAPdf {
            path: "scan.pdf".into(),
        }
        .into();
        assert!(matches!(e, ServiceError::Validation(_)));
        assert_eq!(e.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn oversized_upload_is_413() {
        let resp = ServiceError::PayloadTooLarge("too big".into()).into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
