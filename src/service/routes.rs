//! Conversion service routes.
//!
//! Endpoints:
//! - POST /convert?fmt=png&dpi=200&pages=1-3 - multipart upload (field `file`), returns a zip
//! - GET /health - liveness probe

use axum::{
    body::{Body, Bytes},
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
        Multipart, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::io::ReaderStream;

use super::error::ServiceError;
use super::workspace::Workspace;
use super::ServiceState;
use crate::archive::{write_flat_archive, ARCHIVE_MIME};
use crate::config::{ConversionConfig, DEFAULT_DPI, DEFAULT_FORMAT};
use crate::error::Pdf2ImgError;
use crate::pipeline::input::{has_pdf_extension, DocumentSource};

/// Multipart field that carries the document.
pub const UPLOAD_FIELD: &str = "file";

/// Suffix appended to the document's base name for the archive download.
pub const ARCHIVE_SUFFIX: &str = "_images.zip";

// ============================================================================
// Request / Response types
// ============================================================================

/// Query parameters of `POST /convert`.
#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    #[serde(default = "default_format")]
    pub fmt: String,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default)]
    pub pages: Option<String>,
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /convert
///
/// Validates the upload, stages it in a fresh workspace, converts it into
/// `images/`, zips the result and streams the zip back.
///
/// The workspace is shared between this handler, the blocking conversion
/// task and the response body. It is removed when the last of them lets
/// go, so a client that disconnects mid-conversion cannot leave a
/// directory behind once the task finishes.
pub async fn convert(
    State(state): State<ServiceState>,
    params: Result<Query<ConvertParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServiceError> {
    let Query(params) =
        params.map_err(|e| ServiceError::Validation(format!("Invalid query: {}", e.body_text())))?;
    let mut multipart = multipart.map_err(|e| {
        ServiceError::Validation(format!("Invalid multipart request: {}", e.body_text()))
    })?;

    let config = ConversionConfig::builder()
        .format(params.fmt)
        .dpi(params.dpi)
        .maybe_pages(params.pages)
        .build()
        .map_err(|e| ServiceError::Validation(e.to_string()))?;

    let (file_name, bytes) = read_upload(&mut multipart).await?;

    let workspace = Arc::new(Workspace::create(&state.config.workspace_root)?);
    tracing::info!(
        file_name = %file_name,
        size = bytes.len(),
        format = %config.format,
        dpi = config.dpi,
        workspace = %workspace.path().display(),
        "Conversion request staged"
    );

    let document = workspace.document_path(&file_name);
    tokio::fs::write(&document, &bytes)
        .await
        .map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: document.clone(),
            source: e,
        })?;

    let engine = state.engine.clone();
    let job = Arc::clone(&workspace);
    let (written, entries) = tokio::task::spawn_blocking(move || {
        let images_dir = job.images_dir();
        let written =
            engine.convert_sync(&DocumentSource::from(document), Some(&images_dir), &config)?;
        let entries = write_flat_archive(&images_dir, &job.archive_path())?;
        Ok::<_, Pdf2ImgError>((written, entries))
    })
    .await
    .map_err(|e| ServiceError::Internal(format!("Conversion task panicked: {e}")))??;

    let archive_path = workspace.archive_path();
    let file = tokio::fs::File::open(&archive_path)
        .await
        .map_err(|e| ServiceError::Internal(format!("Failed to open archive: {e}")))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| ServiceError::Internal(format!("Failed to stat archive: {e}")))?
        .len();

    tracing::info!(
        file_name = %file_name,
        pages = written.len(),
        entries = entries.len(),
        bytes = length,
        "Conversion request archived"
    );

    let body = Body::from_stream(ArchiveBody {
        inner: ReaderStream::new(file),
        _workspace: workspace,
    });

    Ok((
        [
            (header::CONTENT_TYPE, ARCHIVE_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&archive_file_name(&file_name)),
            ),
            (header::CONTENT_LENGTH, length.to_string()),
        ],
        body,
    )
        .into_response())
}

/// Pull the `file` field out of the form and check its extension.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Bytes), ServiceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error("Failed to read multipart field", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !has_pdf_extension(&file_name) {
            return Err(ServiceError::Validation("File must be a PDF".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error("Failed to read file data", e))?;
        return Ok((file_name, bytes));
    }

    Err(ServiceError::Validation(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// An oversized body is reported as 413, every other read failure as 400.
fn upload_error(context: &str, e: MultipartError) -> ServiceError {
    let detail = format!("{context}: {}", e.body_text());
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::PayloadTooLarge(detail)
    } else {
        ServiceError::Validation(detail)
    }
}

/// `{stem}_images.zip` for an uploaded `{stem}.pdf`.
pub fn archive_file_name(upload_name: &str) -> String {
    let stem = Path::new(upload_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());
    format!("{stem}{ARCHIVE_SUFFIX}")
}

/// Header values must be visible ASCII; anything else becomes `_`.
fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

// ============================================================================
// Streaming body
// ============================================================================

/// Streams the archive and holds the workspace, so the directory outlives
/// the handler until the last chunk is sent or the client goes away.
struct ArchiveBody {
    inner: ReaderStream<tokio::fs::File>,
    _workspace: Arc<Workspace>,
}

impl Stream for ArchiveBody {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_uses_stem() {
        assert_eq!(archive_file_name("report.pdf"), "report_images.zip");
        assert_eq!(archive_file_name("a.b.PDF"), "a.b_images.zip");
        assert_eq!(archive_file_name(".pdf"), ".pdf_images.zip");
        assert_eq!(archive_file_name(""), "document_images.zip");
    }

    #[test]
    fn disposition_is_ascii_safe() {
        assert_eq!(
            content_disposition("report_images.zip"),
            "attachment; filename=\"report_images.zip\""
        );
        assert_eq!(
            content_disposition("報告 \"x\".zip"),
            "attachment; filename=\"__ _x_.zip\""
        );
    }
}
