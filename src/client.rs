//! Client for a remote pdf2img conversion service.
//!
//! The mirror image of [`crate::service`]: upload a PDF as multipart form
//! data, receive a flat zip, unpack it into a destination directory.
//!
//! No request timeout is set. Large documents at high DPI can take minutes
//! and the right limit depends entirely on the deployment, so callers that
//! want one can supply their own [`reqwest::Client`].

use crate::archive::extract_flat_archive;
use crate::error::Pdf2ImgError;
use crate::pipeline::input::FALLBACK_BASE_NAME;
use crate::service::routes::UPLOAD_FIELD;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default service address.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Environment variable overriding [`DEFAULT_SERVER_URL`].
pub const SERVER_URL_ENV: &str = "PDF2IMG_SERVER_URL";

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// HTTP client for `POST /convert` and `GET /health`.
#[derive(Debug, Clone)]
pub struct Pdf2ImgClient {
    base_url: String,
    http: reqwest::Client,
}

impl Default for Pdf2ImgClient {
    fn default() -> Self {
        let url = std::env::var(SERVER_URL_ENV).unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        Self::new(url)
    }
}

impl Pdf2ImgClient {
    /// Client for the service at `base_url` (trailing `/` ignored).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Use a preconfigured `reqwest::Client` (proxies, TLS roots, timeouts).
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the reported status string, `"ok"` for a healthy service.
    pub async fn health(&self) -> Result<String, Pdf2ImgError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| network(&url, e))?;
        let response = check_status(response).await?;

        let body: HealthBody = response.json().await.map_err(|e| network(&url, e))?;
        Ok(body.status)
    }

    /// Convert `pdf_path` remotely and unpack the pages into `output_dir`.
    ///
    /// Returns the extracted file paths in archive order.
    pub async fn convert(
        &self,
        pdf_path: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        format: &str,
        dpi: u32,
    ) -> Result<Vec<PathBuf>, Pdf2ImgError> {
        self.convert_pages(pdf_path, output_dir, format, dpi, None)
            .await
    }

    /// Like [`Self::convert`], restricted to a page-range expression.
    pub async fn convert_pages(
        &self,
        pdf_path: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        format: &str,
        dpi: u32,
        pages: Option<&str>,
    ) -> Result<Vec<PathBuf>, Pdf2ImgError> {
        let pdf_path = pdf_path.as_ref();
        let output_dir = output_dir.as_ref().to_path_buf();

        if !pdf_path.is_file() {
            return Err(Pdf2ImgError::FileNotFound {
                path: pdf_path.to_path_buf(),
            });
        }

        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| Pdf2ImgError::OutputWriteFailed {
                path: output_dir.clone(),
                source: e,
            })?;

        let bytes = tokio::fs::read(pdf_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => Pdf2ImgError::PermissionDenied {
                    path: pdf_path.to_path_buf(),
                },
                _ => Pdf2ImgError::FileNotFound {
                    path: pdf_path.to_path_buf(),
                },
            })?;

        let file_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{FALLBACK_BASE_NAME}.pdf"));

        let url = format!("{}/convert", self.base_url);
        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("application/pdf")
            .map_err(|e| network(&url, e))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let mut query: Vec<(&str, String)> =
            vec![("fmt", format.to_string()), ("dpi", dpi.to_string())];
        if let Some(pages) = pages {
            query.push(("pages", pages.to_string()));
        }

        info!("Uploading {} to {}", file_name, url);
        let response = self
            .http
            .post(&url)
            .query(&query)
            .multipart(form)
            .send()
            .await
            .map_err(|e| network(&url, e))?;
        let response = check_status(response).await?;

        let archive = response.bytes().await.map_err(|e| network(&url, e))?;
        debug!("Received {} byte archive", archive.len());

        let files = tokio::task::spawn_blocking(move || {
            extract_flat_archive(Cursor::new(archive), &output_dir)
        })
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Extract task panicked: {}", e)))??;

        info!("Extracted {} images", files.len());
        Ok(files)
    }
}

fn network(url: &str, source: reqwest::Error) -> Pdf2ImgError {
    Pdf2ImgError::Network {
        url: url.to_string(),
        source,
    }
}

/// Turn a non-2xx response into [`Pdf2ImgError::Server`] carrying the body text.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Pdf2ImgError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Pdf2ImgError::Server {
        status: status.as_u16(),
        body,
    })
}
