//! Error types for the pdf2img library.
//!
//! [`Pdf2ImgError`] is the single fatal error returned by every library
//! entry point: the local conversion engine, the archive helpers, and the
//! remote client. A conversion either produces every requested page or
//! fails as a whole; there is no partial-result type.
//!
//! Malformed page-range tokens are *not* errors. The page parser drops
//! them with a warning and keeps going (see [`crate::pipeline::pages`]).
//!
//! The HTTP service maps these errors onto status codes in
//! [`crate::service::ServiceError`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2img library.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input does not carry a `.pdf` extension or lacks the `%PDF` header.
    #[error("'{path}' is not a PDF file")]
    NotAPdf { path: PathBuf },

    /// The requested output format cannot be encoded.
    #[error("Unsupported output image format '{format}' (expected png, jpeg, jpg or tiff)")]
    UnsupportedFormat { format: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Render errors ─────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF could not be opened: {detail}")]
    CorruptPdf { detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: u32, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium system-wide, or set PDFIUM_LIB_PATH to the directory\n\
that contains libpdfium.so / libpdfium.dylib / pdfium.dll.\n"
    )]
    PdfiumBindingFailed(String),

    /// Encoding a rendered page into the output format failed.
    #[error("Failed to save image '{path}': {source}")]
    ImageSaveFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory or write an output file.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating or reading a zip archive failed.
    #[error("Archive error: {detail}")]
    Archive { detail: String },

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The conversion service could not be reached.
    #[error("Network error talking to '{url}': {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The conversion service answered with a non-success status.
    #[error("Server returned error {status}: {body}")]
    Server { status: u16, body: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2ImgError {
    /// True for errors caused by what the caller asked for rather than by
    /// the document or the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Pdf2ImgError::FileNotFound { .. }
                | Pdf2ImgError::PermissionDenied { .. }
                | Pdf2ImgError::NotAPdf { .. }
                | Pdf2ImgError::UnsupportedFormat { .. }
                | Pdf2ImgError::InvalidConfig(_)
        )
    }
}

impl From<zip::result::ZipError> for Pdf2ImgError {
    fn from(e: zip::result::ZipError) -> Self {
        Pdf2ImgError::Archive {
            detail: e.to_string(),
        }
    }
}
