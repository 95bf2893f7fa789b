//! Input resolution: what document are we converting, and is it a PDF?
//!
//! A conversion starts from either a path on disk or a byte buffer already
//! in memory (an HTTP upload, a database blob). [`DocumentSource`] carries
//! both. Path sources give output files a meaningful base name; byte
//! sources fall back to [`FALLBACK_BASE_NAME`].
//!
//! We validate the `%PDF` magic bytes before handing anything to the
//! rasterizer so callers get a meaningful error rather than a pdfium crash.

use crate::error::Pdf2ImgError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Base name used for output files when the source has no file name.
pub const FALLBACK_BASE_NAME: &str = "page";

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The document a conversion reads from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A PDF file on disk.
    Path(PathBuf),
    /// Raw PDF bytes with no inherent name. Shared so the blocking worker
    /// can hold the buffer without copying it.
    Bytes(Arc<[u8]>),
}

impl DocumentSource {
    /// Base name used for output files: the file stem for path sources,
    /// [`FALLBACK_BASE_NAME`] otherwise.
    pub fn base_name(&self) -> String {
        match self {
            DocumentSource::Path(p) => p
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| FALLBACK_BASE_NAME.to_string()),
            DocumentSource::Bytes(_) => FALLBACK_BASE_NAME.to_string(),
        }
    }

    /// Short description for log lines.
    pub fn describe(&self) -> String {
        match self {
            DocumentSource::Path(p) => p.display().to_string(),
            DocumentSource::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(p: PathBuf) -> Self {
        DocumentSource::Path(p)
    }
}

impl From<&Path> for DocumentSource {
    fn from(p: &Path) -> Self {
        DocumentSource::Path(p.to_path_buf())
    }
}

impl From<&str> for DocumentSource {
    fn from(p: &str) -> Self {
        DocumentSource::Path(PathBuf::from(p))
    }
}

impl From<Vec<u8>> for DocumentSource {
    fn from(b: Vec<u8>) -> Self {
        DocumentSource::Bytes(b.into())
    }
}

impl From<&[u8]> for DocumentSource {
    fn from(b: &[u8]) -> Self {
        DocumentSource::Bytes(b.into())
    }
}

/// Check that the source exists, is readable, and starts with `%PDF`.
pub fn validate_source(source: &DocumentSource) -> Result<(), Pdf2ImgError> {
    match source {
        DocumentSource::Path(path) => validate_local(path),
        DocumentSource::Bytes(bytes) => {
            if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
                return Err(Pdf2ImgError::NotAPdf {
                    path: PathBuf::from("<bytes>"),
                });
            }
            Ok(())
        }
    }
}

fn validate_local(path: &Path) -> Result<(), Pdf2ImgError> {
    if !path.is_file() {
        return Err(Pdf2ImgError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() || &magic != PDF_MAGIC {
                return Err(Pdf2ImgError::NotAPdf {
                    path: path.to_path_buf(),
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2ImgError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2ImgError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(())
}

/// True when `name` ends in `.pdf`, case-insensitively.
pub fn has_pdf_extension(name: impl AsRef<Path>) -> bool {
    name.as_ref()
        .extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Collect the PDFs to convert from a file or a directory of files.
///
/// A file must carry the `.pdf` extension. A directory yields its direct
/// children with that extension, sorted by name (possibly none).
pub fn collect_pdfs(path: &Path) -> Result<Vec<PathBuf>, Pdf2ImgError> {
    if !path.exists() {
        return Err(Pdf2ImgError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_file() {
        if !has_pdf_extension(path) {
            return Err(Pdf2ImgError::NotAPdf {
                path: path.to_path_buf(),
            });
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = std::fs::read_dir(path).map_err(|e| Pdf2ImgError::Internal(format!(
        "Failed to list '{}': {e}",
        path.display()
    )))?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_pdf_extension(p))
        .collect();
    pdfs.sort();
    Ok(pdfs)
}
