//! Request-scoped workspaces.
//!
//! Each conversion request gets its own uniquely named directory
//! (`pdf2img-XXXXXX`) under the configured root, holding the uploaded PDF,
//! the `images/` output directory and the finished archive. The directory
//! is a [`TempDir`]: it is removed when the [`Workspace`] is dropped. The
//! service shares it between the handler, the conversion task and the
//! response body, so it goes once the last of them is done, whether the
//! request succeeded, failed or was abandoned by the client.
//!
//! A process crash is the one path `Drop` cannot cover, so the server
//! sweeps stale workspaces once at startup with [`sweep_stale`].

use crate::error::Pdf2ImgError;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "pdf2img-";

/// Name of the output subdirectory inside a workspace.
pub const IMAGES_DIR: &str = "images";

/// Name of the archive inside a workspace.
pub const ARCHIVE_NAME: &str = "result.zip";

/// An exclusively owned temporary directory for one request.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh, uniquely named workspace under `root`.
    pub fn create(root: &Path) -> Result<Self, Pdf2ImgError> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)
            .map_err(|e| Pdf2ImgError::OutputWriteFailed {
                path: root.to_path_buf(),
                source: e,
            })?;
        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the uploaded document is stored. Only the final component of
    /// `upload_name` is used.
    pub fn document_path(&self, upload_name: &str) -> PathBuf {
        let name = Path::new(upload_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "upload.pdf".into());
        self.path().join(name)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.path().join(IMAGES_DIR)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.path().join(ARCHIVE_NAME)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        debug!("Releasing workspace {}", self.dir.path().display());
    }
}

/// Remove workspaces under `root` older than `max_age`. Returns how many
/// were removed. Failures are logged and skipped.
pub fn sweep_stale(root: &Path, max_age: Duration) -> usize {
    let Ok(entries) = std::fs::read_dir(root) else {
        warn!("Cannot list workspace root {}", root.display());
        return 0;
    };

    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(WORKSPACE_PREFIX) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_dir() {
            continue;
        }

        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if age < max_age {
            continue;
        }

        match std::fs::remove_dir_all(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove stale workspace {}: {}", entry.path().display(), e),
        }
    }

    if removed > 0 {
        info!("Removed {} stale workspaces from {}", removed, root.display());
    }
    removed
}
