//! Flat zip archives of rendered pages.
//!
//! The service packs every file under its output directory into one zip;
//! the client unpacks it again. Entries are always flat: each is named by
//! the file's base name, never by its path, so nested output directories
//! collapse to the archive root and extraction cannot escape the
//! destination directory.
//!
//! Both halves are blocking and are called from `spawn_blocking`.

use crate::error::Pdf2ImgError;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Media type of the archives produced here.
pub const ARCHIVE_MIME: &str = "application/zip";

/// Zip every file under `source_dir` (recursively) into `archive_path`.
///
/// Files are visited in file-name order. Returns the entry names written.
pub fn write_flat_archive(
    source_dir: &Path,
    archive_path: &Path,
) -> Result<Vec<String>, Pdf2ImgError> {
    let file = File::create(archive_path).map_err(|e| Pdf2ImgError::OutputWriteFailed {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut names = Vec::new();

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Pdf2ImgError::Archive {
            detail: format!("Failed to walk '{}': {e}", source_dir.display()),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if names.contains(&name) {
            warn!("Skipping duplicate archive entry '{}'", name);
            continue;
        }

        zip.start_file(name.as_str(), options)?;
        let mut src = File::open(entry.path()).map_err(|e| Pdf2ImgError::Archive {
            detail: format!("Failed to read '{}': {e}", entry.path().display()),
        })?;
        std::io::copy(&mut src, &mut zip).map_err(|e| Pdf2ImgError::Archive {
            detail: format!("Failed to write entry '{name}': {e}"),
        })?;

        debug!("Archived {}", name);
        names.push(name);
    }

    zip.finish()?.flush().map_err(|e| Pdf2ImgError::OutputWriteFailed {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    Ok(names)
}

/// Extract every file entry of a zip into `dest_dir`, flattening names.
///
/// Returns the extracted paths in archive order. Entries whose name has no
/// usable final component (e.g. `..`) are rejected.
pub fn extract_flat_archive<R: Read + Seek>(
    reader: R,
    dest_dir: &Path,
) -> Result<Vec<PathBuf>, Pdf2ImgError> {
    std::fs::create_dir_all(dest_dir).map_err(|e| Pdf2ImgError::OutputWriteFailed {
        path: dest_dir.to_path_buf(),
        source: e,
    })?;

    let mut archive = ZipArchive::new(reader)?;
    let mut extracted = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let file_name = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(|n| n.to_os_string()))
            .ok_or_else(|| Pdf2ImgError::Archive {
                detail: format!("Unsafe archive entry name '{}'", entry.name()),
            })?;

        let out_path = dest_dir.join(file_name);
        let mut out = File::create(&out_path).map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: out_path.clone(),
            source: e,
        })?;
        std::io::copy(&mut entry, &mut out).map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: out_path.clone(),
            source: e,
        })?;

        extracted.push(out_path);
    }

    Ok(extracted)
}
