//! PDF rasterisation: render pages to `DynamicImage`.
//!
//! The engine talks to the rasterizer through the [`Rasterizer`] trait so
//! that the page-selection and file-naming logic can be exercised without a
//! native PDF library. [`PdfiumRasterizer`] is the production backend.
//!
//! All methods are blocking. The async entry points in [`crate::convert`]
//! move them onto tokio's blocking pool with `spawn_blocking`, because
//! pdfium is CPU-bound and not async-safe.

use crate::error::Pdf2ImgError;
use crate::pipeline::input::DocumentSource;
use crate::pipeline::pages::PageRun;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// PDF points per inch; pdfium's native page unit.
const POINTS_PER_INCH: f32 = 72.0;

/// Environment variable naming a directory that contains the pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Renders pages of a PDF document to raster images.
pub trait Rasterizer: Send + Sync {
    /// Render `run` (1-based, inclusive) of `source` at `dpi`, or every page
    /// when `run` is `None`. Images come back in page order.
    ///
    /// Pages of `run` past the end of the document are not rendered, so the
    /// result may be shorter than the run.
    fn render(
        &self,
        source: &DocumentSource,
        dpi: u32,
        run: Option<PageRun>,
    ) -> Result<Vec<DynamicImage>, Pdf2ImgError>;
}

/// [`Rasterizer`] backed by the pdfium library via `pdfium-render`.
///
/// Binds to the library found in `$PDFIUM_LIB_PATH` when set, else to the
/// system library. Binding happens per call so the rasterizer itself is a
/// cheap, `Send + Sync` value.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// Use the library directory from `$PDFIUM_LIB_PATH`, or the system library.
    pub fn new() -> Self {
        Self {
            library_dir: std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from),
        }
    }

    /// Bind to the pdfium library inside `dir`.
    pub fn with_library_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: Some(dir.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, Pdf2ImgError> {
        let bindings = match &self.library_dir {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| Pdf2ImgError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl Default for PdfiumRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn render(
        &self,
        source: &DocumentSource,
        dpi: u32,
        run: Option<PageRun>,
    ) -> Result<Vec<DynamicImage>, Pdf2ImgError> {
        let pdfium = self.bind()?;

        let document = match source {
            DocumentSource::Path(path) => pdfium.load_pdf_from_file(path, None),
            DocumentSource::Bytes(bytes) => pdfium.load_pdf_from_byte_slice(&bytes[..], None),
        }
        .map_err(|e| Pdf2ImgError::CorruptPdf {
            detail: format!("{:?}", e),
        })?;

        let pages = document.pages();
        let total_pages = pages.len() as u32;
        info!("PDF loaded: {} pages", total_pages);

        let (first, last) = match run {
            Some(r) => (r.first, r.last),
            None => (1, total_pages),
        };
        if last > total_pages {
            warn!(
                "Skipping pages {}-{} (out of range, total={})",
                (total_pages + 1).max(first),
                last,
                total_pages
            );
        }

        let render_config =
            PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);

        let mut images = Vec::new();
        for page_num in first..=last.min(total_pages) {
            let page = pages
                .get((page_num - 1) as u16)
                .map_err(|e| Pdf2ImgError::RasterisationFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                })?;

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                Pdf2ImgError::RasterisationFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                page_num,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        Ok(images)
    }
}
