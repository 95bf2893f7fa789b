//! Conversion entry points.
//!
//! [`ConversionEngine`] ties the pipeline together: parse and group the page
//! selection, call the rasterizer once per contiguous run, label the images,
//! and write them out as `{base}_{label}.{format}`.
//!
//! The work is blocking. [`ConversionEngine::convert_sync`] runs it on the
//! caller's thread; [`ConversionEngine::convert`] submits the same work to
//! tokio's blocking pool and awaits it, so an async caller (the HTTP
//! service) keeps serving other requests while pages render.
//!
//! A failed conversion returns `Err` and leaves any files it already wrote
//! in place. Cleaning them up is the caller's decision.

use crate::config::ConversionConfig;
use crate::error::Pdf2ImgError;
use crate::pipeline::input::{self, DocumentSource};
use crate::pipeline::pages::{group_runs, parse_page_range};
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::pipeline::save::{assign_labels, output_file_name, save_image};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One rendered page held in memory.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Page number used in the output file name (see [`assign_labels`]).
    pub label: u32,
    pub image: DynamicImage,
}

/// Renders documents through a [`Rasterizer`] and writes the pages to disk.
///
/// Cheap to clone; clones share the rasterizer.
#[derive(Clone)]
pub struct ConversionEngine {
    rasterizer: Arc<dyn Rasterizer>,
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new(Arc::new(PdfiumRasterizer::new()))
    }
}

impl std::fmt::Debug for ConversionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionEngine")
            .field("rasterizer", &"<dyn Rasterizer>")
            .finish()
    }
}

impl ConversionEngine {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Render the selected pages into memory without writing anything.
    ///
    /// A blank page expression renders the whole document. A non-blank
    /// expression with no valid page in it renders nothing.
    pub fn render_pages(
        &self,
        source: &DocumentSource,
        config: &ConversionConfig,
    ) -> Result<Vec<RenderedPage>, Pdf2ImgError> {
        config.validate()?;
        input::validate_source(source)?;

        let selection = config.page_expression().map(parse_page_range);
        if let Some(ref cb) = config.progress_callback {
            cb.on_conversion_start(selection.as_ref().map(Vec::len));
        }

        let images = match selection.as_deref() {
            None => self.rasterizer.render(source, config.dpi, None)?,
            Some([]) => {
                warn!(
                    "Page expression {:?} selects no pages; nothing to render",
                    config.pages
                );
                Vec::new()
            }
            Some(pages) => {
                let runs = group_runs(pages);
                debug!(
                    "Selected {} pages in {} runs: {}",
                    pages.len(),
                    runs.len(),
                    runs.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(",")
                );

                let mut images = Vec::with_capacity(pages.len());
                for run in runs {
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_run_start(run);
                    }
                    images.extend(self.rasterizer.render(source, config.dpi, Some(run))?);
                }
                images
            }
        };

        if let Some(pages) = selection.as_deref() {
            if pages.len() != images.len() {
                warn!(
                    "Rendered {} images for {} selected pages; numbering files sequentially",
                    images.len(),
                    pages.len()
                );
            }
        }

        let labels = assign_labels(selection.as_deref(), images.len());
        Ok(labels
            .into_iter()
            .zip(images)
            .map(|(label, image)| RenderedPage { label, image })
            .collect())
    }

    /// Convert `source` and write one image per page into `output_dir`.
    ///
    /// Returns the written paths in render order. With no `output_dir` the
    /// document is still rendered (so failures surface) but nothing is
    /// written and the list is empty.
    pub fn convert_sync(
        &self,
        source: &DocumentSource,
        output_dir: Option<&Path>,
        config: &ConversionConfig,
    ) -> Result<Vec<PathBuf>, Pdf2ImgError> {
        let start = Instant::now();
        info!("Starting conversion: {}", source.describe());

        let format = config.image_format()?;
        let pages = self.render_pages(source, config)?;

        let Some(dir) = output_dir else {
            debug!("No output directory; discarding {} rendered pages", pages.len());
            return Ok(Vec::new());
        };

        std::fs::create_dir_all(dir).map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let base = source.base_name();
        let mut written = Vec::with_capacity(pages.len());
        for page in &pages {
            let path = dir.join(output_file_name(&base, page.label, &config.format));
            save_image(&page.image, &path, format)?;
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_saved(page.label, &path);
            }
            written.push(path);
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_conversion_complete(written.len());
        }

        info!(
            "Conversion complete: {} images in {}ms → {}",
            written.len(),
            start.elapsed().as_millis(),
            dir.display()
        );
        Ok(written)
    }

    /// Async variant of [`Self::convert_sync`], executed on the blocking pool.
    pub async fn convert(
        &self,
        source: impl Into<DocumentSource>,
        output_dir: Option<PathBuf>,
        config: ConversionConfig,
    ) -> Result<Vec<PathBuf>, Pdf2ImgError> {
        let engine = self.clone();
        let source = source.into();

        tokio::task::spawn_blocking(move || {
            engine.convert_sync(&source, output_dir.as_deref(), &config)
        })
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Conversion task panicked: {}", e)))?
    }
}

/// Convert a PDF path or byte buffer with the default pdfium engine.
///
/// # Example
/// ```rust,no_run
/// use pdf2img::{convert, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::builder().pages("1,3,5-7").build()?;
/// let files = convert("report.pdf", Some("out".into()), config).await?;
/// for f in files {
///     println!("{}", f.display());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    source: impl Into<DocumentSource>,
    output_dir: Option<PathBuf>,
    config: ConversionConfig,
) -> Result<Vec<PathBuf>, Pdf2ImgError> {
    ConversionEngine::default()
        .convert(source, output_dir, config)
        .await
}

/// Blocking variant of [`convert`].
pub fn convert_sync(
    source: impl Into<DocumentSource>,
    output_dir: Option<&Path>,
    config: &ConversionConfig,
) -> Result<Vec<PathBuf>, Pdf2ImgError> {
    ConversionEngine::default().convert_sync(&source.into(), output_dir, config)
}
