//! Shared fixtures: rasterizers that need no native PDF library.

#![allow(dead_code)]

use image::{DynamicImage, Rgba, RgbaImage};
use pdf2img::{DocumentSource, PageRun, Pdf2ImgError, Rasterizer};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Enough of a PDF to pass the `%PDF` header check.
pub const PDF_STUB: &[u8] = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

pub fn write_pdf_stub(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, PDF_STUB).unwrap();
    path
}

/// Pretends every document has `page_count` pages; page `n` is a small
/// square filled with red channel `n`.
pub struct SolidRasterizer {
    page_count: u32,
    calls: Mutex<Vec<Option<PageRun>>>,
}

impl SolidRasterizer {
    pub fn new(page_count: u32) -> Arc<Self> {
        Arc::new(Self {
            page_count,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every `run` argument received, in call order.
    pub fn calls(&self) -> Vec<Option<PageRun>> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn solid_page(page: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([page as u8, 40, 80, 255])))
}

impl Rasterizer for SolidRasterizer {
    fn render(
        &self,
        _source: &DocumentSource,
        _dpi: u32,
        run: Option<PageRun>,
    ) -> Result<Vec<DynamicImage>, Pdf2ImgError> {
        self.calls.lock().unwrap().push(run);
        let (first, last) = match run {
            Some(r) => (r.first, r.last.min(self.page_count)),
            None => (1, self.page_count),
        };
        Ok((first..=last).map(solid_page).collect())
    }
}

/// A [`SolidRasterizer`] that takes `delay` per render call.
pub struct SlowRasterizer {
    inner: Arc<SolidRasterizer>,
    delay: Duration,
    finished: AtomicBool,
}

impl SlowRasterizer {
    pub fn new(page_count: u32, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: SolidRasterizer::new(page_count),
            delay,
            finished: AtomicBool::new(false),
        })
    }

    /// Wait until a render call has returned.
    pub async fn wait_finished(&self) {
        for _ in 0..200 {
            if self.finished.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("render never finished");
    }
}

impl Rasterizer for SlowRasterizer {
    fn render(
        &self,
        source: &DocumentSource,
        dpi: u32,
        run: Option<PageRun>,
    ) -> Result<Vec<DynamicImage>, Pdf2ImgError> {
        std::thread::sleep(self.delay);
        let images = self.inner.render(source, dpi, run);
        self.finished.store(true, Ordering::SeqCst);
        images
    }
}

/// Fails every render as a damaged document would.
pub struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn render(
        &self,
        _source: &DocumentSource,
        _dpi: u32,
        _run: Option<PageRun>,
    ) -> Result<Vec<DynamicImage>, Pdf2ImgError> {
        Err(Pdf2ImgError::CorruptPdf {
            detail: "xref table missing".to_string(),
        })
    }
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
