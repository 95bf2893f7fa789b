//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the engine renders each run and saves each page.
//!
//! # Example
//!
//! ```rust
//! use pdf2img::{ConversionProgressCallback, ConversionConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     saved: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_saved(&self, label: u32, path: &Path) {
//!         self.saved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {label} -> {}", path.display());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { saved: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::pages::PageRun;
use std::path::Path;
use std::sync::Arc;

/// Called by the conversion engine as it renders and saves pages.
///
/// Runs on the blocking worker thread that performs the conversion, so
/// implementations must be `Send + Sync`. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before rendering starts.
    ///
    /// `total_pages` is the size of the explicit selection, or `None` when
    /// the whole document is rendered and the count is not known up front.
    fn on_conversion_start(&self, total_pages: Option<usize>) {
        let _ = total_pages;
    }

    /// Called before the rasterizer is invoked for one contiguous run.
    fn on_run_start(&self, run: PageRun) {
        let _ = run;
    }

    /// Called after each image file is written.
    fn on_page_saved(&self, label: u32, path: &Path) {
        let _ = (label, path);
    }

    /// Called once after every page has been written.
    fn on_conversion_complete(&self, saved: usize) {
        let _ = saved;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
