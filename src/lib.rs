//! # pdf2img
//!
//! Convert PDF documents into one image file per page, in-process or
//! through a small HTTP service.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (path or bytes)
//!  │
//!  ├─ 1. Input   validate the source (exists, `%PDF` header)
//!  ├─ 2. Pages   "1,3,5-7" → [1,3,5,6,7] → runs (1-1)(3-3)(5-7)
//!  ├─ 3. Render  one rasterizer call per run (pdfium, spawn_blocking)
//!  └─ 4. Save    {name}_{page}.{fmt}, page numbers preserved
//! ```
//!
//! Over the network the same engine runs inside [`service`]: the upload is
//! staged in a request-scoped workspace, converted, zipped flat and
//! streamed back; the workspace is removed on every exit path.
//! [`client::Pdf2ImgClient`] is the other end of that exchange.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2img::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .format("png")
//!         .dpi(200)
//!         .pages("1,3,5-7")
//!         .build()?;
//!     let files = convert("document.pdf", Some("out".into()), config).await?;
//!     eprintln!("wrote {} images", files.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## PDFium
//!
//! Rendering uses the pdfium library through `pdfium-render`. Set
//! `PDFIUM_LIB_PATH` to the directory holding `libpdfium` if it is not
//! installed system-wide.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::Pdf2ImgClient;
pub use config::{ConversionConfig, ConversionConfigBuilder, ServerConfig};
pub use convert::{convert, convert_sync, ConversionEngine, RenderedPage};
pub use error::Pdf2ImgError;
pub use pipeline::input::DocumentSource;
pub use pipeline::pages::{group_runs, parse_page_range, PageRun};
pub use pipeline::render::{PdfiumRasterizer, Rasterizer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
