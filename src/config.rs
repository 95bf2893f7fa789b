//! Configuration types for PDF-to-image conversion and the HTTP service.
//!
//! Conversion behaviour is controlled through [`ConversionConfig`], built via
//! its [`ConversionConfigBuilder`]. The service side is configured with
//! [`ServerConfig`]. Both are plain values that can be cloned into worker
//! tasks; nothing here is process-global.

use crate::error::Pdf2ImgError;
use crate::progress::ProgressCallback;
use image::ImageFormat;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default output format when none is given.
pub const DEFAULT_FORMAT: &str = "png";

/// Default rendering resolution in dots per inch.
pub const DEFAULT_DPI: u32 = 200;

/// Smallest accepted DPI.
pub const MIN_DPI: u32 = 36;

/// Largest accepted DPI. A Letter page at 1200 DPI is already ~135 Mpx.
pub const MAX_DPI: u32 = 1200;

/// Configuration for one PDF-to-image conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2img::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .format("jpeg")
///     .dpi(150)
///     .pages("1,3,5-7")
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Output image format, used verbatim as the file extension. Default: `"png"`.
    ///
    /// Must name a format the encoder can write: `png`, `jpeg`, `jpg`, `tiff`, `tif`,
    /// in any case. `"PNG"` writes `name_1.PNG`.
    pub format: String,

    /// Rendering DPI. Range: 36–1200. Default: 200.
    pub dpi: u32,

    /// Page-range expression such as `"1,3,5-7"`. `None` renders every page.
    pub pages: Option<String>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_string(),
            dpi: DEFAULT_DPI,
            pages: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("format", &self.format)
            .field("dpi", &self.dpi)
            .field("pages", &self.pages)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve [`Self::format`] to an encodable [`ImageFormat`].
    pub fn image_format(&self) -> Result<ImageFormat, Pdf2ImgError> {
        resolve_format(&self.format)
    }

    /// The page expression, or `None` when absent or blank.
    pub fn page_expression(&self) -> Option<&str> {
        self.pages.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Check every field without consuming the config.
    pub fn validate(&self) -> Result<(), Pdf2ImgError> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                self.dpi
            )));
        }
        self.image_format()?;
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.config.format = format.into().trim().to_string();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn pages(mut self, expression: impl Into<String>) -> Self {
        self.config.pages = Some(expression.into());
        self
    }

    pub fn maybe_pages(mut self, expression: Option<String>) -> Self {
        self.config.pages = expression;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2ImgError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Map a user-facing format name to an image encoder.
pub fn resolve_format(name: &str) -> Result<ImageFormat, Pdf2ImgError> {
    ImageFormat::from_extension(name.trim().to_lowercase())
        .filter(|f| f.writing_enabled())
        .ok_or_else(|| Pdf2ImgError::UnsupportedFormat {
            format: name.to_string(),
        })
}

// ── Service configuration ────────────────────────────────────────────────

/// Configuration for the HTTP conversion service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to. Default: `0.0.0.0:8000`.
    pub bind: SocketAddr,

    /// Directory under which request workspaces are created.
    /// Default: the system temp directory.
    pub workspace_root: PathBuf,

    /// Largest accepted request body in bytes. Default: 256 MiB.
    pub max_upload_bytes: usize,

    /// Workspaces older than this found at startup are removed. Default: 1 hour.
    pub stale_workspace_age: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            workspace_root: std::env::temp_dir(),
            max_upload_bytes: 256 * 1024 * 1024,
            stale_workspace_age: Duration::from_secs(3600),
        }
    }
}
