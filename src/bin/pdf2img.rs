//! CLI binary for pdf2img.
//!
//! A thin shim over the library crate: `convert` renders locally,
//! `serve` runs the HTTP service, `remote` sends a PDF to a running service.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2img::pipeline::input::collect_pdfs;
use pdf2img::{
    ConversionConfig, ConversionEngine, ConversionProgressCallback, DocumentSource, PageRun,
    Pdf2ImgClient, ProgressCallback, ServerConfig,
};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a bar when the page count is known up front, a
/// spinner when the whole document is rendered.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new(prefix: &str) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(prefix.to_string());
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: Option<usize>) {
        if let Some(total) = total_pages {
            self.bar.set_length(total as u64);
            self.bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos:>3}/{len} pages  {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
            );
        }
        self.bar.set_message("rendering");
    }

    fn on_run_start(&self, run: PageRun) {
        self.bar.set_message(format!("pages {run}"));
    }

    fn on_page_saved(&self, label: u32, path: &Path) {
        self.bar.println(format!(
            "  {} page {:>3}  {}",
            green("✓"),
            label,
            dim(&path.display().to_string())
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, _saved: usize) {
        self.bar.finish_and_clear();
    }
}

// ── Arguments ────────────────────────────────────────────────────────────────

/// Convert PDF pages to image files, locally or through a pdf2img service.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Convert PDF pages to image files",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a PDF file, or every PDF in a directory, on this machine.
    Convert {
        /// PDF file or directory containing PDFs.
        path: PathBuf,

        /// Directory to save images into (one subfolder per PDF).
        #[arg(short, long, env = "PDF2IMG_OUTPUT")]
        output: PathBuf,

        /// Output image format: png, jpeg, jpg, tiff.
        #[arg(short, long, env = "PDF2IMG_FORMAT", default_value = "png")]
        format: String,

        /// Rendering DPI.
        #[arg(short, long, env = "PDF2IMG_DPI", default_value_t = 200)]
        dpi: u32,

        /// Pages to convert, e.g. 1,3,5-7. Default: all.
        #[arg(short, long, env = "PDF2IMG_PAGES")]
        pages: Option<String>,

        /// Disable the progress bar.
        #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
        no_progress: bool,
    },

    /// Run the HTTP conversion service.
    Serve {
        /// Address to bind.
        #[arg(long, env = "PDF2IMG_HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Port to listen on.
        #[arg(long, env = "PDF2IMG_PORT", default_value_t = 8000)]
        port: u16,

        /// Directory for request workspaces. Default: system temp dir.
        #[arg(long, env = "PDF2IMG_WORKSPACE_ROOT")]
        workspace_root: Option<PathBuf>,

        /// Largest accepted upload in MiB.
        #[arg(long, env = "PDF2IMG_MAX_UPLOAD_MB", default_value_t = 256)]
        max_upload_mb: usize,
    },

    /// Convert a PDF through a running pdf2img service.
    Remote {
        /// PDF file to upload.
        path: PathBuf,

        /// Directory to extract images into.
        #[arg(short, long, env = "PDF2IMG_OUTPUT")]
        output: PathBuf,

        /// Service base URL.
        #[arg(long, env = "PDF2IMG_SERVER_URL", default_value = "http://localhost:8000")]
        server: String,

        /// Output image format: png, jpeg, jpg, tiff.
        #[arg(short, long, env = "PDF2IMG_FORMAT", default_value = "png")]
        format: String,

        /// Rendering DPI.
        #[arg(short, long, env = "PDF2IMG_DPI", default_value_t = 200)]
        dpi: u32,

        /// Pages to convert, e.g. 1,3,5-7. Default: all.
        #[arg(short, long, env = "PDF2IMG_PAGES")]
        pages: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || matches!(cli.command, Command::Convert { no_progress: false, .. }) {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Convert {
            path,
            output,
            format,
            dpi,
            pages,
            no_progress,
        } => {
            let show_progress = !cli.quiet && !no_progress;
            run_convert(&path, &output, &format, dpi, pages, show_progress, cli.quiet).await
        }
        Command::Serve {
            host,
            port,
            workspace_root,
            max_upload_mb,
        } => {
            let defaults = ServerConfig::default();
            let config = ServerConfig {
                bind: SocketAddr::new(host, port),
                workspace_root: workspace_root.unwrap_or(defaults.workspace_root),
                max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
                ..defaults
            };
            pdf2img::service::serve(config, ConversionEngine::default())
                .await
                .context("Service failed")
        }
        Command::Remote {
            path,
            output,
            server,
            format,
            dpi,
            pages,
        } => {
            let client = Pdf2ImgClient::new(server);
            let files = client
                .convert_pages(&path, &output, &format, dpi, pages.as_deref())
                .await
                .with_context(|| format!("Remote conversion of {} failed", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{} {} images extracted to {}",
                    green("✔"),
                    files.len(),
                    output.display()
                );
            }
            Ok(())
        }
    }
}

/// Convert one PDF or a directory of PDFs into `output/<stem>/`.
///
/// With several inputs a failure is reported and the batch continues;
/// with exactly one input it is fatal.
async fn run_convert(
    path: &Path,
    output: &Path,
    format: &str,
    dpi: u32,
    pages: Option<String>,
    show_progress: bool,
    quiet: bool,
) -> Result<()> {
    let pdfs = collect_pdfs(path).context("Cannot read input")?;
    if pdfs.is_empty() {
        if !quiet {
            eprintln!("No PDF files found in {}.", path.display());
        }
        return Ok(());
    }

    let engine = ConversionEngine::default();
    let single = pdfs.len() == 1;

    for pdf in pdfs {
        let source = DocumentSource::from(pdf.as_path());
        let target = output.join(source.base_name());
        let name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut builder = ConversionConfig::builder()
            .format(format)
            .dpi(dpi)
            .maybe_pages(pages.clone());
        if show_progress {
            let cb: ProgressCallback = CliProgressCallback::new(&name);
            builder = builder.progress_callback(cb);
        }
        let config = builder.build().context("Invalid configuration")?;

        match engine.convert(source, Some(target.clone()), config).await {
            Ok(files) => {
                if !quiet {
                    eprintln!(
                        "{} Successfully converted {} to {} images in {}",
                        green("✔"),
                        name,
                        files.len(),
                        target.display()
                    );
                }
            }
            Err(e) if single => {
                return Err(e).with_context(|| format!("Error converting {name}"));
            }
            Err(e) => {
                eprintln!("{} Error converting {}: {}", red("✘"), name, e);
            }
        }
    }

    Ok(())
}
