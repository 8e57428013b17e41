//! CLI binary for edgequake-img2pdf.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service,
//! `convert` runs the same pipeline on local files.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use edgequake_img2pdf::config::DEFAULT_ALLOWED_EXTENSIONS;
use edgequake_img2pdf::{
    convert, start_server, AppState, ArtifactJanitor, ConversionConfig, ConversionMode, ConversionOutput,
    ConversionProgressCallback, ConversionRequest, ProgressCallback, ServerConfig, UploadItem,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
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
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// failed image.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} images  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Remove the bar without a summary, before a fatal error is printed.
    fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_images: usize) {
        self.bar.set_length(total_images as u64);
        self.bar.reset_eta();
    }

    fn on_image_start(&self, index: usize, _total: usize) {
        self.bar.set_message(format!("image {index}"));
    }

    fn on_image_complete(&self, _index: usize, _total: usize) {
        self.bar.inc(1);
    }

    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_images: usize, success_count: usize) {
        let failed = total_images.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} images converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} images converted  ({} failed)",
                if failed == total_images {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_images,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service on the default port (8080)
  img2pdf serve

  # Bind elsewhere, allow only JPEG and PNG
  img2pdf serve --bind 127.0.0.1:9000 --allowed-extensions jpg,jpeg,png

  # Combine local images into one PDF
  img2pdf convert scan-*.jpg -o scans.pdf

  # One PDF per image, zipped
  img2pdf convert --mode zip photos/*.png -o photos.zip

  # JSON summary (per-image results and stats)
  img2pdf convert --json a.png b.png

HTTP API:
  POST /api/convert                     multipart: files (1..n), conversionType
                                        conversionType = SINGLE_PDF | MULTIPLE_PDFS_ZIP
  GET  /api/convert/download/{filename} fetch the artifact (deleted shortly after)
  GET  /                                upload limits and accepted formats
  GET  /health                          liveness probe

ENVIRONMENT VARIABLES:
  IMG2PDF_BIND                 Listen address for `serve`
  IMG2PDF_TEMP_DIR             Directory for generated documents
  IMG2PDF_MAX_FILES            Maximum files per batch
  IMG2PDF_ALLOWED_EXTENSIONS   Comma-separated extension allow-list
  IMG2PDF_BATCH_SIZE           Images between progress log lines
  IMG2PDF_CLEANUP_DELAY        Seconds before a downloaded artifact is deleted
  IMG2PDF_MAX_REQUEST_MB       Request body limit for `serve`
  IMG2PDF_MAX_CONCURRENT       Conversions allowed to run at once
  RUST_LOG                     Overrides the log filter (e.g. edgequake_img2pdf=debug)
"#;

/// Convert images to PDF documents or ZIP archives of PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "img2pdf",
    version,
    about = "Convert images to a PDF document or a ZIP of single-page PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "IMG2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "IMG2PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP conversion service.
    Serve(ServeArgs),
    /// Convert local image files.
    Convert(ConvertArgs),
}

/// Pipeline settings shared by both subcommands.
#[derive(Args, Debug)]
struct PipelineArgs {
    /// Directory receiving generated documents [default: $TMPDIR/image-to-pdf-temp].
    #[arg(long, env = "IMG2PDF_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Maximum number of files per batch.
    #[arg(long, env = "IMG2PDF_MAX_FILES", default_value_t = 100)]
    max_files: usize,

    /// Comma-separated list of accepted file extensions.
    #[arg(long, env = "IMG2PDF_ALLOWED_EXTENSIONS", default_value = DEFAULT_ALLOWED_EXTENSIONS)]
    allowed_extensions: String,

    /// Log a progress line every N converted images.
    #[arg(long, env = "IMG2PDF_BATCH_SIZE", default_value_t = 10)]
    batch_size: usize,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "IMG2PDF_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Maximum request body size in MiB.
    #[arg(long, env = "IMG2PDF_MAX_REQUEST_MB", default_value_t = 512)]
    max_request_mb: usize,

    /// Conversions allowed to run at the same time.
    #[arg(long, env = "IMG2PDF_MAX_CONCURRENT", default_value_t = 8)]
    max_concurrent: usize,

    /// Seconds between a download and the deletion of its artifact.
    #[arg(long, env = "IMG2PDF_CLEANUP_DELAY", default_value_t = 30)]
    cleanup_delay: u64,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Image files, in page order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output layout.
    #[arg(long, env = "IMG2PDF_MODE", value_enum, default_value = "single")]
    mode: ModeArg,

    /// Move the generated artifact to this path.
    #[arg(short, long, env = "IMG2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Print the ConversionOutput as JSON.
    #[arg(long, env = "IMG2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "IMG2PDF_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// All images in one PDF.
    Single,
    /// One PDF per image, bundled in a ZIP.
    Zip,
}

impl From<ModeArg> for ConversionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Single => ConversionMode::SinglePdf,
            ModeArg::Zip => ConversionMode::MultiplePdfsZip,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are noise while the progress bar is drawing.
    let show_progress = match &cli.command {
        Command::Convert(args) => !cli.quiet && !args.no_progress && !args.json,
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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
        Command::Serve(args) => run_serve(args).await,
        Command::Convert(args) => run_convert(args, show_progress, cli.quiet).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = build_config(&args.pipeline, None)?;
    let server = ServerConfig {
        bind: args.bind,
        max_request_bytes: args.max_request_mb.saturating_mul(1024 * 1024),
        max_concurrent_conversions: args.max_concurrent,
        cleanup_delay: Duration::from_secs(args.cleanup_delay),
    };

    let state = AppState::new(config, &server);
    start_server(&server.bind, state)
        .await
        .with_context(|| format!("Server on {} failed", server.bind))
}

async fn run_convert(args: ConvertArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let items = args
        .files
        .iter()
        .map(|p| UploadItem::from_path(p).with_context(|| format!("Failed to read {:?}", p)))
        .collect::<Result<Vec<_>>>()?;
    let request = ConversionRequest::new(items, args.mode.into());

    let bar = show_progress.then(CliProgressCallback::new);
    let progress_cb = bar
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);
    let config = build_config(&args.pipeline, progress_cb)?;

    let mut output = convert(request, &config)
        .await
        .inspect_err(|_| {
            if let Some(ref bar) = bar {
                bar.abandon();
            }
        })
        .context("Conversion failed")?;

    if let Some(ref target) = args.output {
        move_artifact(&output.artifact.path, target)?;
        output.artifact.path = target.clone();
    }

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_summary(&output, quiet, show_progress);
    }

    Ok(())
}

fn print_summary(output: &ConversionOutput, quiet: bool, show_progress: bool) {
    // The artifact path is the one thing scripts need on stdout.
    println!("{}", output.artifact.path.display());
    if quiet {
        return;
    }

    if !show_progress {
        eprintln!(
            "Converted {}/{} images in {}ms",
            output.stats.processed_images, output.stats.total_images, output.stats.duration_ms
        );
        for failed in output.images.iter().filter_map(|r| r.error.as_ref()) {
            eprintln!("  {} {}", red("✗"), failed);
        }
    }
    eprintln!(
        "   {}  {}",
        dim(&format!("{} bytes", output.artifact.size_bytes)),
        dim(&format!("{}ms total", output.stats.duration_ms)),
    );
}

/// Rename `from` to `to`, copying when they sit on different file systems.
fn move_artifact(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).with_context(|| format!("Failed to write {:?}", to))?;
    ArtifactJanitor::default().remove_now(from);
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(args: &PipelineArgs, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .max_files(args.max_files)
        .allowed_extensions(&args.allowed_extensions)
        .batch_size(args.batch_size);

    if let Some(ref dir) = args.temp_dir {
        builder = builder.temp_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
