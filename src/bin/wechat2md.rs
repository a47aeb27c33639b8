//! CLI binary for wechat2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, renders progress, and turns errors into a
//! category-prefixed message and exit status 1.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wechat2md::{
    convert, ConversionConfig, ConversionOutput, ConversionProgressCallback, ErrorCategory,
    ProgressCallback, Wechat2MdError,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while the article is fetched, then a bar
/// over the image references.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Fetching");
        bar.set_message("article…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_fetch_start(&self, url: &str) {
        self.bar.set_message(url.to_string());
    }

    fn on_article_parsed(&self, title: &str) {
        self.bar.println(format!("{} {}", cyan("◆"), bold(title)));
        self.bar.set_prefix("Converting");
        self.bar.set_message("");
    }

    fn on_warning(&self, message: &str) {
        self.bar
            .println(format!("{} {}", yellow("⚠"), yellow(message)));
    }

    fn on_images_start(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} images  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Downloading");
    }

    fn on_image_complete(&self, index: usize, total: usize, file_name: &str) {
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(file_name),
        ));
        self.bar.set_position(index as u64);
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
            red(&msg),
        ));
        self.bar.set_position(index as u64);
    }

    fn on_saved(&self, _path: &Path) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert into the current directory
  wechat2md https://mp.weixin.qq.com/s/XXXXXXXX

  # Convert into ./articles
  wechat2md https://mp.weixin.qq.com/s/XXXXXXXX -o articles

  # Download images too: writes <title>/<title>.md and <title>/images/
  wechat2md --save-images https://mp.weixin.qq.com/s/XXXXXXXX

  # Machine-readable report
  wechat2md --json https://mp.weixin.qq.com/s/XXXXXXXX > report.json

EXIT STATUS:
  0  the Markdown file was written (failed images do not count as failure)
  1  network error, parse error, or any other error

ENVIRONMENT VARIABLES:
  RUST_LOG   Override the log filter (e.g. RUST_LOG=wechat2md=debug)
"#;

/// Convert a WeChat public-account article to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "wechat2md",
    version,
    about = "Convert a WeChat public-account article to Markdown",
    long_about = "Fetch a WeChat public-account article, extract its title and body, and save \
it as a Markdown file. With --save-images the article's images are downloaded as well and the \
Markdown points at the local copies.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Article URL (https://mp.weixin.qq.com/s/...).
    url: String,

    /// Download images and nest the output in a per-article directory.
    #[arg(long)]
    save_images: bool,

    /// Base output directory (default: current directory).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// HTTP timeout per request in seconds.
    #[arg(long, default_value_t = 30,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Print the conversion report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress display.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress display replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let progress = show_progress.then(CliProgressCallback::new);
    let result = run(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn ConversionProgressCallback>),
    )
    .await;
    if let Some(ref cb) = progress {
        cb.clear();
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {:#}", category_of(&err).label(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, progress: Option<ProgressCallback>) -> Result<()> {
    let config = build_config(cli, progress)?;
    let output = convert(&cli.url, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else if !cli.quiet {
        print_summary(&output);
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .save_images(cli.save_images)
        .timeout_secs(cli.timeout);

    if let Some(ref dir) = cli.output {
        builder = builder.output_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(output: &ConversionOutput) {
    eprintln!(
        "{}  Saved: {}  {}",
        green("✔"),
        bold(&output.output_path.display().to_string()),
        dim(&format!("{}ms", output.stats.total_duration_ms)),
    );
    let stats = &output.stats;
    if stats.images_found > 0 {
        eprintln!(
            "   images: {} saved  /  {} failed  /  {} skipped",
            stats.images_saved,
            if stats.images_failed > 0 {
                red(&stats.images_failed.to_string())
            } else {
                stats.images_failed.to_string()
            },
            stats.images_skipped,
        );
    }
}

/// Category of the first library error in the chain.
fn category_of(err: &anyhow::Error) -> ErrorCategory {
    err.chain()
        .find_map(|e| e.downcast_ref::<Wechat2MdError>())
        .map(Wechat2MdError::category)
        .unwrap_or(ErrorCategory::Other)
}
