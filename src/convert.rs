//! Conversion entry points.
//!
//! [`convert`] runs the whole pipeline for one article and writes the
//! result. Every step is awaited before the next one starts; there is never
//! more than one request in flight.

use crate::config::ConversionConfig;
use crate::error::Wechat2MdError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::parse::Article;
use crate::pipeline::{fetch, filename, images, markdown, parse};
use crate::progress::{ConversionProgressCallback, NoopProgressCallback};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fetch a WeChat article and write it as Markdown.
///
/// Without `save_images` the file is `<output_dir>/<name>.md`. With it, the
/// file is `<output_dir>/<name>/<name>.md` and images go to
/// `<output_dir>/<name>/images/`. `<name>` is the sanitized title. An
/// existing file at the target path is overwritten.
///
/// # Errors
/// Returns `Err(Wechat2MdError)` for fatal errors only:
/// - the page could not be fetched (network category)
/// - the page has no article body (parse category)
/// - a directory or the Markdown file could not be written
///
/// Image failures are not errors; see [`ConversionOutput::images`].
pub async fn convert(
    url: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Wechat2MdError> {
    let total_start = Instant::now();
    let url = url.as_ref();
    let progress: &dyn ConversionProgressCallback = config
        .progress_callback
        .as_deref()
        .unwrap_or(&NoopProgressCallback);

    if !fetch::is_wechat_article_url(url) {
        let message = format!("'{url}' does not look like a WeChat article link");
        warn!("{}", message);
        progress.on_warning(&message);
    }

    // ── Step 1: Fetch ────────────────────────────────────────────────────
    let client = fetch::build_client(config)?;
    progress.on_fetch_start(url);
    let html = fetch::fetch_article(&client, url, config.timeout_secs).await?;

    // ── Step 2-3: Parse and convert ──────────────────────────────────────
    let (article, mut markdown) = render_markdown(&html)?;
    info!("Title: {}", article.title);
    progress.on_article_parsed(&article.title);

    // ── Step 4: Output location ──────────────────────────────────────────
    let name = filename::sanitize_filename(&article.title);
    let mut image_records = Vec::new();

    let target_dir = if config.save_images {
        let article_dir = config.output_dir.join(&name);
        create_dir(&article_dir).await?;

        // ── Step 5: Images ───────────────────────────────────────────────
        let download = images::download_images(
            &client,
            &markdown,
            &article_dir,
            url,
            config.timeout_secs,
            progress,
        )
        .await?;
        markdown = download.markdown;
        image_records = download.records;
        article_dir
    } else {
        create_dir(&config.output_dir).await?;
        config.output_dir.clone()
    };

    // ── Step 6: Write ────────────────────────────────────────────────────
    let output_path = target_dir.join(format!("{name}.md"));
    write_markdown(&output_path, &markdown).await?;
    info!("Saved: {}", output_path.display());
    progress.on_saved(&output_path);

    let mut stats = ConversionStats::from_images(&image_records);
    stats.markdown_bytes = markdown.len();
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    Ok(ConversionOutput {
        title: article.title,
        markdown,
        output_path,
        images: image_records,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    url: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Wechat2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Wechat2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(url, config))
}

/// Parse an article page and render it as Markdown, headed by `# title`.
///
/// No network or file access; useful for pages saved to disk.
pub fn render_markdown(html: &str) -> Result<(Article, String), Wechat2MdError> {
    let article = parse::parse_article(html)?;
    let body = markdown::html_to_markdown(&article.content_html);
    debug!("Converted body to {} bytes of Markdown", body.len());
    let document = format!("# {}\n\n{}", article.title, body);
    Ok((article, document))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn create_dir(dir: &Path) -> Result<(), Wechat2MdError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Wechat2MdError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })
}

/// Write via a temp file in the same directory, then rename over the target.
async fn write_markdown(path: &Path, markdown: &str) -> Result<(), Wechat2MdError> {
    let tmp_path: PathBuf = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown)
        .await
        .map_err(|e| Wechat2MdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Wechat2MdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
