//! # wechat2md
//!
//! Convert WeChat public-account articles to Markdown.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch     one GET with browser-like headers, body decoded as UTF-8
//!  ├─ 2. Parse     title + #js_content, lazy-loaded images resolved
//!  ├─ 3. Markdown  body HTML → Markdown, no line wrapping
//!  ├─ 4. Name      title → filesystem-safe name
//!  ├─ 5. Images    (optional) download to images/, rewrite references
//!  └─ 6. Output    <name>.md, or <name>/<name>.md with images/
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wechat2md::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .save_images(true)
//!         .output_dir("articles")
//!         .build()?;
//!     let output = convert("https://mp.weixin.qq.com/s/XXXXXXXX", &config).await?;
//!     println!("wrote {}", output.output_path.display());
//!     eprintln!("images: {} saved / {} failed",
//!         output.stats.images_saved,
//!         output.stats.images_failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `wechat2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! wechat2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_sync, render_markdown};
pub use error::{ErrorCategory, ImageError, Wechat2MdError};
pub use output::{ConversionOutput, ConversionStats, ImageRecord, ImageStatus};
pub use pipeline::filename::sanitize_filename;
pub use pipeline::markdown::{html_to_markdown, MarkdownConverter, MarkdownOptions};
pub use pipeline::parse::{parse_article, Article};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
