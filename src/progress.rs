//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline fetches the article and downloads its images.
//!
//! The library itself never prints; the CLI renders these events with a
//! spinner and a progress bar, and library users can forward them wherever
//! they like.
//!
//! # Example
//!
//! ```rust
//! use wechat2md::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     saved: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, index: usize, total: usize, file_name: &str) {
//!         self.saved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("image {}/{} saved as {}", index, total, file_name);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     saved: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .save_images(true)
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the conversion pipeline at each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in pipeline order from a single task.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called just before the article page is requested.
    fn on_fetch_start(&self, url: &str) {
        let _ = url;
    }

    /// Called once the title and body have been extracted.
    fn on_article_parsed(&self, title: &str) {
        let _ = title;
    }

    /// Called before the first image request.
    ///
    /// # Arguments
    /// * `total` — number of image references found in the Markdown,
    ///   including local ones that will be skipped
    fn on_images_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when an image has been downloaded and saved.
    ///
    /// # Arguments
    /// * `index`     — 1-based position of the reference in the Markdown
    /// * `total`     — total image references
    /// * `file_name` — path relative to the article directory, e.g.
    ///   `images/image_03.png`
    fn on_image_complete(&self, index: usize, total: usize, file_name: &str) {
        let _ = (index, total, file_name);
    }

    /// Called when an image download fails; the conversion continues.
    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called when the pipeline notices something worth flagging that does
    /// not stop it (e.g. a URL that is not a WeChat article link).
    fn on_warning(&self, message: &str) {
        let _ = message;
    }

    /// Called after the Markdown file has been written.
    fn on_saved(&self, path: &Path) {
        let _ = path;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
