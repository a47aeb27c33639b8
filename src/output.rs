//! Output types returned by the conversion functions.

use crate::error::ImageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything produced by one conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Article title as found on the page (not sanitized).
    pub title: String,
    /// Final Markdown, `# title` heading included.
    pub markdown: String,
    /// Where the Markdown file was written.
    pub output_path: PathBuf,
    /// One entry per image reference when images were saved; empty otherwise.
    pub images: Vec<ImageRecord>,
    pub stats: ConversionStats,
}

/// What happened to one `![alt](url)` reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    /// 1-based position of the reference in the Markdown.
    pub index: usize,
    pub alt: String,
    /// URL as it appeared before rewriting.
    pub url: String,
    pub status: ImageStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageStatus {
    /// Downloaded; `file_name` is relative to the article directory.
    Saved { file_name: String },
    /// Download or write failed; the reference keeps its remote URL.
    Failed { error: ImageError },
    /// Not an HTTP URL; left as is.
    Skipped,
}

impl ImageRecord {
    pub fn is_saved(&self) -> bool {
        matches!(self.status, ImageStatus::Saved { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ImageStatus::Failed { .. })
    }
}

/// Summary counters for a conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Image references found (0 when images were not saved).
    pub images_found: usize,
    pub images_saved: usize,
    pub images_failed: usize,
    pub images_skipped: usize,
    /// Size of the written Markdown in bytes.
    pub markdown_bytes: usize,
    pub total_duration_ms: u64,
}

impl ConversionStats {
    pub(crate) fn from_images(images: &[ImageRecord]) -> Self {
        let saved = images.iter().filter(|r| r.is_saved()).count();
        let failed = images.iter().filter(|r| r.is_failed()).count();
        Self {
            images_found: images.len(),
            images_saved: saved,
            images_failed: failed,
            images_skipped: images.len() - saved - failed,
            ..Self::default()
        }
    }
}
