//! Image download and link rewriting.
//!
//! Scans the Markdown for `![alt](url)` references, downloads every remote
//! one into `images/` next to the Markdown file and points the reference at
//! the local copy. Requests carry the article URL as `Referer`: the WeChat
//! image CDN serves a placeholder to requests without it.
//!
//! Files are numbered by the position of the reference in the Markdown
//! (`image_01`, `image_02`, ...), whether or not earlier downloads worked,
//! so a rerun produces the same names. Rewriting is done by position too:
//! two identical references get two files.
//!
//! A failed image is never fatal. Its reference keeps the remote URL and the
//! failure is reported through [`ImageRecord`] and the progress callback.

use crate::error::{ImageError, Wechat2MdError};
use crate::output::{ImageRecord, ImageStatus};
use crate::progress::ConversionProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{CONTENT_TYPE, REFERER};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info, warn};

/// Directory, relative to the Markdown file, that receives the images.
pub const IMAGES_DIR: &str = "images";

/// Length at which URLs are cut in failure warnings.
const WARN_URL_CHARS: usize = 50;

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());

/// One `![alt](url)` occurrence in a Markdown string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub alt: String,
    pub url: String,
    /// Byte range of the whole reference in the scanned Markdown.
    pub range: Range<usize>,
}

impl ImageRef {
    /// Whether the reference points at a remote resource.
    pub fn is_remote(&self) -> bool {
        self.url.starts_with("http")
    }
}

/// Result of [`download_images`].
#[derive(Debug, Clone)]
pub struct ImageDownload {
    /// Markdown with every saved image pointing at its local file.
    pub markdown: String,
    /// One record per reference, in scan order.
    pub records: Vec<ImageRecord>,
}

/// Find all image references, in order of appearance.
pub fn scan_images(markdown: &str) -> Vec<ImageRef> {
    RE_IMAGE
        .captures_iter(markdown)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(ImageRef {
                alt: caps[1].to_string(),
                url: caps[2].to_string(),
                range: whole.range(),
            })
        })
        .collect()
}

/// File extension for a response `Content-Type`, including the dot.
pub fn extension_for(content_type: &str) -> &'static str {
    let content_type = content_type.to_ascii_lowercase();
    if content_type.contains("png") {
        ".png"
    } else if content_type.contains("gif") {
        ".gif"
    } else if content_type.contains("webp") {
        ".webp"
    } else {
        ".jpg"
    }
}

/// `image_NN.ext` for the 1-based reference index.
pub fn image_file_name(index: usize, extension: &str) -> String {
    format!("image_{index:02}{extension}")
}

/// Download every remote image referenced in `markdown` into
/// `output_dir/images` and rewrite the references.
///
/// # Errors
/// Only a failure to create the `images` directory is fatal. Per-image
/// failures are recorded in the returned [`ImageDownload::records`].
pub async fn download_images(
    client: &reqwest::Client,
    markdown: &str,
    output_dir: &Path,
    article_url: &str,
    timeout_secs: u64,
    progress: &dyn ConversionProgressCallback,
) -> Result<ImageDownload, Wechat2MdError> {
    let images = scan_images(markdown);
    if images.is_empty() {
        debug!("No image references found");
        return Ok(ImageDownload {
            markdown: markdown.to_string(),
            records: Vec::new(),
        });
    }

    let images_dir = output_dir.join(IMAGES_DIR);
    tokio::fs::create_dir_all(&images_dir)
        .await
        .map_err(|e| Wechat2MdError::OutputWriteFailed {
            path: images_dir.clone(),
            source: e,
        })?;

    let total = images.len();
    info!("Downloading {} images to {}", total, images_dir.display());
    progress.on_images_start(total);

    let mut records = Vec::with_capacity(total);
    for (i, image) in images.iter().enumerate() {
        let index = i + 1;

        if !image.is_remote() {
            debug!("Skipping non-remote image reference: {}", image.url);
            records.push(ImageRecord {
                index,
                alt: image.alt.clone(),
                url: image.url.clone(),
                status: ImageStatus::Skipped,
            });
            continue;
        }

        let status =
            match save_image(client, image, index, &images_dir, article_url, timeout_secs).await {
                Ok(file_name) => {
                    info!("Saved image: {}", file_name);
                    progress.on_image_complete(index, total, &file_name);
                    ImageStatus::Saved { file_name }
                }
                Err(error) => {
                    warn!(
                        "Image download failed: {}... ({})",
                        truncate_chars(&image.url, WARN_URL_CHARS),
                        error
                    );
                    progress.on_image_error(index, total, &error.to_string());
                    ImageStatus::Failed { error }
                }
            };

        records.push(ImageRecord {
            index,
            alt: image.alt.clone(),
            url: image.url.clone(),
            status,
        });
    }

    let markdown = rewrite_references(markdown, &images, &records);
    Ok(ImageDownload { markdown, records })
}

/// Fetch one image and write it; returns the path relative to the article
/// directory (`images/image_NN.ext`).
async fn save_image(
    client: &reqwest::Client,
    image: &ImageRef,
    index: usize,
    images_dir: &Path,
    article_url: &str,
    timeout_secs: u64,
) -> Result<String, ImageError> {
    let transport_error = |e: reqwest::Error| {
        if e.is_timeout() {
            ImageError::Timeout {
                index,
                secs: timeout_secs,
            }
        } else {
            ImageError::Download {
                index,
                detail: e.to_string(),
            }
        }
    };

    let response = client
        .get(&image.url)
        .header(REFERER, article_url)
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ImageError::HttpStatus {
            index,
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let bytes = response.bytes().await.map_err(transport_error)?;

    let file_name = image_file_name(index, extension_for(&content_type));
    tokio::fs::write(images_dir.join(&file_name), &bytes)
        .await
        .map_err(|e| ImageError::Write {
            index,
            file_name: file_name.clone(),
            detail: e.to_string(),
        })?;

    debug!(
        "Wrote {} bytes ({}) for image {}",
        bytes.len(),
        content_type,
        index
    );
    Ok(format!("{IMAGES_DIR}/{file_name}"))
}

/// Replace each saved reference, by position, with its local path.
fn rewrite_references(markdown: &str, images: &[ImageRef], records: &[ImageRecord]) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut cursor = 0;
    for (image, record) in images.iter().zip(records) {
        if let ImageStatus::Saved { file_name } = &record.status {
            out.push_str(&markdown[cursor..image.range.start]);
            out.push_str(&format!("![{}]({})", image.alt, file_name));
            cursor = image.range.end;
        }
    }
    out.push_str(&markdown[cursor..]);
    out
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((cut, _)) => &s[..cut],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_finds_references_in_order() {
        let md = "# T\n\n![a](https://x/1.png) text ![](https://x/2)\n\n![c d](images/old.jpg)\n";
        let found = scan_images(md);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].alt, "a");
        assert_eq!(found[0].url, "https://x/1.png");
        assert_eq!(&md[found[0].range.clone()], "![a](https://x/1.png)");
        assert_eq!(found[1].alt, "");
        assert_eq!(found[2].url, "images/old.jpg");
        assert!(!found[2].is_remote());
    }

    #[test]
    fn scan_ignores_plain_links() {
        assert!(scan_images("[a](https://x) and ![broken](").is_empty());
    }

    #[test]
    fn extension_from_content_type() {
        assert_eq!(extension_for("image/png"), ".png");
        assert_eq!(extension_for("image/gif"), ".gif");
        assert_eq!(extension_for("image/webp"), ".webp");
        assert_eq!(extension_for("image/jpeg"), ".jpg");
        assert_eq!(extension_for("IMAGE/PNG; charset=binary"), ".png");
        assert_eq!(extension_for(""), ".jpg");
    }

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(image_file_name(1, ".png"), "image_01.png");
        assert_eq!(image_file_name(12, ".jpg"), "image_12.jpg");
        assert_eq!(image_file_name(123, ".gif"), "image_123.gif");
    }

    #[test]
    fn rewrite_is_positional() {
        let md = "![x](https://a/1) ![x](https://a/1) ![y](https://a/2)";
        let images = scan_images(md);
        let records = vec![
            record(1, ImageStatus::Saved {
                file_name: "images/image_01.jpg".into(),
            }),
            record(2, ImageStatus::Saved {
                file_name: "images/image_02.jpg".into(),
            }),
            record(3, ImageStatus::Failed {
                error: ImageError::HttpStatus {
                    index: 3,
                    status: 404,
                },
            }),
        ];
        let out = rewrite_references(md, &images, &records);
        assert_eq!(
            out,
            "![x](images/image_01.jpg) ![x](images/image_02.jpg) ![y](https://a/2)"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 50), "abc");
    }

    fn record(index: usize, status: ImageStatus) -> ImageRecord {
        ImageRecord {
            index,
            alt: String::new(),
            url: String::new(),
            status,
        }
    }
}
