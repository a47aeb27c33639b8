//! Error types for the wechat2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Wechat2MdError`] — **Fatal**: the article cannot be converted at all
//!   (page unreachable, no article body, output not writable). Returned as
//!   `Err(Wechat2MdError)` from the top-level `convert*` functions.
//!
//! * [`ImageError`] — **Non-fatal**: a single image failed to download or
//!   save. Stored inside [`crate::output::ImageRecord`]; the reference keeps
//!   its remote URL and the conversion still succeeds.
//!
//! Every fatal error belongs to one [`ErrorCategory`], which the CLI uses as
//! the prefix of its error message.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the wechat2md library.
#[derive(Debug, Error)]
pub enum Wechat2MdError {
    // ── Network errors ────────────────────────────────────────────────────
    /// The request could not be sent or the body could not be read.
    #[error("request to '{url}' failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// The server answered with a non-2xx status.
    #[error("'{url}' returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The request exceeded the configured timeout.
    #[error("request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// The fetched page has no article body.
    #[error("article content not found (no element matching '{selector}')")]
    ContentNotFound { selector: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create a directory or write the output Markdown file.
    #[error("failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`Wechat2MdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fetch failure: connection error, timeout or non-2xx status.
    Network,
    /// The page was fetched but is not a recognisable article.
    Parse,
    /// Anything else (file system, configuration, runtime).
    Other,
}

impl ErrorCategory {
    /// Prefix used when reporting an error of this category.
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "network error",
            ErrorCategory::Parse => "parse error",
            ErrorCategory::Other => "error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Wechat2MdError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Wechat2MdError::RequestFailed { .. }
            | Wechat2MdError::HttpStatus { .. }
            | Wechat2MdError::Timeout { .. } => ErrorCategory::Network,
            Wechat2MdError::ContentNotFound { .. } => ErrorCategory::Parse,
            Wechat2MdError::OutputWriteFailed { .. }
            | Wechat2MdError::InvalidConfig(_)
            | Wechat2MdError::Internal(_) => ErrorCategory::Other,
        }
    }
}

/// A non-fatal error for a single image.
///
/// Stored in [`crate::output::ImageRecord`] when the download of one image
/// fails. The Markdown reference for that image is left untouched.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum ImageError {
    /// Transport failure while fetching the image.
    #[error("image {index}: download failed: {detail}")]
    Download { index: usize, detail: String },

    /// The image request timed out.
    #[error("image {index}: timed out after {secs}s")]
    Timeout { index: usize, secs: u64 },

    /// The image server answered with a non-2xx status.
    #[error("image {index}: HTTP {status}")]
    HttpStatus { index: usize, status: u16 },

    /// The image was fetched but could not be written to disk.
    #[error("image {index}: could not save '{file_name}': {detail}")]
    Write {
        index: usize,
        file_name: String,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_variants_share_a_category() {
        let errors = [
            Wechat2MdError::RequestFailed {
                url: "https://mp.weixin.qq.com/s/x".into(),
                reason: "connection refused".into(),
            },
            Wechat2MdError::HttpStatus {
                url: "https://mp.weixin.qq.com/s/x".into(),
                status: 404,
            },
            Wechat2MdError::Timeout {
                url: "https://mp.weixin.qq.com/s/x".into(),
                secs: 30,
            },
        ];
        for e in errors {
            assert_eq!(e.category(), ErrorCategory::Network, "{e}");
        }
    }

    #[test]
    fn content_not_found_is_parse_error() {
        let e = Wechat2MdError::ContentNotFound {
            selector: "#js_content".into(),
        };
        assert_eq!(e.category(), ErrorCategory::Parse);
        assert!(e.to_string().contains("#js_content"));
    }

    #[test]
    fn write_failure_is_unclassified() {
        let e = Wechat2MdError::OutputWriteFailed {
            path: PathBuf::from("/nope/out.md"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(e.category(), ErrorCategory::Other);
        assert_eq!(e.category().label(), "error");
    }

    #[test]
    fn category_labels() {
        assert_eq!(ErrorCategory::Network.to_string(), "network error");
        assert_eq!(ErrorCategory::Parse.to_string(), "parse error");
    }

    #[test]
    fn http_status_display() {
        let e = Wechat2MdError::HttpStatus {
            url: "https://example.com/a".into(),
            status: 503,
        };
        assert!(e.to_string().contains("HTTP 503"), "got: {e}");
    }

    #[test]
    fn image_error_display() {
        let e = ImageError::HttpStatus {
            index: 2,
            status: 403,
        };
        assert_eq!(e.to_string(), "image 2: HTTP 403");
    }
}
