//! Configuration types for article conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The CLI maps its flags onto the
//! builder; library users set only what they care about and rely on the
//! defaults for the rest.

use crate::error::Wechat2MdError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Desktop Chrome user agent sent with every request.
///
/// The WeChat article server returns a stripped "open in WeChat" page to
/// unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Per-request timeout in seconds, applied to the article and to each image.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for converting one article.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use wechat2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .save_images(true)
///     .output_dir("articles")
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, 30);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Download images and nest the output under a per-article directory.
    /// Default: false.
    pub save_images: bool,

    /// Base output directory. Default: the current directory (`.`).
    pub output_dir: PathBuf,

    /// Timeout for each HTTP request in seconds. Default: 30.
    pub timeout_secs: u64,

    /// `User-Agent` header value. Default: [`DEFAULT_USER_AGENT`].
    pub user_agent: String,

    /// Optional progress callback for fetch and image events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            save_images: false,
            output_dir: PathBuf::from("."),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("save_images", &self.save_images)
            .field("output_dir", &self.output_dir)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
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
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn save_images(mut self, v: bool) -> Self {
        self.config.save_images = v;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Wechat2MdError> {
        let c = &self.config;
        if c.timeout_secs == 0 {
            return Err(Wechat2MdError::InvalidConfig(
                "timeout must be at least 1 second".into(),
            ));
        }
        if c.user_agent.trim().is_empty() {
            return Err(Wechat2MdError::InvalidConfig(
                "user agent must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
