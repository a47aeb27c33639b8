//! Article fetching: one GET with browser-like headers.
//!
//! WeChat serves a reduced page to clients that do not look like a desktop
//! browser, so every request carries the same impersonation header set. The
//! client built here is reused for the image requests, which add a
//! `Referer` on top.

use crate::config::ConversionConfig;
use crate::error::Wechat2MdError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;
use tracing::{debug, info};

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_ZH: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// Host of WeChat public-account article links.
pub const WECHAT_ARTICLE_HOST: &str = "mp.weixin.qq.com";

/// Check if the URL looks like a WeChat article link.
pub fn is_wechat_article_url(url: &str) -> bool {
    url.contains(WECHAT_ARTICLE_HOST)
}

/// Build the impersonation header set.
pub fn browser_headers(user_agent: &str) -> Result<HeaderMap, Wechat2MdError> {
    let mut headers = HeaderMap::new();
    let ua = HeaderValue::from_str(user_agent)
        .map_err(|e| Wechat2MdError::InvalidConfig(format!("invalid user agent: {e}")))?;
    headers.insert(USER_AGENT, ua);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_ZH));
    Ok(headers)
}

/// Build the HTTP client shared by the article and image requests.
pub fn build_client(config: &ConversionConfig) -> Result<reqwest::Client, Wechat2MdError> {
    reqwest::Client::builder()
        .default_headers(browser_headers(&config.user_agent)?)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| Wechat2MdError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Map a transport error to the network-category error for `url`.
pub(crate) fn request_error(url: &str, err: reqwest::Error, timeout_secs: u64) -> Wechat2MdError {
    if err.is_timeout() {
        Wechat2MdError::Timeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        Wechat2MdError::RequestFailed {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Fetch the article page and return its body as UTF-8 text.
///
/// The body is always decoded as UTF-8, whatever charset the server
/// declares; invalid sequences become U+FFFD.
pub async fn fetch_article(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
) -> Result<String, Wechat2MdError> {
    info!("Fetching article: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| request_error(url, e, timeout_secs))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Wechat2MdError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| request_error(url, e, timeout_secs))?;

    debug!("Fetched {} bytes from {}", bytes.len(), url);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
