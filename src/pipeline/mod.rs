//! Pipeline stages for article-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step and can be
//! used and tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ parse ──▶ markdown ──▶ filename ──▶ images (optional)
//! (HTTP)    (title,    (HTML→MD)    (safe name)   (download + rewrite)
//!           body)
//! ```
//!
//! 1. [`fetch`]    — GET the article page with browser-like headers
//! 2. [`parse`]    — extract the title and `#js_content`, resolve lazy images
//! 3. [`markdown`] — render the body HTML as unwrapped Markdown
//! 4. [`filename`] — derive the file and directory name from the title
//! 5. [`images`]   — save remote images under `images/` and point the
//!    Markdown at them; the only stage besides `fetch` with network I/O

pub mod fetch;
pub mod filename;
pub mod images;
pub mod markdown;
pub mod parse;
