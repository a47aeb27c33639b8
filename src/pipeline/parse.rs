//! Article extraction from the fetched page.
//!
//! A WeChat article page keeps its title in `#activity-name` (older layouts
//! use `.rich_media_title`) and the whole body inside `#js_content`. Images
//! in the body are lazy-loaded: the real URL sits in `data-src` and `src` is
//! empty or a placeholder until the browser scrolls to it, so the body is
//! re-serialised with `src` taken from `data-src`.

use crate::error::Wechat2MdError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

/// Title used when the page has neither title element.
pub const FALLBACK_TITLE: &str = "未知标题";

/// Selector of the article body container.
pub const CONTENT_SELECTOR: &str = "#js_content";

/// Attribute holding the real URL of a lazy-loaded image.
pub const LAZY_SRC_ATTR: &str = "data-src";

static TITLE_SELECTORS: Lazy<[Selector; 2]> = Lazy::new(|| {
    [
        Selector::parse("#activity-name").unwrap(),
        Selector::parse(".rich_media_title").unwrap(),
    ]
});

static CONTENT: Lazy<Selector> = Lazy::new(|| Selector::parse(CONTENT_SELECTOR).unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Title and body of one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Trimmed title text.
    pub title: String,
    /// Outer HTML of the content container, lazy images resolved.
    pub content_html: String,
}

/// Extract the title and body HTML from a full article page.
///
/// # Errors
/// [`Wechat2MdError::ContentNotFound`] when the page has no `#js_content`
/// element.
pub fn parse_article(html: &str) -> Result<Article, Wechat2MdError> {
    let document = Html::parse_document(html);

    let title = find_title(&document).unwrap_or_else(|| FALLBACK_TITLE.to_string());

    let content = document
        .select(&CONTENT)
        .next()
        .ok_or_else(|| Wechat2MdError::ContentNotFound {
            selector: CONTENT_SELECTOR.to_string(),
        })?;

    let mut content_html = String::with_capacity(html.len() / 2);
    write_element(content, &mut content_html);

    debug!(
        "Parsed article '{}' ({} bytes of content HTML)",
        title,
        content_html.len()
    );

    Ok(Article {
        title,
        content_html,
    })
}

/// First title candidate present in the document, trimmed.
fn find_title(document: &Html) -> Option<String> {
    TITLE_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Serialise `el` as HTML, resolving lazy-loaded image sources.
fn write_element(el: ElementRef<'_>, out: &mut String) {
    let element = el.value();
    let name = element.name();

    let lazy_src = if name == "img" {
        element.attr(LAZY_SRC_ATTR).filter(|s| !s.is_empty())
    } else {
        None
    };

    out.push('<');
    out.push_str(name);
    let mut wrote_src = false;
    for (key, value) in element.attrs() {
        let value = match (key, lazy_src) {
            ("src", Some(real)) => {
                wrote_src = true;
                real
            }
            _ => value,
        };
        push_attr(out, key, value);
    }
    if let (Some(real), false) = (lazy_src, wrote_src) {
        push_attr(out, "src", real);
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    let raw_text = RAW_TEXT_ELEMENTS.contains(&name);
    for child in el.children() {
        match child.value() {
            Node::Text(text) if raw_text => out.push_str(&text.text),
            Node::Text(text) => escape_text(&text.text, out),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_element(child_el, out);
                }
            }
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn push_attr(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(head: &str, body: &str) -> String {
        format!("<!DOCTYPE html><html><head>{head}</head><body>{body}</body></html>")
    }

    #[test]
    fn title_from_activity_name() {
        let html = page(
            "",
            r#"<h1 id="activity-name">
                  Rust 入门
               </h1>
               <h2 class="rich_media_title">Other</h2>
               <div id="js_content"><p>hi</p></div>"#,
        );
        let article = parse_article(&html).unwrap();
        assert_eq!(article.title, "Rust 入门");
    }

    #[test]
    fn title_falls_back_to_rich_media_title() {
        let html = page(
            "",
            r#"<h2 class="rich_media_title"> Second choice </h2>
               <div id="js_content"><p>hi</p></div>"#,
        );
        assert_eq!(parse_article(&html).unwrap().title, "Second choice");
    }

    #[test]
    fn title_falls_back_to_constant() {
        let html = page("", r#"<div id="js_content"><p>hi</p></div>"#);
        assert_eq!(parse_article(&html).unwrap().title, FALLBACK_TITLE);
    }

    #[test]
    fn missing_content_is_parse_error() {
        let html = page("", r#"<h1 id="activity-name">T</h1><div id="other"></div>"#);
        let err = parse_article(&html).unwrap_err();
        assert!(matches!(err, Wechat2MdError::ContentNotFound { .. }));
    }

    #[test]
    fn lazy_src_added_when_src_absent() {
        let html = page(
            "",
            r#"<div id="js_content"><img data-src="https://mmbiz.qpic.cn/a.png"></div>"#,
        );
        let article = parse_article(&html).unwrap();
        assert!(
            article.content_html.contains(r#" src="https://mmbiz.qpic.cn/a.png""#),
            "got: {}",
            article.content_html
        );
    }

    #[test]
    fn lazy_src_replaces_placeholder_src() {
        let html = page(
            "",
            r#"<div id="js_content"><img src="data:image/gif;base64,R0lG" data-src="https://mmbiz.qpic.cn/b.jpg" alt="b"></div>"#,
        );
        let article = parse_article(&html).unwrap();
        assert!(!article.content_html.contains("data:image/gif"));
        assert_eq!(article.content_html.matches(" src=").count(), 1);
        assert!(article
            .content_html
            .contains(r#" src="https://mmbiz.qpic.cn/b.jpg""#));
    }

    #[test]
    fn image_without_lazy_src_untouched() {
        let html = page(
            "",
            r#"<div id="js_content"><img src="https://example.com/c.gif"></div>"#,
        );
        let article = parse_article(&html).unwrap();
        assert!(article
            .content_html
            .contains(r#"<img src="https://example.com/c.gif">"#));
    }

    #[test]
    fn content_html_is_outer_html_with_escaping() {
        let html = page(
            "",
            r#"<div id="js_content"><p>a &lt; b &amp; c</p><br></div>"#,
        );
        let article = parse_article(&html).unwrap();
        assert_eq!(
            article.content_html,
            r#"<div id="js_content"><p>a &lt; b &amp; c</p><br></div>"#
        );
    }

    #[test]
    fn attribute_values_are_escaped() {
        let html = page(
            "",
            r#"<div id="js_content"><a href="/s?a=1&amp;b=2" title='say "hi"'>x</a></div>"#,
        );
        let article = parse_article(&html).unwrap();
        assert!(article.content_html.contains(r#"href="/s?a=1&amp;b=2""#));
        assert!(article.content_html.contains(r#"title="say &quot;hi&quot;""#));
    }
}
