//! HTML → Markdown conversion of the article body.
//!
//! Conversion is delegated to [`htmd`] with ATX headings, `*` bullets and
//! fenced code blocks. A few element handlers sit on top of it:
//!
//! * `a`: same-page anchors (`href="#..."`) render as their text only;
//! * `img`: spaces and parentheses in the URL are percent-encoded and square
//!   brackets are stripped from the alt text, so every image reference stays
//!   matchable by [`crate::pipeline::images::scan_images`];
//! * `strong`/`b`/`em`/`i`: surrounding whitespace and hard breaks are kept
//!   outside the delimiters;
//! * `p`: line-leading block markers in plain text are escaped.
//!
//! Lines are never wrapped, so long paragraphs stay on one line.

use htmd::element_handler::{HandlerResult, Handlers};
use htmd::options::{BulletListMarker, CodeBlockFence, CodeBlockStyle, HeadingStyle, Options};
use htmd::{Element, HtmlToMarkdown};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_BLANK_ONLY_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]+$").unwrap());
static RE_LEADING_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})( |$)").unwrap());
static RE_LEADING_ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\. ").unwrap());

const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "head", "title", "noscript", "template", "iframe",
];

/// Options controlling the Markdown output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Render links as their text only. Default: false.
    pub ignore_links: bool,
    /// Drop images entirely. Default: false.
    pub ignore_images: bool,
    /// Drop `**`/`_` markers around bold and italic text. Default: false.
    pub ignore_emphasis: bool,
    /// Render same-page anchor links (`href="#..."`) as plain text. Default: true.
    pub skip_internal_links: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            ignore_links: false,
            ignore_images: false,
            ignore_emphasis: false,
            skip_internal_links: true,
        }
    }
}

/// Convert HTML to Markdown with the default options.
pub fn html_to_markdown(html: &str) -> String {
    MarkdownConverter::default().convert(html)
}

/// HTML → Markdown converter configured from [`MarkdownOptions`].
pub struct MarkdownConverter {
    inner: HtmlToMarkdown,
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new(MarkdownOptions::default())
    }
}

impl MarkdownConverter {
    pub fn new(options: MarkdownOptions) -> Self {
        let MarkdownOptions {
            ignore_links,
            ignore_images,
            ignore_emphasis,
            skip_internal_links,
        } = options;

        let inner = HtmlToMarkdown::builder()
            .skip_tags(SKIPPED_ELEMENTS.to_vec())
            .options(Options {
                heading_style: HeadingStyle::Atx,
                bullet_list_marker: BulletListMarker::Asterisk,
                code_block_style: CodeBlockStyle::Fenced,
                code_block_fence: CodeBlockFence::Backticks,
                ..Default::default()
            })
            .add_handler(vec!["a"], move |handlers: &dyn Handlers, element: Element| {
                let Some(href) = attr(&element, "href") else {
                    return handlers.fallback(element);
                };
                let text = handlers.walk_children(element.node).content;
                let content = if text.trim().is_empty() {
                    String::new()
                } else if ignore_links || (skip_internal_links && href.starts_with('#')) {
                    text
                } else {
                    format!("[{}]({})", text.trim(), encode_url(href.trim()))
                };
                Some(translated(content))
            })
            .add_handler(vec!["img"], move |_: &dyn Handlers, element: Element| {
                let src = attr(&element, "src").filter(|s| !s.trim().is_empty());
                let content = match src {
                    Some(src) if !ignore_images => {
                        let alt = attr(&element, "alt").unwrap_or_default();
                        format!("![{}]({})", clean_alt(&alt), encode_url(src.trim()))
                    }
                    _ => String::new(),
                };
                Some(translated(content))
            })
            .add_handler(vec!["strong", "b"], move |handlers: &dyn Handlers, element: Element| {
                let content = handlers.walk_children(element.node).content;
                Some(translated(emphasize(&content, "**", ignore_emphasis)))
            })
            .add_handler(vec!["em", "i"], move |handlers: &dyn Handlers, element: Element| {
                let content = handlers.walk_children(element.node).content;
                Some(translated(emphasize(&content, "_", ignore_emphasis)))
            })
            .add_handler(vec!["p"], |handlers: &dyn Handlers, element: Element| {
                let content = handlers.walk_children(element.node).content;
                let body = escape_block_markers(content.trim());
                Some(translated(format!("\n\n{body}\n\n")))
            })
            .build();

        Self { inner }
    }

    /// Convert an HTML fragment. The result ends with exactly one newline,
    /// or is empty when the fragment has no renderable content.
    pub fn convert(&self, html: &str) -> String {
        match self.inner.convert(html) {
            Ok(raw) => finish(&raw),
            Err(err) => {
                warn!("HTML to Markdown conversion failed: {err}");
                String::new()
            }
        }
    }
}

fn translated(content: String) -> HandlerResult {
    HandlerResult {
        content,
        markdown_translated: true,
    }
}

fn attr(element: &Element, name: &str) -> Option<String> {
    element
        .attrs
        .iter()
        .find(|a| &*a.name.local == name)
        .map(|a| a.value.to_string())
}

/// Wrap `content` in `delim`, keeping outer whitespace (including a trailing
/// hard break) outside the markers.
fn emphasize(content: &str, delim: &str, ignore: bool) -> String {
    let inner = content.trim();
    if ignore || inner.is_empty() {
        return content.to_string();
    }
    let lead = &content[..content.len() - content.trim_start().len()];
    let trail = &content[content.trim_end().len()..];
    format!("{lead}{delim}{inner}{delim}{trail}")
}

/// Escape markers that would turn a line of plain text into a heading,
/// list item or quote. Lines that are already escaped are left alone.
fn escape_block_markers(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if RE_LEADING_HEADING.is_match(line) {
                RE_LEADING_HEADING.replace(line, r"\$1$2").into_owned()
            } else if RE_LEADING_ORDINAL.is_match(line) {
                RE_LEADING_ORDINAL.replace(line, r"$1\. ").into_owned()
            } else if line.starts_with('-') || line.starts_with("+ ") || line.starts_with('>') {
                format!("\\{line}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn clean_alt(alt: &str) -> String {
    alt.chars()
        .filter(|c| !matches!(c, '[' | ']'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn encode_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            _ => out.push(c),
        }
    }
    out
}

/// Normalise blank lines and ensure a single trailing newline.
fn finish(raw: &str) -> String {
    let s = RE_BLANK_ONLY_LINES.replace_all(raw, "");
    let s = RE_BLANK_LINES.replace_all(&s, "\n\n");
    let s = s.trim();
    if s.is_empty() {
        String::new()
    } else {
        format!("{s}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let md = html_to_markdown("<p>First</p><p>Second</p>");
        assert_eq!(md, "First\n\nSecond\n");
    }

    #[test]
    fn links_and_images_preserved() {
        let md = html_to_markdown(
            r#"<p>See <a href="https://example.com/a">the docs</a>.</p><p><img src="https://mmbiz.qpic.cn/x.png" alt="pic"></p>"#,
        );
        assert!(md.contains("[the docs](https://example.com/a)"), "got: {md}");
        assert!(md.contains("![pic](https://mmbiz.qpic.cn/x.png)"), "got: {md}");
    }

    #[test]
    fn long_lines_are_not_wrapped() {
        let long = "word ".repeat(200);
        let md = html_to_markdown(&format!("<p>{long}</p>"));
        assert_eq!(md.lines().count(), 1);
        assert_eq!(md.trim_end().len(), long.trim_end().len());
    }

    #[test]
    fn internal_links_render_as_text() {
        let md = html_to_markdown(r##"<p><a href="#section-2">jump</a> here</p>"##);
        assert_eq!(md, "jump here\n");
    }

    #[test]
    fn internal_links_kept_when_not_skipped() {
        let converter = MarkdownConverter::new(MarkdownOptions {
            skip_internal_links: false,
            ..MarkdownOptions::default()
        });
        let md = converter.convert(r##"<a href="#top">top</a>"##);
        assert_eq!(md, "[top](#top)\n");
    }

    #[test]
    fn ignore_links_and_images_options() {
        let converter = MarkdownConverter::new(MarkdownOptions {
            ignore_links: true,
            ignore_images: true,
            ..MarkdownOptions::default()
        });
        let md = converter
            .convert(r#"<p><a href="https://example.com">site</a><img src="https://a.b/c.png"></p>"#);
        assert_eq!(md, "site\n");
    }

    #[test]
    fn emphasis_markers() {
        let md = html_to_markdown("<p>a <strong>bold</strong> and <em>it</em> word</p>");
        assert_eq!(md, "a **bold** and _it_ word\n");
    }

    #[test]
    fn emphasis_keeps_outer_spaces_outside_markers() {
        let md = html_to_markdown("<p>a<strong> bold </strong>b</p>");
        assert!(md.contains("**bold**"), "got: {md:?}");
        assert!(!md.contains("** bold") && !md.contains("bold **"), "got: {md:?}");
    }

    #[test]
    fn hard_break_at_end_of_emphasis_survives() {
        let md = html_to_markdown("<p><strong>x<br></strong>y</p>");
        assert!(md.contains("**x**"), "got: {md:?}");
        assert!(md.contains("\ny"), "line break lost: {md:?}");
        assert!(!md.contains("**x** y"), "got: {md:?}");
    }

    #[test]
    fn ignore_emphasis_option() {
        let converter = MarkdownConverter::new(MarkdownOptions {
            ignore_emphasis: true,
            ..MarkdownOptions::default()
        });
        assert_eq!(converter.convert("<p><b>x</b></p>"), "x\n");
    }

    #[test]
    fn headings_use_atx_style() {
        let md = html_to_markdown("<h2>Part  one</h2><p>body</p>");
        assert!(md.starts_with("## Part one\n"), "got: {md:?}");
        assert!(md.ends_with("\nbody\n"), "got: {md:?}");
    }

    #[test]
    fn lists_use_asterisk_and_numbers() {
        let md = html_to_markdown("<ul><li>a</li><li>b</li></ul><ol><li>x</li><li>y</li></ol>");
        let lines: Vec<&str> = md.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines.len(), 4, "got: {md:?}");
        assert!(lines[0].starts_with('*') && lines[0].ends_with('a'));
        assert!(lines[1].starts_with('*') && lines[1].ends_with('b'));
        assert!(lines[2].starts_with("1.") && lines[2].ends_with('x'));
        assert!(lines[3].starts_with("2.") && lines[3].ends_with('y'));
    }

    #[test]
    fn blockquote_prefixes_lines() {
        let md = html_to_markdown("<blockquote><p>one</p></blockquote>");
        assert!(md.starts_with("> one"), "got: {md:?}");
    }

    #[test]
    fn pre_becomes_fenced_block() {
        let md = html_to_markdown("<pre><code>fn main() {}</code></pre>");
        assert!(md.starts_with("```"), "got: {md:?}");
        assert!(md.contains("fn main() {}"), "got: {md:?}");
        assert!(md.trim_end().ends_with("```"), "got: {md:?}");
    }

    #[test]
    fn inline_code() {
        assert_eq!(html_to_markdown("<p>run <code>cargo</code></p>"), "run `cargo`\n");
    }

    #[test]
    fn inline_code_with_backtick_uses_longer_fence() {
        let md = html_to_markdown("<p>see <code>a`b</code></p>");
        assert!(md.contains("``a`b``"), "got: {md:?}");
    }

    #[test]
    fn line_break_is_hard_break() {
        assert_eq!(html_to_markdown("<p>a<br>b</p>"), "a  \nb\n");
    }

    #[test]
    fn leading_ordinal_is_escaped() {
        assert_eq!(html_to_markdown("<p>1. Not a list</p>"), "1\\. Not a list\n");
    }

    #[test]
    fn leading_dash_is_escaped() {
        assert_eq!(html_to_markdown("<p>- not a bullet</p>"), "\\- not a bullet\n");
    }

    #[test]
    fn leading_plus_is_escaped() {
        assert_eq!(html_to_markdown("<p>+ not a bullet</p>"), "\\+ not a bullet\n");
    }

    #[test]
    fn leading_hash_is_escaped() {
        assert_eq!(html_to_markdown("<p># not a heading</p>"), "\\# not a heading\n");
    }

    #[test]
    fn escaping_is_not_applied_twice() {
        assert_eq!(escape_block_markers("1\\. done"), "1\\. done");
        assert_eq!(escape_block_markers("\\# done"), "\\# done");
        assert_eq!(escape_block_markers("a\n- b"), "a\n\\- b");
    }

    #[test]
    fn scripts_and_styles_dropped() {
        let md = html_to_markdown("<style>p{}</style><p>text</p><script>var x;</script>");
        assert_eq!(md, "text\n");
    }

    #[test]
    fn image_url_and_alt_made_unambiguous() {
        let md = html_to_markdown(r#"<img src="https://a.b/c (1).png" alt="[x] y">"#);
        assert_eq!(md, "![x y](https://a.b/c%20%281%29.png)\n");
    }

    #[test]
    fn image_without_src_dropped() {
        assert_eq!(html_to_markdown(r#"<p>a<img alt="none">b</p>"#), "ab\n");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(html_to_markdown(""), "");
        assert_eq!(html_to_markdown("<div>  </div>"), "");
    }
}
