//! Filesystem-safe names derived from article titles.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a sanitized name, in characters.
pub const MAX_FILENAME_CHARS: usize = 100;

/// Name used when nothing usable is left of the title.
pub const EMPTY_NAME: &str = "untitled";

static RE_ILLEGAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Turn a title into a name usable for files and directories.
///
/// Removes `< > : " / \ | ? *`, collapses whitespace runs to a single space,
/// trims, and truncates to [`MAX_FILENAME_CHARS`] characters. Names made
/// only of dots (`.`, `..`) would point at the directory itself or its
/// parent, so they become [`EMPTY_NAME`]. Applying it twice gives the same
/// result as applying it once.
pub fn sanitize_filename(name: &str) -> String {
    let name = RE_ILLEGAL.replace_all(name, "");
    let name = RE_WHITESPACE.replace_all(&name, " ");
    let name = name.trim();

    let name = match name.char_indices().nth(MAX_FILENAME_CHARS) {
        // Truncation can expose a trailing space.
        Some((cut, _)) => name[..cut].trim_end(),
        None => name,
    };

    if name.chars().all(|c| c == '.') {
        EMPTY_NAME.to_string()
    } else {
        name.to_string()
    }
}
