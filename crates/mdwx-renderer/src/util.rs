//! Shared string utilities: escaping, tag stripping, URL safety.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Remove all HTML tags, leaving text content.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Validate a URL for use in rendered output.
///
/// Returns `None` for dangerous schemes (`javascript:`, `data:`,
/// `vbscript:`) and for absolute URLs outside http/https/ftp/ftps.
/// Relative URLs pass through unchanged.
#[must_use]
pub fn clean_url(href: &str) -> Option<&str> {
    let lowered = href.trim_start().to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("data:")
        || lowered.starts_with("vbscript:")
    {
        return None;
    }

    let Some(scheme_end) = href.find("://") else {
        // Relative path.
        return Some(href);
    };

    let scheme = &lowered[..scheme_end.min(lowered.len())];
    match scheme {
        "http" | "https" | "ftp" | "ftps" => Some(href),
        _ => None,
    }
}

/// Insert CSS into the document's `<style>` head block, creating the block
/// when absent. Used by extension postprocessing to contribute styles.
#[must_use]
pub(crate) fn inject_style(html: &str, css: &str) -> String {
    if let Some(pos) = html.find("</style>") {
        let mut out = String::with_capacity(html.len() + css.len() + 1);
        out.push_str(&html[..pos]);
        out.push_str(css);
        out.push('\n');
        out.push_str(&html[pos..]);
        out
    } else {
        format!("<style>{css}</style>\n{html}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_html(r#"say "hi""#), "say &quot;hi&quot;");
        assert_eq!(escape_html("it's"), "it&#39;s");
    }

    #[test]
    fn test_escape_html_borrowed_when_clean() {
        assert!(matches!(escape_html("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_clean_url_relative() {
        assert_eq!(clean_url("images/pic.png"), Some("images/pic.png"));
        assert_eq!(clean_url("./pic.png"), Some("./pic.png"));
    }

    #[test]
    fn test_clean_url_http() {
        assert_eq!(
            clean_url("https://example.com/a.png"),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn test_clean_url_dangerous_schemes() {
        assert_eq!(clean_url("javascript:alert(1)"), None);
        assert_eq!(clean_url("JavaScript:alert(1)"), None);
        assert_eq!(clean_url("data:text/html;base64,xx"), None);
        assert_eq!(clean_url("vbscript:x"), None);
    }

    #[test]
    fn test_clean_url_unknown_scheme() {
        assert_eq!(clean_url("gopher://example.com"), None);
    }

    #[test]
    fn test_inject_style_creates_block() {
        let out = inject_style("<p>x</p>", "p { color: red; }");
        assert_eq!(out, "<style>p { color: red; }</style>\n<p>x</p>");
    }

    #[test]
    fn test_inject_style_extends_block() {
        let out = inject_style("<style>a{}</style>\n<p>x</p>", "b{}");
        assert_eq!(out, "<style>a{}b{}\n</style>\n<p>x</p>");
    }
}
