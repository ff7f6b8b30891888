//! Link rendering: direct display, footnote markers, inline badges.

use std::fmt::Write;

use crate::extension::{RenderError, RenderExtension};
use crate::util::{escape_html, inject_style};

/// WeChat article URL prefixes that always display as plain anchors —
/// these survive inside published articles.
const ARTICLE_URL_PREFIXES: &[&str] = &[
    "https://mp.weixin.qq.com/mp",
    "https://mp.weixin.qq.com/s",
];

/// How external links render in the article body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LinkStyle {
    /// Visible text plus the href in a monospace badge.
    #[default]
    Inline,
    /// Superscript ordinal markers with hrefs collected into a footnote
    /// section at the end of the document.
    Footnote,
}

/// Classifies links and renders external ones per the configured style,
/// collecting footnote targets in encounter order.
pub struct LinkExtension {
    style: LinkStyle,
    links: Vec<String>,
}

impl LinkExtension {
    /// Create the extension with the configured link style.
    #[must_use]
    pub fn new(style: LinkStyle) -> Self {
        Self {
            style,
            links: Vec::new(),
        }
    }

    /// A link displays as a plain anchor when its text already shows the
    /// target, when it is internal/relative, or when it points at a WeChat
    /// article.
    fn is_direct_display(dest: &str, text: &str) -> bool {
        if text.starts_with(dest) {
            return true;
        }
        if ARTICLE_URL_PREFIXES.iter().any(|p| dest.starts_with(p)) {
            return true;
        }
        !dest.starts_with("http") && !dest.starts_with("//")
    }
}

impl RenderExtension for LinkExtension {
    fn name(&self) -> &'static str {
        "link"
    }

    fn prepare(&mut self) {
        self.links.clear();
    }

    fn link(&mut self, dest: &str, title: &str, text: &str) -> Option<String> {
        if dest.starts_with("mailto:") {
            return Some(escape_html(text).into_owned());
        }

        if Self::is_direct_display(dest, text) {
            let title_attr = if title.is_empty() {
                String::new()
            } else {
                format!(r#" title="{}""#, escape_html(title))
            };
            return Some(format!(
                r#"<a href="{}" target="_blank"{title_attr}>{}</a>"#,
                escape_html(dest),
                escape_html(text)
            ));
        }

        self.links.push(dest.to_owned());
        match self.style {
            LinkStyle::Footnote => Some(format!(
                r#"<a class="footnote-ref">{}<sup class="footnote-num">[{}]</sup></a>"#,
                escape_html(text),
                self.links.len()
            )),
            LinkStyle::Inline => Some(format!(
                r#"<span class="inline-link">{} <code class="link-url">[{}]</code></span>"#,
                escape_html(text),
                escape_html(dest)
            )),
        }
    }

    fn postprocess(&mut self, html: String) -> Result<String, RenderError> {
        if self.style != LinkStyle::Footnote || self.links.is_empty() {
            return Ok(html);
        }

        let mut items = String::new();
        for href in &self.links {
            let escaped = escape_html(href);
            write!(
                items,
                r#"<li><a href="{escaped}" target="_blank">{escaped}</a>&nbsp;↩</li>"#
            )
            .unwrap();
        }
        let footnotes = format!(
            r#"<section class="footnotes"><hr class="footnotes-separator"><h3 class="footnotes-title">参考链接</h3><ol class="footnotes-list">{items}</ol></section>"#
        );

        Ok(inject_style(&html, FOOTNOTE_CSS) + &footnotes)
    }

    fn cleanup(&mut self) {
        self.links.clear();
    }
}

const FOOTNOTE_CSS: &str = "
.footnote-ref {
    cursor: default;
    color: inherit;
    text-decoration: none;
}

.footnote-num {
    color: #007acc;
    font-weight: 600;
    margin-left: 2px;
}

.inline-link {
    color: inherit;
}

.link-url {
    background: #f0f0f0;
    color: #666;
    padding: 1px 4px;
    border-radius: 3px;
    font-size: 0.9em;
    margin-left: 4px;
}

.footnotes {
    margin-top: 3em;
    padding-top: 1em;
    font-size: 0.9em;
    color: #666;
}

.footnotes-separator {
    width: 200px;
    margin: 0 0 1.5em 0;
    border: none;
    border-top: 1px solid #e1e8ed;
    background: none;
}

.footnotes-title {
    font-size: 1.1em;
    color: #333;
    margin: 0 0 1em 0;
    font-weight: 600;
}

.footnotes-list {
    margin: 0;
    padding-left: 1.5em;
    line-height: 1.6;
}

.footnotes-list li {
    margin-bottom: 0.5em;
    word-break: break-all;
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(style: LinkStyle, markdown: &str) -> String {
        let mut pipeline = crate::MarkdownPipeline::new().with_extension(LinkExtension::new(style));
        pipeline.parse(markdown).unwrap()
    }

    #[test]
    fn test_external_link_footnote_marker() {
        let html = render(LinkStyle::Footnote, "see [docs](https://example.com)");
        assert!(html.contains(r#"<a class="footnote-ref">docs<sup class="footnote-num">[1]</sup></a>"#));
    }

    #[test]
    fn test_footnote_section_lists_links_in_order() {
        let html = render(
            LinkStyle::Footnote,
            "[a](https://a.example) then [b](https://b.example)",
        );
        let a = html.find("https://a.example</a>").unwrap();
        let b = html.find("https://b.example</a>").unwrap();
        assert!(html.contains(r#"<section class="footnotes">"#));
        assert!(a < b);
        assert!(html.contains("[1]"));
        assert!(html.contains("[2]"));
    }

    #[test]
    fn test_no_footnote_section_without_external_links() {
        for style in [LinkStyle::Footnote, LinkStyle::Inline] {
            let html = render(style, "plain text and [rel](./other.md)");
            assert!(!html.contains("footnotes"), "{style:?}");
        }
    }

    #[test]
    fn test_inline_style_badge() {
        let html = render(LinkStyle::Inline, "[docs](https://example.com)");
        assert!(html.contains(
            r#"<span class="inline-link">docs <code class="link-url">[https://example.com]</code></span>"#
        ));
        assert!(!html.contains("footnotes"));
    }

    #[test]
    fn test_self_describing_link_direct() {
        let html = render(LinkStyle::Footnote, "<https://example.com>");
        assert!(html.contains(r#"<a href="https://example.com" target="_blank">https://example.com</a>"#));
        assert!(!html.contains("footnote-num"));
    }

    #[test]
    fn test_wechat_article_link_direct() {
        let html = render(
            LinkStyle::Footnote,
            "[article](https://mp.weixin.qq.com/s/abc123)",
        );
        assert!(html.contains(r#"target="_blank""#));
        assert!(!html.contains("footnote-num"));
    }

    #[test]
    fn test_relative_link_direct() {
        let html = render(LinkStyle::Footnote, "[other note](notes/other.md)");
        assert!(html.contains(r#"<a href="notes/other.md" target="_blank">other note</a>"#));
        assert!(!html.contains("footnotes"));
    }

    #[test]
    fn test_mailto_renders_text_only() {
        let html = render(LinkStyle::Footnote, "[mail me](mailto:a@b.c)");
        assert_eq!(html, "<p>mail me</p>");
    }

    #[test]
    fn test_prepare_resets_numbering() {
        let mut pipeline =
            crate::MarkdownPipeline::new().with_extension(LinkExtension::new(LinkStyle::Footnote));
        pipeline.parse("[a](https://a.example)").unwrap();
        let second = pipeline.parse("[b](https://b.example)").unwrap();
        // Numbering restarts; the first document's link is gone.
        assert!(second.contains("[1]"));
        assert!(!second.contains("https://a.example"));
    }

    #[test]
    fn test_title_attribute_on_direct_link() {
        let html = render(
            LinkStyle::Footnote,
            r#"[local](./a.md "local title")"#,
        );
        assert!(html.contains(r#" title="local title""#));
    }
}
