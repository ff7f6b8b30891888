//! Code block rendering: highlight-ready sections plus math/diagram/card
//! placeholders.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::extension::{RenderError, RenderExtension};
use crate::util::{escape_html, inject_style};

static CODE_BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<code([^>]*)>(.*?)</code>").unwrap());

/// Math notation kinds recognized by fence language tag.
fn math_kind(lang: &str) -> Option<&'static str> {
    match lang {
        "latex" | "tex" => Some("latex"),
        "am" | "asciimath" => Some("asciimath"),
        _ => None,
    }
}

/// Renders fenced code blocks.
///
/// Math (`latex`/`tex`/`am`/`asciimath`), diagram (`mermaid`), and card
/// (`mpcard`) fences become kind-tagged `<div>` placeholders resolved by
/// downstream collaborators; everything else renders as a
/// highlight.js-ready code section, optionally with a line-number gutter.
pub struct CodeExtension {
    line_numbers: bool,
}

impl CodeExtension {
    /// Create the extension. `line_numbers` adds a gutter column to code
    /// sections.
    #[must_use]
    pub fn new(line_numbers: bool) -> Self {
        Self { line_numbers }
    }

    fn render_code_section(&self, lang: Option<&str>, source: &str) -> String {
        // Normalize to exactly one trailing newline.
        let code = format!("{}\n", source.trim_end_matches('\n'));

        let mut out = String::from(r#"<section class="code-section">"#);
        if self.line_numbers {
            out.push_str("<ul>");
            for line in 1..code.split('\n').count() {
                write!(out, "<li>{line}</li>").unwrap();
            }
            out.push_str("</ul>");
        }

        match lang {
            Some(lang) => write!(
                out,
                r#"<pre><code class="hljs language-{}">{}</code></pre></section>"#,
                escape_html(lang),
                escape_html(&code)
            )
            .unwrap(),
            None => write!(out, "<pre><code>{}</code></pre></section>", escape_html(&code)).unwrap(),
        }
        out.push('\n');
        out
    }
}

impl RenderExtension for CodeExtension {
    fn name(&self) -> &'static str {
        "code"
    }

    fn code_block(&mut self, lang: Option<&str>, source: &str) -> Option<String> {
        if let Some(lang) = lang {
            let tag = lang.trim().to_ascii_lowercase();
            if let Some(kind) = math_kind(&tag) {
                return Some(format!(
                    r#"<div class="math-{kind}">{}</div>"#,
                    escape_html(source.trim_end())
                ));
            }
            if tag == "mermaid" {
                return Some(format!(
                    r#"<div class="mermaid">{}</div>"#,
                    escape_html(source.trim_end())
                ));
            }
            if tag == "mpcard" {
                return Some(format!(
                    r#"<div class="mpcard">{}</div>"#,
                    escape_html(source.trim_end())
                ));
            }
        }
        Some(self.render_code_section(lang, source))
    }

    fn postprocess(&mut self, html: String) -> Result<String, RenderError> {
        if !html.contains("code-section") {
            return Ok(html);
        }
        Ok(inject_style(&html, CODE_CSS))
    }

    /// The publish transport strips literal newlines from the article body,
    /// which would collapse code blocks; convert them to `<br>` here rather
    /// than in postprocess so preview output keeps real newlines.
    fn before_publish(&mut self, html: String) -> Result<String, RenderError> {
        if !html.contains("<code") {
            return Ok(html);
        }
        let rewritten = CODE_BODY_RE.replace_all(&html, |caps: &Captures<'_>| {
            format!("<code{}>{}</code>", &caps[1], caps[2].replace('\n', "<br>"))
        });
        Ok(rewritten.into_owned())
    }
}

const CODE_CSS: &str = r#"
.code-section {
    display: flex;
    background-color: rgb(250, 250, 250);
    border: rgb(240, 240, 240) 1px solid;
}

.code-section ul {
    flex-shrink: 0;
    counter-reset: line;
    margin: 0;
    padding: 0.875em 0 0.875em 0.875em;
    white-space: normal;
    width: fit-content;
}

.code-section ul > li {
    font-family: Consolas, ui-monospace, SFMono-Regular, Menlo, Monaco, "Liberation Mono", "Courier New", monospace;
    margin: 0;
    padding: 0;
    display: list-item;
    text-align: right;
    line-height: 1.75em;
    font-size: 0.875em;
    list-style-type: none;
    color: rgba(0, 0, 0, 0.25);
    text-wrap: nowrap;
}

.code-section pre {
    margin: 0;
    padding: 0;
    overflow: auto;
}

.code-section code {
    font-family: Consolas, ui-monospace, SFMono-Regular, Menlo, Monaco, "Liberation Mono", "Courier New", monospace;
    color: #5c5c5c;
    background-color: #fafafa;
    font-size: 0.875em;
    vertical-align: baseline;
    padding: 0 0.5em;
}

.code-section pre code {
    display: block;
    text-wrap: nowrap;
    line-height: 1.75em;
    padding: 1em;
    background: unset;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(markdown: &str) -> String {
        let mut pipeline =
            crate::MarkdownPipeline::new().with_extension(CodeExtension::new(false));
        pipeline.parse(markdown).unwrap()
    }

    #[test]
    fn test_default_code_section() {
        let html = render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<section class="code-section"><pre><code class="hljs language-rust">"#));
        assert!(html.contains("fn main() {}\n"));
    }

    #[test]
    fn test_no_language() {
        let html = render("```\nplain\n```");
        assert!(html.contains(r#"<section class="code-section"><pre><code>plain"#));
    }

    #[test]
    fn test_trailing_newline_normalized() {
        let mut ext = CodeExtension::new(false);
        let html = ext.code_block(Some("rust"), "let x = 1;\n\n\n").unwrap();
        assert!(html.contains("let x = 1;\n</code>"));
    }

    #[test]
    fn test_line_numbers() {
        let mut ext = CodeExtension::new(true);
        let html = ext.code_block(Some("rust"), "a\nb\nc\n").unwrap();
        assert!(html.contains("<ul><li>1</li><li>2</li><li>3</li></ul>"));
    }

    #[test]
    fn test_no_line_numbers_no_gutter() {
        let mut ext = CodeExtension::new(false);
        let html = ext.code_block(Some("rust"), "a\nb\n").unwrap();
        assert!(!html.contains("<ul>"));
    }

    #[test]
    fn test_math_kinds() {
        let mut ext = CodeExtension::new(false);
        for lang in ["latex", "tex", "LaTeX"] {
            let html = ext.code_block(Some(lang), "\\frac{a}{b}").unwrap();
            assert!(html.starts_with(r#"<div class="math-latex">"#), "{lang}");
        }
        for lang in ["am", "asciimath"] {
            let html = ext.code_block(Some(lang), "a/b").unwrap();
            assert!(html.starts_with(r#"<div class="math-asciimath">"#), "{lang}");
        }
    }

    #[test]
    fn test_mermaid_placeholder() {
        let mut ext = CodeExtension::new(false);
        let html = ext.code_block(Some("mermaid"), "graph TD; A-->B;").unwrap();
        assert_eq!(html, r#"<div class="mermaid">graph TD; A--&gt;B;</div>"#);
    }

    #[test]
    fn test_mpcard_placeholder() {
        let mut ext = CodeExtension::new(false);
        let html = ext.code_block(Some(" MPCard "), "title: hi").unwrap();
        assert!(html.starts_with(r#"<div class="mpcard">"#));
    }

    #[test]
    fn test_code_escaped() {
        let html = render("```html\n<b>bold</b>\n```");
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!html.contains("<b>bold</b>"));
    }

    #[test]
    fn test_styles_injected_only_with_code_sections() {
        assert!(render("```rust\nx\n```").contains(".code-section {"));
        assert!(!render("no code").contains(".code-section {"));
        // Placeholders alone contribute no code styles.
        assert!(!render("```mermaid\ngraph\n```").contains(".code-section {"));
    }

    #[test]
    fn test_before_publish_converts_newlines_to_br() {
        let mut ext = CodeExtension::new(false);
        let html = ext.code_block(Some("rust"), "a\nb\n").unwrap();
        let published = ext.before_publish(html).unwrap();
        assert!(published.contains("a<br>b<br></code>"));
    }

    #[test]
    fn test_before_publish_leaves_prose_newlines() {
        let mut ext = CodeExtension::new(false);
        let html = "<p>line</p>\n<p>other</p>".to_owned();
        assert_eq!(ext.before_publish(html.clone()).unwrap(), html);
    }
}
