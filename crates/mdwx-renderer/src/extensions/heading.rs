//! Heading rendering with generated anchors and level-specific styling.

use std::sync::LazyLock;

use regex::Regex;

use crate::extension::{RenderError, RenderExtension};
use crate::util::inject_style;

/// Characters outside ASCII word characters and the CJK unified block
/// collapse to a hyphen.
static NON_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9a-z_\u{4e00}-\u{9fff}]+").unwrap());

/// Maximum slug length in characters.
const ANCHOR_MAX_LEN: usize = 50;

/// Generate a heading anchor id.
///
/// Lower-cased, non-word/non-CJK runs collapsed to a single hyphen, no
/// leading or trailing hyphen, slug capped at 50 characters.
#[must_use]
pub fn heading_anchor(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = NON_ANCHOR_RE.replace_all(&lowered, "-");
    let slug: String = collapsed
        .trim_matches('-')
        .chars()
        .take(ANCHOR_MAX_LEN)
        .collect();
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "heading".to_owned()
    } else {
        format!("heading-{slug}")
    }
}

/// Renders headings with a style class and deterministic anchor id, and
/// contributes heading CSS when any heading was rendered.
#[derive(Default)]
pub struct HeadingExtension;

impl HeadingExtension {
    /// Create the extension.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RenderExtension for HeadingExtension {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn heading(&mut self, level: u8, text: &str, inner_html: &str) -> Option<String> {
        let level = level.clamp(1, 6);
        let id = heading_anchor(text);
        Some(format!(
            r#"<h{level} class="wechat-heading wechat-heading-{level}" id="{id}">{inner_html}</h{level}>"#
        ))
    }

    fn postprocess(&mut self, html: String) -> Result<String, RenderError> {
        if !html.contains("wechat-heading") {
            return Ok(html);
        }
        Ok(inject_style(&html, HEADING_CSS))
    }
}

const HEADING_CSS: &str = "
.wechat-heading {
    font-weight: 600;
    line-height: 1.25;
    margin-top: 1.5em;
    margin-bottom: 0.75em;
    color: #24292e;
    position: relative;
}

.wechat-heading:first-child {
    margin-top: 0;
}

.wechat-heading-1 {
    font-size: 1.8em;
    padding-left: 12px;
    margin-top: 0;
    margin-bottom: 1em;
    border-left: 4px solid #007acc;
}

.wechat-heading-2 {
    font-size: 1.5em;
    padding-left: 12px;
    margin-top: 1.8em;
    margin-bottom: 0.8em;
    border-left: 4px solid #007acc;
}

.wechat-heading-3 {
    font-size: 1.25em;
    padding-left: 12px;
    margin-top: 1.5em;
    margin-bottom: 0.6em;
    color: #0366d6;
    border-left: 3px solid #007acc;
}

.wechat-heading-4 {
    font-size: 1.1em;
    padding-left: 12px;
    margin-top: 1.3em;
    margin-bottom: 0.5em;
    border-left: 3px solid #007acc;
}

.wechat-heading-5 {
    font-size: 1em;
    padding-left: 12px;
    margin-top: 1.2em;
    margin-bottom: 0.4em;
    color: #586069;
    border-left: 2px solid #007acc;
}

.wechat-heading-6 {
    font-size: 0.9em;
    padding-left: 12px;
    margin-top: 1em;
    margin-bottom: 0.3em;
    color: #6a737d;
    text-transform: uppercase;
    letter-spacing: 0.05em;
    border-left: 2px solid #007acc;
}

.wechat-heading + p,
.wechat-heading + ul,
.wechat-heading + ol,
.wechat-heading + blockquote,
.wechat-heading + pre {
    margin-top: 0.5em;
}

.wechat-heading + .wechat-heading {
    margin-top: 1em;
}
";
