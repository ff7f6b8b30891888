//! Preview and publish formatting over rendered article HTML.

use std::sync::LazyLock;

use regex::Regex;

use crate::sanitize::sanitize_html;

/// Inline math containers produced by foreign math renderers.
static MJX_INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<mjx-container (class="inline.+?)</mjx-container>"#).unwrap());

/// Assistive MathML duplicates the visible rendering for screen readers;
/// the editor rejects it.
static MJX_ASSISTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<mjx-assistive-mml.+?</mjx-assistive-mml>").unwrap());

static LEADING_SPACE_INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s<span class="inline"#).unwrap());

static TRAILING_SPACE_SVG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"svg></span>\s").unwrap());

/// Wrap rendered HTML for the preview surface.
///
/// The preview pane honors `<style>` blocks, so theme CSS plus the base
/// typography ship as a stylesheet instead of being inlined.
#[must_use]
pub fn format_for_preview(html: &str, theme_css: &str) -> String {
    format!(
        "<style>\n{PREVIEW_BASE_CSS}\n{theme_css}\n</style>\n<section class=\"wechat-content\" id=\"wechat-content\">{html}</section>"
    )
}

/// Format rendered HTML for the publish transport.
///
/// The WeChat editor strips `<style>` blocks, ignores literal newlines,
/// and rejects unknown elements, so publishing wraps the content, inlines
/// the theme CSS into `style` attributes, normalizes foreign
/// math-renderer containers to plain semantic tags, removes every
/// `\r`/`\n`, and sanitizes.
#[must_use]
pub fn format_for_publish(html: &str, theme_css: &str) -> String {
    let wrapped = format!(r#"<section class="wechat-content" id="wechat-content">{html}</section>"#);
    let inlined = mdwx_css::apply_css(&wrapped, theme_css);
    let normalized = normalize_math_containers(&inlined);
    let flat: String = normalized.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    sanitize_html(&flat)
}

/// Rewrite math-renderer container tags into plain tags the editor keeps.
fn normalize_math_containers(html: &str) -> String {
    let html = MJX_INLINE_RE.replace_all(html, "<span $1</span>");
    let html = LEADING_SPACE_INLINE_RE.replace_all(&html, r#"&nbsp;<span class="inline"#);
    let html = TRAILING_SPACE_SVG_RE.replace_all(&html, "svg></span>&nbsp;");
    let html = html.replace("mjx-container", "section");
    let html = html.replace(r#"class="mjx-solid""#, r#"fill="none" stroke-width="70""#);
    MJX_ASSISTIVE_RE.replace_all(&html, "").into_owned()
}

/// Hand-authored base typography for the preview pane, overriding the
/// extension-injected heading styles where the two would fight.
const PREVIEW_BASE_CSS: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto; color: #24292e; }
h1, h2, h3, h4, h5, h6 { margin-top: 1.5em; margin-bottom: 0.5em; font-weight: 600; color: #24292e; }
h1 { font-size: 1.8em; }
h2 { font-size: 1.5em; }
h3 { font-size: 1.3em; }
p { margin: 1em 0; line-height: 1.6; color: #24292e; }
code { background: #f5f5f5; padding: 2px 4px; border-radius: 3px; font-family: "SFMono-Regular", Consolas, monospace; }
pre { background: #f8f8f8; padding: 1em; border-radius: 5px; overflow-x: auto; }
blockquote { border-left: 4px solid #ddd; margin: 1em 0; padding-left: 1em; color: #666; }
img { max-width: 100%; height: auto; display: block; margin: 1em auto; }
a { color: #007acc; text-decoration: none; }
ul, ol { margin: 1em 0; padding-left: 2em; }
table { border-collapse: collapse; width: 100%; margin: 1em 0; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f5f5f5; font-weight: 600; }

.wechat-heading { font-weight: 600 !important; line-height: 1.25; color: #24292e !important; position: relative; }
.wechat-heading-1 { font-size: 1.8em !important; padding-left: 12px !important; }
.wechat-heading-2 { font-size: 1.5em !important; padding-left: 12px !important; }
.wechat-heading-3 { font-size: 1.25em !important; padding-left: 12px !important; color: #0366d6 !important; }
.wechat-heading-4 { font-size: 1.1em !important; padding-left: 12px !important; }
.wechat-heading-5 { font-size: 1em !important; padding-left: 12px !important; color: #586069 !important; }
.wechat-heading-6 { font-size: 0.9em !important; padding-left: 12px !important; color: #6a737d !important; }
"#;
