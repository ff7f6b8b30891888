//! HTML sanitization for the publish transport.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static CONTAINER_TAGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<script[^>]*>.*?</script>|<iframe[^>]*>.*?</iframe>|<object[^>]*>.*?</object>|<form[^>]*>.*?</form>|<textarea[^>]*>.*?</textarea>|<button[^>]*>.*?</button>",
    )
    .unwrap()
});

static VOID_TAGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<embed[^>]*/?>|<input[^>]*/?>").unwrap());

static EVENT_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s*on\w+="[^"]*""#).unwrap());

static JS_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s*javascript:[^"']*"#).unwrap());

static STYLE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)style\s*=\s*"([^"]*)""#).unwrap());

static CSS_EXPRESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)expression\s*\([^)]*\)").unwrap());

static CSS_BEHAVIOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)behavior\s*:[^;]*").unwrap());

static CSS_JS_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)url\s*\(\s*javascript:[^)]*\)").unwrap());

/// Remove markup the WeChat editor rejects or that would execute.
///
/// Script/iframe/object/embed/form/input/textarea/button elements are
/// removed wholesale (contents included where applicable); `on*` handler
/// attributes and `javascript:` attribute values are stripped; inline
/// `style` values lose `expression()`, `behavior:`, and `javascript:`
/// `url()` references while the rest of the style value stays intact.
///
/// For output produced by this workspace's own renderer none of these
/// patterns occur, so sanitization is a no-op there.
#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let html = CONTAINER_TAGS_RE.replace_all(html, "");
    let html = VOID_TAGS_RE.replace_all(&html, "");
    let html = EVENT_ATTR_RE.replace_all(&html, "");
    let html = JS_SCHEME_RE.replace_all(&html, "");

    STYLE_ATTR_RE
        .replace_all(&html, |caps: &Captures<'_>| {
            let cleaned = CSS_EXPRESSION_RE.replace_all(&caps[1], "");
            let cleaned = CSS_BEHAVIOR_RE.replace_all(&cleaned, "");
            let cleaned = CSS_JS_URL_RE.replace_all(&cleaned, "");
            format!(r#"style="{cleaned}""#)
        })
        .into_owned()
}
