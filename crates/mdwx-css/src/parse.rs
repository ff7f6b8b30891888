//! Stylesheet text → rule list.

use crate::selector::Selector;

/// One parsed stylesheet rule: a selector and its declarations.
///
/// Comma-separated selector lists are split into individual rules sharing
/// the same declaration set.
#[derive(Clone, Debug)]
pub struct CssRule {
    /// Parsed selector.
    pub selector: Selector,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

/// A single `property: value` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Property name, trimmed.
    pub property: String,
    /// Property value with any `!important` marker stripped.
    pub value: String,
    /// Whether the declaration carried `!important`.
    pub important: bool,
}

/// Parse stylesheet text into rules.
///
/// Comment spans are stripped first, then `selector-list { declarations }`
/// blocks are extracted. Declaration fragments without a `:` separator are
/// skipped silently. Selectors using syntax the inliner does not support
/// (pseudo-classes, at-rules, attribute selectors) parse into rules that
/// never match any element, which keeps input like `@media` blocks harmless.
#[must_use]
pub fn parse_css(css: &str) -> Vec<CssRule> {
    let css = strip_comments(css);
    let mut rules = Vec::new();
    let mut rest = css.as_str();

    while let Some(open) = rest.find('{') {
        let selector_part = &rest[..open];
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else { break };
        let declarations = parse_declarations(&after[..close]);
        rest = &after[close + 1..];

        for selector in selector_part.split(',') {
            let selector = selector.trim();
            if selector.is_empty() {
                continue;
            }
            rules.push(CssRule {
                selector: Selector::parse(selector),
                declarations: declarations.clone(),
            });
        }
    }

    rules
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

fn parse_declarations(body: &str) -> Vec<Declaration> {
    body.split(';')
        .filter_map(|decl| {
            let colon = decl.find(':')?;
            let property = decl[..colon].trim();
            let raw_value = decl[colon + 1..].trim();
            if property.is_empty() || raw_value.is_empty() {
                return None;
            }
            let important = raw_value.contains("!important");
            let value = if important {
                raw_value.replacen("!important", "", 1).trim().to_owned()
            } else {
                raw_value.to_owned()
            };
            Some(Declaration {
                property: property.to_owned(),
                value,
                important,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_rule() {
        let rules = parse_css("p { color: red; margin: 1em 0; }");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector.source(), "p");
        assert_eq!(rules[0].declarations.len(), 2);
        assert_eq!(rules[0].declarations[0].property, "color");
        assert_eq!(rules[0].declarations[0].value, "red");
        assert!(!rules[0].declarations[0].important);
    }

    #[test]
    fn test_comma_selectors_share_declarations() {
        let rules = parse_css("h1, h2 { font-weight: 600; }");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].selector.source(), "h1");
        assert_eq!(rules[1].selector.source(), "h2");
        assert_eq!(rules[0].declarations, rules[1].declarations);
    }

    #[test]
    fn test_important_detected_and_stripped() {
        let rules = parse_css("p { color: blue !important; }");
        let decl = &rules[0].declarations[0];
        assert_eq!(decl.value, "blue");
        assert!(decl.important);
    }

    #[test]
    fn test_comments_stripped() {
        let rules = parse_css("/* header */ h1 { /* inner */ color: red; }");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].declarations[0].property, "color");
    }

    #[test]
    fn test_malformed_declaration_skipped() {
        let rules = parse_css("p { color red; margin: 0; }");
        assert_eq!(rules[0].declarations.len(), 1);
        assert_eq!(rules[0].declarations[0].property, "margin");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_css("").is_empty());
        assert!(parse_css("   \n  ").is_empty());
    }

    #[test]
    fn test_unclosed_block_stops_cleanly() {
        let rules = parse_css("p { color: red; } div { margin: 0");
        assert_eq!(rules.len(), 1);
    }
}
