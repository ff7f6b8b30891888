//! Inline-style application over the element tree.

use tracing::debug;

use crate::dom::{self, Element, Node};
use crate::parse::{CssRule, parse_css};
use crate::selector::ElementInfo;

/// Apply a stylesheet to an HTML fragment by rewriting matching declarations
/// into each element's `style` attribute.
///
/// Behavioral contract (deliberately preserved from the platform this
/// targets, not a bug to fix):
///
/// - A property already present in an element's inline style *before* the
///   pass is never overwritten unless the declaration is `!important`.
/// - Within one pass, later matching rules overwrite earlier ones, so
///   stylesheet concatenation order is the priority order.
/// - `a.wx_topic_link` anchors are never touched and `svg` subtrees are
///   never descended into.
/// - Specificity is not computed.
///
/// Failures are swallowed: when the input yields no element structure the
/// original string is returned unchanged.
#[must_use]
pub fn apply_css(html: &str, css: &str) -> String {
    let rules = parse_css(css);
    if rules.is_empty() {
        return html.to_owned();
    }

    let mut nodes = dom::parse(html);
    if !nodes.iter().any(|n| matches!(n, Node::Element(_))) {
        debug!("no element structure found, returning input unchanged");
        return html.to_owned();
    }

    let mut ancestors = Vec::new();
    apply_to_nodes(&mut nodes, &mut ancestors, &rules);
    dom::serialize(&nodes)
}

fn apply_to_nodes(nodes: &mut [Node], ancestors: &mut Vec<ElementInfo>, rules: &[CssRule]) {
    for node in nodes {
        let Node::Element(el) = node else { continue };

        // Platform topic links keep their editor-managed styling.
        if el.tag == "a" && el.has_class("wx_topic_link") {
            continue;
        }

        apply_rules(el, ancestors, rules);

        if el.tag != "svg" {
            ancestors.push(element_info(el));
            apply_to_nodes(&mut el.children, ancestors, rules);
            ancestors.pop();
        }
    }
}

fn apply_rules(el: &mut Element, ancestors: &[ElementInfo], rules: &[CssRule]) {
    let info = element_info(el);
    // Properties present before this pass block non-important declarations
    // for the whole pass; properties set by an important declaration during
    // the pass block later non-important ones too.
    let preexisting: Vec<String> = parse_style(el.attr("style").unwrap_or_default())
        .into_iter()
        .map(|(prop, _)| prop)
        .collect();
    let mut important_set: Vec<String> = Vec::new();

    let mut style = parse_style(el.attr("style").unwrap_or_default());
    let mut changed = false;

    for rule in rules {
        if !rule.selector.matches(&info, ancestors) {
            continue;
        }
        for decl in &rule.declarations {
            if !decl.important {
                let blocked = preexisting
                    .iter()
                    .chain(important_set.iter())
                    .any(|p| p.eq_ignore_ascii_case(&decl.property));
                if blocked {
                    continue;
                }
            }
            set_property(&mut style, &decl.property, &decl.value);
            if decl.important {
                important_set.push(decl.property.clone());
            }
            changed = true;
        }
    }

    if changed {
        el.set_attr("style", serialize_style(&style));
    }
}

fn element_info(el: &Element) -> ElementInfo {
    ElementInfo {
        tag: el.tag.clone(),
        id: el.attr("id").map(str::to_owned),
        classes: el.classes(),
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let colon = decl.find(':')?;
            let prop = decl[..colon].trim();
            let value = decl[colon + 1..].trim();
            if prop.is_empty() || value.is_empty() {
                return None;
            }
            Some((prop.to_owned(), value.to_owned()))
        })
        .collect()
}

fn set_property(style: &mut Vec<(String, String)>, property: &str, value: &str) {
    if let Some(slot) = style
        .iter_mut()
        .find(|(p, _)| p.eq_ignore_ascii_case(property))
    {
        slot.1 = value.to_owned();
    } else {
        style.push((property.to_owned(), value.to_owned()));
    }
}

fn serialize_style(style: &[(String, String)]) -> String {
    style
        .iter()
        .map(|(p, v)| format!("{p}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}
