//! Minimal CSS parser and inline-style applier.
//!
//! The WeChat editor strips `<style>` blocks from submitted articles, so
//! publish-time styling has to be rewritten into each element's own `style`
//! attribute. This crate provides exactly that: [`parse_css`] turns a
//! stylesheet into selector/declaration rules, and [`apply_css`] walks an
//! HTML fragment applying every matching declaration inline.
//!
//! This is deliberately not a CSS engine. Specificity is never computed; a
//! property already present in an element's inline style wins over any
//! stylesheet declaration unless that declaration is `!important`, and
//! within one pass later rules overwrite earlier ones. Styling is
//! best-effort: any parse failure returns the input HTML unchanged.
//!
//! The HTML side only needs to handle this workspace's own renderer output,
//! so the element tree is a small void-element-aware tokenizer rather than a
//! general HTML parser.

mod dom;
mod inline;
mod parse;
mod selector;

pub use inline::apply_css;
pub use parse::{CssRule, Declaration, parse_css};
pub use selector::Selector;
