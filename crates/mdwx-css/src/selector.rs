//! Selector parsing and matching.
//!
//! Supports compound simple selectors (`tag`, `#id`, `.class`, and
//! combinations like `pre code.hljs`) joined by descendant and child (`>`)
//! combinators. Anything beyond that — pseudo-classes, at-rules, attribute
//! selectors — parses into a selector that never matches, mirroring how the
//! rules are simply skipped rather than raising.

/// Element facts the matcher needs: tag name, id, class list.
#[derive(Clone, Debug)]
pub(crate) struct ElementInfo {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

/// How a compound selector relates to the one on its left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One compound selector: optional tag plus id/class requirements.
#[derive(Clone, Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches(&self, element: &ElementInfo) -> bool {
        if let Some(tag) = &self.tag
            && !tag.eq_ignore_ascii_case(&element.tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.id.as_ref() != Some(id)
        {
            return false;
        }
        self.classes
            .iter()
            .all(|c| element.classes.iter().any(|ec| ec == c))
    }
}

/// A parsed selector.
#[derive(Clone, Debug)]
pub struct Selector {
    source: String,
    /// Compounds left-to-right; each combinator relates a compound to its
    /// left neighbor (the first entry's combinator is unused).
    parts: Vec<(Combinator, Compound)>,
    supported: bool,
}

impl Selector {
    /// Parse a selector string.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let supported = !source
            .chars()
            .any(|c| matches!(c, ':' | '[' | ']' | '@' | '+' | '~' | '{' | '}' | '('));

        let mut parts = Vec::new();
        if supported {
            let mut pending = Combinator::Descendant;
            for token in source.split_whitespace() {
                if token == ">" {
                    pending = Combinator::Child;
                    continue;
                }
                // Tokens like "ul>li" carry the combinator inline.
                for (idx, piece) in token.split('>').enumerate() {
                    if piece.is_empty() {
                        continue;
                    }
                    let combinator = if idx == 0 { pending } else { Combinator::Child };
                    match parse_compound(piece) {
                        Some(compound) => parts.push((combinator, compound)),
                        None => {
                            return Self {
                                source: source.to_owned(),
                                parts: Vec::new(),
                                supported: false,
                            };
                        }
                    }
                    pending = Combinator::Descendant;
                }
            }
        }

        let supported = supported && !parts.is_empty();
        Self {
            source: source.to_owned(),
            parts,
            supported,
        }
    }

    /// The selector text as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Match against an element and its ancestor chain (root first).
    pub(crate) fn matches(&self, element: &ElementInfo, ancestors: &[ElementInfo]) -> bool {
        if !self.supported {
            return false;
        }
        Self::matches_from(&self.parts, element, ancestors)
    }

    fn matches_from(
        parts: &[(Combinator, Compound)],
        element: &ElementInfo,
        ancestors: &[ElementInfo],
    ) -> bool {
        let Some(((combinator, compound), rest)) = parts.split_last() else {
            return true;
        };
        if !compound.matches(element) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        match combinator {
            Combinator::Child => match ancestors.split_last() {
                Some((parent, outer)) => Self::matches_from(rest, parent, outer),
                None => false,
            },
            Combinator::Descendant => (0..ancestors.len())
                .rev()
                .any(|i| Self::matches_from(rest, &ancestors[i], &ancestors[..i])),
        }
    }
}

fn parse_compound(piece: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut rest = piece;

    // Leading tag name (or `*` for any element).
    let tag_end = rest.find(['.', '#']).unwrap_or(rest.len());
    let tag = &rest[..tag_end];
    if !tag.is_empty() && tag != "*" {
        if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }
        compound.tag = Some(tag.to_ascii_lowercase());
    }
    rest = &rest[tag_end..];

    while !rest.is_empty() {
        let marker = rest.chars().next()?;
        let body = &rest[1..];
        let end = body.find(['.', '#']).unwrap_or(body.len());
        let name = &body[..end];
        if name.is_empty() {
            return None;
        }
        match marker {
            '.' => compound.classes.push(name.to_owned()),
            '#' => compound.id = Some(name.to_owned()),
            _ => return None,
        }
        rest = &body[end..];
    }

    Some(compound)
}
