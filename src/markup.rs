//! Safe HTML construction.
//!
//! [`SafeMarkup`] can only be built through [`MarkupBuilder`], which
//! escapes every piece of text it is given and emits tags from a fixed
//! set. Code that holds a `SafeMarkup` can inject it into a view without
//! re-checking it.

use std::fmt;

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Escape text for use in HTML element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

const ENTITIES: [(&str, char); 5] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#39;", '\''),
];

/// Reverse [`escape_html`] for the five entities it produces.
pub fn unescape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let decoded = ENTITIES
            .iter()
            .find(|(entity, _)| rest.starts_with(*entity));
        match decoded {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ---------------------------------------------------------------------------
// Marker classes
// ---------------------------------------------------------------------------

/// Visual role of a highlighted match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// The match the user is currently on.
    Active,
    /// Non-active match at an even 1-based position.
    Even,
    /// Non-active match at an odd 1-based position.
    Odd,
}

impl MarkerKind {
    /// Kind for the match at 0-based `index` given the active index.
    pub fn for_index(index: usize, active: Option<usize>) -> Self {
        if active == Some(index) {
            MarkerKind::Active
        } else if (index + 1) % 2 == 0 {
            MarkerKind::Even
        } else {
            MarkerKind::Odd
        }
    }
}

/// CSS class names attached to marker elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerClasses {
    pub active: String,
    pub even: String,
    pub odd: String,
}

impl Default for MarkerClasses {
    fn default() -> Self {
        Self {
            active: "match-active".to_string(),
            even: "match-even".to_string(),
            odd: "match-odd".to_string(),
        }
    }
}

impl MarkerClasses {
    pub fn class_for(&self, kind: MarkerKind) -> &str {
        match kind {
            MarkerKind::Active => &self.active,
            MarkerKind::Even => &self.even,
            MarkerKind::Odd => &self.odd,
        }
    }
}

// ---------------------------------------------------------------------------
// SafeMarkup / MarkupBuilder
// ---------------------------------------------------------------------------

/// Pre-escaped HTML. The only constructor is [`MarkupBuilder::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeMarkup(String);

impl SafeMarkup {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Number of marker elements in the markup.
    pub fn marker_count(&self) -> usize {
        self.0.matches(MARKER_OPEN_PREFIX).count()
    }
}

impl fmt::Display for SafeMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const MARKER_OPEN_PREFIX: &str = "<mark class=\"";
const MARKER_CLOSE: &str = "</mark>";

/// Block-level container tags the builder may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Div,
    Section,
    Article,
}

impl BlockTag {
    fn name(self) -> &'static str {
        match self {
            BlockTag::Div => "div",
            BlockTag::Section => "section",
            BlockTag::Article => "article",
        }
    }
}

/// `class`, `id` and `data-*` only; never event handlers or URLs.
fn is_allowed_attribute(name: &str) -> bool {
    let well_formed = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    well_formed && (name == "class" || name == "id" || name.starts_with("data-"))
}

/// Incremental builder for [`SafeMarkup`].
///
/// Open blocks are tracked so `finish` always yields balanced markup.
#[derive(Debug, Default)]
pub struct MarkupBuilder {
    out: String,
    open_blocks: Vec<BlockTag>,
}

impl MarkupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append escaped text.
    pub fn text(&mut self, text: &str) -> &mut Self {
        push_escaped(&mut self.out, text);
        self
    }

    /// Append `text` wrapped in a marker element.
    pub fn marker(&mut self, text: &str, class: &str, index: usize) -> &mut Self {
        self.out.push_str(MARKER_OPEN_PREFIX);
        push_escaped(&mut self.out, class);
        self.out.push_str("\" data-match=\"");
        self.out.push_str(&index.to_string());
        self.out.push_str("\">");
        push_escaped(&mut self.out, text);
        self.out.push_str(MARKER_CLOSE);
        self
    }

    /// Open a block element with escaped attributes.
    pub fn open_block(&mut self, tag: BlockTag, attrs: &[(&str, &str)]) -> &mut Self {
        self.out.push('<');
        self.out.push_str(tag.name());
        for (name, value) in attrs {
            if !is_allowed_attribute(name) {
                continue;
            }
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            push_escaped(&mut self.out, value);
            self.out.push('"');
        }
        self.out.push('>');
        self.open_blocks.push(tag);
        self
    }

    /// Close the innermost open block. No-op if none is open.
    pub fn close_block(&mut self) -> &mut Self {
        if let Some(tag) = self.open_blocks.pop() {
            self.out.push_str("</");
            self.out.push_str(tag.name());
            self.out.push('>');
        }
        self
    }

    /// Append already-safe markup (e.g. a rendered page inside a wrapper).
    pub fn markup(&mut self, markup: &SafeMarkup) -> &mut Self {
        self.out.push_str(markup.as_str());
        self
    }

    /// Close any open blocks and return the markup.
    pub fn finish(mut self) -> SafeMarkup {
        while !self.open_blocks.is_empty() {
            self.close_block();
        }
        SafeMarkup(self.out)
    }
}

/// Remove marker wrapping and decode entities, recovering the source text
/// of a rendered page.
pub fn strip_markup(markup: &SafeMarkup) -> String {
    let mut plain = String::with_capacity(markup.as_str().len());
    let mut rest = markup.as_str();
    while let Some(open) = rest.find(MARKER_OPEN_PREFIX) {
        plain.push_str(&rest[..open]);
        let after_open = &rest[open..];
        // The opening tag ends at the first '>' (attribute values are escaped).
        let Some(tag_end) = after_open.find('>') else {
            break;
        };
        rest = &after_open[tag_end + 1..];
        if let Some(close) = rest.find(MARKER_CLOSE) {
            plain.push_str(&rest[..close]);
            rest = &rest[close + MARKER_CLOSE.len()..];
        }
    }
    plain.push_str(rest);
    unescape_html(&plain)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
