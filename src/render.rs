//! Highlight rendering.
//!
//! A page's text and its spans are walked once into [`Segment`]s: plain
//! gaps and matched runs, each match tagged with its local index and
//! [`MarkerKind`]. The HTML renderer below and the terminal renderer in
//! `tui::ui` both fold over the same walk, so they always agree on what
//! is highlighted.

use tracing::debug;

use crate::markup::{MarkerClasses, MarkerKind, MarkupBuilder, SafeMarkup};
use crate::normalize::normalize;
use crate::span::{CharMap, Span};

/// One piece of a page after span walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Match {
        text: &'a str,
        /// 0-based local index of the match (position in the span list).
        index: usize,
        kind: MarkerKind,
    },
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Segment::Plain(text) => text,
            Segment::Match { text, .. } => text,
        }
    }
}

/// Split `page_text` into plain and matched segments.
///
/// Spans are taken in the order given; a span that starts before the end
/// of the previous accepted span, is empty, or runs past the text is
/// skipped. Concatenating the segment texts always reproduces
/// `page_text`.
pub fn segments<'a>(page_text: &'a str, spans: &[Span], active: Option<usize>) -> Vec<Segment<'a>> {
    let map = CharMap::new(page_text);
    let mut out = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor_chars = 0usize;
    let mut cursor_bytes = 0usize;

    for (index, span) in spans.iter().enumerate() {
        if span.length == 0 || span.start < cursor_chars {
            debug!(?span, cursor_chars, "skipping span behind cursor");
            continue;
        }
        let Some(range) = map.byte_range(span) else {
            debug!(?span, len = map.char_len(), "skipping out-of-bounds span");
            continue;
        };

        if range.start > cursor_bytes {
            out.push(Segment::Plain(&page_text[cursor_bytes..range.start]));
        }
        out.push(Segment::Match {
            text: &page_text[range.clone()],
            index,
            kind: MarkerKind::for_index(index, active),
        });
        cursor_chars = span.end();
        cursor_bytes = range.end;
    }

    if cursor_bytes < page_text.len() {
        out.push(Segment::Plain(&page_text[cursor_bytes..]));
    }
    out
}

/// Renders pages to [`SafeMarkup`].
#[derive(Debug, Clone, Default)]
pub struct HighlightRenderer {
    classes: MarkerClasses,
}

impl HighlightRenderer {
    pub fn new(classes: MarkerClasses) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &MarkerClasses {
        &self.classes
    }

    /// Wrap every span of `page_text` in a marker; the span at
    /// `active_local_index` gets the active class.
    pub fn render(&self, page_text: &str, spans: &[Span], active_local_index: usize) -> SafeMarkup {
        self.render_segments(&segments(page_text, spans, Some(active_local_index)))
    }

    /// Render with the highlight toggle and query taken into account.
    ///
    /// Disabled highlighting or an empty query yields escaped text with no
    /// markers.
    pub fn render_page(
        &self,
        page_text: &str,
        query: &str,
        spans: &[Span],
        active_local_index: usize,
        highlights_enabled: bool,
    ) -> SafeMarkup {
        if !highlights_enabled || normalize(query).is_empty() {
            return render_plain(page_text);
        }
        self.render(page_text, spans, active_local_index)
    }

    fn render_segments(&self, segments: &[Segment<'_>]) -> SafeMarkup {
        let mut builder = MarkupBuilder::new();
        for segment in segments {
            match segment {
                Segment::Plain(text) => {
                    builder.text(text);
                }
                Segment::Match { text, index, kind } => {
                    builder.marker(text, self.classes.class_for(*kind), *index);
                }
            }
        }
        builder.finish()
    }
}

/// Escaped text with no markers.
pub fn render_plain(page_text: &str) -> SafeMarkup {
    let mut builder = MarkupBuilder::new();
    builder.text(page_text);
    builder.finish()
}

/// Render with default marker classes.
pub fn render(page_text: &str, spans: &[Span], active_local_index: usize) -> SafeMarkup {
    HighlightRenderer::default().render(page_text, spans, active_local_index)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
