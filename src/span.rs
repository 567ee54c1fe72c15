//! Match spans and char/byte offset conversion.
//!
//! Spans are expressed in chars (Unicode scalar values) because that is
//! what the search collaborator reports and what a reader counts. Rust
//! slices by byte, so [`CharMap`] translates between the two for a given
//! text.

use std::ops::Range;

/// A contiguous matched run inside a page's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    /// Char offset of the first matched char.
    pub start: usize,
    /// Number of chars in the match. Always > 0 for spans produced by
    /// the locator.
    pub length: usize,
}

impl Span {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Char offset one past the last matched char.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn chars(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Byte offset of every char boundary in a text, plus a sentinel for the
/// end of the string.
///
/// `offsets[i]` is the byte offset of char `i`; `offsets[char_len]` is
/// `text.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharMap {
    offsets: Vec<usize>,
}

impl CharMap {
    pub fn new(text: &str) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
        offsets.push(text.len());
        Self { offsets }
    }

    /// Number of chars in the mapped text.
    pub fn char_len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Byte offset of char `index`, or `None` past the end.
    pub fn byte_offset(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    /// Char index of a byte offset.
    ///
    /// Offsets that fall inside a multi-byte char resolve to the start of
    /// that char (same convention as slicing on the nearest boundary).
    pub fn char_index(&self, byte: usize) -> usize {
        match self.offsets.binary_search(&byte) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        }
    }

    /// Byte range for a span, or `None` if the span is out of bounds.
    pub fn byte_range(&self, span: &Span) -> Option<Range<usize>> {
        let start = self.byte_offset(span.start)?;
        let end = self.byte_offset(span.end())?;
        Some(start..end)
    }

    /// Convert a byte range produced by a regex match into a char span.
    pub fn span_of(&self, bytes: Range<usize>) -> Span {
        let start = self.char_index(bytes.start);
        let end = self.char_index(bytes.end);
        Span::new(start, end.saturating_sub(start))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
