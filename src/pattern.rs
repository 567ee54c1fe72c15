//! Query-to-pattern compilation.
//!
//! Two shapes are supported:
//!
//! - **Strict**: the normalized query as an escaped literal.
//! - **Tolerant**: each code point of the normalized query escaped on its
//!   own and joined by a separator class that soaks up whitespace and
//!   invisible joiners, so `"ABCXYZ"` still finds `"ABC\u{200B}XYZ"` or a
//!   line-wrapped `"ABC\nXYZ"`.
//!
//! Both are case-insensitive and Unicode-aware. Compilation never fails
//! from the caller's point of view: every metacharacter is escaped, and
//! the rare compile error (size limits on absurdly long queries) degrades
//! to a pattern that matches nothing.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::normalize::normalize;
use crate::span::{CharMap, Span};

/// Separator sub-pattern for Tolerant mode: whitespace, ZWSP, ZWNJ, ZWJ, BOM.
pub const SEPARATOR_CLASS: &str = r"[\s\x{200B}\x{200C}\x{200D}\x{FEFF}]*";

/// Upper bound on the compiled program size. Large enough for any query a
/// person types; small enough that a pasted page does not stall the UI.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// How a query is turned into a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMode {
    Strict,
    Tolerant,
}

/// A compiled query pattern.
///
/// Holds `None` for an empty query or a pattern that failed to compile;
/// both match nothing.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Option<Regex>,
    mode: PatternMode,
}

impl CompiledPattern {
    pub fn mode(&self) -> PatternMode {
        self.mode
    }

    /// Returns `true` if this pattern can never match.
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }

    /// Source of the compiled pattern, if any.
    pub fn as_str(&self) -> Option<&str> {
        self.regex.as_ref().map(Regex::as_str)
    }

    /// All non-overlapping, non-empty matches in `text`, left to right,
    /// as char spans.
    pub fn find_spans(&self, text: &str) -> Vec<Span> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };
        let map = CharMap::new(text);
        regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| map.span_of(m.range()))
            .collect()
    }

    /// Number of matches in `text`.
    pub fn count(&self, text: &str) -> usize {
        match &self.regex {
            Some(regex) => regex.find_iter(text).filter(|m| !m.is_empty()).count(),
            None => 0,
        }
    }
}

/// Build the pattern source for a query without compiling it.
///
/// Returns `None` for a query that is empty after normalization.
pub fn pattern_source(query: &str, mode: PatternMode) -> Option<String> {
    let normalized = normalize(query);
    if normalized.is_empty() {
        return None;
    }

    let body = match mode {
        PatternMode::Strict => regex::escape(&normalized),
        PatternMode::Tolerant => normalized
            .chars()
            .map(|ch| regex::escape(ch.encode_utf8(&mut [0u8; 4])))
            .collect::<Vec<_>>()
            .join(SEPARATOR_CLASS),
    };
    Some(body)
}

/// Compile `query` into a case-insensitive, Unicode-aware pattern.
pub fn build_pattern(query: &str, mode: PatternMode) -> CompiledPattern {
    let regex = pattern_source(query, mode).and_then(|source| {
        match RegexBuilder::new(&source)
            .case_insensitive(true)
            .unicode(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
        {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(
                    query_chars = query.chars().count(),
                    ?mode,
                    "could not compile search pattern, highlighting disabled: {}",
                    e
                );
                None
            }
        }
    });
    CompiledPattern { regex, mode }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
