//! Match location for a single page.
//!
//! Produces the ordered, non-overlapping spans that the renderer wraps
//! and the navigation index counts. There is exactly one entry point per
//! [`HighlightMode`]:
//!
//! - **Auto**: exact offsets from the search service when present,
//!   otherwise the Tolerant pattern.
//! - **Regex**: always the Tolerant pattern.
//! - **Simple**: always the Strict (literal) pattern.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::debug;

use crate::normalize::{char_len, normalize};
use crate::pattern::{build_pattern, PatternMode};
use crate::results::ExactMatch;
use crate::span::Span;

// ---------------------------------------------------------------------------
// HighlightMode
// ---------------------------------------------------------------------------

/// How matches are located on a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    /// Prefer the service's exact offsets, fall back to tolerant matching.
    #[default]
    Auto,
    /// Literal, case-insensitive matching.
    Simple,
    /// Tolerant matching across whitespace and invisible joiners.
    Regex,
}

impl HighlightMode {
    /// The next mode in `Auto -> Simple -> Regex -> Auto` order.
    pub fn cycle(self) -> Self {
        match self {
            HighlightMode::Auto => HighlightMode::Simple,
            HighlightMode::Simple => HighlightMode::Regex,
            HighlightMode::Regex => HighlightMode::Auto,
        }
    }

    /// Whether this mode consults the service's exact offsets.
    pub fn uses_exact_offsets(self) -> bool {
        self == HighlightMode::Auto
    }

    /// The pattern used when matches are computed locally.
    pub fn pattern_mode(self) -> PatternMode {
        match self {
            HighlightMode::Simple => PatternMode::Strict,
            HighlightMode::Auto | HighlightMode::Regex => PatternMode::Tolerant,
        }
    }
}

impl fmt::Display for HighlightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightMode::Auto => write!(f, "auto"),
            HighlightMode::Simple => write!(f, "simple"),
            HighlightMode::Regex => write!(f, "regex"),
        }
    }
}

impl FromStr for HighlightMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(HighlightMode::Auto),
            "simple" => Ok(HighlightMode::Simple),
            "regex" => Ok(HighlightMode::Regex),
            other => Err(format!("unknown highlight mode \"{}\"", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Locating
// ---------------------------------------------------------------------------

/// Locate matches on a page with Auto semantics.
///
/// `page_text` is expected in NFC (as stored by [`crate::document::Document`]).
pub fn locate(page_text: &str, query: &str, exact_matches: Option<&[ExactMatch]>) -> Vec<Span> {
    locate_with_mode(page_text, query, exact_matches, HighlightMode::Auto)
}

/// Locate matches on a page using the given mode.
///
/// Returns an empty vector for an empty query. The result is always in
/// bounds of `page_text`, strictly ascending, and non-overlapping.
pub fn locate_with_mode(
    page_text: &str,
    query: &str,
    exact_matches: Option<&[ExactMatch]>,
    mode: HighlightMode,
) -> Vec<Span> {
    if normalize(query).is_empty() {
        return Vec::new();
    }

    match exact_matches {
        Some(exact) if mode.uses_exact_offsets() && !exact.is_empty() => {
            accept_exact_matches(exact, char_len(page_text))
        }
        _ => build_pattern(query, mode.pattern_mode()).find_spans(page_text),
    }
}

/// Turn service-supplied offsets into a clean span list.
///
/// Entries are sorted by position and walked with a cursor; anything with
/// a missing or negative position, a missing or non-positive length, a
/// start before the cursor, or an end past `text_len` is skipped.
pub fn accept_exact_matches(exact: &[ExactMatch], text_len: usize) -> Vec<Span> {
    let mut candidates: Vec<&ExactMatch> = exact.iter().collect();
    // Entries without a position sort first and are rejected below.
    candidates.sort_by_key(|m| m.position);

    let mut accepted = Vec::with_capacity(candidates.len());
    let mut cursor = 0usize;

    for candidate in candidates {
        let Some(span) = to_span(candidate) else {
            debug!(?candidate, "skipping malformed exact match");
            continue;
        };
        if span.start < cursor {
            debug!(?candidate, cursor, "skipping overlapping exact match");
            continue;
        }
        if span.end() > text_len {
            debug!(?candidate, text_len, "skipping out-of-bounds exact match");
            continue;
        }
        cursor = span.end();
        accepted.push(span);
    }

    accepted
}

fn to_span(m: &ExactMatch) -> Option<Span> {
    let position = usize::try_from(m.position?).ok()?;
    let length = usize::try_from(m.length?).ok().filter(|&len| len > 0)?;
    position.checked_add(length)?;
    Some(Span::new(position, length))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
