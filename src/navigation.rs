//! Local and global match ordering.
//!
//! [`NavigationIndex`] is the single place where per-page counts, the
//! total, and global positions are derived. It is rebuilt from the result
//! set and the current query whenever it is needed and never cached, so it
//! cannot fall out of step with what is rendered.
//!
//! Global order is result order: matches of the first result page, then
//! the second, and so on.

use std::borrow::Cow;

use crate::document::Document;
use crate::locate::{locate_with_mode, HighlightMode};
use crate::normalize::{normalize, normalized};
use crate::results::{PageMatch, SearchResultSet};
use crate::span::Span;

/// A match identified by page and position on that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchAddress {
    pub page: usize,
    pub local_index: usize,
}

impl MatchAddress {
    pub fn new(page: usize, local_index: usize) -> Self {
        Self { page, local_index }
    }
}

/// Text a result page is matched against: the document page, else the
/// result's `full_text`, else its snippet.
///
/// Document pages are normalized on load; the fallbacks come straight
/// from the results file and are normalized here.
pub fn source_text<'a>(document: Option<&'a Document>, result: &'a PageMatch) -> Cow<'a, str> {
    if let Some(page) = document.and_then(|d| d.page(result.page)) {
        return Cow::Borrowed(page.text.as_str());
    }
    normalized(result.full_text.as_deref().unwrap_or(result.text.as_str()))
}

/// Matches on one result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub page: usize,
    pub spans: Vec<Span>,
}

/// Derived match ordering for one result set and query.
#[derive(Debug, Clone, Default)]
pub struct NavigationIndex {
    entries: Vec<PageEntry>,
    /// Matches on the viewed page when it is not a result page.
    extra: Option<PageEntry>,
}

impl NavigationIndex {
    /// Build the index over every result page.
    ///
    /// Page text comes from the document when available, else from the
    /// result's `full_text`, else its snippet. The service's exact offsets
    /// only apply when the result set was produced for this query.
    pub fn build(
        results: Option<&SearchResultSet>,
        document: Option<&Document>,
        query: &str,
        mode: HighlightMode,
    ) -> Self {
        let query_norm = normalize(query);
        let Some(results) = results else {
            return Self::default();
        };
        if query_norm.is_empty() {
            return Self::default();
        }
        let offsets_apply = normalize(&results.query) == query_norm;

        let entries = results
            .distinct_pages()
            .into_iter()
            .map(|result| {
                let text = source_text(document, result);
                let exact = if offsets_apply { result.exact() } else { None };
                PageEntry {
                    page: result.page,
                    spans: locate_with_mode(&text, &query_norm, exact, mode),
                }
            })
            .collect();

        Self {
            entries,
            extra: None,
        }
    }

    /// Build the index and also cover `viewed_page` if it is a document
    /// page outside the result set, so local navigation and rendering on
    /// that page use the same spans.
    pub fn build_for_view(
        results: Option<&SearchResultSet>,
        document: Option<&Document>,
        query: &str,
        mode: HighlightMode,
        viewed_page: usize,
    ) -> Self {
        let mut index = Self::build(results, document, query, mode);
        let query_norm = normalize(query);
        if query_norm.is_empty() || index.entry(viewed_page).is_some() {
            return index;
        }
        if let Some(page) = document.and_then(|d| d.page(viewed_page)) {
            index.extra = Some(PageEntry {
                page: viewed_page,
                spans: locate_with_mode(&page.text, &query_norm, None, mode),
            });
        }
        index
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    fn entry(&self, page: usize) -> Option<&PageEntry> {
        self.entries.iter().find(|e| e.page == page)
    }

    /// Spans on `page`, empty if the page is unknown.
    pub fn spans_for_page(&self, page: usize) -> &[Span] {
        self.entry(page)
            .or(self.extra.as_ref().filter(|e| e.page == page))
            .map(|e| e.spans.as_slice())
            .unwrap_or(&[])
    }

    /// Number of matches on `page`.
    pub fn count_for_page(&self, page: usize) -> usize {
        self.spans_for_page(page).len()
    }

    /// Sum of per-page counts over the result pages.
    pub fn total_count(&self) -> usize {
        self.entries.iter().map(|e| e.spans.len()).sum()
    }

    /// 1-based position of a local match in the global order.
    ///
    /// `None` if the page is not a result page or `local_index` is out of
    /// range for it.
    pub fn global_position_of(&self, page: usize, local_index: usize) -> Option<usize> {
        let mut before = 0usize;
        for entry in &self.entries {
            if entry.page == page {
                if local_index < entry.spans.len() {
                    return Some(before + local_index + 1);
                }
                return None;
            }
            before += entry.spans.len();
        }
        None
    }

    /// Address of the match at 0-based `global_index`.
    pub fn resolve_global(&self, global_index: usize) -> Option<MatchAddress> {
        let mut before = 0usize;
        for entry in &self.entries {
            let count = entry.spans.len();
            if global_index < before + count {
                return Some(MatchAddress::new(entry.page, global_index - before));
            }
            before += count;
        }
        None
    }

    // -- Navigation ----------------------------------------------------------

    /// Next match on the same page, wrapping to the first.
    pub fn next_local(&self, at: MatchAddress) -> MatchAddress {
        let count = self.count_for_page(at.page);
        if count == 0 {
            return at;
        }
        MatchAddress::new(at.page, (at.local_index + 1) % count)
    }

    /// Previous match on the same page, wrapping to the last.
    pub fn prev_local(&self, at: MatchAddress) -> MatchAddress {
        let count = self.count_for_page(at.page);
        if count == 0 {
            return at;
        }
        let local = if at.local_index == 0 || at.local_index >= count {
            count - 1
        } else {
            at.local_index - 1
        };
        MatchAddress::new(at.page, local)
    }

    /// Next match in global order, wrapping to the first.
    ///
    /// From a position outside the global order (a page without results
    /// or with no matches) this is the first match. `None` when there are
    /// no matches at all.
    pub fn next_global(&self, at: MatchAddress) -> Option<MatchAddress> {
        let total = self.total_count();
        if total == 0 {
            return None;
        }
        let target = match self.global_position_of(at.page, at.local_index) {
            // position is 1-based, so it is already the next 0-based index
            Some(position) => position % total,
            None => 0,
        };
        self.resolve_global(target)
    }

    /// Previous match in global order, wrapping to the last.
    ///
    /// From a position outside the global order this is the last match.
    pub fn prev_global(&self, at: MatchAddress) -> Option<MatchAddress> {
        let total = self.total_count();
        if total == 0 {
            return None;
        }
        let target = match self.global_position_of(at.page, at.local_index) {
            Some(position) => (position + total - 2) % total,
            None => total - 1,
        };
        self.resolve_global(target)
    }

    // -- Display -------------------------------------------------------------

    /// Local counter, e.g. `"[2/5]"`; `"[0/0]"` when the page has no matches.
    pub fn local_counter(&self, at: MatchAddress) -> String {
        let count = self.count_for_page(at.page);
        if count == 0 {
            "[0/0]".to_string()
        } else {
            format!("[{}/{}]", at.local_index.min(count - 1) + 1, count)
        }
    }

    /// Global counter, e.g. `"[7/12]"`; `"[-/12]"` off the global order.
    pub fn global_counter(&self, at: MatchAddress) -> String {
        let total = self.total_count();
        match self.global_position_of(at.page, at.local_index) {
            Some(position) => format!("[{}/{}]", position, total),
            None => format!("[-/{}]", total),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
