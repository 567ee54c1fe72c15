//! Viewer state machine.
//!
//! [`ViewerController`] owns the [`NavigationState`] and reacts to
//! discrete events: page changes, query edits, result arrival, highlight
//! toggles, mode changes and navigation keys. Every event handler ends in
//! [`ViewerController::settle`], which
//!
//! 1. keeps the keyboard subscription in step with the state, and
//! 2. asks the [`ScrollSink`] to bring the active marker into view when
//!    the active match moved.
//!
//! Derived data (counts, global positions) is rebuilt from the result set
//! through [`NavigationIndex`] on demand and never stored.

use std::borrow::Cow;

use crossterm::event::KeyEvent;
use tracing::debug;

use crate::document::Document;
use crate::error::ScrollError;
use crate::keyboard::{NavCommand, ShortcutGuard, ShortcutRegistry};
use crate::locate::HighlightMode;
use crate::markup::{MarkerClasses, SafeMarkup};
use crate::navigation::{source_text, MatchAddress, NavigationIndex};
use crate::normalize::normalize;
use crate::render::HighlightRenderer;
use crate::results::SearchResultSet;
use crate::span::Span;

/// How many confirmed queries the recent-search list keeps.
pub const MAX_RECENT_SEARCHES: usize = 5;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Mutable viewer state. Everything else is derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub current_page: usize,
    pub current_query: String,
    pub highlights_enabled: bool,
    pub local_match_index: usize,
    pub highlight_mode: HighlightMode,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            current_query: String::new(),
            highlights_enabled: true,
            local_match_index: 0,
            highlight_mode: HighlightMode::Auto,
        }
    }
}

impl NavigationState {
    pub fn address(&self) -> MatchAddress {
        MatchAddress::new(self.current_page, self.local_match_index)
    }

    pub fn query_active(&self) -> bool {
        !normalize(&self.current_query).is_empty()
    }
}

/// Coarse controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    NoQuery,
    QueryActive { highlights_enabled: bool },
}

/// Tag for an issued search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

// ---------------------------------------------------------------------------
// Scroll effect
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBlock {
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Which marker to bring into view, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub page: usize,
    pub local_index: usize,
    pub block: ScrollBlock,
    pub behavior: ScrollBehavior,
}

impl ScrollRequest {
    /// Smoothly center the marker at `address`.
    pub fn centered(address: MatchAddress) -> Self {
        Self {
            page: address.page,
            local_index: address.local_index,
            block: ScrollBlock::Center,
            behavior: ScrollBehavior::Smooth,
        }
    }
}

/// Receiver of the post-transition scroll effect.
///
/// Implementations should be idempotent; the controller ignores errors.
pub trait ScrollSink {
    fn scroll_into_view(&mut self, request: &ScrollRequest) -> Result<(), ScrollError>;
}

impl<S: ScrollSink + ?Sized> ScrollSink for Box<S> {
    fn scroll_into_view(&mut self, request: &ScrollRequest) -> Result<(), ScrollError> {
        (**self).scroll_into_view(request)
    }
}

/// A sink for views that cannot scroll (e.g. one-shot HTML output).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScroll;

impl ScrollSink for NoScroll {
    fn scroll_into_view(&mut self, _request: &ScrollRequest) -> Result<(), ScrollError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Everything needed to display the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub page: usize,
    pub markup: SafeMarkup,
    pub match_count: usize,
    /// Local index of the active marker, when one is shown.
    pub active_index: Option<usize>,
    /// Local counter, e.g. `"[1/3]"`.
    pub counter: String,
    /// Global counter, e.g. `"[4/9]"`, when the result set has matches.
    pub global_counter: Option<String>,
    pub hint: Option<String>,
}

/// One row of the page's result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    pub page: usize,
    pub score_percent: u32,
    pub snippet: String,
}

pub const NEXT_MATCH_HINT: &str =
    "No matches on this page. Press Shift+\u{2192} to jump to the next match.";

// ---------------------------------------------------------------------------
// ViewerController
// ---------------------------------------------------------------------------

pub struct ViewerController<S = NoScroll> {
    state: NavigationState,
    document: Option<Document>,
    results: Option<SearchResultSet>,
    renderer: HighlightRenderer,
    sink: S,
    shortcuts: ShortcutRegistry,
    shortcut_guard: Option<ShortcutGuard>,
    issued_seq: u64,
    pending: Option<SearchTicket>,
    /// Normalized query the user asked for. `None` while the viewer only
    /// follows the results feed; empty after the query was cleared.
    chosen_query: Option<String>,
    recent: Vec<String>,
}

impl ViewerController<NoScroll> {
    pub fn new() -> Self {
        Self::with_scroll_sink(NoScroll)
    }
}

impl Default for ViewerController<NoScroll> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ScrollSink> ViewerController<S> {
    pub fn with_scroll_sink(sink: S) -> Self {
        Self {
            state: NavigationState::default(),
            document: None,
            results: None,
            renderer: HighlightRenderer::default(),
            sink,
            shortcuts: ShortcutRegistry::new(),
            shortcut_guard: None,
            issued_seq: 0,
            pending: None,
            chosen_query: None,
            recent: Vec::new(),
        }
    }

    /// Use custom marker classes for rendered markup.
    pub fn with_classes(mut self, classes: MarkerClasses) -> Self {
        self.renderer = HighlightRenderer::new(classes);
        self
    }

    // -- Accessors -----------------------------------------------------------

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn phase(&self) -> ViewerPhase {
        if self.state.query_active() {
            ViewerPhase::QueryActive {
                highlights_enabled: self.state.highlights_enabled,
            }
        } else {
            ViewerPhase::NoQuery
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn results(&self) -> Option<&SearchResultSet> {
        self.results.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Handle to the shortcut registry, e.g. to check whether navigation
    /// keys are currently captured.
    pub fn shortcuts(&self) -> &ShortcutRegistry {
        &self.shortcuts
    }

    pub fn pending_search(&self) -> Option<&SearchTicket> {
        self.pending.as_ref()
    }

    /// Number of pages, from the document or else the result set.
    pub fn total_pages(&self) -> usize {
        match (&self.document, &self.results) {
            (Some(doc), _) => doc.total_pages(),
            (None, Some(results)) => results.total_pages,
            (None, None) => 0,
        }
    }

    /// Navigation index for the current state.
    pub fn index(&self) -> NavigationIndex {
        NavigationIndex::build_for_view(
            self.results.as_ref(),
            self.document.as_ref(),
            &self.state.current_query,
            self.state.highlight_mode,
            self.state.current_page,
        )
    }

    // -- Document and results -----------------------------------------------

    /// Show a newly ingested document. Results for a previous document are
    /// discarded.
    pub fn load_document(&mut self, document: Document) {
        let before = self.state.address();
        debug!(pages = document.total_pages(), "document loaded into viewer");
        self.document = Some(document);
        self.results = None;
        self.pending = None;
        self.state.current_page = 1;
        self.state.local_match_index = 0;
        self.settle(before, false);
    }

    /// Set the query and issue a ticket for the search request.
    pub fn begin_search(&mut self, query: &str) -> SearchTicket {
        self.set_query(query);
        self.issued_seq += 1;
        let ticket = SearchTicket {
            seq: self.issued_seq,
            query: self.state.current_query.clone(),
        };
        self.remember_search(&ticket.query);
        debug!(seq = ticket.seq, query = %ticket.query, "search issued");
        self.pending = Some(ticket.clone());
        ticket
    }

    /// Accept `results` for `ticket` unless a newer search was issued or
    /// the query changed since. Returns whether the set was applied.
    pub fn receive_for(&mut self, ticket: &SearchTicket, results: SearchResultSet) -> bool {
        if ticket.seq != self.issued_seq {
            debug!(seq = ticket.seq, latest = self.issued_seq, "dropping stale results");
            return false;
        }
        if normalize(&ticket.query) != normalize(&self.state.current_query) {
            debug!(query = %ticket.query, "dropping results for abandoned query");
            return false;
        }
        self.apply_results(results);
        true
    }

    /// Accept an untagged result set, as delivered by the results file
    /// watcher.
    ///
    /// With a search pending, the set must be for that search's query and
    /// the query must still be current. Once the user has chosen or
    /// cleared a query, only sets for that query are accepted. Until then
    /// the set's query becomes the current query.
    pub fn receive_results(&mut self, results: SearchResultSet) -> bool {
        let received = normalize(&results.query);
        let accept = match (&self.pending, &self.chosen_query) {
            (Some(pending), _) => {
                normalize(&pending.query) == received
                    && normalize(&self.state.current_query) == received
            }
            (None, Some(chosen)) => !chosen.is_empty() && *chosen == received,
            (None, None) => true,
        };
        if !accept {
            debug!(
                current = %self.state.current_query,
                received = %results.query,
                "dropping results for a different query"
            );
            return false;
        }
        if self.chosen_query.is_none() && !results.query.is_empty() {
            self.state.current_query = results.query.clone();
        }
        self.apply_results(results);
        true
    }

    fn apply_results(&mut self, results: SearchResultSet) {
        let before = self.state.address();
        debug!(
            query = %results.query,
            results = results.results.len(),
            "result set replaced"
        );
        if let Some(first) = results.first_page() {
            if self.page_in_bounds_for(first, Some(&results)) {
                self.state.current_page = first;
            }
        }
        self.state.local_match_index = 0;
        self.results = Some(results);
        self.pending = None;
        self.settle(before, true);
    }

    // -- Query ---------------------------------------------------------------

    pub fn set_query(&mut self, query: &str) {
        self.chosen_query = Some(normalize(query));
        if query == self.state.current_query {
            return;
        }
        let before = self.state.address();
        self.state.current_query = query.to_string();
        self.state.local_match_index = 0;
        self.settle(before, true);
    }

    /// Return to the no-query state, discarding results.
    pub fn clear_query(&mut self) {
        let before = self.state.address();
        self.state.current_query.clear();
        self.state.local_match_index = 0;
        self.results = None;
        self.pending = None;
        self.chosen_query = Some(String::new());
        self.settle(before, false);
    }

    // -- Pages ---------------------------------------------------------------

    /// Go to `page`. Returns `false` (and changes nothing) if the page is
    /// out of bounds.
    pub fn set_page(&mut self, page: usize) -> bool {
        if !self.page_in_bounds_for(page, self.results.as_ref()) {
            debug!(page, total = self.total_pages(), "page out of bounds");
            return false;
        }
        let before = self.state.address();
        let reentered = page == self.state.current_page;
        self.state.current_page = page;
        self.state.local_match_index = 0;
        self.settle(before, reentered);
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.state.current_page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        match self.state.current_page.checked_sub(1) {
            Some(page) => self.set_page(page),
            None => false,
        }
    }

    fn page_in_bounds_for(&self, page: usize, results: Option<&SearchResultSet>) -> bool {
        let total = match (&self.document, results) {
            (Some(doc), _) => doc.total_pages(),
            (None, Some(results)) => results.total_pages,
            (None, None) => 0,
        };
        page >= 1 && (total == 0 || page <= total)
    }

    // -- Highlighting --------------------------------------------------------

    pub fn toggle_highlights(&mut self) {
        self.set_highlights_enabled(!self.state.highlights_enabled);
    }

    pub fn set_highlights_enabled(&mut self, enabled: bool) {
        if enabled == self.state.highlights_enabled {
            return;
        }
        let before = self.state.address();
        self.state.highlights_enabled = enabled;
        self.settle(before, enabled);
    }

    /// Change the highlight mode. The local index is clamped to the new
    /// page count.
    pub fn set_mode(&mut self, mode: HighlightMode) {
        if mode == self.state.highlight_mode {
            return;
        }
        let before = self.state.address();
        self.state.highlight_mode = mode;
        let count = self.index().count_for_page(self.state.current_page);
        self.state.local_match_index = self.state.local_match_index.min(count.saturating_sub(1));
        self.settle(before, true);
    }

    pub fn cycle_mode(&mut self) {
        self.set_mode(self.state.highlight_mode.cycle());
    }

    // -- Match navigation ----------------------------------------------------

    pub fn next_local(&mut self) {
        self.navigate(NavCommand::NextLocal);
    }

    pub fn prev_local(&mut self) {
        self.navigate(NavCommand::PrevLocal);
    }

    pub fn next_global(&mut self) {
        self.navigate(NavCommand::NextGlobal);
    }

    pub fn prev_global(&mut self) {
        self.navigate(NavCommand::PrevGlobal);
    }

    pub fn navigate(&mut self, command: NavCommand) {
        if !self.state.query_active() {
            return;
        }
        let index = self.index();
        let at = self.state.address();
        let target = match command {
            NavCommand::NextLocal => Some(index.next_local(at)),
            NavCommand::PrevLocal => Some(index.prev_local(at)),
            NavCommand::NextGlobal => index.next_global(at),
            NavCommand::PrevGlobal => index.prev_global(at),
        };
        let Some(target) = target else {
            return;
        };
        debug!(?command, from = ?at, to = ?target, "navigate");
        self.state.current_page = target.page;
        self.state.local_match_index = target.local_index;
        self.settle(at, false);
    }

    /// Handle a key while shortcuts are subscribed. Returns `true` if the
    /// key was consumed.
    pub fn on_key(&mut self, key: &KeyEvent) -> bool {
        match self.shortcuts.dispatch(key) {
            Some(command) => {
                self.navigate(command);
                true
            }
            None => false,
        }
    }

    // -- Post-transition -----------------------------------------------------

    /// Sync the keyboard subscription and run the scroll effect.
    fn settle(&mut self, before: MatchAddress, force_scroll: bool) {
        let index = self.index();
        let multi_match = index.total_count() > 1;
        let subscribe =
            self.state.query_active() && self.state.highlights_enabled && multi_match;

        match (subscribe, self.shortcut_guard.is_some()) {
            (true, false) => {
                self.shortcut_guard = Some(self.shortcuts.subscribe("viewer"));
            }
            (false, true) => {
                self.shortcut_guard = None;
            }
            _ => {}
        }

        let after = self.state.address();
        let moved = after != before || force_scroll;
        if moved
            && self.state.highlights_enabled
            && self.state.query_active()
            && index.count_for_page(after.page) > 0
        {
            let request = ScrollRequest::centered(after);
            if let Err(err) = self.sink.scroll_into_view(&request) {
                debug!(%err, "scroll skipped");
            }
        }
    }

    // -- Views ---------------------------------------------------------------

    /// Text of `page` as shown and matched: the document page, else the
    /// first result for the page.
    pub fn page_text(&self, page: usize) -> Option<Cow<'_, str>> {
        if let Some(doc) = &self.document {
            return doc.page(page).map(|p| Cow::Borrowed(p.text.as_str()));
        }
        let results = self.results.as_ref()?;
        let result = results.for_page(page).next()?;
        Some(source_text(None, result))
    }

    /// Spans on the current page, the same ones [`Self::view`] marks.
    pub fn current_spans(&self) -> Vec<Span> {
        self.index()
            .spans_for_page(self.state.current_page)
            .to_vec()
    }

    pub fn view(&self) -> PageView {
        let index = self.index();
        let page = self.state.current_page;
        let at = self.state.address();
        let text = self.page_text(page).unwrap_or_default();
        let spans = index.spans_for_page(page);
        let match_count = spans.len();
        let query_active = self.state.query_active();

        let markup = self.renderer.render_page(
            &text,
            &self.state.current_query,
            spans,
            self.state.local_match_index,
            self.state.highlights_enabled,
        );

        let active_index = (query_active && self.state.highlights_enabled && match_count > 0)
            .then_some(self.state.local_match_index);

        let total = index.total_count();
        let global_counter = (total > 0).then(|| index.global_counter(at));

        let hint = if query_active && match_count == 0 {
            if total == 0 {
                Some(format!("No matches for \"{}\"", self.state.current_query))
            } else {
                Some(NEXT_MATCH_HINT.to_string())
            }
        } else {
            None
        };

        PageView {
            page,
            markup,
            match_count,
            active_index,
            counter: index.local_counter(at),
            global_counter,
            hint,
        }
    }

    /// Result entries for the current page.
    pub fn page_results(&self) -> Vec<ResultEntry> {
        let Some(results) = &self.results else {
            return Vec::new();
        };
        results
            .for_page(self.state.current_page)
            .map(|r| ResultEntry {
                page: r.page,
                score_percent: r.score_percent(),
                snippet: r.text.clone(),
            })
            .collect()
    }

    /// `Found N results for "q"`, once results have arrived.
    pub fn summary(&self) -> Option<String> {
        self.results.as_ref().map(SearchResultSet::summary)
    }

    // -- Recent searches -----------------------------------------------------

    fn remember_search(&mut self, query: &str) {
        let normalized = normalize(query);
        let trimmed = normalized.trim();
        if trimmed.is_empty() {
            return;
        }
        self.recent.retain(|q| q != trimmed);
        self.recent.insert(0, trimmed.to_string());
        self.recent.truncate(MAX_RECENT_SEARCHES);
    }

    /// Most recent first.
    pub fn recent_searches(&self) -> &[String] {
        &self.recent
    }

    pub fn clear_recent_searches(&mut self) {
        self.recent.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
