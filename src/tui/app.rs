//! Application state for the TUI.
//!
//! The [`App`] struct owns all mutable state that drives the TUI: focus
//! tracking, the query bar, the results panel, the page scroll offset,
//! and the [`ViewerController`] that holds the navigation state.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::controller::{ScrollRequest, ScrollSink, ViewerController};
use crate::document::Document;
use crate::error::ScrollError;
use crate::results::SearchResultSet;
use crate::search::{SearchState, SearchSubmit};
use crate::theme::ThemeColors;

/// Rows moved per mouse wheel notch.
const MOUSE_SCROLL_ROWS: u16 = 3;

// ---------------------------------------------------------------------------
// PageScroller
// ---------------------------------------------------------------------------

/// Scroll sink for the page panel.
///
/// Requests are parked here and resolved by the draw pass, which is the
/// only place that knows how the page wraps.
#[derive(Debug, Default)]
pub struct PageScroller {
    pending: Option<ScrollRequest>,
}

impl PageScroller {
    pub fn pending(&self) -> Option<&ScrollRequest> {
        self.pending.as_ref()
    }

    pub fn take(&mut self) -> Option<ScrollRequest> {
        self.pending.take()
    }
}

impl ScrollSink for PageScroller {
    fn scroll_into_view(&mut self, request: &ScrollRequest) -> Result<(), ScrollError> {
        self.pending = Some(*request);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Focus enum
// ---------------------------------------------------------------------------

/// Which panel currently has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Page,
    Results,
}

// ---------------------------------------------------------------------------
// App struct
// ---------------------------------------------------------------------------

/// Root application state.
///
/// Single-owner, never shared across threads. The event loop owns the
/// `App` and passes a `&mut` reference to key handlers and the draw
/// function.
pub struct App {
    /// Which panel has keyboard focus.
    pub focus: Focus,
    /// Set to `true` to exit the event loop.
    pub should_quit: bool,
    /// Set when state changed since the last draw.
    pub needs_redraw: bool,
    /// Effective application configuration.
    pub config: AppConfig,
    /// Resolved theme colors derived from `config.theme`.
    pub theme_colors: ThemeColors,
    /// Page, query, highlight and match-navigation state.
    pub viewer: ViewerController<PageScroller>,
    /// Query bar state (opened with `/`).
    pub search: SearchState,
    /// Whether the results panel is visible.
    pub results_panel_visible: bool,
    /// Index of the selected row in the results panel.
    pub selected_result: usize,
    /// Vertical scroll offset of the page panel, in wrapped rows.
    pub page_scroll: u16,
    /// Page the scroll offset belongs to; a different page starts at the top.
    pub scrolled_page: usize,
    /// Inner height of the page panel from the last draw.
    pub page_viewport_height: u16,
    /// Whether the help overlay is currently visible.
    pub help_overlay_visible: bool,
    /// Transient status message shown in the status bar.
    /// Cleared on the next key press.
    pub status_message: Option<String>,
}

impl App {
    /// Create a new `App` with the given config.
    ///
    /// Highlight mode, the highlight toggle and marker classes come from
    /// `config.highlight`. No document is loaded yet.
    pub fn new(config: AppConfig) -> Self {
        let theme_colors = ThemeColors::from_theme(&config.theme);
        let mut viewer = ViewerController::with_scroll_sink(PageScroller::default())
            .with_classes(config.highlight.classes.clone());
        viewer.set_mode(config.highlight.mode);
        viewer.set_highlights_enabled(config.highlight.enabled);
        let results_panel_visible = config.viewer.results_panel;
        Self {
            focus: Focus::Page,
            should_quit: false,
            needs_redraw: true,
            config,
            theme_colors,
            viewer,
            search: SearchState::default(),
            results_panel_visible,
            selected_result: 0,
            page_scroll: 0,
            scrolled_page: 1,
            page_viewport_height: 0,
            help_overlay_visible: false,
            status_message: None,
        }
    }

    // -- Loading -------------------------------------------------------------

    pub fn load_document(&mut self, document: Document) {
        self.viewer.load_document(document);
        self.selected_result = 0;
        self.page_scroll = 0;
    }

    /// Show the initial results, optionally overriding their query.
    ///
    /// With an override the result pages stay, but exact offsets computed
    /// for the file's query are ignored and matches are located afresh.
    pub fn load_initial_results(&mut self, results: SearchResultSet, query: Option<&str>) {
        self.on_results(results);
        if let Some(query) = query {
            self.viewer.set_query(query);
        }
    }

    /// Results delivered by the loader or the watcher.
    pub fn on_results(&mut self, results: SearchResultSet) {
        self.needs_redraw = true;
        let query = results.query.clone();
        if self.viewer.receive_results(results) {
            self.selected_result = 0;
            if let Some(summary) = self.viewer.summary() {
                self.status_message = Some(summary);
            }
        } else {
            debug!(query = %query, "ignoring results for a different query");
            self.status_message = Some(format!("Ignored stale results for \"{}\"", query));
        }
    }

    pub fn on_watch_error(&mut self, message: String) {
        warn!(error = %message, "results file could not be loaded");
        self.needs_redraw = true;
        self.status_message = Some(format!("results file: {}", message));
    }

    // -- Key handling --------------------------------------------------------

    /// Handle a key event, dispatching to the appropriate action.
    pub fn on_key(&mut self, key: KeyEvent) {
        // Clear transient status messages on any key press.
        self.status_message = None;
        self.needs_redraw = true;

        // When the help overlay is visible, ANY key dismisses it.
        if self.help_overlay_visible {
            self.help_overlay_visible = false;
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        // Ctrl+C always quits, unless it is cancelling the query bar.
        if ctrl && key.code == KeyCode::Char('c') {
            if self.search.is_input() {
                self.search.cancel();
                return;
            }
            self.should_quit = true;
            return;
        }

        if self.search.is_input() {
            self.on_search_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') => {
                self.help_overlay_visible = true;
                return;
            }
            KeyCode::Char('/') => {
                let current = self.viewer.state().current_query.clone();
                self.search.start_input(&current);
                return;
            }
            KeyCode::Tab => {
                self.toggle_focus();
                return;
            }
            KeyCode::Char('r') => {
                self.toggle_results_panel();
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Page => self.on_page_key(key),
            Focus::Results => self.on_results_key(key),
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.search.cancel(),
            KeyCode::Enter => match self.search.confirm() {
                Some(SearchSubmit::Query(query)) => {
                    let ticket = self.viewer.begin_search(&query);
                    debug!(seq = ticket.seq, query = %ticket.query, "search submitted");
                    self.status_message = Some(format!("Searching for \"{}\"", query));
                }
                Some(SearchSubmit::Clear) => self.viewer.clear_query(),
                None => {}
            },
            KeyCode::Backspace => self.search.on_backspace(),
            KeyCode::Up => {
                let recent = self.viewer.recent_searches().to_vec();
                self.search.history_older(&recent);
            }
            KeyCode::Down => {
                let recent = self.viewer.recent_searches().to_vec();
                self.search.history_newer(&recent);
            }
            KeyCode::Char(ch) => self.search.on_char(ch),
            _ => {}
        }
    }

    fn on_page_key(&mut self, key: KeyEvent) {
        // Match navigation wins while the viewer holds the shortcuts.
        if self.viewer.on_key(&key) {
            return;
        }

        match key.code {
            KeyCode::Right | KeyCode::Char(']') => {
                self.viewer.next_page();
            }
            KeyCode::Left | KeyCode::Char('[') => {
                self.viewer.prev_page();
            }
            KeyCode::Char('h') => self.viewer.toggle_highlights(),
            KeyCode::Char('m') => {
                self.viewer.cycle_mode();
                self.status_message =
                    Some(format!("mode: {}", self.viewer.state().highlight_mode));
            }
            KeyCode::Esc | KeyCode::Char('x') => self.viewer.clear_query(),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::PageDown | KeyCode::Char(' ') => {
                self.scroll_down(self.page_viewport_height.max(1))
            }
            KeyCode::PageUp => self.scroll_up(self.page_viewport_height.max(1)),
            KeyCode::Home | KeyCode::Char('g') => self.page_scroll = 0,
            _ => {}
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.select_prev_result(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next_result(),
            KeyCode::Enter => self.confirm_result_selection(),
            KeyCode::Esc => self.focus = Focus::Page,
            _ => {}
        }
    }

    /// Mouse wheel scrolls the page panel.
    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        self.needs_redraw = true;
        match mouse.kind {
            MouseEventKind::ScrollDown => self.scroll_down(MOUSE_SCROLL_ROWS),
            MouseEventKind::ScrollUp => self.scroll_up(MOUSE_SCROLL_ROWS),
            _ => {}
        }
    }

    // -- Focus and panels ----------------------------------------------------

    /// Toggle focus between Page and Results.
    ///
    /// If the results panel is hidden, focus stays on Page.
    pub fn toggle_focus(&mut self) {
        if !self.results_panel_visible {
            self.focus = Focus::Page;
            return;
        }
        self.focus = match self.focus {
            Focus::Page => Focus::Results,
            Focus::Results => Focus::Page,
        };
    }

    /// Toggle the results panel. Hiding it while focused moves focus to
    /// the page.
    pub fn toggle_results_panel(&mut self) {
        self.results_panel_visible = !self.results_panel_visible;
        if !self.results_panel_visible && self.focus == Focus::Results {
            self.focus = Focus::Page;
        }
    }

    // -- Page scrolling ------------------------------------------------------

    pub fn scroll_down(&mut self, rows: u16) {
        self.page_scroll = self.page_scroll.saturating_add(rows);
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.page_scroll = self.page_scroll.saturating_sub(rows);
    }

    // -- Results selection ---------------------------------------------------

    fn result_count(&self) -> usize {
        self.viewer.results().map_or(0, |r| r.results.len())
    }

    pub fn select_prev_result(&mut self) {
        if self.selected_result > 0 {
            self.selected_result -= 1;
        }
    }

    pub fn select_next_result(&mut self) {
        let count = self.result_count();
        if count > 0 && self.selected_result < count - 1 {
            self.selected_result += 1;
        }
    }

    /// Jump to the selected result's page and hand focus to the page.
    pub fn confirm_result_selection(&mut self) {
        let Some(page) = self
            .viewer
            .results()
            .and_then(|r| r.results.get(self.selected_result))
            .map(|r| r.page)
        else {
            return;
        };
        if !self.viewer.set_page(page) {
            self.status_message = Some(format!("Page {} is out of range", page));
            return;
        }
        self.focus = Focus::Page;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::HighlightMode;
    use crate::results::PageMatch;
    use crossterm::event::KeyEventState;
    use rstest::rstest;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn shift(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::SHIFT)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(ch),
            modifiers: KeyModifiers::CONTROL,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn type_str(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.on_key(key(KeyCode::Char(ch)));
        }
    }

    fn document() -> Document {
        Document::from_pages(
            Some("animals.pdf".to_string()),
            [
                (1, "a cat and a cat"),
                (2, "nothing here"),
                (3, "one cat"),
            ],
        )
        .unwrap()
    }

    fn result(page: usize, text: &str) -> PageMatch {
        PageMatch {
            page,
            score: 0.9,
            text: text.to_string(),
            full_text: None,
            exact_matches: None,
        }
    }

    fn cat_results() -> SearchResultSet {
        SearchResultSet {
            query: "cat".to_string(),
            total_pages: 3,
            results: vec![result(1, "a cat and a cat"), result(3, "one cat")],
        }
    }

    fn loaded_app() -> App {
        let mut app = App::new(AppConfig::default());
        app.load_document(document());
        app.on_results(cat_results());
        app
    }

    // -- App::new ------------------------------------------------------------

    #[test]
    fn test_new_defaults() {
        let app = App::new(AppConfig::default());
        assert_eq!(app.focus, Focus::Page);
        assert!(!app.should_quit);
        assert!(app.results_panel_visible);
        assert!(!app.search.is_input());
        assert_eq!(app.viewer.state().highlight_mode, HighlightMode::Auto);
        assert!(app.viewer.state().highlights_enabled);
    }

    #[test]
    fn test_new_applies_highlight_config() {
        let mut config = AppConfig::default();
        config.highlight.mode = HighlightMode::Simple;
        config.highlight.enabled = false;
        config.viewer.results_panel = false;
        let app = App::new(config);
        assert_eq!(app.viewer.state().highlight_mode, HighlightMode::Simple);
        assert!(!app.viewer.state().highlights_enabled);
        assert!(!app.results_panel_visible);
    }

    // -- Quit and help -------------------------------------------------------

    #[test]
    fn test_on_key_q_quits() {
        let mut app = App::new(AppConfig::default());
        app.on_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_on_key_ctrl_c_quits() {
        let mut app = App::new(AppConfig::default());
        app.on_key(ctrl('c'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_cancels_query_bar_first() {
        let mut app = App::new(AppConfig::default());
        app.on_key(key(KeyCode::Char('/')));
        app.on_key(ctrl('c'));
        assert!(!app.search.is_input());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_help_overlay_dismissed_by_any_key() {
        let mut app = App::new(AppConfig::default());
        app.on_key(key(KeyCode::Char('?')));
        assert!(app.help_overlay_visible);
        app.on_key(key(KeyCode::Char('q')));
        assert!(!app.help_overlay_visible);
        assert!(!app.should_quit);
    }

    // -- Query bar -----------------------------------------------------------

    #[test]
    fn test_typing_q_in_query_bar_does_not_quit() {
        let mut app = App::new(AppConfig::default());
        app.on_key(key(KeyCode::Char('/')));
        type_str(&mut app, "quick");
        assert!(!app.should_quit);
        assert_eq!(app.search.input_buffer, "quick");
    }

    #[test]
    fn test_submit_query_begins_search() {
        let mut app = App::new(AppConfig::default());
        app.load_document(document());
        app.on_key(key(KeyCode::Char('/')));
        type_str(&mut app, "cat");
        app.on_key(key(KeyCode::Enter));

        assert_eq!(app.viewer.state().current_query, "cat");
        let ticket = app.viewer.pending_search().unwrap();
        assert_eq!(ticket.query, "cat");
        assert_eq!(app.viewer.recent_searches(), ["cat".to_string()]);
        // Document pages are highlighted before results arrive.
        assert_eq!(app.viewer.view().match_count, 2);
    }

    #[test]
    fn test_submit_empty_query_clears() {
        let mut app = loaded_app();
        app.on_key(key(KeyCode::Char('/')));
        for _ in 0..3 {
            app.on_key(key(KeyCode::Backspace));
        }
        app.on_key(key(KeyCode::Enter));
        assert!(!app.viewer.state().query_active());
        assert!(app.viewer.results().is_none());
    }

    #[test]
    fn test_query_bar_prefills_current_query() {
        let mut app = loaded_app();
        app.on_key(key(KeyCode::Char('/')));
        assert_eq!(app.search.input_buffer, "cat");
        app.on_key(key(KeyCode::Esc));
        assert!(!app.search.is_input());
        assert_eq!(app.viewer.state().current_query, "cat");
    }

    #[test]
    fn test_query_bar_history() {
        let mut app = App::new(AppConfig::default());
        app.load_document(document());
        for q in ["cat", "one"] {
            app.on_key(key(KeyCode::Char('/')));
            app.search.input_buffer.clear();
            type_str(&mut app, q);
            app.on_key(key(KeyCode::Enter));
        }
        app.on_key(key(KeyCode::Char('/')));
        app.on_key(key(KeyCode::Up));
        assert_eq!(app.search.input_buffer, "one");
        app.on_key(key(KeyCode::Up));
        assert_eq!(app.search.input_buffer, "cat");
    }

    // -- Results delivery ----------------------------------------------------

    #[test]
    fn test_stale_results_rejected_with_status() {
        let mut app = App::new(AppConfig::default());
        app.load_document(document());
        app.viewer.begin_search("dog");
        app.on_results(cat_results());
        assert!(app.viewer.results().is_none());
        assert!(app.status_message.as_deref().unwrap().contains("stale"));
    }

    #[test]
    fn test_results_summary_shown() {
        let app = loaded_app();
        assert_eq!(
            app.status_message.as_deref(),
            Some("Found 2 results for \"cat\"")
        );
    }

    #[test]
    fn test_initial_query_override() {
        let mut app = App::new(AppConfig::default());
        app.load_document(document());
        app.load_initial_results(cat_results(), Some("one"));
        assert_eq!(app.viewer.state().current_query, "one");
        assert!(app.viewer.results().is_some());
    }

    #[test]
    fn test_watch_error_sets_status() {
        let mut app = loaded_app();
        app.on_watch_error("bad json".to_string());
        assert_eq!(
            app.status_message.as_deref(),
            Some("results file: bad json")
        );
        assert!(app.viewer.results().is_some());
    }

    // -- Page keys -----------------------------------------------------------

    #[test]
    fn test_arrows_navigate_matches_when_subscribed() {
        let mut app = loaded_app();
        assert!(app.viewer.shortcuts().is_active());
        app.on_key(key(KeyCode::Right));
        assert_eq!(app.viewer.state().current_page, 1);
        assert_eq!(app.viewer.state().local_match_index, 1);

        app.on_key(shift(KeyCode::Right));
        assert_eq!(app.viewer.state().current_page, 3);
        assert_eq!(app.viewer.state().local_match_index, 0);
    }

    #[test]
    fn test_arrows_turn_pages_without_query() {
        let mut app = App::new(AppConfig::default());
        app.load_document(document());
        assert!(!app.viewer.shortcuts().is_active());
        app.on_key(key(KeyCode::Right));
        assert_eq!(app.viewer.state().current_page, 2);
        app.on_key(key(KeyCode::Left));
        assert_eq!(app.viewer.state().current_page, 1);
    }

    #[rstest]
    #[case(']', 2)]
    #[case('[', 1)]
    fn test_bracket_keys_turn_pages(#[case] ch: char, #[case] expected: usize) {
        let mut app = loaded_app();
        app.on_key(key(KeyCode::Char(']')));
        assert_eq!(app.viewer.state().current_page, 2);
        if ch == '[' {
            app.on_key(key(KeyCode::Char('[')));
        }
        assert_eq!(app.viewer.state().current_page, expected);
    }

    #[test]
    fn test_h_toggles_highlights_and_shortcuts() {
        let mut app = loaded_app();
        app.on_key(key(KeyCode::Char('h')));
        assert!(!app.viewer.state().highlights_enabled);
        assert!(!app.viewer.shortcuts().is_active());
        app.on_key(key(KeyCode::Char('h')));
        assert!(app.viewer.state().highlights_enabled);
        assert!(app.viewer.shortcuts().is_active());
    }

    #[test]
    fn test_m_cycles_mode() {
        let mut app = loaded_app();
        app.on_key(key(KeyCode::Char('m')));
        assert_eq!(app.viewer.state().highlight_mode, HighlightMode::Simple);
        assert_eq!(app.status_message.as_deref(), Some("mode: simple"));
    }

    #[test]
    fn test_esc_clears_query() {
        let mut app = loaded_app();
        app.on_key(key(KeyCode::Esc));
        assert!(!app.viewer.state().query_active());
        assert!(!app.viewer.shortcuts().is_active());
    }

    #[test]
    fn test_scroll_keys() {
        let mut app = App::new(AppConfig::default());
        app.page_viewport_height = 10;
        app.on_key(key(KeyCode::Char('j')));
        app.on_key(key(KeyCode::Char('j')));
        assert_eq!(app.page_scroll, 2);
        app.on_key(key(KeyCode::PageDown));
        assert_eq!(app.page_scroll, 12);
        app.on_key(key(KeyCode::Char('k')));
        assert_eq!(app.page_scroll, 11);
        app.on_key(key(KeyCode::Home));
        assert_eq!(app.page_scroll, 0);
        app.on_key(key(KeyCode::Up));
        assert_eq!(app.page_scroll, 0);
    }

    #[test]
    fn test_mouse_wheel_scrolls() {
        let mut app = App::new(AppConfig::default());
        let wheel = |kind| MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        app.on_mouse(wheel(MouseEventKind::ScrollDown));
        assert_eq!(app.page_scroll, MOUSE_SCROLL_ROWS);
        app.on_mouse(wheel(MouseEventKind::ScrollUp));
        assert_eq!(app.page_scroll, 0);
    }

    // -- Scroll requests -----------------------------------------------------

    #[test]
    fn test_navigation_parks_scroll_request() {
        let mut app = loaded_app();
        app.viewer.sink_mut().take();
        app.on_key(key(KeyCode::Char('n')));
        let request = app.viewer.sink().pending().copied().unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.local_index, 1);
    }

    // -- Focus and results panel ---------------------------------------------

    #[test]
    fn test_tab_toggles_focus() {
        let mut app = App::new(AppConfig::default());
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Results);
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Page);
    }

    #[test]
    fn test_hiding_results_panel_moves_focus() {
        let mut app = App::new(AppConfig::default());
        app.on_key(key(KeyCode::Tab));
        app.on_key(key(KeyCode::Char('r')));
        assert!(!app.results_panel_visible);
        assert_eq!(app.focus, Focus::Page);
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Page);
    }

    #[test]
    fn test_results_selection_and_jump() {
        let mut app = loaded_app();
        app.on_key(key(KeyCode::Tab));
        app.on_key(key(KeyCode::Down));
        assert_eq!(app.selected_result, 1);
        app.on_key(key(KeyCode::Down));
        assert_eq!(app.selected_result, 1);
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.focus, Focus::Page);
        assert_eq!(app.viewer.state().current_page, 3);
        app.on_key(key(KeyCode::Tab));
        app.on_key(key(KeyCode::Char('k')));
        assert_eq!(app.selected_result, 0);
    }

    #[test]
    fn test_confirm_selection_without_results_is_noop() {
        let mut app = App::new(AppConfig::default());
        app.confirm_result_selection();
        assert_eq!(app.focus, Focus::Page);
        assert_eq!(app.viewer.state().current_page, 1);
    }
}
