//! Theme support for the TUI.
//!
//! Provides a [`ThemeColors`] struct containing all color definitions used
//! by the terminal viewer. Two constructors are provided:
//! [`ThemeColors::dark()`] and [`ThemeColors::light()`].
//!
//! All colors use the 16 basic ANSI palette for maximum terminal compatibility.

use ratatui::style::Color;

use crate::cli::Theme;
use crate::markup::MarkerKind;

// ---------------------------------------------------------------------------
// ThemeColors
// ---------------------------------------------------------------------------

/// All color definitions for the TUI, grouped by component.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    // -- Borders -----------------------------------------------------------
    /// Border color when the panel has keyboard focus.
    pub border_focused: Color,
    /// Border color when the panel does not have focus.
    pub border_unfocused: Color,

    // -- Page --------------------------------------------------------------
    /// Page text foreground.
    pub page_text: Color,
    /// Placeholder text (e.g. "No document loaded").
    pub page_placeholder: Color,
    /// Hint line shown above a page without matches.
    pub page_hint: Color,

    // -- Match markers -----------------------------------------------------
    pub match_active_fg: Color,
    pub match_active_bg: Color,
    pub match_even_fg: Color,
    pub match_even_bg: Color,
    pub match_odd_fg: Color,
    pub match_odd_bg: Color,

    // -- Results panel -----------------------------------------------------
    /// Page number column.
    pub results_page: Color,
    /// Score percentage column.
    pub results_score: Color,
    /// Snippet text.
    pub results_snippet: Color,
    /// Selected row foreground.
    pub results_selected_fg: Color,
    /// Selected row background.
    pub results_selected_bg: Color,
    /// Marker for rows on the page being viewed.
    pub results_current_page: Color,

    // -- Status bar --------------------------------------------------------
    /// Status bar background.
    pub status_bar_bg: Color,
    /// Status bar default foreground.
    pub status_bar_fg: Color,
    /// Match counters.
    pub status_counter: Color,
    /// Mode and highlight badges.
    pub status_badge: Color,
    /// Separator foreground.
    pub status_separator: Color,
    /// Shortcut key foreground.
    pub status_shortcut_key: Color,

    // -- Search input ------------------------------------------------------
    /// Search input bar text foreground.
    pub search_input_fg: Color,
    /// Search prompt (`/`) foreground.
    pub search_prompt: Color,
    /// Recent search suggestions.
    pub search_recent: Color,

    // -- Help overlay ------------------------------------------------------
    pub help_bg: Color,
    pub help_fg: Color,
    pub help_key: Color,
}

impl ThemeColors {
    /// Construct the theme colors from the CLI/config theme enum.
    pub fn from_theme(theme: &Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            // Borders
            border_focused: Color::Cyan,
            border_unfocused: Color::DarkGray,

            // Page
            page_text: Color::White,
            page_placeholder: Color::DarkGray,
            page_hint: Color::Yellow,

            // Match markers
            match_active_fg: Color::Black,
            match_active_bg: Color::LightRed,
            match_even_fg: Color::Black,
            match_even_bg: Color::Yellow,
            match_odd_fg: Color::Black,
            match_odd_bg: Color::LightYellow,

            // Results panel
            results_page: Color::Cyan,
            results_score: Color::Green,
            results_snippet: Color::Gray,
            results_selected_fg: Color::White,
            results_selected_bg: Color::DarkGray,
            results_current_page: Color::Yellow,

            // Status bar
            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_counter: Color::Cyan,
            status_badge: Color::Magenta,
            status_separator: Color::Gray,
            status_shortcut_key: Color::Yellow,

            // Search
            search_input_fg: Color::White,
            search_prompt: Color::Yellow,
            search_recent: Color::DarkGray,

            // Help
            help_bg: Color::Black,
            help_fg: Color::White,
            help_key: Color::Yellow,
        }
    }

    /// Adjusted for readability on light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            // Borders
            border_focused: Color::Blue,
            border_unfocused: Color::Gray,

            // Page
            page_text: Color::Black,
            page_placeholder: Color::Gray,
            page_hint: Color::Magenta,

            // Match markers
            match_active_fg: Color::White,
            match_active_bg: Color::Red,
            match_even_fg: Color::Black,
            match_even_bg: Color::Yellow,
            match_odd_fg: Color::Black,
            match_odd_bg: Color::LightYellow,

            // Results panel
            results_page: Color::Blue,
            results_score: Color::Green,
            results_snippet: Color::DarkGray,
            results_selected_fg: Color::White,
            results_selected_bg: Color::Blue,
            results_current_page: Color::Magenta,

            // Status bar
            status_bar_bg: Color::Gray,
            status_bar_fg: Color::Black,
            status_counter: Color::Blue,
            status_badge: Color::Magenta,
            status_separator: Color::DarkGray,
            status_shortcut_key: Color::Blue,

            // Search
            search_input_fg: Color::Black,
            search_prompt: Color::Blue,
            search_recent: Color::Gray,

            // Help
            help_bg: Color::White,
            help_fg: Color::Black,
            help_key: Color::Blue,
        }
    }

    /// Foreground and background for a match marker.
    pub fn marker_colors(&self, kind: MarkerKind) -> (Color, Color) {
        match kind {
            MarkerKind::Active => (self.match_active_fg, self.match_active_bg),
            MarkerKind::Even => (self.match_even_fg, self.match_even_bg),
            MarkerKind::Odd => (self.match_odd_fg, self.match_odd_bg),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
