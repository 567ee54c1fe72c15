//! Layout and rendering for the TUI.
//!
//! Implements the layout:
//! - **Page** (left, fills remaining width): current page with match markers
//! - **Results** (right, width 36): the result list, toggled with `r`
//! - **Bottom bar** (height 1): status info, or the query bar while typing

use std::borrow::Cow;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::debug;

use crate::markup::MarkerKind;
use crate::render::{segments, Segment};
use crate::span::Span as MatchSpan;
use crate::theme::ThemeColors;
use crate::tui::app::{App, Focus};

/// Width of the results panel, borders included.
const RESULTS_PANEL_WIDTH: u16 = 36;

// ---------------------------------------------------------------------------
// Main draw function
// ---------------------------------------------------------------------------

/// Draw the entire TUI frame.
///
/// Splits the terminal into:
/// 1. A vertical split: main area (fills) + bottom bar (1 row)
/// 2. Within main area, a horizontal split: page (rest) + results (36 cols)
///
/// When the results panel is hidden, the page takes the full width.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(size);

    let main_area = vertical_chunks[0];
    let bottom_area = vertical_chunks[1];

    if app.results_panel_visible {
        let horizontal_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(RESULTS_PANEL_WIDTH)])
            .split(main_area);

        draw_page(frame, app, horizontal_chunks[0]);
        draw_results(frame, app, horizontal_chunks[1]);
    } else {
        draw_page(frame, app, main_area);
    }

    if app.search.is_input() {
        draw_search_bar(frame, app, bottom_area);
    } else {
        draw_status_bar(frame, app, bottom_area);
    }

    if app.help_overlay_visible {
        draw_help_overlay(frame, app, size);
    }
}

// ---------------------------------------------------------------------------
// Page panel
// ---------------------------------------------------------------------------

/// Where a match marker starts in the unwrapped page lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MarkerPos {
    index: usize,
    line: usize,
    /// Column in chars.
    col: usize,
}

/// Style for a match marker.
fn marker_style(theme: &ThemeColors, kind: MarkerKind) -> Style {
    let (fg, bg) = theme.marker_colors(kind);
    let style = Style::default().fg(fg).bg(bg);
    if kind == MarkerKind::Active {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

/// Split the page into styled lines, one per `\n`-separated line of text,
/// and record where every marker starts.
fn page_lines(
    text: &str,
    spans: &[MatchSpan],
    active: Option<usize>,
    theme: &ThemeColors,
) -> (Vec<Line<'static>>, Vec<MarkerPos>) {
    let plain = Style::default().fg(theme.page_text);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut markers = Vec::new();
    let mut col = 0usize;

    for segment in segments(text, spans, active) {
        let style = match segment {
            Segment::Plain(_) => plain,
            Segment::Match { index, kind, .. } => {
                markers.push(MarkerPos {
                    index,
                    line: lines.len(),
                    col,
                });
                marker_style(theme, kind)
            }
        };

        for (i, piece) in segment.text().split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::from(std::mem::take(&mut current)));
                col = 0;
            }
            if !piece.is_empty() {
                current.push(Span::styled(piece.to_string(), style));
                col += piece.chars().count();
            }
        }
    }
    lines.push(Line::from(current));

    (lines, markers)
}

/// Rows a line of `len` chars occupies when wrapped at `width`.
///
/// Wrapping is approximated at character boundaries; ratatui breaks at
/// words, so long lines may take a row more than this.
fn wrapped_rows(len: usize, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    len.div_ceil(width).max(1)
}

/// Wrapped row of `col` on `line`, given the char length of every line.
fn wrapped_row_of(line_lens: &[usize], line: usize, col: usize, width: usize) -> usize {
    let before: usize = line_lens
        .iter()
        .take(line)
        .map(|&len| wrapped_rows(len, width))
        .sum();
    let within = if width == 0 { 0 } else { col / width };
    before + within
}

/// Scroll offset that puts `row` in the middle of a viewport of `height`.
fn center_offset(row: usize, height: u16) -> u16 {
    let offset = row.saturating_sub(height as usize / 2);
    u16::try_from(offset).unwrap_or(u16::MAX)
}

fn page_title(app: &App, page: usize, total: usize) -> String {
    let name = app
        .viewer
        .document()
        .and_then(|d| d.filename())
        .map(|n| format!(" \u{00b7} {}", n))
        .unwrap_or_default();
    if total == 0 {
        " Page ".to_string()
    } else {
        format!(" Page {}/{}{} ", page, total, name)
    }
}

/// Draw the current page with its match markers.
///
/// Also resolves any scroll request parked by the viewer, centering the
/// requested marker in the panel.
fn draw_page(frame: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Page;
    let border_style = if focused {
        Style::default().fg(app.theme_colors.border_focused)
    } else {
        Style::default().fg(app.theme_colors.border_unfocused)
    };

    let view = app.viewer.view();
    let total = app.viewer.total_pages();
    let block = Block::default()
        .title(page_title(app, view.page, total))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    app.page_viewport_height = inner.height;

    let Some(text) = app.viewer.page_text(view.page).map(Cow::into_owned) else {
        let message = if total == 0 {
            "No document loaded".to_string()
        } else {
            format!("Page {} has no text", view.page)
        };
        let placeholder = Paragraph::new(message)
            .style(Style::default().fg(app.theme_colors.page_placeholder))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    if app.scrolled_page != view.page {
        app.scrolled_page = view.page;
        app.page_scroll = 0;
    }

    let spans = if view.active_index.is_some() {
        app.viewer.current_spans()
    } else {
        Vec::new()
    };
    let theme = &app.theme_colors;
    let (body, markers) = page_lines(&text, &spans, view.active_index, theme);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut header_rows = 0usize;
    if let Some(hint) = &view.hint {
        lines.push(Line::from(Span::styled(
            hint.clone(),
            Style::default()
                .fg(theme.page_hint)
                .add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::from(""));
        header_rows = 2;
    }
    lines.extend(body);

    let width = inner.width as usize;
    let line_lens: Vec<usize> = text.split('\n').map(|l| l.chars().count()).collect();
    let content_rows: usize =
        header_rows + line_lens.iter().map(|&len| wrapped_rows(len, width)).sum::<usize>();

    if let Some(request) = app.viewer.sink_mut().take() {
        match markers.iter().find(|m| m.index == request.local_index) {
            Some(marker) if request.page == view.page => {
                let row = header_rows + wrapped_row_of(&line_lens, marker.line, marker.col, width);
                app.page_scroll = center_offset(row, inner.height);
            }
            _ => debug!(
                page = request.page,
                local_index = request.local_index,
                "scroll target not on screen"
            ),
        }
    }

    let max_scroll = content_rows.saturating_sub(inner.height as usize);
    app.page_scroll = app
        .page_scroll
        .min(u16::try_from(max_scroll).unwrap_or(u16::MAX));

    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(app.theme_colors.page_text))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.page_scroll, 0));

    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Results panel
// ---------------------------------------------------------------------------

/// Draw the result list. Rows for the page being viewed are marked.
fn draw_results(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme_colors;
    let focused = app.focus == Focus::Results;
    let border_style = if focused {
        Style::default().fg(theme.border_focused)
    } else {
        Style::default().fg(theme.border_unfocused)
    };

    let results = app.viewer.results();
    let count = results.map_or(0, |r| r.results.len());
    let block = Block::default()
        .title(format!(" Results ({}) ", count))
        .borders(Borders::ALL)
        .border_style(border_style);

    let Some(results) = results.filter(|r| !r.results.is_empty()) else {
        let message = match app.viewer.pending_search() {
            Some(ticket) => format!("Searching for \"{}\"...", ticket.query),
            None if app.viewer.results().is_some() => "No results".to_string(),
            None => "No search yet".to_string(),
        };
        let placeholder = Paragraph::new(message)
            .style(Style::default().fg(theme.page_placeholder))
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(placeholder, area);
        return;
    };

    let current_page = app.viewer.state().current_page;
    let snippet_width = block.inner(area).width.saturating_sub(12) as usize;
    let items: Vec<ListItem> = results
        .results
        .iter()
        .map(|result| {
            let marker = if result.page == current_page { "\u{25cf}" } else { " " };
            let snippet: String = result
                .text
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(snippet_width)
                .collect();
            ListItem::new(Line::from(vec![
                Span::styled(
                    marker.to_string(),
                    Style::default().fg(theme.results_current_page),
                ),
                Span::styled(
                    format!("p.{:<4}", result.page),
                    Style::default().fg(theme.results_page),
                ),
                Span::styled(
                    format!("{:>3}% ", result.score_percent()),
                    Style::default().fg(theme.results_score),
                ),
                Span::styled(snippet, Style::default().fg(theme.results_snippet)),
            ]))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(theme.results_selected_fg)
            .bg(theme.results_selected_bg)
            .add_modifier(Modifier::BOLD),
    );
    let mut state = ListState::default().with_selected(Some(app.selected_result.min(count - 1)));

    frame.render_stateful_widget(list, area, &mut state);
}

// ---------------------------------------------------------------------------
// Query bar
// ---------------------------------------------------------------------------

/// Draw the query bar in place of the status bar.
fn draw_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme_colors;
    let mut spans = vec![
        Span::styled(
            "/".to_string(),
            Style::default()
                .fg(theme.search_prompt)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            app.search.input_buffer.clone(),
            Style::default().fg(theme.search_input_fg),
        ),
        Span::styled(
            "\u{2588}".to_string(),
            Style::default().fg(theme.search_input_fg),
        ),
    ];

    let recent = app.viewer.recent_searches();
    if app.search.input_buffer.is_empty() && !recent.is_empty() {
        spans.push(Span::styled(
            format!("  recent: {}", recent.join(", ")),
            Style::default()
                .fg(theme.search_recent)
                .add_modifier(Modifier::DIM),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg));
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Help overlay
// ---------------------------------------------------------------------------

/// Shortcut entries: (key_text, description).
const HELP_SHORTCUTS: &[(&str, &str)] = &[
    ("q / Ctrl+C", "Quit"),
    ("?", "Show this help"),
    ("/", "Search (Up/Down: recent)"),
    ("Esc / x", "Clear the query"),
    ("n / Right", "Next match on the page"),
    ("p / Left", "Previous match on the page"),
    ("Shift+Right", "Next match, any page"),
    ("Shift+Left", "Previous match, any page"),
    ("] / [", "Next / previous page"),
    ("h", "Toggle highlights"),
    ("m", "Cycle highlight mode"),
    ("j / k", "Scroll the page"),
    ("r", "Toggle results panel"),
    ("Tab", "Toggle focus between panels"),
    ("Enter", "Open the selected result"),
];

/// Draw the help overlay modal showing all keyboard shortcuts.
///
/// Any key press dismisses the overlay (handled in `App::on_key()`).
fn draw_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme_colors;

    // Bail out if the terminal is too small to render anything.
    if area.width < 5 || area.height < 5 {
        return;
    }

    let content_width: u16 = 48;
    let overlay_width = (content_width + 4).min(area.width);
    let content_lines = HELP_SHORTCUTS.len() as u16 + 4; // title + blank + shortcuts + blank + footer
    let overlay_height = (content_lines + 2).min(area.height);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        " Keyboard Shortcuts",
        Style::default()
            .fg(theme.help_fg)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    for (key, desc) in HELP_SHORTCUTS {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:14}", key),
                Style::default()
                    .fg(theme.help_key)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(desc.to_string(), Style::default().fg(theme.help_fg)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Press any key to close",
        Style::default()
            .fg(theme.help_fg)
            .add_modifier(Modifier::DIM),
    )));

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(theme.help_bg).fg(theme.help_fg))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, inner);
}

// ---------------------------------------------------------------------------
// Status bar
// ---------------------------------------------------------------------------

/// Separator string used between status bar segments.
const SEPARATOR: &str = " | ";

/// Keys advertised in the status bar, in display order.
const STATUS_SHORTCUTS: &[(&str, &str)] = &[
    ("/", "search"),
    ("n/p", "match"),
    ("S-\u{2192}", "next"),
    ("h", "hl"),
    ("m", "mode"),
    ("?", "help"),
    ("q", "quit"),
];

/// Accumulates status bar segments, dropping any that do not fit.
struct StatusLine<'t> {
    spans: Vec<Span<'static>>,
    used: usize,
    width: usize,
    theme: &'t ThemeColors,
}

impl<'t> StatusLine<'t> {
    fn new(width: usize, theme: &'t ThemeColors) -> Self {
        Self {
            spans: Vec::new(),
            used: 0,
            width,
            theme,
        }
    }

    /// Push a segment made of `parts` if it fits after a separator.
    /// Returns whether it was shown.
    fn push(&mut self, parts: Vec<Span<'static>>) -> bool {
        let part_width: usize = parts.iter().map(|s| s.content.chars().count()).sum();
        let sep_cost = if self.used > 0 {
            SEPARATOR.len()
        } else {
            1
        };
        if self.used + sep_cost + part_width > self.width {
            return false;
        }
        if self.used > 0 {
            self.spans.push(Span::styled(
                SEPARATOR.to_string(),
                Style::default().fg(self.theme.status_separator),
            ));
        } else {
            self.spans.push(Span::raw(" ".to_string()));
        }
        self.used += sep_cost + part_width;
        self.spans.extend(parts);
        true
    }

    fn finish(self) -> Line<'static> {
        Line::from(self.spans)
    }
}

/// Truncate `text` to `max` chars, appending "..." when cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else if max < 4 {
        String::new()
    } else {
        let head: String = text.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}

/// Compute the status bar layout and return the composed `Line`.
///
/// Segments are placed greedily in priority order:
/// 1. **Status message** (transient)
/// 2. **Page** position
/// 3. **Counters**: local `[i/n]` and global `[p/t]`
/// 4. **Badges**: highlight mode, highlights off, pending search
/// 5. **Query**, truncated to fit
/// 6. **Keyboard shortcuts**, hidden first when space is tight
fn build_status_bar_line(app: &App, width: usize) -> Line<'static> {
    let theme = &app.theme_colors;
    let mut bar = StatusLine::new(width, theme);
    if width == 0 {
        return bar.finish();
    }

    let bold = |color: Color| Style::default().fg(color).add_modifier(Modifier::BOLD);

    if let Some(msg) = &app.status_message {
        bar.push(vec![Span::styled(msg.clone(), bold(theme.page_hint))]);
    }

    let state = app.viewer.state();
    let total = app.viewer.total_pages();
    if total > 0 {
        bar.push(vec![Span::raw(format!(
            "p.{}/{}",
            state.current_page, total
        ))]);
    }

    if state.query_active() {
        let view = app.viewer.view();
        let mut counters = vec![Span::styled(view.counter, bold(theme.status_counter))];
        if let Some(global) = view.global_counter {
            counters.push(Span::raw(" ".to_string()));
            counters.push(Span::styled(global, bold(theme.status_counter)));
        }
        bar.push(counters);
    }

    let mut badges = vec![Span::styled(
        state.highlight_mode.to_string(),
        Style::default().fg(theme.status_badge),
    )];
    if !state.highlights_enabled {
        badges.push(Span::styled(
            " hl:off".to_string(),
            Style::default().fg(theme.status_badge),
        ));
    }
    if app.viewer.pending_search().is_some() {
        badges.push(Span::styled(
            " searching".to_string(),
            Style::default()
                .fg(theme.status_badge)
                .add_modifier(Modifier::DIM),
        ));
    }
    bar.push(badges);

    if state.query_active() {
        let available = width.saturating_sub(bar.used + SEPARATOR.len() + 2);
        let query = truncate(&state.current_query, available);
        if !query.is_empty() {
            bar.push(vec![Span::raw(format!("\"{}\"", query))]);
        }
    }

    let mut shortcuts = Vec::new();
    for (i, (key, label)) in STATUS_SHORTCUTS.iter().enumerate() {
        if i > 0 {
            shortcuts.push(Span::raw(" ".to_string()));
        }
        shortcuts.push(Span::styled(key.to_string(), bold(theme.status_shortcut_key)));
        shortcuts.push(Span::raw(format!(":{}", label)));
    }
    bar.push(shortcuts);

    bar.finish()
}

/// Draw the status bar at the bottom of the screen.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme_colors;
    let width = area.width as usize;
    let bar = build_status_bar_line(app, width);

    let paragraph = Paragraph::new(bar)
        .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg));

    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
