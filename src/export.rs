//! Non-interactive output for the `render` and `matches` subcommands.
//!
//! `pagemark render` prints highlighted pages as HTML fragments; `pagemark
//! matches` prints per-page match counts and the global navigation order.
//! Both drive the same [`ViewerController`] the terminal viewer uses, so
//! what is printed is exactly what the viewer would show.
//!
//! This module is independent of the TUI (no ratatui imports).

use std::path::Path;

use tracing::debug;

use crate::controller::ViewerController;
use crate::document::Document;
use crate::error::ExportError;
use crate::locate::HighlightMode;
use crate::markup::{BlockTag, MarkerClasses, MarkupBuilder, SafeMarkup};
use crate::results::SearchResultSet;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// What to match and how, shared by both subcommands.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    /// Overrides the results file's query.
    pub query: Option<String>,
    pub mode: HighlightMode,
    pub classes: MarkerClasses,
}

/// Which pages `render` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSelection {
    /// The first result page, or page 1 without results.
    #[default]
    FirstResult,
    Page(usize),
    All,
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub matching: MatchOptions,
    pub pages: PageSelection,
    pub highlights: bool,
    /// Local index of the active match on each rendered page, clamped to
    /// the page's match count.
    pub active: usize,
}

/// Load the document and, if given, the results file.
pub fn load_inputs(
    document: &Path,
    results: Option<&Path>,
) -> Result<(Document, Option<SearchResultSet>), ExportError> {
    let document = Document::load(document)?;
    let results = results.map(SearchResultSet::load).transpose()?;
    Ok((document, results))
}

fn viewer_for(
    document: Document,
    results: Option<SearchResultSet>,
    options: &MatchOptions,
    highlights: bool,
) -> ViewerController {
    let mut viewer = ViewerController::new().with_classes(options.classes.clone());
    viewer.set_mode(options.mode);
    viewer.set_highlights_enabled(highlights);
    viewer.load_document(document);
    if let Some(results) = results {
        viewer.receive_results(results);
    }
    if let Some(query) = &options.query {
        viewer.set_query(query);
    }
    viewer
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

/// Render the selected pages as one `<article>` holding a `<section>` per
/// page.
pub fn render_html(
    document: Document,
    results: Option<SearchResultSet>,
    options: &RenderOptions,
) -> Result<SafeMarkup, ExportError> {
    let mut viewer = viewer_for(document, results, &options.matching, options.highlights);
    let total = viewer.total_pages();

    let pages: Vec<usize> = match options.pages {
        PageSelection::FirstResult => vec![viewer.state().current_page],
        PageSelection::Page(page) => vec![page],
        PageSelection::All => (1..=total).collect(),
    };

    let mut builder = MarkupBuilder::new();
    let total_attr = total.to_string();
    builder.open_block(
        BlockTag::Article,
        &[("class", "pagemark-document"), ("data-pages", &total_attr)],
    );

    for page in pages {
        if !viewer.set_page(page) {
            return Err(ExportError::PageOutOfRange { page, total });
        }
        let count = viewer.index().count_for_page(page);
        for _ in 0..options.active.min(count.saturating_sub(1)) {
            viewer.next_local();
        }

        let view = viewer.view();
        debug!(page, matches = view.match_count, "rendering page");
        let page_attr = page.to_string();
        let count_attr = view.match_count.to_string();
        builder
            .open_block(
                BlockTag::Section,
                &[
                    ("class", "pagemark-page"),
                    ("data-page", &page_attr),
                    ("data-matches", &count_attr),
                ],
            )
            .markup(&view.markup)
            .close_block();
    }

    Ok(builder.finish())
}

// ---------------------------------------------------------------------------
// matches
// ---------------------------------------------------------------------------

/// Plain-text match report: the query, one line per result page, the
/// total, and the global order as `page#n` addresses.
pub fn match_report(
    document: Document,
    results: SearchResultSet,
    options: &MatchOptions,
) -> String {
    let viewer = viewer_for(document, Some(results), options, true);
    let index = viewer.index();
    let state = viewer.state();

    let mut out = format!(
        "query: \"{}\" (mode: {})\n",
        state.current_query, state.highlight_mode
    );
    for entry in index.entries() {
        let n = entry.spans.len();
        out.push_str(&format!(
            "page {}: {} match{}\n",
            entry.page,
            n,
            if n == 1 { "" } else { "es" }
        ));
    }

    let total = index.total_count();
    out.push_str(&format!("total: {}\n", total));

    let order: Vec<String> = (0..total)
        .filter_map(|i| index.resolve_global(i))
        .map(|addr| format!("{}#{}", addr.page, addr.local_index + 1))
        .collect();
    out.push_str(&format!("order: {}\n", order.join(" ")));
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
