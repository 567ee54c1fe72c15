//! End-to-end integration tests for the pagemark pipeline.
//!
//! These tests exercise the handoff between modules that unit tests
//! cannot cover: collaborator JSON on disk -> document and result set ->
//! navigation index -> controller -> rendered markup, plus the results
//! file watcher and config precedence.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::TempDir;

use pagemark::cli::Cli;
use pagemark::config::build_config;
use pagemark::controller::{ScrollRequest, ScrollSink, ViewerController, ViewerPhase};
use pagemark::document::Document;
use pagemark::error::ScrollError;
use pagemark::export::{self, MatchOptions, PageSelection, RenderOptions};
use pagemark::locate::HighlightMode;
use pagemark::markup::strip_markup;
use pagemark::navigation::{MatchAddress, NavigationIndex};
use pagemark::results::SearchResultSet;
use pagemark::watcher::{start_watching, WatcherEvent};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

const CATDOG_DOCUMENT: &str = r#"{
    "filename": "pets.pdf",
    "total_pages": 2,
    "pages": [
        {"page": 1, "text": "catdog catdog"},
        {"page": 2, "text": "catdog"}
    ]
}"#;

const CATDOG_RESULTS: &str = r#"{
    "query": "catdog",
    "total_pages": 2,
    "results": [
        {"page": 1, "score": 0.92, "text": "catdog catdog"},
        {"page": 2, "score": 0.81, "text": "catdog"}
    ]
}"#;

fn load_catdog(dir: &Path) -> (Document, SearchResultSet) {
    let doc = write_file(dir, "doc.json", CATDOG_DOCUMENT);
    let res = write_file(dir, "res.json", CATDOG_RESULTS);
    (
        Document::load(&doc).unwrap(),
        SearchResultSet::load(&res).unwrap(),
    )
}

fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
    KeyEvent::new(code, modifiers)
}

#[derive(Debug, Default)]
struct Recorder {
    requests: Vec<ScrollRequest>,
}

impl ScrollSink for Recorder {
    fn scroll_into_view(&mut self, request: &ScrollRequest) -> Result<(), ScrollError> {
        self.requests.push(*request);
        Ok(())
    }
}

/// A sink whose target never exists. Failures must not affect navigation.
struct Failing;

impl ScrollSink for Failing {
    fn scroll_into_view(&mut self, request: &ScrollRequest) -> Result<(), ScrollError> {
        Err(ScrollError::TargetNotFound {
            page: request.page,
            local_index: request.local_index,
        })
    }
}

// ---------------------------------------------------------------------------
// Test 1: catdog scenario from files
// ---------------------------------------------------------------------------

/// Counts, global position and the wrap from the last match back to the
/// first, starting from JSON files on disk.
#[test]
fn test_catdog_counts_and_global_wrap() {
    let tmp = TempDir::new().unwrap();
    let (document, results) = load_catdog(tmp.path());

    let index = NavigationIndex::build(
        Some(&results),
        Some(&document),
        "catdog",
        HighlightMode::Auto,
    );
    assert_eq!(index.count_for_page(1), 2);
    assert_eq!(index.count_for_page(2), 1);
    assert_eq!(index.total_count(), 3);
    assert_eq!(index.global_position_of(2, 0), Some(3));
    assert_eq!(
        index.next_global(MatchAddress::new(2, 0)),
        Some(MatchAddress::new(1, 0))
    );

    let mut viewer = ViewerController::with_scroll_sink(Recorder::default());
    viewer.load_document(document);
    assert!(viewer.receive_results(results));
    assert_eq!(viewer.view().global_counter.as_deref(), Some("[1/3]"));

    let shift_right = key(KeyCode::Right, KeyModifiers::SHIFT);
    for _ in 0..2 {
        assert!(viewer.on_key(&shift_right));
    }
    assert_eq!(viewer.state().address(), MatchAddress::new(2, 0));
    assert!(viewer.on_key(&shift_right));
    assert_eq!(viewer.state().address(), MatchAddress::new(1, 0));

    let last = viewer.sink().requests.last().copied().unwrap();
    assert_eq!((last.page, last.local_index), (1, 0));
}

// ---------------------------------------------------------------------------
// Test 2: exact offsets and markup
// ---------------------------------------------------------------------------

/// Out-of-order exact offsets are sorted and both accepted; rendering them
/// and stripping the markers recovers the page text.
#[test]
fn test_exact_offsets_render_and_strip() {
    let tmp = TempDir::new().unwrap();
    let doc = write_file(
        tmp.path(),
        "doc.json",
        r#"{"total_pages": 1, "pages": [{"page": 1, "text": "ab<cd>efgh"}]}"#,
    );
    let res = write_file(
        tmp.path(),
        "res.json",
        r#"{"query": "zz", "totalPages": 1, "results": [
            {"page": 1, "similarity": 0.5, "text": "",
             "exactMatches": [{"position": 5, "length": 3}, {"position": 2, "length": 3}]}
        ]}"#,
    );

    let (document, results) = export::load_inputs(&doc, Some(&res)).unwrap();
    let mut viewer = ViewerController::new();
    viewer.load_document(document);
    viewer.receive_results(results.unwrap());

    let view = viewer.view();
    assert_eq!(view.match_count, 2);
    assert_eq!(
        view.markup.as_str(),
        "ab<mark class=\"match-active\" data-match=\"0\">&lt;cd</mark>\
         <mark class=\"match-even\" data-match=\"1\">&gt;ef</mark>gh"
    );
    assert_eq!(strip_markup(&view.markup), "ab<cd>efgh");
}

// ---------------------------------------------------------------------------
// Test 3: tolerant matching through the controller
// ---------------------------------------------------------------------------

#[test]
fn test_tolerant_match_across_zero_width_space() {
    let document = Document::from_pages(None, [(1, "xx ABC\u{200B}XYZ yy")]).unwrap();
    let mut viewer = ViewerController::new();
    viewer.load_document(document);
    viewer.set_query("abcxyz");

    let view = viewer.view();
    assert_eq!(view.match_count, 1);
    assert_eq!(viewer.current_spans()[0].start, 3);
    assert_eq!(viewer.current_spans()[0].length, 7);

    viewer.set_mode(HighlightMode::Simple);
    assert_eq!(viewer.view().match_count, 0);
}

// ---------------------------------------------------------------------------
// Test 4: stale results
// ---------------------------------------------------------------------------

/// Results for a superseded search are dropped, results for the latest
/// one are applied.
#[test]
fn test_stale_results_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let (document, results) = load_catdog(tmp.path());

    let mut viewer = ViewerController::new();
    viewer.load_document(document);
    let old = viewer.begin_search("catdog");
    let latest = viewer.begin_search("dog");

    assert!(!viewer.receive_for(&old, results.clone()));
    assert!(viewer.results().is_none());
    assert_eq!(viewer.state().current_query, "dog");

    let mut dog_results = results;
    dog_results.query = "dog".to_string();
    assert!(viewer.receive_for(&latest, dog_results));
    assert_eq!(viewer.index().total_count(), 3);
    assert!(viewer.pending_search().is_none());
}

// ---------------------------------------------------------------------------
// Test 5: phases, keyboard subscription and scroll failures
// ---------------------------------------------------------------------------

#[test]
fn test_phase_transitions_and_subscription_lifecycle() {
    let tmp = TempDir::new().unwrap();
    let (document, results) = load_catdog(tmp.path());

    let mut viewer = ViewerController::with_scroll_sink(Failing);
    viewer.load_document(document);
    assert_eq!(viewer.phase(), ViewerPhase::NoQuery);
    assert!(!viewer.shortcuts().is_active());

    viewer.receive_results(results);
    assert_eq!(
        viewer.phase(),
        ViewerPhase::QueryActive {
            highlights_enabled: true
        }
    );
    assert!(viewer.shortcuts().is_active());

    // A failing scroll sink never blocks navigation.
    viewer.next_local();
    assert_eq!(viewer.state().address(), MatchAddress::new(1, 1));

    viewer.toggle_highlights();
    assert!(!viewer.shortcuts().is_active());
    assert!(!viewer.on_key(&key(KeyCode::Right, KeyModifiers::NONE)));

    viewer.toggle_highlights();
    assert!(viewer.shortcuts().is_active());

    viewer.clear_query();
    assert_eq!(viewer.phase(), ViewerPhase::NoQuery);
    assert_eq!(viewer.shortcuts().active_count(), 0);
}

#[test]
fn test_dropping_viewer_releases_shortcuts() {
    let tmp = TempDir::new().unwrap();
    let (document, results) = load_catdog(tmp.path());

    let mut viewer = ViewerController::new();
    viewer.load_document(document);
    viewer.receive_results(results);
    let registry = viewer.shortcuts().clone();
    assert!(registry.is_active());

    drop(viewer);
    assert!(!registry.is_active());
}

// ---------------------------------------------------------------------------
// Test 6: empty query
// ---------------------------------------------------------------------------

#[test]
fn test_empty_query_renders_escaped_text() {
    let document = Document::from_pages(None, [(1, "<b>bold</b> & more")]).unwrap();
    let mut viewer = ViewerController::new();
    viewer.load_document(document);
    viewer.set_query("");

    let view = viewer.view();
    assert_eq!(view.markup.marker_count(), 0);
    assert_eq!(
        view.markup.as_str(),
        "&lt;b&gt;bold&lt;/b&gt; &amp; more"
    );
    assert_eq!(viewer.index().total_count(), 0);
}

// ---------------------------------------------------------------------------
// Test 7: subcommand output from files
// ---------------------------------------------------------------------------

#[test]
fn test_render_and_matches_from_files() {
    let tmp = TempDir::new().unwrap();
    let doc = write_file(tmp.path(), "doc.json", CATDOG_DOCUMENT);
    let res = write_file(tmp.path(), "res.json", CATDOG_RESULTS);

    let (document, results) = export::load_inputs(&doc, Some(&res)).unwrap();
    let report = export::match_report(document, results.unwrap(), &MatchOptions::default());
    assert!(report.contains("total: 3\n"));
    assert!(report.ends_with("order: 1#1 1#2 2#1\n"));

    let (document, results) = export::load_inputs(&doc, Some(&res)).unwrap();
    let options = RenderOptions {
        pages: PageSelection::All,
        highlights: true,
        active: 1,
        ..RenderOptions::default()
    };
    let html = export::render_html(document, results, &options).unwrap();
    assert_eq!(html.marker_count(), 3);
    // Page 2 has a single match, so the active index clamps to it.
    assert!(html.as_str().contains(
        "data-page=\"2\" data-matches=\"1\"><mark class=\"match-active\" data-match=\"0\">"
    ));
}

// ---------------------------------------------------------------------------
// Test 8: config precedence
// ---------------------------------------------------------------------------

/// CLI flags override the config file, which overrides defaults.
#[test]
fn test_config_file_then_cli_precedence() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_file(
        tmp.path(),
        "config.toml",
        r#"
theme = "light"

[highlight]
mode = "regex"
enabled = false
active_class = "hit"

[viewer]
watch = true
"#,
    );
    let config_arg = config_path.to_string_lossy().to_string();

    let from_file = build_config(&Cli::try_parse_from(["pagemark", "--config", &config_arg]).unwrap());
    assert_eq!(from_file.highlight.mode, HighlightMode::Regex);
    assert!(!from_file.highlight.enabled);
    assert_eq!(from_file.highlight.classes.active, "hit");
    assert_eq!(from_file.highlight.classes.even, "match-even");
    assert!(from_file.viewer.watch);

    let with_cli = build_config(
        &Cli::try_parse_from([
            "pagemark",
            "--config",
            &config_arg,
            "--mode",
            "simple",
            "--theme",
            "dark",
        ])
        .unwrap(),
    );
    assert_eq!(with_cli.highlight.mode, HighlightMode::Simple);
    assert_eq!(with_cli.theme, pagemark::cli::Theme::Dark);
}

// ---------------------------------------------------------------------------
// Test 9: results file watcher
// ---------------------------------------------------------------------------

/// Replacing the results file delivers the new set; the controller
/// accepts it when no other search is pending.
#[tokio::test]
async fn test_watcher_delivers_replaced_results() {
    let tmp = TempDir::new().unwrap();
    let res = write_file(tmp.path(), "res.json", CATDOG_RESULTS);

    let (mut rx, handle) = start_watching(res.clone(), 16).unwrap();
    // Give the watcher a moment to register before writing.
    tokio::time::sleep(Duration::from_millis(200)).await;

    std::fs::write(
        &res,
        r#"{"query": "dog", "total_pages": 2, "results": [{"page": 2, "score": 1.0, "text": "catdog"}]}"#,
    )
    .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("watcher should report the change")
        .expect("channel open");
    handle.shutdown();

    let WatcherEvent::Results(results) = event else {
        panic!("expected results, got {:?}", event);
    };
    assert_eq!(results.query, "dog");

    let (document, _) = load_catdog(tmp.path());
    let mut viewer = ViewerController::new();
    viewer.load_document(document);
    assert!(viewer.receive_results(*results));
    assert_eq!(viewer.state().current_page, 2);
    assert_eq!(viewer.state().current_query, "dog");
}
