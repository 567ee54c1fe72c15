//! Terminal viewer for pagemark.
//!
//! [`run_tui`] puts the terminal into raw mode on the alternate screen,
//! shows the document page by page with its matches highlighted, and
//! hands the terminal back when the user quits, a signal arrives, or the
//! process panics.

pub mod app;
pub mod event;
pub mod ui;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::document::Document;
use crate::results::SearchResultSet;
use crate::watcher::{self, WatcherEvent, WatcherHandle};
use app::App;
use event::{drain_watcher_events, poll_crossterm_event, AppEvent};

/// Input poll timeout; also the redraw cadence when nothing happens.
const TICK_RATE: Duration = Duration::from_millis(100);

/// Watcher events handled per loop iteration.
const MAX_DRAIN_PER_TICK: usize = 32;

/// Results files are replaced whole, so only the newest few events matter.
const WATCH_CHANNEL_CAPACITY: usize = 16;

type Backend = CrosstermBackend<io::Stdout>;

// ---------------------------------------------------------------------------
// Terminal ownership
// ---------------------------------------------------------------------------

/// Owns the terminal while the viewer runs. Dropping it leaves raw mode
/// and the alternate screen, so early returns restore the shell too.
struct TerminalGuard {
    terminal: Terminal<Backend>,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

/// Chain a panic hook that leaves raw mode before the default hook prints,
/// otherwise the message lands on the alternate screen and is lost.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        previous(info);
    }));
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// Flag raised when SIGINT or SIGTERM arrives from outside the viewer.
///
/// In raw mode Ctrl+C is an ordinary key event, so this only fires for
/// signals sent by another process. Outside a tokio runtime the flag is
/// returned but never raised.
pub fn spawn_shutdown_listener() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        debug!("no runtime; external signals will not stop the viewer");
        return flag;
    };

    let raised = flag.clone();
    runtime.spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        let (Ok(mut interrupt), Ok(mut terminate)) = (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) else {
            warn!("could not install signal handlers");
            return;
        };
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
        raised.store(true, Ordering::SeqCst);
    });
    flag
}

// ---------------------------------------------------------------------------
// Results watching
// ---------------------------------------------------------------------------

/// Open watch on the results file, if one was requested and could start.
struct ResultsWatch {
    rx: mpsc::Receiver<WatcherEvent>,
    handle: WatcherHandle,
}

impl ResultsWatch {
    /// Start watching when `viewer.watch` is on. Failures are reported on
    /// the status bar and the viewer carries on without live updates.
    fn start(app: &mut App) -> Option<Self> {
        if !app.config.viewer.watch {
            return None;
        }
        let Some(path) = app.config.results.clone() else {
            app.status_message = Some("watch disabled: no results file".to_string());
            return None;
        };
        match watcher::start_watching(path.clone(), WATCH_CHANNEL_CAPACITY) {
            Ok((rx, handle)) => {
                info!(path = %path.display(), "watching results file");
                Some(Self { rx, handle })
            }
            Err(e) => {
                warn!(error = %e, "results watcher could not start");
                app.status_message = Some(format!("watch disabled: {}", e));
                None
            }
        }
    }

    fn dispatch(&mut self, app: &mut App) {
        for event in drain_watcher_events(&mut self.rx, MAX_DRAIN_PER_TICK) {
            match event {
                AppEvent::Results(results) => app.on_results(*results),
                AppEvent::WatchError(message) => app.on_watch_error(message),
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run the viewer over already-loaded inputs until the user quits.
///
/// `config.query` overrides the query stored in `results`. With
/// `config.viewer.watch` set, replacements of the results file are applied
/// as they land.
pub fn run_tui(
    config: AppConfig,
    document: Option<Document>,
    results: Option<SearchResultSet>,
) -> io::Result<()> {
    install_panic_hook();
    let shutdown = spawn_shutdown_listener();

    let mut app = App::new(config);
    if let Some(document) = document {
        app.load_document(document);
    }
    let query = app.config.query.clone();
    match (results, query) {
        (Some(results), query) => app.load_initial_results(results, query.as_deref()),
        (None, Some(query)) => app.viewer.set_query(&query),
        (None, None) => {}
    }

    let mut watch = ResultsWatch::start(&mut app);
    let mut guard = TerminalGuard::enter()?;
    let outcome = event_loop(&mut guard.terminal, &mut app, &shutdown, watch.as_mut());

    if let Some(watch) = watch {
        watch.handle.shutdown();
    }
    drop(guard);
    outcome
}

/// Draw when dirty, then handle at most one input event and any pending
/// watcher events.
fn event_loop(
    terminal: &mut Terminal<Backend>,
    app: &mut App,
    shutdown: &AtomicBool,
    mut watch: Option<&mut ResultsWatch>,
) -> io::Result<()> {
    while !app.should_quit {
        if shutdown.load(Ordering::SeqCst) {
            info!("signal received, leaving viewer");
            break;
        }

        if app.needs_redraw {
            terminal.draw(|frame| ui::draw(frame, app))?;
            app.needs_redraw = false;
        }

        match poll_crossterm_event(TICK_RATE) {
            Some(AppEvent::Key(key)) => app.on_key(key),
            Some(AppEvent::Mouse(mouse)) => app.on_mouse(mouse),
            Some(AppEvent::Resize(..)) => app.needs_redraw = true,
            _ => {}
        }

        if let Some(watch) = watch.as_deref_mut() {
            watch.dispatch(app);
        }
    }
    Ok(())
}
