//! Input for the viewer loop.
//!
//! Terminal input and results-file updates arrive from different sources;
//! both are funnelled into [`AppEvent`].

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::results::SearchResultSet;
use crate::watcher::WatcherEvent;

// ---------------------------------------------------------------------------
// AppEvent
// ---------------------------------------------------------------------------

/// One unit of work for the viewer loop.
#[derive(Debug)]
pub enum AppEvent {
    /// Key press or repeat.
    Key(KeyEvent),
    /// Mouse input over the terminal.
    Mouse(MouseEvent),
    /// New terminal size in columns and rows.
    Resize(u16, u16),
    /// The watcher delivered a freshly parsed results file.
    Results(Box<SearchResultSet>),
    /// The watcher could not read or parse the results file.
    WatchError(String),
}

// ---------------------------------------------------------------------------
// Event polling
// ---------------------------------------------------------------------------

/// Wait up to `timeout` for terminal input.
///
/// `None` on timeout or for input the viewer ignores. Key releases are
/// dropped so each press is handled once.
pub fn poll_crossterm_event(timeout: Duration) -> Option<AppEvent> {
    if event::poll(timeout).ok()? {
        match event::read().ok()? {
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                Some(AppEvent::Key(key))
            }
            CrosstermEvent::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
            CrosstermEvent::Resize(w, h) => Some(AppEvent::Resize(w, h)),
            _ => None,
        }
    } else {
        None
    }
}

/// Drain pending watcher events, up to `max_per_tick`.
///
/// Stops as soon as `try_recv()` returns `Err` (empty or disconnected),
/// so this never blocks.
pub fn drain_watcher_events(
    rx: &mut mpsc::Receiver<WatcherEvent>,
    max_per_tick: usize,
) -> Vec<AppEvent> {
    let mut events = Vec::new();

    for _ in 0..max_per_tick {
        match rx.try_recv() {
            Ok(WatcherEvent::Results(results)) => events.push(AppEvent::Results(results)),
            Ok(WatcherEvent::Error(msg)) => events.push(AppEvent::WatchError(msg)),
            Err(_) => break,
        }
    }

    events
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
