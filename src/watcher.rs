//! Watching the search results file.
//!
//! The search collaborator writes its response to a JSON file. This module
//! watches the file's parent directory with `notify`, re-reads the file
//! whenever it is created or modified, and forwards each parsed
//! [`SearchResultSet`] through a tokio channel to the viewer.
//!
//! The directory is watched rather than the file so atomic replacements
//! (write to a temp file, then rename over the target) are seen.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::WatcherError;
use crate::results::SearchResultSet;

/// Files larger than this are not read (64 MB).
const MAX_RESULTS_BYTES: u64 = 64 * 1024 * 1024;

/// How often the blocking task checks its stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// WatcherEvent
// ---------------------------------------------------------------------------

/// Events emitted by the watcher to downstream consumers.
#[derive(Debug)]
pub enum WatcherEvent {
    /// The results file changed and parsed successfully.
    Results(Box<SearchResultSet>),
    /// Reading or parsing the file failed; the previous results stand.
    Error(String),
}

// ---------------------------------------------------------------------------
// WatcherHandle
// ---------------------------------------------------------------------------

/// Stops the watcher when shut down or dropped.
///
/// The blocking task polls `stop` between `recv_timeout` calls; a task
/// left running would keep the tokio runtime from exiting.
#[derive(Debug)]
pub struct WatcherHandle {
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Per-file read state. Remembers the last content sent so the burst of
/// events a single save produces yields one result set.
#[derive(Debug, Default)]
pub(crate) struct ResultsFileState {
    last_contents: Option<String>,
}

/// Read and parse `path`. Returns `None` when the content is unchanged
/// since the last successful read or the file is momentarily empty (a
/// writer truncated it and has not written yet).
pub(crate) fn read_results(
    path: &Path,
    state: &mut ResultsFileState,
) -> Option<Result<SearchResultSet, String>> {
    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => return Some(Err(format!("could not stat {}: {}", path.display(), e))),
    };
    if size > MAX_RESULTS_BYTES {
        return Some(Err(format!(
            "{} is {} bytes, larger than the {} byte limit",
            path.display(),
            size,
            MAX_RESULTS_BYTES
        )));
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return Some(Err(format!("could not read {}: {}", path.display(), e))),
    };
    if contents.trim().is_empty() {
        return None;
    }
    if state.last_contents.as_deref() == Some(contents.as_str()) {
        return None;
    }

    match SearchResultSet::from_json_str(&contents) {
        Ok(set) => {
            state.last_contents = Some(contents);
            Some(Ok(set))
        }
        Err(e) => Some(Err(e.to_string())),
    }
}

/// Returns `true` if `path` names the watched results file.
fn is_results_file(path: &Path, file_name: &std::ffi::OsStr) -> bool {
    path.file_name() == Some(file_name)
}

// ---------------------------------------------------------------------------
// Watching
// ---------------------------------------------------------------------------

/// Start watching `results_path` for changes.
///
/// Sets up a `notify::RecommendedWatcher` on the parent directory and
/// bridges events from the synchronous `notify` channel to a tokio `mpsc`
/// channel. The current content is not sent; callers load it themselves
/// before watching.
///
/// # Errors
///
/// Returns `WatcherError::FileNotFound` if the file does not exist, or
/// `WatcherError::Notify` if the watcher cannot be created.
pub fn start_watching(
    results_path: PathBuf,
    channel_capacity: usize,
) -> Result<(mpsc::Receiver<WatcherEvent>, WatcherHandle), WatcherError> {
    if !results_path.is_file() {
        return Err(WatcherError::FileNotFound(results_path));
    }
    let canonical = results_path
        .canonicalize()
        .map_err(|_| WatcherError::FileNotFound(results_path.clone()))?;
    let (Some(dir), Some(file_name)) = (canonical.parent(), canonical.file_name()) else {
        return Err(WatcherError::FileNotFound(results_path));
    };
    let dir = dir.to_path_buf();
    let file_name = file_name.to_os_string();

    let (tx, rx) = mpsc::channel::<WatcherEvent>(channel_capacity);
    let (notify_tx, notify_rx) = std::sync::mpsc::channel::<Result<Event, notify::Error>>();

    let mut watcher = notify::RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            let _ = notify_tx.send(res);
        },
        notify::Config::default(),
    )?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    debug!(dir = %dir.display(), file = ?file_name, "watching results file");

    let stop = Arc::new(AtomicBool::new(false));
    let stopped = stop.clone();

    let task = tokio::task::spawn_blocking(move || {
        // Dropping the watcher closes `notify_rx`.
        let _watcher = watcher;
        let target = dir.join(&file_name);
        // The caller already has the current content.
        let mut state = ResultsFileState {
            last_contents: std::fs::read_to_string(&target).ok(),
        };

        while !stopped.load(Ordering::SeqCst) {
            let event = match notify_rx.recv_timeout(POLL_INTERVAL) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            match event {
                Ok(event) => process_notify_event(&event, &target, &file_name, &mut state, &tx),
                Err(e) => {
                    let _ = tx.blocking_send(WatcherEvent::Error(format!(
                        "filesystem watcher error: {}",
                        e
                    )));
                }
            }
        }
        debug!("results watcher stopped");
    });

    Ok((rx, WatcherHandle { stop, task }))
}

/// Handle one notify event: re-read the results file if it was touched.
fn process_notify_event(
    event: &Event,
    target: &Path,
    file_name: &std::ffi::OsStr,
    state: &mut ResultsFileState,
    tx: &mpsc::Sender<WatcherEvent>,
) {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return;
    }
    if !event.paths.iter().any(|p| is_results_file(p, file_name)) {
        return;
    }

    match read_results(target, state) {
        Some(Ok(set)) => {
            debug!(query = %set.query, results = set.results.len(), "results file reloaded");
            let _ = tx.blocking_send(WatcherEvent::Results(Box::new(set)));
        }
        Some(Err(e)) => {
            warn!(error = %e, "results file could not be loaded");
            let _ = tx.blocking_send(WatcherEvent::Error(e));
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
