//! Error types for loading collaborator input and running the viewer.
//!
//! The highlighting engine itself never fails: malformed offsets are
//! skipped and empty queries simply disable highlighting. The errors
//! here cover the edges of the crate (reading JSON produced by the
//! document and search collaborators, watching the results file, and
//! setting up logging).

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a [`crate::document::Document`].
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not read document {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("document has no pages")]
    EmptyDocument,

    /// Page numbers must run 1, 2, ..., N without gaps or duplicates.
    #[error("page numbers are not contiguous: expected page {expected}, found page {found}")]
    NonContiguousPages { expected: usize, found: usize },

    #[error("document declares {declared} pages but contains {actual}")]
    PageCountMismatch { declared: usize, actual: usize },
}

/// Errors raised while loading a [`crate::results::SearchResultSet`].
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("could not read search results {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed search results JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors that can occur when setting up the results file watcher.
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("filesystem watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("results file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

/// Returned by a [`crate::controller::ScrollSink`] that could not bring the
/// active marker into view. The controller logs and ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrollError {
    #[error("no marker for match {local_index} on page {page}")]
    TargetNotFound { page: usize, local_index: usize },
}

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("could not create log directory {}: {source}", path.display())]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Errors raised by the one-shot `render` and `matches` subcommands.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Results(#[from] ResultsError),

    #[error("page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },
}
