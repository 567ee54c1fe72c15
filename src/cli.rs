use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::locate::HighlightMode;

/// Highlight and navigate search matches across the pages of a document
#[derive(Parser, Debug)]
#[command(
    name = "pagemark",
    about = "Highlight and navigate search matches across the pages of a document"
)]
pub struct Cli {
    /// Document JSON produced by the ingestion step:
    /// `{"filename", "total_pages", "pages": [{"page", "text"}]}`
    #[arg(long)]
    pub document: Option<PathBuf>,

    /// Search results JSON: `{"query", "total_pages", "results": [...]}`
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Query to highlight. Defaults to the query stored in the results file.
    #[arg(long)]
    pub query: Option<String>,

    /// How matches are located
    #[arg(long, value_enum)]
    pub mode: Option<HighlightMode>,

    /// Reload the results file whenever it changes
    #[arg(long, default_value_t = false)]
    pub watch: bool,

    /// Log at debug level.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Color theme: dark or light
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print highlighted pages as HTML to stdout
    Render(RenderArgs),
    /// Print the per-page match counts and global order
    Matches(MatchesArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Query to highlight. Defaults to the results file's query.
    #[arg(long)]
    pub query: Option<String>,

    /// Page to render (1-based). Defaults to the first result page.
    #[arg(long, conflicts_with = "all")]
    pub page: Option<usize>,

    /// Render every page
    #[arg(long, default_value_t = false)]
    pub all: bool,

    #[arg(long, value_enum)]
    pub mode: Option<HighlightMode>,

    /// Emit escaped text without match markers
    #[arg(long, default_value_t = false)]
    pub no_highlights: bool,

    /// Local index of the active match on the rendered page
    #[arg(long, default_value_t = 0)]
    pub active: usize,
}

#[derive(Args, Debug)]
pub struct MatchesArgs {
    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub results: PathBuf,

    #[arg(long)]
    pub query: Option<String>,

    #[arg(long, value_enum)]
    pub mode: Option<HighlightMode>,
}

#[derive(Clone, Debug, PartialEq, ValueEnum)]
pub enum Theme {
    Dark,
    Light,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}
