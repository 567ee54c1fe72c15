use std::path::Path;

use clap::Parser;
use pagemark::cli::{Cli, Commands, MatchesArgs, RenderArgs};
use pagemark::config::{build_config, AppConfig};
use pagemark::document::Document;
use pagemark::export::{self, MatchOptions, PageSelection, RenderOptions};
use pagemark::logging::{self, LogTarget};
use pagemark::results::SearchResultSet;
use pagemark::tui;
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let app_config = logging::with_bootstrap_logging(|| build_config(&cli));

    // The viewer owns the terminal, so it logs to a file.
    let log_target = match cli.command {
        Some(_) => Some(LogTarget::Stderr),
        None => logging::default_log_dir().map(LogTarget::File),
    };
    let _log_guard = match log_target {
        Some(target) => logging::init(target, app_config.verbose).unwrap_or_else(|e| {
            eprintln!("pagemark: logging disabled: {}", e);
            None
        }),
        None => None,
    };
    debug!(config = ?app_config, "effective config");

    let outcome = match cli.command {
        Some(Commands::Render(ref args)) => run_render(args, &app_config),
        Some(Commands::Matches(ref args)) => run_matches(args, &app_config),
        None => run_viewer(app_config),
    };

    if let Err(message) = outcome {
        error!(%message, "exiting");
        eprintln!("pagemark: {}", message);
        std::process::exit(1);
    }
}

fn run_render(args: &RenderArgs, config: &AppConfig) -> Result<(), String> {
    let (document, results) = export::load_inputs(&args.document, args.results.as_deref())
        .map_err(|e| format!("loading input: {}", e))?;

    let pages = match (args.all, args.page) {
        (true, _) => PageSelection::All,
        (false, Some(page)) => PageSelection::Page(page),
        (false, None) => PageSelection::FirstResult,
    };
    let options = RenderOptions {
        matching: MatchOptions {
            query: args.query.clone(),
            mode: args.mode.unwrap_or(config.highlight.mode),
            classes: config.highlight.classes.clone(),
        },
        pages,
        highlights: config.highlight.enabled && !args.no_highlights,
        active: args.active,
    };

    let html = export::render_html(document, results, &options)
        .map_err(|e| format!("render: {}", e))?;
    println!("{}", html.as_str());
    Ok(())
}

fn run_matches(args: &MatchesArgs, config: &AppConfig) -> Result<(), String> {
    let (document, results) = export::load_inputs(&args.document, Some(&args.results))
        .map_err(|e| format!("loading input: {}", e))?;
    let Some(results) = results else {
        return Err("loading input: no results".to_string());
    };

    let options = MatchOptions {
        query: args.query.clone(),
        mode: args.mode.unwrap_or(config.highlight.mode),
        classes: config.highlight.classes.clone(),
    };
    print!("{}", export::match_report(document, results, &options));
    Ok(())
}

fn run_viewer(config: AppConfig) -> Result<(), String> {
    let document = config
        .document
        .as_deref()
        .map(load_document)
        .transpose()?;
    let results = config
        .results
        .as_deref()
        .map(load_results)
        .transpose()?;

    tui::run_tui(config, document, results).map_err(|e| format!("TUI error: {}", e))
}

fn load_document(path: &Path) -> Result<Document, String> {
    Document::load(path).map_err(|e| format!("loading document: {}", e))
}

fn load_results(path: &Path) -> Result<SearchResultSet, String> {
    SearchResultSet::load(path).map_err(|e| format!("loading results: {}", e))
}
