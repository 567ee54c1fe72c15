use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::cli::{Cli, Theme};
use crate::locate::HighlightMode;
use crate::markup::MarkerClasses;

// ---------------------------------------------------------------------------
// TOML-deserializable config (intermediate representation)
// ---------------------------------------------------------------------------

/// Raw config as parsed from the TOML file.
/// All fields are optional so that missing keys fall through to defaults.
/// Unknown keys are silently ignored by serde.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    verbose: Option<bool>,
    theme: Option<String>,
    highlight: FileHighlightConfig,
    viewer: FileViewerConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileHighlightConfig {
    enabled: Option<bool>,
    /// Kept as a string so an unknown mode warns instead of failing the
    /// whole file.
    mode: Option<String>,
    active_class: Option<String>,
    even_class: Option<String>,
    odd_class: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileViewerConfig {
    results_panel: Option<bool>,
    watch: Option<bool>,
}

// ---------------------------------------------------------------------------
// Effective (merged) config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub document: Option<PathBuf>,
    pub results: Option<PathBuf>,
    pub query: Option<String>,
    pub verbose: bool,
    pub theme: Theme,
    pub highlight: HighlightConfig,
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightConfig {
    pub enabled: bool,
    pub mode: HighlightMode,
    pub classes: MarkerClasses,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub results_panel: bool,
    pub watch: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            document: None,
            results: None,
            query: None,
            verbose: false,
            theme: Theme::Dark,
            highlight: HighlightConfig::default(),
            viewer: ViewerConfig::default(),
        }
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: HighlightMode::Auto,
            classes: MarkerClasses::default(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            results_panel: true,
            watch: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Returns the default config file path: `~/.config/pagemark/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pagemark").join("config.toml"))
}

/// Load the config file from the given path.
/// Returns `None` if the file does not exist or cannot be parsed.
fn load_file_config(path: &Path) -> Option<FileConfig> {
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse config file");
                None
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read config file");
            None
        }
    }
}

/// Parse a theme string from the config file into a `Theme` enum.
/// Returns `None` if the string is not recognized (caller uses default).
fn parse_theme(s: &str) -> Option<Theme> {
    match s.to_lowercase().as_str() {
        "dark" => Some(Theme::Dark),
        "light" => Some(Theme::Light),
        other => {
            warn!(theme = other, "unknown theme, using default");
            None
        }
    }
}

fn parse_mode(s: &str) -> Option<HighlightMode> {
    match s.parse::<HighlightMode>() {
        Ok(mode) => Some(mode),
        Err(e) => {
            warn!(error = %e, "using default highlight mode");
            None
        }
    }
}

/// Empty class names would produce unstyled markers.
fn non_empty(class: &Option<String>) -> Option<String> {
    class
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Build the effective `AppConfig` by merging defaults, config file, and CLI args.
///
/// Precedence (highest wins):
/// 1. CLI flags (if explicitly provided)
/// 2. Config file values
/// 3. Hardcoded defaults
pub fn build_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::default();

    let config_path = cli.config.clone().or_else(default_config_path);

    if let Some(ref path) = config_path {
        if let Some(file_cfg) = load_file_config(path) {
            if let Some(v) = file_cfg.verbose {
                config.verbose = v;
            }
            if let Some(ref t) = file_cfg.theme {
                if let Some(theme) = parse_theme(t) {
                    config.theme = theme;
                }
            }

            let hl = &file_cfg.highlight;
            if let Some(enabled) = hl.enabled {
                config.highlight.enabled = enabled;
            }
            if let Some(mode) = hl.mode.as_deref().and_then(parse_mode) {
                config.highlight.mode = mode;
            }
            if let Some(class) = non_empty(&hl.active_class) {
                config.highlight.classes.active = class;
            }
            if let Some(class) = non_empty(&hl.even_class) {
                config.highlight.classes.even = class;
            }
            if let Some(class) = non_empty(&hl.odd_class) {
                config.highlight.classes.odd = class;
            }

            if let Some(panel) = file_cfg.viewer.results_panel {
                config.viewer.results_panel = panel;
            }
            if let Some(watch) = file_cfg.viewer.watch {
                config.viewer.watch = watch;
            }
        } else if cli.config.is_some() && !path.exists() {
            // Parse failures were already reported by load_file_config.
            warn!(path = %path.display(), "config file not found");
        }
    }

    // CLI overrides
    if cli.document.is_some() {
        config.document = cli.document.clone();
    }
    if cli.results.is_some() {
        config.results = cli.results.clone();
    }
    if cli.query.is_some() {
        config.query = cli.query.clone();
    }
    if cli.verbose {
        config.verbose = true;
    }
    if let Some(ref theme) = cli.theme {
        config.theme = theme.clone();
    }
    if let Some(mode) = cli.mode {
        config.highlight.mode = mode;
    }
    if cli.watch {
        config.viewer.watch = true;
    }

    config
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: parse a TOML string into a FileConfig
    fn parse_file_config(toml_str: &str) -> Option<FileConfig> {
        toml::from_str::<FileConfig>(toml_str).ok()
    }

    /// Helper: write TOML to a temp file and load it
    fn load_from_string(toml_str: &str) -> Option<FileConfig> {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(toml_str.as_bytes()).unwrap();
        load_file_config(f.path())
    }

    /// Helper: write TOML to a temp file and build the config from it
    fn build_from_string(toml_str: &str, cli: Cli) -> AppConfig {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(toml_str.as_bytes()).unwrap();
        let cli = Cli {
            config: Some(f.path().to_path_buf()),
            ..cli
        };
        build_config(&cli)
    }

    /// Helper: build a minimal Cli struct for testing
    fn default_cli() -> Cli {
        Cli {
            document: None,
            results: None,
            query: None,
            mode: None,
            watch: false,
            verbose: false,
            theme: None,
            config: None,
            command: None,
        }
    }

    // -- Default config tests -------------------------------------------------

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.document, None);
        assert_eq!(config.results, None);
        assert!(!config.verbose);
        assert_eq!(config.theme, Theme::Dark);
        assert!(config.highlight.enabled);
        assert_eq!(config.highlight.mode, HighlightMode::Auto);
        assert_eq!(config.highlight.classes.active, "match-active");
        assert!(config.viewer.results_panel);
        assert!(!config.viewer.watch);
    }

    // -- TOML parsing tests ---------------------------------------------------

    #[test]
    fn test_parse_valid_full_config() {
        let toml = r#"
verbose = true
theme = "light"

[highlight]
enabled = false
mode = "regex"
active_class = "hl-now"
even_class = "hl-even"
odd_class = "hl-odd"

[viewer]
results_panel = false
watch = true
"#;
        let cfg = parse_file_config(toml).unwrap();
        assert_eq!(cfg.verbose, Some(true));
        assert_eq!(cfg.theme.as_deref(), Some("light"));
        assert_eq!(cfg.highlight.enabled, Some(false));
        assert_eq!(cfg.highlight.mode.as_deref(), Some("regex"));
        assert_eq!(cfg.highlight.active_class.as_deref(), Some("hl-now"));
        assert_eq!(cfg.viewer.results_panel, Some(false));
        assert_eq!(cfg.viewer.watch, Some(true));
    }

    #[test]
    fn test_parse_empty_config() {
        let cfg = parse_file_config("").unwrap();
        assert_eq!(cfg.verbose, None);
        assert_eq!(cfg.theme, None);
        assert_eq!(cfg.highlight.enabled, None);
        assert_eq!(cfg.highlight.mode, None);
        assert_eq!(cfg.viewer.watch, None);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let toml = r#"
verbose = false
unknown_key = "should be ignored"

[highlight]
mode = "simple"
sparkle = true

[unknown_section]
foo = "bar"
"#;
        let cfg = parse_file_config(toml).unwrap();
        assert_eq!(cfg.verbose, Some(false));
        assert_eq!(cfg.highlight.mode.as_deref(), Some("simple"));
    }

    #[test]
    fn test_malformed_toml_returns_none() {
        assert!(parse_file_config("this is not valid toml [[[").is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file_config(&dir.path().join("missing.toml")).is_none());
    }

    #[test]
    fn test_load_valid_file() {
        let cfg = load_from_string("verbose = true\ntheme = \"dark\"\n").unwrap();
        assert_eq!(cfg.verbose, Some(true));
        assert_eq!(cfg.theme.as_deref(), Some("dark"));
    }

    #[test]
    fn test_load_malformed_file() {
        assert!(load_from_string("not valid {{{{ toml").is_none());
    }

    // -- Value parsing tests --------------------------------------------------

    #[test]
    fn test_parse_theme() {
        assert_eq!(parse_theme("Dark"), Some(Theme::Dark));
        assert_eq!(parse_theme("LIGHT"), Some(Theme::Light));
        assert_eq!(parse_theme("solarized"), None);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("Simple"), Some(HighlightMode::Simple));
        assert_eq!(parse_mode("fuzzy"), None);
    }

    // -- build_config merge tests ---------------------------------------------

    #[test]
    fn test_build_config_defaults_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            config: Some(dir.path().join("nonexistent.toml")),
            ..default_cli()
        };
        assert_eq!(build_config(&cli), AppConfig::default());
    }

    #[test]
    fn test_build_config_file_overrides_defaults() {
        let toml = r#"
verbose = true
theme = "light"

[highlight]
enabled = false
mode = "simple"
active_class = "now"

[viewer]
results_panel = false
watch = true
"#;
        let config = build_from_string(toml, default_cli());
        assert!(config.verbose);
        assert_eq!(config.theme, Theme::Light);
        assert!(!config.highlight.enabled);
        assert_eq!(config.highlight.mode, HighlightMode::Simple);
        assert_eq!(config.highlight.classes.active, "now");
        assert_eq!(config.highlight.classes.even, "match-even");
        assert!(!config.viewer.results_panel);
        assert!(config.viewer.watch);
    }

    #[test]
    fn test_build_config_cli_overrides_file() {
        let toml = r#"
verbose = false
theme = "light"

[highlight]
mode = "simple"
"#;
        let cli = Cli {
            verbose: true,
            theme: Some(Theme::Dark),
            mode: Some(HighlightMode::Regex),
            document: Some(PathBuf::from("/docs/report.json")),
            query: Some("revenue".to_string()),
            ..default_cli()
        };
        let config = build_from_string(toml, cli);

        assert!(config.verbose);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.highlight.mode, HighlightMode::Regex);
        assert_eq!(config.document, Some(PathBuf::from("/docs/report.json")));
        assert_eq!(config.query.as_deref(), Some("revenue"));
    }

    #[test]
    fn test_build_config_cli_false_flags_do_not_override_file() {
        let toml = r#"
verbose = true

[viewer]
watch = true
"#;
        let config = build_from_string(toml, default_cli());
        assert!(config.verbose);
        assert!(config.viewer.watch);
    }

    #[test]
    fn test_build_config_unknown_values_use_defaults() {
        let toml = r#"
theme = "solarized"

[highlight]
mode = "fuzzy"
odd_class = "   "
"#;
        let config = build_from_string(toml, default_cli());
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.highlight.mode, HighlightMode::Auto);
        assert_eq!(config.highlight.classes.odd, "match-odd");
    }

    #[test]
    fn test_build_config_malformed_file_uses_defaults() {
        let config = build_from_string("verbose = [[[", default_cli());
        assert_eq!(config, AppConfig::default());
    }
}
