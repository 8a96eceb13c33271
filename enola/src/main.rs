//! Enola CLI Application
//!
//! A command-line interface for finding which sites host an account for a username.
//! This CLI application provides a user-friendly interface to the enola-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use enola_lib::config::FileConfig;
use enola_lib::{load_env_config, Catalog, ConfigManager, EnvConfig, ProbeResult, UsernameChecker};
use futures::StreamExt;
use std::process;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Exit code used when the scan was interrupted with Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

/// CLI arguments for enola
#[derive(Parser, Debug)]
#[command(name = "enola")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find which sites host an account for a username")]
#[command(
    long_about = "Probe a catalog of websites for a username and report where an account exists.\n\nSites are checked concurrently and results are shown as they arrive."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Username to look for
    #[arg(
        value_name = "USERNAME",
        required_unless_present = "list",
        help_heading = "Search"
    )]
    pub username: Option<String>,

    /// Only check sites whose name contains this text (case-insensitive)
    #[arg(short = 's', long = "site", value_name = "QUERY", help_heading = "Search")]
    pub site: Option<String>,

    /// List the sites in the catalog and exit
    #[arg(short = 'l', long = "list", help_heading = "Search")]
    pub list: bool,

    /// Use this catalog file instead of the built-in one
    #[arg(long = "catalog", value_name = "FILE", help_heading = "Search")]
    pub catalog: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Output results in CSV format
    #[arg(long = "csv", help_heading = "Output Format")]
    pub csv: bool,

    /// Enable grouped, structured output with section headers
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Only show sites where the account was found
    #[arg(short = 'f', long = "found-only", help_heading = "Output Format")]
    pub found_only: bool,

    /// Collect all results before displaying
    #[arg(long = "batch", help_heading = "Output Format")]
    pub batch: bool,

    /// Show results as they complete
    #[arg(long = "streaming", help_heading = "Output Format")]
    pub streaming: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logging, including every probe
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    fn is_structured(self) -> bool {
        self != OutputFormat::Text
    }
}

/// Effective settings after merging config files, environment and CLI flags.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    site: Option<String>,
    catalog: Option<String>,
    found_only: bool,
    pretty: bool,
    format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site: None,
            catalog: None,
            found_only: false,
            pretty: false,
            format: OutputFormat::Text,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    match run(args).await {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_INTERRUPTED),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the flag-derived level.
fn init_tracing(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("enola={level},enola_lib={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(username) = &args.username {
        if username.trim().is_empty() {
            return Err("Username cannot be empty".to_string());
        }
        if username.chars().any(char::is_whitespace) {
            return Err(format!("Username '{}' cannot contain whitespace", username));
        }
    } else if !args.list {
        return Err("You must specify a username, or --list to show the sites".to_string());
    }

    if args.batch && args.streaming {
        return Err("Cannot specify both --batch and --streaming modes".to_string());
    }

    if args.json && args.csv {
        return Err("Cannot specify multiple output formats (--json, --csv)".to_string());
    }

    if args.streaming && (args.json || args.csv) {
        return Err(
            "Cannot use --streaming with --json or --csv. Use --batch for structured output"
                .to_string(),
        );
    }

    Ok(())
}

/// Main logic. Returns `Ok(false)` when the scan was interrupted.
async fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;
    debug!(?settings, "effective settings");

    let catalog = match &settings.catalog {
        Some(path) => {
            info!(path = %path, "loading catalog file");
            Catalog::from_file(path)?
        }
        None => Catalog::embedded()?,
    };

    let cancel = CancellationToken::new();
    let mut checker = UsernameChecker::with_catalog(catalog, cancel.clone())?;
    if let Some(site) = &settings.site {
        checker.set_site_filter(site.as_str());
    }

    if args.list {
        display_site_list(&checker, &settings)?;
        return Ok(true);
    }

    let username = args
        .username
        .as_deref()
        .ok_or("You must specify a username")?;

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling scan");
                cancel.cancel();
            }
        }
    });

    if should_use_streaming(&args, &settings) {
        run_streaming_check(&checker, username, &settings).await
    } else {
        run_batch_check(&checker, username, &settings).await
    }
}

/// Determine whether to use streaming or batch mode
fn should_use_streaming(args: &Args, settings: &Settings) -> bool {
    if args.batch {
        return false;
    }

    if args.streaming {
        return true;
    }

    // Structured formats are emitted as one document
    !settings.format.is_structured()
}

/// Print results as they arrive.
async fn run_streaming_check(
    checker: &UsernameChecker,
    username: &str,
    settings: &Settings,
) -> Result<bool, Box<dyn std::error::Error>> {
    let total = checker.matching_sites()?.len();

    if settings.pretty {
        ui::print_header(
            username,
            total,
            checker.config().pool_width,
            settings.site.as_deref(),
        );
    }

    let start_time = Instant::now();
    let mut stream = checker.check(username)?;
    let mut completed = 0usize;
    let mut found = 0usize;

    while let Some(result) = stream.next().await {
        completed += 1;
        if result.found {
            found += 1;
        }

        if settings.found_only && !result.found {
            continue;
        }

        if settings.pretty {
            ui::print_result(&result, Some((completed, total)));
        } else {
            ui::print_result_default(&result);
        }
    }

    let duration = start_time.elapsed();

    if settings.pretty || completed > 1 {
        println!();
        ui::print_summary(completed, found, duration);
    }

    Ok(report_completion(checker, completed, total))
}

/// Collect every result, then print them sorted by site name.
async fn run_batch_check(
    checker: &UsernameChecker,
    username: &str,
    settings: &Settings,
) -> Result<bool, Box<dyn std::error::Error>> {
    let total = checker.matching_sites()?.len();
    let is_structured = settings.format.is_structured();

    if settings.pretty && !is_structured {
        ui::print_header(
            username,
            total,
            checker.config().pool_width,
            settings.site.as_deref(),
        );
    }

    let spinner = if !is_structured {
        ui::Spinner::start(format!("Checking {} sites...", total))
    } else {
        None
    };

    let start_time = Instant::now();
    let results = checker.check_all(username).await?;
    let duration = start_time.elapsed();

    if let Some(s) = spinner {
        s.stop().await;
    }

    let completed = results.len();
    display_results(&results, settings, duration)?;

    Ok(report_completion(checker, completed, total))
}

/// Warn about a truncated scan. Returns whether the scan ran to completion.
fn report_completion(checker: &UsernameChecker, completed: usize, total: usize) -> bool {
    if checker.cancellation_token().is_cancelled() && completed < total {
        ui::print_interrupted(completed, total);
        return false;
    }
    true
}

/// Build effective settings.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (ENOLA_*)
/// 3. Explicit config file (--config, then ENOLA_CONFIG), or discovered config files
/// 4. Built-in defaults
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let config_manager = ConfigManager::new(args.verbose);

    let explicit_path = args.config.clone().or_else(|| env_config.config.clone());
    let file_config = match explicit_path {
        Some(path) => {
            info!(path = %path, "using explicit config file");
            config_manager
                .load_file(&path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
        }
        None => config_manager.discover_and_load().unwrap_or_else(|e| {
            warn!(error = %e, "config discovery failed");
            FileConfig::default()
        }),
    };

    let settings = merge_file_config(Settings::default(), file_config);
    let settings = apply_environment_config(settings, &env_config);
    Ok(apply_cli_args(settings, args))
}

/// Merge FileConfig into Settings
fn merge_file_config(mut settings: Settings, file_config: FileConfig) -> Settings {
    if let Some(defaults) = file_config.defaults {
        if defaults.site.is_some() {
            settings.site = defaults.site;
        }
        if defaults.catalog.is_some() {
            settings.catalog = defaults.catalog;
        }
        if let Some(found_only) = defaults.found_only {
            settings.found_only = found_only;
        }
        if let Some(pretty) = defaults.pretty {
            settings.pretty = pretty;
        }
    }

    if let Some(format) = file_config
        .output
        .and_then(|output| output.default_format)
        .and_then(|name| OutputFormat::from_name(&name))
    {
        settings.format = format;
    }

    settings
}

/// Apply ENOLA_* environment variables.
fn apply_environment_config(mut settings: Settings, env_config: &EnvConfig) -> Settings {
    if env_config.has_output_format_conflict() {
        warn!("both ENOLA_JSON and ENOLA_CSV are set, using JSON");
    }

    if let Some(site) = &env_config.site {
        settings.site = Some(site.clone());
    }
    if let Some(catalog) = &env_config.catalog {
        settings.catalog = Some(catalog.clone());
    }
    if let Some(found_only) = env_config.found_only {
        settings.found_only = found_only;
    }
    if let Some(pretty) = env_config.pretty {
        settings.pretty = pretty;
    }

    if env_config.json == Some(true) {
        settings.format = OutputFormat::Json;
    } else if env_config.csv == Some(true) {
        settings.format = OutputFormat::Csv;
    } else if env_config.json == Some(false) && settings.format == OutputFormat::Json
        || env_config.csv == Some(false) && settings.format == OutputFormat::Csv
    {
        settings.format = OutputFormat::Text;
    }

    settings
}

/// Apply CLI arguments (highest precedence).
///
/// Boolean flags only ever switch things on; their absence keeps config values.
fn apply_cli_args(mut settings: Settings, args: &Args) -> Settings {
    if args.site.is_some() {
        settings.site = args.site.clone();
    }
    if args.catalog.is_some() {
        settings.catalog = args.catalog.clone();
    }
    if args.found_only {
        settings.found_only = true;
    }
    if args.pretty {
        settings.pretty = true;
    }

    if args.json {
        settings.format = OutputFormat::Json;
    } else if args.csv {
        settings.format = OutputFormat::Csv;
    } else if args.streaming {
        // Streaming output is always text
        settings.format = OutputFormat::Text;
    }

    settings
}

/// Print the sites selected by the current filter.
fn display_site_list(
    checker: &UsernameChecker,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let sites = checker.matching_sites()?;

    match settings.format {
        OutputFormat::Json => {
            let listing: Vec<serde_json::Value> = sites
                .names()
                .into_iter()
                .filter_map(|name| sites.get(name))
                .map(|site| {
                    serde_json::json!({
                        "name": site.name,
                        "url": site.url_template,
                        "urlMain": site.url_main,
                        "detection": site.strategy.to_string(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        OutputFormat::Csv => {
            println!("name,url,detection");
            for name in sites.names() {
                if let Some(site) = sites.get(name) {
                    println!(
                        "{},{},{}",
                        csv_field(&site.name),
                        csv_field(&site.url_template),
                        site.strategy
                    );
                }
            }
        }
        OutputFormat::Text => ui::print_site_list(&sites),
    }

    Ok(())
}

fn display_results(
    results: &[ProbeResult],
    settings: &Settings,
    duration: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let shown: Vec<ProbeResult> = results
        .iter()
        .filter(|r| r.found || !settings.found_only)
        .cloned()
        .collect();

    match settings.format {
        OutputFormat::Json => display_json_results(&shown)?,
        OutputFormat::Csv => display_csv_results(&shown),
        OutputFormat::Text => display_text_results(results, &shown, settings, duration),
    }

    Ok(())
}

/// Display results in JSON format
fn display_json_results(results: &[ProbeResult]) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}

/// Display results in CSV format
fn display_csv_results(results: &[ProbeResult]) {
    println!("name,url,found");

    for result in results {
        println!(
            "{},{},{}",
            csv_field(&result.name),
            csv_field(&result.resolved_url),
            result.found
        );
    }
}

/// Display results in human-readable text format
fn display_text_results(
    all: &[ProbeResult],
    shown: &[ProbeResult],
    settings: &Settings,
    duration: Duration,
) {
    if settings.pretty {
        ui::print_grouped_results(shown);
    } else {
        for result in shown {
            ui::print_result_default(result);
        }
    }

    if all.len() > 1 {
        let found = all.iter().filter(|r| r.found).count();
        println!();
        ui::print_summary(all.len(), found, duration);
    }
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// enola/src/main.rs tests module

#[cfg(test)]
mod tests {
    use super::*;
    use enola_lib::config::{DefaultsConfig, OutputConfig};

    fn create_test_args() -> Args {
        Args {
            username: Some("bob".to_string()),
            site: None,
            list: false,
            catalog: None,
            json: false,
            csv: false,
            pretty: false,
            found_only: false,
            batch: false,
            streaming: false,
            config: None,
            debug: false,
            verbose: false,
        }
    }

    #[test]
    fn test_validate_args_accepts_plain_username() {
        assert!(validate_args(&create_test_args()).is_ok());
    }

    #[test]
    fn test_validate_args_requires_username_or_list() {
        let mut args = create_test_args();
        args.username = None;
        assert!(validate_args(&args).is_err());

        args.list = true;
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_whitespace_username() {
        let mut args = create_test_args();
        args.username = Some("bob smith".to_string());
        assert!(validate_args(&args).is_err());

        args.username = Some("   ".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_conflicting_flags() {
        let mut args = create_test_args();
        args.batch = true;
        args.streaming = true;
        assert!(validate_args(&args).is_err());

        let mut args = create_test_args();
        args.json = true;
        args.csv = true;
        assert!(validate_args(&args).is_err());

        let mut args = create_test_args();
        args.streaming = true;
        args.json = true;
        let err = validate_args(&args).unwrap_err();
        assert!(err.contains("--batch"));
    }

    #[test]
    fn test_should_use_streaming() {
        let args = create_test_args();
        let text = Settings::default();
        let json = Settings {
            format: OutputFormat::Json,
            ..Settings::default()
        };

        assert!(should_use_streaming(&args, &text));
        assert!(!should_use_streaming(&args, &json));

        let mut batch = create_test_args();
        batch.batch = true;
        assert!(!should_use_streaming(&batch, &text));
    }

    #[test]
    fn test_settings_precedence() {
        let file_config = FileConfig {
            defaults: Some(DefaultsConfig {
                site: Some("reddit".to_string()),
                catalog: Some("/tmp/sites.json".to_string()),
                found_only: Some(true),
                pretty: None,
            }),
            output: Some(OutputConfig {
                default_format: Some("csv".to_string()),
            }),
        };
        let settings = merge_file_config(Settings::default(), file_config);
        assert_eq!(settings.site.as_deref(), Some("reddit"));
        assert_eq!(settings.format, OutputFormat::Csv);
        assert!(settings.found_only);

        let env_config = EnvConfig {
            site: Some("git".to_string()),
            json: Some(true),
            ..EnvConfig::default()
        };
        let settings = apply_environment_config(settings, &env_config);
        assert_eq!(settings.site.as_deref(), Some("git"));
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.catalog.as_deref(), Some("/tmp/sites.json"));

        let mut args = create_test_args();
        args.site = Some("hub".to_string());
        args.csv = true;
        let settings = apply_cli_args(settings, &args);
        assert_eq!(settings.site.as_deref(), Some("hub"));
        assert_eq!(settings.format, OutputFormat::Csv);
        // Absent CLI flag keeps the config value
        assert!(settings.found_only);
    }

    #[test]
    fn test_env_can_switch_structured_output_off() {
        let settings = Settings {
            format: OutputFormat::Json,
            ..Settings::default()
        };
        let env_config = EnvConfig {
            json: Some(false),
            ..EnvConfig::default()
        };
        assert_eq!(
            apply_environment_config(settings, &env_config).format,
            OutputFormat::Text
        );
    }

    #[test]
    fn test_output_format_from_name() {
        assert_eq!(OutputFormat::from_name("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name(" csv "), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_name("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_name("xml"), None);
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("GitHub"), "GitHub");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
