//! TeamPulse - team health and isolation risk reports
//!
//! Reads per-source activity exports, merges them into one identity per
//! person and writes a Markdown or JSON team health report.
//!
//! Exit codes:
//!   0 - Success (no isolated members, or no --fail-on-isolation set)
//!   1 - Runtime error (config, input, merge failure, etc.)
//!   2 - Isolated members found with --fail-on-isolation

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use teampulse::cli::{Args, OutputFormat};
use teampulse::config::{Config, CONFIG_FILE_NAME};
use teampulse::models::IsolationRisk;
use teampulse::pipeline::{AggregationContext, CycleLocks};
use teampulse::report;
use teampulse::scoring::ScoringRegistry;
use teampulse::sources::JsonFileAdapter;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration first so `general.verbose` reaches the logger
    let loaded = load_config(&args);
    let config_verbose = matches!(&loaded, Ok((config, _)) if config.general.verbose);

    // Initialize logging
    init_logging(args.log_level(config_verbose));

    info!("TeamPulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match loaded {
        Ok((config, origin)) => {
            origin.log();
            run_report(args, config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .teampulse.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to choose sources, merge order, timeouts and more.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("⚠️  Failed to set tracing subscriber: {}", e);
    }
}

/// Run one aggregation cycle and write the report. Returns exit code (0 or 2).
async fn run_report(args: Args, mut config: Config) -> Result<i32> {
    let start_time = Instant::now();

    config.merge_with_args(&args);
    config.validate()?;

    let sources = config.enabled_sources()?;
    let precedence = config.precedence()?;
    let format = config.output_format()?;
    let input_dir = config.input_dir();
    let output_path = config.output_path();

    if !args.quiet {
        println!("📥 Reading exports from: {}", input_dir.display());
        let names: Vec<String> = sources.iter().map(|s| s.to_string()).collect();
        println!("   Sources: {}", names.join(", "));
        println!("   Organization: {}", args.organization);
    }

    let ctx = AggregationContext {
        organization: args.organization.clone(),
        adapters: JsonFileAdapter::for_sources(&input_dir, &sources),
        registry: ScoringRegistry::with_defaults(),
        precedence,
        timeout: Duration::from_secs(config.sources.timeout_seconds),
        as_of: args.as_of.unwrap_or_else(Utc::now),
        active_window_days: config.health.active_window_days,
    };

    let locks = CycleLocks::new();
    let outcome = locks
        .run(&ctx)
        .await
        .context("Failed to merge observations")?;

    for source_error in &outcome.errors {
        warn!("{}: {}", source_error.source, source_error.message);
    }

    // Generate and save the report
    let output = match format {
        OutputFormat::Json => report::generate_json_report(&outcome)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&outcome, &config.report_options())
        }
    };

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    let health = &outcome.report.team_health;
    let summary = &outcome.report.risk_analysis.summary;
    let duration = start_time.elapsed().as_secs_f64();

    if !args.quiet {
        println!("\n📊 Team Health Summary:");
        println!("   Members: {} ({} active)", health.total_members, health.active_members);
        println!("   Health score: {}/100", health.health_score);
        println!(
            "   - {} High: {} | {} Medium: {} | {} Low: {}",
            IsolationRisk::High.emoji(),
            health.risk_histogram.high,
            IsolationRisk::Medium.emoji(),
            health.risk_histogram.medium,
            IsolationRisk::Low.emoji(),
            health.risk_histogram.low
        );
        println!("   Isolated: {}", summary.isolated);
        if outcome.has_errors() {
            println!("   Source errors: {}", outcome.errors.len());
        }
        println!("   Duration: {:.1}s", duration);
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    if args.fail_on_isolation && summary.isolated > 0 {
        eprintln!(
            "\n⛔ {} isolated member(s) found. Failing (exit code 2).",
            summary.isolated
        );
        return Ok(2);
    }

    Ok(0)
}

/// Where the configuration came from. Logged once logging is up.
enum ConfigOrigin {
    File(PathBuf),
    Defaults,
    Fallback(anyhow::Error),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!("Loaded config from {}", path.display()),
            ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
            ConfigOrigin::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
///
/// An explicit `--config` must load. A broken default file falls back to
/// the built-in defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::File(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Defaults)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Fallback(e))),
    }
}
