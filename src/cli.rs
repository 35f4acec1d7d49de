//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::SourceKind;
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;

/// TeamPulse - cross-platform team health and isolation risk reports
///
/// Merges per-source activity exports into one identity per person,
/// scores activity and communication, flags isolation risk and writes a
/// Markdown or JSON team health report.
///
/// Examples:
///   teampulse --input ./exports
///   teampulse --input ./exports --sources slack,zoom --format json
///   teampulse --input ./exports --as-of 2024-06-01 --fail-on-isolation
///   teampulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory with one `<source>.json` export per source
    ///
    /// Defaults to `sources.input_dir` from the config file.
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Sources to fetch (comma-separated)
    ///
    /// Example: --sources slack,google_workspace,zoom
    #[arg(short, long, value_name = "SOURCES", value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .teampulse.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Organization the cycle runs for
    #[arg(
        long,
        default_value = "default",
        env = "TEAMPULSE_ORGANIZATION",
        value_name = "NAME"
    )]
    pub organization: String,

    /// Evaluate the cycle at this instant instead of now
    ///
    /// RFC 3339 timestamp or a YYYY-MM-DD date (midnight UTC).
    #[arg(long, value_name = "TIME", value_parser = parse_as_of)]
    pub as_of: Option<DateTime<Utc>>,

    /// Per-source fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with code 2 when any member is isolated
    ///
    /// Useful for scheduled jobs that should alert on isolation.
    #[arg(long)]
    pub fail_on_isolation: bool,

    /// Generate a default .teampulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

fn parse_as_of(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("Invalid time '{}': expected RFC 3339 or YYYY-MM-DD", s))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.organization.trim().is_empty() {
            return Err("Organization must not be empty".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref sources) = self.sources {
            if sources.is_empty() {
                return Err("At least one source is required".to_string());
            }
            for source in sources {
                if SourceKind::parse(source).is_none() {
                    return Err(format!("Unknown source: {}", source));
                }
            }
        }

        // Validate input directory if provided
        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input directory does not exist: {}", input.display()));
            }
            if !input.is_dir() {
                return Err(format!("Input path is not a directory: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `general.verbose` from the config file. `--quiet`
    /// wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
