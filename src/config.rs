//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.teampulse.toml` files.

use crate::analysis::health::DEFAULT_ACTIVE_WINDOW_DAYS;
use crate::cli::{Args, OutputFormat};
use crate::identity::SourcePrecedence;
use crate::models::SourceKind;
use crate::report::ReportOptions;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".teampulse.toml";

/// Largest accepted `health.active_window_days` (about a century).
pub const MAX_ACTIVE_WINDOW_DAYS: u32 = 36_500;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Source adapter settings.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Team health settings.
    #[serde(default)]
    pub health: HealthConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Report format: "markdown" or "json".
    #[serde(default = "default_format")]
    pub format: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: default_format(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "teampulse_report.md".to_string()
}

fn default_format() -> String {
    "markdown".to_string()
}

/// Source adapter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Directory holding one `<source>.json` export per source.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Sources to fetch.
    #[serde(default = "default_source_ids")]
    pub enabled: Vec<String>,

    /// Merge precedence for display name, email, avatar and metadata.
    /// Later sources overwrite earlier ones.
    #[serde(default = "default_source_ids")]
    pub order: Vec<String>,

    /// Per-source fetch timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            enabled: default_source_ids(),
            order: default_source_ids(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_input_dir() -> String {
    "exports".to_string()
}

fn default_source_ids() -> Vec<String> {
    SourceKind::ALL.iter().map(|k| k.id().to_string()).collect()
}

fn default_timeout() -> u64 {
    30
}

/// Team health settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Days since last activity within which a member counts as active.
    #[serde(default = "default_active_window")]
    pub active_window_days: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            active_window_days: default_active_window(),
        }
    }
}

fn default_active_window() -> u32 {
    DEFAULT_ACTIVE_WINDOW_DAYS
}

/// Report generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the full member table.
    #[serde(default = "default_true")]
    pub include_persons: bool,

    /// Maximum rows per member table.
    #[serde(default = "default_max_listed")]
    pub max_listed_persons: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_persons: true,
            max_listed_persons: default_max_listed(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_listed() -> usize {
    50
}

fn parse_sources(ids: &[String], field: &str) -> Result<Vec<SourceKind>> {
    ids.iter()
        .map(|id| match SourceKind::parse(id) {
            Some(kind) => Ok(kind),
            None => bail!("Unknown source '{}' in {}", id, field),
        })
        .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref input) = args.input {
            self.sources.input_dir = input.display().to_string();
        }
        if let Some(ref sources) = args.sources {
            self.sources.enabled = sources.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format.as_str().to_string();
        }
        if let Some(timeout) = args.timeout {
            self.sources.timeout_seconds = timeout;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Reject settings the cycle cannot run with.
    ///
    /// Call after [`Config::merge_with_args`] so CLI overrides are checked too.
    pub fn validate(&self) -> Result<()> {
        if self.sources.timeout_seconds == 0 {
            bail!("sources.timeout_seconds must be at least 1");
        }
        if self.health.active_window_days > MAX_ACTIVE_WINDOW_DAYS {
            bail!(
                "health.active_window_days must be at most {} (got {})",
                MAX_ACTIVE_WINDOW_DAYS,
                self.health.active_window_days
            );
        }
        Ok(())
    }

    /// Sources to fetch, deduplicated, in configured order.
    pub fn enabled_sources(&self) -> Result<Vec<SourceKind>> {
        let mut kinds = parse_sources(&self.sources.enabled, "sources.enabled")?;
        let mut seen = std::collections::BTreeSet::new();
        kinds.retain(|kind| seen.insert(*kind));
        Ok(kinds)
    }

    /// Identity merge precedence.
    pub fn precedence(&self) -> Result<SourcePrecedence> {
        Ok(SourcePrecedence::new(parse_sources(
            &self.sources.order,
            "sources.order",
        )?))
    }

    pub fn output_format(&self) -> Result<OutputFormat> {
        match OutputFormat::parse(&self.general.format) {
            Some(format) => Ok(format),
            None => bail!("Unknown report format '{}'", self.general.format),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.general.output)
    }

    pub fn input_dir(&self) -> PathBuf {
        PathBuf::from(&self.sources.input_dir)
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            include_persons: self.report.include_persons,
            max_listed_persons: self.report.max_listed_persons,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "teampulse_report.md");
        assert_eq!(config.sources.timeout_seconds, 30);
        assert_eq!(config.health.active_window_days, 30);
        assert_eq!(config.enabled_sources().unwrap(), SourceKind::ALL.to_vec());
        assert_eq!(config.precedence().unwrap(), SourcePrecedence::default());
        assert_eq!(config.output_format().unwrap(), OutputFormat::Markdown);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "pulse.json"
format = "json"
verbose = true

[sources]
input_dir = "/var/exports"
enabled = ["slack", "zoom", "slack"]
order = ["zoom", "google"]
timeout_seconds = 5

[health]
active_window_days = 14
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "pulse.json");
        assert!(config.general.verbose);
        assert_eq!(config.output_format().unwrap(), OutputFormat::Json);
        assert_eq!(config.input_dir(), PathBuf::from("/var/exports"));
        assert_eq!(
            config.enabled_sources().unwrap(),
            vec![SourceKind::Slack, SourceKind::Zoom]
        );
        assert_eq!(
            config.precedence().unwrap().order(),
            &[SourceKind::Zoom, SourceKind::GoogleWorkspace]
        );
        assert_eq!(config.sources.timeout_seconds, 5);
        assert_eq!(config.health.active_window_days, 14);
        assert!(config.report.include_persons);
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let mut config = Config::default();
        config.sources.enabled = vec!["myspace".to_string()];
        let err = config.enabled_sources().unwrap_err();
        assert!(err.to_string().contains("myspace"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[report]\nmax_listed_persons = 5").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.report.max_listed_persons, 5);
        assert_eq!(config.general, GeneralConfig::default());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let args = Args::parse_from([
            "teampulse",
            "--input",
            "data",
            "--sources",
            "discord,teams",
            "--timeout",
            "3",
            "--format",
            "json",
        ]);
        config.merge_with_args(&args);

        assert_eq!(config.sources.input_dir, "data");
        assert_eq!(
            config.enabled_sources().unwrap(),
            vec![SourceKind::Discord, SourceKind::MicrosoftTeams]
        );
        assert_eq!(config.sources.timeout_seconds, 3);
        assert_eq!(config.output_format().unwrap(), OutputFormat::Json);
        // not given on the command line
        assert_eq!(config.general.output, "teampulse_report.md");
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config: Config = toml::from_str("[sources]\ntimeout_seconds = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_active_window() {
        let mut config = Config::default();
        config.health.active_window_days = MAX_ACTIVE_WINDOW_DAYS;
        assert!(config.validate().is_ok());

        config.health.active_window_days = 200_000_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("active_window_days"));

        config.health.active_window_days = u32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_sees_cli_timeout() {
        let mut config = Config::default();
        let mut args = Args::parse_from(["teampulse"]);
        args.timeout = Some(0);
        config.merge_with_args(&args);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[sources]"));
        assert!(toml_str.contains("[health]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
