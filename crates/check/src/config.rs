//! Configuration for the conformance runner.
//!
//! Every option can be given on the command line or through the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ENTSTORE_BACKEND` | memory | Adapter to check (`memory`, `sqlite`) |
//! | `ENTSTORE_DATABASE_URL` | (none) | SQLite file path, or `:memory:` |
//! | `ENTSTORE_LOG_LEVEL` | info | Log level |
//! | `ENTSTORE_SCENARIOS` | all | Comma-separated scenario names |
//! | `ENTSTORE_MUST_MERGE` | true | Require merge on plain re-save |
//! | `ENTSTORE_REPORT_FORMAT` | text | Report format (`text`, `json`) |
//!
//! # Example
//!
//! ```rust
//! use entstore_check::{BackendMode, CheckConfig};
//!
//! let config = CheckConfig {
//!     backend: "sqlite".to_string(),
//!     database_url: Some(":memory:".to_string()),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! assert_eq!(config.backend_mode(), Ok(BackendMode::Sqlite));
//! ```

use std::fmt;
use std::str::FromStr;

use clap::Parser;

use entstore::core::BackendKind;
use entstore_conformance::{Scenario, SuiteSettings};

/// Adapter the runner checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// The in-memory reference adapter.
    Memory,
    /// The SQLite reference adapter.
    Sqlite,
}

impl BackendMode {
    /// Returns the matching adapter kind.
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendMode::Memory => BackendKind::Memory,
            BackendMode::Sqlite => BackendKind::Sqlite,
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Memory => write!(f, "memory"),
            BackendMode::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendMode::Memory),
            "sqlite" => Ok(BackendMode::Sqlite),
            other => Err(format!(
                "unknown backend '{}' (expected memory or sqlite)",
                other
            )),
        }
    }
}

/// How the report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// One line per case.
    Text,
    /// The serialized report.
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!(
                "unknown report format '{}' (expected text or json)",
                other
            )),
        }
    }
}

/// Runner configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "entstore-check")]
#[command(about = "Run the entstore conformance battery against a reference adapter")]
pub struct CheckConfig {
    /// Adapter to check (memory, sqlite).
    #[arg(short, long, env = "ENTSTORE_BACKEND", default_value = "memory")]
    pub backend: String,

    /// SQLite database path, or :memory:.
    #[arg(long, env = "ENTSTORE_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "ENTSTORE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Scenarios to run (comma-separated, or all).
    #[arg(long, env = "ENTSTORE_SCENARIOS", default_value = "all")]
    pub scenarios: String,

    /// Require that a plain re-save merges into the stored record.
    #[arg(
        long,
        env = "ENTSTORE_MUST_MERGE",
        default_value = "true",
        action = clap::ArgAction::Set
    )]
    pub must_merge: bool,

    /// Report format (text, json).
    #[arg(long, env = "ENTSTORE_REPORT_FORMAT", default_value = "text")]
    pub report_format: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: None,
            log_level: "info".to_string(),
            scenarios: "all".to_string(),
            must_merge: true,
            report_format: "text".to_string(),
        }
    }
}

impl CheckConfig {
    /// Creates a configuration from environment variables alone.
    pub fn from_env() -> Self {
        Self::try_parse_from(["entstore-check"]).unwrap_or_default()
    }

    /// Parses the backend name.
    pub fn backend_mode(&self) -> Result<BackendMode, String> {
        self.backend.parse()
    }

    /// Parses the report format.
    pub fn report_format(&self) -> Result<ReportFormat, String> {
        self.report_format.parse()
    }

    /// Parses the scenario list. `all` (or an empty list) selects every
    /// scenario.
    pub fn scenario_list(&self) -> Result<Vec<Scenario>, String> {
        let names: Vec<&str> = self
            .scenarios
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if names.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case("all")) {
            return Ok(Scenario::ALL.to_vec());
        }

        names
            .into_iter()
            .map(|name| name.parse::<Scenario>().map_err(|e| e.to_string()))
            .collect()
    }

    /// Returns the SQLite database path, `:memory:` when unset.
    pub fn database_path(&self) -> &str {
        self.database_url.as_deref().unwrap_or(":memory:")
    }

    /// Builds suite settings for the chosen adapter.
    pub fn suite_settings(&self, mode: BackendMode) -> SuiteSettings {
        SuiteSettings::for_backend(mode.kind()).with_must_merge(self.must_merge)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let mode = match self.backend_mode() {
            Ok(mode) => Some(mode),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        if let Err(e) = self.scenario_list() {
            errors.push(e);
        }

        if let Err(e) = self.report_format() {
            errors.push(e);
        }

        if mode == Some(BackendMode::Memory) && self.database_url.is_some() {
            errors.push("Database URL is only valid for the sqlite backend".to_string());
        }

        if matches!(self.database_url.as_deref(), Some(url) if url.trim().is_empty()) {
            errors.push("Database URL cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
