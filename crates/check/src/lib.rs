//! Conformance runner for the entstore reference adapters.
//!
//! The `entstore-check` binary parses a [`CheckConfig`], builds the chosen
//! adapter, runs the battery and prints a report. The pieces are exposed here
//! so they can be tested without spawning the binary.

#![warn(missing_docs)]

pub mod config;

pub use config::{BackendMode, CheckConfig, ReportFormat};

use anyhow::Context;
use tracing::info;

use entstore::backends::memory::MemoryStore;
use entstore::error::StorageResult;
use entstore_conformance::SuiteReport;
use entstore_conformance::harness::from_fn;
use entstore_conformance::{Scenario, Suite, SuiteSettings};

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "entstore={level},entstore_conformance={level},entstore_check={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Runs the configured scenarios against the configured adapter.
pub async fn run(config: &CheckConfig) -> anyhow::Result<SuiteReport> {
    let mode = config
        .backend_mode()
        .map_err(|e| anyhow::anyhow!("Invalid backend configuration: {}", e))?;
    let scenarios = config
        .scenario_list()
        .map_err(|e| anyhow::anyhow!("Invalid scenario list: {}", e))?;
    let settings = config.suite_settings(mode);

    info!(
        backend = %mode,
        scenarios = scenarios.len(),
        must_merge = settings.must_merge,
        "Running conformance battery"
    );

    match mode {
        BackendMode::Memory => run_memory(settings, scenarios).await,
        BackendMode::Sqlite => run_sqlite(config, settings, scenarios).await,
    }
}

async fn run_memory(settings: SuiteSettings, scenarios: Vec<Scenario>) -> anyhow::Result<SuiteReport> {
    let factory = from_fn(|| -> StorageResult<MemoryStore> { Ok(MemoryStore::new()) });
    let report = Suite::new(settings)
        .with_scenarios(scenarios)
        .run(&factory)
        .await
        .context("memory store failed outside of a case")?;
    Ok(report)
}

/// Runs the battery against SQLite, in memory or on disk.
#[cfg(feature = "sqlite")]
async fn run_sqlite(
    config: &CheckConfig,
    settings: SuiteSettings,
    scenarios: Vec<Scenario>,
) -> anyhow::Result<SuiteReport> {
    use entstore::backends::sqlite::SqliteStore;

    let path = config.database_path().to_string();
    info!(database = %path, "Using SQLite store");

    let factory = from_fn(move || {
        if path == ":memory:" {
            SqliteStore::in_memory()
        } else {
            SqliteStore::open(&path)
        }
    });
    let report = Suite::new(settings)
        .with_scenarios(scenarios)
        .run(&factory)
        .await
        .context("SQLite store failed outside of a case")?;
    Ok(report)
}

/// Fallback when the sqlite feature is not enabled.
#[cfg(not(feature = "sqlite"))]
async fn run_sqlite(
    _config: &CheckConfig,
    _settings: SuiteSettings,
    _scenarios: Vec<Scenario>,
) -> anyhow::Result<SuiteReport> {
    anyhow::bail!(
        "The sqlite backend requires the 'sqlite' feature. \
         Build with: cargo build -p entstore-check --features sqlite"
    )
}

/// Formats a report for printing.
pub fn render(report: &SuiteReport, format: ReportFormat) -> anyhow::Result<String> {
    match format {
        ReportFormat::Text => Ok(report.to_string()),
        ReportFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_memory_subset() {
        let config = CheckConfig {
            scenarios: "sort,limits".to_string(),
            ..Default::default()
        };
        let report = run(&config).await.unwrap();
        assert_eq!(report.backend, "memory");
        assert_eq!(report.scenarios.len(), 2);
        assert!(report.is_success(), "{}", report);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = CheckConfig {
            backend: "sqlite".to_string(),
            database_url: Some(dir.path().join("check.db").display().to_string()),
            scenarios: "native,upsert".to_string(),
            ..Default::default()
        };
        let report = run(&config).await.unwrap();
        assert_eq!(report.backend, "sqlite");
        assert_eq!(report.skipped(), 0);
        assert!(report.is_success(), "{}", report);
    }

    #[tokio::test]
    async fn test_render_json() {
        let config = CheckConfig {
            scenarios: "sort".to_string(),
            ..Default::default()
        };
        let report = run(&config).await.unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&render(&report, ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["backend"], "memory");
        assert_eq!(json["scenarios"][0]["scenario"], "sort");
        assert_eq!(json["scenarios"][0]["cases"][0]["outcome"]["status"], "passed");
    }
}
