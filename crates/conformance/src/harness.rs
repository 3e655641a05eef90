//! Runner infrastructure for the conformance battery.
//!
//! A [`Suite`] asks a [`StoreFactory`] for a fresh store per scenario, clears
//! it, runs the scenario's [`Case`]s in order against one [`CaseContext`] and
//! closes the store afterwards. Cases whose capabilities the adapter does not
//! advertise are skipped rather than failed.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use entstore::core::{BackendCapability, BackendKind, EntityStore};
use entstore::error::StorageResult;
use entstore::types::{NativeQuery, Record};

use crate::assertions::{CaseResult, fail};
use crate::report::{CaseOutcome, CaseReport, ScenarioReport, SuiteReport};
use crate::scenarios::Scenario;

/// Produces store handles for the runner.
///
/// # Example
///
/// ```
/// use entstore::backends::memory::MemoryStore;
/// use entstore::error::StorageResult;
/// use entstore_conformance::harness::from_fn;
///
/// fn memory_store() -> StorageResult<MemoryStore> {
///     Ok(MemoryStore::new())
/// }
///
/// let factory = from_fn(memory_store);
/// # let _ = factory;
/// ```
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Creates a store ready for use.
    async fn create(&self) -> StorageResult<Arc<dyn EntityStore>>;
}

/// A [`StoreFactory`] backed by a plain constructor function.
#[derive(Debug, Clone, Copy)]
pub struct FnFactory<F>(F);

/// Wraps a constructor as a [`StoreFactory`].
pub fn from_fn<F, S>(constructor: F) -> FnFactory<F>
where
    F: Fn() -> StorageResult<S> + Send + Sync,
    S: EntityStore + 'static,
{
    FnFactory(constructor)
}

#[async_trait]
impl<F, S> StoreFactory for FnFactory<F>
where
    F: Fn() -> StorageResult<S> + Send + Sync,
    S: EntityStore + 'static,
{
    async fn create(&self) -> StorageResult<Arc<dyn EntityStore>> {
        let store = (self.0)()?;
        Ok(Arc::new(store))
    }
}

/// Adapter-specific statements for the native query scenario.
///
/// Both statements must return the seeded products ordered by ascending
/// price; `ranged` carries its own bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeStatements {
    /// Parameterless statement listing every product.
    pub ordered: NativeQuery,

    /// Parameterized statement selecting products within a price range.
    pub ranged: NativeQuery,
}

impl NativeStatements {
    /// Statements against the SQLite adapter's `entities` table.
    pub fn sqlite() -> Self {
        Self {
            ordered: NativeQuery::sql(
                "SELECT id, data FROM entities \
                 WHERE zone = '-' AND base = '-' AND name = 'product' \
                 ORDER BY json_extract(data, '$.price')",
            ),
            ranged: NativeQuery::sql(
                "SELECT id, data FROM entities \
                 WHERE zone = '-' AND base = '-' AND name = 'product' \
                 AND json_extract(data, '$.price') >= ?1 \
                 AND json_extract(data, '$.price') <= ?2 \
                 ORDER BY json_extract(data, '$.price')",
            )
            .with_params(vec![json!(0), json!(1000)]),
        }
    }
}

/// Switches that adjust what the battery expects of an adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteSettings {
    /// Require that a plain re-save merges into the stored record.
    #[serde(default)]
    pub must_merge: bool,

    /// Statements for the native scenario; it is skipped without them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<NativeStatements>,
}

impl SuiteSettings {
    /// Settings suited to one of the reference adapters.
    pub fn for_backend(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Memory => Self {
                must_merge: true,
                native: None,
            },
            BackendKind::Sqlite => Self {
                must_merge: true,
                native: Some(NativeStatements::sqlite()),
            },
            BackendKind::Custom(_) => Self::default(),
        }
    }

    /// Sets the merge requirement.
    pub fn with_must_merge(mut self, must_merge: bool) -> Self {
        self.must_merge = must_merge;
        self
    }

    /// Sets the native scenario statements.
    pub fn with_native(mut self, native: NativeStatements) -> Self {
        self.native = Some(native);
        self
    }
}

/// Boxed future returned by a case.
pub type CaseFuture<'a> = Pin<Box<dyn Future<Output = CaseResult> + Send + 'a>>;

type CaseFn = Arc<dyn for<'a> Fn(&'a CaseContext) -> CaseFuture<'a> + Send + Sync>;

/// One named check within a scenario.
#[derive(Clone)]
pub struct Case {
    name: String,
    requires: Vec<BackendCapability>,
    skip: Option<String>,
    run: CaseFn,
}

impl Case {
    /// Creates a case from its body.
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: for<'a> Fn(&'a CaseContext) -> CaseFuture<'a> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            requires: Vec::new(),
            skip: None,
            run: Arc::new(run),
        }
    }

    /// Adds capabilities the adapter must advertise for this case to run.
    pub fn requires(mut self, capabilities: &[BackendCapability]) -> Self {
        for capability in capabilities {
            if !self.requires.contains(capability) {
                self.requires.push(*capability);
            }
        }
        self
    }

    /// Marks the case as skipped regardless of capabilities.
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    /// Returns the case name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the capabilities this case needs.
    pub fn required(&self) -> &[BackendCapability] {
        &self.requires
    }

    /// Runs the case body.
    pub async fn run(&self, cx: &CaseContext) -> CaseResult {
        (self.run)(cx).await
    }
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("skip", &self.skip)
            .finish_non_exhaustive()
    }
}

/// Everything a case can reach: the store, the settings, and records that
/// earlier cases of the same scenario left behind.
pub struct CaseContext {
    store: Arc<dyn EntityStore>,
    settings: SuiteSettings,
    scratch: Mutex<HashMap<String, Record>>,
}

impl CaseContext {
    /// Creates a context with empty scratch state.
    pub fn new(store: Arc<dyn EntityStore>, settings: SuiteSettings) -> Self {
        Self {
            store,
            settings,
            scratch: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the store under test.
    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    /// Returns a shared handle to the store, for spawned tasks.
    pub fn shared_store(&self) -> Arc<dyn EntityStore> {
        Arc::clone(&self.store)
    }

    /// Returns the suite settings.
    pub fn settings(&self) -> &SuiteSettings {
        &self.settings
    }

    /// Keeps a record for later cases.
    pub fn remember(&self, key: &str, record: Record) {
        self.scratch.lock().insert(key.to_string(), record);
    }

    /// Returns a record kept by an earlier case.
    pub fn recall(&self, key: &str) -> CaseResult<Record> {
        self.scratch
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| fail(format!("no record kept under '{}'; an earlier case failed", key)))
    }
}

/// The conformance battery.
///
/// # Example
///
/// ```
/// use entstore::backends::memory::MemoryStore;
/// use entstore::core::BackendKind;
/// use entstore::error::StorageResult;
/// use entstore_conformance::harness::from_fn;
/// use entstore_conformance::{Scenario, Suite, SuiteSettings};
///
/// fn memory_store() -> StorageResult<MemoryStore> {
///     Ok(MemoryStore::new())
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = Suite::new(SuiteSettings::for_backend(BackendKind::Memory))
///     .with_scenarios([Scenario::Operators])
///     .run(&from_fn(memory_store))
///     .await?;
///
/// assert!(report.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Suite {
    settings: SuiteSettings,
    scenarios: Vec<Scenario>,
}

impl Suite {
    /// Creates a suite running every scenario.
    pub fn new(settings: SuiteSettings) -> Self {
        Self {
            settings,
            scenarios: Scenario::ALL.to_vec(),
        }
    }

    /// Restricts the suite to the given scenarios, in the given order.
    pub fn with_scenarios(mut self, scenarios: impl IntoIterator<Item = Scenario>) -> Self {
        self.scenarios = scenarios.into_iter().collect();
        self
    }

    /// Returns the scenarios this suite runs.
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Returns the settings.
    pub fn settings(&self) -> &SuiteSettings {
        &self.settings
    }

    /// Runs every selected scenario, each against a fresh store.
    ///
    /// # Errors
    ///
    /// Returns an error only when the factory cannot create a store or the
    /// store cannot be cleared or closed; case failures are reported.
    pub async fn run<F>(&self, factory: &F) -> StorageResult<SuiteReport>
    where
        F: StoreFactory + ?Sized,
    {
        let mut report = SuiteReport::default();
        for scenario in &self.scenarios {
            let (backend, scenario_report) = self.run_scenario(factory, *scenario).await?;
            report.backend = backend;
            report.scenarios.push(scenario_report);
        }
        Ok(report)
    }

    async fn run_scenario<F>(
        &self,
        factory: &F,
        scenario: Scenario,
    ) -> StorageResult<(String, ScenarioReport)>
    where
        F: StoreFactory + ?Sized,
    {
        let store = factory.create().await?;
        let backend = store.backend_name().to_string();
        store.clear().await?;

        tracing::info!(backend = %backend, scenario = %scenario, "Running scenario");

        let cx = CaseContext::new(Arc::clone(&store), self.settings.clone());
        let mut cases = Vec::new();

        for case in scenario.cases(&self.settings) {
            let case = case.requires(scenario.requires());
            let missing = case.required().iter().find(|c| !store.supports(**c));
            let outcome = match (missing, &case.skip) {
                (Some(capability), _) => {
                    CaseOutcome::Skipped(format!("{} does not support {}", backend, capability))
                }
                (None, Some(reason)) => CaseOutcome::Skipped(reason.clone()),
                (None, None) => match case.run(&cx).await {
                    Ok(()) => CaseOutcome::Passed,
                    Err(err) => CaseOutcome::Failed(err.to_string()),
                },
            };

            match &outcome {
                CaseOutcome::Passed => {
                    tracing::debug!(scenario = %scenario, case = case.name(), "Case passed");
                }
                CaseOutcome::Failed(message) => {
                    tracing::warn!(scenario = %scenario, case = case.name(), %message, "Case failed");
                }
                CaseOutcome::Skipped(reason) => {
                    tracing::debug!(scenario = %scenario, case = case.name(), %reason, "Case skipped");
                }
            }

            cases.push(CaseReport {
                name: case.name().to_string(),
                outcome,
            });
        }

        store.close().await?;

        Ok((backend, ScenarioReport { scenario, cases }))
    }
}

/// Stamps one `#[tokio::test]` per scenario for an adapter.
///
/// The factory is any `Fn() -> StorageResult<S>` where `S: EntityStore`; an
/// optional third argument supplies [`SuiteSettings`].
///
/// # Example
///
/// ```ignore
/// fn memory_store() -> StorageResult<MemoryStore> {
///     Ok(MemoryStore::new())
/// }
///
/// entstore_conformance::conformance_test!(memory, memory_store);
/// // expands to memory_basic, memory_sort, ..., memory_native
/// ```
#[macro_export]
macro_rules! conformance_test {
    ($prefix:ident, $factory:expr) => {
        $crate::conformance_test!($prefix, $factory, $crate::SuiteSettings::default());
    };
    ($prefix:ident, $factory:expr, $settings:expr) => {
        $crate::conformance_test!(@scenario $prefix, $factory, $settings, basic, Basic);
        $crate::conformance_test!(@scenario $prefix, $factory, $settings, sort, Sort);
        $crate::conformance_test!(@scenario $prefix, $factory, $settings, limits, Limits);
        $crate::conformance_test!(@scenario $prefix, $factory, $settings, operators, Operators);
        $crate::conformance_test!(@scenario $prefix, $factory, $settings, mutation, Mutation);
        $crate::conformance_test!(@scenario $prefix, $factory, $settings, upsert, Upsert);
        $crate::conformance_test!(@scenario $prefix, $factory, $settings, isolation, Isolation);
        $crate::conformance_test!(@scenario $prefix, $factory, $settings, concurrency, Concurrency);
        $crate::conformance_test!(@scenario $prefix, $factory, $settings, native, Native);
    };
    (@scenario $prefix:ident, $factory:expr, $settings:expr, $name:ident, $variant:ident) => {
        $crate::paste::paste! {
            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn [<$prefix _ $name>]() {
                let report = $crate::Suite::new($settings)
                    .with_scenarios([$crate::Scenario::$variant])
                    .run(&$crate::harness::from_fn($factory))
                    .await
                    .expect("Failed to run conformance scenario");
                report.assert_success();
            }
        }
    };
}
