//! Results of a conformance run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scenarios::Scenario;

/// How a single case ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// The adapter behaved as required.
    Passed,
    /// The adapter misbehaved or returned an error.
    Failed(String),
    /// The case did not run.
    Skipped(String),
}

impl CaseOutcome {
    /// Returns true for [`CaseOutcome::Failed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, CaseOutcome::Failed(_))
    }
}

/// Outcome of one named case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReport {
    /// Case name, unique within its scenario.
    pub name: String,
    /// What happened.
    pub outcome: CaseOutcome,
}

/// Outcomes of every case in one scenario, in run order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// The scenario that ran.
    pub scenario: Scenario,
    /// Case outcomes in run order.
    pub cases: Vec<CaseReport>,
}

impl ScenarioReport {
    /// Returns true when no case failed.
    pub fn is_success(&self) -> bool {
        !self.cases.iter().any(|c| c.outcome.is_failure())
    }
}

/// Outcome of a whole suite run against one adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Name reported by the adapter.
    pub backend: String,
    /// Scenario reports in run order.
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    fn count(&self, pred: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.scenarios
            .iter()
            .flat_map(|s| &s.cases)
            .filter(|c| pred(&c.outcome))
            .count()
    }

    /// Number of passed cases.
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Passed))
    }

    /// Number of failed cases.
    pub fn failed(&self) -> usize {
        self.count(CaseOutcome::is_failure)
    }

    /// Number of skipped cases.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Skipped(_)))
    }

    /// Returns true when no case failed.
    pub fn is_success(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::is_success)
    }

    /// Returns `(scenario, case, message)` for each failed case.
    pub fn failures(&self) -> Vec<(Scenario, &str, &str)> {
        self.scenarios
            .iter()
            .flat_map(|s| {
                s.cases.iter().filter_map(move |c| match &c.outcome {
                    CaseOutcome::Failed(message) => Some((s.scenario, c.name.as_str(), message.as_str())),
                    _ => None,
                })
            })
            .collect()
    }

    /// Panics with every failure listed unless the run succeeded.
    pub fn assert_success(&self) {
        if !self.is_success() {
            panic!("conformance failures:\n{}", self);
        }
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "backend: {}", self.backend)?;
        for scenario in &self.scenarios {
            writeln!(f, "{}", scenario.scenario)?;
            for case in &scenario.cases {
                match &case.outcome {
                    CaseOutcome::Passed => writeln!(f, "  ok    {}", case.name)?,
                    CaseOutcome::Failed(message) => writeln!(f, "  FAIL  {}: {}", case.name, message)?,
                    CaseOutcome::Skipped(reason) => writeln!(f, "  skip  {} ({})", case.name, reason)?,
                }
            }
        }
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> SuiteReport {
        SuiteReport {
            backend: "memory".to_string(),
            scenarios: vec![ScenarioReport {
                scenario: Scenario::Basic,
                cases: vec![
                    CaseReport {
                        name: "load missing".to_string(),
                        outcome: CaseOutcome::Passed,
                    },
                    CaseReport {
                        name: "save new".to_string(),
                        outcome: CaseOutcome::Failed("no id".to_string()),
                    },
                    CaseReport {
                        name: "native".to_string(),
                        outcome: CaseOutcome::Skipped("unsupported".to_string()),
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(!report.is_success());
        assert_eq!(report.failures(), vec![(Scenario::Basic, "save new", "no id")]);
    }

    #[test]
    fn test_outcome_serialization() {
        let value = serde_json::to_value(&report().scenarios[0].cases).unwrap();
        assert_eq!(
            value,
            json!([
                {"name": "load missing", "outcome": {"status": "passed"}},
                {"name": "save new", "outcome": {"status": "failed", "detail": "no id"}},
                {"name": "native", "outcome": {"status": "skipped", "detail": "unsupported"}},
            ])
        );
    }

    #[test]
    fn test_display_lists_failures() {
        let text = report().to_string();
        assert!(text.contains("FAIL  save new: no id"));
        assert!(text.ends_with("1 passed, 1 failed, 1 skipped"));
    }

    #[test]
    #[should_panic(expected = "conformance failures")]
    fn test_assert_success_panics() {
        report().assert_success();
    }
}
