//! Assertion helpers for conformance cases.
//!
//! Cases never panic: a failed expectation becomes a [`CaseError`] so the
//! runner can record it and carry on with the rest of the scenario.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use entstore::error::StorageError;
use entstore::types::Record;

/// Why a conformance case failed.
#[derive(Debug, Error)]
pub enum CaseError {
    /// The adapter answered, but not as the contract requires.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// The adapter returned an error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<entstore::error::QueryError> for CaseError {
    fn from(err: entstore::error::QueryError) -> Self {
        CaseError::Storage(err.into())
    }
}

/// Result type for conformance cases.
pub type CaseResult<T = ()> = Result<T, CaseError>;

/// Creates an assertion failure.
pub fn fail(message: impl Into<String>) -> CaseError {
    CaseError::Assertion(message.into())
}

/// Returns early with an assertion failure unless the condition holds.
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::assertions::fail(format!($($arg)+)));
        }
    };
}

/// Returns early with an assertion failure unless both sides are equal.
macro_rules! ensure_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if left != right {
                    return Err($crate::assertions::fail(format!(
                        "{} != {}: got {:?}, expected {:?}",
                        stringify!($left),
                        stringify!($right),
                        left,
                        right
                    )));
                }
            }
        }
    };
    ($left:expr, $right:expr, $($arg:tt)+) => {
        match (&$left, &$right) {
            (left, right) => {
                if left != right {
                    return Err($crate::assertions::fail(format!(
                        "{}: got {:?}, expected {:?}",
                        format!($($arg)+),
                        left,
                        right
                    )));
                }
            }
        }
    };
}

pub(crate) use ensure;
pub(crate) use ensure_eq;

/// Unwraps an optional record, failing with `what` when it is missing.
pub fn expect_some<T>(value: Option<T>, what: &str) -> CaseResult<T> {
    value.ok_or_else(|| fail(format!("expected {}, got nothing", what)))
}

/// Checks a record's canonical form against a pattern where `*` matches any
/// run of characters.
///
/// # Examples
///
/// ```
/// use entstore::types::{Collection, Record};
/// use entstore_conformance::assertions::matches_pattern;
/// use serde_json::json;
///
/// let mut record = Record::new(Collection::new("product"), "p1");
/// record.set("name", json!("apple"));
/// record.set("price", json!(100));
///
/// assert!(matches_pattern(&record, "$-/-/product:{id=*;name=apple;price=100}"));
/// assert!(!matches_pattern(&record, "$-/-/product:{id=*;name=pear;price=100}"));
/// ```
pub fn matches_pattern(record: &Record, pattern: &str) -> bool {
    text_matches(&record.to_string(), pattern)
}

/// Matches text against a pattern where `*` matches any run of characters.
pub fn text_matches(text: &str, pattern: &str) -> bool {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    match Regex::new(&format!("^{}$", body)) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// Fails unless the record's canonical form matches the pattern.
pub fn expect_pattern(record: &Record, pattern: &str) -> CaseResult {
    ensure!(
        matches_pattern(record, pattern),
        "record {} does not match {}",
        record,
        pattern
    );
    Ok(())
}

/// Fails unless the canonical forms of the records, joined with `,`, match
/// the pattern.
pub fn expect_list_pattern(records: &[Record], pattern: &str) -> CaseResult {
    let text = records
        .iter()
        .map(Record::to_string)
        .collect::<Vec<_>>()
        .join(",");
    ensure!(
        text_matches(&text, pattern),
        "records {} do not match {}",
        text,
        pattern
    );
    Ok(())
}

/// Returns the identities of the records, in order.
pub fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.id().to_string()).collect()
}

/// Returns one field of every record, in order. Missing fields are `None`.
pub fn field_values(records: &[Record], field: &str) -> Vec<Option<Value>> {
    records.iter().map(|r| r.lookup(field)).collect()
}

/// Returns the string values of one field, skipping records where it is
/// missing or not a string.
pub fn field_strings(records: &[Record], field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get(field).and_then(Value::as_str).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use entstore::types::Collection;
    use serde_json::json;

    fn apple() -> Record {
        let mut record = Record::new(Collection::new("product"), "a1");
        record.set("name", json!("apple"));
        record.set("price", json!(100));
        record
    }

    #[test]
    fn test_pattern_wildcard() {
        assert!(matches_pattern(&apple(), "$-/-/product:{id=*;name=apple;price=100}"));
        assert!(matches_pattern(&apple(), "*apple*"));
        assert!(text_matches("a,b", "*,*"));
    }

    #[test]
    fn test_pattern_is_anchored() {
        assert!(!matches_pattern(&apple(), "-/-/product:{id=*;name=apple;price=100}"));
        assert!(!matches_pattern(&apple(), "$-/-/product:{id=*;name=apple"));
    }

    #[test]
    fn test_pattern_escapes_regex_syntax() {
        let mut record = Record::new(Collection::new("product"), "a.1");
        record.set("name", json!("(apple)"));
        assert!(matches_pattern(&record, "$-/-/product:{id=a.1;name=(apple)}"));
        assert!(!matches_pattern(&record, "$-/-/product:{id=a?1;name=(apple)}"));
    }

    #[test]
    fn test_ensure_eq_reports_values() {
        fn check() -> CaseResult {
            ensure_eq!(1 + 1, 3, "sum");
            Ok(())
        }

        let err = check().unwrap_err();
        assert_eq!(err.to_string(), "assertion failed: sum: got 2, expected 3");
    }

    #[test]
    fn test_field_helpers() {
        let records = vec![apple(), Record::new(Collection::new("product"), "b2")];
        assert_eq!(ids(&records), vec!["a1", "b2"]);
        assert_eq!(field_strings(&records, "name"), vec!["apple"]);
        assert_eq!(
            field_values(&records, "price"),
            vec![Some(json!(100)), None]
        );
    }
}
