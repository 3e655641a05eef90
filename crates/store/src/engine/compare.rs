//! Value comparison rules shared by filtering and sorting.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::{Number, Value};

/// Strict equality by value.
///
/// Numbers compare numerically regardless of integer/float representation;
/// arrays and objects compare deeply under the same rule.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_cmp(x, y) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| strict_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| strict_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Orders two values for the ordering operators.
///
/// Returns `None` when the values are not ordered: different kinds, `null`,
/// arrays and objects.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_cmp(x, y),
        (Value::String(x), Value::String(y)) => Some(string_cmp(x, y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used by the result shaper.
///
/// Missing values and `null` sort first; otherwise values group by kind
/// (booleans, numbers, strings, arrays, objects) and order within a kind by
/// [`compare`]. Unordered pairs are treated as equal so the sort stays stable.
pub fn sort_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank_a = a.map_or(0, rank);
    let rank_b = b.map_or(0, rank);
    match rank_a.cmp(&rank_b) {
        Ordering::Equal => match (a, b) {
            (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        other => other,
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn number_cmp(x: &Number, y: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return Some(a.cmp(&b));
    }
    x.as_f64()?.partial_cmp(&y.as_f64()?)
}

/// Strings that both parse as RFC 3339 timestamps compare by instant; all
/// other strings compare lexically.
fn string_cmp(x: &str, y: &str) -> Ordering {
    match (parse_instant(x), parse_instant(y)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => x.cmp(y),
    }
}

fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    // Cheap pre-check keeps plain words off the parser.
    if s.len() < 20 || !s.as_bytes()[0].is_ascii_digit() {
        return None;
    }
    DateTime::parse_from_rfc3339(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_eq_numbers_ignore_representation() {
        assert!(strict_eq(&json!(1), &json!(1.0)));
        assert!(strict_eq(&json!(-3), &json!(-3.0)));
        assert!(!strict_eq(&json!(1), &json!(1.5)));
        assert!(!strict_eq(&json!(1), &json!("1")));
    }

    #[test]
    fn test_strict_eq_deep() {
        assert!(strict_eq(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!strict_eq(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!strict_eq(&json!([1, 2]), &json!([2, 1])));
        assert!(strict_eq(&json!(null), &json!(null)));
    }

    #[test]
    fn test_compare_same_kind() {
        assert_eq!(compare(&json!(100), &json!(200.5)), Some(Ordering::Less));
        assert_eq!(compare(&json!("pear"), &json!("apple")), Some(Ordering::Greater));
        assert_eq!(compare(&json!(false), &json!(true)), Some(Ordering::Less));
        assert_eq!(compare(&json!(u64::MAX), &json!(1)), Some(Ordering::Greater));
    }

    #[test]
    fn test_compare_mixed_kinds_unordered() {
        assert_eq!(compare(&json!(1), &json!("1")), None);
        assert_eq!(compare(&json!(null), &json!(1)), None);
        assert_eq!(compare(&json!([1]), &json!([2])), None);
    }

    #[test]
    fn test_compare_timestamps_by_instant() {
        // Lexically "2024-01-01T12:00:00+05:00" > "2024-01-01T08:00:00Z",
        // but as instants 07:00Z < 08:00Z.
        let a = json!("2024-01-01T12:00:00+05:00");
        let b = json!("2024-01-01T08:00:00Z");
        assert_eq!(compare(&a, &b), Some(Ordering::Less));
    }

    #[test]
    fn test_sort_cmp_missing_and_null_first() {
        assert_eq!(sort_cmp(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(sort_cmp(Some(&json!(null)), Some(&json!("a"))), Ordering::Less);
        assert_eq!(sort_cmp(None, Some(&json!(null))), Ordering::Equal);
        assert_eq!(sort_cmp(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
        assert_eq!(sort_cmp(Some(&json!(2)), Some(&json!("1"))), Ordering::Less);
    }
}
