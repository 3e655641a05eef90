//! Filter evaluation.

use std::cmp::Ordering;

use serde_json::Value;

use super::compare::{compare, strict_eq};
use crate::types::{Comparison, Filter, Record};

/// Returns true if the record satisfies the filter.
///
/// A field absent from the record never satisfies a comparison, `ne$` and
/// `nin$` included. A field present with `null` is an ordinary value for the
/// equality operators and unordered for the others.
///
/// # Examples
///
/// ```
/// use entstore::engine::matches;
/// use entstore::types::{Collection, Query, Record};
/// use serde_json::json;
///
/// let mut pear = Record::new(Collection::new("product"), "p2");
/// pear.set("name", json!("pear"));
/// pear.set("price", json!(200));
///
/// let query = Query::parse(&json!({"price": {"gte$": 200, "lt$": 300}})).unwrap();
/// assert!(matches(&pear, &query.filter));
///
/// let query = Query::parse(&json!({"color": {"ne$": "red"}})).unwrap();
/// assert!(!matches(&pear, &query.filter));
/// ```
pub fn matches(record: &Record, filter: &Filter) -> bool {
    match filter {
        Filter::And(filters) => filters.iter().all(|f| matches(record, f)),
        Filter::Or(filters) => filters.iter().any(|f| matches(record, f)),
        Filter::Ids(ids) => ids.iter().any(|id| id == record.id()),
        Filter::Field { name, ops } => match record.lookup(name) {
            Some(value) => ops.iter().all(|op| holds(&value, op)),
            None => false,
        },
    }
}

/// Returns true if a present value satisfies one comparison.
pub fn holds(value: &Value, comparison: &Comparison) -> bool {
    match comparison {
        Comparison::Eq(expected) => strict_eq(value, expected),
        Comparison::Ne(expected) => !strict_eq(value, expected),
        Comparison::Gt(bound) => compare(value, bound) == Some(Ordering::Greater),
        Comparison::Gte(bound) => matches!(
            compare(value, bound),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Comparison::Lt(bound) => compare(value, bound) == Some(Ordering::Less),
        Comparison::Lte(bound) => {
            matches!(compare(value, bound), Some(Ordering::Less | Ordering::Equal))
        }
        Comparison::In(set) => set.iter().any(|v| strict_eq(value, v)),
        Comparison::Nin(set) => !set.iter().any(|v| strict_eq(value, v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Collection, Query};
    use serde_json::json;

    fn product(id: &str, name: &str, price: i64) -> Record {
        let mut record = Record::new(Collection::new("product"), id);
        record.set("name", json!(name));
        record.set("price", json!(price));
        record
    }

    fn products() -> Vec<Record> {
        vec![
            product("a", "apple", 100),
            product("p", "pear", 200),
            product("c", "cherry", 300),
        ]
    }

    fn select(query: serde_json::Value) -> Vec<String> {
        let query = Query::parse(&query).unwrap();
        products()
            .iter()
            .filter(|r| matches(r, &query.filter))
            .map(|r| r.get("name").unwrap().as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_empty_query_matches_all() {
        assert_eq!(select(json!({})), vec!["apple", "pear", "cherry"]);
        assert_eq!(select(json!(null)).len(), 3);
    }

    #[test]
    fn test_ordering_operators() {
        assert_eq!(select(json!({"price": {"gte$": 200}})), vec!["pear", "cherry"]);
        assert_eq!(select(json!({"price": {"gt$": 200}})), vec!["cherry"]);
        assert_eq!(select(json!({"price": {"lte$": 200}})), vec!["apple", "pear"]);
        assert_eq!(select(json!({"price": {"lt$": 200}})), vec!["apple"]);
        assert_eq!(select(json!({"name": {"gt$": "banana"}})), vec!["pear", "cherry"]);
    }

    #[test]
    fn test_equality_operators() {
        assert_eq!(select(json!({"price": {"eq$": 200}})), vec!["pear"]);
        assert_eq!(select(json!({"price": {"ne$": 200}})), vec!["apple", "cherry"]);
        assert_eq!(select(json!({"price": 200.0})), vec!["pear"]);
        assert_eq!(select(json!({"name": {"ne$": "pear"}})), vec!["apple", "cherry"]);
    }

    #[test]
    fn test_membership_operators() {
        assert_eq!(
            select(json!({"name": {"in$": ["cherry", "apple"]}})),
            vec!["apple", "cherry"]
        );
        assert_eq!(select(json!({"price": {"nin$": [100, 300]}})), vec!["pear"]);
        assert_eq!(
            select(json!({"price": {"in$": [100, 200], "nin$": [200, 300]}})),
            vec!["apple"]
        );
        assert!(select(json!({"price": {"in$": []}})).is_empty());
    }

    #[test]
    fn test_logical_groups() {
        assert_eq!(
            select(json!({"or$": [{"name": "cherry"}, {"price": 100}]})),
            vec!["apple", "cherry"]
        );
        assert_eq!(
            select(json!({"and$": [{"price": {"gte$": 200}}, {"price": {"lte$": 200}}]})),
            vec!["pear"]
        );
        assert_eq!(
            select(json!({
                "or$": [
                    {"and$": [{"name": "pear"}, {"price": 200}]},
                    {"name": "apple"},
                ],
                "price": {"lt$": 300},
            })),
            vec!["apple", "pear"]
        );
    }

    #[test]
    fn test_or_is_associative() {
        let flat = select(json!({"or$": [{"name": "apple"}, {"name": "pear"}, {"name": "cherry"}]}));
        let nested = select(json!({
            "or$": [{"or$": [{"name": "apple"}, {"name": "pear"}]}, {"name": "cherry"}]
        }));
        assert_eq!(flat, nested);
    }

    #[test]
    fn test_id_field_and_shorthand() {
        assert_eq!(select(json!("p")), vec!["pear"]);
        assert_eq!(select(json!(["a", "c"])), vec!["apple", "cherry"]);
        assert_eq!(select(json!({"id": "c"})), vec!["cherry"]);
        assert_eq!(select(json!({"id": {"in$": ["a", "p"]}})), vec!["apple", "pear"]);
    }

    #[test]
    fn test_numeric_id_literal_matches_like_shorthand() {
        let record = Record::new(Collection::new("foo"), "5");
        let check = |q: serde_json::Value| matches(&record, &Query::parse(&q).unwrap().filter);

        assert!(check(json!(5)));
        assert!(check(json!({"id": 5})));
        assert!(check(json!({"id": {"in$": [4, 5]}})));
        assert!(!check(json!({"id": {"nin$": [5]}})));
        assert!(!check(json!({"id": 6})));
    }

    #[test]
    fn test_missing_field_never_matches() {
        assert!(select(json!({"color": {"ne$": "red"}})).is_empty());
        assert!(select(json!({"color": {"nin$": ["red"]}})).is_empty());
        assert!(select(json!({"color": null})).is_empty());
    }

    #[test]
    fn test_null_field_semantics() {
        let mut record = Record::new(Collection::new("foo"), "x");
        record.set("p1", json!(null));
        let check = |q: serde_json::Value| matches(&record, &Query::parse(&q).unwrap().filter);

        assert!(check(json!({"p1": null})));
        assert!(check(json!({"p1": {"in$": [null, 1]}})));
        assert!(check(json!({"p1": {"ne$": "v1"}})));
        assert!(check(json!({"p1": {"nin$": ["v1"]}})));
        assert!(!check(json!({"p1": {"ne$": null}})));
        assert!(!check(json!({"p1": {"lt$": 1}})));
        assert!(!check(json!({"p1": {"gte$": null}})));
    }

    #[test]
    fn test_mixed_kinds_do_not_order() {
        assert!(select(json!({"price": {"gt$": "100"}})).is_empty());
        assert!(select(json!({"name": {"lt$": 5}})).is_empty());
    }

    #[test]
    fn test_deep_literal_equality() {
        let mut record = Record::new(Collection::new("bar"), "b");
        record.set("obj", json!({"a": 1, "b": [2, 3]}));
        let filter = Query::parse(&json!({"obj": {"b": [2, 3], "a": 1.0}}))
            .unwrap()
            .filter;
        assert!(matches(&record, &filter));
    }
}
