//! Comparison operators and logical combinators over apple, pear and cherry
//! priced 100, 200 and 300.

use serde_json::{Value, json};

use entstore::core::BackendCapability;
use entstore::types::Query;

use crate::assertions::{CaseResult, ensure, ensure_eq, expect_some, field_strings};
use crate::fixtures::{product, query, seed_products};
use crate::harness::{Case, CaseContext};

pub(super) fn cases() -> Vec<Case> {
    let mut cases = vec![case!("seed", seed)];

    cases.extend([
        names("empty query", json!({}), &["apple", "pear", "cherry"]),
        names("literal equality", json!({"name": "pear"}), &["pear"]),
        names("eq", json!({"price": {"eq$": 200}}), &["pear"]),
        names("ne", json!({"price": {"ne$": 200}}), &["apple", "cherry"]),
        names("gt", json!({"price": {"gt$": 200}}), &["cherry"]),
        names("gte", json!({"price": {"gte$": 200}}), &["pear", "cherry"]),
        names("lt", json!({"price": {"lt$": 200}}), &["apple"]),
        names("lte", json!({"price": {"lte$": 200}}), &["apple", "pear"]),
        names("range", json!({"price": {"gt$": 100, "lt$": 300}}), &["pear"]),
        names("string gt", json!({"name": {"gt$": "banana"}}), &["pear", "cherry"]),
        names("in", json!({"price": {"in$": [200, 500, 700]}}), &["pear"]),
        names("in without match", json!({"price": {"in$": [250, 500, 700]}}), &[]),
        names(
            "nin without match",
            json!({"price": {"nin$": [250, 500, 700]}}),
            &["apple", "pear", "cherry"],
        ),
        names("nin", json!({"price": {"nin$": [200, 500, 300]}}), &["apple"]),
        names(
            "nin and in",
            json!({"price": {"nin$": [250, 500, 300], "in$": [200, 300]}}),
            &["pear"],
        ),
        names("nin strings", json!({"name": {"nin$": ["cherry", "pear"]}}), &["apple"]),
        names(
            "or",
            json!({"or$": [{"name": "cherry"}, {"price": 200}]}),
            &["pear", "cherry"],
        ),
        names(
            "and",
            json!({"and$": [{"name": "cherry"}, {"price": 300}]}),
            &["cherry"],
        ),
        names(
            "or with nested and",
            json!({"or$": [{"price": {"gte$": 200}}, {"and$": [{"name": "cherry"}, {"price": 300}]}]}),
            &["pear", "cherry"],
        ),
        names(
            "nested or flattens",
            json!({"or$": [{"or$": [{"name": "apple"}, {"name": "pear"}]}, {"name": "cherry"}]}),
            &["apple", "pear", "cherry"],
        ),
        names(
            "fields and with or",
            json!({"price": {"gte$": 200}, "or$": [{"name": "apple"}, {"name": "cherry"}]}),
            &["cherry"],
        ),
        names("unknown field", json!({"colour": "red"}), &[]),
        names("unknown field ne", json!({"colour": {"ne$": "red"}}), &[]),
        names(
            "sort ascending",
            json!({"sort$": {"price": 1}}),
            &["apple", "pear", "cherry"],
        ),
        names(
            "sort descending",
            json!({"sort$": {"price": -1}}),
            &["cherry", "pear", "apple"],
        ),
    ]);

    cases.extend([
        case!("id list", id_list),
        case!("or with limit and fields", or_with_limit_and_fields)
            .requires(&[BackendCapability::Pagination, BackendCapability::Projection]),
        case!("skip with fields and id", skip_with_fields_and_id).requires(&[
            BackendCapability::Sorting,
            BackendCapability::Pagination,
            BackendCapability::Projection,
        ]),
        case!("load applies sort and skip", load_applies_sort_and_skip)
            .requires(&[BackendCapability::Sorting, BackendCapability::Pagination]),
        case!("load without match", load_without_match),
    ]);

    cases
}

/// A case listing products for a JSON query and comparing names in order.
fn names(name: &'static str, value: Value, expected: &'static [&'static str]) -> Case {
    Case::new(name, move |cx| {
        let value = value.clone();
        Box::pin(async move {
            let records = cx.store().list(&product(), &query(value)?).await?;
            ensure_eq!(field_strings(&records, "name"), expected.to_vec(), "names");
            Ok(())
        })
    })
}

async fn seed(cx: &CaseContext) -> CaseResult {
    let saved = seed_products(cx.store()).await?;
    for record in saved {
        let name = expect_some(record.get("name").and_then(Value::as_str), "a product name")?.to_string();
        cx.remember(&name, record);
    }
    Ok(())
}

async fn id_list(cx: &CaseContext) -> CaseResult {
    let apple = cx.recall("apple")?;
    let cherry = cx.recall("cherry")?;

    let records = cx
        .store()
        .list(&product(), &Query::by_ids([cherry.id(), apple.id()]))
        .await?;
    ensure_eq!(field_strings(&records, "name"), vec!["apple", "cherry"]);

    let single = cx.store().list(&product(), &Query::by_id(apple.id())).await?;
    ensure_eq!(field_strings(&single, "name"), vec!["apple"]);
    Ok(())
}

async fn or_with_limit_and_fields(cx: &CaseContext) -> CaseResult {
    let q = query(json!({
        "or$": [{"price": {"gte$": 200}}, {"and$": [{"name": "cherry"}, {"price": 300}]}],
        "limit$": 1,
        "fields$": ["name"],
    }))?;
    let records = cx.store().list(&product(), &q).await?;

    ensure_eq!(field_strings(&records, "name"), vec!["pear"]);
    ensure!(
        records[0].get("price").is_none(),
        "projection kept price: {}",
        records[0]
    );
    Ok(())
}

async fn skip_with_fields_and_id(cx: &CaseContext) -> CaseResult {
    let q = query(json!({
        "price": {"gte$": 200},
        "sort$": {"price": 1},
        "limit$": 1,
        "fields$": ["name", "id"],
        "skip$": 1,
    }))?;
    let records = cx.store().list(&product(), &q).await?;

    ensure_eq!(field_strings(&records, "name"), vec!["cherry"]);
    ensure_eq!(records[0].id(), cx.recall("cherry")?.id(), "id");
    ensure!(
        records[0].get("price").is_none(),
        "projection kept price: {}",
        records[0]
    );
    Ok(())
}

async fn load_applies_sort_and_skip(cx: &CaseContext) -> CaseResult {
    let top = cx
        .store()
        .load(&product(), &query(json!({"sort$": {"price": -1}}))?)
        .await?;
    let top = expect_some(top, "the most expensive product")?;
    ensure_eq!(top.get("name"), Some(&json!("cherry")), "first by price desc");

    let second = cx
        .store()
        .load(&product(), &query(json!({"sort$": {"price": 1}, "skip$": 1}))?)
        .await?;
    let second = expect_some(second, "the second cheapest product")?;
    ensure_eq!(second.get("name"), Some(&json!("pear")), "second by price asc");
    Ok(())
}

async fn load_without_match(cx: &CaseContext) -> CaseResult {
    let loaded = cx
        .store()
        .load(&product(), &query(json!({"price": {"gt$": 1000}}))?)
        .await?;
    ensure!(loaded.is_none(), "expected nothing, got {:?}", loaded);
    Ok(())
}
