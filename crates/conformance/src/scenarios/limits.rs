//! Skip and limit windows, including malformed values.

use serde_json::{Value, json};

use crate::assertions::{CaseResult, ensure_eq, field_strings};
use crate::fixtures::{foo, query, seed_triplet};
use crate::harness::{Case, CaseContext};

pub(super) fn cases() -> Vec<Case> {
    vec![
        case!("seed", seed),
        case!("list all", list_all),
        case!("limit 1 skip 1", limit_1_skip_1),
        case!("limit 2 skip 3", limit_2_skip_3),
        case!("limit 5 skip 2", limit_5_skip_2),
        case!("skip past end", skip_past_end),
        case!("limit 0", limit_zero),
        case!("negative values ignored", negative_values_ignored),
        case!("non-numeric values ignored", non_numeric_values_ignored),
    ]
}

async fn window(cx: &CaseContext, value: Value) -> CaseResult<Vec<String>> {
    let records = cx.store().list(&foo(), &query(value)?).await?;
    Ok(field_strings(&records, "p1"))
}

async fn seed(cx: &CaseContext) -> CaseResult {
    seed_triplet(cx.store(), &foo()).await?;
    Ok(())
}

async fn list_all(cx: &CaseContext) -> CaseResult {
    ensure_eq!(window(cx, json!({})).await?.len(), 3);
    Ok(())
}

async fn limit_1_skip_1(cx: &CaseContext) -> CaseResult {
    let p1 = window(cx, json!({"limit$": 1, "skip$": 1, "sort$": {"p1": 1}})).await?;
    ensure_eq!(p1, vec!["v2"]);
    Ok(())
}

async fn limit_2_skip_3(cx: &CaseContext) -> CaseResult {
    let p1 = window(cx, json!({"limit$": 2, "skip$": 3})).await?;
    ensure_eq!(p1.len(), 0);
    Ok(())
}

async fn limit_5_skip_2(cx: &CaseContext) -> CaseResult {
    let p1 = window(cx, json!({"limit$": 5, "skip$": 2, "sort$": {"p1": 1}})).await?;
    ensure_eq!(p1, vec!["v3"]);
    Ok(())
}

async fn skip_past_end(cx: &CaseContext) -> CaseResult {
    let p1 = window(cx, json!({"skip$": 10})).await?;
    ensure_eq!(p1.len(), 0);
    Ok(())
}

async fn limit_zero(cx: &CaseContext) -> CaseResult {
    let p1 = window(cx, json!({"limit$": 0})).await?;
    ensure_eq!(p1.len(), 0);
    Ok(())
}

async fn negative_values_ignored(cx: &CaseContext) -> CaseResult {
    let p1 = window(cx, json!({"limit$": -1, "skip$": -2, "sort$": {"p1": 1}})).await?;
    ensure_eq!(p1, vec!["v1", "v2", "v3"]);
    Ok(())
}

async fn non_numeric_values_ignored(cx: &CaseContext) -> CaseResult {
    let p1 = window(cx, json!({"limit$": "a", "skip$": "b", "sort$": {"p1": 1}})).await?;
    ensure_eq!(p1, vec!["v1", "v2", "v3"]);
    Ok(())
}
