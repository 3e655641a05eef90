//! Adapter-native query passthrough.

use serde_json::json;

use entstore::types::{Entity, NativeQuery, SaveOptions};

use crate::assertions::{CaseResult, expect_list_pattern, expect_some};
use crate::fixtures::{PRODUCTS, product};
use crate::harness::{Case, CaseContext, SuiteSettings};

const EXPECTED: &str =
    "$-/-/product:{id=*;name=apple;price=100},$-/-/product:{id=*;name=pear;price=200}";

pub(super) fn cases(settings: &SuiteSettings) -> Vec<Case> {
    let cases = vec![
        case!("seed", seed),
        case!("statement", statement),
        case!("parameterized statement", parameterized_statement),
    ];

    if settings.native.is_some() {
        cases
    } else {
        cases
            .into_iter()
            .map(|case| case.skip("no native statements configured"))
            .collect()
    }
}

async fn seed(cx: &CaseContext) -> CaseResult {
    for (name, price) in &PRODUCTS[..2] {
        let entity = Entity::new(product())
            .with_field("name", json!(name))
            .with_field("price", json!(price));
        cx.store().save(entity, &SaveOptions::default()).await?;
    }
    Ok(())
}

fn statements(cx: &CaseContext) -> CaseResult<(NativeQuery, NativeQuery)> {
    let native = expect_some(cx.settings().native.as_ref(), "native statements")?;
    Ok((native.ordered.clone(), native.ranged.clone()))
}

async fn statement(cx: &CaseContext) -> CaseResult {
    let (ordered, _) = statements(cx)?;
    let records = cx.store().native(&product(), &ordered).await?;
    expect_list_pattern(&records, EXPECTED)
}

async fn parameterized_statement(cx: &CaseContext) -> CaseResult {
    let (_, ranged) = statements(cx)?;
    let records = cx.store().native(&product(), &ranged).await?;
    expect_list_pattern(&records, EXPECTED)
}
