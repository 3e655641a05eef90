//! Concurrent upserts with identical criteria converge on one record.

use std::collections::HashSet;

use serde_json::json;

use entstore::types::{Entity, SaveOptions};

use crate::assertions::{CaseResult, ensure_eq, fail};
use crate::fixtures::user;
use crate::harness::{Case, CaseContext};

const WRITERS: usize = 10;

pub(super) fn cases() -> Vec<Case> {
    vec![case!("parallel upserts collapse", parallel_upserts_collapse)]
}

async fn parallel_upserts_collapse(cx: &CaseContext) -> CaseResult {
    let handles: Vec<_> = (0..WRITERS)
        .map(|attempt| {
            let store = cx.shared_store();
            tokio::spawn(async move {
                let entity = Entity::new(user())
                    .with_field("email", json!("race@example.com"))
                    .with_field("attempt", json!(attempt));
                let options = SaveOptions::upsert(["email"]);
                store.save(entity, &options).await
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let saved = handle
            .await
            .map_err(|err| fail(format!("upsert task failed: {}", err)))??;
        ids.insert(saved.id().to_string());
    }

    ensure_eq!(ids.len(), 1, "distinct ids returned");
    ensure_eq!(cx.store().count(&user()).await?, 1, "records in collection");
    Ok(())
}
