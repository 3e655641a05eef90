//! EntityStore implementation for the SQLite adapter.
//!
//! Records live as JSON text in `entities.data`. Filtering, sorting and
//! projection run through the shared engine over the collection's rows in
//! `seq` order, so SQLite answers every query exactly like the memory
//! adapter. Saves and removes run inside a `BEGIN IMMEDIATE` transaction,
//! which makes match+write atomic across pooled connections.

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, TransactionBehavior, params};
use serde_json::{Map, Number, Value};

use crate::core::{BackendCapability, BackendKind, EntityStore};
use crate::engine::{self, SaveAction};
use crate::error::{BackendError, RecordError, StorageError, StorageResult};
use crate::types::{
    Collection, Entity, NativeQuery, Query, Record, RemoveOptions, RemoveOutcome, SaveOptions,
};

use super::SqliteStore;

#[async_trait]
impl EntityStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn capabilities(&self) -> Vec<BackendCapability> {
        vec![
            BackendCapability::Crud,
            BackendCapability::Upsert,
            BackendCapability::Sorting,
            BackendCapability::Pagination,
            BackendCapability::Projection,
            BackendCapability::NativeQuery,
            BackendCapability::AtomicUpsert,
        ]
    }

    async fn save(&self, entity: Entity, options: &SaveOptions) -> StorageResult<Record> {
        let collection = entity.collection().clone();
        collection.validate()?;

        let mut conn = self.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let records = fetch_collection(&tx, &collection)?;
        let action = engine::plan_save(records.iter(), &entity, options);
        let data = serde_json::to_string(action.fields())?;

        match &action {
            SaveAction::Insert { id, .. } => {
                tx.execute(
                    "INSERT INTO entities (zone, base, name, id, seq, data)
                     VALUES (?1, ?2, ?3, ?4, (SELECT COALESCE(MAX(seq), 0) + 1 FROM entities), ?5)",
                    params![
                        collection.zone_key(),
                        collection.base_key(),
                        collection.name(),
                        id,
                        data
                    ],
                )?;
            }
            SaveAction::Update { id, .. } => {
                tx.execute(
                    "UPDATE entities SET data = ?1
                     WHERE zone = ?2 AND base = ?3 AND name = ?4 AND id = ?5",
                    params![
                        data,
                        collection.zone_key(),
                        collection.base_key(),
                        collection.name(),
                        id
                    ],
                )?;
            }
        }

        tx.commit()?;

        let inserted = action.is_insert();
        let (id, fields) = action.into_parts();

        tracing::debug!(collection = %collection, id = %id, inserted, "Saved record");

        Ok(Record::from_parts(collection, id, fields))
    }

    async fn load(&self, collection: &Collection, query: &Query) -> StorageResult<Option<Record>> {
        let conn = self.get_connection()?;
        let records = fetch_collection(&conn, collection)?;
        Ok(engine::first(&records, query))
    }

    async fn list(&self, collection: &Collection, query: &Query) -> StorageResult<Vec<Record>> {
        let conn = self.get_connection()?;
        let records = fetch_collection(&conn, collection)?;
        let selected = engine::select(&records, query);

        tracing::debug!(collection = %collection, count = selected.len(), "Listed records");
        Ok(selected)
    }

    async fn remove(
        &self,
        collection: &Collection,
        query: &Query,
        options: &RemoveOptions,
    ) -> StorageResult<RemoveOutcome> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let records = fetch_collection(&tx, collection)?;
        let mut doomed = engine::select(&records, query);
        if !options.all {
            doomed.truncate(1);
        }

        for record in &doomed {
            tx.execute(
                "DELETE FROM entities WHERE zone = ?1 AND base = ?2 AND name = ?3 AND id = ?4",
                params![
                    collection.zone_key(),
                    collection.base_key(),
                    collection.name(),
                    record.id()
                ],
            )?;
        }

        tx.commit()?;

        tracing::debug!(collection = %collection, removed = doomed.len(), "Removed records");

        let removed = doomed.len();
        let record = if options.load {
            doomed.into_iter().next()
        } else {
            None
        };
        Ok(RemoveOutcome { removed, record })
    }

    async fn native(
        &self,
        collection: &Collection,
        query: &NativeQuery,
    ) -> StorageResult<Vec<Record>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&query.statement).map_err(query_failed)?;

        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let params: Vec<SqlValue> = query.params.iter().map(to_sql_value).collect();

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(query_failed)?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(query_failed)? {
            let mut id = None;
            let mut fields = Map::new();

            for (index, column) in columns.iter().enumerate() {
                let value = from_sql_value(row.get_ref(index)?);
                match column.as_str() {
                    "id" => id = Some(id_text(&value)),
                    "data" => match &value {
                        Value::String(text) => match serde_json::from_str(text) {
                            Ok(Value::Object(data)) => fields.extend(data),
                            _ => {
                                fields.insert(column.clone(), value);
                            }
                        },
                        _ => {
                            fields.insert(column.clone(), value);
                        }
                    },
                    _ => {
                        fields.insert(column.clone(), value);
                    }
                }
            }

            let Some(id) = id else {
                return Err(StorageError::Backend(BackendError::QueryError {
                    message: "native query rows must include an 'id' column".to_string(),
                }));
            };
            records.push(Record::from_parts(collection.clone(), id, fields));
        }

        tracing::debug!(
            collection = %collection,
            count = records.len(),
            "Executed native query"
        );

        Ok(records)
    }

    async fn count(&self, collection: &Collection) -> StorageResult<u64> {
        let conn = self.get_connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entities WHERE zone = ?1 AND base = ?2 AND name = ?3",
            params![
                collection.zone_key(),
                collection.base_key(),
                collection.name()
            ],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    async fn clear(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        let removed = conn.execute("DELETE FROM entities", [])?;
        tracing::debug!(removed, "Cleared store");
        Ok(())
    }
}

/// Loads a collection's records in insertion order.
fn fetch_collection(conn: &Connection, collection: &Collection) -> StorageResult<Vec<Record>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, data FROM entities
         WHERE zone = ?1 AND base = ?2 AND name = ?3
         ORDER BY seq",
    )?;

    let rows = stmt.query_map(
        params![
            collection.zone_key(),
            collection.base_key(),
            collection.name()
        ],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    )?;

    let mut records = Vec::new();
    for row in rows {
        let (id, data) = row?;
        let fields = match serde_json::from_str::<Value>(&data) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                return Err(corrupt(collection, &id, "stored data is not a JSON object"));
            }
            Err(e) => return Err(corrupt(collection, &id, &e.to_string())),
        };
        records.push(Record::from_parts(collection.clone(), id, fields));
    }
    Ok(records)
}

fn corrupt(collection: &Collection, id: &str, message: &str) -> StorageError {
    StorageError::Record(RecordError::Corrupt {
        collection: collection.to_string(),
        id: id.to_string(),
        message: message.to_string(),
    })
}

fn query_failed(err: rusqlite::Error) -> StorageError {
    StorageError::Backend(BackendError::QueryError {
        message: err.to_string(),
    })
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product() -> Collection {
        Collection::new("product")
    }

    async fn seeded() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        for (name, price) in [("apple", 100), ("pear", 200), ("cherry", 300)] {
            store
                .save(
                    Entity::new(product())
                        .with_field("name", json!(name))
                        .with_field("price", json!(price)),
                    &SaveOptions::default(),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = seeded().await;
        let names: Vec<Value> = store
            .list(&product(), &Query::all())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.get("name").cloned().unwrap())
            .collect();
        assert_eq!(names, vec![json!("apple"), json!("pear"), json!("cherry")]);
    }

    #[tokio::test]
    async fn test_native_sql_with_params() {
        let store = seeded().await;
        let records = store
            .native(
                &product(),
                &NativeQuery::sql(
                    "SELECT id, data FROM entities
                     WHERE name = 'product' AND json_extract(data, '$.price') >= ?1
                     ORDER BY seq",
                )
                .with_params(vec![json!(200)]),
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&json!("pear")));
        assert_eq!(records[1].get("price"), Some(&json!(300)));
    }

    #[tokio::test]
    async fn test_native_extra_columns_become_fields() {
        let store = seeded().await;
        let records = store
            .native(
                &product(),
                &NativeQuery::sql(
                    "SELECT id, json_extract(data, '$.name') AS label FROM entities
                     WHERE json_extract(data, '$.name') = ?1",
                )
                .with_params(vec![json!("apple")]),
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("label"), Some(&json!("apple")));
        assert!(!records[0].has("price"));
    }

    #[tokio::test]
    async fn test_native_requires_id_column() {
        let store = seeded().await;
        let err = store
            .native(&product(), &NativeQuery::sql("SELECT data FROM entities"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::QueryError { .. })
        ));
    }

    #[tokio::test]
    async fn test_native_bad_sql_is_query_error() {
        let store = seeded().await;
        let err = store
            .native(&product(), &NativeQuery::sql("SELEKT nothing"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::QueryError { .. })
        ));
    }

    #[tokio::test]
    async fn test_collections_keyed_by_zone_and_base() {
        let store = SqliteStore::in_memory().unwrap();
        let plain = Collection::new("bar");
        let scoped = Collection::new("bar").with_base("moon").with_zone("zen");

        store
            .save(Entity::new(plain.clone()), &SaveOptions::default())
            .await
            .unwrap();
        store
            .save(Entity::new(scoped.clone()), &SaveOptions::default())
            .await
            .unwrap();

        assert_eq!(store.count(&plain).await.unwrap(), 1);
        assert_eq!(store.count(&scoped).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_row_reported() {
        let store = SqliteStore::in_memory().unwrap();
        {
            let conn = store.get_connection().unwrap();
            conn.execute(
                "INSERT INTO entities (zone, base, name, id, seq, data)
                 VALUES ('-', '-', 'foo', 'x', 1, '[1,2]')",
                [],
            )
            .unwrap();
        }
        let err = store
            .list(&Collection::new("foo"), &Query::all())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Record(RecordError::Corrupt { .. })));
    }
}
