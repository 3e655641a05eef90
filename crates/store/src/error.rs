//! Error types for the entity store.
//!
//! Errors are grouped by where they originate: query parsing, record state,
//! input validation and the storage backend itself. Adapter failures surface
//! exactly once as a [`BackendError`]; nothing in this crate retries.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all store operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Query parsing errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Record state errors
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Input validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors raised while turning a JSON query into a [`Query`](crate::types::Query).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// An operator key such as `foo$` that is not one of the known comparisons.
    #[error("unknown operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },

    /// A `$`-suffixed key at query level that is not a known control key.
    #[error("unknown control key '{key}'")]
    UnknownControl { key: String },

    /// `in$`/`nin$` given something other than a list.
    #[error("operator '{operator}' on field '{field}' expects a list")]
    ExpectedList { field: String, operator: String },

    /// `and$`/`or$` given something other than a list of objects.
    #[error("'{key}' expects a list of query objects")]
    ExpectedQueryList { key: String },

    /// `sort$` given something other than a field-to-direction mapping.
    #[error("'sort$' expects a mapping of field to direction")]
    InvalidSort,

    /// `fields$` given something other than a list of field names.
    #[error("'fields$' expects a list of field names")]
    InvalidProjection,

    /// Top-level query value of an unsupported shape.
    #[error("unsupported query shape: {shape}")]
    UnsupportedShape { shape: String },
}

/// Errors related to record state.
#[derive(Error, Debug)]
pub enum RecordError {
    /// A record with the given id already exists in the collection.
    #[error("record already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    /// Stored data could not be decoded into a record.
    #[error("corrupt record {collection}/{id}: {message}")]
    Corrupt {
        collection: String,
        id: String,
        message: String,
    },
}

/// Errors related to caller input.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Entity data was not a JSON object.
    #[error("entity data must be a JSON object, got {kind}")]
    NotAnObject { kind: String },

    /// The collection name was empty.
    #[error("collection name must not be empty")]
    EmptyCollectionName,

    /// A directive carried a value of the wrong shape.
    #[error("invalid directive '{directive}': {message}")]
    InvalidDirective { directive: String, message: String },

    /// An identity value that is not a string or number.
    #[error("invalid id value: {value}")]
    InvalidId { value: String },
}

/// Errors originating from the storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// The requested capability is not supported by this backend.
    #[error("capability '{capability}' not supported by {backend_name}")]
    UnsupportedCapability {
        backend_name: String,
        capability: String,
    },

    /// A uniqueness or integrity constraint was violated.
    #[error("constraint violation in {backend_name}: {message}")]
    ConstraintViolation {
        backend_name: String,
        message: String,
    },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Native query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, message) = &err {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                return StorageError::Backend(BackendError::ConstraintViolation {
                    backend_name: "sqlite".to_string(),
                    message: message.clone().unwrap_or_else(|| code.to_string()),
                });
            }
        }
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_display() {
        let err = StorageError::Record(RecordError::AlreadyExists {
            collection: "-/-/foo".to_string(),
            id: "123".to_string(),
        });
        assert_eq!(err.to_string(), "record already exists: -/-/foo/123");
    }

    #[test]
    fn test_query_error_display() {
        let err = QueryError::UnknownOperator {
            field: "price".to_string(),
            operator: "like$".to_string(),
        };
        assert_eq!(err.to_string(), "unknown operator 'like$' on field 'price'");
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::UnsupportedCapability {
            backend_name: "memory".to_string(),
            capability: "native-query".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "capability 'native-query' not supported by memory"
        );
    }

    #[test]
    fn test_storage_error_from_query_error() {
        let storage_err: StorageError = QueryError::InvalidSort.into();
        assert!(matches!(storage_err, StorageError::Query(_)));
    }

    #[test]
    fn test_storage_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let storage_err: StorageError = err.into();
        assert!(matches!(
            storage_err,
            StorageError::Backend(BackendError::SerializationError { .. })
        ));
    }
}
