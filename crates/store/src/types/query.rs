//! Query types.
//!
//! This module defines the query AST evaluated by the [`engine`](crate::engine)
//! and the parser that builds it from the JSON query mini-language:
//!
//! ```text
//! {
//!   "price": {"gte$": 200, "nin$": [250]},   // operator object, ANDed
//!   "name": "pear",                         // literal, strict equality
//!   "or$": [{"name": "cherry"}, {"price": 200}],
//!   "and$": [{...}, {...}],
//!   "sort$": {"price": 1},                   // 1 ascending, -1 descending
//!   "skip$": 1, "limit$": 2,
//!   "fields$": ["name"]
//! }
//! ```
//!
//! A bare string or number is an id shorthand; a list of them is an id-list
//! shorthand; `null` matches everything.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::CONTROL_SUFFIX;
use crate::error::QueryError;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Member of a set.
    In,
    /// Not a member of a set.
    Nin,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Eq => write!(f, "eq$"),
            Operator::Ne => write!(f, "ne$"),
            Operator::Gt => write!(f, "gt$"),
            Operator::Gte => write!(f, "gte$"),
            Operator::Lt => write!(f, "lt$"),
            Operator::Lte => write!(f, "lte$"),
            Operator::In => write!(f, "in$"),
            Operator::Nin => write!(f, "nin$"),
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches(CONTROL_SUFFIX) {
            "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "in" => Ok(Operator::In),
            "nin" => Ok(Operator::Nin),
            _ => Err(format!("unknown operator: {}", s)),
        }
    }
}

/// A single comparison applied to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// Strictly equal.
    Eq(Value),
    /// Strictly not equal.
    Ne(Value),
    /// Greater than.
    Gt(Value),
    /// Greater than or equal.
    Gte(Value),
    /// Less than.
    Lt(Value),
    /// Less than or equal.
    Lte(Value),
    /// Equal to one of the values.
    In(Vec<Value>),
    /// Equal to none of the values.
    Nin(Vec<Value>),
}

impl Comparison {
    /// Returns the operator of this comparison.
    pub fn operator(&self) -> Operator {
        match self {
            Comparison::Eq(_) => Operator::Eq,
            Comparison::Ne(_) => Operator::Ne,
            Comparison::Gt(_) => Operator::Gt,
            Comparison::Gte(_) => Operator::Gte,
            Comparison::Lt(_) => Operator::Lt,
            Comparison::Lte(_) => Operator::Lte,
            Comparison::In(_) => Operator::In,
            Comparison::Nin(_) => Operator::Nin,
        }
    }

    fn parse(field: &str, operator: &str, value: Value) -> Result<Self, QueryError> {
        let op: Operator = operator.parse().map_err(|_| QueryError::UnknownOperator {
            field: field.to_string(),
            operator: operator.to_string(),
        })?;

        let list = |value: Value| match value {
            Value::Array(values) => Ok(values),
            _ => Err(QueryError::ExpectedList {
                field: field.to_string(),
                operator: operator.to_string(),
            }),
        };

        Ok(match op {
            Operator::Eq => Comparison::Eq(value),
            Operator::Ne => Comparison::Ne(value),
            Operator::Gt => Comparison::Gt(value),
            Operator::Gte => Comparison::Gte(value),
            Operator::Lt => Comparison::Lt(value),
            Operator::Lte => Comparison::Lte(value),
            Operator::In => Comparison::In(list(value)?),
            Operator::Nin => Comparison::Nin(list(value)?),
        })
    }
}

/// The filter part of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every comparison must hold on the named field.
    Field {
        /// Field name; `"id"` addresses the record identity.
        name: String,
        /// Comparisons, ANDed together.
        ops: Vec<Comparison>,
    },
    /// All sub-filters must match. An empty list matches everything.
    And(Vec<Filter>),
    /// At least one sub-filter must match.
    Or(Vec<Filter>),
    /// Identity is one of the listed ids.
    Ids(Vec<String>),
}

impl Filter {
    /// A filter that matches every record.
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    /// Field equals value.
    pub fn eq(name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        let value = identity_operand(&name, value);
        Filter::Field {
            name,
            ops: vec![Comparison::Eq(value)],
        }
    }

    /// Field satisfies a single comparison.
    pub fn field(name: impl Into<String>, comparison: Comparison) -> Self {
        Filter::Field {
            name: name.into(),
            ops: vec![comparison],
        }
    }

    /// Returns true if this filter trivially matches every record.
    pub fn is_match_all(&self) -> bool {
        match self {
            Filter::And(filters) => filters.iter().all(Filter::is_match_all),
            Filter::Field { ops, .. } => ops.is_empty(),
            _ => false,
        }
    }

    fn parse_object(obj: Map<String, Value>) -> Result<Self, QueryError> {
        let mut parts = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            match key.as_str() {
                "and$" => parts.push(Filter::And(Self::parse_list(&key, value)?)),
                "or$" => parts.push(Filter::Or(Self::parse_list(&key, value)?)),
                k if k.ends_with(CONTROL_SUFFIX) => {
                    return Err(QueryError::UnknownControl { key });
                }
                _ => parts.push(Self::parse_field(key, value)?),
            }
        }
        Ok(Filter::And(parts))
    }

    fn parse_list(key: &str, value: Value) -> Result<Vec<Filter>, QueryError> {
        let invalid = || QueryError::ExpectedQueryList {
            key: key.to_string(),
        };
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(obj) => Self::parse_object(obj),
                    _ => Err(invalid()),
                })
                .collect(),
            _ => Err(invalid()),
        }
    }

    fn parse_field(name: String, value: Value) -> Result<Self, QueryError> {
        match value {
            Value::Object(obj) if obj.keys().any(|k| k.ends_with(CONTROL_SUFFIX)) => {
                let ops = obj
                    .into_iter()
                    .map(|(op, v)| Comparison::parse(&name, &op, identity_operand(&name, v)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Filter::Field { name, ops })
            }
            literal => Ok(Filter::eq(name, literal)),
        }
    }
}

/// Identities are strings, so numbers compared against `id` are read as
/// their decimal text (list elements included).
fn identity_operand(field: &str, value: Value) -> Value {
    if field != "id" {
        return value;
    }
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Number(n) => Value::String(n.to_string()),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (default).
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

impl SortDirection {
    /// Reads a direction from a `sort$` value: any negative number (or
    /// `"desc"`/`"-1"`) is descending, everything else ascending.
    pub fn from_value(value: &Value) -> Self {
        let descending = match value {
            Value::Number(n) => n.as_f64().is_some_and(|d| d < 0.0),
            Value::String(s) => matches!(s.to_lowercase().as_str(), "desc" | "descending" | "-1"),
            _ => false,
        };
        if descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Field to sort by.
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortKey {
    /// Ascending on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parses `"field"` (ascending) or `"-field"` (descending).
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(s),
        }
    }
}

/// A parsed query: filter plus result shaping.
///
/// # Examples
///
/// ```
/// use entstore::types::{Query, SortKey};
/// use serde_json::json;
///
/// let query = Query::parse(&json!({
///     "price": {"gte$": 200},
///     "sort$": {"price": 1},
///     "skip$": -4,
///     "limit$": "ten",
/// }))
/// .unwrap();
///
/// assert_eq!(query.sort, vec![SortKey::asc("price")]);
/// // Nonsensical pagination is ignored, not rejected.
/// assert_eq!(query.skip, 0);
/// assert_eq!(query.limit, None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Which records match.
    pub filter: Filter,
    /// Sort keys, most significant first.
    pub sort: Vec<SortKey>,
    /// Leading matches to omit.
    pub skip: usize,
    /// Maximum number of records to return after skipping.
    pub limit: Option<usize>,
    /// Fields to keep in each result (identity always kept).
    pub fields: Option<Vec<String>>,
}

impl Default for Query {
    fn default() -> Self {
        Self::all()
    }
}

impl Query {
    /// A query matching every record.
    pub fn all() -> Self {
        Self {
            filter: Filter::all(),
            sort: Vec::new(),
            skip: 0,
            limit: None,
            fields: None,
        }
    }

    /// A query matching one id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::all().with_filter(Filter::Ids(vec![id.into()]))
    }

    /// A query matching any of the given ids.
    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::all().with_filter(Filter::Ids(ids.into_iter().map(Into::into).collect()))
    }

    /// Parses the JSON query mini-language.
    pub fn parse(value: &Value) -> Result<Self, QueryError> {
        match value {
            Value::Null => Ok(Self::all()),
            Value::String(id) => Ok(Self::by_id(id.clone())),
            Value::Number(n) => Ok(Self::by_id(n.to_string())),
            Value::Array(items) => {
                let ids = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.clone()),
                        Value::Number(n) => Ok(n.to_string()),
                        other => Err(QueryError::UnsupportedShape {
                            shape: format!("id list containing {}", other),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::by_ids(ids))
            }
            Value::Object(obj) => Self::parse_object(obj.clone()),
            Value::Bool(b) => Err(QueryError::UnsupportedShape {
                shape: format!("boolean {}", b),
            }),
        }
    }

    fn parse_object(mut obj: Map<String, Value>) -> Result<Self, QueryError> {
        let mut query = Self::all();

        if let Some(sort) = obj.shift_remove("sort$") {
            query.sort = match sort {
                Value::Object(keys) => keys
                    .iter()
                    .map(|(field, dir)| SortKey {
                        field: field.clone(),
                        direction: SortDirection::from_value(dir),
                    })
                    .collect(),
                _ => return Err(QueryError::InvalidSort),
            };
        }

        if let Some(skip) = obj.shift_remove("skip$") {
            query.skip = count_value(&skip).unwrap_or(0);
        }

        if let Some(limit) = obj.shift_remove("limit$") {
            query.limit = count_value(&limit);
        }

        if let Some(fields) = obj.shift_remove("fields$") {
            let names = fields
                .as_array()
                .ok_or(QueryError::InvalidProjection)?
                .iter()
                .map(|f| f.as_str().map(String::from).ok_or(QueryError::InvalidProjection))
                .collect::<Result<Vec<_>, _>>()?;
            query.fields = Some(names);
        }

        query.filter = Filter::parse_object(obj)?;
        Ok(query)
    }

    /// Replaces the filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// ANDs another filter onto the current one.
    pub fn and(mut self, filter: Filter) -> Self {
        self.filter = match self.filter {
            Filter::And(mut parts) => {
                parts.push(filter);
                Filter::And(parts)
            }
            other => Filter::And(vec![other, filter]),
        };
        self
    }

    /// Adds a field equality.
    pub fn where_eq(self, field: impl Into<String>, value: Value) -> Self {
        self.and(Filter::eq(field, value))
    }

    /// Adds a sort key.
    pub fn with_sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    /// Sets the number of leading matches to omit.
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the maximum number of results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the projection.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Reads a non-negative integer count; anything else is `None`.
fn count_value(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                usize::try_from(u).ok()
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as usize)
            }
        }
        _ => None,
    }
}
