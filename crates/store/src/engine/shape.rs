//! Result shaping: sort, skip, limit and projection.

use std::cmp::Ordering;

use serde_json::Value;

use super::compare::sort_cmp;
use super::filter::matches;
use crate::types::{Query, Record, SortDirection, SortKey};

/// Sorts, paginates and projects already-filtered records.
///
/// The sort is stable, so ties keep their incoming (insertion) order.
pub fn shape(mut records: Vec<Record>, query: &Query) -> Vec<Record> {
    sort_records(&mut records, &query.sort);

    let limit = query.limit.unwrap_or(usize::MAX);
    records
        .into_iter()
        .skip(query.skip)
        .take(limit)
        .map(|record| match &query.fields {
            Some(fields) => record.project(fields),
            None => record,
        })
        .collect()
}

/// Filters then shapes records in collection order.
pub fn select<'a, I>(records: I, query: &Query) -> Vec<Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let matched = records
        .into_iter()
        .filter(|record| matches(record, &query.filter))
        .cloned()
        .collect();
    shape(matched, query)
}

/// The record `load` returns: same filter, sort and skip as [`select`], at
/// most one result.
pub fn first<'a, I>(records: I, query: &Query) -> Option<Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let query = Query {
        limit: Some(1),
        ..query.clone()
    };
    select(records, &query).into_iter().next()
}

/// Stable multi-key sort.
///
/// Each record's sort values are looked up once, not on every comparison.
pub fn sort_records(records: &mut [Record], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    records.sort_by_cached_key(|record| SortRow {
        values: keys.iter().map(|key| record.lookup(&key.field)).collect(),
        keys,
    });
}

/// A record's values for each sort key, ordered by those keys.
struct SortRow<'k> {
    values: Vec<Option<Value>>,
    keys: &'k [SortKey],
}

impl Ord for SortRow<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.values
            .iter()
            .zip(&other.values)
            .zip(self.keys)
            .map(|((a, b), key)| {
                let ordering = sort_cmp(a.as_ref(), b.as_ref());
                match key.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for SortRow<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortRow<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortRow<'_> {}
