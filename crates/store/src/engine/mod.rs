//! The matching and result-shaping engine.
//!
//! Everything here is a pure function over owned data. Adapters hold the
//! state and the locks; the engine decides which records match a query, how
//! the results are ordered, windowed and projected, and what a save writes.
//!
//! ```text
//! records ──► filter::matches ──► shape::shape ──► Vec<Record>
//!                                   (sort, skip, limit, fields)
//!
//! entity ──► upsert::upsert_criteria ──► find_upsert_target ──► mutation::plan_save ──► SaveAction
//! ```
//!
//! An adapter backed by a query language may push work down to its native
//! engine, as long as the results are identical to what these functions
//! produce.

mod compare;
mod filter;
mod mutation;
mod shape;
mod upsert;

pub use compare::{compare, sort_cmp, strict_eq};
pub use filter::{holds, matches};
pub use mutation::{SaveAction, insert_id, plan_save, resolve_insert, resolve_update};
pub use shape::{first, select, shape, sort_records};
pub use upsert::{UpsertCriteria, find_upsert_target, upsert_criteria};
