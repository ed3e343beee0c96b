//! Crate-level error type.
//!
//! Almost nothing in the rollup path is fatal: page failures degrade to
//! partial data, lookup misses drop rows, and empty denominators produce
//! zeroes. What remains fatal is failing to enumerate the people the report
//! is *about*: without the manager and employee lists there is nothing to
//! scope the rollup to.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
}
