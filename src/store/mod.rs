//! The record-store seam.
//!
//! The rollup engine is read-only over four query capabilities: equality
//! filter (managers/employees by company), membership filter (recordings by
//! call-id set, analyses by recording-id set), and offset/limit paging
//! (calls by employee-id set). `RecordStore` expresses exactly those; the
//! engine never sees a connection handle, so a future store that can filter
//! calls by date server-side only has to change the SQLite implementation.
//!
//! Note the store does *not* filter calls by date. Record dates are a mix of
//! bare dates and timestamps compared by string prefix, which the store
//! cannot index; the correlation layer filters client-side after the scan.

use thiserror::Error;

use crate::types::{Analysis, Call, Employee, Manager, Recording};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors from the backing record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("{collection} query failed: {message}")]
    Query {
        collection: &'static str,
        message: String,
    },
}

/// Read-only access to the five collections the report engine consumes.
///
/// Implementations must be safe to call repeatedly within one report request;
/// the engine issues several independent fetches and concatenates.
pub trait RecordStore {
    /// All managers for a company (equality filter, active and inactive).
    fn managers(&self, company_id: &str) -> Result<Vec<Manager>, StoreError>;

    /// All employees for a company (equality filter, active and inactive).
    fn employees(&self, company_id: &str) -> Result<Vec<Employee>, StoreError>;

    /// One page of calls whose `employee_id` is in `employee_user_ids`.
    /// Ordering must be stable across pages within one request.
    fn calls_page(
        &self,
        employee_user_ids: &[String],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Call>, StoreError>;

    /// All recordings whose `call_id` is in `call_ids` (one id batch).
    fn recordings_for_calls(&self, call_ids: &[String]) -> Result<Vec<Recording>, StoreError>;

    /// All analyses whose `recording_id` is in `recording_ids` (one id batch).
    fn analyses_for_recordings(
        &self,
        recording_ids: &[String],
    ) -> Result<Vec<Analysis>, StoreError>;
}
