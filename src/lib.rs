//! Performance rollups from call-center activity.
//!
//! Three related record sets (calls, their recordings, and AI quality
//! analyses of those recordings) live in a page-capped record store. This
//! crate picks a reporting window, drains the relevant records in bounded
//! batches, joins them across three foreign-key hops, and computes a fixed
//! statistics set at employee, manager, and company granularity, optionally
//! rendered as CSV.
//!
//! Rollups are pure derived values: recomputed per request, never persisted.
//! Fetch failures degrade to partial data (flagged, never silent); lookup
//! misses and empty denominators degrade to zeroes. The only fatal path is
//! failing to enumerate the rosters a report is scoped to.

pub mod correlate;
pub mod date_range;
mod error;
pub mod export;
pub mod fetch;
pub mod productivity;
pub mod report;
pub mod rollup;
pub mod store;
pub mod types;

pub use date_range::{DateFilter, DateRange, PeriodSelection};
pub use error::ReportError;
pub use report::ReportEngine;
pub use rollup::{CallRollup, CompanyOverview, CompanyReport, EmployeeStats, ManagerStats};
pub use store::{MemoryStore, RecordStore, SqliteStore, StoreError};
