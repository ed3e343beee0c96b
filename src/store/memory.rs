//! Vec-backed record store for tests and seeded fixtures.
//!
//! Mirrors the SQLite store's query semantics (stable ordering, membership
//! filters) and adds per-collection failure switches so partial-result
//! behavior can be exercised deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::{RecordStore, StoreError};
use crate::types::{Analysis, Call, Employee, Manager, Recording};

#[derive(Debug, Default)]
pub struct MemoryStore {
    managers: Vec<Manager>,
    employees: Vec<Employee>,
    calls: Vec<Call>,
    recordings: Vec<Recording>,
    analyses: Vec<Analysis>,
    fail_calls: bool,
    fail_recordings: bool,
    fail_analyses: bool,
    recording_requests: AtomicUsize,
    analysis_requests: AtomicUsize,
}

impl MemoryStore {
    pub fn with_managers(mut self, managers: Vec<Manager>) -> Self {
        self.managers = managers;
        self
    }

    pub fn with_employees(mut self, employees: Vec<Employee>) -> Self {
        self.employees = employees;
        self
    }

    pub fn with_calls(mut self, calls: Vec<Call>) -> Self {
        self.calls = calls;
        self
    }

    pub fn with_recordings(mut self, recordings: Vec<Recording>) -> Self {
        self.recordings = recordings;
        self
    }

    pub fn with_analyses(mut self, analyses: Vec<Analysis>) -> Self {
        self.analyses = analyses;
        self
    }

    /// Make every calls page request fail.
    pub fn failing_calls(mut self) -> Self {
        self.fail_calls = true;
        self
    }

    /// Make every recordings batch request fail.
    pub fn failing_recordings(mut self) -> Self {
        self.fail_recordings = true;
        self
    }

    /// Make every analyses batch request fail.
    pub fn failing_analyses(mut self) -> Self {
        self.fail_analyses = true;
        self
    }

    /// Number of recordings batch requests issued so far.
    pub fn recording_requests(&self) -> usize {
        self.recording_requests.load(Ordering::Relaxed)
    }

    /// Number of analyses batch requests issued so far.
    pub fn analysis_requests(&self) -> usize {
        self.analysis_requests.load(Ordering::Relaxed)
    }

    fn fail(collection: &'static str) -> StoreError {
        StoreError::Query {
            collection,
            message: "injected failure".to_string(),
        }
    }
}

impl RecordStore for MemoryStore {
    fn managers(&self, _company_id: &str) -> Result<Vec<Manager>, StoreError> {
        Ok(self.managers.clone())
    }

    fn employees(&self, _company_id: &str) -> Result<Vec<Employee>, StoreError> {
        Ok(self.employees.clone())
    }

    fn calls_page(
        &self,
        employee_user_ids: &[String],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Call>, StoreError> {
        if self.fail_calls {
            return Err(Self::fail("calls"));
        }
        Ok(self
            .calls
            .iter()
            .filter(|c| employee_user_ids.contains(&c.employee_id))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn recordings_for_calls(&self, call_ids: &[String]) -> Result<Vec<Recording>, StoreError> {
        self.recording_requests.fetch_add(1, Ordering::Relaxed);
        if self.fail_recordings {
            return Err(Self::fail("recordings"));
        }
        Ok(self
            .recordings
            .iter()
            .filter(|r| call_ids.contains(&r.call_id))
            .cloned()
            .collect())
    }

    fn analyses_for_recordings(
        &self,
        recording_ids: &[String],
    ) -> Result<Vec<Analysis>, StoreError> {
        self.analysis_requests.fetch_add(1, Ordering::Relaxed);
        if self.fail_analyses {
            return Err(Self::fail("analyses"));
        }
        Ok(self
            .analyses
            .iter()
            .filter(|a| recording_ids.contains(&a.recording_id))
            .cloned()
            .collect())
    }
}
