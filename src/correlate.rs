//! Assembly of the joined working set for one report request.
//!
//! Three hops: calls for an employee-id set (paged scan, then client-side
//! date filtering), recordings for those calls, analyses for those
//! recordings. Each analysis is back-filled with its recording's call id so
//! the aggregator can walk analysis → call → employee without touching the
//! store again.
//!
//! Lookup misses are dropped, never errored: a call whose employee id
//! matches nobody, a recording whose call is outside the range, an analysis
//! whose recording was never fetched, all silently fall out of the join.

use std::collections::HashMap;

use crate::date_range::DateRange;
use crate::fetch::{fetch_id_batched, fetch_paged, CALL_PAGE_SIZE, ID_BATCH_SIZE};
use crate::store::RecordStore;
use crate::types::{Analysis, Call};

/// The joined inputs for one report request. Pure derived state, built per
/// request, dropped when the report is done.
#[derive(Debug, Clone)]
pub struct WorkingSet {
    /// Calls within the date range, for the requested employees.
    pub calls: Vec<Call>,
    /// Analyses for those calls, each carrying its resolved `call_id`.
    pub analyses: Vec<Analysis>,
    /// call id → employee user_id, from the date-filtered calls.
    pub call_to_employee: HashMap<String, String>,
    /// False when any fetch phase returned partial data.
    pub complete: bool,
}

impl WorkingSet {
    pub fn empty() -> Self {
        Self {
            calls: Vec::new(),
            analyses: Vec::new(),
            call_to_employee: HashMap::new(),
            complete: true,
        }
    }

    /// Calls belonging to any of the given employee user_ids.
    pub fn calls_for<'a>(&'a self, user_ids: &[String]) -> Vec<&'a Call> {
        self.calls
            .iter()
            .filter(|c| !c.employee_id.is_empty() && user_ids.contains(&c.employee_id))
            .collect()
    }

    /// Analyses attributable (via their call) to any of the given employee
    /// user_ids. Analyses whose call resolved to no employee are excluded.
    pub fn analyses_for<'a>(&'a self, user_ids: &[String]) -> Vec<&'a Analysis> {
        self.analyses
            .iter()
            .filter(|a| {
                self.call_to_employee
                    .get(&a.call_id)
                    .is_some_and(|owner| user_ids.contains(owner))
            })
            .collect()
    }
}

/// Fetch and join everything the aggregator needs for `employee_user_ids`
/// within `range`.
///
/// The store cannot filter by the date-prefix rule, so calls are scanned for
/// the whole id set and filtered here. When the filtered set is empty the
/// recording and analysis fetches are skipped outright: no vacuous
/// empty-id-list requests.
pub fn assemble<S: RecordStore>(
    store: &S,
    employee_user_ids: &[String],
    range: &DateRange,
) -> WorkingSet {
    let fetched_calls = fetch_paged("calls", CALL_PAGE_SIZE, |offset, limit| {
        store.calls_page(employee_user_ids, offset, limit)
    });
    let scanned = fetched_calls.records.len();
    let mut complete = fetched_calls.complete;

    let calls: Vec<Call> = fetched_calls
        .records
        .into_iter()
        .filter(|call| call.raw_date().is_some_and(|d| range.contains(d)))
        .collect();

    log::debug!(
        "correlation: {scanned} calls scanned, {} in range {}..{}",
        calls.len(),
        range.start,
        range.end
    );

    if calls.is_empty() {
        return WorkingSet {
            calls,
            analyses: Vec::new(),
            call_to_employee: HashMap::new(),
            complete,
        };
    }

    let call_ids: Vec<String> = calls.iter().map(|c| c.id.clone()).collect();
    let recordings = fetch_id_batched("recordings", &call_ids, ID_BATCH_SIZE, |batch| {
        store.recordings_for_calls(batch)
    });
    complete &= recordings.complete;

    let recording_to_call: HashMap<String, String> = recordings
        .records
        .iter()
        .map(|r| (r.id.clone(), r.call_id.clone()))
        .collect();
    let recording_ids: Vec<String> = recordings.records.iter().map(|r| r.id.clone()).collect();

    let mut analyses: Vec<Analysis> = Vec::new();
    if !recording_ids.is_empty() {
        let fetched = fetch_id_batched("analyses", &recording_ids, ID_BATCH_SIZE, |batch| {
            store.analyses_for_recordings(batch)
        });
        complete &= fetched.complete;
        analyses = fetched.records;
    }

    // Back-fill each analysis with its owning recording's call id. Unknown
    // recordings leave the call id empty; those analyses match no employee.
    for analysis in &mut analyses {
        if let Some(call_id) = recording_to_call.get(&analysis.recording_id) {
            analysis.call_id = call_id.clone();
        }
    }

    let call_to_employee: HashMap<String, String> = calls
        .iter()
        .map(|c| (c.id.clone(), c.employee_id.clone()))
        .collect();

    log::info!(
        "correlation complete: {} calls, {} recordings, {} analyses{}",
        calls.len(),
        recording_ids.len(),
        analyses.len(),
        if complete { "" } else { " (partial)" }
    );

    WorkingSet {
        calls,
        analyses,
        call_to_employee,
        complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{Call, Recording};

    fn call(id: &str, user: &str, date: &str) -> Call {
        Call {
            id: id.into(),
            employee_id: user.into(),
            call_date: Some(date.into()),
            duration_seconds: 60,
            outcome: "completed".into(),
            ..Default::default()
        }
    }

    fn recording(id: &str, call_id: &str) -> Recording {
        Recording {
            id: id.into(),
            call_id: call_id.into(),
        }
    }

    fn analysis(id: &str, recording_id: &str) -> Analysis {
        Analysis {
            id: id.into(),
            recording_id: recording_id.into(),
            status: "completed".into(),
            ..Default::default()
        }
    }

    // RUST_LOG=debug surfaces the per-phase fetch counts when a test fails.
    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn range(start: &str, end: &str) -> DateRange {
        init_logging();
        DateRange::new(start.into(), end.into())
    }

    fn user_ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn joins_across_three_hops() {
        let store = MemoryStore::default()
            .with_calls(vec![
                call("c1", "u1", "2024-03-10"),
                call("c2", "u2", "2024-03-12T15:30:00Z"),
                call("c3", "u1", "2024-04-01"), // out of range
            ])
            .with_recordings(vec![recording("r1", "c1"), recording("r2", "c2")])
            .with_analyses(vec![analysis("a1", "r1"), analysis("a2", "r2")]);

        let ws = assemble(&store, &user_ids(&["u1", "u2"]), &range("2024-03-01", "2024-03-31"));

        assert!(ws.complete);
        assert_eq!(ws.calls.len(), 2);
        assert_eq!(ws.analyses.len(), 2);
        assert_eq!(ws.call_to_employee.get("c1").map(String::as_str), Some("u1"));

        let a1 = ws.analyses.iter().find(|a| a.id == "a1").unwrap();
        assert_eq!(a1.call_id, "c1");

        assert_eq!(ws.calls_for(&user_ids(&["u1"])).len(), 1);
        assert_eq!(ws.analyses_for(&user_ids(&["u1"])).len(), 1);
    }

    #[test]
    fn zero_calls_skips_downstream_fetches() {
        let store = MemoryStore::default()
            .with_calls(vec![call("c1", "u1", "2023-01-01")])
            .with_recordings(vec![recording("r1", "c1")])
            .with_analyses(vec![analysis("a1", "r1")]);

        let ws = assemble(&store, &user_ids(&["u1"]), &range("2024-03-01", "2024-03-31"));

        assert!(ws.complete);
        assert!(ws.calls.is_empty());
        assert!(ws.analyses.is_empty());
        assert_eq!(store.recording_requests(), 0);
        assert_eq!(store.analysis_requests(), 0);
    }

    #[test]
    fn analysis_with_unknown_recording_matches_no_employee() {
        let store = MemoryStore::default()
            .with_calls(vec![call("c1", "u1", "2024-03-10")])
            .with_recordings(vec![recording("r1", "c1")])
            .with_analyses(vec![analysis("a1", "r1"), analysis("a2", "r-ghost")]);

        let ws = assemble(&store, &user_ids(&["u1"]), &range("2024-03-01", "2024-03-31"));

        // a2 is fetched only if its recording id was seen; r-ghost never was,
        // so only a1 comes back and attributes to u1.
        assert_eq!(ws.analyses_for(&user_ids(&["u1"])).len(), 1);
    }

    #[test]
    fn calls_without_any_date_are_dropped() {
        let mut dateless = call("c1", "u1", "2024-03-10");
        dateless.call_date = None;
        dateless.created_at = None;
        let store = MemoryStore::default().with_calls(vec![dateless]);

        let ws = assemble(&store, &user_ids(&["u1"]), &range("2024-03-01", "2024-03-31"));
        assert!(ws.calls.is_empty());
    }

    #[test]
    fn failed_call_fetch_yields_incomplete_empty_set() {
        let store = MemoryStore::default()
            .with_calls(vec![call("c1", "u1", "2024-03-10")])
            .failing_calls();

        let ws = assemble(&store, &user_ids(&["u1"]), &range("2024-03-01", "2024-03-31"));
        assert!(!ws.complete);
        assert!(ws.calls.is_empty());
    }

    #[test]
    fn failed_analysis_fetch_keeps_calls_and_flags_partial() {
        let store = MemoryStore::default()
            .with_calls(vec![call("c1", "u1", "2024-03-10")])
            .with_recordings(vec![recording("r1", "c1")])
            .with_analyses(vec![analysis("a1", "r1")])
            .failing_analyses();

        let ws = assemble(&store, &user_ids(&["u1"]), &range("2024-03-01", "2024-03-31"));
        assert!(!ws.complete);
        assert_eq!(ws.calls.len(), 1);
        assert!(ws.analyses.is_empty());
    }
}
