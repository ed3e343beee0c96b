//! Daily logout-time backfill.
//!
//! A scheduled job, not part of the report path: for one calendar date, take
//! each employee's last call time and write it as their logout time in the
//! daily-productivity table. One upsert per employee, idempotent: re-running
//! the job for the same date rewrites the same rows.
//!
//! Per-employee write failures are counted, not fatal; the job finishes the
//! remaining employees and reports both tallies.

use chrono::{NaiveDate, Utc};

use crate::date_range::format_date;
use crate::error::ReportError;
use crate::store::SqliteStore;

/// Outcome of one logout-backfill run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LogoutBackfillSummary {
    pub date: String,
    pub updated: usize,
    pub failed: usize,
}

/// Backfill logout times for `date` from the call log.
pub fn update_logout_times(
    store: &SqliteStore,
    date: NaiveDate,
) -> Result<LogoutBackfillSummary, ReportError> {
    let date_str = format_date(date);
    let last_calls = store.last_call_times(&date_str)?;
    log::info!(
        "logout backfill: {} employees with calls on {date_str}",
        last_calls.len()
    );

    let now = Utc::now().to_rfc3339();
    let mut updated = 0;
    let mut failed = 0;

    for (employee_id, last_call_time) in &last_calls {
        match store.upsert_logout_time(employee_id, &date_str, last_call_time, &now) {
            Ok(()) => updated += 1,
            Err(err) => {
                log::warn!("logout backfill: employee {employee_id} failed: {err}");
                failed += 1;
            }
        }
    }

    Ok(LogoutBackfillSummary {
        date: date_str,
        updated,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Call;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn call(id: &str, user: &str, date: &str) -> Call {
        Call {
            id: id.into(),
            employee_id: user.into(),
            call_date: Some(date.into()),
            ..Default::default()
        }
    }

    #[test]
    fn writes_one_row_per_employee_with_calls() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_call(&call("c1", "u1", "2024-03-05T09:00:00Z")).unwrap();
        store.insert_call(&call("c2", "u1", "2024-03-05T17:30:00Z")).unwrap();
        store.insert_call(&call("c3", "u2", "2024-03-05T12:00:00Z")).unwrap();
        store.insert_call(&call("c4", "u3", "2024-03-06T08:00:00Z")).unwrap();

        let summary = update_logout_times(&store, day("2024-03-05")).unwrap();
        assert_eq!(
            summary,
            LogoutBackfillSummary {
                date: "2024-03-05".into(),
                updated: 2,
                failed: 0,
            }
        );

        let logout: String = store
            .conn_ref()
            .query_row(
                "SELECT logout_time FROM employee_daily_productivity
                 WHERE employee_id = 'u1' AND date = '2024-03-05'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(logout, "2024-03-05T17:30:00Z");
    }

    #[test]
    fn rerunning_the_job_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_call(&call("c1", "u1", "2024-03-05T17:30:00Z")).unwrap();

        update_logout_times(&store, day("2024-03-05")).unwrap();
        let second = update_logout_times(&store, day("2024-03-05")).unwrap();
        assert_eq!(second.updated, 1);

        let rows: i64 = store
            .conn_ref()
            .query_row("SELECT COUNT(*) FROM employee_daily_productivity", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn a_date_with_no_calls_updates_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let summary = update_logout_times(&store, day("2024-03-05")).unwrap();
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.failed, 0);
    }
}
