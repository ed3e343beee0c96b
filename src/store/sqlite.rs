//! SQLite-backed record store.
//!
//! The schema mirrors the upstream collections (`call_history`,
//! `recordings`, `analyses`, plus the manager/employee rosters and the
//! daily-productivity table the logout job writes). Score columns are left
//! dynamically typed on purpose (upstream writers have stored numbers,
//! numeric strings, and NULLs) and every read coerces through the same
//! number-or-parse-or-zero rule the deserializers use.

use std::path::{Path, PathBuf};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, Row};

use super::{RecordStore, StoreError};
use crate::types::{Analysis, Call, Employee, Manager, Recording};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS managers (
    id          TEXT PRIMARY KEY,
    company_id  TEXT NOT NULL,
    user_id     TEXT NOT NULL,
    full_name   TEXT NOT NULL DEFAULT '',
    email       TEXT NOT NULL DEFAULT '',
    is_active   INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS employees (
    id          TEXT PRIMARY KEY,
    company_id  TEXT NOT NULL,
    user_id     TEXT NOT NULL,
    full_name   TEXT NOT NULL DEFAULT '',
    email       TEXT NOT NULL DEFAULT '',
    manager_id  TEXT,
    is_active   INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS call_history (
    id               TEXT PRIMARY KEY,
    employee_id      TEXT NOT NULL,
    call_date        TEXT,
    created_at       TEXT,
    duration_seconds,
    outcome          TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_call_history_employee ON call_history(employee_id);
CREATE TABLE IF NOT EXISTS recordings (
    id       TEXT PRIMARY KEY,
    call_id  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_recordings_call ON recordings(call_id);
CREATE TABLE IF NOT EXISTS analyses (
    id                          TEXT PRIMARY KEY,
    recording_id                TEXT NOT NULL,
    status                      TEXT NOT NULL DEFAULT '',
    call_quality_score,
    closure_probability,
    script_adherence,
    compliance_score,
    sentiment_score,
    engagement_score,
    confidence_score_executive,
    confidence_score_person
);
CREATE INDEX IF NOT EXISTS idx_analyses_recording ON analyses(recording_id);
CREATE TABLE IF NOT EXISTS employee_daily_productivity (
    employee_id  TEXT NOT NULL,
    date         TEXT NOT NULL,
    logout_time  TEXT,
    updated_at   TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (employee_id, date)
);
";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path` and apply the schema.
    pub fn open_at<P: Into<PathBuf>>(path: P) -> Result<Self, StoreError> {
        let path: PathBuf = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;
        // WAL for concurrent readers while a batch job writes.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    // =========================================================================
    // Writes (seeding, sync jobs)
    // =========================================================================

    pub fn upsert_manager(&self, company_id: &str, m: &Manager) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO managers (id, company_id, user_id, full_name, email, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                user_id = excluded.user_id,
                full_name = excluded.full_name,
                email = excluded.email,
                is_active = excluded.is_active",
            params![m.id, company_id, m.user_id, m.full_name, m.email, m.is_active as i32],
        )?;
        Ok(())
    }

    pub fn upsert_employee(&self, company_id: &str, e: &Employee) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO employees (id, company_id, user_id, full_name, email, manager_id, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                user_id = excluded.user_id,
                full_name = excluded.full_name,
                email = excluded.email,
                manager_id = excluded.manager_id,
                is_active = excluded.is_active",
            params![
                e.id,
                company_id,
                e.user_id,
                e.full_name,
                e.email,
                e.manager_id,
                e.is_active as i32
            ],
        )?;
        Ok(())
    }

    pub fn insert_call(&self, c: &Call) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO call_history
                (id, employee_id, call_date, created_at, duration_seconds, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![c.id, c.employee_id, c.call_date, c.created_at, c.duration_seconds, c.outcome],
        )?;
        Ok(())
    }

    pub fn insert_recording(&self, r: &Recording) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO recordings (id, call_id) VALUES (?1, ?2)",
            params![r.id, r.call_id],
        )?;
        Ok(())
    }

    pub fn insert_analysis(&self, a: &Analysis) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO analyses
                (id, recording_id, status, call_quality_score, closure_probability,
                 script_adherence, compliance_score, sentiment_score, engagement_score,
                 confidence_score_executive, confidence_score_person)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                a.id,
                a.recording_id,
                a.status,
                a.call_quality_score,
                a.closure_probability,
                a.script_adherence,
                a.compliance_score,
                a.sentiment_score,
                a.engagement_score,
                a.confidence_score_executive,
                a.confidence_score_person
            ],
        )?;
        Ok(())
    }

    // =========================================================================
    // Productivity (logout batch job)
    // =========================================================================

    /// Latest call time per employee for one calendar date, by the same
    /// 10-char date-prefix rule the report filter uses.
    pub fn last_call_times(&self, date: &str) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id, MAX(COALESCE(call_date, created_at)) AS last_call
             FROM call_history
             WHERE substr(COALESCE(call_date, created_at), 1, 10) = ?1
             GROUP BY employee_id
             ORDER BY employee_id",
        )?;
        let rows = stmt
            .query_map(params![date], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Write one employee's logout time for a date. Idempotent: re-running
    /// the job overwrites the same row with the same values.
    pub fn upsert_logout_time(
        &self,
        employee_id: &str,
        date: &str,
        logout_time: &str,
        updated_at: &str,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO employee_daily_productivity (employee_id, date, logout_time, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(employee_id, date) DO UPDATE SET
                logout_time = excluded.logout_time,
                updated_at = excluded.updated_at",
            params![employee_id, date, logout_time, updated_at],
        )?;
        Ok(())
    }

    // =========================================================================
    // Row mapping
    // =========================================================================

    fn map_manager(row: &Row<'_>) -> rusqlite::Result<Manager> {
        Ok(Manager {
            id: row.get(0)?,
            user_id: row.get(1)?,
            full_name: row.get(2)?,
            email: row.get(3)?,
            is_active: row.get::<_, i64>(4)? != 0,
        })
    }

    fn map_employee(row: &Row<'_>) -> rusqlite::Result<Employee> {
        Ok(Employee {
            id: row.get(0)?,
            user_id: row.get(1)?,
            full_name: row.get(2)?,
            email: row.get(3)?,
            manager_id: row.get(4)?,
            is_active: row.get::<_, i64>(5)? != 0,
        })
    }

    fn map_call(row: &Row<'_>) -> rusqlite::Result<Call> {
        Ok(Call {
            id: row.get(0)?,
            employee_id: row.get(1)?,
            call_date: row.get(2)?,
            created_at: row.get(3)?,
            duration_seconds: loose_f64(row, 4) as i64,
            outcome: row.get(5)?,
        })
    }

    fn map_analysis(row: &Row<'_>) -> rusqlite::Result<Analysis> {
        Ok(Analysis {
            id: row.get(0)?,
            recording_id: row.get(1)?,
            call_id: String::new(),
            status: row.get(2)?,
            call_quality_score: loose_f64(row, 3),
            closure_probability: loose_f64(row, 4),
            script_adherence: loose_f64(row, 5),
            compliance_score: loose_f64(row, 6),
            sentiment_score: loose_f64(row, 7),
            engagement_score: loose_f64(row, 8),
            confidence_score_executive: loose_f64(row, 9),
            confidence_score_person: loose_f64(row, 10),
        })
    }
}

/// Read a dynamically typed score column: REAL and INTEGER pass through,
/// TEXT parses, NULL and garbage become 0.
fn loose_f64(row: &Row<'_>, idx: usize) -> f64 {
    match row.get::<_, SqlValue>(idx) {
        Ok(SqlValue::Real(v)) => v,
        Ok(SqlValue::Integer(v)) => v as f64,
        Ok(SqlValue::Text(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// "?,?,?" for an IN-list of `count` ids.
fn placeholders(count: usize) -> String {
    let mut s = String::with_capacity(count * 2);
    for i in 0..count {
        if i > 0 {
            s.push(',');
        }
        s.push('?');
    }
    s
}

fn id_params(ids: &[String]) -> Vec<&dyn rusqlite::ToSql> {
    ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect()
}

impl RecordStore for SqliteStore {
    fn managers(&self, company_id: &str) -> Result<Vec<Manager>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, full_name, email, is_active
             FROM managers WHERE company_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![company_id], Self::map_manager)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn employees(&self, company_id: &str) -> Result<Vec<Employee>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, full_name, email, manager_id, is_active
             FROM employees WHERE company_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![company_id], Self::map_employee)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn calls_page(
        &self,
        employee_user_ids: &[String],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Call>, StoreError> {
        if employee_user_ids.is_empty() {
            return Ok(Vec::new());
        }
        // ORDER BY id keeps pages stable across the scan.
        let sql = format!(
            "SELECT id, employee_id, call_date, created_at, duration_seconds, outcome
             FROM call_history WHERE employee_id IN ({})
             ORDER BY id LIMIT {limit} OFFSET {offset}",
            placeholders(employee_user_ids.len()),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(&id_params(employee_user_ids)[..], Self::map_call)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn recordings_for_calls(&self, call_ids: &[String]) -> Result<Vec<Recording>, StoreError> {
        if call_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, call_id FROM recordings WHERE call_id IN ({})",
            placeholders(call_ids.len()),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(&id_params(call_ids)[..], |row| {
                Ok(Recording {
                    id: row.get(0)?,
                    call_id: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn analyses_for_recordings(
        &self,
        recording_ids: &[String],
    ) -> Result<Vec<Analysis>, StoreError> {
        if recording_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, recording_id, status, call_quality_score, closure_probability,
                    script_adherence, compliance_score, sentiment_score, engagement_score,
                    confidence_score_executive, confidence_score_person
             FROM analyses WHERE recording_id IN ({})",
            placeholders(recording_ids.len()),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(&id_params(recording_ids)[..], Self::map_analysis)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

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

    #[test]
    fn roster_queries_scope_by_company() {
        let s = store();
        s.upsert_manager(
            "co-1",
            &Manager {
                id: "m1".into(),
                is_active: true,
                ..Default::default()
            },
        )
        .unwrap();
        s.upsert_manager("co-2", &Manager { id: "m2".into(), ..Default::default() })
            .unwrap();

        let managers = s.managers("co-1").unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0].id, "m1");
        assert!(managers[0].is_active);
    }

    #[test]
    fn calls_page_filters_and_pages_stably() {
        let s = store();
        for i in 0..7 {
            s.insert_call(&call(&format!("c{i}"), "u1", "2024-03-01")).unwrap();
        }
        s.insert_call(&call("x1", "u2", "2024-03-01")).unwrap();

        let ids = vec!["u1".to_string()];
        let first = s.calls_page(&ids, 0, 5).unwrap();
        let second = s.calls_page(&ids, 5, 5).unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 2);

        let mut seen: Vec<String> = first.iter().chain(&second).map(|c| c.id.clone()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn membership_queries_return_only_matching_ids() {
        let s = store();
        s.insert_recording(&Recording { id: "r1".into(), call_id: "c1".into() })
            .unwrap();
        s.insert_recording(&Recording { id: "r2".into(), call_id: "c2".into() })
            .unwrap();

        let found = s.recordings_for_calls(&["c2".to_string()]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "r2");
    }

    #[test]
    fn loosely_typed_score_columns_coerce_to_zero_or_parse() {
        let s = store();
        // Simulate an upstream writer that stored text scores and a NULL.
        s.conn_ref()
            .execute(
                "INSERT INTO analyses (id, recording_id, status, call_quality_score,
                                       closure_probability, script_adherence)
                 VALUES ('a1', 'r1', 'completed', '72.5', 'garbage', NULL)",
                [],
            )
            .unwrap();

        let found = s.analyses_for_recordings(&["r1".to_string()]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].call_quality_score, 72.5);
        assert_eq!(found[0].closure_probability, 0.0);
        assert_eq!(found[0].script_adherence, 0.0);
        assert!(found[0].is_completed());
    }

    #[test]
    fn last_call_times_use_the_date_prefix_rule() {
        let s = store();
        s.insert_call(&call("c1", "u1", "2024-03-05T09:00:00Z")).unwrap();
        s.insert_call(&call("c2", "u1", "2024-03-05T17:30:00Z")).unwrap();
        s.insert_call(&call("c3", "u2", "2024-03-05T12:00:00Z")).unwrap();
        s.insert_call(&call("c4", "u1", "2024-03-06T08:00:00Z")).unwrap();

        let times = s.last_call_times("2024-03-05").unwrap();
        assert_eq!(
            times,
            vec![
                ("u1".to_string(), "2024-03-05T17:30:00Z".to_string()),
                ("u2".to_string(), "2024-03-05T12:00:00Z".to_string()),
            ]
        );
    }

    #[test]
    fn logout_upsert_is_idempotent() {
        let s = store();
        s.upsert_logout_time("u1", "2024-03-05", "17:30", "t1").unwrap();
        s.upsert_logout_time("u1", "2024-03-05", "17:45", "t2").unwrap();

        let (logout, count): (String, i64) = s
            .conn_ref()
            .query_row(
                "SELECT logout_time, (SELECT COUNT(*) FROM employee_daily_productivity)
                 FROM employee_daily_productivity WHERE employee_id = 'u1' AND date = '2024-03-05'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(logout, "17:45");
        assert_eq!(count, 1);
    }

    #[test]
    fn opens_on_disk_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.db");
        {
            let s = SqliteStore::open_at(&path).unwrap();
            s.insert_call(&call("c1", "u1", "2024-03-01")).unwrap();
        }
        let s = SqliteStore::open_at(&path).unwrap();
        let calls = s.calls_page(&["u1".to_string()], 0, 10).unwrap();
        assert_eq!(calls.len(), 1);
    }
}
