//! The report engine: resolve the window, assemble the working set, roll up.
//!
//! Each operation builds its own working set and rollup values; nothing is
//! cached or persisted between requests. The company report partitions a
//! single working set into per-manager and per-employee slices through the
//! call → employee index, so the team numbers are sums of their members' by
//! construction.

use chrono::NaiveDate;

use crate::correlate::{assemble, WorkingSet};
use crate::date_range::PeriodSelection;
use crate::error::ReportError;
use crate::rollup::{
    compute_rollup, team_of, CallRollup, CompanyOverview, CompanyReport, EmployeeStats,
    ManagerStats,
};
use crate::store::RecordStore;
use crate::types::{Employee, Manager};

pub struct ReportEngine<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> ReportEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rollup for a single employee over the selected period.
    pub fn employee_stats(
        &self,
        employee: &Employee,
        period: &PeriodSelection,
        today: NaiveDate,
    ) -> EmployeeStats {
        let range = period.resolve(today);
        let working_set = assemble(&self.store, &[employee.user_id.clone()], &range);
        employee_stats_from(employee, &working_set)
    }

    /// Rollup for a manager's team over the selected period. `team` is the
    /// manager's employees (active and inactive; inactive members' calls
    /// still count; only the headcount filters on active).
    pub fn manager_stats(
        &self,
        manager: &Manager,
        team: &[Employee],
        period: &PeriodSelection,
        today: NaiveDate,
    ) -> ManagerStats {
        let range = period.resolve(today);
        let user_ids: Vec<String> = team.iter().map(|e| e.user_id.clone()).collect();
        let working_set = assemble(&self.store, &user_ids, &range);
        manager_stats_from(manager, team, &working_set)
    }

    /// Company-wide rollup only (no per-entity rows).
    pub fn company_overview(
        &self,
        company_id: &str,
        period: &PeriodSelection,
        today: NaiveDate,
    ) -> Result<CompanyOverview, ReportError> {
        let report = self.company_report(company_id, "", period, today)?;
        Ok(report.overview)
    }

    /// Full company report: overview plus one row per active manager, each
    /// with nested rows for the manager's active employees. Everything is
    /// partitioned from one working set covering every employee's calls.
    pub fn company_report(
        &self,
        company_id: &str,
        company_name: &str,
        period: &PeriodSelection,
        today: NaiveDate,
    ) -> Result<CompanyReport, ReportError> {
        let managers = self.store.managers(company_id)?;
        let employees = self.store.employees(company_id)?;

        let range = period.resolve(today);
        // Scan calls for every employee, active or not; orphaned call owners
        // simply never match a row below.
        let user_ids: Vec<String> = employees.iter().map(|e| e.user_id.clone()).collect();
        let working_set = assemble(&self.store, &user_ids, &range);

        let active_managers = managers.iter().filter(|m| m.is_active).count();
        let active_employees = employees.iter().filter(|e| e.is_active).count();

        let overview_rollup = rollup_for(&working_set, &user_ids);
        let overview = CompanyOverview {
            total_managers: active_managers,
            total_employees: active_employees,
            rollup: overview_rollup,
            partial_data: !working_set.complete,
        };

        let manager_rows: Vec<ManagerStats> = managers
            .iter()
            .filter(|m| m.is_active)
            .map(|m| manager_stats_from(m, &clone_team(m, &employees), &working_set))
            .collect();

        log::info!(
            "company report: {} managers, {} employees, {} calls in {}..{}{}",
            active_managers,
            active_employees,
            working_set.calls.len(),
            range.start,
            range.end,
            if working_set.complete { "" } else { " (partial)" }
        );

        Ok(CompanyReport {
            company_name: company_name.to_string(),
            period_label: period.label().to_string(),
            range_start: range.start,
            range_end: range.end,
            custom_range: period.is_custom(),
            overview,
            managers: manager_rows,
            partial_data: !working_set.complete,
        })
    }
}

fn clone_team(manager: &Manager, employees: &[Employee]) -> Vec<Employee> {
    team_of(manager, employees).into_iter().cloned().collect()
}

fn rollup_for(working_set: &WorkingSet, user_ids: &[String]) -> CallRollup {
    let calls = working_set.calls_for(user_ids);
    let analyses = working_set.analyses_for(user_ids);
    compute_rollup(&calls, &analyses)
}

/// Slice the working set down to one employee and roll it up.
pub fn employee_stats_from(employee: &Employee, working_set: &WorkingSet) -> EmployeeStats {
    let ids = [employee.user_id.clone()];
    EmployeeStats {
        employee_id: employee.id.clone(),
        user_id: employee.user_id.clone(),
        full_name: employee.full_name.clone(),
        email: employee.email.clone(),
        rollup: rollup_for(working_set, &ids),
        partial_data: !working_set.complete,
    }
}

/// Slice the working set down to one manager's team and roll it up, with
/// nested rows for the active team members.
pub fn manager_stats_from(
    manager: &Manager,
    team: &[Employee],
    working_set: &WorkingSet,
) -> ManagerStats {
    let user_ids: Vec<String> = team.iter().map(|e| e.user_id.clone()).collect();
    let employees: Vec<EmployeeStats> = team
        .iter()
        .filter(|e| e.is_active)
        .map(|e| employee_stats_from(e, working_set))
        .collect();

    ManagerStats {
        manager_id: manager.id.clone(),
        full_name: manager.full_name.clone(),
        email: manager.email.clone(),
        total_employees: team.iter().filter(|e| e.is_active).count(),
        rollup: rollup_for(working_set, &user_ids),
        employees,
        partial_data: !working_set.complete,
    }
}
