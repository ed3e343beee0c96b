//! Statistics computation over a joined working set.
//!
//! One formula set, three scopes: a single employee, a manager's team, the
//! whole company. Every scope computes the same `CallRollup` from its slice
//! of the calls/analyses; only the slice differs, which is what makes the
//! manager-equals-sum-of-team invariant hold by construction.
//!
//! Threshold semantics, exactly:
//! - relevant call: duration ≥ 30s (irrelevant is the complement)
//! - avg-talk-time eligibility: duration ≥ 45s (total talk time uses all)
//! - completed call: outcome "completed" or "converted"
//! - completed analysis: status case-insensitively "completed"
//! Every rate is count/total × 100 rounded to 1 decimal, and 0 when the
//! denominator is 0; division by zero never escapes this module.

use serde::Serialize;

use crate::types::{Analysis, Call, Employee, Manager};

/// Minimum duration for a call to count as relevant.
pub const RELEVANT_SECONDS: i64 = 30;

/// Minimum duration for a call to enter the average-talk-time denominator.
pub const AVG_ELIGIBLE_SECONDS: i64 = 45;

/// The derived statistics for one scope (employee, team, or company).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallRollup {
    pub total_calls: usize,
    pub completed_calls: usize,
    pub completed_percent: f64,
    pub relevant_calls: usize,
    pub relevant_percent: f64,
    pub irrelevant_calls: usize,
    pub irrelevant_percent: f64,
    pub no_answer_calls: usize,
    pub no_answer_percent: f64,
    pub failed_calls: usize,
    pub failed_percent: f64,
    /// Count of completed analyses attributed to this scope.
    pub analyzed_calls: usize,
    pub analyzed_percent: f64,
    pub success_rate: f64,
    /// "M:SS" over avg-eligible calls only; "0:00" when none qualify.
    pub avg_talk_time: String,
    /// "M:SS" over every call in scope.
    pub total_talk_time: String,
    pub avg_call_quality: f64,
    pub avg_closure_probability: f64,
    pub avg_script_adherence: f64,
    pub avg_compliance_score: f64,
    pub avg_sentiment: f64,
    pub avg_engagement: f64,
    pub avg_confidence: f64,
}

/// Rollup for one employee.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeStats {
    pub employee_id: String,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub rollup: CallRollup,
    /// True when the underlying working set lost a fetch.
    pub partial_data: bool,
}

/// Rollup for one manager's team.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStats {
    pub manager_id: String,
    pub full_name: String,
    pub email: String,
    /// Active team members only.
    pub total_employees: usize,
    pub rollup: CallRollup,
    pub employees: Vec<EmployeeStats>,
    pub partial_data: bool,
}

/// Company-wide rollup plus headcounts.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyOverview {
    /// Active managers only.
    pub total_managers: usize,
    /// Active employees only.
    pub total_employees: usize,
    pub rollup: CallRollup,
    pub partial_data: bool,
}

/// Full company report: one overview plus per-manager (and nested
/// per-employee) rollups partitioned from the same working set.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyReport {
    pub company_name: String,
    pub period_label: String,
    pub range_start: String,
    pub range_end: String,
    pub custom_range: bool,
    pub overview: CompanyOverview,
    pub managers: Vec<ManagerStats>,
    pub partial_data: bool,
}

/// Round to 1 decimal place, matching the report's display precision.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// count / total × 100, 1 decimal, 0 on an empty denominator.
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}

/// Render seconds as "minutes:seconds", seconds zero-padded to two digits.
/// 125 → "2:05". Fractional seconds (from averaging) are floored.
pub fn format_talk_time(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as i64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn mean<F>(analyses: &[&Analysis], field: F) -> f64
where
    F: Fn(&Analysis) -> f64,
{
    if analyses.is_empty() {
        return 0.0;
    }
    let sum: f64 = analyses.iter().map(|a| field(a)).sum();
    round1(sum / analyses.len() as f64)
}

/// Compute the full statistics set for one scope's calls and analyses.
///
/// `analyses` is the scope's attributed set before status filtering; the
/// completed-only restriction happens here so callers can't get it wrong.
pub fn compute_rollup(calls: &[&Call], analyses: &[&Analysis]) -> CallRollup {
    let total_calls = calls.len();
    let completed_calls = calls.iter().filter(|c| c.is_completed()).count();
    let relevant_calls = calls
        .iter()
        .filter(|c| c.duration_seconds >= RELEVANT_SECONDS)
        .count();
    let irrelevant_calls = total_calls - relevant_calls;
    let no_answer_calls = calls.iter().filter(|c| c.is_no_answer()).count();
    let failed_calls = calls.iter().filter(|c| c.is_failed()).count();

    let total_talk_seconds: i64 = calls.iter().map(|c| c.duration_seconds).sum();
    let avg_eligible: Vec<i64> = calls
        .iter()
        .filter(|c| c.duration_seconds >= AVG_ELIGIBLE_SECONDS)
        .map(|c| c.duration_seconds)
        .collect();
    let avg_talk_seconds = if avg_eligible.is_empty() {
        0.0
    } else {
        avg_eligible.iter().sum::<i64>() as f64 / avg_eligible.len() as f64
    };

    let completed: Vec<&Analysis> = analyses
        .iter()
        .filter(|a| a.is_completed())
        .copied()
        .collect();
    let analyzed_calls = completed.len();

    CallRollup {
        total_calls,
        completed_calls,
        completed_percent: percent(completed_calls, total_calls),
        relevant_calls,
        relevant_percent: percent(relevant_calls, total_calls),
        irrelevant_calls,
        irrelevant_percent: percent(irrelevant_calls, total_calls),
        no_answer_calls,
        no_answer_percent: percent(no_answer_calls, total_calls),
        failed_calls,
        failed_percent: percent(failed_calls, total_calls),
        analyzed_calls,
        analyzed_percent: percent(analyzed_calls, total_calls),
        success_rate: percent(completed_calls, total_calls),
        avg_talk_time: format_talk_time(avg_talk_seconds),
        total_talk_time: format_talk_time(total_talk_seconds as f64),
        avg_call_quality: mean(&completed, |a| a.call_quality_score),
        avg_closure_probability: mean(&completed, |a| a.closure_probability),
        avg_script_adherence: mean(&completed, |a| a.script_adherence),
        avg_compliance_score: mean(&completed, |a| a.compliance_score),
        avg_sentiment: mean(&completed, |a| a.sentiment_score),
        avg_engagement: mean(&completed, |a| a.engagement_score),
        avg_confidence: mean(&completed, |a| a.confidence()),
    }
}

/// All members of a manager's team, active or not. Inactive members' calls
/// still belong to the team's numbers; only the headcount filters on active.
pub fn team_of<'a>(manager: &Manager, employees: &'a [Employee]) -> Vec<&'a Employee> {
    employees
        .iter()
        .filter(|e| e.manager_id.as_deref() == Some(manager.id.as_str()))
        .collect()
}
