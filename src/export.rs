//! CSV rendering of computed reports.
//!
//! Pure formatting over already-computed rollups: a header block (title,
//! period label, explicit range for custom windows), an overview key/value
//! section, and one table row per manager or employee in a fixed column
//! order.
//!
//! Known limitation: fields are joined with bare commas and never quoted.
//! Names and emails are comma-free in practice; a field containing a comma
//! would shift columns. Flagged rather than fixed to keep the output
//! byte-compatible with the reports users already archive.

use chrono::NaiveDate;

use crate::date_range::{format_date, PeriodSelection};
use crate::rollup::{CallRollup, CompanyReport, ManagerStats};

fn push_header(
    out: &mut String,
    title: &str,
    period_label: &str,
    custom_range: Option<(&str, &str)>,
    generated_on: NaiveDate,
) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&format!("Period: {period_label}\n"));
    match custom_range {
        Some((start, end)) => out.push_str(&format!("Date Range: {start} to {end}\n\n")),
        None => out.push_str(&format!("Date: {}\n\n", format_date(generated_on))),
    }
}

/// Serialize the full company report: overview block plus the manager table.
pub fn company_report_csv(report: &CompanyReport, generated_on: NaiveDate) -> String {
    let mut out = String::new();
    push_header(
        &mut out,
        &format!("Company Report - {}", report.company_name),
        &report.period_label,
        report
            .custom_range
            .then_some((report.range_start.as_str(), report.range_end.as_str())),
        generated_on,
    );

    out.push_str("Company Overview\n");
    out.push_str(&format!("Total Managers,{}\n", report.overview.total_managers));
    out.push_str(&format!("Total Employees,{}\n", report.overview.total_employees));
    out.push_str(&format!("Total Calls,{}\n", report.overview.rollup.total_calls));
    out.push_str(&format!("Success Rate,{:.1}%\n\n", report.overview.rollup.success_rate));

    out.push_str("Manager Performance\n");
    out.push_str(
        "Manager Name,Email,Employees,Total Calls,Completed,Total Relevant,Total Irrelevant,\
         Total Analyzed,Avg Talk Time,Total Talk Time,Avg Call Quality,Avg Script Adherence\n",
    );
    for m in &report.managers {
        let r = &m.rollup;
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{:.1},{:.1}\n",
            m.full_name,
            m.email,
            m.total_employees,
            r.total_calls,
            r.completed_calls,
            r.relevant_calls,
            r.irrelevant_calls,
            r.analyzed_calls,
            r.avg_talk_time,
            r.total_talk_time,
            r.avg_call_quality,
            r.avg_script_adherence,
        ));
    }

    out
}

/// Serialize one manager's team report: team overview plus the employee
/// table with the quality-score columns.
pub fn team_report_csv(
    stats: &ManagerStats,
    period: &PeriodSelection,
    generated_on: NaiveDate,
) -> String {
    let range = period.resolve(generated_on);
    let mut out = String::new();
    push_header(
        &mut out,
        "Manager Report - Team Performance",
        period.label(),
        period
            .is_custom()
            .then_some((range.start.as_str(), range.end.as_str())),
        generated_on,
    );

    out.push_str("Team Overview\n");
    out.push_str(&format!("Total Employees,{}\n", stats.total_employees));
    out.push_str(&format!("Total Calls,{}\n", stats.rollup.total_calls));
    out.push_str(&format!("Success Rate,{:.1}%\n\n", stats.rollup.success_rate));

    out.push_str("Employee Performance\n");
    out.push_str(
        "Employee Name,Email,Total Calls,Completed,Total Relevant,Total Irrelevant,\
         Total Analyzed,Avg Talk Time,Total Talk Time,Avg Call Quality,\
         Avg Closure Probability,Avg Script Adherence,Avg Compliance Score\n",
    );
    for e in &stats.employees {
        let r: &CallRollup = &e.rollup;
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{:.1},{:.1},{:.1},{:.1}\n",
            e.full_name,
            e.email,
            r.total_calls,
            r.completed_calls,
            r.relevant_calls,
            r.irrelevant_calls,
            r.analyzed_calls,
            r.avg_talk_time,
            r.total_talk_time,
            r.avg_call_quality,
            r.avg_closure_probability,
            r.avg_script_adherence,
            r.avg_compliance_score,
        ));
    }

    out
}
