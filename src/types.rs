//! Value types for the three record sets and their owners.
//!
//! The backing store returns loosely-shaped rows: numeric fields arrive as
//! numbers, numeric strings, or not at all depending on which integration
//! wrote the row. Each entity is a strict struct with declared defaults:
//! missing or unparseable numerics resolve to 0, missing strings to empty.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Coerce a JSON value to f64: numbers pass through, numeric strings parse,
/// everything else (null, missing, garbage) becomes 0.
fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn lenient_f64<'de, D>(de: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(coerce_f64(&value))
}

fn lenient_seconds<'de, D>(de: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(coerce_f64(&value) as i64)
}

/// An employee record. `user_id` is the join key the call log uses, not `id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// A manager record. Owns zero-or-more employees via `Employee::manager_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manager {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_active: bool,
}

/// A row from the call log.
///
/// `employee_id` holds the employee's *user_id* (telephony integration quirk,
/// preserved as-is). `call_date` is preferred for range filtering; rows
/// written before the column existed fall back to `created_at`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub call_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub duration_seconds: i64,
    #[serde(default)]
    pub outcome: String,
}

impl Call {
    /// The raw date string used for range filtering: `call_date`, else
    /// `created_at`, else `None` (the call is dropped from every range).
    pub fn raw_date(&self) -> Option<&str> {
        self.call_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.created_at.as_deref().filter(|s| !s.is_empty()))
    }

    /// A call counts as completed when the outcome is a connect or a convert.
    pub fn is_completed(&self) -> bool {
        self.outcome == "completed" || self.outcome == "converted"
    }

    pub fn is_no_answer(&self) -> bool {
        self.outcome == "no-answer"
    }

    /// The telephony provider emits both spellings; both count.
    pub fn is_failed(&self) -> bool {
        self.outcome == "failed" || self.outcome == "Failed"
    }
}

/// A recording of one call. At most one per call in this model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    pub id: String,
    #[serde(default)]
    pub call_id: String,
}

/// An AI quality analysis of one recording.
///
/// `call_id` is not stored on the row; the correlation layer back-fills it
/// from the owning recording so downstream code can attribute the analysis
/// to an employee without another lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub id: String,
    #[serde(default)]
    pub recording_id: String,
    #[serde(default)]
    pub call_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub call_quality_score: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub closure_probability: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub script_adherence: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub compliance_score: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sentiment_score: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub engagement_score: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence_score_executive: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence_score_person: f64,
}

impl Analysis {
    /// Only completed analyses enter quality-score averages. The analyzer
    /// has emitted "completed", "Completed", and "COMPLETED" over time.
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }

    /// Per-analysis confidence: mean of the executive and person scores.
    pub fn confidence(&self) -> f64 {
        (self.confidence_score_executive + self.confidence_score_person) / 2.0
    }
}
