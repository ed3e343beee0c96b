//! Reporting-window resolution.
//!
//! A period selection (preset filter, optional custom pair, optional pinned
//! single date) resolves to an inclusive `[start, end]` range of plain
//! `YYYY-MM-DD` strings. Range membership is a *lexicographic string*
//! comparison on the first 10 characters of a record's date, not a parsed
//! date comparison. That is deliberate: the store holds a mix of bare dates
//! and full timestamps ("2024-03-15T23:59:00Z"), and the prefix rule accepts
//! both without parsing.

use chrono::{Datelike, Days, NaiveDate};

/// Preset reporting windows offered by the report UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFilter {
    Today,
    Yesterday,
    Last7Days,
    ThisMonth,
    Custom,
}

impl DateFilter {
    /// Uppercase label used in CSV report headers ("LAST 7 DAYS").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "TODAY",
            Self::Yesterday => "YESTERDAY",
            Self::Last7Days => "LAST 7 DAYS",
            Self::ThisMonth => "THIS MONTH",
            Self::Custom => "CUSTOM",
        }
    }
}

/// What the caller picked: a preset, an optional custom pair (only read when
/// the preset is `Custom`), and an optional pinned single date that overrides
/// everything else.
#[derive(Debug, Clone, Default)]
pub struct PeriodSelection {
    pub filter: Option<DateFilter>,
    pub custom_start: Option<String>,
    pub custom_end: Option<String>,
    pub pinned_date: Option<NaiveDate>,
}

impl PeriodSelection {
    pub fn preset(filter: DateFilter) -> Self {
        Self {
            filter: Some(filter),
            ..Default::default()
        }
    }

    pub fn custom(start: &str, end: &str) -> Self {
        Self {
            filter: Some(DateFilter::Custom),
            custom_start: Some(start.to_string()),
            custom_end: Some(end.to_string()),
            pinned_date: None,
        }
    }

    /// Resolve against the caller's current date.
    ///
    /// Precedence: pinned date > preset > this-month default. A custom
    /// selection missing either endpoint also falls back to this-month.
    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        if let Some(date) = self.pinned_date {
            let s = format_date(date);
            return DateRange::new(s.clone(), s);
        }

        match self.filter {
            Some(DateFilter::Today) => {
                let s = format_date(today);
                DateRange::new(s.clone(), s)
            }
            Some(DateFilter::Yesterday) => {
                let y = today.checked_sub_days(Days::new(1)).unwrap_or(today);
                let s = format_date(y);
                DateRange::new(s.clone(), s)
            }
            Some(DateFilter::Last7Days) => {
                // 7 calendar days inclusive of today.
                let start = today.checked_sub_days(Days::new(6)).unwrap_or(today);
                DateRange::new(format_date(start), format_date(today))
            }
            Some(DateFilter::ThisMonth) => month_range(today),
            Some(DateFilter::Custom) => match (&self.custom_start, &self.custom_end) {
                (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                    DateRange::new(start.clone(), end.clone())
                }
                _ => month_range(today),
            },
            None => month_range(today),
        }
    }

    /// Human label for report headers.
    pub fn label(&self) -> &'static str {
        match self.filter {
            Some(f) => f.label(),
            None => DateFilter::ThisMonth.label(),
        }
    }

    pub fn is_custom(&self) -> bool {
        self.filter == Some(DateFilter::Custom)
    }
}

/// An inclusive calendar-date interval, both ends `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: String, end: String) -> Self {
        Self { start, end }
    }

    /// Whether a raw record date falls in the range. Compares the 10-char
    /// `YYYY-MM-DD` prefix lexicographically, so timestamps with a
    /// time-of-day suffix match the day they start with.
    pub fn contains(&self, raw_date: &str) -> bool {
        let key = date_key(raw_date);
        if key.is_empty() {
            return false;
        }
        key >= self.start.as_str() && key <= self.end.as_str()
    }
}

/// First 10 characters of a date string, the `YYYY-MM-DD` prefix. Shorter
/// inputs pass through unchanged.
pub fn date_key(raw: &str) -> &str {
    raw.get(..10).unwrap_or(raw)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// First through last day of `today`'s month.
fn month_range(today: NaiveDate) -> DateRange {
    let first = today.with_day(1).unwrap_or(today);
    let next_month = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    };
    let last = next_month
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(today);
    DateRange::new(format_date(first), format_date(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn today_and_yesterday_are_single_day_ranges() {
        let today = day("2024-03-15");
        let r = PeriodSelection::preset(DateFilter::Today).resolve(today);
        assert_eq!(r, DateRange::new("2024-03-15".into(), "2024-03-15".into()));

        let r = PeriodSelection::preset(DateFilter::Yesterday).resolve(today);
        assert_eq!(r, DateRange::new("2024-03-14".into(), "2024-03-14".into()));
    }

    #[test]
    fn last_7_days_spans_seven_calendar_days_inclusive() {
        let r = PeriodSelection::preset(DateFilter::Last7Days).resolve(day("2024-03-15"));
        assert_eq!(r, DateRange::new("2024-03-09".into(), "2024-03-15".into()));
    }

    #[test]
    fn this_month_covers_first_to_last_day() {
        let r = PeriodSelection::preset(DateFilter::ThisMonth).resolve(day("2024-02-10"));
        // 2024 is a leap year.
        assert_eq!(r, DateRange::new("2024-02-01".into(), "2024-02-29".into()));

        let r = PeriodSelection::preset(DateFilter::ThisMonth).resolve(day("2023-12-25"));
        assert_eq!(r, DateRange::new("2023-12-01".into(), "2023-12-31".into()));
    }

    #[test]
    fn custom_range_used_verbatim() {
        let r = PeriodSelection::custom("2024-01-05", "2024-01-20").resolve(day("2024-03-15"));
        assert_eq!(r, DateRange::new("2024-01-05".into(), "2024-01-20".into()));
    }

    #[test]
    fn incomplete_custom_falls_back_to_this_month() {
        let mut sel = PeriodSelection::preset(DateFilter::Custom);
        sel.custom_start = Some("2024-01-05".into());
        let r = sel.resolve(day("2024-03-15"));
        assert_eq!(r, DateRange::new("2024-03-01".into(), "2024-03-31".into()));
    }

    #[test]
    fn no_filter_defaults_to_this_month() {
        let r = PeriodSelection::default().resolve(day("2024-03-15"));
        assert_eq!(r, DateRange::new("2024-03-01".into(), "2024-03-31".into()));
    }

    #[test]
    fn pinned_date_overrides_any_filter() {
        let mut sel = PeriodSelection::preset(DateFilter::Last7Days);
        sel.pinned_date = Some(day("2024-01-02"));
        let r = sel.resolve(day("2024-03-15"));
        assert_eq!(r, DateRange::new("2024-01-02".into(), "2024-01-02".into()));
    }

    #[test]
    fn contains_is_a_string_prefix_comparison() {
        let r = DateRange::new("2024-03-01".into(), "2024-03-31".into());
        assert!(r.contains("2024-03-15T23:59:00Z"));
        assert!(r.contains("2024-03-01"));
        assert!(r.contains("2024-03-31"));
        assert!(!r.contains("2024-02-29T23:59:59Z"));
        assert!(!r.contains("2024-04-01"));
        assert!(!r.contains(""));
    }

    #[test]
    fn date_key_truncates_timestamps() {
        assert_eq!(date_key("2024-03-15T10:00:00Z"), "2024-03-15");
        assert_eq!(date_key("2024-03-15"), "2024-03-15");
        assert_eq!(date_key("short"), "short");
    }
}
