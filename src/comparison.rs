//! Comparison-period resolution.
//!
//! Every change figure on the dashboard compares a reference record against
//! a baseline picked by a [`ComparisonMode`]. The dataset is ordered
//! most-recent-first, so "earlier" baselines live at higher indices.

use crate::record::{parse_record_date, ParseTagError, Record};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scan cut-off: once a scanned record is older than the target by more than
/// this, no later record can be closer.
const SEARCH_CUTOFF_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// How the baseline record is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    /// The previous data point
    #[default]
    Latest,
    /// Closest record to 7 days earlier
    Week,
    /// Closest record to 30 days earlier
    Month,
    /// Closest record to 365 days earlier
    Year,
    /// Closest record to 3650 days earlier
    Decade,
    /// User-picked baseline; resolves like `Latest`
    Custom,
}

impl ComparisonMode {
    pub const ALL: [ComparisonMode; 6] = [
        ComparisonMode::Latest,
        ComparisonMode::Week,
        ComparisonMode::Month,
        ComparisonMode::Year,
        ComparisonMode::Decade,
        ComparisonMode::Custom,
    ];

    /// Calendar offset for date-based modes.
    pub fn days_back(&self) -> Option<i64> {
        match self {
            ComparisonMode::Week => Some(7),
            ComparisonMode::Month => Some(30),
            ComparisonMode::Year => Some(365),
            ComparisonMode::Decade => Some(3650),
            ComparisonMode::Latest | ComparisonMode::Custom => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMode::Latest => "latest",
            ComparisonMode::Week => "week",
            ComparisonMode::Month => "month",
            ComparisonMode::Year => "year",
            ComparisonMode::Decade => "decade",
            ComparisonMode::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComparisonMode::Latest => "Latest",
            ComparisonMode::Week => "Week Ago",
            ComparisonMode::Month => "Month Ago",
            ComparisonMode::Year => "Year Ago",
            ComparisonMode::Decade => "Decade Ago",
            ComparisonMode::Custom => "Custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ComparisonMode::Latest => "Compare to previous data point",
            ComparisonMode::Week => "Same day last week",
            ComparisonMode::Month => "Same day last month",
            ComparisonMode::Year => "Same day last year",
            ComparisonMode::Decade => "Same day 10 years ago",
            ComparisonMode::Custom => "Custom comparison point",
        }
    }

    /// Whether the comparison label should show the baseline's year.
    fn shows_year(&self) -> bool {
        matches!(self, ComparisonMode::Year | ComparisonMode::Decade)
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonMode {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ComparisonMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ParseTagError {
                kind: "comparison mode",
                value: s.to_string(),
            })
    }
}

/// The resolved baseline record. Both fields are `None` when no baseline is
/// available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonPoint {
    pub index: Option<usize>,
    pub date: Option<String>,
}

impl ComparisonPoint {
    pub fn not_found() -> Self {
        ComparisonPoint::default()
    }

    fn at(records: &[Record], index: usize) -> Self {
        ComparisonPoint {
            index: Some(index),
            date: records[index].date_str().map(str::to_string),
        }
    }

    pub fn is_found(&self) -> bool {
        self.index.is_some()
    }
}

/// Locates the baseline record for `reference_index` under `mode`.
///
/// Out-of-range references, empty data and missing baselines all resolve to
/// [`ComparisonPoint::not_found`].
pub fn get_comparison_data_point(
    records: &[Record],
    reference_index: usize,
    mode: ComparisonMode,
) -> ComparisonPoint {
    if reference_index >= records.len() {
        return ComparisonPoint::not_found();
    }

    match mode.days_back() {
        None => {
            let previous = reference_index + 1;
            if previous >= records.len() {
                ComparisonPoint::not_found()
            } else {
                ComparisonPoint::at(records, previous)
            }
        }
        Some(days) => match records[reference_index].date() {
            Some(reference_date) => {
                find_closest_date_match(records, reference_date, days, reference_index)
            }
            None => ComparisonPoint::not_found(),
        },
    }
}

fn find_closest_date_match(
    records: &[Record],
    reference_date: NaiveDateTime,
    days_back: i64,
    reference_index: usize,
) -> ComparisonPoint {
    let target = reference_date - Duration::days(days_back);

    let mut closest: Option<usize> = None;
    let mut smallest_diff = i64::MAX;

    for (index, record) in records.iter().enumerate().skip(reference_index + 1) {
        let date = match record.date() {
            Some(date) => date,
            None => continue,
        };
        let diff = (date - target).num_milliseconds().abs();

        if diff < smallest_diff {
            smallest_diff = diff;
            closest = Some(index);
        }

        if date < target && diff > SEARCH_CUTOFF_MS {
            break;
        }
    }

    match closest {
        Some(index) => ComparisonPoint::at(records, index),
        None => ComparisonPoint::not_found(),
    }
}

/// Header text for a change column, e.g. `Jan 8 → Jan 15` or
/// `Jan 15, 2023 → Jan 15` for yearly baselines. Falls back to `Change`
/// when either date is missing or unreadable.
pub fn format_comparison_label(
    current_date: Option<&str>,
    compare_date: Option<&str>,
    mode: ComparisonMode,
) -> String {
    let (current, compare) = match (
        current_date.and_then(parse_record_date),
        compare_date.and_then(parse_record_date),
    ) {
        (Some(current), Some(compare)) => (current, compare),
        _ => return "Change".to_string(),
    };

    let compare_format = if mode.shows_year() { "%b %-d, %Y" } else { "%b %-d" };

    format!(
        "{} → {}",
        compare.format(compare_format),
        current.format("%b %-d")
    )
}
