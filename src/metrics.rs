//! Derived change metrics and per-field summary statistics.

use crate::comparison::{format_comparison_label, get_comparison_data_point, ComparisonMode};
use crate::record::{self, Record};
use ordered_float::OrderedFloat;
use serde::Serialize;

/// Percentage change from `previous` to `current`.
///
/// Same-signed positive values use the textbook formula. When both values
/// are negative, or the pair crosses zero (common for spreads), the change is
/// taken over absolute magnitudes and forced negative if `current` moved
/// below `previous`. A zero `previous` yields ±100 by the sign of `current`
/// (0 when both are zero). NaN on either side yields 0.
pub fn calculate_percentage_change(current: f64, previous: f64) -> f64 {
    if current.is_nan() || previous.is_nan() {
        return 0.0;
    }
    if previous == 0.0 {
        return if current == 0.0 {
            0.0
        } else if current > 0.0 {
            100.0
        } else {
            -100.0
        };
    }

    if (current < 0.0 && previous < 0.0) || current * previous < 0.0 {
        let abs_previous = previous.abs();
        let change = (current.abs() - abs_previous) / abs_previous * 100.0;
        if current < previous {
            return -change.abs();
        }
        return change;
    }

    (current - previous) / previous * 100.0
}

/// Absolute point change; 0 when either value is NaN.
pub fn calculate_point_change(current: f64, previous: f64) -> f64 {
    if current.is_nan() || previous.is_nan() {
        return 0.0;
    }
    current - previous
}

/// Whether a column holds a price level or a spread between two prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Price,
    Spread,
}

impl FieldKind {
    /// Spread columns are named `A - B`, or mention a spread or basis.
    pub fn classify(field: &str) -> Self {
        let lower = field.to_lowercase();
        if field.contains('-') || lower.contains("spread") || lower.contains("basis") {
            FieldKind::Spread
        } else {
            FieldKind::Price
        }
    }

    /// Spreads can sit near zero, so they report point change; prices report
    /// percentage change.
    pub fn headline_change(&self, point_change: f64, percentage_change: f64) -> f64 {
        match self {
            FieldKind::Spread => point_change,
            FieldKind::Price => percentage_change,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            FieldKind::Spread => "pts",
            FieldKind::Price => "%",
        }
    }
}

/// The change of one column between the latest record and its baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub kind: FieldKind,
    pub mode: ComparisonMode,
    pub current_date: Option<String>,
    pub compare_date: Option<String>,
    pub compare_index: Option<usize>,
    pub current: f64,
    pub previous: f64,
    pub point_change: f64,
    pub percentage_change: f64,
    /// Point change for spreads, percentage change for prices
    pub change: f64,
    pub unit: &'static str,
    pub label: String,
}

impl FieldChange {
    /// Resolves the baseline for the most recent record and computes both
    /// change figures.
    ///
    /// `current` is the most recent numeric value of the column; `previous`
    /// is the column's value on the baseline record. Either falls back to 0
    /// when missing.
    pub fn resolve(records: &[Record], field: &str, mode: ComparisonMode) -> Self {
        let kind = FieldKind::classify(field);
        let current = records
            .iter()
            .find_map(|record| record.number(field))
            .unwrap_or(0.0);

        let baseline = get_comparison_data_point(records, 0, mode);
        let previous = baseline
            .index
            .and_then(|index| records.get(index))
            .map(|record| record.number_or_zero(field))
            .unwrap_or(0.0);

        let point_change = calculate_point_change(current, previous);
        let percentage_change = calculate_percentage_change(current, previous);
        let current_date = records
            .first()
            .and_then(Record::date_str)
            .map(str::to_string);
        let label =
            format_comparison_label(current_date.as_deref(), baseline.date.as_deref(), mode);

        FieldChange {
            field: field.to_string(),
            kind,
            mode,
            current_date,
            compare_date: baseline.date,
            compare_index: baseline.index,
            current,
            previous,
            point_change,
            percentage_change,
            change: kind.headline_change(point_change, percentage_change),
            unit: kind.unit(),
            label,
        }
    }
}

/// Summary statistics for one column over a set of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldStatistics {
    pub count: usize,
    pub current: f64,
    pub high: f64,
    /// Lowest non-zero value; zero cells are usually missing prints
    pub low: f64,
    pub average: f64,
    /// `high - low`
    pub range: f64,
    /// Upper median
    pub median: f64,
    /// Share of values strictly below `current`, in percent
    pub percentile: f64,
}

impl FieldStatistics {
    /// Computes statistics over `values` given most-recent-first; the first
    /// value is treated as current.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return FieldStatistics::default();
        }

        let current = values[0];
        let count = values.len();

        let high = values
            .iter()
            .copied()
            .map(OrderedFloat)
            .max()
            .map(|v| v.0)
            .unwrap_or(0.0);
        let low = values
            .iter()
            .copied()
            .filter(|v| *v != 0.0)
            .map(OrderedFloat)
            .min()
            .map(|v| v.0)
            .unwrap_or(0.0);
        let average = values.iter().sum::<f64>() / count as f64;

        let mut sorted = values.to_vec();
        sorted.sort_by_key(|v| OrderedFloat(*v));
        let median = sorted[count / 2];

        let below = sorted.iter().filter(|v| **v < current).count();
        let percentile = below as f64 / count as f64 * 100.0;

        FieldStatistics {
            count,
            current,
            high,
            low,
            average,
            range: high - low,
            median,
            percentile,
        }
    }

    pub fn for_field(records: &[Record], field: &str) -> Self {
        FieldStatistics::compute(&record::values(records, field))
    }
}
