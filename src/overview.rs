//! Overview panels computed from the most recent records: the spread heat
//! map and the volatility panel.

use crate::record::Record;
use serde::Serialize;

/// Spreads shown on the heat map by default.
pub const DEFAULT_SPREADS: [&str; 8] = [
    "CZCE - ICE",
    "AWP - ICE",
    "MCX - ICE",
    "CZCE Cotton - PSF",
    "CEPEA-ICE",
    "CZCE - MCX",
    "PSF-PTA",
    "ICE - PSF",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            Direction::Up
        } else if change < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }
}

/// One tile of the spread heat map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatMapCell {
    pub field: String,
    pub value: f64,
    /// Day-on-day percentage change
    pub change: f64,
    /// Colour intensity in `[0, 1]`; a 10% move saturates
    pub intensity: f64,
    pub direction: Direction,
}

/// Day-on-day move of each spread between the two most recent records.
///
/// Missing values count as 0; a zero previous value reports no change.
pub fn spread_heat_map<S: AsRef<str>>(records: &[Record], spreads: &[S]) -> Vec<HeatMapCell> {
    let latest = records.first();
    let previous = records.get(1);

    spreads
        .iter()
        .map(|spread| {
            let field = spread.as_ref();
            let value = latest.map(|r| r.number_or_zero(field)).unwrap_or(0.0);
            let prior = previous.map(|r| r.number_or_zero(field)).unwrap_or(0.0);
            let change = if prior == 0.0 {
                0.0
            } else {
                (value - prior) / prior * 100.0
            };

            HeatMapCell {
                field: field.to_string(),
                value,
                change,
                intensity: (change.abs() * 10.0).min(100.0) / 100.0,
                direction: Direction::of(change),
            }
        })
        .collect()
}

/// Range column shown on the volatility panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityMetric {
    pub id: &'static str,
    pub label: &'static str,
    pub field: &'static str,
    pub value: f64,
    /// Share of the 20-point scale, capped at 1
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityPanel {
    pub date: Option<String>,
    pub metrics: Vec<VolatilityMetric>,
    pub week_move: f64,
    pub week_move_intensity: f64,
    pub hi: f64,
    pub lo: f64,
    pub spread: f64,
}

const VOLATILITY_SCALE: f64 = 20.0;

const RANGE_COLUMNS: [(&str, &str, &str); 4] = [
    ("daily", "Daily Range", "Daily range"),
    ("five-day", "5-Day Range", "Five day range"),
    ("three-month", "3-Month Range", "3 month range"),
    ("six-month", "6-Month Range", "6 month range"),
];

fn intensity(value: f64) -> f64 {
    (value / VOLATILITY_SCALE).min(1.0)
}

/// Builds the volatility panel from the latest record.
pub fn volatility_panel(records: &[Record]) -> VolatilityPanel {
    let latest = records.first();
    let read = |field: &str| latest.map(|r| r.number_or_zero(field)).unwrap_or(0.0);

    let metrics = RANGE_COLUMNS
        .iter()
        .map(|&(id, label, field)| {
            let value = read(field);
            VolatilityMetric {
                id,
                label,
                field,
                value,
                intensity: intensity(value),
            }
        })
        .collect();

    let week_move = read("Week move");

    VolatilityPanel {
        date: latest.and_then(Record::date_str).map(str::to_string),
        metrics,
        week_move,
        week_move_intensity: intensity(week_move.abs()),
        hi: read("Hi"),
        lo: read("Lo"),
        spread: read("Spread"),
    }
}
