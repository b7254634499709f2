//! Technical indicators for chart overlays.
//!
//! All indicators take an oldest-first series of [`DataPoint`]s and return
//! values aligned to the date of the last point in their window. They are
//! independent of each other and hold no state between calls.

pub mod primitives;
pub mod windows;

use crate::record::DataPoint;
use primitives::{mean, population_std_dev};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use windows::{ExponentialWindow, RollingWindow, WilderWindow, WindowStrategy};

pub const DEFAULT_SMA_PERIOD: usize = 20;
pub const DEFAULT_EMA_PERIOD: usize = 20;
pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;
pub const DEFAULT_BOLLINGER_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_RSI_PERIOD: usize = 14;
/// Percent distance within which local extremes join an existing level.
pub const DEFAULT_LEVEL_TOLERANCE: f64 = 0.5;
/// Series shorter than this produce no support/resistance levels.
pub const MIN_LEVEL_POINTS: usize = 10;
const MAX_LEVELS: usize = 5;

fn raw_values(data: &[DataPoint]) -> Vec<f64> {
    data.iter().map(|point| point.value).collect()
}

/// Re-attaches dates to indicator output whose first value belongs to
/// `data[offset]`.
fn align(data: &[DataPoint], offset: usize, values: Vec<f64>) -> Vec<DataPoint> {
    data[offset..]
        .iter()
        .zip(values)
        .map(|(point, value)| DataPoint::new(point.date.clone(), value))
        .collect()
}

/// Simple moving average over `period` points.
///
/// Empty when the series is shorter than `period` (or `period` is zero);
/// otherwise one value per complete window.
pub fn calculate_sma(data: &[DataPoint], period: usize) -> Vec<DataPoint> {
    let window = RollingWindow::new(period);
    let averages = window.apply(&raw_values(data), mean);
    if averages.is_empty() {
        return Vec::new();
    }
    align(data, window.burn_in() - 1, averages)
}

/// One Bollinger Band sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerBand {
    pub date: String,
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Moving average ± `multiplier` population standard deviations over the
/// same rolling window.
pub fn calculate_bollinger_bands(
    data: &[DataPoint],
    period: usize,
    multiplier: f64,
) -> Vec<BollingerBand> {
    let window = RollingWindow::new(period);
    let bands = window.apply(&raw_values(data), |slice| {
        let middle = mean(slice);
        let deviation = population_std_dev(slice) * multiplier;
        (middle, middle + deviation, middle - deviation)
    });
    if bands.is_empty() {
        return Vec::new();
    }

    data[window.burn_in() - 1..]
        .iter()
        .zip(bands)
        .map(|(point, (middle, upper, lower))| BollingerBand {
            date: point.date.clone(),
            middle,
            upper,
            lower,
        })
        .collect()
}

/// Relative strength index with Wilder smoothing. Needs `period + 1` points.
pub fn calculate_rsi(data: &[DataPoint], period: usize) -> Vec<DataPoint> {
    let window = WilderWindow::new(period);
    let values = window.apply(&raw_values(data));
    if values.is_empty() {
        return Vec::new();
    }
    align(data, window.burn_in() - 1, values)
}

/// Exponential moving average seeded with the simple average of the first
/// `period` points, smoothed with multiplier `2 / (period + 1)`.
pub fn calculate_ema(data: &[DataPoint], period: usize) -> Vec<DataPoint> {
    let window = ExponentialWindow::new(period);
    let values = window.apply(&raw_values(data));
    if values.is_empty() {
        return Vec::new();
    }
    align(data, window.burn_in() - 1, values)
}

/// Whether a level acted as a floor or a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Support,
    Resistance,
}

/// A price level touched repeatedly by local extremes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportResistance {
    pub level: f64,
    #[serde(rename = "type")]
    pub kind: LevelKind,
    /// Number of local extremes grouped into this level
    pub strength: usize,
}

/// Finds up to five support/resistance levels.
///
/// A point is a local minimum (maximum) when it is strictly below (above)
/// the two points on either side. Extremes of the same kind within
/// `tolerance` percent of an existing level are merged into it using a
/// touch-weighted mean. Levels are returned strongest first; ties keep the
/// order in which levels were last updated.
pub fn find_support_resistance_levels(
    data: &[DataPoint],
    tolerance: f64,
) -> Vec<SupportResistance> {
    if data.len() < MIN_LEVEL_POINTS {
        return Vec::new();
    }

    let values = raw_values(data);
    let mut levels: Vec<SupportResistance> = Vec::new();

    for window in values.windows(5) {
        let current = window[2];
        let neighbours = [window[0], window[1], window[3], window[4]];

        if neighbours.iter().all(|&n| current < n) {
            add_or_update_level(&mut levels, current, LevelKind::Support, tolerance);
        }
        if neighbours.iter().all(|&n| current > n) {
            add_or_update_level(&mut levels, current, LevelKind::Resistance, tolerance);
        }
    }

    // Stable: equal strengths stay in detection order
    levels.sort_by(|a, b| b.strength.cmp(&a.strength));
    levels.truncate(MAX_LEVELS);
    levels
}

fn percent_distance(level: f64, value: f64) -> f64 {
    let diff = (level - value).abs();
    if level == 0.0 {
        return if diff == 0.0 { 0.0 } else { f64::INFINITY };
    }
    diff / level.abs() * 100.0
}

fn add_or_update_level(
    levels: &mut Vec<SupportResistance>,
    value: f64,
    kind: LevelKind,
    tolerance: f64,
) {
    let existing = levels
        .iter()
        .position(|level| level.kind == kind && percent_distance(level.level, value) <= tolerance);

    match existing {
        Some(index) => {
            // An updated level counts as detected last
            let level = levels.remove(index);
            let touches = level.strength as f64;
            levels.push(SupportResistance {
                level: (level.level * touches + value) / (touches + 1.0),
                kind,
                strength: level.strength + 1,
            });
        }
        None => levels.push(SupportResistance {
            level: value,
            kind,
            strength: 1,
        }),
    }
}

/// Overlay selector used by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Sma,
    Ema,
    Bollinger,
    Rsi,
    Levels,
}

impl Indicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::Sma => "sma",
            Indicator::Ema => "ema",
            Indicator::Bollinger => "bollinger",
            Indicator::Rsi => "rsi",
            Indicator::Levels => "levels",
        }
    }

    /// Runs the indicator with defaults for any parameter left unset.
    pub fn compute(&self, data: &[DataPoint], params: &IndicatorParams) -> IndicatorOutput {
        match self {
            Indicator::Sma => IndicatorOutput::Line(calculate_sma(
                data,
                params.period.unwrap_or(DEFAULT_SMA_PERIOD),
            )),
            Indicator::Ema => IndicatorOutput::Line(calculate_ema(
                data,
                params.period.unwrap_or(DEFAULT_EMA_PERIOD),
            )),
            Indicator::Bollinger => IndicatorOutput::Bands(calculate_bollinger_bands(
                data,
                params.period.unwrap_or(DEFAULT_BOLLINGER_PERIOD),
                params.multiplier.unwrap_or(DEFAULT_BOLLINGER_MULTIPLIER),
            )),
            Indicator::Rsi => IndicatorOutput::Line(calculate_rsi(
                data,
                params.period.unwrap_or(DEFAULT_RSI_PERIOD),
            )),
            Indicator::Levels => IndicatorOutput::Levels(find_support_resistance_levels(
                data,
                params.tolerance.unwrap_or(DEFAULT_LEVEL_TOLERANCE),
            )),
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Indicator {
    type Err = crate::record::ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(Indicator::Sma),
            "ema" => Ok(Indicator::Ema),
            "bollinger" | "bbands" => Ok(Indicator::Bollinger),
            "rsi" => Ok(Indicator::Rsi),
            "levels" | "support-resistance" => Ok(Indicator::Levels),
            _ => Err(crate::record::ParseTagError {
                kind: "indicator",
                value: s.to_string(),
            }),
        }
    }
}

/// Optional indicator parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndicatorParams {
    pub period: Option<usize>,
    pub multiplier: Option<f64>,
    pub tolerance: Option<f64>,
}

/// Output shapes of the different indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum IndicatorOutput {
    Line(Vec<DataPoint>),
    Bands(Vec<BollingerBand>),
    Levels(Vec<SupportResistance>),
}

impl IndicatorOutput {
    pub fn len(&self) -> usize {
        match self {
            IndicatorOutput::Line(points) => points.len(),
            IndicatorOutput::Bands(bands) => bands.len(),
            IndicatorOutput::Levels(levels) => levels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
