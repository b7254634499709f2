//! Dataset records and the views built over them.
//!
//! The dataset is a static array of daily records exported from the market
//! sheet. Each record maps a column name (`ICE`, `CZCE - ICE`, ...) to a
//! number, a string or null, and carries a mandatory `Date` column. After
//! loading, records are held most-recent-first: index 0 is the latest day.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Name of the mandatory date column.
pub const DATE_FIELD: &str = "Date";

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Null,
}

impl FieldValue {
    /// Numeric view of the cell. Text is parsed after trimming; anything that
    /// does not yield a finite number is treated as missing.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Null => return None,
        };
        if value.is_finite() {
            Some(value)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// One row of the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Creates a record with only its `Date` column set.
    pub fn dated(date: impl Into<String>) -> Self {
        let mut record = Record::new();
        record.insert(DATE_FIELD, FieldValue::Text(date.into()));
        record
    }

    /// Builder-style insert, mostly useful in tests and the importer.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Numeric value of a column, `None` when missing or non-numeric.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    /// Numeric value of a column, coerced to 0 when missing.
    pub fn number_or_zero(&self, field: &str) -> f64 {
        self.number(field).unwrap_or(0.0)
    }

    /// Raw `Date` string.
    pub fn date_str(&self) -> Option<&str> {
        self.get(DATE_FIELD).and_then(FieldValue::as_str)
    }

    /// Parsed `Date` column.
    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date_str().and_then(parse_record_date)
    }

    /// Column names other than `Date`.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|name| *name != DATE_FIELD)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parses the date formats found in the dataset: ISO dates, ISO date-times
/// (with or without offset) and the sheet's `DD/MM/YYYY` form.
///
/// Date-only values resolve to midnight.
pub fn parse_record_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.naive_utc());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(datetime);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}

/// A dated value extracted from one column, as consumed by the indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: String,
    pub value: f64,
}

impl DataPoint {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        DataPoint {
            date: date.into(),
            value,
        }
    }
}

/// Builds the oldest-first series for a column, skipping records where the
/// column is not numeric.
pub fn series(records: &[Record], field: &str) -> Vec<DataPoint> {
    records
        .iter()
        .rev()
        .filter_map(|record| {
            let value = record.number(field)?;
            let date = record.date_str().unwrap_or_default();
            Some(DataPoint::new(date, value))
        })
        .collect()
}

/// Numeric values of a column in dataset order (most recent first).
pub fn values(records: &[Record], field: &str) -> Vec<f64> {
    records
        .iter()
        .filter_map(|record| record.number(field))
        .collect()
}

/// Preset look-back windows offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    /// Number of most recent records kept, `None` meaning everything.
    pub fn record_limit(&self) -> Option<usize> {
        match self {
            TimeRange::Week => Some(7),
            TimeRange::Month => Some(30),
            TimeRange::Quarter => Some(90),
            TimeRange::Year => Some(365),
            TimeRange::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::Quarter => "90d",
            TimeRange::Year => "1y",
            TimeRange::All => "all",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a time range or comparison tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTagError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseTagError {}

impl FromStr for TimeRange {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" => Ok(TimeRange::Week),
            "30d" => Ok(TimeRange::Month),
            "90d" => Ok(TimeRange::Quarter),
            "1y" => Ok(TimeRange::Year),
            "all" => Ok(TimeRange::All),
            _ => Err(ParseTagError {
                kind: "time range",
                value: s.to_string(),
            }),
        }
    }
}

/// Inclusive calendar range used by the custom date picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Errors raised while loading a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// The dataset file could not be read
    Io(String),
    /// The file is not a JSON array of records
    Json(String),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io(msg) => write!(f, "Failed to read dataset: {}", msg),
            DatasetError::Json(msg) => write!(f, "Invalid dataset JSON: {}", msg),
        }
    }
}

impl std::error::Error for DatasetError {}

/// The immutable, most-recent-first record sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Builds a dataset, dropping records without a parseable `Date` and
    /// ordering the rest most-recent-first.
    pub fn from_records(records: Vec<Record>) -> Self {
        let total = records.len();
        let mut dated: Vec<(NaiveDateTime, Record)> = records
            .into_iter()
            .filter_map(|record| record.date().map(|date| (date, record)))
            .collect();

        if dated.len() < total {
            log::warn!(
                "Dropped {} records without a valid {} column",
                total - dated.len(),
                DATE_FIELD
            );
        }

        dated.sort_by(|a, b| b.0.cmp(&a.0));

        Dataset {
            records: dated.into_iter().map(|(_, record)| record).collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let records: Vec<Record> =
            serde_json::from_str(json).map_err(|e| DatasetError::Json(e.to_string()))?;
        Ok(Dataset::from_records(records))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DatasetError::Io(format!("{}: {}", path.display(), e)))?;
        let dataset = Dataset::from_json_str(&contents)?;
        log::info!(
            "Loaded {} records from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn latest(&self) -> Option<&Record> {
        self.records.first()
    }

    /// Sorted union of every column name except `Date`.
    pub fn field_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .records
            .iter()
            .flat_map(Record::field_names)
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// Most recent records covered by a preset range.
    pub fn take_range(&self, range: TimeRange) -> &[Record] {
        match range.record_limit() {
            Some(limit) => &self.records[..limit.min(self.records.len())],
            None => &self.records,
        }
    }

    /// Records whose date falls inside `range`. Records are date-ordered, so
    /// the matches form one contiguous run.
    pub fn within(&self, range: &DateRange) -> &[Record] {
        let in_range = |record: &Record| {
            record
                .date()
                .map(|date| range.contains(date.date()))
                .unwrap_or(false)
        };

        let start = match self.records.iter().position(in_range) {
            Some(start) => start,
            None => return &[],
        };
        let len = self.records[start..]
            .iter()
            .take_while(|record| in_range(record))
            .count();

        &self.records[start..start + len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            Record::dated("2024-01-15").with("ICE", 80.0).with("CZCE - ICE", -3.5),
            Record::dated("2024-01-17").with("ICE", 82.0).with("CZCE - ICE", "-2.0"),
            Record::dated("2024-01-16").with("ICE", FieldValue::Null),
            Record::new().with("ICE", 1.0),
        ])
    }

    #[test]
    fn parse_record_date_accepts_dataset_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_record_date("2024-03-05"), Some(expected));
        assert_eq!(parse_record_date("05/03/2024"), Some(expected));
        assert_eq!(parse_record_date("2024-03-05T00:00:00Z"), Some(expected));
        assert_eq!(parse_record_date("2024-03-05T00:00:00.000"), Some(expected));
        assert_eq!(parse_record_date("not a date"), None);
        assert_eq!(parse_record_date(""), None);
    }

    #[test]
    fn field_value_numeric_coercion() {
        assert_eq!(FieldValue::Number(1.5).as_number(), Some(1.5));
        assert_eq!(FieldValue::Text(" -2.25 ".into()).as_number(), Some(-2.25));
        assert_eq!(FieldValue::Text("n/a".into()).as_number(), None);
        assert_eq!(FieldValue::Null.as_number(), None);
    }

    #[test]
    fn dataset_sorts_descending_and_drops_undated_records() {
        let dataset = sample();
        assert_eq!(dataset.len(), 3);
        let dates: Vec<_> = dataset.records().iter().filter_map(Record::date_str).collect();
        assert_eq!(dates, vec!["2024-01-17", "2024-01-16", "2024-01-15"]);
    }

    #[test]
    fn dataset_from_json_handles_mixed_values() {
        let json = r#"[
            {"Date": "2024-01-02", "ICE": 81.5, "CZCE - ICE": null, "Note": "x"},
            {"Date": "2024-01-03", "ICE": "82.5"}
        ]"#;
        let dataset = Dataset::from_json_str(json).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.latest().unwrap().number("ICE"), Some(82.5));
        assert_eq!(dataset.get(1).unwrap().number("CZCE - ICE"), None);
        assert_eq!(dataset.field_names(), vec!["CZCE - ICE", "ICE", "Note"]);
    }

    #[test]
    fn dataset_from_json_rejects_non_array() {
        let err = Dataset::from_json_str("{\"Date\": 1}").unwrap_err();
        assert!(matches!(err, DatasetError::Json(_)));
    }

    #[test]
    fn series_is_oldest_first_and_numeric_only() {
        let dataset = sample();
        let points = series(dataset.records(), "ICE");
        assert_eq!(
            points,
            vec![DataPoint::new("2024-01-15", 80.0), DataPoint::new("2024-01-17", 82.0)]
        );
        assert_eq!(values(dataset.records(), "CZCE - ICE"), vec![-2.0, -3.5]);
    }

    #[test]
    fn take_range_keeps_most_recent_records() {
        let records: Vec<Record> = (1..=40)
            .map(|day| Record::dated(format!("2024-01-{:02}", day.min(31))).with("ICE", day as f64))
            .collect();
        let dataset = Dataset::from_records(records);
        assert_eq!(dataset.take_range(TimeRange::Week).len(), 7);
        assert_eq!(dataset.take_range(TimeRange::Quarter).len(), 40);
        assert_eq!(dataset.take_range(TimeRange::All).len(), 40);
    }

    #[test]
    fn within_returns_contiguous_date_window() {
        let dataset = sample();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
        );
        let selected = dataset.within(&range);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].date_str(), Some("2024-01-16"));

        let empty = DateRange::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        );
        assert!(dataset.within(&empty).is_empty());
    }

    #[test]
    fn time_range_parses_dashboard_tags() {
        assert_eq!("7d".parse::<TimeRange>().unwrap(), TimeRange::Week);
        assert_eq!("1Y".parse::<TimeRange>().unwrap(), TimeRange::Year);
        assert!("2w".parse::<TimeRange>().is_err());
        assert_eq!(serde_json::to_string(&TimeRange::Quarter).unwrap(), "\"90d\"");
    }
}
