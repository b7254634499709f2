use chrono::{Duration, NaiveDate};
use spread_analytics::{
    calculate_percentage_change, calculate_point_change, calculate_sma, get_comparison_data_point,
    ComparisonMode, DataPoint, Record,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Daily records ending at `end`, most recent first.
fn daily_records(end: NaiveDate, days: i64) -> Vec<Record> {
    (0..days)
        .map(|offset| {
            let date = end - Duration::days(offset);
            Record::dated(date.format("%Y-%m-%d").to_string()).with("ICE", 80.0 + offset as f64)
        })
        .collect()
}

#[test]
fn percentage_change_matches_textbook_formula_for_positive_values() {
    for (current, previous) in [(110.0, 100.0), (95.5, 100.0), (0.5, 0.25), (1e6, 3.0)] {
        let expected = (current - previous) / previous * 100.0;
        assert!((calculate_percentage_change(current, previous) - expected).abs() < 1e-9);
    }
}

#[test]
fn point_change_is_difference_or_zero_for_nan() {
    assert_eq!(calculate_point_change(12.5, 10.0), 2.5);
    assert_eq!(calculate_point_change(-3.0, 4.0), -7.0);
    assert_eq!(calculate_point_change(f64::NAN, 4.0), 0.0);
    assert_eq!(calculate_point_change(4.0, f64::NAN), 0.0);
}

#[test]
fn latest_mode_uses_next_record() {
    init_logging();
    let records = daily_records(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(), 3);

    let point = get_comparison_data_point(&records, 0, ComparisonMode::Latest);
    assert_eq!(point.index, Some(1));
    assert_eq!(point.date.as_deref(), Some("2024-05-30"));

    let last = get_comparison_data_point(&records, 2, ComparisonMode::Latest);
    assert!(!last.is_found());
}

#[test]
fn year_mode_finds_record_closest_to_a_year_back() {
    init_logging();
    // Weekly records so the exact target date is missing
    let end = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    let records: Vec<Record> = (0..80)
        .map(|week| {
            let date = end - Duration::days(week * 7);
            Record::dated(date.format("%Y-%m-%d").to_string()).with("ICE", week as f64)
        })
        .collect();

    let target = end - Duration::days(365);
    let point = get_comparison_data_point(&records, 0, ComparisonMode::Year);
    let index = point.index.unwrap();
    let found = records[index].date().unwrap().date();

    let best = records
        .iter()
        .filter_map(|r| r.date())
        .map(|d| (d.date() - target).num_days().abs())
        .min()
        .unwrap();
    assert_eq!((found - target).num_days().abs(), best);
    assert_eq!(found, NaiveDate::from_ymd_opt(2023, 6, 16).unwrap());
}

#[test]
fn week_and_month_modes_on_daily_data() {
    let records = daily_records(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(), 60);
    assert_eq!(
        get_comparison_data_point(&records, 0, ComparisonMode::Week).index,
        Some(7)
    );
    assert_eq!(
        get_comparison_data_point(&records, 10, ComparisonMode::Month).index,
        Some(40)
    );
}

#[test]
fn sma_of_short_series() {
    let data: Vec<DataPoint> = [10.0, 12.0, 11.0, 13.0, 15.0]
        .iter()
        .enumerate()
        .map(|(i, v)| DataPoint::new(format!("2024-01-0{}", i + 1), *v))
        .collect();

    let sma = calculate_sma(&data, 3);
    let values: Vec<f64> = sma.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![11.0, 12.0, 13.0]);
    let dates: Vec<&str> = sma.iter().map(|p| p.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-03", "2024-01-04", "2024-01-05"]);

    assert!(calculate_sma(&data[..2], 3).is_empty());
}
