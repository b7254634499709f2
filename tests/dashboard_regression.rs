use spread_analytics::comments;
use spread_analytics::correlation::CorrelationMatrix;
use spread_analytics::import::{import_csv, write_json};
use spread_analytics::indicators::{Indicator, IndicatorOutput, IndicatorParams};
use spread_analytics::layout::{self, View};
use spread_analytics::record::series;
use spread_analytics::settings::{self, SettingsPatch};
use spread_analytics::{ComparisonMode, Dataset, FieldChange, SqliteStore, TimeRange};
use chrono::{TimeZone, Utc};
use std::fs::File;
use std::path::PathBuf;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("spread-analytics-{}-{}", std::process::id(), name))
}

/// A month of sheet rows, newest last, with two linearly related markets.
fn sheet() -> String {
    let mut csv = String::from(",MY,ICE,Cotlook,Cotlook - ICE\n");
    for day in 1..=28 {
        let ice = 70.0 + (day % 5) as f64;
        let cotlook = ice * 1.1 + 5.0;
        csv.push_str(&format!(
            "{}/02/2024,23/24,{},{},{}\n",
            day,
            ice,
            cotlook,
            cotlook - ice
        ));
    }
    csv
}

#[test]
fn sheet_import_round_trips_through_dataset_file() {
    init_logging();

    let records = import_csv(sheet().as_bytes()).unwrap();
    assert_eq!(records.len(), 28);

    let path = temp_path("dataset.json");
    write_json(&records, File::create(&path).unwrap()).unwrap();
    let dataset = Dataset::from_json_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(dataset.len(), 28);
    assert_eq!(dataset.latest().unwrap().date_str(), Some("2024-02-28"));
    assert_eq!(
        dataset.field_names(),
        vec!["Cotlook", "Cotlook - ICE", "ICE", "MY"]
    );

    let change = FieldChange::resolve(dataset.records(), "Cotlook - ICE", ComparisonMode::Week);
    assert_eq!(change.compare_date.as_deref(), Some("2024-02-21"));
    assert!(change.point_change.abs() < 1.0);

    let matrix = CorrelationMatrix::compute(dataset.take_range(TimeRange::All), &["ICE", "Cotlook"]);
    assert!((matrix.get("ICE", "Cotlook").unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(matrix.get("ICE", "ICE"), Some(1.0));

    let data = series(dataset.records(), "ICE");
    let rsi = Indicator::Rsi.compute(&data, &IndicatorParams::default());
    match rsi {
        IndicatorOutput::Line(points) => {
            assert_eq!(points.len(), 28 - 14);
            assert!(points.iter().all(|p| (0.0..=100.0).contains(&p.value)));
        }
        other => panic!("unexpected output {:?}", other),
    }
}

#[test]
fn dashboard_state_survives_reopening_the_database() {
    init_logging();
    let path = temp_path("state.db");
    let now = Utc.with_ymd_and_hms(2024, 2, 28, 17, 0, 0).unwrap();

    let comment_id = {
        let mut store = SqliteStore::new(&path).unwrap();
        settings::update_settings(
            &mut store,
            &SettingsPatch {
                default_comparison_mode: Some(ComparisonMode::Month),
                refresh_interval: Some(15),
                ..SettingsPatch::default()
            },
        )
        .unwrap();

        let mut config = layout::load_layout(&store);
        config.toggle_section(View::Spreads, "all-spreads").unwrap();
        layout::save_layout(&mut store, &config).unwrap();

        comments::add_comment(&mut store, "main-spread", "ana", "Narrowing", now)
            .unwrap()
            .id
    };

    let mut store = SqliteStore::new(&path).unwrap();
    let restored = settings::load_settings(&store);
    assert_eq!(restored.default_comparison_mode, ComparisonMode::Month);
    assert_eq!(restored.refresh_interval, 15);

    let active = layout::load_layout(&store).active_sections(View::Spreads);
    assert_eq!(active.len(), 2);

    let edited = comments::edit_comment(&mut store, &comment_id, "Narrowing fast", now)
        .unwrap()
        .unwrap();
    assert_eq!(edited.content, "Narrowing fast");
    assert_eq!(comments::format_timestamp(edited.timestamp, now), "Just now");

    drop(store);
    let _ = std::fs::remove_file(&path);
}
