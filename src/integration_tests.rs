// Integration tests for end-to-end workflows and critical user scenarios

#[cfg(test)]
mod integration_tests {
    use crate::comments;
    use crate::comparison::ComparisonMode;
    use crate::import::{import_csv, write_json};
    use crate::layout::{self, View};
    use crate::metrics::{FieldChange, FieldKind, FieldStatistics};
    use crate::overview::{spread_heat_map, volatility_panel, Direction};
    use crate::record::{self, Dataset, TimeRange};
    use crate::settings::{self, SettingsPatch, Theme};
    use crate::sqlite_store::SqliteStore;
    use crate::store::{KeyValueStore, COMMENTS_KEY, LAYOUT_KEY, SETTINGS_KEY};
    use crate::indicators::{calculate_sma, find_support_resistance_levels};
    use chrono::{TimeZone, Utc};

    /// Sheet export with a summary row above the header and one day per row,
    /// oldest first as the sheet lists them.
    fn sheet_export() -> String {
        let mut csv = String::from("Averages,,,,\nDate,ICE,CZCE - ICE,Daily range,Week move\n");
        for day in 1..=15 {
            let ice = 80.0 + day as f64;
            let spread = 5.0 + day as f64 * 0.5;
            let cell = if day == 10 {
                "#DIV/0!".to_string()
            } else {
                spread.to_string()
            };
            csv.push_str(&format!("{}/1/2024,{},{},{},-3\n", day, ice, cell, day));
        }
        csv
    }

    fn imported_dataset() -> Dataset {
        let records = import_csv(sheet_export().as_bytes()).unwrap();
        let mut json = Vec::new();
        write_json(&records, &mut json).unwrap();
        Dataset::from_json_str(std::str::from_utf8(&json).unwrap()).unwrap()
    }

    /// Test end-to-end workflow: Import sheet -> Load dataset -> Resolve changes
    #[test]
    fn test_import_to_comparison_workflow() {
        let dataset = imported_dataset();

        assert_eq!(dataset.len(), 15);
        assert_eq!(dataset.latest().unwrap().date_str(), Some("2024-01-15"));
        assert!(dataset.get(5).unwrap().get("CZCE - ICE").unwrap().is_null());

        // Spread: point change over a week
        let spread = FieldChange::resolve(dataset.records(), "CZCE - ICE", ComparisonMode::Week);
        assert_eq!(spread.kind, FieldKind::Spread);
        assert_eq!(spread.compare_date.as_deref(), Some("2024-01-08"));
        assert!((spread.change - 3.5).abs() < 1e-9);
        assert_eq!(spread.label, "Jan 8 → Jan 15");

        // Price: percentage change against the previous record
        let price = FieldChange::resolve(dataset.records(), "ICE", ComparisonMode::Latest);
        assert_eq!(price.kind, FieldKind::Price);
        assert_eq!(price.compare_index, Some(1));
        assert!((price.change - 100.0 / 94.0).abs() < 1e-9);
        assert_eq!(price.label, "Jan 14 → Jan 15");

        // Nothing near a year back: the oldest record is the closest match
        let year = FieldChange::resolve(dataset.records(), "ICE", ComparisonMode::Year);
        assert_eq!(year.compare_index, Some(14));
        assert_eq!(year.previous, 81.0);
        assert_eq!(year.label, "Jan 1, 2024 → Jan 15");
    }

    /// Test end-to-end workflow: Select range -> Statistics -> Indicators
    #[test]
    fn test_range_statistics_and_indicators() {
        let dataset = imported_dataset();
        let week = dataset.take_range(TimeRange::Week);

        let stats = FieldStatistics::for_field(week, "ICE");
        assert_eq!(stats.count, 7);
        assert_eq!(stats.current, 95.0);
        assert_eq!(stats.high, 95.0);
        assert_eq!(stats.low, 89.0);
        assert_eq!(stats.percentile, 6.0 / 7.0 * 100.0);

        // The errored cell is skipped by the chart series
        let spread = record::series(dataset.records(), "CZCE - ICE");
        assert_eq!(spread.len(), 14);
        assert_eq!(spread[0].date, "2024-01-01");

        let sma = calculate_sma(&record::series(dataset.records(), "ICE"), 5);
        assert_eq!(sma.len(), 11);
        assert!((sma[0].value - 83.0).abs() < 1e-9);
        assert_eq!(sma.last().unwrap().date, "2024-01-15");

        // A steadily rising series has no repeated levels
        assert!(find_support_resistance_levels(&spread, 0.1).len() <= 5);
    }

    /// Test overview panels on imported data
    #[test]
    fn test_overview_panels() {
        let dataset = imported_dataset();

        let cells = spread_heat_map(dataset.records(), &["CZCE - ICE"]);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].direction, Direction::Up);
        assert!((cells[0].change - 0.5 / 12.0 * 100.0).abs() < 1e-9);

        let panel = volatility_panel(dataset.records());
        assert_eq!(panel.date.as_deref(), Some("2024-01-15"));
        assert_eq!(panel.metrics[0].value, 15.0);
        assert!((panel.metrics[0].intensity - 0.75).abs() < 1e-9);
        assert_eq!(panel.week_move, -3.0);
        assert!((panel.week_move_intensity - 0.15).abs() < 1e-9);
    }

    /// Test persisted state: settings, layout and comments share one SQLite store
    #[test]
    fn test_dashboard_state_in_sqlite() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        let updated = settings::update_settings(
            &mut store,
            &SettingsPatch {
                theme: Some(Theme::Light),
                default_time_range: Some(TimeRange::Quarter),
                ..SettingsPatch::default()
            },
        )
        .unwrap();
        assert_eq!(updated.default_time_range, TimeRange::Quarter);

        let mut config = layout::load_layout(&store);
        config.update_section_order(View::Overview, 0, 3).unwrap();
        config.toggle_section(View::Overview, "secondary-charts").unwrap();
        layout::save_layout(&mut store, &config).unwrap();

        let comment =
            comments::add_comment(&mut store, "main-chart", "ana", "Watch the basis", now).unwrap();

        for key in [SETTINGS_KEY, LAYOUT_KEY, COMMENTS_KEY] {
            assert!(store.load(key).unwrap().is_some(), "{} not stored", key);
        }

        assert_eq!(settings::load_settings(&store).theme, Theme::Light);
        let active = layout::load_layout(&store).active_sections(View::Overview);
        let ids: Vec<&str> = active.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["main-chart", "data-table", "heatmap-correlation"]);
        assert_eq!(comments::section_comments(&store, "main-chart"), vec![comment]);

        // Resetting one document leaves the others alone
        layout::reset_layout(&mut store).unwrap();
        assert!(store.load(LAYOUT_KEY).unwrap().is_none());
        assert_eq!(settings::load_settings(&store).theme, Theme::Light);
        assert_eq!(comments::comment_count(&store, "main-chart"), 1);
    }

    /// Test boxed store: handlers hold the store as a trait object
    #[test]
    fn test_boxed_sqlite_store() {
        let mut store: Box<dyn KeyValueStore + Send> =
            Box::new(SqliteStore::new_in_memory().unwrap());
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        comments::add_comment(&mut *store, "heatmap", "ben", "PSF quiet", now).unwrap();
        assert_eq!(comments::sections_with_comments(&*store), vec!["heatmap"]);
    }
}
