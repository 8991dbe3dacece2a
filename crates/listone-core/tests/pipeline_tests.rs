// Integration tests for the listone pipeline.
//
// These run the full registry → CSV reader → normalizer → aggregator →
// JSON document chain over the fixture exports in tests/fixtures/seasons.
// The fixtures cover three of the four sources for 2025_26 and only
// fantaboom for 2024_25; every other declared file is missing on purpose.

use std::path::{Path, PathBuf};

use listone_core::aggregate::{PriceStats, SeasonPerformance};
use listone_core::config::{parse_config, Config};
use listone_core::document::PlayerDatabase;
use listone_core::pipeline::{self, PipelineError};
use listone_core::reader::CsvReader;

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the crate root, which is the cwd for
/// `cargo test`).
const FIXTURES: &str = "tests/fixtures/seasons";

/// Built-in registry pointed at the fixtures, writing into a fresh temp dir.
fn fixture_config(out_name: &str) -> (Config, PathBuf) {
    let out_dir = std::env::temp_dir().join(out_name);
    let _ = std::fs::remove_dir_all(&out_dir);

    let mut config = parse_config("", Path::new(".")).expect("empty config is valid");
    config.data_dir = PathBuf::from(FIXTURES);
    config.output_path = out_dir.join("players_database.json");
    (config, out_dir)
}

fn reader(config: &Config) -> CsvReader {
    CsvReader::new(config.delimiter)
}

// ===========================================================================
// Full run
// ===========================================================================

#[test]
fn full_run_over_fixtures() {
    let (config, out_dir) = fixture_config("listone_it_full_run");

    let summary = pipeline::run(&config, &reader(&config)).expect("run should succeed");

    // Four of eight declared files exist.
    assert_eq!(summary.sources.len(), 4);
    let loaded: Vec<(&str, &str)> = summary
        .sources
        .iter()
        .map(|s| (s.season.as_str(), s.source.as_str()))
        .collect();
    assert_eq!(
        loaded,
        vec![
            ("2025_26", "fantaboom"),
            ("2025_26", "profeta"),
            ("2025_26", "sos_fanta"),
            ("2024_25", "fantaboom"),
        ]
    );

    // The price-less row in profeta is rejected, the blank line is skipped.
    let profeta = &summary.sources[1];
    assert_eq!(profeta.rows, 3);
    assert_eq!(profeta.rejected, 1);
    assert_eq!(summary.rows, 10);

    let db = &summary.database;
    assert_eq!(db.roles(), vec!["A", "D", "C", "P"]);
    assert_eq!(db.len(), 5);

    assert!(config.output_path.exists());

    let _ = std::fs::remove_dir_all(&out_dir);
}

#[test]
fn price_statistics_and_history() {
    let (config, _) = fixture_config("listone_it_prices");
    let summary = pipeline::build_database(&config, &reader(&config)).unwrap();
    let db = &summary.database;

    let lautaro = db.player("A", "Lautaro Martínez").unwrap();
    assert_eq!(lautaro.team, "Inter");
    assert_eq!(lautaro.prices, PriceStats { min: 35, max: 41, avg: 38.5 });
    assert_eq!(lautaro.all_prices.len(), 4);
    assert_eq!(lautaro.all_prices["fantaboom_2025"], 38);
    assert_eq!(lautaro.all_prices["profeta_2025"], 41);
    assert_eq!(lautaro.all_prices["sos_fanta_2025"], 40);
    assert_eq!(lautaro.all_prices["fantaboom_2024"], 35);

    let di_lorenzo = db.player("D", "Di Lorenzo").unwrap();
    assert_eq!(di_lorenzo.prices.min, 12);
    assert_eq!(di_lorenzo.prices.max, 13);
    assert!((di_lorenzo.prices.avg - 12.3).abs() < 1e-9);
}

#[test]
fn performance_first_row_wins_and_registry_seasons_filled() {
    let (config, _) = fixture_config("listone_it_performance");
    let summary = pipeline::build_database(&config, &reader(&config)).unwrap();
    let db = &summary.database;

    let lautaro = db.player("A", "Lautaro Martínez").unwrap();
    let current = lautaro.performance["2025_26"];
    // fantaboom is read before profeta, so its line is kept.
    assert_eq!(current.goals, 24);
    assert_eq!(current.assists, 3);
    assert_eq!(current.minutes, 2700);
    assert!((current.rating - 7.1).abs() < 1e-9);
    assert_eq!(lautaro.performance["2024_25"].goals, 22);

    let maignan = db.player("P", "Maignan").unwrap();
    assert_eq!(maignan.performance.len(), 2);
    assert_eq!(maignan.performance["2025_26"], SeasonPerformance::default());
    assert_eq!(maignan.performance["2024_25"].minutes, 3150);

    let di_lorenzo = db.player("D", "Di Lorenzo").unwrap();
    assert_eq!(di_lorenzo.performance["2024_25"], SeasonPerformance::default());
}

#[test]
fn annotations_prefer_sos_fanta_then_first_other() {
    let (config, _) = fixture_config("listone_it_notes");
    let summary = pipeline::build_database(&config, &reader(&config)).unwrap();
    let db = &summary.database;

    // sos_fanta is read after profeta but still wins.
    assert_eq!(
        db.player("A", "Lautaro Martínez").unwrap().notes.comm,
        "Top assoluto"
    );
    // sos_fanta has an empty comment for Di Lorenzo: fall back to profeta.
    assert_eq!(db.player("D", "Di Lorenzo").unwrap().notes.comm, "Rigori no");
    assert_eq!(db.player("C", "Frattesi").unwrap().notes.comm, "");
}

#[test]
fn multi_role_player_has_one_record_per_role() {
    let (config, _) = fixture_config("listone_it_roles");
    let summary = pipeline::build_database(&config, &reader(&config)).unwrap();
    let db = &summary.database;

    let as_midfielder = db.player("C", "Frattesi").unwrap();
    let as_forward = db.player("A", "Frattesi").unwrap();
    assert_eq!(as_midfielder.prices.avg, 15.0);
    assert_eq!(as_forward.prices.avg, 9.0);
    assert_eq!(as_forward.all_prices.keys().collect::<Vec<_>>(), vec!["profeta_2025"]);
}

// ===========================================================================
// Output document
// ===========================================================================

#[test]
fn written_document_round_trips() {
    let (config, out_dir) = fixture_config("listone_it_round_trip");
    let summary = pipeline::run(&config, &reader(&config)).unwrap();

    let back = PlayerDatabase::read_json(&config.output_path).unwrap();
    assert_eq!(back, summary.database);

    let _ = std::fs::remove_dir_all(&out_dir);
}

#[test]
fn written_document_shape() {
    let (config, out_dir) = fixture_config("listone_it_shape");
    pipeline::run(&config, &reader(&config)).unwrap();

    let text = std::fs::read_to_string(&config.output_path).unwrap();
    assert!(text.contains("\"nome\": \"Lautaro Martínez\""));

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let forwards = value["A"].as_array().unwrap();
    assert_eq!(forwards[0]["nome"], "Lautaro Martínez");
    assert_eq!(forwards[0]["prezzi"]["avg"], 38.5);
    assert_eq!(forwards[0]["allPrices"]["sos_fanta_2025"], 40);
    assert_eq!(forwards[0]["performance"]["2024_25"]["assists"], 4);
    assert_eq!(forwards[0]["notes"]["comm"], "Top assoluto");
    assert_eq!(forwards[1]["nome"], "Frattesi");

    let _ = std::fs::remove_dir_all(&out_dir);
}

// ===========================================================================
// Failure modes
// ===========================================================================

#[test]
fn no_source_files_aborts_without_output() {
    let (mut config, out_dir) = fixture_config("listone_it_no_sources");
    config.data_dir = out_dir.join("does-not-exist");

    let err = pipeline::run(&config, &reader(&config)).unwrap_err();
    assert!(matches!(err, PipelineError::NoSourceData { declared: 8, .. }));
    assert!(err.to_string().contains("no source data found"));
    assert!(!config.output_path.exists());
}
