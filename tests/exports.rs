use std::fs;
use std::path::PathBuf;

use player_fee_link::config::LinkConfig;
use player_fee_link::export::{export_reconciliation, export_role_analysis};
use player_fee_link::roster::{CanonicalPlayer, ExternalRecord};
use player_fee_link::table_io::{self, RosterTable};
use player_fee_link::{NameNormalizer, pipeline, reconcile};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("player_fee_link_{name}_{}", std::process::id()));
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

fn sample() -> (RosterTable, Vec<ExternalRecord>) {
    let mut palmer = CanonicalPlayer::new("Cole Palmer", "MF", 2000.0).with_team("Chelsea");
    palmer.stats.insert("Gls".to_string(), 15.0);
    let roster = RosterTable::from_players(vec![
        palmer,
        CanonicalPlayer::new("William Saliba", "DF", 2900.0).with_team("Arsenal"),
    ]);
    let listing = vec![ExternalRecord::new("Palmer, Cole", "€120M")];
    (roster, listing)
}

#[test]
fn in_memory_roster_headers() {
    let (roster, _) = sample();
    assert_eq!(roster.headers, vec!["Player", "Team", "Position", "Minutes", "Gls"]);
}

#[test]
fn unmatched_report_is_one_name_per_line() {
    let dir = scratch_dir("unmatched");
    let path = dir.join("nested").join("unmatched.txt");
    let (roster, listing) = sample();
    let out = reconcile(&roster.players, &listing, &NameNormalizer::default(), 70);
    table_io::write_unmatched(&path, &out.unmatched).expect("write report");
    assert_eq!(fs::read_to_string(&path).expect("read back"), "William Saliba\n");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn enriched_csv_round_trips_through_reader() {
    let dir = scratch_dir("enriched");
    let path = dir.join("enriched.csv");
    let (roster, listing) = sample();
    let out = reconcile(&roster.players, &listing, &NameNormalizer::default(), 70);
    table_io::write_enriched_csv(&path, &roster.headers, &out.enriched).expect("write csv");

    let back = table_io::read_roster(&path).expect("read back");
    assert_eq!(back.players.len(), 2);
    assert_eq!(back.players[0].stats.get("Valuation"), Some(&120_000_000.0));
    assert_eq!(
        back.players[0].tags.get("Linked_Name").map(String::as_str),
        Some("Palmer, Cole")
    );
    assert!(!back.players[1].stats.contains_key("Valuation"));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn workbooks_are_written() {
    let dir = scratch_dir("xlsx");
    let (roster, listing) = sample();
    let out = reconcile(&roster.players, &listing, &NameNormalizer::default(), 70);

    let path = dir.join("valuations.xlsx");
    let report = export_reconciliation(&path, "valuations", &roster.headers, &out).expect("export");
    assert_eq!(report.enriched_rows, 2);
    assert_eq!(report.unmatched_rows, 1);
    assert!(fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false));

    let cfg = LinkConfig::default();
    let analysis = pipeline::run_role_analysis(&cfg, &roster.players, &listing, Some(90)).expect("analysis");
    let path = dir.join("roles.xlsx");
    let report = export_role_analysis(&path, &analysis).expect("export");
    assert_eq!(report.enriched_rows, 1);
    assert_eq!(report.unmatched_rows, 1);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn overrides_file_replaces_builtin_table() {
    let dir = scratch_dir("overrides");
    let path = dir.join("overrides.json");
    fs::write(&path, r#"{"Cole J. Palmer": "Cole Palmer"}"#).expect("write overrides");
    let cfg = LinkConfig {
        overrides_path: Some(path),
        ..LinkConfig::default()
    };
    let norm = cfg.valuation_normalizer().expect("load overrides");
    assert_eq!(norm.normalize("Cole J. Palmer"), "Cole Palmer");
    assert_eq!(norm.normalize("Igor Thiago"), "Igor Thiago");
    let _ = fs::remove_dir_all(dir);
}
