use std::fs;
use std::path::Path;

use peak_trends::{
    AppState, Gaussian, ImportError, Metric, Region, RegionKind, EXPORT_HEADER,
};

fn write_scan(dir: &Path, name: &str, g: Gaussian) {
    let text: String = (0..=400)
        .map(|i| {
            let x = i as f64 * 0.25;
            format!("{x} {}\n", g.eval(x))
        })
        .collect();
    fs::write(dir.join(name), text).unwrap();
}

fn series_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_scan(dir.path(), "run0.csv", Gaussian::new(1.0, 40.0, 3.0));
    write_scan(dir.path(), "run25.csv", Gaussian::new(1.0, 45.0, 3.0));
    write_scan(dir.path(), "run50.csv", Gaussian::new(1.0, 50.0, 3.0));
    fs::write(dir.path().join("notes.md"), "not a scan").unwrap();
    dir
}

#[test]
fn three_scans_give_three_good_entries() {
    let dir = series_dir();
    let mut state = AppState::default();
    state.import_directory(dir.path()).unwrap();

    let result = state.set_regions(Region::new(30.0, 60.0), Region::new(35.0, 65.0));
    assert!(result.failures.is_empty());
    assert_eq!(result.series_keys(), [0.0, 25.0, 50.0]);
    for entry in &result.entries {
        assert!(entry.primary.r_squared > 0.99, "{}", entry.primary.r_squared);
        assert!(entry.secondary.r_squared > 0.99, "{}", entry.secondary.r_squared);
    }

    let centers = result.trend(RegionKind::Primary, Metric::Center);
    for ([_, c], want) in centers.iter().zip([40.0, 45.0, 50.0]) {
        assert!((c - want).abs() < 0.05, "{c} != {want}");
    }
}

#[test]
fn export_writes_header_and_one_row_per_entry() {
    let dir = series_dir();
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("trends.csv");

    let mut state = AppState::default();
    state.import_directory(dir.path()).unwrap();
    state.set_regions(Region::new(30.0, 60.0), Region::new(35.0, 65.0));
    state.export(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], EXPORT_HEADER.join(","));
    for line in &lines[1..] {
        let fields: Vec<f64> = line.split(',').map(|f| f.parse().unwrap()).collect();
        assert_eq!(fields.len(), 14);
        assert_eq!(fields[1], 30.0);
        assert_eq!(fields[8], 65.0);
    }
}

#[test]
fn deselected_scan_is_left_out_of_the_export() {
    let dir = series_dir();
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("trends.csv");

    let mut state = AppState::default();
    state.import_directory(dir.path()).unwrap();
    state.set_regions(Region::new(30.0, 60.0), Region::new(35.0, 65.0));
    assert_eq!(state.toggle_scan(0).series_keys(), [25.0, 50.0]);
    state.export(&path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
}

#[test]
fn directory_without_scans_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("readme.md"), "nothing here").unwrap();

    let mut state = AppState::default();
    assert!(matches!(
        state.import_directory(dir.path()),
        Err(ImportError::NoEligibleFiles { .. })
    ));
    assert!(state.scans.is_none());
    assert!(state.last_result.is_none());
}
