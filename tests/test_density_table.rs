//! Integration tests for the result table export

use std::fs;

use gold_density::DensityTable;

fn sample_table() -> DensityTable {
    let mut table = DensityTable::new();
    table.add_region("pyre", 50.0, 10).unwrap();
    table.add_region("cell-noPyr", 200.0, 40).unwrap();
    table.add_region("pyre", 33.3, 7).unwrap();
    table
}

#[test]
fn test_export_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("_GoldResults.csv");
    let table = sample_table();

    table.export(&path).unwrap();
    let first = fs::read(&path).unwrap();
    table.export(&path).unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_export_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("_GoldResults.csv");
    fs::write(&path, "stale,content\n".repeat(100)).unwrap();

    let mut table = DensityTable::new();
    table.add_region("pyre", 50.0, 10).unwrap();
    table.export(&path).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "ImageRois,nbGold,Area,Density\npyre,10,50,0.2\n"
    );
}

#[test]
fn test_export_leaves_no_staging_files() {
    let dir = tempfile::tempdir().unwrap();
    sample_table()
        .export(&dir.path().join("_GoldResults.csv"))
        .unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, ["_GoldResults.csv"]);
}

#[test]
fn test_export_to_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("_GoldResults.csv");

    let err = sample_table().export(&path).unwrap_err();
    assert_eq!(err.category(), "io");
    assert!(err.to_string().contains("_GoldResults.csv"));
}

#[test]
fn test_rows_keep_insertion_order() {
    let labels: Vec<_> = sample_table().iter().map(|r| r.label.clone()).collect();
    assert_eq!(labels, ["pyre", "cell-noPyr", "pyre"]);
}

#[test]
fn test_densities_match_count_over_area() {
    let mut table = DensityTable::new();
    let cases = [(50.0, 10), (200.0, 40), (0.75, 3), (1e6, 1), (13.0, 0)];
    for (i, (area, count)) in cases.iter().enumerate() {
        table.add_region(format!("r{}", i), *area, *count).unwrap();
    }
    for (record, (area, count)) in table.iter().zip(cases) {
        let expected = count as f64 / area;
        assert!((record.density - expected).abs() <= f64::EPSILON * expected.max(1.0));
    }
}

#[cfg(unix)]
#[test]
fn test_export_keeps_existing_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("_GoldResults.csv");
    fs::write(&path, "old\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o664)).unwrap();

    sample_table().export(&path).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o664);
}

#[cfg(unix)]
#[test]
fn test_new_export_is_readable_by_others() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("_GoldResults.csv");
    sample_table().export(&path).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
}
