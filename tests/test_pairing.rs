//! Integration tests for image/mask pairing
//!
//! Only `<name>.tif` files with a `<name>_seg.tif` next to them are paired,
//! matching is exact and case-sensitive, and pairs come out in file-name order.

mod common;

use std::fs;

use gold_density::PairingRules;

fn stems(dir: &std::path::Path, rules: &PairingRules) -> Vec<String> {
    rules
        .pairs(dir)
        .expect("folder should be listable")
        .map(|pair| pair.stem)
        .collect()
}

#[test]
fn test_lone_image_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    common::add_image(dir.path(), "cellA", true);
    common::add_image(dir.path(), "cellB", false);

    let pairs: Vec<_> = PairingRules::default().pairs(dir.path()).unwrap().collect();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].stem, "cellA");
    assert_eq!(pairs[0].image, dir.path().join("cellA.tif"));
    assert_eq!(pairs[0].mask, dir.path().join("cellA_seg.tif"));
}

#[test]
fn test_pairs_in_file_name_order() {
    let dir = tempfile::tempdir().unwrap();
    for stem in ["cellC", "cellA", "cellB"] {
        common::add_image(dir.path(), stem, true);
    }
    assert_eq!(
        stems(dir.path(), &PairingRules::default()),
        ["cellA", "cellB", "cellC"]
    );
}

#[test]
fn test_matching_is_case_sensitive() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("upper.TIF"), b"").unwrap();
    fs::write(dir.path().join("upper_seg.TIF"), b"").unwrap();
    fs::write(dir.path().join("mixed.tif"), b"").unwrap();
    fs::write(dir.path().join("mixed_SEG.tif"), b"").unwrap();
    fs::write(dir.path().join("long.tif"), b"").unwrap();
    fs::write(dir.path().join("long_seg.tiff"), b"").unwrap();

    assert!(stems(dir.path(), &PairingRules::default()).is_empty());
}

#[test]
fn test_masks_and_other_files_are_not_images() {
    let dir = tempfile::tempdir().unwrap();
    common::add_image(dir.path(), "cellA", true);
    // a mask whose own "mask" happens to exist must not become an image
    fs::write(dir.path().join("cellA_seg_seg.tif"), b"").unwrap();
    fs::write(dir.path().join("_GoldResults.csv"), b"").unwrap();
    fs::write(dir.path().join("cellA_rois.zip"), b"").unwrap();
    fs::create_dir(dir.path().join("nested.tif")).unwrap();
    fs::write(dir.path().join("nested_seg.tif"), b"").unwrap();

    assert_eq!(stems(dir.path(), &PairingRules::default()), ["cellA"]);
}

#[test]
fn test_mask_must_be_a_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cellA.tif"), b"").unwrap();
    fs::create_dir(dir.path().join("cellA_seg.tif")).unwrap();

    assert!(stems(dir.path(), &PairingRules::default()).is_empty());
}

#[test]
fn test_mask_existence_checked_lazily() {
    let dir = tempfile::tempdir().unwrap();
    common::add_image(dir.path(), "cellA", true);
    common::add_image(dir.path(), "cellB", false);

    let mut pairs = PairingRules::default().pairs(dir.path()).unwrap();
    assert_eq!(pairs.next().unwrap().stem, "cellA");

    // the mask shows up after listing but before the iterator reaches cellB
    common::write_tiff(dir.path(), "cellB_seg.tif");
    assert_eq!(pairs.next().unwrap().stem, "cellB");
    assert!(pairs.next().is_none());
}

#[test]
fn test_custom_convention() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.png"), b"").unwrap();
    fs::write(dir.path().join("a_mask.png"), b"").unwrap();
    fs::write(dir.path().join("b.tif"), b"").unwrap();
    fs::write(dir.path().join("b_seg.tif"), b"").unwrap();

    assert_eq!(stems(dir.path(), &PairingRules::new(".png", "_mask")), ["a"]);
}
