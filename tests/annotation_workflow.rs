use std::error::Error;
use std::fs;
use std::path::Path;

use hmm_annotator::data::labels::Selection;
use hmm_annotator::data::loader;
use hmm_annotator::data::naming;
use hmm_annotator::data::repository::{ANNOTATION_DIR, RAW_DATA_DIR};
use hmm_annotator::data::{Bounds, DatasetSession, Direction, SessionConfig};

fn write_raw(root: &Path, name: &str, len: usize) -> Result<(), Box<dyn Error>> {
    let raw = root.join(RAW_DATA_DIR);
    fs::create_dir_all(&raw)?;
    let series: Vec<f64> = (0..len).map(|i| (i as f64 * 0.3).sin()).collect();
    loader::write_series(&raw.join(name), &series)?;
    Ok(())
}

#[test]
fn scope_p1_keeps_only_matching_recording() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_raw(dir.path(), "night1_p0.json", 4)?;
    write_raw(dir.path(), "bad_night1_p1.json", 6)?;

    let mut session = DatasetSession::open(dir.path(), SessionConfig::default())?;
    assert_eq!(session.count_total(), 2);

    let bounds = session.set_pointing_scope("p1")?;
    assert_eq!(session.listing(), &["bad_night1_p1.json".to_string()]);
    assert_eq!(bounds, Bounds { at_first: true, at_last: true });
    assert_eq!(session.current_name(), Some("bad_night1_p1.json"));
    assert!(session.is_bad());
    assert_eq!(session.pointing(), Some('1'));
    Ok(())
}

#[test]
fn numpy_storage_root_scopes_and_labels() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_raw(dir.path(), "night1_p0.npy", 4)?;
    write_raw(dir.path(), "bad_night1_p1.npy", 6)?;

    let mut session = DatasetSession::open(dir.path(), SessionConfig::default())?;
    assert_eq!(
        session.listing(),
        &["night1_p0.npy".to_string(), "bad_night1_p1.npy".to_string()]
    );

    session.set_pointing_scope("p1")?;
    assert_eq!(session.listing(), &["bad_night1_p1.npy".to_string()]);
    assert!(session.is_bad());
    assert_eq!(session.annotations(), &[0; 6]);

    session.label(&Selection::All, 2)?;
    session.export()?;
    session.toggle_quality()?;
    assert_eq!(session.current_name(), Some("night1_p1.npy"));
    assert_eq!(session.count_labeled("")?, 1);

    let mut fresh = DatasetSession::open(dir.path(), SessionConfig::default())?;
    fresh.select("night1_p1.npy")?;
    assert_eq!(fresh.annotations(), &[2; 6]);
    Ok(())
}

#[test]
fn scoped_listing_is_filtered_and_ordered() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    for name in [
        "ssins_2459802_p2.json",
        "bad_ssins_2459800_p2.json",
        "ssins_2459801_p0.json",
        "ssins_2459801_p2.parquet",
        "ssins_2459800_p3.csv",
    ] {
        write_raw(dir.path(), name, 3)?;
    }

    let mut session = DatasetSession::open(dir.path(), SessionConfig::default())?;
    session.set_pointing_scope("p2")?;

    let listing = session.listing().to_vec();
    assert!(listing.iter().all(|n| n.contains("p2")));
    assert_eq!(
        listing,
        vec![
            "bad_ssins_2459800_p2.json",
            "ssins_2459801_p2.parquet",
            "ssins_2459802_p2.json",
        ]
    );
    let mut sorted = listing.clone();
    sorted.sort_by(|a, b| naming::listing_order(a, b));
    assert_eq!(sorted, listing);
    Ok(())
}

#[test]
fn annotations_match_series_length_after_every_select() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_raw(dir.path(), "n_a_p0.json", 7)?;
    write_raw(dir.path(), "n_b_p0.parquet", 12)?;
    write_raw(dir.path(), "n_c_p0.csv", 1)?;

    let mut session = DatasetSession::open(dir.path(), SessionConfig::default())?;
    loop {
        assert_eq!(session.annotations().len(), session.series().len());
        if session.navigate(Direction::Next)?.at_last {
            assert_eq!(session.annotations().len(), session.series().len());
            break;
        }
    }
    assert_eq!(session.current_name(), Some("n_c_p0.csv"));
    Ok(())
}

#[test]
fn saved_annotations_survive_reselect() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_raw(dir.path(), "obs_n1_p0.parquet", 5)?;
    write_raw(dir.path(), "obs_n2_p0.parquet", 5)?;

    let mut session = DatasetSession::open(dir.path(), SessionConfig::default())?;
    session.label(&Selection::All, 1)?;
    session.label(&Selection::Indices(vec![1, 2]), 2)?;
    session.label(&Selection::Indices(vec![4]), 4)?;
    let saved = session.annotations().to_vec();
    let path = session.save()?;
    assert_eq!(path, dir.path().join(ANNOTATION_DIR).join("obs_n1_p0.parquet"));

    session.navigate(Direction::Next)?;
    assert_eq!(session.annotations(), &[0; 5]);

    let mut fresh = DatasetSession::open(dir.path(), SessionConfig::default())?;
    fresh.select("obs_n1_p0.parquet")?;
    assert_eq!(fresh.annotations(), saved.as_slice());
    assert_eq!(saved, vec![1, 2, 2, 1, 4]);
    Ok(())
}

#[test]
fn toggle_quality_twice_restores_the_pair() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_raw(dir.path(), "night1_p0.json", 4)?;

    let mut session = DatasetSession::open(dir.path(), SessionConfig::default())?;
    session.label(&Selection::All, 3)?;
    session.save()?;

    session.toggle_quality()?;
    assert_eq!(session.current_name(), Some("bad_night1_p0.json"));
    assert!(session.is_bad());
    assert_eq!(session.count_bad(), 1);
    assert!(dir.path().join(RAW_DATA_DIR).join("bad_night1_p0.json").is_file());
    assert!(dir.path().join(ANNOTATION_DIR).join("bad_night1_p0.json").is_file());
    assert!(!dir.path().join(ANNOTATION_DIR).join("night1_p0.json").exists());
    assert_eq!(session.annotations(), &[3; 4]);

    session.toggle_quality()?;
    assert_eq!(session.current_name(), Some("night1_p0.json"));
    assert!(!session.is_bad());
    assert_eq!(session.listing(), &["night1_p0.json".to_string()]);
    assert!(dir.path().join(ANNOTATION_DIR).join("night1_p0.json").is_file());
    assert_eq!(session.count_labeled("")?, 1);
    Ok(())
}

#[test]
fn previous_at_start_is_a_boundary_not_an_error() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_raw(dir.path(), "x_n1_p0.json", 2)?;
    write_raw(dir.path(), "x_n2_p0.json", 2)?;

    let mut session = DatasetSession::open(dir.path(), SessionConfig::default())?;
    let bounds = session.navigate(Direction::Previous)?;
    assert!(bounds.at_first);
    assert_eq!(session.current_index(), Some(0));
    assert_eq!(session.current_name(), Some("x_n1_p0.json"));
    Ok(())
}

#[test]
fn export_blocks_until_every_point_is_labeled() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_raw(dir.path(), "x_n1_p0.json", 4)?;

    let mut session = DatasetSession::open(dir.path(), SessionConfig::default())?;
    session.label(&Selection::Indices(vec![2]), 1)?;
    match session.export() {
        Err(hmm_annotator::data::Error::Validation { missing }) => assert_eq!(missing, 3),
        other => panic!("expected validation error, got {other:?}"),
    }

    session.label(&Selection::All, 1)?;
    assert_eq!(session.missing(), 0);
    session.export()?;
    Ok(())
}

#[test]
fn missing_storage_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = DatasetSession::open(dir.path().join("nope"), SessionConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        hmm_annotator::data::Error::StorageUnavailable { .. }
    ));
}
