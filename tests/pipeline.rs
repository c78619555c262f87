use bespin::error::BespinError;
use bespin::{
    write_obs, BinnedStatistics, BinningPlan, Diagnostic, Dimension, ObsSpace, StatKind, StatQuery,
};
use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn obs(start_hour: u32, latitude: Vec<f64>, obs_value: Vec<f64>, ombg: Vec<f64>) -> ObsSpace {
    let start = Utc.with_ymd_and_hms(2020, 12, 15, start_hour, 0, 0).unwrap();
    let end = Utc
        .with_ymd_and_hms(2020, 12, 15, start_hour + 6, 0, 0)
        .unwrap();
    let mut obs = ObsSpace::new(latitude.len()).with_window(start, end);
    obs.insert("MetaData/longitude", vec![10.0; latitude.len()])
        .unwrap();
    obs.insert("MetaData/latitude", latitude).unwrap();
    obs.insert("ObsValue/air_temperature", obs_value).unwrap();
    obs.insert("ombg/air_temperature", ombg).unwrap();
    obs
}

/// Two consecutive cycles of obs, written as obs files.
fn write_cycles(dir: &Path) -> Vec<PathBuf> {
    let first = obs(
        3,
        vec![-45.0, -45.0, 45.0, 45.0],
        vec![280.0, 282.0, 290.0, 294.0],
        vec![1.0, -1.0, 0.5, 0.5],
    );
    let second = obs(
        9,
        vec![-45.0, 45.0, 45.0],
        vec![281.0, 291.0, 293.0],
        vec![0.0, 1.0, 1.0],
    );
    let paths = vec![dir.join("cycle_03.tsv"), dir.join("cycle_09.tsv.gz")];
    write_obs(&first, &paths[0]).unwrap();
    write_obs(&second, &paths[1]).unwrap();
    paths
}

fn plan() -> BinningPlan {
    let bins = vec!["latitude:r=90".parse::<Dimension>().unwrap()];
    let diagnostics = vec![
        "ObsValue:count,sum,sum2,min,max".parse::<Diagnostic>().unwrap(),
        "ombg".parse::<Diagnostic>().unwrap(),
    ];
    BinningPlan::new("latitude", bins, diagnostics)
}

#[test]
fn test_bin_write_read() {
    let dir = tempdir().unwrap();
    let paths = write_cycles(dir.path());
    let binned = plan().bin_file(&paths[0]).unwrap();

    let written = binned.write(&dir.path().join("first"), false).unwrap();
    assert_eq!(written, dir.path().join("first.bespin"));
    let read = BinnedStatistics::read(&dir.path().join("first")).unwrap();
    assert_eq!(read, binned);
    assert_eq!(
        read.field("air_temperature", "ObsValue", StatKind::Count),
        Some(&[2.0, 2.0][..])
    );

    assert!(matches!(
        binned.write(&written, false),
        Err(BespinError::FileExists(_))
    ));
    assert!(binned.write(&written, true).is_ok());
}

#[test]
fn test_merge_files() {
    let dir = tempdir().unwrap();
    let paths = write_cycles(dir.path());
    let plan = plan();

    let separate: Vec<BinnedStatistics> = paths
        .iter()
        .map(|p| {
            let path = plan.bin_file(p).unwrap().write(&p.with_extension("x"), false).unwrap();
            BinnedStatistics::read(&path).unwrap()
        })
        .collect();
    let merged = BinnedStatistics::merge_all(separate).unwrap();
    let together = plan.bin_files(&paths, 2, |_| {}).unwrap();
    assert!(merged.equals(&together, 1e-12));

    let table = merged
        .get(
            &StatQuery::all()
                .diagnostic("ObsValue")
                .statistic(StatKind::Count)
                .statistic(StatKind::Mean)
                .statistic(StatKind::Min)
                .statistic(StatKind::Max),
        )
        .unwrap();
    let value = |name: &str| table.get(name).unwrap().values.clone();
    assert_eq!(value("air_temperature.ObsValue.count"), vec![3.0, 4.0]);
    assert_eq!(value("air_temperature.ObsValue.mean"), vec![281.0, 292.0]);
    assert_eq!(value("air_temperature.ObsValue.min"), vec![280.0, 290.0]);
    assert_eq!(value("air_temperature.ObsValue.max"), vec![282.0, 294.0]);
    assert_eq!(
        table.attributes.get("window_start").map(String::as_str),
        Some("2020-12-15T03:00:00+00:00")
    );
    assert_eq!(
        table.attributes.get("window_end").map(String::as_str),
        Some("2020-12-15T15:00:00+00:00")
    );
}

#[test]
fn test_concat_time() {
    let dir = tempdir().unwrap();
    let paths = write_cycles(dir.path());
    let plan = plan();
    let first = plan.bin_file(&paths[0]).unwrap();
    let second = plan.bin_file(&paths[1]).unwrap();

    // Out of order on purpose
    let concatenated =
        BinnedStatistics::concat_all(vec![second.clone(), first.clone()], "time").unwrap();
    let time = concatenated.dimension("time").unwrap();
    let epoch = |hour: u32| {
        Utc.with_ymd_and_hms(2020, 12, 15, hour, 0, 0)
            .unwrap()
            .timestamp() as f64
    };
    assert_eq!(time.edges(), &[epoch(3), epoch(9), epoch(15)]);
    assert_eq!(concatenated.shape(), vec![2, 2]);
    assert_eq!(
        concatenated.field("air_temperature", "ObsValue", StatKind::Count),
        Some(&[2.0, 1.0, 2.0, 2.0][..])
    );

    // Taking a cycle back out gives what was put in, less the time window
    let selected = concatenated.select_dim("time", 1).unwrap();
    assert_eq!(
        selected.field("air_temperature", "ombg", StatKind::Sum),
        second.field("air_temperature", "ombg", StatKind::Sum)
    );
    assert_eq!(
        selected.sliced_dims().get("time"),
        Some(&((epoch(9) + epoch(15)) / 2.0))
    );

    // Collapsing time is the same as merging
    let collapsed = concatenated.collapse_dim("time").unwrap();
    let merged = first.merge(&second).unwrap();
    assert_eq!(
        collapsed.field("air_temperature", "ObsValue", StatKind::Sum2),
        merged.field("air_temperature", "ObsValue", StatKind::Sum2)
    );

    // The same cycle twice overlaps
    assert!(BinnedStatistics::concat_all(vec![first.clone(), first], "time").is_err());
    assert!(matches!(
        BinnedStatistics::concat_all(vec![second], "depth"),
        Err(BespinError::MissingDimension(_))
    ));
}

#[test]
fn test_incompatible_merge() {
    let dir = tempdir().unwrap();
    let paths = write_cycles(dir.path());
    let first = plan().bin_file(&paths[0]).unwrap();
    let other = BinningPlan::new(
        "latitude",
        vec!["latitude:r=45".parse().unwrap()],
        vec!["ombg".parse().unwrap()],
    )
    .bin_file(&paths[1])
    .unwrap();
    assert!(matches!(
        first.merge(&other),
        Err(BespinError::Incompatible(_))
    ));
}
