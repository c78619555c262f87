// test_utils.rs

#[cfg(test)]
pub mod test_utils {
    use chrono::{TimeZone, Utc};
    use std::env;
    use std::path::{Path, PathBuf};
    use tempfile;

    use crate::obs::ObsSpace;

    pub struct TestDir {
        dir: PathBuf,
        #[allow(dead_code)] // held so the directory lives as long as the TestDir
        temp_dir: Option<tempfile::TempDir>,
    }

    impl TestDir {
        pub fn new(prefix: &str) -> std::io::Result<Self> {
            let keep_output = env::var("KEEP_TEST_OUTPUT").is_ok();
            if keep_output {
                let output_dir = env::current_dir()?.join("test_output").join(prefix);
                std::fs::create_dir_all(&output_dir)?;
                Ok(TestDir {
                    dir: output_dir,
                    temp_dir: None,
                })
            } else {
                let temp_dir = tempfile::tempdir()?;
                let dir = temp_dir.path().to_path_buf();
                Ok(TestDir {
                    dir,
                    temp_dir: Some(temp_dir),
                })
            }
        }

        pub fn path(&self) -> &Path {
            &self.dir
        }
    }

    /// Five radiosonde-like obs of `air_temperature`, one in each quadrant
    /// of a 2x2 lat/lon binning except the last, which holds two.
    ///
    /// | loc | lat | lon | ObsValue | ombg |
    /// |-----|-----|-----|----------|------|
    /// | 0   | -45 |  90 | 280      | 0.5  |
    /// | 1   | -45 | 270 | 285      | -0.5 |
    /// | 2   |  45 |  10 | 290      | 1.0  |
    /// | 3   |  45 | -90 | 300      | 0.25 |
    /// | 4   |  45 | 200 | 295      | 0.25 |
    pub fn obs_fixture() -> ObsSpace {
        let mut obs = ObsSpace::new(5).with_window(
            Utc.with_ymd_and_hms(2020, 12, 15, 3, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 12, 15, 9, 0, 0).unwrap(),
        );
        obs.insert("MetaData/latitude", vec![-45.0, -45.0, 45.0, 45.0, 45.0])
            .unwrap();
        obs.insert("MetaData/longitude", vec![90.0, 270.0, 10.0, -90.0, 200.0])
            .unwrap();
        obs.insert(
            "ObsValue/air_temperature",
            vec![280.0, 285.0, 290.0, 300.0, 295.0],
        )
        .unwrap();
        obs.insert("ombg/air_temperature", vec![0.5, -0.5, 1.0, 0.25, 0.25])
            .unwrap();
        obs
    }

    /// Three obs of a two channel `brightness_temperature`.
    pub fn multichannel_fixture() -> ObsSpace {
        let mut obs = ObsSpace::with_channels(3, vec![4, 7]).with_window(
            Utc.with_ymd_and_hms(2020, 12, 15, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 12, 15, 15, 0, 0).unwrap(),
        );
        obs.insert("MetaData/latitude", vec![-10.0, 10.0, 20.0])
            .unwrap();
        obs.insert("MetaData/longitude", vec![0.0, 0.0, 0.0]).unwrap();
        obs.insert_multichannel(
            "ObsValue/brightness_temperature",
            vec![200.0, 210.0, 220.0, f64::NAN, 240.0, 250.0],
        )
        .unwrap();
        obs.insert_multichannel(
            "ombg/brightness_temperature",
            vec![1.0, 2.0, 3.0, f64::NAN, 5.0, 6.0],
        )
        .unwrap();
        obs
    }
}
