// obs/reader.rs
//
// Observation diagnostic files are delimited text (tab or comma separated,
// optionally gzip compressed). Leading `#` lines hold directives:
//
//   # window_start: 2020-12-15T03:00:00Z
//   # window_end: 2020-12-15T09:00:00Z
//   MetaData/latitude	MetaData/longitude	ObsValue/brightness_temperature@3	...
//
// A column named `<Group>/<variable>@<channel>` holds one channel of a
// multichannel variable.

use std::io::{BufRead, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use rustc_hash::FxHashMap;
use tracing::debug;

use super::{ObsSpace, ObsVariable, CHANNEL_VARIABLE};
use crate::error::{BespinError, Result};
use crate::io::{InputStream, OutputStream};

const WINDOW_START: &str = "window_start";
const WINDOW_END: &str = "window_end";
const DATETIME_SUFFIX: &str = "dateTime";

/// Where a column's values go.
struct ColumnTarget {
    variable: usize,
    channel: Option<usize>,
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn epoch_seconds(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9
}

fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    let whole = seconds.floor();
    DateTime::from_timestamp(whole as i64, ((seconds - whole) * 1e9) as u32)
}

/// Parse a single cell. Date-times may be RFC3339 or epoch seconds; anything
/// else that isn't a number (including empty cells) is missing.
fn parse_cell(cell: &str, is_datetime: bool) -> f64 {
    if let Ok(v) = cell.parse::<f64>() {
        return v;
    }
    if is_datetime {
        if let Some(dt) = parse_datetime(cell) {
            return epoch_seconds(&dt);
        }
    }
    f64::NAN
}

/// Split a column header into its variable name and optional channel.
fn parse_column(header: &str) -> (String, Option<i64>) {
    if let Some((name, channel)) = header.rsplit_once('@') {
        if let Ok(channel) = channel.parse::<i64>() {
            return (name.to_string(), Some(channel));
        }
    }
    (header.to_string(), None)
}

/// Read an observation diagnostics file into an [`ObsSpace`].
pub fn read_obs(path: &Path) -> Result<ObsSpace> {
    if !path.exists() {
        return Err(BespinError::FileNotFound(path.to_path_buf()));
    }
    let invalid = |reason: String| BespinError::InvalidObs {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = InputStream::new(path).reader()?;

    // Directives, up to the header line.
    let mut directives: FxHashMap<String, String> = FxHashMap::default();
    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header)? == 0 {
            return Err(invalid("no header line found".to_string()));
        }
        let Some(directive) = header.trim().strip_prefix('#') else {
            if header.trim().is_empty() {
                continue;
            }
            break;
        };
        if let Some((key, value)) = directive.split_once(':') {
            directives.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    let delimiter = if header.contains('\t') { b'\t' } else { b',' };

    let mut csv_reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(header.as_bytes().chain(reader));

    // Work out the variables, and the channels of multichannel ones.
    let columns: Vec<(String, Option<i64>)> = csv_reader
        .headers()?
        .iter()
        .map(parse_column)
        .collect();
    let mut channels: Vec<i64> = columns.iter().filter_map(|(_, ch)| *ch).collect();
    channels.sort_unstable();
    channels.dedup();
    let channel_index: FxHashMap<i64, usize> =
        channels.iter().enumerate().map(|(i, c)| (*c, i)).collect();

    let mut names: Vec<(String, bool)> = Vec::new();
    let mut targets = Vec::with_capacity(columns.len());
    for (name, channel) in &columns {
        let variable = match names.iter().position(|(n, _)| n == name) {
            Some(i) => {
                if names[i].1 != channel.is_some() {
                    return Err(invalid(format!(
                        "variable \"{}\" mixes single and multichannel columns",
                        name
                    )));
                }
                i
            }
            None => {
                names.push((name.clone(), channel.is_some()));
                names.len() - 1
            }
        };
        targets.push(ColumnTarget {
            variable,
            channel: channel.map(|c| channel_index[&c]),
        });
    }
    let is_datetime: Vec<bool> = names
        .iter()
        .map(|(n, _)| n.ends_with(DATETIME_SUFFIX))
        .collect();

    // Read the rows.
    let nchans = channels.len().max(1);
    let mut data: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    let mut nlocs = 0;
    for record in csv_reader.records() {
        let record = record?;
        if record.len() != targets.len() {
            return Err(invalid(format!(
                "row {} has {} fields, expected {}",
                nlocs + 1,
                record.len(),
                targets.len()
            )));
        }
        for (values, (_, multichannel)) in data.iter_mut().zip(&names) {
            let width = if *multichannel { nchans } else { 1 };
            values.resize((nlocs + 1) * width, f64::NAN);
        }
        for (cell, target) in record.iter().zip(&targets) {
            let value = parse_cell(cell, is_datetime[target.variable]);
            let slot = match target.channel {
                Some(ch) => nlocs * nchans + ch,
                None => nlocs,
            };
            data[target.variable][slot] = value;
        }
        nlocs += 1;
    }

    let mut obs = if channels.is_empty() {
        ObsSpace::new(nlocs)
    } else {
        ObsSpace::with_channels(nlocs, channels.clone())
    };
    for ((name, multichannel), values) in names.iter().zip(data) {
        let variable = ObsVariable {
            values,
            multichannel: *multichannel,
        };
        obs.insert_variable(name, variable)?;
    }

    // The obs window, from the directives or else from the observation times.
    let window = |key: &str| -> Result<Option<DateTime<Utc>>> {
        directives
            .get(key)
            .map(|v| {
                parse_datetime(v).ok_or_else(|| invalid(format!("invalid {}: \"{}\"", key, v)))
            })
            .transpose()
    };
    obs.window_start = window(WINDOW_START)?;
    obs.window_end = window(WINDOW_END)?;
    if obs.window_start.is_none() || obs.window_end.is_none() {
        let times: Vec<f64> = obs
            .names()
            .filter(|n| n.ends_with(DATETIME_SUFFIX))
            .filter_map(|n| obs.get(n))
            .flat_map(|v| v.values().iter().copied())
            .filter(|t| t.is_finite())
            .collect();
        let min = times.iter().copied().reduce(f64::min);
        let max = times.iter().copied().reduce(f64::max);
        obs.window_start = obs.window_start.or(min.and_then(from_epoch_seconds));
        obs.window_end = obs.window_end.or(max.and_then(from_epoch_seconds));
    }

    debug!(
        "read {} locations, {} channels, {} variables from {}",
        obs.nlocs(),
        channels.len(),
        names.len(),
        path.display()
    );
    Ok(obs)
}

/// Write an [`ObsSpace`] as a tab separated observation file (gzip
/// compressed if the path ends in `.gz`).
pub fn write_obs(obs: &ObsSpace, path: &Path) -> Result<()> {
    let mut writer = OutputStream::new(Some(path)).writer()?;
    if let Some(start) = obs.window_start {
        writeln!(writer, "# {}: {}", WINDOW_START, start.to_rfc3339())?;
    }
    if let Some(end) = obs.window_end {
        writeln!(writer, "# {}: {}", WINDOW_END, end.to_rfc3339())?;
    }

    let channels = obs.channels().unwrap_or(&[]);
    let nchans = obs.nchans();
    let mut columns: Vec<(String, &ObsVariable, Option<usize>)> = Vec::new();
    for name in obs.names() {
        // the channel coordinate comes back from the column names
        if name == CHANNEL_VARIABLE {
            continue;
        }
        let Some(variable) = obs.get(name) else {
            continue;
        };
        if variable.is_multichannel() {
            for (i, ch) in channels.iter().enumerate() {
                columns.push((format!("{}@{}", name, ch), variable, Some(i)));
            }
        } else {
            columns.push((name.to_string(), variable, None));
        }
    }

    let header: Vec<&str> = columns.iter().map(|(n, _, _)| n.as_str()).collect();
    writeln!(writer, "{}", header.join("\t"))?;
    let mut line = String::new();
    for loc in 0..obs.nlocs() {
        line.clear();
        for (i, (_, variable, channel)) in columns.iter().enumerate() {
            if i > 0 {
                line.push('\t');
            }
            let value = match channel {
                Some(ch) => variable.values()[loc * nchans + ch],
                None => variable.values()[loc],
            };
            // missing values are empty cells, infinities are "inf"/"-inf"
            if !value.is_nan() {
                line.push_str(&value.to_string());
            }
        }
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::TestDir;
    use std::fs;

    #[test]
    fn test_read_single_channel() {
        let test_dir = TestDir::new("obs_read_single").expect("Failed to create test dir");
        let path = test_dir.path().join("sondes.tsv");
        fs::write(
            &path,
            "# window_start: 2020-12-15T03:00:00Z\n\
             # window_end: 2020-12-15T09:00:00Z\n\
             MetaData/latitude\tMetaData/longitude\tObsValue/air_temperature\tombg/air_temperature\n\
             10.0\t-20.0\t280.5\t0.5\n\
             -45.5\t200.0\t\t-1.0\n",
        )
        .unwrap();

        let obs = read_obs(&path).unwrap();
        assert_eq!(obs.nlocs(), 2);
        assert!(obs.channels().is_none());
        assert_eq!(
            obs.get("MetaData/longitude").unwrap().values(),
            &[-20.0, 200.0]
        );
        let t = obs.get("ObsValue/air_temperature").unwrap().values();
        assert_eq!(t[0], 280.5);
        assert!(t[1].is_nan());
        assert_eq!(
            obs.window_start.unwrap().to_rfc3339(),
            "2020-12-15T03:00:00+00:00"
        );
    }

    #[test]
    fn test_read_multichannel_csv() {
        let test_dir = TestDir::new("obs_read_multi").expect("Failed to create test dir");
        let path = test_dir.path().join("amsua.csv");
        fs::write(
            &path,
            "MetaData/latitude,MetaData/dateTime,ObsValue/brightness_temperature@5,ObsValue/brightness_temperature@3\n\
             1.0,2020-12-15T03:00:00Z,250.0,230.0\n\
             2.0,2020-12-15T04:00:00Z,251.0,231.0\n",
        )
        .unwrap();

        let obs = read_obs(&path).unwrap();
        assert_eq!(obs.channels(), Some(&[3i64, 5][..]));
        let bt = obs.get("ObsValue/brightness_temperature").unwrap();
        assert!(bt.is_multichannel());
        // channel 3 first
        assert_eq!(bt.values(), &[230.0, 250.0, 231.0, 251.0]);

        // window taken from the observation times
        assert_eq!(
            obs.window_start.unwrap().to_rfc3339(),
            "2020-12-15T03:00:00+00:00"
        );
        assert_eq!(
            obs.window_end.unwrap().to_rfc3339(),
            "2020-12-15T04:00:00+00:00"
        );
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_obs(Path::new("/nonexistent/obs.tsv")).unwrap_err();
        assert!(matches!(err, BespinError::FileNotFound(_)));
    }

    #[test]
    fn test_write_read_gzip() {
        let test_dir = TestDir::new("obs_write_gzip").expect("Failed to create test dir");
        let path = test_dir.path().join("obs.tsv.gz");

        let mut obs = ObsSpace::with_channels(2, vec![7, 9]);
        obs.insert("MetaData/latitude", vec![1.0, 2.0]).unwrap();
        obs.insert_multichannel("ombg/brightness_temperature", vec![0.5, f64::NAN, 1.5, 2.5])
            .unwrap();
        write_obs(&obs, &path).unwrap();

        let read = read_obs(&path).unwrap();
        assert_eq!(read.channels(), Some(&[7i64, 9][..]));
        let values = read.get("ombg/brightness_temperature").unwrap().values();
        assert_eq!(values[0], 0.5);
        assert!(values[1].is_nan());
        assert_eq!(values[3], 2.5);
    }

    #[test]
    fn test_write_read_infinite() {
        let test_dir = TestDir::new("obs_write_inf").expect("Failed to create test dir");
        let path = test_dir.path().join("obs.tsv");

        let mut obs = ObsSpace::new(3);
        obs.insert("MetaData/latitude", vec![1.0, 2.0, 3.0]).unwrap();
        obs.insert("ombg/t", vec![f64::INFINITY, f64::NEG_INFINITY, f64::NAN])
            .unwrap();
        write_obs(&obs, &path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("1\tinf\n2\t-inf\n3\t\n"));

        let values = read_obs(&path).unwrap().get("ombg/t").unwrap().values().to_vec();
        assert_eq!(values[0], f64::INFINITY);
        assert_eq!(values[1], f64::NEG_INFINITY);
        assert!(values[2].is_nan());
    }
}
