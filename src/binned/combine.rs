// binned/combine.rs
//
// Merging, concatenating and slicing binned statistics.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use super::BinnedStatistics;
use crate::binning::{calc_size, BinLocator, Dimension};
use crate::error::{BespinError, Result};
use crate::statistic::field_name;

/// The only dimension that can be made up for inputs that weren't binned
/// along it, from their obs window.
pub const TIME_DIMENSION: &str = "time";

fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn epoch_seconds(dt: DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9
}

impl BinnedStatistics {
    /// Merge with `other`, giving the same statistics as if all the
    /// observations had been binned together.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        if !self.equivalent(other) {
            return Err(BespinError::Incompatible(format!(
                "cannot merge \"{}\" with \"{}\", the binning differs",
                self.name, other.name
            )));
        }

        let mut merged = self.clone();
        for variable in self.variables.keys() {
            for diag in &self.diagnostics {
                for stat in diag.statistics() {
                    let values = stat.merge(
                        |k| self.field(variable, &diag.name, k),
                        |k| other.field(variable, &diag.name, k),
                    )?;
                    merged
                        .fields
                        .insert(field_name(variable, &diag.name, *stat), values);
                }
            }
        }
        merged.window_start = earliest(self.window_start, other.window_start);
        merged.window_end = latest(self.window_end, other.window_end);
        Ok(merged)
    }

    /// Merge one or more binned statistics, in order.
    pub fn merge_all<I>(binned: I) -> Result<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut iter = binned.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| BespinError::from("nothing to merge"))?;
        iter.try_fold(first, |acc, next| acc.merge(&next))
    }

    /// Index of the binning dimension `dim`.
    fn axis(&self, dim: &str) -> Result<usize> {
        self.bins
            .iter()
            .position(|b| b.name == dim)
            .ok_or_else(|| BespinError::MissingDimension(dim.to_string()))
    }

    /// Take slice `index` along `axis` of every field, removing the axis.
    fn slice(&self, axis: usize, index: usize) -> Result<Self> {
        let mut sliced = self.clone();
        sliced.bins.remove(axis);
        for variable in self.variables.keys() {
            let shape = self.field_shape(variable)?;
            let (reduced, mapping) = BinLocator::new(shape).project_out(axis);
            for diag in &self.diagnostics {
                for stat in diag.statistics() {
                    let name = field_name(variable, &diag.name, *stat);
                    let Some(values) = self.fields.get(&name) else {
                        continue;
                    };
                    let mut out = vec![f64::NAN; reduced.size()];
                    for (value, (offset, along)) in values.iter().zip(&mapping) {
                        if *along == index {
                            out[*offset] = *value;
                        }
                    }
                    sliced.fields.insert(name, out);
                }
            }
        }
        Ok(sliced)
    }

    /// Remove dimension `dim` by selecting the bin at `index` along it.
    /// The selected bin center is recorded in the sliced dimensions.
    pub fn select_dim(&self, dim: &str, index: usize) -> Result<Self> {
        let axis = self.axis(dim)?;
        let dimension = &self.bins[axis];
        let center = dimension.centers().get(index).copied().ok_or_else(|| {
            BespinError::InvalidDimension {
                name: dim.to_string(),
                reason: format!("index {} out of range for {} bins", index, dimension.len()),
            }
        })?;
        let mut sliced = self.slice(axis, index)?;
        sliced.sliced_dims.insert(dim.to_string(), center);
        Ok(sliced)
    }

    /// Remove dimension `dim` by merging all the bins along it.
    pub fn collapse_dim(&self, dim: &str) -> Result<Self> {
        let axis = self.axis(dim)?;
        let slices = (0..self.bins[axis].len())
            .map(|i| self.slice(axis, i))
            .collect::<Result<Vec<_>>>()?;
        Self::merge_all(slices)
    }

    /// This binning with a single bin `time` dimension spanning its obs
    /// window, appended after the other dimensions.
    fn with_time_dimension(&self) -> Result<Self> {
        let (Some(start), Some(end)) = (self.window_start, self.window_end) else {
            return Err(BespinError::Incompatible(format!(
                "\"{}\" has no obs window to make a \"{}\" dimension from",
                self.name, TIME_DIMENSION
            )));
        };
        let mut extended = self.clone();
        extended.bins.push(Dimension::single(
            TIME_DIMENSION,
            epoch_seconds(start),
            epoch_seconds(end),
        )?);
        Ok(extended)
    }

    /// Concatenate binned statistics along dimension `dim`.
    ///
    /// Inputs without `dim` get a single bin along it, which is only
    /// possible for `time`. Inputs are ordered by their first bin edge along
    /// `dim` and must join up exactly. Everything else about the binning
    /// must match.
    pub fn concat_all<I>(binned: I, dim: &str) -> Result<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut inputs = binned
            .into_iter()
            .map(|b| match b.dimension(dim) {
                Some(_) => Ok(b),
                None if dim == TIME_DIMENSION => b.with_time_dimension(),
                None => Err(BespinError::MissingDimension(dim.to_string())),
            })
            .collect::<Result<Vec<_>>>()?;
        if inputs.is_empty() {
            return Err("nothing to concatenate".into());
        }
        let first_edge = |b: &Self| b.dimension(dim).map_or(f64::NAN, |d| d.bounds().0);
        inputs.sort_by(|a, b| first_edge(a).total_cmp(&first_edge(b)));

        let first = &inputs[0];
        let axis = first.axis(dim)?;
        let mut joined = first.bins[axis].clone();
        for other in &inputs[1..] {
            let same_structure = other.axis(dim)? == axis
                && other.bins.len() == first.bins.len()
                && other
                    .bins
                    .iter()
                    .zip(&first.bins)
                    .enumerate()
                    .all(|(i, (a, b))| i == axis || a == b)
                && other.name == first.name
                && other.diagnostics == first.diagnostics
                && other.variables == first.variables
                && other.channels == first.channels
                && other.sliced_dims == first.sliced_dims;
            if !same_structure {
                return Err(BespinError::Incompatible(format!(
                    "cannot concatenate along \"{}\", the rest of the binning differs",
                    dim
                )));
            }
            joined = joined.extend(&other.bins[axis])?;
        }

        let mut result = first.clone();
        result.bins[axis] = joined;
        let mut fields = IndexMap::new();
        for variable in first.variables.keys() {
            let shape = first.field_shape(variable)?;
            let outer = calc_size(&shape[..axis]);
            let inner = calc_size(&shape[axis + 1..]);
            for diag in &first.diagnostics {
                for stat in diag.statistics() {
                    let name = field_name(variable, &diag.name, *stat);
                    let parts = inputs
                        .iter()
                        .map(|b| {
                            let block = b.bins[axis].len() * inner;
                            b.fields
                                .get(&name)
                                .map(|v| (v.as_slice(), block))
                                .ok_or_else(|| BespinError::MissingVariable(name.clone()))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    let mut out = Vec::with_capacity(parts.iter().map(|(v, _)| v.len()).sum());
                    for o in 0..outer {
                        for (values, block) in &parts {
                            out.extend_from_slice(&values[o * block..(o + 1) * block]);
                        }
                    }
                    fields.insert(name, out);
                }
            }
        }
        result.fields = fields;
        for other in &inputs[1..] {
            result.window_start = earliest(result.window_start, other.window_start);
            result.window_end = latest(result.window_end, other.window_end);
        }
        debug!(
            "concatenated {} inputs along {} ({} bins)",
            inputs.len(),
            dim,
            result.bins[axis].len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binned::tests::{bin_fixture, latlon_bins};
    use crate::diagnostic::Diagnostic;
    use crate::obs::ObsSpace;
    use crate::statistic::StatKind;
    use crate::test_utils::test_utils::obs_fixture;
    use chrono::{Duration, TimeZone};

    fn split_fixture() -> (ObsSpace, ObsSpace) {
        let obs = obs_fixture();
        let mut a = obs.clone();
        a.retain_locations(&[true, false, true, false, true]).unwrap();
        let mut b = obs;
        b.retain_locations(&[false, true, false, true, false]).unwrap();
        (a, b)
    }

    #[test]
    fn test_merge_matches_binning_together() {
        let (a, b) = split_fixture();
        let merged = bin_fixture("latlon", latlon_bins(), a)
            .merge(&bin_fixture("latlon", latlon_bins(), b))
            .unwrap();
        let together = bin_fixture("latlon", latlon_bins(), obs_fixture());
        assert!(merged.equals(&together, 1e-12));
    }

    #[test]
    fn test_merge_window() {
        let a = bin_fixture("latlon", latlon_bins(), obs_fixture());
        let mut b = a.clone();
        b.window_start = b.window_start.map(|t| t + Duration::hours(6));
        b.window_end = b.window_end.map(|t| t + Duration::hours(6));
        let merged = BinnedStatistics::merge_all(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(merged.window_start, a.window_start);
        assert_eq!(merged.window_end, b.window_end);
    }

    #[test]
    fn test_merge_incompatible() {
        let a = bin_fixture("latlon", latlon_bins(), obs_fixture());
        let b = bin_fixture("global", vec![], obs_fixture());
        assert!(matches!(a.merge(&b), Err(BespinError::Incompatible(_))));
        assert!(BinnedStatistics::merge_all(Vec::new()).is_err());
    }

    #[test]
    fn test_select_dim() {
        let binned = bin_fixture("latlon", latlon_bins(), obs_fixture());
        let north = binned.select_dim("latitude", 1).unwrap();
        assert_eq!(north.shape(), vec![2]);
        assert_eq!(north.sliced_dims()["latitude"], 45.0);
        assert_eq!(
            north
                .field("air_temperature", "ObsValue", StatKind::Count)
                .unwrap(),
            &[1.0, 2.0]
        );
        assert_eq!(north.attributes()["sliced_dims"], "latitude");

        assert!(binned.select_dim("latitude", 2).is_err());
        assert!(binned.select_dim("depth", 0).is_err());
    }

    #[test]
    fn test_collapse_dim() {
        let binned = bin_fixture("latlon", latlon_bins(), obs_fixture());
        let collapsed = binned
            .collapse_dim("longitude")
            .unwrap()
            .collapse_dim("latitude")
            .unwrap();
        let global = bin_fixture("latlon", vec![], obs_fixture());
        assert!(collapsed.equals(&global, 1e-12));
    }

    #[test]
    fn test_concat_time() {
        let a = bin_fixture("latlon", latlon_bins(), obs_fixture());
        let mut b = a.clone();
        b.window_start = a.window_end;
        b.window_end = a.window_end.map(|t| t + Duration::hours(6));

        // given out of order
        let joined = BinnedStatistics::concat_all(vec![b, a.clone()], "time").unwrap();
        assert_eq!(joined.shape(), vec![2, 2, 2]);
        let start = Utc.with_ymd_and_hms(2020, 12, 15, 3, 0, 0).unwrap().timestamp() as f64;
        let time = joined.dimension("time").unwrap();
        assert_eq!(time.edges(), &[start, start + 21600.0, start + 43200.0]);

        // time varies fastest; both halves are copies of the same binning
        let count = joined
            .field("air_temperature", "ObsValue", StatKind::Count)
            .unwrap();
        assert_eq!(count, &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0]);

        // selecting a slice gets back the original values
        let first = joined.select_dim("time", 0).unwrap();
        assert_eq!(
            first.field("air_temperature", "ObsValue", StatKind::Sum),
            a.field("air_temperature", "ObsValue", StatKind::Sum)
        );
    }

    #[test]
    fn test_concat_gap() {
        let a = bin_fixture("latlon", latlon_bins(), obs_fixture());
        let mut b = a.clone();
        b.window_start = a.window_end.map(|t| t + Duration::hours(1));
        b.window_end = a.window_end.map(|t| t + Duration::hours(6));
        assert!(BinnedStatistics::concat_all(vec![a.clone(), b], "time").is_err());
        // overlapping
        assert!(BinnedStatistics::concat_all(vec![a.clone(), a.clone()], "time").is_err());
        // only time can be made up
        assert!(BinnedStatistics::concat_all(vec![a], "depth").is_err());
    }

    #[test]
    fn test_concat_existing_dimension() {
        let diagnostics = vec![Diagnostic::new("ombg").unwrap()];
        let south: Vec<Dimension> = vec!["latitude:r=45:b=-90,0".parse().unwrap()];
        let north: Vec<Dimension> = vec!["latitude:r=45:b=0,90".parse().unwrap()];
        let bin = |bins: Vec<Dimension>| {
            BinnedStatistics::bin(
                "lat",
                bins,
                diagnostics.clone(),
                &["air_temperature"],
                &[],
                obs_fixture(),
            )
            .unwrap()
        };
        let joined = BinnedStatistics::concat_all(vec![bin(north), bin(south)], "latitude").unwrap();
        let whole = bin(vec!["latitude:r=45".parse().unwrap()]);
        assert!(joined.equals(&whole, 0.0));
    }
}
