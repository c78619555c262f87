//! Binned statistics: the result of binning one or more obs spaces.
//!
//! Every stored field is named `<variable>.<diagnostic>.<statistic>` and
//! holds a flat row-major array shaped like the binning dimensions, with a
//! trailing channel axis for multichannel variables. Only core statistics
//! are stored; derived ones are calculated by [`BinnedStatistics::get`].

mod combine;
mod plan;
mod table;

pub use combine::TIME_DIMENSION;
pub use plan::{default_variables, BinningPlan, DEFAULT_VARIABLE_GROUPS};
pub use table::{StatField, StatQuery, StatTable};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binning::{BinLocator, Dimension};
use crate::block::{read_binned, write_binned, BlockConfig};
use crate::diagnostic::Diagnostic;
use crate::error::{BespinError, Result};
use crate::filters::{Filter, FilterContext, IodaMetadata, LonWrap, TrimVars};
use crate::obs::ObsSpace;
use crate::statistic::{accumulate, extract, field_name, StatKind};

/// Per-variable metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinnedVariable {
    pub multichannel: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BinnedStatistics {
    pub name: String,
    bins: Vec<Dimension>,
    diagnostics: Vec<Diagnostic>,
    variables: IndexMap<String, BinnedVariable>,
    channels: Option<Vec<i64>>,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    sliced_dims: IndexMap<String, f64>,
    fields: IndexMap<String, Vec<f64>>,
}

impl BinnedStatistics {
    /// An empty binning, with no variables binned yet.
    pub fn new(name: &str, bins: Vec<Dimension>, diagnostics: Vec<Diagnostic>) -> Result<Self> {
        if diagnostics.is_empty() {
            return Err("at least one diagnostic is required".into());
        }
        for (i, d) in diagnostics.iter().enumerate() {
            if diagnostics[..i].iter().any(|o| o.name == d.name) {
                return Err(BespinError::InvalidDiagnostic {
                    name: d.name.clone(),
                    reason: "given more than once".to_string(),
                });
            }
        }
        for (i, b) in bins.iter().enumerate() {
            if bins[..i].iter().any(|o| o.name == b.name) {
                return Err(BespinError::InvalidDimension {
                    name: b.name.clone(),
                    reason: "given more than once".to_string(),
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            bins,
            diagnostics,
            variables: IndexMap::new(),
            channels: None,
            window_start: None,
            window_end: None,
            sliced_dims: IndexMap::new(),
            fields: IndexMap::new(),
        })
    }

    /// Bin `variables` of an obs space.
    ///
    /// Before binning, the binning coordinates are renamed out of their
    /// metadata groups and longitudes are wrapped, then the global `filters`
    /// run. Each variable is then binned from its own copy of the obs space,
    /// after the per-variable `filters` have run on it.
    pub fn bin<S: AsRef<str>>(
        name: &str,
        bins: Vec<Dimension>,
        diagnostics: Vec<Diagnostic>,
        variables: &[S],
        filters: &[Box<dyn Filter>],
        mut obs: ObsSpace,
    ) -> Result<Self> {
        let mut binned = Self::new(name, bins, diagnostics)?;

        let bin_names: Vec<&str> = binned.bins.iter().map(|b| b.name.as_str()).collect();
        let automatic: [Box<dyn Filter>; 2] =
            [Box::new(IodaMetadata::new(&bin_names)), Box::new(LonWrap)];
        let global = FilterContext::global();
        for filter in automatic
            .iter()
            .chain(filters.iter().filter(|f| !f.per_variable()))
        {
            debug!("applying filter {}", filter.name());
            filter.apply(&mut obs, &global)?;
        }

        for variable in variables {
            let variable = variable.as_ref();
            let ctx = FilterContext::for_variable(variable);
            let mut obs_var = obs.clone();
            for filter in filters.iter().filter(|f| f.per_variable()) {
                filter.apply(&mut obs_var, &ctx)?;
            }
            TrimVars::new(variable, &binned.diagnostics, &binned.bins).apply(&mut obs_var, &ctx)?;
            binned.bin_variable(variable, &obs_var)?;
        }

        binned.window_start = obs.window_start;
        binned.window_end = obs.window_end;
        Ok(binned)
    }

    /// Bin a single variable, whose diagnostics are `<diagnostic>/<variable>`
    /// in `obs` and whose coordinates are the bare dimension names.
    pub fn bin_variable(&mut self, variable: &str, obs: &ObsSpace) -> Result<()> {
        if self.variables.contains_key(variable) {
            return Err(BespinError::DuplicateVariable(variable.to_string()));
        }

        let mut coords = Vec::with_capacity(self.bins.len());
        for dim in &self.bins {
            let coord = obs
                .get(&dim.name)
                .ok_or_else(|| BespinError::MissingDimension(dim.name.clone()))?;
            if coord.is_multichannel() {
                return Err(BespinError::InvalidDimension {
                    name: dim.name.clone(),
                    reason: "binning coordinates can't be multichannel".to_string(),
                });
            }
            coords.push(coord.values());
        }
        let locator = BinLocator::for_dimensions(&self.bins, &[]);
        let cells = locator.locate_all(&self.bins, &coords, obs.nlocs());

        let mut multichannel = None;
        let mut fields = Vec::new();
        for diag in &self.diagnostics {
            let source = obs.require(&format!("{}/{}", diag.name, variable))?;
            match multichannel {
                Some(m) if m != source.is_multichannel() => {
                    return Err(BespinError::Incompatible(format!(
                        "diagnostics of \"{}\" mix single and multichannel values",
                        variable
                    )))
                }
                _ => multichannel = Some(source.is_multichannel()),
            }
            let nchans = if source.is_multichannel() { obs.nchans() } else { 1 };
            let accumulated = accumulate(source.values(), nchans, &cells, locator.size());
            for stat in diag.statistics() {
                fields.push((
                    field_name(variable, &diag.name, *stat),
                    extract(&accumulated, *stat),
                ));
            }
        }

        let multichannel = multichannel.unwrap_or_default();
        if multichannel {
            let channels = obs.channels().map(<[i64]>::to_vec);
            if self.channels.is_some() && self.channels != channels {
                return Err(BespinError::Incompatible(format!(
                    "channels of \"{}\" differ from those already binned",
                    variable
                )));
            }
            self.channels = channels;
        }

        let binned = cells.iter().filter(|c| c.is_some()).count();
        debug!(
            "binned {} of {} locations for {}",
            binned,
            obs.nlocs(),
            variable
        );
        self.variables
            .insert(variable.to_string(), BinnedVariable { multichannel });
        self.fields.extend(fields);
        Ok(())
    }

    /// Read binned statistics from a `.bespin` file.
    pub fn read(path: &Path) -> Result<Self> {
        read_binned(path)
    }

    /// Write to a `.bespin` file, returning the path written. Fails with
    /// `FileExists` if the file exists and `overwrite` isn't set.
    pub fn write(&self, path: &Path, overwrite: bool) -> Result<PathBuf> {
        write_binned(self, path, overwrite, &BlockConfig::default())
    }

    pub fn bins(&self) -> &[Dimension] {
        &self.bins
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.bins.iter().find(|b| b.name == name)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn diagnostic(&self, name: &str) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.name == name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &BinnedVariable)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.keys().map(String::as_str).collect()
    }

    pub fn channels(&self) -> Option<&[i64]> {
        self.channels.as_deref()
    }

    /// Dimensions removed by [`select_dim`](Self::select_dim), and the bin
    /// center that was selected.
    pub fn sliced_dims(&self) -> &IndexMap<String, f64> {
        &self.sliced_dims
    }

    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }

    /// The stored values of a core statistic.
    pub fn field(&self, variable: &str, diagnostic: &str, stat: StatKind) -> Option<&[f64]> {
        self.fields
            .get(&field_name(variable, diagnostic, stat))
            .map(Vec::as_slice)
    }

    /// Shape of the binning, without any channel axis.
    pub fn shape(&self) -> Vec<usize> {
        self.bins.iter().map(Dimension::len).collect()
    }

    /// Shape of the fields of `variable`.
    pub fn field_shape(&self, variable: &str) -> Result<Vec<usize>> {
        let info = self
            .variables
            .get(variable)
            .ok_or_else(|| BespinError::MissingVariable(variable.to_string()))?;
        let mut shape = self.shape();
        if info.multichannel {
            shape.push(self.channels.as_ref().map_or(1, Vec::len));
        }
        Ok(shape)
    }

    /// Check the structure holds together: valid dimensions, and every
    /// binned field present with one value per bin (and channel).
    pub fn validate(&self) -> Result<()> {
        for dim in &self.bins {
            dim.validate()?;
        }
        for (variable, info) in &self.variables {
            if info.multichannel && self.channels.is_none() {
                return Err(BespinError::Incompatible(format!(
                    "multichannel variable \"{}\" has no channels",
                    variable
                )));
            }
            let expected: usize = self.field_shape(variable)?.iter().product();
            for diag in &self.diagnostics {
                for stat in diag.statistics() {
                    let name = field_name(variable, &diag.name, *stat);
                    let found = self
                        .fields
                        .get(&name)
                        .ok_or_else(|| BespinError::MissingVariable(name.clone()))?
                        .len();
                    if found != expected {
                        return Err(BespinError::ShapeMismatch {
                            name,
                            expected,
                            found,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether `other` has the same structure: name, binning, diagnostics,
    /// variables, channels and sliced dimensions. Values may differ.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.name == other.name
            && self.bins == other.bins
            && self.diagnostics == other.diagnostics
            && self.variables == other.variables
            && self.channels == other.channels
            && self.sliced_dims == other.sliced_dims
    }

    /// Whether `other` is equivalent and all its values match to within a
    /// relative `tolerance`. Missing (NaN) values must match exactly.
    pub fn equals(&self, other: &Self, tolerance: f64) -> bool {
        if !self.equivalent(other) || self.fields.len() != other.fields.len() {
            return false;
        }
        self.fields.iter().all(|(name, a)| {
            let Some(b) = other.fields.get(name) else {
                return false;
            };
            a.len() == b.len()
                && a.iter().zip(b).all(|(x, y)| match (x.is_nan(), y.is_nan()) {
                    (true, true) => true,
                    (false, false) => {
                        x == y || (x - y).abs() <= tolerance * x.abs().max(y.abs())
                    }
                    _ => false,
                })
        })
    }
}

impl PartialEq for BinnedStatistics {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, 1e-14)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_utils::test_utils::obs_fixture;

    pub(crate) fn latlon_bins() -> Vec<Dimension> {
        vec![
            "latitude:r=90".parse().unwrap(),
            "longitude:r=180".parse().unwrap(),
        ]
    }

    pub(crate) fn bin_fixture(name: &str, bins: Vec<Dimension>, obs: ObsSpace) -> BinnedStatistics {
        let diagnostics = vec![
            "ObsValue:count,sum,sum2,min,max".parse().unwrap(),
            "ombg".parse().unwrap(),
        ];
        BinnedStatistics::bin(name, bins, diagnostics, &["air_temperature"], &[], obs).unwrap()
    }

    #[test]
    fn test_bin_latlon() {
        let binned = bin_fixture("latlon", latlon_bins(), obs_fixture());
        assert_eq!(binned.shape(), vec![2, 2]);
        assert_eq!(binned.variable_names(), vec!["air_temperature"]);
        // ObsValue has 5 stats, ombg the default 3
        assert_eq!(binned.n_fields(), 8);

        let count = binned
            .field("air_temperature", "ObsValue", StatKind::Count)
            .unwrap();
        assert_eq!(count, &[1.0, 1.0, 1.0, 2.0]);
        let max = binned
            .field("air_temperature", "ObsValue", StatKind::Max)
            .unwrap();
        assert_eq!(max, &[280.0, 285.0, 290.0, 300.0]);
        assert!(binned.field("air_temperature", "ombg", StatKind::Min).is_none());
        assert!(binned.window_start.is_some());
    }

    #[test]
    fn test_bin_global() {
        let binned = bin_fixture("global", vec![], obs_fixture());
        assert!(binned.shape().is_empty());
        let sum = binned
            .field("air_temperature", "ombg", StatKind::Sum)
            .unwrap();
        assert_eq!(sum, &[1.5]);
    }

    #[test]
    fn test_validate() {
        let mut binned = bin_fixture("latlon", latlon_bins(), obs_fixture());
        assert!(binned.validate().is_ok());

        let name = field_name("air_temperature", "ombg", StatKind::Sum);
        binned.fields.get_mut(&name).unwrap().pop();
        assert!(matches!(
            binned.validate(),
            Err(BespinError::ShapeMismatch { .. })
        ));
        binned.fields.shift_remove(&name);
        assert!(matches!(
            binned.validate(),
            Err(BespinError::MissingVariable(_))
        ));
    }

    #[test]
    fn test_bin_errors() {
        let diagnostics = vec![Diagnostic::new("ombg").unwrap()];
        let missing_var = BinnedStatistics::bin(
            "x",
            latlon_bins(),
            diagnostics.clone(),
            &["specific_humidity"],
            &[],
            obs_fixture(),
        );
        assert!(matches!(missing_var, Err(BespinError::MissingVariable(_))));

        let missing_dim = BinnedStatistics::bin(
            "x",
            vec!["depth:e=0,10,20".parse().unwrap()],
            diagnostics.clone(),
            &["air_temperature"],
            &[],
            obs_fixture(),
        );
        assert!(matches!(missing_dim, Err(BespinError::MissingDimension(_))));

        let duplicate = BinnedStatistics::bin(
            "x",
            vec![],
            diagnostics,
            &["air_temperature", "air_temperature"],
            &[],
            obs_fixture(),
        );
        assert!(matches!(duplicate, Err(BespinError::DuplicateVariable(_))));
    }

    #[test]
    fn test_bin_with_filters() {
        let filters: Vec<Box<dyn Filter>> = vec![
            crate::filters::filter_from_str("range:ObsValue/{variable}:0,285").unwrap(),
        ];
        let diagnostics = vec![Diagnostic::new("ObsValue").unwrap()];
        let binned = BinnedStatistics::bin(
            "x",
            vec![],
            diagnostics,
            &["air_temperature"],
            &filters,
            obs_fixture(),
        )
        .unwrap();
        let count = binned
            .field("air_temperature", "ObsValue", StatKind::Count)
            .unwrap();
        assert_eq!(count, &[2.0]);
    }

    #[test]
    fn test_equals() {
        let a = bin_fixture("latlon", latlon_bins(), obs_fixture());
        let b = bin_fixture("latlon", latlon_bins(), obs_fixture());
        assert!(a.equivalent(&b));
        assert_eq!(a, b);

        let other_name = bin_fixture("other", latlon_bins(), obs_fixture());
        assert!(!a.equivalent(&other_name));

        let mut nudged = b.clone();
        for v in nudged.fields.values_mut() {
            v.iter_mut().for_each(|x| *x *= 1.0 + 1e-9);
        }
        assert!(a.equivalent(&nudged));
        assert!(!a.equals(&nudged, 1e-12));
        assert!(a.equals(&nudged, 1e-6));
    }
}
