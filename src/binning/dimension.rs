// binning/dimension.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BespinError, Result};

/// Default bounds for some common dimension names.
const DEFAULT_BOUNDS: &[(&str, (f64, f64))] =
    &[("latitude", (-90.0, 90.0)), ("longitude", (0.0, 360.0))];

/// Default units for some common dimension names.
const DEFAULT_UNITS: &[(&str, &str)] = &[("latitude", "degrees"), ("longitude", "degrees")];

fn default_bounds(name: &str) -> Option<(f64, f64)> {
    DEFAULT_BOUNDS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, b)| *b)
}

fn default_units(name: &str) -> Option<String> {
    DEFAULT_UNITS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, u)| u.to_string())
}

/// Upper limit on the edges made from a resolution.
pub const MAX_EDGES: usize = 10_000_000;

fn check_edges(name: &str, edges: &[f64]) -> Result<()> {
    if edges.len() <= 1 {
        return Err(BespinError::InvalidDimension {
            name: name.to_string(),
            reason: "at least 2 edges need to be given to define bins".to_string(),
        });
    }
    if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[1] <= w[0]) {
        return Err(BespinError::InvalidDimension {
            name: name.to_string(),
            reason: "edges must be finite and strictly increasing".to_string(),
        });
    }
    Ok(())
}

/// A single dimension used for binning, defined by its bin edges.
///
/// Can be created either from a fixed resolution (with bounds, which have
/// defaults for `latitude` and `longitude`), or from an explicit list of
/// monotonically increasing edges.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub units: Option<String>,
    edges: Vec<f64>,
}

impl Dimension {
    /// Create a dimension from exactly one of `edges` or `resolution`.
    /// `bounds` is only valid together with `resolution`.
    pub fn new(
        name: &str,
        edges: Option<Vec<f64>>,
        resolution: Option<f64>,
        bounds: Option<Vec<f64>>,
    ) -> Result<Self> {
        let invalid = |reason: &str| BespinError::InvalidDimension {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        match (edges, resolution) {
            (Some(_), Some(_)) | (None, None) => {
                Err(invalid("must set exactly ONE of \"edges\" or \"resolution\""))
            }
            (Some(_), None) if bounds.is_some() => Err(invalid(
                "must define \"resolution\" if \"bounds\" is defined",
            )),
            (Some(edges), None) => Self::from_edges(name, edges),
            (None, Some(resolution)) => {
                let bounds = match bounds {
                    Some(b) if b.len() == 2 => Some((b[0], b[1])),
                    Some(b) => {
                        return Err(invalid(&format!(
                            "bounds should be in the form [start, end]. Incorrect value given: {:?}",
                            b
                        )))
                    }
                    None => None,
                };
                Self::from_resolution(name, resolution, bounds)
            }
        }
    }

    /// Create a dimension from explicit bin edges.
    pub fn from_edges(name: &str, edges: Vec<f64>) -> Result<Self> {
        check_edges(name, &edges)?;
        Ok(Self {
            name: name.to_string(),
            units: default_units(name),
            edges,
        })
    }

    /// Check a dimension that didn't come through a constructor, e.g. one
    /// read from a file.
    pub fn validate(&self) -> Result<()> {
        check_edges(&self.name, &self.edges)
    }

    /// Create a dimension with evenly spaced bins of width `resolution`
    /// spanning `bounds` (or the default bounds for this dimension name).
    pub fn from_resolution(
        name: &str,
        resolution: f64,
        bounds: Option<(f64, f64)>,
    ) -> Result<Self> {
        let invalid = |reason: &str| BespinError::InvalidDimension {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if !(resolution > 0.0) || !resolution.is_finite() {
            return Err(invalid("resolution must be > 0"));
        }
        let (start, end) = bounds
            .or_else(|| default_bounds(name))
            .ok_or_else(|| invalid("bounds must be provided if resolution is set"))?;

        // Edges from start to end inclusive; the half step absorbs rounding.
        let n_edges = ((end + resolution / 2.0 - start) / resolution).ceil();
        if !(n_edges >= 2.0) {
            return Err(invalid("bounds must span at least one bin"));
        }
        if n_edges > MAX_EDGES as f64 {
            return Err(invalid(&format!(
                "resolution {} gives more than {} bins",
                resolution,
                MAX_EDGES - 1
            )));
        }
        let edges = (0..n_edges as usize)
            .map(|k| start + k as f64 * resolution)
            .collect();
        Self::from_edges(name, edges)
    }

    /// Create a single-bin dimension.
    pub fn single(name: &str, lower: f64, upper: f64) -> Result<Self> {
        Self::from_edges(name, vec![lower, upper])
    }

    /// Number of bins (one less than the number of edges).
    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    /// The outer edges of the binning.
    pub fn bounds(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    /// Find the bin containing `value`.
    ///
    /// Bins are right-open, except for the last bin which also includes its
    /// right edge. Values outside of the bounds (or NaN) are not binned.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        let (lower, upper) = self.bounds();
        if !(value >= lower && value <= upper) {
            return None;
        }
        let idx = self.edges.partition_point(|&e| e <= value) - 1;
        Some(idx.min(self.len() - 1))
    }

    /// Join `other` onto the upper end of this dimension. The first edge of
    /// `other` must equal the last edge of `self`.
    pub fn extend(&self, other: &Dimension) -> Result<Self> {
        let (_, upper) = self.bounds();
        let (lower, _) = other.bounds();
        if self.name != other.name || self.units != other.units {
            return Err(BespinError::Incompatible(format!(
                "cannot join dimension \"{}\" with \"{}\"",
                self.name, other.name
            )));
        }
        if upper != lower {
            return Err(BespinError::Incompatible(format!(
                "dimension \"{}\" is not contiguous: {} != {}",
                self.name, upper, lower
            )));
        }
        let mut edges = self.edges.clone();
        edges.extend_from_slice(&other.edges[1..]);
        Ok(Self {
            name: self.name.clone(),
            units: self.units.clone(),
            edges,
        })
    }
}

impl std::str::FromStr for Dimension {
    type Err = BespinError;

    /// Parse a dimension from `<name>:<arg>[:<arg>]`, where each argument is
    /// one of `r=<float>` (resolution), `b=<lo>,<hi>` (bounds), or
    /// `e=<float>,<float>,...` (edges).
    ///
    /// e.g. `latitude:r=1.0`, `longitude:r=1.0:b=0,180.0`,
    /// `depth:e=0,10,20,30,50,100,500`
    fn from_str(string: &str) -> Result<Self> {
        let parse_err = || BespinError::DimensionParse(string.to_string());

        let parts: Vec<&str> = string.split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(parse_err());
        }

        let name = parts[0];
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '/')
        {
            return Err(parse_err());
        }

        let mut edges = None;
        let mut resolution = None;
        let mut bounds = None;
        for arg in &parts[1..] {
            let (key, value) = arg.split_once('=').ok_or_else(parse_err)?;
            let values = value
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| parse_err())?;
            let slot = match key {
                "r" if values.len() == 1 => {
                    if resolution.replace(values[0]).is_some() {
                        return Err(parse_err());
                    }
                    continue;
                }
                "b" => &mut bounds,
                "e" => &mut edges,
                _ => return Err(parse_err()),
            };
            if slot.replace(values).is_some() {
                return Err(parse_err());
            }
        }

        Dimension::new(name, edges, resolution, bounds).map_err(|_| parse_err())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (lower, upper) = self.bounds();
        write!(
            f,
            "Dimension(\"{}\", bounds=({}, {}), bins={})",
            self.name,
            lower,
            upper,
            self.len()
        )
    }
}
