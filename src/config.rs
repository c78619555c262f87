// config.rs

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binned::BinningPlan;
use crate::binning::Dimension;
use crate::diagnostic::Diagnostic;
use crate::error::{BespinError, Result};
use crate::filters::filter_from_str;

/// A binning run configuration, as read from a JSON file. Every entry uses
/// the same string syntax as the command line, e.g.
///
/// ```json
/// {
///   "name": "latlon",
///   "bins": ["latitude:r=10", "longitude:r=10"],
///   "diagnostics": ["ObsValue:count,sum,sum2,min,max", "ombg"],
///   "filters": ["range:ObsValue/{variable}:200,350"]
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub name: Option<String>,
    pub variables: Vec<String>,
    pub diagnostics: Vec<String>,
    pub bins: Vec<String>,
    pub filters: Vec<String>,
}

impl RunConfig {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BespinError::FileNotFound(path.to_path_buf()));
        }
        debug!("reading config from {}", path.display());
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Add command line values after those from the file. A name given on
    /// the command line replaces the configured one.
    pub fn extend(&mut self, other: RunConfig) {
        if other.name.is_some() {
            self.name = other.name;
        }
        self.variables.extend(other.variables);
        self.diagnostics.extend(other.diagnostics);
        self.bins.extend(other.bins);
        self.filters.extend(other.filters);
    }

    /// Parse everything into a [`BinningPlan`]. With no name given, the
    /// name is made from the dimension names (or `global`).
    pub fn plan(&self) -> Result<BinningPlan> {
        let bins = self
            .bins
            .iter()
            .map(|b| b.parse::<Dimension>())
            .collect::<Result<Vec<_>>>()?;
        let diagnostics = self
            .diagnostics
            .iter()
            .map(|d| d.parse::<Diagnostic>())
            .collect::<Result<Vec<_>>>()?;
        if diagnostics.is_empty() {
            return Err("at least one diagnostic is required".into());
        }
        let filters = self
            .filters
            .iter()
            .map(|f| filter_from_str(f))
            .collect::<Result<Vec<_>>>()?;

        let name = match &self.name {
            Some(name) => name.clone(),
            None if bins.is_empty() => "global".to_string(),
            None => bins
                .iter()
                .map(|b| b.name.replace('/', "_"))
                .collect::<Vec<_>>()
                .join("_"),
        };
        Ok(BinningPlan::new(&name, bins, diagnostics)
            .with_variables(self.variables.clone())
            .with_filters(filters))
    }
}
