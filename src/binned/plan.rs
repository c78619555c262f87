// binned/plan.rs

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use super::BinnedStatistics;
use crate::binning::Dimension;
use crate::diagnostic::Diagnostic;
use crate::error::{BespinError, Result};
use crate::filters::Filter;
use crate::obs::{read_obs, ObsSpace};

/// Groups searched, in order, for the variables to bin when none are given.
pub const DEFAULT_VARIABLE_GROUPS: [&str; 3] = ["hofx0", "hofx", "ObsValue"];

/// The variables of the first of the default groups that has any.
pub fn default_variables(obs: &ObsSpace) -> Vec<String> {
    DEFAULT_VARIABLE_GROUPS
        .iter()
        .map(|group| obs.group_variables(group))
        .find(|variables| !variables.is_empty())
        .unwrap_or_default()
}

/// Everything needed to bin obs files the same way.
#[derive(Debug)]
pub struct BinningPlan {
    pub name: String,
    pub bins: Vec<Dimension>,
    pub diagnostics: Vec<Diagnostic>,
    /// Variables to bin, or `None` to use [`default_variables`].
    pub variables: Option<Vec<String>>,
    pub filters: Vec<Box<dyn Filter>>,
}

impl BinningPlan {
    pub fn new(name: &str, bins: Vec<Dimension>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            name: name.to_string(),
            bins,
            diagnostics,
            variables: None,
            filters: Vec::new(),
        }
    }

    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = (!variables.is_empty()).then_some(variables);
        self
    }

    pub fn with_filters(mut self, filters: Vec<Box<dyn Filter>>) -> Self {
        self.filters = filters;
        self
    }

    /// Bin a single obs space.
    pub fn bin_obs(&self, obs: ObsSpace) -> Result<BinnedStatistics> {
        let variables = match &self.variables {
            Some(variables) => variables.clone(),
            None => default_variables(&obs),
        };
        if variables.is_empty() {
            return Err(BespinError::StringError(format!(
                "no variables given, and none found in the {} groups",
                DEFAULT_VARIABLE_GROUPS.join("/")
            )));
        }
        BinnedStatistics::bin(
            &self.name,
            self.bins.clone(),
            self.diagnostics.clone(),
            &variables,
            &self.filters,
            obs,
        )
    }

    /// Read and bin a single obs file.
    pub fn bin_file(&self, path: &Path) -> Result<BinnedStatistics> {
        debug!("binning {}", path.display());
        let obs = read_obs(path)?;
        self.bin_obs(obs)
    }

    /// Bin obs files in parallel, then merge the results in input order.
    ///
    /// `on_done` is called as each file finishes (e.g. to drive a progress
    /// bar), from whichever thread binned it.
    pub fn bin_files<F>(&self, paths: &[PathBuf], threads: usize, on_done: F) -> Result<BinnedStatistics>
    where
        F: Fn(&Path) + Send + Sync,
    {
        if paths.is_empty() {
            return Err("no obs files to bin".into());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| BespinError::StringError(e.to_string()))?;

        let binned = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    let result = self.bin_file(path);
                    on_done(path);
                    result
                })
                .collect::<Result<Vec<_>>>()
        })?;
        info!("binned {} obs files with {} threads", binned.len(), threads);
        BinnedStatistics::merge_all(binned)
    }
}
