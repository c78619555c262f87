// filters/trim_vars.rs

use super::{Filter, FilterContext};
use crate::binning::Dimension;
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::obs::{ObsSpace, CHANNEL_VARIABLE};

pub(super) const NAME: &str = "trim_vars";

/// Keep only the variables needed to bin one variable: its diagnostics,
/// the binning coordinates and the channel coordinate.
#[derive(Clone, Debug)]
pub struct TrimVars {
    keep: Vec<String>,
}

impl TrimVars {
    pub fn new(variable: &str, diagnostics: &[Diagnostic], dimensions: &[Dimension]) -> Self {
        let keep = diagnostics
            .iter()
            .map(|d| format!("{}/{}", d.name, variable))
            .chain(dimensions.iter().map(|d| d.name.clone()))
            .chain(std::iter::once(CHANNEL_VARIABLE.to_string()))
            .collect();
        Self { keep }
    }
}

impl Filter for TrimVars {
    fn name(&self) -> &'static str {
        NAME
    }

    fn per_variable(&self) -> bool {
        true
    }

    fn apply(&self, obs: &mut ObsSpace, _ctx: &FilterContext) -> Result<()> {
        obs.retain_variables(&self.keep);
        Ok(())
    }
}
