// filters/value_range.rs

use super::{expect_args, Filter, FilterContext};
use crate::error::{BespinError, Result};
use crate::obs::ObsSpace;

pub(super) const NAME: &str = "range";

/// Keep only observations where a variable lies within `[min, max]`,
/// `range:<variable>:<min>,<max>`.
///
/// For a single channel variable the locations outside the range are
/// dropped. For a multichannel variable the out of range channels are set
/// to missing, and locations with no channel left in range are dropped.
#[derive(Clone, Debug)]
pub struct ValueRange {
    variable: String,
    min: f64,
    max: f64,
}

impl ValueRange {
    pub fn new(variable: &str, min: f64, max: f64) -> Self {
        Self {
            variable: variable.to_string(),
            min,
            max,
        }
    }

    pub fn from_args(args: &[&str]) -> Result<Self> {
        let [variable, range] = expect_args::<2>(NAME, args)?;
        let invalid = || BespinError::InvalidFilter {
            filter: NAME.to_string(),
            reason: format!("invalid range \"{}\", expected <min>,<max>", range),
        };
        let (min, max) = range.split_once(',').ok_or_else(invalid)?;
        let min: f64 = min.trim().parse().map_err(|_| invalid())?;
        let max: f64 = max.trim().parse().map_err(|_| invalid())?;
        if min > max {
            return Err(invalid());
        }
        Ok(Self::new(variable, min, max))
    }

    fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Filter for ValueRange {
    fn name(&self) -> &'static str {
        NAME
    }

    fn per_variable(&self) -> bool {
        true
    }

    fn apply(&self, obs: &mut ObsSpace, ctx: &FilterContext) -> Result<()> {
        let name = ctx.substitute(&self.variable);
        let variable = obs.require(&name)?;
        let in_range: Vec<bool> = variable.values().iter().map(|v| self.contains(*v)).collect();

        if !variable.is_multichannel() {
            return obs.retain_locations(&in_range);
        }
        let keep: Vec<bool> = in_range
            .chunks(obs.nchans())
            .map(|row| row.iter().any(|k| *k))
            .collect();
        obs.mask_channels(&in_range)?;
        obs.retain_locations(&keep)
    }
}
