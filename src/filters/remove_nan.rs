// filters/remove_nan.rs

use super::{expect_args, Filter, FilterContext};
use crate::error::Result;
use crate::obs::ObsSpace;

pub(super) const NAME: &str = "remove_nan";

/// Drop every location that has a NaN in any variable.
#[derive(Clone, Debug, Default)]
pub struct RemoveNan;

impl RemoveNan {
    pub fn from_args(args: &[&str]) -> Result<Self> {
        expect_args::<0>(NAME, args)?;
        Ok(Self)
    }
}

impl Filter for RemoveNan {
    fn name(&self) -> &'static str {
        NAME
    }

    fn per_variable(&self) -> bool {
        true
    }

    fn apply(&self, obs: &mut ObsSpace, _ctx: &FilterContext) -> Result<()> {
        let keep: Vec<bool> = obs.nan_locations().iter().map(|nan| !nan).collect();
        obs.retain_locations(&keep)
    }
}
