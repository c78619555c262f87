// filters/lon_wrap.rs

use super::{expect_args, Filter, FilterContext};
use crate::error::Result;
use crate::obs::ObsSpace;

pub(super) const NAME: &str = "lon_wrap";
const LONGITUDE: &str = "longitude";

/// Wrap negative longitudes into [0, 360).
#[derive(Clone, Debug, Default)]
pub struct LonWrap;

impl LonWrap {
    pub fn from_args(args: &[&str]) -> Result<Self> {
        expect_args::<0>(NAME, args)?;
        Ok(Self)
    }
}

impl Filter for LonWrap {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, obs: &mut ObsSpace, _ctx: &FilterContext) -> Result<()> {
        if let Some(longitude) = obs.get_mut(LONGITUDE) {
            longitude
                .values_mut()
                .iter_mut()
                .filter(|lon| **lon < 0.0)
                .for_each(|lon| *lon += 360.0);
        }
        Ok(())
    }
}
