// filters/sub.rs

use super::{expect_args, Filter, FilterContext};
use crate::error::{BespinError, Result};
use crate::obs::ObsSpace;

pub(super) const NAME: &str = "sub";

/// Subtract one group from another for the binned variable,
/// `sub:<group1>:<group2>:<dst_group>`, e.g. `sub:ObsValue:hofx:omf`.
#[derive(Clone, Debug)]
pub struct Sub {
    src1: String,
    src2: String,
    dst: String,
}

impl Sub {
    pub fn new(src1: &str, src2: &str, dst: &str) -> Self {
        Self {
            src1: src1.to_string(),
            src2: src2.to_string(),
            dst: dst.to_string(),
        }
    }

    pub fn from_args(args: &[&str]) -> Result<Self> {
        let [src1, src2, dst] = expect_args::<3>(NAME, args)?;
        Ok(Self::new(src1, src2, dst))
    }
}

impl Filter for Sub {
    fn name(&self) -> &'static str {
        NAME
    }

    fn per_variable(&self) -> bool {
        true
    }

    fn apply(&self, obs: &mut ObsSpace, ctx: &FilterContext) -> Result<()> {
        let variable = ctx.require_variable(NAME)?;
        let a = obs.require(&format!("{}/{}", self.src1, variable))?;
        let b = obs.require(&format!("{}/{}", self.src2, variable))?;
        if a.is_multichannel() != b.is_multichannel() {
            return Err(BespinError::InvalidFilter {
                filter: NAME.to_string(),
                reason: format!(
                    "{}/{} and {}/{} have different channels",
                    self.src1, variable, self.src2, variable
                ),
            });
        }

        let mut difference = a.clone();
        difference
            .values_mut()
            .iter_mut()
            .zip(b.values())
            .for_each(|(x, y)| *x -= y);
        obs.insert_variable(&format!("{}/{}", self.dst, variable), difference)
    }
}
