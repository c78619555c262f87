// filters/rename.rs

use super::{expect_args, Filter, FilterContext};
use crate::error::Result;
use crate::obs::ObsSpace;

pub(super) const NAME: &str = "rename";

/// Rename a variable, `rename:<src>:<dst>`, e.g.
/// `rename:ombg/{variable}:omb/{variable}`.
#[derive(Clone, Debug)]
pub struct Rename {
    src: String,
    dst: String,
}

impl Rename {
    pub fn new(src: &str, dst: &str) -> Self {
        Self {
            src: src.to_string(),
            dst: dst.to_string(),
        }
    }

    pub fn from_args(args: &[&str]) -> Result<Self> {
        let [src, dst] = expect_args::<2>(NAME, args)?;
        Ok(Self::new(src, dst))
    }
}

impl Filter for Rename {
    fn name(&self) -> &'static str {
        NAME
    }

    fn per_variable(&self) -> bool {
        true
    }

    fn apply(&self, obs: &mut ObsSpace, ctx: &FilterContext) -> Result<()> {
        obs.rename(&ctx.substitute(&self.src), &ctx.substitute(&self.dst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_variable() {
        let mut obs = ObsSpace::new(1);
        obs.insert("ombg/t", vec![0.5]).unwrap();
        obs.insert("ombg/q", vec![0.1]).unwrap();

        let filter = Rename::from_args(&["ombg/{variable}", "omb/{variable}"]).unwrap();
        filter
            .apply(&mut obs, &FilterContext::for_variable("t"))
            .unwrap();
        assert!(obs.contains("omb/t"));
        assert!(!obs.contains("ombg/t"));
        assert!(obs.contains("ombg/q"));
    }
}
