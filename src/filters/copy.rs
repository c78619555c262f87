// filters/copy.rs

use super::{expect_args, Filter, FilterContext};
use crate::error::Result;
use crate::obs::ObsSpace;

pub(super) const NAME: &str = "copy";

/// Copy a variable, `copy:<src>:<dst>`.
#[derive(Clone, Debug)]
pub struct CopyVariable {
    src: String,
    dst: String,
}

impl CopyVariable {
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

impl Filter for CopyVariable {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, obs: &mut ObsSpace, ctx: &FilterContext) -> Result<()> {
        let src = ctx.substitute(&self.src);
        let variable = obs.require(&src)?.clone();
        obs.insert_variable(&ctx.substitute(&self.dst), variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy() {
        let mut obs = ObsSpace::new(2);
        obs.insert("ObsValue/t", vec![1.0, 2.0]).unwrap();
        CopyVariable::new("ObsValue/t", "hofx/t")
            .apply(&mut obs, &FilterContext::global())
            .unwrap();
        assert_eq!(obs.get("hofx/t").unwrap().values(), &[1.0, 2.0]);
        assert!(obs.contains("ObsValue/t"));

        let missing = CopyVariable::new("ObsValue/q", "hofx/q").apply(&mut obs, &FilterContext::global());
        assert!(missing.is_err());
    }
}
