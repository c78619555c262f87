// filters/ioda_metadata.rs

use super::{expect_args, Filter, FilterContext};
use crate::error::Result;
use crate::obs::ObsSpace;

pub(super) const NAME: &str = "ioda_metadata";

/// Groups that binning coordinates are looked up in, in order of preference.
const METADATA_GROUPS: [&str; 3] = ["MetaData", "varMetaData", "recMetaData"];

/// Rename the metadata variables used as binning coordinates to their bare
/// names, e.g. `MetaData/latitude` to `latitude`.
///
/// Applied automatically before binning, with the binning dimension names.
#[derive(Clone, Debug)]
pub struct IodaMetadata {
    names: Vec<String>,
}

impl IodaMetadata {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            names: names.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// `ioda_metadata:<name>,<name>,...`
    pub fn from_args(args: &[&str]) -> Result<Self> {
        let [names] = expect_args::<1>(NAME, args)?;
        let names: Vec<&str> = names.split(',').map(str::trim).collect();
        Ok(Self::new(&names))
    }
}

impl Filter for IodaMetadata {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, obs: &mut ObsSpace, _ctx: &FilterContext) -> Result<()> {
        for name in &self.names {
            if obs.contains(name) {
                continue;
            }
            let found = METADATA_GROUPS
                .iter()
                .map(|group| format!("{}/{}", group, name))
                .find(|full| obs.contains(full));
            if let Some(full) = found {
                obs.rename(&full, name)?;
            }
        }
        Ok(())
    }
}
