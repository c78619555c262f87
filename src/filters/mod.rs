//! Filters applied to an [`ObsSpace`] before it is binned.
//!
//! Filters are created from strings of the form `<name>:<arg>:<arg>...`,
//! e.g. `range:ObsValue/{variable}:200,350`. Global filters run once on the
//! whole obs space. Per-variable filters run on a fresh copy of the obs space
//! for each binned variable, and `{variable}` in their arguments is replaced
//! with the variable's name.

mod copy;
mod domain_clip;
mod ioda_metadata;
mod lon_wrap;
mod remove_nan;
mod rename;
mod sub;
mod trim_vars;
mod value_range;

pub use copy::CopyVariable;
pub use domain_clip::DomainClip;
pub use ioda_metadata::IodaMetadata;
pub use lon_wrap::LonWrap;
pub use remove_nan::RemoveNan;
pub use rename::Rename;
pub use sub::Sub;
pub use trim_vars::TrimVars;
pub use value_range::ValueRange;

use std::fmt::Debug;

use crate::error::{BespinError, Result};
use crate::obs::ObsSpace;

/// What a filter is being applied for.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterContext<'a> {
    /// The variable being binned, for per-variable filters.
    pub variable: Option<&'a str>,
}

impl<'a> FilterContext<'a> {
    pub fn global() -> Self {
        Self::default()
    }

    pub fn for_variable(variable: &'a str) -> Self {
        Self {
            variable: Some(variable),
        }
    }

    /// Replace `{variable}` in a filter argument.
    pub fn substitute(&self, template: &str) -> String {
        match self.variable {
            Some(variable) => template.replace("{variable}", variable),
            None => template.to_string(),
        }
    }

    /// The variable, or an error for a per-variable filter run globally.
    pub fn require_variable(&self, filter: &str) -> Result<&'a str> {
        self.variable.ok_or_else(|| BespinError::InvalidFilter {
            filter: filter.to_string(),
            reason: "can only be applied to a single variable".to_string(),
        })
    }
}

pub trait Filter: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this filter runs once per binned variable.
    fn per_variable(&self) -> bool {
        false
    }

    fn apply(&self, obs: &mut ObsSpace, ctx: &FilterContext) -> Result<()>;
}

/// Names of all the available filters.
pub fn filter_types() -> &'static [&'static str] {
    &[
        copy::NAME,
        domain_clip::NAME,
        ioda_metadata::NAME,
        lon_wrap::NAME,
        remove_nan::NAME,
        rename::NAME,
        sub::NAME,
        trim_vars::NAME,
        value_range::NAME,
    ]
}

/// Create a filter from its string form, `<name>[:<arg>...]`.
pub fn filter_from_str(string: &str) -> Result<Box<dyn Filter>> {
    let mut parts = string.split(':');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    let args: Vec<&str> = parts.collect();

    let filter: Box<dyn Filter> = match name.as_str() {
        copy::NAME => Box::new(CopyVariable::from_args(&args)?),
        domain_clip::NAME => Box::new(DomainClip::from_args(&args)?),
        ioda_metadata::NAME => Box::new(IodaMetadata::from_args(&args)?),
        lon_wrap::NAME => Box::new(LonWrap::from_args(&args)?),
        remove_nan::NAME => Box::new(RemoveNan::from_args(&args)?),
        rename::NAME => Box::new(Rename::from_args(&args)?),
        sub::NAME => Box::new(Sub::from_args(&args)?),
        value_range::NAME => Box::new(ValueRange::from_args(&args)?),
        trim_vars::NAME => {
            return Err(BespinError::InvalidFilter {
                filter: string.to_string(),
                reason: "applied automatically when binning".to_string(),
            })
        }
        _ => return Err(BespinError::UnknownFilter(name)),
    };
    Ok(filter)
}

/// Check the number of arguments given to a filter.
pub(crate) fn expect_args<'a, const N: usize>(
    filter: &str,
    args: &[&'a str],
) -> Result<[&'a str; N]> {
    <[&str; N]>::try_from(args).map_err(|_| BespinError::InvalidFilter {
        filter: filter.to_string(),
        reason: format!("expected {} arguments, found {}", N, args.len()),
    })
}
