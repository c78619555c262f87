pub mod binned;
pub mod binning;
pub mod block;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod filters;
pub mod io;
pub mod obs;
pub mod statistic;
pub mod stats;

pub use binned::{BinnedStatistics, BinningPlan, StatQuery, StatTable};
pub use binning::Dimension;
pub use config::RunConfig;
pub use diagnostic::Diagnostic;
pub use error::{BespinError, Result};
pub use filters::{filter_from_str, filter_types, Filter, FilterContext};
pub use io::*;
pub use obs::{read_obs, write_obs, ObsSpace};
pub use statistic::StatKind;
pub use stats::BinnedSummary;

#[cfg(test)]
pub(crate) mod test_utils;
