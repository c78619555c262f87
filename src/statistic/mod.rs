//! Binned statistic types, and how they are derived and merged.
//!
//! Core statistics (`count`, `sum`, `sum2`, `min`, `max`) are accumulated
//! directly from observations and stored. Derived statistics (`mean`,
//! `variance`, `stddev`, `rmsd`) are never stored; they are computed on
//! request from the core statistics they depend on.

mod accumulate;

pub use accumulate::{accumulate, extract, CellAccumulator};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BespinError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatKind {
    Count,
    Sum,
    Sum2,
    Min,
    Max,
    Mean,
    Variance,
    StdDev,
    Rmsd,
}

impl StatKind {
    /// Statistics that are calculated by binning, in canonical order.
    pub const CORE: [StatKind; 5] = [
        StatKind::Count,
        StatKind::Sum,
        StatKind::Sum2,
        StatKind::Min,
        StatKind::Max,
    ];

    pub const ALL: [StatKind; 9] = [
        StatKind::Count,
        StatKind::Sum,
        StatKind::Sum2,
        StatKind::Min,
        StatKind::Max,
        StatKind::Mean,
        StatKind::Variance,
        StatKind::StdDev,
        StatKind::Rmsd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StatKind::Count => "count",
            StatKind::Sum => "sum",
            StatKind::Sum2 => "sum2",
            StatKind::Min => "min",
            StatKind::Max => "max",
            StatKind::Mean => "mean",
            StatKind::Variance => "variance",
            StatKind::StdDev => "stddev",
            StatKind::Rmsd => "rmsd",
        }
    }

    pub fn is_core(&self) -> bool {
        StatKind::CORE.contains(self)
    }

    /// Other statistics that must exist before this one can be calculated.
    pub fn dependencies(&self) -> &'static [StatKind] {
        match self {
            StatKind::Count | StatKind::Sum | StatKind::Min | StatKind::Max => &[],
            StatKind::Sum2 | StatKind::Mean => &[StatKind::Count, StatKind::Sum],
            StatKind::Variance | StatKind::StdDev | StatKind::Rmsd => {
                &[StatKind::Count, StatKind::Sum, StatKind::Sum2]
            }
        }
    }

    /// Get the value of this statistic from a set of stored core statistics.
    ///
    /// `lookup` returns the stored values of a core statistic, or `None` if it
    /// was not calculated.
    pub fn value<'a, F>(&self, lookup: F) -> Result<Vec<f64>>
    where
        F: Fn(StatKind) -> Option<&'a [f64]>,
    {
        let get = |dep: StatKind| {
            lookup(dep).ok_or_else(|| BespinError::MissingStatistic {
                statistic: self.name().to_string(),
                dependency: dep.name().to_string(),
            })
        };
        if self.is_core() {
            return Ok(get(*self)?.to_vec());
        }

        let count = get(StatKind::Count)?;
        let sum = get(StatKind::Sum)?;
        let mean: Vec<f64> = count.iter().zip(sum).map(|(c, s)| s / c).collect();
        if *self == StatKind::Mean {
            return Ok(mean);
        }

        let sum2 = get(StatKind::Sum2)?;
        let variance = count
            .iter()
            .zip(sum2)
            .map(|(&c, &s2)| if c > 1.0 { s2 / c } else { f64::NAN });
        Ok(match self {
            StatKind::Variance => variance.collect(),
            StatKind::StdDev => variance.map(f64::sqrt).collect(),
            StatKind::Rmsd => variance
                .zip(&mean)
                .map(|(v, m)| (v + m * m).sqrt())
                .collect(),
            _ => unreachable!("core statistics handled above"),
        })
    }

    /// Merge two binned arrays of this core statistic.
    ///
    /// `a` and `b` return the stored values of a core statistic for each
    /// input; `sum2` needs the `count` and `sum` of both sides.
    pub fn merge<'a, 'b, A, B>(&self, a: A, b: B) -> Result<Vec<f64>>
    where
        A: Fn(StatKind) -> Option<&'a [f64]>,
        B: Fn(StatKind) -> Option<&'b [f64]>,
    {
        let missing = |dep: StatKind| BespinError::MissingStatistic {
            statistic: self.name().to_string(),
            dependency: dep.name().to_string(),
        };
        let get_a = |dep: StatKind| a(dep).ok_or_else(|| missing(dep));
        let get_b = |dep: StatKind| b(dep).ok_or_else(|| missing(dep));

        let (va, vb) = (get_a(*self)?, get_b(*self)?);
        if va.len() != vb.len() {
            return Err(BespinError::ShapeMismatch {
                name: self.name().to_string(),
                expected: va.len(),
                found: vb.len(),
            });
        }

        let merged = match self {
            StatKind::Count | StatKind::Sum => va.iter().zip(vb).map(|(x, y)| x + y).collect(),
            StatKind::Min => va.iter().zip(vb).map(|(x, y)| x.min(*y)).collect(),
            StatKind::Max => va.iter().zip(vb).map(|(x, y)| x.max(*y)).collect(),
            StatKind::Sum2 => {
                let (na, nb) = (get_a(StatKind::Count)?, get_b(StatKind::Count)?);
                let (sa, sb) = (get_a(StatKind::Sum)?, get_b(StatKind::Sum)?);
                (0..va.len())
                    .map(|i| merge_sum2(na[i], sa[i], va[i], nb[i], sb[i], vb[i]))
                    .collect()
            }
            _ => {
                return Err(BespinError::StringError(format!(
                    "derived statistic \"{}\" cannot be merged",
                    self.name()
                )))
            }
        };
        Ok(merged)
    }
}

/// Combine the sum of squared deviations of two samples (Chan et al.).
fn merge_sum2(na: f64, sa: f64, m2a: f64, nb: f64, sb: f64, m2b: f64) -> f64 {
    if na == 0.0 {
        return m2b;
    }
    if nb == 0.0 {
        return m2a;
    }
    let delta = sb / nb - sa / na;
    m2a + m2b + delta * delta * na * nb / (na + nb)
}

impl FromStr for StatKind {
    type Err = BespinError;

    fn from_str(s: &str) -> Result<Self> {
        StatKind::ALL
            .iter()
            .find(|k| k.name() == s)
            .copied()
            .ok_or_else(|| BespinError::UnknownStatistic(s.to_string()))
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of a stored binned field, `<variable>.<diagnostic>.<statistic>`.
pub fn field_name(variable: &str, diagnostic: &str, stat: StatKind) -> String {
    format!("{}.{}.{}", variable, diagnostic, stat.name())
}
