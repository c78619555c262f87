// diagnostic.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BespinError, Result};
use crate::statistic::StatKind;

/// A diagnostic to bin (e.g. `ObsValue`, `ombg`, `oman`) and the core
/// statistics to calculate for it.
///
/// Statistics are kept in canonical order with their dependencies included,
/// so that `sum2` always comes with `count` and `sum`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    pub name: String,
    statistics: Vec<StatKind>,
}

impl Diagnostic {
    pub const DEFAULT_STATISTICS: [StatKind; 3] = [StatKind::Count, StatKind::Sum, StatKind::Sum2];

    pub fn new(name: &str) -> Result<Self> {
        Self::with_statistics(name, Self::DEFAULT_STATISTICS)
    }

    pub fn with_statistics(
        name: &str,
        statistics: impl IntoIterator<Item = StatKind>,
    ) -> Result<Self> {
        validate_name(name)?;

        let mut requested: Vec<StatKind> = Vec::new();
        for stat in statistics {
            if !stat.is_core() {
                return Err(BespinError::InvalidDiagnostic {
                    name: name.to_string(),
                    reason: format!(
                        "\"{}\" is a derived statistic and is calculated from the stored ones",
                        stat
                    ),
                });
            }
            requested.push(stat);
            requested.extend_from_slice(stat.dependencies());
        }
        if requested.is_empty() {
            return Err(BespinError::InvalidDiagnostic {
                name: name.to_string(),
                reason: "at least one statistic is required".to_string(),
            });
        }

        let statistics = StatKind::CORE
            .into_iter()
            .filter(|k| requested.contains(k))
            .collect();
        Ok(Self {
            name: name.to_string(),
            statistics,
        })
    }

    /// Create from statistic names, e.g. `["count", "sum", "min"]`.
    pub fn from_names<S: AsRef<str>>(name: &str, statistics: &[S]) -> Result<Self> {
        let stats = statistics
            .iter()
            .map(|s| {
                s.as_ref()
                    .parse::<StatKind>()
                    .map_err(|_| BespinError::InvalidDiagnostic {
                        name: name.to_string(),
                        reason: format!("invalid statistic \"{}\"", s.as_ref()),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::with_statistics(name, stats)
    }

    pub fn statistics(&self) -> &[StatKind] {
        &self.statistics
    }

    pub fn has(&self, stat: StatKind) -> bool {
        self.statistics.contains(&stat)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(BespinError::InvalidDiagnostic {
            name: name.to_string(),
            reason: "names may only contain letters, digits and underscores".to_string(),
        });
    }
    Ok(())
}

impl FromStr for Diagnostic {
    type Err = BespinError;

    /// Parse `<name>` or `<name>:<stat>,<stat>,...`, e.g. `omb:count,sum,min`.
    fn from_str(string: &str) -> Result<Self> {
        let parse_err = || BespinError::DiagnosticParse(string.to_string());
        let parts: Vec<&str> = string.split(':').collect();
        match parts.as_slice() {
            [name] => Diagnostic::new(name).map_err(|_| parse_err()),
            [name, stats] => {
                let stats: Vec<&str> = stats.split(',').map(str::trim).collect();
                Diagnostic::from_names(name, &stats).map_err(|_| parse_err())
            }
            _ => Err(parse_err()),
        }
    }
}

impl PartialEq for Diagnostic {
    fn eq(&self, other: &Self) -> bool {
        // statistics are kept sorted, so this is a set comparison
        self.name == other.name && self.statistics == other.statistics
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats: Vec<&str> = self.statistics.iter().map(StatKind::name).collect();
        write!(f, "{}:{}", self.name, stats.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_create_bad() {
        assert!(Diagnostic::from_names("omb", &["sum", "m2", "min", "m"]).is_err());
        assert!(Diagnostic::from_names("omb", &["mean"]).is_err());
        assert!(Diagnostic::new("omb.bad").is_err());
    }

    #[test]
    fn test_diagnostic_create_default() {
        let d = Diagnostic::new("omb").unwrap();
        assert_eq!(
            d.statistics(),
            &[StatKind::Count, StatKind::Sum, StatKind::Sum2]
        );
    }

    #[test]
    fn test_diagnostic_dependencies_added() {
        let d = Diagnostic::from_names("omb", &["max", "sum2"]).unwrap();
        assert_eq!(
            d.statistics(),
            &[StatKind::Count, StatKind::Sum, StatKind::Sum2, StatKind::Max]
        );
    }

    #[test]
    fn test_diagnostic_eq() {
        let all = ["count", "sum", "sum2", "min", "max"];
        let d1 = Diagnostic::from_names("omb", &all).unwrap();
        assert_eq!(d1, Diagnostic::from_names("omb", &["max", "min", "sum2"]).unwrap());
        assert_ne!(d1, Diagnostic::from_names("omf", &all).unwrap());
        assert_ne!(d1, Diagnostic::from_names("omb", &["count", "sum"]).unwrap());
    }

    #[test]
    fn test_diagnostic_parse() {
        let good = [
            "omb",
            "omb:count,sum",
            "omb:count,sum,sum2",
            "omb:count,sum,sum2,min,max",
        ];
        for s in good {
            assert!(s.parse::<Diagnostic>().is_ok(), "should parse: {}", s);
        }

        let bad = ["", ":", "foo.bar", "omb:", "omb:foobar", "omb:foo:bar"];
        for s in bad {
            assert!(s.parse::<Diagnostic>().is_err(), "should fail: \"{}\"", s);
        }
    }

    #[test]
    fn test_display_roundtrip() {
        let d: Diagnostic = "ombg:min,sum".parse().unwrap();
        assert_eq!(d.to_string(), "ombg:sum,min");
        assert_eq!(d.to_string().parse::<Diagnostic>().unwrap(), d);
    }
}
