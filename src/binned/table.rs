// binned/table.rs

use indexmap::IndexMap;

use super::BinnedStatistics;
use crate::binning::Dimension;
use crate::error::{BespinError, Result};
use crate::statistic::{field_name, StatKind};

/// Which statistics to get. Empty lists select everything available.
#[derive(Clone, Debug, Default)]
pub struct StatQuery {
    pub variables: Vec<String>,
    pub diagnostics: Vec<String>,
    pub statistics: Vec<StatKind>,
    /// Error on a variable/diagnostic/statistic combination that can't be
    /// calculated, instead of skipping it.
    pub strict: bool,
}

impl StatQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn variable(mut self, variable: &str) -> Self {
        self.variables.push(variable.to_string());
        self
    }

    pub fn diagnostic(mut self, diagnostic: &str) -> Self {
        self.diagnostics.push(diagnostic.to_string());
        self
    }

    pub fn statistic(mut self, statistic: StatKind) -> Self {
        self.statistics.push(statistic);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatField {
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

/// Statistic values pulled out of a [`BinnedStatistics`], keyed by
/// `<variable>.<diagnostic>.<statistic>`, along with the coordinates
/// needed to interpret them.
#[derive(Clone, Debug)]
pub struct StatTable {
    pub dimensions: Vec<Dimension>,
    pub channels: Option<Vec<i64>>,
    pub fields: IndexMap<String, StatField>,
    pub attributes: IndexMap<String, String>,
}

impl StatTable {
    pub fn get(&self, name: &str) -> Option<&StatField> {
        self.fields.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl BinnedStatistics {
    /// Get core and derived statistic values.
    pub fn get(&self, query: &StatQuery) -> Result<StatTable> {
        let variables: Vec<&str> = if query.variables.is_empty() {
            self.variable_names()
        } else {
            query.variables.iter().map(String::as_str).collect()
        };
        let diagnostics: Vec<&str> = if query.diagnostics.is_empty() {
            self.diagnostics().iter().map(|d| d.name.as_str()).collect()
        } else {
            query.diagnostics.iter().map(String::as_str).collect()
        };
        let statistics: &[StatKind] = if query.statistics.is_empty() {
            &StatKind::ALL
        } else {
            &query.statistics
        };

        let mut fields = IndexMap::new();
        for variable in &variables {
            let shape = match self.field_shape(variable) {
                Ok(shape) => shape,
                Err(e) if query.strict => return Err(e),
                Err(_) => continue,
            };
            for diagnostic in &diagnostics {
                if self.diagnostic(diagnostic).is_none() {
                    if query.strict {
                        return Err(BespinError::InvalidDiagnostic {
                            name: diagnostic.to_string(),
                            reason: "not binned".to_string(),
                        });
                    }
                    continue;
                }
                for stat in statistics {
                    let lookup = |k: StatKind| self.field(variable, diagnostic, k);
                    match stat.value(lookup) {
                        Ok(values) => {
                            fields.insert(
                                field_name(variable, diagnostic, *stat),
                                StatField {
                                    shape: shape.clone(),
                                    values,
                                },
                            );
                        }
                        Err(e) if query.strict => return Err(e),
                        Err(_) => {}
                    }
                }
            }
        }

        Ok(StatTable {
            dimensions: self.bins().to_vec(),
            channels: self.channels().map(<[i64]>::to_vec),
            fields,
            attributes: self.attributes(),
        })
    }

    /// Global attributes: the obs window and any sliced dimensions.
    pub fn attributes(&self) -> IndexMap<String, String> {
        let mut attributes = IndexMap::new();
        if let Some(start) = self.window_start {
            attributes.insert("window_start".to_string(), start.to_rfc3339());
        }
        if let Some(end) = self.window_end {
            attributes.insert("window_end".to_string(), end.to_rfc3339());
        }
        if !self.sliced_dims().is_empty() {
            let names: Vec<&str> = self.sliced_dims().keys().map(String::as_str).collect();
            attributes.insert("sliced_dims".to_string(), names.join(" "));
            for (name, value) in self.sliced_dims() {
                attributes.insert(name.clone(), value.to_string());
            }
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binned::tests::{bin_fixture, latlon_bins};
    use crate::test_utils::test_utils::obs_fixture;

    #[test]
    fn test_get_all() {
        let binned = bin_fixture("latlon", latlon_bins(), obs_fixture());
        let table = binned.get(&StatQuery::all()).unwrap();

        // ObsValue has everything, ombg can't give min/max
        assert_eq!(table.fields.len(), 9 + 7);
        assert!(table.get("air_temperature.ombg.min").is_none());
        assert!(table.get("air_temperature.ombg.rmsd").is_some());

        let mean = table.get("air_temperature.ObsValue.mean").unwrap();
        assert_eq!(mean.shape, vec![2, 2]);
        assert_eq!(mean.values, vec![280.0, 285.0, 290.0, 297.5]);
        assert_eq!(
            table.attributes["window_start"],
            "2020-12-15T03:00:00+00:00"
        );
    }

    #[test]
    fn test_get_selected() {
        let binned = bin_fixture("latlon", latlon_bins(), obs_fixture());
        let query = StatQuery::all()
            .diagnostic("ombg")
            .statistic(StatKind::Count)
            .statistic(StatKind::Variance);
        let table = binned.get(&query).unwrap();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(
            names,
            vec!["air_temperature.ombg.count", "air_temperature.ombg.variance"]
        );
        let variance = &table.get("air_temperature.ombg.variance").unwrap().values;
        assert!(variance[0].is_nan());
        assert_eq!(variance[3], 0.0);
    }

    #[test]
    fn test_get_missing() {
        let binned = bin_fixture("latlon", latlon_bins(), obs_fixture());
        let query = StatQuery::all()
            .diagnostic("ombg")
            .statistic(StatKind::Max);
        assert!(binned.get(&query).unwrap().is_empty());
        assert!(binned.get(&query.strict(true)).is_err());

        let query = StatQuery::all().variable("specific_humidity");
        assert!(binned.get(&query).unwrap().is_empty());
        assert!(matches!(
            binned.get(&query.strict(true)),
            Err(BespinError::MissingVariable(_))
        ));
    }
}
