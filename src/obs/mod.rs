//! The in-memory observation space that gets filtered and binned.
//!
//! Variables are named the IODA way, `<Group>/<variable>`, e.g.
//! `MetaData/latitude`, `ObsValue/air_temperature` or `ombg/air_temperature`.
//! Each variable holds one value per location, or for multichannel
//! instruments one value per location and channel (row-major, channel
//! varying fastest).

mod reader;

pub use reader::{read_obs, write_obs};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::error::{BespinError, Result};

/// Name of the channel coordinate for multichannel observations.
pub const CHANNEL_VARIABLE: &str = "sensor_channel";

#[derive(Clone, Debug, PartialEq)]
pub struct ObsVariable {
    values: Vec<f64>,
    multichannel: bool,
}

impl ObsVariable {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn is_multichannel(&self) -> bool {
        self.multichannel
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObsSpace {
    nlocs: usize,
    channels: Option<Vec<i64>>,
    variables: IndexMap<String, ObsVariable>,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
}

impl ObsSpace {
    pub fn new(nlocs: usize) -> Self {
        Self {
            nlocs,
            ..Default::default()
        }
    }

    pub fn with_channels(nlocs: usize, channels: Vec<i64>) -> Self {
        Self {
            nlocs,
            channels: Some(channels),
            ..Default::default()
        }
    }

    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.window_start = Some(start);
        self.window_end = Some(end);
        self
    }

    pub fn nlocs(&self) -> usize {
        self.nlocs
    }

    pub fn channels(&self) -> Option<&[i64]> {
        self.channels.as_deref()
    }

    pub fn nchans(&self) -> usize {
        self.channels.as_ref().map_or(1, Vec::len)
    }

    /// Add (or replace) a variable with one value per location.
    pub fn insert(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        self.check_len(name, values.len(), self.nlocs)?;
        self.variables.insert(
            name.to_string(),
            ObsVariable {
                values,
                multichannel: false,
            },
        );
        Ok(())
    }

    /// Add (or replace) a variable with one value per location and channel.
    pub fn insert_multichannel(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if self.channels.is_none() {
            return Err(BespinError::StringError(format!(
                "cannot add multichannel variable \"{}\" to an obs space without channels",
                name
            )));
        }
        self.check_len(name, values.len(), self.nlocs * self.nchans())?;
        self.variables.insert(
            name.to_string(),
            ObsVariable {
                values,
                multichannel: true,
            },
        );
        Ok(())
    }

    pub(crate) fn insert_variable(&mut self, name: &str, variable: ObsVariable) -> Result<()> {
        if variable.multichannel {
            self.insert_multichannel(name, variable.values)
        } else {
            self.insert(name, variable.values)
        }
    }

    fn check_len(&self, name: &str, found: usize, expected: usize) -> Result<()> {
        if found != expected {
            return Err(BespinError::ShapeMismatch {
                name: name.to_string(),
                expected,
                found,
            });
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ObsVariable> {
        self.variables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ObsVariable> {
        self.variables.get_mut(name)
    }

    /// Get a variable, or a `MissingVariable` error.
    pub fn require(&self, name: &str) -> Result<&ObsVariable> {
        self.get(name)
            .ok_or_else(|| BespinError::MissingVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ObsVariable> {
        self.variables.shift_remove(name)
    }

    /// Rename a variable, keeping its position.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        if !self.contains(from) {
            return Err(BespinError::MissingVariable(from.to_string()));
        }
        if from != to {
            self.variables.shift_remove(to);
        }
        if let Some((idx, _, variable)) = self.variables.shift_remove_full(from) {
            self.variables.shift_insert(idx, to.to_string(), variable);
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Names of the variables in `group`, without the group prefix.
    pub fn group_variables(&self, group: &str) -> Vec<String> {
        let prefix = format!("{}/", group);
        self.names()
            .filter_map(|n| n.strip_prefix(&prefix))
            .map(str::to_string)
            .collect()
    }

    /// Keep only the named variables (those that exist).
    pub fn retain_variables(&mut self, keep: &[String]) {
        self.variables.retain(|name, _| keep.contains(name));
    }

    /// Keep only the locations where `mask` is true.
    pub fn retain_locations(&mut self, mask: &[bool]) -> Result<()> {
        self.check_len("location mask", mask.len(), self.nlocs)?;
        let nchans = self.nchans();
        for variable in self.variables.values_mut() {
            let width = if variable.multichannel { nchans } else { 1 };
            let kept: Vec<f64> = variable
                .values
                .chunks(width)
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .flat_map(|(row, _)| row.iter().copied())
                .collect();
            variable.values = kept;
        }
        self.nlocs = mask.iter().filter(|m| **m).count();
        Ok(())
    }

    /// Set every multichannel value to NaN where `mask` (one flag per
    /// location and channel) is false.
    pub fn mask_channels(&mut self, mask: &[bool]) -> Result<()> {
        self.check_len("channel mask", mask.len(), self.nlocs * self.nchans())?;
        for variable in self.variables.values_mut().filter(|v| v.multichannel) {
            for (value, keep) in variable.values.iter_mut().zip(mask) {
                if !keep {
                    *value = f64::NAN;
                }
            }
        }
        Ok(())
    }

    /// For each location, whether any of its values (in any variable) are NaN.
    pub fn nan_locations(&self) -> Vec<bool> {
        let nchans = self.nchans();
        let mut has_nan = vec![false; self.nlocs];
        for variable in self.variables.values() {
            let width = if variable.multichannel { nchans } else { 1 };
            for (flag, row) in has_nan.iter_mut().zip(variable.values.chunks(width)) {
                *flag |= row.iter().any(|v| v.is_nan());
            }
        }
        has_nan
    }
}
