// bin/commands/mod.rs

pub mod bin;
pub mod concat;
pub mod merge;
#[cfg(feature = "dev")]
pub mod random_obs;
pub mod show;

use bespin::error::BespinError;
use indicatif::{ProgressBar, ProgressStyle};
use rustc_hash::FxHashSet;
use std::path::PathBuf;

/// Expand input arguments that are glob patterns. Plain paths are kept as
/// given, so a missing file is reported by whatever opens it.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>, BespinError> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(input));
            continue;
        }
        let mut matches = glob::glob(input)?.collect::<Result<Vec<_>, _>>()?;
        if matches.is_empty() {
            return Err(BespinError::FileNotFound(PathBuf::from(input)));
        }
        matches.sort();
        paths.extend(matches);
    }
    Ok(paths)
}

/// Inputs must be listed once each, and there must be at least `min` of them.
pub fn check_inputs(paths: &[PathBuf], min: usize) -> Result<(), BespinError> {
    let mut seen = FxHashSet::default();
    for path in paths {
        if !seen.insert(path) {
            return Err(BespinError::StringError(format!(
                "Duplicate input file {}",
                path.display()
            )));
        }
    }
    if paths.len() < min {
        return Err(BespinError::StringError(format!(
            "At least {} input files are required, got {}",
            min,
            paths.len()
        )));
    }
    Ok(())
}

pub fn progress_bar(len: u64) -> Result<ProgressBar, BespinError> {
    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue}⟩ {pos}/{len} ({percent}%) [{eta_precise}]",
            )?
            .progress_chars("=> "),
    );
    Ok(progress)
}
