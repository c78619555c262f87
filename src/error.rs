// error.rs

use std::num::ParseFloatError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BespinError {
    #[error("Invalid dimension \"{name}\": {reason}")]
    InvalidDimension { name: String, reason: String },

    #[error("Unable to parse dimension string \"{0}\". Expected <name>:r=<res>[:b=<lo>,<hi>] or <name>:e=<edge>,<edge>,...")]
    DimensionParse(String),

    #[error("Invalid diagnostic \"{name}\": {reason}")]
    InvalidDiagnostic { name: String, reason: String },

    #[error("Unable to parse diagnostic string \"{0}\". Expected <name>[:<stat>,<stat>,...]")]
    DiagnosticParse(String),

    #[error("Statistic \"{0}\" does not exist")]
    UnknownStatistic(String),

    #[error("Statistic \"{statistic}\" depends on \"{dependency}\", but it has not been calculated")]
    MissingStatistic {
        statistic: String,
        dependency: String,
    },

    #[error("Cannot create filter \"{0}\". It has not been registered.")]
    UnknownFilter(String),

    #[error("Invalid arguments for filter \"{filter}\": {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Variable \"{0}\" missing from unbinned data")]
    MissingVariable(String),

    #[error("Binning dimension \"{0}\" missing from unbinned data")]
    MissingDimension(String),

    #[error("Cannot bin variable \"{0}\", already exists")]
    DuplicateVariable(String),

    #[error("Shape mismatch for \"{name}\": expected {expected} values, found {found}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Binned statistics are not compatible: {0}")]
    Incompatible(String),

    #[error("Invalid binned statistics file {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("Output file {0} exists. Remove file or run with the \"-O\" option")]
    FileExists(PathBuf),

    #[error("Unable to load file {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid observation file {path}: {reason}")]
    InvalidObs { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Parse float error: {0}")]
    ParseFloatError(#[from] ParseFloatError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),

    #[error("Bincode error: {0}")]
    BincodeError(String),

    #[error("{0}")]
    StringError(String),

    #[cfg(feature = "cli")]
    #[error("Template error: {0}")]
    TemplateError(#[from] indicatif::style::TemplateError),
}

// Add a convenience implementation for &str errors
impl From<&str> for BespinError {
    fn from(error: &str) -> Self {
        BespinError::StringError(error.to_string())
    }
}

impl From<String> for BespinError {
    fn from(error: String) -> Self {
        BespinError::StringError(error)
    }
}

impl From<Box<bincode::ErrorKind>> for BespinError {
    fn from(error: Box<bincode::ErrorKind>) -> Self {
        BespinError::BincodeError(error.to_string())
    }
}

#[cfg(feature = "cli")]
impl From<glob::GlobError> for BespinError {
    fn from(error: glob::GlobError) -> Self {
        BespinError::StringError(format!("Glob error: {}", error))
    }
}

#[cfg(feature = "cli")]
impl From<glob::PatternError> for BespinError {
    fn from(error: glob::PatternError) -> Self {
        BespinError::StringError(format!("Glob pattern error: {}", error))
    }
}

pub type Result<T> = std::result::Result<T, BespinError>;
