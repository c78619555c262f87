// bin/commands/bin.rs

use super::{check_inputs, expand_inputs, progress_bar};
use bespin::block::with_suffix;
use bespin::error::BespinError;
use bespin::RunConfig;
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Args)]
pub struct BinArgs {
    /// Observation files (.tsv, .csv, optionally gzipped) or glob patterns.
    #[arg(required = true, value_name = "OBS_FILES")]
    pub inputs: Vec<String>,

    /// Output binned statistics file. The .bespin suffix is added if missing.
    #[arg(short, long, value_name = "out.bespin")]
    pub output: PathBuf,

    /// JSON run configuration. Command line values are added after it.
    #[arg(short, long, value_name = "run.json")]
    pub config: Option<PathBuf>,

    /// Filter to apply, e.g. "range:ObsValue/{variable}:200,350" (repeatable).
    #[arg(short, long = "filter", value_name = "FILTER")]
    pub filters: Vec<String>,

    /// Variable to bin (repeatable). Found from the obs file if not given.
    #[arg(short, long = "var", value_name = "VAR")]
    pub variables: Vec<String>,

    /// Diagnostic and its statistics, e.g. "ombg:count,sum,sum2" (repeatable).
    #[arg(short, long = "diag", value_name = "DIAG")]
    pub diagnostics: Vec<String>,

    /// Binning dimension, e.g. "latitude:r=10" (repeatable).
    #[arg(short, long = "bin", value_name = "BIN")]
    pub bins: Vec<String>,

    /// Name of the binned statistics. Made from the dimension names if not given.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Overwrite the output file if it exists.
    #[arg(short = 'O', long)]
    pub overwrite: bool,

    /// Number of threads to use (defaults to the number of CPUs).
    #[arg(short, long)]
    pub threads: Option<usize>,
}

pub fn run(args: BinArgs) -> Result<(), BespinError> {
    let start = Instant::now();
    let inputs = expand_inputs(&args.inputs)?;
    check_inputs(&inputs, 1)?;

    // Fail before doing any work
    let output = with_suffix(&args.output);
    if output.exists() && !args.overwrite {
        return Err(BespinError::FileExists(output));
    }

    let mut config = match &args.config {
        Some(path) => RunConfig::read(path)?,
        None => RunConfig::default(),
    };
    config.extend(RunConfig {
        name: args.name,
        variables: args.variables,
        diagnostics: args.diagnostics,
        bins: args.bins,
        filters: args.filters,
    });
    let plan = config.plan()?;

    let threads = args.threads.unwrap_or_else(num_cpus::get).max(1);
    info!(
        "binning {} obs files into \"{}\" with {} threads",
        inputs.len(),
        plan.name,
        threads
    );

    let progress = progress_bar(inputs.len() as u64)?;
    let binned = plan.bin_files(&inputs, threads, |_| progress.inc(1))?;
    progress.finish_and_clear();

    let path = binned.write(&output, args.overwrite)?;
    info!("wrote {} in {:?}", path.display(), start.elapsed());
    Ok(())
}
