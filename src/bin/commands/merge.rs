// bin/commands/merge.rs

use super::{check_inputs, expand_inputs};
use bespin::error::BespinError;
use bespin::BinnedStatistics;
use clap::Args;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Args)]
pub struct MergeArgs {
    /// Binned statistics files to merge, or glob patterns.
    #[arg(required = true, value_name = "FILES")]
    pub inputs: Vec<String>,

    /// Output binned statistics file.
    #[arg(short, long, value_name = "merged.bespin")]
    pub output: PathBuf,

    /// Overwrite the output file if it exists.
    #[arg(short = 'O', long)]
    pub overwrite: bool,
}

pub fn run(args: MergeArgs) -> Result<(), BespinError> {
    let inputs = expand_inputs(&args.inputs)?;
    check_inputs(&inputs, 2)?;

    let binned = inputs
        .iter()
        .map(|path| {
            debug!("reading {}", path.display());
            BinnedStatistics::read(path)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let merged = BinnedStatistics::merge_all(binned)?;

    let path = merged.write(&args.output, args.overwrite)?;
    info!("merged {} files into {}", inputs.len(), path.display());
    Ok(())
}
