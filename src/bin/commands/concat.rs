// bin/commands/concat.rs

use super::{check_inputs, expand_inputs};
use bespin::error::BespinError;
use bespin::BinnedStatistics;
use clap::Args;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Args)]
pub struct ConcatArgs {
    /// Binned statistics files to concatenate, or glob patterns.
    #[arg(required = true, value_name = "FILES")]
    pub inputs: Vec<String>,

    /// Output binned statistics file.
    #[arg(short, long, value_name = "concat.bespin")]
    pub output: PathBuf,

    /// Dimension to concatenate along. Only "time" is added when missing.
    #[arg(short, long, default_value = "time")]
    pub dimension: String,

    /// Overwrite the output file if it exists.
    #[arg(short = 'O', long)]
    pub overwrite: bool,
}

pub fn run(args: ConcatArgs) -> Result<(), BespinError> {
    let inputs = expand_inputs(&args.inputs)?;
    check_inputs(&inputs, 2)?;

    let binned = inputs
        .iter()
        .map(|path| {
            debug!("reading {}", path.display());
            BinnedStatistics::read(path)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let concatenated = BinnedStatistics::concat_all(binned, &args.dimension)?;

    let path = concatenated.write(&args.output, args.overwrite)?;
    info!(
        "concatenated {} files along \"{}\" into {}",
        inputs.len(),
        args.dimension,
        path.display()
    );
    Ok(())
}
