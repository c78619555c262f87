#[cfg(feature = "cli")]
mod commands;

#[cfg(feature = "cli")]
mod cli {
    use crate::commands::{bin, concat, merge, show};
    #[cfg(feature = "dev")]
    use crate::commands::random_obs;
    use bespin::error::BespinError;
    use clap::Parser;
    use tracing::Level;

    #[derive(Parser)]
    #[command(author, version, about, long_about = None)]
    pub struct Cli {
        /// Show debug logging.
        #[arg(short, long, conflicts_with = "quiet")]
        verbose: bool,

        /// Only show warnings and errors.
        #[arg(short, long)]
        quiet: bool,

        #[command(subcommand)]
        command: Commands,
    }

    #[derive(clap::Subcommand)]
    enum Commands {
        /// Bin observation files.
        Bin(bin::BinArgs),
        /// Merge binned statistics files with the same dimensions.
        Merge(merge::MergeArgs),
        /// Concatenate binned statistics files along a dimension.
        Concat(concat::ConcatArgs),
        /// Summarize a binned statistics file, or dump its values.
        Show(show::ShowArgs),
        #[cfg(feature = "dev")]
        /// Generate a random obs file for testing and benchmarking (only with dev feature)
        RandomObs(random_obs::RandomObsArgs),
    }

    fn init_logging(cli: &Cli) {
        let level = if cli.verbose {
            Level::DEBUG
        } else if cli.quiet {
            Level::WARN
        } else {
            Level::INFO
        };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run() -> Result<(), BespinError> {
        let cli = Cli::parse();
        init_logging(&cli);
        match cli.command {
            Commands::Bin(args) => bin::run(args),
            Commands::Merge(args) => merge::run(args),
            Commands::Concat(args) => concat::run(args),
            Commands::Show(args) => show::run(args),
            #[cfg(feature = "dev")]
            Commands::RandomObs(args) => random_obs::run(args),
        }
    }
}

fn main() {
    #[cfg(feature = "cli")]
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("CLI feature not enabled. Please rebuild with --features cli");
        std::process::exit(1);
    }
}
