// bin/commands/show.rs

use bespin::error::BespinError;
use bespin::io::OutputStream;
use bespin::{BinnedStatistics, BinnedSummary, StatKind, StatQuery, StatTable};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args)]
pub struct ShowArgs {
    /// Binned statistics file.
    #[arg(value_name = "binned.bespin")]
    pub input: PathBuf,

    /// Print the summary as JSON.
    #[arg(long, conflicts_with = "values")]
    pub json: bool,

    /// Write the statistic values as TSV, one row per bin (and channel).
    #[arg(long)]
    pub values: bool,

    /// Output file for --values (stdout if not given, gzipped if it ends with .gz).
    #[arg(short, long, requires = "values")]
    pub output: Option<PathBuf>,

    /// Only output this variable (repeatable).
    #[arg(long = "variable", value_name = "VAR", requires = "values")]
    pub variables: Vec<String>,

    /// Only output this diagnostic (repeatable).
    #[arg(long = "diagnostic", value_name = "DIAG", requires = "values")]
    pub diagnostics: Vec<String>,

    /// Only output this statistic, core or derived (repeatable).
    #[arg(long = "statistic", value_name = "STAT", requires = "values")]
    pub statistics: Vec<StatKind>,
}

pub fn run(args: ShowArgs) -> Result<(), BespinError> {
    let binned = BinnedStatistics::read(&args.input)?;

    if !args.values {
        let summary = BinnedSummary::analyze(&binned);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print!("{}", summary.generate_report());
        }
        return Ok(());
    }

    let mut query = StatQuery::all();
    for variable in &args.variables {
        query = query.variable(variable);
    }
    for diagnostic in &args.diagnostics {
        query = query.diagnostic(diagnostic);
    }
    for statistic in &args.statistics {
        query = query.statistic(*statistic);
    }
    let table = binned.get(&query)?;
    if table.is_empty() {
        return Err("No statistics match the requested variables, diagnostics and statistics".into());
    }

    let output = OutputStream::new(args.output.as_ref());
    let mut writer = output.writer()?;
    write_values(&table, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a table with a column for each bin coordinate (bin centers), the
/// channel if any field has one, and each statistic.
pub fn write_values(table: &StatTable, writer: &mut dyn Write) -> Result<(), BespinError> {
    let ndims = table.dimensions.len();
    let channels = table
        .fields
        .values()
        .any(|f| f.shape.len() > ndims)
        .then(|| table.channels.clone().unwrap_or_default());

    let mut header: Vec<&str> = table.dimensions.iter().map(|d| d.name.as_str()).collect();
    if channels.is_some() {
        header.push("channel");
    }
    header.extend(table.names());
    writeln!(writer, "{}", header.join("\t"))?;

    let centers: Vec<Vec<f64>> = table.dimensions.iter().map(|d| d.centers()).collect();
    let nbins: usize = centers.iter().map(Vec::len).product();
    let nchans = channels.as_ref().map_or(1, Vec::len);

    let mut index = vec![0; ndims];
    for flat in 0..nbins {
        // Row-major, last dimension fastest
        let mut rest = flat;
        for axis in (0..ndims).rev() {
            index[axis] = rest % centers[axis].len();
            rest /= centers[axis].len();
        }
        for chan in 0..nchans {
            let mut columns = index
                .iter()
                .zip(&centers)
                .map(|(i, c)| c[*i].to_string())
                .collect::<Vec<_>>();
            if let Some(channels) = &channels {
                columns.push(channels[chan].to_string());
            }
            for field in table.fields.values() {
                let value = if field.shape.len() > ndims {
                    field.values[flat * nchans + chan]
                } else {
                    field.values[flat]
                };
                columns.push(value.to_string());
            }
            writeln!(writer, "{}", columns.join("\t"))?;
        }
    }
    Ok(())
}
