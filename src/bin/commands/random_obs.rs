// bin/commands/random_obs.rs

use bespin::error::BespinError;
use bespin::{write_obs, ObsSpace};
use chrono::{Duration, TimeZone, Utc};
use clap::Args;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct RandomObsArgs {
    /// Output file path (.tsv or .tsv.gz)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of locations to generate
    #[arg(short = 'n', long, default_value = "100000")]
    pub num_locations: usize,

    /// Number of channels. With channels, a multichannel brightness_temperature
    /// is generated instead of air_temperature.
    #[arg(short, long, default_value = "0")]
    pub channels: usize,

    /// Optional seed for random number generation
    #[arg(short, long)]
    pub seed: Option<u64>,
}

pub fn run(args: RandomObsArgs) -> Result<(), BespinError> {
    info!(
        "Generating {} random obs locations to {}",
        args.num_locations,
        args.output.display()
    );
    let obs = generate_random_obs(args.num_locations, args.channels, args.seed)?;
    write_obs(&obs, &args.output)
}

/// Obs uniformly spread over the globe and a six hour window, with
/// departures scattered around zero.
pub fn generate_random_obs(
    nlocs: usize,
    nchans: usize,
    seed: Option<u64>,
) -> Result<ObsSpace, BespinError> {
    let mut rng = match seed {
        Some(s) => rand::rngs::StdRng::seed_from_u64(s),
        None => rand::rngs::StdRng::from_entropy(),
    };

    let start = Utc
        .with_ymd_and_hms(2020, 12, 15, 3, 0, 0)
        .single()
        .ok_or("invalid window start")?;
    let end = start + Duration::hours(6);
    let seconds = (end - start).num_seconds() as f64;

    let (mut obs, variable, width) = if nchans > 0 {
        let channels = (1..=nchans as i64).collect();
        (
            ObsSpace::with_channels(nlocs, channels),
            "brightness_temperature",
            nchans,
        )
    } else {
        (ObsSpace::new(nlocs), "air_temperature", 1)
    };
    obs = obs.with_window(start, end);

    let start_seconds = start.timestamp() as f64;
    let mut latitude = Vec::with_capacity(nlocs);
    let mut longitude = Vec::with_capacity(nlocs);
    let mut date_time = Vec::with_capacity(nlocs);
    for _ in 0..nlocs {
        latitude.push(rng.gen_range(-90.0..=90.0));
        longitude.push(rng.gen_range(0.0..360.0));
        date_time.push((start_seconds + rng.gen_range(0.0..seconds)).floor());
    }

    let mut obs_value = Vec::with_capacity(nlocs * width);
    let mut ombg = Vec::with_capacity(nlocs * width);
    let mut oman = Vec::with_capacity(nlocs * width);
    for _ in 0..nlocs * width {
        let departure: f64 = rng.gen_range(-2.0..2.0);
        obs_value.push(rng.gen_range(200.0..310.0));
        ombg.push(departure);
        oman.push(departure * rng.gen_range(0.25..0.75));
    }

    obs.insert("MetaData/latitude", latitude)?;
    obs.insert("MetaData/longitude", longitude)?;
    obs.insert("MetaData/dateTime", date_time)?;
    let columns = [("ObsValue", obs_value), ("ombg", ombg), ("oman", oman)];
    for (group, values) in columns {
        let name = format!("{}/{}", group, variable);
        if nchans > 0 {
            obs.insert_multichannel(&name, values)?;
        } else {
            obs.insert(&name, values)?;
        }
    }
    Ok(obs)
}
