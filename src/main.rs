use adaptive_signal_sim::runtime::{run_threaded, LockstepRunner, RunOptions};
use adaptive_signal_sim::simulation::{SimConfig, SimWorld};
use anyhow::{bail, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "adaptive_signal_sim")]
#[command(about = "Adaptive traffic signal simulation with emergency vehicle priority")]
struct Cli {
    /// Total simulated seconds (overrides the config file)
    #[arg(long)]
    duration: Option<u64>,

    /// Seed for reproducible vehicle generation
    #[arg(long)]
    seed: Option<u64>,

    /// Run every component on one thread in a fixed order, without sleeping
    #[arg(long)]
    lockstep: bool,

    /// Simulated seconds per wall-clock second
    #[arg(long, default_value = "1.0")]
    time_scale: f64,

    /// Motion frames per simulated second
    #[arg(long, default_value = "60")]
    frames_per_second: u32,

    /// JSON configuration file; omitted fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Print the intersection map every N simulated seconds
    #[arg(long)]
    map_every: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,adaptive_signal_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(duration) = cli.duration {
        config.duration_secs = duration;
    }
    let params = config.into_params()?;
    if cli.frames_per_second == 0 {
        bail!("frames per second must be at least 1");
    }

    let options = RunOptions {
        frames_per_second: cli.frames_per_second,
        time_scale: cli.time_scale,
        map_every: cli.map_every,
    };

    info!(
        "Running intersection simulation for {}s ({} mode)",
        params.duration_secs,
        if cli.lockstep { "lockstep" } else { "threaded" }
    );

    let world = match cli.seed {
        Some(seed) => SimWorld::new_with_seed(params, seed),
        None => SimWorld::new(params),
    };

    let report = if cli.lockstep {
        LockstepRunner::new(world, options).run()
    } else {
        run_threaded(world, options)?
    };

    report.log_summary();
    if cli.json {
        println!("{}", report.to_json()?);
    }
    Ok(())
}
