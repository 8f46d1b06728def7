use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Context;
use networth::report::{
    monte_carlo_json, render_statistics, render_trajectory, trajectory_json,
};
use networth::{RunOverrides, init_logging, load_preset};
use networth_core::model::MonteCarloProgress;
use networth_core::{monte_carlo_simulate, simulate};

#[derive(Parser, Debug)]
#[command(name = "networth")]
#[command(about = "Monte Carlo projection of household net worth")]
struct Args {
    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a Monte Carlo batch and print aggregated statistics
    Run {
        /// YAML preset describing the household
        preset: PathBuf,
        /// Number of paths (overrides the preset)
        #[arg(short, long)]
        paths: Option<usize>,
        /// Master seed (overrides the preset)
        #[arg(short, long)]
        seed: Option<u64>,
        /// Use bounded-memory streaming percentiles
        #[arg(long)]
        streaming: bool,
        /// Simulate paths on the calling thread only
        #[arg(long)]
        sequential: bool,
        /// Number of sample trajectories to keep in the output
        #[arg(long, default_value_t = 0)]
        sample_paths: usize,
        /// Periods between printed band rows
        #[arg(long, default_value_t = 12)]
        band_step: usize,
        /// Print JSON instead of a text report
        #[arg(long)]
        json: bool,
    },
    /// Simulate a single path and print it period by period
    Path {
        preset: PathBuf,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let _guard = init_logging(args.log_file.as_deref(), &args.log_level)?;

    match args.command {
        Command::Run {
            preset,
            paths,
            seed,
            streaming,
            sequential,
            sample_paths,
            band_step,
            json,
        } => {
            let preset = load_preset(&preset)?;
            let params = preset.to_parameters();
            let overrides = RunOverrides {
                paths,
                seed,
                streaming,
                sequential,
            };
            let mut config = preset.monte_carlo_config(&overrides);
            config.sample_paths = sample_paths;

            let progress = MonteCarloProgress::new();
            let result = monte_carlo_simulate(&params, &config, Some(&progress))
                .wrap_err_with(|| format!("Simulation of {:?} failed", preset.name))?;
            tracing::debug!(completed = progress.completed(), "Monte Carlo finished");

            if json {
                println!("{}", monte_carlo_json(&preset.name, &params, &result)?);
            } else {
                if !preset.name.is_empty() {
                    println!("{}\n", preset.name);
                }
                print!("{}", render_statistics(&params, &result.statistics, band_step));
            }
        }
        Command::Path { preset, seed, json } => {
            let preset = load_preset(&preset)?;
            let params = preset.to_parameters();
            let trajectory = simulate(&params, seed.unwrap_or(preset.seed))
                .wrap_err_with(|| format!("Simulation of {:?} failed", preset.name))?;

            if json {
                println!("{}", trajectory_json(&params, &trajectory)?);
            } else {
                print!("{}", render_trajectory(&params, &trajectory));
            }
        }
    }

    tracing::info!("networth finished");
    Ok(())
}
