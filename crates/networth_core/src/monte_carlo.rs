//! Monte Carlo aggregator: many paths reduced to outcome statistics
//!
//! Paths are simulated in chunks. Within a chunk they may run on the rayon
//! pool, but each chunk is collected in path-index order and folded into the
//! accumulator sequentially, so the statistics do not depend on scheduling.

use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analysis::{ExactSink, MetricSink, OutcomeAccumulator, StreamingSink};
use crate::config::SimulationParameters;
use crate::error::{InvalidParameterError, SimulationError};
use crate::model::{
    AccumulatorKind, MonteCarloConfig, MonteCarloProgress, MonteCarloResult, OutcomeStatistics,
    Trajectory,
};
use crate::scenario::draw_path;
use crate::simulation::run_path;

/// Shortfall probability above which a run is logged as a warning
const HIGH_SHORTFALL_PROBABILITY: f64 = 0.25;

/// Run `path_count` paths with default reporting options
pub fn aggregate(
    params: &SimulationParameters,
    path_count: usize,
    seed: u64,
) -> Result<OutcomeStatistics, SimulationError> {
    let config = MonteCarloConfig::new(path_count, seed);
    Ok(monte_carlo_simulate(params, &config, None)?.statistics)
}

/// Run a Monte Carlo simulation.
///
/// Cancellation through `progress` is checked before every path and returns
/// [`SimulationError::Cancelled`].
pub fn monte_carlo_simulate(
    params: &SimulationParameters,
    config: &MonteCarloConfig,
    progress: Option<&MonteCarloProgress>,
) -> Result<MonteCarloResult, SimulationError> {
    if config.path_count == 0 {
        return Err(InvalidParameterError::ZeroPathCount.into());
    }
    if let Some(&p) = config
        .percentiles
        .iter()
        .find(|p| !(0.0..=100.0).contains(*p))
    {
        return Err(InvalidParameterError::InvalidPercentile(p).into());
    }
    params.validate()?;

    info!(
        paths = config.path_count,
        horizon = params.horizon,
        seed = config.seed,
        accumulator = ?config.accumulator,
        "starting monte carlo run"
    );

    let result = match config.accumulator {
        AccumulatorKind::Batch => run::<ExactSink>(params, config, progress)?,
        AccumulatorKind::Streaming => run::<StreamingSink>(params, config, progress)?,
    };

    let stats = &result.statistics;
    if stats.shortfall_probability > HIGH_SHORTFALL_PROBABILITY {
        warn!(
            shortfall_probability = stats.shortfall_probability,
            "a large share of paths ran short of funds"
        );
    }
    info!(
        success_rate = stats.success_rate,
        terminal_mean = stats.terminal_balance.mean,
        "monte carlo run complete"
    );
    Ok(result)
}

fn run<S: MetricSink>(
    params: &SimulationParameters,
    config: &MonteCarloConfig,
    progress: Option<&MonteCarloProgress>,
) -> Result<MonteCarloResult, SimulationError> {
    let mut accumulator =
        OutcomeAccumulator::<S>::new(params.horizon, &config.percentiles, config.goal.clone());
    let mut sample_paths = Vec::with_capacity(config.sample_paths.min(config.path_count));
    let chunk_size = config.chunk_size.max(1);

    let mut start = 0;
    while start < config.path_count {
        let end = (start + chunk_size).min(config.path_count);
        let trajectories = simulate_chunk(params, config, start..end, progress)?;
        debug!(first = start, last = end - 1, "chunk simulated");

        for (path_index, trajectory) in (start..end).zip(trajectories) {
            accumulator.push(&trajectory);
            if path_index < config.sample_paths {
                sample_paths.push(trajectory);
            }
        }
        start = end;
    }

    Ok(MonteCarloResult {
        statistics: accumulator.finish(),
        sample_paths,
    })
}

/// Simulate the paths in `range`, returned in path-index order
fn simulate_chunk(
    params: &SimulationParameters,
    config: &MonteCarloConfig,
    range: Range<usize>,
    progress: Option<&MonteCarloProgress>,
) -> Result<Vec<Trajectory>, SimulationError> {
    let seed = config.seed;
    let one_path = |path_index: usize| -> Result<Trajectory, SimulationError> {
        if progress.is_some_and(MonteCarloProgress::is_cancelled) {
            return Err(SimulationError::Cancelled);
        }
        let draws = draw_path(params, path_index, seed)?;
        let trajectory = run_path(params, &draws);
        if let Some(p) = progress {
            p.add_completed(1);
        }
        Ok(trajectory)
    };

    #[cfg(feature = "parallel")]
    let trajectories: Result<Vec<Trajectory>, SimulationError> = if config.parallel {
        range.into_par_iter().map(&one_path).collect()
    } else {
        range.map(&one_path).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let trajectories: Result<Vec<Trajectory>, SimulationError> = range.map(&one_path).collect();

    trajectories
}
