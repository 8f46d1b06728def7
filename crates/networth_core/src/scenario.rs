//! Scenario generation: random market draws for each simulated path
//!
//! Every path owns a `ChaCha8Rng` seeded with the run seed and switched to the
//! stream numbered by the path index. A path's draws therefore depend only on
//! `(seed, path_index)` and not on how paths are scheduled across threads.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimulationParameters;
use crate::error::{InvalidParameterError, Result};

/// Random draws consumed by one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodDraw {
    /// Per-period return for each bucket, in parameter order
    pub returns: Vec<f64>,
    /// Per-period inflation rate
    pub inflation: f64,
}

/// All draws of one path, one entry per period of the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawSequence {
    periods: Vec<PeriodDraw>,
}

impl DrawSequence {
    #[must_use]
    pub fn new(periods: Vec<PeriodDraw>) -> Self {
        Self { periods }
    }

    /// Same returns and inflation in every period
    #[must_use]
    pub fn constant(horizon: usize, returns: &[f64], inflation: f64) -> Self {
        let draw = PeriodDraw {
            returns: returns.to_vec(),
            inflation,
        };
        Self {
            periods: vec![draw; horizon],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    #[must_use]
    pub fn get(&self, period: usize) -> Option<&PeriodDraw> {
        self.periods.get(period)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeriodDraw> {
        self.periods.iter()
    }

    /// Check the sequence against the parameters it will drive
    pub fn check_shape(&self, params: &SimulationParameters) -> Result<()> {
        if self.periods.len() < params.horizon {
            return Err(InvalidParameterError::DrawSequenceTooShort {
                expected: params.horizon,
                actual: self.periods.len(),
            });
        }
        let expected = params.buckets.len();
        for (period, draw) in self.periods.iter().take(params.horizon).enumerate() {
            if draw.returns.len() != expected {
                return Err(InvalidParameterError::DrawBucketMismatch {
                    period,
                    expected,
                    actual: draw.returns.len(),
                });
            }
        }
        Ok(())
    }
}

/// Random generator for one path
#[must_use]
pub fn path_rng(seed: u64, path_index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(path_index as u64);
    rng
}

/// Draw sequences for `path_count` paths
pub fn generate(
    params: &SimulationParameters,
    path_count: usize,
    seed: u64,
) -> Result<Vec<DrawSequence>> {
    if path_count == 0 {
        return Err(InvalidParameterError::ZeroPathCount);
    }
    params.validate()?;
    (0..path_count)
        .map(|path_index| draw_path(params, path_index, seed))
        .collect()
}

/// Draw sequence of a single path
pub fn generate_path(
    params: &SimulationParameters,
    path_index: usize,
    seed: u64,
) -> Result<DrawSequence> {
    params.validate()?;
    draw_path(params, path_index, seed)
}

/// Sample one path without re-validating the parameters.
///
/// Buckets are sampled in declared order, each over the full horizon so that
/// regime and bootstrap state carry across periods, then inflation.
pub(crate) fn draw_path(
    params: &SimulationParameters,
    path_index: usize,
    seed: u64,
) -> Result<DrawSequence> {
    let mut rng = path_rng(seed, path_index);
    let horizon = params.horizon;
    let ppy = params.periods_per_year();

    let bucket_returns = params
        .buckets
        .iter()
        .map(|bucket| bucket.returns.sample_sequence(&mut rng, horizon, ppy))
        .collect::<Result<Vec<_>>>()?;
    let inflation = params.inflation.sample_sequence(&mut rng, horizon, ppy)?;

    let periods = (0..horizon)
        .map(|k| PeriodDraw {
            returns: bucket_returns.iter().map(|series| series[k]).collect(),
            inflation: inflation[k],
        })
        .collect();

    Ok(DrawSequence { periods })
}
