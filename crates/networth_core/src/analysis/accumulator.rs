//! Reducers that fold trajectories into `OutcomeStatistics`
//!
//! Trajectories must be pushed in path-index order; with that, sequential and
//! parallel runs reduce to identical statistics.

use super::quantile::{OnlineStats, P2Quantile, percentile};
use crate::model::{DistributionSummary, Goal, OutcomeStatistics, PercentileBand, Trajectory};

/// Collects one scalar metric across paths
pub trait MetricSink {
    fn new(percentiles: &[f64]) -> Self;
    fn push(&mut self, x: f64);
    fn summarize(&self, percentiles: &[f64]) -> DistributionSummary;
}

/// Stores every value; exact percentiles
#[derive(Debug, Clone, Default)]
pub struct ExactSink {
    values: Vec<f64>,
}

impl MetricSink for ExactSink {
    fn new(_percentiles: &[f64]) -> Self {
        Self::default()
    }

    fn push(&mut self, x: f64) {
        self.values.push(x);
    }

    fn summarize(&self, percentiles: &[f64]) -> DistributionSummary {
        let mut stats = OnlineStats::default();
        for &x in &self.values {
            stats.push(x);
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        DistributionSummary {
            mean: stats.mean(),
            std_dev: stats.std_dev(),
            min: stats.min(),
            max: stats.max(),
            percentiles: percentiles
                .iter()
                .map(|&p| (p, percentile(&sorted, p)))
                .collect(),
        }
    }
}

/// Fixed-size state: Welford moments plus one P² estimator per percentile
#[derive(Debug, Clone)]
pub struct StreamingSink {
    stats: OnlineStats,
    quantiles: Vec<P2Quantile>,
}

impl MetricSink for StreamingSink {
    fn new(percentiles: &[f64]) -> Self {
        Self {
            stats: OnlineStats::default(),
            quantiles: percentiles.iter().map(|&p| P2Quantile::new(p)).collect(),
        }
    }

    fn push(&mut self, x: f64) {
        self.stats.push(x);
        for q in &mut self.quantiles {
            q.push(x);
        }
    }

    fn summarize(&self, percentiles: &[f64]) -> DistributionSummary {
        DistributionSummary {
            mean: self.stats.mean(),
            std_dev: self.stats.std_dev(),
            min: self.stats.min(),
            max: self.stats.max(),
            percentiles: percentiles
                .iter()
                .zip(&self.quantiles)
                .map(|(&p, q)| (p, q.estimate()))
                .collect(),
        }
    }
}

/// Folds trajectories of equal horizon into outcome statistics
#[derive(Debug, Clone)]
pub struct OutcomeAccumulator<S> {
    percentiles: Vec<f64>,
    goal: Goal,
    horizon: usize,
    paths: usize,
    successes: usize,
    paths_with_shortfall: usize,
    shortfalls_by_period: Vec<usize>,
    bands: Vec<S>,
    terminal_balance: S,
    terminal_net_worth: S,
    min_balance: S,
}

impl<S: MetricSink> OutcomeAccumulator<S> {
    #[must_use]
    pub fn new(horizon: usize, percentiles: &[f64], goal: Goal) -> Self {
        Self {
            percentiles: percentiles.to_vec(),
            goal,
            horizon,
            paths: 0,
            successes: 0,
            paths_with_shortfall: 0,
            shortfalls_by_period: vec![0; horizon + 1],
            bands: (0..=horizon).map(|_| S::new(percentiles)).collect(),
            terminal_balance: S::new(percentiles),
            terminal_net_worth: S::new(percentiles),
            min_balance: S::new(percentiles),
        }
    }

    pub fn push(&mut self, trajectory: &Trajectory) {
        debug_assert_eq!(trajectory.horizon(), self.horizon);
        self.paths += 1;
        if self.goal.is_met(trajectory) {
            self.successes += 1;
        }
        if trajectory.had_shortfall() {
            self.paths_with_shortfall += 1;
        }

        for (idx, state) in trajectory.states().iter().enumerate() {
            self.bands[idx].push(state.total_balance());
            if state.is_shortfall() {
                self.shortfalls_by_period[idx] += 1;
            }
        }

        let terminal = trajectory.terminal();
        self.terminal_balance.push(terminal.total_balance());
        self.terminal_net_worth.push(terminal.net_worth());
        self.min_balance.push(trajectory.min_balance());
    }

    #[must_use]
    pub fn paths(&self) -> usize {
        self.paths
    }

    #[must_use]
    pub fn finish(&self) -> OutcomeStatistics {
        let n = self.paths.max(1) as f64;
        let bands = self
            .bands
            .iter()
            .enumerate()
            .map(|(period, sink)| {
                let summary = sink.summarize(&self.percentiles);
                PercentileBand {
                    period,
                    mean: summary.mean,
                    values: summary.percentiles.iter().map(|(_, v)| *v).collect(),
                }
            })
            .collect();

        OutcomeStatistics {
            path_count: self.paths,
            horizon: self.horizon,
            percentiles: self.percentiles.clone(),
            bands,
            terminal_balance: self.terminal_balance.summarize(&self.percentiles),
            terminal_net_worth: self.terminal_net_worth.summarize(&self.percentiles),
            min_balance: self.min_balance.summarize(&self.percentiles),
            success_rate: self.successes as f64 / n,
            shortfall_probability: self.paths_with_shortfall as f64 / n,
            shortfall_rate_by_period: self
                .shortfalls_by_period
                .iter()
                .map(|&c| c as f64 / n)
                .collect(),
        }
    }
}

pub type BatchAccumulator = OutcomeAccumulator<ExactSink>;
pub type StreamingAccumulator = OutcomeAccumulator<StreamingSink>;
