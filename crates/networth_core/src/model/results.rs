//! Simulation results: single-path trajectories and Monte Carlo statistics

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::accounts::{AccountState, ShortfallEvent};
use super::policies::PeriodFrequency;

/// Ordered states of one simulated path, `horizon + 1` long (period 0 included)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    states: Vec<AccountState>,
}

impl Trajectory {
    pub(crate) fn new(states: Vec<AccountState>) -> Self {
        debug_assert!(!states.is_empty());
        Self { states }
    }

    #[must_use]
    pub fn states(&self) -> &[AccountState] {
        &self.states
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false: a trajectory holds at least the initial state
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn horizon(&self) -> usize {
        self.states.len() - 1
    }

    #[must_use]
    pub fn initial(&self) -> &AccountState {
        &self.states[0]
    }

    #[must_use]
    pub fn terminal(&self) -> &AccountState {
        &self.states[self.states.len() - 1]
    }

    /// Portfolio balance per period
    pub fn balances(&self) -> impl Iterator<Item = f64> + '_ {
        self.states.iter().map(AccountState::total_balance)
    }

    /// Lowest portfolio balance over the path, period 0 included
    #[must_use]
    pub fn min_balance(&self) -> f64 {
        self.balances().fold(f64::INFINITY, f64::min)
    }

    pub fn shortfalls(&self) -> impl Iterator<Item = &ShortfallEvent> {
        self.states.iter().filter_map(|s| s.shortfall.as_ref())
    }

    #[must_use]
    pub fn shortfall_periods(&self) -> Vec<usize> {
        self.shortfalls().map(|s| s.period).collect()
    }

    #[must_use]
    pub fn had_shortfall(&self) -> bool {
        self.states.iter().any(AccountState::is_shortfall)
    }

    /// Largest peak-to-trough decline of the portfolio balance, as a fraction
    #[must_use]
    pub fn max_drawdown(&self) -> f64 {
        let mut peak = f64::NEG_INFINITY;
        let mut worst = 0.0_f64;
        for balance in self.balances() {
            peak = peak.max(balance);
            if peak > 0.0 {
                worst = worst.max((peak - balance) / peak);
            }
        }
        worst
    }

    /// Calendar date at the end of each period
    #[must_use]
    pub fn period_dates(&self, start: Date, frequency: PeriodFrequency) -> Vec<Date> {
        (0..self.states.len() as i64)
            .map(|k| start.saturating_add(frequency.span(k)))
            .collect()
    }
}

/// Condition a path must satisfy to count as a success
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Goal {
    /// No period ran short
    #[default]
    NoShortfall,
    /// Portfolio balance at the horizon is at least the target (nominal)
    TerminalBalanceAtLeast(f64),
    /// Net worth at the horizon, deflated to period-0 currency, is at least the target
    RealTerminalNetWorthAtLeast(f64),
    /// Every nested goal holds
    All(Vec<Goal>),
}

impl Goal {
    #[must_use]
    pub fn is_met(&self, trajectory: &Trajectory) -> bool {
        match self {
            Goal::NoShortfall => !trajectory.had_shortfall() && trajectory.min_balance() >= 0.0,
            Goal::TerminalBalanceAtLeast(target) => {
                trajectory.terminal().total_balance() >= *target
            }
            Goal::RealTerminalNetWorthAtLeast(target) => {
                trajectory.terminal().real_net_worth() >= *target
            }
            Goal::All(goals) => goals.iter().all(|g| g.is_met(trajectory)),
        }
    }
}

/// How per-period outcomes are reduced across paths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccumulatorKind {
    /// Keep every value; exact percentiles
    #[default]
    Batch,
    /// Fixed-size online estimators; memory independent of the path count
    Streaming,
}

/// Configuration for a Monte Carlo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub path_count: usize,
    pub seed: u64,
    /// Percentiles to report, in `[0, 100]`
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
    #[serde(default)]
    pub goal: Goal,
    #[serde(default)]
    pub accumulator: AccumulatorKind,
    /// Spread paths over the rayon pool (requires the `parallel` feature)
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Paths simulated per batch before they are reduced
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Number of raw trajectories (lowest path indices) kept for charting
    #[serde(default)]
    pub sample_paths: usize,
}

fn default_percentiles() -> Vec<f64> {
    vec![10.0, 50.0, 90.0]
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    256
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            path_count: 1_000,
            seed: 0,
            percentiles: default_percentiles(),
            goal: Goal::default(),
            accumulator: AccumulatorKind::default(),
            parallel: true,
            chunk_size: default_chunk_size(),
            sample_paths: 0,
        }
    }
}

impl MonteCarloConfig {
    #[must_use]
    pub fn new(path_count: usize, seed: u64) -> Self {
        Self {
            path_count,
            seed,
            ..Default::default()
        }
    }
}

/// Progress tracking and cooperative cancellation for a Monte Carlo run
#[derive(Debug, Clone, Default)]
pub struct MonteCarloProgress {
    completed: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl MonteCarloProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Share existing atomics (e.g. with a UI thread)
    pub fn from_atomics(completed: Arc<AtomicUsize>, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            completed,
            cancelled,
        }
    }

    /// Number of paths simulated so far
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn add_completed(&self, n: usize) {
        self.completed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.completed.store(0, Ordering::Relaxed);
        self.cancelled.store(false, Ordering::Relaxed);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Empirical distribution of one scalar metric across paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// `(percentile, value)` pairs in the requested order
    pub percentiles: Vec<(f64, f64)>,
}

impl DistributionSummary {
    /// Value reported for percentile `p`, if it was requested
    #[must_use]
    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|(q, _)| (*q - p).abs() < 1e-9)
            .map(|(_, v)| *v)
    }
}

/// Portfolio balance percentiles at one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    pub period: usize,
    pub mean: f64,
    /// One value per requested percentile, in the same order
    pub values: Vec<f64>,
}

/// Aggregated outcome of a Monte Carlo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStatistics {
    pub path_count: usize,
    pub horizon: usize,
    pub percentiles: Vec<f64>,
    /// Portfolio balance bands, one per period including period 0
    pub bands: Vec<PercentileBand>,
    pub terminal_balance: DistributionSummary,
    pub terminal_net_worth: DistributionSummary,
    pub min_balance: DistributionSummary,
    /// Fraction of paths meeting the configured goal
    pub success_rate: f64,
    /// Fraction of paths with at least one shortfall period
    pub shortfall_probability: f64,
    /// Fraction of paths short in each period (index 0 is always zero)
    pub shortfall_rate_by_period: Vec<f64>,
}

impl OutcomeStatistics {
    /// Balance series for one requested percentile, suitable for charting
    #[must_use]
    pub fn band_series(&self, percentile: f64) -> Option<Vec<f64>> {
        let idx = self
            .percentiles
            .iter()
            .position(|p| (*p - percentile).abs() < 1e-9)?;
        Some(self.bands.iter().map(|b| b.values[idx]).collect())
    }
}

/// Statistics plus the raw sample trajectories kept for charting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub statistics: OutcomeStatistics,
    pub sample_paths: Vec<Trajectory>,
}
