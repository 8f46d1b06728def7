//! Reduction of simulated paths into outcome statistics.
//!
//! Two accumulators share one shape:
//!
//! - [`BatchAccumulator`] stores every value and reports exact percentiles.
//! - [`StreamingAccumulator`] keeps Welford moments and P² quantile markers,
//!   so memory does not grow with the number of paths.

mod accumulator;
mod quantile;

pub use accumulator::{
    BatchAccumulator, ExactSink, MetricSink, OutcomeAccumulator, StreamingAccumulator,
    StreamingSink,
};
pub use quantile::{OnlineStats, P2Quantile, percentile};
