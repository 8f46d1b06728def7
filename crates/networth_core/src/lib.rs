//! Net worth projection library
//!
//! This crate turns a household's financial parameters into projected account
//! balances, one path at a time or across many randomized market scenarios.
//! It supports:
//! - Asset buckets with their own return models (fixed, normal, log-normal,
//!   Student's t, regime switching, historical bootstrap)
//! - Named income and expense streams with start/end periods
//! - Contribution and withdrawal policies with a bucket priority order
//! - Properties bought and sold mid-horizon, financed by amortizing loans
//! - Pluggable income tax and stochastic inflation
//! - Monte Carlo aggregation with exact or streaming percentiles
//!
//! # Builder DSL
//!
//! ```ignore
//! use networth_core::{ParametersBuilder, aggregate};
//! use networth_core::model::ReturnProfile;
//!
//! let params = ParametersBuilder::new()
//!     .years(30)
//!     .bucket("Stocks", 100_000.0, 1.0, ReturnProfile::EQUITY_NORMAL)
//!     .withdraw_fixed(4_000.0, true)
//!     .build()?;
//! let stats = aggregate(&params, 10_000, 42)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod error;
pub mod liquidation;
pub mod monte_carlo;
pub mod scenario;
pub mod simulation;
pub mod step;
pub mod taxes;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{ParametersBuilder, SimulationParameters};
pub use error::{InvalidParameterError, SimulationError};
pub use monte_carlo::{aggregate, monte_carlo_simulate};
pub use scenario::{DrawSequence, PeriodDraw, generate, generate_path};
pub use simulation::{simulate, simulate_path};
pub use step::step;
