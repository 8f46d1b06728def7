//! Integration tests for the net worth engine
//!
//! Tests are organized by topic:
//! - `stepper` - Single-period mechanics and ordering
//! - `paths` - Whole-path simulation and trajectory helpers
//! - `properties` - Property purchases, sales and loans over a path
//! - `monte_carlo` - Aggregation, determinism and cancellation
//! - `builder_dsl` - Fluent parameter construction and deserialization

mod paths;
mod stepper;
