//! Command-line front end for the networth simulation engine
//!
//! Loads household scenarios from YAML presets, runs single paths or Monte
//! Carlo batches through `networth_core` and renders the results as text
//! tables or JSON.

pub mod logging;
pub mod preset;
pub mod report;

pub use logging::init_logging;
pub use preset::{Preset, RunOverrides, load_preset};
