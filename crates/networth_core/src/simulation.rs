//! Path simulator: threads one account state through the whole horizon

use tracing::trace;

use crate::config::SimulationParameters;
use crate::error::Result;
use crate::model::Trajectory;
use crate::scenario::{DrawSequence, draw_path};
use crate::step::step;

/// Simulate one path driven by `draws`.
///
/// Fails if the parameters are invalid or the draws do not cover the horizon
/// with one return per bucket.
pub fn simulate_path(params: &SimulationParameters, draws: &DrawSequence) -> Result<Trajectory> {
    params.validate()?;
    draws.check_shape(params)?;
    Ok(run_path(params, draws))
}

/// Generate and simulate a single path with `seed`
pub fn simulate(params: &SimulationParameters, seed: u64) -> Result<Trajectory> {
    params.validate()?;
    let draws = draw_path(params, 0, seed)?;
    Ok(run_path(params, &draws))
}

/// Simulate without re-checking parameters or draw shape
pub(crate) fn run_path(params: &SimulationParameters, draws: &DrawSequence) -> Trajectory {
    let mut states = Vec::with_capacity(params.horizon + 1);
    let mut state = params.initial_state();

    for (k, draw) in draws.iter().take(params.horizon).enumerate() {
        let next = step(&state, k, params, draw);
        if let Some(event) = &next.shortfall {
            trace!(period = k, unmet = event.unmet, "shortfall");
        }
        states.push(std::mem::replace(&mut state, next));
    }
    states.push(state);

    Trajectory::new(states)
}
