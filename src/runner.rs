//! Episode loop driving an environment with a controller.

use std::ops::ControlFlow;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::sim::env::GridEnvironment;
use crate::sim::policy::{ActionShape, Controller};
use crate::sim::types::{EnvError, StepError, StepRecord};

/// Why an episode could not be run to completion.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("reset failed: {0}")]
    Reset(#[from] EnvError),
    #[error("step rejected: {0}")]
    Step(#[from] StepError),
}

/// Resets `env` and steps it with `controller` until the horizon or
/// `max_steps` is reached.
///
/// # Arguments
///
/// * `env` - Environment to drive; reset before the first step
/// * `controller` - Policy choosing each action
/// * `max_steps` - Optional cap on the number of steps
///
/// # Returns
///
/// One [`StepRecord`] per settled tick.
///
/// # Errors
///
/// Returns a [`RunError`] if the reset fails or the controller produces an
/// action the environment rejects.
pub fn run_episode<C: Controller + ?Sized>(
    env: &mut GridEnvironment,
    controller: &mut C,
    max_steps: Option<usize>,
) -> Result<Vec<StepRecord>, RunError> {
    run_episode_with(env, controller, max_steps, |_| ControlFlow::Continue(()))
}

/// Like [`run_episode`], calling `on_step` after every settled tick.
///
/// Returning [`ControlFlow::Break`] from `on_step` ends the episode early;
/// the records collected so far are returned.
///
/// # Errors
///
/// Same as [`run_episode`].
pub fn run_episode_with<C, F>(
    env: &mut GridEnvironment,
    controller: &mut C,
    max_steps: Option<usize>,
    mut on_step: F,
) -> Result<Vec<StepRecord>, RunError>
where
    C: Controller + ?Sized,
    F: FnMut(&StepRecord) -> ControlFlow<()>,
{
    let mut observation = env.reset()?;
    let shape = ActionShape {
        buildings: env.buildings().len(),
        mode: env.transfer_mode(),
    };
    let limit = max_steps.unwrap_or(usize::MAX).min(env.hour_limit());

    info!(
        policy = controller.name(),
        year = env.ambient().year(),
        steps = limit,
        "episode started"
    );
    let started = Instant::now();

    let mut records = Vec::with_capacity(limit);
    while records.len() < limit {
        let action = controller.act(&observation, shape);
        let outcome = env.step(&action)?;
        let record = StepRecord::from_outcome(&outcome);
        debug!("{record}");
        let flow = on_step(&record);
        records.push(record);
        observation = outcome.observation;
        if outcome.done {
            break;
        }
        if flow.is_break() {
            info!(hour = env.hour(), "episode interrupted");
            break;
        }
    }

    info!(
        policy = controller.name(),
        steps = records.len(),
        grid_cost = records.iter().map(|r| r.grid_cost).sum::<f64>(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "episode finished"
    );
    Ok(records)
}
