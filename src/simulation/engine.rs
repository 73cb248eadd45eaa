//! The simulation entry point
//!
//! `simulate` is a pure function of its inputs: it builds the initial state,
//! runs one integration over `[0, t_end]` and reshapes the samples. Nothing is
//! shared between calls, so independent runs can execute on separate threads.

use log::{info, warn};

use super::errors::SimError;
use super::forces::ForceField;
use super::initializer::{initial_system, BodySpec};
use super::integrator::{integrate_verlet, DormandPrince, Stats, Tolerances};
use super::params::{CollisionPolicy, Method, Parameters};
use super::states::{body_count, position, StateVector};
use super::trajectory::{format_trajectory, sample_times, Trajectory};

/// Result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub trajectory: Trajectory,
    pub stats: Stats,
}

/// Run one simulation from t = 0 to `params.t_end`
pub fn simulate(bodies: &[BodySpec], params: &Parameters) -> Result<SimulationOutput, SimError> {
    params.validate()?;
    let system = initial_system(bodies)?;

    info!(
        "simulating {} bodies over [0, {}] with {:?} ({} samples)",
        system.len(),
        params.t_end,
        params.method,
        params.samples
    );

    let field = ForceField::new(system.masses(), params.G, params.eps);
    let times = sample_times(params.t_end, params.samples);
    let y0 = system.to_state();
    let mut guard = collision_guard(params.collision);
    guard(0.0, &y0)?;

    let result = match params.method {
        Method::Rk45 => {
            let mut solver = DormandPrince::new(Tolerances::new(params.rtol, params.atol))
                .with_max_steps(params.max_steps)
                .with_first_step(params.first_step)
                .with_max_step(params.max_step);
            solver
                .solve(&field, &y0, &times, &mut guard)
                .map(|states| (states, solver.stats))
        }
        Method::Verlet { h0 } => {
            integrate_verlet(&field, &y0, &times, h0, params.max_steps, &mut guard)
        }
    };

    let (states, stats) = result.map_err(|e| {
        warn!("simulation failed: {e}");
        e
    })?;

    info!(
        "done: {} accepted / {} rejected steps, {} force evaluations",
        stats.accepted_steps, stats.rejected_steps, stats.fn_evals
    );

    let trajectory = format_trajectory(&times, &states, &system)?;
    Ok(SimulationOutput { trajectory, stats })
}

/// Step hook enforcing the collision policy
fn collision_guard(policy: CollisionPolicy) -> impl FnMut(f64, &StateVector) -> Result<(), SimError> {
    move |t: f64, y: &StateVector| match policy {
        CollisionPolicy::Soften => Ok(()),
        CollisionPolicy::Detect { radius } => match closest_pair(y) {
            Some((i, j, separation)) if separation < radius => Err(SimError::Collision {
                i,
                j,
                t,
                separation,
            }),
            _ => Ok(()),
        },
    }
}

/// Closest pair of bodies and their separation, `None` for fewer than two bodies
pub fn closest_pair(y: &StateVector) -> Option<(usize, usize, f64)> {
    let n = body_count(y);
    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = (position(y, j) - position(y, i)).norm();
            if best.map_or(true, |(_, _, b)| d < b) {
                best = Some((i, j, d));
            }
        }
    }
    best
}
