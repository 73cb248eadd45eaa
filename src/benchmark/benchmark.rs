use std::time::Instant;

use crate::simulation::engine::simulate;
use crate::simulation::forces::ForceField;
use crate::simulation::initializer::{initial_system, BodySpec};
use crate::simulation::integrator::OdeSystem;
use crate::simulation::params::Parameters;
use crate::simulation::states::StateVector;

/// Helper to build `n` deterministic bodies, no rand needed
fn make_bodies(n: usize) -> Vec<BodySpec> {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            BodySpec::new(1.0 + (i_f * 0.37).sin().abs(), 0.05 * (i_f * 0.13).cos(), i_f * 37.0)
                .with_distance(50.0 + 10.0 * (i_f * 0.07).sin())
        })
        .collect()
}

/// Time one evaluation of the derivative for growing N
pub fn bench_force_field() {
    let ns = [8, 16, 32, 64, 128, 256];
    let params = Parameters::default();

    for n in ns {
        let system = match initial_system(&make_bodies(n)) {
            Ok(system) => system,
            Err(e) => {
                println!("N = {n:5}, setup failed: {e}");
                continue;
            }
        };
        let field = ForceField::new(system.masses(), params.G, params.eps);
        let y = system.to_state();
        let mut dydt = StateVector::zeros(y.len());

        // Warm up
        field.rhs(0.0, &y, &mut dydt);

        let reps = 100;
        let t0 = Instant::now();
        for _ in 0..reps {
            field.rhs(0.0, &y, &mut dydt);
        }
        let per_eval = t0.elapsed().as_secs_f64() / reps as f64;

        println!("N = {n:5}, rhs = {:10.3} us", per_eval * 1e6);
    }
}

/// Time full runs for a range of N
/// Paste output directly into a spreadsheet to graph
pub fn bench_simulate_curve() {
    println!("N,ms,accepted,rejected,fn_evals");

    let params = Parameters {
        t_end: 5.0,
        ..Parameters::default()
    };

    for n in (2..=32).step_by(2) {
        let bodies = make_bodies(n);
        let t0 = Instant::now();
        match simulate(&bodies, &params) {
            Ok(out) => {
                let ms = t0.elapsed().as_secs_f64() * 1000.0;
                let s = out.stats;
                println!(
                    "{},{:.3},{},{},{}",
                    n, ms, s.accepted_steps, s.rejected_steps, s.fn_evals
                );
            }
            Err(e) => println!("{n},failed: {e}"),
        }
    }
}
