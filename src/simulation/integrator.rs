//! Time integrators for the N-body system
//!
//! - [`DormandPrince`]: adaptive explicit Runge–Kutta 5(4) with local error
//!   control and a 4th-order continuous extension, so output samples are
//!   interpolated instead of forcing steps onto them
//! - [`verlet_integrator`]: fixed-step velocity-Verlet, sampled on the same grid
//!
//! Both take the initial state by reference and never modify it; each step
//! produces a new `StateVector`

use log::{debug, warn};

use super::errors::SimError;
use super::forces::ForceField;
use super::states::{assemble, body_count, is_finite, positions, velocity, NVec2, StateVector};

/// A first-order ODE system `dy/dt = f(t, y)`
pub trait OdeSystem {
    /// Length of the state vector
    fn dimension(&self) -> usize;

    /// Write `f(t, y)` into `dydt`
    fn rhs(&self, t: f64, y: &StateVector, dydt: &mut StateVector);
}

/// Counters collected during one integration run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub fn_evals: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
}

impl Tolerances {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }
}

// Dormand–Prince 5(4) tableau
const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
];

const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

// Difference between the 5th and embedded 4th order weights
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

// Continuous extension: y(t + x*h) = y + h * sum_k (K^T P)[:, k] * x^(k+1)
const P: [[f64; 4]; 7] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

const ORDER: f64 = 4.0; // order of the error estimator
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// One attempted step
struct Trial {
    y_new: StateVector,
    k: Vec<StateVector>, // 7 stages, k[6] = f(t + h, y_new)
    err_norm: f64,
}

/// Adaptive Dormand–Prince 5(4) solver
#[derive(Debug, Clone)]
pub struct DormandPrince {
    tol: Tolerances,
    max_steps: usize,
    first_step: Option<f64>,
    max_step: f64,
    pub stats: Stats,
}

impl DormandPrince {
    pub fn new(tol: Tolerances) -> Self {
        Self {
            tol,
            max_steps: 1_000_000,
            first_step: None,
            max_step: f64::INFINITY,
            stats: Stats::default(),
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_first_step(mut self, first_step: Option<f64>) -> Self {
        self.first_step = first_step;
        self
    }

    pub fn with_max_step(mut self, max_step: Option<f64>) -> Self {
        self.max_step = max_step.unwrap_or(f64::INFINITY);
        self
    }

    fn eval<S: OdeSystem>(&mut self, sys: &S, t: f64, y: &StateVector) -> StateVector {
        let mut dydt = StateVector::zeros(y.len());
        sys.rhs(t, y, &mut dydt);
        self.stats.fn_evals += 1;
        dydt
    }

    /// Per-component error scale `atol + rtol * max(|a|, |b|)`
    fn scale(&self, a: &StateVector, b: &StateVector) -> StateVector {
        let Tolerances { rtol, atol } = self.tol;
        a.zip_map(b, |a, b| atol + rtol * a.abs().max(b.abs()))
    }

    /// Initial step guess from the size of `y0`, `f0` and a trial Euler step
    /// (Hairer, Nørsett & Wanner, section II.4)
    fn select_initial_step<S: OdeSystem>(
        &mut self,
        sys: &S,
        t0: f64,
        y0: &StateVector,
        f0: &StateVector,
        interval: f64,
    ) -> f64 {
        let scale = self.scale(y0, y0);
        let d0 = rms_scaled(y0, &scale);
        let d1 = rms_scaled(f0, &scale);

        let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
        let h0 = h0.min(interval);

        let y1 = y0 + f0 * h0;
        let f1 = self.eval(sys, t0 + h0, &y1);
        let d2 = rms_scaled(&(f1 - f0), &scale) / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / (ORDER + 1.0))
        };

        let h = (100.0 * h0).min(h1).min(interval);
        debug!("initial step selected: h = {h:e} (d0 = {d0:e}, d1 = {d1:e}, d2 = {d2:e})");
        h
    }

    fn try_step<S: OdeSystem>(
        &mut self,
        sys: &S,
        t: f64,
        y: &StateVector,
        f: &StateVector,
        h: f64,
    ) -> Trial {
        let mut k: Vec<StateVector> = Vec::with_capacity(7);
        k.push(f.clone());

        for s in 1..6 {
            let mut dy = StateVector::zeros(y.len());
            for (j, kj) in k.iter().enumerate() {
                dy.axpy(A[s][j], kj, 1.0);
            }
            let ys = y + dy * h;
            let ks = self.eval(sys, t + C[s] * h, &ys);
            k.push(ks);
        }

        let mut dy = StateVector::zeros(y.len());
        for (j, kj) in k.iter().enumerate() {
            dy.axpy(B[j], kj, 1.0);
        }
        let y_new = y + dy * h;
        let f_new = self.eval(sys, t + h, &y_new);
        k.push(f_new);

        let mut err = StateVector::zeros(y.len());
        for (j, kj) in k.iter().enumerate() {
            err.axpy(E[j] * h, kj, 1.0);
        }
        let scale = self.scale(y, &y_new);
        let err_norm = rms_scaled(&err, &scale);

        Trial { y_new, k, err_norm }
    }

    /// Integrate from `t = t_eval[0]` and return the state at every time in `t_eval`
    ///
    /// `t_eval` must be non-empty and non-decreasing. `after_step` runs on every
    /// accepted step's end point and can abort the run.
    pub fn solve<S, F>(
        &mut self,
        sys: &S,
        y0: &StateVector,
        t_eval: &[f64],
        mut after_step: F,
    ) -> Result<Vec<StateVector>, SimError>
    where
        S: OdeSystem,
        F: FnMut(f64, &StateVector) -> Result<(), SimError>,
    {
        let (t0, t_end) = match (t_eval.first(), t_eval.last()) {
            (Some(&a), Some(&b)) => (a, b),
            _ => return Err(SimError::invalid("no output times requested")),
        };
        if y0.len() != sys.dimension() {
            return Err(SimError::IntegrationFailure(format!(
                "state length {} does not match system dimension {}",
                y0.len(),
                sys.dimension()
            )));
        }
        if !is_finite(y0) {
            return Err(SimError::NumericalInstability { t: t0 });
        }

        let mut out = Vec::with_capacity(t_eval.len());
        let mut next = 0;

        let mut t = t0;
        let mut y = y0.clone();
        let mut f = self.eval(sys, t, &y);
        if !is_finite(&f) {
            return Err(SimError::NumericalInstability { t });
        }

        while next < t_eval.len() && t_eval[next] <= t {
            out.push(y.clone());
            next += 1;
        }

        let mut h = match self.first_step {
            Some(h) => h,
            None => self.select_initial_step(sys, t, &y, &f, t_end - t),
        };
        let mut step_rejected = false;
        let mut saw_non_finite = false;

        while next < t_eval.len() {
            if self.stats.accepted_steps + self.stats.rejected_steps >= self.max_steps {
                if saw_non_finite {
                    return Err(SimError::NumericalInstability { t });
                }
                return Err(SimError::IntegrationFailure(format!(
                    "step budget of {} exhausted at t = {t}",
                    self.max_steps
                )));
            }

            let min_step = 10.0 * f64::EPSILON * t.abs().max(f64::MIN_POSITIVE);
            h = h.min(self.max_step);
            if h < min_step {
                if saw_non_finite {
                    return Err(SimError::NumericalInstability { t });
                }
                return Err(SimError::IntegrationFailure(format!(
                    "step size {h:e} too small at t = {t}"
                )));
            }

            // The last step may be shorter than min_step; it lands exactly on t_end
            let (h_step, t_new) = if t + h >= t_end { (t_end - t, t_end) } else { (h, t + h) };

            let trial = self.try_step(sys, t, &y, &f, h_step);

            if !trial.err_norm.is_finite() {
                warn!("non-finite error estimate at t = {t}, h = {h_step:e}; shrinking step");
                saw_non_finite = true;
                self.stats.rejected_steps += 1;
                step_rejected = true;
                h = h_step * MIN_FACTOR;
                continue;
            }

            if trial.err_norm >= 1.0 {
                self.stats.rejected_steps += 1;
                step_rejected = true;
                h = h_step * (SAFETY * trial.err_norm.powf(-1.0 / (ORDER + 1.0))).max(MIN_FACTOR);
                continue;
            }

            // Accepted
            if !is_finite(&trial.y_new) {
                return Err(SimError::NumericalInstability { t: t_new });
            }

            while next < t_eval.len() && t_eval[next] <= t_new {
                let ts = t_eval[next];
                let ys = if ts == t_new {
                    trial.y_new.clone()
                } else {
                    dense_output(&y, &trial.k, h_step, (ts - t) / h_step)
                };
                debug!("sample {next} at t = {ts}");
                out.push(ys);
                next += 1;
            }

            after_step(t_new, &trial.y_new)?;

            let mut factor = if trial.err_norm == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * trial.err_norm.powf(-1.0 / (ORDER + 1.0))).min(MAX_FACTOR)
            };
            if step_rejected {
                factor = factor.min(1.0);
            }

            self.stats.accepted_steps += 1;
            step_rejected = false;
            saw_non_finite = false;

            t = t_new;
            y = trial.y_new;
            f = trial.k[6].clone();
            h = h_step * factor;
        }

        Ok(out)
    }
}

/// Interpolate inside the step `[t, t + h]` at fraction `x`
fn dense_output(y: &StateVector, k: &[StateVector], h: f64, x: f64) -> StateVector {
    let mut acc = StateVector::zeros(y.len());
    let mut xp = 1.0;
    for col in 0..4 {
        xp *= x;
        for (j, kj) in k.iter().enumerate() {
            let w = P[j][col];
            if w != 0.0 {
                acc.axpy(w * xp, kj, 1.0);
            }
        }
    }
    y + acc * h
}

fn rms_scaled(v: &StateVector, scale: &StateVector) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().zip(scale.iter()).map(|(a, s)| (a / s).powi(2)).sum();
    (sum / v.len() as f64).sqrt()
}

/// Advance the state by one velocity-Verlet step of size `dt`
/// Uses two force evaluations per step and returns the state at `t + dt`
pub fn verlet_integrator(field: &ForceField, t: f64, y: &StateVector, dt: f64) -> StateVector {
    let n = body_count(y);
    let half_dt = 0.5 * dt;

    let x = positions(y);
    let v: Vec<NVec2> = (0..n).map(|i| velocity(y, i)).collect();

    // a_n from x_n
    let a_old = field.accelerations(t, &x);

    // Kick: v_n+1/2 = v_n + (dt/2) * a_n
    let v_half: Vec<NVec2> = v.iter().zip(&a_old).map(|(v, a)| *v + half_dt * *a).collect();

    // Drift: x_n+1 = x_n + dt * v_n+1/2
    let x_new: Vec<NVec2> = x.iter().zip(&v_half).map(|(x, v)| *x + dt * *v).collect();

    // a_n+1 from x_n+1
    let a_new = field.accelerations(t + dt, &x_new);

    // Second kick: v_n+1 = v_n+1/2 + (dt/2) * a_n+1
    let v_new: Vec<NVec2> = v_half.iter().zip(&a_new).map(|(v, a)| *v + half_dt * *a).collect();

    assemble(&x_new, &v_new)
}

/// Integrate with fixed-step Verlet, splitting every sample interval into
/// equal steps no larger than `h0`; at most `max_steps` steps in total
pub fn integrate_verlet<F>(
    field: &ForceField,
    y0: &StateVector,
    t_eval: &[f64],
    h0: f64,
    max_steps: usize,
    mut after_step: F,
) -> Result<(Vec<StateVector>, Stats), SimError>
where
    F: FnMut(f64, &StateVector) -> Result<(), SimError>,
{
    let mut stats = Stats::default();
    let Some(&t0) = t_eval.first() else {
        return Err(SimError::invalid("no output times requested"));
    };

    let mut out = Vec::with_capacity(t_eval.len());
    let mut y = y0.clone();
    out.push(y.clone());

    let mut t = t0;
    for &ts in &t_eval[1..] {
        let interval = ts - t;
        let needed = (interval / h0).ceil().max(1.0);
        if stats.accepted_steps as f64 + needed > max_steps as f64 {
            return Err(SimError::IntegrationFailure(format!(
                "step budget of {max_steps} exhausted at t = {t} (h0 = {h0:e})"
            )));
        }
        let substeps = needed as usize;
        let dt = interval / substeps as f64;
        for s in 0..substeps {
            y = verlet_integrator(field, t + s as f64 * dt, &y, dt);
            stats.accepted_steps += 1;
            stats.fn_evals += 2;
            let ti = t + (s + 1) as f64 * dt;
            if !is_finite(&y) {
                return Err(SimError::NumericalInstability { t: ti });
            }
            after_step(ti, &y)?;
        }
        t = ts;
        out.push(y.clone());
    }

    Ok((out, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// y'' = -y written as a first-order system
    struct Oscillator;

    impl OdeSystem for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn rhs(&self, _t: f64, y: &StateVector, dydt: &mut StateVector) {
            dydt[0] = y[1];
            dydt[1] = -y[0];
        }
    }

    fn linspace(end: f64, n: usize) -> Vec<f64> {
        (0..n).map(|k| end * k as f64 / (n - 1) as f64).collect()
    }

    #[test]
    fn dense_output_matches_analytic_solution() {
        let mut solver = DormandPrince::new(Tolerances::new(1e-10, 1e-12));
        let y0 = StateVector::from_vec(vec![1.0, 0.0]);
        let times = linspace(10.0, 101);

        let ys = solver.solve(&Oscillator, &y0, &times, |_, _| Ok(())).unwrap();

        assert_eq!(ys.len(), times.len());
        for (t, y) in times.iter().zip(&ys) {
            assert_abs_diff_eq!(y[0], t.cos(), epsilon = 1e-7);
            assert_abs_diff_eq!(y[1], -t.sin(), epsilon = 1e-7);
        }
        assert!(solver.stats.accepted_steps > 0);
        assert!(solver.stats.fn_evals >= 6 * solver.stats.accepted_steps);
    }

    #[test]
    fn dense_output_hits_step_endpoints() {
        let y = StateVector::from_vec(vec![0.5]);
        let k: Vec<StateVector> = (0..7).map(|_| StateVector::from_vec(vec![2.0])).collect();
        // constant slope: interpolant is exact along the whole step
        let mid = dense_output(&y, &k, 0.1, 0.5);
        let end = dense_output(&y, &k, 0.1, 1.0);
        assert_abs_diff_eq!(mid[0], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(end[0], 0.7, epsilon = 1e-12);
    }

    #[test]
    fn step_budget_is_enforced() {
        let mut solver = DormandPrince::new(Tolerances::new(1e-12, 1e-14)).with_max_steps(3);
        let y0 = StateVector::from_vec(vec![1.0, 0.0]);
        let err = solver
            .solve(&Oscillator, &y0, &linspace(100.0, 10), |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, SimError::IntegrationFailure(_)));
    }

    #[test]
    fn after_step_can_abort() {
        let mut solver = DormandPrince::new(Tolerances::new(1e-8, 1e-8));
        let y0 = StateVector::from_vec(vec![1.0, 0.0]);
        let err = solver
            .solve(&Oscillator, &y0, &linspace(5.0, 10), |t, _| {
                if t > 1.0 {
                    Err(SimError::Collision { i: 0, j: 1, t, separation: 0.0 })
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, SimError::Collision { .. }));
    }

    /// Finite at t = 0, NaN for any later time
    struct BlowsUp;

    impl OdeSystem for BlowsUp {
        fn dimension(&self) -> usize {
            1
        }

        fn rhs(&self, t: f64, _y: &StateVector, dydt: &mut StateVector) {
            dydt[0] = if t > 0.0 { f64::NAN } else { 1.0 };
        }
    }

    #[test]
    fn budget_spent_on_non_finite_steps_is_instability() {
        let mut solver = DormandPrince::new(Tolerances::new(1e-8, 1e-8))
            .with_first_step(Some(0.1))
            .with_max_steps(5);
        let y0 = StateVector::from_vec(vec![0.0]);
        let err = solver
            .solve(&BlowsUp, &y0, &linspace(1.0, 5), |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, SimError::NumericalInstability { .. }), "{err:?}");
        assert_eq!(solver.stats.rejected_steps, 5);
    }

    #[test]
    fn rejects_empty_time_grid() {
        let mut solver = DormandPrince::new(Tolerances::new(1e-8, 1e-8));
        let y0 = StateVector::from_vec(vec![1.0, 0.0]);
        assert!(solver.solve(&Oscillator, &y0, &[], |_, _| Ok(())).is_err());
    }
}
