//! Numerical and physical parameters for a simulation run
//!
//! `Parameters` holds runtime settings:
//! - time horizon and number of output samples,
//! - error tolerances for the adaptive integrator,
//! - softening and gravitational constant (`eps`, `G`),
//! - step limits, integration method and collision policy

use super::errors::SimError;

/// Time-stepping method
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    /// Adaptive Dormand–Prince 5(4) with dense output
    Rk45,
    /// Fixed-step velocity Verlet with step no larger than `h0`
    Verlet { h0: f64 },
}

/// What to do when two bodies get very close
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionPolicy {
    /// Rely on softening; only non-finite states are reported
    Soften,
    /// Abort with `SimError::Collision` once a pair separation drops below `radius`
    Detect { radius: f64 },
}

#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub t_end: f64, // time horizon
    pub samples: usize, // evenly spaced output times over [0, t_end]
    pub atol: f64, // absolute error tolerance
    pub rtol: f64, // relative error tolerance
    pub eps: f64, // softening added to r^3
    pub G: f64, // gravitational constant
    pub max_steps: usize, // internal step budget (accepted + rejected)
    pub first_step: Option<f64>, // initial step, auto-selected if None
    pub max_step: Option<f64>, // cap on internal step size
    pub method: Method,
    pub collision: CollisionPolicy,
}

impl Parameters {
    pub const DEFAULT_T_END: f64 = 20.0;
    pub const DEFAULT_SAMPLES: usize = 500;
    pub const DEFAULT_RTOL: f64 = 1e-8;
    pub const DEFAULT_ATOL: f64 = 1e-6;
    pub const DEFAULT_EPS: f64 = 1e-8;
    pub const DEFAULT_G: f64 = 1.0;
    pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

    pub fn with_time_interval(t_end: f64) -> Self {
        Self {
            t_end,
            ..Self::default()
        }
    }

    /// Reject parameter sets the integrator cannot work with
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.t_end.is_finite() && self.t_end > 0.0) {
            return Err(SimError::invalid(format!(
                "time interval must be a positive finite number, got {}",
                self.t_end
            )));
        }
        if self.samples < 2 {
            return Err(SimError::invalid(format!(
                "need at least 2 output samples, got {}",
                self.samples
            )));
        }
        if !(self.rtol > 0.0 && self.atol > 0.0) {
            return Err(SimError::invalid("tolerances must be positive"));
        }
        if !(self.eps.is_finite() && self.eps >= 0.0) {
            return Err(SimError::invalid("softening must be a non-negative finite number"));
        }
        if !self.G.is_finite() {
            return Err(SimError::invalid("gravitational constant must be finite"));
        }
        if self.max_steps == 0 {
            return Err(SimError::invalid("max_steps must be at least 1"));
        }
        for (name, step) in [("first_step", self.first_step), ("max_step", self.max_step)] {
            if let Some(h) = step {
                if !(h.is_finite() && h > 0.0) {
                    return Err(SimError::invalid(format!("{name} must be positive, got {h}")));
                }
            }
        }
        if let Method::Verlet { h0 } = self.method {
            if !(h0.is_finite() && h0 > 0.0) {
                return Err(SimError::invalid(format!("verlet step h0 must be positive, got {h0}")));
            }
        }
        if let CollisionPolicy::Detect { radius } = self.collision {
            if !(radius.is_finite() && radius >= 0.0) {
                return Err(SimError::invalid(format!(
                    "collision radius must be non-negative, got {radius}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            t_end: Self::DEFAULT_T_END,
            samples: Self::DEFAULT_SAMPLES,
            atol: Self::DEFAULT_ATOL,
            rtol: Self::DEFAULT_RTOL,
            eps: Self::DEFAULT_EPS,
            G: Self::DEFAULT_G,
            max_steps: Self::DEFAULT_MAX_STEPS,
            first_step: None,
            max_step: None,
            method: Method::Rk45,
            collision: CollisionPolicy::Soften,
        }
    }
}
