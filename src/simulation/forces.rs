//! Force / acceleration contributors for the n-body engine
//!
//! Defines the acceleration trait, the softened direct-sum Newtonian gravity
//! term, and `ForceField`, the derivative function fed to the integrators

use super::integrator::OdeSystem;
use super::states::{body_count, positions, NVec2, StateVector};

/// Collection of acceleration terms (gravity, drag, etc.)
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per body
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Add an acceleration term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Acceleration + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total accelerations at time `t` for bodies at `x` with masses `m`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, t: f64, x: &[NVec2], m: &[f64], out: &mut [NVec2]) {
        // Zero buffer
        for a in out.iter_mut() {
            *a = NVec2::zeros();
        }
        for term in &self.terms {
            term.acceleration(t, x, m, out);
        }
    }
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for acceleration sources
/// Implementations add their contribution into `out[i]` for each body
pub trait Acceleration {
    fn acceleration(&self, t: f64, x: &[NVec2], m: &[f64], out: &mut [NVec2]);
}

/// Newtonian gravity with a softened inverse-square law
///
/// The cubed separation gets `eps` added, `|r|^3 + eps`, so coincident
/// bodies produce a large but finite pull instead of a division by zero
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy)]
pub struct NewtonianGravity {
    pub G: f64, // gravitational constant
    pub eps: f64, // softening
}

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, _t: f64, x: &[NVec2], m: &[f64], out: &mut [NVec2]) {
        let n = x.len();

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            for j in (i + 1)..n {
                // r points from i to j: i is pulled along +r, j along -r
                let r = x[j] - x[i];
                let r2 = r.dot(&r);

                // softened |r|^3
                let dist3 = r2 * r2.sqrt() + self.eps;
                let coef = self.G / dist3;

                // a_i +=  G * m_j * r / dist3
                // a_j += -G * m_i * r / dist3
                out[i] += coef * m[j] * r;
                out[j] -= coef * m[i] * r;
            }
        }
    }
}

/// Derivative of the flat state: velocities copied through, then accelerations
///
/// Holds everything the right-hand side needs (masses and the force terms),
/// so the integrators can evaluate it without captured state
pub struct ForceField {
    masses: Vec<f64>,
    forces: AccelSet,
}

impl ForceField {
    /// Direct-sum gravity over bodies with the given masses
    #[allow(non_snake_case)]
    pub fn new(masses: Vec<f64>, G: f64, eps: f64) -> Self {
        Self::with_forces(masses, AccelSet::new().with(NewtonianGravity { G, eps }))
    }

    pub fn with_forces(masses: Vec<f64>, forces: AccelSet) -> Self {
        Self { masses, forces }
    }

    /// Accelerations of bodies at positions `x`
    pub fn accelerations(&self, t: f64, x: &[NVec2]) -> Vec<NVec2> {
        let mut out = vec![NVec2::zeros(); x.len()];
        self.forces.accumulate_accels(t, x, &self.masses, &mut out);
        out
    }

    /// Allocating form of [`OdeSystem::rhs`]
    pub fn derivative(&self, t: f64, y: &StateVector) -> StateVector {
        let mut dydt = StateVector::zeros(y.len());
        self.rhs(t, y, &mut dydt);
        dydt
    }
}

impl OdeSystem for ForceField {
    fn dimension(&self) -> usize {
        4 * self.masses.len()
    }

    fn rhs(&self, t: f64, y: &StateVector, dydt: &mut StateVector) {
        let n = body_count(y);
        let half = 2 * n;

        // d(position)/dt = velocity
        dydt.rows_mut(0, half).copy_from(&y.rows(half, half));

        // d(velocity)/dt = acceleration
        let acc = self.accelerations(t, &positions(y));
        for (i, a) in acc.iter().enumerate() {
            dydt[half + 2 * i] = a.x;
            dydt[half + 2 * i + 1] = a.y;
        }
    }
}
