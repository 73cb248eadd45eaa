//! Core state types for the N-body simulation.
//!
//! Defines the per-body and whole-system structs plus the flat state vector
//! handed to the integrators:
//! - `Body` / `System` using `NVec2`
//! - `StateVector`, length 4N: all positions first (x0, y0, x1, y1, ...),
//!   then all velocities (vx0, vy0, vx1, vy1, ...)

use nalgebra::{DVector, Vector2};

pub type NVec2 = Vector2<f64>;
pub type StateVector = DVector<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub m: f64, // mass
    pub color: String, // display tag, no physical meaning
}

#[derive(Debug, Clone, PartialEq)]
pub struct System {
    pub bodies: Vec<Body>, // collection of bodies
    pub t: f64, // time
}

impl System {
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn masses(&self) -> Vec<f64> {
        self.bodies.iter().map(|b| b.m).collect()
    }

    /// Flatten the bodies into a `StateVector` (positions block, then velocities block)
    pub fn to_state(&self) -> StateVector {
        let n = self.bodies.len();
        let mut y = StateVector::zeros(4 * n);
        for (i, b) in self.bodies.iter().enumerate() {
            y[2 * i] = b.x.x;
            y[2 * i + 1] = b.x.y;
            y[2 * n + 2 * i] = b.v.x;
            y[2 * n + 2 * i + 1] = b.v.y;
        }
        y
    }

    /// Build a new system at time `t` with the positions/velocities of `y`,
    /// keeping masses and colors from `self`
    pub fn with_state(&self, t: f64, y: &StateVector) -> System {
        let bodies = self
            .bodies
            .iter()
            .enumerate()
            .map(|(i, b)| Body {
                x: position(y, i),
                v: velocity(y, i),
                m: b.m,
                color: b.color.clone(),
            })
            .collect();
        System { bodies, t }
    }
}

/// Number of bodies encoded in a state vector
pub fn body_count(y: &StateVector) -> usize {
    y.len() / 4
}

/// Position of body `i`
pub fn position(y: &StateVector, i: usize) -> NVec2 {
    NVec2::new(y[2 * i], y[2 * i + 1])
}

/// Velocity of body `i`
pub fn velocity(y: &StateVector, i: usize) -> NVec2 {
    let off = 2 * body_count(y);
    NVec2::new(y[off + 2 * i], y[off + 2 * i + 1])
}

/// All positions of a state vector, in body order
pub fn positions(y: &StateVector) -> Vec<NVec2> {
    (0..body_count(y)).map(|i| position(y, i)).collect()
}

/// Assemble a state vector from matching position and velocity slices
pub fn assemble(x: &[NVec2], v: &[NVec2]) -> StateVector {
    let n = x.len();
    let mut y = StateVector::zeros(4 * n);
    for i in 0..n {
        y[2 * i] = x[i].x;
        y[2 * i + 1] = x[i].y;
        y[2 * n + 2 * i] = v[i].x;
        y[2 * n + 2 * i + 1] = v[i].y;
    }
    y
}

pub fn is_finite(y: &StateVector) -> bool {
    y.iter().all(|c| c.is_finite())
}
