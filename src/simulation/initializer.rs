//! Turn per-body parameters into an initial `System`
//!
//! Body 0 sits at the origin, body i (i >= 1) on a ring at angle
//! 2*pi*i/(N-1) and radius `initial_distance`. Velocities come from speed and
//! a heading in degrees (counter-clockwise from +x). Positions are then shifted
//! so the center of mass is at the origin.

use std::f64::consts::TAU;

use super::errors::SimError;
use super::states::{Body, NVec2, System};

pub const DEFAULT_INITIAL_DISTANCE: f64 = 100.0;

/// Validated per-body input
#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    pub mass: f64,
    pub speed: f64,
    pub velocity_angle: f64, // degrees
    pub initial_distance: f64,
    pub color: String,
}

impl BodySpec {
    pub fn new(mass: f64, speed: f64, velocity_angle: f64) -> Self {
        Self {
            mass,
            speed,
            velocity_angle,
            initial_distance: DEFAULT_INITIAL_DISTANCE,
            color: String::new(),
        }
    }

    pub fn with_distance(mut self, initial_distance: f64) -> Self {
        self.initial_distance = initial_distance;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn validate(&self, index: usize) -> Result<(), SimError> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SimError::invalid(format!(
                "body {index}: mass must be positive, got {}",
                self.mass
            )));
        }
        if !self.speed.is_finite() || !self.velocity_angle.is_finite() {
            return Err(SimError::invalid(format!(
                "body {index}: velocity and velocity_angle must be finite"
            )));
        }
        if !(self.initial_distance.is_finite() && self.initial_distance >= 0.0) {
            return Err(SimError::invalid(format!(
                "body {index}: initial_distance must be non-negative, got {}",
                self.initial_distance
            )));
        }
        Ok(())
    }

    fn initial_velocity(&self) -> NVec2 {
        let (sin, cos) = self.velocity_angle.to_radians().sin_cos();
        NVec2::new(self.speed * cos, self.speed * sin)
    }
}

/// Build the t = 0 system from body specs
pub fn initial_system(specs: &[BodySpec]) -> Result<System, SimError> {
    if specs.is_empty() {
        return Err(SimError::invalid("at least one body is required"));
    }
    for (i, spec) in specs.iter().enumerate() {
        spec.validate(i)?;
    }

    let n = specs.len();
    let mut bodies: Vec<Body> = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| Body {
            x: ring_position(i, n, spec.initial_distance),
            v: spec.initial_velocity(),
            m: spec.mass,
            color: spec.color.clone(),
        })
        .collect();

    recenter(&mut bodies);

    Ok(System { bodies, t: 0.0 })
}

fn ring_position(i: usize, n: usize, distance: f64) -> NVec2 {
    if i == 0 || n == 1 {
        return NVec2::zeros();
    }
    let a = TAU * i as f64 / (n - 1) as f64;
    let (sin, cos) = a.sin_cos();
    NVec2::new(distance * cos, distance * sin)
}

/// Mass-weighted mean position
pub fn center_of_mass(bodies: &[Body]) -> NVec2 {
    let total: f64 = bodies.iter().map(|b| b.m).sum();
    let weighted = bodies.iter().fold(NVec2::zeros(), |acc, b| acc + b.m * b.x);
    weighted / total
}

/// Translate positions so the center of mass is the origin
pub fn recenter(bodies: &mut [Body]) {
    if bodies.is_empty() {
        return;
    }
    let cm = center_of_mass(bodies);
    for b in bodies.iter_mut() {
        b.x -= cm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ring_positions_for_four_bodies() {
        assert_eq!(ring_position(0, 4, 10.0), NVec2::zeros());
        let p1 = ring_position(1, 4, 10.0);
        let p3 = ring_position(3, 4, 10.0);
        assert_abs_diff_eq!(p1.norm(), 10.0, epsilon = 1e-12);
        // third body closes the ring back onto +x
        assert_abs_diff_eq!(p3.x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p3.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn heading_is_counter_clockwise_degrees() {
        let v = BodySpec::new(1.0, 2.0, 90.0).initial_velocity();
        assert_abs_diff_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, 2.0, epsilon = 1e-12);
    }
}
