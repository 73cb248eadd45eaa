//! Reshape integrator output into per-body tracks
//!
//! The integrator returns one flat `StateVector` per output time; callers want
//! one `PlanetTrack` per body (x, y, vx, vy over time plus mass and color).
//! Serializes to `{ "t": [...], "planets": [{ "x", "y", "vx", "vy", "mass", "color" }] }`.

use serde::Serialize;

use super::errors::SimError;
use super::states::{position, velocity, StateVector, System};

/// One body's sampled trajectory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanetTrack {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    pub mass: f64,
    pub color: String,
}

impl PlanetTrack {
    fn sample(&self, k: usize, t: f64) -> Option<Sample> {
        Some(Sample {
            t,
            x: *self.x.get(k)?,
            y: *self.y.get(k)?,
            vx: *self.vx.get(k)?,
            vy: *self.vy.get(k)?,
        })
    }
}

/// A single `(t, x, y, vx, vy)` sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub t: Vec<f64>,
    pub planets: Vec<PlanetTrack>,
}

impl Trajectory {
    /// Number of output times
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn body_count(&self) -> usize {
        self.planets.len()
    }

    pub fn masses(&self) -> Vec<f64> {
        self.planets.iter().map(|p| p.mass).collect()
    }

    /// Samples of body `body` in time order, `None` if the index is out of range
    ///
    /// Stops at the shortest of the time and component vectors.
    pub fn samples(&self, body: usize) -> Option<impl Iterator<Item = Sample> + '_> {
        let p = self.planets.get(body)?;
        Some(self.t.iter().enumerate().map_while(move |(k, &t)| p.sample(k, t)))
    }

    /// Rebuild the flat state at output index `k`, `None` if any track is too short
    pub fn state_at(&self, k: usize) -> Option<StateVector> {
        let n = self.planets.len();
        let t = *self.t.get(k)?;
        let mut y = StateVector::zeros(4 * n);
        for (i, p) in self.planets.iter().enumerate() {
            let s = p.sample(k, t)?;
            y[2 * i] = s.x;
            y[2 * i + 1] = s.y;
            y[2 * n + 2 * i] = s.vx;
            y[2 * n + 2 * i + 1] = s.vy;
        }
        Some(y)
    }
}

/// `samples` evenly spaced times over `[0, t_end]`, both ends included
pub fn sample_times(t_end: f64, samples: usize) -> Vec<f64> {
    match samples {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let last = samples - 1;
            (0..samples)
                .map(|k| if k == last { t_end } else { t_end * k as f64 / last as f64 })
                .collect()
        }
    }
}

/// Split the sampled states into per-body tracks, keeping body order
pub fn format_trajectory(
    times: &[f64],
    states: &[StateVector],
    system: &System,
) -> Result<Trajectory, SimError> {
    let n = system.len();
    if states.len() != times.len() {
        return Err(SimError::IntegrationFailure(format!(
            "{} states for {} output times",
            states.len(),
            times.len()
        )));
    }
    if let Some(bad) = states.iter().find(|y| y.len() != 4 * n) {
        return Err(SimError::IntegrationFailure(format!(
            "state of length {} for {n} bodies",
            bad.len()
        )));
    }

    let planets = system
        .bodies
        .iter()
        .enumerate()
        .map(|(i, body)| {
            let mut track = PlanetTrack {
                x: Vec::with_capacity(states.len()),
                y: Vec::with_capacity(states.len()),
                vx: Vec::with_capacity(states.len()),
                vy: Vec::with_capacity(states.len()),
                mass: body.m,
                color: body.color.clone(),
            };
            for y in states {
                let p = position(y, i);
                let v = velocity(y, i);
                track.x.push(p.x);
                track.y.push(p.y);
                track.vx.push(v.x);
                track.vy.push(v.y);
            }
            track
        })
        .collect();

    Ok(Trajectory {
        t: times.to_vec(),
        planets,
    })
}
