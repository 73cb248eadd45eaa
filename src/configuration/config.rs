//! Configuration types for loading simulation scenarios from YAML or JSON.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`ParametersConfig`] – horizon, sampling, tolerances and physical constants
//! - [`BodyConfig`]       – per-body mass, speed, heading and placement
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario
//!
//! # YAML format
//! Every parameter is optional; missing ones take the engine defaults:
//!
//! ```yaml
//! parameters:
//!   time_interval: 20.0     # simulated time span [0, T]
//!   samples: 500            # evenly spaced output times
//!   rtol: 1.0e-8            # relative error tolerance
//!   atol: 1.0e-6            # absolute error tolerance
//!   softening: 1.0e-8       # added to r^3 in the force law
//!   G: 1.0                  # gravitational constant
//!   integrator: "rk45"      # or "verlet" (fixed step h0)
//!   collision:
//!     policy: "detect"      # or "soften"
//!     radius: 0.5
//!
//! bodies:
//!   - mass: 5.0
//!     velocity: 1.0
//!     velocity_angle: 90.0  # degrees, counter-clockwise from +x
//!     color: "#f5a623"
//!   - mass: 5.0
//!     velocity: 1.0
//!     velocity_angle: 270.0
//!     initial_distance: 100.0
//! ```
//!
//! The request shape `{ "bodies": [...], "time_interval": 20 }` is accepted
//! as well; a top-level `time_interval` overrides the one in `parameters`.

use serde::Deserialize;

/// Time-stepping method: `integrator: "rk45"` or `integrator: "verlet"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub enum IntegratorConfig {
    #[serde(rename = "rk45")] // Adaptive Dormand–Prince 5(4) with dense output
    #[default]
    Rk45,

    #[serde(rename = "verlet")] // Velocity Verlet, fixed step `h0`, symplectic
    Verlet,
}

/// Close-encounter handling
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum CollisionConfig {
    #[default]
    Soften,
    Detect { radius: f64 },
}

/// Global numerical and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ParametersConfig {
    pub time_interval: f64,       // time end
    pub samples: usize,           // number of output samples
    pub rtol: f64,                // relative error tolerance
    pub atol: f64,                // absolute error tolerance
    pub softening: f64,           // keeps the force finite when bodies coincide
    pub G: f64,                   // gravitational constant
    pub max_steps: usize,         // internal step budget
    pub first_step: Option<f64>,  // initial step, auto-selected when absent
    pub max_step: Option<f64>,    // cap on the adaptive step
    pub integrator: IntegratorConfig,
    pub h0: f64,                  // fixed step for verlet
    pub collision: CollisionConfig,
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            time_interval: 20.0,
            samples: 500,
            rtol: 1e-8,
            atol: 1e-6,
            softening: 1e-8,
            G: 1.0,
            max_steps: 1_000_000,
            first_step: None,
            max_step: None,
            integrator: IntegratorConfig::Rk45,
            h0: 1e-3,
            collision: CollisionConfig::Soften,
        }
    }
}

/// Configuration for a single body’s initial state
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct BodyConfig {
    pub mass: f64,                     // must be > 0
    #[serde(default)]
    pub velocity: f64,                 // speed
    #[serde(default)]
    pub velocity_angle: f64,           // heading in degrees
    pub initial_distance: Option<f64>, // ring radius, defaults to 100
    pub color: Option<String>,         // passed through to the output
}

/// Top-level scenario configuration
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub parameters: ParametersConfig, // Global numerical and physical parameters
    pub bodies: Vec<BodyConfig>, // Bodies that define the initial state
    #[serde(default)]
    pub time_interval: Option<f64>, // request-style override of parameters.time_interval
}
