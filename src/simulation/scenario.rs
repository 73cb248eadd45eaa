//! Build validated simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML/JSON-facing) and produces the runtime
//! bundle consumed by [`simulate`]:
//! - numerical parameters (`Parameters`)
//! - body specs (`BodySpec`), checked before anything is integrated

use crate::configuration::config::{BodyConfig, CollisionConfig, IntegratorConfig, ScenarioConfig};
use crate::simulation::engine::{simulate, SimulationOutput};
use crate::simulation::errors::SimError;
use crate::simulation::initializer::{BodySpec, DEFAULT_INITIAL_DISTANCE};
use crate::simulation::params::{CollisionPolicy, Method, Parameters};

/// Upper bound on N accepted from outside; keeps the O(N^2) force sum tractable
pub const MAX_BODIES: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub parameters: Parameters,
    pub bodies: Vec<BodySpec>,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, SimError> {
        if cfg.bodies.is_empty() {
            return Err(SimError::invalid("body list is empty"));
        }
        if cfg.bodies.len() > MAX_BODIES {
            return Err(SimError::invalid(format!(
                "{} bodies requested, at most {MAX_BODIES} are supported",
                cfg.bodies.len()
            )));
        }

        // Bodies: map `BodyConfig` -> `BodySpec`
        let bodies: Vec<BodySpec> = cfg
            .bodies
            .iter()
            .map(|bc: &BodyConfig| BodySpec {
                mass: bc.mass,
                speed: bc.velocity,
                velocity_angle: bc.velocity_angle,
                initial_distance: bc.initial_distance.unwrap_or(DEFAULT_INITIAL_DISTANCE),
                color: bc.color.clone().unwrap_or_default(),
            })
            .collect();
        for (i, spec) in bodies.iter().enumerate() {
            spec.validate(i)?;
        }

        // Parameters (runtime) from ParametersConfig
        let p_cfg = cfg.parameters;
        let parameters = Parameters {
            t_end: cfg.time_interval.unwrap_or(p_cfg.time_interval),
            samples: p_cfg.samples,
            atol: p_cfg.atol,
            rtol: p_cfg.rtol,
            eps: p_cfg.softening,
            G: p_cfg.G,
            max_steps: p_cfg.max_steps,
            first_step: p_cfg.first_step,
            max_step: p_cfg.max_step,
            method: match p_cfg.integrator {
                IntegratorConfig::Rk45 => Method::Rk45,
                IntegratorConfig::Verlet => Method::Verlet { h0: p_cfg.h0 },
            },
            collision: match p_cfg.collision {
                CollisionConfig::Soften => CollisionPolicy::Soften,
                CollisionConfig::Detect { radius } => CollisionPolicy::Detect { radius },
            },
        };
        parameters.validate()?;

        Ok(Self { parameters, bodies })
    }

    pub fn run(&self) -> Result<SimulationOutput, SimError> {
        simulate(&self.bodies, &self.parameters)
    }
}
