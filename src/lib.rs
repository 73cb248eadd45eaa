pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{Body, System, NVec2, StateVector};
pub use simulation::params::{Parameters, Method, CollisionPolicy};
pub use simulation::errors::SimError;
pub use simulation::initializer::{BodySpec, initial_system};
pub use simulation::forces::{Acceleration, AccelSet, ForceField, NewtonianGravity};
pub use simulation::integrator::{OdeSystem, DormandPrince, Stats, Tolerances, verlet_integrator};
pub use simulation::trajectory::{Trajectory, PlanetTrack, Sample, format_trajectory, sample_times};
pub use simulation::engine::{simulate, SimulationOutput};
pub use simulation::scenario::{Scenario, MAX_BODIES};

pub use configuration::config::{IntegratorConfig, CollisionConfig, ParametersConfig, BodyConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_force_field, bench_simulate_curve};
