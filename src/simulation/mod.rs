pub mod states;
pub mod params;
pub mod errors;
pub mod initializer;
pub mod forces;
pub mod integrator;
pub mod trajectory;
pub mod diagnostics;
pub mod engine;
pub mod scenario;
