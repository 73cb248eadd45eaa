//! Error taxonomy of the simulation core

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Rejected before integration begins (empty body list, bad mass, bad horizon, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Non-finite values appeared in the state or its derivative
    #[error("numerical instability at t = {t}: non-finite state")]
    NumericalInstability { t: f64 },

    /// Two bodies came closer than the configured collision radius
    #[error("bodies {i} and {j} collided at t = {t} (separation {separation})")]
    Collision {
        i: usize,
        j: usize,
        t: f64,
        separation: f64,
    },

    /// Step budget exhausted, step size underflow, or an internal shape mismatch
    #[error("integration failed: {0}")]
    IntegrationFailure(String),
}

impl SimError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SimError::InvalidInput(msg.into())
    }
}
