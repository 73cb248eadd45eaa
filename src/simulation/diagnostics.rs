//! Conserved quantities of a state: momentum, energy, center of mass
//!
//! The potential is U_ij = -G m_i m_j / (|r|^3 + eps)^(1/3). For eps > 0 this
//! is not the exact potential of the `|r|^3 + eps` force law, so energy checks
//! are approximate at separations near eps^(1/3); elsewhere the two agree.

use super::states::{body_count, position, velocity, NVec2, StateVector};
use super::trajectory::Trajectory;

pub fn total_momentum(y: &StateVector, m: &[f64]) -> NVec2 {
    (0..body_count(y)).fold(NVec2::zeros(), |acc, i| acc + m[i] * velocity(y, i))
}

pub fn center_of_mass(y: &StateVector, m: &[f64]) -> NVec2 {
    let total: f64 = m.iter().sum();
    let weighted = (0..body_count(y)).fold(NVec2::zeros(), |acc, i| acc + m[i] * position(y, i));
    weighted / total
}

pub fn kinetic_energy(y: &StateVector, m: &[f64]) -> f64 {
    (0..body_count(y))
        .map(|i| 0.5 * m[i] * velocity(y, i).norm_squared())
        .sum()
}

#[allow(non_snake_case)]
pub fn potential_energy(y: &StateVector, m: &[f64], G: f64, eps: f64) -> f64 {
    let n = body_count(y);
    let mut u = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let r2 = (position(y, j) - position(y, i)).norm_squared();
            let dist = (r2 * r2.sqrt() + eps).cbrt();
            u -= G * m[i] * m[j] / dist;
        }
    }
    u
}

#[allow(non_snake_case)]
pub fn total_energy(y: &StateVector, m: &[f64], G: f64, eps: f64) -> f64 {
    kinetic_energy(y, m) + potential_energy(y, m, G, eps)
}

/// Worst drift of the conserved quantities over a trajectory, relative to t = 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConservationReport {
    pub momentum_drift: f64, // max |P(t) - P(0)|
    pub energy_drift: f64, // max |E(t) - E(0)| / |E(0)| (absolute if E(0) == 0)
    pub com_drift: f64, // max |C(t) - C(0) - V t|, V = P / M
}

#[allow(non_snake_case)]
pub fn conservation_report(traj: &Trajectory, G: f64, eps: f64) -> ConservationReport {
    let m = traj.masses();
    let mut report = ConservationReport {
        momentum_drift: 0.0,
        energy_drift: 0.0,
        com_drift: 0.0,
    };
    let Some(y0) = traj.state_at(0) else {
        return report;
    };
    let p0 = total_momentum(&y0, &m);
    let e0 = total_energy(&y0, &m, G, eps);
    let c0 = center_of_mass(&y0, &m);
    let v_cm = p0 / m.iter().sum::<f64>();
    let e_scale = if e0 == 0.0 { 1.0 } else { e0.abs() };

    for (k, &t) in traj.t.iter().enumerate() {
        let Some(y) = traj.state_at(k) else {
            break;
        };
        let dp = (total_momentum(&y, &m) - p0).norm();
        let de = (total_energy(&y, &m, G, eps) - e0).abs() / e_scale;
        let dc = (center_of_mass(&y, &m) - c0 - v_cm * t).norm();
        report.momentum_drift = report.momentum_drift.max(dp);
        report.energy_drift = report.energy_drift.max(de);
        report.com_drift = report.com_drift.max(dc);
    }
    report
}
