use gravsim::simulation::forces::{AccelSet, ForceField, NewtonianGravity};
use gravsim::simulation::initializer::{center_of_mass, initial_system, BodySpec};
use gravsim::simulation::integrator::OdeSystem;
use gravsim::simulation::states::{NVec2, StateVector};
use gravsim::SimError;

use approx::assert_abs_diff_eq;

/// Two bodies separated along the x-axis, at rest
fn two_body_positions(dist: f64) -> Vec<NVec2> {
    vec![NVec2::new(-dist / 2.0, 0.0), NVec2::new(dist / 2.0, 0.0)]
}

/// Build a gravity term + AccelSet
#[allow(non_snake_case)]
fn gravity_set(G: f64, eps: f64) -> AccelSet {
    AccelSet::new().with(NewtonianGravity { G, eps })
}

fn accels(set: &AccelSet, x: &[NVec2], m: &[f64]) -> Vec<NVec2> {
    let mut acc = vec![NVec2::zeros(); x.len()];
    set.accumulate_accels(0.0, x, m, &mut acc);
    acc
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let x = two_body_positions(1.0);
    let m = [2.0, 3.0];
    let acc = accels(&gravity_set(0.1, 0.0), &x, &m);

    let net = acc[0] * m[0] + acc[1] * m[1];

    assert!(net.norm() < 1e-12, "Net force not zero: {:?}", net);
}

#[test]
fn gravity_net_force_vanishes_for_many_bodies() {
    let x: Vec<NVec2> = (0..7)
        .map(|i| {
            let i_f = i as f64;
            NVec2::new((i_f * 0.37).sin() * 5.0, (i_f * 0.13).cos() * 5.0)
        })
        .collect();
    let m: Vec<f64> = (0..7).map(|i| 1.0 + i as f64).collect();
    let acc = accels(&gravity_set(1.0, 1e-8), &x, &m);

    let net = acc.iter().zip(&m).fold(NVec2::zeros(), |s, (a, m)| s + a * *m);
    assert!(net.norm() < 1e-12, "Net force not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let x = two_body_positions(2.0);
    let acc = accels(&gravity_set(0.1, 0.0), &x, &[1.0, 1.0]);

    let dx = x[1] - x[0];
    assert!(acc[0].dot(&dx) > 0.0, "Acceleration is not toward second body");
    assert!(acc[1].dot(&dx) < 0.0, "Acceleration is not toward first body");
}

#[test]
fn gravity_magnitude_matches_newton() {
    let x = two_body_positions(2.0);
    let acc = accels(&gravity_set(1.0, 0.0), &x, &[3.0, 5.0]);

    // |a_0| = G m_1 / r^2
    assert_abs_diff_eq!(acc[0].norm(), 5.0 / 4.0, epsilon = 1e-12);
    assert_abs_diff_eq!(acc[1].norm(), 3.0 / 4.0, epsilon = 1e-12);
}

#[test]
fn gravity_inverse_square_law() {
    let set = gravity_set(0.1, 1e-8);
    let acc_r = accels(&set, &two_body_positions(1.0), &[1.0, 1.0]);
    let acc_2r = accels(&set, &two_body_positions(2.0), &[1.0, 1.0]);

    let ratio = acc_r[0].norm() / acc_2r[0].norm();

    assert!((ratio - 4.0).abs() < 1e-3, "Expected ~4x, got {}", ratio);
}

#[test]
fn gravity_softening_prevents_blowup() {
    let set = gravity_set(1.0, 1e-8);
    let acc = accels(&set, &two_body_positions(1e-9), &[1.0, 1.0]);

    assert!(acc[0].norm().is_finite());
    assert!(acc[0].norm() < 1e9, "Softening failed; acceleration too large");
}

#[test]
fn gravity_coincident_bodies_exert_no_force() {
    let x = vec![NVec2::new(1.0, 1.0), NVec2::new(1.0, 1.0)];
    let acc = accels(&gravity_set(1.0, 1e-8), &x, &[1.0, 1.0]);

    assert_eq!(acc[0], NVec2::zeros());
    assert_eq!(acc[1], NVec2::zeros());
}

#[test]
fn single_body_feels_no_force() {
    let acc = accels(&gravity_set(1.0, 1e-8), &[NVec2::new(3.0, -2.0)], &[7.0]);
    assert_eq!(acc[0], NVec2::zeros());
}

#[test]
fn force_field_copies_velocities_and_appends_accelerations() {
    let field = ForceField::new(vec![1.0, 1.0], 1.0, 0.0);
    // x0 = (-1, 0), x1 = (1, 0), v0 = (0, -0.5), v1 = (0, 0.5)
    let y = StateVector::from_vec(vec![-1.0, 0.0, 1.0, 0.0, 0.0, -0.5, 0.0, 0.5]);
    let mut dydt = StateVector::zeros(8);
    field.rhs(0.0, &y, &mut dydt);

    assert_eq!(field.dimension(), 8);
    assert_eq!(dydt.rows(0, 4), y.rows(4, 4));
    assert_abs_diff_eq!(dydt[4], 0.25, epsilon = 1e-12);
    assert_abs_diff_eq!(dydt[5], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(dydt[6], -0.25, epsilon = 1e-12);
    assert_abs_diff_eq!(dydt[7], 0.0, epsilon = 1e-12);
    assert_eq!(field.derivative(0.0, &y), dydt);
}

// ==================================================================================
// Initializer tests
// ==================================================================================

#[test]
fn initializer_places_pair_symmetrically() {
    let specs = [BodySpec::new(5.0, 1.0, 90.0), BodySpec::new(5.0, 1.0, 270.0)];
    let sys = initial_system(&specs).unwrap();

    assert_abs_diff_eq!(sys.bodies[0].x.x, -50.0, epsilon = 1e-9);
    assert_abs_diff_eq!(sys.bodies[1].x.x, 50.0, epsilon = 1e-9);
    assert_abs_diff_eq!(sys.bodies[0].v.y, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(sys.bodies[1].v.y, -1.0, epsilon = 1e-12);
    assert_eq!(sys.t, 0.0);
}

#[test]
fn initializer_recenters_unequal_masses() {
    let specs = [
        BodySpec::new(10.0, 0.0, 0.0),
        BodySpec::new(1.0, 0.0, 0.0).with_distance(30.0),
        BodySpec::new(2.0, 0.0, 0.0).with_distance(50.0),
        BodySpec::new(0.5, 0.0, 0.0),
    ];
    let sys = initial_system(&specs).unwrap();
    let cm = center_of_mass(&sys.bodies);

    assert_abs_diff_eq!(cm.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(cm.y, 0.0, epsilon = 1e-9);

    // relative placement survives the shift: body 1 is 30 from body 0
    assert_abs_diff_eq!((sys.bodies[1].x - sys.bodies[0].x).norm(), 30.0, epsilon = 1e-9);
}

#[test]
fn initializer_single_body_sits_at_origin() {
    let sys = initial_system(&[BodySpec::new(3.0, 0.0, 0.0).with_distance(42.0)]).unwrap();
    assert_eq!(sys.bodies[0].x, NVec2::zeros());
}

#[test]
fn initializer_passes_color_through() {
    let specs = [
        BodySpec::new(1.0, 0.0, 0.0).with_color("red"),
        BodySpec::new(1.0, 0.0, 0.0),
    ];
    let sys = initial_system(&specs).unwrap();
    assert_eq!(sys.bodies[0].color, "red");
    assert_eq!(sys.bodies[1].color, "");
}

#[test]
fn initializer_state_vector_layout() {
    let specs = [BodySpec::new(1.0, 2.0, 0.0), BodySpec::new(1.0, 3.0, 90.0).with_distance(4.0)];
    let sys = initial_system(&specs).unwrap();
    let y = sys.to_state();

    assert_eq!(y.len(), 8);
    // positions block, then velocities block
    assert_abs_diff_eq!(y[0], -2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(y[2], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(y[4], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(y[7], 3.0, epsilon = 1e-12);
    assert_eq!(sys.with_state(0.0, &y), sys);
}

#[test]
fn initializer_rejects_empty_list() {
    assert!(matches!(initial_system(&[]), Err(SimError::InvalidInput(_))));
}

#[test]
fn initializer_rejects_non_positive_mass() {
    for mass in [0.0, -1.0, f64::NAN] {
        let specs = [BodySpec::new(1.0, 0.0, 0.0), BodySpec::new(mass, 0.0, 0.0)];
        assert!(
            matches!(initial_system(&specs), Err(SimError::InvalidInput(_))),
            "mass {mass} was accepted"
        );
    }
}

#[test]
fn initializer_rejects_negative_distance() {
    let specs = [BodySpec::new(1.0, 0.0, 0.0), BodySpec::new(1.0, 0.0, 0.0).with_distance(-1.0)];
    assert!(matches!(initial_system(&specs), Err(SimError::InvalidInput(_))));
}

#[test]
fn initializer_allows_zero_distance() {
    let specs = [BodySpec::new(1.0, 0.0, 0.0), BodySpec::new(1.0, 0.0, 0.0).with_distance(0.0)];
    let sys = initial_system(&specs).unwrap();
    assert_eq!(sys.bodies[0].x, sys.bodies[1].x);
}
