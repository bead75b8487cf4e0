//! Fixed-step velocity-Verlet integrator
//!
//! Two force evaluations per step, position advanced with the pre-step
//! acceleration only, velocity corrected with the average of both.

use super::forces::AccelSet;
use super::states::{NVec3, System};
use crate::error::DomainError;

/// Pre-step quantities the observational trackers need after the step
#[derive(Debug, Clone)]
pub struct StepTrace {
    pub v0: Vec<NVec3>, // velocities at t_n
    pub a0: Vec<NVec3>, // accelerations at t_n
}

/// Advance the system by one step of `dt` using velocity-Verlet
///
/// Updates positions, velocities, accelerations and `sys.t` in place.
/// On error the system may be partially advanced; callers that need an
/// atomic step run this on a copy.
pub fn verlet_integrator(sys: &mut System, forces: &AccelSet, dt: f64) -> Result<StepTrace, DomainError> {
    let n = sys.len();
    if n == 0 { // no bodies, only time moves
        sys.t += dt;
        return Ok(StepTrace { v0: Vec::new(), a0: Vec::new() });
    }

    let v0: Vec<NVec3> = sys.bodies.iter().map(|b| b.v).collect();

    // a_n from x_n, v_n
    let a0 = forces.compute_accelerations(sys)?;

    // x_n+1 = x_n + dt v_n + (1/2) dt^2 a_n
    let half_dt2 = 0.5 * dt * dt;
    for (b, a) in sys.bodies.iter_mut().zip(a0.iter()) {
        b.x += dt * b.v + half_dt2 * *a;
    }

    // a_n+1 from x_n+1, velocities still at v_n
    let a1 = forces.compute_accelerations(sys)?;

    // v_n+1 = v_n + (1/2) dt (a_n + a_n+1)
    let half_dt = 0.5 * dt;
    for ((b, a_old), a_new) in sys.bodies.iter_mut().zip(a0.iter()).zip(a1.iter()) {
        b.v += half_dt * (*a_old + *a_new);
        b.a = *a_new;
    }

    sys.t += dt;

    Ok(StepTrace { v0, a0 })
}
