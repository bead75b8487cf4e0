//! Proper time and the dilated observational trajectory.

use super::integrator::StepTrace;
use super::states::System;
use crate::error::DomainError;

/// Lorentz factor γ = 1 / √(1 − (v/c)²)
///
/// `None` unless `speed < c` (this also rejects NaN). Exactly 1.0 at rest.
pub fn lorentz_factor(speed: f64, c: f64) -> Option<f64> {
    if !(speed < c) {
        return None;
    }
    let beta = speed / c;
    Some(1.0 / (1.0 - beta * beta).sqrt())
}

/// Accumulates per-body proper time after each integrator step
///
/// The reference body ticks at coordinate time. Every other body advances by
/// `dt / γ`, with γ taken from its velocity at the start of the step, the
/// same time level the dilated position update uses. The dilated position
/// follows the velocity-Verlet position update of the real one, scaled by
/// `1/γ`, and never feeds back into the dynamics.
#[derive(Debug, Clone)]
pub struct ProperTimeTracker {
    pub reference_body: usize,
    pub c: f64,
}

impl ProperTimeTracker {
    pub fn new(reference_body: usize, c: f64) -> Self {
        Self { reference_body, c }
    }

    fn lorentz(&self, index: usize, speed: f64) -> Result<f64, DomainError> {
        lorentz_factor(speed, self.c).ok_or(DomainError::Superluminal { index, speed, c: self.c })
    }

    /// γ for every body, checked before anything is written
    ///
    /// Both the pre-step and the post-step speed must be below c for every
    /// body, the reference body included.
    fn gammas(&self, sys: &System, trace: &StepTrace) -> Result<Vec<f64>, DomainError> {
        sys.bodies
            .iter()
            .zip(trace.v0.iter())
            .map(|(b, v0)| {
                let gamma = self.lorentz(b.index, v0.norm())?;
                self.lorentz(b.index, b.speed())?;
                Ok(if b.index == self.reference_body { 1.0 } else { gamma })
            })
            .collect()
    }

    pub fn advance(&self, sys: &mut System, trace: &StepTrace, dt: f64) -> Result<(), DomainError> {
        let gammas = self.gammas(sys, trace)?;
        let half_dt2 = 0.5 * dt * dt;

        for (i, b) in sys.bodies.iter_mut().enumerate() {
            let inv_gamma = 1.0 / gammas[i];
            b.proper_time += dt * inv_gamma;
            b.dilated_x += (dt * trace.v0[i] + half_dt2 * trace.a0[i]) * inv_gamma;
        }
        Ok(())
    }
}
