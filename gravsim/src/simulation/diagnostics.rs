//! Conservation diagnostics
//!
//! Totals that should stay constant for an isolated Newtonian system; useful
//! for spotting numerical drift. The relativistic correction does not
//! conserve them.

use super::states::{NVec3, System};

impl System {
    /// Σ mᵢ vᵢ
    pub fn total_momentum(&self) -> NVec3 {
        self.bodies
            .iter()
            .map(|b| b.momentum())
            .fold(NVec3::zeros(), |acc, p| acc + p)
    }

    /// Σ mᵢ (xᵢ × vᵢ)
    pub fn total_angular_momentum(&self) -> NVec3 {
        self.bodies
            .iter()
            .map(|b| b.m * b.x.cross(&b.v))
            .fold(NVec3::zeros(), |acc, l| acc + l)
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .map(|b| 0.5 * b.m * b.v.norm_squared())
            .sum()
    }

    /// Newtonian potential energy, each pair counted once
    #[allow(non_snake_case)]
    pub fn potential_energy(&self, G: f64) -> f64 {
        self.bodies
            .iter()
            .enumerate()
            .flat_map(|(i, a)| {
                self.bodies[i + 1..].iter().map(move |b| -G * a.m * b.m / a.distance_to(b))
            })
            .sum()
    }

    #[allow(non_snake_case)]
    pub fn total_energy(&self, G: f64) -> f64 {
        self.kinetic_energy() + self.potential_energy(G)
    }
}
