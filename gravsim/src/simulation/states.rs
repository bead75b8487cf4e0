//! Core state types for the engine.
//!
//! `Body` carries the authoritative position/velocity used by the force model
//! and integrator, plus the observational quantities maintained after each
//! step (proper time, dilated position, periapsis bookkeeping).
//! `System` holds the ordered body list and the elapsed coordinate time `t`.

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone)]
pub struct Body {
    pub index: usize, // identity, equals position in `System::bodies`
    pub x: NVec3, // position (m)
    pub v: NVec3, // velocity (m/s)
    pub a: NVec3, // acceleration from the latest force evaluation (m/s^2)
    pub m: f64, // mass (kg)
    pub proper_time: f64, // elapsed proper time (s), never decreases
    pub dilated_x: NVec3, // observational position advanced at the dilated rate
    pub periapsis_count: u64,
    pub last_periapsis_angle: Option<f64>, // radians, in the x-y plane
    pub steps_since_periapsis: u64, // hysteresis counter
}

impl Body {
    /// Fresh body at rest in its own bookkeeping: zero proper time, no
    /// periapsis recorded, dilated position starting at `x`.
    pub fn new(index: usize, m: f64, x: NVec3, v: NVec3) -> Self {
        Self {
            index,
            x,
            v,
            a: NVec3::zeros(),
            m,
            proper_time: 0.0,
            dilated_x: x,
            periapsis_count: 0,
            last_periapsis_angle: None,
            steps_since_periapsis: 0,
        }
    }

    pub fn speed(&self) -> f64 {
        self.v.norm()
    }

    pub fn momentum(&self) -> NVec3 {
        self.m * self.v
    }

    pub fn distance_to(&self, other: &Body) -> f64 {
        (other.x - self.x).norm()
    }
}

#[derive(Debug, Clone)]
pub struct System {
    pub bodies: Vec<Body>, // pair-iteration order is the order of this list
    pub t: f64, // elapsed coordinate time (s)
}

impl System {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self { bodies, t: 0.0 }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
