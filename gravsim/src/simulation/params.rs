//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - fixed step size `dt` (replaceable between steps),
//! - gravitational constant `G` and speed of light `c`,
//! - post-Newtonian correction scale `k`,
//! - the reference body whose clock runs at coordinate time

#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct Parameters {
    pub dt: f64, // step size (s)
    pub G: f64, // gravitational constant
    pub c: f64, // speed of light (m/s)
    pub correction_scale: f64, // k, a visibility knob for the correction term, not a physical constant
    pub reference_body: usize, // proper-time zero point
}
