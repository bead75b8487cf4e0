//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – correction mode and parallel pair evaluation
//! - [`ParametersConfig`] – time step and physical constants
//! - [`BodyConfig`]       – initial state for each body, optionally monitored for periapsis
//! - `corrected_pairs`    – index pairs eligible for the relativistic correction
//!
//! # YAML format
//! Mercury against its relativistic twin, as in `scenarios/mercury_precession.yaml`:
//!
//! ```yaml
//! engine:
//!   correction: post_newtonian   # or newtonian
//!   parallel: false
//!
//! parameters:
//!   dt: 1000.0                   # seconds
//!   G: 6.6743e-11
//!   c: 299792458.0
//!   correction_scale: 1.0e4      # exaggerated for visibility
//!   reference_body: 0
//!
//! bodies:
//!   - name: sun
//!     x: [0.0, 0.0, 0.0]
//!     v: [0.0, 0.0, 0.0]
//!     m: 1.989e30
//!   - name: mercury-relativistic
//!     x: [4.579e10, 0.0, 1.05e10]
//!     v: [0.0, 5.897e4, 0.0]
//!     m: 0.330e24
//!     periapsis:
//!       reference_speed: 5.897e4
//!       error_margin: 1.0
//!       min_step_gap: 1000
//!
//! corrected_pairs:
//!   - [0, 1]
//! ```
//!
//! [`Scenario::initialize`](crate::simulation::scenario::Scenario::initialize)
//! validates this and maps it into the runtime representation.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Gravity correction applied to eligible pairs
/// `correction: "newtonian"` or `correction: "post_newtonian"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrectionMode {
    #[serde(rename = "newtonian")] // plain inverse-square gravity, conserves momentum and energy
    #[default]
    Newtonian,

    #[serde(rename = "post_newtonian")] // simplified post-Newtonian factor on the configured pairs
    PostNewtonian,
}

/// High-level engine configuration
#[derive(Deserialize, Debug, Clone, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub correction: CorrectionMode,
    #[serde(default)]
    pub parallel: bool, // split pair evaluation across rayon workers
}

/// Global numerical and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub dt: f64, // time step size (s)
    #[serde(default = "default_g")]
    pub G: f64, // gravitational constant
    #[serde(default = "default_c")]
    pub c: f64, // speed of light (m/s)
    #[serde(default = "default_correction_scale")]
    pub correction_scale: f64, // k in the correction factor, tuning only
    #[serde(default)]
    pub reference_body: usize, // body whose clock defines coordinate time
}

fn default_g() -> f64 {
    6.6743e-11
}

fn default_c() -> f64 {
    299_792_458.0
}

fn default_correction_scale() -> f64 {
    1.0
}

/// Hysteresis-gated periapsis detection settings for one body
#[derive(Deserialize, Debug, Clone)]
pub struct PeriapsisConfig {
    pub reference_speed: f64, // expected speed at periapsis (m/s)
    pub error_margin: f64, // accepted |reference_speed - v| (m/s)
    pub min_step_gap: u64, // steps that must pass before the next detection
}

/// Configuration for a single body’s initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    #[serde(default)]
    pub name: Option<String>, // label used in logs only
    pub x: [f64; 3], // initial position (m)
    pub v: [f64; 3], // initial velocity (m/s)
    pub m: f64, // mass (kg)
    #[serde(default)]
    pub periapsis: Option<PeriapsisConfig>, // present = monitored
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub corrected_pairs: Vec<[usize; 2]>,
}

impl ScenarioConfig {
    /// Parse a scenario from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a scenario file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}
