//! Error types for the engine.
//!
//! Configuration problems are caught in `Scenario::initialize` before any
//! stepping happens. Domain errors come out of a step and halt the run until
//! the caller resets or reconfigures it.

use thiserror::Error;

/// Invalid scenario configuration, reported at initialization.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("body {index} has non-positive mass {mass}")]
    InvalidMass { index: usize, mass: f64 },

    #[error("scenario contains no bodies")]
    EmptyBodySet,

    #[error("time step must be positive, got {0}")]
    InvalidTimeStep(f64),

    #[error("speed of light must be positive, got {0}")]
    InvalidSpeedOfLight(f64),

    #[error("gravitational constant must be positive, got {0}")]
    InvalidGravitationalConstant(f64),

    #[error("correction scale must be finite, got {0}")]
    InvalidCorrectionScale(f64),

    #[error("reference body {index} out of range for {count} bodies")]
    ReferenceBodyOutOfRange { index: usize, count: usize },

    #[error("invalid correction pair ({i}, {j}) for {count} bodies")]
    InvalidPair { i: usize, j: usize, count: usize },

    #[error("invalid periapsis monitor on body {index}: {reason}")]
    InvalidPeriapsisMonitor { index: usize, reason: String },

    #[error("body {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failure of the physics itself during a step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("bodies {i} and {j} coincide (zero separation)")]
    CoincidentBodies { i: usize, j: usize },

    #[error("body {index} reached speed {speed} m/s, not below c = {c} m/s")]
    Superluminal { index: usize, speed: f64, c: f64 },
}

/// Anything that can go wrong while driving a scenario.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("simulation halted after an earlier failure ({0}); reset or reconfigure first")]
    Halted(DomainError),
}

pub type Result<T> = std::result::Result<T, SimError>;
