pub mod simulation;
pub mod configuration;
pub mod benchmark;
pub mod error;

pub use simulation::states::{Body, System, NVec3};
pub use simulation::params::Parameters;
pub use simulation::engine::Engine;
pub use simulation::forces::{Acceleration, AccelSet, PairCorrection, PairwiseGravity, Newtonian, PostNewtonian};
pub use simulation::integrator::{verlet_integrator, StepTrace};
pub use simulation::proper_time::{lorentz_factor, ProperTimeTracker};
pub use simulation::periapsis::{LogSink, PeriapsisDetector, PeriapsisEvent, PeriapsisMonitor, PeriapsisSink};
pub use simulation::scenario::Scenario;

pub use configuration::config::{BodyConfig, CorrectionMode, EngineConfig, ParametersConfig, PeriapsisConfig, ScenarioConfig};

pub use error::{ConfigError, DomainError, SimError};

pub use benchmark::benchmark::{bench_gravity, bench_verlet};
