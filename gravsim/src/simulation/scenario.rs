//! Build and drive a fully-initialized simulation from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing), validates it, and produces the
//! runtime bundle holding:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`)
//! - system state (`System`, bodies at t = 0)
//! - active force set (`AccelSet`)
//! - the proper-time tracker and periapsis detector
//!
//! `step` is atomic: all stages run on a working copy and the result is only
//! committed when every stage succeeds. External readers only ever see
//! post-step snapshots through the query accessors.

use crate::configuration::config::{CorrectionMode, ScenarioConfig};
use crate::error::{ConfigError, DomainError, SimError};
use crate::simulation::engine::Engine;
use crate::simulation::forces::{AccelSet, PairwiseGravity, PostNewtonian};
use crate::simulation::integrator::verlet_integrator;
use crate::simulation::params::Parameters;
use crate::simulation::periapsis::{LogSink, PeriapsisDetector, PeriapsisMonitor, PeriapsisSink};
use crate::simulation::proper_time::ProperTimeTracker;
use crate::simulation::states::{Body, NVec3, System};

pub struct Scenario {
    engine: Engine,
    parameters: Parameters,
    system: System,
    initial: System, // restored by `reset`
    forces: AccelSet,
    proper_time: ProperTimeTracker,
    periapsis: PeriapsisDetector,
    labels: Vec<String>,
    sink: Box<dyn PeriapsisSink + Send>,
    halted: Option<DomainError>,
    steps: u64,
}

impl Scenario {
    /// Validate `cfg` and build the runtime scenario
    ///
    /// Nothing is stepped here; any configuration problem is reported before
    /// the first `step`.
    pub fn initialize(cfg: ScenarioConfig) -> Result<Self, ConfigError> {
        validate(&cfg)?;

        // Bodies: map `BodyConfig` -> runtime `Body` using nalgebra vectors
        let bodies: Vec<Body> = cfg
            .bodies
            .iter()
            .enumerate()
            .map(|(i, bc)| Body::new(i, bc.m, NVec3::from(bc.x), NVec3::from(bc.v)))
            .collect();

        let labels = cfg
            .bodies
            .iter()
            .enumerate()
            .map(|(i, bc)| bc.name.clone().unwrap_or_else(|| format!("body{i}")))
            .collect();

        let monitors = cfg
            .bodies
            .iter()
            .enumerate()
            .filter_map(|(i, bc)| {
                bc.periapsis.as_ref().map(|p| PeriapsisMonitor {
                    body: i,
                    reference_speed: p.reference_speed,
                    error_margin: p.error_margin,
                    min_step_gap: p.min_step_gap,
                })
            })
            .collect();

        let p_cfg = cfg.parameters;
        let parameters = Parameters {
            dt: p_cfg.dt,
            G: p_cfg.G,
            c: p_cfg.c,
            correction_scale: p_cfg.correction_scale,
            reference_body: p_cfg.reference_body,
        };

        let engine = Engine {
            correction: cfg.engine.correction,
            parallel: cfg.engine.parallel,
        };

        // Forces: pairwise gravity, corrected pairs only in post-Newtonian mode
        let mut gravity = PairwiseGravity::newtonian(parameters.G).parallel(engine.parallel);
        match engine.correction {
            CorrectionMode::PostNewtonian => {
                gravity = gravity.with_correction(
                    PostNewtonian {
                        G: parameters.G,
                        c: parameters.c,
                        k: parameters.correction_scale,
                    },
                    cfg.corrected_pairs.iter().map(|p| (p[0], p[1])),
                );
            }
            CorrectionMode::Newtonian => {
                if !cfg.corrected_pairs.is_empty() {
                    log::warn!(
                        "{} corrected pair(s) configured but correction mode is newtonian; ignoring them",
                        cfg.corrected_pairs.len()
                    );
                }
            }
        }
        let forces = AccelSet::new().with(gravity);

        let system = System::new(bodies);

        log::info!(
            "initialized scenario: {} bodies, dt = {} s, correction = {:?}, parallel = {}, {} periapsis monitor(s)",
            system.len(),
            parameters.dt,
            engine.correction,
            engine.parallel,
            cfg.bodies.iter().filter(|b| b.periapsis.is_some()).count(),
        );

        Ok(Self {
            proper_time: ProperTimeTracker::new(parameters.reference_body, parameters.c),
            periapsis: PeriapsisDetector::new(monitors),
            initial: system.clone(),
            engine,
            parameters,
            system,
            forces,
            labels,
            sink: Box::new(LogSink),
            halted: None,
            steps: 0,
        })
    }

    /// Replace the periapsis telemetry sink (default: [`LogSink`])
    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: PeriapsisSink + Send + 'static,
    {
        self.sink = Box::new(sink);
        self
    }

    /// Advance one tick: positions, accelerations, velocities, proper time,
    /// then periapsis checks
    ///
    /// A domain error leaves the last committed state untouched and halts the
    /// scenario; further calls return [`SimError::Halted`] until `reset` or
    /// `set_time_step`.
    pub fn step(&mut self) -> Result<(), SimError> {
        if let Some(err) = &self.halted {
            return Err(SimError::Halted(err.clone()));
        }

        let dt = self.parameters.dt;
        let mut next = self.system.clone();

        let advanced = verlet_integrator(&mut next, &self.forces, dt)
            .and_then(|trace| self.proper_time.advance(&mut next, &trace, dt));

        if let Err(err) = advanced {
            log::error!("step {} at t = {:.6e} s failed: {}", self.steps + 1, self.system.t, err);
            self.halted = Some(err.clone());
            return Err(err.into());
        }

        let events = self.periapsis.check(&mut next);

        self.system = next;
        self.steps += 1;
        log::debug!("step {} committed, t = {:.6e} s", self.steps, self.system.t);

        for event in &events {
            self.sink.observe(event);
        }
        Ok(())
    }

    /// Step `n` times, stopping at the first failure
    pub fn run(&mut self, n: u64) -> Result<(), SimError> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Swap the time step between steps; also lifts a halt
    pub fn set_time_step(&mut self, dt: f64) -> Result<(), ConfigError> {
        check_time_step(dt)?;
        log::info!("time step changed {} s -> {} s at t = {:.6e} s", self.parameters.dt, dt, self.system.t);
        self.parameters.dt = dt;
        self.halted = None;
        Ok(())
    }

    /// Restore the initial bodies and clear any halt; parameters are kept
    pub fn reset(&mut self) {
        self.system = self.initial.clone();
        self.halted = None;
        self.steps = 0;
        log::info!("scenario reset to initial state");
    }

    // -------------------------------------------------------------------------
    // Queries. Pure reads; `None` for an out-of-range index.
    // -------------------------------------------------------------------------

    pub fn position(&self, i: usize) -> Option<NVec3> {
        self.system.bodies.get(i).map(|b| b.x)
    }

    pub fn velocity(&self, i: usize) -> Option<NVec3> {
        self.system.bodies.get(i).map(|b| b.v)
    }

    pub fn proper_time(&self, i: usize) -> Option<f64> {
        self.system.bodies.get(i).map(|b| b.proper_time)
    }

    /// Proper time of body `i` minus that of the reference body
    pub fn proper_time_offset(&self, i: usize) -> Option<f64> {
        let reference = self.proper_time(self.parameters.reference_body)?;
        self.proper_time(i).map(|tau| tau - reference)
    }

    pub fn dilated_position(&self, i: usize) -> Option<NVec3> {
        self.system.bodies.get(i).map(|b| b.dilated_x)
    }

    pub fn periapsis_count(&self, i: usize) -> Option<u64> {
        self.system.bodies.get(i).map(|b| b.periapsis_count)
    }

    /// `None` also when body `i` has not had a periapsis yet
    pub fn last_periapsis_angle(&self, i: usize) -> Option<f64> {
        self.system.bodies.get(i).and_then(|b| b.last_periapsis_angle)
    }

    pub fn label(&self, i: usize) -> Option<&str> {
        self.labels.get(i).map(String::as_str)
    }

    /// Post-step snapshot of every body
    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn time(&self) -> f64 {
        self.system.t
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn body_count(&self) -> usize {
        self.system.len()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn monitors(&self) -> &[PeriapsisMonitor] {
        self.periapsis.monitors()
    }

    /// The error that halted stepping, if any
    pub fn halted(&self) -> Option<&DomainError> {
        self.halted.as_ref()
    }
}

fn check_time_step(dt: f64) -> Result<(), ConfigError> {
    if dt > 0.0 && dt.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidTimeStep(dt))
    }
}

fn validate(cfg: &ScenarioConfig) -> Result<(), ConfigError> {
    let n = cfg.bodies.len();
    if n == 0 {
        return Err(ConfigError::EmptyBodySet);
    }

    let p = &cfg.parameters;
    check_time_step(p.dt)?;
    if !(p.c > 0.0 && p.c.is_finite()) {
        return Err(ConfigError::InvalidSpeedOfLight(p.c));
    }
    if !(p.G > 0.0 && p.G.is_finite()) {
        return Err(ConfigError::InvalidGravitationalConstant(p.G));
    }
    if !p.correction_scale.is_finite() {
        return Err(ConfigError::InvalidCorrectionScale(p.correction_scale));
    }
    if p.reference_body >= n {
        return Err(ConfigError::ReferenceBodyOutOfRange { index: p.reference_body, count: n });
    }

    for (index, bc) in cfg.bodies.iter().enumerate() {
        if !(bc.m > 0.0 && bc.m.is_finite()) {
            return Err(ConfigError::InvalidMass { index, mass: bc.m });
        }
        if bc.x.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::NonFinite { index, field: "position" });
        }
        if bc.v.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::NonFinite { index, field: "velocity" });
        }
        if let Some(peri) = &bc.periapsis {
            if !(peri.reference_speed >= 0.0 && peri.reference_speed.is_finite()) {
                return Err(ConfigError::InvalidPeriapsisMonitor {
                    index,
                    reason: format!("reference speed {} must be finite and non-negative", peri.reference_speed),
                });
            }
            if !(peri.error_margin > 0.0 && peri.error_margin.is_finite()) {
                return Err(ConfigError::InvalidPeriapsisMonitor {
                    index,
                    reason: format!("error margin {} must be finite and positive", peri.error_margin),
                });
            }
        }
    }

    for &[i, j] in &cfg.corrected_pairs {
        if i == j || i >= n || j >= n {
            return Err(ConfigError::InvalidPair { i, j, count: n });
        }
    }

    Ok(())
}
