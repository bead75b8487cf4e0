use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;

use approx::assert_relative_eq;

use gravsim::simulation::forces::{AccelSet, PairwiseGravity};
use gravsim::simulation::integrator::verlet_integrator;
use gravsim::simulation::states::{Body, NVec3, System};
use gravsim::{
    BodyConfig, ConfigError, CorrectionMode, DomainError, EngineConfig, ParametersConfig, PeriapsisConfig,
    PeriapsisEvent, Scenario, ScenarioConfig, SimError,
};

const C: f64 = 299_792_458.0;

fn body(x: [f64; 3], v: [f64; 3], m: f64) -> BodyConfig {
    BodyConfig { name: None, x, v, m, periapsis: None }
}

fn params(dt: f64) -> ParametersConfig {
    ParametersConfig {
        dt,
        G: 6.6743e-11,
        c: C,
        correction_scale: 1.0,
        reference_body: 0,
    }
}

fn config(bodies: Vec<BodyConfig>, dt: f64) -> ScenarioConfig {
    ScenarioConfig {
        engine: EngineConfig::default(),
        parameters: params(dt),
        bodies,
        corrected_pairs: Vec::new(),
    }
}

/// Sun at rest plus Earth at aphelion-ish distance, hourly steps
fn sun_earth_config() -> ScenarioConfig {
    let mut cfg = config(
        vec![
            body([0.0; 3], [0.0; 3], 1.989e30),
            body([1.471e11, 0.0, 0.0], [0.0, 3.0e4, 0.0], 5.9722e24),
        ],
        3600.0,
    );
    cfg.parameters.G = 6.674e-11;
    cfg
}

/// Sun, Mercury and Earth with the Sun-Mercury pair eligible for correction
fn sun_mercury_earth_config(correction: CorrectionMode) -> ScenarioConfig {
    let mut cfg = config(
        vec![
            body([0.0; 3], [0.0; 3], 1.989e30),
            body([4.579e10, 0.0, 1.05e10], [0.0, 5.897e4, 0.0], 0.330e24),
            body([1.4709807e11, 0.0, 0.0], [0.0, 3.029e4, 0.0], 5.9722e24),
        ],
        1000.0,
    );
    cfg.engine.correction = correction;
    cfg.parameters.correction_scale = 1.0e4;
    cfg.corrected_pairs = vec![[0, 1]];
    cfg
}

fn scenario_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios")
}

// ==================================================================================
// Configuration
// ==================================================================================

#[test]
fn empty_body_set_is_rejected() {
    let err = Scenario::initialize(config(Vec::new(), 1.0)).err().unwrap();
    assert!(matches!(err, ConfigError::EmptyBodySet));
}

#[test]
fn non_positive_mass_is_rejected() {
    for m in [0.0, -1.0, f64::NAN] {
        let mut cfg = sun_earth_config();
        cfg.bodies[1].m = m;
        let err = Scenario::initialize(cfg).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidMass { index: 1, .. }), "mass {m}: {err:?}");
    }
}

#[test]
fn bad_time_step_is_rejected() {
    for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let mut cfg = sun_earth_config();
        cfg.parameters.dt = dt;
        let err = Scenario::initialize(cfg).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidTimeStep(_)), "dt {dt}: {err:?}");
    }
}

#[test]
fn bad_constants_are_rejected() {
    let mut cfg = sun_earth_config();
    cfg.parameters.c = 0.0;
    assert!(matches!(Scenario::initialize(cfg).err().unwrap(), ConfigError::InvalidSpeedOfLight(_)));

    let mut cfg = sun_earth_config();
    cfg.parameters.G = -6.6743e-11;
    assert!(matches!(
        Scenario::initialize(cfg).err().unwrap(),
        ConfigError::InvalidGravitationalConstant(_)
    ));

    let mut cfg = sun_earth_config();
    cfg.parameters.correction_scale = f64::INFINITY;
    assert!(matches!(Scenario::initialize(cfg).err().unwrap(), ConfigError::InvalidCorrectionScale(_)));
}

#[test]
fn reference_body_must_exist() {
    let mut cfg = sun_earth_config();
    cfg.parameters.reference_body = 2;
    let err = Scenario::initialize(cfg).err().unwrap();
    assert!(matches!(err, ConfigError::ReferenceBodyOutOfRange { index: 2, count: 2 }));
}

#[test]
fn non_finite_state_is_rejected() {
    let mut cfg = sun_earth_config();
    cfg.bodies[1].x[2] = f64::NAN;
    let err = Scenario::initialize(cfg).err().unwrap();
    assert!(matches!(err, ConfigError::NonFinite { index: 1, field: "position" }));

    let mut cfg = sun_earth_config();
    cfg.bodies[0].v[0] = f64::NEG_INFINITY;
    let err = Scenario::initialize(cfg).err().unwrap();
    assert!(matches!(err, ConfigError::NonFinite { index: 0, field: "velocity" }));
}

#[test]
fn corrected_pairs_must_be_distinct_and_in_range() {
    for pair in [[1, 1], [0, 2], [5, 0]] {
        let mut cfg = sun_earth_config();
        cfg.engine.correction = CorrectionMode::PostNewtonian;
        cfg.corrected_pairs = vec![pair];
        let err = Scenario::initialize(cfg).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidPair { count: 2, .. }), "pair {pair:?}: {err:?}");
    }
}

#[test]
fn periapsis_monitor_is_validated() {
    let mut cfg = sun_earth_config();
    cfg.bodies[1].periapsis = Some(PeriapsisConfig {
        reference_speed: 3.0e4,
        error_margin: 0.0,
        min_step_gap: 10,
    });
    let err = Scenario::initialize(cfg).err().unwrap();
    assert!(matches!(err, ConfigError::InvalidPeriapsisMonitor { index: 1, .. }));

    let mut cfg = sun_earth_config();
    cfg.bodies[1].periapsis = Some(PeriapsisConfig {
        reference_speed: -1.0,
        error_margin: 5.0,
        min_step_gap: 10,
    });
    let err = Scenario::initialize(cfg).err().unwrap();
    assert!(matches!(err, ConfigError::InvalidPeriapsisMonitor { index: 1, .. }));
}

#[test]
fn yaml_defaults_are_filled_in() {
    let yaml = r#"
parameters:
  dt: 60.0
bodies:
  - x: [0.0, 0.0, 0.0]
    v: [0.0, 0.0, 0.0]
    m: 1.0e20
"#;
    let cfg = ScenarioConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(cfg.engine.correction, CorrectionMode::Newtonian);
    assert!(!cfg.engine.parallel);
    assert_eq!(cfg.parameters.G, 6.6743e-11);
    assert_eq!(cfg.parameters.c, C);
    assert_eq!(cfg.parameters.correction_scale, 1.0);
    assert_eq!(cfg.parameters.reference_body, 0);
    assert!(cfg.corrected_pairs.is_empty());
    assert!(cfg.bodies[0].name.is_none());
    assert!(cfg.bodies[0].periapsis.is_none());

    let scenario = Scenario::initialize(cfg).unwrap();
    assert_eq!(scenario.label(0), Some("body0"));
    assert!(scenario.monitors().is_empty());
}

#[test]
fn yaml_reads_monitor_and_pairs() {
    let yaml = r#"
engine:
  correction: post_newtonian
  parallel: true
parameters:
  dt: 1000.0
  correction_scale: 1.0e4
bodies:
  - name: sun
    x: [0.0, 0.0, 0.0]
    v: [0.0, 0.0, 0.0]
    m: 1.989e30
  - name: mercury
    x: [4.579e10, 0.0, 1.05e10]
    v: [0.0, 5.897e4, 0.0]
    m: 0.330e24
    periapsis:
      reference_speed: 5.897e4
      error_margin: 1.0
      min_step_gap: 1000
corrected_pairs:
  - [0, 1]
"#;
    let scenario = Scenario::initialize(ScenarioConfig::from_yaml_str(yaml).unwrap()).unwrap();
    assert_eq!(scenario.engine().correction, CorrectionMode::PostNewtonian);
    assert!(scenario.engine().parallel);
    assert_eq!(scenario.parameters().correction_scale, 1.0e4);
    assert_eq!(scenario.label(1), Some("mercury"));

    let monitors = scenario.monitors();
    assert_eq!(monitors.len(), 1);
    assert_eq!(monitors[0].body, 1);
    assert_eq!(monitors[0].min_step_gap, 1000);
}

#[test]
fn malformed_yaml_is_a_config_error() {
    let bad_mode = r#"
engine:
  correction: relativistic
parameters:
  dt: 1.0
bodies: []
"#;
    assert!(matches!(ScenarioConfig::from_yaml_str(bad_mode), Err(ConfigError::Yaml(_))));

    let short_vector = r#"
parameters:
  dt: 1.0
bodies:
  - x: [0.0, 0.0]
    v: [0.0, 0.0, 0.0]
    m: 1.0
"#;
    assert!(matches!(ScenarioConfig::from_yaml_str(short_vector), Err(ConfigError::Yaml(_))));

    let missing_dt = r#"
parameters:
  G: 1.0
bodies: []
"#;
    assert!(matches!(ScenarioConfig::from_yaml_str(missing_dt), Err(ConfigError::Yaml(_))));
}

#[test]
fn missing_file_is_io_error() {
    let err = ScenarioConfig::from_path(scenario_dir().join("does_not_exist.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn shipped_scenarios_load_and_step() {
    let mut seen = 0;
    for entry in fs::read_dir(scenario_dir()).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        let cfg = ScenarioConfig::from_path(&path).unwrap();
        let mut scenario = Scenario::initialize(cfg).unwrap();
        scenario.run(10).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
        assert_eq!(scenario.steps(), 10);
        seen += 1;
    }
    assert!(seen >= 4, "expected the bundled scenarios, found {seen}");
}

// ==================================================================================
// Stepping and queries
// ==================================================================================

#[test]
fn earth_stays_on_orbit_for_a_year() {
    let mut scenario = Scenario::initialize(sun_earth_config()).unwrap();
    scenario.run(8760).unwrap();

    assert_eq!(scenario.steps(), 8760);
    assert_relative_eq!(scenario.time(), 8760.0 * 3600.0, max_relative = 1e-12);

    let sun = scenario.position(0).unwrap();
    let earth = scenario.position(1).unwrap();
    assert_relative_eq!((earth - sun).norm(), 1.471e11, max_relative = 1e-2);
}

#[test]
fn queries_are_pure_and_bounded() {
    let mut scenario = Scenario::initialize(sun_earth_config()).unwrap();
    scenario.run(3).unwrap();

    assert_eq!(scenario.position(1), scenario.position(1));
    assert_eq!(scenario.proper_time(1), scenario.proper_time(1));
    assert_eq!(scenario.steps(), 3);

    assert_eq!(scenario.position(2), None);
    assert_eq!(scenario.velocity(2), None);
    assert_eq!(scenario.proper_time(2), None);
    assert_eq!(scenario.proper_time_offset(2), None);
    assert_eq!(scenario.dilated_position(2), None);
    assert_eq!(scenario.periapsis_count(2), None);
    assert_eq!(scenario.last_periapsis_angle(2), None);
    assert_eq!(scenario.label(2), None);

    // Unmonitored body that never had a periapsis
    assert_eq!(scenario.periapsis_count(1), Some(0));
    assert_eq!(scenario.last_periapsis_angle(1), None);
}

#[test]
fn coincident_bodies_halt_without_committing() {
    let cfg = config(
        vec![
            body([0.0; 3], [0.0; 3], 1.0e24),
            body([1.0e9, 0.0, 0.0], [0.0; 3], 1.0e24),
            body([1.0e9, 0.0, 0.0], [0.0, 10.0, 0.0], 1.0e24),
        ],
        60.0,
    );
    let mut scenario = Scenario::initialize(cfg).unwrap();
    let before = scenario.system().clone();

    let err = scenario.step().unwrap_err();
    assert!(matches!(err, SimError::Domain(DomainError::CoincidentBodies { i: 1, j: 2 })));
    assert_eq!(scenario.halted(), Some(&DomainError::CoincidentBodies { i: 1, j: 2 }));
    assert_eq!(scenario.time(), 0.0);
    assert_eq!(scenario.steps(), 0);
    for (a, b) in before.bodies.iter().zip(&scenario.system().bodies) {
        assert_eq!(a.x, b.x);
        assert_eq!(a.v, b.v);
        assert_eq!(a.proper_time, b.proper_time);
    }

    let err = scenario.step().unwrap_err();
    assert!(matches!(err, SimError::Halted(DomainError::CoincidentBodies { .. })));
    assert!(scenario.run(5).is_err());

    scenario.reset();
    assert!(scenario.halted().is_none());
    let err = scenario.step().unwrap_err();
    assert!(matches!(err, SimError::Domain(_)));
}

#[test]
fn superluminal_body_halts_atomically() {
    let cfg = config(
        vec![
            body([0.0; 3], [0.0; 3], 1.0),
            body([1.0e6, 0.0, 0.0], [0.0, 2.0 * C, 0.0], 1.0),
        ],
        1.0,
    );
    let mut scenario = Scenario::initialize(cfg).unwrap();
    let x0 = scenario.position(1).unwrap();

    let err = scenario.step().unwrap_err();
    assert!(matches!(err, SimError::Domain(DomainError::Superluminal { index: 1, .. })));
    assert_eq!(scenario.position(1), Some(x0));
    assert_eq!(scenario.proper_time(1), Some(0.0));
    assert_eq!(scenario.dilated_position(1), Some(x0));
    assert_eq!(scenario.time(), 0.0);

    // A new dt lifts the halt but the body is still too fast
    scenario.set_time_step(0.5).unwrap();
    let err = scenario.step().unwrap_err();
    assert!(matches!(err, SimError::Domain(DomainError::Superluminal { index: 1, .. })));
}

#[test]
fn time_step_can_change_between_steps() {
    let mut scenario = Scenario::initialize(sun_earth_config()).unwrap();
    scenario.run(2).unwrap();
    scenario.set_time_step(1800.0).unwrap();
    scenario.step().unwrap();

    assert_eq!(scenario.parameters().dt, 1800.0);
    assert_relative_eq!(scenario.time(), 2.0 * 3600.0 + 1800.0, max_relative = 1e-15);

    for dt in [0.0, -5.0, f64::NAN] {
        let err = scenario.set_time_step(dt).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeStep(_)));
    }
    assert_eq!(scenario.parameters().dt, 1800.0);
}

#[test]
fn reset_restores_initial_bodies() {
    let mut scenario = Scenario::initialize(sun_earth_config()).unwrap();
    let x0 = scenario.position(1).unwrap();
    scenario.run(100).unwrap();
    assert_ne!(scenario.position(1), Some(x0));

    scenario.reset();
    assert_eq!(scenario.position(1), Some(x0));
    assert_eq!(scenario.proper_time(1), Some(0.0));
    assert_eq!(scenario.time(), 0.0);
    assert_eq!(scenario.steps(), 0);
}

// ==================================================================================
// Periapsis telemetry
// ==================================================================================

#[test]
fn periapsis_events_reach_channel_sink() {
    let mut cfg = sun_earth_config();
    cfg.bodies[1].periapsis = Some(PeriapsisConfig {
        reference_speed: 3.0e4,
        error_margin: 5.0,
        min_step_gap: 2000,
    });

    let (tx, rx) = mpsc::channel::<PeriapsisEvent>();
    let mut scenario = Scenario::initialize(cfg).unwrap().with_sink(tx);
    scenario.run(8760).unwrap();

    let events: Vec<PeriapsisEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 1, "events: {events:?}");

    let event = &events[0];
    assert_eq!(event.body, 1);
    assert_eq!(event.count, 1);
    assert!(event.position.x > 0.0);
    assert!(event.t > 2000.0 * 3600.0);
    assert_eq!(scenario.periapsis_count(1), Some(1));
    assert_eq!(scenario.last_periapsis_angle(1), Some(event.angle));
}

// ==================================================================================
// Correction modes
// ==================================================================================

#[test]
fn post_newtonian_pairs_diverge_from_newtonian() {
    let mut newtonian = Scenario::initialize(sun_mercury_earth_config(CorrectionMode::Newtonian)).unwrap();
    let mut corrected = Scenario::initialize(sun_mercury_earth_config(CorrectionMode::PostNewtonian)).unwrap();
    newtonian.run(1000).unwrap();
    corrected.run(1000).unwrap();

    let dx_mercury = (newtonian.position(1).unwrap() - corrected.position(1).unwrap()).norm();
    assert!(dx_mercury > 1.0, "correction had no visible effect: {dx_mercury} m");
}

#[test]
fn newtonian_mode_ignores_corrected_pairs() {
    let with_pairs = sun_mercury_earth_config(CorrectionMode::Newtonian);
    let mut without_pairs = with_pairs.clone();
    without_pairs.corrected_pairs.clear();

    let mut a = Scenario::initialize(with_pairs).unwrap();
    let mut b = Scenario::initialize(without_pairs).unwrap();
    a.run(200).unwrap();
    b.run(200).unwrap();

    for i in 0..3 {
        assert_eq!(a.position(i), b.position(i));
        assert_eq!(a.velocity(i), b.velocity(i));
    }
}

#[test]
fn parallel_engine_tracks_serial() {
    let serial_cfg = sun_mercury_earth_config(CorrectionMode::PostNewtonian);
    let mut parallel_cfg = serial_cfg.clone();
    parallel_cfg.engine.parallel = true;

    let mut serial = Scenario::initialize(serial_cfg).unwrap();
    let mut parallel = Scenario::initialize(parallel_cfg).unwrap();
    serial.run(500).unwrap();
    parallel.run(500).unwrap();

    for i in 0..3 {
        let a = serial.position(i).unwrap();
        let b = parallel.position(i).unwrap();
        assert!((a - b).norm() <= 1e-9 * a.norm().max(1.0), "body {i}: {a:?} vs {b:?}");
    }
}

// ==================================================================================
// Proper time through the scenario
// ==================================================================================

#[test]
fn reference_body_keeps_coordinate_time() {
    let mut scenario = Scenario::initialize(sun_mercury_earth_config(CorrectionMode::Newtonian)).unwrap();
    scenario.run(250).unwrap();

    assert_eq!(scenario.proper_time(0), Some(scenario.time()));
    assert_eq!(scenario.proper_time_offset(0), Some(0.0));
    assert_eq!(scenario.dilated_position(0), scenario.position(0));
}

#[test]
fn body_starting_at_rest_gets_full_step_of_proper_time() {
    let cfg = config(
        vec![
            body([0.0; 3], [0.0; 3], 1.989e30),
            body([1.0e9, 0.0, 0.0], [0.0; 3], 1.0e24),
        ],
        3600.0,
    );
    let mut scenario = Scenario::initialize(cfg).unwrap();
    scenario.step().unwrap();

    // falling toward the sun by the end of the step, but at rest at its start
    assert!(scenario.velocity(1).unwrap().norm() > 0.0);
    assert_eq!(scenario.proper_time(1), Some(3600.0));
    assert_eq!(scenario.dilated_position(1), scenario.position(1));
}

#[test]
fn moving_bodies_fall_behind() {
    let mut scenario = Scenario::initialize(sun_mercury_earth_config(CorrectionMode::Newtonian)).unwrap();
    scenario.run(250).unwrap();

    let mercury_offset = scenario.proper_time_offset(1).unwrap();
    let earth_offset = scenario.proper_time_offset(2).unwrap();
    assert!(mercury_offset < 0.0);
    assert!(earth_offset < 0.0);
    // Mercury moves faster, so its clock lags more
    assert!(mercury_offset < earth_offset);

    assert_ne!(scenario.dilated_position(1), scenario.position(1));
}

#[test]
fn dilated_positions_do_not_feed_back() {
    let cfg = sun_mercury_earth_config(CorrectionMode::Newtonian);
    let g = cfg.parameters.G;
    let dt = cfg.parameters.dt;

    let mut sys = System::new(
        cfg.bodies
            .iter()
            .enumerate()
            .map(|(i, b)| Body::new(i, b.m, NVec3::from(b.x), NVec3::from(b.v)))
            .collect(),
    );
    let forces = AccelSet::new().with(PairwiseGravity::newtonian(g));

    let mut scenario = Scenario::initialize(cfg).unwrap();
    for _ in 0..300 {
        scenario.step().unwrap();
        verlet_integrator(&mut sys, &forces, dt).unwrap();
    }

    for (i, b) in sys.bodies.iter().enumerate() {
        assert_eq!(scenario.position(i), Some(b.x));
        assert_eq!(scenario.velocity(i), Some(b.v));
    }
}
