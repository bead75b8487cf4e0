use gravsim::{Scenario, ScenarioConfig};
use gravsim::{bench_gravity, bench_verlet};

use anyhow::{Context, Result};
use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gravsim", about = "Headless gravitational scenario runner")]
struct Args {
    /// Scenario file, taken as given or looked up under `scenarios/`
    #[arg(short, long = "file", default_value = "mercury_precession.yaml")]
    file_name: String,

    /// Number of steps to run
    #[arg(short = 'n', long, default_value_t = 100_000)]
    steps: u64,

    /// Log a status line every this many steps (0 disables)
    #[arg(long, default_value_t = 10_000)]
    report_every: u64,

    /// Run the force/integrator benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let given = PathBuf::from(file_name);
    let config_path = if given.exists() {
        given
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };

    ScenarioConfig::from_path(&config_path)
        .with_context(|| format!("failed to load scenario {}", config_path.display()))
}

fn report(scenario: &Scenario) {
    let sys = scenario.system();
    log::info!("t = {:.6e} s after {} steps", sys.t, scenario.steps());
    for b in &sys.bodies {
        let label = scenario.label(b.index).unwrap_or("?");
        let offset = scenario.proper_time_offset(b.index).unwrap_or(0.0);
        let angle = b
            .last_periapsis_angle
            .map(|a| format!("{:.4} deg", a.to_degrees()))
            .unwrap_or_else(|| "-".to_string());
        log::info!(
            "  {label:>22}: |x| = {:.6e} m, |v| = {:.6e} m/s, tau = {:.6e} s (offset {:+.6e} s), periapses = {}, last angle = {angle}",
            b.x.norm(),
            b.speed(),
            b.proper_time,
            offset,
            b.periapsis_count,
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.bench {
        bench_gravity()?;
        bench_verlet()?;
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let mut scenario = Scenario::initialize(scenario_cfg)?;

    let g = scenario.parameters().G;
    let p0 = scenario.system().total_momentum();
    let e0 = scenario.system().total_energy(g);

    for _ in 0..args.steps {
        scenario.step()?;
        if args.report_every > 0 && scenario.steps() % args.report_every == 0 {
            report(&scenario);
        }
    }

    report(&scenario);

    let p1 = scenario.system().total_momentum();
    let e1 = scenario.system().total_energy(g);
    log::info!(
        "momentum drift |dp| = {:.3e} kg m/s, relative energy drift = {:.3e}",
        (p1 - p0).norm(),
        ((e1 - e0) / e0).abs(),
    );

    Ok(())
}
