use std::time::Instant;

use crate::error::DomainError;
use crate::simulation::forces::{AccelSet, Acceleration, PairwiseGravity};
use crate::simulation::integrator::verlet_integrator;
use crate::simulation::states::{Body, NVec3, System};

const BENCH_G: f64 = 0.1;

/// Helper to build a deterministic System of size `n` (no rand needed)
fn make_system(n: usize) -> System {
    let bodies = (0..n)
        .map(|i| {
            let i_f = i as f64;
            let x = NVec3::new(
                (i_f * 0.37).sin() * 5.0 + i_f * 1e-3,
                (i_f * 0.13).cos() * 5.0,
                (i_f * 0.07).sin() * 5.0,
            );
            Body::new(i, 1.0, x, NVec3::zeros())
        })
        .collect();

    System::new(bodies)
}

/// Time one force evaluation, serial vs. partitioned across rayon workers
pub fn bench_gravity() -> Result<(), DomainError> {
    let ns = [200, 400, 800, 1600, 3200];

    for n in ns {
        let sys = make_system(n);
        let mut out = vec![NVec3::zeros(); n];

        let serial = PairwiseGravity::newtonian(BENCH_G);
        let parallel = PairwiseGravity::newtonian(BENCH_G).parallel(true);

        // Warm up
        serial.acceleration(&sys, &mut out)?;
        parallel.acceleration(&sys, &mut out)?;

        let t0 = Instant::now();
        out.fill(NVec3::zeros());
        serial.acceleration(&sys, &mut out)?;
        let dt_serial = t0.elapsed().as_secs_f64();

        let t1 = Instant::now();
        out.fill(NVec3::zeros());
        parallel.acceleration(&sys, &mut out)?;
        let dt_parallel = t1.elapsed().as_secs_f64();

        println!("N = {n:5}, serial = {:8.6} s, parallel = {:8.6} s", dt_serial, dt_parallel);
    }
    Ok(())
}

/// Time full velocity-Verlet steps for a range of n
/// Output is CSV so it can be pasted straight into a spreadsheet
pub fn bench_verlet() -> Result<(), DomainError> {
    let steps = 3;
    let dt = 1e-3;

    println!("N,serial_ms,parallel_ms");

    for n in (200..=2000).step_by(200) {
        let template = make_system(n);

        let serial = AccelSet::new().with(PairwiseGravity::newtonian(BENCH_G));
        let parallel = AccelSet::new().with(PairwiseGravity::newtonian(BENCH_G).parallel(true));

        let mut sys_serial = template.clone();
        let t0 = Instant::now();
        for _ in 0..steps {
            verlet_integrator(&mut sys_serial, &serial, dt)?;
        }
        let ms_serial = t0.elapsed().as_secs_f64() * 1000.0 / steps as f64;

        let mut sys_parallel = template.clone();
        let t1 = Instant::now();
        for _ in 0..steps {
            verlet_integrator(&mut sys_parallel, &parallel, dt)?;
        }
        let ms_parallel = t1.elapsed().as_secs_f64() * 1000.0 / steps as f64;

        println!("{},{:.6},{:.6}", n, ms_serial, ms_parallel);
    }
    Ok(())
}
