//! Force / acceleration contributors for the engine
//!
//! Defines the acceleration-term trait, direct pairwise gravity, and the
//! per-pair correction policies (Newtonian and the simplified
//! post-Newtonian factor)

use std::collections::HashSet;

use rayon::prelude::*;

use crate::error::DomainError;
use crate::simulation::states::{Body, NVec3, System};

/// Collection of acceleration terms
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per body
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self {
            terms: Vec::new()
        }
    }

    /// Add an acceleration term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Acceleration + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total accelerations for all bodies in `sys`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, sys: &System, out: &mut [NVec3]) -> Result<(), DomainError> {
        // Zero buffer
        for a in out.iter_mut() {
            *a = NVec3::zeros();
        }
        for term in &self.terms {
            term.acceleration(sys, out)?;
        }
        Ok(())
    }

    /// Fresh acceleration vector per body, same order as `sys.bodies`
    pub fn compute_accelerations(&self, sys: &System) -> Result<Vec<NVec3>, DomainError> {
        let mut out = vec![NVec3::zeros(); sys.len()];
        self.accumulate_accels(sys, &mut out)?;
        Ok(out)
    }
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Acceleration source operating on a [`System`]
/// Implementations add their contribution into `out[i]` for each body
pub trait Acceleration {
    fn acceleration(&self, sys: &System, out: &mut [NVec3]) -> Result<(), DomainError>;
}

/// Multiplicative adjustment to the Newtonian force magnitude of one pair
///
/// `r` is the separation magnitude, already checked to be non-zero.
/// Implementations must be symmetric in `bi` and `bj`.
pub trait PairCorrection: Send + Sync {
    fn factor(&self, bi: &Body, bj: &Body, r: f64) -> f64;
}

/// Plain inverse-square gravity
pub struct Newtonian;

impl PairCorrection for Newtonian {
    fn factor(&self, _bi: &Body, _bj: &Body, _r: f64) -> f64 {
        1.0
    }
}

/// Simplified post-Newtonian factor
///
/// ```text
/// 1 + k * ( 4G(mi + mj) / (r c²) - 4G² mi mj / (r³ c²) - (|vi|² + |vj|²) / (2c²) )
/// ```
///
/// This is a demonstration term, not a relativistic metric. `k` only makes
/// the effect visible on short runs (scenarios use values around 1e4) and has
/// no physical derivation.
#[allow(non_snake_case)]
pub struct PostNewtonian {
    pub G: f64,
    pub c: f64,
    pub k: f64,
}

impl PairCorrection for PostNewtonian {
    fn factor(&self, bi: &Body, bj: &Body, r: f64) -> f64 {
        let c2 = self.c * self.c;
        let mass_term = 4.0 * self.G * (bi.m + bj.m) / (r * c2);
        let coupling_term = 4.0 * self.G * self.G * (bi.m * bj.m) / (r * r * r * c2);
        let velocity_term = (bi.v.norm_squared() + bj.v.norm_squared()) / (2.0 * c2);
        1.0 + self.k * (mass_term - coupling_term - velocity_term)
    }
}

/// Direct O(n²) gravity without softening
///
/// Coincident bodies are a [`DomainError`], never a division by zero.
/// Pairs listed in `corrected` have their force scaled by the correction
/// policy; every other pair is Newtonian.
#[allow(non_snake_case)]
pub struct PairwiseGravity {
    pub G: f64, // gravitational constant
    correction: Box<dyn PairCorrection>,
    corrected: HashSet<(usize, usize)>, // stored as (min, max)
    parallel: bool,
}

impl PairwiseGravity {
    #[allow(non_snake_case)]
    pub fn newtonian(G: f64) -> Self {
        Self {
            G,
            correction: Box::new(Newtonian),
            corrected: HashSet::new(),
            parallel: false,
        }
    }

    /// Install a correction policy for the given pairs, in either index order
    pub fn with_correction<C, I>(mut self, correction: C, pairs: I) -> Self
    where
        C: PairCorrection + 'static,
        I: IntoIterator<Item = (usize, usize)>,
    {
        self.correction = Box::new(correction);
        self.corrected = pairs.into_iter().map(|(i, j)| (i.min(j), i.max(j))).collect();
        self
    }

    /// Partition pairs across rayon workers
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn is_corrected(&self, i: usize, j: usize) -> bool {
        self.corrected.contains(&(i.min(j), i.max(j)))
    }

    /// Force on body `i` due to body `j` (points from i toward j)
    pub fn pair_force(&self, sys: &System, i: usize, j: usize) -> Result<NVec3, DomainError> {
        let bi = &sys.bodies[i];
        let bj = &sys.bodies[j];

        // r points from i to j: i is pulled along +r, j along -r
        let r = bj.x - bi.x;
        let r_mag = r.norm();
        if r_mag == 0.0 {
            return Err(DomainError::CoincidentBodies { i: i.min(j), j: i.max(j) });
        }

        // mass product grouped so (i, j) and (j, i) round identically
        let mut f_mag = self.G * (bi.m * bj.m) / (r_mag * r_mag);
        if self.is_corrected(i, j) {
            f_mag *= self.correction.factor(bi, bj, r_mag);
        }

        Ok(f_mag * r / r_mag)
    }

    fn accumulate_serial(&self, sys: &System, out: &mut [NVec3]) -> Result<(), DomainError> {
        let n = sys.len();

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            for j in (i + 1)..n {
                let f = self.pair_force(sys, i, j)?;
                out[i] += f / sys.bodies[i].m;
                out[j] -= f / sys.bodies[j].m;
            }
        }
        Ok(())
    }

    /// Each worker owns a partial buffer over its rows of the pair triangle;
    /// buffers are summed only after every pair has been evaluated
    fn accumulate_parallel(&self, sys: &System, out: &mut [NVec3]) -> Result<(), DomainError> {
        let n = sys.len();

        let summed = (0..n)
            .into_par_iter()
            .try_fold(
                || vec![NVec3::zeros(); n],
                |mut partial, i| {
                    for j in (i + 1)..n {
                        let f = self.pair_force(sys, i, j)?;
                        partial[i] += f / sys.bodies[i].m;
                        partial[j] -= f / sys.bodies[j].m;
                    }
                    Ok::<_, DomainError>(partial)
                },
            )
            .try_reduce(
                || vec![NVec3::zeros(); n],
                |mut lhs, rhs| {
                    for (a, b) in lhs.iter_mut().zip(rhs) {
                        *a += b;
                    }
                    Ok(lhs)
                },
            )?;

        for (o, a) in out.iter_mut().zip(summed) {
            *o += a;
        }
        Ok(())
    }
}

impl Acceleration for PairwiseGravity {
    fn acceleration(&self, sys: &System, out: &mut [NVec3]) -> Result<(), DomainError> {
        if sys.len() < 2 {
            return Ok(());
        }
        if self.parallel {
            self.accumulate_parallel(sys, out)
        } else {
            self.accumulate_serial(sys, out)
        }
    }
}
