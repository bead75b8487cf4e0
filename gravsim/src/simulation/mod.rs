pub mod states;
pub mod params;
pub mod engine;
pub mod forces;
pub mod integrator;
pub mod proper_time;
pub mod periapsis;
pub mod diagnostics;
pub mod scenario;
