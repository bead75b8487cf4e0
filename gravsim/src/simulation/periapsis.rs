//! Heuristic periapsis (closest approach) detection.
//!
//! A monitored body is at periapsis when its speed comes within
//! `error_margin` of the configured periapsis speed. The step gap acts as
//! hysteresis: after a detection the body must go more than `min_step_gap`
//! steps before it can fire again, so a speed hovering around the threshold
//! over adjacent steps counts once.

use std::sync::mpsc::Sender;

use super::states::{Body, NVec3, System};

#[derive(Debug, Clone)]
pub struct PeriapsisMonitor {
    pub body: usize,
    pub reference_speed: f64, // m/s
    pub error_margin: f64, // m/s
    pub min_step_gap: u64,
}

impl PeriapsisMonitor {
    /// Check one body after a step, updating its counters
    pub fn observe(&self, body: &mut Body, t: f64) -> Option<PeriapsisEvent> {
        let speed = body.speed();
        let near = (self.reference_speed - speed).abs() < self.error_margin;

        if near && body.steps_since_periapsis > self.min_step_gap {
            let angle = body.x.y.atan2(body.x.x);
            body.periapsis_count += 1;
            body.last_periapsis_angle = Some(angle);
            body.steps_since_periapsis = 0;

            Some(PeriapsisEvent {
                body: body.index,
                count: body.periapsis_count,
                angle,
                position: body.x,
                t,
            })
        } else {
            body.steps_since_periapsis += 1;
            None
        }
    }
}

/// One closest-approach observation
#[derive(Debug, Clone, PartialEq)]
pub struct PeriapsisEvent {
    pub body: usize,
    pub count: u64,
    pub angle: f64, // atan2(y, x), radians
    pub position: NVec3,
    pub t: f64, // coordinate time of the detection
}

/// Runs every configured monitor over a freshly stepped system
#[derive(Debug, Clone, Default)]
pub struct PeriapsisDetector {
    monitors: Vec<PeriapsisMonitor>,
}

impl PeriapsisDetector {
    pub fn new(monitors: Vec<PeriapsisMonitor>) -> Self {
        Self { monitors }
    }

    pub fn monitors(&self) -> &[PeriapsisMonitor] {
        &self.monitors
    }

    /// Monitors pointing past the end of `sys.bodies` are skipped
    pub fn check(&self, sys: &mut System) -> Vec<PeriapsisEvent> {
        let t = sys.t;
        self.monitors
            .iter()
            .filter_map(|m| sys.bodies.get_mut(m.body).and_then(|b| m.observe(b, t)))
            .collect()
    }
}

/// Consumer of periapsis events. Delivery is fire-and-forget.
pub trait PeriapsisSink {
    fn observe(&mut self, event: &PeriapsisEvent);
}

/// Writes each event to the `log` facade at info level
#[derive(Debug, Default)]
pub struct LogSink;

impl PeriapsisSink for LogSink {
    fn observe(&mut self, event: &PeriapsisEvent) {
        log::info!(
            "periapsis body={} count={} angle={:.6} rad ({:.4} deg) t={:.3e} s pos=[{:.6e}, {:.6e}, {:.6e}]",
            event.body,
            event.count,
            event.angle,
            event.angle.to_degrees(),
            event.t,
            event.position.x,
            event.position.y,
            event.position.z,
        );
    }
}

/// Forwards events over a channel; a disconnected receiver is ignored
impl PeriapsisSink for Sender<PeriapsisEvent> {
    fn observe(&mut self, event: &PeriapsisEvent) {
        let _ = self.send(event.clone());
    }
}
