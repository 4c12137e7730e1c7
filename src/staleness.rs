//! Detection of silent devices.
use chrono::Duration;
use tracing::{debug, info};

use crate::decoder::{EngineId, Event};
use crate::state::{NavState, Reading, Wind};
use crate::types::Timestamp;

/// Clears readings whose device has been silent for longer than `timeout`
#[derive(Debug, Clone, Copy)]
pub struct StalenessMonitor {
    pub timeout: Duration,
}

fn expire<U: Copy>(reading: &mut Reading<U>, name: &str, now: Timestamp, timeout: Duration) {
    if reading.is_stale(now, timeout) {
        debug!("{} timed out", name);
        reading.invalidate();
    }
}

fn expire_wind(wind: &mut Wind, name: &str, now: Timestamp, timeout: Duration) {
    if wind.speed.is_stale(now, timeout) || wind.angle.is_stale(now, timeout) {
        debug!("{} timed out", name);
        wind.invalidate();
    }
}

impl StalenessMonitor {
    pub fn new(timeout: Duration) -> Self {
        StalenessMonitor { timeout }
    }

    /// Invalidates every stale reading of `s`.
    ///
    /// The fuel volume accumulator never expires. When the RPM talker falls
    /// silent every running engine is stopped and reported.
    pub fn sweep(&self, s: &mut NavState, now: Timestamp) -> Vec<Event> {
        let t = self.timeout;
        if s.position.is_stale(now, t) {
            debug!("position timed out");
            s.position.invalidate();
        }
        if s.utc_updated.map_or(false, |u| now - u > t) {
            debug!("GPS clock timed out");
            s.invalidate_utc();
        }
        expire(&mut s.course_over_ground, "course over ground", now, t);
        expire(&mut s.heading, "heading", now, t);
        expire(&mut s.speed_over_ground, "speed over ground", now, t);
        expire(&mut s.speed_through_water, "speed through water", now, t);
        expire_wind(&mut s.wind.true_wind, "true wind", now, t);
        expire_wind(&mut s.wind.apparent, "apparent wind", now, t);
        expire(&mut s.depth, "depth", now, t);
        expire(&mut s.water_temperature, "water temperature", now, t);
        expire(&mut s.air_temperature, "air temperature", now, t);
        expire(&mut s.pressure, "pressure", now, t);
        expire(&mut s.humidity, "humidity", now, t);

        let mut events = Vec::new();
        match s.rpm_updated {
            Some(last) if now - last > t => {
                s.rpm_updated = None;
                let ids = [EngineId::Engine(0), EngineId::Engine(1), EngineId::Generator];
                for id in ids {
                    let engine = id.engine(s);
                    engine.rpm.invalidate();
                    engine.shaft_rpm.invalidate();
                    if let Some(elapsed) = engine.stop(now) {
                        info!("{:?} stopped, no RPM data for {} s", id, t.num_seconds());
                        events.push(Event::EngineStopped { engine: id, elapsed });
                    }
                }
            }
            _ => {}
        }
        events
    }
}
