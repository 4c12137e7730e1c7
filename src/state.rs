//! State of the navigational data.
use chrono::{Duration, NaiveDateTime};

use crate::config::{ClockMode, Config};
use crate::types::*;
use crate::units::*;

/// A value together with its unit and the time it was last set.
///
/// A reading is only meaningful between the sentence that set it and either a
/// contradicting sentence or the device timeout. [`Reading::get`] returns
/// `None` outside of that window, so callers never see a stale value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading<U> {
    value: f64,
    /// Unit the value was converted into on ingestion
    pub unit: U,
    /// Time of the last update
    pub updated: Option<Timestamp>,
    valid: bool,
}

impl<U: Copy> Reading<U> {
    pub fn set(&mut self, value: f64, unit: U, now: Timestamp) {
        self.value = value;
        self.unit = unit;
        self.updated = Some(now);
        self.valid = true;
    }

    /// Adds `delta` to the current value, starting from zero when invalid
    pub fn accumulate(&mut self, delta: f64, unit: U, now: Timestamp) {
        let base = self.get().unwrap_or(0.0);
        self.set(base + delta, unit, now);
    }

    pub fn get(&self) -> Option<f64> {
        if self.valid {
            Some(self.value)
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn invalidate(&mut self) {
        self.value = 0.0;
        self.valid = false;
    }

    /// True when the reading is valid but was last set more than `timeout` before `now`
    pub fn is_stale(&self, now: Timestamp, timeout: Duration) -> bool {
        match self.updated {
            Some(t) if self.valid => now - t > timeout,
            _ => false,
        }
    }
}

/// Latest accepted GPS position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionFix {
    position: Position,
    pub updated: Option<Timestamp>,
    valid: bool,
}

impl PositionFix {
    pub fn set(&mut self, position: Position, now: Timestamp) {
        self.position = position;
        self.updated = Some(now);
        self.valid = true;
    }

    pub fn get(&self) -> Option<Position> {
        if self.valid {
            Some(self.position)
        } else {
            None
        }
    }

    pub fn invalidate(&mut self) {
        self.position = Position::default();
        self.valid = false;
    }

    pub fn is_stale(&self, now: Timestamp, timeout: Duration) -> bool {
        match self.updated {
            Some(t) if self.valid => now - t > timeout,
            _ => false,
        }
    }
}

/// Running statistics of a wind speed since the device came up
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub samples: u32,
}

impl WindStats {
    pub fn add(&mut self, speed: f64) {
        if self.samples == 0 {
            self.min = speed;
            self.max = speed;
            self.avg = speed;
        } else {
            self.min = self.min.min(speed);
            self.max = self.max.max(speed);
            self.avg += (speed - self.avg) / f64::from(self.samples + 1);
        }
        self.samples += 1;
    }
}

/// Angle and speed of either the true or the apparent wind
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wind {
    pub angle: Reading<Bearing>,
    pub speed: Reading<SpeedUnit>,
    pub stats: WindStats,
}

impl Wind {
    pub fn set(&mut self, angle: f64, reference: Bearing, speed: f64, unit: SpeedUnit, now: Timestamp) {
        self.angle.set(angle, reference, now);
        self.speed.set(speed, unit, now);
        self.stats.add(speed);
    }

    pub fn invalidate(&mut self) {
        self.angle.invalidate();
        self.speed.invalidate();
        self.stats = WindStats::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Winds {
    pub true_wind: Wind,
    pub apparent: Wind,
}

/// Where an RPM value was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RpmSource {
    #[default]
    Engine,
    Shaft,
}

/// Run state of an engine or the generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engine {
    pub running: bool,
    pub source: RpmSource,
    pub rpm: Reading<Unitless>,
    pub shaft_rpm: Reading<Unitless>,
    /// Set when the engine was seen starting
    pub on_since: Option<Timestamp>,
    /// Run time of the current or last run, materialized on transitions and flushes only
    pub elapsed: Duration,
    /// Sum of all completed runs in this session
    pub total: Duration,
}

impl Default for Engine {
    fn default() -> Self {
        Engine {
            running: false,
            source: RpmSource::default(),
            rpm: Reading::default(),
            shaft_rpm: Reading::default(),
            on_since: None,
            elapsed: Duration::zero(),
            total: Duration::zero(),
        }
    }
}

impl Engine {
    /// Marks the engine as started; returns false if it was already running
    pub fn start(&mut self, now: Timestamp) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.on_since = Some(now);
        self.elapsed = Duration::zero();
        true
    }

    /// Marks the engine as stopped and returns the run time of this run
    pub fn stop(&mut self, now: Timestamp) -> Option<Duration> {
        if !self.running {
            return None;
        }
        self.running = false;
        if let Some(on) = self.on_since.take() {
            self.elapsed = now - on;
            self.total = self.total + self.elapsed;
        }
        Some(self.elapsed)
    }

    /// Materializes the run time of a running engine
    pub fn flush(&mut self, now: Timestamp) {
        if let (true, Some(on)) = (self.running, self.on_since) {
            self.elapsed = now - on;
        }
    }
}

/// Keeps the latest values of the navigational and environmental data.
///
/// Values are stored in the display units of the [`Config`] that was active when
/// they were ingested.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavState {
    /// UTC date and time from the last RMC or ZDA sentence
    pub utc: Option<Timestamp>,
    /// When `utc` was received; the GPS clock expires like any other reading
    pub utc_updated: Option<Timestamp>,
    pub position: PositionFix,
    /// Course over ground
    pub course_over_ground: Reading<Bearing>,
    /// Heading, i.e., course over water
    pub heading: Reading<Bearing>,
    /// Speed over ground
    pub speed_over_ground: Reading<SpeedUnit>,
    /// Speed through water
    pub speed_through_water: Reading<SpeedUnit>,
    pub wind: Winds,
    pub depth: Reading<DepthUnit>,
    pub water_temperature: Reading<TemperatureUnit>,
    pub air_temperature: Reading<TemperatureUnit>,
    pub pressure: Reading<Millibar>,
    /// Relative humidity in percent
    pub humidity: Reading<Unitless>,
    /// Volume accumulated from XDR volume transducers
    pub fuel_volume: Reading<VolumeUnit>,
    pub engines: [Engine; 2],
    pub generator: Engine,
    /// Last time any RPM sentence was accepted
    pub rpm_updated: Option<Timestamp>,
}

impl NavState {
    /// Create new empty NavState
    pub fn new() -> NavState {
        NavState { ..Default::default() }
    }

    /// Stores the GPS date and time received at `now`
    pub fn set_utc(&mut self, utc: Timestamp, now: Timestamp) {
        self.utc = Some(utc);
        self.utc_updated = Some(now);
    }

    /// Drops the GPS clock, local times fall back to the host clock
    pub fn invalidate_utc(&mut self) {
        self.utc = None;
        self.utc_updated = None;
    }

    pub fn has_fix(&self) -> bool {
        self.position.get().is_some()
    }

    /// Local date and time according to the configured clock.
    ///
    /// GPS time is preferred; `now` is used until a date sentence has been seen.
    pub fn local_time(&self, now: Timestamp, config: &Config) -> NaiveDateTime {
        let utc = self.utc.unwrap_or(now).naive_utc();
        let hours = match config.clock {
            ClockMode::Utc => 0,
            ClockMode::Offset(h) => h,
            ClockMode::FromLongitude => self
                .position
                .get()
                .map(|p| (p.signed_lon() / 15.0).trunc() as i32)
                .unwrap_or(0),
        };
        utc + Duration::hours(i64::from(hours))
    }

    /// Materializes the elapsed run time of all running engines
    pub fn flush_engine_time(&mut self, now: Timestamp) {
        for engine in self.engines.iter_mut() {
            engine.flush(now);
        }
        self.generator.flush(now);
    }
}
