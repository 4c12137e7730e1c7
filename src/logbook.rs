//! Logbook rows.
//!
//! A [`LogbookRow`] is the text the host appends to its logbook for one
//! [`Trigger`]. Every value is already formatted in the display units it was
//! stored in; readings that were invalid at trigger time stay empty.
use std::fmt;
use std::fmt::Write;

use chrono::Duration;

use crate::config::{Config, PositionFormat};
use crate::decoder::{EngineId, Event};
use crate::state::{Engine, NavState, Reading, Wind};
use crate::trigger::{Cause, Trigger};
use crate::types::*;

/// One row of the logbook
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogbookRow {
    pub date: String,
    pub time: String,
    pub latitude: String,
    pub longitude: String,
    /// Course over ground
    pub cog: String,
    pub heading: String,
    /// Speed over ground
    pub sog: String,
    /// Speed through water
    pub stw: String,
    pub depth: String,
    pub true_wind_angle: String,
    pub true_wind_speed: String,
    /// `min|avg|max` of the true wind speed
    pub true_wind_stats: String,
    pub apparent_wind_angle: String,
    pub apparent_wind_speed: String,
    pub apparent_wind_stats: String,
    pub water_temperature: String,
    pub air_temperature: String,
    pub pressure: String,
    pub humidity: String,
    pub fuel_volume: String,
    pub rpm1: String,
    pub rpm2: String,
    /// Run time of engine 1 as `HH:MM`
    pub engine1_hours: String,
    pub engine2_hours: String,
    pub generator_hours: String,
    pub remarks: String,
}

fn angle(r: &Reading<Bearing>) -> String {
    r.get().map(|v| format!("{:03.0}°", v)).unwrap_or_default()
}

fn value<U: Copy + fmt::Display>(r: &Reading<U>, decimals: usize) -> String {
    r.get()
        .map(|v| format!("{:.*} {}", decimals, v, r.unit))
        .unwrap_or_default()
}

fn plain<U: Copy>(r: &Reading<U>, decimals: usize, suffix: &str) -> String {
    r.get().map(|v| format!("{:.*}{}", decimals, v, suffix)).unwrap_or_default()
}

fn wind_stats(w: &Wind) -> String {
    if w.speed.get().is_none() || w.stats.samples == 0 {
        return String::new();
    }
    format!("{:.1}|{:.1}|{:.1}", w.stats.min, w.stats.avg, w.stats.max)
}

/// `HH:MM`, hours may exceed 24
pub fn hours_minutes(d: Duration) -> String {
    let minutes = d.num_minutes().max(0);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Completed runs plus the run time materialized by the last flush
fn run_hours(e: &Engine) -> String {
    let current = if e.running { e.elapsed } else { Duration::zero() };
    let total = e.total + current;
    if total == Duration::zero() && !e.running {
        String::new()
    } else {
        hours_minutes(total)
    }
}

pub fn coordinate(degrees: f64, lat: bool, format: PositionFormat) -> String {
    let hemisphere = match (lat, degrees < 0.0) {
        (true, false) => 'N',
        (true, true) => 'S',
        (false, false) => 'E',
        (false, true) => 'W',
    };
    let a = degrees.abs();
    match format {
        PositionFormat::DegreesMinutesSeconds => {
            // hundredths of an arc second
            let total = (a * 360_000.0).round() as i64;
            let (d, rest) = (total / 360_000, total % 360_000);
            let (m, cs) = (rest / 6_000, rest % 6_000);
            format!("{:03}° {:02}' {:02}.{:02}\" {}", d, m, cs / 100, cs % 100, hemisphere)
        }
        PositionFormat::DegreesDecimalMinutes => {
            // ten thousandths of an arc minute
            let total = (a * 600_000.0).round() as i64;
            let (d, rest) = (total / 600_000, total % 600_000);
            format!("{:03}° {:02}.{:04}' {}", d, rest / 10_000, rest % 10_000, hemisphere)
        }
    }
}

fn engine_name(id: EngineId, config: &Config) -> String {
    match id {
        EngineId::Engine(i) => format!("{} {}", config.remarks.engine, i + 1),
        EngineId::Generator => "Generator".to_string(),
    }
}

/// Remark text of a trigger, parts separated by `, `
fn remarks(trigger: &Trigger, config: &Config) -> String {
    let texts = &config.remarks;
    let mut parts: Vec<String> = Vec::new();
    for cause in &trigger.causes {
        match cause {
            Cause::CourseChange => parts.push(format!(
                "{} {:.0}°",
                texts.course_change,
                config.course_change_degrees.unwrap_or_default()
            )),
            Cause::GuardChange => parts.push(texts.guard_change.clone()),
            Cause::Waypoint => match &trigger.leg {
                Some(leg) => parts.push(format!("{} {} reached, next {}", texts.waypoint, leg.from, leg.to)),
                None => parts.push(texts.waypoint.clone()),
            },
            Cause::Distance => parts.push(format!(
                "{} {} {}",
                texts.distance,
                config.distance_threshold.unwrap_or_default(),
                config.units.distance
            )),
            Cause::Engine => {
                for event in &trigger.engine_events {
                    match event {
                        Event::EngineStarted { engine } => parts.push(format!("{} on", engine_name(*engine, config))),
                        Event::EngineStopped { engine, elapsed } => parts.push(format!(
                            "{} off ({})",
                            engine_name(*engine, config),
                            hours_minutes(*elapsed)
                        )),
                        _ => {}
                    }
                }
            }
            Cause::Timer => parts.push(texts.timer.clone()),
            Cause::Manual => {}
        }
    }
    if config.warn_no_gps && !trigger.snapshot.has_fix() {
        parts.push(texts.no_gps.clone());
    }
    // the row is `;` separated
    parts.join(", ").replace(';', ",")
}

fn formatted(t: &chrono::NaiveDateTime, format: &str, fallback: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", t.format(format)).is_err() {
        out = t.format(fallback).to_string();
    }
    out
}

impl LogbookRow {
    /// Turns a trigger into the row the host appends
    pub fn materialize(trigger: &Trigger, config: &Config) -> LogbookRow {
        let s: &NavState = &trigger.snapshot;
        let local = s.local_time(trigger.at, config);
        let (latitude, longitude) = match s.position.get() {
            Some(p) => (
                coordinate(p.signed_lat(), true, config.position_format),
                coordinate(p.signed_lon(), false, config.position_format),
            ),
            None => (String::new(), String::new()),
        };
        let wind_speed = |w: &Wind| value(&w.speed, 1);
        LogbookRow {
            date: formatted(&local, &config.date_format, "%Y-%m-%d"),
            time: formatted(&local, &config.time_format, "%H:%M"),
            latitude,
            longitude,
            cog: angle(&s.course_over_ground),
            heading: angle(&s.heading),
            sog: value(&s.speed_over_ground, 2),
            stw: value(&s.speed_through_water, 2),
            depth: value(&s.depth, 1),
            true_wind_angle: angle(&s.wind.true_wind.angle),
            true_wind_speed: wind_speed(&s.wind.true_wind),
            true_wind_stats: wind_stats(&s.wind.true_wind),
            apparent_wind_angle: angle(&s.wind.apparent.angle),
            apparent_wind_speed: wind_speed(&s.wind.apparent),
            apparent_wind_stats: wind_stats(&s.wind.apparent),
            water_temperature: value(&s.water_temperature, 1),
            air_temperature: value(&s.air_temperature, 1),
            pressure: plain(&s.pressure, 1, " mbar"),
            humidity: plain(&s.humidity, 0, "%"),
            fuel_volume: value(&s.fuel_volume, 1),
            rpm1: plain(&s.engines[0].rpm, 0, ""),
            rpm2: plain(&s.engines[1].rpm, 0, ""),
            engine1_hours: run_hours(&s.engines[0]),
            engine2_hours: run_hours(&s.engines[1]),
            generator_hours: run_hours(&s.generator),
            remarks: remarks(trigger, config),
        }
    }

    /// Print the headline for a CSV document containig all fields seperated by `;`
    pub fn headline() -> String {
        String::from(
            "date;time;latitude;longitude;cog;heading;sog;stw;depth;\
             twa;tws;tws_min|avg|max;awa;aws;aws_min|avg|max;\
             water_temperature;air_temperature;pressure;humidity;fuel;\
             rpm1;rpm2;engine1;engine2;generator;remarks",
        )
    }
}

/// Display row implementation for CSV document with separator `;`
impl fmt::Display for LogbookRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{}",
            self.date,
            self.time,
            self.latitude,
            self.longitude,
            self.cog,
            self.heading,
            self.sog,
            self.stw,
            self.depth,
            self.true_wind_angle,
            self.true_wind_speed,
            self.true_wind_stats,
            self.apparent_wind_angle,
            self.apparent_wind_speed,
            self.apparent_wind_stats,
            self.water_temperature,
            self.air_temperature,
            self.pressure,
            self.humidity,
            self.fuel_volume,
            self.rpm1,
            self.rpm2,
            self.engine1_hours,
            self.engine2_hours,
            self.generator_hours,
            self.remarks
        )
    }
}
