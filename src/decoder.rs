//! Dispatch of parsed sentences onto [`NavState`].
//!
//! Every supported sentence id maps to a handler that turns the [`Sentence`]
//! into its typed record. The record then applies itself to the state through
//! [`Message::update`] and reports what happened as a list of [`Event`]s.
use chrono::{Duration, TimeZone, Utc};
use tracing::{debug, info, trace};

use crate::config::{Config, HeadingMode};
use crate::nmea::sentences::*;
use crate::nmea::{ParseError, Sentence};
use crate::state::{Engine, NavState, RpmSource};
use crate::types::*;
use crate::units::*;

/// Which engine an RPM sentence was attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineId {
    /// Index into `NavState::engines`
    Engine(usize),
    Generator,
}

impl EngineId {
    pub fn engine<'a>(&self, s: &'a mut NavState) -> &'a mut Engine {
        match *self {
            EngineId::Engine(i) => &mut s.engines[i],
            EngineId::Generator => &mut s.generator,
        }
    }
}

/// Something the trigger evaluator or the host should react to
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new GPS position was accepted
    PositionFix,
    /// A new course over ground was accepted
    CourseFix,
    /// RMB reported the arrival circle of the destination as entered
    ArrivalCircleEntered { from: String, to: String },
    EngineStarted { engine: EngineId },
    EngineStopped { engine: EngineId, elapsed: Duration },
}

/// Messages can update the state
pub trait Message {
    /// Applies the record to `s`. Records failing their validity check leave `s` untouched.
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event>;
}

type Handler = fn(&Sentence) -> Result<Box<dyn Message>, ParseError>;

fn boxed<T: FromSentence + Message + 'static>(s: &Sentence) -> Result<Box<dyn Message>, ParseError> {
    Ok(Box::new(T::from_sentence(s)?))
}

/// Supported sentence ids
const HANDLERS: &[(&str, Handler)] = &[
    ("GGA", boxed::<Gga> as Handler),
    ("GLL", boxed::<Gll> as Handler),
    ("ZDA", boxed::<Zda> as Handler),
    ("HDT", boxed::<Hdt> as Handler),
    ("HDM", boxed::<Hdm> as Handler),
    ("HDG", boxed::<Hdg> as Handler),
    ("RMB", boxed::<Rmb> as Handler),
    ("RMC", boxed::<Rmc> as Handler),
    ("VHW", boxed::<Vhw> as Handler),
    ("MWV", boxed::<Mwv> as Handler),
    ("VWT", boxed::<Vwt> as Handler),
    ("VWR", boxed::<Vwr> as Handler),
    ("MTW", boxed::<Mtw> as Handler),
    ("DBT", boxed::<Dbt> as Handler),
    ("DPT", boxed::<Dpt> as Handler),
    ("XDR", boxed::<Xdr> as Handler),
    ("MDA", boxed::<Mda> as Handler),
    ("RPM", boxed::<Rpm> as Handler),
];

/// Sentence decoder keeping simple statistics about its input
#[derive(Debug, Default)]
pub struct Decoder {
    /// Sentences that reached a handler
    pub accepted: u64,
    /// Malformed sentences and sentences with an unknown id
    pub discarded: u64,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder::default()
    }

    /// Returns the typed record of `line`, `Ok(None)` for unsupported ids
    pub fn parse(line: &str) -> Result<Option<Box<dyn Message>>, ParseError> {
        let sentence = Sentence::parse(line)?;
        match HANDLERS.iter().find(|(id, _)| *id == sentence.id) {
            Some((_, handler)) => handler(&sentence).map(Some),
            None => Ok(None),
        }
    }

    /// Decodes one line and applies it to `state`.
    ///
    /// Never fails: unusable input is logged and yields no events.
    pub fn decode(&mut self, line: &str, state: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        match Decoder::parse(line) {
            Ok(Some(message)) => {
                self.accepted += 1;
                message.update(state, config, now)
            }
            Ok(None) => {
                self.discarded += 1;
                trace!("unsupported sentence {:?}", line.trim());
                Vec::new()
            }
            Err(e) => {
                self.discarded += 1;
                debug!("discarding {:?}: {}", line.trim(), e);
                Vec::new()
            }
        }
    }
}

//*****************************************************************************
// Position, time and course
//*****************************************************************************
fn position_fix(s: &mut NavState, position: Option<Position>, now: Timestamp) -> Vec<Event> {
    match position {
        Some(p) => {
            s.position.set(p, now);
            vec![Event::PositionFix]
        }
        None => Vec::new(),
    }
}

impl Message for Gga {
    fn update(&self, s: &mut NavState, _config: &Config, now: Timestamp) -> Vec<Event> {
        if self.quality == 0 {
            debug!("GGA without fix");
            return Vec::new();
        }
        trace!("GGA {:?}", self.position);
        position_fix(s, self.position, now)
    }
}

impl Message for Gll {
    fn update(&self, s: &mut NavState, _config: &Config, now: Timestamp) -> Vec<Event> {
        if !self.status.is_valid() {
            debug!("GLL marked invalid");
            return Vec::new();
        }
        trace!("GLL {:?}", self.position);
        position_fix(s, self.position, now)
    }
}

impl Message for Rmc {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        if !self.status.is_valid() {
            debug!("RMC marked invalid");
            return Vec::new();
        }
        trace!("RMC {:?} sog {:?} cog {:?}", self.position, self.speed_knots, self.course_true);
        let mut events = position_fix(s, self.position, now);
        if let Some(knots) = self.speed_knots {
            let unit = config.units.speed;
            s.speed_over_ground.set(unit.from_knots(knots), unit, now);
        }
        if let Some(course) = self.course_true {
            s.course_over_ground.set(normalize_degrees(course), Bearing::True, now);
            events.push(Event::CourseFix);
        }
        if let (Some(date), Some(time)) = (self.date, self.time) {
            s.set_utc(Utc.from_utc_datetime(&date.and_time(time)), now);
        }
        events
    }
}

impl Message for Zda {
    fn update(&self, s: &mut NavState, _config: &Config, now: Timestamp) -> Vec<Event> {
        s.set_utc(Utc.from_utc_datetime(&self.date.and_time(self.time)), now);
        trace!("ZDA {:?}", s.utc);
        Vec::new()
    }
}

impl Message for Rmb {
    fn update(&self, _s: &mut NavState, config: &Config, _now: Timestamp) -> Vec<Event> {
        if !self.status.is_valid() {
            debug!("RMB marked invalid");
            return Vec::new();
        }
        if config.waypoint_arrival && self.arrival.is_valid() {
            trace!("arrival circle of {} entered, coming from {}", self.to, self.from);
            return vec![Event::ArrivalCircleEntered {
                from: self.from.clone(),
                to: self.to.clone(),
            }];
        }
        Vec::new()
    }
}

//*****************************************************************************
// Heading and speed through water
//*****************************************************************************
impl Message for Hdt {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        if config.heading_mode == HeadingMode::True {
            s.heading.set(normalize_degrees(self.heading), Bearing::True, now);
        }
        Vec::new()
    }
}

impl Message for Hdm {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        if config.heading_mode == HeadingMode::Magnetic {
            s.heading.set(normalize_degrees(self.heading), Bearing::Magnetic, now);
        }
        Vec::new()
    }
}

impl Message for Hdg {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        match config.heading_mode {
            HeadingMode::True => {
                let heading = normalize_degrees(self.sensor_heading + self.variation);
                s.heading.set(heading, Bearing::True, now);
            }
            HeadingMode::Magnetic => {
                s.heading.set(normalize_degrees(self.sensor_heading), Bearing::Magnetic, now);
            }
        }
        Vec::new()
    }
}

impl Message for Vhw {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        let unit = config.units.speed;
        let speed = match (self.speed_knots, self.speed_kmh) {
            (Some(kn), _) => unit.from_knots(kn),
            (None, Some(kmh)) => unit.convert_from(kmh, SpeedUnit::KilometersPerHour),
            (None, None) => return Vec::new(),
        };
        s.speed_through_water.set(speed, unit, now);
        Vec::new()
    }
}

//*****************************************************************************
// Wind
//*****************************************************************************
/// Angle of the true wind, turned onto the heading when configured and possible
fn true_wind_angle(s: &NavState, config: &Config, angle: f64) -> (f64, Bearing) {
    match s.heading.get() {
        Some(heading) if config.wind_relative_to_heading => (normalize_degrees(angle + heading), Bearing::True),
        _ => (normalize_degrees(angle), Bearing::Relative),
    }
}

impl Message for Mwv {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        if !self.status.is_valid() {
            debug!("MWV marked invalid");
            return Vec::new();
        }
        let unit = config.units.wind_speed;
        let speed = unit.convert_from(self.speed, self.unit);
        match self.reference {
            WindReference::Theoretical => {
                let (angle, bearing) = true_wind_angle(s, config, self.angle);
                s.wind.true_wind.set(angle, bearing, speed, unit, now);
            }
            WindReference::Relative => {
                s.wind.apparent.set(normalize_degrees(self.angle), Bearing::Relative, speed, unit, now);
            }
        }
        Vec::new()
    }
}

impl Message for Vwt {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        let Some((speed, from)) = self.0.speed() else {
            return Vec::new();
        };
        let unit = config.units.wind_speed;
        let (angle, bearing) = true_wind_angle(s, config, self.0.clockwise_angle());
        s.wind.true_wind.set(angle, bearing, unit.convert_from(speed, from), unit, now);
        Vec::new()
    }
}

impl Message for Vwr {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        let Some((speed, from)) = self.0.speed() else {
            return Vec::new();
        };
        let unit = config.units.wind_speed;
        let angle = normalize_degrees(self.0.clockwise_angle());
        s.wind.apparent.set(angle, Bearing::Relative, unit.convert_from(speed, from), unit, now);
        Vec::new()
    }
}

//*****************************************************************************
// Water and weather
//*****************************************************************************
impl Message for Mtw {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        let unit = config.units.temperature;
        s.water_temperature.set(unit.from_celsius(self.celsius), unit, now);
        Vec::new()
    }
}

impl Message for Dbt {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        let meters = self
            .meters
            .or(self.feet.map(|ft| ft * 0.3048))
            .or(self.fathoms.map(|fm| fm * 1.8288));
        if let Some(m) = meters {
            let unit = config.units.depth;
            s.depth.set(unit.from_meters(m), unit, now);
        }
        Vec::new()
    }
}

impl Message for Dpt {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        let unit = config.units.depth;
        s.depth.set(unit.from_meters(self.meters), unit, now);
        Vec::new()
    }
}

impl Message for Xdr {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        for t in &self.transducers {
            match t.kind {
                'C' => {
                    let celsius = if t.unit == "F" { (t.value - 32.0) * 5.0 / 9.0 } else { t.value };
                    let unit = config.units.temperature;
                    s.air_temperature.set(unit.from_celsius(celsius), unit, now);
                }
                'P' => s.pressure.set(pressure_to_millibar(t.value, &t.unit), Millibar, now),
                'H' => s.humidity.set(t.value, Unitless, now),
                'V' => {
                    let unit = config.units.volume;
                    s.fuel_volume.accumulate(unit.from_nmea(t.value, &t.unit), unit, now);
                }
                other => trace!("ignoring XDR transducer type {}", other),
            }
        }
        Vec::new()
    }
}

impl Message for Mda {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        if let Some(bars) = self.pressure_bars {
            s.pressure.set(pressure_to_millibar(bars, "B"), Millibar, now);
        }
        if let Some(c) = self.air_celsius {
            let unit = config.units.temperature;
            s.air_temperature.set(unit.from_celsius(c), unit, now);
        }
        match self.humidity {
            Some(h) => s.humidity.set(h, Unitless, now),
            None => s.humidity.invalidate(),
        }
        Vec::new()
    }
}

//*****************************************************************************
// Engines
//*****************************************************************************
impl Rpm {
    fn engine_id(&self, config: &Config) -> Option<EngineId> {
        let rpm = &config.rpm;
        if let Some(i) = (0..2).find(|&i| rpm.engines_monitored[i] && rpm.engine_ids[i] == self.number) {
            return Some(EngineId::Engine(i));
        }
        if rpm.generator_monitored && rpm.generator_id == self.number {
            return Some(EngineId::Generator);
        }
        None
    }
}

impl Message for Rpm {
    fn update(&self, s: &mut NavState, config: &Config, now: Timestamp) -> Vec<Event> {
        if !config.rpm.enabled {
            return Vec::new();
        }
        if !self.status.is_valid() {
            debug!("RPM marked invalid");
            return Vec::new();
        }
        let Some(id) = self.engine_id(config) else {
            trace!("RPM for unmonitored engine {}", self.number);
            return Vec::new();
        };
        s.rpm_updated = Some(now);
        let engine = id.engine(s);
        if self.source == 'S' {
            engine.source = RpmSource::Shaft;
            engine.shaft_rpm.set(self.rpm, Unitless, now);
            return Vec::new();
        }
        engine.source = RpmSource::Engine;
        engine.rpm.set(self.rpm, Unitless, now);
        if self.rpm != 0.0 {
            if engine.start(now) {
                info!("{:?} started", id);
                return vec![Event::EngineStarted { engine: id }];
            }
        } else if let Some(elapsed) = engine.stop(now) {
            info!("{:?} stopped after {} min", id, elapsed.num_minutes());
            return vec![Event::EngineStopped { engine: id, elapsed }];
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RpmConfig;

    fn at(secs: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn decode(line: &str, s: &mut NavState, config: &Config) -> Vec<Event> {
        Decoder::new().decode(line, s, config, at(0))
    }

    #[test]
    fn rmc_converts_speed_and_sets_course() {
        let mut config = Config::default();
        config.units.speed = SpeedUnit::KilometersPerHour;
        let mut s = NavState::new();
        let events = decode("$GPRMC,123519,A,4807.038,N,01131.000,E,5.0,084.4,230394,003.1,W", &mut s, &config);
        assert_eq!(events, vec![Event::PositionFix, Event::CourseFix]);
        assert!((s.speed_over_ground.get().unwrap() - 9.26).abs() < 1e-9);
        assert_eq!(s.speed_over_ground.unit, SpeedUnit::KilometersPerHour);
        assert_eq!(s.course_over_ground.get(), Some(84.4));
        assert!(s.utc.is_some());
    }

    #[test]
    fn invalid_sentences_leave_state_unchanged() {
        let config = Config::default();
        let mut s = NavState::new();
        let before = s.clone();
        for line in [
            "$GPRMC,123519,V,4807.038,N,01131.000,E,5.0,084.4,230394,003.1,W",
            "$GPGGA,123519,4807.038,N,01131.000,E,0,08,0.9,545.4,M,46.9,M,,",
            "$GPGLL,4916.45,N,12311.12,W,225444,V",
            "$GPRMC,123519,A,4807.038,N,01131.000,E,5.0,084.4,230394,003.1,W*00",
            "$GPRMC,123519,A,48x7.038,N,01131.000,E,5.0,084.4,230394,003.1,W",
            "$IIMWV,45.0,R,10.0,N,V",
            "not a sentence",
        ] {
            assert!(decode(line, &mut s, &config).is_empty(), "{}", line);
        }
        assert_eq!(s, before);
    }

    #[test]
    fn hdg_adds_east_variation_in_true_mode() {
        let config = Config::default();
        let mut s = NavState::new();
        decode("$HCHDG,355.0,0.0,E,10.0,E", &mut s, &config);
        assert!((s.heading.get().unwrap() - 5.0).abs() < 1e-9);
        let magnetic = Config { heading_mode: HeadingMode::Magnetic, ..Config::default() };
        decode("$HCHDG,355.0,0.0,E,10.0,E", &mut s, &magnetic);
        assert_eq!(s.heading.get(), Some(355.0));
    }

    #[test]
    fn true_wind_turned_onto_heading() {
        let config = Config { wind_relative_to_heading: true, ..Config::default() };
        let mut s = NavState::new();
        decode("$IIMWV,300.0,T,10.0,N,A", &mut s, &config);
        assert_eq!(s.wind.true_wind.angle.get(), Some(300.0));
        decode("$IIHDT,90.0,T", &mut s, &config);
        decode("$IIVWT,30.0,L,10.0,N,,,,", &mut s, &config);
        assert_eq!(s.wind.true_wind.angle.get(), Some(60.0));
        assert_eq!(s.wind.true_wind.angle.unit, Bearing::True);
    }

    #[test]
    fn xdr_volume_accumulates() {
        let config = Config::default();
        let mut s = NavState::new();
        decode("$IIXDR,V,0.5,M,FUEL", &mut s, &config);
        decode("$IIXDR,V,0.25,M,FUEL,P,1.02,B,BARO", &mut s, &config);
        assert_eq!(s.fuel_volume.get(), Some(750.0));
        assert!((s.pressure.get().unwrap() - 1020.0).abs() < 1e-9);
    }

    #[test]
    fn mda_without_humidity_clears_it() {
        let config = Config::default();
        let mut s = NavState::new();
        decode("$WIMDA,30.1,I,1.019,B,21.5,C,,,65.0,,,,,,,,,,,", &mut s, &config);
        assert_eq!(s.humidity.get(), Some(65.0));
        assert!((s.pressure.get().unwrap() - 1019.0).abs() < 1e-9);
        decode("$WIMDA,30.1,I,1.019,B,21.5,C,,,,,,,,,,,,,,", &mut s, &config);
        assert_eq!(s.humidity.get(), None);
    }

    #[test]
    fn rpm_start_and_stop() {
        let config = Config {
            rpm: RpmConfig { enabled: true, ..RpmConfig::default() },
            ..Config::default()
        };
        let mut s = NavState::new();
        let mut decoder = Decoder::new();
        let started = decoder.decode("$ERRPM,E,1,1500,,A", &mut s, &config, at(0));
        assert_eq!(started, vec![Event::EngineStarted { engine: EngineId::Engine(0) }]);
        assert!(decoder.decode("$ERRPM,E,1,1600,,A", &mut s, &config, at(30)).is_empty());
        let stopped = decoder.decode("$ERRPM,E,1,0,,A", &mut s, &config, at(600));
        assert_eq!(
            stopped,
            vec![Event::EngineStopped { engine: EngineId::Engine(0), elapsed: Duration::minutes(10) }]
        );
        // engine 2 is not monitored by default
        assert!(decoder.decode("$ERRPM,E,2,1500,,A", &mut s, &config, at(700)).is_empty());
        assert_eq!(decoder.accepted, 4);
    }

    #[test]
    fn rpm_source_follows_the_sentence() {
        let config = Config {
            rpm: RpmConfig { enabled: true, ..RpmConfig::default() },
            ..Config::default()
        };
        let mut s = NavState::new();
        assert!(decode("$IIRPM,S,1,800,10.0,A", &mut s, &config).is_empty());
        assert_eq!(s.engines[0].source, RpmSource::Shaft);
        assert_eq!(s.engines[0].shaft_rpm.get(), Some(800.0));
        assert!(!s.engines[0].running);

        decode("$IIRPM,E,1,1500,10.0,A", &mut s, &config);
        assert_eq!(s.engines[0].source, RpmSource::Engine);
        assert_eq!(s.engines[0].rpm.get(), Some(1500.0));
    }

    #[test]
    fn rpm_ignored_when_disabled() {
        let config = Config::default();
        let mut s = NavState::new();
        assert!(decode("$ERRPM,E,1,1500,,A", &mut s, &config).is_empty());
        assert!(!s.engines[0].running);
    }

    #[test]
    fn rmb_arrival() {
        let config = Config::default();
        let mut s = NavState::new();
        let events = decode("$GPRMB,A,0.66,L,003,004,4917.24,N,12309.57,W,001.3,052.5,000.5,A", &mut s, &config);
        assert_eq!(
            events,
            vec![Event::ArrivalCircleEntered { from: "003".to_string(), to: "004".to_string() }]
        );
        let off = Config { waypoint_arrival: false, ..Config::default() };
        assert!(decode("$GPRMB,A,0.66,L,003,004,4917.24,N,12309.57,W,001.3,052.5,000.5,A", &mut s, &off).is_empty());
    }
}
