//! Typed records of the sentences the logbook understands.
//!
//! Every record is built from a [`Sentence`] through [`FromSentence`]. Records
//! keep the talker's values and units untouched; converting into display units
//! is the decoder's job.
use chrono::{NaiveDate, NaiveTime};

use super::types::{self, invalid, Side, Status};
use super::{ParseError, Sentence};
use crate::types::Position;
use crate::units::SpeedUnit;

/// Builds a record from a parsed sentence
pub trait FromSentence: Sized {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError>;
}

/// GGA - GPS fix data
#[derive(Debug, Clone, PartialEq)]
pub struct Gga {
    pub time: Option<NaiveTime>,
    pub position: Option<Position>,
    /// 0 = no fix
    pub quality: u8,
}

impl FromSentence for Gga {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        let quality = s.i64(6)?.unwrap_or(0);
        Ok(Gga {
            time: types::time(s, 1)?,
            position: types::position(s, 2)?,
            quality: u8::try_from(quality).map_err(|_| invalid(s, 6))?,
        })
    }
}

/// GLL - geographic position
#[derive(Debug, Clone, PartialEq)]
pub struct Gll {
    pub position: Option<Position>,
    pub time: Option<NaiveTime>,
    pub status: Status,
}

impl FromSentence for Gll {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        Ok(Gll {
            position: types::position(s, 1)?,
            time: types::time(s, 5)?,
            status: Status::from_field(s, 6),
        })
    }
}

/// ZDA - UTC date and time
#[derive(Debug, Clone, PartialEq)]
pub struct Zda {
    pub time: NaiveTime,
    pub date: NaiveDate,
}

impl FromSentence for Zda {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        let time = types::time(s, 1)?.ok_or(ParseError::MissingField(1))?;
        let day = s.i64(2)?.ok_or(ParseError::MissingField(2))?;
        let month = s.i64(3)?.ok_or(ParseError::MissingField(3))?;
        let year = s.i64(4)?.ok_or(ParseError::MissingField(4))?;
        let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
            .ok_or_else(|| invalid(s, 2))?;
        Ok(Zda { time, date })
    }
}

/// HDT - true heading
#[derive(Debug, Clone, PartialEq)]
pub struct Hdt {
    pub heading: f64,
}

impl FromSentence for Hdt {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        Ok(Hdt { heading: s.require_f64(1)? })
    }
}

/// HDM - magnetic heading
#[derive(Debug, Clone, PartialEq)]
pub struct Hdm {
    pub heading: f64,
}

impl FromSentence for Hdm {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        Ok(Hdm { heading: s.require_f64(1)? })
    }
}

/// HDG - magnetic sensor heading with deviation and variation
#[derive(Debug, Clone, PartialEq)]
pub struct Hdg {
    pub sensor_heading: f64,
    /// Variation in degrees, east positive
    pub variation: f64,
}

impl FromSentence for Hdg {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        let sensor_heading = s.require_f64(1)?;
        let magnitude = s.f64(4)?.unwrap_or(0.0);
        let variation = match s.char(5) {
            Some('W') => -magnitude,
            _ => magnitude,
        };
        Ok(Hdg { sensor_heading, variation })
    }
}

/// RMB - navigation to a waypoint
#[derive(Debug, Clone, PartialEq)]
pub struct Rmb {
    pub status: Status,
    /// Origin ("from") waypoint id
    pub from: String,
    /// Destination ("to") waypoint id
    pub to: String,
    pub arrival: Status,
}

impl FromSentence for Rmb {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        Ok(Rmb {
            status: Status::from_field(s, 1),
            from: s.field(4).to_string(),
            to: s.field(5).to_string(),
            arrival: Status::from_field(s, 13),
        })
    }
}

/// RMC - recommended minimum data
#[derive(Debug, Clone, PartialEq)]
pub struct Rmc {
    pub time: Option<NaiveTime>,
    pub status: Status,
    pub position: Option<Position>,
    pub speed_knots: Option<f64>,
    pub course_true: Option<f64>,
    pub date: Option<NaiveDate>,
}

impl FromSentence for Rmc {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        Ok(Rmc {
            time: types::time(s, 1)?,
            status: Status::from_field(s, 2),
            position: types::position(s, 3)?,
            speed_knots: s.f64(7)?,
            course_true: s.f64(8)?,
            date: types::date(s, 9)?,
        })
    }
}

/// VHW - water speed and heading
#[derive(Debug, Clone, PartialEq)]
pub struct Vhw {
    pub speed_knots: Option<f64>,
    pub speed_kmh: Option<f64>,
}

impl FromSentence for Vhw {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        Ok(Vhw {
            speed_knots: s.f64(5)?,
            speed_kmh: s.f64(7)?,
        })
    }
}

/// Reference of a MWV wind angle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindReference {
    Relative,
    Theoretical,
}

/// MWV - wind speed and angle
#[derive(Debug, Clone, PartialEq)]
pub struct Mwv {
    pub angle: f64,
    pub reference: WindReference,
    pub speed: f64,
    pub unit: SpeedUnit,
    pub status: Status,
}

impl FromSentence for Mwv {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        let reference = match s.char(2) {
            Some('T') => WindReference::Theoretical,
            Some('R') => WindReference::Relative,
            _ => return Err(invalid(s, 2)),
        };
        let unit = s.char(4).and_then(SpeedUnit::from_nmea).ok_or_else(|| invalid(s, 4))?;
        Ok(Mwv {
            angle: s.require_f64(1)?,
            reference,
            speed: s.require_f64(3)?,
            unit,
            // Older talkers leave the status empty
            status: if s.field(5).is_empty() { Status::Valid } else { Status::from_field(s, 5) },
        })
    }
}

/// VWT / VWR - wind angle off the bow with speed in three units
#[derive(Debug, Clone, PartialEq)]
pub struct WindOffBow {
    pub angle: f64,
    pub side: Side,
    pub speed_knots: Option<f64>,
    pub speed_mps: Option<f64>,
    pub speed_kmh: Option<f64>,
}

impl WindOffBow {
    /// Angle measured clockwise from the bow in `[0,360)`
    pub fn clockwise_angle(&self) -> f64 {
        match self.side {
            Side::Left => 360.0 - self.angle,
            Side::Right => self.angle,
        }
    }

    /// Speed in the first unit the talker filled in
    pub fn speed(&self) -> Option<(f64, SpeedUnit)> {
        self.speed_knots
            .map(|v| (v, SpeedUnit::Knots))
            .or(self.speed_mps.map(|v| (v, SpeedUnit::MetersPerSecond)))
            .or(self.speed_kmh.map(|v| (v, SpeedUnit::KilometersPerHour)))
    }
}

impl FromSentence for WindOffBow {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        Ok(WindOffBow {
            angle: s.require_f64(1)?,
            side: Side::from_field(s, 2)?,
            speed_knots: s.f64(3)?,
            speed_mps: s.f64(5)?,
            speed_kmh: s.f64(7)?,
        })
    }
}

/// VWT - true wind relative to the bow
#[derive(Debug, Clone, PartialEq)]
pub struct Vwt(pub WindOffBow);

impl FromSentence for Vwt {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        WindOffBow::from_sentence(s).map(Vwt)
    }
}

/// VWR - apparent wind relative to the bow
#[derive(Debug, Clone, PartialEq)]
pub struct Vwr(pub WindOffBow);

impl FromSentence for Vwr {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        WindOffBow::from_sentence(s).map(Vwr)
    }
}

/// MTW - water temperature
#[derive(Debug, Clone, PartialEq)]
pub struct Mtw {
    pub celsius: f64,
}

impl FromSentence for Mtw {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        Ok(Mtw { celsius: s.require_f64(1)? })
    }
}

/// DBT - depth below transducer
#[derive(Debug, Clone, PartialEq)]
pub struct Dbt {
    pub feet: Option<f64>,
    pub meters: Option<f64>,
    pub fathoms: Option<f64>,
}

impl FromSentence for Dbt {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        let dbt = Dbt {
            feet: s.f64(1)?,
            meters: s.f64(3)?,
            fathoms: s.f64(5)?,
        };
        if dbt.feet.is_none() && dbt.meters.is_none() && dbt.fathoms.is_none() {
            return Err(ParseError::MissingField(3));
        }
        Ok(dbt)
    }
}

/// DPT - depth in meters
#[derive(Debug, Clone, PartialEq)]
pub struct Dpt {
    pub meters: f64,
}

impl FromSentence for Dpt {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        Ok(Dpt { meters: s.require_f64(1)? })
    }
}

/// One measurement of a XDR sentence
#[derive(Debug, Clone, PartialEq)]
pub struct Transducer {
    /// `C` temperature, `P` pressure, `H` humidity, `V` volume, ...
    pub kind: char,
    pub value: f64,
    pub unit: String,
}

/// XDR - generic transducer measurements
#[derive(Debug, Clone, PartialEq)]
pub struct Xdr {
    pub transducers: Vec<Transducer>,
}

impl FromSentence for Xdr {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        let mut transducers = Vec::new();
        let mut index = 1;
        while index + 1 <= s.len() {
            let kind = s.char(index);
            let value = s.f64(index + 1)?;
            if let (Some(kind), Some(value)) = (kind, value) {
                transducers.push(Transducer {
                    kind,
                    value,
                    unit: s.field(index + 2).to_string(),
                });
            }
            index += 4;
        }
        Ok(Xdr { transducers })
    }
}

/// MDA - meteorological composite
#[derive(Debug, Clone, PartialEq)]
pub struct Mda {
    pub pressure_bars: Option<f64>,
    pub air_celsius: Option<f64>,
    pub humidity: Option<f64>,
}

impl FromSentence for Mda {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        Ok(Mda {
            pressure_bars: s.f64(3)?,
            air_celsius: s.f64(5)?,
            humidity: s.f64(9)?,
        })
    }
}

/// RPM - revolutions of an engine or a shaft
#[derive(Debug, Clone, PartialEq)]
pub struct Rpm {
    /// `E` engine or `S` shaft
    pub source: char,
    pub number: String,
    pub rpm: f64,
    pub status: Status,
}

impl FromSentence for Rpm {
    fn from_sentence(s: &Sentence) -> Result<Self, ParseError> {
        let source = match s.char(1) {
            Some(c @ ('E' | 'S')) => c,
            _ => return Err(invalid(s, 1)),
        };
        Ok(Rpm {
            source,
            number: s.field(2).to_string(),
            rpm: s.require_f64(3)?,
            status: if s.field(5).is_empty() { Status::Valid } else { Status::from_field(s, 5) },
        })
    }
}
