//! Field types shared by several sentences
use chrono::{NaiveDate, NaiveTime};

use super::{ParseError, Sentence};
use crate::types::{Easting, Northing, Position};

/// Data status flag, `A` = valid, `V` = warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Valid,
    Invalid,
}

impl Status {
    /// Anything but `A` counts as invalid, including an empty field
    pub fn from_field(s: &Sentence, index: usize) -> Status {
        match s.char(index) {
            Some('A') => Status::Valid,
            _ => Status::Invalid,
        }
    }

    pub fn is_valid(self) -> bool {
        self == Status::Valid
    }
}

/// Side of the bow a relative wind angle is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn from_field(s: &Sentence, index: usize) -> Result<Side, ParseError> {
        match s.char(index) {
            Some('L') => Ok(Side::Left),
            Some('R') => Ok(Side::Right),
            _ => Err(ParseError::InvalidField {
                index,
                value: s.field(index).to_string(),
            }),
        }
    }
}

/// Reads a `ddmm.mmm,N,dddmm.mmm,E` group starting at field `index`.
///
/// Returns `None` when the fields are empty.
pub fn position(s: &Sentence, index: usize) -> Result<Option<Position>, ParseError> {
    let (Some(lat), Some(lon)) = (s.f64(index)?, s.f64(index + 2)?) else {
        return Ok(None);
    };
    let northing = match s.char(index + 1) {
        Some('N') => Northing::North,
        Some('S') => Northing::South,
        _ => return Err(invalid(s, index + 1)),
    };
    let easting = match s.char(index + 3) {
        Some('E') => Easting::East,
        Some('W') => Easting::West,
        _ => return Err(invalid(s, index + 3)),
    };
    Ok(Some(Position {
        lat: degrees_minutes(lat),
        lon: degrees_minutes(lon),
        northing,
        easting,
    }))
}

/// Converts NMEA `dddmm.mmm` into decimal degrees
pub fn degrees_minutes(value: f64) -> f64 {
    let degrees = (value / 100.0).trunc();
    degrees + (value - degrees * 100.0) / 60.0
}

/// Reads a `hhmmss.ss` time field
pub fn time(s: &Sentence, index: usize) -> Result<Option<NaiveTime>, ParseError> {
    let raw = s.field(index);
    if raw.is_empty() {
        return Ok(None);
    }
    let whole = raw.split('.').next().unwrap_or_default();
    NaiveTime::parse_from_str(whole, "%H%M%S")
        .map(Some)
        .map_err(|_| invalid(s, index))
}

/// Reads a `ddmmyy` date field as used by RMC
pub fn date(s: &Sentence, index: usize) -> Result<Option<NaiveDate>, ParseError> {
    let raw = s.field(index);
    if raw.is_empty() {
        return Ok(None);
    }
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(s, index));
    }
    let num = |r: std::ops::Range<usize>| raw[r].parse::<u32>().unwrap_or_default();
    NaiveDate::from_ymd_opt(2000 + num(4..6) as i32, num(2..4), num(0..2))
        .map(Some)
        .ok_or_else(|| invalid(s, index))
}

pub(crate) fn invalid(s: &Sentence, index: usize) -> ParseError {
    ParseError::InvalidField {
        index,
        value: s.field(index).to_string(),
    }
}
