//! Unit conversions
//!
//! Values are converted once, when a sentence is ingested, into the units the
//! user has chosen for display:
//! - Speed and wind speed: knots, m/s, km/h
//! - Distance: nautical miles, meters, kilometers
//! - Depth: meters, feet, fathoms
//! - Temperature: °C, °F
//! - Volume: liters, US gallons
//! - Pressure: always millibar (hPa)
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Raised when a unit name given on the command line is unknown
#[derive(Debug, Error)]
#[error("unknown unit '{0}'")]
pub struct UnknownUnit(pub String);

/// Unit of a boat or wind speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedUnit {
    #[default]
    Knots,
    MetersPerSecond,
    KilometersPerHour,
}

impl SpeedUnit {
    /// Factor turning knots into this unit
    pub fn from_knots_factor(self) -> f64 {
        match self {
            SpeedUnit::Knots => 1.0,
            SpeedUnit::MetersPerSecond => 0.51444,
            SpeedUnit::KilometersPerHour => 1.852,
        }
    }

    /// Factor turning this unit into knots
    pub fn to_knots_factor(self) -> f64 {
        match self {
            SpeedUnit::Knots => 1.0,
            SpeedUnit::MetersPerSecond => 1.94384,
            SpeedUnit::KilometersPerHour => 0.53995,
        }
    }

    pub fn from_knots(self, knots: f64) -> f64 {
        knots * self.from_knots_factor()
    }

    /// Converts `value` given in `from` into `self`
    pub fn convert_from(self, value: f64, from: SpeedUnit) -> f64 {
        if self == from {
            value
        } else {
            value * from.to_knots_factor() * self.from_knots_factor()
        }
    }

    /// Unit letter used by MWV and VWT/VWR (`N`, `M`, `K`)
    pub fn from_nmea(c: char) -> Option<Self> {
        match c {
            'N' => Some(SpeedUnit::Knots),
            'M' => Some(SpeedUnit::MetersPerSecond),
            'K' => Some(SpeedUnit::KilometersPerHour),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeedUnit::Knots => "kn",
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::KilometersPerHour => "km/h",
        }
    }
}

/// Unit of distance travelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    #[default]
    NauticalMiles,
    Meters,
    Kilometers,
}

impl DistanceUnit {
    pub fn from_nautical_miles(self, nm: f64) -> f64 {
        match self {
            DistanceUnit::NauticalMiles => nm,
            DistanceUnit::Meters => nm * 1852.0,
            DistanceUnit::Kilometers => nm * 1.852,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DistanceUnit::NauticalMiles => "nm",
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
        }
    }
}

/// Unit of water depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthUnit {
    #[default]
    Meters,
    Feet,
    Fathoms,
}

impl DepthUnit {
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            DepthUnit::Meters => meters,
            DepthUnit::Feet => meters / 0.3048,
            DepthUnit::Fathoms => meters / 1.8288,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DepthUnit::Meters => "m",
            DepthUnit::Feet => "ft",
            DepthUnit::Fathoms => "fm",
        }
    }
}

/// Unit of air and water temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn from_celsius(self, c: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => c,
            TemperatureUnit::Fahrenheit => c * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

/// Unit of the fuel/water volume accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeUnit {
    #[default]
    Liters,
    Gallons,
}

impl VolumeUnit {
    /// Converts an XDR volume reading with unit letter `M` (m³), `L` or `G`
    pub fn from_nmea(self, value: f64, unit: &str) -> f64 {
        match (unit, self) {
            ("M", VolumeUnit::Liters) => value * 1000.0,
            ("M", VolumeUnit::Gallons) => value * 1000.0 * 0.264172,
            ("L", VolumeUnit::Gallons) => value * 0.264172,
            ("G", VolumeUnit::Liters) => value * 3.7854,
            _ => value,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VolumeUnit::Liters => "l",
            VolumeUnit::Gallons => "gal",
        }
    }
}

/// Unit placeholder for readings without a unit (RPM, relative humidity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unitless;

/// Barometric pressure is always kept in millibar (hPa)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Millibar;

/// Converts a pressure reading with unit letter `B` (bar) or `P` (pascal) into millibar
pub fn pressure_to_millibar(value: f64, unit: &str) -> f64 {
    match unit {
        "B" => value * 1000.0,
        "P" => value / 100.0,
        _ => value,
    }
}

/// Units the user has chosen for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayUnits {
    pub speed: SpeedUnit,
    pub wind_speed: SpeedUnit,
    pub distance: DistanceUnit,
    pub depth: DepthUnit,
    pub temperature: TemperatureUnit,
    pub volume: VolumeUnit,
}

/// Implements `FromStr` and `Display` for a unit enum from a list of accepted names
macro_rules! unit_names {
    ($type_name: ident, $($variant: ident => [$($name: expr),+]),+) => {
        impl FromStr for $type_name {
            type Err = UnknownUnit;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.to_lowercase();
                $(
                    if [$($name),+].contains(&lower.as_str()) {
                        return Ok($type_name::$variant);
                    }
                )+
                Err(UnknownUnit(s.to_string()))
            }
        }
        impl fmt::Display for $type_name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.label())
            }
        }
    };
}

unit_names!(SpeedUnit,
    Knots => ["kn", "knots", "kt"],
    MetersPerSecond => ["m/s", "mps", "ms"],
    KilometersPerHour => ["km/h", "kmh", "kph"]);
unit_names!(DistanceUnit,
    NauticalMiles => ["nm", "nmi"],
    Meters => ["m", "meters"],
    Kilometers => ["km", "kilometers"]);
unit_names!(DepthUnit,
    Meters => ["m", "meters"],
    Feet => ["ft", "feet"],
    Fathoms => ["fm", "fathoms"]);
unit_names!(TemperatureUnit,
    Celsius => ["c", "°c", "celsius"],
    Fahrenheit => ["f", "°f", "fahrenheit"]);
unit_names!(VolumeUnit,
    Liters => ["l", "liters", "litres"],
    Gallons => ["gal", "g", "gallons"]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knots_to_kilometers_per_hour() {
        let v = SpeedUnit::KilometersPerHour.from_knots(5.0);
        assert!((v - 9.26).abs() < 1e-9);
    }

    #[test]
    fn wind_speed_between_units() {
        let v = SpeedUnit::Knots.convert_from(10.0, SpeedUnit::MetersPerSecond);
        assert!((v - 19.4384).abs() < 1e-9);
        assert_eq!(SpeedUnit::KilometersPerHour.convert_from(12.0, SpeedUnit::KilometersPerHour), 12.0);
    }

    #[test]
    fn depth_and_temperature() {
        assert!((DepthUnit::Feet.from_meters(3.048) - 10.0).abs() < 1e-9);
        assert!((DepthUnit::Fathoms.from_meters(18.288) - 10.0).abs() < 1e-9);
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius(100.0), 212.0);
    }

    #[test]
    fn volume_from_cubic_meters() {
        assert_eq!(VolumeUnit::Liters.from_nmea(0.5, "M"), 500.0);
        assert!((VolumeUnit::Liters.from_nmea(1.0, "G") - 3.7854).abs() < 1e-9);
    }

    #[test]
    fn unit_names_parse() {
        assert_eq!("km/h".parse::<SpeedUnit>().unwrap(), SpeedUnit::KilometersPerHour);
        assert_eq!("Fathoms".parse::<DepthUnit>().unwrap(), DepthUnit::Fathoms);
        assert!("furlongs".parse::<DistanceUnit>().is_err());
    }
}
