//! Types definitions
use chrono::{DateTime, Utc};

/// Point in time at which a sentence or a timer tick arrived
pub type Timestamp = DateTime<Utc>;

/// Earth radius in nautical miles used by the logbook's distance calculation
pub const EARTH_RADIUS_NM: f64 = 3443.9;

/// Hemisphere of a latitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Northing {
    #[default]
    North,
    South,
}

/// Hemisphere of a longitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easting {
    #[default]
    East,
    West,
}

/// Position as unsigned decimal degrees plus hemispheres
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// Latitude in degrees, always positive
    pub lat: f64,
    /// Longitude in degrees, always positive
    pub lon: f64,
    pub northing: Northing,
    pub easting: Easting,
}

impl Position {
    /// Builds a position from signed decimal degrees (south and west negative)
    pub fn from_signed(lat: f64, lon: f64) -> Self {
        Position {
            lat: lat.abs(),
            lon: lon.abs(),
            northing: if lat < 0.0 { Northing::South } else { Northing::North },
            easting: if lon < 0.0 { Easting::West } else { Easting::East },
        }
    }

    pub fn signed_lat(&self) -> f64 {
        match self.northing {
            Northing::North => self.lat,
            Northing::South => -self.lat,
        }
    }

    pub fn signed_lon(&self) -> f64 {
        match self.easting {
            Easting::East => self.lon,
            Easting::West => -self.lon,
        }
    }

    /// Great circle distance to `other` in nautical miles (spherical law of cosines)
    pub fn distance_nm(&self, other: &Position) -> f64 {
        let (lat1, lon1) = (self.signed_lat().to_radians(), self.signed_lon().to_radians());
        let (lat2, lon2) = (other.signed_lat().to_radians(), other.signed_lon().to_radians());
        let cos_angle = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * (lon2 - lon1).cos();
        // Rounding can push identical points slightly above 1.0
        cos_angle.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_NM
    }
}

/// Reference of an angle reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bearing {
    #[default]
    True,
    Magnetic,
    /// Relative to the bow
    Relative,
}

/// Wraps an angle in degrees into `[0,360)`
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid of a tiny negative value can round up to 360.0
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Signed difference `to - from` in degrees, wrapped into `(-180,180]`
pub fn angle_difference(from: f64, to: f64) -> f64 {
    let d = normalize_degrees(to - from);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}
