//! User configuration of the logbook engine.
use chrono::Duration;

use crate::units::DisplayUnits;

/// Which heading a HDG/HDT/HDM sensor should contribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingMode {
    /// Heading corrected by magnetic variation
    #[default]
    True,
    Magnetic,
}

/// How positions are written into a logbook row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionFormat {
    /// `054° 30' 12.34" N`
    DegreesMinutesSeconds,
    /// `054° 30.2057' N`
    #[default]
    DegreesDecimalMinutes,
}

/// Which clock local logbook times are shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    #[default]
    Utc,
    /// Fixed offset from UTC in whole hours
    Offset(i32),
    /// Offset derived from the current longitude (one hour per 15°)
    FromLongitude,
}

/// Identifiers of the engines reported by the proprietary RPM sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpmConfig {
    /// Whether RPM sentences are evaluated at all
    pub enabled: bool,
    /// Engine number field for engine 1 and 2
    pub engine_ids: [String; 2],
    pub generator_id: String,
    /// Per engine switch, same order as `engine_ids`
    pub engines_monitored: [bool; 2],
    pub generator_monitored: bool,
}

impl Default for RpmConfig {
    fn default() -> Self {
        RpmConfig {
            enabled: false,
            engine_ids: ["1".to_string(), "2".to_string()],
            generator_id: "3".to_string(),
            engines_monitored: [true, false],
            generator_monitored: false,
        }
    }
}

/// Remark texts written into the row for each cause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemarkTexts {
    pub course_change: String,
    pub guard_change: String,
    pub waypoint: String,
    pub distance: String,
    pub timer: String,
    pub engine: String,
    pub no_gps: String,
}

impl Default for RemarkTexts {
    fn default() -> Self {
        RemarkTexts {
            course_change: "Course change more than".to_string(),
            guard_change: "Change of guard".to_string(),
            waypoint: "Waypoint".to_string(),
            distance: "Distance travelled".to_string(),
            timer: "Automatic entry".to_string(),
            engine: "Engine".to_string(),
            no_gps: "No GPS-Signal !".to_string(),
        }
    }
}

/// Complete configuration; every field has a usable default
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub units: DisplayUnits,
    pub heading_mode: HeadingMode,
    /// Reports true wind angles relative to the heading instead of the bow
    pub wind_relative_to_heading: bool,
    pub position_format: PositionFormat,
    pub clock: ClockMode,
    /// chrono format string of the row date
    pub date_format: String,
    /// chrono format string of the row time
    pub time_format: String,
    /// Silence after which a device reading is considered gone
    pub device_timeout: Duration,
    /// `None` disables course change logging
    pub course_change_degrees: Option<f64>,
    /// Delay between detecting a course change and logging it
    pub course_change_delay: Duration,
    /// `None` disables distance logging; unit is `units.distance`
    pub distance_threshold: Option<f64>,
    /// `None` disables timed entries
    pub timer_interval: Option<Duration>,
    pub waypoint_arrival: bool,
    pub guard_change: bool,
    /// Host delivers its own events; course and distance checks are paused
    pub events_enabled: bool,
    pub rpm: RpmConfig,
    /// Write the "no GPS" remark when a row is made without a fix
    pub warn_no_gps: bool,
    pub remarks: RemarkTexts,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            units: DisplayUnits::default(),
            heading_mode: HeadingMode::default(),
            wind_relative_to_heading: false,
            position_format: PositionFormat::default(),
            clock: ClockMode::default(),
            date_format: "%Y-%m-%d".to_string(),
            time_format: "%H:%M".to_string(),
            device_timeout: Duration::seconds(10),
            course_change_degrees: None,
            course_change_delay: Duration::minutes(1),
            distance_threshold: None,
            timer_interval: None,
            waypoint_arrival: true,
            guard_change: true,
            events_enabled: false,
            rpm: RpmConfig::default(),
            warn_no_gps: true,
            remarks: RemarkTexts::default(),
        }
    }
}
