//! Crew watch rotation.
//!
//! A [`WatchDay`] splits 24 hours into contiguous watches. Day 0 is the
//! pattern the user edits; [`WatchPlan::calculate`] copies its geometry onto
//! the days of the trip while rotating the crew through the watches. The plan
//! is stored as tab separated lines by the [`codec`].
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

pub mod codec;
pub mod rotation;
pub mod schedule;
pub mod time;

pub use rotation::WatchPlan;
pub use schedule::{WatchDay, WatchInterval};

/// Marks a member who keeps their watch on every day of the trip
pub const STATIC_MARKER: char = '*';

/// Crew member assigned to a watch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    pub name: String,
    /// Pinned to the watch, excluded from rotation
    pub is_static: bool,
}

impl Member {
    pub fn new(name: &str) -> Self {
        Member { name: name.to_string(), is_static: false }
    }

    pub fn pinned(name: &str) -> Self {
        Member { name: name.to_string(), is_static: true }
    }

    /// Reads a member as entered by the user, `*Name` is a static member
    pub fn parse(entry: &str) -> Self {
        match entry.trim().strip_prefix(STATIC_MARKER) {
            Some(name) => Member::pinned(name.trim()),
            None => Member::new(entry.trim()),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_static {
            write!(f, "{}{}", STATIC_MARKER, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// The watch that is on duty at a given moment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentWatch {
    pub day: u32,
    /// Index of the watch within its day
    pub column: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration: Duration,
    pub members: Vec<Member>,
}

/// Errors of the stored watch format
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("watch file has no known format header")]
    MissingHeader,
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}
