//! Geometry of one watch day and the edits the user can make to it.
//!
//! All edits keep the day contiguous: every watch starts one minute after
//! the previous one ends and the durations add up to exactly 24 hours.
//! Edits whose preconditions do not hold return `false` and change nothing.
use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use super::Member;

/// Column width of a watch in the host's grid
pub const DEFAULT_WIDTH: u32 = 160;

fn day_length() -> Duration {
    Duration::hours(24)
}

fn one_minute() -> Duration {
    Duration::minutes(1)
}

/// One watch of a day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchInterval {
    pub start: NaiveDateTime,
    pub duration: Duration,
    /// Grid column width, only kept for the host
    pub width: u32,
    pub members: Vec<Member>,
}

impl WatchInterval {
    pub fn new(start: NaiveDateTime, duration: Duration) -> Self {
        WatchInterval { start, duration, width: DEFAULT_WIDTH, members: Vec::new() }
    }

    /// Last minute of the watch
    pub fn end(&self) -> NaiveDateTime {
        self.start + self.duration - one_minute()
    }

    /// True while `t` falls into the watch
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.start + self.duration
    }

    pub fn crosses_midnight(&self) -> bool {
        self.start.date() != self.end().date()
    }
}

/// The watches of one day; day 0 is the rotation pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchDay {
    pub day: u32,
    pub start: NaiveDateTime,
    pub intervals: Vec<WatchInterval>,
}

impl WatchDay {
    /// Splits 24 hours starting at `start` into watches of `default` length.
    ///
    /// The last watch takes what is left of the day. Returns `None` for a
    /// default length below one minute.
    pub fn build(day: u32, start: NaiveDateTime, default: Duration) -> Option<WatchDay> {
        let default = Duration::minutes(default.num_minutes());
        if default < one_minute() {
            debug!("no default watch length, nothing to build");
            return None;
        }
        let end = start.checked_add_signed(day_length())?;
        let mut intervals = Vec::new();
        let mut t = start;
        while t < end {
            let length = if t + default - one_minute() < end { default } else { end - t };
            intervals.push(WatchInterval::new(t, length));
            t = t + default;
        }
        Some(WatchDay { day, start, intervals })
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Sum of all watch durations
    pub fn total(&self) -> Duration {
        self.intervals.iter().fold(Duration::zero(), |acc, i| acc + i.duration)
    }

    /// Halves watch `col`; the odd minute goes to the new second half
    pub fn split(&mut self, col: usize) -> bool {
        let Some(interval) = self.intervals.get_mut(col) else {
            debug!("split: no watch {}", col);
            return false;
        };
        let minutes = interval.duration.num_minutes();
        if minutes < 2 {
            debug!("split: watch {} is too short", col);
            return false;
        }
        interval.duration = Duration::minutes(minutes / 2);
        let mut second = WatchInterval::new(interval.end() + one_minute(), Duration::minutes(minutes / 2 + minutes % 2));
        second.width = interval.width;
        self.intervals.insert(col + 1, second);
        self.retime();
        true
    }

    /// Merges the watches `cols` into the leftmost of them.
    ///
    /// Needs at least two distinct, existing columns.
    pub fn merge(&mut self, cols: &[usize]) -> bool {
        let mut cols = cols.to_vec();
        cols.sort_unstable();
        cols.dedup();
        if cols.len() < 2 || cols.iter().any(|&c| c >= self.intervals.len()) {
            debug!("merge: invalid selection {:?}", cols);
            return false;
        }
        let total = cols.iter().fold(Duration::zero(), |acc, &c| acc + self.intervals[c].duration);
        let left = cols[0];
        for &c in cols.iter().skip(1).rev() {
            self.intervals.remove(c);
        }
        self.intervals[left].duration = total;
        self.retime();
        true
    }

    /// Swaps the crew of two watches
    pub fn flip(&mut self, a: usize, b: usize) -> bool {
        if a == b || a >= self.intervals.len() || b >= self.intervals.len() {
            debug!("flip: invalid columns {} and {}", a, b);
            return false;
        }
        let members = std::mem::take(&mut self.intervals[a].members);
        self.intervals[a].members = std::mem::replace(&mut self.intervals[b].members, members);
        true
    }

    /// Removes the crew of `cols`, of every watch when `cols` is empty
    pub fn delete_members(&mut self, cols: &[usize]) -> bool {
        if cols.iter().any(|&c| c >= self.intervals.len()) {
            debug!("delete members: invalid selection {:?}", cols);
            return false;
        }
        if cols.is_empty() {
            self.intervals.iter_mut().for_each(|i| i.members.clear());
        } else {
            cols.iter().for_each(|&c| self.intervals[c].members.clear());
        }
        true
    }

    /// Changes the length of watch `col` and reflows the day
    pub fn set_duration(&mut self, col: usize, duration: Duration) -> bool {
        let duration = Duration::minutes(duration.num_minutes());
        if col >= self.intervals.len() || duration < one_minute() || duration > day_length() {
            debug!("set duration: invalid watch {} or length {}", col, duration);
            return false;
        }
        self.intervals[col].duration = duration;
        self.retime();
        true
    }

    pub fn set_members(&mut self, col: usize, members: Vec<Member>) -> bool {
        match self.intervals.get_mut(col) {
            Some(interval) => {
                interval.members = members;
                true
            }
            None => false,
        }
    }

    /// Recomputes all start times from the day start.
    ///
    /// A day shorter than 24 hours gets a trailing watch for the rest; in a
    /// longer day the watch crossing the day end is clipped and every watch
    /// starting at or after the day end is dropped.
    pub fn retime(&mut self) {
        let end = self.start + day_length();
        let mut t = self.start;
        let mut keep = 0;
        for interval in self.intervals.iter_mut() {
            if t >= end {
                break;
            }
            interval.start = t;
            if t + interval.duration > end {
                interval.duration = end - t;
            }
            t = t + interval.duration;
            keep += 1;
        }
        if keep < self.intervals.len() {
            debug!("dropping {} watches after the day end", self.intervals.len() - keep);
            self.intervals.truncate(keep);
        }
        if t < end {
            self.intervals.push(WatchInterval::new(t, end - t));
        }
    }
}
