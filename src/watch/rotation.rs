//! Rotation of the crew over the days of a trip.
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use super::codec;
use super::schedule::{WatchDay, WatchInterval};
use super::{CurrentWatch, Member};

/// Longest trip a plan is calculated for
pub const MAX_TRIP_DAYS: u32 = 1000;

/// Watch days of a whole trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPlan {
    /// Start of day 0 and day 1
    pub start: NaiveDateTime,
    pub default_watch: Duration,
    pub trip_days: u32,
    /// Set once the rotation wrapped around, i.e. the days differ
    pub shift: bool,
    /// Indexed by day number, `days[0]` is the pattern
    pub days: Vec<WatchDay>,
}

impl Default for WatchPlan {
    fn default() -> Self {
        WatchPlan {
            start: NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or(NaiveDateTime::MIN),
            default_watch: Duration::zero(),
            trip_days: 0,
            shift: false,
            days: Vec::new(),
        }
    }
}

impl WatchPlan {
    /// Builds the pattern from the default watch length and calculates the trip
    pub fn new(start: NaiveDateTime, default_watch: Duration, trip_days: u32) -> Option<WatchPlan> {
        let base = WatchDay::build(0, start, default_watch)?;
        Some(WatchPlan::calculate(base, default_watch, trip_days))
    }

    /// Derives days `1..=trip_days` from the pattern `base`.
    ///
    /// Every day reuses the watches of `base`. The non-static members of each
    /// watch of `base` form one rotation group; the groups move on by one watch
    /// per watch and the counter keeps running across days. Static members
    /// stay on their watch, and watches manned by static members only take no
    /// group.
    ///
    /// Trips are cut at [`MAX_TRIP_DAYS`] and at the end of the calendar.
    pub fn calculate(mut base: WatchDay, default_watch: Duration, trip_days: u32) -> WatchPlan {
        base.day = 0;
        if trip_days > MAX_TRIP_DAYS {
            debug!("trip of {} days cut to {}", trip_days, MAX_TRIP_DAYS);
        }
        let trip_days = trip_days.min(MAX_TRIP_DAYS);
        let groups: Vec<Vec<Member>> = base
            .intervals
            .iter()
            .map(|i| i.members.iter().filter(|m| !m.is_static).cloned().collect::<Vec<_>>())
            .filter(|g| !g.is_empty())
            .collect();
        let pinned: Vec<bool> = base
            .intervals
            .iter()
            .map(|i| !i.members.is_empty() && i.members.iter().all(|m| m.is_static))
            .collect();

        let mut next = 0;
        let mut shift = false;
        let mut days = Vec::with_capacity(trip_days as usize + 1);
        for d in 1..=trip_days {
            let Some(end) = base.start.checked_add_signed(Duration::days(i64::from(d))) else {
                debug!("day {} is past the end of the calendar", d);
                break;
            };
            let start = end - Duration::days(1);
            let mut t = start;
            let mut intervals = Vec::with_capacity(base.intervals.len());
            for (c, pattern) in base.intervals.iter().enumerate() {
                let mut members = Vec::new();
                if !groups.is_empty() && !pinned[c] {
                    members.extend(groups[next].iter().cloned());
                    next += 1;
                    if next == groups.len() {
                        next = 0;
                        shift = true;
                    }
                }
                members.extend(pattern.members.iter().filter(|m| m.is_static).cloned());
                intervals.push(WatchInterval {
                    start: t,
                    duration: pattern.duration,
                    width: pattern.width,
                    members,
                });
                t = t.checked_add_signed(pattern.duration).unwrap_or(end);
            }
            days.push(WatchDay { day: d, start, intervals });
        }
        let trip_days = days.len() as u32;
        info!("calculated {} watch days from {} watches, shift {}", trip_days, base.len(), shift);
        let start = base.start;
        days.insert(0, base);
        WatchPlan { start, default_watch, trip_days, shift, days }
    }

    /// Recalculates days `1..` from the current pattern
    pub fn recalculate(&mut self) {
        if let Some(base) = self.days.first().cloned() {
            *self = WatchPlan::calculate(base, self.default_watch, self.trip_days);
        }
    }

    /// Reads a stored plan, or an empty plan when the lines are not a watch file
    pub fn load_or_default(lines: &[String]) -> WatchPlan {
        match codec::decode_plan(lines) {
            Ok(plan) => plan,
            Err(e) => {
                debug!("starting with an empty watch plan: {}", e);
                WatchPlan::default()
            }
        }
    }

    pub fn day(&self, day: u32) -> Option<&WatchDay> {
        self.days.get(day as usize)
    }

    pub fn day_mut(&mut self, day: u32) -> Option<&mut WatchDay> {
        self.days.get_mut(day as usize)
    }

    /// The watch on duty at `now`, searched from day 1 on
    pub fn current_watch(&self, now: NaiveDateTime) -> Option<CurrentWatch> {
        self.days.iter().skip(1).find_map(|day| {
            day.intervals.iter().enumerate().find(|(_, i)| i.contains(now)).map(|(column, i)| CurrentWatch {
                day: day.day,
                column,
                start: i.start,
                end: i.end(),
                duration: i.duration,
                members: i.members.clone(),
            })
        })
    }

    /// Start times of the watches of `day`
    pub fn boundaries(&self, day: u32) -> Vec<NaiveDateTime> {
        self.day(day)
            .map(|d| d.intervals.iter().map(|i| i.start).collect())
            .unwrap_or_default()
    }

    /// Start times of the watches of the day running at `now`
    pub fn boundaries_at(&self, now: NaiveDateTime) -> Vec<NaiveDateTime> {
        match self.current_watch(now) {
            Some(w) => self.boundaries(w.day),
            None => Vec::new(),
        }
    }

    /// Makes `day` the new pattern starting at that day's start and
    /// recalculates the trip from it
    pub fn rebase(&mut self, day: u32) -> bool {
        let Some(mut base) = self.day(day).cloned() else {
            debug!("rebase: no day {}", day);
            return false;
        };
        base.day = 0;
        info!("day {} is the new watch pattern, starting {}", day, base.start);
        *self = WatchPlan::calculate(base, self.default_watch, self.trip_days);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    fn names(i: &WatchInterval) -> Vec<String> {
        i.members.iter().map(|m| m.to_string()).collect()
    }

    fn crewed_base() -> WatchDay {
        let mut base = WatchDay::build(0, start(), Duration::hours(6)).unwrap();
        base.set_members(0, vec![Member::new("Anna"), Member::new("Ben")]);
        base.set_members(1, vec![Member::new("Carl"), Member::pinned("Skipper")]);
        base.set_members(2, vec![Member::pinned("Cook")]);
        base
    }

    #[test]
    fn rotation_moves_groups_and_keeps_static_members() {
        let plan = WatchPlan::calculate(crewed_base(), Duration::hours(6), 2);
        assert_eq!(plan.days.len(), 3);

        let day1 = &plan.days[1];
        assert_eq!(day1.start, start());
        assert_eq!(names(&day1.intervals[0]), vec!["Anna", "Ben"]);
        assert_eq!(names(&day1.intervals[1]), vec!["Carl", "*Skipper"]);
        assert_eq!(names(&day1.intervals[2]), vec!["*Cook"]);
        assert_eq!(names(&day1.intervals[3]), vec!["Anna", "Ben"]);

        let day2 = &plan.days[2];
        assert_eq!(day2.start, start() + Duration::hours(24));
        assert_eq!(names(&day2.intervals[0]), vec!["Carl"]);
        assert_eq!(names(&day2.intervals[1]), vec!["Anna", "Ben", "*Skipper"]);
        assert_eq!(names(&day2.intervals[3]), vec!["Carl"]);
        assert!(plan.shift);
    }

    #[test]
    fn days_reuse_pattern_geometry() {
        let mut base = WatchDay::build(0, start(), Duration::hours(4)).unwrap();
        base.split(0);
        let plan = WatchPlan::calculate(base.clone(), Duration::hours(4), 3);
        for day in &plan.days[1..] {
            let lengths: Vec<_> = day.intervals.iter().map(|i| i.duration).collect();
            let pattern: Vec<_> = base.intervals.iter().map(|i| i.duration).collect();
            assert_eq!(lengths, pattern);
            assert_eq!(day.intervals[1].start, day.start + Duration::hours(2));
        }
        assert_eq!(plan.days[3].start, start() + Duration::hours(48));
    }

    #[test]
    fn absurd_trips_are_cut() {
        let plan = WatchPlan::new(start(), Duration::hours(6), u32::MAX).unwrap();
        assert_eq!(plan.trip_days, MAX_TRIP_DAYS);
        assert_eq!(plan.days.len(), MAX_TRIP_DAYS as usize + 1);

        let late = NaiveDateTime::MAX - Duration::days(3);
        let late = late.date().and_hms_opt(0, 0, 0).unwrap();
        let plan = WatchPlan::new(late, Duration::hours(6), 10).unwrap();
        assert_eq!(plan.trip_days, 3);
        assert_eq!(plan.days.len(), 4);
        assert_eq!(plan.days[3].start, late + Duration::days(2));
    }

    #[test]
    fn empty_crew_never_shifts() {
        let plan = WatchPlan::new(start(), Duration::hours(4), 2).unwrap();
        assert!(!plan.shift);
        assert!(plan.days[1].intervals.iter().all(|i| i.members.is_empty()));
    }

    #[test]
    fn current_watch_and_boundaries() {
        let plan = WatchPlan::calculate(crewed_base(), Duration::hours(6), 2);
        let now = start() + Duration::hours(24 + 7);
        let watch = plan.current_watch(now).unwrap();
        assert_eq!(watch.day, 2);
        assert_eq!(watch.column, 1);
        assert_eq!(watch.start, start() + Duration::hours(30));
        assert_eq!(watch.end, start() + Duration::hours(36) - Duration::minutes(1));
        assert_eq!(plan.boundaries_at(now).len(), 4);
        assert_eq!(plan.current_watch(start() - Duration::minutes(1)), None);
    }

    #[test]
    fn rebase_makes_a_day_the_pattern() {
        let mut plan = WatchPlan::calculate(crewed_base(), Duration::hours(6), 2);
        assert!(plan.rebase(2));
        assert_eq!(plan.start, start() + Duration::hours(24));
        assert_eq!(names(&plan.days[0].intervals[0]), vec!["Carl"]);
        assert_eq!(plan.days.len(), 3);
        assert!(!plan.rebase(7));
    }
}
