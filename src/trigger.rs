//! Decides when a logbook row has to be written.
//!
//! The evaluator runs after every decoded sentence ([`Evaluator::evaluate`]) and
//! on the periodic tick ([`Evaluator::tick`]). Every cause raised within one of
//! those passes ends up in the same [`Trigger`], so the host writes one row no
//! matter how many conditions became true at once.
use chrono::{NaiveDateTime, Timelike};
use tracing::{debug, info};

use crate::config::Config;
use crate::decoder::Event;
use crate::state::NavState;
use crate::types::*;

/// Why a row is written, ordered by priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cause {
    CourseChange,
    GuardChange,
    Waypoint,
    Distance,
    Engine,
    Timer,
    Manual,
}

/// Leg of a route whose destination was reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    pub from: String,
    pub to: String,
}

/// A decision to write one logbook row
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    /// Never empty, sorted by priority
    pub causes: Vec<Cause>,
    /// State at the moment the trigger fired
    pub snapshot: NavState,
    pub at: Timestamp,
    /// Set when `causes` contains [`Cause::Waypoint`]
    pub leg: Option<Leg>,
    /// Engine transitions that contributed [`Cause::Engine`]
    pub engine_events: Vec<Event>,
}

impl Trigger {
    pub fn primary(&self) -> Cause {
        self.causes[0]
    }

    pub fn has(&self, cause: Cause) -> bool {
        self.causes.contains(&cause)
    }
}

/// Causes collected during one pass
#[derive(Debug, Default)]
struct Pass {
    causes: Vec<Cause>,
    leg: Option<Leg>,
    engine_events: Vec<Event>,
}

impl Pass {
    fn raise(&mut self, cause: Cause) {
        if !self.causes.contains(&cause) {
            self.causes.push(cause);
        }
    }
}

/// State machines of all automatic triggers
#[derive(Debug, Default, Clone)]
pub struct Evaluator {
    /// Course over ground of the last logged row
    course_reference: Option<f64>,
    /// Earliest time a detected course change may be logged
    course_eligible_at: Option<Timestamp>,
    /// Position the distance is measured from
    distance_reference: Option<Position>,
    /// "from" waypoint of the last logged arrival
    last_waypoint: Option<String>,
    /// Local minute a guard change was last logged in
    last_guard_minute: Option<NaiveDateTime>,
    /// Index of the timer slot seen on the last tick
    last_timer_slot: Option<i64>,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator::default()
    }

    /// Evaluates the events produced by one decoded sentence
    pub fn evaluate(&mut self, events: &[Event], s: &NavState, config: &Config, now: Timestamp) -> Option<Trigger> {
        let mut pass = Pass::default();
        for event in events {
            match event {
                Event::CourseFix => {
                    if self.course_changed(s, config, now) {
                        pass.raise(Cause::CourseChange);
                    }
                }
                Event::PositionFix => {
                    if self.distance_travelled(s, config) {
                        pass.raise(Cause::Distance);
                    }
                }
                Event::ArrivalCircleEntered { from, to } => {
                    if self.last_waypoint.as_deref() != Some(from.as_str()) {
                        self.last_waypoint = Some(from.clone());
                        pass.leg = Some(Leg { from: from.clone(), to: to.clone() });
                        pass.raise(Cause::Waypoint);
                    } else {
                        debug!("arrival from {} already logged", from);
                    }
                }
                Event::EngineStarted { .. } | Event::EngineStopped { .. } => {
                    pass.engine_events.push(event.clone());
                    pass.raise(Cause::Engine);
                }
            }
        }
        self.finish(pass, s, now)
    }

    /// Evaluates the clock driven triggers.
    ///
    /// `boundaries` are the local start times of the watches of the active day.
    /// Stale engine events reported by the staleness sweep are passed in `events`.
    pub fn tick(
        &mut self,
        events: &[Event],
        boundaries: &[NaiveDateTime],
        s: &NavState,
        config: &Config,
        now: Timestamp,
    ) -> Option<Trigger> {
        let mut pass = Pass::default();
        for event in events {
            if matches!(event, Event::EngineStarted { .. } | Event::EngineStopped { .. }) {
                pass.engine_events.push(event.clone());
                pass.raise(Cause::Engine);
            }
        }
        if self.course_eligible_at.is_some() && self.course_changed(s, config, now) {
            pass.raise(Cause::CourseChange);
        }

        let local = s.local_time(now, config);
        let minute = local.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(local);
        if config.guard_change && self.last_guard_minute != Some(minute) && boundaries.contains(&minute) {
            self.last_guard_minute = Some(minute);
            pass.raise(Cause::GuardChange);
        }

        if let Some(interval) = config.timer_interval.filter(|i| i.num_seconds() > 0) {
            let slot = local.and_utc().timestamp().div_euclid(interval.num_seconds());
            if self.last_timer_slot.map_or(false, |last| last != slot) {
                pass.raise(Cause::Timer);
            }
            self.last_timer_slot = Some(slot);
        }
        self.finish(pass, s, now)
    }

    /// Builds the trigger of a manual entry
    pub fn manual(&mut self, s: &NavState, now: Timestamp) -> Trigger {
        let mut pass = Pass::default();
        pass.raise(Cause::Manual);
        // a pass with a cause always yields a trigger
        self.finish(pass, s, now).unwrap_or_else(|| Trigger {
            causes: vec![Cause::Manual],
            snapshot: s.clone(),
            at: now,
            leg: None,
            engine_events: Vec::new(),
        })
    }

    fn finish(&mut self, mut pass: Pass, s: &NavState, now: Timestamp) -> Option<Trigger> {
        if pass.causes.is_empty() {
            return None;
        }
        pass.causes.sort();
        info!("logbook entry: {:?}", pass.causes);
        // every written row is the new reference for course changes
        if let Some(cog) = s.course_over_ground.get() {
            self.course_reference = Some(cog);
        }
        Some(Trigger {
            causes: pass.causes,
            snapshot: s.clone(),
            at: now,
            leg: pass.leg,
            engine_events: pass.engine_events,
        })
    }

    fn course_changed(&mut self, s: &NavState, config: &Config, now: Timestamp) -> bool {
        let (Some(threshold), Some(cog)) = (config.course_change_degrees, s.course_over_ground.get()) else {
            return false;
        };
        if config.events_enabled {
            return false;
        }
        let Some(reference) = self.course_reference else {
            self.course_reference = Some(cog);
            return false;
        };
        if angle_difference(reference, cog).abs() < threshold {
            return false;
        }
        let eligible = *self.course_eligible_at.get_or_insert(now + config.course_change_delay);
        if now < eligible {
            debug!("course change from {:.0} to {:.0} pending", reference, cog);
            return false;
        }
        self.course_eligible_at = None;
        true
    }

    fn distance_travelled(&mut self, s: &NavState, config: &Config) -> bool {
        let (Some(threshold), Some(position)) = (config.distance_threshold, s.position.get()) else {
            return false;
        };
        if config.events_enabled {
            return false;
        }
        let Some(reference) = self.distance_reference else {
            self.distance_reference = Some(position);
            return false;
        };
        let distance = config.units.distance.from_nautical_miles(reference.distance_nm(&position));
        if distance < threshold {
            return false;
        }
        self.distance_reference = Some(position);
        true
    }
}
