//! One logging session: the state and every engine working on it.
use chrono::NaiveDateTime;

use crate::config::Config;
use crate::decoder::{Decoder, Event};
use crate::logbook::LogbookRow;
use crate::staleness::StalenessMonitor;
use crate::state::NavState;
use crate::trigger::{Cause, Evaluator, Trigger};
use crate::types::Timestamp;

/// Result of feeding a sentence or a tick into the session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    /// Row the host should append, if any trigger fired
    pub row: Option<LogbookRow>,
    /// Causes of `row`, empty without a row
    pub causes: Vec<Cause>,
    /// Everything the decoder or the staleness sweep reported
    pub events: Vec<Event>,
}

/// Owns the [`NavState`] and serializes every change to it
#[derive(Debug)]
pub struct Session {
    config: Config,
    state: NavState,
    decoder: Decoder,
    evaluator: Evaluator,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session {
            config,
            state: NavState::new(),
            decoder: Decoder::new(),
            evaluator: Evaluator::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Changes apply from the next sentence or tick on
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    fn outcome(&self, trigger: Option<Trigger>, events: Vec<Event>) -> Outcome {
        match trigger {
            Some(t) => Outcome {
                row: Some(LogbookRow::materialize(&t, &self.config)),
                causes: t.causes,
                events,
            },
            None => Outcome { row: None, causes: Vec::new(), events },
        }
    }

    /// Decodes one NMEA line received at `now`
    pub fn on_sentence(&mut self, line: &str, now: Timestamp) -> Outcome {
        let events = self.decoder.decode(line, &mut self.state, &self.config, now);
        if events.is_empty() {
            return Outcome::default();
        }
        self.state.flush_engine_time(now);
        let trigger = self.evaluator.evaluate(&events, &self.state, &self.config, now);
        self.outcome(trigger, events)
    }

    /// Periodic housekeeping: flushes engine run time, expires silent
    /// devices and checks the clock driven triggers.
    ///
    /// `boundaries` are the local start times of the active watches, see
    /// [`crate::watch::WatchPlan::boundaries`].
    pub fn tick(&mut self, now: Timestamp, boundaries: &[NaiveDateTime]) -> Outcome {
        self.state.flush_engine_time(now);
        let events = StalenessMonitor::new(self.config.device_timeout).sweep(&mut self.state, now);
        let trigger = self.evaluator.tick(&events, boundaries, &self.state, &self.config, now);
        self.outcome(trigger, events)
    }

    /// Row of an entry requested by the user
    pub fn manual_entry(&mut self, now: Timestamp) -> LogbookRow {
        self.state.flush_engine_time(now);
        let trigger = self.evaluator.manual(&self.state, now);
        LogbookRow::materialize(&trigger, &self.config)
    }
}
