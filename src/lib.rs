//! Electronic logbook engine for NMEA 0183 instruments and a crew watch
//! rotation planner.
//!
//! NMEA lines go into a [`session::Session`], which keeps the
//! [`state::NavState`] current and hands back a [`logbook::LogbookRow`]
//! whenever a logbook entry is due. The [`watch`] module plans and stores
//! the crew watches of a trip.
pub mod config;
pub mod decoder;
pub mod logbook;
pub mod nmea;
pub mod session;
pub mod staleness;
pub mod state;
pub mod trigger;
pub mod types;
pub mod udpstream;
pub mod units;
pub mod watch;
