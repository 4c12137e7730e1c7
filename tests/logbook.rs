use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;

use sailstats_logbook::config::Config;
use sailstats_logbook::decoder::Event;
use sailstats_logbook::nmea::checksum_of;
use sailstats_logbook::session::{Outcome, Session};
use sailstats_logbook::trigger::Cause;
use sailstats_logbook::units::SpeedUnit;
use sailstats_logbook::watch::WatchPlan;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
}

/// Frames a sentence body with `$` and its checksum
fn nmea(body: &str) -> String {
    format!("${}*{:02X}", body, checksum_of(body))
}

fn rmc(cog: f64) -> String {
    nmea(&format!("GPRMC,120000,A,5430.000,N,01000.000,E,005.0,{:05.1},010624,,", cog))
}

fn gga(lat_minutes: f64) -> String {
    nmea(&format!("GPGGA,120000,54{:06.3},N,01000.000,E,1,08,0.9,10.0,M,,,,", lat_minutes))
}

#[test]
fn rmc_speed_in_kilometers_per_hour() {
    let mut config = Config::default();
    config.units.speed = SpeedUnit::KilometersPerHour;
    let mut session = Session::new(config);

    let outcome = session.on_sentence(&rmc(84.4), at(0));
    assert_eq!(outcome.events, vec![Event::PositionFix, Event::CourseFix]);
    assert_eq!(outcome.row, None);
    let sog = session.state().speed_over_ground.get().unwrap();
    assert!((sog - 9.26).abs() < 1e-9);
    assert_eq!(session.state().speed_over_ground.unit, SpeedUnit::KilometersPerHour);
    assert_eq!(
        session.state().utc,
        Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    );
}

#[test]
fn rejected_sentences_leave_state_unchanged() {
    let mut session = Session::new(Config::default());
    session.on_sentence(&rmc(10.0), at(0));
    let before = session.state().clone();

    let void = nmea("GPRMC,120100,V,5500.000,N,01100.000,E,007.0,200.0,010624,,");
    let no_fix = nmea("GPGGA,120100,5500.000,N,01100.000,E,0,00,,,M,,,,");
    for line in [
        void.as_str(),
        no_fix.as_str(),
        "$GPRMC,120100,A,5500.000,N,01100.000,E,007.0,200.0,010624,,*00",
        "GPRMC,120100,A,5500.000,N",
        "$GPXYZ,1,2,3",
        "",
    ] {
        assert_eq!(session.on_sentence(line, at(60)), Outcome::default());
    }
    assert_eq!(session.state(), &before);
    // void fixes parse but are not applied
    assert_eq!(session.decoder().accepted, 3);
    assert_eq!(session.decoder().discarded, 4);
}

#[test]
fn non_finite_numbers_are_rejected() {
    let mut session = Session::new(Config::default());
    session.on_sentence(&rmc(10.0), at(0));
    let before = session.state().clone();

    let nan = nmea("GPRMC,120100,A,5500.000,N,01100.000,E,NaN,200.0,010624,,");
    let inf = nmea("GPDBT,inf,f,,M,,F");
    assert_eq!(session.on_sentence(&nan, at(1)), Outcome::default());
    assert_eq!(session.on_sentence(&inf, at(1)), Outcome::default());
    assert_eq!(session.state(), &before);
    assert_eq!(session.decoder().discarded, 2);
}

#[test]
fn course_change_is_logged_once_after_the_delay() {
    let config = Config {
        course_change_degrees: Some(45.0),
        course_change_delay: Duration::minutes(1),
        ..Config::default()
    };
    let mut session = Session::new(config);

    assert_eq!(session.on_sentence(&rmc(10.0), at(0)).row, None);
    assert_eq!(session.on_sentence(&rmc(10.0), at(1)).row, None);
    assert_eq!(session.on_sentence(&rmc(100.0), at(2)).row, None);
    assert_eq!(session.on_sentence(&rmc(100.0), at(30)).row, None);

    let outcome = session.on_sentence(&rmc(100.0), at(62));
    assert_eq!(outcome.causes, vec![Cause::CourseChange]);
    let row = outcome.row.unwrap();
    assert_eq!(row.cog, "100°");
    assert_eq!(row.remarks, "Course change more than 45°");

    // the logged course is the new reference
    assert_eq!(session.on_sentence(&rmc(110.0), at(200)).row, None);
}

#[test]
fn pending_course_change_is_logged_on_the_tick() {
    let config = Config {
        course_change_degrees: Some(45.0),
        course_change_delay: Duration::minutes(1),
        device_timeout: Duration::minutes(10),
        ..Config::default()
    };
    let mut session = Session::new(config);
    session.on_sentence(&rmc(10.0), at(0));
    session.on_sentence(&rmc(100.0), at(1));
    assert_eq!(session.tick(at(30), &[]).row, None);
    assert_eq!(session.tick(at(61), &[]).causes, vec![Cause::CourseChange]);
    assert_eq!(session.tick(at(62), &[]).row, None);
}

#[test]
fn distance_fires_and_resets() {
    let config = Config { distance_threshold: Some(1.0), ..Config::default() };
    let mut session = Session::new(config);

    let fired: Vec<bool> = [30.0, 30.5, 31.0, 31.5, 32.0]
        .iter()
        .enumerate()
        .map(|(i, lat)| session.on_sentence(&gga(*lat), at(i as i64)).row.is_some())
        .collect();
    assert_eq!(fired, vec![false, false, true, false, true]);
}

#[test]
fn waypoint_arrival_is_logged_once_per_leg() {
    let mut session = Session::new(Config::default());
    let arrival = |from: &str, to: &str| {
        nmea(&format!("GPRMB,A,0.66,L,{},{},4917.24,N,12309.57,W,001.3,052.5,000.5,A", from, to))
    };

    let outcome = session.on_sentence(&arrival("003", "004"), at(0));
    assert_eq!(outcome.causes, vec![Cause::Waypoint]);
    assert_eq!(outcome.row.unwrap().remarks, "Waypoint 003 reached, next 004, No GPS-Signal !");
    assert_eq!(session.on_sentence(&arrival("003", "004"), at(1)).row, None);
    assert_eq!(session.on_sentence(&arrival("004", "005"), at(2)).causes, vec![Cause::Waypoint]);
}

#[test]
fn silent_instruments_expire() {
    let mut session = Session::new(Config::default());
    session.on_sentence(&nmea("SDDPT,12.5,0.5"), at(0));
    session.tick(at(10), &[]);
    assert_eq!(session.state().depth.get(), Some(12.5));
    session.tick(at(11), &[]);
    assert_eq!(session.state().depth.get(), None);
}

#[test]
fn engine_runs_are_logged() {
    let mut config = Config::default();
    config.rpm.enabled = true;
    let mut session = Session::new(config);

    let started = session.on_sentence(&nmea("IIRPM,E,1,1500,10.0,A"), at(0));
    assert_eq!(started.causes, vec![Cause::Engine]);
    assert_eq!(started.row.unwrap().remarks, "Engine 1 on, No GPS-Signal !");
    assert_eq!(session.on_sentence(&nmea("IIRPM,E,1,1600,10.0,A"), at(60)).row, None);

    let stopped = session.on_sentence(&nmea("IIRPM,E,1,0,10.0,A"), at(90 * 60));
    let row = stopped.row.unwrap();
    assert_eq!(row.remarks, "Engine 1 off (01:30), No GPS-Signal !");
    assert_eq!(row.engine1_hours, "01:30");
}

#[test]
fn timer_follows_the_clock() {
    let config = Config { timer_interval: Some(Duration::minutes(60)), ..Config::default() };
    let mut session = Session::new(config);
    assert_eq!(session.tick(at(30 * 60), &[]).row, None);
    assert_eq!(session.tick(at(59 * 60), &[]).row, None);
    let outcome = session.tick(at(60 * 60), &[]);
    assert_eq!(outcome.causes, vec![Cause::Timer]);
    assert_eq!(outcome.row.unwrap().time, "13:00");
    assert_eq!(session.tick(at(60 * 60 + 30), &[]).row, None);
}

#[test]
fn timer_keeps_running_after_the_gps_goes_quiet() {
    let config = Config { timer_interval: Some(Duration::minutes(60)), ..Config::default() };
    let mut session = Session::new(config);
    session.on_sentence(&rmc(84.4), at(0));

    let times: Vec<String> = (1..=180)
        .filter_map(|minute| session.tick(at(minute * 60), &[]).row)
        .map(|row| row.time)
        .collect();
    assert_eq!(times, vec!["13:00", "14:00", "15:00"]);
    assert_eq!(session.state().utc, None);
    assert_eq!(session.manual_entry(at(3 * 3600)).time, "15:00");
}

#[test]
fn guard_change_at_watch_start() {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
    let plan = WatchPlan::new(start, Duration::hours(4), 2).unwrap();
    let mut session = Session::new(Config::default());

    // 12:00 UTC is the start of the second watch of day 1
    let local = at(0).naive_utc();
    let boundaries = plan.boundaries_at(local);
    assert!(boundaries.contains(&local));
    let outcome = session.tick(at(0), &boundaries);
    assert_eq!(outcome.causes, vec![Cause::GuardChange]);
    assert_eq!(session.tick(at(20), &boundaries).row, None);
    assert_eq!(session.tick(at(60), &boundaries).row, None);
}

#[test]
fn manual_entry_with_and_without_fix() {
    let mut session = Session::new(Config::default());
    let row = session.manual_entry(at(0));
    assert_eq!(row.remarks, "No GPS-Signal !");
    assert_eq!(row.latitude, "");

    session.on_sentence(&rmc(84.4), at(1));
    let row = session.manual_entry(at(2));
    assert_eq!(row.remarks, "");
    assert_eq!(row.latitude, "054° 30.0000' N");
    assert_eq!(row.longitude, "010° 00.0000' E");
    assert_eq!(row.date, "2024-06-01");
    assert_eq!(row.to_string().split(';').count(), 26);
}
