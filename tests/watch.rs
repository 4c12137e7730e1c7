use chrono::{Duration, NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;

use sailstats_logbook::watch::codec::{self, DateSpan};
use sailstats_logbook::watch::time::parse_watch_time;
use sailstats_logbook::watch::{Member, WatchDay, WatchPlan};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
}

fn crew_plan() -> WatchPlan {
    let mut plan = WatchPlan::new(start(), Duration::hours(5), 3).unwrap();
    let base = plan.day_mut(0).unwrap();
    base.set_members(0, vec![Member::new("Anna"), Member::pinned("Skipper")]);
    base.set_members(1, vec![Member::new("Ben")]);
    base.set_members(2, vec![Member::new("Carl"), Member::new("Dora")]);
    plan.recalculate();
    plan
}

#[test]
fn five_hour_default_covers_the_day() {
    let plan = crew_plan();
    for day in &plan.days {
        let lengths: Vec<i64> = day.intervals.iter().map(|i| i.duration.num_minutes()).collect();
        assert_eq!(lengths, vec![300, 300, 300, 300, 240]);
        assert_eq!(day.total(), Duration::hours(24));
        for pair in day.intervals.windows(2) {
            assert_eq!(pair[0].end() + Duration::minutes(1), pair[1].start);
        }
    }
}

#[test]
fn crew_rotates_over_the_trip() {
    let plan = crew_plan();
    let names = |day: usize| -> Vec<String> {
        plan.days[day]
            .intervals
            .iter()
            .map(|i| i.members.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(" "))
            .collect()
    };
    assert_eq!(names(1), vec!["Anna *Skipper", "Ben", "Carl Dora", "Anna", "Ben"]);
    assert_eq!(names(2), vec!["Carl Dora *Skipper", "Anna", "Ben", "Carl Dora", "Anna"]);
    assert!(plan.shift);
}

#[test]
fn stored_plan_reads_back_equal() {
    let plan = crew_plan();
    let lines = codec::encode_plan(&plan);
    assert_eq!(lines.len(), 1 + 4 * 5);
    assert_eq!(lines[0], "#1.2#\t6/1/2024\t08:00\t1\t3");

    assert_eq!(codec::decode_plan(&lines).unwrap(), plan);
    for day in &plan.days {
        assert_eq!(codec::decode_day(&lines, day.day).unwrap().as_ref(), Some(day));
    }
    assert_eq!(WatchPlan::load_or_default(&lines), plan);
}

#[test]
fn night_watch_spans_two_dates() {
    let plan = crew_plan();
    let night = &plan.days[1].intervals[3];
    assert_eq!(night.start, start() + Duration::hours(15));
    assert_eq!(
        DateSpan::of(night),
        DateSpan::Range(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
        )
    );
    let line = &codec::encode_day(&plan.days[1])[3];
    assert_eq!(line, "1\t160\t05:00\t6/1/2024\\n6/2/2024\t23,00,03,59\tAnna");
}

#[test]
fn editing_one_day_rewrites_only_its_block() {
    let mut plan = crew_plan();
    let mut lines = codec::encode_plan(&plan);

    let day2 = plan.day_mut(2).unwrap();
    assert!(day2.split(4));
    assert!(day2.flip(0, 1));
    let day2 = day2.clone();
    assert!(codec::replace_day(&mut lines, &day2));

    assert_eq!(lines.len(), 1 + 4 * 5 + 1);
    let stored = codec::decode_plan(&lines).unwrap();
    assert_eq!(stored.days[2], day2);
    assert_eq!(stored.days[1], plan.days[1]);
    assert_eq!(stored.days[3], plan.days[3]);
}

#[test]
fn unknown_file_starts_fresh() {
    let lines = vec!["date;time;latitude".to_string()];
    assert_eq!(WatchPlan::load_or_default(&lines), WatchPlan::default());
    assert_eq!(WatchPlan::load_or_default(&[]), WatchPlan::default());
}

#[test]
fn current_watch_from_typed_time() {
    let plan = crew_plan();
    let time = parse_watch_time("1430").unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap().and_time(time);

    let watch = plan.current_watch(now).unwrap();
    assert_eq!(watch.day, 2);
    assert_eq!(watch.column, 1);
    assert_eq!(watch.members, vec![Member::new("Anna")]);
    assert_eq!(watch.end.format("%H:%M").to_string(), "17:59");
}

#[test]
fn rebased_plan_starts_at_the_chosen_day() {
    let mut plan = crew_plan();
    let day3 = plan.days[3].clone();
    assert!(plan.rebase(3));
    assert_eq!(plan.start, day3.start);
    assert_eq!(plan.days[0].intervals, day3.intervals);
    assert_eq!(plan.days[1].start, day3.start);
    assert_eq!(plan.days.len(), 4);
}

#[test]
fn day_zero_pattern_edits_flow_into_the_trip() {
    let mut base = WatchDay::build(0, start(), Duration::hours(6)).unwrap();
    assert!(base.merge(&[2, 3]));
    base.set_members(0, vec![Member::new("Anna")]);
    base.set_members(1, vec![Member::new("Ben")]);
    base.set_members(2, vec![Member::pinned("Night")]);
    let plan = WatchPlan::calculate(base, Duration::hours(6), 2);

    let day1: Vec<_> = plan.days[1].intervals.iter().map(|i| i.members.clone()).collect();
    assert_eq!(
        day1,
        vec![vec![Member::new("Anna")], vec![Member::new("Ben")], vec![Member::pinned("Night")]]
    );
    let day2: Vec<_> = plan.days[2].intervals.iter().map(|i| i.members.clone()).collect();
    assert_eq!(
        day2,
        vec![vec![Member::new("Anna")], vec![Member::new("Ben")], vec![Member::pinned("Night")]]
    );
    assert_eq!(plan.days[2].intervals[2].duration, Duration::hours(12));
}
