//! Stored form of a watch plan.
//!
//! The file starts with a header
//!
//!  `#1.2#<TAB>start date<TAB>start time<TAB>shift<TAB>trip days`
//!
//! followed by one line per watch, day 0 first:
//!
//!  `day<TAB>width<TAB>length HH:MM<TAB>dates<TAB>fH,fM,tH,tM<TAB>members`
//!
//! Dates are written `M/D/YYYY`. A watch crossing midnight carries both dates
//! separated by the two character token `\n`; members are separated by the
//! same token. Backslashes and tabs in names are escaped.
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::rotation::WatchPlan;
use super::schedule::{WatchDay, WatchInterval};
use super::time::{format_date, format_length, parse_date, parse_length};
use super::{CodecError, Member};

/// Format tag of the header line
pub const FORMAT_TAG: &str = "#1.2#";

/// Token separating dates and members within one field
const SEPARATOR: &str = "\\n";

/// Dates a watch is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpan {
    Single(NaiveDate),
    /// Start and end date of a watch crossing midnight
    Range(NaiveDate, NaiveDate),
}

impl DateSpan {
    pub fn of(interval: &WatchInterval) -> DateSpan {
        if interval.crosses_midnight() {
            DateSpan::Range(interval.start.date(), interval.end().date())
        } else {
            DateSpan::Single(interval.start.date())
        }
    }

    pub fn start(&self) -> NaiveDate {
        match *self {
            DateSpan::Single(d) | DateSpan::Range(d, _) => d,
        }
    }

    fn encode(&self) -> String {
        match *self {
            DateSpan::Single(d) => format_date(d),
            DateSpan::Range(a, b) => format!("{}{}{}", format_date(a), SEPARATOR, format_date(b)),
        }
    }

    fn decode(s: &str) -> Option<DateSpan> {
        match s.split_once(SEPARATOR) {
            Some((a, b)) => Some(DateSpan::Range(parse_date(a)?, parse_date(b)?)),
            None => Some(DateSpan::Single(parse_date(s)?)),
        }
    }
}

/// Parameters stored in the header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub start: NaiveDateTime,
    pub shift: bool,
    pub trip_days: u32,
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('\t', "\\t").replace('\n', " ")
}

/// Splits a member field at unescaped separators and unescapes the names
fn split_members(field: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            current.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => names.push(std::mem::take(&mut current)),
            Some('t') => current.push('\t'),
            Some(other) => current.push(other),
            None => current.push('\\'),
        }
    }
    names.push(current);
    names.into_iter().filter(|n| !n.trim().is_empty()).collect()
}

pub fn encode_header(h: &Header) -> String {
    format!(
        "{}\t{}\t{:02}:{:02}\t{}\t{}",
        FORMAT_TAG,
        format_date(h.start.date()),
        h.start.hour(),
        h.start.minute(),
        u8::from(h.shift),
        h.trip_days
    )
}

pub fn decode_header(line: &str) -> Result<Header, CodecError> {
    let mut fields = line.split('\t');
    if fields.next() != Some(FORMAT_TAG) {
        return Err(CodecError::MissingHeader);
    }
    let malformed = |reason: &str| CodecError::Malformed { line: 0, reason: reason.to_string() };
    let date = fields.next().and_then(parse_date).ok_or_else(|| malformed("start date"))?;
    let time = fields
        .next()
        .and_then(|t| NaiveTime::parse_from_str(t.trim(), "%H:%M").ok())
        .ok_or_else(|| malformed("start time"))?;
    let shift = match fields.next().map(str::trim) {
        Some("1") => true,
        Some("0") => false,
        _ => return Err(malformed("shift flag")),
    };
    let trip_days = fields
        .next()
        .and_then(|d| d.trim().parse().ok())
        .ok_or_else(|| malformed("trip days"))?;
    Ok(Header { start: date.and_time(time), shift, trip_days })
}

pub fn encode_interval(day: u32, i: &WatchInterval) -> String {
    let end = i.end();
    let members: Vec<String> = i.members.iter().map(|m| escape(&m.to_string())).collect();
    format!(
        "{}\t{}\t{}\t{}\t{:02},{:02},{:02},{:02}\t{}",
        day,
        i.width,
        format_length(i.duration),
        DateSpan::of(i).encode(),
        i.start.hour(),
        i.start.minute(),
        end.hour(),
        end.minute(),
        members.join(SEPARATOR)
    )
}

/// One line per watch of `day`
pub fn encode_day(day: &WatchDay) -> Vec<String> {
    day.intervals.iter().map(|i| encode_interval(day.day, i)).collect()
}

/// Header plus every day of the plan
pub fn encode_plan(plan: &WatchPlan) -> Vec<String> {
    let header = Header { start: plan.start, shift: plan.shift, trip_days: plan.trip_days };
    std::iter::once(encode_header(&header))
        .chain(plan.days.iter().flat_map(encode_day))
        .collect()
}

/// Day number of a stored line
fn day_of(line: &str) -> Option<u32> {
    line.split('\t').next()?.trim().parse().ok()
}

/// Reads one watch line, `index` is only used for error messages
pub fn decode_interval(line: &str, index: usize) -> Result<(u32, WatchInterval), CodecError> {
    let malformed = |reason: &str| CodecError::Malformed { line: index, reason: reason.to_string() };
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 5 {
        return Err(malformed("too few fields"));
    }
    let day = fields[0].trim().parse().map_err(|_| malformed("day number"))?;
    let width = fields[1].trim().parse().map_err(|_| malformed("column width"))?;
    let duration: Duration = parse_length(fields[2]).ok_or_else(|| malformed("watch length"))?;
    let dates = DateSpan::decode(fields[3]).ok_or_else(|| malformed("date"))?;
    let times: Vec<u32> = fields[4]
        .split(',')
        .map(|t| t.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|_| malformed("times"))?;
    if times.len() != 4 {
        return Err(malformed("times"));
    }
    let from = NaiveTime::from_hms_opt(times[0], times[1], 0).ok_or_else(|| malformed("start time"))?;
    let members = fields
        .get(5)
        .map(|m| split_members(m).iter().map(|n| Member::parse(n)).collect())
        .unwrap_or_default();
    Ok((
        day,
        WatchInterval { start: dates.start().and_time(from), duration, width, members },
    ))
}

/// Linear scan for the first line of `day`, skipping the header
fn block_start(lines: &[String], day: u32) -> Option<usize> {
    lines
        .iter()
        .position(|l| !l.starts_with(FORMAT_TAG) && day_of(l) == Some(day))
}

fn block_end(lines: &[String], start: usize, day: u32) -> usize {
    lines[start..]
        .iter()
        .position(|l| day_of(l) != Some(day))
        .map_or(lines.len(), |n| start + n)
}

/// Reads the watches of `day`.
///
/// The block starts at the first line of that day and ends at the first line
/// of another day.
pub fn decode_day(lines: &[String], day: u32) -> Result<Option<WatchDay>, CodecError> {
    match lines.first() {
        Some(first) if first.starts_with(FORMAT_TAG) => {}
        _ => return Err(CodecError::MissingHeader),
    }
    let Some(start) = block_start(lines, day) else {
        return Ok(None);
    };
    let end = block_end(lines, start, day);
    let intervals = lines[start..end]
        .iter()
        .enumerate()
        .map(|(n, l)| decode_interval(l, start + n).map(|(_, i)| i))
        .collect::<Result<Vec<_>, _>>()?;
    let day_start = intervals.first().map(|i| i.start);
    Ok(day_start.map(|s| WatchDay { day, start: s, intervals }))
}

/// Reads a whole plan
pub fn decode_plan(lines: &[String]) -> Result<WatchPlan, CodecError> {
    let header = decode_header(lines.first().ok_or(CodecError::MissingHeader)?)?;
    let mut days = Vec::new();
    for d in 0..=header.trip_days {
        match decode_day(lines, d)? {
            Some(day) => days.push(day),
            None => break,
        }
    }
    let default_watch = days
        .first()
        .and_then(|d| d.intervals.first())
        .map_or_else(Duration::zero, |i| i.duration);
    Ok(WatchPlan {
        start: header.start,
        default_watch,
        trip_days: header.trip_days,
        shift: header.shift,
        days,
    })
}

/// Rewrites the block of `day.day` in place; false if the day is not stored
pub fn replace_day(lines: &mut Vec<String>, day: &WatchDay) -> bool {
    let Some(start) = block_start(lines, day.day) else {
        return false;
    };
    let end = block_end(lines, start, day.day);
    lines.splice(start..end, encode_day(day));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn plan() -> WatchPlan {
        let mut base = WatchDay::build(0, at(20, 0), Duration::hours(5)).unwrap();
        base.set_members(0, vec![Member::new("Anna"), Member::pinned("Skipper")]);
        base.set_members(1, vec![Member::new("Ben\tTab"), Member::new("C\\D")]);
        WatchPlan::calculate(base, Duration::hours(5), 2)
    }

    #[test]
    fn header_line() {
        let lines = encode_plan(&plan());
        assert_eq!(lines[0], "#1.2#\t6/1/2024\t20:00\t1\t2");
        assert_eq!(decode_header(&lines[0]).unwrap().start, at(20, 0));
    }

    #[test]
    fn midnight_watch_has_two_dates() {
        let lines = encode_plan(&plan());
        assert_eq!(lines[1], "0\t160\t05:00\t6/1/2024\\n6/2/2024\t20,00,00,59\tAnna\\n*Skipper");
        assert_eq!(lines[2], "0\t160\t05:00\t6/2/2024\t01,00,05,59\tBen\\tTab\\nC\\\\D");
    }

    #[test]
    fn day_round_trip() {
        let plan = plan();
        let lines = encode_plan(&plan);
        for day in &plan.days {
            assert_eq!(decode_day(&lines, day.day).unwrap().as_ref(), Some(day));
        }
        assert_eq!(decode_day(&lines, 9).unwrap(), None);
    }

    #[test]
    fn plan_round_trip() {
        let plan = plan();
        assert_eq!(decode_plan(&encode_plan(&plan)).unwrap(), plan);
    }

    #[test]
    fn missing_header_gives_fresh_plan() {
        let lines = vec!["0\t160\t05:00\t6/1/2024\t20,00,00,59\tAnna".to_string()];
        assert_eq!(decode_day(&lines, 0), Err(CodecError::MissingHeader));
        assert_eq!(WatchPlan::load_or_default(&lines), WatchPlan::default());
        let unknown = vec!["#1.1#\t6/1/2024\t20:00\t0\t2".to_string()];
        assert_eq!(WatchPlan::load_or_default(&unknown), WatchPlan::default());
    }

    #[test]
    fn replace_day_rewrites_one_block() {
        let mut plan = plan();
        let mut lines = encode_plan(&plan);
        let before = lines.clone();
        let day1 = plan.day_mut(1).unwrap();
        assert!(day1.merge(&[0, 1]));
        let day1 = day1.clone();
        assert!(replace_day(&mut lines, &day1));

        assert_eq!(lines.len(), before.len() - 1);
        assert_eq!(decode_day(&lines, 1).unwrap(), Some(day1));
        assert_eq!(decode_day(&lines, 0).unwrap().as_ref(), plan.day(0));
        assert_eq!(decode_day(&lines, 2).unwrap().as_ref(), plan.day(2));
        assert!(!replace_day(&mut lines, &WatchDay { day: 7, start: at(0, 0), intervals: Vec::new() }));
    }
}
