//! Times and dates as the watch list writes and reads them.
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

/// Parses a time of day the way users type it into the watch grid.
///
/// Accepted are `12:30`, `12.30`, `12,30`, the four digit form `1230`, a bare
/// hour `7` and minutes without hour `,5`. An empty entry is midnight.
pub fn parse_watch_time(entry: &str) -> Option<NaiveTime> {
    let mut s = entry.trim().to_string();
    if s.is_empty() {
        return NaiveTime::from_hms_opt(0, 0, 0);
    }
    if s.starts_with(',') || s.starts_with('.') {
        s.insert(0, '0');
    }
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.insert(2, ':');
    }
    let (h, m) = match s.find(&[':', '.', ','][..]) {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s.as_str(), "0"),
    };
    let m = if m.is_empty() { "0" } else { m };
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(h, m, 0)
}

/// Parses a watch length `HH:MM`, which may be `24:00`
pub fn parse_length(s: &str) -> Option<Duration> {
    let (h, m) = s.trim().split_once(':')?;
    let h: i64 = h.trim().parse().ok()?;
    let m: i64 = m.trim().parse().ok()?;
    if h < 0 || !(0..60).contains(&m) || h * 60 + m > 24 * 60 {
        return None;
    }
    Some(Duration::minutes(h * 60 + m))
}

/// `HH:MM` of a duration
pub fn format_length(d: Duration) -> String {
    let minutes = d.num_minutes();
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// `M/D/YYYY` without leading zeros
pub fn format_date(d: NaiveDate) -> String {
    format!("{}/{}/{}", d.month(), d.day(), d.year())
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().split('/');
    let month = parts.next()?.parse().ok()?;
    let day = parts.next()?.parse().ok()?;
    let year = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
