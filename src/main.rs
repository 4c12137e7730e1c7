use sailstats_logbook::config::{ClockMode, Config, HeadingMode, PositionFormat};
use sailstats_logbook::logbook::LogbookRow;
use sailstats_logbook::session::{Outcome, Session};
use sailstats_logbook::udpstream::UdpStream;
use sailstats_logbook::units::{DepthUnit, DistanceUnit, SpeedUnit, TemperatureUnit, VolumeUnit};
use sailstats_logbook::watch::time::{parse_date, parse_length, parse_watch_time};
use sailstats_logbook::watch::{codec, Member, WatchPlan};

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use structopt::StructOpt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, StructOpt)]
#[structopt(name = "SailStats Logbook v0.1.0",
            about = "Electronic logbook for NMEA 0183 instruments and crew watch planner.")]
enum Opt {
    /// Write logbook entries for NMEA sentences read from a file or the network
    Log(LogOpt),
    /// Calculate the crew watches of a trip
    Watch(WatchOpt),
}

#[derive(Debug, StructOpt)]
struct LogOpt {
    /// Input filename
    #[structopt(short = "f", long = "file", name = "INPUT", parse(from_os_str))]
    input_file: Option<PathBuf>,

    /// Listen to port for incoming packets [default: 1457]
    #[structopt(short, long, conflicts_with = "INPUT")]
    port: Option<u16>,

    /// Output filename
    #[structopt(short = "o", long = "output", name = "OUTPUT", parse(from_os_str))]
    output_file: Option<PathBuf>,

    /// Seconds between housekeeping ticks (staleness, guard change, timer)
    #[structopt(short, long, default_value = "1")]
    interval: i64,

    /// Watch file whose watch changes are logged as guard changes
    #[structopt(short = "w", long = "watches", parse(from_os_str))]
    watch_file: Option<PathBuf>,

    /// Speed unit: kn, m/s, km/h
    #[structopt(long, default_value = "kn")]
    speed: SpeedUnit,

    /// Wind speed unit: kn, m/s, km/h
    #[structopt(long, default_value = "kn")]
    wind_speed: SpeedUnit,

    /// Distance unit: nm, m, km
    #[structopt(long, default_value = "nm")]
    distance: DistanceUnit,

    /// Depth unit: m, ft, fm
    #[structopt(long, default_value = "m")]
    depth: DepthUnit,

    /// Temperature unit: c, f
    #[structopt(long, default_value = "c")]
    temperature: TemperatureUnit,

    /// Volume unit: l, gal
    #[structopt(long, default_value = "l")]
    volume: VolumeUnit,

    /// Log a course change of more than DEGREES
    #[structopt(long = "course-change", name = "DEGREES")]
    course_change: Option<f64>,

    /// Minutes a course change must be pending before it is logged
    #[structopt(long, default_value = "1")]
    course_delay: i64,

    /// Log every DISTANCE travelled, in the distance unit
    #[structopt(long = "every-distance", name = "DISTANCE")]
    distance_threshold: Option<f64>,

    /// Log every MINUTES on the clock
    #[structopt(long = "timer", name = "MINUTES")]
    timer: Option<i64>,

    /// Do not log waypoint arrivals
    #[structopt(long)]
    no_waypoint: bool,

    /// Host is driven by events, course and distance entries are left to it
    #[structopt(long)]
    events: bool,

    /// Use the magnetic heading
    #[structopt(long)]
    magnetic: bool,

    /// True wind angles are relative to the heading
    #[structopt(long)]
    wind_relative: bool,

    /// Write positions as degrees, minutes and seconds
    #[structopt(long)]
    dms: bool,

    /// Local time offset from UTC in hours, `lon` derives it from the position
    #[structopt(long, default_value = "0")]
    utc_offset: String,

    /// Evaluate engine RPM sentences
    #[structopt(long)]
    rpm: bool,

    /// Seconds after which a silent instrument is dropped
    #[structopt(long, default_value = "10")]
    timeout: i64,
}

#[derive(Debug, StructOpt)]
struct WatchOpt {
    /// First day of the trip, M/D/YYYY
    #[structopt(long)]
    start_date: String,

    /// Start of the first watch, e.g. 08:00 or 0800
    #[structopt(long, default_value = "00:00")]
    start_time: String,

    /// Default watch length HH:MM
    #[structopt(long = "watch", default_value = "04:00")]
    watch_length: String,

    /// Number of days of the trip
    #[structopt(long, default_value = "7")]
    days: u32,

    /// Crew of the base watches, one watch per option, members separated by
    /// `,` and static members marked with `*`
    #[structopt(short, long)]
    crew: Vec<String>,

    /// Watch file to write
    #[structopt(short = "o", long = "output", name = "OUTPUT", parse(from_os_str))]
    output_file: Option<PathBuf>,

    /// Print the watches of this day
    #[structopt(long)]
    day: Option<u32>,
}

impl LogOpt {
    fn config(&self) -> Result<Config> {
        let mut config = Config::default();
        config.units.speed = self.speed;
        config.units.wind_speed = self.wind_speed;
        config.units.distance = self.distance;
        config.units.depth = self.depth;
        config.units.temperature = self.temperature;
        config.units.volume = self.volume;
        config.course_change_degrees = self.course_change;
        config.course_change_delay = Duration::minutes(self.course_delay);
        config.distance_threshold = self.distance_threshold;
        config.timer_interval = self.timer.map(Duration::minutes);
        config.waypoint_arrival = !self.no_waypoint;
        config.events_enabled = self.events;
        config.wind_relative_to_heading = self.wind_relative;
        config.rpm.enabled = self.rpm;
        config.device_timeout = Duration::seconds(self.timeout);
        if self.magnetic {
            config.heading_mode = HeadingMode::Magnetic;
        }
        if self.dms {
            config.position_format = PositionFormat::DegreesMinutesSeconds;
        }
        config.clock = match self.utc_offset.as_str() {
            "lon" => ClockMode::FromLongitude,
            "0" => ClockMode::Utc,
            h => ClockMode::Offset(h.parse().with_context(|| format!("invalid UTC offset {}", h))?),
        };
        Ok(config)
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
    BufReader::new(file)
        .lines()
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("unable to read {}", path.display()))
}

#[derive(Debug, PartialEq)]
enum Input {
    Line(String),
    /// The socket timed out without data
    Idle,
    Closed,
}

/// Reads the next line. Bytes that are not UTF-8 are replaced, the decoder
/// then discards the sentence instead of the run ending.
fn next_input<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Input> {
    match reader.read_until(b'\n', buf) {
        Ok(0) if buf.is_empty() => Ok(Input::Closed),
        Ok(_) => {
            let line = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            Ok(Input::Line(line))
        }
        Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(Input::Idle),
        Err(e) => Err(e),
    }
}

fn write_row(writer: &mut dyn Write, outcome: Outcome, flush: bool) -> Result<()> {
    if let Some(row) = outcome.row {
        writeln!(writer, "{}", row).context("error writing output")?;
        if flush {
            writer.flush().context("unable to flush output")?;
        }
    }
    Ok(())
}

fn log(opt: LogOpt) -> Result<()> {
    let config = opt.config()?;
    let plan = match &opt.watch_file {
        Some(f) => WatchPlan::load_or_default(&read_lines(f)?),
        None => WatchPlan::default(),
    };

    let reading_from_file = opt.input_file.is_some();
    let in_stream: Box<dyn std::io::Read> = match &opt.input_file {
        Some(f) => Box::new(File::open(f).with_context(|| format!("unable to open {}", f.display()))?),
        None => {
            let address = format!("0.0.0.0:{}", opt.port.unwrap_or(1457));
            let stream = UdpStream::open(address.as_str())
                .with_context(|| format!("could not open UDP listener on {}", address))?;
            stream
                .set_read_timeout(Some(std::time::Duration::from_secs(opt.interval.max(1) as u64)))
                .context("unable to set read timeout")?;
            Box::new(stream)
        }
    };
    let writing_to_file = opt.output_file.is_some();
    let out_stream: Box<dyn Write> = match &opt.output_file {
        Some(f) => Box::new(File::create(f).with_context(|| format!("could not create file {}", f.display()))?),
        None => Box::new(std::io::stdout()),
    };

    let mut reader = BufReader::new(in_stream);
    let mut writer = BufWriter::new(out_stream);
    let mut session = Session::new(config);

    writeln!(writer, "{}", LogbookRow::headline()).context("unable to write headline")?;
    if !writing_to_file {
        writer.flush().context("unable to flush output")?;
    }

    let interval = Duration::seconds(opt.interval.max(1));
    let mut last_tick = None;
    // replayed logs run on the clock of the GPS
    let mut replay_clock = None;
    let mut buf = Vec::new();
    loop {
        let input = next_input(&mut reader, &mut buf).context("error processing line")?;
        if input == Input::Closed {
            break;
        }
        let now = if reading_from_file {
            replay_clock.unwrap_or_else(Utc::now)
        } else {
            Utc::now()
        };
        if let Input::Line(line) = input {
            let outcome = session.on_sentence(line.trim(), now);
            write_row(&mut writer, outcome, !writing_to_file)?;
            if let Some(utc) = session.state().utc {
                replay_clock = Some(utc);
            }
        }
        if last_tick.map_or(true, |t| now < t || now - t >= interval) {
            let local = session.state().local_time(now, session.config());
            let outcome = session.tick(now, &plan.boundaries_at(local));
            write_row(&mut writer, outcome, !writing_to_file)?;
            last_tick = Some(now);
        }
    }
    let decoder = session.decoder();
    info!("{} sentences accepted, {} discarded", decoder.accepted, decoder.discarded);
    writer.flush().context("unable to flush output")?;
    Ok(())
}

fn watch(opt: WatchOpt) -> Result<()> {
    let date = parse_date(&opt.start_date).ok_or_else(|| anyhow!("invalid start date {}", opt.start_date))?;
    let time = parse_watch_time(&opt.start_time).ok_or_else(|| anyhow!("invalid start time {}", opt.start_time))?;
    let length = parse_length(&opt.watch_length).ok_or_else(|| anyhow!("invalid watch length {}", opt.watch_length))?;

    let mut plan = WatchPlan::new(date.and_time(time), length, opt.days)
        .ok_or_else(|| anyhow!("watch length must be at least one minute"))?;
    if let Some(base) = plan.day_mut(0) {
        for (col, crew) in opt.crew.iter().enumerate() {
            let members = crew.split(',').filter(|m| !m.trim().is_empty()).map(Member::parse).collect();
            if !base.set_members(col, members) {
                debug!("no watch {} for crew {}", col, crew);
            }
        }
    }
    plan.recalculate();

    let out_stream: Box<dyn Write> = match &opt.output_file {
        Some(f) => Box::new(File::create(f).with_context(|| format!("could not create file {}", f.display()))?),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = BufWriter::new(out_stream);
    let lines = match opt.day {
        Some(day) => {
            let day = plan.day(day).ok_or_else(|| anyhow!("the trip has no day {}", day))?;
            codec::encode_day(day)
        }
        None => codec::encode_plan(&plan),
    };
    for line in lines {
        writeln!(writer, "{}", line).context("error writing output")?;
    }
    writer.flush().context("unable to flush output")?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Opt::from_args() {
        Opt::Log(opt) => log(opt),
        Opt::Watch(opt) => watch(opt),
    }
}
