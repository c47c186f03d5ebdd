//! Daily-cycle scheduling: which prayer is next, and how long until it.
//!
//! A day's prayers are a [`DailySchedule`]: a non-empty list of labelled
//! times-of-day in ascending order. Given a reference instant,
//! [`find_next_event`] picks the first event strictly later than that instant on
//! the same calendar date, wrapping to the first event of the following day once
//! everything today has passed. [`compute_remaining`] turns the selected target
//! into an `HH:MM:SS` countdown.
//!
//! The live, once-per-second countdown built on these two functions lives in
//! [`session`].

pub mod session;


pub use session::{
    Countdown, CountdownSink, CountdownState, CountdownTick, ThreadTrigger, Trigger,
    TriggerHandle,
};

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone, Timelike};
use std::fmt;

/// Errors raised while building a schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("schedule is empty")]
    Empty,
    #[error("invalid time for {label}: '{value}' (expected HH:MM)")]
    InvalidTime { label: String, value: String },
    #[error("events out of order: {previous} is not before {next}")]
    OutOfOrder { previous: String, next: String },
}

/// A labelled time-of-day, recurring daily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyEvent {
    label: String,
    time: NaiveTime,
}

impl DailyEvent {
    pub fn new(label: impl Into<String>, hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        let label = label.into();
        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
            ScheduleError::InvalidTime {
                value: format!("{hour:02}:{minute:02}"),
                label: label.clone(),
            }
        })?;
        Ok(Self { label, time })
    }

    /// Parse a provider time string such as `"05:01"` or `"05:01 (+03)"`.
    ///
    /// Anything after the first whitespace is ignored.
    pub fn parse(label: impl Into<String>, value: &str) -> Result<Self, ScheduleError> {
        let label = label.into();
        let token = value.split_whitespace().next().unwrap_or_default();
        match NaiveTime::parse_from_str(token, "%H:%M") {
            Ok(time) => Ok(Self { label, time }),
            Err(_) => Err(ScheduleError::InvalidTime {
                label,
                value: value.to_string(),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.time.minute()
    }
}

/// A validated day of events: non-empty and in strictly ascending order.
///
/// Nothing here sorts. Order comes from the caller and is only checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    events: Vec<DailyEvent>,
}

impl DailySchedule {
    pub fn new(events: Vec<DailyEvent>) -> Result<Self, ScheduleError> {
        if events.is_empty() {
            return Err(ScheduleError::Empty);
        }
        if let Some(pair) = events.windows(2).find(|pair| pair[0].time >= pair[1].time) {
            return Err(ScheduleError::OutOfOrder {
                previous: format!("{} {}", pair[0].label, pair[0].time.format("%H:%M")),
                next: format!("{} {}", pair[1].label, pair[1].time.format("%H:%M")),
            });
        }
        Ok(Self { events })
    }

    pub fn events(&self) -> &[DailyEvent] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&DailyEvent> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DailyEvent> {
        self.events.iter()
    }
}

/// The event selected as upcoming and the absolute instant it happens at.
#[derive(Debug, Clone)]
pub struct NextEvent<Tz: TimeZone> {
    pub index: usize,
    pub target: DateTime<Tz>,
    /// The target is on the day after `now` because every event today has passed.
    pub rolled_over: bool,
}

/// Select the next event after `now`.
///
/// An event whose time equals `now` exactly has already passed.
pub fn find_next_event<Tz: TimeZone>(
    schedule: &DailySchedule,
    now: &DateTime<Tz>,
) -> NextEvent<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();

    for (index, event) in schedule.iter().enumerate() {
        let target = resolve_local(&tz, today, event.time);
        if target > *now {
            return NextEvent {
                index,
                target,
                rolled_over: false,
            };
        }
    }

    let tomorrow = today.succ_opt().unwrap_or(NaiveDate::MAX);
    NextEvent {
        index: 0,
        target: resolve_local(&tz, tomorrow, schedule.events[0].time),
        rolled_over: true,
    }
}

/// Place a wall-clock time on a date in `tz`.
///
/// Ambiguous times (clocks falling back) take the earlier instant. Times inside
/// a spring-forward gap are shifted forward by the length of the gap.
fn resolve_local<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Reading the wall time with the pre-gap offset lands past the gap
            let before = tz.offset_from_utc_datetime(&(naive - Duration::days(1))).fix();
            tz.from_utc_datetime(&(naive - before))
        }
    }
}

/// Time left until an event, split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Remaining {
    total_ms: u64,
}

impl Remaining {
    pub fn from_millis(total_ms: u64) -> Self {
        Self { total_ms }
    }

    pub fn total_millis(&self) -> u64 {
        self.total_ms
    }

    pub fn hours(&self) -> u64 {
        self.total_ms / 3_600_000
    }

    pub fn minutes(&self) -> u64 {
        (self.total_ms % 3_600_000) / 60_000
    }

    pub fn seconds(&self) -> u64 {
        (self.total_ms % 60_000) / 1000
    }

    /// Displayed whole seconds rounded up to whole minutes.
    ///
    /// Drops by one on the tick whose seconds display reaches `00`, and also
    /// differs across any skipped ticks, unlike comparing the seconds text.
    pub fn minute_bucket(&self) -> u64 {
        (self.total_ms / 1000).div_ceil(60)
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

/// `target - now`, floored at zero.
pub fn compute_remaining<Tz: TimeZone>(target: &DateTime<Tz>, now: &DateTime<Tz>) -> Remaining {
    let millis = target
        .clone()
        .signed_duration_since(now.clone())
        .num_milliseconds()
        .max(0);
    Remaining::from_millis(millis as u64)
}
