//! Clock abstraction for the countdown and date-change checks.
//!
//! All "what time is it" questions in miqat go through a [`TimeSource`] so that
//! the scheduler can be driven by a controllable clock in tests. The process-wide
//! source defaults to the system clock and can be replaced once at startup.

use chrono::{DateTime, Duration as ChronoDuration, Local};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};

/// Process-wide time source, defaults to [`RealTimeSource`].
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Source of wall-clock time.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Whether this source is driven by something other than the system clock.
    fn is_simulated(&self) -> bool {
        false
    }
}

/// System clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
pub struct FixedTimeSource {
    current: Mutex<DateTime<Local>>,
}

impl FixedTimeSource {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, time: DateTime<Local>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = time;
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        if let Ok(mut guard) = self.current.lock() {
            *guard += by;
        }
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Local> {
        match self.current.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// The system clock moved by a fixed offset, so that it reads `start` at the
/// moment it is created and runs at normal speed from there.
pub struct ShiftedTimeSource {
    offset: ChronoDuration,
}

impl ShiftedTimeSource {
    pub fn starting_at(start: DateTime<Local>) -> Self {
        Self {
            offset: start - Local::now(),
        }
    }
}

impl TimeSource for ShiftedTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now() + self.offset
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Install the process-wide time source. Later calls are ignored.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// The process-wide time source.
pub fn global() -> Arc<dyn TimeSource> {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .clone()
}

/// Parse a datetime in the format "YYYY-MM-DD HH:MM:SS" as local time.
pub fn parse_datetime(s: &str) -> Result<DateTime<Local>, String> {
    use chrono::{NaiveDateTime, TimeZone};

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| "Nonexistent local time".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_fixed_time_source_advances() {
        let start = parse_datetime("2025-03-10 12:16:00").unwrap();
        let clock = FixedTimeSource::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(ChronoDuration::seconds(90));
        assert_eq!(clock.now().minute(), 17);
        assert_eq!(clock.now().second(), 30);
        assert!(clock.is_simulated());
    }

    #[test]
    fn test_shifted_time_source_runs_from_start() {
        let start = parse_datetime("2030-01-01 04:00:00").unwrap();
        let clock = ShiftedTimeSource::starting_at(start);

        let elapsed = clock.now() - start;
        assert!(elapsed >= ChronoDuration::zero());
        assert!(elapsed < ChronoDuration::seconds(5));
        assert!(clock.is_simulated());
        assert!(!RealTimeSource.is_simulated());
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime("2025-03-10T12:16").is_err());
        assert!(parse_datetime("yesterday").is_err());
    }
}
