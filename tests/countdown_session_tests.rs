//! A provider payload driven all the way to rendered countdown lines.

use chrono::{Duration, Local, TimeZone};
use miqat::common::constants::DEFAULT_EVENTS;
use miqat::common::logger::strip_ansi_codes;
use miqat::common::utils::TimeFormat;
use miqat::display::TerminalSink;
use miqat::providers::aladhan::parse_daily_payload;
use miqat::schedule::session::testing::ManualTrigger;
use miqat::schedule::{Countdown, DailySchedule};
use miqat::time_source::FixedTimeSource;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

const DAILY: &str = r#"{
    "code": 200,
    "status": "OK",
    "data": {
        "timings": {
            "Fajr": "04:55", "Sunrise": "06:12", "Dhuhr": "11:52",
            "Asr": "15:12", "Sunset": "17:32", "Maghrib": "17:32",
            "Isha": "19:02", "Imsak": "04:45", "Midnight": "23:52"
        },
        "date": { "gregorian": { "date": "17-10-2026" } },
        "meta": { "timezone": "Asia/Riyadh", "method": { "id": 4, "name": "Umm Al-Qura" } }
    }
}"#;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Everything written since the last call, without color codes.
    fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.lock().unwrap());
        strip_ansi_codes(&String::from_utf8(bytes).unwrap())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn schedule() -> DailySchedule {
    let labels: Vec<String> = DEFAULT_EVENTS.iter().map(|s| s.to_string()).collect();
    parse_daily_payload(DAILY)
        .unwrap()
        .to_schedule(&labels)
        .unwrap()
}

struct Session {
    clock: Arc<FixedTimeSource>,
    trigger: ManualTrigger,
    countdown: Countdown,
    output: SharedBuffer,
}

impl Session {
    fn start_at(hour: u32, minute: u32) -> Self {
        let clock = Arc::new(FixedTimeSource::new(
            Local.with_ymd_and_hms(2026, 10, 17, hour, minute, 0).unwrap(),
        ));
        let trigger = ManualTrigger::new();
        let mut countdown = Countdown::new(clock.clone(), Box::new(trigger.clone()));
        let output = SharedBuffer::default();
        countdown.start(schedule(), Box::new(sink(&output)));
        Self {
            clock,
            trigger,
            countdown,
            output,
        }
    }
}

fn sink(output: &SharedBuffer) -> TerminalSink<SharedBuffer> {
    TerminalSink::new(output.clone(), false, TimeFormat::TwentyFourHour)
}

#[test]
fn test_first_tick_renders_schedule_and_countdown() {
    let session = Session::start_at(14, 0);
    let text = session.output.take();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 7, "output was:\n{text}");
    assert_eq!(lines[0], "┃   Fajr     04:55");
    assert_eq!(lines[3], "┃ ▸ Asr      15:12");
    assert_eq!(lines[6], "┗ Asr in 01:12:00");
}

#[test]
fn test_plain_output_only_on_minute_boundaries() {
    let session = Session::start_at(14, 0);
    session.output.take();

    for _ in 0..59 {
        session.clock.advance(Duration::seconds(1));
        assert_eq!(session.trigger.fire(), 1);
    }
    assert_eq!(session.output.take(), "");

    session.clock.advance(Duration::seconds(1));
    session.trigger.fire();
    let text = session.output.take();
    assert!(text.ends_with("┗ Asr in 01:11:00\n"), "output was:\n{text}");
}

#[test]
fn test_event_time_reached_moves_to_next_event() {
    let session = Session::start_at(14, 0);
    session.output.take();

    session
        .clock
        .set(Local.with_ymd_and_hms(2026, 10, 17, 15, 12, 0).unwrap());
    session.trigger.fire();

    let text = session.output.take();
    assert!(text.contains("┃ ▸ Maghrib  17:32"), "output was:\n{text}");
    assert!(text.ends_with("┗ Maghrib in 02:20:00\n"));
}

#[test]
fn test_rollover_after_last_event() {
    let session = Session::start_at(20, 0);
    let text = session.output.take();
    assert!(text.contains("┃ ▸ Fajr     04:55"), "output was:\n{text}");
    assert!(text.ends_with("┗ Fajr in 08:55:00 (tomorrow)\n"));
}

#[test]
fn test_replace_silences_old_session() {
    let mut session = Session::start_at(14, 0);
    session.output.take();

    let replacement = SharedBuffer::default();
    session.countdown.replace(schedule(), Box::new(sink(&replacement)));
    assert_eq!(session.trigger.cancellations(0), 1);
    replacement.take();

    session.clock.advance(Duration::minutes(5));
    assert_eq!(session.trigger.fire(), 1);
    assert_eq!(session.output.take(), "");
    assert!(replacement.take().ends_with("┗ Asr in 01:07:00\n"));

    assert!(session.countdown.stop());
    assert_eq!(session.trigger.fire(), 0);
    assert!(!session.countdown.is_running());
}
