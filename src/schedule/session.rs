//! Live countdown session.
//!
//! A [`Countdown`] is owned by whoever displays the schedule. It is either idle
//! or running exactly one periodic trigger. Starting a new session while one is
//! running cancels the old trigger first, so a stale schedule can never keep
//! writing to the display after it has been replaced.
//!
//! On every firing the session re-reads the clock, selects the next event and
//! publishes a [`CountdownTick`] to its [`CountdownSink`]. A full schedule
//! re-render is requested on the first tick, whenever the next-event index
//! changes, and whenever the remaining time crosses a minute boundary.

use chrono::{DateTime, Local, TimeZone};
use std::mem;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{DailySchedule, NextEvent, Remaining, compute_remaining, find_next_event};
use crate::common::constants::COUNTDOWN_TICK;
use crate::time_source::TimeSource;

/// What a sink receives once per second.
#[derive(Debug, Clone)]
pub struct CountdownTick<Tz: TimeZone = Local> {
    pub next: NextEvent<Tz>,
    pub label: String,
    pub remaining: Remaining,
    /// The schedule list should be redrawn on this tick.
    pub rerender: bool,
}

/// Display side of a countdown session.
pub trait CountdownSink: Send {
    fn publish(&mut self, tick: &CountdownTick);

    /// Redraw the whole schedule with `next_index` highlighted.
    fn render_schedule(&mut self, _schedule: &DailySchedule, _next_index: usize) {}
}

/// Per-session bookkeeping for the re-render decision.
#[derive(Debug, Clone, Default)]
pub struct CountdownState {
    last_index: Option<usize>,
    last_minute: Option<u64>,
}

impl CountdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the schedule at `now` and record what was shown.
    pub fn advance<Tz: TimeZone>(
        &mut self,
        schedule: &DailySchedule,
        now: &DateTime<Tz>,
    ) -> CountdownTick<Tz> {
        let next = find_next_event(schedule, now);
        let remaining = compute_remaining(&next.target, now);
        let minute = remaining.minute_bucket();

        let rerender = self.last_index != Some(next.index) || self.last_minute != Some(minute);
        self.last_index = Some(next.index);
        self.last_minute = Some(minute);

        let label = schedule
            .get(next.index)
            .map(|event| event.label().to_string())
            .unwrap_or_default();

        CountdownTick {
            next,
            label,
            remaining,
            rerender,
        }
    }
}

/// A source of periodic callbacks.
pub trait Trigger: Send {
    fn schedule(&self, period: Duration, callback: Box<dyn FnMut() + Send>)
    -> Box<dyn TriggerHandle>;
}

/// Handle to a scheduled periodic callback.
///
/// After `cancel` returns the callback never runs again. Cancelling twice is a
/// no-op.
pub trait TriggerHandle: Send {
    fn cancel(&mut self);
}

/// Periodic trigger backed by a worker thread.
///
/// Deadlines advance by exactly one period each firing so the countdown does not
/// drift by the callback's own running time.
pub struct ThreadTrigger;

impl Trigger for ThreadTrigger {
    fn schedule(
        &self,
        period: Duration,
        mut callback: Box<dyn FnMut() + Send>,
    ) -> Box<dyn TriggerHandle> {
        let (tx, rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let mut deadline = Instant::now() + period;
            loop {
                let wait = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {
                        callback();
                        deadline += period;
                        // Fell far behind (suspend/resume): resync instead of bursting
                        let now = Instant::now();
                        if deadline < now {
                            deadline = now + period;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Box::new(ThreadHandle {
            stop: Some(tx),
            worker: Some(handle),
        })
    }
}

struct ThreadHandle {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl TriggerHandle for ThreadHandle {
    fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take()
            && worker.thread().id() != thread::current().id()
        {
            let _ = worker.join();
        }
    }
}

impl Drop for ThreadHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

enum Session {
    Idle,
    Running {
        schedule: Arc<DailySchedule>,
        handle: Box<dyn TriggerHandle>,
    },
}

/// Owner of at most one running countdown.
pub struct Countdown {
    clock: Arc<dyn TimeSource>,
    trigger: Box<dyn Trigger>,
    period: Duration,
    session: Session,
}

impl Countdown {
    pub fn new(clock: Arc<dyn TimeSource>, trigger: Box<dyn Trigger>) -> Self {
        Self {
            clock,
            trigger,
            period: COUNTDOWN_TICK,
            session: Session::Idle,
        }
    }

    /// Change the firing period for sessions started afterwards.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Start counting down to `schedule`, replacing any running session.
    ///
    /// The first tick is published synchronously before this returns.
    pub fn start(&mut self, schedule: DailySchedule, mut sink: Box<dyn CountdownSink>) {
        self.stop();

        let schedule = Arc::new(schedule);
        let clock = Arc::clone(&self.clock);
        let mut state = CountdownState::new();

        let mut fire = {
            let schedule = Arc::clone(&schedule);
            move || {
                let now = clock.now();
                let tick = state.advance(&schedule, &now);
                sink.publish(&tick);
                if tick.rerender {
                    sink.render_schedule(&schedule, tick.next.index);
                }
            }
        };

        fire();
        let handle = self.trigger.schedule(self.period, Box::new(fire));

        self.session = Session::Running { schedule, handle };
    }

    /// Swap in a new schedule (for example after the calculation method changed).
    pub fn replace(&mut self, schedule: DailySchedule, sink: Box<dyn CountdownSink>) {
        self.start(schedule, sink);
    }

    /// Cancel the running session. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        match mem::replace(&mut self.session, Session::Idle) {
            Session::Running { mut handle, .. } => {
                handle.cancel();
                true
            }
            Session::Idle => false,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.session, Session::Running { .. })
    }

    /// Schedule of the running session.
    pub fn schedule(&self) -> Option<&DailySchedule> {
        match &self.session {
            Session::Running { schedule, .. } => Some(schedule),
            Session::Idle => None,
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Deterministic trigger for tests: callbacks run only when fired by hand.
#[cfg(any(test, feature = "testing-support"))]
pub mod testing {
    use super::{Trigger, TriggerHandle};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Slot {
        callback: Box<dyn FnMut() + Send>,
        cancellations: usize,
    }

    /// Records every scheduled callback and how often each was cancelled.
    #[derive(Clone, Default)]
    pub struct ManualTrigger {
        slots: Arc<Mutex<Vec<Slot>>>,
    }

    impl ManualTrigger {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of callbacks ever scheduled.
        pub fn scheduled(&self) -> usize {
            self.slots.lock().unwrap().len()
        }

        /// How many times the `index`-th scheduled callback was cancelled.
        pub fn cancellations(&self, index: usize) -> usize {
            self.slots.lock().unwrap()[index].cancellations
        }

        /// Fire every callback that has not been cancelled. Returns how many ran.
        pub fn fire(&self) -> usize {
            let mut slots = self.slots.lock().unwrap();
            let mut fired = 0;
            for slot in slots.iter_mut().filter(|slot| slot.cancellations == 0) {
                (slot.callback)();
                fired += 1;
            }
            fired
        }
    }

    impl Trigger for ManualTrigger {
        fn schedule(
            &self,
            _period: Duration,
            callback: Box<dyn FnMut() + Send>,
        ) -> Box<dyn TriggerHandle> {
            let mut slots = self.slots.lock().unwrap();
            slots.push(Slot {
                callback,
                cancellations: 0,
            });
            Box::new(ManualHandle {
                slots: Arc::clone(&self.slots),
                index: slots.len() - 1,
                cancelled: false,
            })
        }
    }

    struct ManualHandle {
        slots: Arc<Mutex<Vec<Slot>>>,
        index: usize,
        cancelled: bool,
    }

    impl TriggerHandle for ManualHandle {
        fn cancel(&mut self) {
            if self.cancelled {
                return;
            }
            self.cancelled = true;
            if let Ok(mut slots) = self.slots.lock() {
                slots[self.index].cancellations += 1;
            }
        }
    }
}
