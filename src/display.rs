//! Terminal rendering of a day's schedule and the live countdown.
//!
//! On a terminal the schedule block is drawn once and then redrawn in place on
//! re-render ticks, with the countdown on the line below it updated every
//! second. When output is not a terminal only re-render ticks print anything,
//! so a redirected log gets one line per minute instead of one per second.

use crossterm::style::Stylize;
use crossterm::{cursor, queue, terminal};
use std::io::{self, IsTerminal, Write};

use crate::common::utils::TimeFormat;
use crate::schedule::{CountdownSink, CountdownTick, DailySchedule};

/// Rows of the schedule block, the upcoming event marked.
pub fn schedule_rows(
    schedule: &DailySchedule,
    next_index: usize,
    format: TimeFormat,
) -> Vec<String> {
    let width = schedule
        .iter()
        .map(|event| event.label().chars().count())
        .max()
        .unwrap_or(0);

    schedule
        .iter()
        .enumerate()
        .map(|(index, event)| {
            let entry = format!("{:<width$}  {}", event.label(), format.format(event.time()));
            if index == next_index {
                format!("┃ {} {}", "▸".green(), entry.bold())
            } else {
                format!("┃   {entry}")
            }
        })
        .collect()
}

/// The countdown line, e.g. `┗ Asr in 03:29:00`.
pub fn countdown_line(tick: &CountdownTick) -> String {
    let suffix = if tick.next.rolled_over { " (tomorrow)" } else { "" };
    format!("┗ {} in {}{}", tick.label, tick.remaining, suffix)
}

/// [`CountdownSink`] writing to a terminal or any other writer.
pub struct TerminalSink<W: Write + Send> {
    out: W,
    interactive: bool,
    time_format: TimeFormat,
    countdown: String,
    /// Schedule rows currently on screen above the countdown line.
    drawn_rows: usize,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(time_format: TimeFormat) -> Self {
        let out = io::stdout();
        let interactive = out.is_terminal();
        Self::new(out, interactive, time_format)
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W, interactive: bool, time_format: TimeFormat) -> Self {
        Self {
            out,
            interactive,
            time_format,
            countdown: String::new(),
            drawn_rows: 0,
        }
    }

    fn redraw_countdown(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(terminal::ClearType::CurrentLine)
        )?;
        write!(self.out, "{}", self.countdown)?;
        self.out.flush()
    }

    fn redraw_schedule(&mut self, schedule: &DailySchedule, next_index: usize) -> io::Result<()> {
        let rows = schedule_rows(schedule, next_index, self.time_format);

        if self.interactive {
            if self.drawn_rows > 0 {
                queue!(self.out, cursor::MoveUp(self.drawn_rows as u16))?;
            }
            queue!(
                self.out,
                cursor::MoveToColumn(0),
                terminal::Clear(terminal::ClearType::FromCursorDown)
            )?;
            for row in &rows {
                writeln!(self.out, "{row}")?;
            }
            write!(self.out, "{}", self.countdown)?;
            self.drawn_rows = rows.len();
        } else {
            for row in &rows {
                writeln!(self.out, "{row}")?;
            }
            writeln!(self.out, "{}", self.countdown)?;
        }

        self.out.flush()
    }
}

impl<W: Write + Send> CountdownSink for TerminalSink<W> {
    fn publish(&mut self, tick: &CountdownTick) {
        self.countdown = countdown_line(tick);
        // Re-render ticks are drawn together with the schedule
        if self.interactive && !tick.rerender {
            let _ = self.redraw_countdown();
        }
    }

    fn render_schedule(&mut self, schedule: &DailySchedule, next_index: usize) {
        let _ = self.redraw_schedule(schedule, next_index);
    }
}

impl<W: Write + Send> Drop for TerminalSink<W> {
    fn drop(&mut self) {
        // Leave the cursor below the countdown line for whatever prints next
        if self.interactive && self.drawn_rows > 0 {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
    }
}
