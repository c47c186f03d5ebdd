//! Structured terminal logging with box-drawing layout.
//!
//! Every page of miqat writes its output through these macros so that schedules,
//! compass readings and error fallbacks share one visual style:
//!
//! ```text
//! ┏ miqat v0.3.0 ━━╸
//! ┃
//! ┣ Prayer times for Makkah, Saudi Arabia
//! ┃   Fajr      04:52
//! ┃ ▶ Dhuhr     12:20
//! ╹
//! ```
//!
//! Output can be silenced at runtime (`Log::set_enabled`) for tests, and routed
//! to a file (`Log::start_file_logging`) in which case ANSI colors are stripped.
//! `log_debug!` lines are only emitted once debug output has been switched on
//! with `Log::set_debug`.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Channel for routing output to a file when --log is active
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Line shapes understood by [`Log::line`].
///
/// ## Conventions
///
/// - `BlockStart` opens a new conceptual block (`┃` spacer, then `┣ message`).
/// - `Decorated` continues a block (`┣ message`).
/// - `Indented` holds nested details (`┃   message`).
/// - `Level` lines carry a colored `[LEVEL]` tag and are used for semantic
///   messages outside the main flow; precede them with `log_pipe!` when they
///   start a block of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    BlockStart,
    Decorated,
    Indented,
    Level(Level),
    ExitError,
}

/// Severity tags for `Shape::Level` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Debug => "\x1b[32mDEBUG\x1b[0m",
            Level::Info => "\x1b[32mINFO\x1b[0m",
            Level::Warning => "\x1b[33mWARNING\x1b[0m",
            Level::Error => "\x1b[31mERROR\x1b[0m",
            Level::Critical => "\x1b[31mCRITICAL\x1b[0m",
        }
    }
}

/// Main logging interface used by the macros below.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable `log_debug!` output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Route all further output to `file_path` until the guard is dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => file.write_all(text.as_bytes())?,
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Render one line in the given shape. Called by the macros.
    pub fn line(shape: Shape, message: &str) {
        if !Self::is_enabled() {
            return;
        }
        if shape == Shape::Level(Level::Debug) && !Self::is_debug() {
            return;
        }
        write_output(&format_line(shape, message));
    }
}

/// Build the text for one logged line, including the trailing newline.
pub fn format_line(shape: Shape, message: &str) -> String {
    match shape {
        Shape::BlockStart => format!("┃\n┣ {message}\n"),
        Shape::Decorated => format!("┣ {message}\n"),
        Shape::Indented => format!("┃   {message}\n"),
        Shape::Level(level) => format!("┣[{}] {message}\n", level.tag()),
        Shape::ExitError => format!("┃\n┗[{}] {message}\n", Level::Error.tag()),
    }
}

/// Guard for file logging that flushes and joins the writer thread on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Remove `ESC [ ... m` color sequences.
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Send text to the log file if one is active, otherwise to stdout.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

// # Logging Macros

#[doc(hidden)]
#[macro_export]
macro_rules! __log_shape {
    ($shape:expr, $fmt:literal $($arg:tt)*) => {{
        if $crate::common::logger::Log::is_enabled() {
            $crate::common::logger::Log::line($shape, &format!($fmt $($arg)*));
        }
    }};
    ($shape:expr, $expr:expr) => {{
        if $crate::common::logger::Log::is_enabled() {
            $crate::common::logger::Log::line($shape, &format!("{}", $expr));
        }
    }};
}

/// Start a new block of related output.
#[macro_export]
macro_rules! log_block_start {
    ($($t:tt)*) => { $crate::__log_shape!($crate::common::logger::Shape::BlockStart, $($t)*) };
}

/// Continue the current block.
#[macro_export]
macro_rules! log_decorated {
    ($($t:tt)*) => { $crate::__log_shape!($crate::common::logger::Shape::Decorated, $($t)*) };
}

/// Nested detail line within a block.
#[macro_export]
macro_rules! log_indented {
    ($($t:tt)*) => { $crate::__log_shape!($crate::common::logger::Shape::Indented, $($t)*) };
}

/// Empty `┃` spacer line.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        if $crate::common::logger::Log::is_enabled() {
            $crate::common::logger::write_output("┃\n");
        }
    }};
}

/// Application header, printed once at startup.
#[macro_export]
macro_rules! log_version {
    () => {{
        if $crate::common::logger::Log::is_enabled() {
            let version = env!("CARGO_PKG_VERSION");
            $crate::common::logger::write_output(&format!("┏ miqat v{version} ━━╸\n"));
        }
    }};
}

/// Final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        if $crate::common::logger::Log::is_enabled() {
            $crate::common::logger::write_output("╹\n");
        }
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($($t:tt)*) => {
        $crate::__log_shape!(
            $crate::common::logger::Shape::Level($crate::common::logger::Level::Debug),
            $($t)*
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($($t:tt)*) => {
        $crate::__log_shape!(
            $crate::common::logger::Shape::Level($crate::common::logger::Level::Info),
            $($t)*
        )
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($t:tt)*) => {
        $crate::__log_shape!(
            $crate::common::logger::Shape::Level($crate::common::logger::Level::Warning),
            $($t)*
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($($t:tt)*) => {
        $crate::__log_shape!(
            $crate::common::logger::Shape::Level($crate::common::logger::Level::Error),
            $($t)*
        )
    };
}

#[macro_export]
macro_rules! log_critical {
    ($($t:tt)*) => {
        $crate::__log_shape!(
            $crate::common::logger::Shape::Level($crate::common::logger::Level::Critical),
            $($t)*
        )
    };
}

/// Error that terminates the flow (`┗[ERROR]`).
#[macro_export]
macro_rules! log_error_exit {
    ($($t:tt)*) => { $crate::__log_shape!($crate::common::logger::Shape::ExitError, $($t)*) };
}
