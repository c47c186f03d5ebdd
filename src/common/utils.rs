//! Shared helpers: path privacy, time formatting and terminal setup.

use anyhow::Result;
use chrono::NaiveTime;
use crossterm::{cursor, execute};
use std::io::IsTerminal;
use std::path::Path;

/// Replace the home directory prefix with `~` for display.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Clock display style for schedule tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    TwentyFourHour,
    TwelveHour,
}

impl TimeFormat {
    /// Parse the `time_format` config value. Unknown values yield `None`.
    pub fn from_config(value: &str) -> Option<Self> {
        match value {
            "24h" => Some(Self::TwentyFourHour),
            "12h" => Some(Self::TwelveHour),
            _ => None,
        }
    }

    pub fn format(self, time: NaiveTime) -> String {
        match self {
            Self::TwentyFourHour => time.format("%H:%M").to_string(),
            Self::TwelveHour => time.format("%-I:%M %p").to_string(),
        }
    }
}

/// Hides the cursor for the lifetime of the guard when attached to a terminal.
///
/// Nothing is done when stdout is not a TTY (redirected output, systemd).
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    pub fn new() -> Result<Self> {
        let mut stdout = std::io::stdout();
        if !stdout.is_terminal() {
            return Ok(Self { active: false });
        }
        execute!(stdout, cursor::Hide)?;
        Ok(Self { active: true })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = execute!(std::io::stdout(), cursor::Show);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_format() {
        let time = NaiveTime::from_hms_opt(15, 45, 0).unwrap();
        assert_eq!(TimeFormat::TwentyFourHour.format(time), "15:45");
        assert_eq!(TimeFormat::TwelveHour.format(time), "3:45 PM");
        assert_eq!(TimeFormat::from_config("12h"), Some(TimeFormat::TwelveHour));
        assert_eq!(TimeFormat::from_config("am/pm"), None);
    }

    #[test]
    fn test_private_path_outside_home() {
        assert_eq!(private_path(Path::new("/etc/miqat")), "/etc/miqat");
    }
}
