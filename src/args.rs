//! Command-line argument parsing and processing.
//!
//! `miqat [OPTIONS] [PAGE] [PAGE ARGS]`. Options may appear anywhere. The first
//! positional argument names the page and the rest are handed to it untouched.
//! Whether the page exists is checked later against the page registry.

use chrono::{DateTime, Local};

use crate::pages::DEFAULT_PAGE;
use crate::time_source::parse_datetime;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Show a page
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        page: String,
        page_args: Vec<String>,
        /// Device heading in degrees for the qibla page
        heading: Option<f64>,
        /// Also write log output to this file
        log_file: Option<String>,
        /// Run the clock from this instant instead of now
        start_time: Option<DateTime<Local>>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or malformed arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments, the first item being the program name.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut heading: Option<f64> = None;
        let mut log_file: Option<String> = None;
        let mut start_time: Option<DateTime<Local>> = None;
        let mut positional: Vec<String> = Vec::new();

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut i = 0;
        while i < args_vec.len() {
            let arg_str = args_vec[i].as_str();
            match arg_str {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--config" | "-c" => {
                    if let Some(dir) = args_vec.get(i + 1) {
                        config_dir = Some(dir.clone());
                        i += 1;
                    } else {
                        log_warning!("Missing directory for --config. Usage: --config <directory>");
                        unknown_arg_found = true;
                    }
                }
                "--heading" => {
                    if let Some(value) = args_vec.get(i + 1) {
                        match value.parse::<f64>() {
                            Ok(degrees) if degrees.is_finite() => {
                                heading = Some(degrees.rem_euclid(360.0))
                            }
                            _ => {
                                log_warning!("Invalid heading value: {}", value);
                                unknown_arg_found = true;
                            }
                        }
                        i += 1;
                    } else {
                        log_warning!("Missing degrees for --heading. Usage: --heading <degrees>");
                        unknown_arg_found = true;
                    }
                }
                "--log" => {
                    if let Some(path) = args_vec.get(i + 1) {
                        log_file = Some(path.clone());
                        i += 1;
                    } else {
                        log_warning!("Missing file for --log. Usage: --log <file>");
                        unknown_arg_found = true;
                    }
                }
                "--at" => {
                    if let Some(value) = args_vec.get(i + 1) {
                        match parse_datetime(value) {
                            Ok(time) => start_time = Some(time),
                            Err(e) => {
                                log_warning!("{}", e);
                                unknown_arg_found = true;
                            }
                        }
                        i += 1;
                    } else {
                        log_warning!("Missing time for --at. Usage: --at \"YYYY-MM-DD HH:MM:SS\"");
                        unknown_arg_found = true;
                    }
                }
                _ if arg_str.starts_with('-') && arg_str.len() > 1 && positional.is_empty() => {
                    log_warning!("Unknown argument: {}", arg_str);
                    unknown_arg_found = true;
                }
                _ => positional.push(arg_str.to_string()),
            }
            i += 1;
        }

        let action = if display_help {
            CliAction::ShowHelp
        } else if display_version {
            CliAction::ShowVersion
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            let mut positional = positional.into_iter();
            CliAction::Run {
                debug_enabled,
                config_dir,
                page: positional
                    .next()
                    .unwrap_or_else(|| DEFAULT_PAGE.to_string()),
                page_args: positional.collect(),
                heading,
                log_file,
                start_time,
            }
        };

        ParsedArgs { action }
    }

    /// Parse the process arguments.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("miqat [OPTIONS] [PAGE] [PAGE ARGS]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("    --heading <deg>    Device heading for the qibla page");
    log_indented!("    --log <file>       Also write output to a file");
    log_indented!("    --at <datetime>    Run the clock from \"YYYY-MM-DD HH:MM:SS\"");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Pages:");
    log_indented!("times                  Today's prayer times with a live countdown (default)");
    log_indented!("calendar [YEAR MONTH]  Prayer times for a whole month");
    log_indented!("qibla                  Direction and distance to the Kaaba");
    log_indented!("tally [inc|dec|reset]  Show or change the tally counter");
    log_end!();
}
