//! Main application entry point.
//!
//! Parses the command line, sets up logging and the configuration directory, and
//! hands the selected page to [`Miqat`].

use anyhow::Result;
use std::sync::Arc;

use miqat::args::{self, CliAction, ParsedArgs};
use miqat::common::constants::EXIT_FAILURE;
use miqat::common::logger::Log;
use miqat::time_source::{self, ShiftedTimeSource};
use miqat::{Miqat, config, log_error_exit, log_pipe};

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            page,
            page_args,
            heading,
            log_file,
            start_time,
        } => {
            Log::set_debug(debug_enabled);

            if let Some(start) = start_time {
                time_source::init_time_source(Arc::new(ShiftedTimeSource::starting_at(start)));
            }

            // Keep the guard alive so the log file is flushed before exiting
            let log_guard = match log_file {
                Some(path) => Some(Log::start_file_logging(path)?),
                None => None,
            };

            config::set_config_dir(config_dir)?;

            let result = Miqat::new(page)
                .with_args(page_args)
                .with_heading(heading)
                .run();

            if let Err(e) = result {
                log_pipe!();
                log_error_exit!("{e:#}");
                drop(log_guard);
                std::process::exit(EXIT_FAILURE);
            }
            Ok(())
        }
    }
}
