//! Core application loop.
//!
//! Runs the selected page once and, when it left a countdown running, installs
//! the signal handlers and keeps the process alive to serve it:
//!
//! - Shutdown signals stop the countdown before exiting
//! - Reload (SIGUSR2 or a config file change) reloads the configuration,
//!   rebuilds the providers and runs the page again
//! - A calendar date change refetches timings for the new day
//!
//! Every path that shows a new schedule goes through the page, which replaces
//! the running session. A failed refetch stops the countdown and leaves the
//! loop waiting for the next reload or date change.

use anyhow::Result;
use chrono::NaiveDate;
use reqwest::blocking::Client;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::RecvTimeoutError;

use crate::{
    common::{constants::DATE_CHECK_INTERVAL, utils::TerminalGuard},
    config::{self, Config, LocationMode},
    display::TerminalSink,
    pages::{PageContext, PageInit},
    providers::{
        AladhanClient, BoundedLocation, ConfiguredLocation, DisabledLocation, FixedHeading,
        IpLocation, LocationSource, NoPlaceNames, NominatimResolver, PlaceNameResolver,
    },
    schedule::{Countdown, CountdownSink, ThreadTrigger},
    signals::{SignalMessage, SignalState},
    tally::CounterStore,
    time_source::TimeSource,
};

/// Parameters for creating a Core instance.
pub(crate) struct CoreParams {
    pub config: Config,
    /// Installs the signal handlers once a countdown needs serving.
    pub signals: fn() -> Result<SignalState>,
    pub page: PageInit,
    pub page_args: Vec<String>,
    pub heading: Option<f64>,
    pub clock: Arc<dyn TimeSource>,
    pub counter: Box<dyn CounterStore>,
    pub client: Client,
}

/// Network-backed collaborators derived from the configuration.
struct Providers {
    location: Box<dyn LocationSource>,
    places: Box<dyn PlaceNameResolver>,
    timings: AladhanClient,
}

impl Providers {
    fn from_config(config: &Config, client: &Client) -> Self {
        let location: Box<dyn LocationSource> = match config.location_mode() {
            LocationMode::Manual => {
                Box::new(BoundedLocation::new(ConfiguredLocation::new(config.coordinates())))
            }
            LocationMode::Auto => Box::new(BoundedLocation::new(IpLocation::new(client.clone()))),
            LocationMode::None => Box::new(DisabledLocation),
        };

        let places: Box<dyn PlaceNameResolver> = if config.reverse_geocode() {
            Box::new(NominatimResolver::new(client.clone()))
        } else {
            Box::new(NoPlaceNames)
        };

        Self {
            location,
            places,
            timings: AladhanClient::with_base_url(client.clone(), config.provider_url()),
        }
    }
}

/// Owns the countdown and everything pages run against.
pub(crate) struct Core {
    config: Config,
    signals: fn() -> Result<SignalState>,
    page: PageInit,
    page_args: Vec<String>,
    clock: Arc<dyn TimeSource>,
    countdown: Countdown,
    heading: FixedHeading,
    counter: Box<dyn CounterStore>,
    client: Client,
    providers: Providers,
    /// Date the current schedule was fetched for.
    shown_date: NaiveDate,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        let providers = Providers::from_config(&params.config, &params.client);
        let countdown = Countdown::new(Arc::clone(&params.clock), Box::new(ThreadTrigger));
        let shown_date = params.clock.now().date_naive();

        Self {
            config: params.config,
            signals: params.signals,
            page: params.page,
            page_args: params.page_args,
            clock: params.clock,
            countdown,
            heading: FixedHeading::new(params.heading),
            counter: params.counter,
            client: params.client,
            providers,
            shown_date,
        }
    }

    /// Run the page, then serve its countdown until shutdown.
    pub fn execute(mut self) -> Result<()> {
        if self.clock.is_simulated() {
            log_block_start!(
                "Clock shifted to {}",
                self.clock.now().format("%Y-%m-%d %H:%M:%S")
            );
        }

        self.run_page()?;

        if !self.countdown.is_running() {
            log_end!();
            return Ok(());
        }

        // Ctrl-C keeps its default behavior until here
        let signal_state = match (self.signals)() {
            Ok(state) => state,
            Err(e) => {
                self.countdown.stop();
                return Err(e);
            }
        };

        // Cursor stays hidden while the countdown redraws in place
        let _term = match TerminalGuard::new() {
            Ok(term) => Some(term),
            Err(e) => {
                log_debug!("Cursor left visible: {e}");
                None
            }
        };

        if let Err(e) = config::start_config_watcher(signal_state.signal_sender.clone()) {
            log_debug!("Config hot reload unavailable: {e}");
        }

        self.main_loop(&signal_state);

        self.countdown.stop();
        log_block_start!("Shutting down miqat...");
        log_end!();
        Ok(())
    }

    /// Run the page against the current providers.
    fn run_page(&mut self) -> Result<()> {
        self.shown_date = self.clock.now().date_naive();

        let time_format = self.config.time_format();
        let make_sink =
            move || -> Box<dyn CountdownSink> { Box::new(TerminalSink::stdout(time_format)) };

        let mut ctx = PageContext {
            config: &self.config,
            clock: Arc::clone(&self.clock),
            location: self.providers.location.as_ref(),
            places: self.providers.places.as_ref(),
            timings: &self.providers.timings,
            heading: &mut self.heading,
            counter: self.counter.as_mut(),
            countdown: &mut self.countdown,
            make_sink: &make_sink,
            args: &self.page_args,
        };
        (self.page)(&mut ctx)
    }

    fn main_loop(&mut self, signal_state: &SignalState) {
        while signal_state.running.load(Ordering::SeqCst) {
            match signal_state.signal_receiver.recv_timeout(DATE_CHECK_INTERVAL) {
                Ok(SignalMessage::Shutdown) => {
                    self.countdown.stop();
                    log_pipe!();
                    log_info!("Received shutdown signal");
                    break;
                }
                Ok(SignalMessage::Reload) => self.handle_reload(),
                Err(RecvTimeoutError::Timeout) => self.check_date_change(),
                Err(RecvTimeoutError::Disconnected) => {
                    self.countdown.stop();
                    log_pipe!();
                    log_error!("Signal channel disconnected unexpectedly");
                    break;
                }
            }
        }
    }

    fn handle_reload(&mut self) {
        self.countdown.stop();
        log_pipe!();
        log_info!("Reloading configuration");

        match Config::load() {
            Ok(config) => {
                config.log_config();
                self.providers = Providers::from_config(&config, &self.client);
                self.config = config;
            }
            Err(e) => {
                log_warning!("Keeping previous configuration: {e:#}");
            }
        }

        self.rerun_page();
    }

    fn check_date_change(&mut self) {
        let today = self.clock.now().date_naive();
        if today == self.shown_date {
            return;
        }

        self.countdown.stop();
        log_block_start!("New day, refreshing prayer times");
        self.rerun_page();
    }

    fn rerun_page(&mut self) {
        if let Err(e) = self.run_page() {
            log_error!("{e:#}");
        }
    }
}
