//! Application coordinator: resource setup and hand-off to the core loop.
//!
//! ```no_run
//! use miqat::Miqat;
//!
//! # fn main() -> anyhow::Result<()> {
//! // Today's times with a live countdown
//! Miqat::new("times").run()?;
//!
//! // A month table without the version header
//! Miqat::new("calendar")
//!     .with_args(vec!["2027".into(), "3".into()])
//!     .without_headers()
//!     .run()?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;

use crate::{
    common::constants::EXIT_FAILURE,
    config::Config,
    core::{Core, CoreParams},
    pages::PageRegistry,
    providers::http_client,
    signals::setup_signal_handler,
    tally::{CounterStore, FileCounterStore, MemoryCounterStore},
};

/// Builder for configuring and running one page.
pub struct Miqat {
    page: String,
    page_args: Vec<String>,
    heading: Option<f64>,
    registry: PageRegistry,
    show_headers: bool,
}

impl Miqat {
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            page_args: Vec::new(),
            heading: None,
            registry: PageRegistry::builtin(),
            show_headers: true,
        }
    }

    /// Arguments passed through to the page
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.page_args = args;
        self
    }

    /// Device heading for the compass
    pub fn with_heading(mut self, heading: Option<f64>) -> Self {
        self.heading = heading;
        self
    }

    /// Use a custom set of pages
    pub fn with_registry(mut self, registry: PageRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Skip the version header
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Load configuration, set up providers, and run the page.
    ///
    /// Configuration errors terminate the process with exit code 1.
    pub fn run(self) -> Result<()> {
        let Some(page) = self.registry.lookup(&self.page) else {
            let known: Vec<_> = self.registry.ids().collect();
            anyhow::bail!(
                "Unknown page '{}' (available: {})",
                self.page,
                known.join(", ")
            );
        };

        if self.show_headers {
            log_version!();
        }

        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                log_error_exit!("Configuration failed");
                eprintln!("{e:?}");
                std::process::exit(EXIT_FAILURE);
            }
        };
        config.log_config();

        let client = http_client()?;

        let core = Core::new(CoreParams {
            config,
            signals: setup_signal_handler,
            page,
            page_args: self.page_args,
            heading: self.heading,
            clock: crate::time_source::global(),
            counter: counter_store(),
            client,
        });

        core.execute()
    }
}

/// The persistent tally store, or an in-memory one when there is nowhere to
/// keep it.
fn counter_store() -> Box<dyn CounterStore> {
    match FileCounterStore::default_location() {
        Ok(store) => {
            log_debug!("Tally file: {}", store.path().display());
            Box::new(store)
        }
        Err(e) => {
            log_warning!("{e}, the tally will not be saved");
            Box::new(MemoryCounterStore::default())
        }
    }
}
