//! # Miqat Library
//!
//! Internal library for the miqat binary: prayer times with a live countdown,
//! the Qibla direction and a tally counter.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Miqat` builder handles resource setup and runs a page
//! - **Core Logic**: internal `core` module serves the countdown until shutdown
//! - **Pages**: `pages` registry of what can be shown
//! - **Scheduling**: `schedule` next-event selection and the countdown session
//! - **Geographic**: `geo` geodesy and the compass reading
//! - **Providers**: `providers` location, place names and remote timings
//! - **Configuration**: `config` TOML settings with hot reload
//! - **Infrastructure**: signal handling, terminal display, logging, tally storage

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

pub mod args;
pub mod config;
pub mod display;
pub mod geo;
pub mod pages;
pub mod providers;
pub mod schedule;
pub mod signals;
pub mod tally;
pub mod time_source;

mod core;
mod miqat;

pub use miqat::Miqat;
