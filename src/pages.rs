//! Pages: what `miqat <page>` shows.
//!
//! A page is an initializer run against a [`PageContext`] holding every
//! collaborator it may need. Pages never fail because the network or the
//! location did: those become a fallback block and the page returns `Ok(())`.
//! Errors are reserved for bad page arguments and local I/O.
//!
//! The `times` page leaves a countdown running in the context; the caller keeps
//! it alive. The other pages print once.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Offset};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::common::utils::TimeFormat;
use crate::config::Config;
use crate::geo::{
    CompassReading, GeoPoint, HeadingSensor, OrientationCapability, cardinal_direction,
};
use crate::providers::{
    DailyTimings, LocationError, LocationSource, PlaceNameResolver, TimingsFetchError,
    TimingsProvider,
};
use crate::schedule::{Countdown, CountdownSink, DailyEvent};
use crate::tally::{CounterStore, Tally};
use crate::time_source::TimeSource;

pub const DEFAULT_PAGE: &str = "times";

/// Needle within this many degrees of straight ahead counts as facing the Qibla.
pub const ALIGNMENT_TOLERANCE: f64 = 5.0;

pub type PageInit = fn(&mut PageContext<'_>) -> Result<()>;

/// Everything a page may use.
pub struct PageContext<'a> {
    pub config: &'a Config,
    pub clock: Arc<dyn TimeSource>,
    pub location: &'a dyn LocationSource,
    pub places: &'a dyn PlaceNameResolver,
    pub timings: &'a dyn TimingsProvider,
    pub heading: &'a mut dyn HeadingSensor,
    pub counter: &'a mut dyn CounterStore,
    pub countdown: &'a mut Countdown,
    /// Creates the display for a new countdown session.
    pub make_sink: &'a dyn Fn() -> Box<dyn CountdownSink>,
    /// Positional arguments after the page name.
    pub args: &'a [String],
}

/// Page ids mapped to their initializers.
pub struct PageRegistry {
    pages: BTreeMap<&'static str, PageInit>,
}

impl PageRegistry {
    pub fn empty() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    /// The built-in pages.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("times", times_page);
        registry.register("calendar", calendar_page);
        registry.register("qibla", qibla_page);
        registry.register("tally", tally_page);
        registry
    }

    /// Add or replace a page, returning the one it replaced.
    pub fn register(&mut self, id: &'static str, init: PageInit) -> Option<PageInit> {
        self.pages.insert(id, init)
    }

    pub fn lookup(&self, id: &str) -> Option<PageInit> {
        self.pages.get(id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pages.keys().copied()
    }
}

impl Default for PageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Acquire the position and a name to show for it.
///
/// On failure the fallback block is logged and `None` returned.
fn locate(ctx: &PageContext<'_>) -> Option<(GeoPoint, String)> {
    match ctx.location.acquire_location() {
        Ok(point) => {
            let name = ctx.places.resolve_place_name(point);
            let place = if name.is_empty() {
                point.to_string()
            } else {
                name
            };
            Some((point, place))
        }
        Err(e) => {
            log_pipe!();
            log_warning!("Location unavailable: {e}");
            match e {
                LocationError::Unsupported => {
                    log_indented!(
                        "Set latitude and longitude in miqat.toml, or use location = \"auto\""
                    )
                }
                LocationError::PermissionDenied => {
                    log_indented!("Location is turned off (location = \"none\")")
                }
                LocationError::Timeout(_) | LocationError::Unavailable(_) => {}
            }
            None
        }
    }
}

fn timings_unavailable(e: &TimingsFetchError) {
    log_pipe!();
    log_warning!("Prayer times unavailable: {e}");
}

fn expect_no_args(ctx: &PageContext<'_>, page: &str) -> Result<()> {
    if let Some(extra) = ctx.args.first() {
        anyhow::bail!("'{page}' takes no arguments (got '{extra}')");
    }
    Ok(())
}

/// Today's schedule with a live countdown to the next prayer.
pub fn times_page(ctx: &mut PageContext<'_>) -> Result<()> {
    expect_no_args(ctx, "times")?;

    let Some((point, place)) = locate(ctx) else {
        ctx.countdown.stop();
        return Ok(());
    };

    let now = ctx.clock.now();
    let today = now.date_naive();
    let schedule = match ctx
        .timings
        .fetch_daily_timings(today, point, ctx.config.method())
        .and_then(|day| {
            let schedule = day.to_schedule(&ctx.config.events())?;
            Ok((day, schedule))
        }) {
        Ok((day, schedule)) => {
            log_block_start!("Prayer times for {place}");
            match &day.hijri {
                Some(hijri) => log_indented!("{} ({hijri})", today.format("%A, %-d %B %Y")),
                None => log_indented!("{}", today.format("%A, %-d %B %Y")),
            }
            if let Some(method) = &day.method_name {
                log_indented!("Method: {method}");
            }
            if let Some(tz) = day.timezone
                && now.with_timezone(&tz).offset().fix() != now.offset().fix()
            {
                log_warning!("Times are for {tz}, the countdown follows this machine's clock");
            }
            log_pipe!();
            schedule
        }
        Err(e) => {
            ctx.countdown.stop();
            timings_unavailable(&e);
            return Ok(());
        }
    };

    ctx.countdown.replace(schedule, (ctx.make_sink)());
    Ok(())
}

/// Calendar table rows: a header, then one row per day with today marked.
pub fn calendar_rows(
    days: &[DailyTimings],
    labels: &[String],
    today: NaiveDate,
    format: TimeFormat,
) -> Vec<String> {
    let time_width = match format {
        TimeFormat::TwentyFourHour => 5,
        TimeFormat::TwelveHour => 8,
    };
    let widths: Vec<usize> = labels
        .iter()
        .map(|label| label.chars().count().max(time_width))
        .collect();

    let mut header = format!("  {:<3}", "Day");
    for (label, &width) in labels.iter().zip(&widths) {
        header.push_str(&format!("  {label:<width$}"));
    }

    let mut rows = vec![header.trim_end().to_string()];
    for day in days {
        let marker = if day.date == today { "▸" } else { " " };
        let mut row = format!("{marker} {:<3}", day.date.day());
        for (label, &width) in labels.iter().zip(&widths) {
            let cell = day
                .timings
                .get(label)
                .and_then(|value| DailyEvent::parse(label.as_str(), value).ok())
                .map(|event| format.format(event.time()))
                .unwrap_or_else(|| "--".to_string());
            row.push_str(&format!("  {cell:<width$}"));
        }
        rows.push(row.trim_end().to_string());
    }
    rows
}

fn parse_year_month(args: &[String], today: NaiveDate) -> Result<(i32, u32)> {
    match args {
        [] => Ok((today.year(), today.month())),
        [year, month] => {
            let year: i32 = year
                .parse()
                .with_context(|| format!("Invalid year '{year}'"))?;
            let month: u32 = month
                .parse()
                .with_context(|| format!("Invalid month '{month}'"))?;
            if !(1..=12).contains(&month) {
                anyhow::bail!("Month must be between 1 and 12 (got {month})");
            }
            Ok((year, month))
        }
        _ => anyhow::bail!("Usage: miqat calendar [YEAR MONTH]"),
    }
}

/// A month of prayer times.
pub fn calendar_page(ctx: &mut PageContext<'_>) -> Result<()> {
    let today = ctx.clock.now().date_naive();
    let (year, month) = parse_year_month(ctx.args, today)?;

    let Some((point, place)) = locate(ctx) else {
        return Ok(());
    };

    let days = match ctx
        .timings
        .fetch_month_timings(year, month, point, ctx.config.method())
    {
        Ok(days) => days,
        Err(e) => {
            timings_unavailable(&e);
            return Ok(());
        }
    };

    let title = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first| first.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{year}-{month:02}"));
    log_block_start!("{title} prayer times for {place}");
    for row in calendar_rows(&days, &ctx.config.events(), today, ctx.config.time_format()) {
        log_indented!("{row}");
    }
    log_end!();
    Ok(())
}

/// What to tell the user about turning toward the Qibla.
pub fn heading_guidance(reading: &CompassReading) -> String {
    match (reading.capability, reading.heading) {
        (OrientationCapability::Granted, Some(_)) => {
            if reading.is_aligned(ALIGNMENT_TOLERANCE) {
                "Facing the Qibla".to_string()
            } else if reading.needle <= 180.0 {
                format!("Turn {:.0}° right", reading.needle)
            } else {
                format!("Turn {:.0}° left", 360.0 - reading.needle)
            }
        }
        (OrientationCapability::Granted, None) => {
            "No heading reported, bearing is from true north".to_string()
        }
        (OrientationCapability::Denied, _) => {
            "Compass access denied, bearing is from true north".to_string()
        }
        (OrientationCapability::Unsupported, _) => {
            "No compass available, pass --heading <degrees> to orient".to_string()
        }
    }
}

/// Direction and distance to the Kaaba.
pub fn qibla_page(ctx: &mut PageContext<'_>) -> Result<()> {
    expect_no_args(ctx, "qibla")?;

    let Some((point, place)) = locate(ctx) else {
        return Ok(());
    };

    let reading = CompassReading::new(point, ctx.heading);

    log_block_start!("Qibla from {place}");
    log_indented!(
        "Bearing: {:.1}° {} from true north",
        reading.bearing,
        cardinal_direction(reading.bearing)
    );
    log_indented!("Distance: {:.1} km", reading.distance_km);
    log_debug!("Heading capability: {}", reading.capability.as_str());
    log_indented!("{}", heading_guidance(&reading));
    log_end!();
    Ok(())
}

/// Show or change the tally counter.
pub fn tally_page(ctx: &mut PageContext<'_>) -> Result<()> {
    let mut tally = Tally::new(&mut *ctx.counter);

    let count = match ctx.args {
        [] => tally.count(),
        [action] => match action.as_str() {
            "inc" | "+" => tally.increment(),
            "dec" | "-" => tally.decrement(),
            "reset" => tally.reset(),
            other => anyhow::bail!("Unknown tally action '{other}' (expected inc, dec or reset)"),
        },
        _ => anyhow::bail!("Usage: miqat tally [inc|dec|reset]"),
    }
    .context("Failed to update the tally")?;

    log_block_start!("Tally: {count}");
    log_end!();
    Ok(())
}
