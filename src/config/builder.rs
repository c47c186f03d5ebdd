//! Default configuration file generation.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::common::constants::*;

/// Write a commented default config to `path`.
///
/// Coordinates are left unset: the user is told where to put them and the
/// pages report the location as unavailable until then.
pub fn create_default_config(path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let events = DEFAULT_EVENTS
        .iter()
        .map(|e| format!("\"{e}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let content = ConfigBuilder::new()
        .add_section("Location")
        .add_setting(
            "location",
            &format!("\"{DEFAULT_LOCATION_MODE}\""),
            "\"manual\" (latitude/longitude below), \"auto\" (IP lookup) or \"none\"",
        )
        .add_commented_setting("latitude", "21.422500", "Geographic latitude (-90 to 90)")
        .add_commented_setting("longitude", "39.826200", "Geographic longitude (-180 to 180)")
        .add_setting(
            "reverse_geocode",
            &DEFAULT_REVERSE_GEOCODE.to_string(),
            "Resolve a place name for the header",
        )
        .add_section("Prayer times")
        .add_setting(
            "method",
            &DEFAULT_METHOD.to_string(),
            &format!("Calculation method id ({MINIMUM_METHOD}-{MAXIMUM_METHOD})"),
        )
        .add_setting("events", &format!("[{events}]"), "Prayers shown, in order")
        .add_setting(
            "provider_url",
            &format!("\"{DEFAULT_PROVIDER_URL}\""),
            "Prayer time API",
        )
        .add_section("Display")
        .add_setting(
            "time_format",
            &format!("\"{DEFAULT_TIME_FORMAT}\""),
            "\"24h\" or \"12h\"",
        )
        .build();

    fs::write(path, content + "\n").context("Failed to write default config file")?;
    Ok(())
}

enum EntryType {
    Section,
    Setting { line: String, comment: String },
}

struct ConfigEntry {
    content: String,
    entry_type: EntryType,
}

/// Builds a config file with comments aligned in one column.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry {
            content: format!("#[{title}]"),
            entry_type: EntryType::Section,
        });
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        let line = format!("{key} = {value}");
        self.entries.push(ConfigEntry {
            content: line.clone(),
            entry_type: EntryType::Setting {
                line,
                comment: format!("# {comment}"),
            },
        });
        self
    }

    /// A setting shipped commented out, for the user to fill in.
    fn add_commented_setting(self, key: &str, value: &str, comment: &str) -> Self {
        self.add_setting(&format!("# {key}"), value, comment)
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match &entry.entry_type {
                EntryType::Setting { line, .. } => Some(line.len()),
                EntryType::Section => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry.entry_type {
                EntryType::Section => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(entry.content);
                    first_section = false;
                }
                EntryType::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.join("\n")
    }
}
