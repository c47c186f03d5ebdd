//! Hot reload: watch the config directory and ask the main loop to reload.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Instant;

use crate::common::constants::WATCH_DEBOUNCE;
use crate::common::utils::private_path;
use crate::signals::SignalMessage;

const WATCHED_FILES: [&str; 2] = ["miqat.toml", "geo.toml"];

/// Whether a change to `path` concerns the configuration in `config_dir`.
///
/// Editors often save through a temporary sibling (`miqat.toml~`,
/// `.miqat.toml.swp`), so names containing a watched file name count too.
pub(crate) fn affects_config(path: &Path, config_dir: &Path) -> bool {
    if path.parent() != Some(config_dir) {
        return false;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| WATCHED_FILES.iter().any(|watched| name.contains(watched)))
        .unwrap_or(false)
}

/// Watches the configuration directory and sends [`SignalMessage::Reload`].
pub struct ConfigWatcher {
    signal_sender: Sender<SignalMessage>,
    config_dir: PathBuf,
}

impl ConfigWatcher {
    pub fn new(signal_sender: Sender<SignalMessage>, config_dir: PathBuf) -> Self {
        Self {
            signal_sender,
            config_dir,
        }
    }

    /// Spawn the watcher thread. Returns once watching has started.
    pub fn start(self) -> Result<()> {
        if !self.config_dir.is_dir() {
            log_debug!("No configuration directory to watch for hot reload");
            return Ok(());
        }

        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        // The directory, not the file, so editor rename-and-replace is seen
        watcher
            .watch(&self.config_dir, RecursiveMode::NonRecursive)
            .with_context(|| {
                format!(
                    "Failed to watch directory: {}",
                    private_path(&self.config_dir)
                )
            })?;

        log_debug!(
            "Watching {} for configuration changes",
            private_path(&self.config_dir)
        );

        let signal_sender = self.signal_sender;
        let config_dir = self.config_dir;

        thread::spawn(move || {
            let _watcher = watcher;
            let mut last_reload: Option<Instant> = None;

            for event in rx {
                if !event.paths.iter().any(|p| affects_config(p, &config_dir)) {
                    continue;
                }

                if last_reload.is_some_and(|at| at.elapsed() < WATCH_DEBOUNCE) {
                    continue;
                }

                log_debug!("Configuration file change detected");

                if signal_sender.send(SignalMessage::Reload).is_err() {
                    break;
                }
                last_reload = Some(Instant::now());
            }
        });

        Ok(())
    }
}

/// Start watching the active configuration directory.
pub fn start_config_watcher(signal_sender: Sender<SignalMessage>) -> Result<()> {
    let config_dir = super::loading::get_config_base_dir()?;
    ConfigWatcher::new(signal_sender, config_dir).start()
}
