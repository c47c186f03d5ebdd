//! Unix signal handling.
//!
//! A dedicated thread turns signals into [`SignalMessage`]s on the same channel
//! the config watcher writes to, so the main loop has a single place to wait.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

/// Messages delivered to the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    /// Reload configuration and refetch timings (SIGUSR2, config file change)
    Reload,
    /// Stop the countdown and exit (SIGTERM, SIGINT, SIGHUP)
    Shutdown,
}

/// Channel ends and the running flag shared with the signal thread.
pub struct SignalState {
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// For other producers such as the config watcher.
    pub signal_sender: Sender<SignalMessage>,
}

/// Map a raw signal number to the message it produces.
pub(crate) fn message_for(signal: i32) -> Option<SignalMessage> {
    match signal {
        SIGUSR2 => Some(SignalMessage::Reload),
        SIGINT | SIGTERM | SIGHUP => Some(SignalMessage::Shutdown),
        _ => None,
    }
}

/// Register handlers and spawn the signal thread.
pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = std::sync::mpsc::channel::<SignalMessage>();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running_clone = Arc::clone(&running);
    let sender = signal_sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            let Some(message) = message_for(sig) else {
                continue;
            };

            // The main loop reports signals once the countdown line is released
            if message == SignalMessage::Shutdown {
                running_clone.store(false, Ordering::SeqCst);
            }

            let shutdown = message == SignalMessage::Shutdown;
            if sender.send(message).is_err() || shutdown {
                break;
            }
        }
    });

    Ok(SignalState {
        running,
        signal_receiver,
        signal_sender,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_hook::consts::signal::SIGUSR1;

    #[test]
    fn test_signal_mapping() {
        assert_eq!(message_for(SIGUSR2), Some(SignalMessage::Reload));
        assert_eq!(message_for(SIGINT), Some(SignalMessage::Shutdown));
        assert_eq!(message_for(SIGTERM), Some(SignalMessage::Shutdown));
        assert_eq!(message_for(SIGHUP), Some(SignalMessage::Shutdown));
        assert_eq!(message_for(SIGUSR1), None);
    }
}
