//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself so that
//! editors which save by writing a new file and renaming it over the old
//! one are still picked up.
//!
//! A single save produces a burst of events (truncate, write, rename). They
//! are coalesced on a reload thread and the file is read once the burst has
//! been quiet for [`DEBOUNCE`].

use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::reload_config;
use crate::config::schema::GateConfig;

/// Quiet period after the last file event before reloading.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Watches the configuration file and emits validated reloads.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GateConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GateConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive for as long
    /// as reloads are wanted; dropping it also stops the reload thread.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (event_tx, event_rx) = std_mpsc::channel::<()>();
        let file_name = self.path.file_name().map(ToOwned::to_owned);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_modify() || event.kind.is_create();
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(ToOwned::to_owned) == file_name);
                    if relevant && ours {
                        let _ = event_tx.send(());
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let path = self.path.clone();
        let tx = self.update_tx;
        thread::Builder::new()
            .name("config-reload".into())
            .spawn(move || reload_loop(&path, &event_rx, &tx))
            .map_err(notify::Error::io)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Reload once per burst of events until the watcher or the receiver goes away.
fn reload_loop(
    path: &Path,
    events: &std_mpsc::Receiver<()>,
    tx: &mpsc::UnboundedSender<GateConfig>,
) {
    while events.recv().is_ok() {
        while events.recv_timeout(DEBOUNCE).is_ok() {}

        tracing::info!(path = ?path, "Config file change detected, reloading");
        match reload_config(path) {
            Ok(new_config) => {
                if tx.send(new_config).is_err() {
                    tracing::debug!("Config receiver dropped, stopping reloads");
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rejected config reload, keeping current configuration");
            }
        }
    }
}
