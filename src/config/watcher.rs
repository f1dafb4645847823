//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors that
//! save by writing a temp file and renaming it over the original still trigger
//! a reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ProxyConfig;

/// Watches the configuration file and publishes every valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`.
    ///
    /// Returns the watcher and the receiving end for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle stops the watch when dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !touches(&event, &path) {
                        return;
                    }
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    match load_config(&path) {
                        Ok(config) => {
                            tracing::info!(path = ?path, "Configuration reloaded");
                            let _ = tx.send(config);
                        }
                        Err(e) => {
                            tracing::error!(path = ?path, error = %e, "Reload rejected, keeping current configuration");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn touches(event: &Event, path: &Path) -> bool {
    let name = path.file_name();
    event
        .paths
        .iter()
        .any(|p| p == path || (name.is_some() && p.file_name() == name))
}
