//! Routing file watcher for hot reload.
//!
//! # Responsibilities
//! - Turn filesystem notifications for one file into `WatchEvent`s
//! - Reconcile events into full reads + `ConfigStore::replace` on one task
//! - Keep serving the last good snapshot on read, parse or delete failures
//!
//! # Design Decisions
//! - The notify callback only forwards events; all I/O happens in `Reloader`
//! - The parent directory is watched so rename+create saves and re-created
//!   files are still seen
//! - Bursts are coalesced: wait `debounce`, drain the queue, read once

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::observability::metrics;
use crate::routing::store::{ConfigSnapshot, ConfigStore};
use crate::routing::table::ParseError;
use crate::routing::validation::lint;

/// A change to the watched routing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// File was written, created or renamed into place.
    Changed,
    /// File was deleted or renamed away.
    Removed,
}

impl WatchEvent {
    fn from_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Remove(_) => Some(WatchEvent::Removed),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(WatchEvent::Removed),
            EventKind::Create(_) | EventKind::Modify(_) => Some(WatchEvent::Changed),
            _ => None,
        }
    }
}

/// Why a reload attempt left the current snapshot in place.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("{path} has been deleted")]
    Removed { path: String },
}

impl ReloadError {
    fn label(&self) -> &'static str {
        match self {
            ReloadError::Read { .. } => "read_error",
            ReloadError::Parse { .. } => "parse_error",
            ReloadError::Removed { .. } => "removed",
        }
    }
}

/// A watcher that monitors the routing file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    events_tx: mpsc::UnboundedSender<WatchEvent>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for file events.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<WatchEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                events_tx,
            },
            events_rx,
        )
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name: OsString = self
            .path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| notify::Error::generic("routing path has no file name"))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let tx = self.events_tx;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if !ours {
                        return;
                    }
                    if let Some(change) = WatchEvent::from_kind(&event.kind) {
                        tracing::debug!(kind = ?event.kind, "Routing file event");
                        let _ = tx.send(change);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Routing file watcher started");
        Ok(watcher)
    }
}

/// Single consumer of `WatchEvent`s that drives `ConfigStore::replace`.
pub struct Reloader {
    path: PathBuf,
    store: Arc<ConfigStore>,
    debounce: Duration,
}

impl Reloader {
    pub fn new(path: &Path, store: Arc<ConfigStore>, debounce: Duration) -> Self {
        Self {
            path: path.to_path_buf(),
            store,
            debounce,
        }
    }

    /// Process events until the channel closes or shutdown fires.
    pub async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<WatchEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            let first = tokio::select! {
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
                _ = shutdown.recv() => break,
            };

            let latest = self.coalesce(first, &mut events).await;
            // Errors are already logged; the old snapshot stays current.
            let _ = self.apply(latest).await;
        }

        tracing::debug!("Routing reloader stopped");
    }

    async fn coalesce(&self, first: WatchEvent, events: &mut mpsc::UnboundedReceiver<WatchEvent>) -> WatchEvent {
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }

        let mut latest = first;
        let mut skipped = 0usize;
        while let Ok(event) = events.try_recv() {
            latest = event;
            skipped += 1;
        }
        if skipped > 0 {
            tracing::trace!(skipped, "Coalesced routing file events");
        }
        latest
    }

    /// Act on one event: re-read and install, or log and keep the old table.
    pub async fn apply(&self, event: WatchEvent) -> Result<Arc<ConfigSnapshot>, ReloadError> {
        let result = self.try_apply(event).await;

        match &result {
            Ok(snapshot) => {
                tracing::info!(
                    path = %self.path.display(),
                    version = snapshot.version(),
                    hosts = snapshot.table().len(),
                    rules = snapshot.table().rule_count(),
                    "New routing table has been applied"
                );
                for issue in lint(snapshot.table()) {
                    tracing::warn!(issue = %issue, "Routing table issue");
                }
                metrics::record_reload("applied");
                metrics::set_config_version(snapshot.version());
            }
            Err(e @ ReloadError::Removed { .. }) => {
                tracing::warn!(
                    error = %e,
                    version = self.store.current().version(),
                    "Routing file is gone, keeping current table until it reappears"
                );
                metrics::record_reload(e.label());
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    version = self.store.current().version(),
                    "Reload failed, keeping current routing table"
                );
                metrics::record_reload(e.label());
            }
        }

        result
    }

    async fn try_apply(&self, event: WatchEvent) -> Result<Arc<ConfigSnapshot>, ReloadError> {
        let path = self.path.display().to_string();

        if event == WatchEvent::Removed {
            return Err(ReloadError::Removed { path });
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ReloadError::Read { path: path.clone(), source })?;

        self.store
            .replace(&bytes)
            .map_err(|source| ReloadError::Parse { path, source })
    }
}
