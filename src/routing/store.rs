//! Hot-swappable routing table store.
//!
//! # Responsibilities
//! - Hold the single current `ConfigSnapshot`
//! - Hand out snapshots to request handlers without locking
//! - Install a freshly parsed table atomically, or leave the current one alone
//!
//! # Design Decisions
//! - `ArcSwap` gives wait-free reads; old snapshots drop with their last reader
//! - Versions are assigned inside a compare-and-swap loop so they never go backwards

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::{ArcSwap, Guard};

use crate::routing::table::{ParseError, RoutingTable};

/// Error returned when the store cannot be built from a file on disk.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read routing file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse routing file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// An immutable routing table version.
#[derive(Debug)]
pub struct ConfigSnapshot {
    table: Arc<RoutingTable>,
    version: u64,
    loaded_at: SystemTime,
}

impl ConfigSnapshot {
    fn new(table: Arc<RoutingTable>, version: u64) -> Self {
        Self {
            table,
            version,
            loaded_at: SystemTime::now(),
        }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Monotonically increasing, starting at 1 for the bootstrap table.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }
}

/// Owner of the current routing snapshot.
#[derive(Debug)]
pub struct ConfigStore {
    current: ArcSwap<ConfigSnapshot>,
}

impl ConfigStore {
    /// Build a store from an already parsed table.
    pub fn new(table: RoutingTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(ConfigSnapshot::new(Arc::new(table), 1)),
        }
    }

    /// Build a store from raw routing file contents.
    pub fn bootstrap(bytes: &[u8]) -> Result<Self, ParseError> {
        RoutingTable::parse(bytes).map(Self::new)
    }

    /// Synchronously read and parse the routing file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::bootstrap(&bytes).map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The presently active snapshot.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Parse `bytes` and, if valid, install them as the current snapshot.
    ///
    /// On error the current snapshot is left untouched.
    pub fn replace(&self, bytes: &[u8]) -> Result<Arc<ConfigSnapshot>, ParseError> {
        let table = Arc::new(RoutingTable::parse(bytes)?);
        Ok(self.install(table))
    }

    fn install(&self, table: Arc<RoutingTable>) -> Arc<ConfigSnapshot> {
        let mut expected = self.current.load_full();
        loop {
            let next = Arc::new(ConfigSnapshot::new(Arc::clone(&table), expected.version + 1));
            let previous = self.current.compare_and_swap(&expected, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &expected) {
                return next;
            }
            // Another writer got in first; retry on top of its snapshot.
            expected = Guard::into_inner(previous);
        }
    }
}
