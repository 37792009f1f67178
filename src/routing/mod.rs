//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! routing file bytes
//!     → table.rs (parse into RoutingTable)
//!     → store.rs (atomic swap into ConfigSnapshot)
//!
//! Incoming Request (host, path)
//!     → resolver.rs (host → exact path → "default")
//!     → Return: Redirect{301|302, url} or NoRoute
//! ```
//!
//! # Design Decisions
//! - Tables are immutable once parsed; reloads swap whole snapshots
//! - Lookups are two hash probes, no scanning
//! - Deterministic: same snapshot and input always give the same outcome
//! - Explicit NoRoute rather than a silent fallback

pub mod resolver;
pub mod store;
pub mod table;
pub mod validation;

pub use resolver::{resolve_in, NoRouteReason, RedirectOutcome, RedirectResolver};
pub use store::{ConfigSnapshot, ConfigStore, StoreError};
pub use table::{HostRules, ParseError, RedirectKind, RedirectRule, RoutingTable, DEFAULT_RULE_KEY};
