//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway settings (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! routing file (JSON), on change:
//!     watcher.rs detects change
//!     → Reloader reads the whole file
//!     → ConfigStore::replace parses it
//!     → atomic swap of Arc<ConfigSnapshot>
//!     → next request sees the new table
//! ```
//!
//! # Design Decisions
//! - Settings are read once at startup; only the routing table hot-reloads
//! - All settings have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_settings, SettingsError};
pub use schema::{GatewayConfig, GeoIpConfig, ListenerConfig, LogFormat, ObservabilityConfig, RoutesConfig, TimeoutConfig};
pub use watcher::{ConfigWatcher, ReloadError, Reloader, WatchEvent};
