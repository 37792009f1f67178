//! HTTP redirect gateway library.
//!
//! The routing table lives in a JSON file mapping host → path → rule. It is
//! loaded once at startup, swapped atomically whenever the file changes, and
//! consulted on every request to produce a 301, a 302 or a 400.

pub mod config;
pub mod geo;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::{Gateway, Shutdown};
pub use routing::{ConfigStore, RedirectOutcome, RedirectResolver};
