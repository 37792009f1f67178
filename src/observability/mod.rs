//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! request handler, reloader
//!     → logging.rs (structured log events, one access line per request)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of pipe-delimited strings
//! - Request ID flows through the tower-http trace span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
