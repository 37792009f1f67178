//! Best-effort client geolocation for access logs.
//!
//! # Data Flow
//! ```text
//! client ip (x-real-ip or peer address)
//!     → GeoAnnotator::annotate
//!         → no reader configured  → Uninitialized
//!         → reader has no record  → NoData
//!         → record found          → Located(GeoInfo)
//!     → access log field only
//! ```
//!
//! # Design Decisions
//! - The reader is an optional capability, never a runtime flag
//! - Lookups are in-memory; nothing here can fail or delay a redirect
//! - Output never reaches the routing decision

pub mod mmdb;

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use serde::Serialize;

use crate::config::schema::GeoIpConfig;

pub use mmdb::{GeoError, MmdbGeoReader};

/// Coarse location of a client. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Source of location records, e.g. an MMDB file loaded into memory.
pub trait GeoLookup: Send + Sync {
    /// Returns `None` when the source has no record for `ip`.
    fn lookup(&self, ip: IpAddr) -> Option<GeoInfo>;
}

/// Result of annotating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoAnnotation {
    Uninitialized,
    NoData,
    Located(GeoInfo),
}

impl fmt::Display for GeoAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoAnnotation::Uninitialized => f.write_str("Not init yet"),
            GeoAnnotation::NoData => f.write_str("No data for this IP"),
            GeoAnnotation::Located(info) => match serde_json::to_string(info) {
                Ok(json) => f.write_str(&json),
                Err(_) => f.write_str("{}"),
            },
        }
    }
}

/// Wraps an optional `GeoLookup`.
#[derive(Clone, Default)]
pub struct GeoAnnotator {
    reader: Option<Arc<dyn GeoLookup>>,
}

impl fmt::Debug for GeoAnnotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoAnnotator")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl GeoAnnotator {
    pub fn new(reader: Arc<dyn GeoLookup>) -> Self {
        Self { reader: Some(reader) }
    }

    pub fn disabled() -> Self {
        Self { reader: None }
    }

    /// Open the configured database, falling back to a disabled annotator.
    pub fn from_config(config: &GeoIpConfig) -> Self {
        if !config.enabled {
            tracing::info!("GeoIP annotation disabled by configuration");
            return Self::disabled();
        }

        match MmdbGeoReader::open(&config.database_path) {
            Ok(reader) => {
                tracing::info!(path = %config.database_path, "GeoIP database initialisation complete");
                Self::new(Arc::new(reader))
            }
            Err(e) => {
                tracing::warn!(
                    path = %config.database_path,
                    error = %e,
                    "GeoIP initialisation failed, requests will not be annotated"
                );
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.reader.is_some()
    }

    /// Annotate a textual client address.
    pub fn annotate(&self, ip: &str) -> GeoAnnotation {
        let Some(reader) = &self.reader else {
            return GeoAnnotation::Uninitialized;
        };

        let Ok(ip) = ip.trim().parse::<IpAddr>() else {
            return GeoAnnotation::NoData;
        };

        match reader.lookup(ip.to_canonical()) {
            Some(info) => GeoAnnotation::Located(info),
            None => GeoAnnotation::NoData,
        }
    }
}
