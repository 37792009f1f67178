//! MaxMind City database reader.

use std::net::IpAddr;
use std::path::Path;

use maxminddb::{geoip2, MaxMindDBError, Reader};

use crate::geo::{GeoInfo, GeoLookup};

/// Error raised when the database cannot be opened.
#[derive(Debug, thiserror::Error)]
#[error("cannot open GeoIP database: {0}")]
pub struct GeoError(#[from] MaxMindDBError);

/// A City database held fully in memory.
pub struct MmdbGeoReader {
    reader: Reader<Vec<u8>>,
}

impl MmdbGeoReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GeoError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self { reader })
    }
}

impl GeoLookup for MmdbGeoReader {
    fn lookup(&self, ip: IpAddr) -> Option<GeoInfo> {
        let record: geoip2::City = match self.reader.lookup(ip) {
            Ok(record) => record,
            Err(MaxMindDBError::AddressNotFoundError(_)) => return None,
            Err(e) => {
                tracing::debug!(ip = %ip, error = %e, "GeoIP lookup failed");
                return None;
            }
        };

        Some(GeoInfo::from(record))
    }
}

impl From<geoip2::City<'_>> for GeoInfo {
    fn from(record: geoip2::City<'_>) -> Self {
        let mut info = GeoInfo::default();

        if let Some(location) = record.location {
            info.lat = location.latitude;
            info.lon = location.longitude;
        }
        if let Some(country) = record.country {
            info.country = country
                .names
                .as_ref()
                .and_then(|names| names.get("en"))
                .map(|name| name.to_string());
            info.country_code = country.iso_code.map(str::to_string);
        }
        if let Some(city) = record.city {
            info.city = city
                .names
                .as_ref()
                .and_then(|names| names.get("en"))
                .map(|name| name.to_string());
        }

        info
    }
}
