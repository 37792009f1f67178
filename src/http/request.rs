//! Request inspection.
//!
//! # Responsibilities
//! - Extract routing inputs (host, path) from the request
//! - Resolve the client IP (`x-real-ip` first, then the peer address)
//! - Collect the fields written to the access log
//!
//! # Design Decisions
//! - Host is taken as-is, only the port suffix is split off
//! - The port is informational; it never takes part in routing
//! - Path excludes query string and fragment, with no normalization

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Request};

/// Header set by a fronting proxy with the original client address.
pub const X_REAL_IP: &str = "x-real-ip";

/// Port assumed when the Host header carries none.
pub const DEFAULT_PORT: &str = "80";

/// Why a request cannot be routed at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("no pathname in request target")]
    MissingPath,

    #[error("no Host header")]
    MissingHost,
}

/// Everything the handler needs from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub client_ip: String,
    pub host: String,
    pub port: String,
    pub path: String,
    pub user_agent: Option<String>,
    pub accept_language: Option<String>,
}

impl RequestMeta {
    pub fn from_request<B>(request: &Request<B>) -> Result<Self, RequestError> {
        let path = request.uri().path();
        if path.is_empty() {
            return Err(RequestError::MissingPath);
        }

        let authority = request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| request.uri().authority().map(|a| a.as_str()))
            .filter(|h| !h.is_empty())
            .ok_or(RequestError::MissingHost)?;
        let (host, port) = split_host_port(authority);

        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self {
            client_ip: client_ip(request.headers(), peer),
            host: host.to_string(),
            port: port.to_string(),
            path: path.to_string(),
            user_agent: header_string(request.headers(), header::USER_AGENT.as_str()),
            accept_language: header_string(request.headers(), header::ACCEPT_LANGUAGE.as_str()),
        })
    }
}

/// Split a Host header value into host and port.
///
/// Bracketed IPv6 literals keep their brackets in the host part.
pub fn split_host_port(authority: &str) -> (&str, &str) {
    if authority.starts_with('[') {
        if let Some(end) = authority.find(']') {
            let (host, rest) = authority.split_at(end + 1);
            return match rest.strip_prefix(':') {
                Some(port) if !port.is_empty() => (host, port),
                _ => (host, DEFAULT_PORT),
            };
        }
    }

    match authority.split_once(':') {
        Some((host, port)) if !port.is_empty() => (host, port),
        Some((host, _)) => (host, DEFAULT_PORT),
        None => (authority, DEFAULT_PORT),
    }
}

/// Client address for logging: `x-real-ip` if present, else the peer IP.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    header_string(headers, X_REAL_IP)
        .filter(|ip| !ip.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "-".to_string())
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
}
