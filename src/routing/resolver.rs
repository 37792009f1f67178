//! Redirect decision for a host and path.
//!
//! # Responsibilities
//! - Look up the host, then the exact path, then the host's `default` rule
//! - Reject rules that are missing `persistent` or `url`
//! - Return an explicit `NoRoute` rather than guessing
//!
//! # Design Decisions
//! - Pure function of one snapshot and the input; logging is the caller's job
//! - Exact string matching only: no trailing slash, case or query normalization
//! - An invalid exact rule falls through to `default` just like a missing one

use std::sync::Arc;

use axum::http::StatusCode;

use crate::routing::store::ConfigStore;
use crate::routing::table::{RedirectKind, RoutingTable, DEFAULT_RULE_KEY};

/// Why a request did not match any redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoRouteReason {
    /// Host is not present in the table.
    UnknownHost,
    /// Neither the path nor `default` exists for the host.
    NoRule,
    /// A rule was found but is missing a required field or is not an object.
    InvalidRule,
}

impl NoRouteReason {
    pub fn as_str(self) -> &'static str {
        match self {
            NoRouteReason::UnknownHost => "unknown_host",
            NoRouteReason::NoRule => "no_rule",
            NoRouteReason::InvalidRule => "invalid_rule",
        }
    }
}

/// Result of resolving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    Redirect { kind: RedirectKind, location: String },
    NoRoute(NoRouteReason),
}

impl RedirectOutcome {
    /// Status code the client will receive.
    pub fn status(&self) -> StatusCode {
        match self {
            RedirectOutcome::Redirect { kind, .. } => kind.status(),
            RedirectOutcome::NoRoute(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RedirectOutcome::Redirect { kind: RedirectKind::Permanent, .. } => "permanent",
            RedirectOutcome::Redirect { kind: RedirectKind::Temporary, .. } => "temporary",
            RedirectOutcome::NoRoute(reason) => reason.as_str(),
        }
    }
}

/// Resolve against a specific table.
pub fn resolve_in(table: &RoutingTable, host: &str, path: &str) -> RedirectOutcome {
    let Some(rules) = table.host(host) else {
        return RedirectOutcome::NoRoute(NoRouteReason::UnknownHost);
    };

    let mut reason = NoRouteReason::NoRule;
    for key in [path, DEFAULT_RULE_KEY] {
        match rules.get(key) {
            Some(Some(rule)) => match rule.target() {
                Some((kind, url)) => {
                    return RedirectOutcome::Redirect {
                        kind,
                        location: url.to_string(),
                    }
                }
                None => reason = NoRouteReason::InvalidRule,
            },
            Some(None) => reason = NoRouteReason::InvalidRule,
            None => {}
        }
    }

    RedirectOutcome::NoRoute(reason)
}

/// Resolves requests against whatever snapshot is current at call time.
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    store: Arc<ConfigStore>,
}

impl RedirectResolver {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    pub fn resolve(&self, host: &str, path: &str) -> RedirectOutcome {
        let snapshot = self.store.current();
        resolve_in(snapshot.table(), host, path)
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }
}
