//! Routing table model and parsing.
//!
//! # Responsibilities
//! - Parse the JSON routing file into an immutable `RoutingTable`
//! - Keep malformed rules representable so the resolver can reject them
//! - Reject files that cannot produce a usable table (bad syntax, null, empty)
//!
//! # Design Decisions
//! - Hosts and paths are exact, case-sensitive keys (no normalization)
//! - A host whose value is not an object parses to a host with no rules
//! - A rule that is not an object is stored as `None` (treated as absent)

use std::collections::HashMap;

use axum::http::StatusCode;
use serde_json::{Map, Value};

/// Reserved path key used when no exact path matches.
pub const DEFAULT_RULE_KEY: &str = "default";

/// Error returned when a candidate routing file cannot become a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("routing table must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("routing table is empty or null")]
    Empty,
}

/// Whether a redirect is permanent (301) or temporary (302).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    Permanent,
    Temporary,
}

impl RedirectKind {
    /// Map the `persistent` flag of a rule to a redirect kind.
    pub fn from_persistent(persistent: bool) -> Self {
        if persistent {
            RedirectKind::Permanent
        } else {
            RedirectKind::Temporary
        }
    }

    /// HTTP status code sent for this kind of redirect.
    pub fn status(self) -> StatusCode {
        match self {
            RedirectKind::Permanent => StatusCode::MOVED_PERMANENTLY,
            RedirectKind::Temporary => StatusCode::FOUND,
        }
    }
}

/// A single redirect rule as it appeared in the routing file.
///
/// Both fields are mandatory for the rule to be usable. They are kept optional
/// here so a half-written rule survives parsing and is rejected at lookup time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectRule {
    pub persistent: Option<bool>,
    pub url: Option<String>,
}

impl RedirectRule {
    pub fn new(persistent: bool, url: impl Into<String>) -> Self {
        Self {
            persistent: Some(persistent),
            url: Some(url.into()),
        }
    }

    /// Returns the redirect kind and target if both fields are present.
    pub fn target(&self) -> Option<(RedirectKind, &str)> {
        match (self.persistent, self.url.as_deref()) {
            (Some(persistent), Some(url)) => Some((RedirectKind::from_persistent(persistent), url)),
            _ => None,
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };

        let persistent = fields.remove("persistent").and_then(|v| v.as_bool());
        let url = match fields.remove("url") {
            Some(Value::String(url)) => Some(url),
            _ => None,
        };

        Some(Self { persistent, url })
    }
}

/// Rules configured for one host, keyed by exact path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostRules {
    rules: HashMap<String, Option<RedirectRule>>,
    well_formed: bool,
}

impl HostRules {
    /// Look up a path. `Some(None)` means the key exists but the rule is not an object.
    pub fn get(&self, path: &str) -> Option<Option<&RedirectRule>> {
        self.rules.get(path).map(Option::as_ref)
    }

    /// False when the host's value in the file was not a JSON object.
    pub fn is_well_formed(&self) -> bool {
        self.well_formed
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&RedirectRule>)> {
        self.rules.iter().map(|(path, rule)| (path.as_str(), rule.as_ref()))
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(paths) => Self {
                rules: paths
                    .into_iter()
                    .map(|(path, rule)| (path, RedirectRule::from_value(rule)))
                    .collect(),
                well_formed: true,
            },
            _ => Self::default(),
        }
    }
}

impl FromIterator<(String, RedirectRule)> for HostRules {
    fn from_iter<I: IntoIterator<Item = (String, RedirectRule)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(|(path, rule)| (path, Some(rule))).collect(),
            well_formed: true,
        }
    }
}

/// Immutable host -> path -> rule mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    hosts: HashMap<String, HostRules>,
}

impl RoutingTable {
    /// Parse the full contents of a routing file.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_slice(bytes)?;

        match value {
            Value::Object(hosts) if hosts.is_empty() => Err(ParseError::Empty),
            Value::Object(hosts) => Ok(Self::from_map(hosts)),
            Value::Null => Err(ParseError::Empty),
            Value::Bool(_) => Err(ParseError::NotAnObject("a boolean")),
            Value::Number(_) => Err(ParseError::NotAnObject("a number")),
            Value::String(_) => Err(ParseError::NotAnObject("a string")),
            Value::Array(_) => Err(ParseError::NotAnObject("an array")),
        }
    }

    fn from_map(hosts: Map<String, Value>) -> Self {
        Self {
            hosts: hosts
                .into_iter()
                .map(|(host, rules)| (host, HostRules::from_value(rules)))
                .collect(),
        }
    }

    pub fn host(&self, host: &str) -> Option<&HostRules> {
        self.hosts.get(host)
    }

    pub fn hosts(&self) -> impl Iterator<Item = (&str, &HostRules)> {
        self.hosts.iter().map(|(host, rules)| (host.as_str(), rules))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Total number of path entries across all hosts.
    pub fn rule_count(&self) -> usize {
        self.hosts.values().map(HostRules::len).sum()
    }
}

impl FromIterator<(String, HostRules)> for RoutingTable {
    fn from_iter<I: IntoIterator<Item = (String, HostRules)>>(iter: I) -> Self {
        Self {
            hosts: iter.into_iter().collect(),
        }
    }
}
