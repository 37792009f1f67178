//! Routing table lint.
//!
//! # Responsibilities
//! - Report entries that parsed but can never produce a redirect
//! - Report targets that are not absolute URLs
//!
//! # Design Decisions
//! - Returns every issue, not just the first
//! - Advisory only: issues are logged, the table is still installed and the
//!   resolver rejects bad rules at lookup time

use std::fmt;

use crate::routing::table::{RoutingTable, DEFAULT_RULE_KEY};

/// A single problem found in a routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintIssue {
    HostNotAnObject { host: String },
    RuleNotAnObject { host: String, path: String },
    MissingField { host: String, path: String, field: &'static str },
    RelativeUrl { host: String, path: String, url: String },
    NoDefault { host: String },
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintIssue::HostNotAnObject { host } => write!(f, "host '{}' is not an object", host),
            LintIssue::RuleNotAnObject { host, path } => {
                write!(f, "rule '{}' of host '{}' is not an object", path, host)
            }
            LintIssue::MissingField { host, path, field } => {
                write!(f, "rule '{}' of host '{}' has no valid '{}'", path, host, field)
            }
            LintIssue::RelativeUrl { host, path, url } => {
                write!(f, "rule '{}' of host '{}' points to non-absolute url '{}'", path, host, url)
            }
            LintIssue::NoDefault { host } => write!(f, "host '{}' has no '{}' rule", host, DEFAULT_RULE_KEY),
        }
    }
}

/// Collect all lint issues, sorted by host then path for stable output.
pub fn lint(table: &RoutingTable) -> Vec<LintIssue> {
    let mut issues = Vec::new();

    let mut hosts: Vec<_> = table.hosts().collect();
    hosts.sort_by_key(|(host, _)| *host);

    for (host, rules) in hosts {
        if !rules.is_well_formed() {
            issues.push(LintIssue::HostNotAnObject { host: host.to_string() });
            continue;
        }
        if rules.get(DEFAULT_RULE_KEY).is_none() {
            issues.push(LintIssue::NoDefault { host: host.to_string() });
        }

        let mut paths: Vec<_> = rules.iter().collect();
        paths.sort_by_key(|(path, _)| *path);

        for (path, rule) in paths {
            let Some(rule) = rule else {
                issues.push(LintIssue::RuleNotAnObject {
                    host: host.to_string(),
                    path: path.to_string(),
                });
                continue;
            };
            if rule.persistent.is_none() {
                issues.push(LintIssue::MissingField {
                    host: host.to_string(),
                    path: path.to_string(),
                    field: "persistent",
                });
            }
            match rule.url.as_deref() {
                None => issues.push(LintIssue::MissingField {
                    host: host.to_string(),
                    path: path.to_string(),
                    field: "url",
                }),
                Some(url) if url::Url::parse(url).is_err() => issues.push(LintIssue::RelativeUrl {
                    host: host.to_string(),
                    path: path.to_string(),
                    url: url.to_string(),
                }),
                Some(_) => {}
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_table_has_no_issues() {
        let table = RoutingTable::parse(
            br#"{"a.com":{"/x":{"persistent":true,"url":"https://b.com/x"},"default":{"persistent":false,"url":"https://b.com"}}}"#,
        )
        .unwrap();
        assert!(lint(&table).is_empty());
    }

    #[test]
    fn reports_every_issue() {
        let table = RoutingTable::parse(
            br#"{
                "a.com":{"/no-url":{"persistent":true},"/rel":{"persistent":true,"url":"/local"},"/scalar":1,
                         "default":{"url":"https://a.com"}},
                "b.com":[],
                "c.com":{"/x":{"persistent":true,"url":"https://c.com"}}
            }"#,
        )
        .unwrap();

        let issues = lint(&table);
        assert_eq!(
            issues,
            vec![
                LintIssue::MissingField { host: "a.com".into(), path: "/no-url".into(), field: "url" },
                LintIssue::RelativeUrl { host: "a.com".into(), path: "/rel".into(), url: "/local".into() },
                LintIssue::RuleNotAnObject { host: "a.com".into(), path: "/scalar".into() },
                LintIssue::MissingField { host: "a.com".into(), path: "default".into(), field: "persistent" },
                LintIssue::HostNotAnObject { host: "b.com".into() },
                LintIssue::NoDefault { host: "c.com".into() },
            ]
        );
    }

    #[test]
    fn display_names_host_and_path() {
        let issue = LintIssue::MissingField { host: "a.com".into(), path: "/x".into(), field: "url" };
        assert_eq!(issue.to_string(), "rule '/x' of host 'a.com' has no valid 'url'");
    }
}
