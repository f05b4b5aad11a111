//! Forwarding configuration: the compiler's only input.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A redirect entry: requests matching `from` are sent to `to`.
///
/// On the wire this is a two-element array `["from", "to"]`. Missing or null
/// elements become empty strings and are skipped by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Option<String>>", into = "Vec<String>")]
pub struct MatchRule {
    pub from: String,
    pub to: String,
}

impl MatchRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl From<Vec<Option<String>>> for MatchRule {
    fn from(parts: Vec<Option<String>>) -> Self {
        let mut parts = parts.into_iter().map(Option::unwrap_or_default);
        Self {
            from: parts.next().unwrap_or_default(),
            to: parts.next().unwrap_or_default(),
        }
    }
}

impl From<MatchRule> for Vec<String> {
    fn from(rule: MatchRule) -> Self {
        vec![rule.from, rule.to]
    }
}

/// Compiled view of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Redirect entries, in priority order.
    pub proxy: Vec<MatchRule>,

    /// Domains that get permissive CORS response headers.
    pub cors: Vec<String>,
}

impl ForwardConfig {
    /// Union several configs in order, dropping exact duplicates.
    ///
    /// The first occurrence of a rule or domain keeps its position, so list
    /// order (and therefore first-match-wins) is unchanged.
    pub fn union<'a>(configs: impl IntoIterator<Item = &'a ForwardConfig>) -> ForwardConfig {
        let mut seen_rules = HashSet::new();
        let mut seen_domains = HashSet::new();
        let mut merged = ForwardConfig::default();

        for config in configs {
            for rule in &config.proxy {
                if seen_rules.insert(rule) {
                    merged.proxy.push(rule.clone());
                }
            }
            for domain in &config.cors {
                if seen_domains.insert(domain) {
                    merged.cors.push(domain.clone());
                }
            }
        }

        merged
    }

    pub fn is_empty(&self) -> bool {
        self.proxy.is_empty() && self.cors.is_empty()
    }
}
