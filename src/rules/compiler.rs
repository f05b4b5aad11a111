//! Rule compilation.
//!
//! # Responsibilities
//! - Turn `ForwardConfig` entries into engine rules
//! - Assign identifiers from disjoint per-class ranges
//! - Skip malformed entries without failing the whole set
//!
//! # Design Decisions
//! - Stateless: output is a pure function of input order
//! - Redirect ids: 1..=999, header ids: 1000 and up
//! - Each entry compiles to `Result<CompiledRule, SkipReason>`; the public
//!   functions return only the successes

use crate::observability::metrics;
use crate::rules::forward::{ForwardConfig, MatchRule};
use crate::rules::translate::{to_engine_filter, to_engine_substitution};
use crate::rules::types::{
    CompiledRule, HeaderInfo, Redirect, ResourceType, RuleAction, RuleCondition, DEFAULT_PRIORITY,
    HEADER_ID_START, REDIRECT_ID_END, REDIRECT_ID_START,
};

/// Value of `access-control-allow-headers` on every CORS rule.
pub const CORS_ALLOW_HEADERS: &str =
    "Content-Type, access-control-allow-headers, Authorization, X-Requested-With, X-Referer";

/// Why an entry produced no rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyPattern,
    EmptyTarget,
    EmptyDomain,
    /// The redirect id range (1..=999) is used up.
    IdRangeExhausted,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EmptyPattern => "empty_pattern",
            SkipReason::EmptyTarget => "empty_target",
            SkipReason::EmptyDomain => "empty_domain",
            SkipReason::IdRangeExhausted => "id_range_exhausted",
        }
    }
}

/// Compile every entry of `config.proxy`, in order, keeping the skips.
pub fn compile_redirect_entries(config: &ForwardConfig) -> Vec<Result<CompiledRule, SkipReason>> {
    let mut next_id = REDIRECT_ID_START;
    config
        .proxy
        .iter()
        .map(|rule| {
            let compiled = redirect_rule(rule, next_id)?;
            next_id += 1;
            Ok(compiled)
        })
        .collect()
}

/// Compile every entry of `config.cors`, in order, keeping the skips.
pub fn compile_cors_entries(config: &ForwardConfig) -> Vec<Result<CompiledRule, SkipReason>> {
    let mut next_id = HEADER_ID_START;
    config
        .cors
        .iter()
        .map(|domain| {
            let compiled = cors_rule(domain, next_id)?;
            next_id += 1;
            Ok(compiled)
        })
        .collect()
}

/// Compile the redirect rules of a config. Malformed entries are dropped.
pub fn compile_redirect_rules(config: &ForwardConfig) -> Vec<CompiledRule> {
    keep_compiled(compile_redirect_entries(config))
}

/// Compile the CORS header rules of a config. Empty domains are dropped.
pub fn compile_cors_rules(config: &ForwardConfig) -> Vec<CompiledRule> {
    keep_compiled(compile_cors_entries(config))
}

fn keep_compiled(entries: Vec<Result<CompiledRule, SkipReason>>) -> Vec<CompiledRule> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            Ok(rule) => Some(rule),
            Err(reason) => {
                if reason == SkipReason::IdRangeExhausted {
                    tracing::warn!(index, "Redirect id range exhausted, entry dropped");
                } else {
                    tracing::debug!(index, reason = reason.as_str(), "Skipping rule entry");
                }
                metrics::record_skipped(reason.as_str());
                None
            }
        })
        .collect()
}

fn redirect_rule(rule: &MatchRule, id: u32) -> Result<CompiledRule, SkipReason> {
    if rule.from.is_empty() {
        return Err(SkipReason::EmptyPattern);
    }
    if rule.to.is_empty() {
        return Err(SkipReason::EmptyTarget);
    }
    if id > REDIRECT_ID_END {
        return Err(SkipReason::IdRangeExhausted);
    }

    Ok(CompiledRule {
        id,
        priority: DEFAULT_PRIORITY,
        action: RuleAction::Redirect {
            redirect: Redirect {
                regex_substitution: to_engine_substitution(&rule.to),
            },
        },
        condition: RuleCondition {
            regex_filter: Some(to_engine_filter(&rule.from)),
            url_filter: None,
            resource_types: ResourceType::ALL.to_vec(),
        },
    })
}

fn cors_rule(domain: &str, id: u32) -> Result<CompiledRule, SkipReason> {
    if domain.is_empty() {
        return Err(SkipReason::EmptyDomain);
    }

    Ok(CompiledRule {
        id,
        priority: DEFAULT_PRIORITY,
        action: RuleAction::ModifyHeaders {
            response_headers: vec![
                HeaderInfo::set("access-control-allow-origin", "*"),
                HeaderInfo::set("access-control-allow-credentials", "true"),
                HeaderInfo::set("access-control-allow-methods", "*"),
                HeaderInfo::set("access-control-allow-headers", CORS_ALLOW_HEADERS),
            ],
        },
        condition: RuleCondition {
            regex_filter: None,
            url_filter: Some(format!("||{}", domain)),
            resource_types: ResourceType::CORS.to_vec(),
        },
    })
}
