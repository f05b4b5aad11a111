//! Installed rule set shared by the engine implementations.
//!
//! Applies a `RuleUpdate` the way the host engine does: removals first, then
//! additions, and the whole update is rejected if any added rule is invalid.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;

use crate::engine::{EngineError, RuleUpdate};
use crate::rules::types::{CompiledRule, RuleAction};

#[derive(Debug, Clone, Default)]
pub struct InstalledRules {
    rules: BTreeMap<u32, CompiledRule>,
}

impl InstalledRules {
    pub fn from_rules(rules: Vec<CompiledRule>) -> Self {
        Self {
            rules: rules.into_iter().map(|rule| (rule.id, rule)).collect(),
        }
    }

    pub fn ids(&self) -> Vec<u32> {
        self.rules.keys().copied().collect()
    }

    pub fn rules(&self) -> Vec<CompiledRule> {
        self.rules.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply an update atomically: on error nothing changes.
    pub fn apply(&mut self, update: RuleUpdate) -> Result<(), EngineError> {
        let mut next = self.rules.clone();
        for id in &update.remove_rule_ids {
            next.remove(id);
        }

        let mut batch_ids = HashSet::new();
        for rule in &update.add_rules {
            if !batch_ids.insert(rule.id) || next.contains_key(&rule.id) {
                return Err(EngineError::Rejected(format!(
                    "Rule with id {} does not have a unique ID",
                    rule.id
                )));
            }
            validate_rule(rule)?;
        }

        for rule in update.add_rules {
            next.insert(rule.id, rule);
        }
        self.rules = next;
        Ok(())
    }
}

fn validate_rule(rule: &CompiledRule) -> Result<(), EngineError> {
    if rule.id == 0 {
        return Err(EngineError::Rejected("Rule id must be positive".into()));
    }
    if rule.condition.resource_types.is_empty() {
        return Err(EngineError::Rejected(format!(
            "Rule with id {} has an empty resource type list",
            rule.id
        )));
    }

    match &rule.action {
        RuleAction::Redirect { .. } => {
            let filter = rule.condition.regex_filter.as_deref().ok_or_else(|| {
                EngineError::Rejected(format!(
                    "Rule with id {} redirects by substitution without a regexFilter",
                    rule.id
                ))
            })?;
            Regex::new(filter).map_err(|e| {
                EngineError::Rejected(format!(
                    "Rule with id {} specified an invalid regexFilter: {}",
                    rule.id, e
                ))
            })?;
        }
        RuleAction::ModifyHeaders { response_headers } => {
            if response_headers.is_empty() {
                return Err(EngineError::Rejected(format!(
                    "Rule with id {} modifies no headers",
                    rule.id
                )));
            }
            match rule.condition.url_filter.as_deref() {
                Some(filter) if !filter.is_empty() && filter.is_ascii() => {}
                _ => {
                    return Err(EngineError::Rejected(format!(
                        "Rule with id {} has an invalid urlFilter",
                        rule.id
                    )))
                }
            }
        }
    }
    Ok(())
}
