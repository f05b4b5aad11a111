//! Declarative rule engine boundary.
//!
//! # Data Flow
//! ```text
//! ApplyPipeline
//!     → RuleEngine::get_dynamic_rule_ids (what is installed now)
//!     → RuleEngine::update_dynamic_rules({ removeRuleIds })
//!     → RuleEngine::update_dynamic_rules({ addRules })
//! ```
//!
//! # Design Decisions
//! - The engine is a trait: the host's request-filtering subsystem lives
//!   outside this crate
//! - Implementations reject a whole update if any rule is invalid
//! - `MemoryEngine` for tests and embedding, `FileEngine` persists the
//!   installed set as JSON for external tooling

pub mod file;
pub mod installed;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::types::CompiledRule;

pub use file::FileEngine;
pub use memory::MemoryEngine;

/// Errors reported by a rule engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine refused the update (invalid filter, id collision, ...).
    #[error("Rule update rejected: {0}")]
    Rejected(String),

    #[error("Engine IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine state format error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Argument of `update_dynamic_rules`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_rules: Vec<CompiledRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_rule_ids: Vec<u32>,
}

impl RuleUpdate {
    pub fn add(rules: Vec<CompiledRule>) -> Self {
        Self {
            add_rules: rules,
            remove_rule_ids: Vec::new(),
        }
    }

    pub fn remove(ids: Vec<u32>) -> Self {
        Self {
            add_rules: Vec::new(),
            remove_rule_ids: ids,
        }
    }
}

/// The host's dynamic rule API.
#[async_trait]
pub trait RuleEngine: Send + Sync {
    /// Ids of every currently installed dynamic rule.
    async fn get_dynamic_rule_ids(&self) -> Result<Vec<u32>, EngineError>;

    /// Every currently installed dynamic rule.
    async fn get_dynamic_rules(&self) -> Result<Vec<CompiledRule>, EngineError>;

    /// Remove then add rules as one update.
    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<(), EngineError>;
}
