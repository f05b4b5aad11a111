//! In-process rule engine.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::engine::installed::InstalledRules;
use crate::engine::{EngineError, RuleEngine, RuleUpdate};
use crate::rules::types::CompiledRule;

#[derive(Debug, Default)]
pub struct MemoryEngine {
    installed: Mutex<InstalledRules>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that already has `rules` installed.
    pub fn with_rules(rules: Vec<CompiledRule>) -> Self {
        Self {
            installed: Mutex::new(InstalledRules::from_rules(rules)),
        }
    }

    fn installed(&self) -> std::sync::MutexGuard<'_, InstalledRules> {
        self.installed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RuleEngine for MemoryEngine {
    async fn get_dynamic_rule_ids(&self) -> Result<Vec<u32>, EngineError> {
        Ok(self.installed().ids())
    }

    async fn get_dynamic_rules(&self) -> Result<Vec<CompiledRule>, EngineError> {
        Ok(self.installed().rules())
    }

    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<(), EngineError> {
        self.installed().apply(update)
    }
}
