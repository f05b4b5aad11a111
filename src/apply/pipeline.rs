//! Compile-and-replace pipeline.
//!
//! # Responsibilities
//! - Union the active profiles' configs
//! - Compile redirect rules, then header rules
//! - Replace the engine's installed set: remove everything, then install
//! - Keep the last set that installed cleanly and restore it on rejection
//!
//! # Design Decisions
//! - Whole-set replace, never an incremental diff
//! - One apply at a time per pipeline; later calls queue on an async mutex
//! - Removal completes before installation is requested

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::engine::{EngineError, RuleEngine, RuleUpdate};
use crate::observability::metrics;
use crate::rules::document::parse_document;
use crate::rules::types::{CompiledRule, RuleKind};
use crate::rules::{compile_cors_rules, compile_redirect_rules, ForwardConfig};
use crate::store::{ProfileStore, StoreError};

/// Errors from an apply run.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Old rules could not be removed; the installed set is unchanged.
    #[error("Failed to remove installed rules: {0}")]
    Remove(#[source] EngineError),

    /// New rules were rejected after the old ones were removed.
    #[error("Failed to install rules (last known good restored: {restored}): {source}")]
    Install {
        #[source]
        source: EngineError,
        restored: bool,
    },

    #[error("Failed to read profiles: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a successful apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Rules removed before installing.
    pub removed: usize,
    pub redirect_rules: usize,
    pub header_rules: usize,
}

impl ApplyReport {
    pub fn installed(&self) -> usize {
        self.redirect_rules + self.header_rules
    }
}

/// Compile several active configs into one rule list: redirect rules first,
/// then header rules (unless `cors_enabled` is false).
pub fn compile_rules(configs: &[ForwardConfig], cors_enabled: bool) -> Vec<CompiledRule> {
    let merged = ForwardConfig::union(configs);
    let mut rules = compile_redirect_rules(&merged);
    if cors_enabled {
        rules.extend(compile_cors_rules(&merged));
    }
    rules
}

pub struct ApplyPipeline {
    engine: Arc<dyn RuleEngine>,
    gate: Mutex<()>,
    last_good: ArcSwap<Vec<CompiledRule>>,
}

impl ApplyPipeline {
    pub fn new(engine: Arc<dyn RuleEngine>) -> Self {
        Self {
            engine,
            gate: Mutex::new(()),
            last_good: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn engine(&self) -> &Arc<dyn RuleEngine> {
        &self.engine
    }

    /// The last rule set that was installed without error.
    pub fn last_known_good(&self) -> Arc<Vec<CompiledRule>> {
        self.last_good.load_full()
    }

    /// Compile `configs` (CORS included) and replace the installed set.
    pub async fn apply(&self, configs: &[ForwardConfig]) -> Result<ApplyReport, ApplyError> {
        self.install(compile_rules(configs, true)).await
    }

    /// Read the active profiles from `store` and apply them.
    ///
    /// Honors the global switch and the CORS option. Documents that fail to
    /// parse are skipped.
    pub async fn apply_store(&self, store: &ProfileStore) -> Result<ApplyReport, ApplyError> {
        // Read under the gate so a later snapshot is never overwritten by an
        // earlier one.
        let _gate = self.gate.lock().await;

        if !store.is_enabled()? {
            tracing::info!("Forwarding disabled, clearing installed rules");
            return self.replace(Vec::new()).await;
        }

        let mut configs = Vec::new();
        for (item, text) in store.active_documents()? {
            match parse_document(&text) {
                Ok(config) => configs.push(config),
                Err(e) => {
                    tracing::warn!(id = %item.id, name = %item.name, error = %e, "Skipping profile with invalid document");
                }
            }
        }

        self.replace(compile_rules(&configs, store.cors_enabled()?)).await
    }

    /// Replace the installed set with `rules`.
    pub async fn install(&self, rules: Vec<CompiledRule>) -> Result<ApplyReport, ApplyError> {
        let _gate = self.gate.lock().await;
        self.replace(rules).await
    }

    /// Remove then add. Callers must hold `gate`.
    async fn replace(&self, rules: Vec<CompiledRule>) -> Result<ApplyReport, ApplyError> {
        let previous = match self.engine.get_dynamic_rules().await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to query installed rules, assuming none");
                Vec::new()
            }
        };
        let installed_ids: Vec<u32> = previous.iter().map(|rule| rule.id).collect();

        let removed = installed_ids.len();
        if !installed_ids.is_empty() {
            if let Err(e) = self
                .engine
                .update_dynamic_rules(RuleUpdate::remove(installed_ids))
                .await
            {
                tracing::error!(error = %e, "Failed to remove installed rules");
                metrics::record_apply("remove_failed");
                return Err(ApplyError::Remove(e));
            }
        }

        if !rules.is_empty() {
            if let Err(e) = self
                .engine
                .update_dynamic_rules(RuleUpdate::add(rules.clone()))
                .await
            {
                tracing::error!(error = %e, rules = rules.len(), "Failed to install rules");
                let restored = self.restore(previous).await;
                metrics::record_apply("install_failed");
                return Err(ApplyError::Install {
                    source: e,
                    restored,
                });
            }
        }

        let report = ApplyReport {
            removed,
            redirect_rules: rules.iter().filter(|r| r.kind() == RuleKind::Redirect).count(),
            header_rules: rules.iter().filter(|r| r.kind() == RuleKind::Header).count(),
        };
        metrics::record_apply("ok");
        metrics::record_installed(report.installed());
        self.last_good.store(Arc::new(rules));

        tracing::info!(
            removed = report.removed,
            redirect_rules = report.redirect_rules,
            header_rules = report.header_rules,
            "Updated dynamic rules"
        );
        Ok(report)
    }

    /// Re-install what was in the engine before this apply, or the last
    /// known good set if nothing was.
    async fn restore(&self, previous: Vec<CompiledRule>) -> bool {
        let fallback = if previous.is_empty() {
            Vec::clone(&self.last_good.load_full())
        } else {
            previous
        };
        if fallback.is_empty() {
            metrics::record_installed(0);
            return false;
        }

        let count = fallback.len();
        match self
            .engine
            .update_dynamic_rules(RuleUpdate::add(fallback.clone()))
            .await
        {
            Ok(()) => {
                tracing::warn!(rules = count, "Restored previously installed rules");
                metrics::record_installed(count);
                self.last_good.store(Arc::new(fallback));
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to restore previously installed rules");
                metrics::record_installed(0);
                false
            }
        }
    }
}
