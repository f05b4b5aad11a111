//! Rule engine that persists the installed set to a JSON file.
//!
//! The file holds the installed rules as a JSON array in the host engine's
//! wire shape, so external tooling can inspect what is installed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::engine::installed::InstalledRules;
use crate::engine::{EngineError, RuleEngine, RuleUpdate};
use crate::rules::types::CompiledRule;

#[derive(Debug)]
pub struct FileEngine {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileEngine {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<InstalledRules, EngineError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let rules: Vec<CompiledRule> = serde_json::from_slice(&bytes)?;
                Ok(InstalledRules::from_rules(rules))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(InstalledRules::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, installed: &InstalledRules) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(&installed.rules())?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RuleEngine for FileEngine {
    async fn get_dynamic_rule_ids(&self) -> Result<Vec<u32>, EngineError> {
        Ok(self.load().await?.ids())
    }

    async fn get_dynamic_rules(&self) -> Result<Vec<CompiledRule>, EngineError> {
        Ok(self.load().await?.rules())
    }

    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<(), EngineError> {
        let _guard = self.write_lock.lock().await;
        let mut installed = self.load().await?;
        installed.apply(update)?;
        self.save(&installed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{compile_cors_rules, compile_redirect_rules, ForwardConfig, MatchRule};

    #[tokio::test]
    async fn test_file_engine_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FileEngine::new(dir.path().join("rules").join("installed.json"));
        assert!(engine.get_dynamic_rule_ids().await.unwrap().is_empty());

        let config = ForwardConfig {
            proxy: vec![MatchRule::new("a.com", "https://b.com")],
            cors: vec!["c.com".into()],
        };
        let mut rules = compile_redirect_rules(&config);
        rules.extend(compile_cors_rules(&config));
        engine.update_dynamic_rules(RuleUpdate::add(rules.clone())).await.unwrap();

        let reopened = FileEngine::new(engine.path());
        assert_eq!(reopened.get_dynamic_rule_ids().await.unwrap(), vec![1, 1000]);
        assert_eq!(reopened.get_dynamic_rules().await.unwrap(), rules);
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FileEngine::new(dir.path().join("installed.json"));
        let config = ForwardConfig {
            proxy: vec![MatchRule::new("a.com", "https://b.com")],
            cors: vec![],
        };
        let rules = compile_redirect_rules(&config);
        engine.update_dynamic_rules(RuleUpdate::add(rules.clone())).await.unwrap();

        assert!(engine.update_dynamic_rules(RuleUpdate::add(rules)).await.is_err());
        assert_eq!(engine.get_dynamic_rule_ids().await.unwrap(), vec![1]);
    }
}
