mod common;

use std::sync::Arc;

use forward_rules::apply::{compile_rules, ApplyError, ApplyPipeline};
use forward_rules::engine::{FileEngine, RuleEngine};
use forward_rules::rules::types::{HeaderOperation, ResourceType};
use forward_rules::rules::{parse_document, ForwardConfig, MatchRule, RuleAction};
use forward_rules::store::{FileStore, ProfileStore};

use common::{memory_pipeline, memory_store, EXAMPLE_DOCUMENT};

#[tokio::test]
async fn test_example_document_installs_two_rules() {
    let store = memory_store();
    assert!(store.save_config(EXAMPLE_DOCUMENT, "0").unwrap());
    let (engine, pipeline) = memory_pipeline();

    let report = pipeline.apply_store(&store).await.unwrap();
    assert_eq!(report.redirect_rules, 1);
    assert_eq!(report.header_rules, 1);

    let rules = engine.get_dynamic_rules().await.unwrap();
    assert_eq!(rules.len(), 2);

    let redirect = &rules[0];
    assert_eq!(redirect.id, 1);
    assert_eq!(redirect.priority, 1);
    assert_eq!(
        redirect.condition.regex_filter.as_deref(),
        Some("api\\.example\\.com")
    );
    assert_eq!(redirect.condition.resource_types.len(), ResourceType::ALL.len());
    match &redirect.action {
        RuleAction::Redirect { redirect } => {
            assert_eq!(redirect.regex_substitution, "https://backend.example.com/\\1");
        }
        other => panic!("expected redirect, got {:?}", other),
    }

    let cors = &rules[1];
    assert_eq!(cors.id, 1000);
    assert_eq!(cors.condition.url_filter.as_deref(), Some("||test.example.com"));
    assert_eq!(
        cors.condition.resource_types,
        vec![ResourceType::Xmlhttprequest, ResourceType::Websocket]
    );
    match &cors.action {
        RuleAction::ModifyHeaders { response_headers } => {
            let names: Vec<&str> = response_headers.iter().map(|h| h.header.as_str()).collect();
            assert_eq!(
                names,
                [
                    "access-control-allow-origin",
                    "access-control-allow-credentials",
                    "access-control-allow-methods",
                    "access-control-allow-headers",
                ]
            );
            assert!(response_headers
                .iter()
                .all(|h| h.operation == HeaderOperation::Set));
        }
        other => panic!("expected header rule, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reapply_is_idempotent() {
    let store = memory_store();
    store.save_config(EXAMPLE_DOCUMENT, "0").unwrap();
    let (engine, pipeline) = memory_pipeline();

    pipeline.apply_store(&store).await.unwrap();
    let first = engine.get_dynamic_rules().await.unwrap();

    let report = pipeline.apply_store(&store).await.unwrap();
    let second = engine.get_dynamic_rules().await.unwrap();

    assert_eq!(report.removed, 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_inactive_profiles_are_not_installed() {
    let store = memory_store();
    let work = store.add_profile("Work").unwrap();
    store
        .save_config(r#"{ "proxy": [["work.example.com", "https://w/$1"]] }"#, &work.id)
        .unwrap();
    store.save_config(EXAMPLE_DOCUMENT, "0").unwrap();
    let (engine, pipeline) = memory_pipeline();

    pipeline.apply_store(&store).await.unwrap();
    assert_eq!(engine.get_dynamic_rule_ids().await.unwrap(), vec![1, 2, 1000]);

    assert_eq!(store.toggle_active(&work.id).unwrap(), Some(false));
    pipeline.apply_store(&store).await.unwrap();
    assert_eq!(engine.get_dynamic_rule_ids().await.unwrap(), vec![1, 1000]);
}

#[tokio::test]
async fn test_disabled_switch_clears_rules() {
    let store = memory_store();
    store.save_config(EXAMPLE_DOCUMENT, "0").unwrap();
    let (engine, pipeline) = memory_pipeline();
    pipeline.apply_store(&store).await.unwrap();

    store.set_enabled(false).unwrap();
    let report = pipeline.apply_store(&store).await.unwrap();

    assert_eq!(report.installed(), 0);
    assert!(engine.get_dynamic_rule_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cors_option_off_skips_header_rules() {
    let store = memory_store();
    store.save_config(EXAMPLE_DOCUMENT, "0").unwrap();
    store.set_cors_enabled(false).unwrap();
    let (engine, pipeline) = memory_pipeline();

    pipeline.apply_store(&store).await.unwrap();
    assert_eq!(engine.get_dynamic_rule_ids().await.unwrap(), vec![1]);
}

#[tokio::test]
async fn test_rejected_install_restores_last_known_good() {
    let (engine, pipeline) = memory_pipeline();
    let good = parse_document(EXAMPLE_DOCUMENT).unwrap();
    pipeline.apply(&[good]).await.unwrap();

    let bad = ForwardConfig {
        proxy: vec![MatchRule {
            from: "broken(".to_string(),
            to: "https://x".to_string(),
        }],
        cors: Vec::new(),
    };
    let err = pipeline.apply(&[bad]).await.unwrap_err();
    assert!(matches!(err, ApplyError::Install { restored: true, .. }));

    assert_eq!(engine.get_dynamic_rule_ids().await.unwrap(), vec![1, 1000]);
    assert_eq!(pipeline.last_known_good().len(), 2);
}

#[tokio::test]
async fn test_file_backed_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("profiles.json");
    let rules_path = dir.path().join("installed-rules.json");

    {
        let store = ProfileStore::new(Arc::new(FileStore::open(&store_path).unwrap()));
        store.save_config(EXAMPLE_DOCUMENT, "0").unwrap();
        let pipeline = ApplyPipeline::new(Arc::new(FileEngine::new(&rules_path)));
        pipeline.apply_store(&store).await.unwrap();
    }

    // A fresh process sees the same profiles and the same installed rules.
    let store = ProfileStore::new(Arc::new(FileStore::open(&store_path).unwrap()));
    assert_eq!(store.document_text("0").unwrap(), EXAMPLE_DOCUMENT);

    let engine = FileEngine::new(&rules_path);
    let installed = engine.get_dynamic_rules().await.unwrap();
    let expected = compile_rules(&[parse_document(EXAMPLE_DOCUMENT).unwrap()], true);
    assert_eq!(installed, expected);
}
