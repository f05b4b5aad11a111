mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use forward_rules::apply::compile_rules;
use forward_rules::engine::{RuleEngine, RuleUpdate};
use forward_rules::rules::parse_document;

use common::{AdminFixture, API_KEY, EXAMPLE_DOCUMENT};

fn request(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", API_KEY))
        .header("Content-Type", "application/json")
        .body(body)
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    request(method, uri, Body::from(body.to_string()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_requires_api_key() {
    let fixture = AdminFixture::new();

    let response = fixture
        .router()
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = fixture
        .router()
        .oneshot(
            Request::get("/status")
                .header("Authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_lifecycle() {
    let mut fixture = AdminFixture::new();

    let response = fixture
        .router()
        .oneshot(json_request("POST", "/profiles", json!({ "name": "Work" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["name"], "Work");
    assert_eq!(created["active"], true);

    let response = fixture
        .router()
        .oneshot(request("GET", "/profiles", Body::empty()))
        .await
        .unwrap();
    let items = body_json(response).await;
    assert_eq!(items.as_array().unwrap().len(), 2);
    assert_eq!(items[0]["id"], "0");

    let response = fixture
        .router()
        .oneshot(json_request("PUT", &format!("/profiles/{}", id), json!({ "name": "Office" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(fixture.state.store.list_profiles().unwrap()[1].name, "Office");

    let response = fixture
        .router()
        .oneshot(request("POST", &format!("/profiles/{}/toggle", id), Body::empty()))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["active"], false);

    let response = fixture
        .router()
        .oneshot(request("DELETE", &format!("/profiles/{}", id), Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(fixture.drain_requests(), 3);
}

#[tokio::test]
async fn test_blank_name_is_rejected() {
    let mut fixture = AdminFixture::new();

    let response = fixture
        .router()
        .oneshot(json_request("POST", "/profiles", json!({ "name": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fixture.state.store.list_profiles().unwrap().len(), 1);
    assert_eq!(fixture.drain_requests(), 0);
}

#[tokio::test]
async fn test_default_profile_cannot_be_removed() {
    let fixture = AdminFixture::new();

    let response = fixture
        .router()
        .oneshot(request("DELETE", "/profiles/0", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = fixture
        .router()
        .oneshot(request("DELETE", "/profiles/nope", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_config_then_apply() {
    let fixture = AdminFixture::new();

    let response = fixture
        .router()
        .oneshot(request("PUT", "/profiles/0/config", Body::from(EXAMPLE_DOCUMENT)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["valid"], true);

    let response = fixture
        .router()
        .oneshot(request("GET", "/profiles/0/config", Body::empty()))
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes, EXAMPLE_DOCUMENT.as_bytes());

    let response = fixture
        .router()
        .oneshot(request("POST", "/apply", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["redirect_rules"], 1);
    assert_eq!(report["header_rules"], 1);

    let response = fixture
        .router()
        .oneshot(request("GET", "/rules", Body::empty()))
        .await
        .unwrap();
    let rules = body_json(response).await;
    assert_eq!(rules[0]["id"], 1);
    assert_eq!(rules[0]["action"]["type"], "redirect");
    assert_eq!(rules[1]["id"], 1000);
    assert_eq!(rules[1]["condition"]["urlFilter"], "||test.example.com");
    assert_eq!(fixture.engine.get_dynamic_rule_ids().await.unwrap(), vec![1, 1000]);
}

#[tokio::test]
async fn test_invalid_document_is_saved_and_flagged() {
    let fixture = AdminFixture::new();

    let response = fixture
        .router()
        .oneshot(request("PUT", "/profiles/0/config", Body::from("{ \"proxy\": [")))
        .await
        .unwrap();
    let result = body_json(response).await;
    assert_eq!(result["valid"], false);
    assert!(result["error"].is_string());

    let response = fixture
        .router()
        .oneshot(request("PUT", "/profiles/missing/config", Body::from("{}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_switch_and_editing_pointer() {
    let fixture = AdminFixture::new();

    let response = fixture
        .router()
        .oneshot(json_request("PUT", "/switch", json!({ "enabled": false })))
        .await
        .unwrap();
    let switches = body_json(response).await;
    assert_eq!(switches["enabled"], false);
    assert_eq!(switches["cors_enabled"], true);

    let response = fixture
        .router()
        .oneshot(request("GET", "/editing", Body::empty()))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["id"], "0");

    let response = fixture
        .router()
        .oneshot(json_request("PUT", "/editing", json!({ "id": "ghost" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gc_and_status() {
    let fixture = AdminFixture::new();
    let store = &fixture.state.store;
    let doomed = store.add_profile("Doomed").unwrap();
    store.save_config("{}", &doomed.id).unwrap();
    store.remove_profile(&doomed.id).unwrap();

    let response = fixture
        .router()
        .oneshot(request("POST", "/gc", Body::empty()))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["removed"], 1);

    let response = fixture
        .router()
        .oneshot(request("GET", "/status", Body::empty()))
        .await
        .unwrap();
    let status = body_json(response).await;
    assert_eq!(status["profiles"], 1);
    assert_eq!(status["enabled"], true);
    assert_eq!(status["installed_rules"], 0);
}

#[tokio::test]
async fn test_status_counts_rules_in_engine() {
    let fixture = AdminFixture::new();
    let rules = compile_rules(&[parse_document(EXAMPLE_DOCUMENT).unwrap()], true);
    fixture
        .engine
        .update_dynamic_rules(RuleUpdate::add(rules))
        .await
        .unwrap();

    let response = fixture
        .router()
        .oneshot(request("GET", "/status", Body::empty()))
        .await
        .unwrap();
    let status = body_json(response).await;
    assert_eq!(status["installed_rules"], 2);
    assert!(fixture.state.pipeline.last_known_good().is_empty());
}
