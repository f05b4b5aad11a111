use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::apply::{ApplyError, ApplyTrigger};
use crate::rules::parse_document;
use crate::store::{StoreError, DEFAULT_PROFILE_ID};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub enabled: bool,
    pub cors_enabled: bool,
    pub profiles: usize,
    pub active_profiles: usize,
    pub installed_rules: usize,
}

#[derive(Deserialize)]
pub struct CreateProfile {
    pub name: String,
}

#[derive(Deserialize)]
pub struct RenameProfile {
    pub name: String,
}

#[derive(Deserialize)]
pub struct SwapProfiles {
    pub a: String,
    pub b: String,
}

#[derive(Serialize, Deserialize)]
pub struct EditingPointer {
    pub id: String,
}

#[derive(Serialize)]
pub struct ToggleResult {
    pub id: String,
    pub active: bool,
}

#[derive(Serialize)]
pub struct SaveResult {
    pub id: String,
    /// Whether the saved text parses. Invalid documents are stored anyway and
    /// skipped at apply time.
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct GcResult {
    pub removed: usize,
}

#[derive(Serialize, Deserialize, Default)]
pub struct Switches {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_enabled: Option<bool>,
}

fn store_failure(e: StoreError) -> Response {
    match e {
        StoreError::EmptyName => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        other => {
            tracing::error!(error = %other, "Profile store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "Profile store failure").into_response()
        }
    }
}

fn profile_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Profile not found").into_response()
}

pub async fn get_status(State(state): State<AdminState>) -> Response {
    let (items, enabled, cors_enabled) = match (
        state.store.list_profiles(),
        state.store.is_enabled(),
        state.store.cors_enabled(),
    ) {
        (Ok(items), Ok(enabled), Ok(cors)) => (items, enabled, cors),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return store_failure(e),
    };
    let installed_rules = match state.pipeline.engine().get_dynamic_rule_ids().await {
        Ok(ids) => ids.len(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read installed rules");
            return (StatusCode::BAD_GATEWAY, e.to_string()).into_response();
        }
    };

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        enabled,
        cors_enabled,
        profiles: items.len(),
        active_profiles: items.iter().filter(|item| item.active).count(),
        installed_rules,
    })
    .into_response()
}

pub async fn list_profiles(State(state): State<AdminState>) -> Response {
    match state.store.list_profiles() {
        Ok(items) => Json(items).into_response(),
        Err(e) => store_failure(e),
    }
}

pub async fn create_profile(
    State(state): State<AdminState>,
    Json(request): Json<CreateProfile>,
) -> Response {
    match state.store.add_profile(&request.name) {
        Ok(item) => {
            state.apply.request(ApplyTrigger::Admin);
            (StatusCode::CREATED, Json(item)).into_response()
        }
        Err(e) => store_failure(e),
    }
}

pub async fn rename_profile(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    Json(request): Json<RenameProfile>,
) -> Response {
    match state.store.rename_profile(&id, &request.name) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => profile_not_found(),
        Err(e) => store_failure(e),
    }
}

pub async fn delete_profile(State(state): State<AdminState>, Path(id): Path<String>) -> Response {
    if id == DEFAULT_PROFILE_ID {
        return (StatusCode::BAD_REQUEST, "Default profile cannot be removed").into_response();
    }
    match state.store.remove_profile(&id) {
        Ok(true) => {
            state.apply.request(ApplyTrigger::Admin);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => profile_not_found(),
        Err(e) => store_failure(e),
    }
}

pub async fn toggle_profile(State(state): State<AdminState>, Path(id): Path<String>) -> Response {
    match state.store.toggle_active(&id) {
        Ok(Some(active)) => {
            state.apply.request(ApplyTrigger::Admin);
            Json(ToggleResult { id, active }).into_response()
        }
        Ok(None) => profile_not_found(),
        Err(e) => store_failure(e),
    }
}

pub async fn swap_profiles(
    State(state): State<AdminState>,
    Json(request): Json<SwapProfiles>,
) -> Response {
    match state.store.swap_profiles(&request.a, &request.b) {
        Ok(true) => {
            state.apply.request(ApplyTrigger::Admin);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => profile_not_found(),
        Err(e) => store_failure(e),
    }
}

pub async fn get_config(State(state): State<AdminState>, Path(id): Path<String>) -> Response {
    match state.store.list_profiles() {
        Ok(items) if items.iter().any(|item| item.id == id) => {}
        Ok(_) => return profile_not_found(),
        Err(e) => return store_failure(e),
    }
    match state.store.document_text(&id) {
        Ok(text) => text.into_response(),
        Err(e) => store_failure(e),
    }
}

pub async fn put_config(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    body: String,
) -> Response {
    match state.store.save_config(&body, &id) {
        Ok(true) => {}
        Ok(false) => return profile_not_found(),
        Err(e) => return store_failure(e),
    }
    state.apply.request(ApplyTrigger::Admin);

    let error = parse_document(&body).err().map(|e| e.to_string());
    Json(SaveResult {
        id,
        valid: error.is_none(),
        error,
    })
    .into_response()
}

pub async fn get_editing(State(state): State<AdminState>) -> Response {
    match state.store.editing_profile() {
        Ok(id) => Json(EditingPointer { id }).into_response(),
        Err(e) => store_failure(e),
    }
}

pub async fn put_editing(
    State(state): State<AdminState>,
    Json(request): Json<EditingPointer>,
) -> Response {
    match state.store.set_editing_profile(&request.id) {
        Ok(true) => Json(request).into_response(),
        Ok(false) => profile_not_found(),
        Err(e) => store_failure(e),
    }
}

pub async fn garbage_collect(State(state): State<AdminState>) -> Response {
    match state.store.garbage_collect() {
        Ok(removed) => Json(GcResult { removed }).into_response(),
        Err(e) => store_failure(e),
    }
}

/// Apply synchronously and report the outcome, bypassing the worker queue.
pub async fn apply_now(State(state): State<AdminState>) -> Response {
    match state.pipeline.apply_store(&state.store).await {
        Ok(report) => Json(report).into_response(),
        Err(ApplyError::Store(e)) => store_failure(e),
        Err(e) => {
            tracing::error!(error = %e, "Admin apply failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

pub async fn get_rules(State(state): State<AdminState>) -> Response {
    match state.pipeline.engine().get_dynamic_rules().await {
        Ok(rules) => Json(rules).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read installed rules");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

pub async fn get_switch(State(state): State<AdminState>) -> Response {
    match (state.store.is_enabled(), state.store.cors_enabled()) {
        (Ok(enabled), Ok(cors_enabled)) => Json(Switches {
            enabled: Some(enabled),
            cors_enabled: Some(cors_enabled),
        })
        .into_response(),
        (Err(e), _) | (_, Err(e)) => store_failure(e),
    }
}

pub async fn put_switch(
    State(state): State<AdminState>,
    Json(request): Json<Switches>,
) -> Response {
    if let Some(enabled) = request.enabled {
        if let Err(e) = state.store.set_enabled(enabled) {
            return store_failure(e);
        }
    }
    if let Some(cors_enabled) = request.cors_enabled {
        if let Err(e) = state.store.set_cors_enabled(cors_enabled) {
            return store_failure(e);
        }
    }
    state.apply.request(ApplyTrigger::Admin);
    get_switch(State(state)).await
}
