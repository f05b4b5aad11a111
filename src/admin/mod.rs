//! Admin HTTP API.
//!
//! # Responsibilities
//! - Expose profile management over HTTP
//! - Queue an apply after every mutation
//! - Report installed rules and switches
//!
//! # Design Decisions
//! - Every route requires `Authorization: Bearer <api_key>`
//! - Handlers call the store directly; applies go through the worker, except
//!   `POST /apply` which runs synchronously so the caller sees the outcome

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::apply::{ApplyHandle, ApplyPipeline};
use crate::store::ProfileStore;

/// Shared state of the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<ProfileStore>,
    pub pipeline: Arc<ApplyPipeline>,
    pub apply: ApplyHandle,
    pub api_key: String,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/profiles", get(list_profiles).post(create_profile))
        .route("/profiles/swap", post(swap_profiles))
        .route("/profiles/{id}", put(rename_profile).delete(delete_profile))
        .route("/profiles/{id}/toggle", post(toggle_profile))
        .route("/profiles/{id}/config", get(get_config).put(put_config))
        .route("/editing", get(get_editing).put(put_editing))
        .route("/gc", post(garbage_collect))
        .route("/apply", post(apply_now))
        .route("/rules", get(get_rules))
        .route("/switch", get(get_switch).put(put_switch))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
