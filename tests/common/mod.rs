//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::Arc;

use forward_rules::admin::{setup_admin_router, AdminState};
use forward_rules::apply::{apply_channel, ApplyPipeline, ApplyTrigger};
use forward_rules::engine::MemoryEngine;
use forward_rules::store::{MemoryStore, ProfileStore};
use tokio::sync::mpsc;

pub const API_KEY: &str = "test-key";

pub const EXAMPLE_DOCUMENT: &str = r#"{
  // forward the API to the backend
  "proxy": [
    ["api.example.com", "https://backend.example.com/$1"],
  ],
  "cors": ["test.example.com"]
}"#;

/// Store backed by memory, with nothing saved yet.
pub fn memory_store() -> Arc<ProfileStore> {
    Arc::new(ProfileStore::new(Arc::new(MemoryStore::new())))
}

pub fn memory_pipeline() -> (Arc<MemoryEngine>, Arc<ApplyPipeline>) {
    let engine = Arc::new(MemoryEngine::new());
    let pipeline = Arc::new(ApplyPipeline::new(engine.clone()));
    (engine, pipeline)
}

/// Everything an admin router needs, plus the receiver the worker would read.
pub struct AdminFixture {
    pub state: AdminState,
    pub engine: Arc<MemoryEngine>,
    pub requests: mpsc::UnboundedReceiver<ApplyTrigger>,
}

impl AdminFixture {
    pub fn new() -> Self {
        let store = memory_store();
        let (engine, pipeline) = memory_pipeline();
        let (apply, requests) = apply_channel();
        Self {
            state: AdminState {
                store,
                pipeline,
                apply,
                api_key: API_KEY.to_string(),
            },
            engine,
            requests,
        }
    }

    pub fn router(&self) -> axum::Router {
        setup_admin_router(self.state.clone())
    }

    /// Number of apply requests queued so far.
    pub fn drain_requests(&mut self) -> usize {
        let mut count = 0;
        while self.requests.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}
