//! Background apply worker.
//!
//! Store mutations, the store watcher and the admin API all ask for an apply
//! through an `ApplyHandle`. The worker drains every request queued while an
//! apply was running and serves them with a single run, so bursts of edits
//! collapse into one rule replacement (last writer wins).

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use crate::apply::pipeline::ApplyPipeline;
use crate::store::ProfileStore;

/// Why an apply was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyTrigger {
    Startup,
    StoreChanged,
    Admin,
}

impl ApplyTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyTrigger::Startup => "startup",
            ApplyTrigger::StoreChanged => "store_changed",
            ApplyTrigger::Admin => "admin",
        }
    }
}

/// Sender side used to request applies.
#[derive(Debug, Clone)]
pub struct ApplyHandle {
    tx: mpsc::UnboundedSender<ApplyTrigger>,
}

impl ApplyHandle {
    /// Queue an apply. Ignored once the worker has stopped.
    pub fn request(&self, trigger: ApplyTrigger) {
        if self.tx.send(trigger).is_err() {
            tracing::debug!(trigger = trigger.as_str(), "Apply worker stopped, request dropped");
        }
    }
}

/// Create a handle and the receiver the worker consumes.
pub fn apply_channel() -> (ApplyHandle, mpsc::UnboundedReceiver<ApplyTrigger>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ApplyHandle { tx }, rx)
}

/// Run until shutdown or until every handle is dropped. Returns the number of
/// applies performed.
pub async fn run_apply_worker(
    store: Arc<ProfileStore>,
    pipeline: Arc<ApplyPipeline>,
    mut requests: mpsc::UnboundedReceiver<ApplyTrigger>,
    mut shutdown: broadcast::Receiver<()>,
) -> usize {
    let mut runs = 0;

    loop {
        let trigger = tokio::select! {
            received = requests.recv() => match received {
                Some(trigger) => trigger,
                None => break,
            },
            _ = shutdown.recv() => {
                tracing::info!("Apply worker shutting down");
                break;
            }
        };

        let mut coalesced = 0;
        while requests.try_recv().is_ok() {
            coalesced += 1;
        }

        tracing::debug!(trigger = trigger.as_str(), coalesced, "Applying profiles");
        if let Err(e) = pipeline.apply_store(&store).await {
            tracing::error!(error = %e, "Apply failed");
        }
        runs += 1;
    }

    runs
}
