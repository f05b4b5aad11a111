//! Forward rules daemon.
//!
//! Loads settings, opens the profile store and the rule engine, applies the
//! active profiles and serves the admin API until Ctrl+C.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use forward_rules::admin::{setup_admin_router, AdminState};
use forward_rules::apply::{apply_channel, run_apply_worker, ApplyPipeline, ApplyTrigger};
use forward_rules::config::loader::load_settings;
use forward_rules::config::Settings;
use forward_rules::engine::FileEngine;
use forward_rules::lifecycle::{wait_for_signal, Shutdown};
use forward_rules::observability::{logging, metrics};
use forward_rules::store::{FileStore, ProfileStore, StoreWatcher};

#[derive(Parser)]
#[command(name = "forward-rules")]
#[command(about = "Compiles forwarding profiles into declarative network rules", long_about = None)]
struct Args {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };

    logging::init_logging(&settings.observability);
    tracing::info!("forward-rules v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        storage = %settings.storage.path,
        rules = %settings.engine.rules_path,
        admin_enabled = settings.admin.enabled,
        "Configuration loaded"
    );

    if settings.observability.metrics_enabled {
        if let Ok(addr) = settings.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let file_store = Arc::new(FileStore::open(&settings.storage.path)?);
    let store = Arc::new(ProfileStore::new(file_store.clone()));
    store.init_switches(settings.apply.enabled, settings.apply.cors_enabled)?;

    let engine = Arc::new(FileEngine::new(&settings.engine.rules_path));
    let pipeline = Arc::new(ApplyPipeline::new(engine));

    let shutdown = Arc::new(Shutdown::new());
    let (apply, requests) = apply_channel();

    let worker = tokio::spawn(run_apply_worker(
        store.clone(),
        pipeline.clone(),
        requests,
        shutdown.subscribe(),
    ));

    // Keep the watcher alive for the lifetime of the daemon.
    let _watcher = if settings.apply.watch_store {
        Some(StoreWatcher::new(file_store.clone(), apply.clone()).run()?)
    } else {
        None
    };

    apply.request(ApplyTrigger::Startup);

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { wait_for_signal(&shutdown).await });
    }

    if settings.admin.enabled {
        let listener = TcpListener::bind(&settings.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let router = setup_admin_router(AdminState {
            store: store.clone(),
            pipeline: pipeline.clone(),
            apply: apply.clone(),
            api_key: settings.admin.api_key.clone(),
        });

        let stop = shutdown.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { stop.wait().await })
            .await?;
        tracing::info!("Admin API stopped");
    } else {
        shutdown.wait().await;
    }

    drop(apply);
    match worker.await {
        Ok(runs) => tracing::info!(runs, "Apply worker stopped"),
        Err(e) => tracing::error!(error = %e, "Apply worker panicked"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
