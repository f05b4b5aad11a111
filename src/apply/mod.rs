//! Apply subsystem.
//!
//! # Data Flow
//! ```text
//! ApplyHandle::request (admin API, store watcher, startup)
//!     → worker.rs (coalesce queued requests)
//!     → pipeline.rs
//!         → ProfileStore::active_documents
//!         → parse_document (skip invalid)
//!         → compile_rules (redirect, then header)
//!         → RuleEngine: remove all installed ids, then add new set
//! ```
//!
//! # Design Decisions
//! - Serialized per pipeline: remove/install of two applies never interleave
//! - No incremental diffing; the installed set always equals the compiled
//!   output of the current configuration
//! - On rejection, the last known good set is re-installed

pub mod pipeline;
pub mod worker;

pub use pipeline::{compile_rules, ApplyError, ApplyPipeline, ApplyReport};
pub use worker::{apply_channel, run_apply_worker, ApplyHandle, ApplyTrigger};
