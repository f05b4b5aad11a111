//! Profile storage subsystem.
//!
//! # Data Flow
//! ```text
//! UI / admin API
//!     → profiles.rs (ProfileStore: items, documents, editing pointer, switches)
//!     → kv.rs (KeyValueStore trait)
//!         → MemoryStore (volatile)
//!         → file.rs FileStore (single JSON file, atomic rewrite)
//!             → watcher.rs (reload + re-apply on external change)
//! ```
//!
//! # Design Decisions
//! - One store instance per process, shared via Arc (no globals)
//! - All mutations serialized by a store-wide lock, including garbage collection
//! - Item list and documents may diverge after a crash; `garbage_collect`
//!   reconciles them

pub mod file;
pub mod kv;
pub mod profiles;
pub mod watcher;

use thiserror::Error;

pub use file::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use profiles::{ProfileDocument, ProfileItem, ProfileStore, DEFAULT_PROFILE_ID};
pub use watcher::StoreWatcher;

/// Errors from the profile store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Profile names must contain something other than whitespace.
    #[error("Profile name must not be empty")]
    EmptyName,

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage format error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;
