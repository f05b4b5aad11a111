//! Forward rules library.
//!
//! Compiles user-authored forwarding profiles into declarative network
//! rules and keeps a rule engine in sync with the active profiles.
//!
//! ```text
//!   admin API / store file edits
//!              │
//!              ▼
//!        ┌───────────┐    ┌──────────────┐    ┌──────────────┐
//!        │   store   │───▶│    rules     │───▶│    apply     │───▶ RuleEngine
//!        │ profiles  │    │ parse+compile│    │ remove, add  │
//!        └───────────┘    └──────────────┘    └──────────────┘
//! ```

// Core subsystems
pub mod apply;
pub mod engine;
pub mod rules;
pub mod store;

// Surfaces
pub mod admin;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use apply::{ApplyHandle, ApplyPipeline, ApplyTrigger};
pub use config::Settings;
pub use engine::{FileEngine, MemoryEngine, RuleEngine};
pub use lifecycle::Shutdown;
pub use store::{FileStore, MemoryStore, ProfileStore};
