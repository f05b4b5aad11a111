//! Rule translation subsystem.
//!
//! # Data Flow
//! ```text
//! profile document (JSONC text)
//!     → document.rs (parse into ForwardConfig)
//!     → compiler.rs (one rule per valid entry)
//!         → translate.rs (pattern → regexFilter, template → regexSubstitution)
//!     → CompiledRule[] (redirect ids 1..=999, header ids 1000..)
//! ```
//!
//! # Design Decisions
//! - Translation and compilation are total functions; they never fail
//! - Malformed entries are skipped, not reported as errors
//! - The installed set is always rebuilt from scratch

pub mod compiler;
pub mod document;
pub mod forward;
pub mod translate;
pub mod types;

pub use compiler::{compile_cors_rules, compile_redirect_rules, SkipReason};
pub use document::{parse_document, DocumentError, DEFAULT_DOCUMENT};
pub use forward::{ForwardConfig, MatchRule};
pub use translate::{to_engine_filter, to_engine_substitution};
pub use types::{CompiledRule, ResourceType, RuleAction, RuleCondition, RuleKind};
