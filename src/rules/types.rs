//! Declarative rule types.
//!
//! These mirror the JSON shape consumed by the host engine's dynamic rule API,
//! so a serialized `CompiledRule` can be handed to the engine as-is.

use serde::{Deserialize, Serialize};

/// Priority given to every compiled rule.
///
/// Rules from several active profiles are concatenated at equal priority, so
/// the engine falls back to list order (first match wins).
pub const DEFAULT_PRIORITY: u32 = 1;

/// First identifier handed out to redirect rules.
pub const REDIRECT_ID_START: u32 = 1;

/// Last identifier a redirect rule may take.
pub const REDIRECT_ID_END: u32 = 999;

/// First identifier handed out to header rules.
pub const HEADER_ID_START: u32 = 1000;

/// Resource types a rule condition can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Font,
    Object,
    Xmlhttprequest,
    Ping,
    CspReport,
    Media,
    Websocket,
    Other,
}

impl ResourceType {
    /// Every resource type; redirect rules apply to all of them.
    pub const ALL: [ResourceType; 13] = [
        ResourceType::MainFrame,
        ResourceType::SubFrame,
        ResourceType::Stylesheet,
        ResourceType::Script,
        ResourceType::Image,
        ResourceType::Font,
        ResourceType::Object,
        ResourceType::Xmlhttprequest,
        ResourceType::Ping,
        ResourceType::CspReport,
        ResourceType::Media,
        ResourceType::Websocket,
        ResourceType::Other,
    ];

    /// Resource types CORS header rules are restricted to.
    pub const CORS: [ResourceType; 2] = [ResourceType::Xmlhttprequest, ResourceType::Websocket];
}

/// Redirect target of a redirect action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    /// Substitution in the engine's syntax (`\1` capture references).
    pub regex_substitution: String,
}

/// Header mutation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderOperation {
    Set,
}

/// A single response header mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderInfo {
    pub header: String,
    pub operation: HeaderOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl HeaderInfo {
    /// Build a `set` mutation.
    pub fn set(header: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            operation: HeaderOperation::Set,
            value: Some(value.into()),
        }
    }
}

/// What the engine does when a rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleAction {
    Redirect {
        redirect: Redirect,
    },
    #[serde(rename_all = "camelCase")]
    ModifyHeaders {
        response_headers: Vec<HeaderInfo>,
    },
}

/// When a rule matches.
///
/// Redirect rules carry a `regex_filter`; header rules carry a `url_filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_filter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_filter: Option<String>,

    pub resource_types: Vec<ResourceType>,
}

/// A rule ready to install in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRule {
    pub id: u32,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

/// Which class a rule belongs to, derived from its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Redirect,
    Header,
}

impl CompiledRule {
    pub fn kind(&self) -> RuleKind {
        match self.action {
            RuleAction::Redirect { .. } => RuleKind::Redirect,
            RuleAction::ModifyHeaders { .. } => RuleKind::Header,
        }
    }
}
