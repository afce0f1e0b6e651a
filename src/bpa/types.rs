//! DTOs exchanged with the BPA engine.
//!
//! Typed structs with `Serialize`/`Deserialize` everywhere; the engine speaks
//! camelCase JSON and omits absent optionals.

use serde::{Deserialize, Serialize};

// ─── Workflow Request ────────────────────────────────────────────────────────

/// A workflow action request, as received on `POST /v1/workflow/perform`.
///
/// `key` + `reference` identify at most one live process instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// Process definition key (e.g. "key1").
    pub key: String,
    /// Human-readable title shown in the engine's task list.
    #[serde(default)]
    pub title: String,
    /// Business entity reference id, unique per process instance.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Requested transition name (e.g. "start", "approved").
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

// ─── Perform ─────────────────────────────────────────────────────────────────

/// A named transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Outbound request for the engine's perform call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPerformRequest {
    /// Owning application module, injected from configuration.
    pub module: String,
    pub key: String,
    pub title: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Stable key the engine may use to de-duplicate repeated starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Result of a transition attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPerformResponse {
    /// The action the engine applied; absent when nothing was applied.
    #[serde(default)]
    pub action: Option<Action>,
    #[serde(default)]
    pub status: Option<String>,
}

// ─── Actions ─────────────────────────────────────────────────────────────────

/// Actions currently available on a process instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAction {
    #[serde(default)]
    pub key: String,
    #[serde(default, rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
