//! Lifecycle events raised around a transition attempt.
//!
//! | Phase    | Raised when                                 | `source`          |
//! |----------|---------------------------------------------|-------------------|
//! | `Before` | before the engine is called                 | `None`            |
//! | `After`  | the engine accepted the transition          | engine response   |
//! | `Abort`  | the call to the engine failed               | `None`            |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bpa::{TaskPerformResponse, WorkflowRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPhase {
    Before,
    After,
    Abort,
}

impl EventPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Abort => "abort",
        }
    }
}

/// The closed set of transitions the After-phase dispatch reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownAction {
    SentBack,
    SentForApproval,
    Rejected,
    Approved,
}

impl KnownAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SentBack => "sent_back",
            Self::SentForApproval => "sent_for_approval",
            Self::Rejected => "rejected",
            Self::Approved => "approved",
        }
    }

    /// Case-insensitive lookup by action name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sent_back" => Some(Self::SentBack),
            "sent_for_approval" => Some(Self::SentForApproval),
            "rejected" => Some(Self::Rejected),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }
}

/// One lifecycle notification for a workflow action. Consumed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowActionEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub phase: EventPhase,
    /// Engine response; only set for `After`.
    pub source: Option<TaskPerformResponse>,
    /// The request that triggered the transition.
    pub dto: WorkflowRequest,
    /// Failure text; only set for `Abort`.
    pub error: Option<String>,
}

impl WorkflowActionEvent {
    fn new(phase: EventPhase, dto: WorkflowRequest) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            phase,
            source: None,
            dto,
            error: None,
        }
    }

    pub fn before(dto: WorkflowRequest) -> Self {
        Self::new(EventPhase::Before, dto)
    }

    pub fn after(dto: WorkflowRequest, source: TaskPerformResponse) -> Self {
        Self {
            source: Some(source),
            ..Self::new(EventPhase::After, dto)
        }
    }

    pub fn abort(dto: WorkflowRequest, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(EventPhase::Abort, dto)
        }
    }

    /// Name of the action the engine applied, if any.
    pub fn action_name(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|s| s.action.as_ref())
            .map(|a| a.name.as_str())
    }
}
