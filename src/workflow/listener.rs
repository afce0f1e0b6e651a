//! WorkflowEventDispatcher: routes lifecycle events to business hooks.
//!
//! ## Dispatch table
//!
//! | Phase    | Condition                         | Hook                      |
//! |----------|-----------------------------------|---------------------------|
//! | `Before` | any                               | `validate_before`         |
//! | `After`  | no action on the result           | (none)                    |
//! | `After`  | `sent_back`                       | `on_sent_back`            |
//! | `After`  | `sent_for_approval`               | `on_sent_for_approval`    |
//! | `After`  | `rejected`                        | `on_rejected`             |
//! | `After`  | `approved`                        | `on_approved`             |
//! | `After`  | any other name                    | (none, ignored)           |
//! | `Abort`  | any                               | `on_abort`                |
//!
//! Action names match case-insensitively. The dispatcher keeps no state
//! between events.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::EventError;
use super::events::{EventPhase, KnownAction, WorkflowActionEvent};

/// Outcome of Before-phase validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeforeVerdict {
    Proceed,
    Block { reason: String },
}

/// Business extension points. Every hook defaults to a no-op.
#[async_trait]
pub trait WorkflowActionHooks: Send + Sync {
    /// Validate a transition before the engine is called.
    async fn validate_before(&self, _event: &WorkflowActionEvent) -> BeforeVerdict {
        BeforeVerdict::Proceed
    }

    async fn on_sent_back(&self, _ref_id: i64, _event: &WorkflowActionEvent) {}

    async fn on_sent_for_approval(&self, _ref_id: i64, _event: &WorkflowActionEvent) {}

    async fn on_rejected(&self, _ref_id: i64, _event: &WorkflowActionEvent) {}

    async fn on_approved(&self, _ref_id: i64, _event: &WorkflowActionEvent) {}

    /// The engine call raised an error.
    async fn on_abort(&self, _event: &WorkflowActionEvent) {}
}

pub struct NoopHooks;

impl WorkflowActionHooks for NoopHooks {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Validated(BeforeVerdict),
    /// After-phase event whose result carried no action.
    NoAction,
    Transition(KnownAction),
    Unrecognized(String),
    Aborted,
}

#[derive(Clone)]
pub struct WorkflowEventDispatcher {
    hooks: Arc<dyn WorkflowActionHooks>,
}

impl WorkflowEventDispatcher {
    pub fn new(hooks: Arc<dyn WorkflowActionHooks>) -> Self {
        Self { hooks }
    }

    pub async fn dispatch(
        &self,
        event: &WorkflowActionEvent,
    ) -> Result<DispatchOutcome, EventError> {
        match event.phase {
            EventPhase::Before => {
                let verdict = self.hooks.validate_before(event).await;
                if let BeforeVerdict::Block { reason } = &verdict {
                    tracing::info!(
                        event_id = %event.event_id,
                        key = %event.dto.key,
                        reference = %event.dto.reference,
                        action = %event.dto.action,
                        reason = %reason,
                        "Transition blocked by before-hook"
                    );
                }
                Ok(DispatchOutcome::Validated(verdict))
            }
            EventPhase::After => self.dispatch_after(event).await,
            EventPhase::Abort => {
                self.hooks.on_abort(event).await;
                Ok(DispatchOutcome::Aborted)
            }
        }
    }

    async fn dispatch_after(
        &self,
        event: &WorkflowActionEvent,
    ) -> Result<DispatchOutcome, EventError> {
        let Some(name) = event.action_name() else {
            return Ok(DispatchOutcome::NoAction);
        };

        let ref_id: i64 = event
            .dto
            .reference
            .parse()
            .map_err(|source| EventError::MalformedReference {
                reference: event.dto.reference.clone(),
                source,
            })?;

        let Some(action) = KnownAction::parse(name) else {
            tracing::debug!(
                event_id = %event.event_id,
                action = name,
                "Ignoring unrecognized workflow action"
            );
            return Ok(DispatchOutcome::Unrecognized(name.to_string()));
        };

        match action {
            KnownAction::SentBack => self.hooks.on_sent_back(ref_id, event).await,
            KnownAction::SentForApproval => self.hooks.on_sent_for_approval(ref_id, event).await,
            KnownAction::Rejected => self.hooks.on_rejected(ref_id, event).await,
            KnownAction::Approved => self.hooks.on_approved(ref_id, event).await,
        }

        tracing::debug!(
            event_id = %event.event_id,
            ref_id,
            action = action.as_str(),
            "Workflow action dispatched"
        );
        Ok(DispatchOutcome::Transition(action))
    }
}
