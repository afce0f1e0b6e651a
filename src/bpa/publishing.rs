//! EventPublishingClient: raises lifecycle events around `perform`.
//!
//! 1. `Before` is dispatched inline; a `Block` verdict fails the call with
//!    [`BpaError::Blocked`] and the inner client is never called.
//! 2. The inner client performs the transition.
//! 3. `After` (with the engine response) or `Abort` (with the error text) is
//!    published to the event bus and handled off the request path.
//!
//! `get_actions` is a read and passes straight through.

use async_trait::async_trait;

use super::client::{AuthToken, BpaClient, Result};
use super::error::BpaError;
use super::types::{TaskAction, TaskPerformRequest, TaskPerformResponse, WorkflowRequest};
use crate::workflow::bus::WorkflowEventBus;
use crate::workflow::events::WorkflowActionEvent;
use crate::workflow::listener::{BeforeVerdict, DispatchOutcome, WorkflowEventDispatcher};

pub struct EventPublishingClient<C> {
    inner: C,
    dispatcher: WorkflowEventDispatcher,
    bus: WorkflowEventBus,
}

impl<C: BpaClient> EventPublishingClient<C> {
    pub fn new(inner: C, dispatcher: WorkflowEventDispatcher, bus: WorkflowEventBus) -> Self {
        Self {
            inner,
            dispatcher,
            bus,
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn validate_before(&self, dto: &WorkflowRequest) -> Result<()> {
        let event = WorkflowActionEvent::before(dto.clone());
        match self.dispatcher.dispatch(&event).await {
            Ok(DispatchOutcome::Validated(BeforeVerdict::Block { reason })) => {
                Err(BpaError::Blocked(reason))
            }
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!(
                    event_id = %event.event_id,
                    error = %e,
                    "Before-phase dispatch failed"
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl<C: BpaClient> BpaClient for EventPublishingClient<C> {
    async fn perform(
        &self,
        token: &AuthToken,
        request: &TaskPerformRequest,
        dto: &WorkflowRequest,
    ) -> Result<TaskPerformResponse> {
        self.validate_before(dto).await?;

        match self.inner.perform(token, request, dto).await {
            Ok(response) => {
                self.bus
                    .publish(WorkflowActionEvent::after(dto.clone(), response.clone()));
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(
                    key = %request.key,
                    reference = %request.reference,
                    action = %request.action.name,
                    error = %e,
                    "Workflow action failed at the engine"
                );
                self.bus
                    .publish(WorkflowActionEvent::abort(dto.clone(), e.to_string()));
                Err(e)
            }
        }
    }

    async fn get_actions(
        &self,
        token: &AuthToken,
        key: &str,
        reference: &str,
    ) -> Result<TaskAction> {
        self.inner.get_actions(token, key, reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpa::types::Action;
    use crate::bpa::InProcessBpaClient;
    use crate::workflow::bus::{EventWorker, WorkerStats};
    use crate::workflow::listener::tests::RecordingHooks;
    use std::sync::Arc;
    use tokio::sync::watch;

    fn dto(action: &str) -> WorkflowRequest {
        WorkflowRequest {
            key: "key1".to_string(),
            title: "Title".to_string(),
            reference: "42".to_string(),
            action: action.to_string(),
            remarks: None,
        }
    }

    fn outbound(action: &str) -> TaskPerformRequest {
        TaskPerformRequest {
            module: "m".to_string(),
            key: "key1".to_string(),
            title: "Title".to_string(),
            reference: "42".to_string(),
            action: Action::new(action),
            remarks: None,
            idempotency_key: None,
        }
    }

    struct Harness {
        client: EventPublishingClient<InProcessBpaClient>,
        worker: EventWorker,
        hooks: Arc<RecordingHooks>,
    }

    fn harness(hooks: RecordingHooks) -> Harness {
        let hooks = Arc::new(hooks);
        let dispatcher = WorkflowEventDispatcher::new(hooks.clone());
        let (bus, receiver) = WorkflowEventBus::new(16);
        let worker = EventWorker::new(dispatcher.clone(), receiver, 2);
        Harness {
            client: EventPublishingClient::new(InProcessBpaClient::new(), dispatcher, bus),
            worker,
            hooks,
        }
    }

    async fn drain(
        client: EventPublishingClient<InProcessBpaClient>,
        worker: EventWorker,
    ) -> WorkerStats {
        drop(client);
        let (_tx, rx) = watch::channel(false);
        worker.run(rx).await
    }

    #[tokio::test]
    async fn test_successful_perform_publishes_after() {
        let Harness {
            client,
            worker,
            hooks,
        } = harness(RecordingHooks::default());

        let response = client
            .perform(&AuthToken::default(), &outbound("approved"), &dto("approved"))
            .await
            .unwrap();
        assert_eq!(response.action, Some(Action::new("approved")));
        assert_eq!(client.inner().performed().len(), 1);

        let stats = drain(client, worker).await;
        assert_eq!(stats.processed, 1);
        assert_eq!(
            hooks.calls(),
            vec!["before".to_string(), "approved:42".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_perform_publishes_one_abort() {
        let Harness {
            client,
            worker,
            hooks,
        } = harness(RecordingHooks::default());
        client.inner().fail_with("engine down");

        let err = client
            .perform(&AuthToken::default(), &outbound("approved"), &dto("approved"))
            .await
            .unwrap_err();
        assert!(matches!(err, BpaError::Transport(_)));

        drain(client, worker).await;
        assert_eq!(hooks.calls(), vec!["before".to_string(), "abort".to_string()]);
    }

    #[tokio::test]
    async fn test_blocked_before_skips_engine_call() {
        let Harness {
            client,
            worker,
            hooks,
        } = harness(RecordingHooks::blocking("not allowed"));

        let err = client
            .perform(&AuthToken::default(), &outbound("approved"), &dto("approved"))
            .await
            .unwrap_err();
        assert!(matches!(err, BpaError::Blocked(ref r) if r == "not allowed"));
        assert!(client.inner().performed().is_empty());

        let stats = drain(client, worker).await;
        assert_eq!(stats, WorkerStats::default());
        assert_eq!(hooks.calls(), vec!["before".to_string()]);
    }

    #[tokio::test]
    async fn test_get_actions_passes_through() {
        let Harness { client, .. } = harness(RecordingHooks::default());
        let err = client
            .get_actions(&AuthToken::default(), "key1", "42")
            .await
            .unwrap_err();
        assert!(matches!(err, BpaError::NotFound));
        assert_eq!(client.inner().probe_count(), 1);
    }
}
