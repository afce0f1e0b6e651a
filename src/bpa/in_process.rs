//! InProcessBpaClient: in-memory stand-in for the engine.
//!
//! Records every perform request and remembers which (key, ref) pairs have been
//! started. It has no state machine: any action other than `start` is echoed
//! back without checks. Used by tests and for local runs without an engine.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::{AuthToken, BpaClient, Result};
use super::error::BpaError;
use super::types::{Action, TaskAction, TaskPerformRequest, TaskPerformResponse, WorkflowRequest};
use crate::workflow::service::PROCESS_START_ACTION;

#[derive(Default)]
struct State {
    live: HashSet<(String, String)>,
    performed: Vec<TaskPerformRequest>,
    probes: usize,
    failing: Option<String>,
}

#[derive(Default)]
pub struct InProcessBpaClient {
    state: Mutex<State>,
}

impl InProcessBpaClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark (key, reference) as an already running process instance.
    pub fn with_instance(self, key: &str, reference: &str) -> Self {
        self.lock()
            .live
            .insert((key.to_string(), reference.to_string()));
        self
    }

    /// Make every subsequent call fail with a transport error.
    pub fn fail_with(&self, reason: impl Into<String>) {
        self.lock().failing = Some(reason.into());
    }

    pub fn recover(&self) {
        self.lock().failing = None;
    }

    /// Perform requests received so far, in order.
    pub fn performed(&self) -> Vec<TaskPerformRequest> {
        self.lock().performed.clone()
    }

    pub fn probe_count(&self) -> usize {
        self.lock().probes
    }

    pub fn is_live(&self, key: &str, reference: &str) -> bool {
        self.lock()
            .live
            .contains(&(key.to_string(), reference.to_string()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BpaClient for InProcessBpaClient {
    async fn perform(
        &self,
        _token: &AuthToken,
        request: &TaskPerformRequest,
        _dto: &WorkflowRequest,
    ) -> Result<TaskPerformResponse> {
        let mut state = self.lock();
        if let Some(reason) = &state.failing {
            return Err(BpaError::Transport(reason.clone()));
        }

        state.performed.push(request.clone());
        if request.action.name == PROCESS_START_ACTION {
            state
                .live
                .insert((request.key.clone(), request.reference.clone()));
        }

        Ok(TaskPerformResponse {
            action: Some(Action::new(request.action.name.clone())),
            status: Some("OK".to_string()),
        })
    }

    async fn get_actions(
        &self,
        _token: &AuthToken,
        key: &str,
        reference: &str,
    ) -> Result<TaskAction> {
        let mut state = self.lock();
        state.probes += 1;
        if let Some(reason) = &state.failing {
            return Err(BpaError::Transport(reason.clone()));
        }

        if state
            .live
            .contains(&(key.to_string(), reference.to_string()))
        {
            Ok(TaskAction {
                key: key.to_string(),
                reference: reference.to_string(),
                actions: Vec::new(),
            })
        } else {
            Err(BpaError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_request(key: &str, reference: &str) -> TaskPerformRequest {
        TaskPerformRequest {
            module: "test".to_string(),
            key: key.to_string(),
            title: "T".to_string(),
            reference: reference.to_string(),
            action: Action::new(PROCESS_START_ACTION),
            remarks: None,
            idempotency_key: None,
        }
    }

    #[tokio::test]
    async fn test_start_registers_instance() {
        let client = InProcessBpaClient::new();
        let token = AuthToken::default();

        let err = client.get_actions(&token, "key1", "1").await.unwrap_err();
        assert!(matches!(err, BpaError::NotFound));

        client
            .perform(&token, &start_request("key1", "1"), &WorkflowRequest::default())
            .await
            .unwrap();

        assert!(client.is_live("key1", "1"));
        assert!(client.get_actions(&token, "key1", "1").await.is_ok());
        assert_eq!(client.probe_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let client = InProcessBpaClient::new().with_instance("key1", "1");
        client.fail_with("engine down");
        let token = AuthToken::default();

        let err = client.get_actions(&token, "key1", "1").await.unwrap_err();
        assert!(matches!(err, BpaError::Transport(ref r) if r == "engine down"));

        let err = client
            .perform(&token, &start_request("key1", "2"), &WorkflowRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BpaError::Transport(_)));
        assert!(client.performed().is_empty());

        client.recover();
        assert!(client.get_actions(&token, "key1", "1").await.is_ok());
    }
}
