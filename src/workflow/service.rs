//! WorkflowService: guarded workflow start on top of the BPA boundary.
//!
//! Starting is not idempotent at the engine (two starts, two instances), so
//! `initiate_workflow*` probe for an existing instance first and only start
//! when none is found. The probe and the start are two separate calls with no
//! lock in between: concurrent initiations for the same (key, ref) can still
//! both start. Start requests carry a stable idempotency key so an engine that
//! de-duplicates can collapse them.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::error::WorkflowError;
use super::keys::ActivityKey;
use crate::bpa::{
    Action, AuthToken, BpaClient, BpaError, TaskAction, TaskPerformRequest, TaskPerformResponse,
    WorkflowRequest,
};

/// Action name that creates a new process instance.
pub const PROCESS_START_ACTION: &str = "start";

/// Result of probing the engine for a process instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskProbe {
    Exists(TaskAction),
    NotFound,
    /// The probe itself failed; existence is unknown.
    Failed(String),
}

impl TaskProbe {
    pub fn exists(&self) -> bool {
        matches!(self, Self::Exists(_))
    }
}

pub struct WorkflowService {
    client: Arc<dyn BpaClient>,
    module_name: String,
    token: AuthToken,
}

impl WorkflowService {
    /// `token` is the service credential used for calls the starter makes on its
    /// own behalf; request handlers pass the caller's token via [`Self::with_token`].
    pub fn new(
        client: Arc<dyn BpaClient>,
        module_name: impl Into<String>,
        token: AuthToken,
    ) -> Self {
        Self {
            client,
            module_name: module_name.into(),
            token,
        }
    }

    /// A view of this service that authenticates with `token`.
    pub fn with_token(&self, token: AuthToken) -> Self {
        Self {
            client: Arc::clone(&self.client),
            module_name: self.module_name.clone(),
            token,
        }
    }

    /// Forward a workflow action to the engine.
    ///
    /// Exactly one outbound call; failures propagate untouched, nothing is retried.
    pub async fn perform_process(
        &self,
        request: &WorkflowRequest,
    ) -> Result<TaskPerformResponse, WorkflowError> {
        let outbound = self.build_perform_request(request);

        tracing::debug!(
            module = %outbound.module,
            key = %outbound.key,
            reference = %outbound.reference,
            action = %outbound.action.name,
            "Performing workflow action"
        );

        let response = self.client.perform(&self.token, &outbound, request).await?;
        Ok(response)
    }

    fn build_perform_request(&self, request: &WorkflowRequest) -> TaskPerformRequest {
        let remarks = request
            .remarks
            .as_ref()
            .filter(|r| !r.is_empty())
            .cloned();

        let idempotency_key = (request.action == PROCESS_START_ACTION).then(|| {
            start_idempotency_key(&self.module_name, &request.key, &request.reference)
        });

        TaskPerformRequest {
            module: self.module_name.clone(),
            key: request.key.clone(),
            title: request.title.clone(),
            reference: request.reference.clone(),
            action: Action::new(request.action.clone()),
            remarks,
            idempotency_key,
        }
    }

    /// Probe the engine for a process instance under (key, reference).
    pub async fn probe_task(&self, key: &str, reference: &str) -> TaskProbe {
        match self.client.get_actions(&self.token, key, reference).await {
            Ok(actions) => TaskProbe::Exists(actions),
            Err(BpaError::NotFound) => TaskProbe::NotFound,
            Err(e) => TaskProbe::Failed(e.to_string()),
        }
    }

    /// True iff the engine answered the action listing for (key, reference).
    ///
    /// Any failure, including a transient one, reads as "does not exist";
    /// use [`Self::probe_task`] to tell the two apart.
    pub async fn is_task_exists(&self, key: &str, reference: &str) -> bool {
        self.probe_task(key, reference).await.exists()
    }

    pub async fn get_actions(
        &self,
        key: &str,
        reference: &str,
    ) -> Result<TaskAction, WorkflowError> {
        Ok(self.client.get_actions(&self.token, key, reference).await?)
    }

    /// Start the workflow `activity_key` for `ref_id` unless an instance exists.
    ///
    /// `reference_id` identifies the initiating user; it is logged, not sent.
    pub async fn initiate_workflow(
        &self,
        activity_key: ActivityKey,
        ref_id: &str,
        title: &str,
        reference_id: &str,
    ) -> Result<(), WorkflowError> {
        self.initiate(activity_key.as_str(), ref_id, title, reference_id, None)
            .await
    }

    /// Same as [`Self::initiate_workflow`], attaching `remarks` to the start.
    pub async fn initiate_workflow_with_remarks(
        &self,
        activity_key: ActivityKey,
        ref_id: &str,
        title: &str,
        reference_id: &str,
        remarks: &str,
    ) -> Result<(), WorkflowError> {
        self.initiate(
            activity_key.as_str(),
            ref_id,
            title,
            reference_id,
            Some(remarks.to_string()),
        )
        .await
    }

    /// Key-string variant for process definitions outside [`ActivityKey`].
    pub async fn initiate_workflow_for_key(
        &self,
        key: &str,
        ref_id: &str,
        title: &str,
        reference_id: &str,
        remarks: Option<&str>,
    ) -> Result<(), WorkflowError> {
        self.initiate(key, ref_id, title, reference_id, remarks.map(str::to_string))
            .await
    }

    async fn initiate(
        &self,
        key: &str,
        ref_id: &str,
        title: &str,
        reference_id: &str,
        remarks: Option<String>,
    ) -> Result<(), WorkflowError> {
        match self.probe_task(key, ref_id).await {
            TaskProbe::Exists(_) => {
                tracing::debug!(
                    key,
                    reference = ref_id,
                    "Workflow instance already exists, skipping start"
                );
                return Ok(());
            }
            TaskProbe::NotFound => {}
            TaskProbe::Failed(reason) => {
                tracing::warn!(
                    key,
                    reference = ref_id,
                    reason = %reason,
                    "Workflow existence probe failed, starting anyway"
                );
            }
        }

        let request = WorkflowRequest {
            key: key.to_string(),
            title: title.to_string(),
            reference: ref_id.to_string(),
            action: PROCESS_START_ACTION.to_string(),
            remarks,
        };
        self.perform_process(&request).await?;

        tracing::info!(
            key,
            reference = ref_id,
            initiated_by = reference_id,
            "Workflow instance started"
        );
        Ok(())
    }
}

/// Hex SHA-256 of `module|key|ref|start`.
fn start_idempotency_key(module: &str, key: &str, reference: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(module.as_bytes());
    hasher.update(b"|");
    hasher.update(key.as_bytes());
    hasher.update(b"|");
    hasher.update(reference.as_bytes());
    hasher.update(b"|");
    hasher.update(PROCESS_START_ACTION.as_bytes());
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpa::InProcessBpaClient;

    fn service(client: Arc<InProcessBpaClient>) -> WorkflowService {
        WorkflowService::new(client, "test_module", AuthToken::new("svc"))
    }

    fn request(remarks: Option<&str>) -> WorkflowRequest {
        WorkflowRequest {
            key: "key1".to_string(),
            title: "Title".to_string(),
            reference: "42".to_string(),
            action: "approved".to_string(),
            remarks: remarks.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_initiate_starts_when_probe_fails() {
        let probe_fails = Arc::new(FailingProbeClient {
            inner: InProcessBpaClient::new(),
        });
        let svc = WorkflowService::new(probe_fails.clone(), "test_module", AuthToken::default());

        assert!(!svc.is_task_exists("key1", "42").await);
        svc.initiate_workflow(ActivityKey::Key1, "42", "Title", "user1")
            .await
            .unwrap();

        let performed = probe_fails.inner.performed();
        assert_eq!(performed.len(), 1);
        let start = &performed[0];
        assert_eq!(start.key, "key1");
        assert_eq!(start.reference, "42");
        assert_eq!(start.title, "Title");
        assert_eq!(start.action.name, PROCESS_START_ACTION);
        assert!(start.remarks.is_none());
    }

    #[tokio::test]
    async fn test_initiate_starts_once_when_not_found() {
        let client = Arc::new(InProcessBpaClient::new());
        let svc = service(client.clone());

        assert!(!svc.is_task_exists("key1", "42").await);
        svc.initiate_workflow(ActivityKey::Key1, "42", "Title", "user1")
            .await
            .unwrap();

        let performed = client.performed();
        assert_eq!(performed.len(), 1);
        assert_eq!(performed[0].action.name, "start");
        assert_eq!(performed[0].module, "test_module");
    }

    #[tokio::test]
    async fn test_initiate_skips_when_instance_exists() {
        let client = Arc::new(InProcessBpaClient::new().with_instance("key1", "42"));
        let svc = service(client.clone());

        assert!(svc.is_task_exists("key1", "42").await);
        svc.initiate_workflow(ActivityKey::Key1, "42", "Title", "user1")
            .await
            .unwrap();
        svc.initiate_workflow_with_remarks(ActivityKey::Key1, "42", "Title", "user1", "again")
            .await
            .unwrap();

        assert!(client.performed().is_empty());
    }

    #[tokio::test]
    async fn test_get_actions_passes_listing_through() {
        let client = Arc::new(InProcessBpaClient::new().with_instance("key2", "5"));
        let svc = service(client.clone());

        let listing = svc.get_actions("key2", "5").await.unwrap();
        assert_eq!(listing.key, "key2");
        assert_eq!(listing.reference, "5");
        assert_eq!(client.probe_count(), 1);
    }

    #[tokio::test]
    async fn test_get_actions_not_found_is_boundary_error() {
        let svc = service(Arc::new(InProcessBpaClient::new()));

        let err = svc.get_actions("key2", "5").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Boundary(BpaError::NotFound)));
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn test_initiate_for_key_starts_once_then_skips() {
        let client = Arc::new(InProcessBpaClient::new());
        let svc = service(client.clone());

        svc.initiate_workflow_for_key("vendor_onboarding", "88", "Vendor", "user1", Some("new"))
            .await
            .unwrap();
        svc.initiate_workflow_for_key("vendor_onboarding", "88", "Vendor", "user1", None)
            .await
            .unwrap();

        let performed = client.performed();
        assert_eq!(performed.len(), 1);
        assert_eq!(performed[0].key, "vendor_onboarding");
        assert_eq!(performed[0].reference, "88");
        assert_eq!(performed[0].action.name, "start");
        assert_eq!(performed[0].remarks.as_deref(), Some("new"));
        assert!(client.is_live("vendor_onboarding", "88"));
    }

    #[tokio::test]
    async fn test_sequential_initiations_start_once() {
        let client = Arc::new(InProcessBpaClient::new());
        let svc = service(client.clone());

        for _ in 0..3 {
            svc.initiate_workflow(ActivityKey::Key2, "7", "Title", "user1")
                .await
                .unwrap();
        }
        assert_eq!(client.performed().len(), 1);
    }

    #[tokio::test]
    async fn test_initiate_with_remarks_forwards_remarks() {
        let client = Arc::new(InProcessBpaClient::new());
        let svc = service(client.clone());

        svc.initiate_workflow_with_remarks(ActivityKey::Key1, "1", "Your Title", "u", "Remarks")
            .await
            .unwrap();

        let performed = client.performed();
        assert_eq!(performed.len(), 1);
        assert_eq!(performed[0].remarks.as_deref(), Some("Remarks"));
    }

    #[tokio::test]
    async fn test_perform_sets_remarks_only_when_non_empty() {
        let client = Arc::new(InProcessBpaClient::new());
        let svc = service(client.clone());

        svc.perform_process(&request(None)).await.unwrap();
        svc.perform_process(&request(Some(""))).await.unwrap();
        svc.perform_process(&request(Some("looks good"))).await.unwrap();

        let remarks: Vec<Option<String>> =
            client.performed().into_iter().map(|r| r.remarks).collect();
        assert_eq!(remarks, vec![None, None, Some("looks good".to_string())]);
    }

    #[tokio::test]
    async fn test_perform_forwards_request_verbatim() {
        let client = Arc::new(InProcessBpaClient::new());
        let svc = service(client.clone());

        let response = svc.perform_process(&request(None)).await.unwrap();
        assert_eq!(response.action.map(|a| a.name), Some("approved".to_string()));

        let sent = &client.performed()[0];
        assert_eq!(sent.module, "test_module");
        assert_eq!(sent.key, "key1");
        assert_eq!(sent.title, "Title");
        assert_eq!(sent.reference, "42");
        assert_eq!(sent.action, Action::new("approved"));
        assert!(sent.idempotency_key.is_none());
    }

    #[tokio::test]
    async fn test_perform_propagates_boundary_failure() {
        let client = Arc::new(InProcessBpaClient::new());
        client.fail_with("boom");
        let svc = service(client);

        let err = svc.perform_process(&request(None)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Boundary(BpaError::Transport(_))));
        assert_eq!(err.http_status(), 502);
    }

    #[tokio::test]
    async fn test_probe_distinguishes_not_found_from_failure() {
        let client = Arc::new(InProcessBpaClient::new().with_instance("key1", "1"));
        let svc = service(client.clone());

        assert!(svc.probe_task("key1", "1").await.exists());
        assert_eq!(svc.probe_task("key1", "2").await, TaskProbe::NotFound);

        client.fail_with("timeout");
        assert!(matches!(
            svc.probe_task("key1", "1").await,
            TaskProbe::Failed(_)
        ));
        assert!(!svc.is_task_exists("key1", "1").await);
    }

    #[test]
    fn test_start_idempotency_key_is_stable() {
        let a = start_idempotency_key("m", "key1", "42");
        let b = start_idempotency_key("m", "key1", "42");
        let c = start_idempotency_key("m", "key1", "43");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_start_request_carries_idempotency_key() {
        let client = Arc::new(InProcessBpaClient::new());
        let svc = service(client.clone());

        svc.initiate_workflow(ActivityKey::Key1, "42", "Title", "user1")
            .await
            .unwrap();

        let sent = &client.performed()[0];
        assert_eq!(
            sent.idempotency_key.as_deref(),
            Some(start_idempotency_key("test_module", "key1", "42").as_str())
        );
    }

    /// Probe always fails; perform goes to the in-process client.
    struct FailingProbeClient {
        inner: InProcessBpaClient,
    }

    #[async_trait::async_trait]
    impl BpaClient for FailingProbeClient {
        async fn perform(
            &self,
            token: &AuthToken,
            request: &TaskPerformRequest,
            dto: &WorkflowRequest,
        ) -> crate::bpa::client::Result<TaskPerformResponse> {
            self.inner.perform(token, request, dto).await
        }

        async fn get_actions(
            &self,
            _token: &AuthToken,
            _key: &str,
            _reference: &str,
        ) -> crate::bpa::client::Result<TaskAction> {
            Err(BpaError::Remote {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }
}
