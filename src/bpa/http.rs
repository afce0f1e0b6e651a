//! HTTP client for the BPA engine.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use super::client::{AuthToken, BpaClient, Result};
use super::error::BpaError;
use super::types::{TaskAction, TaskPerformRequest, TaskPerformResponse, WorkflowRequest};

const PERFORM_PATH: &str = "api/v1/tasks/perform";
const ACTIONS_PATH: &str = "api/v1/tasks/actions";

pub struct HttpBpaClient {
    client: Client,
    base_url: Url,
}

impl HttpBpaClient {
    pub fn new(base_url: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: normalize_base(base_url),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BpaError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    /// Map non-2xx answers onto the error taxonomy; 2xx passes through.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BpaError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BpaError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl BpaClient for HttpBpaClient {
    async fn perform(
        &self,
        token: &AuthToken,
        request: &TaskPerformRequest,
        _dto: &WorkflowRequest,
    ) -> Result<TaskPerformResponse> {
        let url = self.endpoint(PERFORM_PATH)?;
        tracing::debug!(
            key = %request.key,
            reference = %request.reference,
            action = %request.action.name,
            "POST {}",
            url
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(token.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| BpaError::Transport(e.to_string()))?;

        Self::check_status(response)
            .await?
            .json::<TaskPerformResponse>()
            .await
            .map_err(|e| BpaError::Decode(e.to_string()))
    }

    /// Any 2xx means the instance exists, whatever the body holds; an
    /// unreadable listing comes back empty.
    async fn get_actions(
        &self,
        token: &AuthToken,
        key: &str,
        reference: &str,
    ) -> Result<TaskAction> {
        let url = self.endpoint(ACTIONS_PATH)?;
        tracing::debug!(key, reference, "GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token.as_str())
            .query(&[("key", key), ("ref", reference)])
            .send()
            .await
            .map_err(|e| BpaError::Transport(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| BpaError::Transport(e.to_string()))?;

        match serde_json::from_str::<TaskAction>(&body) {
            Ok(actions) => Ok(actions),
            Err(e) => {
                tracing::debug!(
                    key,
                    reference,
                    error = %e,
                    "Unreadable action listing, treating as empty"
                );
                Ok(TaskAction {
                    key: key.to_string(),
                    reference: reference.to_string(),
                    actions: Vec::new(),
                })
            }
        }
    }
}
