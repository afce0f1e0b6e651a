//! Sample business service: fetching a feature kicks off its approval workflow.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::workflow::{ActivityKey, WorkflowError, WorkflowService};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub feature_id: i64,
    pub feature_name: String,
    pub feature_description: String,
}

pub struct FeatureService {
    workflows: Arc<WorkflowService>,
}

impl FeatureService {
    pub fn new(workflows: Arc<WorkflowService>) -> Self {
        Self { workflows }
    }

    pub async fn get_feature(&self) -> Result<Feature, WorkflowError> {
        let feature = Feature {
            feature_id: 1,
            feature_name: "Feature 1".to_string(),
            feature_description: "Feature 1 Description".to_string(),
        };

        self.workflows
            .initiate_workflow_with_remarks(
                ActivityKey::Key1,
                &feature.feature_id.to_string(),
                "Your Title",
                "ExampleusernameId",
                "Remarks",
            )
            .await?;

        Ok(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpa::{AuthToken, InProcessBpaClient};

    #[tokio::test]
    async fn test_get_feature_starts_approval_once() {
        let client = Arc::new(InProcessBpaClient::new());
        let workflows = Arc::new(WorkflowService::new(
            client.clone(),
            "features",
            AuthToken::default(),
        ));
        let service = FeatureService::new(workflows);

        let feature = service.get_feature().await.unwrap();
        assert_eq!(feature.feature_id, 1);
        service.get_feature().await.unwrap();

        let performed = client.performed();
        assert_eq!(performed.len(), 1);
        assert_eq!(performed[0].key, "key1");
        assert_eq!(performed[0].reference, "1");
        assert_eq!(performed[0].title, "Your Title");
        assert_eq!(performed[0].remarks.as_deref(), Some("Remarks"));
    }
}
