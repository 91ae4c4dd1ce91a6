use contributrack_types::models::TaskRecord;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::JiraConfig;
use crate::error::JiraError;
use crate::payload::issue_payload;

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

pub struct JiraClient {
    http: reqwest::Client,
    config: JiraConfig,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self, JiraError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// File `task` as a Jira issue and return its key. Failures are logged and
    /// reported as `None`.
    pub async fn create_issue(&self, task: &TaskRecord) -> Option<String> {
        match self.try_create_issue(task).await {
            Ok(key) => {
                info!(key = %key, summary = %task.summary, "Created Jira issue");
                Some(key)
            }
            Err(e) => {
                warn!(summary = %task.summary, "Failed to create Jira issue: {}", e);
                None
            }
        }
    }

    async fn try_create_issue(&self, task: &TaskRecord) -> Result<String, JiraError> {
        let payload = issue_payload(&self.config.project_key, task);

        let response = self
            .http
            .post(self.config.issue_url())
            .basic_auth(&self.config.email, Some(&self.config.api_token))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(JiraError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedIssue = response
            .json()
            .await
            .map_err(|e| JiraError::Decode(e.to_string()))?;
        Ok(created.key)
    }
}
