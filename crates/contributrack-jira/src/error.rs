use thiserror::Error;

/// Failure creating an issue. Never leaves this crate: `JiraClient::create_issue`
/// logs it and reports "no issue" instead.
#[derive(Debug, Error)]
pub enum JiraError {
    #[error("Jira request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Jira returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected Jira response: {0}")]
    Decode(String),
}
