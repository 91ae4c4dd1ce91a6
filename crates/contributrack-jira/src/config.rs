use std::time::Duration;

use anyhow::{Result, anyhow};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct JiraConfig {
    /// Site root, e.g. `https://acme.atlassian.net`.
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("project_key", &self.project_key)
            .finish()
    }
}

impl JiraConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| anyhow!("{} is not set", key));

        Ok(Self {
            base_url: require("JIRA_BASE_URL")?.trim_end_matches('/').to_string(),
            email: require("JIRA_API_EMAIL")?,
            api_token: require("JIRA_API_TOKEN")?,
            project_key: require("JIRA_PROJECT")?,
            request_timeout: Duration::from_secs(
                get("JIRA_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }

    pub fn issue_url(&self) -> String {
        format!("{}/rest/api/3/issue", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn builds_issue_url_without_double_slash() {
        let cfg = JiraConfig::from_lookup(lookup(&[
            ("JIRA_BASE_URL", "https://acme.atlassian.net/"),
            ("JIRA_API_EMAIL", "bot@acme.dev"),
            ("JIRA_API_TOKEN", "secret-token"),
            ("JIRA_PROJECT", "OPS"),
        ]))
        .unwrap();

        assert_eq!(cfg.issue_url(), "https://acme.atlassian.net/rest/api/3/issue");
        assert!(!format!("{:?}", cfg).contains("secret-token"));
    }

    #[test]
    fn project_is_required() {
        let err = JiraConfig::from_lookup(lookup(&[
            ("JIRA_BASE_URL", "https://acme.atlassian.net"),
            ("JIRA_API_EMAIL", "bot@acme.dev"),
            ("JIRA_API_TOKEN", "t"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JIRA_PROJECT"));
    }
}
