use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, LINK};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::app_auth::{AppTokenProvider, GITHUB_ACCEPT, GITHUB_API_VERSION};
use crate::config::GithubAppConfig;
use crate::error::{GithubError, RemoteFetchError};

const PER_PAGE: &str = "100";
const USER_AGENT: &str = concat!("contributrack/", env!("CARGO_PKG_VERSION"));

// ── Wire records ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
struct InstallationRepositories {
    repositories: Vec<Repository>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contributor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitActor {
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitData {
    pub message: String,
    pub author: GitActor,
}

/// Entry of a commit listing. Carries no stats.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub commit: CommitData,
}

impl CommitSummary {
    pub fn authored_at(&self) -> DateTime<Utc> {
        self.commit.author.date
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitStats {
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitFile {
    pub filename: String,
    pub status: String,
    pub patch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    pub commit: CommitData,
    #[serde(default)]
    pub stats: CommitStats,
    #[serde(default)]
    pub files: Vec<CommitFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: Option<String>,
}

// ── Client ──────────────────────────────────────────────────────────────

/// Installation-scoped GitHub REST client.
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    tokens: AppTokenProvider,
}

impl GithubClient {
    pub fn new(config: GithubAppConfig) -> Result<Self, GithubError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GithubError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.api_base_url.clone(),
            tokens: AppTokenProvider::new(http.clone(), config),
            http,
        })
    }

    /// Full names of every repository the installation can see.
    pub async fn installation_repositories(&self) -> Result<Vec<String>, GithubError> {
        let repos = self
            .get_paginated("/installation/repositories", &[], |page: InstallationRepositories| {
                page.repositories
            })
            .await?;
        Ok(repos.into_iter().map(|r| r.full_name).collect())
    }

    pub async fn contributors(&self, repo: &str) -> Result<Vec<Contributor>, GithubError> {
        self.get_paginated(&format!("/repos/{repo}/contributors"), &[], |page: Vec<Contributor>| page)
            .await
    }

    pub async fn commits_by_author(
        &self,
        repo: &str,
        author: &str,
    ) -> Result<Vec<CommitSummary>, GithubError> {
        self.get_paginated(
            &format!("/repos/{repo}/commits"),
            &[("author", author)],
            |page: Vec<CommitSummary>| page,
        )
        .await
    }

    pub async fn commit_detail(&self, repo: &str, sha: &str) -> Result<CommitDetail, GithubError> {
        let (detail, _) = self
            .get_page(&format!("/repos/{repo}/commits/{sha}"), &[])
            .await?;
        Ok(detail)
    }

    pub async fn user_profile(&self, login: &str) -> Result<UserProfile, GithubError> {
        let (profile, _) = self.get_page(&format!("/users/{login}"), &[]).await?;
        Ok(profile)
    }

    /// Walk `page=1..` until the `Link` header stops advertising a next page.
    /// Any failing page fails the whole walk.
    async fn get_paginated<P, T>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        items: impl Fn(P) -> Vec<T>,
    ) -> Result<Vec<T>, GithubError>
    where
        P: DeserializeOwned,
    {
        let mut out = Vec::new();
        let mut page = 1u32;

        loop {
            let page_str = page.to_string();
            let mut params = query.to_vec();
            params.push(("per_page", PER_PAGE));
            params.push(("page", &page_str));

            let (body, has_next): (P, bool) = self.get_page(path, &params).await?;
            let batch = items(body);
            let empty = batch.is_empty();
            out.extend(batch);

            if !has_next || empty {
                break;
            }
            page += 1;
        }

        debug!(path, pages = page, items = out.len(), "Fetched paginated collection");
        Ok(out)
    }

    async fn get_page<P: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<(P, bool), GithubError> {
        let token = self.tokens.installation_token().await?;
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .query(query)
            .send()
            .await
            .map_err(|source| RemoteFetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorMessage>()
                .await
                .ok()
                .and_then(|m| m.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(RemoteFetchError::Status {
                status: status.as_u16(),
                url,
                message,
            }
            .into());
        }

        let has_next = has_next_page(response.headers());
        let text = response
            .text()
            .await
            .map_err(|source| RemoteFetchError::Transport {
                url: url.clone(),
                source,
            })?;
        let body = serde_json::from_str(&text).map_err(|e| RemoteFetchError::Decode {
            url,
            reason: e.to_string(),
        })?;

        Ok((body, has_next))
    }
}

fn has_next_page(headers: &HeaderMap) -> bool {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|part| part.contains("rel=\"next\""))
}
