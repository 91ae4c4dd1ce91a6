use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use tracing::info;

use contributrack_types::DateRange;
use contributrack_types::api::{RepoRangeQuery, RepoUserRangeQuery, UserRangeQuery};
use contributrack_types::models::{
    CodePatch, ContributorReport, RepositoryAnalysis, UserRepoActivity,
};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn repos_users(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, Vec<String>>>, ApiError> {
    Ok(Json(state.analytics.users_repositories().await?))
}

pub async fn repo_contributions(
    State(state): State<AppState>,
    query: Result<Query<RepoRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<ContributorReport>>, ApiError> {
    let Query(q) = query?;
    let range = DateRange::parse(q.start_date.as_deref(), q.end_date.as_deref())?;
    info!(repo = %q.repo_name, period = %range.describe(), "Repository contributions requested");

    let reports = state
        .analytics
        .repository_contributors(&q.repo_name, &range)
        .await?;
    Ok(Json(reports))
}

pub async fn summary_repo(
    State(state): State<AppState>,
    query: Result<Query<RepoRangeQuery>, QueryRejection>,
) -> Result<Json<RepositoryAnalysis>, ApiError> {
    let Query(q) = query?;
    let range = DateRange::parse(q.start_date.as_deref(), q.end_date.as_deref())?;
    info!(repo = %q.repo_name, period = %range.describe(), "Repository summary requested");

    let analysis = state
        .analytics
        .analyze_contributions(&q.repo_name, &range)
        .await?;
    Ok(Json(analysis))
}

pub async fn code_patches(
    State(state): State<AppState>,
    query: Result<Query<RepoUserRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<CodePatch>>, ApiError> {
    let Query(q) = query?;
    let range = DateRange::parse(q.start_date.as_deref(), q.end_date.as_deref())?;

    let patches = state
        .analytics
        .user_code_patches(&q.repo_name, &q.username, &range)
        .await?;
    Ok(Json(patches))
}

pub async fn user_activity(
    State(state): State<AppState>,
    query: Result<Query<UserRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<UserRepoActivity>>, ApiError> {
    let Query(q) = query?;
    let range = DateRange::parse(q.start_date.as_deref(), q.end_date.as_deref())?;
    info!(username = %q.username, period = %range.describe(), "User activity requested");

    let activity = state
        .analytics
        .analyze_user_contributions(&q.username, &range)
        .await?;
    Ok(Json(activity))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use contributrack_db::Database;
    use contributrack_github::{GithubAnalytics, GithubAppConfig, GithubClient};
    use contributrack_llm::{ChatModel, LlmError, Summarizer};
    use http_body_util::BodyExt;
    use httpmock::prelude::*;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::router;
    use crate::state::AppStateInner;

    const TEST_KEY: &str = include_str!("../../contributrack-github/testdata/app_key.pem");

    struct FixedModel;

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            Ok("quiet month".into())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn app(server: &MockServer) -> axum::Router {
        let config = GithubAppConfig {
            app_id: "4242".into(),
            private_key: TEST_KEY.into(),
            installation_id: "99".into(),
            client_id: None,
            api_base_url: server.base_url(),
            request_timeout: Duration::from_secs(5),
        };
        let analytics = GithubAnalytics::new(
            GithubClient::new(config).unwrap(),
            Summarizer::new(Arc::new(FixedModel)),
            Arc::new(Database::open_in_memory().unwrap()),
        );
        router(Arc::new(AppStateInner {
            api_key: "letmein".into(),
            analytics,
        }))
    }

    fn mount_token(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST).path("/app/installations/99/access_tokens");
            then.status(201)
                .json_body(json!({"token": "ghs_api", "expires_at": "2099-01-01T00:00:00Z"}));
        })
    }

    async fn get(app: axum::Router, uri: &str, key: Option<&str>) -> (StatusCode, Value) {
        let mut req = Request::builder().uri(uri);
        if let Some(key) = key {
            req = req.header("x-api-key", key);
        }
        let resp = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn greeting_is_public() {
        let server = MockServer::start();
        let (status, body) = get(app(&server), "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Hello, World!"));

        let (status, body) = get(app(&server), "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn missing_or_wrong_key_never_reaches_github() {
        let server = MockServer::start();
        let token = mount_token(&server);
        let repos = server.mock(|when, then| {
            when.method(GET).path("/installation/repositories");
            then.status(200).json_body(json!({"repositories": []}));
        });

        let (status, body) = get(app(&server), "/github_repos_users", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"detail": "Invalid API Key"}));

        let (status, _) = get(app(&server), "/github_repos_users", Some("letmeout")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        token.assert_hits(0);
        repos.assert_hits(0);
    }

    #[tokio::test]
    async fn contributions_for_valid_key() {
        let server = MockServer::start();
        mount_token(&server);
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/contributors");
            then.status(200).json_body(json!([{"login": "alice"}]));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/widgets/commits")
                .query_param("author", "alice");
            then.status(200).json_body(json!([
                {"sha": "a1", "commit": {"message": "fix", "author": {"date": "2025-01-10T09:00:00Z"}}},
                {"sha": "a2", "commit": {"message": "feat", "author": {"date": "2025-02-01T09:00:00Z"}}}
            ]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/commits/a1");
            then.status(200).json_body(json!({
                "sha": "a1",
                "commit": {"message": "fix", "author": {"date": "2025-01-10T09:00:00Z"}},
                "stats": {"additions": 10, "deletions": 2},
                "files": []
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/users/alice");
            then.status(200).json_body(json!({"login": "alice", "name": null, "email": null}));
        });

        let (status, body) = get(
            app(&server),
            "/github_repo_contributions?repo_name=acme/widgets&start_date=2025-01-01&end_date=2025-01-31",
            Some("letmein"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["login"], "alice");
        assert_eq!(body[0]["total_commits"], 1);
        assert_eq!(body[0]["lines_added"], 10);
        assert_eq!(body[0]["lines_deleted"], 2);
    }

    #[tokio::test]
    async fn bad_dates_are_rejected_before_fetching() {
        let server = MockServer::start();
        let token = mount_token(&server);

        let (status, body) = get(
            app(&server),
            "/github_summary_repo?repo_name=acme/widgets&start_date=last-week",
            Some("letmein"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("last-week"));

        let (status, _) = get(
            app(&server),
            "/github_summary_repo?repo_name=acme/widgets&start_date=2025-02-01&end_date=2025-01-01",
            Some("letmein"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        token.assert_hits(0);
    }

    #[tokio::test]
    async fn missing_query_field_is_bad_request() {
        let server = MockServer::start();
        let (status, body) = get(app(&server), "/github_codepatches?repo_name=acme/widgets", Some("letmein")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("username"));
    }

    #[tokio::test]
    async fn github_failure_is_bad_gateway() {
        let server = MockServer::start();
        mount_token(&server);
        server.mock(|when, then| {
            when.method(GET).path("/installation/repositories");
            then.status(500).json_body(json!({"message": "boom"}));
        });

        let (status, body) = get(
            app(&server),
            "/github_user_activity?username=alice",
            Some("letmein"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["detail"].as_str().unwrap().contains("boom"));
    }
}
