use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use contributrack_db::Database;
use contributrack_db::models::NewUserContribution;
use contributrack_llm::{LlmError, Summarizer};
use contributrack_types::DateRange;
use contributrack_types::models::{
    CodePatch, CommitRecord, ContributionTotals, ContributorReport, RepositoryAnalysis,
    UserRepoActivity,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::client::{CommitDetail, GithubClient};
use crate::contributions::{aggregate_contributor, render_patch};
use crate::error::GithubError;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Github(#[from] GithubError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("store failure: {0:#}")]
    Store(anyhow::Error),
}

/// Ties the GitHub client, the summarizer and the store together for the
/// operations the HTTP surface exposes.
pub struct GithubAnalytics {
    client: GithubClient,
    summarizer: Summarizer,
    db: Arc<Database>,
}

impl GithubAnalytics {
    pub fn new(client: GithubClient, summarizer: Summarizer, db: Arc<Database>) -> Self {
        Self {
            client,
            summarizer,
            db,
        }
    }

    /// Login → sorted full names of the installation repositories that login
    /// contributed to.
    pub async fn users_repositories(&self) -> Result<BTreeMap<String, Vec<String>>, AnalyticsError> {
        let repos = self.client.installation_repositories().await?;
        let mut by_user: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for repo in &repos {
            for contributor in self.client.contributors(repo).await? {
                by_user.entry(contributor.login).or_default().push(repo.clone());
            }
        }
        for repos in by_user.values_mut() {
            repos.sort();
            repos.dedup();
        }

        info!(repos = repos.len(), users = by_user.len(), "Mapped installation contributors");
        Ok(by_user)
    }

    /// Contributors of `repo` with at least one commit in `range`.
    pub async fn repository_contributors(
        &self,
        repo: &str,
        range: &DateRange,
    ) -> Result<Vec<ContributorReport>, AnalyticsError> {
        let mut reports = Vec::new();

        for contributor in self.client.contributors(repo).await? {
            let details = self.commit_details(repo, &contributor.login, range).await?;
            let mut report =
                aggregate_contributor(&contributor.login, details.iter().map(commit_record), range);
            if report.total_commits == 0 {
                continue;
            }

            let profile = self.client.user_profile(&contributor.login).await?;
            report.name = profile.name;
            report.email = profile.email;
            reports.push(report);
        }

        debug!(repo, contributors = reports.len(), "Aggregated repository contributions");
        Ok(reports)
    }

    pub async fn analyze_contributions(
        &self,
        repo: &str,
        range: &DateRange,
    ) -> Result<RepositoryAnalysis, AnalyticsError> {
        let contributors = self.repository_contributors(repo, range).await?;
        let period = range.describe();
        let analysis = self
            .summarizer
            .analyze_contributions(repo, &period, &contributors)
            .await?;

        Ok(RepositoryAnalysis {
            repo_name: repo.to_string(),
            summary: ContributionTotals::from_reports(&contributors),
            period,
            contributors,
            analysis,
        })
    }

    pub async fn user_code_patches(
        &self,
        repo: &str,
        username: &str,
        range: &DateRange,
    ) -> Result<Vec<CodePatch>, AnalyticsError> {
        let details = self.commit_details(repo, username, range).await?;
        Ok(details.iter().map(code_patch).collect())
    }

    /// Sweep every installation repository for `username`'s in-range work.
    /// Each repository with activity gets a persisted snapshot row and its own
    /// analysis.
    pub async fn analyze_user_contributions(
        &self,
        username: &str,
        range: &DateRange,
    ) -> Result<Vec<UserRepoActivity>, AnalyticsError> {
        let period = range.describe();
        let mut activity = Vec::new();

        for repo in self.client.installation_repositories().await? {
            let details = self.commit_details(&repo, username, range).await?;
            if details.is_empty() {
                continue;
            }

            let report = aggregate_contributor(username, details.iter().map(commit_record), range);
            self.persist_snapshot(&repo, &report).await?;

            let analysis = self
                .summarizer
                .analyze_contributions(&repo, &period, std::slice::from_ref(&report))
                .await?;

            let patches: Vec<CodePatch> = details.iter().map(code_patch).collect();
            let patch_analysis = Some(self.summarizer.analyze_code_patches(&patches).await?);

            activity.push(UserRepoActivity {
                repo_name: repo,
                username: username.to_string(),
                total_commits: report.total_commits,
                lines_added: report.lines_added,
                lines_deleted: report.lines_deleted,
                analysis,
                patch_analysis,
            });
        }

        info!(username, repos = activity.len(), "Analyzed user activity");
        Ok(activity)
    }

    pub async fn analyze_commit_messages(&self, commits: &[CommitRecord]) -> Result<String, AnalyticsError> {
        Ok(self.summarizer.analyze_commit_messages(commits).await?)
    }

    /// Details of `author`'s commits in `repo`, fetching only those whose
    /// listing date is inside `range`.
    async fn commit_details(
        &self,
        repo: &str,
        author: &str,
        range: &DateRange,
    ) -> Result<Vec<CommitDetail>, AnalyticsError> {
        let mut details = Vec::new();
        for summary in self.client.commits_by_author(repo, author).await? {
            if !range.contains(summary.authored_at()) {
                continue;
            }
            details.push(self.client.commit_detail(repo, &summary.sha).await?);
        }
        Ok(details)
    }

    async fn persist_snapshot(&self, repo: &str, report: &ContributorReport) -> Result<(), AnalyticsError> {
        let row = NewUserContribution {
            repo_name: repo.to_string(),
            username: report.login.clone(),
            total_commits: report.total_commits as i64,
            lines_added: report.lines_added as i64,
            lines_deleted: report.lines_deleted as i64,
            date: Utc::now().format("%Y-%m-%d").to_string(),
        };

        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.insert_user_contribution(&row))
            .await
            .map_err(|e| AnalyticsError::Store(anyhow::anyhow!("spawn_blocking failed: {}", e)))?
            .map_err(AnalyticsError::Store)?;
        Ok(())
    }
}

fn commit_record(detail: &CommitDetail) -> CommitRecord {
    CommitRecord {
        sha: detail.sha.clone(),
        message: detail.commit.message.clone(),
        date: detail.commit.author.date,
        additions: detail.stats.additions,
        deletions: detail.stats.deletions,
    }
}

fn code_patch(detail: &CommitDetail) -> CodePatch {
    CodePatch {
        sha: detail.sha.clone(),
        message: detail.commit.message.clone(),
        date: detail.commit.author.date,
        patch: render_patch(&detail.files),
    }
}
