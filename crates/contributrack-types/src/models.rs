use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- GitHub --

/// A single commit that fell inside the requested window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub additions: u64,
    pub deletions: u64,
}

/// Per-identity contribution totals over a date range. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorReport {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub commits: Vec<CommitRecord>,
    pub total_commits: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

impl ContributorReport {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            name: None,
            email: None,
            commits: Vec::new(),
            total_commits: 0,
            lines_added: 0,
            lines_deleted: 0,
        }
    }

    pub fn push(&mut self, commit: CommitRecord) {
        self.total_commits += 1;
        self.lines_added += commit.additions;
        self.lines_deleted += commit.deletions;
        self.commits.push(commit);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionTotals {
    pub total_contributors: u64,
    pub total_commits: u64,
    pub total_lines_added: u64,
    pub total_lines_deleted: u64,
}

impl ContributionTotals {
    pub fn from_reports(reports: &[ContributorReport]) -> Self {
        reports.iter().fold(
            Self {
                total_contributors: reports.len() as u64,
                ..Self::default()
            },
            |mut acc, r| {
                acc.total_commits += r.total_commits;
                acc.total_lines_added += r.lines_added;
                acc.total_lines_deleted += r.lines_deleted;
                acc
            },
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    pub repo_name: String,
    pub period: String,
    pub contributors: Vec<ContributorReport>,
    pub analysis: String,
    pub summary: ContributionTotals,
}

/// Rendered file-level diff of one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePatch {
    pub sha: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub patch: String,
}

/// What one user did in one repository, as reported by the activity sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRepoActivity {
    pub repo_name: String,
    pub username: String,
    pub total_commits: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub analysis: String,
    pub patch_analysis: Option<String>,
}

// -- Discord / Jira --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// An actionable task detected in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub summary: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAnalysis {
    pub summary: String,
    #[serde(default)]
    pub insights: serde_json::Value,
    #[serde(default)]
    pub actions: Vec<TaskRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn commit(sha: &str, additions: u64, deletions: u64) -> CommitRecord {
        CommitRecord {
            sha: sha.into(),
            message: format!("commit {sha}"),
            date: Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap(),
            additions,
            deletions,
        }
    }

    #[test]
    fn report_accumulates_commits() {
        let mut report = ContributorReport::new("alice");
        report.push(commit("a1", 10, 2));
        report.push(commit("a2", 3, 0));
        assert_eq!(report.total_commits, 2);
        assert_eq!(report.lines_added, 13);
        assert_eq!(report.lines_deleted, 2);
        assert_eq!(report.commits.len(), 2);
    }

    #[test]
    fn totals_sum_over_reports() {
        let mut alice = ContributorReport::new("alice");
        alice.push(commit("a1", 10, 2));
        let mut bob = ContributorReport::new("bob");
        bob.push(commit("b1", 1, 1));
        bob.push(commit("b2", 4, 0));

        let totals = ContributionTotals::from_reports(&[alice, bob]);
        assert_eq!(
            totals,
            ContributionTotals {
                total_contributors: 2,
                total_commits: 3,
                total_lines_added: 15,
                total_lines_deleted: 3,
            }
        );
    }

    #[test]
    fn task_record_tolerates_missing_optionals() {
        let task: TaskRecord =
            serde_json::from_str(r#"{"summary":"Fix it","description":"The server is down"}"#).unwrap();
        assert_eq!(task.priority, None);
        assert_eq!(task.due_date, None);
    }
}
