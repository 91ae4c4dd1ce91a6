use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use contributrack_db::Database;
use contributrack_jira::JiraClient;
use contributrack_llm::Summarizer;
use contributrack_types::DateRange;
use contributrack_types::models::ChannelAnalysis;

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub message_count: usize,
    /// `None` when there was nothing to analyze.
    pub analysis: Option<ChannelAnalysis>,
    pub created_issues: Vec<String>,
}

/// Summarize one channel's messages in `range` and, when `jira` is given,
/// file every detected action item.
pub async fn analyze_channel(
    db: Arc<Database>,
    channel_id: i64,
    range: DateRange,
    summarizer: &Summarizer,
    jira: Option<&JiraClient>,
) -> anyhow::Result<AnalysisOutcome> {
    let messages = tokio::task::spawn_blocking(move || db.messages_in_range(channel_id, &range))
        .await
        .context("spawn_blocking failed")??;

    if messages.is_empty() {
        info!(channel_id, period = %range.describe(), "No messages in range, skipping analysis");
        return Ok(AnalysisOutcome {
            message_count: 0,
            analysis: None,
            created_issues: Vec::new(),
        });
    }

    let analysis = summarizer.analyze_channel(&messages).await?;

    let mut created_issues = Vec::new();
    if let Some(jira) = jira {
        for task in &analysis.actions {
            if let Some(key) = jira.create_issue(task).await {
                created_issues.push(key);
            }
        }
        info!(
            "Filed {}/{} action item(s) as Jira issues",
            created_issues.len(),
            analysis.actions.len()
        );
    }

    Ok(AnalysisOutcome {
        message_count: messages.len(),
        analysis: Some(analysis),
        created_issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use contributrack_db::models::ObservedMessage;
    use contributrack_jira::JiraConfig;
    use contributrack_llm::{ChatModel, LlmError};
    use httpmock::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const REPLY: &str = r#"```json
{
  "summary": "Server misconfiguration reported and fixed.",
  "insights": {"sentiment": "positive"},
  "actions": [
    {"summary": "Fix server misconfiguration issue", "description": "Help was requested.", "priority": "High", "due_date": "2025-01-20 09:53:00"},
    {"summary": "Write postmortem", "description": "Document the outage."}
  ]
}
```"#;

    struct CountingModel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for CountingModel {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(REPLY.to_string())
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn seeded_db() -> (Arc<Database>, i64) {
        let db = Database::open_in_memory().unwrap();
        let recorded = db
            .record_message(&ObservedMessage {
                guild_id: "1".into(),
                guild_name: "server-1".into(),
                channel_id: "10".into(),
                channel_name: Some("ops".into()),
                author_id: "100".into(),
                author_name: Some("pranjal".into()),
                content: "can someone help fix the server config?".into(),
                timestamp: Utc.with_ymd_and_hms(2025, 1, 20, 9, 40, 0).unwrap(),
                attachments: vec![],
            })
            .unwrap();
        (Arc::new(db), recorded.channel_id)
    }

    fn model() -> Arc<CountingModel> {
        Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        })
    }

    fn january() -> DateRange {
        DateRange::parse(Some("2025-01-01"), Some("2025-01-31")).unwrap()
    }

    #[tokio::test]
    async fn empty_range_skips_the_model() {
        let (db, channel_id) = seeded_db();
        let model = model();
        let summarizer = Summarizer::new(model.clone());
        let range = DateRange::parse(Some("2024-01-01"), Some("2024-01-31")).unwrap();

        let outcome = analyze_channel(db, channel_id, range, &summarizer, None)
            .await
            .unwrap();

        assert_eq!(outcome.message_count, 0);
        assert!(outcome.analysis.is_none());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dry_run_parses_without_filing() {
        let (db, channel_id) = seeded_db();
        let summarizer = Summarizer::new(model());

        let outcome = analyze_channel(db, channel_id, january(), &summarizer, None)
            .await
            .unwrap();

        let analysis = outcome.analysis.unwrap();
        assert_eq!(outcome.message_count, 1);
        assert_eq!(analysis.actions.len(), 2);
        assert!(outcome.created_issues.is_empty());
    }

    #[tokio::test]
    async fn files_every_action_and_tolerates_rejections() {
        let (db, channel_id) = seeded_db();
        let summarizer = Summarizer::new(model());

        let server = MockServer::start();
        let accepted = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/api/3/issue")
                .body_includes("Fix server misconfiguration issue");
            then.status(201).json_body(serde_json::json!({"key": "OPS-1"}));
        });
        let rejected = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/api/3/issue")
                .body_includes("Write postmortem");
            then.status(400).body("bad request");
        });
        let jira = JiraClient::new(JiraConfig {
            base_url: server.base_url(),
            email: "bot@acme.dev".into(),
            api_token: "token".into(),
            project_key: "OPS".into(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap();

        let outcome = analyze_channel(db, channel_id, january(), &summarizer, Some(&jira))
            .await
            .unwrap();

        accepted.assert();
        rejected.assert();
        assert_eq!(outcome.created_issues, vec!["OPS-1"]);
    }
}
