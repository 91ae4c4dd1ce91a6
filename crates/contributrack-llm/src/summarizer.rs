use std::sync::Arc;

use contributrack_types::models::{
    ChannelAnalysis, ChannelMessage, CodePatch, CommitRecord, ContributorReport,
};
use tracing::{info, warn};

use crate::client::ChatModel;
use crate::error::LlmError;
use crate::prompts;

/// Renders records into the fixed templates and forwards them to the model.
#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn ChatModel>,
}

impl Summarizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn analyze_contributions(
        &self,
        repo_name: &str,
        time_period: &str,
        contributors: &[ContributorReport],
    ) -> Result<String, LlmError> {
        let prompt = prompts::contribution_analysis(repo_name, time_period, contributors);
        self.model.complete(prompts::ANALYST_SYSTEM, &prompt).await
    }

    pub async fn analyze_commit_messages(&self, commits: &[CommitRecord]) -> Result<String, LlmError> {
        let prompt = prompts::commit_messages(commits);
        self.model.complete(prompts::ANALYST_SYSTEM, &prompt).await
    }

    pub async fn analyze_code_patches(&self, patches: &[CodePatch]) -> Result<String, LlmError> {
        let prompt = prompts::code_patches(patches);
        self.model.complete(prompts::ANALYST_SYSTEM, &prompt).await
    }

    pub async fn analyze_channel(&self, messages: &[ChannelMessage]) -> Result<ChannelAnalysis, LlmError> {
        let prompt = prompts::channel_analysis(messages);
        let raw = self.model.complete(prompts::SUMMARIZER_SYSTEM, &prompt).await?;
        let analysis = parse_channel_analysis(&raw).inspect_err(|e| {
            warn!("Channel analysis reply did not parse: {}", e);
        })?;
        info!(
            "Channel analysis produced {} action item(s) from {} message(s)",
            analysis.actions.len(),
            messages.len()
        );
        Ok(analysis)
    }
}

/// Parse a JSON channel analysis reply. Models often wrap JSON in a Markdown
/// code fence, which is stripped first.
pub fn parse_channel_analysis(raw: &str) -> Result<ChannelAnalysis, LlmError> {
    let body = strip_code_fence(raw);
    serde_json::from_str(body).map_err(|e| LlmError::MalformedResponse(e.to_string()))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn summarizer(reply: &str) -> (Summarizer, Arc<CannedModel>) {
        let model = Arc::new(CannedModel {
            reply: reply.to_string(),
            prompts: Mutex::new(vec![]),
        });
        (Summarizer::new(model.clone()), model)
    }

    #[test]
    fn parses_plain_json() {
        let analysis = parse_channel_analysis(
            r#"{"summary":"s","insights":"calm","actions":[{"summary":"Fix server","description":"misconfig","priority":"High","due_date":"2025-01-20 09:53:00"}]}"#,
        )
        .unwrap();
        assert_eq!(analysis.summary, "s");
        assert_eq!(analysis.actions.len(), 1);
        assert_eq!(analysis.actions[0].priority.as_deref(), Some("High"));
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"summary\":\"quiet week\",\"insights\":{\"sentiment\":\"positive\"}}\n```";
        let analysis = parse_channel_analysis(raw).unwrap();
        assert_eq!(analysis.summary, "quiet week");
        assert!(analysis.actions.is_empty());
        assert_eq!(analysis.insights["sentiment"], "positive");
    }

    #[test]
    fn malformed_reply_is_an_error_not_a_panic() {
        assert!(matches!(
            parse_channel_analysis("Sure! Here is the summary you asked for."),
            Err(LlmError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_channel_analysis(r#"{"insights":"missing summary"}"#),
            Err(LlmError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn analyze_channel_forwards_rendered_messages() {
        let (summarizer, model) = summarizer(r#"{"summary":"ok","actions":[]}"#);
        let messages = vec![ChannelMessage {
            author: "alice".into(),
            content: "ship it".into(),
            timestamp: chrono::DateTime::from_timestamp(1_737_366_000, 0).unwrap(),
        }];

        let analysis = summarizer.analyze_channel(&messages).await.unwrap();
        assert_eq!(analysis.summary, "ok");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("alice: ship it"));
    }

    #[tokio::test]
    async fn analyze_channel_surfaces_malformed_output() {
        let (summarizer, _) = summarizer("not json at all");
        let err = summarizer.analyze_channel(&[]).await.unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }
}
