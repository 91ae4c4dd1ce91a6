//! Fixed prompt templates and the renderers that fill them.

use std::fmt::Write;

use contributrack_types::models::{ChannelMessage, CodePatch, CommitRecord, ContributorReport};

pub const SUMMARIZER_SYSTEM: &str =
    "You are a helpful assistant that summarizes conversations and extracts useful information.";

pub const ANALYST_SYSTEM: &str =
    "You are an engineering analyst who reviews source control activity and reports on it plainly.";

const CHANNEL_ANALYSIS: &str = r#"You have the following messages from a Discord channel:

{messages}

Your task:
1. Summarize the conversation.
2. Extract key insights such as sentiment, trends, and observations.
3. Detect actionable tasks. For each task, include:
   - **Task Summary**
   - **Detailed Description**
   - **Priority** (High, Medium, Low)
   - **Due Date** (if applicable)

Respond in JSON format:
{
  "summary": "...",
  "insights": "...",
  "actions": [
    {
      "summary": "...",
      "description": "...",
      "priority": "...",
      "due_date": "..."
    }
  ]
}"#;

const CONTRIBUTION_ANALYSIS: &str = r#"Analyze the following GitHub contribution data and provide a detailed summary:

Repository: {repo_name}
Time Period: {time_period}

Contribution Data:
{contribution_data}

Please provide:
1. Overall activity summary
2. Key contributors and their impact
3. Notable trends or patterns
4. Significant commits or changes"#;

const COMMIT_MESSAGES: &str = r#"Analyze the following commit messages and provide a summary of the changes:

Commits:
{commit_messages}

Please provide:
1. Main types of changes
2. Key features or improvements
3. Bug fixes or issues addressed
4. Overall development direction"#;

const CODE_PATCHES: &str = r#"Analyze the following code patches and provide a summary of the changes:

Code Patches:
{code_patches}

Please provide:
1. Main types of changes
2. Key features or improvements
3. Bug fixes or issues addressed
4. Overall development direction"#;

pub fn channel_analysis(messages: &[ChannelMessage]) -> String {
    let mut rendered = String::new();
    for m in messages {
        let _ = writeln!(
            rendered,
            "[{}] {}: {}",
            m.timestamp.format("%Y-%m-%d %H:%M:%S"),
            m.author,
            m.content
        );
    }
    CHANNEL_ANALYSIS.replace("{messages}", rendered.trim_end())
}

pub fn contribution_analysis(
    repo_name: &str,
    time_period: &str,
    contributors: &[ContributorReport],
) -> String {
    let data = contributors
        .iter()
        .map(|c| {
            format!(
                "- {}: {} commits, +{} -{} lines",
                c.login, c.total_commits, c.lines_added, c.lines_deleted
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    CONTRIBUTION_ANALYSIS
        .replace("{repo_name}", repo_name)
        .replace("{time_period}", time_period)
        .replace("{contribution_data}", &data)
}

pub fn commit_messages(commits: &[CommitRecord]) -> String {
    let data = commits
        .iter()
        .map(|c| format!("- {}: {}", c.date.format("%Y-%m-%d"), c.message))
        .collect::<Vec<_>>()
        .join("\n");
    COMMIT_MESSAGES.replace("{commit_messages}", &data)
}

pub fn code_patches(patches: &[CodePatch]) -> String {
    let data = patches
        .iter()
        .map(|p| format!("- {}: {}\n{}", p.date.format("%Y-%m-%d"), p.message, p.patch))
        .collect::<Vec<_>>()
        .join("\n");
    CODE_PATCHES.replace("{code_patches}", &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn channel_prompt_lists_messages_in_order() {
        let messages = vec![
            ChannelMessage {
                author: "alice".into(),
                content: "server is misconfigured".into(),
                timestamp: Utc.with_ymd_and_hms(2025, 1, 20, 9, 40, 0).unwrap(),
            },
            ChannelMessage {
                author: "bob".into(),
                content: "on it".into(),
                timestamp: Utc.with_ymd_and_hms(2025, 1, 20, 9, 41, 0).unwrap(),
            },
        ];
        let prompt = channel_analysis(&messages);
        let alice = prompt.find("[2025-01-20 09:40:00] alice: server is misconfigured").unwrap();
        let bob = prompt.find("[2025-01-20 09:41:00] bob: on it").unwrap();
        assert!(alice < bob);
        assert!(prompt.contains("\"actions\": ["));
        assert!(!prompt.contains("{messages}"));
    }

    #[test]
    fn contribution_prompt_fills_every_slot() {
        let mut alice = ContributorReport::new("alice");
        alice.total_commits = 1;
        alice.lines_added = 10;
        alice.lines_deleted = 2;

        let prompt = contribution_analysis("acme/widgets", "2025-01-01 to 2025-01-31", &[alice]);
        assert!(prompt.contains("Repository: acme/widgets"));
        assert!(prompt.contains("Time Period: 2025-01-01 to 2025-01-31"));
        assert!(prompt.contains("- alice: 1 commits, +10 -2 lines"));
        assert!(!prompt.contains('{'));
    }
}
