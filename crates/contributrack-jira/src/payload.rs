//! Jira Cloud v3 issue payloads.

use chrono::NaiveDate;
use contributrack_types::models::TaskRecord;
use serde_json::{Value, json};

/// Build the `fields` document for a `Task` issue. The description is a single
/// Atlassian Document Format paragraph.
pub fn issue_payload(project_key: &str, task: &TaskRecord) -> Value {
    let mut fields = json!({
        "project": {"key": project_key},
        "summary": task.summary,
        "description": {
            "type": "doc",
            "version": 1,
            "content": [
                {
                    "type": "paragraph",
                    "content": [{"type": "text", "text": task.description}]
                }
            ]
        },
        "issuetype": {"name": "Task"}
    });

    if let Some(priority) = task.priority.as_deref().filter(|p| !p.trim().is_empty()) {
        fields["priority"] = json!({"name": priority.trim()});
    }
    if let Some(due) = task.due_date.as_deref().and_then(due_date) {
        fields["duedate"] = json!(due);
    }

    json!({"fields": fields})
}

/// Jira wants a bare `YYYY-MM-DD`; models tend to add a time of day.
fn due_date(raw: &str) -> Option<String> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}
