//! Pure aggregation over fetched commits.

use contributrack_types::DateRange;
use contributrack_types::models::{CommitRecord, ContributorReport};

use crate::client::CommitFile;

/// Fold the commits of one identity into a report, keeping only those whose
/// author date falls inside `range`.
pub fn aggregate_contributor(
    login: &str,
    commits: impl IntoIterator<Item = CommitRecord>,
    range: &DateRange,
) -> ContributorReport {
    let mut report = ContributorReport::new(login);
    for commit in commits.into_iter().filter(|c| range.contains(c.date)) {
        report.push(commit);
    }
    report
}

/// Render the changed files of a commit as `File:` / `Status:` / `Patch:`
/// blocks separated by blank lines.
pub fn render_patch(files: &[CommitFile]) -> String {
    files
        .iter()
        .map(|file| {
            format!(
                "File: {}\nStatus: {}\nPatch:\n{}",
                file.filename,
                file.status,
                file.patch.as_deref().unwrap_or("No patch available").trim_end()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn commit(sha: &str, y: i32, m: u32, d: u32, additions: u64, deletions: u64) -> CommitRecord {
        CommitRecord {
            sha: sha.into(),
            message: format!("change {sha}"),
            date: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
            additions,
            deletions,
        }
    }

    #[test]
    fn counts_only_in_range_commits() {
        let commits = vec![
            commit("a1", 2025, 1, 10, 10, 2),
            commit("a2", 2025, 2, 1, 5, 1),
        ];
        let range = DateRange::parse(Some("2025-01-01"), Some("2025-01-31")).unwrap();

        let report = aggregate_contributor("alice", commits, &range);
        assert_eq!(report.total_commits, 1);
        assert_eq!(report.lines_added, 10);
        assert_eq!(report.lines_deleted, 2);
        assert_eq!(report.commits[0].sha, "a1");
    }

    #[test]
    fn boundaries_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let range = DateRange::new(Some(start), Some(start)).unwrap();

        let report = aggregate_contributor("bob", vec![commit("b1", 2025, 1, 10, 3, 0)], &range);
        assert_eq!(report.total_commits, 1);
    }

    #[test]
    fn open_range_takes_everything() {
        let commits = vec![
            commit("c1", 2019, 6, 1, 1, 1),
            commit("c2", 2025, 6, 1, 2, 2),
        ];
        let report = aggregate_contributor("carol", commits, &DateRange::default());
        assert_eq!(report.total_commits, 2);
        assert_eq!(report.lines_added, 3);
        assert_eq!(report.lines_deleted, 3);
    }

    #[test]
    fn renders_file_blocks() {
        let files = vec![
            CommitFile {
                filename: "src/main.rs".into(),
                status: "modified".into(),
                patch: Some("@@ -1 +1 @@\n-old\n+new".into()),
            },
            CommitFile {
                filename: "logo.png".into(),
                status: "added".into(),
                patch: None,
            },
        ];

        let rendered = render_patch(&files);
        assert!(rendered.starts_with("File: src/main.rs\nStatus: modified\nPatch:\n@@ -1 +1 @@"));
        assert!(rendered.ends_with("\n\nFile: logo.png\nStatus: added\nPatch:\nNo patch available"));
    }

    #[test]
    fn trailing_newlines_are_trimmed() {
        let files = vec![CommitFile {
            filename: "README.md".into(),
            status: "modified".into(),
            patch: Some("+docs\n\n".into()),
        }];
        assert_eq!(render_patch(&files), "File: README.md\nStatus: modified\nPatch:\n+docs");
    }

    #[test]
    fn no_files_renders_nothing() {
        assert_eq!(render_patch(&[]), "");
    }
}
