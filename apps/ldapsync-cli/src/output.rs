//! Human-readable rendering of overviews and reports.

use std::fmt::Write;

use ldapsync_provisioning::{Identity, SyncOverview, SyncReport};

/// Numbered list under a title, or a "nothing found" line.
pub fn render_list<T: AsRef<str>>(title: &str, items: &[T]) -> String {
    let mut out = String::new();
    if items.is_empty() {
        let _ = writeln!(
            out,
            "No {} has been found for this criteria",
            title.to_lowercase()
        );
        return out;
    }

    let _ = writeln!(out, "{title}:");
    for (index, item) in items.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", index + 1, item.as_ref());
    }
    out
}

fn identity_lines(identities: &[Identity]) -> Vec<String> {
    identities.iter().map(ToString::to_string).collect()
}

/// Text form of an overview.
pub fn render_overview(overview: &SyncOverview) -> String {
    let incomplete: Vec<String> = overview
        .incomplete
        .iter()
        .map(|i| match &i.sync_error {
            Some(error) => format!("{i} [{error}]"),
            None => i.to_string(),
        })
        .collect();
    let unresolved: Vec<String> = overview
        .unresolved
        .iter()
        .map(|u| format!("{}: {}", u.path, u.reason))
        .collect();

    [
        render_list("Ignored users", &overview.ignored),
        render_list("New users", &identity_lines(&overview.new)),
        render_list("Outdated users", &identity_lines(&overview.outdated)),
        render_list("Incomplete users", &incomplete),
        render_list("Removed users", &identity_lines(&overview.removed)),
        render_list("Unresolved entries", &unresolved),
    ]
    .join("\n")
}

/// Text form of a sync report.
pub fn render_report(report: &SyncReport) -> String {
    let stats = &report.statistics;
    let mut out = format!(
        "Created: {}, updated: {}, unchanged or skipped: {}, failed: {}\n",
        stats.created, stats.updated, stats.skipped, stats.failed
    );

    let failures: Vec<String> = report
        .failures()
        .map(|entry| {
            format!(
                "{} ({}): {}",
                entry.correlation_key,
                entry.action,
                entry.outcome.reason().unwrap_or_default()
            )
        })
        .collect();
    if !failures.is_empty() {
        out.push('\n');
        out.push_str(&render_list("Failures", &failures));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldapsync_provisioning::{Action, ReportEntry, SyncOutcome};

    fn jdoe() -> Identity {
        Identity::new("jdoe")
            .with_names("John", "Doe")
            .with_email("jdoe@example.com")
    }

    #[test]
    fn test_render_list_numbered() {
        let out = render_list("New users", &["a", "b"]);
        assert_eq!(out, "New users:\n  1. a\n  2. b\n");
    }

    #[test]
    fn test_render_list_empty() {
        let out = render_list::<&str>("Removed users", &[]);
        assert_eq!(out, "No removed users has been found for this criteria\n");
    }

    #[test]
    fn test_render_overview_lists_identities() {
        let overview = SyncOverview {
            ignored: vec!["administrator".to_string()],
            new: vec![jdoe()],
            ..Default::default()
        };

        let out = render_overview(&overview);

        assert!(out.contains("Ignored users:\n  1. administrator\n"));
        assert!(out.contains("New users:\n  1. jdoe (John Doe) at jdoe@example.com\n"));
        assert!(out.contains("No outdated users has been found for this criteria"));
    }

    #[test]
    fn test_render_report_lists_failures() {
        let mut report = SyncReport::new();
        report.record(ReportEntry::new("jdoe", Action::Create, SyncOutcome::Ok));
        report.record(ReportEntry::new(
            "bob",
            Action::Create,
            SyncOutcome::Failed("remote fault -501: Invalid email".to_string()),
        ));

        let out = render_report(&report);

        assert!(out.starts_with("Created: 1, updated: 0, unchanged or skipped: 0, failed: 1\n"));
        assert!(out.contains("  1. bob (create): remote fault -501: Invalid email"));
    }
}
