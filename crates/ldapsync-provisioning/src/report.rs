//! Sync report.
//!
//! Per-identity outcomes of one executed plan, with counters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::reconciliation::Action;

/// Result of the registry calls made for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SyncOutcome {
    Ok,
    Failed(String),
}

impl SyncOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, SyncOutcome::Ok)
    }

    /// Failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            SyncOutcome::Ok => None,
            SyncOutcome::Failed(reason) => Some(reason),
        }
    }
}

/// Outcome of one plan entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub correlation_key: String,
    pub action: Action,
    pub outcome: SyncOutcome,
}

impl ReportEntry {
    pub fn new(correlation_key: impl Into<String>, action: Action, outcome: SyncOutcome) -> Self {
        Self {
            correlation_key: correlation_key.into(),
            action,
            outcome,
        }
    }
}

/// Counters of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatistics {
    /// Accounts created.
    pub created: u32,
    /// Accounts whose roles were rewritten.
    pub updated: u32,
    /// Entries planned as skip.
    pub skipped: u32,
    /// Entries with a failed outcome, whatever their action.
    pub failed: u32,
}

impl SyncStatistics {
    fn record(&mut self, entry: &ReportEntry) {
        if !entry.outcome.is_ok() {
            self.failed += 1;
        }
        match (entry.action, entry.outcome.is_ok()) {
            (Action::Skip, _) => self.skipped += 1,
            (Action::Create, true) => self.created += 1,
            (Action::UpdateRoles, true) => self.updated += 1,
            _ => {}
        }
    }
}

/// Report of one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub entries: Vec<ReportEntry>,
    pub statistics: SyncStatistics,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncReport {
    /// Start a report now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            entries: Vec::new(),
            statistics: SyncStatistics::default(),
        }
    }

    pub fn record(&mut self, entry: ReportEntry) {
        self.statistics.record(&entry);
        self.entries.push(entry);
    }

    /// Stamp the finish time.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| !e.outcome.is_ok())
    }

    pub fn has_failures(&self) -> bool {
        self.statistics.failed > 0
    }

    /// Outcome recorded for a login.
    pub fn outcome(&self, key: &str) -> Option<&SyncOutcome> {
        self.entries
            .iter()
            .find(|e| e.correlation_key == key)
            .map(|e| &e.outcome)
    }

    /// Run duration, once finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }
}
