use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::RuleGroup;

/// Result of one rule group for one roster row. Logged, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The replace was accepted by the directory.
    Updated,
    /// The rule produced an empty delta; no write was issued.
    NothingToWrite,
    /// No directory entry carries the row's email; no write was issued.
    NoMatchFound,
    /// The directory rejected the replace. Carries the server's reason.
    UpdateFailed(String),
    /// The directory rejected the email lookup itself; no write was issued.
    LookupFailed(String),
}

/// Everything the reconciler decided for one roster row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordReport {
    pub email: String,
    /// Number of entries the email lookup returned.
    pub match_count: usize,
    /// DN the writes went to: the first match, if any.
    pub dn: Option<String>,
    /// One outcome per rule group, in application order.
    pub outcomes: Vec<(RuleGroup, ReconcileOutcome)>,
}

impl RecordReport {
    pub fn no_match(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            match_count: 0,
            dn: None,
            outcomes: RuleGroup::ALL
                .iter()
                .map(|g| (*g, ReconcileOutcome::NoMatchFound))
                .collect(),
        }
    }

    /// Every group marked [`ReconcileOutcome::LookupFailed`].
    pub fn lookup_failed(email: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            email: email.into(),
            match_count: 0,
            dn: None,
            outcomes: RuleGroup::ALL
                .iter()
                .map(|g| (*g, ReconcileOutcome::LookupFailed(reason.clone())))
                .collect(),
        }
    }

    pub fn is_lookup_failure(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, o)| matches!(o, ReconcileOutcome::LookupFailed(_)))
    }

    pub fn outcome(&self, group: RuleGroup) -> Option<&ReconcileOutcome> {
        self.outcomes
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, o)| o)
    }
}

/// Roster vs directory comparison for one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryDiff {
    pub category: String,
    pub company: String,
    /// Roster rows in this category (duplicates counted).
    pub source_count: usize,
    /// Directory entries whose `company` is this category's company.
    pub directory_count: usize,
    /// In the roster, absent from the directory.
    pub source_only: BTreeSet<String>,
    /// In the directory, absent from the roster.
    pub directory_only: BTreeSet<String>,
}

impl CategoryDiff {
    pub fn is_clean(&self) -> bool {
        self.source_count == self.directory_count
            && self.source_only.is_empty()
            && self.directory_only.is_empty()
    }
}

/// Batch counters. Write counters are per rule group; the rest per row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub records: usize,
    pub skipped_blank_email: usize,
    pub no_match: usize,
    pub lookup_failed: usize,
    pub duplicate_matches: usize,
    pub updated: usize,
    pub nothing_to_write: usize,
    pub failed: usize,
}

impl RunCounters {
    pub(crate) fn tally(&mut self, report: &RecordReport) {
        if report.is_lookup_failure() {
            self.lookup_failed += 1;
        } else if report.match_count == 0 {
            self.no_match += 1;
        } else if report.match_count > 1 {
            self.duplicate_matches += 1;
        }
        for (_, outcome) in &report.outcomes {
            match outcome {
                ReconcileOutcome::Updated => self.updated += 1,
                ReconcileOutcome::NothingToWrite => self.nothing_to_write += 1,
                ReconcileOutcome::UpdateFailed(_) => self.failed += 1,
                ReconcileOutcome::NoMatchFound | ReconcileOutcome::LookupFailed(_) => {}
            }
        }
    }
}

/// Summary of one completed batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub started_at_utc: DateTime<Utc>,
    pub finished_at_utc: DateTime<Utc>,
    pub counters: RunCounters,
    pub categories: Vec<CategoryDiff>,
}
