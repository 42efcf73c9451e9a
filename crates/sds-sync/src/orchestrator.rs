use chrono::Utc;
use sds_directory::{DirectoryError, DirectoryGateway};
use sds_roster::StudentRecord;
use tracing::{error, info, warn};

use crate::{reconcile_record, stats, CategoryDiff, RuleSet, RunCounters, RunReport};

/// Run one batch: every record in input order, then the category report.
///
/// The gateway is disconnected on every exit path. A failed disconnect is
/// logged and does not change the result.
pub async fn run_sync<G>(
    gateway: &mut G,
    rules: &RuleSet,
    records: &[StudentRecord],
) -> Result<RunReport, DirectoryError>
where
    G: DirectoryGateway + ?Sized,
{
    let started_at_utc = Utc::now();
    info!(records = records.len(), "sync started");

    let result = run_inner(gateway, rules, records).await;

    if let Err(e) = gateway.disconnect().await {
        warn!(error = %e, "directory disconnect failed");
    }

    let (counters, categories) = match result {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "sync aborted");
            return Err(e);
        }
    };

    let finished_at_utc = Utc::now();
    info!(
        records = counters.records,
        updated = counters.updated,
        failed = counters.failed,
        no_match = counters.no_match,
        lookup_failed = counters.lookup_failed,
        "Student AD update completed"
    );

    Ok(RunReport {
        started_at_utc,
        finished_at_utc,
        counters,
        categories,
    })
}

async fn run_inner<G>(
    gateway: &mut G,
    rules: &RuleSet,
    records: &[StudentRecord],
) -> Result<(RunCounters, Vec<CategoryDiff>), DirectoryError>
where
    G: DirectoryGateway + ?Sized,
{
    let mut counters = RunCounters::default();

    for (idx, record) in records.iter().enumerate() {
        counters.records += 1;

        if record.has_blank_email() {
            warn!(row = idx + 1, "skipping roster row with blank email");
            counters.skipped_blank_email += 1;
            continue;
        }

        let report = reconcile_record(gateway, rules, record).await?;
        counters.tally(&report);
    }

    let categories = stats::report(gateway, rules, records).await?;
    Ok((counters, categories))
}

