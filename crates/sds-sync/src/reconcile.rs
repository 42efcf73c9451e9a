use sds_directory::{AttributeDelta, DirectoryError, DirectoryGateway, EqualityFilter};
use sds_roster::StudentRecord;
use tracing::{debug, error, info, warn};

use crate::{ReconcileOutcome, RecordReport, RuleGroup, RuleSet};

/// Join attribute between roster email and directory entry.
pub const MAIL_ATTRIBUTE: &str = "mail";

/// The lookup only needs the identity handle.
pub const LOOKUP_ATTRIBUTES: &[&str] = &["distinguishedName"];

/// Reconcile one roster row against the directory.
///
/// One lookup by email, then each [`RuleGroup`] in order against the first
/// matching DN. No group reads entry state, so the three groups share the
/// single lookup.
///
/// # Errors
/// Only connection-level failures are returned. A rejected lookup becomes
/// [`ReconcileOutcome::LookupFailed`] for every group; a rejected replace
/// becomes [`ReconcileOutcome::UpdateFailed`] and the remaining groups still
/// run.
pub async fn reconcile_record<G>(
    gateway: &mut G,
    rules: &RuleSet,
    record: &StudentRecord,
) -> Result<RecordReport, DirectoryError>
where
    G: DirectoryGateway + ?Sized,
{
    let filter = EqualityFilter::new(MAIL_ATTRIBUTE, record.email.as_str());
    let entries = match gateway.search(&filter, LOOKUP_ATTRIBUTES).await {
        Ok(entries) => entries,
        Err(e) if e.is_operation_scoped() => {
            error!(
                email = %record.email,
                error = %e,
                "Failed to look up AD account for {}",
                record.email
            );
            return Ok(RecordReport::lookup_failed(record.email.as_str(), e.to_string()));
        }
        Err(e) => return Err(e),
    };

    let Some(first) = entries.first() else {
        warn!(email = %record.email, "No AD account found for {}", record.email);
        return Ok(RecordReport::no_match(record.email.as_str()));
    };

    if entries.len() > 1 {
        // One account per address is expected; first match wins.
        warn!(
            email = %record.email,
            matches = entries.len(),
            chosen_dn = %first.dn,
            "multiple AD accounts share email {}; updating the first",
            record.email
        );
    }

    let dn = first.dn.clone();
    let mut outcomes = Vec::with_capacity(RuleGroup::ALL.len());
    for group in RuleGroup::ALL {
        let delta = rules.delta_for(group, record);
        let outcome = apply_group(gateway, &dn, group, &delta, record).await?;
        outcomes.push((group, outcome));
    }

    Ok(RecordReport {
        email: record.email.clone(),
        match_count: entries.len(),
        dn: Some(dn),
        outcomes,
    })
}

async fn apply_group<G>(
    gateway: &mut G,
    dn: &str,
    group: RuleGroup,
    delta: &AttributeDelta,
    record: &StudentRecord,
) -> Result<ReconcileOutcome, DirectoryError>
where
    G: DirectoryGateway + ?Sized,
{
    if delta.is_empty() {
        debug!(email = %record.email, group = group.label(), "nothing to write");
        return Ok(ReconcileOutcome::NothingToWrite);
    }

    match gateway.modify(dn, delta).await {
        Ok(()) => {
            info!(
                email = %record.email,
                dn = %dn,
                "Updated {} for {}",
                group.label(),
                record.email
            );
            Ok(ReconcileOutcome::Updated)
        }
        Err(e) if e.is_operation_scoped() => {
            error!(
                email = %record.email,
                dn = %dn,
                error = %e,
                "Failed to update {} for {}",
                group.label(),
                record.email
            );
            Ok(ReconcileOutcome::UpdateFailed(e.to_string()))
        }
        Err(e) => Err(e),
    }
}
