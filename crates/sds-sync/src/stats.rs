//! Per-category comparison of roster membership against the directory.

use std::collections::BTreeSet;

use sds_directory::{DirectoryError, DirectoryGateway, EqualityFilter};
use sds_roster::StudentRecord;
use tracing::{error, info, warn};

use crate::{Category, CategoryDiff, RuleSet, ATTR_COMPANY, MAIL_ATTRIBUTE};

/// One `company` search per category, compared with the roster rows whose
/// boarding house names that category. Rows in unknown categories are left
/// out of every diff.
///
/// A category whose search the server rejects is logged and left out of the
/// result; the remaining categories are still reported. Connection-level
/// failures end the report.
pub async fn report<G>(
    gateway: &mut G,
    rules: &RuleSet,
    records: &[StudentRecord],
) -> Result<Vec<CategoryDiff>, DirectoryError>
where
    G: DirectoryGateway + ?Sized,
{
    let mut out = Vec::with_capacity(rules.categories.len());

    for category in &rules.categories {
        let source: Vec<&str> = records
            .iter()
            .filter(|r| r.boarding_house == category.name)
            .map(|r| r.email.as_str())
            .collect();

        let filter = EqualityFilter::new(ATTR_COMPANY, category.company.as_str());
        let entries = match gateway.search(&filter, &[MAIL_ATTRIBUTE]).await {
            Ok(entries) => entries,
            Err(e) if e.is_operation_scoped() => {
                error!(
                    category = %category.name,
                    company = %category.company,
                    error = %e,
                    "{}: AD statistics unavailable",
                    category.name
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        let directory_emails: Vec<String> = entries
            .iter()
            .filter_map(|e| e.first_value(MAIL_ATTRIBUTE))
            .map(str::to_string)
            .collect();

        let diff = diff_category(category, &source, entries.len(), &directory_emails);
        log_diff(&diff);
        out.push(diff);
    }

    Ok(out)
}

/// Pure set comparison for one category.
///
/// `source_emails` holds one item per roster row, duplicates included, and
/// its length is the source count. Blank emails are counted but never
/// listed as missing.
pub fn diff_category(
    category: &Category,
    source_emails: &[&str],
    directory_count: usize,
    directory_emails: &[String],
) -> CategoryDiff {
    let source: BTreeSet<&str> = source_emails
        .iter()
        .copied()
        .filter(|e| !e.trim().is_empty())
        .collect();
    let directory: BTreeSet<&str> = directory_emails.iter().map(String::as_str).collect();

    CategoryDiff {
        category: category.name.clone(),
        company: category.company.clone(),
        source_count: source_emails.len(),
        directory_count,
        source_only: source.difference(&directory).map(|s| s.to_string()).collect(),
        directory_only: directory.difference(&source).map(|s| s.to_string()).collect(),
    }
}

fn log_diff(diff: &CategoryDiff) {
    info!(
        category = %diff.category,
        source_count = diff.source_count,
        directory_count = diff.directory_count,
        "{}: {} students in CSV, {} in AD",
        diff.category,
        diff.source_count,
        diff.directory_count
    );

    for email in &diff.source_only {
        warn!(
            category = %diff.category,
            side = "csv_only",
            email = %email,
            "{}: {} is in the CSV but not in AD",
            diff.category,
            email
        );
    }
    for email in &diff.directory_only {
        warn!(
            category = %diff.category,
            side = "ad_only",
            email = %email,
            "{}: {} is in AD but not in the CSV",
            diff.category,
            email
        );
    }
}
